//! Convex polygon geometry and SAT queries.
//!
//! A polygon stores its vertices twice: the local set, recentered onto
//! the center of mass at construction time, and the world set, rebuilt
//! from the owning body's transform every tick. Mass properties are
//! derived from the same geometry during construction, so the local
//! frame and the mass are permanently tied together; vertices cannot be
//! edited afterwards.

use std::f32::consts::PI;

use glam::Vec2;

use crate::body::Body;
use crate::math::Ray;
use crate::shape::ShapeError;

/// Axis angles closer than this are merged into one SAT axis.
const AXIS_EPSILON: f32 = 1e-5;

/// A convex polygon with outward edge normals.
///
/// Vertices must be wound so that the edge normal `(-dir.y, dir.x)`
/// points out of the polygon: counter-clockwise in screen (y-down)
/// coordinates.
#[derive(Debug, Clone)]
pub struct Polygon {
    local: Vec<Vec2>,
    world: Vec<Vec2>,
    local_normals: Vec<Vec2>,
    world_normals: Vec<Vec2>,
    /// One canonical angle in `[0, pi)` per distinct edge-normal
    /// direction.
    local_axes: Vec<f32>,
    world_axes: Vec<f32>,
    mass: f32,
    inertia: f32,
}

impl Polygon {
    /// Build a polygon from local-space vertices and a density.
    ///
    /// Fails when fewer than three vertices are supplied. The vertex list
    /// is translated so the centroid sits at the local origin, and mass
    /// and rotational inertia are derived from the geometry.
    pub fn new(vertices: Vec<Vec2>, density: f32) -> Result<Self, ShapeError> {
        if vertices.len() < 3 {
            return Err(ShapeError::DegeneratePolygon(vertices.len()));
        }
        Ok(Self::build(vertices, density))
    }

    /// An axis-aligned box of the given size.
    ///
    /// Exactly two SAT axes survive deduplication.
    pub fn rect(size: Vec2, density: f32) -> Self {
        Self::build(
            vec![
                Vec2::new(0.0, 0.0),
                Vec2::new(size.x, 0.0),
                Vec2::new(size.x, -size.y),
                Vec2::new(0.0, -size.y),
            ],
            density,
        )
    }

    fn build(mut local: Vec<Vec2>, density: f32) -> Self {
        let n = local.len();

        let mut local_normals = Vec::with_capacity(n);
        let mut local_axes: Vec<f32> = Vec::new();
        for i in 0..n {
            let dir = local[(i + 1) % n] - local[i];
            local_normals.push(dir.perp().normalize());

            let angle = canonical_axis_angle(dir);
            if !local_axes
                .iter()
                .any(|&a| (a - angle).abs() < AXIS_EPSILON)
            {
                local_axes.push(angle);
            }
        }

        let (mass, inertia) = compute_mass(&mut local, density);

        Self {
            world: local.clone(),
            world_normals: local_normals.clone(),
            world_axes: local_axes.clone(),
            local,
            local_normals,
            local_axes,
            mass,
            inertia,
        }
    }

    /// Recompute the world-space vertex, normal and axis sets from the
    /// owning body's transform.
    pub(crate) fn refresh(&mut self, body: &Body) {
        for (world, local) in self.world.iter_mut().zip(&self.local) {
            *world = body.rotation * *local + body.position;
        }
        for (world, local) in self.world_normals.iter_mut().zip(&self.local_normals) {
            *world = body.rotation * *local;
        }
        for (world, local) in self.world_axes.iter_mut().zip(&self.local_axes) {
            *world = local + body.angle;
        }
    }

    #[inline]
    pub fn vertex_count(&self) -> usize {
        self.local.len()
    }

    /// World-space vertices, as of the last refresh.
    #[inline]
    pub fn vertices(&self) -> &[Vec2] {
        &self.world
    }

    /// Local-space vertices, recentered onto the center of mass.
    #[inline]
    pub fn local_vertices(&self) -> &[Vec2] {
        &self.local
    }

    /// World-space SAT axis angles.
    #[inline]
    pub fn axes(&self) -> &[f32] {
        &self.world_axes
    }

    /// World-space outward normal of edge `index`.
    #[inline]
    pub fn normal(&self, index: usize) -> Vec2 {
        self.world_normals[index]
    }

    #[inline]
    pub fn mass(&self) -> f32 {
        self.mass
    }

    #[inline]
    pub fn inertia(&self) -> f32 {
        self.inertia
    }

    /// World-space endpoints of edge `index`.
    pub fn edge(&self, index: usize) -> (Vec2, Vec2) {
        let next = (index + 1) % self.world.len();
        (self.world[index], self.world[next])
    }

    /// Iterate the world-space edges as start + direction segments.
    pub fn edges(&self) -> impl Iterator<Item = Ray> + '_ {
        (0..self.world.len()).map(|i| {
            let (start, end) = self.edge(i);
            Ray::new(start, end - start)
        })
    }

    /// The world vertex farthest along `dir`. Ties keep the first vertex
    /// seen.
    pub fn support(&self, dir: Vec2) -> Vec2 {
        let mut best = self.world[0];
        let mut best_dot = best.dot(dir);
        for vertex in &self.world[1..] {
            let d = vertex.dot(dir);
            if d > best_dot {
                best_dot = d;
                best = *vertex;
            }
        }
        best
    }

    /// SAT axis search over this polygon's edge normals.
    ///
    /// Returns the maximum of `normal . (other.support(-normal) - v)`
    /// across edges together with the edge index attaining it. A
    /// non-negative maximum means the corresponding axis separates the
    /// two polygons; a negative maximum identifies this polygon's face of
    /// least penetration. Call with both orderings to test every axis of
    /// both shapes.
    pub fn find_penetration(&self, other: &Polygon) -> (f32, usize) {
        let mut best = f32::MIN;
        let mut best_face = 0;
        for i in 0..self.world.len() {
            let normal = self.world_normals[i];
            let support = other.support(-normal);
            let d = normal.dot(support - self.world[i]);
            if d > best {
                best = d;
                best_face = i;
            }
        }
        (best, best_face)
    }
}

/// Fold an edge direction into one canonical axis angle in `[0, pi)`, so
/// opposite edge directions map to the same axis.
fn canonical_axis_angle(dir: Vec2) -> f32 {
    let mut angle = dir.y.atan2(dir.x);
    if angle < 0.0 {
        angle += PI;
    } else if angle >= PI {
        angle -= PI;
    }
    angle
}

/// Mass, centroid and rotational inertia from a triangle fan around the
/// local origin.
///
/// The vertex list is translated by the negated centroid so the body's
/// position tracks the center of mass from here on. Inertia stays
/// measured about the construction-frame origin.
fn compute_mass(local: &mut [Vec2], density: f32) -> (f32, f32) {
    const K_INV3: f32 = 1.0 / 3.0;

    let mut area = 0.0;
    let mut centroid = Vec2::ZERO;
    let mut inertia = 0.0;

    let n = local.len();
    for i in 0..n {
        let p1 = local[i];
        let p2 = local[(i + 1) % n];

        let cross = p1.perp_dot(p2);
        let tri_area = 0.5 * cross;
        area += tri_area;
        centroid += tri_area * K_INV3 * (p1 + p2);

        let int_x2 = p1.x * p1.x + p2.x * p1.x + p2.x * p2.x;
        let int_y2 = p1.y * p1.y + p2.y * p1.y + p2.y * p2.y;
        inertia += 0.25 * K_INV3 * cross.abs() * (int_x2 + int_y2);
    }

    centroid /= area;
    for vertex in local.iter_mut() {
        *vertex -= centroid;
    }

    (density * area.abs(), inertia * density)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn square(half: f32) -> Polygon {
        Polygon::rect(Vec2::splat(half * 2.0), 1.0)
    }

    fn body_at(x: f32, y: f32) -> Body {
        let mut body = Body::new(1.0, 1.0);
        body.position = Vec2::new(x, y);
        body
    }

    #[test]
    fn test_too_few_vertices_fails() {
        let result = Polygon::new(vec![Vec2::ZERO, Vec2::X], 1.0);
        assert!(matches!(result, Err(ShapeError::DegeneratePolygon(2))));
    }

    #[test]
    fn test_mass_is_area_times_density() {
        let poly = Polygon::rect(Vec2::new(2.0, 2.0), 1.0);
        assert!((poly.mass() - 4.0).abs() < 1e-5);

        let dense = Polygon::rect(Vec2::new(3.0, 2.0), 2.5);
        assert!((dense.mass() - 15.0).abs() < 1e-4);
    }

    #[test]
    fn test_inertia_about_construction_origin() {
        // A 2x2 box built from a corner: I = m * (w^2 + h^2) / 3 about
        // that corner. The recentering happens after the inertia sum.
        let poly = Polygon::rect(Vec2::new(2.0, 2.0), 1.0);
        assert!((poly.inertia() - 32.0 / 3.0).abs() < 1e-4);
    }

    #[test]
    fn test_centroid_recentered() {
        let poly = Polygon::rect(Vec2::new(4.0, 2.0), 1.0);
        let sum: Vec2 = poly.local_vertices().iter().copied().sum();
        assert!(sum.length() < 1e-5);

        let triangle = Polygon::new(
            vec![Vec2::new(0.0, 0.0), Vec2::new(3.0, 0.0), Vec2::new(0.0, -3.0)],
            1.0,
        )
        .unwrap();
        let sum: Vec2 = triangle.local_vertices().iter().copied().sum();
        assert!(sum.length() < 1e-5);
    }

    #[test]
    fn test_rect_axes_deduplicated() {
        let poly = Polygon::rect(Vec2::new(2.0, 3.0), 1.0);
        assert_eq!(poly.axes().len(), 2);

        // A triangle has three distinct edge directions.
        let triangle = Polygon::new(
            vec![Vec2::new(0.0, 0.0), Vec2::new(2.0, 0.0), Vec2::new(1.0, -2.0)],
            1.0,
        )
        .unwrap();
        assert_eq!(triangle.axes().len(), 3);
    }

    #[test]
    fn test_support_picks_farthest_vertex() {
        let mut poly = square(1.0);
        poly.refresh(&body_at(0.0, 0.0));

        let support = poly.support(Vec2::new(1.0, 0.0));
        assert!((support.x - 1.0).abs() < 1e-5);

        let support = poly.support(Vec2::new(-1.0, -1.0));
        assert!((support - Vec2::new(-1.0, -1.0)).length() < 1e-5);
    }

    #[test]
    fn test_find_penetration_separated() {
        let mut a = square(1.0);
        let mut b = square(1.0);
        a.refresh(&body_at(0.0, 0.0));
        b.refresh(&body_at(3.0, 0.0));

        let (separation, _) = a.find_penetration(&b);
        assert!(separation >= 0.0);
    }

    #[test]
    fn test_find_penetration_overlapping() {
        let mut a = square(1.0);
        let mut b = square(1.0);
        a.refresh(&body_at(0.0, 0.0));
        b.refresh(&body_at(1.5, 0.0));

        let (penetration, face) = a.find_penetration(&b);
        assert!((penetration + 0.5).abs() < 1e-5);
        // The face of least penetration is the +x edge of `a`.
        assert!((a.normal(face) - Vec2::X).length() < 1e-5);
    }

    #[test]
    fn test_world_vertices_follow_body() {
        let mut poly = square(1.0);
        let mut body = body_at(5.0, -2.0);
        body.angle = PI;
        body.rotation = glam::Mat2::from_angle(body.angle);
        poly.refresh(&body);

        // A half-turn maps the local (+1, +1) corner to (-1, -1) before
        // translation.
        let expected = Vec2::new(4.0, -3.0);
        assert!(poly
            .vertices()
            .iter()
            .any(|v| (*v - expected).length() < 1e-5));

        // World axes shift by the body angle.
        assert!(poly.axes().iter().any(|a| (a - PI).abs() < 1e-4));
    }

    #[test]
    fn test_edges_wrap_around() {
        let mut poly = square(1.0);
        poly.refresh(&body_at(0.0, 0.0));

        let edges: Vec<Ray> = poly.edges().collect();
        assert_eq!(edges.len(), 4);
        let last = edges.last().unwrap();
        assert!((last.end() - edges[0].start).length() < 1e-5);
    }
}
