//! Collision shapes and their capability surface.
//!
//! [`Shape`] is a closed set of shape variants. The narrow phase
//! dispatches on the variant pair, so adding a shape kind means adding a
//! variant here plus a match arm per capability and per collision
//! routine. Only [`Polygon`] exists today.

mod polygon;

pub use polygon::Polygon;

use glam::Vec2;
use thiserror::Error;

use crate::body::Body;
use crate::math::Ray;

/// Shape construction failure.
#[derive(Debug, Error)]
pub enum ShapeError {
    /// A polygon needs at least three vertices.
    #[error("a polygon needs at least 3 vertices, got {0}")]
    DegeneratePolygon(usize),
}

/// A collision shape attached to a body.
#[derive(Debug, Clone)]
pub enum Shape {
    Polygon(Polygon),
}

impl Shape {
    /// The world point farthest along `dir`.
    pub fn support(&self, dir: Vec2) -> Vec2 {
        match self {
            Shape::Polygon(p) => p.support(dir),
        }
    }

    /// World-space edges as start + direction segments.
    pub fn edges(&self) -> impl Iterator<Item = Ray> + '_ {
        match self {
            Shape::Polygon(p) => p.edges(),
        }
    }

    /// World-space SAT axis angles.
    pub fn axes(&self) -> &[f32] {
        match self {
            Shape::Polygon(p) => p.axes(),
        }
    }

    /// Mass derived from the shape's geometry and density.
    pub fn mass(&self) -> f32 {
        match self {
            Shape::Polygon(p) => p.mass(),
        }
    }

    /// Rotational inertia derived from the shape's geometry and density.
    pub fn inertia(&self) -> f32 {
        match self {
            Shape::Polygon(p) => p.inertia(),
        }
    }

    /// Rebuild world-space data from the owning body's transform.
    pub(crate) fn refresh(&mut self, body: &Body) {
        match self {
            Shape::Polygon(p) => p.refresh(body),
        }
    }
}

impl From<Polygon> for Shape {
    fn from(polygon: Polygon) -> Self {
        Shape::Polygon(polygon)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_dispatch_through_enum() {
        let mut shape: Shape = Polygon::rect(Vec2::new(2.0, 2.0), 1.0).into();
        let mut body = Body::from_shape(&shape);
        body.position = Vec2::new(10.0, 0.0);
        shape.refresh(&body);

        assert!((shape.mass() - 4.0).abs() < 1e-5);
        assert_eq!(shape.axes().len(), 2);
        assert_eq!(shape.edges().count(), 4);
        assert!((shape.support(Vec2::X).x - 11.0).abs() < 1e-5);
    }
}
