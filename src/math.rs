//! 2D math primitives shared across the engine.
//!
//! Vector and matrix arithmetic comes from [`glam`] (`Vec2`, `Mat2`);
//! this module adds the ray/segment type used by edge enumeration and
//! ray casting, plus the engine-wide float tolerance.

use glam::Vec2;

/// Float-equality tolerance used by the solver and clipping code.
pub const EPSILON: f32 = 1e-4;

/// True when `v` is within [`EPSILON`] of zero.
#[inline]
pub(crate) fn approx_zero(v: f32) -> bool {
    v.abs() <= EPSILON
}

/// A ray (or segment) in start + direction form.
///
/// The same representation serves both as a polygon edge (`dir` spans the
/// edge) and as a cast ray (`dir` bounds the cast distance).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Ray {
    pub start: Vec2,
    pub dir: Vec2,
}

impl Ray {
    pub fn new(start: Vec2, dir: Vec2) -> Self {
        Self { start, dir }
    }

    /// The far endpoint, `start + dir`.
    #[inline]
    pub fn end(&self) -> Vec2 {
        self.start + self.dir
    }

    /// Project a point onto this ray's carrier line.
    ///
    /// `dir` is assumed to be unit length.
    pub fn project(&self, point: Vec2) -> Vec2 {
        let t = self.dir.dot(point - self.start);
        self.start + self.dir * t
    }

    /// Intersect two lines given in start + direction form.
    ///
    /// Solves the 2x2 system of the implicit forms `Ax + By = C`. Parallel
    /// lines (zero determinant) yield `None`. With `clamp_to_segments` the
    /// intersection is discarded unless it lies within the endpoint bounds
    /// of both segments.
    pub fn intersect(&self, other: &Ray, clamp_to_segments: bool) -> Option<Vec2> {
        let a1 = -self.dir.y;
        let b1 = self.dir.x;
        let c1 = a1 * self.start.x + b1 * self.start.y;

        let a2 = -other.dir.y;
        let b2 = other.dir.x;
        let c2 = a2 * other.start.x + b2 * other.start.y;

        let det = a1 * b2 - a2 * b1;
        if det == 0.0 {
            // Parallel
            return None;
        }

        let x = (b2 * c1 - b1 * c2) / det;
        let y = (a1 * c2 - a2 * c1) / det;

        if clamp_to_segments {
            let (a_end, b_end) = (self.end(), other.end());
            let on_self =
                between(x, self.start.x, a_end.x) || between(y, self.start.y, a_end.y);
            let on_other =
                between(x, other.start.x, b_end.x) || between(y, other.start.y, b_end.y);
            if !(on_self && on_other) {
                return None;
            }
        }

        Some(Vec2::new(x, y))
    }
}

/// Strictly between `a` and `b`, in either order.
#[inline]
fn between(v: f32, a: f32, b: f32) -> bool {
    (a < v && v < b) || (b < v && v < a)
}
