//! Rigid body state and semi-implicit Euler integration.

use glam::{Mat2, Vec2};

use crate::shape::Shape;

/// A simulated rigid body.
///
/// Bodies live in the world's registry together with a [`Shape`]
/// component. An `inverse_mass` of zero marks an infinite-mass (static)
/// body: it never accelerates under forces or impulses, though a caller
/// may still give it a velocity to move it kinematically.
#[derive(Debug, Clone)]
pub struct Body {
    pub position: Vec2,
    pub velocity: Vec2,
    pub angle: f32,
    pub angular_velocity: f32,
    pub angular_acceleration: f32,
    /// Rotation matrix, rebuilt from `angle` every tick.
    pub rotation: Mat2,
    /// Force accumulator, consumed and reset by the integrator.
    pub force: Vec2,
    /// Per-body gravity. Applied as `gravity * mass` each tick.
    pub gravity: Vec2,
    /// Coefficient of restitution (0.0 - 1.0).
    pub restitution: f32,
    pub static_friction: f32,
    pub dynamic_friction: f32,
    /// Bodies sharing a collision group are never tested against each
    /// other.
    pub collision_group: i32,
    mass: f32,
    inverse_mass: f32,
    inertia: f32,
    inverse_inertia: f32,
    pub(crate) removed: bool,
}

impl Body {
    /// Create a dynamic body with explicit mass properties.
    pub fn new(mass: f32, inertia: f32) -> Self {
        let mut body = Self {
            position: Vec2::ZERO,
            velocity: Vec2::ZERO,
            angle: 0.0,
            angular_velocity: 0.0,
            angular_acceleration: 0.0,
            rotation: Mat2::IDENTITY,
            force: Vec2::ZERO,
            gravity: Vec2::ZERO,
            restitution: 0.3,
            static_friction: 0.5,
            dynamic_friction: 0.3,
            collision_group: -1,
            mass: 0.0,
            inverse_mass: 0.0,
            inertia: 0.0,
            inverse_inertia: 0.0,
            removed: false,
        };
        body.set_mass(mass, inertia);
        body
    }

    /// Create a dynamic body whose mass properties come from a shape.
    pub fn from_shape(shape: &Shape) -> Self {
        Self::new(shape.mass(), shape.inertia())
    }

    /// Set mass and rotational inertia, keeping the inverses in sync.
    /// A zero mass or inertia yields a zero inverse.
    pub fn set_mass(&mut self, mass: f32, inertia: f32) {
        self.mass = mass;
        self.inverse_mass = if mass != 0.0 { 1.0 / mass } else { 0.0 };
        self.inertia = inertia;
        self.inverse_inertia = if inertia != 0.0 { 1.0 / inertia } else { 0.0 };
    }

    /// Make this body immovable (infinite mass and inertia).
    pub fn set_static(&mut self) {
        self.set_mass(0.0, 0.0);
    }

    #[inline]
    pub fn is_static(&self) -> bool {
        self.inverse_mass == 0.0
    }

    #[inline]
    pub fn mass(&self) -> f32 {
        self.mass
    }

    #[inline]
    pub fn inverse_mass(&self) -> f32 {
        self.inverse_mass
    }

    #[inline]
    pub fn inertia(&self) -> f32 {
        self.inertia
    }

    #[inline]
    pub fn inverse_inertia(&self) -> f32 {
        self.inverse_inertia
    }

    /// Add to the force accumulator. Consumed on the next tick.
    pub fn apply_force(&mut self, force: Vec2) {
        self.force += force;
    }

    /// Apply an impulse at an offset from the center of mass, changing
    /// velocity immediately.
    ///
    /// The linear term is attenuated by the alignment between the impulse
    /// and the contact offset (the factor is `|cos|` of the angle between
    /// `-offset` and the impulse). This deviates from the textbook
    /// `v += inv_mass * j` and is kept as observed behavior; see DESIGN.md.
    pub fn apply_impulse(&mut self, impulse: Vec2, offset: Vec2) {
        let denom = offset.length() * impulse.length();
        let scale = if denom > f32::EPSILON {
            ((-offset).dot(impulse) / denom).abs()
        } else {
            1.0
        };
        self.velocity += self.inverse_mass * scale * impulse;
        self.angular_velocity += self.inverse_inertia * offset.perp_dot(impulse);
    }

    /// Flag this body for removal. The owning world consumes the flag and
    /// drops the body at the start of its next tick.
    pub fn set_remove(&mut self) {
        self.removed = true;
    }

    /// Advance the body by `dt` seconds.
    ///
    /// Semi-implicit Euler: angular state first, then gravity into the
    /// force accumulator, then linear state from the accumulated force.
    /// The accumulator is reset afterwards.
    pub(crate) fn integrate(&mut self, dt: f32) {
        self.angular_velocity += dt * self.angular_acceleration;
        self.angle += dt * self.angular_velocity;
        self.rotation = Mat2::from_angle(self.angle);

        self.force += self.gravity * self.mass;

        let acceleration = self.force * self.inverse_mass;
        self.velocity += dt * acceleration;
        self.position += dt * self.velocity;

        self.force = Vec2::ZERO;
    }

    // Orientation helpers in the screen-space (y-down) convention, where
    // "up" is negative y.

    pub fn up(&self) -> Vec2 {
        self.rotation * Vec2::NEG_Y
    }

    pub fn down(&self) -> Vec2 {
        self.rotation * Vec2::Y
    }

    pub fn left(&self) -> Vec2 {
        self.rotation * Vec2::NEG_X
    }

    pub fn right(&self) -> Vec2 {
        self.rotation * Vec2::X
    }
}
