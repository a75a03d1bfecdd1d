//! Contact data structures for collision response.

use glam::Vec2;
use hecs::Entity;

use crate::body::Body;

/// A face segment in world space. The narrow phase clips the incident
/// face in place, so a manifold carries the post-clip segment.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Face {
    pub start: Vec2,
    pub end: Vec2,
}

/// Contact information for one colliding pair for one tick.
///
/// Manifolds are transient: the world builds one per tested pair, the
/// solver consumes it, and a copy is handed to collision consumers as
/// the event snapshot.
#[derive(Debug, Clone)]
pub struct Manifold {
    pub body_a: Entity,
    pub body_b: Entity,
    /// Contact normal, pointing from A to B.
    pub normal: Vec2,
    /// Penetration depth, averaged over the contact points.
    pub penetration: f32,
    /// Contact points in world space; only the first `contact_count`
    /// entries are meaningful.
    pub contacts: [Vec2; 2],
    pub contact_count: usize,
    /// The incident face after clipping.
    pub incident: Face,
    /// Mixed restitution of the pair.
    pub restitution: f32,
    pub static_friction: f32,
    pub dynamic_friction: f32,
    /// Largest approach speed along the normal across the contacts. Game
    /// layers use this for impact sounds and damage thresholds.
    pub intensity: f32,
}

impl Manifold {
    pub(crate) fn new(body_a: Entity, body_b: Entity) -> Self {
        Self {
            body_a,
            body_b,
            normal: Vec2::ZERO,
            penetration: 0.0,
            contacts: [Vec2::ZERO; 2],
            contact_count: 0,
            incident: Face::default(),
            restitution: 0.0,
            static_friction: 0.0,
            dynamic_friction: 0.0,
            intensity: 0.0,
        }
    }

    /// The valid contact points.
    #[inline]
    pub fn contacts(&self) -> &[Vec2] {
        &self.contacts[..self.contact_count]
    }

    /// Combine the pair's materials: the smaller restitution wins, and
    /// friction coefficients mix geometrically.
    pub fn mix_materials(&mut self, a: &Body, b: &Body) {
        self.restitution = a.restitution.min(b.restitution);
        self.static_friction = mix_friction(a.static_friction, b.static_friction);
        self.dynamic_friction = mix_friction(a.dynamic_friction, b.dynamic_friction);
    }
}

fn mix_friction(a: f32, b: f32) -> f32 {
    (a * b).sqrt()
}
