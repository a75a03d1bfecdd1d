//! Sequential impulse contact resolution with friction.
//!
//! Body states are read as snapshots and written back through scoped
//! registry borrows, one body at a time; the registry is never borrowed
//! mutably twice at once.

use glam::Vec2;
use hecs::Entity;

use crate::body::Body;
use crate::contact::Manifold;
use crate::math::approx_zero;

/// Penetration allowed before positional correction kicks in.
const PENETRATION_SLOP: f32 = 0.05;
/// Fraction of the residual penetration corrected per tick.
const CORRECTION_PERCENT: f32 = 0.4;

/// Resolve a manifold by applying normal and friction impulses to both
/// bodies through their impulse routines.
///
/// Resolution stops for the whole manifold as soon as a contact reports a
/// separating relative velocity. Two infinite-mass bodies short-circuit
/// to a zero-velocity correction.
pub fn apply_impulse(manifold: &mut Manifold, world: &mut hecs::World) {
    let (a, b) = (manifold.body_a, manifold.body_b);

    let (Some(state_a), Some(state_b)) = (snapshot(world, a), snapshot(world, b)) else {
        return;
    };
    if approx_zero(state_a.inverse_mass + state_b.inverse_mass) {
        infinite_mass_correction(world, a, b);
        return;
    }

    manifold.intensity = 0.0;
    let contact_count = manifold.contact_count;

    for i in 0..contact_count {
        let contact = manifold.contacts[i];

        let (Some(state_a), Some(state_b)) = (snapshot(world, a), snapshot(world, b)) else {
            return;
        };

        // Radii from each center of mass to the contact.
        let ra = contact - state_a.position;
        let rb = contact - state_b.position;

        let rv = relative_velocity(&state_a, &state_b, ra, rb);
        let contact_velocity = rv.dot(manifold.normal);

        // Already separating: leave the whole manifold unresolved.
        if contact_velocity > 0.0 {
            return;
        }

        manifold.intensity = manifold.intensity.max(-contact_velocity);

        let ra_cross_n = ra.perp_dot(manifold.normal);
        let rb_cross_n = rb.perp_dot(manifold.normal);
        let inv_mass_sum = state_a.inverse_mass
            + state_b.inverse_mass
            + ra_cross_n * ra_cross_n * state_a.inverse_inertia
            + rb_cross_n * rb_cross_n * state_b.inverse_inertia;

        // Normal impulse scalar, split evenly across the contacts.
        let mut j = -(1.0 + manifold.restitution) * contact_velocity;
        j /= inv_mass_sum;
        j /= contact_count as f32;

        let impulse = manifold.normal * j;
        impulse_pair(world, a, b, impulse, ra, rb);

        // Friction, from the velocities left after the normal impulse.
        let (Some(state_a), Some(state_b)) = (snapshot(world, a), snapshot(world, b)) else {
            return;
        };
        let rv = relative_velocity(&state_a, &state_b, ra, rb);

        let tangent = (rv - manifold.normal * rv.dot(manifold.normal)).normalize_or_zero();

        let mut jt = -rv.dot(tangent);
        jt /= inv_mass_sum;
        jt /= contact_count as f32;

        // Tiny friction impulses are not worth applying.
        if approx_zero(jt) {
            continue;
        }

        // Coulomb's law: stick below the static threshold, slide with
        // dynamic friction above it.
        let tangent_impulse = if jt.abs() < j * manifold.static_friction {
            tangent * jt
        } else {
            tangent * (-j * manifold.dynamic_friction)
        };

        impulse_pair(world, a, b, tangent_impulse, ra, rb);
    }
}

/// Push the pair apart along the contact normal to bleed off the
/// penetration left by discrete integration. Corrects only the depth
/// beyond the slop, scaled by the correction percentage and weighted by
/// each body's inverse-mass share.
pub fn positional_correction(manifold: &Manifold, world: &mut hecs::World) {
    let (a, b) = (manifold.body_a, manifold.body_b);

    let (Some(state_a), Some(state_b)) = (snapshot(world, a), snapshot(world, b)) else {
        return;
    };
    let inv_mass_sum = state_a.inverse_mass + state_b.inverse_mass;
    if inv_mass_sum == 0.0 {
        return;
    }

    let correction = (manifold.penetration - PENETRATION_SLOP).max(0.0) / inv_mass_sum
        * CORRECTION_PERCENT
        * manifold.normal;

    if let Ok(mut body) = world.get::<&mut Body>(a) {
        let shift = correction * body.inverse_mass();
        body.position -= shift;
    }
    if let Ok(mut body) = world.get::<&mut Body>(b) {
        let shift = correction * body.inverse_mass();
        body.position += shift;
    }
}

/// Velocity of B relative to A at the contact, including the angular
/// contributions.
fn relative_velocity(a: &BodyState, b: &BodyState, ra: Vec2, rb: Vec2) -> Vec2 {
    b.velocity + b.angular_velocity * rb.perp() - a.velocity - a.angular_velocity * ra.perp()
}

fn infinite_mass_correction(world: &mut hecs::World, a: Entity, b: Entity) {
    if let Ok(mut body) = world.get::<&mut Body>(a) {
        body.velocity = Vec2::ZERO;
    }
    if let Ok(mut body) = world.get::<&mut Body>(b) {
        body.velocity = Vec2::ZERO;
    }
}

/// Apply `-impulse` to A at `ra` and `impulse` to B at `rb`.
fn impulse_pair(world: &mut hecs::World, a: Entity, b: Entity, impulse: Vec2, ra: Vec2, rb: Vec2) {
    if let Ok(mut body) = world.get::<&mut Body>(a) {
        body.apply_impulse(-impulse, ra);
    }
    if let Ok(mut body) = world.get::<&mut Body>(b) {
        body.apply_impulse(impulse, rb);
    }
}

/// Per-body values the solver math needs, copied out of the registry.
struct BodyState {
    inverse_mass: f32,
    inverse_inertia: f32,
    velocity: Vec2,
    angular_velocity: f32,
    position: Vec2,
}

fn snapshot(world: &hecs::World, entity: Entity) -> Option<BodyState> {
    let body = world.get::<&Body>(entity).ok()?;
    Some(BodyState {
        inverse_mass: body.inverse_mass(),
        inverse_inertia: body.inverse_inertia(),
        velocity: body.velocity,
        angular_velocity: body.angular_velocity,
        position: body.position,
    })
}
