//! World orchestration: body registry, per-tick pipeline, ray casting.
//!
//! Each [`World::update`] tick runs the pipeline:
//!
//! 1. Integrate every body, refresh its shape's world-space data, and
//!    drop bodies flagged for removal.
//! 2. Refresh the cached pair list; for every eligible pair run the
//!    narrow phase, and on contact mix materials, apply impulses, apply
//!    positional correction, and raise the collision notification.

use glam::Vec2;
use hecs::Entity;

use crate::body::Body;
use crate::broadphase::CollisionPairs;
use crate::contact::Manifold;
use crate::math::Ray;
use crate::shape::Shape;
use crate::{narrowphase, solver};

/// Configuration for a simulated world.
#[derive(Debug, Clone)]
pub struct WorldConfig {
    /// World bounds. Kept for the presentation layer's convenience; the
    /// engine does not enforce them.
    pub size: Vec2,
    /// Timestep the simulation thread feeds to `update`, in seconds.
    /// Default: 1/60.
    pub fixed_timestep: f32,
}

impl Default for WorldConfig {
    fn default() -> Self {
        Self {
            size: Vec2::new(192.0, 108.0),
            fixed_timestep: 1.0 / 60.0,
        }
    }
}

/// Callback invoked with each resolved manifold, once per pair per tick.
pub type CollisionHandler = Box<dyn FnMut(&Manifold) + Send>;

/// Result of a ray cast: the hit point and the body that owns the edge.
#[derive(Debug, Clone, Copy)]
pub struct RayHit {
    pub point: Vec2,
    pub body: Entity,
}

/// The simulated world: a registry of bodies and shapes plus the
/// per-tick collision pipeline.
pub struct World {
    config: WorldConfig,
    entities: hecs::World,
    pairs: CollisionPairs,
    collisions: Vec<Manifold>,
    handler: Option<CollisionHandler>,
}

impl World {
    pub fn new(config: WorldConfig) -> Self {
        Self {
            config,
            entities: hecs::World::new(),
            pairs: CollisionPairs::new(),
            collisions: Vec::new(),
            handler: None,
        }
    }

    #[inline]
    pub fn config(&self) -> &WorldConfig {
        &self.config
    }

    /// Add a body with its collision shape. The shape's world-space data
    /// is refreshed against the body before spawning, so queries work
    /// before the first tick.
    pub fn add(&mut self, body: Body, shape: impl Into<Shape>) -> Entity {
        let mut shape = shape.into();
        shape.refresh(&body);
        let entity = self.entities.spawn((body, shape));
        self.pairs.invalidate();
        tracing::trace!(?entity, "body added");
        entity
    }

    /// Attach an opaque payload to a body's entity. The engine never
    /// inspects it; it travels with the body and comes back through
    /// [`payload`](Self::payload).
    pub fn attach<T: Send + Sync + 'static>(&mut self, entity: Entity, payload: T) -> bool {
        self.entities.insert_one(entity, payload).is_ok()
    }

    /// Read a payload previously attached with [`attach`](Self::attach).
    pub fn payload<T: Send + Sync + 'static>(&self, entity: Entity) -> Option<hecs::Ref<'_, T>> {
        self.entities.get::<&T>(entity).ok()
    }

    pub fn body(&self, entity: Entity) -> Option<hecs::Ref<'_, Body>> {
        self.entities.get::<&Body>(entity).ok()
    }

    pub fn body_mut(&mut self, entity: Entity) -> Option<hecs::RefMut<'_, Body>> {
        self.entities.get::<&mut Body>(entity).ok()
    }

    /// Remove every body.
    pub fn clear(&mut self) {
        self.entities.clear();
        self.pairs.invalidate();
        self.collisions.clear();
    }

    pub fn len(&self) -> u32 {
        self.entities.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entities.len() == 0
    }

    /// Advance the simulation by `dt` seconds.
    pub fn update(&mut self, dt: f32) {
        // Integrate and compact.
        let mut removed = Vec::new();
        for (entity, (body, shape)) in self.entities.query_mut::<(&mut Body, &mut Shape)>() {
            body.integrate(dt);
            shape.refresh(body);
            if body.removed {
                body.removed = false;
                removed.push(entity);
            }
        }
        if !removed.is_empty() {
            tracing::debug!(count = removed.len(), "dropping bodies flagged for removal");
            for entity in removed {
                let _ = self.entities.despawn(entity);
            }
            self.pairs.invalidate();
        }

        // Pair and resolve.
        self.pairs.refresh(&self.entities);
        self.collisions.clear();

        for &(a, b) in self.pairs.as_slice() {
            let mut manifold = Manifold::new(a, b);
            {
                let Ok(body_a) = self.entities.get::<&Body>(a) else {
                    continue;
                };
                let Ok(body_b) = self.entities.get::<&Body>(b) else {
                    continue;
                };
                if body_a.is_static() && body_b.is_static() {
                    continue;
                }
                let Ok(shape_a) = self.entities.get::<&Shape>(a) else {
                    continue;
                };
                let Ok(shape_b) = self.entities.get::<&Shape>(b) else {
                    continue;
                };

                narrowphase::solve(&mut manifold, &shape_a, &shape_b);
                if manifold.contact_count > 0 {
                    manifold.mix_materials(&body_a, &body_b);
                }
            }

            if manifold.contact_count == 0 {
                continue;
            }

            solver::apply_impulse(&mut manifold, &mut self.entities);
            solver::positional_correction(&manifold, &mut self.entities);

            if let Some(handler) = self.handler.as_mut() {
                handler(&manifold);
            }
            self.collisions.push(manifold);
        }
    }

    /// The manifolds resolved by the most recent `update`.
    #[inline]
    pub fn collisions(&self) -> &[Manifold] {
        &self.collisions
    }

    /// Install the collision callback. It fires synchronously from inside
    /// `update`, so it must not add or remove bodies.
    pub fn on_collision(&mut self, handler: impl FnMut(&Manifold) + Send + 'static) {
        self.handler = Some(Box::new(handler));
    }

    /// The collision-eligible entity pairs, recomputing the cache if the
    /// registry changed.
    pub fn pairs(&mut self) -> &[(Entity, Entity)] {
        self.pairs.refresh(&self.entities);
        self.pairs.as_slice()
    }

    /// Visit every body in the registry.
    pub fn for_each_body(&self, mut proc: impl FnMut(Entity, &Body, &Shape)) {
        for (entity, (body, shape)) in self.entities.query::<(&Body, &Shape)>().iter() {
            proc(entity, body, shape);
        }
    }

    /// Cast a ray (bounded by the length of its direction) against every
    /// shape edge, returning the hit nearest to the ray start.
    pub fn try_ray_cast(&self, ray: Ray) -> Option<RayHit> {
        let mut nearest: Option<(f32, RayHit)> = None;
        for (entity, shape) in self.entities.query::<&Shape>().iter() {
            for edge in shape.edges() {
                let Some(point) = ray.intersect(&edge, true) else {
                    continue;
                };
                let distance = point.distance_squared(ray.start);
                if nearest.map_or(true, |(best, _)| distance < best) {
                    nearest = Some((distance, RayHit { point, body: entity }));
                }
            }
        }
        nearest.map(|(_, hit)| hit)
    }

    /// Direct access to the underlying registry, for game layers that
    /// attach their own components or iterate in custom ways. Mutating
    /// bodies while `update` runs on another thread is a race; see
    /// [`Simulation`](crate::runner::Simulation).
    pub fn inner(&self) -> &hecs::World {
        &self.entities
    }

    pub fn inner_mut(&mut self) -> &mut hecs::World {
        &mut self.entities
    }
}

impl Default for World {
    fn default() -> Self {
        Self::new(WorldConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shape::Polygon;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    const DT: f32 = 1.0 / 60.0;

    fn dynamic_box(size: Vec2, position: Vec2, group: i32) -> (Body, Shape) {
        let shape: Shape = Polygon::rect(size, 1.0).into();
        let mut body = Body::from_shape(&shape);
        body.position = position;
        body.collision_group = group;
        (body, shape)
    }

    fn static_box(size: Vec2, position: Vec2, group: i32) -> (Body, Shape) {
        let (mut body, shape) = dynamic_box(size, position, group);
        body.set_static();
        (body, shape)
    }

    #[test]
    fn test_box_settles_on_static_floor() {
        // Screen coordinates: gravity pulls toward +y, the floor sits
        // below the box at larger y.
        let mut world = World::default();

        let (mut falling, shape) = dynamic_box(Vec2::new(2.0, 2.0), Vec2::ZERO, 1);
        falling.gravity = Vec2::new(0.0, 1.62);
        falling.restitution = 0.5;
        let falling = world.add(falling, shape);

        let (mut floor_body, floor_shape) =
            static_box(Vec2::new(10.0, 1.0), Vec2::new(0.0, 6.0), 0);
        floor_body.restitution = 0.5;
        world.add(floor_body, floor_shape);

        for _ in 0..1200 {
            world.update(DT);
        }

        let body = world.body(falling).unwrap();
        // Rest: contact surfaces meet at y = 4.5 (6 - 0.5 - 1).
        assert!(
            body.velocity.length() < 0.2,
            "box should be at rest: v = {:?}",
            body.velocity
        );
        assert!(
            body.position.y <= 4.5 + 0.06,
            "box must not sink past the slop: y = {}",
            body.position.y
        );
        assert!(
            body.position.y > 4.0,
            "box should rest on the floor, not above it: y = {}",
            body.position.y
        );
    }

    #[test]
    fn test_collision_notification_carries_manifold() {
        let mut world = World::default();

        let (mut falling, shape) = dynamic_box(Vec2::new(2.0, 2.0), Vec2::new(0.0, 3.4), 1);
        falling.gravity = Vec2::new(0.0, 1.62);
        world.add(falling, shape);
        let (floor_body, floor_shape) = static_box(Vec2::new(10.0, 1.0), Vec2::new(0.0, 6.0), 0);
        world.add(floor_body, floor_shape);

        let hits = Arc::new(AtomicUsize::new(0));
        let seen = Arc::clone(&hits);
        world.on_collision(move |manifold| {
            assert!(manifold.contact_count > 0);
            assert!(manifold.intensity >= 0.0);
            seen.fetch_add(1, Ordering::Relaxed);
        });

        for _ in 0..240 {
            world.update(DT);
        }

        assert!(hits.load(Ordering::Relaxed) > 0);
        // The last tick's manifolds stay readable after update.
        let resting_contact = world
            .collisions()
            .iter()
            .all(|m| m.contact_count > 0 && m.normal.length() > 0.9);
        assert!(resting_contact);
    }

    #[test]
    fn test_same_group_pairs_never_tested() {
        let mut world = World::default();

        // Two overlapping boxes in the same group.
        let (a, shape_a) = dynamic_box(Vec2::new(2.0, 2.0), Vec2::ZERO, 3);
        let (b, shape_b) = dynamic_box(Vec2::new(2.0, 2.0), Vec2::new(0.5, 0.0), 3);
        world.add(a, shape_a);
        world.add(b, shape_b);

        assert!(world.pairs().is_empty());
        world.update(DT);
        assert!(world.collisions().is_empty());
    }

    #[test]
    fn test_static_pair_skipped() {
        let mut world = World::default();

        let (a, shape_a) = static_box(Vec2::new(2.0, 2.0), Vec2::ZERO, 0);
        let (b, shape_b) = static_box(Vec2::new(2.0, 2.0), Vec2::new(0.5, 0.0), 1);
        world.add(a, shape_a);
        world.add(b, shape_b);

        // Eligible as a pair, but never resolved.
        assert_eq!(world.pairs().len(), 1);
        world.update(DT);
        assert!(world.collisions().is_empty());
    }

    #[test]
    fn test_removal_is_consumed_on_next_tick() {
        let mut world = World::default();

        let (a, shape_a) = dynamic_box(Vec2::new(1.0, 1.0), Vec2::ZERO, 0);
        let (b, shape_b) = dynamic_box(Vec2::new(1.0, 1.0), Vec2::new(5.0, 0.0), 1);
        let doomed = world.add(a, shape_a);
        world.add(b, shape_b);

        assert_eq!(world.pairs().len(), 1);

        world.body_mut(doomed).unwrap().set_remove();
        assert_eq!(world.len(), 2);

        world.update(DT);
        assert_eq!(world.len(), 1);
        assert!(world.body(doomed).is_none());
        // The pair cache saw the mutation.
        assert!(world.pairs().is_empty());
    }

    #[test]
    fn test_ray_cast_reports_nearest_edge() {
        let mut world = World::default();

        let (body, shape) = dynamic_box(Vec2::new(2.0, 2.0), Vec2::new(5.0, 0.0), 0);
        let target = world.add(body, shape);

        let hit = world
            .try_ray_cast(Ray::new(Vec2::ZERO, Vec2::new(20.0, 0.0)))
            .expect("ray through the square must hit");
        // Entry edge at x = 4, exit edge at x = 6; the nearer one wins.
        assert!((hit.point - Vec2::new(4.0, 0.0)).length() < 1e-4);
        assert_eq!(hit.body, target);

        // A ray pointed away hits nothing.
        assert!(world
            .try_ray_cast(Ray::new(Vec2::ZERO, Vec2::new(-20.0, 0.0)))
            .is_none());
    }

    #[test]
    fn test_clear_empties_registry_and_cache() {
        let mut world = World::default();

        let (a, shape_a) = dynamic_box(Vec2::new(1.0, 1.0), Vec2::ZERO, 0);
        let (b, shape_b) = dynamic_box(Vec2::new(1.0, 1.0), Vec2::new(3.0, 0.0), 1);
        world.add(a, shape_a);
        world.add(b, shape_b);
        assert_eq!(world.pairs().len(), 1);

        world.clear();
        assert!(world.is_empty());
        assert!(world.pairs().is_empty());
        world.update(DT);
    }

    #[test]
    fn test_payload_round_trip() {
        #[derive(Debug, PartialEq)]
        struct Tag(&'static str);

        let mut world = World::default();
        let (body, shape) = dynamic_box(Vec2::new(1.0, 1.0), Vec2::ZERO, 0);
        let entity = world.add(body, shape);

        assert!(world.attach(entity, Tag("lander")));
        assert_eq!(*world.payload::<Tag>(entity).unwrap(), Tag("lander"));
        assert!(world.payload::<u64>(entity).is_none());
    }

    #[test]
    fn test_for_each_body_visits_all() {
        let mut world = World::default();
        let (a, shape_a) = dynamic_box(Vec2::new(1.0, 1.0), Vec2::ZERO, 0);
        let (b, shape_b) = dynamic_box(Vec2::new(1.0, 1.0), Vec2::new(3.0, 0.0), 1);
        world.add(a, shape_a);
        world.add(b, shape_b);

        let mut count = 0;
        world.for_each_body(|_, body, shape| {
            count += 1;
            assert!(body.mass() > 0.0);
            assert_eq!(shape.axes().len(), 2);
        });
        assert_eq!(count, 2);
    }
}
