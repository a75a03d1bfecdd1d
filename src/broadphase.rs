//! Broadphase pairing: the cached collision-group pair list.
//!
//! Every unordered pair of bodies with differing collision groups is
//! eligible for narrowphase testing; bodies sharing a group are never
//! tested against each other. The list is cached with an explicit dirty
//! flag and rebuilt lazily after registry mutations, so unchanged worlds
//! reuse it across ticks.

use hecs::Entity;

use crate::body::Body;

/// The cached list of collision-eligible entity pairs.
pub struct CollisionPairs {
    pairs: Vec<(Entity, Entity)>,
    dirty: bool,
}

impl CollisionPairs {
    pub fn new() -> Self {
        Self {
            pairs: Vec::new(),
            dirty: true,
        }
    }

    /// Mark the cache stale. The next [`refresh`](Self::refresh) rebuilds
    /// it.
    pub fn invalidate(&mut self) {
        self.dirty = true;
    }

    #[inline]
    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    /// Rebuild the pair list if it is stale, scanning all unordered body
    /// pairs and keeping those whose collision groups differ.
    pub fn refresh(&mut self, world: &hecs::World) {
        if !self.dirty {
            return;
        }

        let mut bodies: Vec<(Entity, i32)> = world
            .query::<&Body>()
            .iter()
            .map(|(entity, body)| (entity, body.collision_group))
            .collect();
        bodies.sort_unstable_by_key(|&(entity, _)| entity.id());

        self.pairs.clear();
        for i in 0..bodies.len() {
            for j in (i + 1)..bodies.len() {
                if bodies[i].1 != bodies[j].1 {
                    self.pairs.push((bodies[i].0, bodies[j].0));
                }
            }
        }

        self.dirty = false;
        tracing::trace!(pairs = self.pairs.len(), "rebuilt collision pair cache");
    }

    #[inline]
    pub fn as_slice(&self) -> &[(Entity, Entity)] {
        &self.pairs
    }
}

impl Default for CollisionPairs {
    fn default() -> Self {
        Self::new()
    }
}
