//! Dedicated simulation thread driving a world at a fixed timestep.
//!
//! The thread runs a tight loop of `World::update(fixed_timestep)` until
//! stopped; there is no pacing, so wall-clock speed depends on the host.
//! The world lives behind a mutex that is held for exactly one tick at a
//! time, which is how presentation layers on other threads get a
//! consistent view between ticks.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::thread::{self, JoinHandle};

use crate::world::World;

/// Owns a [`World`] and the thread simulating it.
pub struct Simulation {
    world: Arc<Mutex<World>>,
    stop: Arc<AtomicBool>,
    thread: Option<JoinHandle<()>>,
}

impl Simulation {
    pub fn new(world: World) -> Self {
        Self {
            world: Arc::new(Mutex::new(world)),
            stop: Arc::new(AtomicBool::new(false)),
            thread: None,
        }
    }

    /// A shared handle to the world. Lock it to read or mutate body state
    /// between ticks.
    pub fn world(&self) -> Arc<Mutex<World>> {
        Arc::clone(&self.world)
    }

    pub fn is_running(&self) -> bool {
        self.thread.is_some()
    }

    /// Spawn the simulation thread. A no-op when already running.
    pub fn start(&mut self) -> anyhow::Result<()> {
        if self.thread.is_some() {
            return Ok(());
        }

        let dt = self
            .world
            .lock()
            .map_err(|_| anyhow::anyhow!("world lock poisoned"))?
            .config()
            .fixed_timestep;

        self.stop.store(false, Ordering::Relaxed);
        let world = Arc::clone(&self.world);
        let stop = Arc::clone(&self.stop);

        let handle = thread::Builder::new()
            .name("impel-simulation".to_string())
            .spawn(move || {
                tracing::debug!(dt, "simulation thread started");
                while !stop.load(Ordering::Relaxed) {
                    let Ok(mut world) = world.lock() else {
                        break;
                    };
                    world.update(dt);
                }
                tracing::debug!("simulation thread stopped");
            })?;

        self.thread = Some(handle);
        Ok(())
    }

    /// Signal the thread to stop and wait for it to exit. A panic on the
    /// simulation thread surfaces here as an error.
    pub fn stop(&mut self) -> anyhow::Result<()> {
        self.stop.store(true, Ordering::Relaxed);
        if let Some(thread) = self.thread.take() {
            thread
                .join()
                .map_err(|_| anyhow::anyhow!("simulation thread panicked"))?;
        }
        Ok(())
    }
}

impl Drop for Simulation {
    fn drop(&mut self) {
        self.stop.store(true, Ordering::Relaxed);
        if let Some(thread) = self.thread.take() {
            let _ = thread.join();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::body::Body;
    use crate::shape::{Polygon, Shape};
    use crate::world::WorldConfig;
    use glam::Vec2;
    use std::time::Duration;

    #[test]
    fn test_simulation_advances_world() {
        let mut world = World::new(WorldConfig::default());
        let shape: Shape = Polygon::rect(Vec2::new(1.0, 1.0), 1.0).into();
        let mut body = Body::from_shape(&shape);
        body.gravity = Vec2::new(0.0, 1.62);
        let entity = world.add(body, shape);

        let mut simulation = Simulation::new(world);
        simulation.start().unwrap();
        assert!(simulation.is_running());

        thread::sleep(Duration::from_millis(50));
        simulation.stop().unwrap();
        assert!(!simulation.is_running());

        let world = simulation.world();
        let world = world.lock().unwrap();
        let body = world.body(entity).unwrap();
        assert!(
            body.position.y > 0.0,
            "body should have fallen: y = {}",
            body.position.y
        );
    }

    #[test]
    fn test_stop_without_start_is_fine() {
        let mut simulation = Simulation::new(World::default());
        simulation.stop().unwrap();
        simulation.stop().unwrap();
    }

    #[test]
    fn test_start_twice_keeps_one_thread() {
        let mut simulation = Simulation::new(World::default());
        simulation.start().unwrap();
        simulation.start().unwrap();
        assert!(simulation.is_running());
        simulation.stop().unwrap();

        // Restartable after a stop.
        simulation.start().unwrap();
        assert!(simulation.is_running());
        simulation.stop().unwrap();
    }
}
