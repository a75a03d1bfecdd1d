//! impel 2D physics engine
//!
//! An impulse-based rigid-body engine for convex polygons: SAT collision
//! detection, contact manifolds built by reference/incident face
//! clipping, sequential-impulse resolution with friction, and positional
//! drift correction.
//!
//! # Architecture
//!
//! The pipeline runs once per tick, bottom layers first:
//!
//! 1. **math** - 2D primitives (rays, line intersection)
//! 2. **body** - rigid-body state and semi-implicit Euler integration
//! 3. **shape** - convex polygons and the shape capability surface
//! 4. **broadphase** - cached collision-group pair list
//! 5. **narrowphase** - SAT + reference face clipping into manifolds
//! 6. **solver** - sequential impulses, friction, positional correction
//! 7. **world** - registry, tick orchestration, ray casting, events
//! 8. **runner** - dedicated simulation thread (start/stop)
//!
//! Bodies live in a [`hecs`] registry as a [`Body`] component paired with
//! a [`Shape`] component; game layers may attach their own payload
//! components alongside them.

pub mod body;
pub mod broadphase;
pub mod contact;
pub mod math;
pub mod narrowphase;
pub mod runner;
pub mod shape;
pub mod solver;
pub mod world;

// Re-export commonly used types
pub use body::Body;
pub use broadphase::CollisionPairs;
pub use contact::{Face, Manifold};
pub use math::{Ray, EPSILON};
pub use runner::Simulation;
pub use shape::{Polygon, Shape, ShapeError};
pub use world::{CollisionHandler, RayHit, World, WorldConfig};

// Re-export the math and registry crates for convenience
pub use glam;
pub use hecs;
