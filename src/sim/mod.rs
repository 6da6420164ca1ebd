//! Deterministic simulation module
//!
//! All gameplay logic lives here. This module must be pure and deterministic:
//! - Fixed timestep only
//! - Seeded RNG only
//! - Stable iteration order (pickups by id)
//! - No rendering or platform dependencies

pub mod control;
pub mod physics;
pub mod pickups;
pub mod rig;
pub mod rng;
pub mod state;
pub mod terrain;
pub mod tick;

pub use physics::{BodyState, ContactSet, MotorCommand, PhysicsWorld, RigBody, Wheel};
pub use pickups::{Pickup, PickupKind, layout_pickups};
pub use rig::RapierWorld;
pub use rng::{SeededRng, daily_seed};
pub use state::{AirState, HudSnapshot, RunState, RunStatus, SimEvent, Toast};
pub use terrain::{SegmentKind, Track};
pub use tick::{Session, TickInput, tick};
