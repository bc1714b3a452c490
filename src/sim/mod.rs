//! Deterministic simulation module
//!
//! All experience logic lives here. This module must be pure and
//! deterministic: fixed update order within a tick, no rendering or
//! platform dependencies, and exactly one writer (the tick pipeline).
//! External layers read committed snapshots between ticks.

pub mod player;
pub mod stage;
pub mod tick;
pub mod water;

pub use player::{IntentFlags, PlayerSnapshot, PlayerState};
pub use stage::{Stage, StageMachine, stage_from_radius};
pub use tick::{SimContext, TickInput};
pub use water::{HeightField, WaterKernelInputs, impact_at};
