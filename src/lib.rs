//! Magic Floor - a shimmering circular floor experience
//!
//! Core modules:
//! - `sim`: Deterministic simulation (stage machine, player physics, water grid)
//! - `renderer`: WebGPU floor rendering + water compute pass
//! - `camera`: Stage-driven camera rig
//! - `settings`: Quality tiers and persisted preferences

pub mod camera;
pub mod renderer;
pub mod settings;
pub mod sim;

pub use settings::{QualityConfig, QualityTier, Settings};

use glam::Vec2;

/// World configuration constants
pub mod consts {
    /// Side length of the square plane mesh (world units)
    pub const PLANE_SIZE: f32 = 16.0;
    /// Radius of the walkable circular floor
    pub const PLANE_RADIUS: f32 = PLANE_SIZE / 2.0;

    /// Player sphere radius
    pub const PLAYER_RADIUS: f32 = 0.14;
    /// Rest height of the player center - sits just above the plane
    pub const PLAYER_HEIGHT: f32 = PLAYER_RADIUS;
    /// Where the player spawns, near the plane's edge
    pub const PLAYER_INITIAL_POS: [f32; 3] = [0.5, PLAYER_HEIGHT, PLANE_RADIUS - 1.0];

    /// Stage bounds (world units). Distances are from the plane origin.
    pub const INNER_RING_RADIUS: f32 = 4.5;
    pub const CENTER_RADIUS: f32 = PLAYER_RADIUS * 6.0;

    /// Speed model
    pub const MAX_SPEED: f32 = 1.0;
    pub const MOVE_SPEED: f32 = 2.0;
    pub const ACCEL: f32 = 0.4;
    pub const FRICTION: f32 = 0.6;
    /// Low-pass smoothing rate for the speed filter
    pub const SPEED_SMOOTH_LAMBDA: f32 = 10.0;
    /// Below this, a decaying speed snaps to exactly zero
    pub const SPEED_EPSILON: f32 = 1e-4;

    /// Bounce oscillator
    pub const BOUNCE_MIN_AMP: f32 = 0.01;
    pub const BOUNCE_MAX_AMP: f32 = 0.08;
    pub const BOUNCE_BASE_HZ: f32 = 2.5;
    pub const BOUNCE_HZ_GAIN: f32 = 2.5;

    /// Water tuning
    pub const WATER_IMPACT_DEPTH: f32 = 0.16;
    pub const WATER_VISCOSITY: f32 = 0.975;
    pub const WATER_IMPACT_SIZE: f32 = PLAYER_RADIUS;
    /// Scales the smoothed speed before it reaches the water kernel
    pub const WATER_SPEED_GAIN: f32 = 0.7;

    /// Tiny inset on the circular boundary clamp to avoid edge jitter
    pub const BOUNDARY_INSET: f32 = 1e-3;

    /// Radius-based stage detection runs every this many ticks
    pub const STAGE_CHECK_INTERVAL: u32 = 20;
}

/// Planar radius of an (x, z) point from the plane origin
#[inline]
pub fn planar_radius(x: f32, z: f32) -> f32 {
    Vec2::new(x, z).length()
}

/// Wrap an oscillator phase into [0, 2π)
#[inline]
pub fn wrap_phase(phase: f32) -> f32 {
    phase.rem_euclid(std::f32::consts::TAU)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::f32::consts::TAU;

    #[test]
    fn test_planar_radius() {
        assert_eq!(planar_radius(3.0, 4.0), 5.0);
        assert_eq!(planar_radius(0.0, 0.0), 0.0);
    }

    #[test]
    fn test_wrap_phase() {
        assert!((wrap_phase(TAU + 0.5) - 0.5).abs() < 1e-6);
        assert!(wrap_phase(-0.1) >= 0.0);
        assert!(wrap_phase(3.0 * TAU) < TAU);
    }
}
