//! Player movement integrator
//!
//! Per-tick model: directional intent ramps a raw speed with acceleration
//! and friction, a low-pass filter smooths it, position integrates in the
//! plane with a circular boundary clamp, and a phase oscillator drives the
//! vertical bounce. The smoothed speed - not the raw one - feeds bounce
//! amplitude/frequency and the water impact strength, so impacts ramp and
//! decay instead of snapping.

use glam::{Vec2, Vec3};

use crate::consts::*;
use crate::{planar_radius, wrap_phase};

/// Currently-held directional inputs (±X / ±Z)
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct IntentFlags {
    pub forward: bool,
    pub backward: bool,
    pub left: bool,
    pub right: bool,
}

impl IntentFlags {
    /// Normalized intent direction in the XZ plane; zero when no keys held
    pub fn direction(&self) -> Vec2 {
        let mut v = Vec2::ZERO;
        if self.left {
            v.x -= 1.0;
        }
        if self.right {
            v.x += 1.0;
        }
        if self.forward {
            v.y -= 1.0;
        }
        if self.backward {
            v.y += 1.0;
        }
        v.normalize_or_zero()
    }
}

/// Read-only per-tick view of the player for the water kernel and the
/// stage machine. They never mutate player state.
#[derive(Debug, Clone, Copy)]
pub struct PlayerSnapshot {
    pub position: Vec3,
    pub bounce_phase: f32,
    pub speed_smooth: f32,
}

/// Mutable player record, owned exclusively by this module.
/// Lives for the whole session.
#[derive(Debug, Clone)]
pub struct PlayerState {
    /// World position (x, y, z); y follows the bounce oscillator
    pub position: Vec3,
    /// Bounce oscillator phase, wraps at 2π
    pub bounce_phase: f32,
    /// Raw ramped speed in [0, MAX_SPEED]
    speed: f32,
    /// Low-pass filtered speed
    speed_smooth: f32,
}

impl Default for PlayerState {
    fn default() -> Self {
        Self::new()
    }
}

impl PlayerState {
    pub fn new() -> Self {
        Self {
            position: Vec3::from_array(PLAYER_INITIAL_POS),
            bounce_phase: 0.0,
            speed: 0.0,
            speed_smooth: 0.0,
        }
    }

    pub fn speed(&self) -> f32 {
        self.speed
    }

    pub fn speed_smooth(&self) -> f32 {
        self.speed_smooth
    }

    /// Planar distance from the plane origin
    pub fn planar_radius(&self) -> f32 {
        planar_radius(self.position.x, self.position.z)
    }

    pub fn snapshot(&self) -> PlayerSnapshot {
        PlayerSnapshot {
            position: self.position,
            bounce_phase: self.bounce_phase,
            speed_smooth: self.speed_smooth,
        }
    }

    /// Advance one tick. `intent` is the normalized direction (zero when
    /// movement is blocked or no keys are held), `dt` in seconds.
    pub fn update(&mut self, intent: Vec2, dt: f32) {
        self.update_speed(intent.length(), dt);
        self.integrate(intent, dt);
    }

    /// Speed ramp/decay plus the low-pass filter. Residual speeds snap to
    /// exactly zero below an epsilon so there is no asymptotic drift.
    fn update_speed(&mut self, intent_len: f32, dt: f32) {
        if intent_len > 0.0 {
            self.speed = (self.speed + ACCEL * dt).min(MAX_SPEED);
        } else {
            let decay = (1.0 - FRICTION * dt).max(0.0);
            self.speed *= decay;
            if self.speed < SPEED_EPSILON {
                self.speed = 0.0;
            }
        }

        let alpha = 1.0 - (-SPEED_SMOOTH_LAMBDA * dt).exp();
        self.speed_smooth += (self.speed - self.speed_smooth) * alpha;
        if self.speed == 0.0 && self.speed_smooth < SPEED_EPSILON {
            self.speed_smooth = 0.0;
        }
    }

    /// Position step with circular boundary clamp, then the bounce phase
    /// and vertical offset.
    fn integrate(&mut self, dir: Vec2, dt: f32) {
        let step = dir * MOVE_SPEED * self.speed * dt;
        let mut nx = self.position.x + step.x;
        let mut nz = self.position.z + step.y;

        // Clamp to circular bounds with a tiny inset to avoid jitter
        let allowed = PLANE_RADIUS - PLAYER_RADIUS;
        let r = planar_radius(nx, nz);
        if r > allowed {
            let scale = (allowed - BOUNDARY_INSET) / r.max(1.0);
            nx *= scale;
            nz *= scale;
        }

        // Bounce frequency rises with speed; amplitude uses a concave
        // mapping so small speeds still produce a perceptible bob
        let amp =
            BOUNCE_MIN_AMP + self.speed_smooth.powf(0.85) * (BOUNCE_MAX_AMP - BOUNCE_MIN_AMP);
        let omega = (BOUNCE_BASE_HZ + self.speed_smooth * BOUNCE_HZ_GAIN) * std::f32::consts::TAU;
        self.bounce_phase = wrap_phase(self.bounce_phase + omega * dt);
        let y = PLAYER_HEIGHT + amp * self.bounce_phase.sin();

        self.position = Vec3::new(nx, y, nz);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use std::f32::consts::TAU;

    const DT: f32 = 1.0 / 60.0;

    fn held(right: bool, forward: bool) -> Vec2 {
        IntentFlags {
            right,
            forward,
            ..Default::default()
        }
        .direction()
    }

    #[test]
    fn test_intent_direction_normalized() {
        let diag = held(true, true);
        assert!((diag.length() - 1.0).abs() < 1e-6);
        assert_eq!(IntentFlags::default().direction(), Vec2::ZERO);
        // Opposing keys cancel
        let cancel = IntentFlags {
            left: true,
            right: true,
            ..Default::default()
        };
        assert_eq!(cancel.direction(), Vec2::ZERO);
    }

    #[test]
    fn test_speed_ramps_and_x_increases_monotonically() {
        let mut player = PlayerState::new();
        let mut last_x = player.position.x;
        let mut clamped = false;

        for _ in 0..50 {
            player.update(held(true, false), 0.1);
            let allowed = PLANE_RADIUS - PLAYER_RADIUS;
            if player.planar_radius() >= allowed - BOUNDARY_INSET * 2.0 {
                clamped = true;
                break;
            }
            assert!(player.position.x > last_x, "x must increase until clamped");
            last_x = player.position.x;
        }

        // ACCEL * 0.1 * 50 = 2.0 > MAX_SPEED, so speed saturates unless the
        // boundary stopped us first
        if !clamped {
            assert!((player.speed() - MAX_SPEED).abs() < 1e-6);
        }
    }

    #[test]
    fn test_speed_converges_to_exact_zero() {
        let mut player = PlayerState::new();
        for _ in 0..30 {
            player.update(held(true, false), DT);
        }
        assert!(player.speed() > 0.0);

        // Sustained zero intent must reach exactly 0, not just near-zero
        for _ in 0..2000 {
            player.update(Vec2::ZERO, DT);
        }
        assert_eq!(player.speed(), 0.0);
        assert_eq!(player.speed_smooth(), 0.0);
    }

    #[test]
    fn test_bounce_phase_wraps() {
        let mut player = PlayerState::new();
        for _ in 0..600 {
            player.update(held(true, false), DT);
            assert!(player.bounce_phase >= 0.0 && player.bounce_phase < TAU);
        }
    }

    #[test]
    fn test_bounce_amplitude_at_rest_is_minimal() {
        let mut player = PlayerState::new();
        let mut min_y = f32::MAX;
        let mut max_y = f32::MIN;
        // At rest, speed_smooth = 0 so the bob amplitude is the floor value
        for _ in 0..240 {
            player.update(Vec2::ZERO, DT);
            min_y = min_y.min(player.position.y);
            max_y = max_y.max(player.position.y);
        }
        assert!(max_y <= PLAYER_HEIGHT + BOUNCE_MIN_AMP + 1e-5);
        assert!(min_y >= PLAYER_HEIGHT - BOUNCE_MIN_AMP - 1e-5);
    }

    #[test]
    fn test_boundary_clamp_engages() {
        let mut player = PlayerState::new();
        // Head straight for the edge for a long time
        for _ in 0..4000 {
            player.update(held(true, false), DT);
        }
        let allowed = PLANE_RADIUS - PLAYER_RADIUS;
        assert!(player.planar_radius() <= allowed);
    }

    proptest! {
        #[test]
        fn prop_position_always_inside_boundary(
            seq in proptest::collection::vec((any::<bool>(), any::<bool>(), any::<bool>(), any::<bool>()), 1..400),
            dt in 0.001f32..0.2,
        ) {
            let mut player = PlayerState::new();
            let allowed = PLANE_RADIUS - PLAYER_RADIUS;
            for (f, b, l, r) in seq {
                let intent = IntentFlags { forward: f, backward: b, left: l, right: r };
                player.update(intent.direction(), dt);
                prop_assert!(player.planar_radius() <= allowed + 1e-5);
                prop_assert!(player.speed() <= MAX_SPEED);
                prop_assert!(player.bounce_phase >= 0.0 && player.bounce_phase < TAU);
            }
        }
    }
}
