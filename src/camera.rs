//! Stage-driven camera rig
//!
//! Maps the current stage to a look-at position and zoom, eased
//! exponentially so stage changes glide instead of cutting. Owns the
//! intro choreography: during INTRO the rig flies to the OUTER viewpoint
//! and, a fixed hold after the fly-in settles, requests the OUTER stage.

use glam::Vec3;

use crate::consts::PLANE_RADIUS;
use crate::sim::{Stage, StageMachine};

/// Seconds for the intro fly-in to be considered settled
const INTRO_FLY_SECS: f32 = 2.0;
/// Hold after the fly-in before the experience opens up
const INTRO_HOLD_SECS: f32 = 1.8;
/// Exponential easing rate toward the stage target
const EASE_LAMBDA: f32 = 2.0;

/// Camera look-at position for a stage (always aimed at the origin)
pub fn stage_position(stage: Stage) -> Vec3 {
    match stage {
        Stage::Landing => Vec3::new(0.0, 16.0, PLANE_RADIUS + 3.0),
        // The intro flies toward the OUTER viewpoint
        Stage::Intro => Vec3::new(0.0, 2.0, PLANE_RADIUS + 2.0),
        Stage::Outer => Vec3::new(0.0, 2.0, PLANE_RADIUS + 2.0),
        Stage::Inner => Vec3::new(1.25, 1.5, PLANE_RADIUS),
        Stage::Center => Vec3::new(0.0, 5.0, PLANE_RADIUS),
    }
}

/// Zoom factor for a stage
pub fn stage_zoom(stage: Stage) -> f32 {
    match stage {
        Stage::Landing | Stage::Intro | Stage::Center => 1.0,
        Stage::Outer => 1.4,
        Stage::Inner => 2.0,
    }
}

/// Eased camera state, updated once per frame
#[derive(Debug, Clone)]
pub struct CameraRig {
    pub position: Vec3,
    pub zoom: f32,
    intro_elapsed: f32,
}

impl Default for CameraRig {
    fn default() -> Self {
        Self::new()
    }
}

impl CameraRig {
    pub fn new() -> Self {
        Self {
            position: stage_position(Stage::Landing),
            zoom: stage_zoom(Stage::Landing),
            intro_elapsed: 0.0,
        }
    }

    /// Ease toward the current stage's viewpoint and drive the one-shot
    /// intro timeline. May request OUTER on the stage machine when the
    /// intro completes.
    pub fn update(&mut self, stage: &mut StageMachine, dt: f32) {
        let current = stage.current();
        let target = stage_position(current);
        let target_zoom = stage_zoom(current);

        let alpha = 1.0 - (-EASE_LAMBDA * dt).exp();
        self.position += (target - self.position) * alpha;
        self.zoom += (target_zoom - self.zoom) * alpha;

        if current == Stage::Intro {
            self.intro_elapsed += dt;
            if self.intro_elapsed >= INTRO_FLY_SECS + INTRO_HOLD_SECS {
                stage.request(Stage::Outer);
            }
        } else {
            self.intro_elapsed = 0.0;
        }
    }
}
