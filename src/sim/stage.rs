//! Narrative stage state machine
//!
//! Stages order by progression and by closeness to the plane center:
//! LANDING → INTRO are event-driven, OUTER/INNER/CENTER are ring zones
//! gated by the player's planar radius. CENTER is only ever exited via an
//! explicit request (UI), never by the radius rule.

use serde::{Deserialize, Serialize};

use crate::consts::{CENTER_RADIUS, INNER_RING_RADIUS, STAGE_CHECK_INTERVAL};

/// Narrative stage of the experience
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum Stage {
    /// Initial idle screen; no input, camera or physics active
    #[default]
    Landing,
    /// One-shot camera fly-in, entered by the user's start action
    Intro,
    /// Outer ring of the floor
    Outer,
    /// Inner ring
    Inner,
    /// Center zone; entered by radius, exited only via UI
    Center,
}

impl Stage {
    pub fn as_str(&self) -> &'static str {
        match self {
            Stage::Landing => "landing",
            Stage::Intro => "intro",
            Stage::Outer => "outer",
            Stage::Inner => "inner",
            Stage::Center => "center",
        }
    }

    /// Movement input and physics are suppressed entirely in these stages
    pub fn suppresses_simulation(&self) -> bool {
        matches!(self, Stage::Landing | Stage::Intro)
    }

    /// Movement intent is ignored here, but decay/bounce/water continue
    pub fn blocks_movement(&self) -> bool {
        *self == Stage::Center
    }
}

/// Derive the ring stage from a planar radius. Pure and monotonic in r.
pub fn stage_from_radius(radius: f32) -> Stage {
    if radius <= CENTER_RADIUS {
        Stage::Center
    } else if radius <= INNER_RING_RADIUS {
        Stage::Inner
    } else {
        Stage::Outer
    }
}

/// Stage machine with throttled radius detection and a manual-exit lock.
///
/// After CENTER is exited via an explicit request, automatic re-entry is
/// locked until the player has actually moved outside the center radius,
/// so the stage cannot snap straight back.
#[derive(Debug, Clone)]
pub struct StageMachine {
    current: Stage,
    /// Auto detection disabled until radius leaves the center zone
    auto_locked: bool,
    check_counter: u32,
}

impl Default for StageMachine {
    fn default() -> Self {
        Self::new()
    }
}

impl StageMachine {
    pub fn new() -> Self {
        Self {
            current: Stage::Landing,
            auto_locked: false,
            check_counter: 0,
        }
    }

    pub fn current(&self) -> Stage {
        self.current
    }

    /// Explicit stage request from the UI layer. Idempotent: an unchanged
    /// value is a no-op. A Center → Inner request is the manual exit and
    /// arms the auto-detection lock.
    pub fn request(&mut self, stage: Stage) {
        if stage == self.current {
            return;
        }
        if self.current == Stage::Center && stage == Stage::Inner {
            self.auto_locked = true;
        }
        log::info!("Stage: {} -> {}", self.current.as_str(), stage.as_str());
        self.current = stage;
    }

    /// Per-tick radius evaluation, throttled to every
    /// [`STAGE_CHECK_INTERVAL`]-th call. The caller must not invoke this
    /// while the stage suppresses simulation (LANDING/INTRO).
    pub fn tick(&mut self, radius: f32) {
        self.check_counter = (self.check_counter + 1) % STAGE_CHECK_INTERVAL;
        if self.check_counter != 0 {
            return;
        }

        if self.auto_locked {
            if radius > CENTER_RADIUS {
                self.auto_locked = false;
            } else {
                return;
            }
        }

        // CENTER is UI-driven only; never auto-exit it by radius
        if self.current == Stage::Center {
            return;
        }

        let detected = stage_from_radius(radius);
        if detected != self.current {
            self.request(detected);
        }
    }

    #[cfg(test)]
    pub(crate) fn is_auto_locked(&self) -> bool {
        self.auto_locked
    }
}
