//! Water height-field simulation
//!
//! A damped wave equation on an N×N grid mapped over the plane, excited by
//! the player's footfalls. Two time levels (current/previous) give the
//! leapfrog-style second-order update; viscosity < 1 bleeds energy out so
//! the surface always settles. Cells beyond the active ripple radius are
//! forced to zero on both levels, which keeps far-field cost trivial and
//! prevents residual ripple drift.
//!
//! This is the CPU reference kernel; `renderer::water` runs the identical
//! arithmetic as a WGSL compute pass when a GPU owns the grid. Every cell
//! update reads neighbors from the frozen input frame, so the pass is
//! order-independent - same contract as the parallel dispatch.

use glam::Vec2;

use crate::consts::{
    PLANE_SIZE, WATER_IMPACT_DEPTH, WATER_IMPACT_SIZE, WATER_SPEED_GAIN, WATER_VISCOSITY,
};
use crate::sim::player::PlayerSnapshot;

/// Per-tick inputs the kernel needs from the player, identical for the
/// CPU and GPU paths. Built once per tick, after the player update.
#[derive(Debug, Clone, Copy)]
pub struct WaterKernelInputs {
    /// Player planar position (x, z)
    pub player_pos: Vec2,
    /// Bounce oscillator phase; impacts land on the downward half-cycle
    pub bounce_phase: f32,
    /// Smoothed speed, already scaled by the water gain
    pub speed: f32,
}

impl WaterKernelInputs {
    pub fn from_snapshot(snap: &PlayerSnapshot) -> Self {
        Self {
            player_pos: Vec2::new(snap.position.x, snap.position.z),
            bounce_phase: snap.bounce_phase,
            speed: snap.speed_smooth * WATER_SPEED_GAIN,
        }
    }
}

/// Impact contribution for a cell at distance `d` from the player.
///
/// Cosine falloff to zero beyond the impact size, gated to the downward
/// half of the bounce cycle (a footstep pressing into the water), scaled
/// by the smoothed speed.
#[inline]
pub fn impact_at(d: f32, inputs: &WaterKernelInputs) -> f32 {
    let phase = (d * std::f32::consts::PI / WATER_IMPACT_SIZE).clamp(0.0, std::f32::consts::PI);
    let bounce_down = (-inputs.bounce_phase.sin()).max(0.0);
    (phase.cos() + 1.0) * WATER_IMPACT_DEPTH * inputs.speed * bounce_down
}

/// Double-buffered N×N height grid.
///
/// `height`/`prev` are the two committed time levels; `next` is scratch so
/// neighbor reads during a step see only the frozen frame. All three are
/// reallocated zero-filled on a quality-tier change.
#[derive(Debug, Clone)]
pub struct HeightField {
    size: usize,
    ripple_radius: f32,
    height: Vec<f32>,
    prev: Vec<f32>,
    next: Vec<f32>,
}

impl HeightField {
    pub fn new(size: u32, ripple_radius: f32) -> Self {
        debug_assert!(WATER_VISCOSITY < 1.0, "explicit integration requires damping");
        let count = (size as usize) * (size as usize);
        Self {
            size: size as usize,
            ripple_radius,
            height: vec![0.0; count],
            prev: vec![0.0; count],
            next: vec![0.0; count],
        }
    }

    /// Grid resolution N
    pub fn size(&self) -> usize {
        self.size
    }

    pub fn cell_count(&self) -> usize {
        self.size * self.size
    }

    /// Committed height at a flattened row-major index
    pub fn height_at(&self, index: usize) -> f32 {
        self.height[index]
    }

    /// Full committed height buffer
    pub fn heights(&self) -> &[f32] {
        &self.height
    }

    /// World-space center of cell (i, j). Matches the GPU kernel mapping:
    /// each axis is `(i / N - 0.5) * PLANE_SIZE`.
    pub fn cell_world_pos(&self, i: usize, j: usize) -> Vec2 {
        let n = self.size as f32;
        (Vec2::new(i as f32, j as f32) / n - Vec2::splat(0.5)) * PLANE_SIZE
    }

    /// Replace the grids with freshly zeroed buffers of the new size.
    /// Discards any ripple state - acceptable by design.
    pub fn resize(&mut self, size: u32, ripple_radius: f32) {
        let count = (size as usize) * (size as usize);
        self.size = size as usize;
        self.ripple_radius = ripple_radius;
        self.height = vec![0.0; count];
        self.prev = vec![0.0; count];
        self.next = vec![0.0; count];
        log::info!("Water grid reallocated: {0}x{0}", size);
    }

    /// Advance the grid one tick.
    ///
    /// Each cell's new height goes to the scratch level and its `prev`
    /// commit is written in place - safe, since a cell is the only reader
    /// of its own `prev` while all neighbor reads hit `height`, which
    /// stays untouched until the final swap.
    pub fn step(&mut self, inputs: &WaterKernelInputs) {
        let n = self.size;
        for j in 0..n {
            for i in 0..n {
                let idx = j * n + i;
                let d = self.cell_world_pos(i, j).distance(inputs.player_pos);

                if d > self.ripple_radius {
                    // Cold region: both levels forced to zero
                    self.next[idx] = 0.0;
                    self.prev[idx] = 0.0;
                    continue;
                }

                // Clamped grid edges reuse the cell itself as the
                // missing neighbor
                let west = self.height[j * n + i.saturating_sub(1)];
                let east = self.height[j * n + (i + 1).min(n - 1)];
                let south = self.height[j.saturating_sub(1) * n + i];
                let north = self.height[(j + 1).min(n - 1) * n + i];

                let neighbor_term = (north + south + east + west) * 0.5;
                let new_height =
                    (neighbor_term - self.prev[idx]) * WATER_VISCOSITY + impact_at(d, inputs);

                self.next[idx] = new_height;
                self.prev[idx] = self.height[idx];
            }
        }
        std::mem::swap(&mut self.height, &mut self.next);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::f32::consts::FRAC_PI_2;

    fn inputs(pos: Vec2, phase: f32, speed: f32) -> WaterKernelInputs {
        WaterKernelInputs {
            player_pos: pos,
            bounce_phase: phase,
            speed,
        }
    }

    #[test]
    fn test_impact_maximal_on_downstroke_peak() {
        let at_peak = inputs(Vec2::ZERO, 3.0 * FRAC_PI_2, 1.0);
        let value = impact_at(0.0, &at_peak);
        // cos(0) + 1 = 2, sin(3π/2) = -1
        assert!((value - 2.0 * WATER_IMPACT_DEPTH).abs() < 1e-6);
        assert!(value > 0.0);
    }

    #[test]
    fn test_impact_zero_on_upstroke_peak() {
        let upstroke = inputs(Vec2::ZERO, FRAC_PI_2, 1.0);
        assert_eq!(impact_at(0.0, &upstroke), 0.0);
    }

    #[test]
    fn test_impact_zero_beyond_impact_size() {
        let at_peak = inputs(Vec2::ZERO, 3.0 * FRAC_PI_2, 1.0);
        // At d = impactSize the cosine phase clamps to π: cos(π) + 1 = 0
        assert!(impact_at(WATER_IMPACT_SIZE, &at_peak).abs() < 1e-6);
        assert!(impact_at(WATER_IMPACT_SIZE * 3.0, &at_peak).abs() < 1e-6);
    }

    #[test]
    fn test_cold_region_forced_to_zero() {
        let mut field = HeightField::new(32, 2.0);
        // Player at origin; a corner cell is far outside the ripple radius
        let corner = 0;
        field.height[corner] = 5.0;
        field.prev[corner] = 3.0;
        field.step(&inputs(Vec2::ZERO, 3.0 * FRAC_PI_2, 1.0));
        assert_eq!(field.height_at(corner), 0.0);
        assert_eq!(field.prev[corner], 0.0);
    }

    #[test]
    fn test_footsteps_raise_cells_near_player() {
        let mut field = HeightField::new(64, 4.0);
        let step_inputs = inputs(Vec2::ZERO, 3.0 * FRAC_PI_2, 1.0);
        field.step(&step_inputs);

        // The cell nearest the player picked up the impact
        let n = field.size();
        let center_idx = (n / 2) * n + n / 2;
        assert!(field.height_at(center_idx) > 0.0);
    }

    #[test]
    fn test_energy_decays_without_input() {
        let mut field = HeightField::new(64, 8.0);
        // Excite the surface for a few downstroke ticks
        for tick in 0..10 {
            let phase = 3.0 * FRAC_PI_2 + tick as f32 * 0.1;
            field.step(&inputs(Vec2::ZERO, phase, 1.0));
        }
        let peak: f32 = field.heights().iter().map(|h| h.abs()).fold(0.0, f32::max);
        assert!(peak > 0.0);

        // No further impacts: zero speed means zero injection
        for _ in 0..600 {
            field.step(&inputs(Vec2::ZERO, 0.0, 0.0));
        }
        let settled: f32 = field.heights().iter().map(|h| h.abs()).fold(0.0, f32::max);
        assert!(settled < peak * 0.01, "surface must settle: {settled} vs {peak}");
    }

    #[test]
    fn test_edge_cells_clamp_neighbors() {
        // Player parked in a corner of the plane; edge cells are active and
        // must not index out of bounds
        let mut field = HeightField::new(16, 20.0);
        let corner = Vec2::new(-PLANE_SIZE / 2.0, -PLANE_SIZE / 2.0);
        for _ in 0..50 {
            field.step(&inputs(corner, 3.0 * FRAC_PI_2, 1.0));
        }
        assert!(field.heights().iter().all(|h| h.is_finite()));
    }

    #[test]
    fn test_resize_reallocates_zeroed() {
        let mut field = HeightField::new(32, 2.0);
        field.step(&inputs(Vec2::ZERO, 3.0 * FRAC_PI_2, 1.0));
        field.resize(64, 3.0);
        assert_eq!(field.size(), 64);
        assert_eq!(field.cell_count(), 64 * 64);
        assert!(field.heights().iter().all(|&h| h == 0.0));
    }

    #[test]
    fn test_neighbor_reads_use_frozen_frame() {
        // A lone spike spreads symmetrically: the same-tick updates of
        // west/east neighbors must not contaminate each other
        let mut field = HeightField::new(33, 20.0);
        let n = field.size();
        let c = n / 2;
        field.height[c * n + c] = 1.0;
        // Upstroke phase so no new impacts are injected
        field.step(&inputs(Vec2::ZERO, FRAC_PI_2, 0.0));
        let west = field.height_at(c * n + c - 1);
        let east = field.height_at(c * n + c + 1);
        let north = field.height_at((c + 1) * n + c);
        let south = field.height_at((c - 1) * n + c);
        assert_eq!(west, east);
        assert_eq!(north, south);
        assert_eq!(west, north);
        assert!((west - 0.5 * WATER_VISCOSITY).abs() < 1e-6);
    }

    #[test]
    fn test_impact_gated_by_speed() {
        let mut field = HeightField::new(32, 4.0);
        field.step(&inputs(Vec2::ZERO, 3.0 * FRAC_PI_2, 0.0));
        assert!(field.heights().iter().all(|&h| h == 0.0));
    }
}
