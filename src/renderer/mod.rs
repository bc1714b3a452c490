//! WebGPU rendering layer
//!
//! `water` owns the GPU-resident height-field compute pass; `floor` owns
//! the surface and the render pipeline that consumes it.

pub mod floor;
pub mod water;

pub use floor::FloorRenderState;
pub use water::WaterComputePass;
