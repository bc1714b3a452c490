//! GPU water compute pass
//!
//! Owns the two grid-sized storage buffers (height / previous height) and
//! the stencil-update kernel in `water_compute.wgsl`. The arithmetic is
//! identical to the CPU reference in `sim::water`; uniforms carry the
//! per-tick player snapshot plus the tier-derived grid parameters.
//!
//! One dispatch runs per simulation tick, encoded into the same command
//! submission as the render pass, so a frame's pass always completes
//! before the next frame samples the buffers.

use bytemuck::{Pod, Zeroable};
use wgpu::util::DeviceExt;

use crate::consts::{PLANE_SIZE, WATER_IMPACT_DEPTH, WATER_IMPACT_SIZE, WATER_VISCOSITY};
use crate::sim::WaterKernelInputs;

/// Kernel uniforms (must match water_compute.wgsl)
#[repr(C)]
#[derive(Copy, Clone, Pod, Zeroable)]
struct WaterUniforms {
    player_pos: [f32; 4], // x, y, z, bounce phase
    speed: f32,           // smoothed, water gain already applied
    ripple_radius: f32,
    plane_size: f32,
    impact_depth: f32,
    impact_size: f32,
    viscosity: f32,
    grid_size: u32,
    _pad: u32,
}

/// Compute workgroup width (must match water_compute.wgsl)
const WORKGROUP_SIZE: u32 = 64;

pub struct WaterComputePass {
    pipeline: wgpu::ComputePipeline,
    layout: wgpu::BindGroupLayout,
    bind_group: wgpu::BindGroup,
    uniforms_buffer: wgpu::Buffer,
    height_buffer: wgpu::Buffer,
    prev_height_buffer: wgpu::Buffer,
    grid_size: u32,
    ripple_radius: f32,
}

impl WaterComputePass {
    pub fn new(device: &wgpu::Device, grid_size: u32, ripple_radius: f32) -> Self {
        let shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("water_compute"),
            source: wgpu::ShaderSource::Wgsl(include_str!("water_compute.wgsl").into()),
        });

        let layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("water-bind-layout"),
            entries: &[
                wgpu::BindGroupLayoutEntry {
                    binding: 0,
                    visibility: wgpu::ShaderStages::COMPUTE,
                    ty: wgpu::BindingType::Buffer {
                        ty: wgpu::BufferBindingType::Uniform,
                        has_dynamic_offset: false,
                        min_binding_size: None,
                    },
                    count: None,
                },
                storage_entry(1),
                storage_entry(2),
            ],
        });

        let pipeline_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("water-pipeline-layout"),
            bind_group_layouts: &[&layout],
            push_constant_ranges: &[],
        });

        let pipeline = device.create_compute_pipeline(&wgpu::ComputePipelineDescriptor {
            label: Some("water-pipeline"),
            layout: Some(&pipeline_layout),
            module: &shader,
            entry_point: Some("step"),
            compilation_options: Default::default(),
            cache: None,
        });

        let uniforms_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("water-uniforms"),
            contents: bytemuck::bytes_of(&WaterUniforms {
                player_pos: [0.0; 4],
                speed: 0.0,
                ripple_radius,
                plane_size: PLANE_SIZE,
                impact_depth: WATER_IMPACT_DEPTH,
                impact_size: WATER_IMPACT_SIZE,
                viscosity: WATER_VISCOSITY,
                grid_size,
                _pad: 0,
            }),
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
        });

        let (height_buffer, prev_height_buffer) = Self::create_grids(device, grid_size);
        let bind_group = Self::create_bind_group(
            device,
            &layout,
            &uniforms_buffer,
            &height_buffer,
            &prev_height_buffer,
        );

        Self {
            pipeline,
            layout,
            bind_group,
            uniforms_buffer,
            height_buffer,
            prev_height_buffer,
            grid_size,
            ripple_radius,
        }
    }

    /// Grid-sized storage buffers, zero-initialized by WebGPU
    fn create_grids(device: &wgpu::Device, grid_size: u32) -> (wgpu::Buffer, wgpu::Buffer) {
        let size = (grid_size as u64) * (grid_size as u64) * std::mem::size_of::<f32>() as u64;
        let make = |label: &str| {
            device.create_buffer(&wgpu::BufferDescriptor {
                label: Some(label),
                size,
                usage: wgpu::BufferUsages::STORAGE | wgpu::BufferUsages::COPY_DST,
                mapped_at_creation: false,
            })
        };
        (make("water-height"), make("water-prev-height"))
    }

    fn create_bind_group(
        device: &wgpu::Device,
        layout: &wgpu::BindGroupLayout,
        uniforms: &wgpu::Buffer,
        height: &wgpu::Buffer,
        prev_height: &wgpu::Buffer,
    ) -> wgpu::BindGroup {
        device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("water-bind-group"),
            layout,
            entries: &[
                wgpu::BindGroupEntry {
                    binding: 0,
                    resource: uniforms.as_entire_binding(),
                },
                wgpu::BindGroupEntry {
                    binding: 1,
                    resource: height.as_entire_binding(),
                },
                wgpu::BindGroupEntry {
                    binding: 2,
                    resource: prev_height.as_entire_binding(),
                },
            ],
        })
    }

    /// Height buffer for the floor pipeline to sample
    pub fn height_buffer(&self) -> &wgpu::Buffer {
        &self.height_buffer
    }

    pub fn grid_size(&self) -> u32 {
        self.grid_size
    }

    /// Reallocate the grids for a new quality tier. Fresh buffers start
    /// zeroed, discarding any ripple state. The caller must rebuild any
    /// bind group that references the height buffer.
    pub fn resize(&mut self, device: &wgpu::Device, grid_size: u32, ripple_radius: f32) {
        if grid_size == self.grid_size && ripple_radius == self.ripple_radius {
            return;
        }
        self.grid_size = grid_size;
        self.ripple_radius = ripple_radius;
        let (height, prev) = Self::create_grids(device, grid_size);
        self.height_buffer = height;
        self.prev_height_buffer = prev;
        self.bind_group = Self::create_bind_group(
            device,
            &self.layout,
            &self.uniforms_buffer,
            &self.height_buffer,
            &self.prev_height_buffer,
        );
        log::info!("GPU water grid reallocated: {0}x{0}", grid_size);
    }

    /// Push this tick's uniforms and encode one full-grid dispatch
    pub fn encode(
        &self,
        queue: &wgpu::Queue,
        encoder: &mut wgpu::CommandEncoder,
        inputs: &WaterKernelInputs,
        player_y: f32,
    ) {
        let uniforms = WaterUniforms {
            player_pos: [
                inputs.player_pos.x,
                player_y,
                inputs.player_pos.y,
                inputs.bounce_phase,
            ],
            speed: inputs.speed,
            ripple_radius: self.ripple_radius,
            plane_size: PLANE_SIZE,
            impact_depth: WATER_IMPACT_DEPTH,
            impact_size: WATER_IMPACT_SIZE,
            viscosity: WATER_VISCOSITY,
            grid_size: self.grid_size,
            _pad: 0,
        };
        queue.write_buffer(&self.uniforms_buffer, 0, bytemuck::bytes_of(&uniforms));

        let cell_count = self.grid_size * self.grid_size;
        let workgroups = cell_count.div_ceil(WORKGROUP_SIZE);

        let mut pass = encoder.begin_compute_pass(&wgpu::ComputePassDescriptor {
            label: Some("water-step"),
            timestamp_writes: None,
        });
        pass.set_pipeline(&self.pipeline);
        pass.set_bind_group(0, &self.bind_group, &[]);
        pass.dispatch_workgroups(workgroups, 1, 1);
    }
}

fn storage_entry(binding: u32) -> wgpu::BindGroupLayoutEntry {
    wgpu::BindGroupLayoutEntry {
        binding,
        visibility: wgpu::ShaderStages::COMPUTE,
        ty: wgpu::BindingType::Buffer {
            ty: wgpu::BufferBindingType::Storage { read_only: false },
            has_dynamic_offset: false,
            min_binding_size: None,
        },
        count: None,
    }
}
