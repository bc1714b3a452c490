//! Floor render pipeline
//!
//! Draws the whole scene in a fragment shader: the shimmering circular
//! plane with pulse rings and god rays, the water height visualization
//! sampled straight from the compute pass's storage buffer, and the
//! player disc. Purely a consumer of committed simulation outputs.

use bytemuck::{Pod, Zeroable};
use wgpu::util::DeviceExt;

use crate::camera::CameraRig;
use crate::consts::{PLANE_RADIUS, PLANE_SIZE, PLAYER_RADIUS};
use crate::settings::QualityConfig;
use crate::sim::{PlayerSnapshot, Stage, WaterKernelInputs};

use super::water::WaterComputePass;

/// Frame uniforms (must match floor_shader.wgsl)
#[repr(C)]
#[derive(Copy, Clone, Pod, Zeroable)]
struct Globals {
    resolution: [f32; 2],
    time: f32,
    light_amount: f32,
    player_pos: [f32; 4], // x, y, z, bounce phase
    camera_pos: [f32; 4], // x, y, z, zoom
    plane_radius: f32,
    player_radius: f32,
    plane_size: f32,
    speed_smooth: f32,
    grid_size: u32,
    god_ray_samples: u32,
    _pad: [u32; 2],
}

/// Per-stage brightness target, eased over a couple of seconds
fn light_target(stage: Stage) -> f32 {
    match stage {
        Stage::Landing | Stage::Intro => 0.0,
        Stage::Outer => 0.1,
        Stage::Inner => 0.35,
        Stage::Center => 1.0,
    }
}

/// Easing rate for the light amount
const LIGHT_EASE_LAMBDA: f32 = 2.0;

pub struct FloorRenderState {
    pub surface: wgpu::Surface<'static>,
    pub device: wgpu::Device,
    pub queue: wgpu::Queue,
    pub config: wgpu::SurfaceConfiguration,
    pipeline: wgpu::RenderPipeline,

    globals_buffer: wgpu::Buffer,
    floor_layout: wgpu::BindGroupLayout,
    floor_bind_group: wgpu::BindGroup,
    water: WaterComputePass,

    pub size: (u32, u32),
    start_time: f64,
    last_time: f64,
    light_amount: f32,
    god_ray_samples: u32,
}

impl FloorRenderState {
    pub async fn new(
        surface: wgpu::Surface<'static>,
        adapter: &wgpu::Adapter,
        width: u32,
        height: u32,
        quality: &QualityConfig,
    ) -> Self {
        // Storage buffers in compute + fragment stages need full WebGPU;
        // adapter absence was already a fatal precondition upstream
        let (device, queue) = adapter
            .request_device(&wgpu::DeviceDescriptor {
                label: Some("floor-device"),
                required_features: wgpu::Features::empty(),
                required_limits: wgpu::Limits::default(),
                memory_hints: Default::default(),
                trace: Default::default(),
                experimental_features: Default::default(),
            })
            .await
            .expect("Failed to create device");

        let surface_caps = surface.get_capabilities(adapter);
        let surface_format = surface_caps
            .formats
            .iter()
            .find(|f| f.is_srgb())
            .copied()
            .unwrap_or(surface_caps.formats[0]);
        log::info!("Using surface format: {:?}", surface_format);

        let config = wgpu::SurfaceConfiguration {
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
            format: surface_format,
            width,
            height,
            present_mode: wgpu::PresentMode::AutoVsync,
            alpha_mode: surface_caps.alpha_modes[0],
            view_formats: vec![],
            desired_maximum_frame_latency: 2,
        };
        surface.configure(&device, &config);

        let shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("floor_shader"),
            source: wgpu::ShaderSource::Wgsl(include_str!("floor_shader.wgsl").into()),
        });

        let globals_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("globals"),
            contents: bytemuck::bytes_of(&Globals {
                resolution: [width as f32, height as f32],
                time: 0.0,
                light_amount: 0.0,
                player_pos: [0.0; 4],
                camera_pos: [0.0, 16.0, PLANE_RADIUS + 3.0, 1.0],
                plane_radius: PLANE_RADIUS,
                player_radius: PLAYER_RADIUS,
                plane_size: PLANE_SIZE,
                speed_smooth: 0.0,
                grid_size: quality.water_grid_size,
                god_ray_samples: quality.god_ray_samples,
                _pad: [0; 2],
            }),
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
        });

        let floor_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("floor-bind-layout"),
            entries: &[
                wgpu::BindGroupLayoutEntry {
                    binding: 0,
                    visibility: wgpu::ShaderStages::VERTEX | wgpu::ShaderStages::FRAGMENT,
                    ty: wgpu::BindingType::Buffer {
                        ty: wgpu::BufferBindingType::Uniform,
                        has_dynamic_offset: false,
                        min_binding_size: None,
                    },
                    count: None,
                },
                wgpu::BindGroupLayoutEntry {
                    binding: 1,
                    visibility: wgpu::ShaderStages::FRAGMENT,
                    ty: wgpu::BindingType::Buffer {
                        ty: wgpu::BufferBindingType::Storage { read_only: true },
                        has_dynamic_offset: false,
                        min_binding_size: None,
                    },
                    count: None,
                },
            ],
        });

        let pipeline_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("floor-pipeline-layout"),
            bind_group_layouts: &[&floor_layout],
            push_constant_ranges: &[],
        });

        let pipeline = device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
            label: Some("floor-pipeline"),
            layout: Some(&pipeline_layout),
            vertex: wgpu::VertexState {
                module: &shader,
                entry_point: Some("vs_main"),
                buffers: &[],
                compilation_options: Default::default(),
            },
            fragment: Some(wgpu::FragmentState {
                module: &shader,
                entry_point: Some("fs_main"),
                targets: &[Some(wgpu::ColorTargetState {
                    format: surface_format,
                    blend: Some(wgpu::BlendState::ALPHA_BLENDING),
                    write_mask: wgpu::ColorWrites::ALL,
                })],
                compilation_options: Default::default(),
            }),
            primitive: wgpu::PrimitiveState::default(),
            depth_stencil: None,
            multisample: wgpu::MultisampleState::default(),
            multiview: None,
            cache: None,
        });

        let water = WaterComputePass::new(
            &device,
            quality.water_grid_size,
            quality.water_ripple_radius,
        );
        let floor_bind_group =
            Self::create_floor_bind_group(&device, &floor_layout, &globals_buffer, &water);

        Self {
            surface,
            device,
            queue,
            config,
            pipeline,
            globals_buffer,
            floor_layout,
            floor_bind_group,
            water,
            size: (width, height),
            start_time: 0.0,
            last_time: 0.0,
            light_amount: 0.0,
            god_ray_samples: quality.god_ray_samples,
        }
    }

    fn create_floor_bind_group(
        device: &wgpu::Device,
        layout: &wgpu::BindGroupLayout,
        globals: &wgpu::Buffer,
        water: &WaterComputePass,
    ) -> wgpu::BindGroup {
        device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("floor-bind-group"),
            layout,
            entries: &[
                wgpu::BindGroupEntry {
                    binding: 0,
                    resource: globals.as_entire_binding(),
                },
                wgpu::BindGroupEntry {
                    binding: 1,
                    resource: water.height_buffer().as_entire_binding(),
                },
            ],
        })
    }

    pub fn set_start_time(&mut self, time_ms: f64) {
        self.start_time = time_ms;
        self.last_time = time_ms;
    }

    /// Quality change barrier: reallocate the GPU grids and rebind the
    /// height buffer before the next tick renders.
    pub fn set_quality(&mut self, quality: &QualityConfig) {
        self.water.resize(
            &self.device,
            quality.water_grid_size,
            quality.water_ripple_radius,
        );
        self.god_ray_samples = quality.god_ray_samples;
        self.floor_bind_group = Self::create_floor_bind_group(
            &self.device,
            &self.floor_layout,
            &self.globals_buffer,
            &self.water,
        );
    }

    pub fn resize(&mut self, width: u32, height: u32) {
        if width == 0 || height == 0 {
            return;
        }
        self.size = (width, height);
        self.config.width = width;
        self.config.height = height;
        self.surface.configure(&self.device, &self.config);
    }

    /// Render one frame. When `water_inputs` is present the water compute
    /// dispatch is encoded ahead of the render pass in the same
    /// submission (uniforms pushed first, single in-flight pass).
    pub fn render(
        &mut self,
        snapshot: &PlayerSnapshot,
        stage: Stage,
        water_inputs: Option<&WaterKernelInputs>,
        camera: &CameraRig,
        time_ms: f64,
    ) -> Result<(), wgpu::SurfaceError> {
        let dt = ((time_ms - self.last_time) / 1000.0).clamp(0.0, 0.1) as f32;
        self.last_time = time_ms;

        // Stage brightness glides toward its target
        let alpha = 1.0 - (-LIGHT_EASE_LAMBDA * dt).exp();
        self.light_amount += (light_target(stage) - self.light_amount) * alpha;

        let globals = Globals {
            resolution: [self.size.0 as f32, self.size.1 as f32],
            time: ((time_ms - self.start_time) / 1000.0) as f32,
            light_amount: self.light_amount,
            player_pos: [
                snapshot.position.x,
                snapshot.position.y,
                snapshot.position.z,
                snapshot.bounce_phase,
            ],
            camera_pos: [camera.position.x, camera.position.y, camera.position.z, camera.zoom],
            plane_radius: PLANE_RADIUS,
            player_radius: PLAYER_RADIUS,
            plane_size: PLANE_SIZE,
            speed_smooth: snapshot.speed_smooth,
            grid_size: self.water.grid_size(),
            god_ray_samples: self.god_ray_samples,
            _pad: [0; 2],
        };
        self.queue
            .write_buffer(&self.globals_buffer, 0, bytemuck::bytes_of(&globals));

        let output = self.surface.get_current_texture()?;
        let view = output
            .texture
            .create_view(&wgpu::TextureViewDescriptor::default());

        let mut encoder = self
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("frame-encoder"),
            });

        if let Some(inputs) = water_inputs {
            self.water
                .encode(&self.queue, &mut encoder, inputs, snapshot.position.y);
        }

        {
            let mut pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("floor-pass"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view: &view,
                    resolve_target: None,
                    ops: wgpu::Operations {
                        load: wgpu::LoadOp::Clear(wgpu::Color {
                            r: 0.004,
                            g: 0.004,
                            b: 0.012,
                            a: 1.0,
                        }),
                        store: wgpu::StoreOp::Store,
                    },
                    depth_slice: None,
                })],
                depth_stencil_attachment: None,
                timestamp_writes: None,
                occlusion_query_set: None,
            });
            pass.set_pipeline(&self.pipeline);
            pass.set_bind_group(0, &self.floor_bind_group, &[]);
            pass.draw(0..3, 0..1);
        }

        self.queue.submit(std::iter::once(encoder.finish()));
        output.present();

        Ok(())
    }
}
