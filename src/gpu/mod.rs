//! GPU execution of the simulation.
//!
//! All four stages run on the device: three compute passes (motion &
//! sensing, deposition, decay) followed by a render pass that presents the
//! final field buffer. Agent and field stores are generation-indexed pairs
//! of storage buffers; the scheduler passes the generation into every tick
//! and the bind groups for both orientations are built once up front.
//!
//! Startup is the only fallible phase: a missing capability or a kernel
//! that fails validation aborts before the first tick.

use std::sync::Arc;

use wgpu::util::DeviceExt;
use winit::window::Window;

use crate::agent::AgentRecord;
use crate::buffers::Generation;
use crate::config::SimConfig;
use crate::error::GpuError;
use crate::shaders;

/// Device state plus the per-generation pipelines and bind groups.
pub struct GpuState {
    surface: wgpu::Surface<'static>,
    device: wgpu::Device,
    queue: wgpu::Queue,
    pub surface_config: wgpu::SurfaceConfiguration,
    motion_pipeline: wgpu::ComputePipeline,
    deposit_pipeline: wgpu::ComputePipeline,
    decay_pipeline: wgpu::ComputePipeline,
    present_pipeline: wgpu::RenderPipeline,
    /// Indexed by [`Generation::index`]; only the bind groups touch these
    /// after setup.
    #[allow(dead_code)]
    agent_buffers: [wgpu::Buffer; 2],
    #[allow(dead_code)]
    field_buffers: [wgpu::Buffer; 2],
    motion_bind_groups: [wgpu::BindGroup; 2],
    deposit_bind_groups: [wgpu::BindGroup; 2],
    decay_bind_groups: [wgpu::BindGroup; 2],
    present_bind_groups: [wgpu::BindGroup; 2],
    agent_count: u32,
    pixel_count: u32,
}

impl GpuState {
    /// Bring up the device, verify capabilities, upload the initial agent
    /// population and build all pipelines.
    pub async fn new(
        window: Arc<Window>,
        config: &SimConfig,
        agents: &[AgentRecord],
    ) -> Result<Self, GpuError> {
        let size = window.inner_size();
        let width = size.width.max(1);
        let height = size.height.max(1);

        let instance = wgpu::Instance::new(&wgpu::InstanceDescriptor {
            backends: wgpu::Backends::PRIMARY,
            ..Default::default()
        });

        let surface = instance.create_surface(window)?;

        let adapter = instance
            .request_adapter(&wgpu::RequestAdapterOptions {
                power_preference: wgpu::PowerPreference::HighPerformance,
                compatible_surface: Some(&surface),
                force_fallback_adapter: false,
            })
            .await
            .ok_or(GpuError::NoAdapter)?;

        // The whole engine is compute passes over float storage buffers; an
        // adapter that cannot run them cannot run anything here.
        let downlevel = adapter.get_downlevel_capabilities();
        if !downlevel.flags.contains(wgpu::DownlevelFlags::COMPUTE_SHADERS) {
            return Err(GpuError::Capability("compute shaders".into()));
        }
        let field_bytes = width as u64 * height as u64 * 16;
        if field_bytes > adapter.limits().max_storage_buffer_binding_size as u64 {
            return Err(GpuError::Capability(format!(
                "storage buffers of {} bytes (field resolution {}x{})",
                field_bytes, width, height
            )));
        }

        let mut required_limits = wgpu::Limits::default();
        if field_bytes > required_limits.max_storage_buffer_binding_size as u64 {
            required_limits.max_storage_buffer_binding_size = field_bytes as u32;
        }

        let (device, queue) = adapter
            .request_device(
                &wgpu::DeviceDescriptor {
                    label: Some("Device"),
                    required_features: wgpu::Features::empty(),
                    required_limits,
                    memory_hints: Default::default(),
                },
                None,
            )
            .await?;

        log::info!(
            "simulating {} agents over a {}x{} field on {}",
            agents.len(),
            width,
            height,
            adapter.get_info().name
        );

        let surface_caps = surface.get_capabilities(&adapter);
        let surface_format = surface_caps
            .formats
            .iter()
            .find(|f| f.is_srgb())
            .copied()
            .unwrap_or(surface_caps.formats[0]);

        let surface_config = wgpu::SurfaceConfiguration {
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
            format: surface_format,
            width,
            height,
            present_mode: wgpu::PresentMode::AutoVsync,
            alpha_mode: surface_caps.alpha_modes[0],
            view_formats: vec![],
            desired_maximum_frame_latency: 2,
        };
        surface.configure(&device, &surface_config);

        // One buffer per generation for each logical store. Both agent
        // slots start from the spawn state (the write side is fully
        // overwritten on the first tick anyway); field buffers start zeroed.
        let agent_bytes: &[u8] = bytemuck::cast_slice(agents);
        let agent_buffers = [0, 1].map(|slot| {
            device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
                label: Some(&format!("Agent Buffer {}", slot)),
                contents: agent_bytes,
                usage: wgpu::BufferUsages::STORAGE,
            })
        });
        let field_buffers = [0, 1].map(|slot| {
            device.create_buffer(&wgpu::BufferDescriptor {
                label: Some(&format!("Field Buffer {}", slot)),
                size: field_bytes,
                usage: wgpu::BufferUsages::STORAGE,
                mapped_at_creation: false,
            })
        });

        // Build every kernel under a validation error scope so a bad module
        // or pipeline surfaces as a diagnostic instead of a panic.
        device.push_error_scope(wgpu::ErrorFilter::Validation);

        let motion_module = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("Motion Kernel"),
            source: wgpu::ShaderSource::Wgsl(shaders::motion(config, width, height).into()),
        });
        let deposit_module = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("Deposit Kernel"),
            source: wgpu::ShaderSource::Wgsl(shaders::deposit(config, width, height).into()),
        });
        let decay_module = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("Decay Kernel"),
            source: wgpu::ShaderSource::Wgsl(shaders::decay(config, width, height).into()),
        });
        let present_module = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("Present Shader"),
            source: wgpu::ShaderSource::Wgsl(shaders::present(width, height).into()),
        });

        let motion_layout = compute_layout(&device, "Motion", &[false, true, false]);
        let deposit_layout = compute_layout(&device, "Deposit", &[false, true]);
        let decay_layout = compute_layout(&device, "Decay", &[false, true]);

        let motion_pipeline = compute_pipeline(&device, "Motion", &motion_layout, &motion_module);
        let deposit_pipeline =
            compute_pipeline(&device, "Deposit", &deposit_layout, &deposit_module);
        let decay_pipeline = compute_pipeline(&device, "Decay", &decay_layout, &decay_module);

        let present_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("Present Bind Group Layout"),
            entries: &[wgpu::BindGroupLayoutEntry {
                binding: 0,
                visibility: wgpu::ShaderStages::FRAGMENT,
                ty: wgpu::BindingType::Buffer {
                    ty: wgpu::BufferBindingType::Storage { read_only: true },
                    has_dynamic_offset: false,
                    min_binding_size: None,
                },
                count: None,
            }],
        });

        let present_pipeline_layout =
            device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
                label: Some("Present Pipeline Layout"),
                bind_group_layouts: &[&present_layout],
                push_constant_ranges: &[],
            });

        let present_pipeline = device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
            label: Some("Present Pipeline"),
            layout: Some(&present_pipeline_layout),
            vertex: wgpu::VertexState {
                module: &present_module,
                entry_point: Some("vs_main"),
                buffers: &[],
                compilation_options: Default::default(),
            },
            fragment: Some(wgpu::FragmentState {
                module: &present_module,
                entry_point: Some("fs_main"),
                targets: &[Some(wgpu::ColorTargetState {
                    format: surface_config.format,
                    blend: None,
                    write_mask: wgpu::ColorWrites::ALL,
                })],
                compilation_options: Default::default(),
            }),
            primitive: wgpu::PrimitiveState {
                topology: wgpu::PrimitiveTopology::TriangleList,
                strip_index_format: None,
                front_face: wgpu::FrontFace::Ccw,
                cull_mode: None,
                polygon_mode: wgpu::PolygonMode::Fill,
                unclipped_depth: false,
                conservative: false,
            },
            depth_stencil: None,
            multisample: wgpu::MultisampleState::default(),
            multiview: None,
            cache: None,
        });

        if let Some(error) = device.pop_error_scope().await {
            return Err(GpuError::ShaderBuild(error.to_string()));
        }

        // Bind groups for both generation orientations, built once. For
        // generation g: motion reads agents[g] and field[g] and writes
        // agents[g^1]; deposition splats agents[g^1] onto field[g]; decay
        // maps field[g] into field[g^1], which is what gets presented.
        let motion_bind_groups = [0usize, 1].map(|g| {
            device.create_bind_group(&wgpu::BindGroupDescriptor {
                label: Some(&format!("Motion Bind Group {}", g)),
                layout: &motion_layout,
                entries: &[
                    binding(0, &agent_buffers[g]),
                    binding(1, &agent_buffers[g ^ 1]),
                    binding(2, &field_buffers[g]),
                ],
            })
        });
        let deposit_bind_groups = [0usize, 1].map(|g| {
            device.create_bind_group(&wgpu::BindGroupDescriptor {
                label: Some(&format!("Deposit Bind Group {}", g)),
                layout: &deposit_layout,
                entries: &[
                    binding(0, &agent_buffers[g ^ 1]),
                    binding(1, &field_buffers[g]),
                ],
            })
        });
        let decay_bind_groups = [0usize, 1].map(|g| {
            device.create_bind_group(&wgpu::BindGroupDescriptor {
                label: Some(&format!("Decay Bind Group {}", g)),
                layout: &decay_layout,
                entries: &[
                    binding(0, &field_buffers[g]),
                    binding(1, &field_buffers[g ^ 1]),
                ],
            })
        });
        let present_bind_groups = [0usize, 1].map(|g| {
            device.create_bind_group(&wgpu::BindGroupDescriptor {
                label: Some(&format!("Present Bind Group {}", g)),
                layout: &present_layout,
                entries: &[binding(0, &field_buffers[g ^ 1])],
            })
        });

        Ok(Self {
            surface,
            device,
            queue,
            surface_config,
            motion_pipeline,
            deposit_pipeline,
            decay_pipeline,
            present_pipeline,
            agent_buffers,
            field_buffers,
            motion_bind_groups,
            deposit_bind_groups,
            decay_bind_groups,
            present_bind_groups,
            agent_count: agents.len() as u32,
            pixel_count: width * height,
        })
    }

    /// Reconfigure the surface after a window resize.
    ///
    /// The simulation buffers keep their startup resolution; only the
    /// presentation surface follows the window.
    pub fn resize(&mut self, new_size: winit::dpi::PhysicalSize<u32>) {
        if new_size.width > 0 && new_size.height > 0 {
            self.surface_config.width = new_size.width;
            self.surface_config.height = new_size.height;
            self.surface.configure(&self.device, &self.surface_config);
        }
    }

    /// Run one full tick for the given generation and present the result.
    pub fn tick(&mut self, generation: Generation) -> Result<(), wgpu::SurfaceError> {
        let g = generation.index();

        let output = self.surface.get_current_texture()?;
        let view = output
            .texture
            .create_view(&wgpu::TextureViewDescriptor::default());

        let mut encoder = self
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("Tick Encoder"),
            });

        let agent_workgroups = self.agent_count.div_ceil(shaders::WORKGROUP_SIZE);
        let pixel_workgroups = self.pixel_count.div_ceil(shaders::WORKGROUP_SIZE);

        {
            let mut pass = encoder.begin_compute_pass(&wgpu::ComputePassDescriptor {
                label: Some("Motion Pass"),
                timestamp_writes: None,
            });
            pass.set_pipeline(&self.motion_pipeline);
            pass.set_bind_group(0, &self.motion_bind_groups[g], &[]);
            pass.dispatch_workgroups(agent_workgroups, 1, 1);
        }

        {
            let mut pass = encoder.begin_compute_pass(&wgpu::ComputePassDescriptor {
                label: Some("Deposit Pass"),
                timestamp_writes: None,
            });
            pass.set_pipeline(&self.deposit_pipeline);
            pass.set_bind_group(0, &self.deposit_bind_groups[g], &[]);
            pass.dispatch_workgroups(agent_workgroups, 1, 1);
        }

        {
            let mut pass = encoder.begin_compute_pass(&wgpu::ComputePassDescriptor {
                label: Some("Decay Pass"),
                timestamp_writes: None,
            });
            pass.set_pipeline(&self.decay_pipeline);
            pass.set_bind_group(0, &self.decay_bind_groups[g], &[]);
            pass.dispatch_workgroups(pixel_workgroups, 1, 1);
        }

        {
            let mut pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("Present Pass"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view: &view,
                    resolve_target: None,
                    ops: wgpu::Operations {
                        load: wgpu::LoadOp::Clear(wgpu::Color::BLACK),
                        store: wgpu::StoreOp::Store,
                    },
                })],
                depth_stencil_attachment: None,
                timestamp_writes: None,
                occlusion_query_set: None,
            });
            pass.set_pipeline(&self.present_pipeline);
            pass.set_bind_group(0, &self.present_bind_groups[g], &[]);
            pass.draw(0..3, 0..1);
        }

        self.queue.submit(std::iter::once(encoder.finish()));
        output.present();

        Ok(())
    }
}

/// Bind group layout for a compute stage: one storage buffer per entry,
/// `writable[i]` selecting read-write vs read-only.
fn compute_layout(
    device: &wgpu::Device,
    label: &str,
    writable: &[bool],
) -> wgpu::BindGroupLayout {
    let entries: Vec<wgpu::BindGroupLayoutEntry> = writable
        .iter()
        .enumerate()
        .map(|(i, &rw)| wgpu::BindGroupLayoutEntry {
            binding: i as u32,
            visibility: wgpu::ShaderStages::COMPUTE,
            ty: wgpu::BindingType::Buffer {
                ty: wgpu::BufferBindingType::Storage { read_only: !rw },
                has_dynamic_offset: false,
                min_binding_size: None,
            },
            count: None,
        })
        .collect();

    device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
        label: Some(&format!("{} Bind Group Layout", label)),
        entries: &entries,
    })
}

fn compute_pipeline(
    device: &wgpu::Device,
    label: &str,
    layout: &wgpu::BindGroupLayout,
    module: &wgpu::ShaderModule,
) -> wgpu::ComputePipeline {
    let pipeline_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
        label: Some(&format!("{} Pipeline Layout", label)),
        bind_group_layouts: &[layout],
        push_constant_ranges: &[],
    });

    device.create_compute_pipeline(&wgpu::ComputePipelineDescriptor {
        label: Some(&format!("{} Pipeline", label)),
        layout: Some(&pipeline_layout),
        module,
        entry_point: Some("main"),
        compilation_options: Default::default(),
        cache: None,
    })
}

fn binding(index: u32, buffer: &wgpu::Buffer) -> wgpu::BindGroupEntry<'_> {
    wgpu::BindGroupEntry {
        binding: index,
        resource: buffer.as_entire_binding(),
    }
}
