//! wgpu burst backend.
//!
//! Each burst owns three per-instance vertex buffers, a uniform buffer, and
//! the bind group pointing at it. Sprites are drawn as six-vertex quads, one
//! instance per particle.

use std::mem::size_of;

use glam::Vec3;
use wgpu::util::DeviceExt;

use super::textures::GpuTextures;
use super::DEPTH_FORMAT;
use crate::burst::Burst;
use crate::error::BurstError;
use crate::resources::{BurstBackend, BurstDescriptor, BurstUniforms};
use crate::scene::Scene;
use crate::shaders::BURST_SHADER;

/// GPU resources of one burst.
///
/// Not `Clone`; [`BurstAllocator::release`] consumes it and destroys every
/// buffer it owns.
pub struct GpuBurst {
    positions: wgpu::Buffer,
    sizes: wgpu::Buffer,
    time_randomizers: wgpu::Buffer,
    uniforms: wgpu::Buffer,
    bind_group: wgpu::BindGroup,
    texture: usize,
    count: u32,
}

impl std::fmt::Debug for GpuBurst {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GpuBurst")
            .field("texture", &self.texture)
            .field("count", &self.count)
            .finish_non_exhaustive()
    }
}

/// Pipeline and layouts shared by every burst.
pub struct BurstRenderer {
    pipeline: wgpu::RenderPipeline,
    uniform_layout: wgpu::BindGroupLayout,
    textures: GpuTextures,
}

impl BurstRenderer {
    pub fn new(
        device: &wgpu::Device,
        surface_format: wgpu::TextureFormat,
        camera_layout: &wgpu::BindGroupLayout,
        textures: GpuTextures,
    ) -> Self {
        let shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("Burst Shader"),
            source: wgpu::ShaderSource::Wgsl(BURST_SHADER.into()),
        });

        let uniform_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("Burst Uniform Bind Group Layout"),
            entries: &[wgpu::BindGroupLayoutEntry {
                binding: 0,
                visibility: wgpu::ShaderStages::VERTEX | wgpu::ShaderStages::FRAGMENT,
                ty: wgpu::BindingType::Buffer {
                    ty: wgpu::BufferBindingType::Uniform,
                    has_dynamic_offset: false,
                    min_binding_size: wgpu::BufferSize::new(size_of::<BurstUniforms>() as u64),
                },
                count: None,
            }],
        });

        let pipeline_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("Burst Pipeline Layout"),
            bind_group_layouts: &[camera_layout, textures.layout(), &uniform_layout],
            push_constant_ranges: &[],
        });

        let vertex_buffers = [
            wgpu::VertexBufferLayout {
                array_stride: size_of::<Vec3>() as wgpu::BufferAddress,
                step_mode: wgpu::VertexStepMode::Instance,
                attributes: &wgpu::vertex_attr_array![0 => Float32x3],
            },
            wgpu::VertexBufferLayout {
                array_stride: size_of::<f32>() as wgpu::BufferAddress,
                step_mode: wgpu::VertexStepMode::Instance,
                attributes: &wgpu::vertex_attr_array![1 => Float32],
            },
            wgpu::VertexBufferLayout {
                array_stride: size_of::<f32>() as wgpu::BufferAddress,
                step_mode: wgpu::VertexStepMode::Instance,
                attributes: &wgpu::vertex_attr_array![2 => Float32],
            },
        ];

        let pipeline = device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
            label: Some("Burst Pipeline"),
            layout: Some(&pipeline_layout),
            vertex: wgpu::VertexState {
                module: &shader,
                entry_point: Some("vs_main"),
                buffers: &vertex_buffers,
                compilation_options: Default::default(),
            },
            fragment: Some(wgpu::FragmentState {
                module: &shader,
                entry_point: Some("fs_main"),
                targets: &[Some(wgpu::ColorTargetState {
                    format: surface_format,
                    blend: Some(wgpu::BlendState {
                        color: wgpu::BlendComponent {
                            src_factor: wgpu::BlendFactor::SrcAlpha,
                            dst_factor: wgpu::BlendFactor::One,
                            operation: wgpu::BlendOperation::Add,
                        },
                        alpha: wgpu::BlendComponent {
                            src_factor: wgpu::BlendFactor::One,
                            dst_factor: wgpu::BlendFactor::One,
                            operation: wgpu::BlendOperation::Add,
                        },
                    }),
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
            depth_stencil: Some(wgpu::DepthStencilState {
                format: DEPTH_FORMAT,
                depth_write_enabled: false,
                depth_compare: wgpu::CompareFunction::LessEqual,
                stencil: wgpu::StencilState::default(),
                bias: wgpu::DepthBiasState::default(),
            }),
            multisample: wgpu::MultisampleState::default(),
            multiview: None,
            cache: None,
        });

        Self {
            pipeline,
            uniform_layout,
            textures,
        }
    }

    #[inline]
    pub fn texture_count(&self) -> usize {
        self.textures.len()
    }

    /// Record draws for every burst in the scene, oldest first.
    pub fn draw(
        &self,
        pass: &mut wgpu::RenderPass<'_>,
        camera: &wgpu::BindGroup,
        scene: &Scene<Burst<GpuBurst>>,
    ) {
        if scene.is_empty() {
            return;
        }
        pass.set_pipeline(&self.pipeline);
        pass.set_bind_group(0, camera, &[]);
        for (_, burst) in scene.iter() {
            let gpu = burst.handle();
            let Some(texture) = self.textures.bind_group(gpu.texture) else {
                continue;
            };
            pass.set_bind_group(1, texture, &[]);
            pass.set_bind_group(2, &gpu.bind_group, &[]);
            pass.set_vertex_buffer(0, gpu.positions.slice(..));
            pass.set_vertex_buffer(1, gpu.sizes.slice(..));
            pass.set_vertex_buffer(2, gpu.time_randomizers.slice(..));
            pass.draw(0..6, 0..gpu.count);
        }
    }
}

/// [`BurstBackend`] over a device, its queue, and the burst pipeline.
///
/// Borrowed from [`GpuState::bursts`](super::GpuState::bursts) for the span
/// of one spawn or tick.
pub struct BurstAllocator<'a> {
    pub(super) device: &'a wgpu::Device,
    pub(super) queue: &'a wgpu::Queue,
    pub(super) renderer: &'a BurstRenderer,
}

impl BurstBackend for BurstAllocator<'_> {
    type Handle = GpuBurst;

    fn texture_count(&self) -> usize {
        self.renderer.texture_count()
    }

    fn allocate(&mut self, descriptor: &BurstDescriptor<'_>) -> Result<GpuBurst, BurstError> {
        let particles = descriptor.particles;
        let largest = (particles.len() * size_of::<Vec3>()) as u64;
        let limit = self.device.limits().max_buffer_size;
        if largest > limit {
            return Err(BurstError::Allocation(format!(
                "position buffer of {largest} bytes exceeds the device limit of {limit}"
            )));
        }

        self.device.push_error_scope(wgpu::ErrorFilter::OutOfMemory);

        let positions = self.device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("Burst Positions"),
            contents: bytemuck::cast_slice(particles.positions()),
            usage: wgpu::BufferUsages::VERTEX,
        });
        let sizes = self.device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("Burst Sizes"),
            contents: bytemuck::cast_slice(particles.sizes()),
            usage: wgpu::BufferUsages::VERTEX,
        });
        let time_randomizers = self.device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("Burst Time Randomizers"),
            contents: bytemuck::cast_slice(particles.time_randomizers()),
            usage: wgpu::BufferUsages::VERTEX,
        });
        let uniforms = self.device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("Burst Uniforms"),
            contents: bytemuck::bytes_of(&descriptor.uniforms),
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
        });

        if let Some(error) = pollster::block_on(self.device.pop_error_scope()) {
            for buffer in [&positions, &sizes, &time_randomizers, &uniforms] {
                buffer.destroy();
            }
            return Err(BurstError::Allocation(error.to_string()));
        }

        let bind_group = self.device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("Burst Uniform Bind Group"),
            layout: &self.renderer.uniform_layout,
            entries: &[wgpu::BindGroupEntry {
                binding: 0,
                resource: uniforms.as_entire_binding(),
            }],
        });

        Ok(GpuBurst {
            positions,
            sizes,
            time_randomizers,
            uniforms,
            bind_group,
            texture: descriptor.texture,
            count: descriptor.particle_count(),
        })
    }

    fn write_animation(&mut self, handle: &GpuBurst, time: f32, progress: f32) {
        self.queue.write_buffer(
            &handle.uniforms,
            BurstUniforms::TIME_OFFSET,
            bytemuck::bytes_of(&time),
        );
        self.queue.write_buffer(
            &handle.uniforms,
            BurstUniforms::PROGRESS_OFFSET,
            bytemuck::bytes_of(&progress),
        );
    }

    fn release(&mut self, handle: GpuBurst) {
        let GpuBurst {
            positions,
            sizes,
            time_randomizers,
            uniforms,
            bind_group,
            ..
        } = handle;
        drop(bind_group);
        positions.destroy();
        sizes.destroy();
        time_randomizers.destroy();
        uniforms.destroy();
    }
}
