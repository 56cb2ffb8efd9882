use std::collections::BTreeMap;
use std::num::NonZeroU64;
use std::sync::Arc;

use mirrorlight_geometry::Vertex;
use mirrorlight_render::{RenderBackend, RenderError, RenderTarget};
use mirrorlight_scene::{PerspectiveCamera, RenderTargetId, SceneGraph};
use winit::window::Window;

use crate::context::GpuContext;
use crate::draws::{Draw, collect_draws, collect_lights};
use crate::resources::{
    DEPTH_FORMAT, MeshCache, OffscreenTarget, SAMPLE_COUNT, ScreenAttachments, create_blank_map,
    create_shadow_texture,
};
use crate::shaders;
use crate::uniforms::{
    FrameUniform, LightUniform, MAX_LIGHTS, ObjectUniform, ShadowUniform, align_to, pack_strided,
};

const INITIAL_SHADOW_MAP_SIZE: u32 = 1024;
const INITIAL_OBJECT_CAPACITY: u64 = 64;

fn uniform_stride<T>(alignment: u64) -> u64 {
    align_to(std::mem::size_of::<T>() as u64, alignment)
}

fn uniform_entry(
    binding: u32,
    visibility: wgpu::ShaderStages,
    dynamic: bool,
    size: u64,
) -> wgpu::BindGroupLayoutEntry {
    wgpu::BindGroupLayoutEntry {
        binding,
        visibility,
        ty: wgpu::BindingType::Buffer {
            ty: wgpu::BufferBindingType::Uniform,
            has_dynamic_offset: dynamic,
            min_binding_size: NonZeroU64::new(size),
        },
        count: None,
    }
}

fn vertex_layout() -> wgpu::VertexBufferLayout<'static> {
    const ATTRIBUTES: [wgpu::VertexAttribute; 3] = wgpu::vertex_attr_array![
        0 => Float32x3,
        1 => Float32x3,
        2 => Float32x2,
    ];
    wgpu::VertexBufferLayout {
        array_stride: std::mem::size_of::<Vertex>() as u64,
        step_mode: wgpu::VertexStepMode::Vertex,
        attributes: &ATTRIBUTES,
    }
}

/// Bind group layouts shared by every pipeline and resource.
struct Layouts {
    frame: wgpu::BindGroupLayout,
    object: wgpu::BindGroupLayout,
    map: wgpu::BindGroupLayout,
    shadow: wgpu::BindGroupLayout,
}

impl Layouts {
    fn new(device: &wgpu::Device) -> Self {
        let frame = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("frame_bind_group_layout"),
            entries: &[
                uniform_entry(
                    0,
                    wgpu::ShaderStages::VERTEX_FRAGMENT,
                    false,
                    std::mem::size_of::<FrameUniform>() as u64,
                ),
                wgpu::BindGroupLayoutEntry {
                    binding: 1,
                    visibility: wgpu::ShaderStages::FRAGMENT,
                    ty: wgpu::BindingType::Texture {
                        sample_type: wgpu::TextureSampleType::Depth,
                        view_dimension: wgpu::TextureViewDimension::D2Array,
                        multisampled: false,
                    },
                    count: None,
                },
                wgpu::BindGroupLayoutEntry {
                    binding: 2,
                    visibility: wgpu::ShaderStages::FRAGMENT,
                    ty: wgpu::BindingType::Sampler(wgpu::SamplerBindingType::Comparison),
                    count: None,
                },
            ],
        });

        let object = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("object_bind_group_layout"),
            entries: &[uniform_entry(
                0,
                wgpu::ShaderStages::VERTEX_FRAGMENT,
                true,
                std::mem::size_of::<ObjectUniform>() as u64,
            )],
        });

        let map = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("map_bind_group_layout"),
            entries: &[
                wgpu::BindGroupLayoutEntry {
                    binding: 0,
                    visibility: wgpu::ShaderStages::FRAGMENT,
                    ty: wgpu::BindingType::Texture {
                        sample_type: wgpu::TextureSampleType::Float { filterable: true },
                        view_dimension: wgpu::TextureViewDimension::D2,
                        multisampled: false,
                    },
                    count: None,
                },
                wgpu::BindGroupLayoutEntry {
                    binding: 1,
                    visibility: wgpu::ShaderStages::FRAGMENT,
                    ty: wgpu::BindingType::Sampler(wgpu::SamplerBindingType::Filtering),
                    count: None,
                },
            ],
        });

        let shadow = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("shadow_bind_group_layout"),
            entries: &[uniform_entry(
                0,
                wgpu::ShaderStages::VERTEX,
                true,
                std::mem::size_of::<ShadowUniform>() as u64,
            )],
        });

        Self {
            frame,
            object,
            map,
            shadow,
        }
    }
}

fn scene_pipeline(
    device: &wgpu::Device,
    layout: &wgpu::PipelineLayout,
    shader: &wgpu::ShaderModule,
    format: wgpu::TextureFormat,
    transparent: bool,
) -> wgpu::RenderPipeline {
    let (label, blend) = if transparent {
        ("transparent_pipeline", wgpu::BlendState::ALPHA_BLENDING)
    } else {
        ("opaque_pipeline", wgpu::BlendState::REPLACE)
    };
    device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
        label: Some(label),
        layout: Some(layout),
        vertex: wgpu::VertexState {
            module: shader,
            entry_point: Some("vs_main"),
            compilation_options: Default::default(),
            buffers: &[vertex_layout()],
        },
        fragment: Some(wgpu::FragmentState {
            module: shader,
            entry_point: Some("fs_main"),
            compilation_options: Default::default(),
            targets: &[Some(wgpu::ColorTargetState {
                format,
                blend: Some(blend),
                write_mask: wgpu::ColorWrites::ALL,
            })],
        }),
        primitive: wgpu::PrimitiveState {
            topology: wgpu::PrimitiveTopology::TriangleList,
            cull_mode: None,
            ..Default::default()
        },
        depth_stencil: Some(wgpu::DepthStencilState {
            format: DEPTH_FORMAT,
            depth_write_enabled: !transparent,
            depth_compare: wgpu::CompareFunction::LessEqual,
            stencil: Default::default(),
            bias: Default::default(),
        }),
        multisample: wgpu::MultisampleState {
            count: SAMPLE_COUNT,
            ..Default::default()
        },
        multiview: None,
        cache: None,
    })
}

fn shadow_pipeline(device: &wgpu::Device, layouts: &Layouts) -> wgpu::RenderPipeline {
    let shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
        label: Some("shadow_shader"),
        source: wgpu::ShaderSource::Wgsl(shaders::SHADOW_SHADER.into()),
    });
    let layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
        label: Some("shadow_pipeline_layout"),
        bind_group_layouts: &[&layouts.shadow, &layouts.object],
        push_constant_ranges: &[],
    });
    device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
        label: Some("shadow_pipeline"),
        layout: Some(&layout),
        vertex: wgpu::VertexState {
            module: &shader,
            entry_point: Some("vs_shadow"),
            compilation_options: Default::default(),
            buffers: &[vertex_layout()],
        },
        fragment: None,
        primitive: wgpu::PrimitiveState {
            topology: wgpu::PrimitiveTopology::TriangleList,
            cull_mode: None,
            ..Default::default()
        },
        depth_stencil: Some(wgpu::DepthStencilState {
            format: DEPTH_FORMAT,
            depth_write_enabled: true,
            depth_compare: wgpu::CompareFunction::LessEqual,
            stencil: Default::default(),
            bias: wgpu::DepthBiasState {
                constant: 2,
                slope_scale: 2.0,
                clamp: 0.0,
            },
        }),
        multisample: Default::default(),
        multiview: None,
        cache: None,
    })
}

/// Per-light depth layers and the frame bind group that samples them.
struct ShadowMaps {
    size: u32,
    layers: Vec<wgpu::TextureView>,
    frame_bind_group: wgpu::BindGroup,
}

impl ShadowMaps {
    fn new(
        device: &wgpu::Device,
        layouts: &Layouts,
        frame_buffer: &wgpu::Buffer,
        sampler: &wgpu::Sampler,
        size: u32,
    ) -> Self {
        let texture = create_shadow_texture(device, size, MAX_LIGHTS as u32);
        let layers = (0..MAX_LIGHTS as u32)
            .map(|layer| {
                texture.create_view(&wgpu::TextureViewDescriptor {
                    label: Some("shadow_layer"),
                    dimension: Some(wgpu::TextureViewDimension::D2),
                    base_array_layer: layer,
                    array_layer_count: Some(1),
                    ..Default::default()
                })
            })
            .collect();
        let array = texture.create_view(&wgpu::TextureViewDescriptor {
            label: Some("shadow_array"),
            dimension: Some(wgpu::TextureViewDimension::D2Array),
            ..Default::default()
        });
        let frame_bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("frame_bind_group"),
            layout: &layouts.frame,
            entries: &[
                wgpu::BindGroupEntry {
                    binding: 0,
                    resource: frame_buffer.as_entire_binding(),
                },
                wgpu::BindGroupEntry {
                    binding: 1,
                    resource: wgpu::BindingResource::TextureView(&array),
                },
                wgpu::BindGroupEntry {
                    binding: 2,
                    resource: wgpu::BindingResource::Sampler(sampler),
                },
            ],
        });
        Self {
            size,
            layers,
            frame_bind_group,
        }
    }
}

/// Strided per-draw uniforms addressed with dynamic offsets.
struct ObjectBuffer {
    buffer: wgpu::Buffer,
    bind_group: wgpu::BindGroup,
    stride: u64,
    capacity: u64,
}

impl ObjectBuffer {
    fn new(
        device: &wgpu::Device,
        layout: &wgpu::BindGroupLayout,
        stride: u64,
        capacity: u64,
    ) -> Self {
        let buffer = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("object_buffer"),
            size: stride * capacity,
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });
        let bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("object_bind_group"),
            layout,
            entries: &[wgpu::BindGroupEntry {
                binding: 0,
                resource: wgpu::BindingResource::Buffer(wgpu::BufferBinding {
                    buffer: &buffer,
                    offset: 0,
                    size: NonZeroU64::new(std::mem::size_of::<ObjectUniform>() as u64),
                }),
            }],
        });
        Self {
            buffer,
            bind_group,
            stride,
            capacity,
        }
    }

    fn offset(&self, slot: usize) -> u32 {
        (slot as u64 * self.stride) as u32
    }
}

/// Attachments for one colour pass: multisampled colour and depth, and the
/// single-sampled view the colour resolves into.
struct PassViews {
    color: wgpu::TextureView,
    depth: wgpu::TextureView,
    resolve: wgpu::TextureView,
}

impl PassViews {
    fn new(color: &wgpu::Texture, depth: &wgpu::Texture, resolve: wgpu::TextureView) -> Self {
        Self {
            color: color.create_view(&Default::default()),
            depth: depth.create_view(&Default::default()),
            resolve,
        }
    }
}

/// wgpu implementation of [`RenderBackend`] that draws into a window.
pub struct WgpuBackend {
    ctx: GpuContext,
    layouts: Layouts,
    opaque_pipeline: wgpu::RenderPipeline,
    transparent_pipeline: wgpu::RenderPipeline,
    shadow_pipeline: wgpu::RenderPipeline,
    frame_buffer: wgpu::Buffer,
    objects: ObjectBuffer,
    shadow_buffer: wgpu::Buffer,
    shadow_stride: u64,
    shadow_bind_group: wgpu::BindGroup,
    shadow_sampler: wgpu::Sampler,
    shadows: ShadowMaps,
    map_sampler: wgpu::Sampler,
    blank_map: wgpu::BindGroup,
    screen: ScreenAttachments,
    meshes: MeshCache,
    targets: BTreeMap<RenderTargetId, OffscreenTarget>,
    pending: Option<wgpu::SurfaceTexture>,
}

impl WgpuBackend {
    /// Bind a new backend to `window`, drawing at the window's current size.
    pub fn attach(window: Arc<Window>) -> Result<Self, RenderError> {
        Ok(Self::new(GpuContext::attach(window)?))
    }

    pub fn new(ctx: GpuContext) -> Self {
        let device = &ctx.device;
        let layouts = Layouts::new(device);
        let uniform_alignment = u64::from(device.limits().min_uniform_buffer_offset_alignment);

        let shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("scene_shader"),
            source: wgpu::ShaderSource::Wgsl(shaders::SCENE_SHADER.into()),
        });
        let layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("scene_pipeline_layout"),
            bind_group_layouts: &[&layouts.frame, &layouts.object, &layouts.map],
            push_constant_ranges: &[],
        });
        let opaque_pipeline = scene_pipeline(device, &layout, &shader, ctx.format(), false);
        let transparent_pipeline = scene_pipeline(device, &layout, &shader, ctx.format(), true);
        let shadow_pipeline = shadow_pipeline(device, &layouts);

        let frame_buffer = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("frame_buffer"),
            size: std::mem::size_of::<FrameUniform>() as u64,
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });

        let object_stride = uniform_stride::<ObjectUniform>(uniform_alignment);
        let objects = ObjectBuffer::new(
            device,
            &layouts.object,
            object_stride,
            INITIAL_OBJECT_CAPACITY,
        );

        let shadow_stride = uniform_stride::<ShadowUniform>(uniform_alignment);
        let shadow_buffer = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("shadow_buffer"),
            size: shadow_stride * MAX_LIGHTS as u64,
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });
        let shadow_bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("shadow_bind_group"),
            layout: &layouts.shadow,
            entries: &[wgpu::BindGroupEntry {
                binding: 0,
                resource: wgpu::BindingResource::Buffer(wgpu::BufferBinding {
                    buffer: &shadow_buffer,
                    offset: 0,
                    size: NonZeroU64::new(std::mem::size_of::<ShadowUniform>() as u64),
                }),
            }],
        });

        let shadow_sampler = device.create_sampler(&wgpu::SamplerDescriptor {
            label: Some("shadow_sampler"),
            mag_filter: wgpu::FilterMode::Linear,
            min_filter: wgpu::FilterMode::Linear,
            compare: Some(wgpu::CompareFunction::LessEqual),
            ..Default::default()
        });
        let shadows = ShadowMaps::new(
            device,
            &layouts,
            &frame_buffer,
            &shadow_sampler,
            INITIAL_SHADOW_MAP_SIZE,
        );

        let map_sampler = device.create_sampler(&wgpu::SamplerDescriptor {
            label: Some("map_sampler"),
            mag_filter: wgpu::FilterMode::Linear,
            min_filter: wgpu::FilterMode::Linear,
            ..Default::default()
        });
        let blank_map = create_blank_map(device, &ctx.queue, &layouts.map, &map_sampler);

        let screen = ScreenAttachments::new(device, ctx.format(), ctx.size());

        Self {
            layouts,
            opaque_pipeline,
            transparent_pipeline,
            shadow_pipeline,
            frame_buffer,
            objects,
            shadow_buffer,
            shadow_stride,
            shadow_bind_group,
            shadow_sampler,
            shadows,
            map_sampler,
            blank_map,
            screen,
            meshes: MeshCache::default(),
            targets: BTreeMap::new(),
            pending: None,
            ctx,
        }
    }

    pub fn context(&self) -> &GpuContext {
        &self.ctx
    }

    /// Number of distinct geometries uploaded so far.
    pub fn mesh_count(&self) -> usize {
        self.meshes.len()
    }

    /// Present the last screen frame, if one is waiting.
    pub fn present(&mut self) {
        if let Some(frame) = self.pending.take() {
            frame.present();
        }
    }

    /// Draw `overlay` on top of the last screen frame, then present it.
    pub fn present_with(
        &mut self,
        overlay: impl FnOnce(&wgpu::Device, &wgpu::Queue, &wgpu::TextureView),
    ) {
        let Some(frame) = self.pending.take() else {
            return;
        };
        let view = frame.texture.create_view(&Default::default());
        overlay(&self.ctx.device, &self.ctx.queue, &view);
        frame.present();
    }

    fn ensure_target(&mut self, scene: &SceneGraph, id: RenderTargetId) -> Result<(), RenderError> {
        if self.targets.contains_key(&id) {
            return Ok(());
        }
        let desc = scene.render_target(id)?;
        tracing::debug!(
            ?id,
            label = %desc.label,
            width = desc.width,
            height = desc.height,
            "creating render target"
        );
        let target = OffscreenTarget::new(
            &self.ctx.device,
            desc,
            self.ctx.format(),
            &self.layouts.map,
            &self.map_sampler,
        );
        self.targets.insert(id, target);
        Ok(())
    }

    fn ensure_shadow_size(&mut self, size: u32) {
        if size == self.shadows.size {
            return;
        }
        tracing::debug!(size, "resizing shadow maps");
        self.shadows = ShadowMaps::new(
            &self.ctx.device,
            &self.layouts,
            &self.frame_buffer,
            &self.shadow_sampler,
            size,
        );
    }

    fn ensure_object_capacity(&mut self, count: usize) {
        let count = count as u64;
        if count <= self.objects.capacity {
            return;
        }
        let capacity = count.next_power_of_two();
        self.objects = ObjectBuffer::new(
            &self.ctx.device,
            &self.layouts.object,
            self.objects.stride,
            capacity,
        );
    }

    /// The map a draw samples, unless it is missing or is the target being
    /// drawn into.
    fn map_for(
        &self,
        draw: &Draw<'_>,
        drawing_into: Option<RenderTargetId>,
    ) -> Option<&wgpu::BindGroup> {
        let id = draw.mesh.material.map()?;
        if Some(id) == drawing_into {
            return None;
        }
        self.targets.get(&id).map(|t| &t.bind_group)
    }

    fn record_shadow_passes(
        &self,
        encoder: &mut wgpu::CommandEncoder,
        draws: &[Draw<'_>],
        lights: &[LightUniform],
    ) {
        for (index, layer) in self.shadows.layers.iter().enumerate() {
            let mut pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("shadow_pass"),
                color_attachments: &[],
                depth_stencil_attachment: Some(wgpu::RenderPassDepthStencilAttachment {
                    view: layer,
                    depth_ops: Some(wgpu::Operations {
                        load: wgpu::LoadOp::Clear(1.0),
                        store: wgpu::StoreOp::Store,
                    }),
                    stencil_ops: None,
                }),
                ..Default::default()
            });

            if !lights.get(index).is_some_and(LightUniform::casts_shadow) {
                continue;
            }
            pass.set_pipeline(&self.shadow_pipeline);
            let offset = (index as u64 * self.shadow_stride) as u32;
            pass.set_bind_group(0, &self.shadow_bind_group, &[offset]);
            for (slot, draw) in draws.iter().enumerate() {
                if !draw.cast_shadow {
                    continue;
                }
                let Some(mesh) = self.meshes.get(&draw.mesh.geometry) else {
                    continue;
                };
                pass.set_bind_group(1, &self.objects.bind_group, &[self.objects.offset(slot)]);
                pass.set_vertex_buffer(0, mesh.vertex_buffer.slice(..));
                pass.set_index_buffer(mesh.index_buffer.slice(..), wgpu::IndexFormat::Uint32);
                pass.draw_indexed(0..mesh.index_count, 0, 0..1);
            }
        }
    }

    fn record_color_pass(
        &self,
        encoder: &mut wgpu::CommandEncoder,
        scene: &SceneGraph,
        draws: &[Draw<'_>],
        views: &PassViews,
        drawing_into: Option<RenderTargetId>,
    ) {
        let c = scene.clear_color;
        let mut pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
            label: Some("color_pass"),
            color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                view: &views.color,
                resolve_target: Some(&views.resolve),
                ops: wgpu::Operations {
                    load: wgpu::LoadOp::Clear(wgpu::Color {
                        r: f64::from(c.r),
                        g: f64::from(c.g),
                        b: f64::from(c.b),
                        a: f64::from(c.a),
                    }),
                    store: wgpu::StoreOp::Discard,
                },
            })],
            depth_stencil_attachment: Some(wgpu::RenderPassDepthStencilAttachment {
                view: &views.depth,
                depth_ops: Some(wgpu::Operations {
                    load: wgpu::LoadOp::Clear(1.0),
                    store: wgpu::StoreOp::Discard,
                }),
                stencil_ops: None,
            }),
            ..Default::default()
        });

        pass.set_bind_group(0, &self.shadows.frame_bind_group, &[]);
        let mut blending = None;
        for (slot, draw) in draws.iter().enumerate() {
            let Some(mesh) = self.meshes.get(&draw.mesh.geometry) else {
                continue;
            };
            let transparent = draw.is_transparent();
            if blending != Some(transparent) {
                pass.set_pipeline(if transparent {
                    &self.transparent_pipeline
                } else {
                    &self.opaque_pipeline
                });
                blending = Some(transparent);
            }
            let map = self.map_for(draw, drawing_into).unwrap_or(&self.blank_map);
            pass.set_bind_group(1, &self.objects.bind_group, &[self.objects.offset(slot)]);
            pass.set_bind_group(2, map, &[]);
            pass.set_vertex_buffer(0, mesh.vertex_buffer.slice(..));
            pass.set_index_buffer(mesh.index_buffer.slice(..), wgpu::IndexFormat::Uint32);
            pass.draw_indexed(0..mesh.index_count, 0, 0..1);
        }
    }
}

impl RenderBackend for WgpuBackend {
    fn set_size(&mut self, width: u32, height: u32) {
        self.ctx.resize(width, height);
        self.screen = ScreenAttachments::new(&self.ctx.device, self.ctx.format(), self.ctx.size());
    }

    fn size(&self) -> (u32, u32) {
        self.ctx.size()
    }

    fn render(
        &mut self,
        scene: &SceneGraph,
        camera: &PerspectiveCamera,
        target: RenderTarget,
    ) -> Result<(), RenderError> {
        let drawing_into = match target {
            RenderTarget::Screen => None,
            RenderTarget::Offscreen(id) => Some(id),
        };
        if let Some(id) = drawing_into {
            self.ensure_target(scene, id)?;
        }

        let draws = collect_draws(scene, camera);
        for draw in &draws {
            self.meshes.ensure(&self.ctx.device, &draw.mesh.geometry);
            if let Some(map) = draw.mesh.material.map() {
                if Some(map) == drawing_into {
                    tracing::debug!(
                        node = ?draw.node,
                        "mesh samples the target being drawn; map skipped"
                    );
                } else {
                    self.ensure_target(scene, map)?;
                }
            }
        }

        let lit: Vec<(LightUniform, u32)> = collect_lights(scene);
        let lights: Vec<LightUniform> = lit.iter().map(|(light, _)| *light).collect();
        if let Some(size) = lit.iter().map(|(_, size)| *size).max() {
            self.ensure_shadow_size(size);
        }

        let views = match drawing_into {
            None => {
                // A frame the host never presented is shown before drawing the next.
                self.present();
                let Some(frame) = self.ctx.acquire()? else {
                    return Ok(());
                };
                let resolve = frame.texture.create_view(&Default::default());
                self.pending = Some(frame);
                PassViews::new(&self.screen.color, &self.screen.depth, resolve)
            }
            Some(id) => {
                let t = self
                    .targets
                    .get(&id)
                    .ok_or(mirrorlight_scene::SceneError::TargetNotFound(id))?;
                let resolve = t.resolve.create_view(&Default::default());
                PassViews::new(&t.color, &t.depth, resolve)
            }
        };

        self.ensure_object_capacity(draws.len());
        let objects: Vec<ObjectUniform> = draws
            .iter()
            .map(|draw| {
                let mapped = self.map_for(draw, drawing_into).is_some();
                ObjectUniform::new(draw.model, &draw.mesh.material, draw.receive_shadow, mapped)
            })
            .collect();
        if !objects.is_empty() {
            self.ctx.queue.write_buffer(
                &self.objects.buffer,
                0,
                &pack_strided(&objects, self.objects.stride),
            );
        }

        let shadow_passes: Vec<ShadowUniform> = lights
            .iter()
            .map(|light| ShadowUniform {
                view_proj: light.view_proj,
            })
            .collect();
        if !shadow_passes.is_empty() {
            self.ctx.queue.write_buffer(
                &self.shadow_buffer,
                0,
                &pack_strided(&shadow_passes, self.shadow_stride),
            );
        }

        let frame = FrameUniform::new(camera, scene.fog, &lights);
        self.ctx
            .queue
            .write_buffer(&self.frame_buffer, 0, bytemuck::bytes_of(&frame));

        let mut encoder = self
            .ctx
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("render_encoder"),
            });
        self.record_shadow_passes(&mut encoder, &draws, &lights);
        self.record_color_pass(&mut encoder, scene, &draws, &views, drawing_into);
        self.ctx.queue.submit(std::iter::once(encoder.finish()));

        tracing::trace!(?target, meshes = draws.len(), lights = lights.len(), "pass submitted");
        Ok(())
    }
}
