use std::collections::HashMap;
use std::sync::Arc;

use mirrorlight_geometry::Geometry;
use mirrorlight_scene::RenderTargetDesc;
use wgpu::util::DeviceExt;

pub const DEPTH_FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Depth32Float;
/// Samples per pixel in every colour pass. Shadow maps stay single-sampled.
pub const SAMPLE_COUNT: u32 = 4;

fn extent(width: u32, height: u32) -> wgpu::Extent3d {
    wgpu::Extent3d {
        width: width.max(1),
        height: height.max(1),
        depth_or_array_layers: 1,
    }
}

/// Attachment drawn with [`SAMPLE_COUNT`] samples per pixel. Only ever
/// rendered into; colour attachments resolve into a separate texture.
pub fn multisampled_descriptor(
    label: &str,
    width: u32,
    height: u32,
    format: wgpu::TextureFormat,
) -> wgpu::TextureDescriptor<'_> {
    wgpu::TextureDescriptor {
        label: Some(label),
        size: extent(width, height),
        mip_level_count: 1,
        sample_count: SAMPLE_COUNT,
        dimension: wgpu::TextureDimension::D2,
        format,
        usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
        view_formats: &[],
    }
}

/// Single-sampled texture a multisampled pass resolves into, bindable as a
/// material map.
pub fn resolve_descriptor(
    label: &str,
    width: u32,
    height: u32,
    format: wgpu::TextureFormat,
) -> wgpu::TextureDescriptor<'_> {
    wgpu::TextureDescriptor {
        label: Some(label),
        size: extent(width, height),
        mip_level_count: 1,
        sample_count: 1,
        dimension: wgpu::TextureDimension::D2,
        format,
        usage: wgpu::TextureUsages::RENDER_ATTACHMENT | wgpu::TextureUsages::TEXTURE_BINDING,
        view_formats: &[],
    }
}

/// Vertex and index buffers for one geometry.
pub struct GpuMesh {
    pub vertex_buffer: wgpu::Buffer,
    pub index_buffer: wgpu::Buffer,
    pub index_count: u32,
    // Holds the geometry alive so its address cannot be reused as a key.
    _source: Arc<Geometry>,
}

/// Uploaded geometry keyed by the shared allocation, so meshes that share a
/// geometry share buffers.
#[derive(Default)]
pub struct MeshCache {
    meshes: HashMap<usize, GpuMesh>,
}

impl MeshCache {
    fn key(geometry: &Arc<Geometry>) -> usize {
        Arc::as_ptr(geometry) as usize
    }

    pub fn ensure(&mut self, device: &wgpu::Device, geometry: &Arc<Geometry>) {
        self.meshes.entry(Self::key(geometry)).or_insert_with(|| {
            tracing::debug!(
                vertices = geometry.vertex_count(),
                triangles = geometry.triangle_count(),
                "uploading geometry"
            );
            GpuMesh {
                vertex_buffer: device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
                    label: Some("mesh_vertex_buffer"),
                    contents: bytemuck::cast_slice(&geometry.vertices),
                    usage: wgpu::BufferUsages::VERTEX,
                }),
                index_buffer: device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
                    label: Some("mesh_index_buffer"),
                    contents: bytemuck::cast_slice(&geometry.indices),
                    usage: wgpu::BufferUsages::INDEX,
                }),
                index_count: geometry.indices.len() as u32,
                _source: Arc::clone(geometry),
            }
        });
    }

    pub fn get(&self, geometry: &Arc<Geometry>) -> Option<&GpuMesh> {
        self.meshes.get(&Self::key(geometry))
    }

    pub fn len(&self) -> usize {
        self.meshes.len()
    }
}

/// Multisampled colour and depth for the window. The colour attachment
/// resolves into the surface texture.
pub struct ScreenAttachments {
    pub color: wgpu::Texture,
    pub depth: wgpu::Texture,
}

impl ScreenAttachments {
    pub fn new(device: &wgpu::Device, format: wgpu::TextureFormat, size: (u32, u32)) -> Self {
        let (width, height) = size;
        let color = multisampled_descriptor("screen_color", width, height, format);
        Self {
            color: device.create_texture(&color),
            depth: create_depth_texture(device, width, height),
        }
    }
}

/// Multisampled colour and depth for an offscreen target, the texture they
/// resolve into, and the bind group that lets materials sample it.
pub struct OffscreenTarget {
    pub color: wgpu::Texture,
    pub resolve: wgpu::Texture,
    pub depth: wgpu::Texture,
    pub bind_group: wgpu::BindGroup,
}

impl OffscreenTarget {
    /// Both `Rgb` and `Rgba` targets use `format`, so every colour pipeline
    /// can draw into them.
    pub fn new(
        device: &wgpu::Device,
        desc: &RenderTargetDesc,
        format: wgpu::TextureFormat,
        map_layout: &wgpu::BindGroupLayout,
        sampler: &wgpu::Sampler,
    ) -> Self {
        let (width, height) = (desc.width, desc.height);
        let color = multisampled_descriptor(&desc.label, width, height, format);
        let resolve = resolve_descriptor(&desc.label, width, height, format);
        let color = device.create_texture(&color);
        let resolve = device.create_texture(&resolve);
        let depth = create_depth_texture(device, width, height);
        let view = resolve.create_view(&Default::default());
        let bind_group = create_map_bind_group(device, map_layout, &view, sampler);
        Self {
            color,
            resolve,
            depth,
            bind_group,
        }
    }
}

pub fn create_depth_texture(device: &wgpu::Device, width: u32, height: u32) -> wgpu::Texture {
    let desc = multisampled_descriptor("depth_texture", width, height, DEPTH_FORMAT);
    device.create_texture(&desc)
}

/// Depth array with one layer per light, rendered into and then sampled.
pub fn create_shadow_texture(device: &wgpu::Device, size: u32, layers: u32) -> wgpu::Texture {
    device.create_texture(&wgpu::TextureDescriptor {
        label: Some("shadow_maps"),
        size: wgpu::Extent3d {
            width: size.max(1),
            height: size.max(1),
            depth_or_array_layers: layers,
        },
        mip_level_count: 1,
        sample_count: 1,
        dimension: wgpu::TextureDimension::D2,
        format: DEPTH_FORMAT,
        usage: wgpu::TextureUsages::RENDER_ATTACHMENT | wgpu::TextureUsages::TEXTURE_BINDING,
        view_formats: &[],
    })
}

pub fn create_map_bind_group(
    device: &wgpu::Device,
    layout: &wgpu::BindGroupLayout,
    view: &wgpu::TextureView,
    sampler: &wgpu::Sampler,
) -> wgpu::BindGroup {
    device.create_bind_group(&wgpu::BindGroupDescriptor {
        label: Some("map_bind_group"),
        layout,
        entries: &[
            wgpu::BindGroupEntry {
                binding: 0,
                resource: wgpu::BindingResource::TextureView(view),
            },
            wgpu::BindGroupEntry {
                binding: 1,
                resource: wgpu::BindingResource::Sampler(sampler),
            },
        ],
    })
}

/// A 1x1 white texture bound for meshes without a map.
pub fn create_blank_map(
    device: &wgpu::Device,
    queue: &wgpu::Queue,
    layout: &wgpu::BindGroupLayout,
    sampler: &wgpu::Sampler,
) -> wgpu::BindGroup {
    let texture = device.create_texture_with_data(
        queue,
        &wgpu::TextureDescriptor {
            label: Some("blank_map"),
            size: wgpu::Extent3d {
                width: 1,
                height: 1,
                depth_or_array_layers: 1,
            },
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format: wgpu::TextureFormat::Rgba8Unorm,
            usage: wgpu::TextureUsages::TEXTURE_BINDING,
            view_formats: &[],
        },
        wgpu::util::TextureDataOrder::LayerMajor,
        &[255, 255, 255, 255],
    );
    let view = texture.create_view(&Default::default());
    create_map_bind_group(device, layout, &view, sampler)
}
