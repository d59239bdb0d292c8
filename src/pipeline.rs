use crate::lighting::LightingRig;
use crate::particles::Particle;
use crate::scene::{Mat4, MeshVertex};
use crate::Color;
use std::num::NonZeroU64;
use wgpu::{BindGroupLayout, Device, RenderPipeline, Texture};

pub(crate) const DEPTH_FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Depth32Float;

/// Per-frame data shared by every draw: camera, the light rig and the particle cloud.
///
/// Every field is 16-byte aligned so the struct maps onto WGSL without hidden padding.
#[repr(C)]
#[derive(Copy, Clone, Debug, bytemuck::Pod, bytemuck::Zeroable)]
pub struct FrameUniforms {
    pub view_projection: [[f32; 4]; 4],
    pub camera_position: [f32; 4],
    /// rgb premultiplied by intensity.
    pub ambient: [f32; 4],
    pub directional_direction: [f32; 4],
    pub directional_color: [f32; 4],
    pub point_position: [f32; 4],
    pub point_color: [f32; 4],
    pub spot_position: [f32; 4],
    /// xyz toward the target, w is the cosine of the cone half-angle.
    pub spot_direction: [f32; 4],
    /// w is the penumbra fraction.
    pub spot_color: [f32; 4],
    /// x point size, y opacity, z and w the projection's x/y focal scale.
    pub particle: [f32; 4],
    pub particle_world: [[f32; 4]; 4],
}

fn premultiplied(color: Color, intensity: f32) -> [f32; 4] {
    let [r, g, b, _] = color.linear_rgba();
    [r * intensity, g * intensity, b * intensity, 1.0]
}

impl FrameUniforms {
    pub fn new(
        view: Mat4,
        projection: Mat4,
        camera_position: [f32; 3],
        lighting: &LightingRig,
        particle_world: Mat4,
        point_size: f32,
        point_opacity: f32,
    ) -> Self {
        let [cx, cy, cz] = camera_position;
        let directional = lighting.directional.direction;
        let spot = lighting.spot;
        let spot_direction = (spot.target - spot.position).normalize();

        Self {
            view_projection: mat4_columns(&view.then(&projection)),
            camera_position: [cx, cy, cz, 1.0],
            ambient: premultiplied(lighting.ambient.color, lighting.ambient.intensity),
            directional_direction: [directional.x, directional.y, directional.z, 0.0],
            directional_color: premultiplied(
                lighting.directional.color,
                lighting.directional.intensity,
            ),
            point_position: [
                lighting.point.position.x,
                lighting.point.position.y,
                lighting.point.position.z,
                1.0,
            ],
            point_color: premultiplied(lighting.point.color, lighting.point.intensity),
            spot_position: [spot.position.x, spot.position.y, spot.position.z, 1.0],
            spot_direction: [
                spot_direction.x,
                spot_direction.y,
                spot_direction.z,
                spot.angle.cos(),
            ],
            spot_color: {
                let [r, g, b, _] = premultiplied(spot.color, spot.intensity);
                [r, g, b, spot.penumbra]
            },
            particle: [point_size, point_opacity, projection.m11, projection.m22],
            particle_world: mat4_columns(&particle_world),
        }
    }
}

/// Per-draw data, bound with a dynamic offset into one shared buffer.
#[repr(C)]
#[derive(Copy, Clone, Debug, bytemuck::Pod, bytemuck::Zeroable)]
pub struct DrawUniforms {
    pub model: [[f32; 4]; 4],
    /// rgb and opacity.
    pub base_color: [f32; 4],
    /// rgb premultiplied by the shimmered intensity.
    pub emissive: [f32; 4],
    /// x metalness, y roughness, z 1.0 when the card image is sampled.
    pub surface: [f32; 4],
}

impl DrawUniforms {
    pub fn new(draw: &crate::scene::DrawItem) -> Self {
        let material = &draw.material;
        let [r, g, b, _] = material.base_color.linear_rgba();
        Self {
            model: mat4_columns(&draw.world),
            base_color: [r, g, b, material.opacity],
            emissive: premultiplied(material.emissive, material.emissive_intensity),
            surface: [
                material.metalness,
                material.roughness,
                if material.texture.is_some() { 1.0 } else { 0.0 },
                0.0,
            ],
        }
    }
}

pub(crate) const DRAW_UNIFORMS_SIZE: u64 = std::mem::size_of::<DrawUniforms>() as u64;

/// euclid matrices are row-vector; their rows are exactly the columns WGSL expects.
pub(crate) fn mat4_columns(matrix: &Mat4) -> [[f32; 4]; 4] {
    let m = matrix.to_array();
    [
        [m[0], m[1], m[2], m[3]],
        [m[4], m[5], m[6], m[7]],
        [m[8], m[9], m[10], m[11]],
        [m[12], m[13], m[14], m[15]],
    ]
}

pub fn create_frame_bind_group_layout(device: &Device) -> BindGroupLayout {
    device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
        entries: &[wgpu::BindGroupLayoutEntry {
            binding: 0,
            visibility: wgpu::ShaderStages::VERTEX_FRAGMENT,
            ty: wgpu::BindingType::Buffer {
                ty: wgpu::BufferBindingType::Uniform,
                has_dynamic_offset: false,
                min_binding_size: NonZeroU64::new(std::mem::size_of::<FrameUniforms>() as u64),
            },
            count: None,
        }],
        label: Some("frame_uniforms_bind_group_layout"),
    })
}

pub fn create_draw_bind_group_layout(device: &Device) -> BindGroupLayout {
    device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
        entries: &[wgpu::BindGroupLayoutEntry {
            binding: 0,
            visibility: wgpu::ShaderStages::VERTEX_FRAGMENT,
            ty: wgpu::BindingType::Buffer {
                ty: wgpu::BufferBindingType::Uniform,
                has_dynamic_offset: true,
                min_binding_size: NonZeroU64::new(DRAW_UNIFORMS_SIZE),
            },
            count: None,
        }],
        label: Some("draw_uniforms_bind_group_layout"),
    })
}

pub fn create_texture_bind_group_layout(device: &Device) -> BindGroupLayout {
    device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
        entries: &[
            wgpu::BindGroupLayoutEntry {
                binding: 0,
                visibility: wgpu::ShaderStages::FRAGMENT,
                ty: wgpu::BindingType::Texture {
                    multisampled: false,
                    view_dimension: wgpu::TextureViewDimension::D2,
                    sample_type: wgpu::TextureSampleType::Float { filterable: true },
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
        label: Some("card_texture_bind_group_layout"),
    })
}

fn create_shader_module(device: &Device) -> wgpu::ShaderModule {
    device.create_shader_module(wgpu::ShaderModuleDescriptor {
        label: Some("card_shader"),
        source: wgpu::ShaderSource::Wgsl(include_str!("./shader.wgsl").into()),
    })
}

/// Opaque-first card surfaces. Both faces are drawn since pages flip during the fold.
pub fn create_mesh_pipeline(
    device: &Device,
    format: wgpu::TextureFormat,
    frame_layout: &BindGroupLayout,
    draw_layout: &BindGroupLayout,
    texture_layout: &BindGroupLayout,
) -> RenderPipeline {
    let shader = create_shader_module(device);
    let layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
        label: Some("mesh_pipeline_layout"),
        bind_group_layouts: &[frame_layout, draw_layout, texture_layout],
        push_constant_ranges: &[],
    });

    device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
        label: Some("mesh_pipeline"),
        layout: Some(&layout),
        vertex: wgpu::VertexState {
            module: &shader,
            entry_point: Some("vs_mesh"),
            compilation_options: Default::default(),
            buffers: &[MeshVertex::desc()],
        },
        fragment: Some(wgpu::FragmentState {
            module: &shader,
            entry_point: Some("fs_mesh"),
            compilation_options: Default::default(),
            targets: &[Some(wgpu::ColorTargetState {
                format,
                blend: Some(wgpu::BlendState::ALPHA_BLENDING),
                write_mask: wgpu::ColorWrites::ALL,
            })],
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
            depth_write_enabled: true,
            depth_compare: wgpu::CompareFunction::Less,
            stencil: wgpu::StencilState::default(),
            bias: wgpu::DepthBiasState::default(),
        }),
        multisample: wgpu::MultisampleState::default(),
        multiview: None,
        cache: None,
    })
}

/// Camera-facing quads, one instance per particle. Depth tested against the card but never
/// written, so overlapping points blend.
pub fn create_particle_pipeline(
    device: &Device,
    format: wgpu::TextureFormat,
    frame_layout: &BindGroupLayout,
) -> RenderPipeline {
    let shader = create_shader_module(device);
    let layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
        label: Some("particle_pipeline_layout"),
        bind_group_layouts: &[frame_layout],
        push_constant_ranges: &[],
    });

    device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
        label: Some("particle_pipeline"),
        layout: Some(&layout),
        vertex: wgpu::VertexState {
            module: &shader,
            entry_point: Some("vs_particle"),
            compilation_options: Default::default(),
            buffers: &[Particle::desc()],
        },
        fragment: Some(wgpu::FragmentState {
            module: &shader,
            entry_point: Some("fs_particle"),
            compilation_options: Default::default(),
            targets: &[Some(wgpu::ColorTargetState {
                format,
                blend: Some(wgpu::BlendState::ALPHA_BLENDING),
                write_mask: wgpu::ColorWrites::ALL,
            })],
        }),
        primitive: wgpu::PrimitiveState::default(),
        depth_stencil: Some(wgpu::DepthStencilState {
            format: DEPTH_FORMAT,
            depth_write_enabled: false,
            depth_compare: wgpu::CompareFunction::Less,
            stencil: wgpu::StencilState::default(),
            bias: wgpu::DepthBiasState::default(),
        }),
        multisample: wgpu::MultisampleState::default(),
        multiview: None,
        cache: None,
    })
}

pub fn create_depth_texture(device: &Device, size: (u32, u32)) -> Texture {
    device.create_texture(&wgpu::TextureDescriptor {
        label: Some("depth_texture"),
        size: wgpu::Extent3d {
            width: size.0.max(1),
            height: size.1.max(1),
            depth_or_array_layers: 1,
        },
        mip_level_count: 1,
        sample_count: 1,
        dimension: wgpu::TextureDimension::D2,
        format: DEPTH_FORMAT,
        usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
        view_formats: &[],
    })
}

pub fn create_offscreen_color_texture(
    device: &Device,
    size: (u32, u32),
    format: wgpu::TextureFormat,
) -> Texture {
    device.create_texture(&wgpu::TextureDescriptor {
        label: Some("offscreen_color_texture"),
        size: wgpu::Extent3d {
            width: size.0.max(1),
            height: size.1.max(1),
            depth_or_array_layers: 1,
        },
        mip_level_count: 1,
        sample_count: 1,
        dimension: wgpu::TextureDimension::D2,
        format,
        usage: wgpu::TextureUsages::RENDER_ATTACHMENT | wgpu::TextureUsages::COPY_SRC,
        view_formats: &[],
    })
}

pub fn create_readback_buffer(device: &Device, label: Option<&str>, size: u64) -> wgpu::Buffer {
    device.create_buffer(&wgpu::BufferDescriptor {
        label,
        size,
        usage: wgpu::BufferUsages::COPY_DST | wgpu::BufferUsages::MAP_READ,
        mapped_at_creation: false,
    })
}

pub fn encode_copy_texture_to_buffer(
    encoder: &mut wgpu::CommandEncoder,
    texture: &Texture,
    buffer: &wgpu::Buffer,
    width: u32,
    height: u32,
    padded_bytes_per_row: u32,
) {
    encoder.copy_texture_to_buffer(
        wgpu::TexelCopyTextureInfo {
            texture,
            mip_level: 0,
            origin: wgpu::Origin3d::ZERO,
            aspect: wgpu::TextureAspect::All,
        },
        wgpu::TexelCopyBufferInfo {
            buffer,
            layout: wgpu::TexelCopyBufferLayout {
                offset: 0,
                bytes_per_row: Some(padded_bytes_per_row),
                rows_per_image: Some(height),
            },
        },
        wgpu::Extent3d {
            width,
            height,
            depth_or_array_layers: 1,
        },
    );
}
