//! wgpu renderer for [`FrameSnapshot`]s.
//!
//! The renderer keeps GPU copies of whatever the snapshots reference: scene meshes are
//! uploaded once per scene epoch, the particle cloud once per field, and the card image once
//! per decoded bitmap. Each frame only rewrites the uniform buffers.

use std::sync::Arc;

use crate::id::TextureId;
use crate::pipeline::{
    create_depth_texture, create_draw_bind_group_layout, create_frame_bind_group_layout,
    create_mesh_pipeline, create_offscreen_color_texture, create_particle_pipeline,
    create_readback_buffer, create_texture_bind_group_layout, encode_copy_texture_to_buffer,
    DrawUniforms, FrameUniforms, DRAW_UNIFORMS_SIZE,
};
use crate::preview::FrameSnapshot;
use crate::texture_manager::TextureManager;
use crate::util::{align_to, compute_padded_bytes_per_row};
use wgpu::util::DeviceExt;
use wgpu::{CompositeAlphaMode, InstanceDescriptor, SurfaceTarget};

mod construction;
mod readback;
mod rendering;
mod surface;

#[derive(Debug, thiserror::Error)]
pub enum RendererError {
    #[error("failed to create surface: {0}")]
    CreateSurface(#[from] wgpu::CreateSurfaceError),
    #[error("no suitable GPU adapter: {0}")]
    RequestAdapter(#[from] wgpu::RequestAdapterError),
    #[error("failed to request device: {0}")]
    RequestDevice(#[from] wgpu::RequestDeviceError),
    #[error("surface error: {0}")]
    Surface(#[from] wgpu::SurfaceError),
    #[error("renderer has no surface; use render_to_buffer")]
    Headless,
}

/// Initial capacity of the per-draw uniform buffer, in draws.
const INITIAL_DRAW_CAPACITY: usize = 64;

struct GpuMesh {
    vertex_buffer: wgpu::Buffer,
    index_buffer: wgpu::Buffer,
    index_count: u32,
}

/// Meshes of one scene. Rebuilt whenever a snapshot carries a different epoch.
#[derive(Default)]
struct MeshCache {
    epoch: Option<u64>,
    meshes: Vec<GpuMesh>,
}

struct ParticleBuffer {
    buffer: wgpu::Buffer,
    count: u32,
    /// Generation of the particle field the buffer was filled from.
    generation: u64,
}

#[derive(Default)]
struct RendererScratch {
    draw_uniforms: Vec<u8>,
    readback_bytes: Vec<u8>,
}

pub struct Renderer<'a> {
    physical_size: (u32, u32),

    instance: wgpu::Instance,
    surface: Option<wgpu::Surface<'a>>,
    device: Arc<wgpu::Device>,
    queue: Arc<wgpu::Queue>,
    config: wgpu::SurfaceConfiguration,

    mesh_pipeline: wgpu::RenderPipeline,
    particle_pipeline: wgpu::RenderPipeline,

    frame_uniform_buffer: wgpu::Buffer,
    frame_bind_group: wgpu::BindGroup,

    draw_bind_group_layout: wgpu::BindGroupLayout,
    draw_uniform_buffer: wgpu::Buffer,
    draw_bind_group: wgpu::BindGroup,
    draw_capacity: usize,
    draw_stride: u64,

    texture_manager: TextureManager,
    depth_texture_view: wgpu::TextureView,

    mesh_cache: MeshCache,
    particle_buffer: Option<ParticleBuffer>,

    rtb_offscreen_texture: Option<wgpu::Texture>,
    rtb_readback_buffer: Option<wgpu::Buffer>,
    rtb_cached_width: u32,
    rtb_cached_height: u32,

    scratch: RendererScratch,
}

impl Renderer<'_> {
    pub fn device(&self) -> &wgpu::Device {
        &self.device
    }

    pub fn queue(&self) -> &wgpu::Queue {
        &self.queue
    }

    pub fn texture_manager(&self) -> &TextureManager {
        &self.texture_manager
    }

    pub fn is_headless(&self) -> bool {
        self.surface.is_none()
    }

    /// Number of meshes currently resident on the GPU.
    pub fn cached_meshes(&self) -> usize {
        self.mesh_cache.meshes.len()
    }
}
