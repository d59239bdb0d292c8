use super::*;

impl<'a> Renderer<'a> {
    /// Creates a renderer that presents to `window`.
    pub async fn new(
        window: impl Into<SurfaceTarget<'static>>,
        physical_size: (u32, u32),
        vsync: bool,
    ) -> Result<Self, RendererError> {
        let instance = wgpu::Instance::new(&InstanceDescriptor::default());
        let surface = instance.create_surface(window)?;

        let adapter = instance
            .request_adapter(&wgpu::RequestAdapterOptions {
                power_preference: wgpu::PowerPreference::HighPerformance,
                compatible_surface: Some(&surface),
                force_fallback_adapter: false,
            })
            .await?;

        let (device, queue) = adapter
            .request_device(&wgpu::DeviceDescriptor {
                label: None,
                required_features: wgpu::Features::empty(),
                required_limits: wgpu::Limits::default(),
                memory_hints: Default::default(),
                trace: Default::default(),
            })
            .await?;

        let capabilities = surface.get_capabilities(&adapter);
        let swapchain_format = capabilities
            .formats
            .iter()
            .copied()
            .find(|format| format.is_srgb())
            .unwrap_or(wgpu::TextureFormat::Bgra8UnormSrgb);

        let config = wgpu::SurfaceConfiguration {
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
            format: swapchain_format,
            width: physical_size.0.max(1),
            height: physical_size.1.max(1),
            present_mode: if vsync {
                wgpu::PresentMode::AutoVsync
            } else {
                wgpu::PresentMode::AutoNoVsync
            },
            desired_maximum_frame_latency: 2,
            alpha_mode: CompositeAlphaMode::Opaque,
            view_formats: vec![],
        };
        surface.configure(&device, &config);

        tracing::info!(
            adapter = %adapter.get_info().name,
            format = ?swapchain_format,
            width = physical_size.0,
            height = physical_size.1,
            "renderer created"
        );

        Ok(Self::build_from_device(
            instance,
            Some(surface),
            device,
            queue,
            config,
            physical_size,
        ))
    }

    /// Creates a renderer without a window surface. Read frames back with
    /// [`render_to_buffer`](Self::render_to_buffer).
    ///
    /// Returns `None` if no suitable GPU adapter is available, so tests on machines without
    /// a GPU can skip instead of failing.
    pub async fn try_new_headless(physical_size: (u32, u32)) -> Option<Self> {
        let instance = wgpu::Instance::new(&InstanceDescriptor::default());

        let adapter = instance
            .request_adapter(&wgpu::RequestAdapterOptions {
                power_preference: wgpu::PowerPreference::HighPerformance,
                compatible_surface: None,
                force_fallback_adapter: false,
            })
            .await
            .ok()?;

        let (device, queue) = adapter
            .request_device(&wgpu::DeviceDescriptor {
                label: None,
                required_features: wgpu::Features::empty(),
                required_limits: wgpu::Limits::default(),
                memory_hints: Default::default(),
                trace: Default::default(),
            })
            .await
            .ok()?;

        let config = wgpu::SurfaceConfiguration {
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT | wgpu::TextureUsages::COPY_SRC,
            format: wgpu::TextureFormat::Bgra8UnormSrgb,
            width: physical_size.0.max(1),
            height: physical_size.1.max(1),
            present_mode: wgpu::PresentMode::AutoVsync,
            desired_maximum_frame_latency: 2,
            alpha_mode: CompositeAlphaMode::Opaque,
            view_formats: vec![],
        };

        tracing::debug!(adapter = %adapter.get_info().name, "headless renderer created");

        Some(Self::build_from_device(
            instance,
            None,
            device,
            queue,
            config,
            physical_size,
        ))
    }

    fn build_from_device(
        instance: wgpu::Instance,
        surface: Option<wgpu::Surface<'a>>,
        device: wgpu::Device,
        queue: wgpu::Queue,
        config: wgpu::SurfaceConfiguration,
        physical_size: (u32, u32),
    ) -> Self {
        let device = Arc::new(device);
        let queue = Arc::new(queue);

        let frame_layout = create_frame_bind_group_layout(&device);
        let draw_bind_group_layout = create_draw_bind_group_layout(&device);
        let texture_layout = create_texture_bind_group_layout(&device);

        let mesh_pipeline = create_mesh_pipeline(
            &device,
            config.format,
            &frame_layout,
            &draw_bind_group_layout,
            &texture_layout,
        );
        let particle_pipeline = create_particle_pipeline(&device, config.format, &frame_layout);

        let frame_uniform_buffer = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("frame_uniform_buffer"),
            size: std::mem::size_of::<FrameUniforms>() as u64,
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });
        let frame_bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            layout: &frame_layout,
            entries: &[wgpu::BindGroupEntry {
                binding: 0,
                resource: frame_uniform_buffer.as_entire_binding(),
            }],
            label: Some("frame_bind_group"),
        });

        let draw_stride = align_to(
            DRAW_UNIFORMS_SIZE,
            device.limits().min_uniform_buffer_offset_alignment as u64,
        );
        let (draw_uniform_buffer, draw_bind_group) = Self::create_draw_uniforms(
            &device,
            &draw_bind_group_layout,
            draw_stride,
            INITIAL_DRAW_CAPACITY,
        );

        let texture_manager = TextureManager::new(device.clone(), queue.clone(), texture_layout);
        let depth_texture_view = create_depth_texture(&device, physical_size)
            .create_view(&wgpu::TextureViewDescriptor::default());

        Self {
            physical_size,
            instance,
            surface,
            device,
            queue,
            config,
            mesh_pipeline,
            particle_pipeline,
            frame_uniform_buffer,
            frame_bind_group,
            draw_bind_group_layout,
            draw_uniform_buffer,
            draw_bind_group,
            draw_capacity: INITIAL_DRAW_CAPACITY,
            draw_stride,
            texture_manager,
            depth_texture_view,
            mesh_cache: MeshCache::default(),
            particle_buffer: None,
            rtb_offscreen_texture: None,
            rtb_readback_buffer: None,
            rtb_cached_width: 0,
            rtb_cached_height: 0,
            scratch: RendererScratch::default(),
        }
    }

    pub(super) fn create_draw_uniforms(
        device: &wgpu::Device,
        layout: &wgpu::BindGroupLayout,
        stride: u64,
        capacity: usize,
    ) -> (wgpu::Buffer, wgpu::BindGroup) {
        let buffer = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("draw_uniform_buffer"),
            size: stride * capacity as u64,
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });
        let bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            layout,
            entries: &[wgpu::BindGroupEntry {
                binding: 0,
                resource: wgpu::BindingResource::Buffer(wgpu::BufferBinding {
                    buffer: &buffer,
                    offset: 0,
                    size: std::num::NonZeroU64::new(DRAW_UNIFORMS_SIZE),
                }),
            }],
            label: Some("draw_bind_group"),
        });
        (buffer, bind_group)
    }
}
