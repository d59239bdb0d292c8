use super::*;

impl<'a> Renderer<'a> {
    pub fn size(&self) -> (u32, u32) {
        self.physical_size
    }

    pub fn resize(&mut self, new_physical_size: (u32, u32)) {
        if new_physical_size.0 == 0 || new_physical_size.1 == 0 {
            tracing::trace!("ignoring resize to an empty surface");
            return;
        }
        self.physical_size = new_physical_size;
        self.config.width = new_physical_size.0;
        self.config.height = new_physical_size.1;

        if let Some(surface) = &self.surface {
            surface.configure(&self.device, &self.config);
        }
        self.recreate_depth_texture();
    }

    pub(super) fn recreate_depth_texture(&mut self) {
        self.depth_texture_view = create_depth_texture(&self.device, self.physical_size)
            .create_view(&wgpu::TextureViewDescriptor::default());
    }

    pub fn set_surface(
        &mut self,
        window: impl Into<SurfaceTarget<'static>>,
    ) -> Result<(), RendererError> {
        let surface = self.instance.create_surface(window)?;
        surface.configure(&self.device, &self.config);
        self.surface = Some(surface);
        Ok(())
    }

    pub fn set_vsync(&mut self, vsync: bool) {
        self.config.present_mode = if vsync {
            wgpu::PresentMode::AutoVsync
        } else {
            wgpu::PresentMode::AutoNoVsync
        };
        if let Some(surface) = &self.surface {
            surface.configure(&self.device, &self.config);
        }
    }
}
