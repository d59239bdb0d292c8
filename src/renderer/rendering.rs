use super::*;
use crate::scene::Scene;

impl<'a> Renderer<'a> {
    /// Draws `frame` to the window surface and presents it.
    pub fn render(&mut self, frame: &FrameSnapshot<'_>) -> Result<(), RendererError> {
        let output = match self.surface.as_ref() {
            Some(surface) => match surface.get_current_texture() {
                Ok(output) => output,
                Err(wgpu::SurfaceError::Lost | wgpu::SurfaceError::Outdated) => {
                    tracing::debug!("surface lost or outdated; reconfiguring");
                    surface.configure(&self.device, &self.config);
                    return Ok(());
                }
                Err(error) => return Err(error.into()),
            },
            None => return Err(RendererError::Headless),
        };
        let output_texture_view = output
            .texture
            .create_view(&wgpu::TextureViewDescriptor::default());

        self.render_to_texture_view(frame, &output_texture_view);
        output.present();
        Ok(())
    }

    /// Brings GPU resources in line with `frame` and writes this frame's uniforms.
    fn prepare_render(&mut self, frame: &FrameSnapshot<'_>) -> Option<TextureId> {
        if self.mesh_cache.epoch != Some(frame.epoch) {
            self.upload_meshes(frame.scene);
            self.mesh_cache.epoch = Some(frame.epoch);
        }
        self.upload_particles(frame);

        let card_texture = frame.card_image.map(|image| {
            let id = image.texture_id();
            if !self.texture_manager.is_texture_loaded(id) {
                if let Err(error) = self.texture_manager.allocate_texture_with_data(id, image) {
                    tracing::warn!(%error, "card image upload failed");
                }
                self.texture_manager.retain_only(Some(id));
            }
            id
        });

        let projection = frame.camera.projection(frame.aspect);
        let position = frame.camera.position;
        let uniforms = FrameUniforms::new(
            frame.camera.view(),
            projection,
            [position.x, position.y, position.z],
            frame.lighting,
            frame.particles.world,
            frame.particles.size,
            frame.particles.opacity,
        );
        self.queue.write_buffer(
            &self.frame_uniform_buffer,
            0,
            bytemuck::cast_slice(&[uniforms]),
        );

        self.write_draw_uniforms(frame);
        card_texture
    }

    fn upload_meshes(&mut self, scene: &Scene) {
        self.mesh_cache.meshes = scene
            .meshes()
            .iter()
            .map(|mesh| GpuMesh {
                vertex_buffer: self.device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
                    label: Some("mesh_vertex_buffer"),
                    contents: bytemuck::cast_slice(&mesh.vertices),
                    usage: wgpu::BufferUsages::VERTEX,
                }),
                index_buffer: self.device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
                    label: Some("mesh_index_buffer"),
                    contents: bytemuck::cast_slice(&mesh.padded_indices()),
                    usage: wgpu::BufferUsages::INDEX,
                }),
                index_count: mesh.indices.len() as u32,
            })
            .collect();
        tracing::debug!(
            epoch = scene.epoch(),
            meshes = self.mesh_cache.meshes.len(),
            "scene meshes uploaded"
        );
    }

    fn upload_particles(&mut self, frame: &FrameSnapshot<'_>) {
        let points = frame.particles.points;
        let generation = frame.particles.generation;
        if points.is_empty() {
            self.particle_buffer = None;
            return;
        }
        if self
            .particle_buffer
            .as_ref()
            .is_some_and(|existing| existing.generation == generation)
        {
            return;
        }
        let buffer = self.device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("particle_instance_buffer"),
            contents: bytemuck::cast_slice(points),
            usage: wgpu::BufferUsages::VERTEX,
        });
        self.particle_buffer = Some(ParticleBuffer {
            buffer,
            count: points.len() as u32,
            generation,
        });
    }

    fn write_draw_uniforms(&mut self, frame: &FrameSnapshot<'_>) {
        let needed = frame.draws.len();
        if needed > self.draw_capacity {
            let capacity = needed.next_power_of_two();
            let (buffer, bind_group) = Self::create_draw_uniforms(
                &self.device,
                &self.draw_bind_group_layout,
                self.draw_stride,
                capacity,
            );
            self.draw_uniform_buffer = buffer;
            self.draw_bind_group = bind_group;
            self.draw_capacity = capacity;
        }
        if needed == 0 {
            return;
        }

        let stride = self.draw_stride as usize;
        let bytes = &mut self.scratch.draw_uniforms;
        bytes.clear();
        bytes.resize(stride * needed, 0);
        for (index, draw) in frame.draws.iter().enumerate() {
            let uniforms = DrawUniforms::new(draw);
            let offset = index * stride;
            bytes[offset..offset + DRAW_UNIFORMS_SIZE as usize]
                .copy_from_slice(bytemuck::bytes_of(&uniforms));
        }
        self.queue
            .write_buffer(&self.draw_uniform_buffer, 0, bytes.as_slice());
    }

    pub(super) fn render_to_texture_view(
        &mut self,
        frame: &FrameSnapshot<'_>,
        texture_view: &wgpu::TextureView,
    ) {
        let card_texture = self.prepare_render(frame);

        let mut encoder = self
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("Render Command Encoder"),
            });

        {
            let [r, g, b, a] = frame.clear_color.linear_rgba();
            let mut render_pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("card_render_pass"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view: texture_view,
                    resolve_target: None,
                    ops: wgpu::Operations {
                        load: wgpu::LoadOp::Clear(wgpu::Color {
                            r: r as f64,
                            g: g as f64,
                            b: b as f64,
                            a: a as f64,
                        }),
                        store: wgpu::StoreOp::Store,
                    },
                })],
                depth_stencil_attachment: Some(wgpu::RenderPassDepthStencilAttachment {
                    view: &self.depth_texture_view,
                    depth_ops: Some(wgpu::Operations {
                        load: wgpu::LoadOp::Clear(1.0),
                        store: wgpu::StoreOp::Discard,
                    }),
                    stencil_ops: None,
                }),
                timestamp_writes: None,
                occlusion_query_set: None,
            });

            render_pass.set_pipeline(&self.mesh_pipeline);
            render_pass.set_bind_group(0, &self.frame_bind_group, &[]);
            for (index, draw) in frame.draws.iter().enumerate() {
                let Some(mesh) = self.mesh_cache.meshes.get(draw.mesh.index()) else {
                    tracing::warn!(node = %draw.node, "draw references a mesh that is not uploaded");
                    continue;
                };
                let offset = (index as u64 * self.draw_stride) as u32;
                let texture = if draw.material.texture.is_some() {
                    card_texture
                } else {
                    None
                };
                render_pass.set_bind_group(1, &self.draw_bind_group, &[offset]);
                render_pass.set_bind_group(2, self.texture_manager.bind_group(texture), &[]);
                render_pass.set_vertex_buffer(0, mesh.vertex_buffer.slice(..));
                render_pass.set_index_buffer(mesh.index_buffer.slice(..), wgpu::IndexFormat::Uint16);
                render_pass.draw_indexed(0..mesh.index_count, 0, 0..1);
            }

            if let Some(particles) = &self.particle_buffer {
                render_pass.set_pipeline(&self.particle_pipeline);
                render_pass.set_bind_group(0, &self.frame_bind_group, &[]);
                render_pass.set_vertex_buffer(0, particles.buffer.slice(..));
                render_pass.draw(0..6, 0..particles.count);
            }
        }

        self.queue.submit(std::iter::once(encoder.finish()));
    }
}
