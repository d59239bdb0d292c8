use super::*;

/// Strips the per-row alignment padding wgpu requires for buffer copies.
fn copy_padded_readback_rows(
    data: &[u8],
    height: u32,
    unpadded_bytes_per_row: u32,
    padded_bytes_per_row: u32,
    output: &mut Vec<u8>,
) {
    let row_len = unpadded_bytes_per_row as usize;
    output.clear();
    output.reserve(row_len * height as usize);
    for row in data
        .chunks(padded_bytes_per_row as usize)
        .take(height as usize)
    {
        output.extend_from_slice(&row[..row_len.min(row.len())]);
    }
}

impl<'a> Renderer<'a> {
    fn map_readback_buffer_into(
        device: &wgpu::Device,
        buffer: &wgpu::Buffer,
        mapped_bytes: &mut Vec<u8>,
    ) {
        mapped_bytes.clear();

        let buffer_slice = buffer.slice(..);
        let (sender, receiver) = std::sync::mpsc::channel();
        buffer_slice.map_async(wgpu::MapMode::Read, move |result| {
            if sender.send(result).is_err() {
                tracing::warn!("failed to send map_async result from callback");
            }
        });

        let _ = device.poll(wgpu::PollType::Wait);

        let map_result = match receiver.recv() {
            Ok(result) => result,
            Err(error) => {
                tracing::warn!(%error, "failed to receive mapped buffer result");
                return;
            }
        };

        if let Err(error) = map_result {
            tracing::warn!(?error, "failed to map readback buffer");
            return;
        }

        let mapped_range = buffer_slice.get_mapped_range();
        mapped_bytes.extend_from_slice(&mapped_range);
        drop(mapped_range);
        buffer.unmap();
    }

    /// Renders `frame` offscreen and copies the pixels into `buffer` as tightly packed
    /// BGRA8 rows. Leaves `buffer` empty if the readback fails.
    pub fn render_to_buffer(&mut self, frame: &FrameSnapshot<'_>, buffer: &mut Vec<u8>) {
        let (width, height) = self.physical_size;

        let size_changed = self.rtb_cached_width != width || self.rtb_cached_height != height;
        if size_changed {
            self.rtb_cached_width = width;
            self.rtb_cached_height = height;
        }

        let output_texture = match self.rtb_offscreen_texture.take() {
            Some(texture) if !size_changed => texture,
            _ => create_offscreen_color_texture(&self.device, (width, height), self.config.format),
        };
        let texture_view = output_texture.create_view(&wgpu::TextureViewDescriptor::default());
        self.render_to_texture_view(frame, &texture_view);

        let (unpadded_bytes_per_row, padded_bytes_per_row) = compute_padded_bytes_per_row(width, 4);

        let buffer_size = (padded_bytes_per_row * height) as u64;
        let output_buffer = match self.rtb_readback_buffer.take() {
            Some(existing) if !size_changed && existing.size() >= buffer_size => existing,
            _ => create_readback_buffer(&self.device, Some("rtb_readback_buffer"), buffer_size),
        };

        let mut encoder = self
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("copy_texture_encoder"),
            });

        encode_copy_texture_to_buffer(
            &mut encoder,
            &output_texture,
            &output_buffer,
            width,
            height,
            padded_bytes_per_row,
        );

        self.queue.submit(std::iter::once(encoder.finish()));

        let mut readback_bytes = std::mem::take(&mut self.scratch.readback_bytes);
        Self::map_readback_buffer_into(&self.device, &output_buffer, &mut readback_bytes);
        let required_readback_len = (height as usize).saturating_mul(padded_bytes_per_row as usize);
        if readback_bytes.len() < required_readback_len {
            buffer.clear();
        } else {
            copy_padded_readback_rows(
                &readback_bytes,
                height,
                unpadded_bytes_per_row,
                padded_bytes_per_row,
                buffer,
            );
        }

        self.scratch.readback_bytes = readback_bytes;
        self.rtb_offscreen_texture = Some(output_texture);
        self.rtb_readback_buffer = Some(output_buffer);
    }
}

#[cfg(test)]
mod tests {
    use super::copy_padded_readback_rows;

    #[test]
    fn tightly_packed_rows_pass_through() {
        let data = vec![1, 2, 3, 4, 5, 6, 7, 8];
        let mut output = vec![0xff; 3];

        copy_padded_readback_rows(&data, 2, 4, 4, &mut output);
        assert_eq!(output, data);
    }

    #[test]
    fn row_padding_is_dropped() {
        let data = vec![1, 2, 3, 4, 0, 0, 0, 0, 5, 6, 7, 8, 0, 0, 0, 0, 9, 9];
        let mut output = Vec::new();

        copy_padded_readback_rows(&data, 2, 4, 8, &mut output);
        assert_eq!(output, vec![1, 2, 3, 4, 5, 6, 7, 8]);
    }
}
