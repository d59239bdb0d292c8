pub fn normalize_rgba_color(color: &[u8; 4]) -> [f32; 4] {
    [
        color[0] as f32 / 255.0,
        color[1] as f32 / 255.0,
        color[2] as f32 / 255.0,
        color[3] as f32 / 255.0,
    ]
}

/// sRGB transfer function, decoding direction.
pub fn srgb_to_linear(channel: f32) -> f32 {
    if channel >= 1.0 {
        1.0
    } else if channel <= 0.04045 {
        channel / 12.92
    } else {
        ((channel + 0.055) / 1.055).powf(2.4)
    }
}

/// Moves `current` a fraction `factor` of the remaining distance toward `target`.
#[inline(always)]
pub fn lerp(current: f32, target: f32, factor: f32) -> f32 {
    current + (target - current) * factor
}

/// Computes the row sizes used when copying a texture into a mappable buffer. Rows of a
/// texture-to-buffer copy must be aligned to `wgpu::COPY_BYTES_PER_ROW_ALIGNMENT`.
pub(crate) fn compute_padded_bytes_per_row(width: u32, bytes_per_pixel: u32) -> (u32, u32) {
    let unpadded_bytes_per_row = width * bytes_per_pixel;
    let alignment = wgpu::COPY_BYTES_PER_ROW_ALIGNMENT;
    let padding = (alignment - unpadded_bytes_per_row % alignment) % alignment;
    (unpadded_bytes_per_row, unpadded_bytes_per_row + padding)
}

/// Rounds `size` up to the next multiple of `alignment`.
pub(crate) fn align_to(size: u64, alignment: u64) -> u64 {
    size.div_ceil(alignment) * alignment
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lerp_moves_fraction_of_remaining_distance() {
        assert_eq!(lerp(0.0, 10.0, 0.25), 2.5);
        assert_eq!(lerp(10.0, 0.0, 0.5), 5.0);
    }

    #[test]
    fn padded_rows_are_aligned() {
        let (unpadded, padded) = compute_padded_bytes_per_row(100, 4);
        assert_eq!(unpadded, 400);
        assert_eq!(padded, 512);

        let (unpadded, padded) = compute_padded_bytes_per_row(64, 4);
        assert_eq!(unpadded, 256);
        assert_eq!(padded, 256);
    }

    #[test]
    fn align_to_rounds_up() {
        assert_eq!(align_to(112, 256), 256);
        assert_eq!(align_to(256, 256), 256);
        assert_eq!(align_to(257, 256), 512);
    }
}
