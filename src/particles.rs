//! Ambient point cloud drifting around the card, independent of the fold state.

use crate::scene::{Mat4, Transform};
use crate::Color;
use bytemuck::{Pod, Zeroable};
use std::sync::atomic::{AtomicU64, Ordering};

static NEXT_FIELD_GENERATION: AtomicU64 = AtomicU64::new(1);

pub const DEFAULT_PARTICLE_COUNT: usize = 500;
/// Edge length of the cube the points are sampled in.
pub const FIELD_EXTENT: f32 = 10.0;
pub const POINT_SIZE: f32 = 0.05;
pub const POINT_OPACITY: f32 = 0.8;
pub const DEFAULT_PARTICLE_SEED: u64 = 2026;

const SPIN_Y: f32 = 0.05;
const SPIN_X: f32 = 0.02;

/// A point's position and linear color, laid out for direct upload as instance data.
#[repr(C)]
#[derive(Copy, Clone, Debug, PartialEq, Pod, Zeroable)]
pub struct Particle {
    pub position: [f32; 3],
    pub color: [f32; 3],
}

impl Particle {
    pub const ATTRIBS: [wgpu::VertexAttribute; 2] = wgpu::vertex_attr_array![
        0 => Float32x3,
        1 => Float32x3,
    ];

    pub fn desc() -> wgpu::VertexBufferLayout<'static> {
        wgpu::VertexBufferLayout {
            array_stride: std::mem::size_of::<Particle>() as wgpu::BufferAddress,
            step_mode: wgpu::VertexStepMode::Instance,
            attributes: &Self::ATTRIBS,
        }
    }
}

/// Immutable point positions plus a global rotation that advances with time.
#[derive(Debug, Clone)]
pub struct ParticleField {
    particles: Vec<Particle>,
    rotation: Transform,
    seed: u64,
    generation: u64,
}

impl ParticleField {
    /// Samples `count` points uniformly in a cube centered on the origin. Each color is the
    /// linear `base_color * (0.6 + 0.4 r)` for a uniform `r`. The same seed always yields the same
    /// field.
    pub fn build(count: usize, base_color: Color, seed: u64) -> Self {
        let mut rng = fastrand::Rng::with_seed(seed);
        let [r, g, b, _] = base_color.linear_rgba();
        let half = FIELD_EXTENT * 0.5;

        let particles = (0..count)
            .map(|_| {
                let position = [
                    (rng.f32() - 0.5) * FIELD_EXTENT,
                    (rng.f32() - 0.5) * FIELD_EXTENT,
                    (rng.f32() - 0.5) * FIELD_EXTENT,
                ];
                debug_assert!(position.iter().all(|c| c.abs() <= half));
                let gradient = 0.6 + 0.4 * rng.f32();
                Particle {
                    position,
                    color: [r * gradient, g * gradient, b * gradient],
                }
            })
            .collect();

        Self {
            particles,
            rotation: Transform::IDENTITY,
            seed,
            generation: NEXT_FIELD_GENERATION.fetch_add(1, Ordering::Relaxed),
        }
    }

    pub fn particles(&self) -> &[Particle] {
        &self.particles
    }

    pub fn len(&self) -> usize {
        self.particles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.particles.is_empty()
    }

    pub fn seed(&self) -> u64 {
        self.seed
    }

    /// Unique per built field, so GPU copies can tell fields apart even when their points match.
    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Sets the global rotation for `elapsed` seconds since mount.
    pub fn update(&mut self, elapsed: f32) {
        self.rotation.rotation.y = elapsed * SPIN_Y;
        self.rotation.rotation.x = elapsed * SPIN_X;
    }

    pub fn rotation(&self) -> &Transform {
        &self.rotation
    }

    pub fn world(&self) -> Mat4 {
        self.rotation.to_matrix()
    }
}
