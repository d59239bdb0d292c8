use bytemuck::{Pod, Zeroable};
use lyon::tessellation::VertexBuffers;

/// Vertex layout shared by every card mesh.
#[repr(C)]
#[derive(Copy, Clone, Debug, PartialEq, Pod, Zeroable)]
pub struct MeshVertex {
    pub position: [f32; 3],
    pub normal: [f32; 3],
    pub uv: [f32; 2],
}

impl MeshVertex {
    pub const ATTRIBS: [wgpu::VertexAttribute; 3] = wgpu::vertex_attr_array![
        0 => Float32x3,
        1 => Float32x3,
        2 => Float32x2,
    ];

    pub fn desc() -> wgpu::VertexBufferLayout<'static> {
        wgpu::VertexBufferLayout {
            array_stride: std::mem::size_of::<MeshVertex>() as wgpu::BufferAddress,
            step_mode: wgpu::VertexStepMode::Vertex,
            attributes: &Self::ATTRIBS,
        }
    }
}

/// Static triangle geometry. Never modified after the builder inserts it into a scene.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Mesh {
    pub vertices: Vec<MeshVertex>,
    pub indices: Vec<u16>,
}

impl Mesh {
    /// A `width` x `height` rectangle centered on the origin in the XY plane, facing +Z.
    /// UV (0, 0) is the top-left corner so images land upright.
    pub fn plane(width: f32, height: f32) -> Self {
        let (hw, hh) = (width * 0.5, height * 0.5);
        let normal = [0.0, 0.0, 1.0];
        let mut mesh = Mesh::default();
        mesh.add_quad([
            MeshVertex { position: [-hw, -hh, 0.0], normal, uv: [0.0, 1.0] },
            MeshVertex { position: [hw, -hh, 0.0], normal, uv: [1.0, 1.0] },
            MeshVertex { position: [hw, hh, 0.0], normal, uv: [1.0, 0.0] },
            MeshVertex { position: [-hw, hh, 0.0], normal, uv: [0.0, 0.0] },
        ]);
        mesh
    }

    /// An axis-aligned box centered on the origin.
    pub fn slab(width: f32, height: f32, depth: f32) -> Self {
        let (x, y, z) = (width * 0.5, height * 0.5, depth * 0.5);
        let mut mesh = Mesh::default();

        // (normal, four corners counter-clockwise seen from outside)
        let faces: [([f32; 3], [[f32; 3]; 4]); 6] = [
            ([0.0, 0.0, 1.0], [[-x, -y, z], [x, -y, z], [x, y, z], [-x, y, z]]),
            ([0.0, 0.0, -1.0], [[x, -y, -z], [-x, -y, -z], [-x, y, -z], [x, y, -z]]),
            ([1.0, 0.0, 0.0], [[x, -y, z], [x, -y, -z], [x, y, -z], [x, y, z]]),
            ([-1.0, 0.0, 0.0], [[-x, -y, -z], [-x, -y, z], [-x, y, z], [-x, y, -z]]),
            ([0.0, 1.0, 0.0], [[-x, y, z], [x, y, z], [x, y, -z], [-x, y, -z]]),
            ([0.0, -1.0, 0.0], [[-x, -y, -z], [x, -y, -z], [x, -y, z], [-x, -y, z]]),
        ];
        let uvs = [[0.0, 1.0], [1.0, 1.0], [1.0, 0.0], [0.0, 0.0]];

        for (normal, corners) in faces {
            let mut quad = [MeshVertex::zeroed(); 4];
            for (vertex, (position, uv)) in quad.iter_mut().zip(corners.iter().zip(uvs.iter())) {
                *vertex = MeshVertex {
                    position: *position,
                    normal,
                    uv: *uv,
                };
            }
            mesh.add_quad(quad);
        }
        mesh
    }

    /// Lifts a flat 2D tessellation into the XY plane at depth `z`, facing +Z. UVs are the
    /// normalized position inside the outline's bounding box.
    pub fn from_tessellation(buffers: &VertexBuffers<[f32; 2], u16>, z: f32) -> Self {
        let (mut min, mut max) = ([f32::MAX; 2], [f32::MIN; 2]);
        for [x, y] in &buffers.vertices {
            min = [min[0].min(*x), min[1].min(*y)];
            max = [max[0].max(*x), max[1].max(*y)];
        }
        let extent = [(max[0] - min[0]).max(f32::EPSILON), (max[1] - min[1]).max(f32::EPSILON)];

        let vertices = buffers
            .vertices
            .iter()
            .map(|[x, y]| MeshVertex {
                position: [*x, *y, z],
                normal: [0.0, 0.0, 1.0],
                uv: [(x - min[0]) / extent[0], 1.0 - (y - min[1]) / extent[1]],
            })
            .collect();

        Self {
            vertices,
            indices: buffers.indices.clone(),
        }
    }

    /// Two triangles: 0-1-2 and 0-2-3.
    pub fn add_quad(&mut self, quad: [MeshVertex; 4]) {
        let base = self.vertices.len() as u16;
        self.vertices.extend_from_slice(&quad);
        self.indices
            .extend_from_slice(&[base, base + 1, base + 2, base, base + 2, base + 3]);
    }

    pub fn triangle_count(&self) -> usize {
        self.indices.len() / 3
    }

    pub fn is_empty(&self) -> bool {
        self.indices.is_empty()
    }

    /// Index data padded to an even count; buffer writes must be 4-byte aligned.
    pub(crate) fn padded_indices(&self) -> Vec<u16> {
        let mut indices = self.indices.clone();
        if indices.len() % 2 == 1 {
            indices.push(0);
        }
        indices
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn plane_is_two_triangles_facing_z() {
        let plane = Mesh::plane(2.0, 2.67);
        assert_eq!(plane.vertices.len(), 4);
        assert_eq!(plane.triangle_count(), 2);
        assert!(plane.vertices.iter().all(|v| v.normal == [0.0, 0.0, 1.0]));
        assert_eq!(plane.vertices[3].position, [-1.0, 1.335, 0.0]);
        assert_eq!(plane.vertices[3].uv, [0.0, 0.0]);
    }

    #[test]
    fn slab_has_six_faces() {
        let slab = Mesh::slab(1.0, 1.0, 1.0);
        assert_eq!(slab.vertices.len(), 24);
        assert_eq!(slab.triangle_count(), 12);
    }

    #[test]
    fn tessellation_is_lifted_to_depth() {
        let mut buffers: VertexBuffers<[f32; 2], u16> = VertexBuffers::new();
        buffers.vertices.extend_from_slice(&[[0.0, 0.0], [1.0, 0.0], [0.0, 2.0]]);
        buffers.indices.extend_from_slice(&[0, 1, 2]);

        let mesh = Mesh::from_tessellation(&buffers, 0.01);
        assert_eq!(mesh.vertices[2].position, [0.0, 2.0, 0.01]);
        assert_eq!(mesh.vertices[2].uv, [0.0, 0.0]);
        assert_eq!(mesh.vertices[1].uv, [1.0, 1.0]);
        assert_eq!(mesh.padded_indices().len(), 4);
    }
}
