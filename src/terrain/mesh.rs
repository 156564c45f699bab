//! Terrain mesh data and grid mesh construction
//!
//! The crate only produces mesh *data*; building renderable and collidable
//! objects from it is the host's job.

use glam::{Vec2, Vec3};

use crate::heightmap::field::HeightField;

/// Raw mesh data handed to the rendering/physics host.
#[derive(Clone, Debug, Default)]
pub struct MeshData {
    /// Vertex positions, local to the chunk origin (minimum corner)
    pub positions: Vec<Vec3>,
    /// Triangle indices, counter-clockwise from above
    pub indices: Vec<u32>,
    /// Per-vertex texture coordinates in [0, 1]
    pub uvs: Vec<Vec2>,
}

impl MeshData {
    pub fn vertex_count(&self) -> usize {
        self.positions.len()
    }

    pub fn triangle_count(&self) -> usize {
        self.indices.len() / 3
    }
}

/// Build the full-detail grid mesh for a chunk from its height field.
///
/// Produces `(size + 1)²` vertices displaced by the field and `size² * 2`
/// triangles. Vertex (x, z) sits at local position `(x, height, z)` so the
/// mesh covers `[0, size]` on both horizontal axes; the chunk's world origin
/// is applied by the host, keeping neighboring grids edge-aligned.
pub fn build_grid_mesh(field: &HeightField, size: u32) -> MeshData {
    let verts_per_side = size as usize + 1;
    debug_assert_eq!(field.resolution(), verts_per_side);

    let mut positions = Vec::with_capacity(verts_per_side * verts_per_side);
    let mut uvs = Vec::with_capacity(verts_per_side * verts_per_side);
    for z in 0..verts_per_side {
        for x in 0..verts_per_side {
            positions.push(Vec3::new(x as f32, field.get(x, z), z as f32));
            uvs.push(Vec2::new(x as f32 / size as f32, z as f32 / size as f32));
        }
    }

    let mut indices = Vec::with_capacity(size as usize * size as usize * 6);
    for z in 0..size as usize {
        for x in 0..size as usize {
            let i = (z * verts_per_side + x) as u32;
            let step = verts_per_side as u32;
            indices.extend_from_slice(&[i, i + step, i + 1]);
            indices.extend_from_slice(&[i + 1, i + step, i + step + 1]);
        }
    }

    MeshData { positions, indices, uvs }
}

/// Reduced-detail mesh for far LOD tiers.
///
/// Placeholder identity transform; a real implementation may substitute
/// vertex decimation here without touching any caller.
pub fn simplify_mesh(mesh: &MeshData) -> MeshData {
    mesh.clone()
}
