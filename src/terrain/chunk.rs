//! Chunk entity: one square terrain tile and its decorations

use glam::Vec3;

use crate::heightmap::field::HeightField;
use crate::streaming::lod::LOD_FULL;
use crate::terrain::coord::ChunkCoord;
use crate::terrain::mesh::{MeshData, build_grid_mesh, simplify_mesh};
use crate::terrain::tree::{Tree, TreeParams, spawn_trees};

/// A generated terrain chunk.
///
/// Exclusively owns its mesh data and trees; the streaming manager
/// exclusively owns the registry mapping coordinate → chunk. Mutated only by
/// its own construction and by [`Chunk::set_lod`].
pub struct Chunk {
    coord: ChunkCoord,
    origin: Vec3,
    height_field: HeightField,
    /// Full-detail mesh, built once per coordinate and kept for LOD swaps
    high_detail_mesh: MeshData,
    /// Reduced mesh, built lazily on the first switch away from full detail
    reduced_mesh: Option<MeshData>,
    lod: u32,
    trees: Vec<Tree>,
}

impl Chunk {
    /// Generate a chunk at `coord` from a core-resolution height field.
    ///
    /// Builds the high-detail mesh, places trees deterministically, and
    /// starts at LOD 0. `field.resolution()` must be `size + 1`.
    pub fn build(coord: ChunkCoord, size: u32, field: HeightField, trees: &TreeParams) -> Self {
        let chunk_size = size as f32;
        let origin = coord.world_origin(chunk_size);
        let high_detail_mesh = build_grid_mesh(&field, size);
        let trees = spawn_trees(coord, &field, chunk_size, trees);

        Self {
            coord,
            origin,
            height_field: field,
            high_detail_mesh,
            reduced_mesh: None,
            lod: LOD_FULL,
            trees,
        }
    }

    pub fn coord(&self) -> ChunkCoord {
        self.coord
    }

    /// World-space origin (minimum corner)
    pub fn origin(&self) -> Vec3 {
        self.origin
    }

    pub fn height_field(&self) -> &HeightField {
        &self.height_field
    }

    /// The cached full-detail mesh, regardless of current LOD
    pub fn high_detail_mesh(&self) -> &MeshData {
        &self.high_detail_mesh
    }

    /// The mesh matching the current LOD level
    pub fn active_mesh(&self) -> &MeshData {
        if self.lod == LOD_FULL {
            &self.high_detail_mesh
        } else {
            self.reduced_mesh.as_ref().unwrap_or(&self.high_detail_mesh)
        }
    }

    pub fn lod(&self) -> u32 {
        self.lod
    }

    pub fn trees(&self) -> &[Tree] {
        &self.trees
    }

    /// Switch detail level, propagating to every tree.
    ///
    /// Idempotent: returns false without any state transition when `level`
    /// is already current.
    pub fn set_lod(&mut self, level: u32) -> bool {
        if self.lod == level {
            return false;
        }
        self.lod = level;

        if level != LOD_FULL && self.reduced_mesh.is_none() {
            self.reduced_mesh = Some(simplify_mesh(&self.high_detail_mesh));
        }
        for tree in &mut self.trees {
            tree.set_lod(level);
        }
        true
    }

    /// Surface height at a world position, if it lies inside this chunk's
    /// footprint.
    pub fn surface_height(&self, world_x: f32, world_z: f32) -> Option<f32> {
        let chunk_size = (self.height_field.resolution() - 1) as f32;
        let local_x = world_x - self.origin.x;
        let local_z = world_z - self.origin.z;
        if !(0.0..=chunk_size).contains(&local_x) || !(0.0..=chunk_size).contains(&local_z) {
            return None;
        }
        Some(self.height_field.sample_local(local_x, local_z, chunk_size))
    }
}
