//! Host integration seam
//!
//! The streaming manager is engine-agnostic: it owns chunk lifecycle and
//! policy but never touches a scene graph. A host (game engine, renderer,
//! headless harness) implements [`TerrainHost`] to receive lifecycle events
//! and to answer the physics queries the manager cannot do itself.

use glam::Vec3;

use crate::streaming::lod::TileTint;
use crate::terrain::coord::ChunkCoord;
use crate::terrain::mesh::MeshData;
use crate::terrain::tree::Tree;

/// Callbacks from the streaming manager to its embedding host.
///
/// All calls happen on the tick thread, in deterministic order within a
/// tick: builds, then styling changes, then evictions.
pub trait TerrainHost {
    /// A chunk finished generating. The mesh is the full-detail grid in
    /// chunk-local coordinates; the host places it at the chunk's world
    /// origin and instantiates the trees.
    fn chunk_built(&mut self, coord: ChunkCoord, mesh: &MeshData, trees: &[Tree]);

    /// A resident chunk changed LOD level or tint
    fn chunk_styled(&mut self, coord: ChunkCoord, lod: u32, tint: TileTint);

    /// A chunk left the retention radius; the host should despawn it
    fn chunk_evicted(&mut self, coord: ChunkCoord);

    /// Cast straight down from `point` against host collision geometry,
    /// returning the hit height. `None` when nothing is below (e.g. the
    /// host has no physics, or the ground mesh is not yet registered).
    fn cast_down(&mut self, point: Vec3) -> Option<f32> {
        let _ = point;
        None
    }

    /// Teleport the observer to `position` (used once, to drop the player
    /// onto the first generated chunk)
    fn snap_observer(&mut self, position: Vec3) {
        let _ = position;
    }
}

/// Recording host for tests and headless runs: keeps an event log and
/// answers `cast_down` with a fixed ground height when one is set.
#[derive(Debug, Default)]
pub struct NullHost {
    pub built: Vec<ChunkCoord>,
    pub styled: Vec<(ChunkCoord, u32, TileTint)>,
    pub evicted: Vec<ChunkCoord>,
    pub snapped_to: Option<Vec3>,
    pub ground_height: Option<f32>,
}

impl NullHost {
    pub fn new() -> Self {
        Self::default()
    }

    /// A host whose `cast_down` always hits at the given height
    pub fn with_ground(height: f32) -> Self {
        Self { ground_height: Some(height), ..Self::default() }
    }
}

impl TerrainHost for NullHost {
    fn chunk_built(&mut self, coord: ChunkCoord, _mesh: &MeshData, _trees: &[Tree]) {
        self.built.push(coord);
    }

    fn chunk_styled(&mut self, coord: ChunkCoord, lod: u32, tint: TileTint) {
        self.styled.push((coord, lod, tint));
    }

    fn chunk_evicted(&mut self, coord: ChunkCoord) {
        self.evicted.push(coord);
    }

    fn cast_down(&mut self, _point: Vec3) -> Option<f32> {
        self.ground_height
    }

    fn snap_observer(&mut self, position: Vec3) {
        self.snapped_to = Some(position);
    }
}
