//! Chunk grid coordinates and world-space mapping

use glam::Vec3;

/// Integer coordinate identifying a chunk on the infinite terrain grid.
///
/// The grid has no origin constraint; coordinates may be negative.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct ChunkCoord {
    pub x: i32,
    pub z: i32,
}

impl ChunkCoord {
    pub const ORIGIN: ChunkCoord = ChunkCoord { x: 0, z: 0 };

    /// Create a new chunk coordinate
    pub fn new(x: i32, z: i32) -> Self {
        Self { x, z }
    }

    /// Convert a world position to the chunk coordinate containing it.
    ///
    /// Uses floor division so positions just below zero map to chunk -1,
    /// not chunk 0 — the grid has no seam at the origin.
    pub fn from_world_pos(pos: Vec3, chunk_size: f32) -> Self {
        Self {
            x: (pos.x / chunk_size).floor() as i32,
            z: (pos.z / chunk_size).floor() as i32,
        }
    }

    /// Get the world-space origin (minimum corner) of this chunk
    pub fn world_origin(&self, chunk_size: f32) -> Vec3 {
        Vec3::new(self.x as f32 * chunk_size, 0.0, self.z as f32 * chunk_size)
    }

    /// Get the world-space center of this chunk's footprint
    pub fn world_center(&self, chunk_size: f32) -> Vec3 {
        self.world_origin(chunk_size) + Vec3::new(chunk_size * 0.5, 0.0, chunk_size * 0.5)
    }

    /// Offset this coordinate by whole chunks
    pub fn offset(&self, dx: i32, dz: i32) -> Self {
        Self::new(self.x + dx, self.z + dz)
    }

    /// Chebyshev (chessboard) distance to another coordinate.
    ///
    /// This is the grid metric used for LOD tiers and eviction rings: a
    /// distance of 1 covers the full 8-neighborhood including diagonals.
    pub fn chebyshev_distance(&self, other: ChunkCoord) -> i32 {
        (self.x - other.x).abs().max((self.z - other.z).abs())
    }

    /// The four orthogonal (edge-sharing) neighbor coordinates:
    /// +x, -x, +z, -z in that order.
    pub fn orthogonal_neighbors(&self) -> [ChunkCoord; 4] {
        [
            self.offset(1, 0),
            self.offset(-1, 0),
            self.offset(0, 1),
            self.offset(0, -1),
        ]
    }
}

impl std::fmt::Display for ChunkCoord {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "({}, {})", self.x, self.z)
    }
}
