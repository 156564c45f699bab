//! Level-of-detail and tint policy
//!
//! LOD is a function of Chebyshev grid distance from the observer's chunk:
//! the observer's own chunk and the surrounding near band stay at full
//! detail, everything further drops to the reduced level. Tints follow the
//! same distance bands and are used by hosts for debug coloring.

use crate::terrain::coord::ChunkCoord;

/// Full-detail level (observer chunk and near band)
pub const LOD_FULL: u32 = 0;
/// Reduced-detail level (everything beyond the near band)
pub const LOD_REDUCED: u32 = 1;

/// Chebyshev distance up to which chunks keep full detail
pub const NEAR_BAND_RADIUS: i32 = 1;

/// Debug tint applied alongside the LOD level
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TileTint {
    /// The chunk the observer stands in
    Player,
    /// Within the near band
    Near,
    /// Beyond the near band
    Far,
}

impl TileTint {
    /// RGBA color for this tint: white, yellow, blue
    pub fn color(self) -> [f32; 4] {
        match self {
            TileTint::Player => [1.0, 1.0, 1.0, 1.0],
            TileTint::Near => [1.0, 1.0, 0.0, 1.0],
            TileTint::Far => [0.0, 0.0, 1.0, 1.0],
        }
    }
}

/// LOD level for a chunk at the given Chebyshev grid distance
pub fn lod_for_grid_distance(distance: i32) -> u32 {
    if distance <= NEAR_BAND_RADIUS { LOD_FULL } else { LOD_REDUCED }
}

/// Tint for a chunk at the given Chebyshev grid distance
pub fn tint_for_grid_distance(distance: i32) -> TileTint {
    if distance == 0 {
        TileTint::Player
    } else if distance <= NEAR_BAND_RADIUS {
        TileTint::Near
    } else {
        TileTint::Far
    }
}

/// LOD level for `coord` as seen from the observer's chunk
pub fn lod_for_chunk(observer: ChunkCoord, coord: ChunkCoord) -> u32 {
    lod_for_grid_distance(observer.chebyshev_distance(coord))
}

/// Tint for `coord` as seen from the observer's chunk
pub fn tint_for_chunk(observer: ChunkCoord, coord: ChunkCoord) -> TileTint {
    tint_for_grid_distance(observer.chebyshev_distance(coord))
}
