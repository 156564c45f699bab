//! Noise-based procedural fallback terrain
//!
//! Deterministic local generation used when no elevation service is
//! configured (or for tests). Independent of the heightmap provider.

use noise::{Fbm, MultiFractal, NoiseFn, Perlin};

use crate::heightmap::field::HeightField;
use crate::terrain::coord::ChunkCoord;

/// Visual style of procedurally generated chunks
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TerrainStyle {
    /// Plain flat tiles (y = 0 everywhere)
    Flat,
    /// Perlin FBM hills
    Hilly,
}

/// Parameters controlling procedural terrain generation
#[derive(Clone, Debug)]
pub struct TerrainParams {
    pub style: TerrainStyle,
    pub seed: u32,
    pub scale: f32,        // Horizontal scale (larger = smoother)
    pub height_scale: f32, // Vertical scale (max height)
    pub octaves: u32,      // FBM octaves (detail levels)
    pub persistence: f32,  // FBM persistence (0.5 typical)
    pub lacunarity: f32,   // FBM lacunarity (2.0 typical)
}

impl Default for TerrainParams {
    fn default() -> Self {
        Self {
            style: TerrainStyle::Flat,
            seed: 12345,
            scale: 100.0,
            height_scale: 10.0,
            octaves: 4,
            persistence: 0.5,
            lacunarity: 2.0,
        }
    }
}

/// Procedural terrain generator using fractal Brownian motion (FBM)
pub struct TerrainGenerator {
    params: TerrainParams,
    noise: Fbm<Perlin>,
}

impl TerrainGenerator {
    /// Create a new terrain generator with the given parameters
    pub fn new(params: TerrainParams) -> Self {
        let noise = Fbm::<Perlin>::new(params.seed)
            .set_octaves(params.octaves as usize)
            .set_persistence(params.persistence as f64)
            .set_lacunarity(params.lacunarity as f64);

        Self { params, noise }
    }

    /// Get terrain parameters
    pub fn params(&self) -> &TerrainParams {
        &self.params
    }

    /// Get terrain height at world position (x, z)
    pub fn height_at(&self, x: f32, z: f32) -> f32 {
        if self.params.style == TerrainStyle::Flat {
            return 0.0;
        }

        // Sample noise in normalized coordinates; value is in [-1, 1]
        let nx = (x / self.params.scale) as f64;
        let nz = (z / self.params.scale) as f64;
        let noise_value = self.noise.get([nx, nz]).clamp(-1.0, 1.0);

        let normalized = (noise_value + 1.0) / 2.0;
        (normalized * self.params.height_scale as f64) as f32
    }

    /// Build the `(size + 1)²` height field for one chunk.
    ///
    /// Samples noise in world space, so adjacent chunks share boundary
    /// heights exactly and need no seam blending.
    pub fn height_field(&self, coord: ChunkCoord, size: u32) -> HeightField {
        let resolution = size as usize + 1;
        let origin = coord.world_origin(size as f32);
        let mut field = HeightField::flat(resolution);
        if self.params.style == TerrainStyle::Flat {
            return field;
        }
        for z in 0..resolution {
            for x in 0..resolution {
                let h = self.height_at(origin.x + x as f32, origin.z + z as f32);
                field.set(x, z, h);
            }
        }
        field
    }
}
