//! Heightmap assembly: normalize, crop, scale, seam-blend, cache
//!
//! The provider turns raw elevation samples into the core-resolution height
//! field a chunk's mesh is built from, and owns the per-coordinate cache
//! that makes seam blending possible without a second round trip: a chunk
//! generated after its neighbor reads the neighbor's cached heights. A chunk
//! generated before its neighbor cannot blend against it — the one-sided
//! pull is an accepted approximation, never retroactively corrected.

use std::collections::HashMap;

use crate::heightmap::field::HeightField;
use crate::heightmap::footprint::{self, GeoOrigin, GeoPoint};
use crate::terrain::coord::ChunkCoord;

/// Configuration for the heightmap pipeline
#[derive(Clone, Debug)]
pub struct HeightmapConfig {
    /// Core (post-crop) resolution R; chunk meshes need `size + 1`
    pub core_resolution: usize,
    /// Fractional overlap margin fetched on each side of the footprint
    pub overlap_percent: f32,
    /// Fraction of the chunk width blended toward each cached neighbor
    pub blend_distance: f32,
    /// Scale applied to normalized elevations
    pub height_multiplier: f32,
    /// Geographic span of one chunk, kilometers
    pub tile_km_size: f64,
    /// Lat/lng that world (0, 0) maps to
    pub geo_origin: GeoOrigin,
}

impl Default for HeightmapConfig {
    fn default() -> Self {
        Self {
            core_resolution: 33,
            overlap_percent: 0.1,
            blend_distance: 0.5,
            height_multiplier: 0.1,
            tile_km_size: 0.01,
            geo_origin: GeoOrigin::default(),
        }
    }
}

impl HeightmapConfig {
    pub fn validate(&self) -> crate::core::Result<()> {
        if self.core_resolution < 2 {
            return Err(crate::core::Error::Config(format!(
                "core_resolution must be at least 2, got {}",
                self.core_resolution
            )));
        }
        if !(0.0..=0.5).contains(&self.overlap_percent) {
            return Err(crate::core::Error::Config(format!(
                "overlap_percent must be in [0, 0.5], got {}",
                self.overlap_percent
            )));
        }
        if !(0.0..=1.0).contains(&self.blend_distance) {
            return Err(crate::core::Error::Config(format!(
                "blend_distance must be in [0, 1], got {}",
                self.blend_distance
            )));
        }
        Ok(())
    }
}

/// Produces and caches per-chunk height fields.
///
/// The cache is keyed by coordinate, populated once per coordinate on the
/// first successful fetch, and never invalidated by mesh eviction — so a
/// re-entered region regenerates seams consistently without refetching.
/// Flat fallback fields from failed fetches are NOT cached.
pub struct HeightmapProvider {
    config: HeightmapConfig,
    cache: HashMap<ChunkCoord, HeightField>,
}

impl HeightmapProvider {
    pub fn new(config: HeightmapConfig) -> Self {
        Self { config, cache: HashMap::new() }
    }

    pub fn config(&self) -> &HeightmapConfig {
        &self.config
    }

    /// Oversized sampling resolution for the configured overlap
    pub fn full_resolution(&self) -> usize {
        footprint::full_resolution(self.config.core_resolution, self.config.overlap_percent)
    }

    /// Expected sample count for one fetch
    pub fn expected_samples(&self) -> usize {
        let full = self.full_resolution();
        full * full
    }

    /// Row-major sampling grid for a chunk's expanded footprint
    pub fn sample_points(&self, coord: ChunkCoord, chunk_size: f32) -> Vec<GeoPoint> {
        footprint::sample_grid(
            coord,
            chunk_size,
            self.config.geo_origin,
            self.config.tile_km_size,
            self.config.overlap_percent,
            self.full_resolution(),
        )
    }

    /// Cached (post-crop, post-blend) field for a coordinate, if any
    pub fn cached(&self, coord: ChunkCoord) -> Option<&HeightField> {
        self.cache.get(&coord)
    }

    pub fn cache_len(&self) -> usize {
        self.cache.len()
    }

    /// Drop a cache entry (memory-pressure hook; unused by default policy)
    pub fn evict(&mut self, coord: ChunkCoord) -> bool {
        self.cache.remove(&coord).is_some()
    }

    /// Flat all-zero field for the recoverable-failure path. Not cached.
    pub fn flat_fallback(&self) -> HeightField {
        HeightField::flat(self.config.core_resolution)
    }

    /// Assemble a chunk's height field from validated raw samples.
    ///
    /// Runs normalize → crop → scale → blend, caches the result, and
    /// returns it. Returns the flat fallback (uncached) when the sample
    /// count does not match the expected oversized grid.
    pub fn assemble(&mut self, coord: ChunkCoord, samples: &[f32]) -> HeightField {
        let full_res = self.full_resolution();
        let core_res = self.config.core_resolution;

        let Some(mut full) = HeightField::from_samples(full_res, samples.to_vec()) else {
            log::warn!(
                "chunk {coord}: expected {} samples, got {}; using flat fallback",
                full_res * full_res,
                samples.len()
            );
            return self.flat_fallback();
        };

        // Normalize over the full oversized field before cropping, so the
        // discarded border still participates in the minimum
        full.normalize();

        let offset = (full_res - core_res) / 2;
        let mut core = full.crop(offset, core_res);
        core.scale(self.config.height_multiplier);

        self.blend_with_neighbors(&mut core, coord);

        self.cache.insert(coord, core.clone());
        core
    }

    /// Width of the blended edge band in samples
    fn blend_band(&self) -> usize {
        let res = self.config.core_resolution;
        (((res as f32) * self.config.blend_distance).round() as usize).clamp(1, res)
    }

    /// Pull this chunk's edge bands toward each already-cached orthogonal
    /// neighbor's matching boundary. The interpolation factor rises linearly
    /// from 0 at the band's interior edge to exactly 1 at the chunk
    /// boundary, so boundary samples match the neighbor's.
    fn blend_with_neighbors(&self, field: &mut HeightField, coord: ChunkCoord) {
        let res = field.resolution();
        let band = self.blend_band();
        let last = res - 1;

        // +x neighbor: blend our right edge toward its left column
        if let Some(neighbor) = self.cache.get(&coord.offset(1, 0)) {
            for z in 0..res {
                let target = neighbor.get(0, z);
                for x in (res - band)..res {
                    let t = 1.0 - (last - x) as f32 / band as f32;
                    field.set(x, z, lerp(field.get(x, z), target, t));
                }
            }
        }
        // -x neighbor: blend our left edge toward its right column
        if let Some(neighbor) = self.cache.get(&coord.offset(-1, 0)) {
            for z in 0..res {
                let target = neighbor.get(last, z);
                for x in 0..band {
                    let t = 1.0 - x as f32 / band as f32;
                    field.set(x, z, lerp(field.get(x, z), target, t));
                }
            }
        }
        // +z neighbor: blend our far edge toward its near row
        if let Some(neighbor) = self.cache.get(&coord.offset(0, 1)) {
            for x in 0..res {
                let target = neighbor.get(x, 0);
                for z in (res - band)..res {
                    let t = 1.0 - (last - z) as f32 / band as f32;
                    field.set(x, z, lerp(field.get(x, z), target, t));
                }
            }
        }
        // -z neighbor: blend our near edge toward its far row
        if let Some(neighbor) = self.cache.get(&coord.offset(0, -1)) {
            for x in 0..res {
                let target = neighbor.get(x, last);
                for z in 0..band {
                    let t = 1.0 - z as f32 / band as f32;
                    field.set(x, z, lerp(field.get(x, z), target, t));
                }
            }
        }
    }
}

fn lerp(a: f32, b: f32, t: f32) -> f32 {
    a + (b - a) * t
}
