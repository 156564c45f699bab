//! Geographic sampling footprints for chunk elevation fetches
//!
//! Maps a chunk's world-space footprint onto a lat/lng grid around a
//! configurable geographic anchor, expanded by an overlap margin so the
//! provider can discard fetch-boundary artifacts after normalization.

use crate::terrain::coord::ChunkCoord;

/// Meters per degree of latitude (spherical-earth approximation)
pub const METERS_PER_DEG_LAT: f64 = 111_000.0;

/// A single elevation sampling location
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct GeoPoint {
    pub lat: f64,
    pub lng: f64,
}

/// Geographic anchor: the lat/lng that world position (0, 0) maps to
#[derive(Clone, Copy, Debug)]
pub struct GeoOrigin {
    pub lat: f64,
    pub lng: f64,
}

impl Default for GeoOrigin {
    fn default() -> Self {
        // New Delhi; any anchor with interesting relief nearby works
        Self { lat: 28.6139, lng: 77.2090 }
    }
}

/// Oversized sampling resolution for a core resolution and overlap fraction:
/// `core + round(core * 2 * overlap)`, clamped to a minimum of 2.
pub fn full_resolution(core_resolution: usize, overlap_percent: f32) -> usize {
    let extra = (core_resolution as f32 * 2.0 * overlap_percent).round() as usize;
    (core_resolution + extra).max(2)
}

/// Build the row-major `full_res²` sampling grid for a chunk.
///
/// The grid covers the chunk's geographic footprint (span `tile_km_size`
/// kilometers) expanded by `overlap_percent` on each side. Row-major order
/// here is the contract with the elevation service: responses must come back
/// in exactly this order.
pub fn sample_grid(
    coord: ChunkCoord,
    chunk_size: f32,
    origin: GeoOrigin,
    tile_km_size: f64,
    overlap_percent: f32,
    full_res: usize,
) -> Vec<GeoPoint> {
    let center = coord.world_center(chunk_size);
    let center_lat = origin.lat + center.z as f64 / METERS_PER_DEG_LAT;
    let center_lng =
        origin.lng + center.x as f64 / METERS_PER_DEG_LAT / origin.lat.to_radians().cos();

    let lat_delta = tile_km_size * (1.0 + 2.0 * overlap_percent as f64) / 111.0;
    let lng_delta = lat_delta / center_lat.to_radians().cos();

    let last = (full_res - 1) as f64;
    let mut points = Vec::with_capacity(full_res * full_res);
    for y in 0..full_res {
        for x in 0..full_res {
            points.push(GeoPoint {
                lat: center_lat - lat_delta + 2.0 * lat_delta * y as f64 / last,
                lng: center_lng - lng_delta + 2.0 * lng_delta * x as f64 / last,
            });
        }
    }
    points
}
