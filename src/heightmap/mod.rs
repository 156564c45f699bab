//! Heightmap pipeline: geographic footprints, elevation fetches, and
//! seam-blended height field assembly

pub mod field;
pub mod footprint;
pub mod topo;
pub mod fetch;
pub mod provider;

pub use field::HeightField;
pub use footprint::{GeoOrigin, GeoPoint, METERS_PER_DEG_LAT, full_resolution, sample_grid};
pub use topo::{ElevationError, ElevationService, OpenTopoClient};
pub use fetch::{ElevationFetcher, FetchRequest, FetchResult};
pub use provider::{HeightmapConfig, HeightmapProvider};
