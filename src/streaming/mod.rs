//! Chunk streaming: scheduling, LOD policy, orchestration

pub mod lod;
pub mod manager;
pub mod scheduler;

pub use lod::{LOD_FULL, LOD_REDUCED, TileTint, lod_for_grid_distance, tint_for_grid_distance};
pub use manager::{StreamingConfig, StreamingManager, StreamingPolicy, TickStats};
pub use scheduler::{GenerationQueue, discretize_heading};
