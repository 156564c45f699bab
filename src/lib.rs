//! Terrastream: engine-agnostic chunk streaming for real-world terrain
//!
//! Streams an unbounded grid of square terrain chunks around a moving
//! observer: coordinates are discovered by a pluggable policy, generated
//! under a per-tick budget (procedurally or from a real-world elevation
//! service), styled by distance-based LOD tiers, and evicted outside a
//! retention radius. Embedding hosts implement [`host::TerrainHost`] and
//! drive [`streaming::StreamingManager::tick`] once per frame.

pub mod core;
pub mod heightmap;
pub mod host;
pub mod streaming;
pub mod terrain;

pub use host::{NullHost, TerrainHost};
pub use streaming::{StreamingConfig, StreamingManager, StreamingPolicy, TickStats};
pub use terrain::ChunkCoord;
