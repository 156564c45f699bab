//! Headless streaming demo.
//!
//! Walks an observer east across procedurally generated terrain and logs
//! streaming activity per tick. Set `TERRASTREAM_TOPO_URL` to an
//! OpenTopoData-compatible endpoint to stream real-world elevations instead.

use glam::Vec3;

use terrastream::core::logging;
use terrastream::heightmap::{HeightmapConfig, OpenTopoClient};
use terrastream::host::TerrainHost;
use terrastream::streaming::{StreamingConfig, StreamingManager, StreamingPolicy, TileTint};
use terrastream::terrain::{ChunkCoord, MeshData, TerrainParams, TerrainStyle, Tree};

/// Host that logs lifecycle events instead of rendering them
struct LogHost;

impl TerrainHost for LogHost {
    fn chunk_built(&mut self, coord: ChunkCoord, mesh: &MeshData, trees: &[Tree]) {
        log::info!(
            "built chunk {coord}: {} vertices, {} trees",
            mesh.vertex_count(),
            trees.len()
        );
    }

    fn chunk_styled(&mut self, coord: ChunkCoord, lod: u32, tint: TileTint) {
        log::debug!("styled chunk {coord}: lod {lod}, {tint:?}");
    }

    fn chunk_evicted(&mut self, coord: ChunkCoord) {
        log::info!("evicted chunk {coord}");
    }
}

fn main() -> terrastream::core::Result<()> {
    logging::init();

    let config = StreamingConfig {
        chunk_size: 32,
        policy: StreamingPolicy::Radius { view_radius: 2 },
        retention_radius: 3,
        max_generated_per_tick: 4,
        terrain: TerrainParams { style: TerrainStyle::Hilly, ..TerrainParams::default() },
        heightmap: std::env::var("TERRASTREAM_TOPO_URL")
            .ok()
            .map(|_| HeightmapConfig { core_resolution: 33, ..HeightmapConfig::default() }),
        ..StreamingConfig::default()
    };

    let mut manager = match std::env::var("TERRASTREAM_TOPO_URL") {
        Ok(url) => {
            log::info!("streaming real-world elevations from {url}");
            StreamingManager::with_elevation(config, LogHost, OpenTopoClient::new(&url)?)?
        }
        Err(_) => StreamingManager::new(config, LogHost)?,
    };

    // Walk east at one chunk every 8 ticks
    let mut observer = Vec3::new(16.0, 20.0, 16.0);
    for tick in 0..240u32 {
        let stats = manager.tick(observer, Some(Vec3::X));
        if stats.generated > 0 || stats.evicted > 0 || tick % 20 == 0 {
            log::info!(
                "tick {tick}: +{} chunks, -{} evicted, {} queued, {} resident, {} fetching",
                stats.generated,
                stats.evicted,
                stats.queue_len,
                stats.resident,
                stats.pending_fetches
            );
        }
        observer.x += 4.0;
        std::thread::sleep(std::time::Duration::from_millis(16));
    }

    log::info!("walk finished: {} chunks resident", manager.resident_count());
    Ok(())
}
