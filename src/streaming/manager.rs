//! Streaming orchestration: tick loop, chunk lifecycle, eviction
//!
//! The manager owns every piece of terrain state: the coordinate registry,
//! the generation queue, the terrain generator, and (optionally) the
//! elevation pipeline. Hosts drive it by calling [`StreamingManager::tick`]
//! once per frame; all mutation happens inside that call, on the caller's
//! thread. Fetch work runs on background tasks but its completions are only
//! ever applied from tick code.

use std::collections::{HashMap, HashSet};

use glam::Vec3;

use crate::core::{Error, Result};
use crate::heightmap::fetch::ElevationFetcher;
use crate::heightmap::provider::{HeightmapConfig, HeightmapProvider};
use crate::heightmap::topo::ElevationService;
use crate::host::TerrainHost;
use crate::streaming::lod::{self, TileTint};
use crate::streaming::scheduler::{GenerationQueue, discretize_heading};
use crate::terrain::chunk::Chunk;
use crate::terrain::coord::ChunkCoord;
use crate::terrain::generator::{TerrainGenerator, TerrainParams};
use crate::terrain::tree::TreeParams;

/// Vertical clearance added when snapping the observer onto the first chunk
const SNAP_CLEARANCE: f32 = 1.0;

/// How new chunk coordinates are discovered each tick
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum StreamingPolicy {
    /// Keep the full square of side 2·view_radius+1 around the observer
    /// loaded (the default)
    Radius { view_radius: i32 },
    /// Enqueue perpendicular strips ahead of the observer's heading, plus a
    /// small safety ring around them
    ForwardStrip { lookahead: u32, half_width: u32 },
    /// Enqueue only the single row one step ahead (legacy behavior, kept
    /// for comparison runs)
    Row { half_width: u32 },
}

/// Streaming configuration
#[derive(Clone, Debug)]
pub struct StreamingConfig {
    /// Side length of one chunk in world units; meshes have size+1 vertices
    /// per side
    pub chunk_size: u32,
    pub policy: StreamingPolicy,
    /// Chebyshev distance beyond which resident chunks are evicted
    pub retention_radius: i32,
    /// Generation budget per tick
    pub max_generated_per_tick: usize,
    /// Ring kept loaded around the observer under directional policies
    pub safety_ring_radius: i32,
    pub terrain: TerrainParams,
    pub trees: TreeParams,
    /// Real-world elevation pipeline; `None` streams purely procedurally
    pub heightmap: Option<HeightmapConfig>,
    /// Concurrency cap for in-flight elevation fetches
    pub max_concurrent_fetches: usize,
}

impl Default for StreamingConfig {
    fn default() -> Self {
        Self {
            chunk_size: 32,
            policy: StreamingPolicy::Radius { view_radius: 2 },
            retention_radius: 4,
            max_generated_per_tick: 4,
            safety_ring_radius: 1,
            terrain: TerrainParams::default(),
            trees: TreeParams::default(),
            heightmap: None,
            max_concurrent_fetches: 4,
        }
    }
}

impl StreamingConfig {
    pub fn validate(&self) -> Result<()> {
        if self.chunk_size == 0 {
            return Err(Error::Config("chunk_size must be nonzero".into()));
        }
        if self.max_generated_per_tick == 0 {
            return Err(Error::Config("max_generated_per_tick must be nonzero".into()));
        }
        // Every policy must enqueue strictly inside the retention radius;
        // otherwise eviction discards chunks the next tick re-enqueues and a
        // stationary observer churns build/evict forever
        match self.policy {
            StreamingPolicy::Radius { view_radius } => {
                if view_radius < 0 {
                    return Err(Error::Config("view_radius must be non-negative".into()));
                }
                if self.retention_radius < view_radius {
                    return Err(Error::Config(format!(
                        "retention_radius {} must cover view_radius {}",
                        self.retention_radius, view_radius
                    )));
                }
            }
            StreamingPolicy::ForwardStrip { lookahead, half_width } => {
                // Farthest strip chunk sits at Chebyshev distance
                // max(lookahead, half_width) from the observer
                let reach = (lookahead.max(half_width)) as i32;
                if self.retention_radius < reach {
                    return Err(Error::Config(format!(
                        "retention_radius {} must cover the strip reach {} \
                         (max of lookahead {} and half_width {})",
                        self.retention_radius, reach, lookahead, half_width
                    )));
                }
            }
            StreamingPolicy::Row { half_width } => {
                let reach = (half_width.max(1)) as i32;
                if self.retention_radius < reach {
                    return Err(Error::Config(format!(
                        "retention_radius {} must cover the row reach {}",
                        self.retention_radius, reach
                    )));
                }
            }
        }
        if self.retention_radius < self.safety_ring_radius {
            return Err(Error::Config(format!(
                "retention_radius {} must cover safety_ring_radius {}",
                self.retention_radius, self.safety_ring_radius
            )));
        }
        if let Some(heightmap) = &self.heightmap {
            heightmap.validate()?;
            // The post-crop field must carry exactly one sample per mesh vertex
            let needed = self.chunk_size as usize + 1;
            if heightmap.core_resolution != needed {
                return Err(Error::Config(format!(
                    "core_resolution {} does not match chunk_size {} (need {})",
                    heightmap.core_resolution, self.chunk_size, needed
                )));
            }
            if self.max_concurrent_fetches == 0 {
                return Err(Error::Config("max_concurrent_fetches must be nonzero".into()));
            }
        }
        Ok(())
    }
}

/// Per-tick activity counters
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct TickStats {
    /// Coordinates newly added to the generation queue
    pub enqueued: usize,
    /// Chunks that finished generating this tick
    pub generated: usize,
    /// Elevation fetches started
    pub fetches_started: usize,
    /// Chunks that loaded with the flat fallback after a failed fetch
    pub fallbacks: usize,
    /// Resident chunks whose LOD or tint changed
    pub restyled: usize,
    /// Chunks evicted
    pub evicted: usize,
    /// Queue length after the tick
    pub queue_len: usize,
    /// Resident chunk count after the tick
    pub resident: usize,
    /// Elevation fetches still in flight after the tick
    pub pending_fetches: usize,
}

struct Elevation {
    provider: HeightmapProvider,
    fetcher: ElevationFetcher,
}

/// Chunk streaming orchestrator.
///
/// Owns the full chunk lifecycle from enqueue to eviction and reports every
/// observable change to its [`TerrainHost`].
pub struct StreamingManager<H: TerrainHost> {
    config: StreamingConfig,
    host: H,
    generator: TerrainGenerator,
    queue: GenerationQueue,
    registry: HashMap<ChunkCoord, Chunk>,
    resident: HashSet<ChunkCoord>,
    tints: HashMap<ChunkCoord, TileTint>,
    elevation: Option<Elevation>,
    /// Coordinates with an elevation fetch in flight
    awaiting_fetch: HashSet<ChunkCoord>,
    /// Set when the fetch worker dies; generation falls back to procedural
    elevation_disabled: bool,
    last_observer_pos: Option<Vec3>,
    snapped: bool,
}

impl<H: TerrainHost> StreamingManager<H> {
    /// Create a purely procedural streaming manager.
    ///
    /// Any `heightmap` section in the config is ignored without a service;
    /// use [`StreamingManager::with_elevation`] to attach one.
    pub fn new(config: StreamingConfig, host: H) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            generator: TerrainGenerator::new(config.terrain.clone()),
            host,
            queue: GenerationQueue::new(),
            registry: HashMap::new(),
            resident: HashSet::new(),
            tints: HashMap::new(),
            elevation: None,
            awaiting_fetch: HashSet::new(),
            elevation_disabled: false,
            last_observer_pos: None,
            snapped: false,
            config,
        })
    }

    /// Create a manager that sources heights from a real-world elevation
    /// service. Requires a `heightmap` section in the config.
    pub fn with_elevation<S: ElevationService>(
        config: StreamingConfig,
        host: H,
        service: S,
    ) -> Result<Self> {
        let Some(heightmap) = config.heightmap.clone() else {
            return Err(Error::Config(
                "with_elevation requires a heightmap configuration".into(),
            ));
        };
        let mut manager = Self::new(config, host)?;
        let fetcher = ElevationFetcher::new(service, manager.config.max_concurrent_fetches)?;
        manager.elevation = Some(Elevation {
            provider: HeightmapProvider::new(heightmap),
            fetcher,
        });
        Ok(manager)
    }

    pub fn config(&self) -> &StreamingConfig {
        &self.config
    }

    pub fn host(&self) -> &H {
        &self.host
    }

    pub fn host_mut(&mut self) -> &mut H {
        &mut self.host
    }

    pub fn chunk(&self, coord: ChunkCoord) -> Option<&Chunk> {
        self.registry.get(&coord)
    }

    pub fn is_resident(&self, coord: ChunkCoord) -> bool {
        self.resident.contains(&coord)
    }

    pub fn resident_count(&self) -> usize {
        self.resident.len()
    }

    pub fn queue_len(&self) -> usize {
        self.queue.len()
    }

    /// Whether the elevation pipeline has been shut off after a worker
    /// failure (procedural generation continues)
    pub fn elevation_disabled(&self) -> bool {
        self.elevation_disabled
    }

    /// Number of assembled height fields retained across evictions
    pub fn heightmap_cache_len(&self) -> usize {
        self.elevation.as_ref().map_or(0, |e| e.provider.cache_len())
    }

    /// Advance streaming by one tick.
    ///
    /// Discovers coordinates per the configured policy, applies completed
    /// elevation fetches, generates under the per-tick budget, restyles
    /// residents by distance, and evicts chunks outside the retention
    /// radius. All host callbacks fire from inside this call.
    pub fn tick(&mut self, observer_pos: Vec3, facing: Option<Vec3>) -> TickStats {
        let mut stats = TickStats::default();
        let chunk_size = self.config.chunk_size as f32;
        let observer_chunk = ChunkCoord::from_world_pos(observer_pos, chunk_size);
        let movement = self
            .last_observer_pos
            .map(|last| observer_pos - last)
            .unwrap_or(Vec3::ZERO);
        self.last_observer_pos = Some(observer_pos);

        // Coordinates resident or mid-fetch must not re-enter the queue
        let mut blocked: HashSet<ChunkCoord> = self.resident.clone();
        blocked.extend(self.awaiting_fetch.iter().copied());

        stats.enqueued = match self.config.policy {
            StreamingPolicy::Radius { view_radius } => {
                self.queue.enqueue_area(observer_chunk, view_radius, &blocked)
            }
            StreamingPolicy::ForwardStrip { lookahead, half_width } => {
                let heading = discretize_heading(movement, facing);
                let ring =
                    self.queue
                        .enqueue_area(observer_chunk, self.config.safety_ring_radius, &blocked);
                ring + self.queue.enqueue_forward_strip(
                    observer_chunk,
                    heading,
                    lookahead,
                    half_width,
                    &blocked,
                )
            }
            StreamingPolicy::Row { half_width } => {
                let heading = discretize_heading(movement, facing);
                let ring =
                    self.queue
                        .enqueue_area(observer_chunk, self.config.safety_ring_radius, &blocked);
                ring + self.queue.enqueue_row(observer_chunk, heading, half_width, &blocked)
            }
        };

        self.apply_fetch_results(observer_chunk, observer_pos, &mut stats);
        self.generate_drained(observer_chunk, observer_pos, &mut blocked, &mut stats);
        self.restyle_residents(observer_chunk, &mut stats);
        self.evict_distant(observer_chunk, &mut stats);

        stats.queue_len = self.queue.len();
        stats.resident = self.resident.len();
        stats.pending_fetches = self.awaiting_fetch.len();
        stats
    }

    /// Apply every completed elevation fetch, successful or failed.
    ///
    /// Failures are terminal for their coordinate: the chunk loads with a
    /// flat fallback field and is never refetched.
    fn apply_fetch_results(
        &mut self,
        observer_chunk: ChunkCoord,
        observer_pos: Vec3,
        stats: &mut TickStats,
    ) {
        let Some(elevation) = &mut self.elevation else { return };

        let mut finished = Vec::new();
        for result in elevation.fetcher.poll_results() {
            match result.outcome {
                Ok(samples) => {
                    let field = elevation.provider.assemble(result.coord, &samples);
                    finished.push((result.coord, field, false));
                }
                Err(err) => {
                    log::warn!("elevation fetch for chunk {} failed: {err}", result.coord);
                    finished.push((result.coord, elevation.provider.flat_fallback(), true));
                }
            }
        }
        let fetcher_dead = elevation.fetcher.is_dead();

        for (coord, field, fallback) in finished {
            self.awaiting_fetch.remove(&coord);
            if fallback {
                stats.fallbacks += 1;
            }
            self.finish_chunk(coord, field, observer_chunk, observer_pos, stats);
        }

        if fetcher_dead && !self.elevation_disabled {
            self.disable_elevation("fetch worker channel closed");
        }
    }

    /// Drain the queue under the tick budget and generate each coordinate,
    /// either by starting an elevation fetch or procedurally.
    fn generate_drained(
        &mut self,
        observer_chunk: ChunkCoord,
        observer_pos: Vec3,
        blocked: &mut HashSet<ChunkCoord>,
        stats: &mut TickStats,
    ) {
        let drained = self.queue.drain(self.config.max_generated_per_tick, blocked);
        for coord in drained {
            // A cached field (from a previous visit) skips the fetch entirely
            let cached = self
                .elevation
                .as_ref()
                .and_then(|e| e.provider.cached(coord).cloned());
            if let Some(field) = cached {
                self.finish_chunk(coord, field, observer_chunk, observer_pos, stats);
                blocked.insert(coord);
                continue;
            }

            let mut fetching = false;
            let mut worker_died = false;
            if !self.elevation_disabled {
                if let Some(elevation) = &mut self.elevation {
                    let points =
                        elevation.provider.sample_points(coord, self.config.chunk_size as f32);
                    if elevation.fetcher.request(coord, points)
                        || elevation.fetcher.is_pending(coord)
                    {
                        fetching = true;
                    } else {
                        worker_died = true;
                    }
                }
            }
            if worker_died {
                self.disable_elevation("fetch worker unavailable");
            }
            if fetching {
                self.awaiting_fetch.insert(coord);
                blocked.insert(coord);
                stats.fetches_started += 1;
                continue;
            }
            let field = self.generator.height_field(coord, self.config.chunk_size);
            self.finish_chunk(coord, field, observer_chunk, observer_pos, stats);
            blocked.insert(coord);
        }
    }

    /// Build a chunk from its finished height field and make it resident
    fn finish_chunk(
        &mut self,
        coord: ChunkCoord,
        field: crate::heightmap::field::HeightField,
        observer_chunk: ChunkCoord,
        observer_pos: Vec3,
        stats: &mut TickStats,
    ) {
        let mut chunk = Chunk::build(coord, self.config.chunk_size, field, &self.config.trees);

        let distance = observer_chunk.chebyshev_distance(coord);
        let level = lod::lod_for_grid_distance(distance);
        let tint = lod::tint_for_grid_distance(distance);
        chunk.set_lod(level);

        self.host.chunk_built(coord, chunk.high_detail_mesh(), chunk.trees());
        self.host.chunk_styled(coord, level, tint);

        // Drop the observer onto the first chunk generated underneath them
        if !self.snapped && coord == observer_chunk {
            let probe = Vec3::new(observer_pos.x, observer_pos.y + 1000.0, observer_pos.z);
            let height = self
                .host
                .cast_down(probe)
                .or_else(|| chunk.surface_height(observer_pos.x, observer_pos.z));
            if let Some(height) = height {
                self.host.snap_observer(Vec3::new(
                    observer_pos.x,
                    height + SNAP_CLEARANCE,
                    observer_pos.z,
                ));
                self.snapped = true;
            }
        }

        self.tints.insert(coord, tint);
        self.registry.insert(coord, chunk);
        self.resident.insert(coord);
        stats.generated += 1;
        log::debug!("chunk {coord} generated (lod {level}, distance {distance})");
    }

    /// Re-derive LOD and tint for every resident chunk from its current
    /// distance, notifying the host only on actual change
    fn restyle_residents(&mut self, observer_chunk: ChunkCoord, stats: &mut TickStats) {
        for (&coord, chunk) in &mut self.registry {
            let distance = observer_chunk.chebyshev_distance(coord);
            let level = lod::lod_for_grid_distance(distance);
            let tint = lod::tint_for_grid_distance(distance);

            let lod_changed = chunk.set_lod(level);
            let tint_changed = self.tints.insert(coord, tint) != Some(tint);
            if lod_changed || tint_changed {
                self.host.chunk_styled(coord, level, tint);
                stats.restyled += 1;
            }
        }
    }

    /// Evict resident chunks beyond the retention radius.
    ///
    /// Eviction tears down the mesh and trees but deliberately leaves the
    /// heightmap cache intact, so re-entering a region blends seams the
    /// same way without refetching.
    fn evict_distant(&mut self, observer_chunk: ChunkCoord, stats: &mut TickStats) {
        let doomed: Vec<ChunkCoord> = self
            .resident
            .iter()
            .copied()
            .filter(|c| observer_chunk.chebyshev_distance(*c) > self.config.retention_radius)
            .collect();

        for coord in doomed {
            self.registry.remove(&coord);
            self.resident.remove(&coord);
            self.tints.remove(&coord);
            self.host.chunk_evicted(coord);
            stats.evicted += 1;
            log::debug!("chunk {coord} evicted");
        }
    }

    /// Shut off the elevation pipeline after a worker failure. Coordinates
    /// stuck mid-fetch are re-enqueued for procedural generation.
    fn disable_elevation(&mut self, reason: &str) {
        log::error!("elevation pipeline disabled: {reason}; continuing procedurally");
        self.elevation_disabled = true;
        let orphaned: Vec<ChunkCoord> = self.awaiting_fetch.drain().collect();
        for coord in orphaned {
            self.queue.enqueue(coord, &self.resident);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};

    use crate::heightmap::topo::ElevationError;
    use crate::host::NullHost;
    use crate::terrain::generator::TerrainStyle;

    fn test_config(view_radius: i32, budget: usize) -> StreamingConfig {
        StreamingConfig {
            chunk_size: 8,
            policy: StreamingPolicy::Radius { view_radius },
            retention_radius: view_radius + 1,
            max_generated_per_tick: budget,
            terrain: TerrainParams { style: TerrainStyle::Flat, ..TerrainParams::default() },
            ..StreamingConfig::default()
        }
    }

    fn center_of(coord: ChunkCoord) -> Vec3 {
        coord.world_center(8.0)
    }

    #[test]
    fn test_config_validation() {
        assert!(StreamingConfig::default().validate().is_ok());
        assert!(
            StreamingConfig { max_generated_per_tick: 0, ..StreamingConfig::default() }
                .validate()
                .is_err()
        );
        assert!(
            StreamingConfig { retention_radius: 1, ..StreamingConfig::default() }
                .validate()
                .is_err()
        );
        // Heightmap resolution must match the mesh grid
        let mismatched = StreamingConfig {
            heightmap: Some(HeightmapConfig { core_resolution: 10, ..Default::default() }),
            ..StreamingConfig::default()
        };
        assert!(mismatched.validate().is_err());
    }

    #[test]
    fn test_directional_policies_must_fit_retention_radius() {
        // A strip reaching past the retention radius would be evicted and
        // re-enqueued every tick
        let strip_too_far = StreamingConfig {
            policy: StreamingPolicy::ForwardStrip { lookahead: 5, half_width: 1 },
            retention_radius: 4,
            ..StreamingConfig::default()
        };
        assert!(strip_too_far.validate().is_err());

        let strip_too_wide = StreamingConfig {
            policy: StreamingPolicy::ForwardStrip { lookahead: 2, half_width: 5 },
            retention_radius: 4,
            ..StreamingConfig::default()
        };
        assert!(strip_too_wide.validate().is_err());

        let row_too_wide = StreamingConfig {
            policy: StreamingPolicy::Row { half_width: 5 },
            retention_radius: 4,
            ..StreamingConfig::default()
        };
        assert!(row_too_wide.validate().is_err());

        let strip_ok = StreamingConfig {
            policy: StreamingPolicy::ForwardStrip { lookahead: 4, half_width: 2 },
            retention_radius: 4,
            ..StreamingConfig::default()
        };
        assert!(strip_ok.validate().is_ok());
    }

    #[test]
    fn test_stationary_observer_never_churns() {
        // Each coordinate is built at most once while the observer stands
        // still, for every policy
        let policies = [
            StreamingPolicy::Radius { view_radius: 2 },
            StreamingPolicy::ForwardStrip { lookahead: 3, half_width: 1 },
            StreamingPolicy::Row { half_width: 2 },
        ];
        for policy in policies {
            let mut config = test_config(2, 100);
            config.policy = policy;
            config.retention_radius = 3;
            let mut manager = StreamingManager::new(config, NullHost::new()).unwrap();

            for _ in 0..5 {
                manager.tick(center_of(ChunkCoord::ORIGIN), Some(Vec3::X));
            }

            let built = &manager.host().built;
            let unique: HashSet<_> = built.iter().copied().collect();
            assert_eq!(built.len(), unique.len(), "rebuild churn under {policy:?}");
            assert!(manager.host().evicted.is_empty(), "evict churn under {policy:?}");
        }
    }

    #[test]
    fn test_radius_policy_fills_square() {
        let mut manager = StreamingManager::new(test_config(2, 100), NullHost::new()).unwrap();
        let stats = manager.tick(center_of(ChunkCoord::ORIGIN), None);

        assert_eq!(stats.enqueued, 25);
        assert_eq!(stats.generated, 25);
        assert_eq!(stats.queue_len, 0);
        assert_eq!(manager.resident_count(), 25);
        assert_eq!(manager.host().built.len(), 25);

        for dx in -2..=2 {
            for dz in -2..=2 {
                assert!(manager.is_resident(ChunkCoord::new(dx, dz)));
            }
        }
    }

    #[test]
    fn test_generation_budget_spreads_over_ticks() {
        let mut manager = StreamingManager::new(test_config(2, 10), NullHost::new()).unwrap();
        let pos = center_of(ChunkCoord::ORIGIN);

        let first = manager.tick(pos, None);
        assert_eq!(first.generated, 10);
        assert_eq!(first.queue_len, 15);

        let second = manager.tick(pos, None);
        assert_eq!(second.generated, 10);
        // Re-enqueue of already-queued or resident coordinates is a no-op
        assert_eq!(second.enqueued, 0);

        let third = manager.tick(pos, None);
        assert_eq!(third.generated, 5);
        assert_eq!(manager.resident_count(), 25);
    }

    #[test]
    fn test_lod_and_tint_bands_on_build() {
        let mut manager = StreamingManager::new(test_config(2, 100), NullHost::new()).unwrap();
        manager.tick(center_of(ChunkCoord::ORIGIN), None);

        assert_eq!(manager.chunk(ChunkCoord::new(0, 0)).unwrap().lod(), lod::LOD_FULL);
        assert_eq!(manager.chunk(ChunkCoord::new(1, 1)).unwrap().lod(), lod::LOD_FULL);
        assert_eq!(manager.chunk(ChunkCoord::new(2, 0)).unwrap().lod(), lod::LOD_REDUCED);

        let styled = &manager.host().styled;
        assert!(styled.contains(&(ChunkCoord::new(0, 0), lod::LOD_FULL, TileTint::Player)));
        assert!(styled.contains(&(ChunkCoord::new(0, 1), lod::LOD_FULL, TileTint::Near)));
        assert!(styled.contains(&(ChunkCoord::new(2, 2), lod::LOD_REDUCED, TileTint::Far)));
    }

    #[test]
    fn test_movement_streams_new_column_and_restyles() {
        let mut manager = StreamingManager::new(test_config(2, 100), NullHost::new()).unwrap();
        manager.tick(center_of(ChunkCoord::ORIGIN), None);
        manager.host_mut().styled.clear();

        let stats = manager.tick(center_of(ChunkCoord::new(1, 0)), None);

        // One new column at x = 3
        assert_eq!(stats.enqueued, 5);
        assert_eq!(stats.generated, 5);
        for dz in -2..=2 {
            assert!(manager.is_resident(ChunkCoord::new(3, dz)));
        }

        // Old player chunk is now Near, former near band partially Far
        assert_eq!(manager.chunk(ChunkCoord::new(1, 0)).unwrap().lod(), lod::LOD_FULL);
        assert_eq!(manager.chunk(ChunkCoord::new(-1, 0)).unwrap().lod(), lod::LOD_REDUCED);
        assert!(stats.restyled > 0);
        assert!(
            manager
                .host()
                .styled
                .contains(&(ChunkCoord::new(0, 0), lod::LOD_FULL, TileTint::Near))
        );
    }

    #[test]
    fn test_eviction_beyond_retention_radius() {
        let mut config = test_config(2, 100);
        config.retention_radius = 2;
        let mut manager = StreamingManager::new(config, NullHost::new()).unwrap();
        manager.tick(center_of(ChunkCoord::ORIGIN), None);
        assert_eq!(manager.resident_count(), 25);

        let stats = manager.tick(center_of(ChunkCoord::new(1, 0)), None);

        // The x = -2 column is now at distance 3
        assert_eq!(stats.evicted, 5);
        for dz in -2..=2 {
            assert!(!manager.is_resident(ChunkCoord::new(-2, dz)));
            assert!(manager.host().evicted.contains(&ChunkCoord::new(-2, dz)));
        }
        assert_eq!(manager.resident_count(), 25); // 5 evicted, 5 new
    }

    #[test]
    fn test_evicted_chunk_regenerates_on_return() {
        let mut config = test_config(1, 100);
        config.retention_radius = 1;
        let mut manager = StreamingManager::new(config, NullHost::new()).unwrap();

        manager.tick(center_of(ChunkCoord::ORIGIN), None);
        manager.tick(center_of(ChunkCoord::new(3, 0)), None);
        assert!(!manager.is_resident(ChunkCoord::ORIGIN));

        manager.tick(center_of(ChunkCoord::ORIGIN), None);
        assert!(manager.is_resident(ChunkCoord::ORIGIN));
        // Built once, evicted once, built again
        assert_eq!(
            manager.host().built.iter().filter(|&&c| c == ChunkCoord::ORIGIN).count(),
            2
        );
    }

    #[test]
    fn test_snap_on_first_observer_chunk() {
        let mut manager =
            StreamingManager::new(test_config(1, 100), NullHost::with_ground(7.5)).unwrap();
        let pos = Vec3::new(4.0, 50.0, 4.0);
        manager.tick(pos, None);

        let snapped = manager.host().snapped_to.unwrap();
        assert_eq!(snapped, Vec3::new(4.0, 7.5 + SNAP_CLEARANCE, 4.0));

        // Snapping happens exactly once
        manager.host_mut().snapped_to = None;
        manager.tick(pos, None);
        assert_eq!(manager.host().snapped_to, None);
    }

    #[test]
    fn test_snap_falls_back_to_field_height() {
        // No host physics: the freshly built chunk's own field answers
        let mut manager = StreamingManager::new(test_config(1, 100), NullHost::new()).unwrap();
        manager.tick(Vec3::new(4.0, 50.0, 4.0), None);

        let snapped = manager.host().snapped_to.unwrap();
        assert_eq!(snapped.y, SNAP_CLEARANCE); // flat terrain at height 0
    }

    #[test]
    fn test_forward_strip_policy() {
        let mut config = test_config(2, 100);
        config.policy = StreamingPolicy::ForwardStrip { lookahead: 2, half_width: 1 };
        config.safety_ring_radius = 1;
        config.retention_radius = 4;
        let mut manager = StreamingManager::new(config, NullHost::new()).unwrap();

        // Stationary with +x facing: 3x3 ring plus two strips of 3 ahead,
        // the first of which overlaps the ring entirely
        let stats = manager.tick(center_of(ChunkCoord::ORIGIN), Some(Vec3::new(1.0, 0.0, 0.0)));
        assert_eq!(stats.enqueued, 12);
        assert!(manager.is_resident(ChunkCoord::new(2, 0)));
        assert!(manager.is_resident(ChunkCoord::new(2, 1)));
        assert!(!manager.is_resident(ChunkCoord::new(-2, 0)));
    }

    #[test]
    fn test_row_policy() {
        let mut config = test_config(2, 100);
        config.policy = StreamingPolicy::Row { half_width: 2 };
        let mut manager = StreamingManager::new(config, NullHost::new()).unwrap();

        let stats = manager.tick(center_of(ChunkCoord::ORIGIN), Some(Vec3::new(0.0, 0.0, 1.0)));
        // 3x3 safety ring plus the row at z = 1 (3 of its 5 overlap the ring)
        assert_eq!(stats.enqueued, 11);
        assert!(manager.is_resident(ChunkCoord::new(2, 1)));
        assert!(manager.is_resident(ChunkCoord::new(-2, 1)));
        assert!(!manager.is_resident(ChunkCoord::new(2, 0)));
    }

    // Elevation-backed streaming uses real background fetch tasks; these
    // tests poll tick() until the pipeline settles.

    struct ConstantService {
        elevation: f32,
        calls: Arc<AtomicUsize>,
    }

    impl ConstantService {
        fn at(elevation: f32) -> Self {
            Self { elevation, calls: Arc::new(AtomicUsize::new(0)) }
        }
    }

    impl ElevationService for ConstantService {
        fn fetch(
            &self,
            points: Vec<crate::heightmap::footprint::GeoPoint>,
        ) -> impl Future<Output = std::result::Result<Vec<f32>, ElevationError>> + Send {
            self.calls.fetch_add(1, Ordering::SeqCst);
            let out = vec![self.elevation; points.len()];
            async move { Ok(out) }
        }
    }

    #[derive(Clone)]
    struct FailingService;

    impl ElevationService for FailingService {
        fn fetch(
            &self,
            _points: Vec<crate::heightmap::footprint::GeoPoint>,
        ) -> impl Future<Output = std::result::Result<Vec<f32>, ElevationError>> + Send {
            async { Err(ElevationError::Transport("unreachable".into())) }
        }
    }

    fn elevation_config(view_radius: i32) -> StreamingConfig {
        StreamingConfig {
            heightmap: Some(HeightmapConfig {
                core_resolution: 9, // chunk_size 8 + 1
                ..HeightmapConfig::default()
            }),
            ..test_config(view_radius, 100)
        }
    }

    fn tick_until_loaded<H: TerrainHost>(
        manager: &mut StreamingManager<H>,
        pos: Vec3,
        expected: usize,
    ) {
        for _ in 0..200 {
            manager.tick(pos, None);
            if manager.resident_count() >= expected {
                return;
            }
            std::thread::sleep(std::time::Duration::from_millis(10));
        }
        panic!(
            "only {} of {expected} chunks loaded after polling",
            manager.resident_count()
        );
    }

    #[test]
    fn test_elevation_requires_heightmap_config() {
        let result = StreamingManager::with_elevation(
            test_config(1, 100),
            NullHost::new(),
            ConstantService::at(0.0),
        );
        assert!(result.is_err());
    }

    #[test]
    fn test_elevation_streaming_loads_and_caches() {
        let mut manager = StreamingManager::with_elevation(
            elevation_config(1),
            NullHost::new(),
            ConstantService::at(200.0),
        )
        .unwrap();

        tick_until_loaded(&mut manager, center_of(ChunkCoord::ORIGIN), 9);
        assert_eq!(manager.resident_count(), 9);
        assert_eq!(manager.heightmap_cache_len(), 9);
        assert!(!manager.elevation_disabled());

        // Uniform elevation normalizes to zero height everywhere
        let chunk = manager.chunk(ChunkCoord::ORIGIN).unwrap();
        assert_eq!(chunk.surface_height(4.0, 4.0), Some(0.0));
    }

    #[test]
    fn test_failed_fetches_load_flat_uncached() {
        let mut manager =
            StreamingManager::with_elevation(elevation_config(1), NullHost::new(), FailingService)
                .unwrap();

        tick_until_loaded(&mut manager, center_of(ChunkCoord::ORIGIN), 9);

        // Every chunk loaded exactly once with the fallback field, and the
        // failures never populated the cache
        assert_eq!(manager.resident_count(), 9);
        assert_eq!(manager.heightmap_cache_len(), 0);
        assert_eq!(manager.host().built.len(), 9);
        assert!(manager.chunk(ChunkCoord::ORIGIN).unwrap().height_field().is_flat());
    }

    #[test]
    fn test_eviction_preserves_cache_and_return_skips_refetch() {
        let mut config = elevation_config(1);
        config.retention_radius = 1;
        let service = ConstantService::at(50.0);
        let calls = service.calls.clone();
        let mut manager =
            StreamingManager::with_elevation(config, NullHost::new(), service).unwrap();

        tick_until_loaded(&mut manager, center_of(ChunkCoord::ORIGIN), 9);
        assert_eq!(manager.heightmap_cache_len(), 9);

        // Teleport far enough that the original square is evicted
        tick_until_loaded(&mut manager, center_of(ChunkCoord::new(10, 0)), 9);
        assert!(!manager.is_resident(ChunkCoord::ORIGIN));
        assert_eq!(manager.heightmap_cache_len(), 18);
        let fetches_so_far = calls.load(Ordering::SeqCst);
        assert_eq!(fetches_so_far, 18);

        // Coming back rebuilds from the surviving cache: no new fetches,
        // resident again within a single tick
        let stats = manager.tick(center_of(ChunkCoord::ORIGIN), None);
        assert_eq!(stats.generated, 9);
        assert_eq!(stats.fetches_started, 0);
        assert!(manager.is_resident(ChunkCoord::ORIGIN));
        assert_eq!(calls.load(Ordering::SeqCst), fetches_so_far);
    }
}
