//! Decorative tree placement and per-tree LOD
//!
//! Placement is seeded from the owning chunk's coordinate through a local
//! RNG instance, so regenerating a coordinate reproduces the exact same
//! layout and concurrent chunk generation cannot interleave RNG state.
//! Bounded, cheap, synchronous work — no I/O, never deferred.

use glam::Vec3;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::heightmap::field::HeightField;
use crate::terrain::coord::ChunkCoord;

/// Seed mixing primes for per-chunk tree layout
const SEED_PRIME_X: i64 = 73_856_093;
const SEED_PRIME_Z: i64 = 19_349_663;

/// Parameters controlling tree placement on a chunk
#[derive(Clone, Debug)]
pub struct TreeParams {
    /// Inclusive bounds on the base tree count per chunk
    pub min_count: u32,
    pub max_count: u32,
    /// Multiplier applied to the sampled count (0.0 disables trees)
    pub density: f32,
    /// Keep-out margin from the chunk edges, in world units
    pub edge_padding: f32,
    /// Uniform scale jitter bounds
    pub min_scale: f32,
    pub max_scale: f32,
}

impl Default for TreeParams {
    fn default() -> Self {
        Self {
            min_count: 4,
            max_count: 12,
            density: 1.0,
            edge_padding: 2.0,
            min_scale: 0.8,
            max_scale: 1.4,
        }
    }
}

/// A decorative tree instance owned by a chunk.
///
/// Swaps between a high-detail and a low-detail representation following the
/// parent chunk's LOD; the host decides what those representations look like.
#[derive(Clone, Debug)]
pub struct Tree {
    /// World-space position, grounded on the chunk surface
    pub position: Vec3,
    /// Uniform scale jitter
    pub scale: f32,
    /// Yaw around the vertical axis, degrees
    pub yaw_degrees: f32,
    lod: u32,
}

impl Tree {
    pub fn new(position: Vec3, scale: f32, yaw_degrees: f32) -> Self {
        Self { position, scale, yaw_degrees, lod: 0 }
    }

    /// Current LOD level (bound to the parent chunk)
    pub fn lod(&self) -> u32 {
        self.lod
    }

    /// Switch detail level. No-op when already at `level`.
    pub fn set_lod(&mut self, level: u32) -> bool {
        if self.lod == level {
            return false;
        }
        self.lod = level;
        true
    }
}

/// Deterministic seed for a chunk's tree layout
pub fn tree_seed(coord: ChunkCoord) -> u64 {
    let x = (coord.x as i64).wrapping_mul(SEED_PRIME_X);
    let z = (coord.z as i64).wrapping_mul(SEED_PRIME_Z);
    (x ^ z) as u64
}

/// Place trees on a chunk's surface.
///
/// Positions are sampled uniformly inside the footprint minus
/// `edge_padding`, heights by projecting onto the chunk's height field.
pub fn spawn_trees(
    coord: ChunkCoord,
    field: &HeightField,
    chunk_size: f32,
    params: &TreeParams,
) -> Vec<Tree> {
    let mut rng = StdRng::seed_from_u64(tree_seed(coord));

    let base = rng.gen_range(params.min_count as f32..=params.max_count as f32);
    let count = (base * params.density).round().max(0.0) as usize;

    let pad = if params.edge_padding * 2.0 < chunk_size {
        params.edge_padding
    } else {
        0.0
    };
    let origin = coord.world_origin(chunk_size);

    let mut trees = Vec::with_capacity(count);
    for _ in 0..count {
        let local_x = rng.gen_range(pad..=chunk_size - pad);
        let local_z = rng.gen_range(pad..=chunk_size - pad);
        let height = field.sample_local(local_x, local_z, chunk_size);
        let scale = rng.gen_range(params.min_scale..=params.max_scale);
        let yaw = rng.gen_range(0.0..360.0);

        trees.push(Tree::new(
            origin + Vec3::new(local_x, height, local_z),
            scale,
            yaw,
        ));
    }
    trees
}
