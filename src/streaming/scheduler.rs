//! Generation queue and enqueue policies
//!
//! A deduplicated FIFO of chunk coordinates awaiting generation, drained
//! under a per-tick budget. Invariant: a coordinate is in the membership set
//! iff it is in the FIFO exactly once; both are left simultaneously on
//! dequeue. The radius, forward-strip, and row streaming strategies are all
//! just different ways of feeding this one queue.

use std::collections::{HashSet, VecDeque};

use glam::Vec3;

use crate::terrain::coord::ChunkCoord;

/// Minimum planar movement magnitude that counts as a heading
const HEADING_EPSILON: f32 = 1e-3;

/// Deduplicated FIFO of coordinates awaiting generation
#[derive(Debug, Default)]
pub struct GenerationQueue {
    queue: VecDeque<ChunkCoord>,
    queued: HashSet<ChunkCoord>,
}

impl GenerationQueue {
    pub fn new() -> Self {
        Self::default()
    }

    /// Enqueue a coordinate unless it is already loaded or already queued.
    ///
    /// Idempotent; returns whether the coordinate was actually added.
    pub fn enqueue(&mut self, coord: ChunkCoord, loaded: &HashSet<ChunkCoord>) -> bool {
        if loaded.contains(&coord) || self.queued.contains(&coord) {
            return false;
        }
        self.queued.insert(coord);
        self.queue.push_back(coord);
        true
    }

    /// Enqueue every coordinate in the (2·radius+1)² square around `center`
    /// that is not already loaded or queued. Returns the number added.
    pub fn enqueue_area(
        &mut self,
        center: ChunkCoord,
        radius: i32,
        loaded: &HashSet<ChunkCoord>,
    ) -> usize {
        let mut added = 0;
        for dx in -radius..=radius {
            for dz in -radius..=radius {
                if self.enqueue(center.offset(dx, dz), loaded) {
                    added += 1;
                }
            }
        }
        added
    }

    /// Enqueue perpendicular strips ahead of the observer.
    ///
    /// For each step 1..=lookahead along the discretized `heading`, enqueues
    /// a strip of width 2·half_width+1 centered on `origin + heading·step`.
    pub fn enqueue_forward_strip(
        &mut self,
        origin: ChunkCoord,
        heading: (i32, i32),
        lookahead: u32,
        half_width: u32,
        loaded: &HashSet<ChunkCoord>,
    ) -> usize {
        let (dx, dz) = heading;
        debug_assert!(dx != 0 || dz != 0);
        // Perpendicular axis for the strip
        let (px, pz) = (-dz, dx);

        let mut added = 0;
        let hw = half_width as i32;
        for step in 1..=lookahead as i32 {
            let base = origin.offset(dx * step, dz * step);
            for w in -hw..=hw {
                if self.enqueue(base.offset(px * w, pz * w), loaded) {
                    added += 1;
                }
            }
        }
        added
    }

    /// Enqueue the single row one step ahead (the legacy row-based policy,
    /// a forward strip with lookahead 1).
    pub fn enqueue_row(
        &mut self,
        origin: ChunkCoord,
        heading: (i32, i32),
        half_width: u32,
        loaded: &HashSet<ChunkCoord>,
    ) -> usize {
        self.enqueue_forward_strip(origin, heading, 1, half_width, loaded)
    }

    /// Dequeue up to `max_per_tick` coordinates for generation.
    ///
    /// Coordinates that became loaded while queued are dropped WITHOUT
    /// counting against the budget (stale enqueue). Dequeued coordinates
    /// leave the membership set immediately.
    pub fn drain(&mut self, max_per_tick: usize, loaded: &HashSet<ChunkCoord>) -> Vec<ChunkCoord> {
        let mut drained = Vec::with_capacity(max_per_tick.min(self.queue.len()));
        while drained.len() < max_per_tick {
            let Some(coord) = self.queue.pop_front() else { break };
            self.queued.remove(&coord);
            if loaded.contains(&coord) {
                continue;
            }
            drained.push(coord);
        }
        drained
    }

    pub fn len(&self) -> usize {
        self.queue.len()
    }

    pub fn is_empty(&self) -> bool {
        self.queue.is_empty()
    }

    pub fn contains(&self, coord: ChunkCoord) -> bool {
        self.queued.contains(&coord)
    }

    pub fn clear(&mut self) {
        self.queue.clear();
        self.queued.clear();
    }
}

/// Discretize an observer heading onto the chunk grid.
///
/// Prefers the normalized horizontal movement delta since the last tick when
/// its magnitude exceeds a small threshold; falls back to the facing
/// direction, then to +z. Each axis rounds independently to {-1, 0, 1}.
pub fn discretize_heading(movement_delta: Vec3, facing: Option<Vec3>) -> (i32, i32) {
    let planar = |v: Vec3| Vec3::new(v.x, 0.0, v.z);

    let mut dir = planar(movement_delta);
    if dir.length() <= HEADING_EPSILON {
        dir = facing.map(planar).unwrap_or(Vec3::ZERO);
    }
    if dir.length() <= HEADING_EPSILON {
        return (0, 1);
    }

    let dir = dir.normalize();
    let dx = dir.x.round().clamp(-1.0, 1.0) as i32;
    let dz = dir.z.round().clamp(-1.0, 1.0) as i32;
    if dx == 0 && dz == 0 { (0, 1) } else { (dx, dz) }
}
