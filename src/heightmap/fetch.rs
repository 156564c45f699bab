//! Async elevation fetch worker with bounded concurrency
//!
//! Fetches suspend on the network without blocking the tick thread: requests
//! go over a channel to a tokio worker task, and completions are polled
//! non-blockingly each tick. No ordering is guaranteed between outstanding
//! fetches for different coordinates; the provider's blending tolerates
//! out-of-order completion.

use std::collections::{HashSet, VecDeque};
use std::sync::Arc;

use tokio::runtime::Runtime;
use tokio::sync::mpsc;

use crate::heightmap::footprint::GeoPoint;
use crate::heightmap::topo::{ElevationError, ElevationService};
use crate::terrain::coord::ChunkCoord;

/// Request to fetch the sample grid for one chunk
#[derive(Debug, Clone)]
pub struct FetchRequest {
    pub coord: ChunkCoord,
    /// Row-major sampling locations (the provider's footprint grid)
    pub points: Vec<GeoPoint>,
}

/// Completed fetch for one chunk, success or terminal failure
#[derive(Debug)]
pub struct FetchResult {
    pub coord: ChunkCoord,
    pub outcome: Result<Vec<f32>, ElevationError>,
}

/// Concurrent elevation fetcher.
///
/// Owns a worker task that drains requests FIFO under a concurrency cap.
/// The tick thread requests coordinates and polls for results; a coordinate
/// stays in the pending set for exactly the in-flight window.
pub struct ElevationFetcher {
    request_tx: mpsc::UnboundedSender<FetchRequest>,
    result_rx: mpsc::UnboundedReceiver<FetchResult>,
    pending: HashSet<ChunkCoord>,
    /// Set when the worker channel dies; the manager disables streaming
    dead: bool,
    #[allow(dead_code)]
    runtime: Option<Runtime>,
}

impl ElevationFetcher {
    /// Create a fetcher with its own tokio runtime.
    ///
    /// # Arguments
    /// * `service` - Elevation source shared with the worker
    /// * `max_concurrent` - Maximum simultaneous fetches
    pub fn new<S: ElevationService>(service: S, max_concurrent: usize) -> crate::core::Result<Self> {
        let (request_tx, request_rx) = mpsc::unbounded_channel::<FetchRequest>();
        let (result_tx, result_rx) = mpsc::unbounded_channel::<FetchResult>();

        let runtime = Runtime::new()
            .map_err(|e| crate::core::Error::Streaming(format!("tokio runtime init failed: {e}")))?;

        let service = Arc::new(service);
        runtime.spawn(async move {
            Self::worker_loop(service, max_concurrent, request_rx, result_tx).await;
        });

        Ok(Self {
            request_tx,
            result_rx,
            pending: HashSet::new(),
            dead: false,
            runtime: Some(runtime),
        })
    }

    /// Create a fetcher on the caller's tokio runtime.
    ///
    /// Panics if called outside a tokio runtime context.
    pub fn with_current_runtime<S: ElevationService>(service: S, max_concurrent: usize) -> Self {
        let (request_tx, request_rx) = mpsc::unbounded_channel::<FetchRequest>();
        let (result_tx, result_rx) = mpsc::unbounded_channel::<FetchResult>();

        let service = Arc::new(service);
        tokio::spawn(async move {
            Self::worker_loop(service, max_concurrent, request_rx, result_tx).await;
        });

        Self {
            request_tx,
            result_rx,
            pending: HashSet::new(),
            dead: false,
            runtime: None,
        }
    }

    /// Worker loop: drains requests FIFO with a concurrency cap
    async fn worker_loop<S: ElevationService>(
        service: Arc<S>,
        max_concurrent: usize,
        mut request_rx: mpsc::UnboundedReceiver<FetchRequest>,
        result_tx: mpsc::UnboundedSender<FetchResult>,
    ) {
        use tokio::task::JoinSet;

        let mut active_tasks: JoinSet<FetchResult> = JoinSet::new();
        let mut waiting: VecDeque<FetchRequest> = VecDeque::new();

        loop {
            tokio::select! {
                Some(request) = request_rx.recv() => {
                    waiting.push_back(request);
                }

                Some(joined) = active_tasks.join_next(), if !active_tasks.is_empty() => {
                    match joined {
                        Ok(result) => {
                            let _ = result_tx.send(result);
                        }
                        Err(e) => {
                            log::error!("elevation fetch task panicked: {e}");
                        }
                    }
                }

                else => {
                    if waiting.is_empty() && active_tasks.is_empty() {
                        break;
                    }
                }
            }

            while active_tasks.len() < max_concurrent {
                let Some(request) = waiting.pop_front() else { break };
                let service = service.clone();
                active_tasks.spawn(async move {
                    let outcome = service.fetch(request.points).await;
                    FetchResult { coord: request.coord, outcome }
                });
            }
        }
    }

    /// Request elevation samples for a chunk.
    ///
    /// Returns false without queuing when the coordinate is already in
    /// flight. A dead worker is recorded, never panicked on.
    pub fn request(&mut self, coord: ChunkCoord, points: Vec<GeoPoint>) -> bool {
        if self.pending.contains(&coord) {
            return false;
        }

        if self.request_tx.send(FetchRequest { coord, points }).is_err() {
            log::error!("elevation fetch worker is gone; dropping request for chunk {coord}");
            self.dead = true;
            return false;
        }

        self.pending.insert(coord);
        true
    }

    /// Poll for completed fetches (non-blocking).
    ///
    /// Returns all currently available results and removes them from the
    /// pending set.
    pub fn poll_results(&mut self) -> Vec<FetchResult> {
        let mut results = Vec::new();
        while let Ok(result) = self.result_rx.try_recv() {
            self.pending.remove(&result.coord);
            results.push(result);
        }
        results
    }

    /// Number of in-flight fetches
    pub fn pending_count(&self) -> usize {
        self.pending.len()
    }

    /// Whether a specific coordinate is in flight
    pub fn is_pending(&self, coord: ChunkCoord) -> bool {
        self.pending.contains(&coord)
    }

    /// True once the worker channel has died
    pub fn is_dead(&self) -> bool {
        self.dead
    }
}
