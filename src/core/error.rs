//! Error types for terrastream

use thiserror::Error;

/// Main error type for the crate
#[derive(Debug, Error)]
pub enum Error {
    #[error("config error: {0}")]
    Config(String),

    #[error("streaming error: {0}")]
    Streaming(String),

    #[error(transparent)]
    Elevation(#[from] crate::heightmap::topo::ElevationError),
}
