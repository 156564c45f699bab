//! Elevation service abstraction and the OpenTopoData HTTP client
//!
//! The wire contract: an ordered list of lat/lng locations in, a JSON body
//! `{ "results": [{ "elevation": .. , "location": {..} }], "status": "OK" }`
//! out, with results matching the request in length and order. Every failure
//! mode below maps to the recoverable flat-fallback path in the provider.

use std::future::Future;
use std::time::Duration;

use serde::Deserialize;
use thiserror::Error;

use crate::heightmap::footprint::GeoPoint;

/// Request timeout for elevation fetches
pub const FETCH_TIMEOUT: Duration = Duration::from_secs(10);

/// Failure modes of an elevation fetch
#[derive(Debug, Error)]
pub enum ElevationError {
    #[error("transport error: {0}")]
    Transport(String),

    #[error("http status {0}")]
    HttpStatus(u16),

    #[error("empty response body")]
    EmptyBody,

    #[error("malformed response: {0}")]
    Malformed(String),

    #[error("service status {0:?}")]
    ServiceStatus(String),

    #[error("result count mismatch: expected {expected}, got {actual}")]
    CountMismatch { expected: usize, actual: usize },
}

#[derive(Debug, Deserialize)]
struct TopoResponse {
    results: Vec<TopoResult>,
    #[serde(default)]
    status: String,
}

#[derive(Debug, Deserialize)]
struct TopoResult {
    elevation: f32,
    #[serde(default)]
    #[allow(dead_code)]
    location: Option<TopoLocation>,
}

#[derive(Debug, Clone, Copy, Deserialize)]
#[allow(dead_code)]
struct TopoLocation {
    lat: f64,
    lng: f64,
}

/// Source of elevation samples for a batch of locations.
///
/// Implementations must return exactly one sample per requested point, in
/// request order. Tests inject mock implementations.
pub trait ElevationService: Send + Sync + 'static {
    fn fetch(
        &self,
        points: Vec<GeoPoint>,
    ) -> impl Future<Output = Result<Vec<f32>, ElevationError>> + Send;
}

/// HTTP client for an OpenTopoData-style elevation endpoint
pub struct OpenTopoClient {
    base_url: String,
    client: reqwest::Client,
}

impl OpenTopoClient {
    pub const DEFAULT_BASE_URL: &'static str = "https://api.opentopodata.org/v1/srtm30m";

    /// Create a client against the given endpoint base URL
    pub fn new(base_url: impl Into<String>) -> Result<Self, ElevationError> {
        let client = reqwest::Client::builder()
            .timeout(FETCH_TIMEOUT)
            .build()
            .map_err(|e| ElevationError::Transport(e.to_string()))?;

        Ok(Self { base_url: base_url.into(), client })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Format the `locations` query parameter: `lat,lng|lat,lng|...`
    fn locations_param(points: &[GeoPoint]) -> String {
        let mut out = String::with_capacity(points.len() * 24);
        for (i, p) in points.iter().enumerate() {
            if i > 0 {
                out.push('|');
            }
            out.push_str(&format!("{},{}", p.lat, p.lng));
        }
        out
    }

    /// Parse and validate a response body.
    ///
    /// Checks, in order: non-empty body, well-formed JSON, service-level
    /// status, and exact result count.
    pub fn parse_response(body: &str, expected: usize) -> Result<Vec<f32>, ElevationError> {
        if body.trim().is_empty() {
            return Err(ElevationError::EmptyBody);
        }

        let response: TopoResponse =
            serde_json::from_str(body).map_err(|e| ElevationError::Malformed(e.to_string()))?;

        if !response.status.is_empty() && response.status != "OK" {
            return Err(ElevationError::ServiceStatus(response.status));
        }
        if response.results.len() != expected {
            return Err(ElevationError::CountMismatch {
                expected,
                actual: response.results.len(),
            });
        }

        Ok(response.results.into_iter().map(|r| r.elevation).collect())
    }
}

impl ElevationService for OpenTopoClient {
    fn fetch(
        &self,
        points: Vec<GeoPoint>,
    ) -> impl Future<Output = Result<Vec<f32>, ElevationError>> + Send {
        async move {
            let url = format!("{}?locations={}", self.base_url, Self::locations_param(&points));

            let response = self
                .client
                .get(&url)
                .send()
                .await
                .map_err(|e| ElevationError::Transport(e.to_string()))?;

            if !response.status().is_success() {
                return Err(ElevationError::HttpStatus(response.status().as_u16()));
            }

            let body = response
                .text()
                .await
                .map_err(|e| ElevationError::Transport(e.to_string()))?;

            Self::parse_response(&body, points.len())
        }
    }
}
