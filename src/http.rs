//! HTTP client for the Overpass API.
//!
//! Downloads trail ways around a point with:
//! - Form-encoded POST of the Overpass QL query
//! - Connect and request timeouts
//! - Retry with exponential backoff on 429 and transport errors
//!
//! Failures never propagate: they are logged and yield an empty trail list,
//! leaving previously saved areas untouched.

use std::time::{Duration, Instant};

use log::{debug, info, warn};
use reqwest::{Client, StatusCode};

use crate::overpass::{build_query, parse_trails, BoundingBox};
use crate::{GeoPoint, Trail};

/// Configuration for [`OverpassClient`].
#[derive(Debug, Clone)]
pub struct OverpassConfig {
    /// Overpass interpreter endpoint.
    /// Default: "https://overpass-api.de/api/interpreter"
    pub endpoint: String,

    /// Download radius around the rider.
    /// Default: 10.0 miles
    pub radius_miles: f64,

    /// Default: 30 seconds
    pub connect_timeout: Duration,

    /// Whole-request timeout, body included.
    /// Default: 30 seconds
    pub request_timeout: Duration,

    /// Retries after the first attempt.
    /// Default: 3
    pub max_retries: u32,
}

impl Default for OverpassConfig {
    fn default() -> Self {
        Self {
            endpoint: "https://overpass-api.de/api/interpreter".to_string(),
            radius_miles: 10.0,
            connect_timeout: Duration::from_secs(30),
            request_timeout: Duration::from_secs(30),
            max_retries: 3,
        }
    }
}

/// Overpass trail downloader
pub struct OverpassClient {
    client: Client,
    config: OverpassConfig,
}

impl OverpassClient {
    pub fn new(config: OverpassConfig) -> Result<Self, String> {
        let client = Client::builder()
            .connect_timeout(config.connect_timeout)
            .timeout(config.request_timeout)
            .build()
            .map_err(|e| format!("Failed to create HTTP client: {}", e))?;

        Ok(Self { client, config })
    }

    pub fn config(&self) -> &OverpassConfig {
        &self.config
    }

    /// Download trails within the configured radius of `center`.
    pub async fn download_trails_near(&self, center: GeoPoint) -> Vec<Trail> {
        self.download_trails_nearby(center, self.config.radius_miles).await
    }

    /// Download trails within `radius_miles` of `center`.
    pub async fn download_trails_nearby(&self, center: GeoPoint, radius_miles: f64) -> Vec<Trail> {
        self.download_trails(&BoundingBox::around(center, radius_miles))
            .await
    }

    /// Download every trail way inside `bbox`. Empty on any failure.
    pub async fn download_trails(&self, bbox: &BoundingBox) -> Vec<Trail> {
        let start = Instant::now();
        let query = build_query(bbox);
        debug!("[OverpassClient] Query: {}", query);

        let body = match self.fetch(&query).await {
            Ok(body) => body,
            Err(e) => {
                warn!("[OverpassClient] Error downloading trails: {}", e);
                return Vec::new();
            }
        };

        match parse_trails(&body) {
            Ok(trails) => {
                info!(
                    "[OverpassClient] Downloaded {} trails ({:.1}KB) in {:.2}s",
                    trails.len(),
                    body.len() as f64 / 1024.0,
                    start.elapsed().as_secs_f64()
                );
                trails
            }
            Err(e) => {
                warn!("[OverpassClient] JSON parse error: {}", e);
                Vec::new()
            }
        }
    }

    async fn fetch(&self, query: &str) -> Result<String, String> {
        let mut retries = 0;

        loop {
            let response = self
                .client
                .post(&self.config.endpoint)
                .form(&[("data", query)])
                .send()
                .await;

            let wait = match response {
                Ok(resp) if resp.status() == StatusCode::TOO_MANY_REQUESTS => {
                    // Overpass rate limits per IP; back off harder than on errors
                    Duration::from_millis(1000 * (1 << retries.min(3)))
                }
                Ok(resp) if !resp.status().is_success() => {
                    return Err(format!("HTTP {}", resp.status()));
                }
                Ok(resp) => {
                    let body = resp
                        .text()
                        .await
                        .map_err(|e| format!("Body download error: {}", e))?;
                    debug!("[OverpassClient] Response length: {}", body.len());
                    return Ok(body);
                }
                Err(e) => {
                    if retries >= self.config.max_retries {
                        return Err(format!("Request error: {}", e));
                    }
                    debug!("[OverpassClient] Request error: {}", e);
                    Duration::from_millis(200 * (1 << (retries + 1).min(4)))
                }
            };

            if retries >= self.config.max_retries {
                return Err("Max retries exceeded (429)".to_string());
            }
            retries += 1;
            warn!(
                "[OverpassClient] Retry {} of {} after {:?}",
                retries, self.config.max_retries, wait
            );
            tokio::time::sleep(wait).await;
        }
    }
}

/// Synchronous wrapper for FFI - runs the download on a tokio runtime
#[cfg(feature = "ffi")]
pub fn download_trails_nearby_sync(center: GeoPoint, radius_miles: f64) -> Vec<Trail> {
    use tokio::runtime::Builder;

    info!(
        "[FFI] download_trails_nearby_sync called for ({:.4}, {:.4}) r={}mi",
        center.lat, center.lon, radius_miles
    );

    let rt = match Builder::new_multi_thread().worker_threads(2).enable_all().build() {
        Ok(rt) => rt,
        Err(e) => {
            warn!("Failed to create tokio runtime: {}", e);
            return Vec::new();
        }
    };

    let client = match OverpassClient::new(OverpassConfig::default()) {
        Ok(c) => c,
        Err(e) => {
            warn!("Failed to create Overpass client: {}", e);
            return Vec::new();
        }
    };

    rt.block_on(client.download_trails_nearby(center, radius_miles))
}
