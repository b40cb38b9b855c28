//! REST snapshot fetching.
//!
//! Pull-snapshot venues deliver full book state over a request/response
//! endpoint rather than inline on the stream. This module provides the
//! [`SnapshotFetcher`] seam the sync engine calls, plus [`RestClient`]: a
//! generic implementation over `reqwest` that delegates the venue-specific
//! path/query and body format to a [`SnapshotCodec`].
//!
//! Authentication is deliberately absent: depth endpoints on the venues this
//! crate targets are public, and signed trading traffic goes through the
//! per-venue [`OrderGateway`](crate::types::OrderGateway) implementations
//! outside this crate.

use std::sync::Arc;

use async_trait::async_trait;
use url::Url;

use crate::client::limiter::RateLimiter;
use crate::config::VenueConfig;
use crate::error::Error;
use crate::types::SnapshotEvent;

/// Asynchronous source of full book snapshots.
///
/// Implemented by [`RestClient`] for real venues and by scripted mocks in
/// tests. Fetches are spawned by the feed task and must not hold any book
/// lock; results re-enter through the book manager.
#[async_trait]
pub trait SnapshotFetcher: Send + Sync {
    /// Fetch the current full book for `symbol`
    async fn fetch_snapshot(&self, symbol: &str) -> Result<SnapshotEvent, Error>;
}

/// Venue-specific shape of the snapshot endpoint
pub trait SnapshotCodec: Send + Sync + 'static {
    /// Path (relative to the REST base URL) and query parameters of the
    /// depth endpoint for `symbol`
    fn snapshot_request(&self, symbol: &str) -> (String, Vec<(String, String)>);

    /// Decode a response body into a canonical snapshot
    fn decode_snapshot(&self, body: &str, symbol: &str) -> Result<SnapshotEvent, Error>;
}

/// Generic snapshot client over a venue's REST depth endpoint
#[derive(Debug)]
pub struct RestClient<C> {
    http: reqwest::Client,
    base_url: Url,
    codec: C,
    limiter: Arc<RateLimiter>,
}

impl<C: SnapshotCodec> RestClient<C> {
    /// Create a snapshot client for a venue
    ///
    /// # Errors
    ///
    /// Returns an error if the config has no REST URL or the HTTP client
    /// cannot be initialized.
    pub fn new(config: &VenueConfig, codec: C, limiter: Arc<RateLimiter>) -> Result<Self, Error> {
        let base_url = config
            .rest_url()
            .cloned()
            .ok_or_else(|| {
                Error::Config("pull-snapshot venue requires a REST url".to_string())
            })?;

        let http = reqwest::Client::builder()
            .timeout(config.request_timeout())
            .build()?;

        Ok(Self {
            http,
            base_url,
            codec,
            limiter,
        })
    }
}

#[async_trait]
impl<C: SnapshotCodec> SnapshotFetcher for RestClient<C> {
    async fn fetch_snapshot(&self, symbol: &str) -> Result<SnapshotEvent, Error> {
        self.limiter.acquire(1).await;

        let (path, query) = self.codec.snapshot_request(symbol);
        let url = self
            .base_url
            .join(&path)
            .map_err(|e| Error::Config(format!("invalid snapshot path {path:?}: {e}")))?;

        let response = self.http.get(url).query(&query).send().await?;
        let status = response.status();
        if status.as_u16() == 429 {
            return Err(Error::RateLimited);
        }
        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            return Err(Error::Api {
                status: status.as_u16(),
                message,
            });
        }

        let body = response.text().await?;
        self.codec.decode_snapshot(&body, symbol)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::SyncMode;
    use crate::types::PriceLevel;

    struct DepthCodec;

    impl SnapshotCodec for DepthCodec {
        fn snapshot_request(&self, symbol: &str) -> (String, Vec<(String, String)>) {
            (
                "api/v1/depth".to_string(),
                vec![
                    ("symbol".to_string(), symbol.to_string()),
                    ("limit".to_string(), "1000".to_string()),
                ],
            )
        }

        fn decode_snapshot(&self, body: &str, symbol: &str) -> Result<SnapshotEvent, Error> {
            #[derive(serde::Deserialize)]
            struct Wire {
                #[serde(rename = "lastUpdateId")]
                last_update_id: u64,
                asks: Vec<(f64, f64)>,
                bids: Vec<(f64, f64)>,
            }
            let wire: Wire = serde_json::from_str(body)?;
            Ok(SnapshotEvent {
                symbol: symbol.to_string(),
                seq: Some(wire.last_update_id),
                asks: wire
                    .asks
                    .into_iter()
                    .map(|(p, q)| PriceLevel::new(p, q))
                    .collect(),
                bids: wire
                    .bids
                    .into_iter()
                    .map(|(p, q)| PriceLevel::new(p, q))
                    .collect(),
            })
        }
    }

    #[test]
    fn test_codec_decode() {
        let body = r#"{"lastUpdateId":500,"asks":[[100.5,1.0]],"bids":[[100.0,2.0]]}"#;
        let snap = DepthCodec.decode_snapshot(body, "BTCUSDT").unwrap();
        assert_eq!(snap.seq, Some(500));
        assert_eq!(snap.asks[0].price, 100.5);
        assert_eq!(snap.bids[0].qty, 2.0);
    }

    #[test]
    fn test_requires_rest_url() {
        let config =
            VenueConfig::new("x", "wss://ws.example.com", SyncMode::PullSnapshot).unwrap();
        let limiter = Arc::new(RateLimiter::new(config.rate_limit()));
        let result = RestClient::new(&config, DepthCodec, limiter);
        assert!(matches!(result, Err(Error::Config(_))));
    }

    #[test]
    fn test_builds_with_rest_url() {
        let config = VenueConfig::new("x", "wss://ws.example.com", SyncMode::PullSnapshot)
            .unwrap()
            .with_rest_url("https://api.example.com")
            .unwrap();
        let limiter = Arc::new(RateLimiter::new(config.rate_limit()));
        assert!(RestClient::new(&config, DepthCodec, limiter).is_ok());
    }
}
