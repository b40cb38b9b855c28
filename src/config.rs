//! Per-venue configuration.
//!
//! This module provides the [`VenueConfig`] struct describing one venue
//! connection: endpoints, subscribed symbols, the snapshot strategy, monitor
//! cadence, and rate-limit budget. One config builds one
//! [`VenueSession`](crate::session::VenueSession); nothing here is shared
//! across venues.

use std::time::Duration;

use url::Url;

use crate::error::Error;

/// How a venue delivers the initial book state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncMode {
    /// The venue pushes a full snapshot as the first frame of a subscription
    PushSnapshot,
    /// The stream carries only deltas tagged with update-id spans; snapshots
    /// are fetched over REST and reconciled against the spans
    PullSnapshot,
}

/// Rate-limit budget for a venue's request/response calls
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RateLimit {
    /// Maximum burst size, in requests
    pub burst: u32,
    /// Sustained refill rate, in requests per second
    pub per_second: f64,
}

impl Default for RateLimit {
    fn default() -> Self {
        Self {
            burst: 10,
            per_second: 5.0,
        }
    }
}

/// Configuration for one venue connection
///
/// # Example
///
/// ```rust
/// use std::time::Duration;
/// use bookwire::config::{SyncMode, VenueConfig};
///
/// let config = VenueConfig::new("binance", "wss://stream.example.com/ws", SyncMode::PullSnapshot)
///     .expect("valid url")
///     .with_rest_url("https://api.example.com")
///     .expect("valid url")
///     .with_symbols(["BTCUSDT", "ETHUSDT"])
///     .with_staleness_window(Duration::from_secs(5));
/// ```
#[derive(Debug, Clone)]
pub struct VenueConfig {
    /// Venue name, used in logs and alerts
    venue: String,

    /// WebSocket endpoint for the delta stream
    ws_url: Url,

    /// REST base URL for snapshot fetches (pull-snapshot venues)
    rest_url: Option<Url>,

    /// Symbols to replicate
    symbols: Vec<String>,

    /// Snapshot delivery strategy
    sync_mode: SyncMode,

    /// Maximum tolerated delta age before the feed is judged stale
    staleness_window: Duration,

    /// Cadence of the crossed-book check
    cross_check_interval: Duration,

    /// Cadence of the frozen-feed check
    freeze_check_interval: Duration,

    /// Levels per side folded into the freeze fingerprint
    fingerprint_depth: usize,

    /// Capacity of the health-alert channel
    alert_capacity: usize,

    /// HTTP request timeout
    request_timeout: Duration,

    /// Request/response rate-limit budget
    rate_limit: RateLimit,
}

impl VenueConfig {
    /// Create a configuration for one venue
    ///
    /// # Errors
    ///
    /// Returns an error if `ws_url` is not a valid `ws://` or `wss://` URL.
    pub fn new(
        venue: impl Into<String>,
        ws_url: &str,
        sync_mode: SyncMode,
    ) -> Result<Self, Error> {
        let ws_url = Url::parse(ws_url)
            .map_err(|e| Error::Config(format!("invalid websocket url: {e}")))?;
        if !matches!(ws_url.scheme(), "ws" | "wss") {
            return Err(Error::Config(format!(
                "websocket url must use ws:// or wss://, got {}",
                ws_url.scheme()
            )));
        }

        Ok(Self {
            venue: venue.into(),
            ws_url,
            rest_url: None,
            symbols: Vec::new(),
            sync_mode,
            staleness_window: Duration::from_millis(5_000),
            cross_check_interval: Duration::from_secs(5),
            freeze_check_interval: Duration::from_secs(30),
            fingerprint_depth: 10,
            alert_capacity: 64,
            request_timeout: Duration::from_secs(10),
            rate_limit: RateLimit::default(),
        })
    }

    /// Set the REST base URL used for snapshot fetches
    ///
    /// # Errors
    ///
    /// Returns an error if the URL is not valid `http://` or `https://`.
    pub fn with_rest_url(mut self, rest_url: &str) -> Result<Self, Error> {
        let url =
            Url::parse(rest_url).map_err(|e| Error::Config(format!("invalid rest url: {e}")))?;
        if !matches!(url.scheme(), "http" | "https") {
            return Err(Error::Config(format!(
                "rest url must use http:// or https://, got {}",
                url.scheme()
            )));
        }
        self.rest_url = Some(url);
        Ok(self)
    }

    /// Set the symbols to replicate
    #[must_use]
    pub fn with_symbols<I, S>(mut self, symbols: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.symbols = symbols.into_iter().map(Into::into).collect();
        self
    }

    /// Set the staleness window for the inline delta freshness check
    #[must_use]
    pub fn with_staleness_window(mut self, window: Duration) -> Self {
        self.staleness_window = window;
        self
    }

    /// Set the monitor cadence (crossed-book, frozen-feed)
    #[must_use]
    pub fn with_check_intervals(mut self, cross: Duration, freeze: Duration) -> Self {
        self.cross_check_interval = cross;
        self.freeze_check_interval = freeze;
        self
    }

    /// Set how many levels per side the freeze fingerprint covers
    #[must_use]
    pub fn with_fingerprint_depth(mut self, depth: usize) -> Self {
        self.fingerprint_depth = depth;
        self
    }

    /// Set the health-alert channel capacity
    #[must_use]
    pub fn with_alert_capacity(mut self, capacity: usize) -> Self {
        self.alert_capacity = capacity;
        self
    }

    /// Set the HTTP request timeout
    #[must_use]
    pub fn with_request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = timeout;
        self
    }

    /// Set the request/response rate-limit budget
    #[must_use]
    pub fn with_rate_limit(mut self, rate_limit: RateLimit) -> Self {
        self.rate_limit = rate_limit;
        self
    }

    /// Venue name
    pub fn venue(&self) -> &str {
        &self.venue
    }

    /// WebSocket endpoint
    pub fn ws_url(&self) -> &Url {
        &self.ws_url
    }

    /// REST base URL, if configured
    pub fn rest_url(&self) -> Option<&Url> {
        self.rest_url.as_ref()
    }

    /// Symbols to replicate
    pub fn symbols(&self) -> &[String] {
        &self.symbols
    }

    /// Snapshot delivery strategy
    pub fn sync_mode(&self) -> SyncMode {
        self.sync_mode
    }

    /// Staleness window
    pub fn staleness_window(&self) -> Duration {
        self.staleness_window
    }

    /// Crossed-book check cadence
    pub fn cross_check_interval(&self) -> Duration {
        self.cross_check_interval
    }

    /// Frozen-feed check cadence
    pub fn freeze_check_interval(&self) -> Duration {
        self.freeze_check_interval
    }

    /// Freeze fingerprint depth
    pub fn fingerprint_depth(&self) -> usize {
        self.fingerprint_depth
    }

    /// Health-alert channel capacity
    pub fn alert_capacity(&self) -> usize {
        self.alert_capacity
    }

    /// HTTP request timeout
    pub fn request_timeout(&self) -> Duration {
        self.request_timeout
    }

    /// Rate-limit budget
    pub fn rate_limit(&self) -> RateLimit {
        self.rate_limit
    }
}
