//! Error types for the bookwire crate.
//!
//! This module defines the errors that can occur while keeping a local
//! orderbook in sync with a venue: transport and decoding failures, venue API
//! errors, and the three connection-fatal health violations detected by the
//! book monitors.

use thiserror::Error;

/// The main error type for this crate
#[derive(Debug, Error)]
pub enum Error {
    /// HTTP request failed
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// WebSocket error
    #[error("WebSocket error: {0}")]
    WebSocket(#[from] tokio_tungstenite::tungstenite::Error),

    /// JSON serialization/deserialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Invalid configuration (missing fields, bad format)
    #[error("Configuration error: {0}")]
    Config(String),

    /// A venue codec could not make sense of a wire frame
    #[error("Codec error: {0}")]
    Codec(String),

    /// Venue API returned an error response
    #[error("API error ({status}): {message}")]
    Api {
        /// HTTP status code
        status: u16,
        /// Error message from the venue
        message: String,
    },

    /// Rate limit exceeded
    #[error("Rate limited")]
    RateLimited,

    /// WebSocket connection closed unexpectedly
    #[error("WebSocket connection closed")]
    ConnectionClosed,

    /// A delta arrived too far behind wall-clock time to trust the feed
    #[error("Stale feed for {symbol}: delta is {age_ms}ms old")]
    StaleFeed {
        /// Symbol whose feed went stale
        symbol: String,
        /// Age of the offending delta, in milliseconds
        age_ms: u64,
    },

    /// Top-of-book fingerprints were unchanged across a full monitor interval
    #[error("Frozen book for {symbol}: no real updates across a monitor interval")]
    FrozenBook {
        /// Symbol whose book froze
        symbol: String,
    },

    /// Best ask at or below best bid, persisting across two checks
    #[error("Crossed book for {symbol}: ask {ask} <= bid {bid}")]
    CrossedBook {
        /// Symbol whose book crossed
        symbol: String,
        /// Best ask price at detection time
        ask: f64,
        /// Best bid price at detection time
        bid: f64,
    },

    /// Operation timed out
    #[error("Operation timed out")]
    Timeout,
}

impl Error {
    /// Whether this error should tear down the owning connection.
    ///
    /// Health violations are connection-fatal but never process-fatal: the
    /// owning session rebuilds the transport and every replica restarts
    /// unsynced.
    pub fn is_connection_fatal(&self) -> bool {
        matches!(
            self,
            Error::StaleFeed { .. }
                | Error::FrozenBook { .. }
                | Error::CrossedBook { .. }
                | Error::ConnectionClosed
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_api_error_display() {
        let err = Error::Api {
            status: 400,
            message: "Bad request".to_string(),
        };
        assert!(err.to_string().contains("400"));
        assert!(err.to_string().contains("Bad request"));
    }

    #[test]
    fn test_crossed_book_display() {
        let err = Error::CrossedBook {
            symbol: "BTC-USDT".to_string(),
            ask: 99.0,
            bid: 100.0,
        };
        assert!(err.to_string().contains("BTC-USDT"));
        assert!(err.to_string().contains("99"));
    }

    #[test]
    fn test_health_errors_are_connection_fatal() {
        assert!(Error::StaleFeed {
            symbol: "X".into(),
            age_ms: 6000
        }
        .is_connection_fatal());
        assert!(Error::FrozenBook { symbol: "X".into() }.is_connection_fatal());
        assert!(!Error::Timeout.is_connection_fatal());
        assert!(!Error::RateLimited.is_connection_fatal());
    }
}
