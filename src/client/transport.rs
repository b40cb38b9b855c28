//! Venue-agnostic WebSocket feed driver.
//!
//! [`FeedConnection`] owns one socket to one venue: it connects, sends the
//! codec's subscribe frames, decodes inbound frames into canonical events,
//! and routes them into the session's [`BookManager`]. On any failure — socket
//! error, stale feed, forced resynchronization — it resets every replica and
//! reconnects with exponential backoff, replaying the subscriptions.
//!
//! Per-venue framing lives entirely behind [`FeedCodec`]; this driver never
//! inspects payloads itself.

use std::sync::Arc;

use futures_util::{SinkExt, StreamExt};
use rand::Rng;
use tokio::sync::{mpsc, watch};
use tokio_tungstenite::tungstenite::Message;
use tracing::{debug, error, info, warn};

use crate::book::{BookManager, SyncAction};
use crate::client::rest::SnapshotFetcher;
use crate::config::VenueConfig;
use crate::error::Error;
use crate::types::{AlertKind, FeedEvent, HealthAlert};

/// Venue-specific stream framing.
///
/// One implementation per venue, supplied by the embedder. Decoding errors on
/// a single frame are logged and skipped; only transport-level failures tear
/// the connection down.
pub trait FeedCodec: Send + Sync + 'static {
    /// Frames to send after connecting, subscribing the given symbols
    fn subscribe_frames(&self, symbols: &[String]) -> Vec<String>;

    /// Decode one inbound text frame.
    ///
    /// `Ok(None)` means the frame is valid but irrelevant (heartbeats,
    /// subscription acks); `Err` means the frame should have decoded and
    /// did not.
    fn decode(&self, raw: &str) -> Result<Option<FeedEvent>, Error>;
}

/// Configuration for reconnection behavior
#[derive(Debug, Clone)]
pub struct ReconnectConfig {
    /// Maximum number of reconnection attempts (0 = infinite)
    pub max_retries: u32,
    /// Initial delay between reconnection attempts
    pub initial_delay_ms: u64,
    /// Maximum delay between reconnection attempts
    pub max_delay_ms: u64,
    /// Multiplier for exponential backoff
    pub backoff_multiplier: f64,
    /// Random extra fraction added to each delay (0.1 = up to +10%)
    pub jitter: f64,
}

impl Default for ReconnectConfig {
    fn default() -> Self {
        Self {
            max_retries: 0,
            initial_delay_ms: 100,
            max_delay_ms: 30_000,
            backoff_multiplier: 2.0,
            jitter: 0.1,
        }
    }
}

impl ReconnectConfig {
    /// Create a new reconnect config with default values
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set maximum retries (0 = infinite)
    #[must_use]
    pub fn max_retries(mut self, retries: u32) -> Self {
        self.max_retries = retries;
        self
    }

    /// Set initial delay in milliseconds
    #[must_use]
    pub fn initial_delay_ms(mut self, ms: u64) -> Self {
        self.initial_delay_ms = ms;
        self
    }

    /// Set maximum delay in milliseconds
    #[must_use]
    pub fn max_delay_ms(mut self, ms: u64) -> Self {
        self.max_delay_ms = ms;
        self
    }

    /// Set backoff multiplier
    #[must_use]
    pub fn backoff_multiplier(mut self, multiplier: f64) -> Self {
        self.backoff_multiplier = multiplier;
        self
    }

    /// Calculate the deterministic delay for a given retry attempt
    #[must_use]
    pub fn delay_for_attempt(&self, attempt: u32) -> std::time::Duration {
        let delay = self.initial_delay_ms as f64 * self.backoff_multiplier.powi(attempt as i32);
        let delay_ms = delay.min(self.max_delay_ms as f64) as u64;
        std::time::Duration::from_millis(delay_ms)
    }

    /// The delay for an attempt with jitter applied
    #[must_use]
    pub fn jittered_delay(&self, attempt: u32) -> std::time::Duration {
        let base = self.delay_for_attempt(attempt);
        if self.jitter <= 0.0 {
            return base;
        }
        let factor = rand::thread_rng().gen_range(1.0..1.0 + self.jitter);
        base.mul_f64(factor)
    }
}

/// One WebSocket connection to one venue's delta stream.
///
/// Runs until shut down; every connection loss resets the session's replicas
/// and restarts bootstrap after backoff.
pub struct FeedConnection<C> {
    venue: String,
    ws_url: url::Url,
    symbols: Vec<String>,
    codec: C,
    manager: Arc<BookManager>,
    fetcher: Option<Arc<dyn SnapshotFetcher>>,
    alerts: mpsc::Sender<HealthAlert>,
    shutdown: watch::Receiver<bool>,
    resync: watch::Receiver<u64>,
    reconnect: ReconnectConfig,
}

impl<C: FeedCodec> FeedConnection<C> {
    /// Wire up a feed connection; nothing is opened until [`run`](Self::run)
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        config: &VenueConfig,
        codec: C,
        manager: Arc<BookManager>,
        fetcher: Option<Arc<dyn SnapshotFetcher>>,
        alerts: mpsc::Sender<HealthAlert>,
        shutdown: watch::Receiver<bool>,
        resync: watch::Receiver<u64>,
        reconnect: ReconnectConfig,
    ) -> Self {
        Self {
            venue: config.venue().to_string(),
            ws_url: config.ws_url().clone(),
            symbols: config.symbols().to_vec(),
            codec,
            manager,
            fetcher,
            alerts,
            shutdown,
            resync,
            reconnect,
        }
    }

    /// Drive the connection until shutdown.
    ///
    /// Reconnects forever (or up to `max_retries`) on failure; each rebuild
    /// resets every replica so bootstrap restarts cleanly.
    pub async fn run(mut self) {
        let mut attempt: u32 = 0;
        loop {
            if *self.shutdown.borrow() {
                return;
            }

            match self.run_once(&mut attempt).await {
                Ok(()) => return,
                Err(e) => {
                    warn!(venue = %self.venue, error = %e, "feed connection lost");
                }
            }
            self.manager.reset_all();

            if self.reconnect.max_retries > 0 && attempt >= self.reconnect.max_retries {
                error!(
                    venue = %self.venue,
                    attempts = attempt,
                    "giving up on feed reconnection"
                );
                return;
            }

            let delay = self.reconnect.jittered_delay(attempt);
            attempt += 1;
            debug!(venue = %self.venue, attempt, ?delay, "reconnecting after backoff");
            tokio::select! {
                _ = tokio::time::sleep(delay) => {}
                _ = self.shutdown.changed() => return,
            }
        }
    }

    /// One connect-subscribe-read cycle. `Ok(())` means clean shutdown.
    async fn run_once(&mut self, attempt: &mut u32) -> Result<(), Error> {
        // A resync requested while we were already rebuilding is satisfied by
        // this very connection; clear it so it does not retrigger.
        self.resync.borrow_and_update();

        let connect = tokio_tungstenite::connect_async(self.ws_url.as_str());
        let (ws, _response) = tokio::select! {
            changed = self.shutdown.changed() => {
                let _ = changed;
                return Ok(());
            }
            res = connect => res?,
        };
        info!(venue = %self.venue, "feed connected");
        let (mut write, mut read) = ws.split();

        for frame in self.codec.subscribe_frames(&self.symbols) {
            write.send(Message::Text(frame)).await?;
        }

        loop {
            tokio::select! {
                changed = self.shutdown.changed() => {
                    // A dropped sender means the session is gone; either way
                    // this is a clean exit.
                    let _ = changed;
                    let _ = write.close().await;
                    return Ok(());
                }
                changed = self.resync.changed() => {
                    if changed.is_err() {
                        let _ = write.close().await;
                        return Ok(());
                    }
                    info!(venue = %self.venue, "forced resynchronization, rebuilding connection");
                    return Err(Error::ConnectionClosed);
                }
                msg = read.next() => match msg {
                    Some(Ok(Message::Text(text))) => {
                        *attempt = 0;
                        self.handle_frame(&text)?;
                    }
                    Some(Ok(Message::Ping(data))) => {
                        write.send(Message::Pong(data)).await?;
                    }
                    Some(Ok(Message::Close(_))) | None => {
                        return Err(Error::ConnectionClosed);
                    }
                    Some(Ok(_)) => {
                        // Ignore Binary, Pong, Frame
                    }
                    Some(Err(e)) => {
                        return Err(e.into());
                    }
                }
            }
        }
    }

    fn handle_frame(&self, text: &str) -> Result<(), Error> {
        let event = match self.codec.decode(text) {
            Ok(Some(event)) => event,
            Ok(None) => return Ok(()),
            Err(e) => {
                // One bad frame is not worth a reconnect storm
                warn!(venue = %self.venue, error = %e, "dropping undecodable frame");
                return Ok(());
            }
        };

        match event {
            FeedEvent::Snapshot(snapshot) => {
                self.manager.process_snapshot(snapshot);
                Ok(())
            }
            FeedEvent::Delta(delta) => match self.manager.process_delta(&delta) {
                Ok(SyncAction::None) => Ok(()),
                Ok(SyncAction::FetchSnapshot) => {
                    self.spawn_fetch(delta.symbol);
                    Ok(())
                }
                Err(e) => {
                    if let Error::StaleFeed { symbol, age_ms } = &e {
                        self.emit_alert(HealthAlert {
                            symbol: symbol.clone(),
                            kind: AlertKind::StaleFeed,
                            detail: format!("delta {age_ms}ms behind wall clock"),
                        });
                    }
                    Err(e)
                }
            },
        }
    }

    /// Start a snapshot fetch on its own task.
    ///
    /// The fetch never runs under a book lock; its result (or failure)
    /// re-enters through the manager.
    fn spawn_fetch(&self, symbol: String) {
        let Some(fetcher) = self.fetcher.clone() else {
            warn!(
                venue = %self.venue,
                symbol = %symbol, "pull bootstrap requested but no snapshot fetcher configured"
            );
            self.manager.fetch_failed(&symbol);
            return;
        };
        let manager = Arc::clone(&self.manager);
        tokio::spawn(async move {
            match fetcher.fetch_snapshot(&symbol).await {
                Ok(snapshot) => manager.process_snapshot(snapshot),
                Err(e) => {
                    warn!(symbol = %symbol, error = %e, "snapshot fetch failed");
                    manager.fetch_failed(&symbol);
                }
            }
        });
    }

    fn emit_alert(&self, alert: HealthAlert) {
        warn!(
            venue = %self.venue,
            symbol = %alert.symbol,
            kind = ?alert.kind,
            detail = %alert.detail,
            "health violation"
        );
        if self.alerts.try_send(alert).is_err() {
            warn!(venue = %self.venue, "alert channel full, dropping alert");
        }
    }
}
