//! Per-venue session: the owner of all connection-scoped state.
//!
//! A [`VenueSession`] exists once per (venue, credentials) pair and owns
//! everything that used to be tempting to make global: the book registry, the
//! rate-limit bucket, the alert channel, and the shutdown/resync signals. Its
//! lifecycle is explicit — [`open`](VenueSession::open) spawns the feed and
//! monitor tasks, [`close`](VenueSession::close) tears them down — and nothing
//! survives it.
//!
//! The monitor task drives the two periodic health checks on independent
//! cadences. Any violation is delivered on the alert channel *and* bumps the
//! resync signal, so the feed connection rebuilds itself without waiting for
//! the embedder to react.

use std::sync::Arc;

use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tracing::{debug, warn};

use crate::book::{BookManager, Depth, SyncState, TopOfBook};
use crate::client::limiter::RateLimiter;
use crate::client::rest::SnapshotFetcher;
use crate::client::transport::{FeedCodec, FeedConnection, ReconnectConfig};
use crate::config::{SyncMode, VenueConfig};
use crate::error::Error;
use crate::types::HealthAlert;

/// One venue connection with explicit open/close lifecycle.
///
/// # Example
///
/// ```rust,no_run
/// use bookwire::config::{SyncMode, VenueConfig};
/// use bookwire::session::VenueSession;
/// # use bookwire::client::transport::FeedCodec;
/// # use bookwire::types::FeedEvent;
/// # struct MyCodec;
/// # impl FeedCodec for MyCodec {
/// #     fn subscribe_frames(&self, _: &[String]) -> Vec<String> { vec![] }
/// #     fn decode(&self, _: &str) -> Result<Option<FeedEvent>, bookwire::Error> { Ok(None) }
/// # }
///
/// # async fn example() -> Result<(), bookwire::Error> {
/// let config = VenueConfig::new("kraken", "wss://ws.example.com", SyncMode::PushSnapshot)?
///     .with_symbols(["BTC/USD"]);
/// let mut session = VenueSession::new(config);
/// let mut alerts = session.alerts().expect("taken once");
///
/// session.open(MyCodec, None)?;
/// if let Some(top) = session.top_of_book("BTC/USD") {
///     println!("top: {top:?}");
/// }
/// if let Some(alert) = alerts.recv().await {
///     println!("health violation: {alert:?}");
/// }
/// session.close().await;
/// # Ok(())
/// # }
/// ```
pub struct VenueSession {
    config: VenueConfig,
    manager: Arc<BookManager>,
    limiter: Arc<RateLimiter>,
    alerts_tx: mpsc::Sender<HealthAlert>,
    alerts_rx: Option<mpsc::Receiver<HealthAlert>>,
    shutdown_tx: watch::Sender<bool>,
    resync_tx: watch::Sender<u64>,
    tasks: Vec<JoinHandle<()>>,
}

impl std::fmt::Debug for VenueSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("VenueSession")
            .field("venue", &self.config.venue())
            .field("open", &!self.tasks.is_empty())
            .field("symbols", &self.manager.len())
            .finish()
    }
}

impl VenueSession {
    /// Create a closed session from a venue config
    #[must_use]
    pub fn new(config: VenueConfig) -> Self {
        let manager = Arc::new(BookManager::from_config(&config));
        let limiter = Arc::new(RateLimiter::new(config.rate_limit()));
        let (alerts_tx, alerts_rx) = mpsc::channel(config.alert_capacity());
        let (shutdown_tx, _) = watch::channel(false);
        let (resync_tx, _) = watch::channel(0u64);

        Self {
            config,
            manager,
            limiter,
            alerts_tx,
            alerts_rx: Some(alerts_rx),
            shutdown_tx,
            resync_tx,
            tasks: Vec::new(),
        }
    }

    /// The session's venue config
    #[must_use]
    pub fn config(&self) -> &VenueConfig {
        &self.config
    }

    /// The session's book registry, for direct wiring in tests or embedders
    /// that drive their own transport
    #[must_use]
    pub fn manager(&self) -> &Arc<BookManager> {
        &self.manager
    }

    /// The session's request budget; venue gateways placing orders on the
    /// same credentials should draw from this bucket
    #[must_use]
    pub fn limiter(&self) -> Arc<RateLimiter> {
        Arc::clone(&self.limiter)
    }

    /// Take the health-alert receiver.
    ///
    /// Returns `Some` exactly once; alerts are connection-fatal edge triggers
    /// (the session already forces its own reconnect, the embedder reacts for
    /// observability or trading-side flattening).
    pub fn alerts(&mut self) -> Option<mpsc::Receiver<HealthAlert>> {
        self.alerts_rx.take()
    }

    /// Spawn the feed and monitor tasks.
    ///
    /// `fetcher` is required for pull-snapshot venues and unused otherwise.
    ///
    /// # Errors
    ///
    /// Returns an error if the session is already open, or a pull-snapshot
    /// venue is opened without a fetcher.
    pub fn open<C: FeedCodec>(
        &mut self,
        codec: C,
        fetcher: Option<Arc<dyn SnapshotFetcher>>,
    ) -> Result<(), Error> {
        if !self.tasks.is_empty() {
            return Err(Error::Config("session already open".to_string()));
        }
        if self.config.sync_mode() == SyncMode::PullSnapshot && fetcher.is_none() {
            return Err(Error::Config(
                "pull-snapshot venue requires a snapshot fetcher".to_string(),
            ));
        }

        let connection = FeedConnection::new(
            &self.config,
            codec,
            Arc::clone(&self.manager),
            fetcher,
            self.alerts_tx.clone(),
            self.shutdown_tx.subscribe(),
            self.resync_tx.subscribe(),
            ReconnectConfig::default(),
        );
        self.tasks.push(tokio::spawn(connection.run()));

        self.tasks.push(tokio::spawn(monitor_loop(
            Arc::clone(&self.manager),
            self.config.cross_check_interval(),
            self.config.freeze_check_interval(),
            self.alerts_tx.clone(),
            self.resync_tx.clone(),
            self.shutdown_tx.subscribe(),
        )));

        Ok(())
    }

    /// Tear down the socket, reset every replica, and reconnect.
    ///
    /// Also what the session does to itself on any fatal health alert.
    pub fn force_resync(&self) {
        self.resync_tx.send_modify(|epoch| *epoch += 1);
    }

    /// Stop both tasks and wait for them to finish
    pub async fn close(&mut self) {
        let _ = self.shutdown_tx.send(true);
        for task in self.tasks.drain(..) {
            let _ = task.await;
        }
        debug!(venue = self.config.venue(), "session closed");
    }

    /// Best level of each side for a tracked symbol
    #[must_use]
    pub fn top_of_book(&self, symbol: &str) -> Option<TopOfBook> {
        self.manager.top_of_book(symbol)
    }

    /// First `n` levels of each side for a tracked symbol
    #[must_use]
    pub fn depth(&self, symbol: &str, n: usize) -> Option<Depth> {
        self.manager.depth(symbol, n)
    }

    /// Whether a symbol's replica is synchronized and trustworthy
    #[must_use]
    pub fn is_synced(&self, symbol: &str) -> bool {
        self.manager.is_synced(symbol)
    }

    /// Sync state of a symbol's replica
    #[must_use]
    pub fn state(&self, symbol: &str) -> Option<SyncState> {
        self.manager.state(symbol)
    }
}

/// Periodic health checks over one session's replicas.
///
/// Two independent cadences; each sweep holds book locks only per check,
/// never across an await. Alerts also bump the resync signal so the feed
/// connection rebuilds itself.
async fn monitor_loop(
    manager: Arc<BookManager>,
    cross_every: std::time::Duration,
    freeze_every: std::time::Duration,
    alerts: mpsc::Sender<HealthAlert>,
    resync: watch::Sender<u64>,
    mut shutdown: watch::Receiver<bool>,
) {
    let mut cross = tokio::time::interval(cross_every);
    let mut freeze = tokio::time::interval(freeze_every);
    cross.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);
    freeze.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);

    loop {
        let alerts_now = tokio::select! {
            changed = shutdown.changed() => {
                let _ = changed;
                return;
            }
            _ = cross.tick() => manager.cross_sweep(),
            _ = freeze.tick() => manager.freeze_sweep(),
        };

        for alert in alerts_now {
            warn!(
                symbol = %alert.symbol,
                kind = ?alert.kind,
                detail = %alert.detail,
                "health violation, forcing resynchronization"
            );
            resync.send_modify(|epoch| *epoch += 1);
            if alerts.try_send(alert).is_err() {
                warn!("alert channel full, dropping alert");
            }
        }
    }
}
