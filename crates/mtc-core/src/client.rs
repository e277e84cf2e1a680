// ── Client: shared, scheduled session ──
//
// Wraps a `ClientSession` behind an async mutex so a background poller
// and callers can share it. Every session operation runs under that one
// lock, which keeps cycles serialized. Session notifications are
// re-published on a broadcast channel; lifecycle state on a watch channel.

use std::sync::Arc;

use tokio::sync::{Mutex, MutexGuard, broadcast, watch};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, warn};

use mtc_api::{Fetch, HttpFetcher};

use crate::config::ClientConfig;
use crate::error::CoreError;
use crate::model::DataItemSample;
use crate::notify::ChangeNotifier;
use crate::scheduler::{Scheduler, Tick, TokioScheduler};
use crate::session::{ClientSession, CycleReport, SessionState};

const EVENT_CHANNEL_SIZE: usize = 1024;

/// Session notifications as broadcast values.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionEvent {
    ProbeCompleted,
    /// A sample was appended to the item's history.
    DataItemChanged { id: String, sample: DataItemSample },
    /// A batch finished applying.
    DataItemsChanged,
}

// ── Client ───────────────────────────────────────────────────────

/// Cheaply cloneable handle to one agent session.
pub struct Client<F, S = TokioScheduler> {
    inner: Arc<ClientInner<F, S>>,
}

impl<F, S> Clone for Client<F, S> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

struct ClientInner<F, S> {
    config: ClientConfig,
    session: Arc<Mutex<ClientSession<F>>>,
    scheduler: S,
    state: watch::Sender<SessionState>,
    event_tx: broadcast::Sender<SessionEvent>,
    poller: Mutex<Option<Poller>>,
}

struct Poller {
    cancel: CancellationToken,
    handle: JoinHandle<()>,
}

impl Client<HttpFetcher> {
    /// Client that talks HTTP to `config.agent_url`.
    pub fn connect(config: ClientConfig) -> Result<Self, CoreError> {
        let fetcher = HttpFetcher::new(&config.transport())?;
        Self::new(config, fetcher)
    }
}

impl<F: Fetch> Client<F> {
    pub fn new(config: ClientConfig, fetcher: F) -> Result<Self, CoreError> {
        Self::with_scheduler(config, fetcher, TokioScheduler)
    }
}

impl<F: Fetch, S: Scheduler> Client<F, S> {
    /// Build a client around a custom fetcher and timer.
    pub fn with_scheduler(
        config: ClientConfig,
        fetcher: F,
        scheduler: S,
    ) -> Result<Self, CoreError> {
        let mut session = ClientSession::new(&config, fetcher)?;
        let (state, _) = watch::channel(session.state());
        let (event_tx, _) = broadcast::channel(EVENT_CHANNEL_SIZE);
        forward_events(session.notifier_mut(), &event_tx);

        Ok(Self {
            inner: Arc::new(ClientInner {
                config,
                session: Arc::new(Mutex::new(session)),
                scheduler,
                state,
                event_tx,
                poller: Mutex::new(None),
            }),
        })
    }

    pub fn config(&self) -> &ClientConfig {
        &self.inner.config
    }

    // ── Lifecycle ────────────────────────────────────────────────

    pub async fn probe(&self) -> Result<(), CoreError> {
        let mut session = self.inner.session.lock().await;
        let result = session.probe().await;
        self.publish_state(&session);
        result
    }

    pub async fn current(&self) -> Result<CycleReport, CoreError> {
        self.inner.session.lock().await.current().await
    }

    /// Take a `current` baseline and start polling `sample` every
    /// `update_interval`. Calling it while already streaming does nothing.
    pub async fn start_streaming(&self) -> Result<(), CoreError> {
        let mut poller = self.inner.poller.lock().await;

        let started = {
            let mut session = self.inner.session.lock().await;
            let started = session.start_streaming().await;
            self.publish_state(&session);
            started?
        };
        if !started {
            return Ok(());
        }

        if let Some(stale) = poller.take() {
            stale.cancel.cancel();
        }
        let cancel = CancellationToken::new();
        let handle = self.inner.scheduler.schedule(
            self.inner.config.update_interval,
            cancel.clone(),
            poll_tick(Arc::clone(&self.inner.session)),
        );
        *poller = Some(Poller { cancel, handle });
        Ok(())
    }

    /// Cancel the poller and return to `Probed`.
    ///
    /// A sample cycle already in flight finishes first; no tick starts
    /// afterwards. Returns `false` if the client was not streaming.
    pub async fn stop_streaming(&self) -> bool {
        let mut poller = self.inner.poller.lock().await;
        let Some(active) = poller.take() else {
            return false;
        };
        active.cancel.cancel();

        let stopped = {
            let mut session = self.inner.session.lock().await;
            let stopped = session.stop_streaming();
            self.publish_state(&session);
            stopped
        };
        drop(poller);

        if let Err(e) = active.handle.await {
            warn!(error = %e, "poll task ended abnormally");
        }
        stopped
    }

    // ── Observation ──────────────────────────────────────────────

    /// Subscribe to lifecycle state changes.
    pub fn state(&self) -> watch::Receiver<SessionState> {
        self.inner.state.subscribe()
    }

    /// Subscribe to the event broadcast stream.
    pub fn events(&self) -> broadcast::Receiver<SessionEvent> {
        self.inner.event_tx.subscribe()
    }

    /// Exclusive access to the session, e.g. to read the model or register
    /// synchronous handlers. Holding the guard delays the next tick.
    pub async fn session(&self) -> MutexGuard<'_, ClientSession<F>> {
        self.inner.session.lock().await
    }

    fn publish_state(&self, session: &ClientSession<F>) {
        self.inner.state.send_replace(session.state());
    }
}

fn forward_events(notifier: &mut ChangeNotifier, event_tx: &broadcast::Sender<SessionEvent>) {
    let tx = event_tx.clone();
    notifier.on_probe_completed(move || {
        let _ = tx.send(SessionEvent::ProbeCompleted);
    });

    let tx = event_tx.clone();
    notifier.on_data_item_changed(move |item| {
        if let Some(sample) = item.current() {
            let _ = tx.send(SessionEvent::DataItemChanged {
                id: item.id.clone(),
                sample: sample.clone(),
            });
        }
    });

    let tx = event_tx.clone();
    notifier.on_data_items_changed(move || {
        let _ = tx.send(SessionEvent::DataItemsChanged);
    });
}

fn poll_tick<F: Fetch>(session: Arc<Mutex<ClientSession<F>>>) -> Tick {
    Box::new(move || {
        let session = Arc::clone(&session);
        Box::pin(async move {
            let mut session = session.lock().await;
            match session.tick().await {
                Ok(Some(report)) => debug!(
                    cursor = report.cursor,
                    applied = report.applied,
                    "sample cycle applied"
                ),
                Ok(None) => {}
                Err(e) if e.is_recoverable() => warn!(error = %e, "sample cycle failed"),
                Err(e) => error!(error = %e, "sample cycle failed"),
            }
        })
    })
}
