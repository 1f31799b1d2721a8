// Polling engine: one self-chaining tick loop per session.
// A tick fetches /varz, derives rates against the previous snapshot,
// broadcasts the result, then sleeps the poll interval. The next tick is
// scheduled only after the current one resolves, so a slow endpoint
// throttles the cadence instead of stacking requests.

use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use tokio::sync::{broadcast, oneshot};

use crate::models::{FailureKind, MonitorEvent, MonitorFailure, SampleHistory, derive_stats};
use crate::varz_repo::VarzRepo;

/// Whether a poll session is live.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PollState {
    Idle,
    Polling,
}

#[derive(Debug, Clone)]
pub struct MonitorConfig {
    /// Fixed delay between a tick completing and the next one starting.
    pub poll_interval_ms: u64,
    /// Event channel depth; slow subscribers may lag and skip.
    pub broadcast_capacity: usize,
}

/// The rate-derivation engine. Owns the event channel and the session
/// lifecycle; the per-session tokio task owns the sample history.
pub struct Monitor {
    repo: Arc<VarzRepo>,
    events_tx: broadcast::Sender<MonitorEvent>,
    poll_interval: Duration,
    inner: Arc<Mutex<Inner>>,
}

struct Inner {
    target: String,
    state: PollState,
    session: Option<Session>,
    /// Bumped on every start. A tick completion compares against it before
    /// emitting or touching state, so a stopped session's in-flight result
    /// is discarded instead of surfacing late.
    generation: u64,
}

struct Session {
    stop_tx: oneshot::Sender<()>,
}

impl Monitor {
    pub fn new(repo: VarzRepo, config: MonitorConfig) -> Self {
        let (events_tx, _) = broadcast::channel(config.broadcast_capacity);
        Self {
            repo: Arc::new(repo),
            events_tx,
            poll_interval: Duration::from_millis(config.poll_interval_ms),
            inner: Arc::new(Mutex::new(Inner {
                target: String::new(),
                state: PollState::Idle,
                session: None,
                generation: 0,
            })),
        }
    }

    /// Subscribe to stats/failure events from subscription time onward.
    pub fn subscribe(&self) -> broadcast::Receiver<MonitorEvent> {
        self.events_tx.subscribe()
    }

    /// Point the engine at a server's monitoring base URL. Takes effect at
    /// the next `start`.
    pub fn configure_target(&self, url: &str) {
        lock(&self.inner).target = url.trim().to_string();
    }

    pub fn target(&self) -> String {
        lock(&self.inner).target.clone()
    }

    pub fn poll_state(&self) -> PollState {
        lock(&self.inner).state
    }

    /// Idle -> Polling. Spawns the session task; at most one session exists
    /// at any instant. No-op (false) while already polling or when no
    /// target is configured. Must be called within a tokio runtime.
    pub fn start(&self) -> bool {
        let mut inner = lock(&self.inner);
        if inner.state == PollState::Polling || inner.target.is_empty() {
            return false;
        }

        inner.generation += 1;
        let (stop_tx, stop_rx) = oneshot::channel();
        let session = SessionCtx {
            repo: Arc::clone(&self.repo),
            events_tx: self.events_tx.clone(),
            inner: Arc::clone(&self.inner),
            target: inner.target.clone(),
            poll_interval: self.poll_interval,
            generation: inner.generation,
        };
        inner.state = PollState::Polling;
        inner.session = Some(Session { stop_tx });
        tokio::spawn(session.run(stop_rx));
        true
    }

    /// Polling -> Idle. Cancels the pending scheduled tick; an in-flight
    /// fetch is abandoned and its result discarded.
    pub fn stop(&self) {
        let mut inner = lock(&self.inner);
        inner.state = PollState::Idle;
        if let Some(session) = inner.session.take() {
            let _ = session.stop_tx.send(());
        }
    }
}

impl Drop for Monitor {
    fn drop(&mut self) {
        self.stop();
    }
}

/// Everything one session task needs; moves into the spawned task.
struct SessionCtx {
    repo: Arc<VarzRepo>,
    events_tx: broadcast::Sender<MonitorEvent>,
    inner: Arc<Mutex<Inner>>,
    target: String,
    poll_interval: Duration,
    generation: u64,
}

impl SessionCtx {
    async fn run(self, mut stop_rx: oneshot::Receiver<()>) {
        let mut history = SampleHistory::default();
        tracing::debug!(url = %self.target, "poll session started");

        loop {
            let fetched = tokio::select! {
                result = self.repo.fetch_varz(&self.target) => result,
                _ = &mut stop_rx => break,
            };

            // A stop that raced the fetch wins; the result is discarded.
            if !self.is_current() {
                break;
            }

            let failure = match fetched {
                Ok(varz) => match derive_stats(history.current(), &varz) {
                    Ok(stats) => {
                        history.advance(varz);
                        let _ = self.events_tx.send(MonitorEvent::Stats(stats));
                        None
                    }
                    Err(e) => Some(MonitorFailure {
                        kind: FailureKind::Other,
                        detail: format!("bad server timestamp: {e}"),
                    }),
                },
                Err(e) => Some(MonitorFailure {
                    kind: e.kind(),
                    detail: e.to_string(),
                }),
            };

            if let Some(failure) = failure {
                // Halt on first failure; no retry within a session. Resuming
                // takes an explicit start(). Bounded backoff would slot in here.
                if self.halt() {
                    tracing::warn!(
                        kind = ?failure.kind,
                        detail = %failure.detail,
                        "polling halted"
                    );
                    let _ = self.events_tx.send(MonitorEvent::Failed(failure));
                }
                break;
            }

            tokio::select! {
                _ = tokio::time::sleep(self.poll_interval) => {}
                _ = &mut stop_rx => break,
            }
        }

        tracing::debug!(url = %self.target, "poll session ended");
    }

    /// True while this session is still the one the engine owns.
    fn is_current(&self) -> bool {
        let inner = lock(&self.inner);
        inner.state == PollState::Polling && inner.generation == self.generation
    }

    /// Tick failure: Polling -> Idle, releasing the session slot. False when
    /// a stop or a newer session already took over.
    fn halt(&self) -> bool {
        let mut inner = lock(&self.inner);
        if inner.state == PollState::Polling && inner.generation == self.generation {
            inner.state = PollState::Idle;
            inner.session = None;
            true
        } else {
            false
        }
    }
}

fn lock(inner: &Arc<Mutex<Inner>>) -> MutexGuard<'_, Inner> {
    inner.lock().unwrap_or_else(|e| e.into_inner())
}
