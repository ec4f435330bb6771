//! Async driver around [`SessionController`] for Tokio hosts.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use shared::domain::QueryId;
use tokio::{sync::watch, task::JoinHandle};
use tracing::{debug, info};

use crate::{SearchBackend, SessionController, SessionState};

struct SessionInner {
    controller: SessionController,
    in_flight: Option<JoinHandle<()>>,
}

struct SessionShared {
    inner: Mutex<SessionInner>,
    state_tx: watch::Sender<SessionState>,
}

impl SessionShared {
    fn lock(&self) -> MutexGuard<'_, SessionInner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    // Callers hold the lock so published states follow transition order.
    fn publish(&self, inner: &SessionInner) {
        self.state_tx
            .send_replace(inner.controller.current_state().clone());
    }
}

/// Owns the session state and runs each accepted query against the backend.
///
/// Every transition is published on a watch channel. Superseded requests are
/// aborted, and any outcome that still races in is discarded by the controller.
pub struct QuerySession {
    backend: Arc<dyn SearchBackend>,
    shared: Arc<SessionShared>,
}

impl QuerySession {
    pub fn new(backend: Arc<dyn SearchBackend>) -> Self {
        let (state_tx, _) = watch::channel(SessionState::Idle);
        Self {
            backend,
            shared: Arc::new(SessionShared {
                inner: Mutex::new(SessionInner {
                    controller: SessionController::new(),
                    in_flight: None,
                }),
                state_tx,
            }),
        }
    }

    pub fn current_state(&self) -> SessionState {
        self.shared.lock().controller.current_state().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<SessionState> {
        self.shared.state_tx.subscribe()
    }

    /// Submits `raw` and returns its id, or `None` for blank input.
    ///
    /// Returns once `Pending` is published; the backend call runs on a spawned
    /// task, so this must be called from within a Tokio runtime.
    pub fn submit(&self, raw: &str) -> Option<QueryId> {
        let mut inner = self.shared.lock();
        let pending = inner.controller.submit(raw)?;
        self.shared.publish(&inner);

        let query_id = pending.query_id;
        info!(%query_id, "query submitted");

        let backend = Arc::clone(&self.backend);
        let shared = Arc::clone(&self.shared);
        let task = tokio::spawn(async move {
            let outcome = backend.query(&pending.query).await;
            let mut inner = shared.lock();
            if inner.controller.settle(query_id, outcome) {
                shared.publish(&inner);
                inner.in_flight = None;
                info!(
                    %query_id,
                    state = inner.controller.current_state().label(),
                    "query settled"
                );
            }
        });

        if let Some(previous) = inner.in_flight.replace(task) {
            previous.abort();
            debug!(%query_id, "aborted superseded request");
        }

        Some(query_id)
    }

    /// Waits until the session is no longer pending and returns that state.
    pub async fn settled(&self) -> SessionState {
        let mut rx = self.subscribe();
        let settled = rx
            .wait_for(|state| !state.is_pending())
            .await
            .map(|state| state.clone());
        settled.unwrap_or_else(|_| self.current_state())
    }
}

impl Drop for QuerySession {
    fn drop(&mut self) {
        if let Some(task) = self.shared.lock().in_flight.take() {
            task.abort();
        }
    }
}

#[cfg(test)]
#[path = "tests/query_session_tests.rs"]
mod tests;
