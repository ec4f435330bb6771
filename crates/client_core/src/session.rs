//! Single-owner query lifecycle state machine.
//!
//! The controller tracks exactly one authoritative query. Every accepted
//! submission allocates a fresh [`QueryId`]; a settlement is applied only when
//! the session is still pending on that same id, so a slow response can never
//! overwrite the outcome of a newer query.

use shared::{domain::QueryId, protocol::QueryResponse};
use tracing::debug;

use crate::SearchError;

#[derive(Debug, Clone, PartialEq, Default)]
pub enum SessionState {
    #[default]
    Idle,
    Pending {
        query_id: QueryId,
        query: String,
    },
    Success {
        query_id: QueryId,
        response: QueryResponse,
    },
    Failure {
        query_id: QueryId,
        message: String,
    },
}

impl SessionState {
    pub fn is_pending(&self) -> bool {
        matches!(self, Self::Pending { .. })
    }

    pub fn query_id(&self) -> Option<QueryId> {
        match self {
            Self::Idle => None,
            Self::Pending { query_id, .. }
            | Self::Success { query_id, .. }
            | Self::Failure { query_id, .. } => Some(*query_id),
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::Pending { .. } => "pending",
            Self::Success { .. } => "success",
            Self::Failure { .. } => "failure",
        }
    }
}

/// A submission accepted by [`SessionController::submit`] that the caller must run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PendingQuery {
    pub query_id: QueryId,
    pub query: String,
}

#[derive(Debug, Default)]
pub struct SessionController {
    state: SessionState,
    last_query_id: Option<QueryId>,
}

impl SessionController {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn current_state(&self) -> &SessionState {
        &self.state
    }

    pub fn last_query_id(&self) -> Option<QueryId> {
        self.last_query_id
    }

    /// Accepts `raw` unless it is blank, moving straight to `Pending`.
    pub fn submit(&mut self, raw: &str) -> Option<PendingQuery> {
        let query = raw.trim();
        if query.is_empty() {
            debug!(state = self.state.label(), "ignoring blank query");
            return None;
        }

        let query_id = self
            .last_query_id
            .map(QueryId::next)
            .unwrap_or(QueryId(1));
        self.last_query_id = Some(query_id);

        if let Some(superseded) = self.state.query_id().filter(|_| self.state.is_pending()) {
            debug!(%superseded, %query_id, "superseding in-flight query");
        }

        self.state = SessionState::Pending {
            query_id,
            query: query.to_string(),
        };

        Some(PendingQuery {
            query_id,
            query: query.to_string(),
        })
    }

    /// Applies the outcome of `query_id` if it is still the pending query.
    ///
    /// Returns `false` when the outcome was stale and has been discarded.
    pub fn settle(
        &mut self,
        query_id: QueryId,
        outcome: Result<QueryResponse, SearchError>,
    ) -> bool {
        match &self.state {
            SessionState::Pending {
                query_id: pending, ..
            } if *pending == query_id => {}
            _ => {
                debug!(
                    %query_id,
                    state = self.state.label(),
                    "discarding stale query outcome"
                );
                return false;
            }
        }

        self.state = match outcome {
            Ok(response) => SessionState::Success { query_id, response },
            Err(err) => SessionState::Failure {
                query_id,
                message: err.to_string(),
            },
        };
        true
    }
}

#[cfg(test)]
#[path = "tests/session_tests.rs"]
mod tests;
