//! Reducer-like transitions from UI actions and backend settlements onto the search session.

use client_core::{
    markdown::{self, DisplayTree},
    SearchError, SessionController, SessionState,
};
use crossbeam_channel::Sender;
use shared::{
    domain::{Locale, QueryId},
    protocol::QueryResponse,
};

use crate::backend_bridge::commands::BackendCommand;
use crate::controller::orchestration::dispatch_backend_command;

pub struct SearchController {
    session: SessionController,
    cmd_tx: Sender<BackendCommand>,
    locale: Locale,
    rendered_answer: Option<(QueryId, DisplayTree)>,
}

impl SearchController {
    pub fn new(cmd_tx: Sender<BackendCommand>, locale: Locale) -> Self {
        Self {
            session: SessionController::new(),
            cmd_tx,
            locale,
            rendered_answer: None,
        }
    }

    pub fn state(&self) -> &SessionState {
        self.session.current_state()
    }

    pub fn is_pending(&self) -> bool {
        self.state().is_pending()
    }

    pub fn set_locale(&mut self, locale: Locale) {
        self.locale = locale;
    }

    /// Starts a query for `raw`; blank input changes nothing.
    pub fn submit(&mut self, raw: &str, status: &mut String) -> Option<QueryId> {
        let pending = self.session.submit(raw)?;
        let query_id = pending.query_id;

        let queued = dispatch_backend_command(
            &self.cmd_tx,
            BackendCommand::RunQuery {
                query_id,
                query: pending.query,
            },
            status,
        );
        if !queued {
            // Nothing will ever settle this query, so fail it now.
            let err = SearchError::network_or_server(self.locale, Some(status.as_str()));
            self.apply_settlement(query_id, Err(err));
        }

        Some(query_id)
    }

    /// Feeds a backend outcome into the session; stale outcomes return `false`.
    pub fn apply_settlement(
        &mut self,
        query_id: QueryId,
        outcome: Result<QueryResponse, SearchError>,
    ) -> bool {
        if !self.session.settle(query_id, outcome) {
            tracing::debug!(%query_id, "ignored stale settlement");
            return false;
        }

        self.rendered_answer = match self.session.current_state() {
            SessionState::Success { query_id, response } => {
                Some((*query_id, markdown::render(&response.answer)))
            }
            _ => None,
        };
        true
    }

    /// Rendered answer of the current `Success` state, if any.
    pub fn rendered_answer(&self) -> Option<&DisplayTree> {
        match (self.session.current_state(), &self.rendered_answer) {
            (SessionState::Success { query_id, .. }, Some((rendered_id, tree)))
                if query_id == rendered_id =>
            {
                Some(tree)
            }
            _ => None,
        }
    }
}
