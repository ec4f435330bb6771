//! UI/backend events and error modeling for the search GUI controller.

use client_core::SearchError;
use shared::{
    domain::QueryId,
    protocol::{HealthResponse, QueryResponse},
};

pub enum UiEvent {
    Info(String),
    QuerySettled {
        query_id: QueryId,
        outcome: Result<QueryResponse, SearchError>,
    },
    HealthChecked(HealthResponse),
    Error(UiError),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UiErrorContext {
    BackendStartup,
    Configuration,
    HealthCheck,
}

#[derive(Debug, Clone)]
pub struct UiError {
    context: UiErrorContext,
    message: String,
}

impl UiError {
    pub fn from_message(context: UiErrorContext, message: impl Into<String>) -> Self {
        Self {
            context,
            message: message.into(),
        }
    }

    pub fn context(&self) -> UiErrorContext {
        self.context
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub fn headline(&self) -> String {
        let prefix = match self.context {
            UiErrorContext::BackendStartup => "Backend worker failed to start",
            UiErrorContext::Configuration => "Invalid backend configuration",
            UiErrorContext::HealthCheck => "Server check failed",
        };
        format!("{prefix}: {}", self.message)
    }
}
