//! Backend commands queued from UI to backend worker.

use shared::domain::{Locale, QueryId};

pub enum BackendCommand {
    Configure { backend_url: String, locale: Locale },
    RunQuery { query_id: QueryId, query: String },
    CheckHealth,
}

impl BackendCommand {
    pub fn name(&self) -> &'static str {
        match self {
            BackendCommand::Configure { .. } => "configure",
            BackendCommand::RunQuery { .. } => "run_query",
            BackendCommand::CheckHealth => "check_health",
        }
    }
}
