//! Runtime bridge between UI command queue and backend event intake.

use std::{sync::Arc, thread};

use client_core::{HttpSearchBackend, SearchBackend, SearchError, Settings};
use crossbeam_channel::{Receiver, Sender, TrySendError};
use tokio::task::JoinHandle;

use crate::backend_bridge::commands::BackendCommand;
use crate::controller::events::{UiError, UiErrorContext, UiEvent};

pub fn launch(cmd_rx: Receiver<BackendCommand>, ui_tx: Sender<UiEvent>, settings: Settings) {
    thread::spawn(move || {
        let runtime = match tokio::runtime::Builder::new_multi_thread()
            .enable_all()
            .build()
        {
            Ok(runtime) => runtime,
            Err(err) => {
                let _ = ui_tx.try_send(UiEvent::Error(UiError::from_message(
                    UiErrorContext::BackendStartup,
                    format!("failed to build runtime: {err}"),
                )));
                tracing::error!("failed to build backend runtime: {err}");
                return;
            }
        };

        runtime.block_on(run_worker(cmd_rx, ui_tx, settings));
    });
}

async fn run_worker(cmd_rx: Receiver<BackendCommand>, ui_tx: Sender<UiEvent>, settings: Settings) {
    let mut backend = connect(&settings, &ui_tx);
    let mut locale = settings.locale;
    let mut in_flight: Option<JoinHandle<()>> = None;

    while let Ok(cmd) = cmd_rx.recv() {
        match cmd {
            BackendCommand::Configure {
                backend_url,
                locale: new_locale,
            } => {
                backend = connect(
                    &Settings {
                        backend_url,
                        locale: new_locale,
                    },
                    &ui_tx,
                );
                locale = new_locale;
            }
            BackendCommand::RunQuery { query_id, query } => {
                let Some(backend) = backend.clone() else {
                    let outcome = Err(SearchError::network_or_server(
                        locale,
                        Some("no valid backend URL configured"),
                    ));
                    deliver(&ui_tx, UiEvent::QuerySettled { query_id, outcome }).await;
                    continue;
                };
                let ui_tx = ui_tx.clone();
                let task = tokio::spawn(async move {
                    let outcome = backend.query(&query).await;
                    deliver(&ui_tx, UiEvent::QuerySettled { query_id, outcome }).await;
                });
                // The UI session discards stale outcomes; aborting just frees the connection.
                if let Some(previous) = in_flight.replace(task) {
                    previous.abort();
                }
            }
            BackendCommand::CheckHealth => {
                let Some(backend) = backend.clone() else {
                    continue;
                };
                let ui_tx = ui_tx.clone();
                tokio::spawn(async move {
                    let event = match backend.health().await {
                        Ok(health) => UiEvent::HealthChecked(health),
                        Err(err) => UiEvent::Error(UiError::from_message(
                            UiErrorContext::HealthCheck,
                            format!("{err:#}"),
                        )),
                    };
                    deliver(&ui_tx, event).await;
                });
            }
        }
    }

    tracing::info!("ui command queue closed; backend worker exiting");
}

/// Queues `event` for the UI; a full queue is waited on from the blocking pool
/// so runtime workers keep serving other requests.
async fn deliver(ui_tx: &Sender<UiEvent>, event: UiEvent) {
    match ui_tx.try_send(event) {
        Ok(()) => {}
        Err(TrySendError::Full(event)) => {
            let ui_tx = ui_tx.clone();
            let sent = tokio::task::spawn_blocking(move || ui_tx.send(event).is_ok()).await;
            if !matches!(sent, Ok(true)) {
                tracing::debug!("ui closed before a queued event was delivered");
            }
        }
        Err(TrySendError::Disconnected(_)) => {
            tracing::debug!("ui closed; dropping backend event");
        }
    }
}

fn connect(settings: &Settings, ui_tx: &Sender<UiEvent>) -> Option<Arc<HttpSearchBackend>> {
    match HttpSearchBackend::new(settings) {
        Ok(backend) => {
            tracing::info!(url = %backend.query_url(), "search backend configured");
            let _ = ui_tx.try_send(UiEvent::Info(format!(
                "Using search API at {}",
                settings.backend_url
            )));
            Some(Arc::new(backend))
        }
        Err(err) => {
            tracing::warn!("rejected backend configuration: {err}");
            let _ = ui_tx.try_send(UiEvent::Error(UiError::from_message(
                UiErrorContext::Configuration,
                err.to_string(),
            )));
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::{Duration, Instant};

    use axum::{routing::post, Json, Router};
    use crossbeam_channel::bounded;
    use shared::{
        domain::{Locale, QueryId},
        protocol::{QueryRequest, QueryResponse},
    };

    async fn answer_with_query(Json(request): Json<QueryRequest>) -> Json<QueryResponse> {
        if request.query == "slow" {
            tokio::time::sleep(Duration::from_millis(300)).await;
        }
        Json(QueryResponse {
            answer: request.query,
            results: Vec::new(),
        })
    }

    fn settled_queries(ui_rx: &Receiver<UiEvent>, window: Duration) -> Vec<(QueryId, String)> {
        let deadline = Instant::now() + window;
        let mut settled = Vec::new();
        while let Ok(event) = ui_rx.recv_deadline(deadline) {
            if let UiEvent::QuerySettled { query_id, outcome } = event {
                let text = match outcome {
                    Ok(response) => response.answer,
                    Err(err) => err.message().to_string(),
                };
                settled.push((query_id, text));
            }
        }
        settled
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn superseded_query_is_aborted_before_it_settles() {
        std::env::set_var("NO_PROXY", "127.0.0.1,localhost");
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("bind");
        let addr = listener.local_addr().expect("local addr");
        tokio::spawn(async move {
            let app = Router::new().route("/query", post(answer_with_query));
            let _ = axum::serve(listener, app).await;
        });

        let (cmd_tx, cmd_rx) = bounded(8);
        let (ui_tx, ui_rx) = bounded(8);
        launch(
            cmd_rx,
            ui_tx,
            Settings {
                backend_url: format!("http://{addr}"),
                locale: Locale::En,
            },
        );

        for (id, query) in [(1, "slow"), (2, "fast")] {
            cmd_tx
                .send(BackendCommand::RunQuery {
                    query_id: QueryId(id),
                    query: query.to_string(),
                })
                .expect("worker running");
        }

        let settled = tokio::task::spawn_blocking(move || {
            settled_queries(&ui_rx, Duration::from_millis(900))
        })
        .await
        .expect("collector");

        assert_eq!(settled, vec![(QueryId(2), "fast".to_string())]);
    }

    #[tokio::test(flavor = "current_thread")]
    async fn full_ui_queue_does_not_park_the_runtime() {
        let (ui_tx, ui_rx) = bounded(1);
        ui_tx
            .send(UiEvent::Info("first".to_string()))
            .expect("room for one");

        let waiting = tokio::spawn({
            let ui_tx = ui_tx.clone();
            async move { deliver(&ui_tx, UiEvent::Info("second".to_string())).await }
        });
        tokio::task::yield_now().await;

        let ticked = tokio::spawn(async { 7 }).await.expect("runtime still schedules");
        assert_eq!(ticked, 7);

        assert!(matches!(ui_rx.recv(), Ok(UiEvent::Info(message)) if message == "first"));
        waiting.await.expect("delivered");
        assert!(matches!(ui_rx.recv(), Ok(UiEvent::Info(message)) if message == "second"));
    }
}
