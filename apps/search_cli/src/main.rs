use std::{
    io::{self, Write},
    process::ExitCode,
    sync::Arc,
};

use anyhow::{Context, Result};
use clap::Parser;
use client_core::{load_settings, HttpSearchBackend, QuerySession, SessionState};
use shared::domain::Locale;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio_stream::{wrappers::WatchStream, StreamExt};
use tracing::warn;
use tracing_subscriber::EnvFilter;

mod output;

#[derive(Parser, Debug)]
#[command(name = "search", about = "Ask the Cosense RAG search API a question")]
struct Args {
    /// Base URL of the search API (overrides search.toml and environment).
    #[arg(long)]
    backend_url: Option<String>,
    #[arg(long, value_parser = parse_locale)]
    locale: Option<Locale>,
    /// Print the raw JSON response instead of formatted text.
    #[arg(long)]
    json: bool,
    /// Check the search API health endpoint and exit.
    #[arg(long)]
    health: bool,
    /// Question to ask; reads questions from stdin when omitted.
    query: Vec<String>,
}

fn parse_locale(raw: &str) -> Result<Locale, String> {
    Locale::parse(raw).ok_or_else(|| format!("unsupported locale '{raw}' (expected en or ja)"))
}

#[tokio::main]
async fn main() -> Result<ExitCode> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();
    let args = Args::parse();

    let mut settings = load_settings();
    if let Some(url) = args.backend_url {
        settings.backend_url = url;
    }
    if let Some(locale) = args.locale {
        settings.locale = locale;
    }
    let backend =
        Arc::new(HttpSearchBackend::new(&settings).context("invalid backend configuration")?);

    if args.health {
        let health = backend.health().await?;
        println!("{}", output::health_line(&health));
        return Ok(if health.is_ok() {
            ExitCode::SUCCESS
        } else {
            ExitCode::FAILURE
        });
    }

    let session = QuerySession::new(backend);
    let query = args.query.join(" ");
    if query.trim().is_empty() {
        run_interactive(session, args.json).await
    } else {
        run_once(&session, &query, args.json, &mut io::stdout(), &mut io::stderr()).await
    }
}

async fn run_once(
    session: &QuerySession,
    query: &str,
    json: bool,
    out: &mut impl Write,
    err: &mut impl Write,
) -> Result<ExitCode> {
    if session.submit(query).is_none() {
        return Ok(ExitCode::SUCCESS);
    }
    // Settlement can already have happened here; print from the input, not the state.
    writeln!(err, "{}", output::pending_line(query.trim()))?;

    let settled = session.settled().await;
    print_state(&settled, json, out, err)?;
    Ok(exit_code(&settled))
}

async fn run_interactive(session: QuerySession, json: bool) -> Result<ExitCode> {
    let mut states = WatchStream::from_changes(session.subscribe());
    let printer = tokio::spawn(async move {
        while let Some(state) = states.next().await {
            if let Err(err) = print_state(&state, json, &mut io::stdout(), &mut io::stderr()) {
                warn!("failed to print search state: {err}");
            }
        }
    });

    eprintln!("Type a question and press Enter. A new question replaces one still running. Ctrl-D quits.");
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    while let Some(line) = lines.next_line().await.context("failed to read stdin")? {
        session.submit(&line);
    }

    let last = session.settled().await;
    // Closing the session ends the state stream once the printer has caught up.
    drop(session);
    printer.await.context("state printer panicked")?;
    Ok(exit_code(&last))
}

fn print_state(
    state: &SessionState,
    json: bool,
    out: &mut impl Write,
    err: &mut impl Write,
) -> Result<()> {
    match state {
        SessionState::Idle => {}
        SessionState::Pending { query, .. } => writeln!(err, "{}", output::pending_line(query))?,
        SessionState::Success { response, .. } if json => {
            writeln!(out, "{}", serde_json::to_string_pretty(response)?)?;
        }
        SessionState::Success { response, .. } => {
            writeln!(out, "{}", output::render_response(response))?
        }
        SessionState::Failure { message, .. } => writeln!(err, "error: {message}")?,
    }
    Ok(())
}

fn exit_code(state: &SessionState) -> ExitCode {
    match state {
        SessionState::Failure { .. } => ExitCode::FAILURE,
        _ => ExitCode::SUCCESS,
    }
}
