//! CLI entrypoint for chatrelay
//!
//! This is the main binary that wires together all layers using
//! dependency injection.

use anyhow::{Context, Result, anyhow, bail};
use chatrelay_application::{
    RelayGenerationUseCase, RelayInput, SessionRegistry, StopGenerationUseCase,
};
use chatrelay_domain::{SessionId, TerminalReason};
use chatrelay_infrastructure::{
    ConfigLoader, FileConfig, JsonlTranscriptStore, OllamaBackend, OllamaSettings,
};
use chatrelay_presentation::{AppState, Cli, Command, ConsoleSink, create_router};
use clap::Parser;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize logging based on verbosity level; RUST_LOG wins when set
    let level = match cli.verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace", // -vvv or more
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    // Logs go to stderr; stdout carries generated text for `ask`
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    if cli.show_config {
        ConfigLoader::print_config_sources(cli.config.as_ref());
        return Ok(());
    }

    let config = if cli.no_config {
        ConfigLoader::load_defaults()
    } else {
        ConfigLoader::load(cli.config.as_ref())
            .map_err(|e| anyhow!("Failed to load configuration: {}", e))?
    };
    config.validate().context("Invalid configuration")?;

    let Some(command) = cli.command else {
        bail!("No command given. Try `chatrelay serve` or `chatrelay ask <PROMPT>`.");
    };

    // === Dependency Injection ===
    let relay = build_relay(&config).await?;

    match command {
        Command::Serve { bind } => serve(relay, &config, bind).await,
        Command::Ask { prompt, session } => ask(relay, prompt, session).await,
    }
}

async fn build_relay(config: &FileConfig) -> Result<RelayGenerationUseCase> {
    let backend = OllamaBackend::new(OllamaSettings {
        url: config.backend.url.clone(),
        model: config.backend.model.clone(),
        options: config.backend.options.clone(),
        connect_timeout: Duration::from_secs(config.backend.connect_timeout_seconds),
    })
    .context("Failed to create backend client")?;

    let mut relay =
        RelayGenerationUseCase::new(Arc::new(backend), Arc::new(SessionRegistry::new()))
            .with_markers(config.markers.to_markers()?);

    if let Some(dir) = &config.storage.transcript_dir {
        let store = JsonlTranscriptStore::open(dir)
            .await
            .with_context(|| format!("Failed to open transcript store {}", dir.display()))?;
        relay = relay.with_transcript_store(Arc::new(store));
    }

    info!(
        url = %config.backend.url,
        model = %config.backend.model,
        persistence = config.storage.transcript_dir.is_some(),
        "Relay ready"
    );
    Ok(relay)
}

async fn serve(
    relay: RelayGenerationUseCase,
    config: &FileConfig,
    bind: Option<String>,
) -> Result<()> {
    let bind = bind.unwrap_or_else(|| config.server.bind.clone());
    let addr: SocketAddr = bind
        .parse()
        .with_context(|| format!("Invalid listen address: {}", bind))?;

    let state = AppState::new(relay, config.server.channel_capacity);
    let stop = state.stop.clone();
    let app = create_router(state, config.server.cors);

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind {}", addr))?;
    info!("Listening on http://{}", listener.local_addr()?);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal(stop))
        .await?;

    info!("Server stopped");
    Ok(())
}

/// Resolve on Ctrl-C after stopping every active generation, so open
/// responses end with their `cancelled` marker instead of being cut off.
async fn shutdown_signal(stop: StopGenerationUseCase) {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!("Failed to listen for Ctrl-C: {}", e);
        std::future::pending::<()>().await;
    }
    info!("Shutting down");
    stop.stop_all();
}

async fn ask(relay: RelayGenerationUseCase, prompt: String, session: String) -> Result<()> {
    let session_id = SessionId::parse(session)?;
    let stop = StopGenerationUseCase::new(Arc::clone(relay.registry()));
    let generation = relay.start(RelayInput::new(session_id.clone(), prompt))?;

    let run = generation.run(Box::new(ConsoleSink::stdout()));
    tokio::pin!(run);

    let mut interrupted = false;
    let outcome = loop {
        tokio::select! {
            outcome = &mut run => break outcome,
            signal = tokio::signal::ctrl_c(), if !interrupted => {
                interrupted = true;
                match signal {
                    Ok(()) => {
                        stop.execute(&session_id);
                    }
                    Err(e) => warn!("Failed to listen for Ctrl-C: {}", e),
                }
            }
        }
    };

    if outcome.reason == TerminalReason::Failed {
        bail!("Generation failed for session {}", outcome.session_id);
    }
    Ok(())
}
