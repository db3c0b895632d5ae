mod api;

use std::{
    net::{IpAddr, SocketAddr},
    sync::Arc,
};

use clap::Parser;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

use konspekt_core::{GenAiClient, Processor, ResultCache, Settings, TranscriptFetcher};

#[derive(Parser)]
#[command(name = "konspekt-server")]
#[command(about = "Turn YouTube videos and transcripts into summaries, key points, and quizzes")]
struct Cli {
    /// Address to listen on
    #[arg(long, default_value = "127.0.0.1")]
    host: IpAddr,

    /// Port to listen on
    #[arg(long, default_value_t = 8080)]
    port: u16,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();
    let settings = Settings::from_env();

    let cache = Arc::new(ResultCache::new(settings.cache_ttl));
    cache.spawn_sweeper(settings.sweep_interval);

    let generator = Arc::new(GenAiClient::new(&settings));
    let fetcher = Arc::new(TranscriptFetcher::default());
    let processor = Processor::new(cache, generator, fetcher);

    let api_key_configured = settings.provider.api_key_configured();
    if !api_key_configured {
        warn!(
            provider = settings.provider.name(),
            "no API key configured, generation requests will fail"
        );
    }

    let state = Arc::new(api::AppState {
        processor,
        model: settings.resolved_model(),
        api_key_configured,
        production: settings.production,
    });

    let app = api::router(state);
    let addr = SocketAddr::from((cli.host, cli.port));
    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!(%addr, provider = settings.provider.name(), "konspekt-server listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    Ok(())
}

async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        error!("failed to install Ctrl+C handler: {err}");
    }
    info!("shutting down");
}
