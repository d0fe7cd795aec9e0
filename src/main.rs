//! AdPilot - Marketing Campaign Intelligence Service
//!
//! Trains a conversion-rate model on the historical campaign dataset at
//! startup, then serves budget-allocation and A/B-test recommendations
//! over HTTP.
//!
//! # Usage
//!
//! ```bash
//! # Run with the default config and dataset
//! cargo run --release
//!
//! # Point at a specific dataset and pin the candidate sampling
//! cargo run --release -- --csv data/campaign.csv --seed 42
//! ```
//!
//! # Environment Variables
//!
//! - `ADPILOT_CONFIG`: path to a TOML config file
//! - `ADPILOT_SEARCH_API_KEY`: search provider API key (overrides config)
//! - `ADPILOT_CORS_ORIGINS`: comma-separated allowed CORS origins
//! - `RUST_LOG`: logging level (default: info)

use anyhow::{Context, Result};
use clap::Parser;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::RwLock;
use tokio_util::sync::CancellationToken;
use tracing::info;

use adpilot::ab_engine::{self, ConversionEstimator, FeatureEncoder};
use adpilot::allocation::{AllocationOrchestrator, ChainSettings};
use adpilot::api::{create_app, ApiState};
use adpilot::config::{self, AppConfig};
use adpilot::ingest::load_campaign_csv;
use adpilot::llm::{Exclusive, HttpCompletionBackend, LlmBackend};
use adpilot::search::TavilyClient;

// ============================================================================
// CLI Arguments
// ============================================================================

#[derive(Parser, Debug)]
#[command(name = "adpilot")]
#[command(about = "AdPilot Marketing Campaign Intelligence Service")]
#[command(version)]
struct CliArgs {
    /// Override the server bind address (default from config)
    #[arg(short, long)]
    addr: Option<String>,

    /// Path to the historical campaign CSV (default from config)
    #[arg(long)]
    csv: Option<String>,

    /// Path to a TOML config file (overrides ADPILOT_CONFIG)
    #[arg(long)]
    config: Option<String>,

    /// Pin the candidate-sampling RNG for reproducible recommendations
    #[arg(long)]
    seed: Option<u64>,
}

// ============================================================================
// Main Entry Point
// ============================================================================

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_target(false)
        .init();

    let args = CliArgs::parse();

    // Load application configuration. An explicitly requested file that
    // fails to load is fatal; the implicit lookup falls back to defaults.
    let mut app_config = match &args.config {
        Some(path) => AppConfig::load_from_file(Path::new(path))
            .with_context(|| format!("failed to load config from {path}"))?,
        None => AppConfig::load(),
    };
    if let Some(addr) = args.addr {
        app_config.server.addr = addr;
    }
    if let Some(csv) = args.csv {
        app_config.data.csv_path = csv;
    }
    if args.seed.is_some() {
        app_config.abtest.seed = args.seed;
    }
    let seed = app_config.abtest.seed;
    config::init(app_config);
    let cfg = config::get();

    info!("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━");
    info!("  AdPilot - Marketing Campaign Intelligence Service");
    info!("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━");
    info!("");

    // Historical dataset + model training (once, at startup)
    let (records, report) = load_campaign_csv(Path::new(&cfg.data.csv_path))
        .with_context(|| format!("failed to ingest {}", cfg.data.csv_path))?;
    info!(
        "📊 {} historical campaigns loaded ({} skipped)",
        report.loaded,
        report.skipped_malformed + report.skipped_out_of_range
    );

    let encoder = Arc::new(FeatureEncoder::fit(&records));
    let (rows, rates) = ab_engine::encode_training_data(&records, &encoder)
        .context("historical data failed to encode against its own encoder")?;
    let estimator =
        Arc::new(ConversionEstimator::fit(&rows, &rates).context("estimator training failed")?);
    let diagnostics = Arc::new(estimator.diagnostics().clone());

    // External collaborators, constructed once and injected
    let search = Arc::new(TavilyClient::new(
        &cfg.search.base_url,
        &cfg.search.api_key,
        Duration::from_secs(cfg.search.query_timeout_secs + 5),
    )?);
    let backend = HttpCompletionBackend::new(
        &cfg.llm.base_url,
        &cfg.llm.model,
        Duration::from_secs(120),
    )?;
    let llm: Arc<dyn LlmBackend> = if cfg.llm.exclusive {
        Arc::new(Exclusive::new(backend))
    } else {
        Arc::new(backend)
    };
    info!(
        "🤖 Generative backend: {} at {} (exclusive: {})",
        cfg.llm.model, cfg.llm.base_url, cfg.llm.exclusive
    );

    let orchestrator = Arc::new(AllocationOrchestrator::new(
        search,
        llm.clone(),
        ChainSettings {
            query_timeout: Duration::from_secs(cfg.search.query_timeout_secs),
            max_attempts: cfg.search.max_attempts,
            prediction_max_tokens: cfg.llm.max_tokens,
            temperature: cfg.llm.temperature,
        },
    ));

    let historical_count = records.len();
    let state = ApiState {
        records: Arc::new(RwLock::new(records)),
        historical_count,
        encoder,
        predictor: estimator,
        diagnostics,
        orchestrator,
        llm,
        candidate_count: cfg.abtest.candidate_count,
        seed,
        insights_max_tokens: cfg.llm.insights_max_tokens,
        temperature: cfg.llm.temperature,
    };

    // Graceful shutdown via Ctrl+C
    let cancel_token = CancellationToken::new();
    let shutdown_token = cancel_token.clone();
    tokio::spawn(async move {
        tokio::signal::ctrl_c().await.ok();
        info!("🛑 Received Ctrl+C, initiating shutdown...");
        shutdown_token.cancel();
    });

    let app = create_app(state);
    let listener = tokio::net::TcpListener::bind(&cfg.server.addr)
        .await
        .with_context(|| format!("failed to bind {}", cfg.server.addr))?;
    info!("🌐 API listening on http://{}", cfg.server.addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(async move { cancel_token.cancelled().await })
        .await
        .context("server error")?;

    info!("");
    info!("✓ AdPilot shutdown complete");
    Ok(())
}
