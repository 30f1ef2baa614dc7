//! Loupe CLI — turn a folder of interview transcripts into a UX research
//! report.

mod render;

use clap::Parser;
use loupe_core::report::{ReportConfig, ReportRenderer};
use std::path::PathBuf;
use tokio_util::sync::CancellationToken;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, Layer};

/// Loupe: automated first-pass synthesis of qualitative UX interviews
#[derive(Parser, Debug)]
#[command(name = "loupe", version, about, long_about = None)]
struct Cli {
    /// Interview transcript files (plain text, one interview per file)
    #[arg(required = true)]
    transcripts: Vec<PathBuf>,

    /// Research brief file
    #[arg(short, long)]
    brief: Option<PathBuf>,

    /// Output path for the HTML report
    #[arg(short, long, default_value = "report.html")]
    out: PathBuf,

    /// Also write the raw analysis bundle as JSON
    #[arg(long)]
    json: Option<PathBuf>,

    /// LLM model to use
    #[arg(short, long)]
    model: Option<String>,

    /// Configuration file path
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Disable the LLM response cache for this run
    #[arg(long)]
    no_cache: bool,

    /// Increase verbosity (-v, -vv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Suppress non-essential output
    #[arg(short, long)]
    quiet: bool,
}

fn init_tracing(cli: &Cli) -> tracing_appender::non_blocking::WorkerGuard {
    let filter = match cli.verbose {
        0 if cli.quiet => "error",
        0 => "info",
        1 => "debug",
        _ => "trace",
    };

    // Human-readable layer for stderr (always active)
    let stderr_layer = tracing_subscriber::fmt::layer()
        .with_target(false)
        .with_filter(EnvFilter::new(filter));

    // JSON file layer for structured logging
    let log_dir = directories::ProjectDirs::from("", "", "loupe")
        .map(|d| d.data_dir().join("logs"))
        .unwrap_or_else(|| PathBuf::from("."));
    let _ = std::fs::create_dir_all(&log_dir);
    let file_appender = tracing_appender::rolling::daily(&log_dir, "loupe.log");
    let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);
    let json_layer = tracing_subscriber::fmt::layer()
        .json()
        .with_writer(non_blocking)
        .with_filter(EnvFilter::new("debug"));

    tracing_subscriber::registry()
        .with(stderr_layer)
        .with(json_layer)
        .init();
    guard
}

fn read_transcripts(paths: &[PathBuf]) -> anyhow::Result<Vec<String>> {
    let mut transcripts = Vec::with_capacity(paths.len());
    for path in paths {
        let text = std::fs::read_to_string(path)
            .map_err(|e| anyhow::anyhow!("cannot read transcript {}: {e}", path.display()))?;
        if text.trim().is_empty() {
            tracing::warn!(path = %path.display(), "transcript file is empty");
        }
        transcripts.push(text);
    }
    Ok(transcripts)
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env file if present
    let _ = dotenvy::dotenv();

    let cli = Cli::parse();
    let _log_guard = init_tracing(&cli);

    let mut config = loupe_core::load_config(cli.config.as_deref())
        .map_err(|e| anyhow::anyhow!("Configuration error: {e}"))?;

    // Apply CLI overrides
    if let Some(model) = &cli.model {
        config.model = model.clone();
    }
    if cli.no_cache {
        config.cache.enabled = false;
    }

    let transcripts = read_transcripts(&cli.transcripts)?;
    let brief_text = match &cli.brief {
        Some(path) => Some(std::fs::read_to_string(path).map_err(|e| {
            anyhow::anyhow!("cannot read brief {}: {e}", path.display())
        })?),
        None => None,
    };

    let pipeline = loupe_core::AnalysisPipeline::new(config.clone())
        .map_err(|e| anyhow::anyhow!("{e}"))?;

    // Ctrl-C cancels in-flight analysis; already-finished interviews keep
    // their summaries.
    let cancel = CancellationToken::new();
    let signal_cancel = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::warn!("interrupt received, cancelling analysis");
            signal_cancel.cancel();
        }
    });

    let bundle = pipeline
        .run(&transcripts, brief_text.as_deref(), &cancel)
        .await
        .map_err(|e| anyhow::anyhow!("{e}"))?;

    if let Some(json_path) = &cli.json {
        let json = serde_json::to_string_pretty(&bundle)?;
        std::fs::write(json_path, json)?;
        if !cli.quiet {
            println!("Analysis bundle written to {}", json_path.display());
        }
    }

    let renderer = render::HtmlRenderer::new().map_err(|e| anyhow::anyhow!("{e}"))?;
    let report_config = ReportConfig::from_analysis(&config);
    let written = renderer
        .render(&bundle, &report_config, &cli.out)
        .map_err(|e| anyhow::anyhow!("{e}"))?;

    if !cli.quiet {
        println!(
            "Report written to {} ({} interviews, {} LLM requests, {} failures)",
            written.display(),
            bundle.total_interviews,
            bundle.call_stats.requests,
            bundle.call_stats.failures,
        );
    }
    Ok(())
}
