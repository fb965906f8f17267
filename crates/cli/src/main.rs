use anyhow::{Context, Result};
use clap::Parser;
use cli::notifications::DesktopNotifier;
use cli::{report, watch};
use library_core::config::{self, AppConfig};
use library_core::Organizer;
use providers::ollama::{OllamaConfig, OllamaProvider};
use providers::LlmProvider;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "ai-library")]
#[command(about = "Sorts a folder into an AI-curated library using a local model", long_about = None)]
struct Cli {
    /// Directory to organize (defaults to Downloads)
    #[arg(short, long)]
    path: Option<PathBuf>,

    /// Ollama model tag
    #[arg(short, long)]
    model: Option<String>,

    /// Library folder name inside the watched directory
    #[arg(short, long)]
    library: Option<String>,

    /// Analyze and report without moving anything
    #[arg(short, long)]
    dry_run: bool,

    /// Keep running and organize new files as they appear
    #[arg(long)]
    monitor: bool,

    /// Process at most this many files
    #[arg(long)]
    max_files: Option<usize>,

    /// Print the detailed summary afterwards
    #[arg(short, long)]
    report: bool,

    /// Emit JSON instead of text
    #[arg(long)]
    json: bool,

    /// Path to config file
    #[arg(short, long)]
    config: Option<String>,

    /// Debug logging
    #[arg(short, long)]
    verbose: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let mut cfg = config::load(cli.config.as_deref())?;
    apply_overrides(&mut cfg, &cli)?;

    let provider = OllamaProvider::new(OllamaConfig {
        base_url: cfg.inference.endpoint.clone(),
        model: cfg.inference.model.clone(),
        request_timeout: cfg.inference.timeout().max(Duration::from_secs(60)),
    });
    if let Err(e) = provider.ensure_ready().await {
        eprintln!("Model setup failed: {}", e);
        eprintln!("Troubleshooting:");
        eprintln!("  1. Start Ollama: ollama serve");
        eprintln!("  2. Install the model: ollama pull {}", provider.model());
        eprintln!("  3. Check the endpoint: {}", cfg.inference.endpoint);
        return Err(e).context("inference backend not ready");
    }

    let notifier = Arc::new(DesktopNotifier::new());
    let mut organizer = Organizer::new(cfg, Arc::new(provider), notifier)?;

    if cli.monitor {
        let shared = Arc::new(Mutex::new(organizer));
        watch::watch_directory(shared.clone()).await?;
        let summary = shared.lock().await.summary();
        if cli.json {
            println!("{}", report::to_json(None, &summary)?);
        } else {
            print!("{}", report::render_summary(&summary));
        }
        return Ok(());
    }

    let batch = organizer.organize(cli.max_files).await?;
    let summary = organizer.summary();
    if cli.json {
        println!("{}", report::to_json(Some(&batch), &summary)?);
        return Ok(());
    }
    print!("{}", report::render_batch(&batch, summary.errors.len()));
    if cli.report {
        print!("{}", report::render_summary(&summary));
    }
    if batch.dry_run && batch.found > 0 {
        println!("This was a preview. Run without --dry-run to move files.");
    }
    Ok(())
}

fn init_tracing(verbose: bool) {
    let default = if verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn apply_overrides(cfg: &mut AppConfig, cli: &Cli) -> Result<()> {
    if let Some(path) = &cli.path {
        cfg.watch.path = Some(path.clone());
    }
    if cfg.watch.path.is_none() {
        let downloads = dirs::download_dir()
            .or_else(|| dirs::home_dir().map(|h| h.join("Downloads")))
            .context("could not determine a default directory; pass --path")?;
        cfg.watch.path = Some(downloads);
    }
    if let Some(model) = &cli.model {
        cfg.inference.model = model.clone();
    }
    if let Some(library) = &cli.library {
        cfg.watch.library_name = library.clone();
    }
    if cli.dry_run {
        cfg.safety.dry_run = true;
    }
    Ok(())
}
