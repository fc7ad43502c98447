//! Surge command-line entry point.
//!
//! Reads `surge.toml` (or the path given with `--config`), opens the SQLite
//! store, and either serves the JSON API or runs a one-shot command against
//! the store.
//!
//! ```text
//! surge serve
//! surge record --url <url> --title <title> --author <author> \
//!   --uses-count 1200 --category tech
//! surge import observations.ndjson
//! surge trending tech --limit 5
//! surge analyze tech --json
//! ```

use std::{path::PathBuf, sync::Arc};

use anyhow::{Context as _, bail};
use clap::{Parser, Subcommand};
use surge_core::{item::Observation, store::TimeSeriesStore as _};
use surge_server::{ServerConfig, app_state, detector, import, render, router};
use surge_store_sqlite::SqliteStore;
use tokio::net::TcpListener;
use tracing::level_filters::LevelFilter;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(author, version, about = "Surge trending detector")]
struct Cli {
  /// Path to the TOML configuration file.
  #[arg(short, long, default_value = "surge.toml")]
  config: PathBuf,

  #[command(subcommand)]
  command: Command,
}

#[derive(Subcommand)]
enum Command {
  /// Serve the JSON API over HTTP.
  Serve,
  /// Record a single observation.
  Record {
    #[arg(long)]
    url:        String,
    #[arg(long)]
    title:      String,
    #[arg(long)]
    author:     String,
    #[arg(long)]
    uses_count: u64,
    #[arg(long)]
    category:   String,
  },
  /// Record every observation in a newline-delimited JSON file.
  Import { file: PathBuf },
  /// Print the top trending items in a category.
  Trending {
    category: String,
    #[arg(short, long, default_value_t = 10)]
    limit:    usize,
    /// Emit JSON instead of a table.
    #[arg(long)]
    json:     bool,
  },
  /// Print the analysis summary for a category.
  Analyze {
    category: String,
    #[arg(long)]
    json:     bool,
  },
  /// List the configured categories.
  Categories,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
  tracing_subscriber::fmt()
    .with_env_filter(
      EnvFilter::builder()
        .with_default_directive(LevelFilter::INFO.into())
        .from_env_lossy(),
    )
    .init();

  let cli = Cli::parse();
  let cfg = ServerConfig::load(&cli.config)?;

  if let Command::Categories = cli.command {
    for entry in cfg.categories.entries() {
      println!("{:<12} {}", entry.key, entry.display_name);
    }
    return Ok(());
  }

  let store = Arc::new(open_store(&cfg).await?);

  match cli.command {
    Command::Serve => serve(store, &cfg).await,
    Command::Record { url, title, author, uses_count, category } => {
      ensure_category(&cfg, &category)?;
      let item = store
        .record_observation(Observation::new(url, title, author, uses_count, category))
        .await
        .context("failed to record observation")?;
      tracing::info!(
        item_id = %item.item_id,
        uses_count = item.uses_count,
        "recorded {}",
        item.url
      );
      Ok(())
    }
    Command::Import { file } => {
      let text = std::fs::read_to_string(&file)
        .with_context(|| format!("failed to read {}", file.display()))?;
      let records = import::parse_records(&text, &cfg.categories)
        .with_context(|| format!("invalid import file {}", file.display()))?;
      let summary = import::import_records(&store, records).await?;
      tracing::info!(
        recorded = summary.recorded,
        items = summary.items,
        "imported {}",
        file.display()
      );
      Ok(())
    }
    Command::Trending { category, limit, json } => {
      ensure_category(&cfg, &category)?;
      let results = detector(store, &cfg)?.detect_trending(&category, limit).await?;
      if json {
        println!("{}", serde_json::to_string_pretty(&results)?);
      } else {
        print!("{}", render::trending_table(&cfg.categories, &category, &results));
      }
      Ok(())
    }
    Command::Analyze { category, json } => {
      ensure_category(&cfg, &category)?;
      let analysis = detector(store, &cfg)?.analyze_category(&category).await?;
      if json {
        println!("{}", serde_json::to_string_pretty(&analysis)?);
      } else {
        print!("{}", render::analysis_summary(&cfg.categories, &analysis));
      }
      Ok(())
    }
    Command::Categories => Ok(()),
  }
}

async fn open_store(cfg: &ServerConfig) -> anyhow::Result<SqliteStore> {
  let store_path = cfg.resolved_store_path();
  if let Some(parent) = store_path.parent()
    && !parent.as_os_str().is_empty()
  {
    std::fs::create_dir_all(parent)
      .with_context(|| format!("failed to create {}", parent.display()))?;
  }

  SqliteStore::open(&store_path)
    .await
    .with_context(|| format!("failed to open store at {store_path:?}"))
}

fn ensure_category(cfg: &ServerConfig, key: &str) -> anyhow::Result<()> {
  if !cfg.categories.contains(key) {
    let known: Vec<&str> = cfg.categories.keys().collect();
    bail!("unknown category {key:?} (known: {})", known.join(", "));
  }
  Ok(())
}

async fn serve(store: Arc<SqliteStore>, cfg: &ServerConfig) -> anyhow::Result<()> {
  let app = router(app_state(store, cfg)?);
  let address = cfg.address();

  tracing::info!("Listening on http://{address}");
  let listener = TcpListener::bind(&address)
    .await
    .with_context(|| format!("failed to bind {address}"))?;

  axum::serve(listener, app).await.context("server error")?;

  Ok(())
}
