//! Configuration and wiring for the `surge` binary.
//!
//! Exposes the [`ServerConfig`] read from `surge.toml` / `SURGE_*` variables,
//! the top-level [`router`], and the helpers behind the CLI subcommands.

pub mod import;
pub mod render;

use std::{
  path::{Path, PathBuf},
  sync::Arc,
};

use anyhow::Context as _;
use axum::Router;
use serde::Deserialize;
use surge_api::AppState;
use surge_core::{
  category::CategoryRegistry,
  criteria::TrendCriteria,
  detector::TrendDetector,
  store::{DEFAULT_MAX_CANDIDATES, TimeSeriesStore},
};
use tower_http::trace::TraceLayer;

// ─── Configuration ────────────────────────────────────────────────────────────

/// Runtime configuration, deserialised from `surge.toml` and the environment.
/// Every field has a default, so an absent file is not an error.
#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct ServerConfig {
  pub host:           String,
  pub port:           u16,
  pub store_path:     PathBuf,
  pub categories:     CategoryRegistry,
  pub criteria:       TrendCriteria,
  /// Items per category considered by the detector.
  pub max_candidates: usize,
}

impl Default for ServerConfig {
  fn default() -> Self {
    Self {
      host:           "127.0.0.1".to_string(),
      port:           8080,
      store_path:     PathBuf::from("./data/surge.db"),
      categories:     CategoryRegistry::default(),
      criteria:       TrendCriteria::default(),
      max_candidates: DEFAULT_MAX_CANDIDATES,
    }
  }
}

impl ServerConfig {
  /// Layer `path` (optional) and `SURGE_*` environment variables over the
  /// defaults. Nested keys use `__`, e.g. `SURGE_CRITERIA__LOOKBACK_HOURS`.
  pub fn load(path: &Path) -> anyhow::Result<Self> {
    let settings = config::Config::builder()
      .add_source(config::File::from(path.to_path_buf()).required(false))
      .add_source(
        config::Environment::with_prefix("SURGE")
          .prefix_separator("_")
          .separator("__"),
      )
      .build()
      .context("failed to read config file")?;

    let cfg: Self = settings
      .try_deserialize()
      .context("failed to deserialise ServerConfig")?;
    cfg.validate()?;
    Ok(cfg)
  }

  pub fn validate(&self) -> anyhow::Result<()> {
    if self.categories.is_empty() {
      anyhow::bail!("at least one category must be configured");
    }
    if self.max_candidates == 0 {
      anyhow::bail!("max_candidates must be at least 1");
    }
    self.criteria.validate().context("invalid [criteria] section")?;
    Ok(())
  }

  /// `store_path` with a leading `~` expanded to the user's home directory.
  pub fn resolved_store_path(&self) -> PathBuf { expand_tilde(&self.store_path) }

  pub fn address(&self) -> String { format!("{}:{}", self.host, self.port) }
}

/// Expand a leading `~` to the user's home directory.
fn expand_tilde(path: &Path) -> PathBuf {
  let s = path.to_string_lossy();
  if let Some(rest) = s.strip_prefix("~/")
    && let Ok(home) = std::env::var("HOME")
  {
    return PathBuf::from(home).join(rest);
  }
  path.to_path_buf()
}

// ─── Wiring ───────────────────────────────────────────────────────────────────

/// Build a detector over `store` configured from `cfg`.
pub fn detector<S: TimeSeriesStore>(
  store: Arc<S>,
  cfg: &ServerConfig,
) -> surge_core::Result<TrendDetector<S>> {
  Ok(
    TrendDetector::new(store)
      .with_criteria(cfg.criteria.clone())?
      .with_max_candidates(cfg.max_candidates),
  )
}

/// Shared API state for `store` configured from `cfg`.
pub fn app_state<S: TimeSeriesStore>(
  store: Arc<S>,
  cfg: &ServerConfig,
) -> surge_core::Result<AppState<S>> {
  Ok(AppState::new(detector(store, cfg)?, cfg.categories.clone()))
}

/// The full HTTP application: the JSON API under `/api`, with request tracing.
pub fn router<S>(state: AppState<S>) -> Router
where
  S: TimeSeriesStore + 'static,
{
  Router::new()
    .nest("/api", surge_api::api_router(state))
    .layer(TraceLayer::new_for_http())
}
