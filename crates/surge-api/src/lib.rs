//! JSON REST API for Surge.
//!
//! Exposes an axum [`Router`] backed by any
//! [`surge_core::store::TimeSeriesStore`]. Auth, TLS, and transport concerns
//! are the caller's responsibility.
//!
//! # Mounting
//!
//! ```rust,ignore
//! .nest("/api", surge_api::api_router(state))
//! ```

pub mod categories;
pub mod error;
pub mod items;
pub mod observations;
pub mod trending;

use std::sync::Arc;

use axum::{
  Router,
  routing::{get, post},
};
use surge_core::{
  category::CategoryRegistry,
  detector::TrendDetector,
  store::TimeSeriesStore,
};

pub use error::ApiError;

// ─── Application state ────────────────────────────────────────────────────────

/// Shared state threaded through all handlers.
pub struct AppState<S> {
  pub store:      Arc<S>,
  pub detector:   TrendDetector<S>,
  pub categories: Arc<CategoryRegistry>,
}

impl<S> Clone for AppState<S> {
  fn clone(&self) -> Self {
    Self {
      store:      Arc::clone(&self.store),
      detector:   self.detector.clone(),
      categories: Arc::clone(&self.categories),
    }
  }
}

impl<S: TimeSeriesStore> AppState<S> {
  /// State whose detector reads from the same `store` the API writes to.
  pub fn new(detector: TrendDetector<S>, categories: CategoryRegistry) -> Self {
    Self {
      store: Arc::clone(detector.store()),
      detector,
      categories: Arc::new(categories),
    }
  }

  /// Reject category keys the registry does not know.
  pub(crate) fn require_category(&self, key: &str) -> Result<(), ApiError> {
    if self.categories.contains(key) {
      Ok(())
    } else {
      Err(ApiError::BadRequest(format!("unknown category: {key:?}")))
    }
  }
}

// ─── Router ───────────────────────────────────────────────────────────────────

/// Build a fully-materialised API router for `state`.
///
/// The returned `Router<()>` can be nested into any parent router regardless
/// of its own state type.
pub fn api_router<S>(state: AppState<S>) -> Router<()>
where
  S: TimeSeriesStore + 'static,
{
  Router::new()
    .route("/categories", get(categories::list::<S>))
    .route("/categories/{key}/items", get(items::list_by_category::<S>))
    .route("/categories/{key}/trending", get(trending::detect::<S>))
    .route("/categories/{key}/analysis", get(trending::analysis::<S>))
    .route("/observations", post(observations::create::<S>))
    .route("/items", get(items::get_by_url::<S>))
    .route("/items/{id}/snapshots", get(items::snapshots::<S>))
    .with_state(state)
}
