//! Handler for `GET /categories`.

use axum::{Json, extract::State};
use surge_core::{category::CategoryEntry, store::TimeSeriesStore};

use crate::{AppState, error::ApiError};

/// `GET /categories`: the configured registry, in order.
pub async fn list<S>(
  State(state): State<AppState<S>>,
) -> Result<Json<Vec<CategoryEntry>>, ApiError>
where
  S: TimeSeriesStore,
{
  Ok(Json(state.categories.entries().to_vec()))
}
