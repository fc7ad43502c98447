//! Handler for `POST /observations`, the ingestion entry point.

use axum::{
  Json,
  extract::State,
  http::StatusCode,
  response::IntoResponse,
};
use surge_core::{
  item::{MAX_USES_COUNT, Observation},
  store::TimeSeriesStore,
};

use crate::{AppState, error::ApiError};

/// `POST /observations`. Body: an [`Observation`]; returns 201 + the stored
/// [`Item`](surge_core::item::Item).
pub async fn create<S>(
  State(state): State<AppState<S>>,
  Json(body): Json<Observation>,
) -> Result<impl IntoResponse, ApiError>
where
  S: TimeSeriesStore,
{
  if body.url.trim().is_empty() {
    return Err(ApiError::BadRequest("url must not be empty".into()));
  }
  if body.uses_count > MAX_USES_COUNT {
    return Err(ApiError::BadRequest(format!(
      "uses_count {} exceeds {MAX_USES_COUNT}",
      body.uses_count
    )));
  }
  state.require_category(&body.category)?;

  let item = state
    .store
    .record_observation(body)
    .await
    .map_err(ApiError::store)?;
  Ok((StatusCode::CREATED, Json(item)))
}
