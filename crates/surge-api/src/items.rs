//! Handlers for item and snapshot reads.
//!
//! | Method | Path | Notes |
//! |--------|------|-------|
//! | `GET`  | `/categories/{key}/items` | Optional `?limit=` (default 100) |
//! | `GET`  | `/items` | `?url=` required; 404 if not found |
//! | `GET`  | `/items/{id}/snapshots` | Optional `?since=` (RFC 3339) |

use axum::{
  Json,
  extract::{Path, Query, State},
};
use chrono::{DateTime, Utc};
use serde::Deserialize;
use surge_core::{
  item::{Item, Snapshot},
  store::TimeSeriesStore,
};
use uuid::Uuid;

use crate::{AppState, error::ApiError};

const DEFAULT_LIST_LIMIT: usize = 100;

// ─── By category ──────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct ListParams {
  pub limit: Option<usize>,
}

/// `GET /categories/{key}/items[?limit=<n>]`
pub async fn list_by_category<S>(
  State(state): State<AppState<S>>,
  Path(key): Path<String>,
  Query(params): Query<ListParams>,
) -> Result<Json<Vec<Item>>, ApiError>
where
  S: TimeSeriesStore,
{
  state.require_category(&key)?;
  let items = state
    .store
    .list_by_category(&key, params.limit.unwrap_or(DEFAULT_LIST_LIMIT))
    .await
    .map_err(ApiError::store)?;
  Ok(Json(items))
}

// ─── By URL ───────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct LookupParams {
  pub url: String,
}

/// `GET /items?url=<url>`
pub async fn get_by_url<S>(
  State(state): State<AppState<S>>,
  Query(params): Query<LookupParams>,
) -> Result<Json<Item>, ApiError>
where
  S: TimeSeriesStore,
{
  let item = state
    .store
    .get_item_by_url(&params.url)
    .await
    .map_err(ApiError::store)?
    .ok_or_else(|| ApiError::NotFound(format!("item {} not found", params.url)))?;
  Ok(Json(item))
}

// ─── History ──────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct HistoryParams {
  pub since: Option<DateTime<Utc>>,
}

/// `GET /items/{id}/snapshots[?since=<rfc3339>]`
pub async fn snapshots<S>(
  State(state): State<AppState<S>>,
  Path(id): Path<Uuid>,
  Query(params): Query<HistoryParams>,
) -> Result<Json<Vec<Snapshot>>, ApiError>
where
  S: TimeSeriesStore,
{
  let history = state
    .store
    .snapshot_history(id, params.since)
    .await
    .map_err(ApiError::store)?;
  Ok(Json(history))
}
