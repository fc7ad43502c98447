//! Handlers for trend detection.
//!
//! Query parameters on `/trending` override the configured criteria one field
//! at a time; anything omitted keeps its configured value.

use axum::{
  Json,
  extract::{Path, Query, State},
};
use serde::Deserialize;
use surge_core::{
  criteria::TrendCriteria,
  detector::{ScoredItem, TrendAnalysis},
  store::TimeSeriesStore,
};

use crate::{AppState, error::ApiError};

const DEFAULT_TRENDING_LIMIT: usize = 10;

#[derive(Debug, Deserialize, Default)]
pub struct TrendingParams {
  /// Maximum number of results; `0` returns every qualifying item.
  pub limit:              Option<usize>,
  pub min_uses_count:     Option<u64>,
  pub max_uses_count:     Option<u64>,
  pub min_growth_percent: Option<f64>,
  pub lookback_hours:     Option<u32>,
}

impl TrendingParams {
  /// `base` with every supplied override applied.
  pub fn apply_to(&self, base: &TrendCriteria) -> TrendCriteria {
    TrendCriteria {
      min_uses_count:     self.min_uses_count.unwrap_or(base.min_uses_count),
      max_uses_count:     self.max_uses_count.unwrap_or(base.max_uses_count),
      min_growth_percent: self.min_growth_percent.unwrap_or(base.min_growth_percent),
      lookback_hours:     self.lookback_hours.unwrap_or(base.lookback_hours),
    }
  }
}

/// `GET /categories/{key}/trending[?limit=..][&min_uses_count=..][&max_uses_count=..][&min_growth_percent=..][&lookback_hours=..]`
pub async fn detect<S>(
  State(state): State<AppState<S>>,
  Path(key): Path<String>,
  Query(params): Query<TrendingParams>,
) -> Result<Json<Vec<ScoredItem>>, ApiError>
where
  S: TimeSeriesStore,
{
  state.require_category(&key)?;
  let criteria = params.apply_to(state.detector.criteria());
  let results = state
    .detector
    .detect_trending_with_criteria(
      &key,
      params.limit.unwrap_or(DEFAULT_TRENDING_LIMIT),
      &criteria,
    )
    .await?;
  Ok(Json(results))
}

/// `GET /categories/{key}/analysis`
pub async fn analysis<S>(
  State(state): State<AppState<S>>,
  Path(key): Path<String>,
) -> Result<Json<TrendAnalysis>, ApiError>
where
  S: TimeSeriesStore,
{
  state.require_category(&key)?;
  Ok(Json(state.detector.analyze_category(&key).await?))
}
