//! Trend detection: growth scoring, filtering and ranking.
//!
//! For each item in a category the detector compares the current usage
//! counter to a baseline snapshot (the oldest snapshot inside the lookback
//! window) and keeps items that are inside the eligible band and grew by at
//! least the configured percentage.

use std::{cmp::Ordering, sync::Arc};

use serde::{Deserialize, Serialize};

use crate::{
  Error, Result,
  criteria::TrendCriteria,
  item::{Item, Snapshot},
  store::{DEFAULT_MAX_CANDIDATES, TimeSeriesStore},
};

/// Number of ranked items [`TrendDetector::analyze_category`] looks at.
pub const ANALYSIS_LIMIT: usize = 10;

// ─── Growth ──────────────────────────────────────────────────────────────────

/// Growth of an item relative to its baseline.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Growth {
  /// The baseline was non-zero; `percent` is `(current - old) / old * 100`.
  Established { percent: f64 },
  /// The baseline was zero, so no percentage exists. The item is newly
  /// significant.
  New,
}

impl Growth {
  /// Value older consumers used in place of a percentage for new items.
  pub const SENTINEL_PERCENT: f64 = 999.9;

  /// Growth from `old` to `current`.
  pub fn between(old: u64, current: u64) -> Self {
    if old == 0 {
      return Self::New;
    }
    let (old, current) = (old as f64, current as f64);
    Self::Established { percent: (current - old) / old * 100.0 }
  }

  /// The computed percentage, or `None` for [`Growth::New`].
  pub fn percent(&self) -> Option<f64> {
    match self {
      Self::Established { percent } => Some(*percent),
      Self::New => None,
    }
  }

  /// The percentage, with new items mapped to [`Self::SENTINEL_PERCENT`].
  pub fn display_percent(&self) -> f64 {
    self.percent().unwrap_or(Self::SENTINEL_PERCENT)
  }

  pub fn is_new(&self) -> bool { matches!(self, Self::New) }

  /// Ranking order: new items above everything, then by percentage.
  ///
  /// Older releases ranked new items at their 999.9 display value, which put
  /// them below any item growing faster than that.
  pub fn rank_cmp(&self, other: &Self) -> Ordering {
    match (self, other) {
      (Self::New, Self::New) => Ordering::Equal,
      (Self::New, Self::Established { .. }) => Ordering::Greater,
      (Self::Established { .. }, Self::New) => Ordering::Less,
      (Self::Established { percent: a }, Self::Established { percent: b }) => {
        a.total_cmp(b)
      }
    }
  }
}

// ─── Results ─────────────────────────────────────────────────────────────────

/// An item that passed detection, with its growth figures.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoredItem {
  #[serde(flatten)]
  pub item:           Item,
  pub growth:         Growth,
  /// Usage counter of the baseline snapshot (`0` for new items).
  pub old_uses_count: u64,
}

/// Aggregate view of one category's trending items.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrendAnalysis {
  pub category:       String,
  pub trending_count: usize,
  /// How many of the ranked items are [`Growth::New`].
  pub new_count:      usize,
  /// Mean percentage over the ranked items that have one. Older releases
  /// averaged new items in at 999.9; they are counted in `new_count` instead.
  pub average_growth: Option<f64>,
  pub top_item:       Option<ScoredItem>,
  pub items:          Vec<ScoredItem>,
}

impl TrendAnalysis {
  fn from_ranked(category: &str, items: Vec<ScoredItem>) -> Self {
    let percents: Vec<f64> =
      items.iter().filter_map(|s| s.growth.percent()).collect();
    let average_growth = (!percents.is_empty())
      .then(|| percents.iter().sum::<f64>() / percents.len() as f64);

    Self {
      category: category.to_owned(),
      trending_count: items.len(),
      new_count: items.iter().filter(|s| s.growth.is_new()).count(),
      average_growth,
      top_item: items.first().cloned(),
      items,
    }
  }
}

// ─── Scoring ─────────────────────────────────────────────────────────────────

/// Score a single item against its baseline. Returns `None` if the item does
/// not qualify.
pub fn score_item(
  item: &Item,
  baseline: Option<&Snapshot>,
  criteria: &TrendCriteria,
) -> Option<ScoredItem> {
  if !criteria.in_band(item.uses_count) {
    return None;
  }
  // Baselines outside the window are never used, even if older snapshots
  // exist.
  let baseline = baseline?;

  let growth = Growth::between(baseline.uses_count, item.uses_count);
  if let Growth::Established { percent } = growth
    && percent < criteria.min_growth_percent
  {
    return None;
  }

  Some(ScoredItem {
    item: item.clone(),
    growth,
    old_uses_count: baseline.uses_count,
  })
}

/// Result ordering: growth descending, then current usage descending, then
/// URL ascending.
pub fn rank_order(a: &ScoredItem, b: &ScoredItem) -> Ordering {
  b.growth
    .rank_cmp(&a.growth)
    .then_with(|| b.item.uses_count.cmp(&a.item.uses_count))
    .then_with(|| a.item.url.cmp(&b.item.url))
}

/// Sort `scored` into ranking order and truncate it to `limit` (`0` keeps
/// everything).
pub fn rank(scored: &mut Vec<ScoredItem>, limit: usize) {
  scored.sort_by(rank_order);
  if limit > 0 {
    scored.truncate(limit);
  }
}

// ─── Detector ────────────────────────────────────────────────────────────────

/// Detects trending items in a [`TimeSeriesStore`].
///
/// Stateless between calls; cloning is cheap.
pub struct TrendDetector<S> {
  store:          Arc<S>,
  criteria:       TrendCriteria,
  max_candidates: usize,
}

impl<S> Clone for TrendDetector<S> {
  fn clone(&self) -> Self {
    Self {
      store:          Arc::clone(&self.store),
      criteria:       self.criteria.clone(),
      max_candidates: self.max_candidates,
    }
  }
}

impl<S: TimeSeriesStore> TrendDetector<S> {
  /// A detector using the default criteria.
  pub fn new(store: Arc<S>) -> Self {
    Self {
      store,
      criteria: TrendCriteria::default(),
      max_candidates: DEFAULT_MAX_CANDIDATES,
    }
  }

  /// Replace the criteria used by [`detect_trending`](Self::detect_trending)
  /// and [`analyze_category`](Self::analyze_category).
  pub fn with_criteria(mut self, criteria: TrendCriteria) -> Result<Self> {
    criteria.validate()?;
    self.criteria = criteria;
    Ok(self)
  }

  /// Bound on how many items per category are considered.
  pub fn with_max_candidates(mut self, max_candidates: usize) -> Self {
    self.max_candidates = max_candidates;
    self
  }

  pub fn criteria(&self) -> &TrendCriteria { &self.criteria }

  pub fn store(&self) -> &Arc<S> { &self.store }

  /// Trending items in `category` under the configured criteria.
  pub async fn detect_trending(
    &self,
    category: &str,
    limit: usize,
  ) -> Result<Vec<ScoredItem>> {
    self
      .detect_trending_with_criteria(category, limit, &self.criteria)
      .await
  }

  /// Trending items in `category` under `criteria`, ranked and truncated to
  /// `limit` (`0` means no truncation).
  pub async fn detect_trending_with_criteria(
    &self,
    category: &str,
    limit: usize,
    criteria: &TrendCriteria,
  ) -> Result<Vec<ScoredItem>> {
    criteria.validate()?;

    let loaded = self
      .store
      .bulk_load_with_baseline(
        category,
        criteria.lookback_hours,
        self.max_candidates,
      )
      .await
      .map_err(|e| Error::store("bulk_load_with_baseline", category, e))?;

    let mut scored: Vec<ScoredItem> = loaded
      .items
      .iter()
      .filter_map(|item| {
        score_item(item, loaded.baseline(item.item_id), criteria)
      })
      .collect();

    rank(&mut scored, limit);
    Ok(scored)
  }

  /// Summary of the top [`ANALYSIS_LIMIT`] trending items in `category`.
  pub async fn analyze_category(&self, category: &str) -> Result<TrendAnalysis> {
    let items = self.detect_trending(category, ANALYSIS_LIMIT).await?;
    Ok(TrendAnalysis::from_ranked(category, items))
  }
}
