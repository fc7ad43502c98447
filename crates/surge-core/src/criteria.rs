//! Thresholds that decide whether an item counts as trending.

use serde::{Deserialize, Serialize};

use crate::{Error, Result};

/// Widest accepted baseline window: one hundred years.
pub const MAX_LOOKBACK_HOURS: u32 = 100 * 366 * 24;

/// Trend detection thresholds.
///
/// The `[min_uses_count, max_uses_count]` band keeps out both noise and items
/// that are already past the emerging phase.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TrendCriteria {
  /// Lower bound (inclusive) on the current usage counter.
  pub min_uses_count:     u64,
  /// Upper bound (inclusive) on the current usage counter.
  pub max_uses_count:     u64,
  /// Minimum growth over the baseline, in percent.
  pub min_growth_percent: f64,
  /// Width of the baseline window, ending now.
  pub lookback_hours:     u32,
}

impl Default for TrendCriteria {
  fn default() -> Self {
    Self {
      min_uses_count:     500,
      max_uses_count:     30_000,
      min_growth_percent: 150.0,
      lookback_hours:     24,
    }
  }
}

impl TrendCriteria {
  /// Reject criteria that are contradictory or not numerically usable.
  pub fn validate(&self) -> Result<()> {
    if self.min_uses_count > self.max_uses_count {
      return Err(Error::InvalidCriteria(format!(
        "min_uses_count ({}) exceeds max_uses_count ({})",
        self.min_uses_count, self.max_uses_count
      )));
    }
    if self.lookback_hours == 0 {
      return Err(Error::InvalidCriteria(
        "lookback_hours must be at least 1".into(),
      ));
    }
    if self.lookback_hours > MAX_LOOKBACK_HOURS {
      return Err(Error::InvalidCriteria(format!(
        "lookback_hours ({}) exceeds {MAX_LOOKBACK_HOURS}",
        self.lookback_hours
      )));
    }
    if !self.min_growth_percent.is_finite() {
      return Err(Error::InvalidCriteria(format!(
        "min_growth_percent must be finite, got {}",
        self.min_growth_percent
      )));
    }
    Ok(())
  }

  /// Whether `uses_count` lies inside the eligible band.
  pub fn in_band(&self, uses_count: u64) -> bool {
    (self.min_uses_count..=self.max_uses_count).contains(&uses_count)
  }
}
