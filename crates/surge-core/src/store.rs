//! The `TimeSeriesStore` trait and supporting types.
//!
//! The trait is implemented by storage backends (e.g. `surge-store-sqlite`).
//! The detector and the HTTP layer depend on this abstraction, not on any
//! concrete backend.

use std::{collections::HashMap, future::Future};

use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::item::{Item, Observation, Snapshot};

/// Upper bound on the number of items loaded per category for detection.
pub const DEFAULT_MAX_CANDIDATES: usize = 1000;

// ─── Bulk load result ────────────────────────────────────────────────────────

/// Items of one category together with their baseline snapshots.
#[derive(Debug, Clone, Default)]
pub struct CategoryBaselines {
  /// Most-recently-observed first.
  pub items:     Vec<Item>,
  /// Baseline per `item_id`. Items with no snapshot inside the lookback
  /// window have no entry.
  pub baselines: HashMap<Uuid, Snapshot>,
}

impl CategoryBaselines {
  pub fn baseline(&self, item_id: Uuid) -> Option<&Snapshot> {
    self.baselines.get(&item_id)
  }
}

// ─── Trait ───────────────────────────────────────────────────────────────────

/// Abstraction over a time-series store backend.
///
/// Items are upserted by URL; snapshots are append-only. Absence is reported
/// as `Ok(None)`, never as an error.
///
/// All methods return `Send` futures so the trait can be used in multi-threaded
/// async runtimes (e.g. tokio with `axum`).
pub trait TimeSeriesStore: Send + Sync {
  type Error: std::error::Error + Send + Sync + 'static;

  // ── Writes ────────────────────────────────────────────────────────────

  /// Find-or-create the item for `observation.url`, apply the observation to
  /// it and append one snapshot, as a single atomic unit of work.
  ///
  /// Concurrent calls for the same URL never create two items.
  fn record_observation(
    &self,
    observation: Observation,
  ) -> impl Future<Output = Result<Item, Self::Error>> + Send + '_;

  // ── Reads ─────────────────────────────────────────────────────────────

  /// Retrieve an item by its URL. Returns `None` if not found.
  fn get_item_by_url<'a>(
    &'a self,
    url: &'a str,
  ) -> impl Future<Output = Result<Option<Item>, Self::Error>> + Send + 'a;

  /// Items in `category`, most recently updated first (ties by URL), at most
  /// `limit` of them.
  fn list_by_category<'a>(
    &'a self,
    category: &'a str,
    limit: usize,
  ) -> impl Future<Output = Result<Vec<Item>, Self::Error>> + Send + 'a;

  /// The oldest snapshot of `item_id` recorded at or after `cutoff`.
  fn earliest_snapshot_since(
    &self,
    item_id: Uuid,
    cutoff: DateTime<Utc>,
  ) -> impl Future<Output = Result<Option<Snapshot>, Self::Error>> + Send + '_;

  /// All snapshots of `item_id` in ascending `recorded_at` order, optionally
  /// restricted to those recorded at or after `since`.
  fn snapshot_history(
    &self,
    item_id: Uuid,
    since: Option<DateTime<Utc>>,
  ) -> impl Future<Output = Result<Vec<Snapshot>, Self::Error>> + Send + '_;

  /// [`list_by_category`](Self::list_by_category) bounded by `max_items`,
  /// plus the [`earliest_snapshot_since`](Self::earliest_snapshot_since)
  /// `now - lookback_hours` for every listed item.
  ///
  /// A failure on any single item fails the whole call.
  fn bulk_load_with_baseline<'a>(
    &'a self,
    category: &'a str,
    lookback_hours: u32,
    max_items: usize,
  ) -> impl Future<Output = Result<CategoryBaselines, Self::Error>> + Send + 'a;
}
