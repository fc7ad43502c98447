//! Items and snapshots: the time-series data model.
//!
//! An item is the current, mutable view of one tracked piece of content,
//! identified by its URL. Every observation of an item also appends an
//! immutable [`Snapshot`] of its usage counter; snapshots are never updated or
//! deleted, and together they form the history trend detection reads from.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

// ─── Item ────────────────────────────────────────────────────────────────────

/// A tracked content unit. Exactly one item exists per `url`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Item {
  /// Store-assigned identity, referenced by snapshots.
  pub item_id:    Uuid,
  pub url:        String,
  pub title:      String,
  pub author:     String,
  /// The latest observed usage counter. Not guaranteed to be monotonic.
  pub uses_count: u64,
  pub category:   String,
  pub created_at: DateTime<Utc>,
  /// Time of the most recent observation applied to this item.
  pub updated_at: DateTime<Utc>,
}

// ─── Snapshot ────────────────────────────────────────────────────────────────

/// An immutable, timestamped reading of an item's usage counter.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Snapshot {
  pub snapshot_id: Uuid,
  pub item_id:     Uuid,
  pub uses_count:  u64,
  pub recorded_at: DateTime<Utc>,
}

/// Largest usage counter a store must be able to hold (SQLite `INTEGER`).
pub const MAX_USES_COUNT: u64 = i64::MAX as u64;

// ─── Observation ─────────────────────────────────────────────────────────────

/// Input to [`crate::store::TimeSeriesStore::record_observation`]: one reading
/// produced by an ingestion source.
///
/// Timestamps are always assigned by the store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Observation {
  pub url:        String,
  pub title:      String,
  pub author:     String,
  pub uses_count: u64,
  pub category:   String,
}

impl Observation {
  pub fn new(
    url: impl Into<String>,
    title: impl Into<String>,
    author: impl Into<String>,
    uses_count: u64,
    category: impl Into<String>,
  ) -> Self {
    Self {
      url: url.into(),
      title: title.into(),
      author: author.into(),
      uses_count,
      category: category.into(),
    }
  }
}
