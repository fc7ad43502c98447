//! Encoding and decoding helpers between Rust domain types and the plain-text
//! representations stored in SQLite columns.
//!
//! Timestamps are stored as fixed-width RFC 3339 strings (microsecond
//! precision, `Z` suffix) so that lexicographic order equals chronological
//! order in `ORDER BY` and range comparisons. UUIDs are stored as hyphenated
//! lowercase strings. Usage counters are `u64` in the domain and `INTEGER`
//! (i64) in SQLite.

use chrono::{DateTime, SecondsFormat, Utc};
use surge_core::item::{Item, Snapshot};
use uuid::Uuid;

use crate::{Error, Result};

// ─── Uuid ─────────────────────────────────────────────────────────────────────

pub fn encode_uuid(id: Uuid) -> String { id.hyphenated().to_string() }

pub fn decode_uuid(s: &str) -> Result<Uuid> { Ok(Uuid::parse_str(s)?) }

// ─── DateTime<Utc> ────────────────────────────────────────────────────────────

pub fn encode_dt(dt: DateTime<Utc>) -> String {
  dt.to_rfc3339_opts(SecondsFormat::Micros, true)
}

pub fn decode_dt(s: &str) -> Result<DateTime<Utc>> {
  DateTime::parse_from_rfc3339(s)
    .map(|dt| dt.with_timezone(&Utc))
    .map_err(|e| Error::DateParse(e.to_string()))
}

// ─── Counters ─────────────────────────────────────────────────────────────────

pub fn encode_count(n: u64) -> Result<i64> {
  i64::try_from(n).map_err(|_| Error::CountOutOfRange(i128::from(n)))
}

pub fn decode_count(n: i64) -> Result<u64> {
  u64::try_from(n).map_err(|_| Error::CountOutOfRange(i128::from(n)))
}

// ─── Row types ───────────────────────────────────────────────────────────────

/// Raw values read directly from an `items` row, selected in the order
/// `item_id, url, title, author, uses_count, category, created_at, updated_at`.
pub struct RawItem {
  pub item_id:    String,
  pub url:        String,
  pub title:      String,
  pub author:     String,
  pub uses_count: i64,
  pub category:   String,
  pub created_at: String,
  pub updated_at: String,
}

impl RawItem {
  pub fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      item_id:    row.get(0)?,
      url:        row.get(1)?,
      title:      row.get(2)?,
      author:     row.get(3)?,
      uses_count: row.get(4)?,
      category:   row.get(5)?,
      created_at: row.get(6)?,
      updated_at: row.get(7)?,
    })
  }

  pub fn into_item(self) -> Result<Item> {
    Ok(Item {
      item_id:    decode_uuid(&self.item_id)?,
      url:        self.url,
      title:      self.title,
      author:     self.author,
      uses_count: decode_count(self.uses_count)?,
      category:   self.category,
      created_at: decode_dt(&self.created_at)?,
      updated_at: decode_dt(&self.updated_at)?,
    })
  }
}

/// Raw values read directly from a `snapshots` row, selected in the order
/// `snapshot_id, item_id, uses_count, recorded_at`.
pub struct RawSnapshot {
  pub snapshot_id: String,
  pub item_id:     String,
  pub uses_count:  i64,
  pub recorded_at: String,
}

impl RawSnapshot {
  pub fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      snapshot_id: row.get(0)?,
      item_id:     row.get(1)?,
      uses_count:  row.get(2)?,
      recorded_at: row.get(3)?,
    })
  }

  pub fn into_snapshot(self) -> Result<Snapshot> {
    Ok(Snapshot {
      snapshot_id: decode_uuid(&self.snapshot_id)?,
      item_id:     decode_uuid(&self.item_id)?,
      uses_count:  decode_count(self.uses_count)?,
      recorded_at: decode_dt(&self.recorded_at)?,
    })
  }
}

#[cfg(test)]
mod tests {
  use chrono::TimeZone as _;

  use super::*;

  #[test]
  fn timestamps_are_fixed_width_and_sortable() {
    let whole = Utc.with_ymd_and_hms(2026, 1, 2, 3, 4, 5).unwrap();
    let later = whole + chrono::Duration::microseconds(120);
    let a = encode_dt(whole);
    let b = encode_dt(later);
    assert_eq!(a, "2026-01-02T03:04:05.000000Z");
    assert_eq!(a.len(), b.len());
    assert!(a < b);
    assert_eq!(decode_dt(&b).unwrap(), later);
  }

  #[test]
  fn counts_outside_i64_are_rejected() {
    assert_eq!(encode_count(42).unwrap(), 42);
    assert!(matches!(encode_count(u64::MAX), Err(Error::CountOutOfRange(_))));
    assert!(matches!(decode_count(-1), Err(Error::CountOutOfRange(-1))));
  }
}
