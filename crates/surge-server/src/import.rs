//! Batch ingestion from newline-delimited JSON.
//!
//! Each non-blank line is one [`Observation`], optionally carrying an
//! `observed_at` timestamp for backfilling history. Lines starting with `#`
//! are comments. The whole file is validated before anything is written.

use std::collections::HashSet;

use anyhow::{Context as _, bail};
use chrono::{DateTime, Utc};
use serde::Deserialize;
use surge_core::{
  category::CategoryRegistry,
  item::{MAX_USES_COUNT, Observation},
};
use surge_store_sqlite::SqliteStore;

/// One line of an import file.
#[derive(Debug, Clone, Deserialize)]
pub struct ImportRecord {
  #[serde(flatten)]
  pub observation: Observation,
  /// When the reading was taken; defaults to the time of import.
  #[serde(default)]
  pub observed_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ImportSummary {
  /// Snapshots appended.
  pub recorded: usize,
  /// Distinct items touched.
  pub items:    usize,
}

/// Parse and validate every record in `text`. Errors name the 1-based line.
pub fn parse_records(
  text: &str,
  categories: &CategoryRegistry,
) -> anyhow::Result<Vec<ImportRecord>> {
  let mut records = Vec::new();

  for (idx, line) in text.lines().enumerate() {
    let line_no = idx + 1;
    let line = line.trim();
    if line.is_empty() || line.starts_with('#') {
      continue;
    }

    let record: ImportRecord = serde_json::from_str(line)
      .with_context(|| format!("line {line_no}: malformed observation"))?;

    if record.observation.url.trim().is_empty() {
      bail!("line {line_no}: url must not be empty");
    }
    if record.observation.uses_count > MAX_USES_COUNT {
      bail!(
        "line {line_no}: uses_count {} exceeds {MAX_USES_COUNT}",
        record.observation.uses_count
      );
    }
    if !categories.contains(&record.observation.category) {
      bail!(
        "line {line_no}: unknown category {:?}",
        record.observation.category
      );
    }
    records.push(record);
  }

  Ok(records)
}

/// Record `records` in order. Stops at the first storage failure.
pub async fn import_records(
  store: &SqliteStore,
  records: Vec<ImportRecord>,
) -> anyhow::Result<ImportSummary> {
  let mut summary = ImportSummary::default();
  let mut seen = HashSet::new();

  for record in records {
    let url = record.observation.url.clone();
    let at = record.observed_at.unwrap_or_else(Utc::now);
    let item = store
      .record_observation_at(record.observation, at)
      .await
      .with_context(|| format!("failed to record observation for {url}"))?;

    tracing::debug!(url = %item.url, uses_count = item.uses_count, "recorded");
    seen.insert(item.item_id);
    summary.recorded += 1;
  }

  summary.items = seen.len();
  Ok(summary)
}
