//! The SQLite implementation of [`TimeSeriesStore`].

use std::{collections::HashMap, path::Path, time::Duration};

use chrono::{DateTime, Utc};
use rusqlite::{OptionalExtension as _, TransactionBehavior};
use uuid::Uuid;

use surge_core::{
  item::{Item, Observation, Snapshot},
  store::{CategoryBaselines, TimeSeriesStore},
};

use crate::{
  encode::{encode_count, encode_dt, encode_uuid, RawItem, RawSnapshot},
  schema::SCHEMA,
  Error, Result,
};

// ─── SQL ─────────────────────────────────────────────────────────────────────

/// Insert-or-update keyed by the unique `url`. The update is skipped when the
/// stored item already reflects a later observation, in which case no row is
/// returned.
const UPSERT_ITEM: &str = "
  INSERT INTO items (
    item_id, url, title, author, uses_count, category, created_at, updated_at
  ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?7)
  ON CONFLICT(url) DO UPDATE SET
    title      = excluded.title,
    author     = excluded.author,
    uses_count = excluded.uses_count,
    category   = excluded.category,
    updated_at = excluded.updated_at
  WHERE excluded.updated_at >= items.updated_at
  RETURNING item_id, url, title, author, uses_count, category, created_at, updated_at";

const SELECT_ITEM_BY_URL: &str = "
  SELECT item_id, url, title, author, uses_count, category, created_at, updated_at
  FROM items
  WHERE url = ?1";

const INSERT_SNAPSHOT: &str = "
  INSERT INTO snapshots (snapshot_id, item_id, uses_count, recorded_at)
  VALUES (?1, ?2, ?3, ?4)";

const LIST_BY_CATEGORY: &str = "
  SELECT item_id, url, title, author, uses_count, category, created_at, updated_at
  FROM items
  WHERE category = ?1
  ORDER BY updated_at DESC, url ASC
  LIMIT ?2";

// Ties on `recorded_at` resolve to insertion order.
const EARLIEST_SNAPSHOT_SINCE: &str = "
  SELECT snapshot_id, item_id, uses_count, recorded_at
  FROM snapshots
  WHERE item_id = ?1 AND recorded_at >= ?2
  ORDER BY recorded_at ASC, rowid ASC
  LIMIT 1";

const SNAPSHOT_HISTORY: &str = "
  SELECT snapshot_id, item_id, uses_count, recorded_at
  FROM snapshots
  WHERE item_id = ?1 AND (?2 IS NULL OR recorded_at >= ?2)
  ORDER BY recorded_at ASC, rowid ASC";

/// How long a writer waits for another connection's lock on the same file.
const BUSY_TIMEOUT: Duration = Duration::from_secs(5);

// ─── Store ───────────────────────────────────────────────────────────────────

/// A Surge time-series store backed by a single SQLite file.
///
/// Cloning is cheap. The inner connection is reference-counted, and all
/// clones share the same worker thread.
#[derive(Clone)]
pub struct SqliteStore {
  conn: tokio_rusqlite::Connection,
}

impl SqliteStore {
  /// Open (or create) a store at `path` and run schema initialisation.
  pub async fn open(path: impl AsRef<Path>) -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open(path).await?;
    let store = Self { conn };
    store.init_schema().await?;
    Ok(store)
  }

  /// Open an in-memory store, mostly for tests.
  pub async fn open_in_memory() -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open_in_memory().await?;
    let store = Self { conn };
    store.init_schema().await?;
    Ok(store)
  }

  async fn init_schema(&self) -> Result<()> {
    self
      .conn
      .call(|conn| {
        conn.busy_timeout(BUSY_TIMEOUT)?;
        conn.execute_batch(SCHEMA)?;
        Ok(())
      })
      .await?;
    Ok(())
  }

  /// Apply `observation` as if it had been made at `at`.
  ///
  /// The snapshot is always appended with `recorded_at = at`. The item's
  /// current state is only overwritten when `at` is not older than its
  /// `updated_at`, so backfilled history never clobbers a fresher reading.
  /// Lookup, upsert and append run in one `IMMEDIATE` transaction.
  pub async fn record_observation_at(
    &self,
    observation: Observation,
    at: DateTime<Utc>,
  ) -> Result<Item> {
    let item_id_str     = encode_uuid(Uuid::new_v4());
    let snapshot_id_str = encode_uuid(Uuid::new_v4());
    let uses_count      = encode_count(observation.uses_count)?;
    let at_str          = encode_dt(at);
    let key             = observation.url.clone();
    let Observation { url, title, author, category, .. } = observation;

    let raw: RawItem = self
      .conn
      .call(move |conn| {
        let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;

        let upserted = tx
          .query_row(
            UPSERT_ITEM,
            rusqlite::params![
              item_id_str,
              url,
              title,
              author,
              uses_count,
              category,
              at_str,
            ],
            RawItem::from_row,
          )
          .optional()?;

        let raw = match upserted {
          Some(raw) => raw,
          None => tx.query_row(
            SELECT_ITEM_BY_URL,
            rusqlite::params![url],
            RawItem::from_row,
          )?,
        };

        tx.execute(
          INSERT_SNAPSHOT,
          rusqlite::params![snapshot_id_str, raw.item_id, uses_count, at_str],
        )?;

        tx.commit()?;
        Ok(raw)
      })
      .await
      .map_err(Error::query("record_observation", &key))?;

    raw.into_item()
  }
}

// ─── TimeSeriesStore impl ────────────────────────────────────────────────────

impl TimeSeriesStore for SqliteStore {
  type Error = Error;

  // ── Writes ────────────────────────────────────────────────────────────────

  async fn record_observation(&self, observation: Observation) -> Result<Item> {
    self.record_observation_at(observation, Utc::now()).await
  }

  // ── Reads ─────────────────────────────────────────────────────────────────

  async fn get_item_by_url(&self, url: &str) -> Result<Option<Item>> {
    let url_str = url.to_owned();

    let raw: Option<RawItem> = self
      .conn
      .call(move |conn| {
        Ok(
          conn
            .query_row(
              SELECT_ITEM_BY_URL,
              rusqlite::params![url_str],
              RawItem::from_row,
            )
            .optional()?,
        )
      })
      .await
      .map_err(Error::query("get_item_by_url", url))?;

    raw.map(RawItem::into_item).transpose()
  }

  async fn list_by_category(&self, category: &str, limit: usize) -> Result<Vec<Item>> {
    let category_str = category.to_owned();
    let limit_val    = i64::try_from(limit).unwrap_or(i64::MAX);

    let raws: Vec<RawItem> = self
      .conn
      .call(move |conn| {
        let mut stmt = conn.prepare(LIST_BY_CATEGORY)?;
        let rows = stmt
          .query_map(rusqlite::params![category_str, limit_val], RawItem::from_row)?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await
      .map_err(Error::query("list_by_category", category))?;

    raws.into_iter().map(RawItem::into_item).collect()
  }

  async fn earliest_snapshot_since(
    &self,
    item_id: Uuid,
    cutoff:  DateTime<Utc>,
  ) -> Result<Option<Snapshot>> {
    let item_id_str = encode_uuid(item_id);
    let cutoff_str  = encode_dt(cutoff);

    let raw: Option<RawSnapshot> = self
      .conn
      .call(move |conn| {
        Ok(
          conn
            .query_row(
              EARLIEST_SNAPSHOT_SINCE,
              rusqlite::params![item_id_str, cutoff_str],
              RawSnapshot::from_row,
            )
            .optional()?,
        )
      })
      .await
      .map_err(Error::query("earliest_snapshot_since", item_id))?;

    raw.map(RawSnapshot::into_snapshot).transpose()
  }

  async fn snapshot_history(
    &self,
    item_id: Uuid,
    since:   Option<DateTime<Utc>>,
  ) -> Result<Vec<Snapshot>> {
    let item_id_str = encode_uuid(item_id);
    let since_str   = since.map(encode_dt);

    let raws: Vec<RawSnapshot> = self
      .conn
      .call(move |conn| {
        let mut stmt = conn.prepare(SNAPSHOT_HISTORY)?;
        let rows = stmt
          .query_map(
            rusqlite::params![item_id_str, since_str],
            RawSnapshot::from_row,
          )?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await
      .map_err(Error::query("snapshot_history", item_id))?;

    raws.into_iter().map(RawSnapshot::into_snapshot).collect()
  }

  async fn bulk_load_with_baseline(
    &self,
    category:       &str,
    lookback_hours: u32,
    max_items:      usize,
  ) -> Result<CategoryBaselines> {
    let category_str = category.to_owned();
    let limit_val    = i64::try_from(max_items).unwrap_or(i64::MAX);
    let cutoff       = Utc::now()
      .checked_sub_signed(chrono::Duration::hours(i64::from(lookback_hours)))
      .ok_or(Error::WindowOutOfRange(lookback_hours))?;
    let cutoff_str   = encode_dt(cutoff);

    // Items and baselines are read inside one transaction so the detector
    // never sees an item state without the snapshot written alongside it.
    let (raw_items, raw_baselines): (Vec<RawItem>, Vec<RawSnapshot>) = self
      .conn
      .call(move |conn| {
        let tx = conn.transaction()?;

        let items = {
          let mut stmt = tx.prepare(LIST_BY_CATEGORY)?;
          stmt
            .query_map(rusqlite::params![category_str, limit_val], RawItem::from_row)?
            .collect::<rusqlite::Result<Vec<_>>>()?
        };

        let mut baselines = Vec::new();
        {
          let mut stmt = tx.prepare(EARLIEST_SNAPSHOT_SINCE)?;
          for item in &items {
            let baseline = stmt
              .query_row(
                rusqlite::params![item.item_id, cutoff_str],
                RawSnapshot::from_row,
              )
              .optional()?;
            baselines.extend(baseline);
          }
        }

        tx.commit()?;
        Ok((items, baselines))
      })
      .await
      .map_err(Error::query("bulk_load_with_baseline", category))?;

    let items = raw_items
      .into_iter()
      .map(RawItem::into_item)
      .collect::<Result<Vec<_>>>()?;

    let baselines = raw_baselines
      .into_iter()
      .map(|raw| raw.into_snapshot().map(|s| (s.item_id, s)))
      .collect::<Result<HashMap<_, _>>>()?;

    Ok(CategoryBaselines { items, baselines })
  }
}
