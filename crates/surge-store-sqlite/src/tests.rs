//! Integration tests for `SqliteStore` against an in-memory database.

use std::sync::Arc;

use chrono::{Duration, Utc};
use surge_core::{
  criteria::TrendCriteria,
  detector::{Growth, TrendDetector},
  item::Observation,
  store::TimeSeriesStore,
};
use uuid::Uuid;

use crate::SqliteStore;

async fn store() -> SqliteStore {
  SqliteStore::open_in_memory()
    .await
    .expect("in-memory store")
}

fn obs(url: &str, uses_count: u64, category: &str) -> Observation {
  Observation::new(url, format!("Track {url}"), "DJ Test", uses_count, category)
}

// ─── record_observation ──────────────────────────────────────────────────────

#[tokio::test]
async fn record_creates_item_with_one_snapshot() {
  let s = store().await;

  let item = s.record_observation(obs("u1", 1000, "tech")).await.unwrap();
  assert_eq!(item.url, "u1");
  assert_eq!(item.uses_count, 1000);
  assert_eq!(item.created_at, item.updated_at);

  let history = s.snapshot_history(item.item_id, None).await.unwrap();
  assert_eq!(history.len(), 1);
  assert_eq!(history[0].uses_count, 1000);
  assert_eq!(history[0].item_id, item.item_id);
  assert_eq!(history[0].recorded_at, item.updated_at);
}

#[tokio::test]
async fn record_existing_url_updates_in_place() {
  let s = store().await;

  let first = s.record_observation(obs("u1", 1000, "tech")).await.unwrap();

  let mut next = obs("u1", 1500, "gaming");
  next.title = "Renamed".into();
  next.author = "New Author".into();
  let second = s.record_observation(next).await.unwrap();

  assert_eq!(second.item_id, first.item_id);
  assert_eq!(second.created_at, first.created_at);
  assert!(second.updated_at >= first.updated_at);
  assert_eq!(second.title, "Renamed");
  assert_eq!(second.author, "New Author");
  assert_eq!(second.category, "gaming");
  assert_eq!(second.uses_count, 1500);

  let history = s.snapshot_history(first.item_id, None).await.unwrap();
  let counts: Vec<u64> = history.iter().map(|h| h.uses_count).collect();
  assert_eq!(counts, [1000, 1500]);

  // The item moved categories with its latest observation.
  assert!(s.list_by_category("tech", 10).await.unwrap().is_empty());
  assert_eq!(s.list_by_category("gaming", 10).await.unwrap().len(), 1);
}

#[tokio::test]
async fn repeated_identical_observations_keep_one_item() {
  let s = store().await;

  for _ in 0..5 {
    s.record_observation(obs("same", 700, "tech")).await.unwrap();
  }

  let items = s.list_by_category("tech", 10).await.unwrap();
  assert_eq!(items.len(), 1);

  let history = s.snapshot_history(items[0].item_id, None).await.unwrap();
  assert_eq!(history.len(), 5);
  assert!(history.iter().all(|h| h.uses_count == 700));
}

#[tokio::test]
async fn uses_count_may_decrease() {
  let s = store().await;
  s.record_observation(obs("u", 5000, "tech")).await.unwrap();
  let item = s.record_observation(obs("u", 4200, "tech")).await.unwrap();
  assert_eq!(item.uses_count, 4200);
}

#[tokio::test]
async fn backfilled_observation_does_not_clobber_current_state() {
  let s = store().await;
  let now = Utc::now();

  let current = s.record_observation_at(obs("u", 3000, "tech"), now).await.unwrap();
  let after = s
    .record_observation_at(obs("u", 100, "tech"), now - Duration::hours(6))
    .await
    .unwrap();

  assert_eq!(after.item_id, current.item_id);
  assert_eq!(after.uses_count, 3000);
  assert_eq!(after.updated_at, current.updated_at);

  // History is still appended, in time order.
  let history = s.snapshot_history(current.item_id, None).await.unwrap();
  let counts: Vec<u64> = history.iter().map(|h| h.uses_count).collect();
  assert_eq!(counts, [100, 3000]);
}

#[tokio::test]
async fn concurrent_observations_of_one_url_create_one_item() {
  let s = store().await;

  let mut tasks = tokio::task::JoinSet::new();
  for n in 0..16u64 {
    let s = s.clone();
    tasks.spawn(async move { s.record_observation(obs("hot", 500 + n, "tech")).await });
  }

  let mut ids = Vec::new();
  while let Some(joined) = tasks.join_next().await {
    ids.push(joined.unwrap().unwrap().item_id);
  }
  ids.dedup();
  assert_eq!(ids.len(), 1);

  let items = s.list_by_category("tech", 100).await.unwrap();
  assert_eq!(items.len(), 1);
  let history = s.snapshot_history(items[0].item_id, None).await.unwrap();
  assert_eq!(history.len(), 16);
}

#[tokio::test]
async fn concurrent_connections_to_one_file_create_one_item() {
  let dir = tempfile::tempdir().unwrap();
  let path = dir.path().join("surge.db");

  let a = SqliteStore::open(&path).await.unwrap();
  let b = SqliteStore::open(&path).await.unwrap();

  let write = |s: SqliteStore| async move {
    for n in 0..10u64 {
      s.record_observation(obs("shared", 900 + n, "beauty")).await.unwrap();
    }
  };
  tokio::join!(write(a.clone()), write(b.clone()));

  let items = a.list_by_category("beauty", 10).await.unwrap();
  assert_eq!(items.len(), 1);
  let history = b.snapshot_history(items[0].item_id, None).await.unwrap();
  assert_eq!(history.len(), 20);
}

#[tokio::test]
async fn data_survives_reopen() {
  let dir = tempfile::tempdir().unwrap();
  let path = dir.path().join("surge.db");

  let created = {
    let s = SqliteStore::open(&path).await.unwrap();
    s.record_observation(obs("kept", 1234, "comedy")).await.unwrap()
  };

  let s = SqliteStore::open(&path).await.unwrap();
  let fetched = s.get_item_by_url("kept").await.unwrap().unwrap();
  assert_eq!(fetched, created);
}

// ─── Reads ───────────────────────────────────────────────────────────────────

#[tokio::test]
async fn round_trip_through_list_by_category() {
  let s = store().await;
  s.record_observation(Observation::new("u1", "T", "A", 1000, "tech"))
    .await
    .unwrap();

  let items = s.list_by_category("tech", 10).await.unwrap();
  let found = items.iter().find(|i| i.url == "u1").unwrap();
  assert_eq!(found.uses_count, 1000);
  assert_eq!(found.title, "T");
  assert_eq!(found.author, "A");
}

#[tokio::test]
async fn list_orders_by_recency_then_url_and_truncates() {
  let s = store().await;
  let now = Utc::now();

  s.record_observation_at(obs("old", 1, "tech"), now - Duration::hours(3)).await.unwrap();
  s.record_observation_at(obs("b-new", 1, "tech"), now).await.unwrap();
  s.record_observation_at(obs("a-new", 1, "tech"), now).await.unwrap();
  s.record_observation_at(obs("mid", 1, "tech"), now - Duration::hours(1)).await.unwrap();
  s.record_observation_at(obs("elsewhere", 1, "fitness"), now).await.unwrap();

  let items = s.list_by_category("tech", 10).await.unwrap();
  let urls: Vec<&str> = items.iter().map(|i| i.url.as_str()).collect();
  assert_eq!(urls, ["a-new", "b-new", "mid", "old"]);

  let top = s.list_by_category("tech", 2).await.unwrap();
  assert_eq!(top.len(), 2);
}

#[tokio::test]
async fn get_item_by_url_missing_returns_none() {
  let s = store().await;
  assert!(s.get_item_by_url("nope").await.unwrap().is_none());
}

#[tokio::test]
async fn earliest_snapshot_since_uses_window_not_absolute_oldest() {
  let s = store().await;
  let now = Utc::now();

  s.record_observation_at(obs("u", 100, "tech"), now - Duration::hours(48)).await.unwrap();
  s.record_observation_at(obs("u", 400, "tech"), now - Duration::hours(20)).await.unwrap();
  let item = s.record_observation_at(obs("u", 900, "tech"), now).await.unwrap();

  let baseline = s
    .earliest_snapshot_since(item.item_id, now - Duration::hours(24))
    .await
    .unwrap()
    .unwrap();
  assert_eq!(baseline.uses_count, 400);

  let boundary = s
    .earliest_snapshot_since(item.item_id, baseline.recorded_at)
    .await
    .unwrap()
    .unwrap();
  assert_eq!(boundary.snapshot_id, baseline.snapshot_id);

  let none = s
    .earliest_snapshot_since(item.item_id, now + Duration::hours(1))
    .await
    .unwrap();
  assert!(none.is_none());
}

#[tokio::test]
async fn earliest_snapshot_since_unknown_item_is_none() {
  let s = store().await;
  let result = s.earliest_snapshot_since(Uuid::new_v4(), Utc::now()).await.unwrap();
  assert!(result.is_none());
}

#[tokio::test]
async fn snapshot_history_filters_by_since() {
  let s = store().await;
  let now = Utc::now();

  for hours in [30, 20, 10] {
    s.record_observation_at(obs("u", 1000 - hours, "tech"), now - Duration::hours(hours as i64))
      .await
      .unwrap();
  }
  let item = s.get_item_by_url("u").await.unwrap().unwrap();

  let all = s.snapshot_history(item.item_id, None).await.unwrap();
  assert_eq!(all.len(), 3);
  assert!(all.windows(2).all(|w| w[0].recorded_at <= w[1].recorded_at));

  let recent = s
    .snapshot_history(item.item_id, Some(now - Duration::hours(24)))
    .await
    .unwrap();
  let counts: Vec<u64> = recent.iter().map(|h| h.uses_count).collect();
  assert_eq!(counts, [980, 990]);
}

#[tokio::test]
async fn bulk_load_omits_items_without_baseline() {
  let s = store().await;
  let now = Utc::now();

  let stale = s
    .record_observation_at(obs("stale", 5000, "tech"), now - Duration::hours(30))
    .await
    .unwrap();
  s.record_observation_at(obs("fresh", 1000, "tech"), now - Duration::hours(2))
    .await
    .unwrap();
  let fresh = s.record_observation(obs("fresh", 1200, "tech")).await.unwrap();

  let loaded = s.bulk_load_with_baseline("tech", 24, 1000).await.unwrap();
  assert_eq!(loaded.items.len(), 2);
  assert!(loaded.baseline(stale.item_id).is_none());
  assert_eq!(loaded.baseline(fresh.item_id).unwrap().uses_count, 1000);
}

#[tokio::test]
async fn bulk_load_respects_max_items() {
  let s = store().await;
  for n in 0..5 {
    s.record_observation(obs(&format!("u{n}"), 100, "tech")).await.unwrap();
  }
  let loaded = s.bulk_load_with_baseline("tech", 24, 3).await.unwrap();
  assert_eq!(loaded.items.len(), 3);
  assert_eq!(loaded.baselines.len(), 3);
}

#[tokio::test]
async fn bulk_load_rejects_unrepresentable_window() {
  let s = store().await;
  s.record_observation(obs("u", 1000, "tech")).await.unwrap();

  let err = s.bulk_load_with_baseline("tech", u32::MAX, 10).await.unwrap_err();
  assert!(matches!(err, crate::Error::WindowOutOfRange(u32::MAX)));
}

// ─── Detection end to end ────────────────────────────────────────────────────

async fn seed(s: &SqliteStore, url: &str, old: u64, current: u64) {
  s.record_observation_at(obs(url, old, "tech"), Utc::now() - Duration::hours(23))
    .await
    .unwrap();
  s.record_observation(obs(url, current, "tech")).await.unwrap();
}

#[tokio::test]
async fn growth_of_160_percent_against_thresholds() {
  let s = store().await;
  seed(&s, "rising", 1000, 2600).await;
  let detector = TrendDetector::new(Arc::new(s));

  let at_150 = TrendCriteria { min_growth_percent: 150.0, ..Default::default() };
  let results = detector
    .detect_trending_with_criteria("tech", 10, &at_150)
    .await
    .unwrap();
  assert_eq!(results.len(), 1);
  assert_eq!(results[0].growth, Growth::Established { percent: 160.0 });
  assert_eq!(results[0].old_uses_count, 1000);
  assert_eq!(results[0].item.uses_count, 2600);

  let at_170 = TrendCriteria { min_growth_percent: 170.0, ..Default::default() };
  let results = detector
    .detect_trending_with_criteria("tech", 10, &at_170)
    .await
    .unwrap();
  assert!(results.is_empty());
}

#[tokio::test]
async fn detector_rejects_lookback_beyond_maximum() {
  let s = store().await;
  seed(&s, "rising", 1000, 2600).await;
  let detector = TrendDetector::new(Arc::new(s));

  let huge = TrendCriteria { lookback_hours: u32::MAX, ..Default::default() };
  let err = detector
    .detect_trending_with_criteria("tech", 10, &huge)
    .await
    .unwrap_err();
  assert!(matches!(err, surge_core::Error::InvalidCriteria(_)));
}

#[tokio::test]
async fn item_without_snapshot_in_window_is_excluded() {
  let s = store().await;
  s.record_observation_at(obs("quiet", 5000, "tech"), Utc::now() - Duration::hours(30))
    .await
    .unwrap();
  let detector = TrendDetector::new(Arc::new(s));

  let loose = TrendCriteria { min_growth_percent: -100.0, ..Default::default() };
  let results = detector
    .detect_trending_with_criteria("tech", 0, &loose)
    .await
    .unwrap();
  assert!(results.is_empty());
}

#[tokio::test]
async fn limit_keeps_the_faster_grower() {
  let s = store().await;
  seed(&s, "eighty", 1000, 1800).await;
  seed(&s, "two-hundred", 1000, 3000).await;
  let detector = TrendDetector::new(Arc::new(s));

  let loose = TrendCriteria { min_growth_percent: 50.0, ..Default::default() };
  let results = detector
    .detect_trending_with_criteria("tech", 1, &loose)
    .await
    .unwrap();
  assert_eq!(results.len(), 1);
  assert_eq!(results[0].item.url, "two-hundred");
  assert_eq!(results[0].growth.percent(), Some(200.0));
}

#[tokio::test]
async fn zero_baseline_is_reported_as_new() {
  let s = store().await;
  seed(&s, "breakout", 0, 800).await;
  let detector = TrendDetector::new(Arc::new(s));

  let results = detector.detect_trending("tech", 10).await.unwrap();
  assert_eq!(results.len(), 1);
  assert_eq!(results[0].growth, Growth::New);
  assert_eq!(results[0].old_uses_count, 0);
}

#[tokio::test]
async fn analysis_over_real_store() {
  let s = store().await;
  seed(&s, "a", 1000, 3000).await; // 200 %
  seed(&s, "b", 1000, 2600).await; // 160 %
  seed(&s, "c", 1000, 1100).await; // 10 %, below threshold
  let detector = TrendDetector::new(Arc::new(s));

  let analysis = detector.analyze_category("tech").await.unwrap();
  assert_eq!(analysis.trending_count, 2);
  assert_eq!(analysis.average_growth, Some(180.0));
  assert_eq!(analysis.top_item.unwrap().item.url, "a");
}
