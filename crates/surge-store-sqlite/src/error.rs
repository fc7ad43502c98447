//! Error type for `surge-store-sqlite`.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
  /// Opening the database or initialising the schema failed.
  #[error("database error: {0}")]
  Database(#[from] tokio_rusqlite::Error),

  /// A store operation failed; `key` names the URL, item or category involved.
  #[error("database error in {op} ({key}): {source}")]
  Query {
    op:     &'static str,
    key:    String,
    #[source]
    source: tokio_rusqlite::Error,
  },

  #[error("uuid parse error: {0}")]
  Uuid(#[from] uuid::Error),

  #[error("date/time parse error: {0}")]
  DateParse(String),

  /// `now - lookback_hours` is not a representable timestamp.
  #[error("lookback window of {0} hours is out of range")]
  WindowOutOfRange(u32),

  /// A usage counter does not fit the column or the domain type.
  #[error("uses_count out of range: {0}")]
  CountOutOfRange(i128),
}

impl Error {
  /// Adapter for `map_err` that attaches the failing operation and key.
  pub(crate) fn query(
    op: &'static str,
    key: impl ToString,
  ) -> impl FnOnce(tokio_rusqlite::Error) -> Self {
    let key = key.to_string();
    move |source| Self::Query { op, key, source }
  }
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
