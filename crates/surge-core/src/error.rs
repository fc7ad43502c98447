//! Error types for `surge-core`.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
  #[error("invalid trend criteria: {0}")]
  InvalidCriteria(String),

  /// A storage backend failed while serving `op` for `key`.
  #[error("store error in {op} ({key}): {source}")]
  Store {
    op:     &'static str,
    key:    String,
    #[source]
    source: Box<dyn std::error::Error + Send + Sync>,
  },
}

impl Error {
  pub(crate) fn store<E>(op: &'static str, key: impl Into<String>, source: E) -> Self
  where
    E: std::error::Error + Send + Sync + 'static,
  {
    Self::Store { op, key: key.into(), source: Box::new(source) }
  }
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
