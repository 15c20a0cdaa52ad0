//! Error type for `tally-store-sqlite`.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
  #[error("database error: {0}")]
  Database(#[from] tokio_rusqlite::Error),

  #[error("sqlite error: {0}")]
  Sqlite(#[from] rusqlite::Error),

  #[error("uuid parse error: {0}")]
  Uuid(#[from] uuid::Error),

  #[error("decimal parse error: {0}")]
  Decimal(#[from] rust_decimal::Error),

  #[error("date/time parse error: {0}")]
  DateParse(String),

  #[error("unknown {column} value: {value:?}")]
  UnknownVariant { column: &'static str, value: String },
}

/// Storage failures surface to the engine as [`tally_core::Error::Storage`].
impl From<Error> for tally_core::Error {
  fn from(err: Error) -> Self { tally_core::Error::Storage(Box::new(err)) }
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
