//! [`SqliteStore`]: the SQLite implementation of [`ProductionStore`].

use std::{path::Path, time::Duration};

use rusqlite::TransactionBehavior;
use tally_core::store::{ProductionStore, UnitOfWork};

use crate::{Error, Result, schema::SCHEMA, unit::SqliteUnit};

/// How long a writer waits on a locked database before giving up.
pub const DEFAULT_BUSY_TIMEOUT: Duration = Duration::from_secs(5);

// ─── Store ───────────────────────────────────────────────────────────────────

/// A Tally production store backed by a single SQLite file.
///
/// All access goes through one background connection, and every write runs
/// in a `BEGIN IMMEDIATE` transaction, so concurrent completions touching the
/// same products are serialized.
///
/// Cloning is cheap; the inner connection is reference-counted.
#[derive(Clone)]
pub struct SqliteStore {
  pub(crate) conn: tokio_rusqlite::Connection,
}

impl SqliteStore {
  /// Open (or create) a store at `path` and run schema initialisation.
  pub async fn open(path: impl AsRef<Path>) -> Result<Self> {
    Self::open_with_busy_timeout(path, DEFAULT_BUSY_TIMEOUT).await
  }

  pub async fn open_with_busy_timeout(path: impl AsRef<Path>, busy_timeout: Duration) -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open(path).await?;
    let store = Self { conn };
    store.init(busy_timeout).await?;
    Ok(store)
  }

  /// Open an in-memory store for tests.
  pub async fn open_in_memory() -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open_in_memory().await?;
    let store = Self { conn };
    store.init(DEFAULT_BUSY_TIMEOUT).await?;
    Ok(store)
  }

  async fn init(&self, busy_timeout: Duration) -> Result<()> {
    self
      .conn
      .call(move |conn| {
        conn.busy_timeout(busy_timeout)?;
        conn.execute_batch(SCHEMA)?;
        Ok(())
      })
      .await?;
    Ok(())
  }
}

/// Flatten the connection-level result into the engine's result. Errors from
/// inside the unit were already logged by [`SqliteUnit`].
fn settle<T>(outcome: Result<tally_core::Result<T>, tokio_rusqlite::Error>) -> tally_core::Result<T> {
  match outcome {
    Ok(result) => result,
    Err(err) => {
      tracing::error!(error = %err, "transaction failed");
      Err(Error::Database(err).into())
    }
  }
}

// ─── ProductionStore impl ────────────────────────────────────────────────────

impl ProductionStore for SqliteStore {
  async fn transact<F, T>(&self, f: F) -> tally_core::Result<T>
  where
    F: FnOnce(&mut dyn UnitOfWork) -> tally_core::Result<T> + Send + 'static,
    T: Send + 'static,
  {
    let outcome = self
      .conn
      .call(move |conn| {
        let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;
        let result = f(&mut SqliteUnit::new(&tx));
        match result {
          Ok(value) => {
            tx.commit()?;
            Ok(Ok(value))
          }
          Err(err) => {
            tx.rollback()?;
            Ok(Err(err))
          }
        }
      })
      .await;
    settle(outcome)
  }

  async fn read<F, T>(&self, f: F) -> tally_core::Result<T>
  where
    F: FnOnce(&dyn UnitOfWork) -> tally_core::Result<T> + Send + 'static,
    T: Send + 'static,
  {
    let outcome = self
      .conn
      .call(move |conn| {
        // Deferred: a consistent snapshot for multi-query reads.
        let tx = conn.transaction_with_behavior(TransactionBehavior::Deferred)?;
        let result = f(&SqliteUnit::new(&tx));
        tx.rollback()?;
        Ok(result)
      })
      .await;
    settle(outcome)
  }
}
