//! The persistence collaborator: [`ProductionStore`] hands out units of work,
//! and every engine component reads and writes through the [`UnitOfWork`] it
//! is given.
//!
//! A unit of work is a single database transaction. Everything done through
//! one handle commits together or not at all, which is what makes the
//! completion protocol atomic. The handle is passed explicitly into ledger,
//! resolver and costing calls so that the transactional scope is visible in
//! every signature.

use std::future::Future;

use rust_decimal::Decimal;
use uuid::Uuid;

use crate::{
  Result,
  bom::BomLine,
  ledger::{StockEffect, StockTransaction, TransactionQuery},
  product::{Product, ProductKind},
  production_log::{ProductionLog, ProductionLogQuery},
  work_order::{WorkOrder, WorkOrderQuery},
};

// ─── UnitOfWork ──────────────────────────────────────────────────────────────

/// Typed access to the tables the engine touches, scoped to one transaction.
///
/// Reads take `&self`; writes take `&mut self`. Implementations must bind
/// every caller-supplied value as a query parameter.
pub trait UnitOfWork {
  // ── Products ──────────────────────────────────────────────────────────

  fn product(&self, id: Uuid) -> Result<Option<Product>>;

  /// Batch fetch. Ids that do not exist are simply absent from the result.
  fn products_by_ids(&self, ids: &[Uuid]) -> Result<Vec<Product>>;

  /// All products, optionally of one kind, ordered by name.
  fn list_products(&self, kind: Option<ProductKind>) -> Result<Vec<Product>>;

  /// Products whose on-hand quantity is at or below their minimum stock,
  /// ordered by name.
  fn low_stock_products(&self) -> Result<Vec<Product>>;

  fn insert_product(&mut self, product: &Product) -> Result<()>;

  /// Apply a ledger effect to the on-hand quantity in place. Returns `false`
  /// if the product does not exist.
  fn apply_stock_effect(&mut self, product_id: Uuid, effect: StockEffect) -> Result<bool>;

  /// Overwrite the unit cost (and the legacy price column). Returns `false`
  /// if the product does not exist.
  fn set_unit_cost(&mut self, product_id: Uuid, unit_cost: Decimal) -> Result<bool>;

  // ── Bill of materials ─────────────────────────────────────────────────

  fn bom_line(&self, id: Uuid) -> Result<Option<BomLine>>;

  /// Active lines, either of one finished product or of all of them.
  fn active_bom_lines(&self, finished_product_id: Option<Uuid>) -> Result<Vec<BomLine>>;

  fn insert_bom_line(&mut self, line: &BomLine) -> Result<()>;

  fn update_bom_line(&mut self, line: &BomLine) -> Result<()>;

  // ── Stock ledger ──────────────────────────────────────────────────────

  /// Append a ledger row. Only [`crate::ledger::record`] should call this,
  /// so that the row and its quantity effect always travel together.
  fn insert_stock_transaction(&mut self, transaction: &StockTransaction) -> Result<()>;

  fn stock_transactions(&self, query: &TransactionQuery) -> Result<Vec<StockTransaction>>;

  // ── Work orders ───────────────────────────────────────────────────────

  fn work_order(&self, id: Uuid) -> Result<Option<WorkOrder>>;

  /// Matching orders, newest first.
  fn work_orders(&self, query: &WorkOrderQuery) -> Result<Vec<WorkOrder>>;

  fn insert_work_order(&mut self, order: &WorkOrder) -> Result<()>;

  fn update_work_order(&mut self, order: &WorkOrder) -> Result<()>;

  fn delete_work_order(&mut self, id: Uuid) -> Result<bool>;

  // ── Production logs ───────────────────────────────────────────────────

  fn insert_production_log(&mut self, log: &ProductionLog) -> Result<()>;

  /// Matching logs, newest first.
  fn production_logs(&self, query: &ProductionLogQuery) -> Result<Vec<ProductionLog>>;
}

// ─── ProductionStore ─────────────────────────────────────────────────────────

/// A backend that can run closures inside a unit of work.
///
/// `transact` commits when the closure returns `Ok` and rolls back when it
/// returns `Err`. Writers to the same product are serialized by the backend.
/// `read` runs against a consistent snapshot and never writes.
///
/// All methods return `Send` futures so the store can sit behind an axum
/// router on a multi-threaded runtime.
pub trait ProductionStore: Send + Sync {
  fn transact<F, T>(&self, f: F) -> impl Future<Output = Result<T>> + Send + '_
  where
    F: FnOnce(&mut dyn UnitOfWork) -> Result<T> + Send + 'static,
    T: Send + 'static;

  fn read<F, T>(&self, f: F) -> impl Future<Output = Result<T>> + Send + '_
  where
    F: FnOnce(&dyn UnitOfWork) -> Result<T> + Send + 'static,
    T: Send + 'static;
}
