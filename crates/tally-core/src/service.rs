//! [`ProductionService`]: the async entry point callers use.
//!
//! Each method is one unit of work: writes go through
//! [`ProductionStore::transact`] and reads through [`ProductionStore::read`],
//! with the engine functions doing the actual work inside the closure.

use std::sync::Arc;

use rust_decimal::Decimal;
use uuid::Uuid;

use crate::{
  Result,
  bom::{self, BomLine, BomLineChanges, BomLineView, NewBomLine, ResolvedLine},
  costing::{self, CostRepair},
  engine::{self, Completion, EngineConfig},
  ledger::{self, NewStockTransaction, Reconciliation, StockTransaction, TransactionQuery},
  product::{NewProduct, Product, ProductKind},
  production_log::{NewProductionLog, ProductionLog, ProductionLogQuery},
  store::ProductionStore,
  work_order::{
    NewWorkOrder, WorkOrder, WorkOrderChanges, WorkOrderQuery, WorkOrderWithLogs,
    validate_order_quantity,
  },
};

/// Cloning is cheap; the store is reference-counted.
pub struct ProductionService<S> {
  store:  Arc<S>,
  config: EngineConfig,
}

impl<S> Clone for ProductionService<S> {
  fn clone(&self) -> Self {
    Self { store: Arc::clone(&self.store), config: self.config }
  }
}

impl<S: ProductionStore> ProductionService<S> {
  pub fn new(store: Arc<S>, config: EngineConfig) -> Self { Self { store, config } }

  pub fn config(&self) -> EngineConfig { self.config }

  pub fn store(&self) -> &Arc<S> { &self.store }

  // ── Products ──────────────────────────────────────────────────────────────

  #[tracing::instrument(skip(self))]
  pub async fn add_product(&self, input: NewProduct) -> Result<Product> {
    self.store.transact(move |uow| engine::add_product(uow, input)).await
  }

  pub async fn product(&self, id: Uuid) -> Result<Product> {
    self.store.read(move |uow| engine::load_product(uow, id)).await
  }

  pub async fn list_products(&self, kind: Option<ProductKind>) -> Result<Vec<Product>> {
    self.store.read(move |uow| uow.list_products(kind)).await
  }

  pub async fn finished_products(&self) -> Result<Vec<Product>> {
    self.list_products(Some(ProductKind::FinishedGood)).await
  }

  pub async fn raw_materials(&self) -> Result<Vec<Product>> {
    self.list_products(Some(ProductKind::RawMaterial)).await
  }

  /// Products at or below their minimum stock.
  pub async fn low_stock_products(&self) -> Result<Vec<Product>> {
    self.store.read(|uow| uow.low_stock_products()).await
  }

  // ── Bill of materials ─────────────────────────────────────────────────────

  #[tracing::instrument(skip(self))]
  pub async fn add_bom_line(&self, input: NewBomLine) -> Result<BomLine> {
    self.store.transact(move |uow| engine::add_bom_line(uow, input)).await
  }

  #[tracing::instrument(skip(self))]
  pub async fn update_bom_line(&self, id: Uuid, changes: BomLineChanges) -> Result<BomLine> {
    self
      .store
      .transact(move |uow| engine::update_bom_line(uow, id, changes))
      .await
  }

  #[tracing::instrument(skip(self))]
  pub async fn deactivate_bom_line(&self, id: Uuid) -> Result<BomLine> {
    self
      .store
      .transact(move |uow| engine::deactivate_bom_line(uow, id))
      .await
  }

  pub async fn bom_line(&self, id: Uuid) -> Result<BomLine> {
    self.store.read(move |uow| engine::load_bom_line(uow, id)).await
  }

  pub async fn bom_lines(&self) -> Result<Vec<BomLineView>> {
    self.store.read(bom::list_active).await
  }

  pub async fn bom_for_product(&self, finished_product_id: Uuid) -> Result<Vec<BomLine>> {
    self
      .store
      .read(move |uow| {
        engine::load_product(uow, finished_product_id)?;
        uow.active_bom_lines(Some(finished_product_id))
      })
      .await
  }

  pub async fn bom_line_exists(&self, finished_product_id: Uuid, raw_material_id: Uuid) -> Result<bool> {
    self
      .store
      .read(move |uow| bom::line_exists(uow, finished_product_id, raw_material_id))
      .await
  }

  // ── Resolution and costing ────────────────────────────────────────────────

  /// Whether `quantity` units of `product_id` can be built from current stock.
  pub async fn can_produce(&self, product_id: Uuid, quantity: i64) -> Result<bool> {
    validate_order_quantity(quantity)?;
    self
      .store
      .read(move |uow| bom::can_produce(uow, product_id, quantity))
      .await
  }

  /// The itemised resolution behind [`Self::can_produce`].
  pub async fn work_order_details(&self, product_id: Uuid, quantity: i64) -> Result<Vec<ResolvedLine>> {
    validate_order_quantity(quantity)?;
    self
      .store
      .read(move |uow| bom::resolve(uow, product_id, quantity))
      .await
  }

  pub async fn calculate_total_cost(&self, product_id: Uuid, quantity: i64) -> Result<Decimal> {
    validate_order_quantity(quantity)?;
    self
      .store
      .read(move |uow| costing::estimate_total_cost(uow, product_id, quantity))
      .await
  }

  /// Maintenance pass; see [`costing::recalculate_historical_costs`].
  #[tracing::instrument(skip(self))]
  pub async fn recalculate_historical_costs(&self) -> Result<Vec<CostRepair>> {
    let repairs = self
      .store
      .transact(costing::recalculate_historical_costs)
      .await?;
    for repair in &repairs {
      tracing::info!(
        product_id = %repair.product_id,
        work_order_id = %repair.work_order_id,
        unit_cost = %repair.unit_cost,
        estimated = repair.estimated,
        "unit cost repaired"
      );
    }
    Ok(repairs)
  }

  // ── Work orders ───────────────────────────────────────────────────────────

  #[tracing::instrument(skip(self))]
  pub async fn create_work_order(&self, input: NewWorkOrder) -> Result<WorkOrder> {
    self
      .store
      .transact(move |uow| engine::create_work_order(uow, input))
      .await
  }

  #[tracing::instrument(skip(self))]
  pub async fn update_work_order(&self, id: Uuid, changes: WorkOrderChanges) -> Result<WorkOrder> {
    self
      .store
      .transact(move |uow| engine::update_work_order(uow, id, changes))
      .await
  }

  #[tracing::instrument(skip(self))]
  pub async fn start_work_order(&self, id: Uuid) -> Result<WorkOrder> {
    self
      .store
      .transact(move |uow| engine::start_work_order(uow, id))
      .await
  }

  #[tracing::instrument(skip(self))]
  pub async fn complete_work_order(&self, id: Uuid) -> Result<Completion> {
    let config = self.config;
    let completion = self
      .store
      .transact(move |uow| engine::complete_work_order(uow, id, config))
      .await?;

    tracing::info!(
      order_number = %completion.work_order.order_number,
      produced = completion.produced.quantity,
      lines = completion.consumed.len(),
      total_cost = %completion.work_order.total_cost,
      unit_cost = %completion.unit_cost,
      "work order completed"
    );
    Ok(completion)
  }

  #[tracing::instrument(skip(self))]
  pub async fn delete_work_order(&self, id: Uuid) -> Result<()> {
    self
      .store
      .transact(move |uow| engine::delete_work_order(uow, id))
      .await
  }

  /// A work order with its production logs.
  pub async fn work_order(&self, id: Uuid) -> Result<WorkOrderWithLogs> {
    self
      .store
      .read(move |uow| engine::work_order_with_logs(uow, id))
      .await
  }

  pub async fn work_orders(&self, query: WorkOrderQuery) -> Result<Vec<WorkOrder>> {
    self.store.read(move |uow| uow.work_orders(&query)).await
  }

  /// Pending and in-progress orders.
  pub async fn active_work_orders(&self) -> Result<Vec<WorkOrder>> {
    self.work_orders(WorkOrderQuery::active()).await
  }

  // ── Stock ledger ──────────────────────────────────────────────────────────

  #[tracing::instrument(skip(self))]
  pub async fn record_transaction(&self, input: NewStockTransaction) -> Result<StockTransaction> {
    self.store.transact(move |uow| ledger::record(uow, input)).await
  }

  pub async fn transactions(&self, query: TransactionQuery) -> Result<Vec<StockTransaction>> {
    self
      .store
      .read(move |uow| uow.stock_transactions(&query))
      .await
  }

  pub async fn recent_transactions(&self, count: usize) -> Result<Vec<StockTransaction>> {
    self.transactions(TransactionQuery::recent(count)).await
  }

  pub async fn reconcile(&self, product_id: Uuid) -> Result<Reconciliation> {
    self
      .store
      .read(move |uow| ledger::reconcile(uow, product_id))
      .await
  }

  // ── Production logs ───────────────────────────────────────────────────────

  #[tracing::instrument(skip(self))]
  pub async fn log_production(&self, input: NewProductionLog) -> Result<ProductionLog> {
    self
      .store
      .transact(move |uow| engine::log_production(uow, input))
      .await
  }

  pub async fn production_logs(&self, query: ProductionLogQuery) -> Result<Vec<ProductionLog>> {
    self
      .store
      .read(move |uow| uow.production_logs(&query))
      .await
  }
}
