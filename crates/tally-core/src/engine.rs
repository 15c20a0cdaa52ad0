//! The work order orchestrator and the other multi-step writes.
//!
//! Every function here runs inside a single [`UnitOfWork`] supplied by the
//! caller and performs all of its validation before its first write, except
//! where a later step depends on an earlier one (the completion protocol).
//! Returning `Err` from any step makes the store roll the whole unit back.

use chrono::Utc;
use rust_decimal::{Decimal, prelude::ToPrimitive as _};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{
  Error, Result,
  bom::{self, BomLine, BomLineChanges, DEFAULT_UNIT, NewBomLine, validate_quantity_per_unit},
  costing,
  ledger::{self, NewStockTransaction, OPENING_REFERENCE, StockTransaction, TransactionKind},
  product::{NewProduct, Product},
  production_log::{NewProductionLog, ProductionLog, ProductionLogQuery},
  store::UnitOfWork,
  work_order::{
    NewWorkOrder, WorkOrder, WorkOrderChanges, WorkOrderStatus, WorkOrderWithLogs,
    validate_order_quantity,
  },
};

/// Engine behaviour switches, loaded from the `[engine]` config section.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct EngineConfig {
  /// Refuse to complete a work order whose BOM cannot be covered from stock.
  /// Off by default: completion consumes whatever the BOM says and lets raw
  /// materials go negative.
  #[serde(default)]
  pub enforce_stock_on_completion: bool,
}

/// Everything a completion wrote.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Completion {
  pub work_order: WorkOrder,
  /// One stock-out per BOM line needing at least one whole unit, in
  /// resolution order.
  pub consumed:   Vec<StockTransaction>,
  pub produced:   StockTransaction,
  /// The finished good's unit cost after the weighted-average update.
  pub unit_cost:  Decimal,
}

// ─── Products ────────────────────────────────────────────────────────────────

/// Insert a product and book its opening stock through the ledger.
pub fn add_product(uow: &mut dyn UnitOfWork, input: NewProduct) -> Result<Product> {
  if input.quantity < 0 {
    return Err(Error::InvalidQuantity(format!(
      "opening stock cannot be negative, got {}",
      input.quantity
    )));
  }

  let product = Product {
    product_id:     Uuid::new_v4(),
    name:           input.name,
    sku:            input.sku,
    description:    input.description,
    kind:           input.kind,
    quantity:       0,
    purchase_price: input.purchase_price,
    sale_price:     input.sale_price,
    price:          input.purchase_price,
    minimum_stock:  input.minimum_stock,
    unit:           input.unit,
    created_at:     Utc::now(),
    updated_at:     None,
  };
  uow.insert_product(&product)?;

  if input.quantity > 0 {
    ledger::record(
      uow,
      NewStockTransaction::new(product.product_id, TransactionKind::Adjustment, input.quantity)
        .with_reference(OPENING_REFERENCE)
        .with_notes("Opening stock"),
    )?;
  }

  load_product(&*uow, product.product_id)
}

pub fn load_product(uow: &dyn UnitOfWork, id: Uuid) -> Result<Product> {
  uow.product(id)?.ok_or(Error::ProductNotFound(id))
}

// ─── Bill of materials ───────────────────────────────────────────────────────

pub fn add_bom_line(uow: &mut dyn UnitOfWork, input: NewBomLine) -> Result<BomLine> {
  validate_quantity_per_unit(input.quantity_per_unit)?;
  load_product(&*uow, input.finished_product_id)?;
  load_product(&*uow, input.raw_material_id)?;

  if bom::line_exists(&*uow, input.finished_product_id, input.raw_material_id)? {
    return Err(Error::DuplicateBomLine {
      finished_product_id: input.finished_product_id,
      raw_material_id:     input.raw_material_id,
    });
  }

  let line = BomLine {
    bom_line_id:         Uuid::new_v4(),
    finished_product_id: input.finished_product_id,
    raw_material_id:     input.raw_material_id,
    quantity_per_unit:   input.quantity_per_unit,
    unit:                input.unit.unwrap_or_else(|| DEFAULT_UNIT.to_owned()),
    notes:               input.notes,
    is_active:           true,
    created_at:          Utc::now(),
    updated_at:          None,
  };
  uow.insert_bom_line(&line)?;
  Ok(line)
}

pub fn load_bom_line(uow: &dyn UnitOfWork, id: Uuid) -> Result<BomLine> {
  uow.bom_line(id)?.ok_or(Error::BomLineNotFound(id))
}

pub fn update_bom_line(uow: &mut dyn UnitOfWork, id: Uuid, changes: BomLineChanges) -> Result<BomLine> {
  let mut line = load_bom_line(&*uow, id)?;

  if let Some(quantity) = changes.quantity_per_unit {
    validate_quantity_per_unit(quantity)?;
    line.quantity_per_unit = quantity;
  }
  if let Some(unit) = changes.unit {
    line.unit = unit;
  }
  if let Some(notes) = changes.notes {
    line.notes = Some(notes);
  }
  if let Some(active) = changes.is_active {
    let reactivating = active && !line.is_active;
    if reactivating && bom::line_exists(&*uow, line.finished_product_id, line.raw_material_id)? {
      return Err(Error::DuplicateBomLine {
        finished_product_id: line.finished_product_id,
        raw_material_id:     line.raw_material_id,
      });
    }
    line.is_active = active;
  }

  line.updated_at = Some(Utc::now());
  uow.update_bom_line(&line)?;
  Ok(line)
}

/// Soft delete: the line stays on record but drops out of resolution.
pub fn deactivate_bom_line(uow: &mut dyn UnitOfWork, id: Uuid) -> Result<BomLine> {
  update_bom_line(uow, id, BomLineChanges { is_active: Some(false), ..Default::default() })
}

// ─── Work orders ─────────────────────────────────────────────────────────────

pub fn load_work_order(uow: &dyn UnitOfWork, id: Uuid) -> Result<WorkOrder> {
  uow.work_order(id)?.ok_or(Error::WorkOrderNotFound(id))
}

pub fn work_order_with_logs(uow: &dyn UnitOfWork, id: Uuid) -> Result<WorkOrderWithLogs> {
  let work_order = load_work_order(uow, id)?;
  let logs = uow.production_logs(&ProductionLogQuery {
    work_order_id: Some(id),
    limit:         None,
  })?;
  Ok(WorkOrderWithLogs { work_order, logs })
}

/// Create a pending work order priced at current BOM cost.
pub fn create_work_order(uow: &mut dyn UnitOfWork, input: NewWorkOrder) -> Result<WorkOrder> {
  validate_order_quantity(input.quantity_ordered)?;
  let total_cost = costing::estimate_total_cost(&*uow, input.product_id, input.quantity_ordered)?;

  let order = WorkOrder {
    work_order_id:     Uuid::new_v4(),
    order_number:      input.order_number,
    product_id:        input.product_id,
    quantity_ordered:  input.quantity_ordered,
    quantity_produced: 0,
    total_cost,
    status:            WorkOrderStatus::Pending,
    duration_minutes:  input.duration_minutes,
    start_date:        None,
    completion_date:   None,
    notes:             input.notes,
    build_reference:   input.build_reference,
    created_at:        Utc::now(),
    updated_at:        None,
  };
  uow.insert_work_order(&order)?;
  Ok(order)
}

/// Apply edits to an open order and re-price it at current BOM cost.
pub fn update_work_order(uow: &mut dyn UnitOfWork, id: Uuid, changes: WorkOrderChanges) -> Result<WorkOrder> {
  let mut order = load_work_order(&*uow, id)?;
  order.ensure_open()?;

  if let Some(next) = changes.status
    && next != order.status
  {
    // Starting and completing carry side effects; they have their own entry
    // points.
    if matches!(next, WorkOrderStatus::InProgress | WorkOrderStatus::Completed) {
      return Err(Error::InvalidTransition { from: order.status, to: next });
    }
    order.transition_to(next)?;
  }

  if let Some(quantity) = changes.quantity_ordered {
    validate_order_quantity(quantity)?;
    order.quantity_ordered = quantity;
  }
  if let Some(order_number) = changes.order_number {
    order.order_number = order_number;
  }
  if let Some(product_id) = changes.product_id {
    order.product_id = product_id;
  }
  if let Some(minutes) = changes.duration_minutes {
    order.duration_minutes = minutes;
  }
  if let Some(notes) = changes.notes {
    order.notes = Some(notes);
  }
  if let Some(reference) = changes.build_reference {
    order.build_reference = Some(reference);
  }

  order.total_cost = costing::estimate_total_cost(&*uow, order.product_id, order.quantity_ordered)?;
  order.updated_at = Some(Utc::now());
  uow.update_work_order(&order)?;
  Ok(order)
}

pub fn start_work_order(uow: &mut dyn UnitOfWork, id: Uuid) -> Result<WorkOrder> {
  let mut order = load_work_order(&*uow, id)?;
  order.transition_to(WorkOrderStatus::InProgress)?;

  let now = Utc::now();
  order.start_date = Some(now);
  order.updated_at = Some(now);
  uow.update_work_order(&order)?;
  Ok(order)
}

/// Run the completion protocol: consume every BOM line, settle the cost,
/// update the finished good's weighted-average cost, book the output, and
/// close the order.
///
/// All of it happens in `uow`; an error at any step leaves nothing behind
/// once the store rolls the unit back.
pub fn complete_work_order(uow: &mut dyn UnitOfWork, id: Uuid, config: EngineConfig) -> Result<Completion> {
  let mut order = load_work_order(&*uow, id)?;
  let completed = order.status.transition_to(WorkOrderStatus::Completed)?;
  let product = load_product(&*uow, order.product_id)?;

  let lines = bom::resolve(&*uow, order.product_id, order.quantity_ordered)?;
  if config.enforce_stock_on_completion
    && let Some(short) = lines.iter().find(|l| !l.is_available)
  {
    return Err(Error::InsufficientStock {
      product_id: short.raw_material_id,
      needed:     short.quantity_needed,
      on_hand:    short.on_hand,
    });
  }

  let reference = order.ledger_reference();
  let mut consumed = Vec::with_capacity(lines.len());
  for line in &lines {
    let quantity = whole_units(line.quantity_needed)?;
    if Decimal::from(quantity) != line.quantity_needed {
      tracing::warn!(
        work_order_id = %order.work_order_id,
        raw_material_id = %line.raw_material_id,
        needed = %line.quantity_needed,
        consumed = quantity,
        "fractional requirement truncated to whole units"
      );
    }
    if quantity == 0 {
      continue;
    }

    consumed.push(ledger::record(
      uow,
      NewStockTransaction::new(line.raw_material_id, TransactionKind::Out, quantity)
        .with_reference(reference.clone())
        .with_notes(format!("Consumed for production of {}", product.name)),
    )?);
  }

  let settlement = costing::total_cost(&lines)?;
  let unit_cost = costing::apply_weighted_average(
    uow,
    order.product_id,
    order.quantity_ordered,
    settlement,
  )?;

  let produced = ledger::record(
    uow,
    NewStockTransaction::new(order.product_id, TransactionKind::In, order.quantity_ordered)
      .with_reference(reference)
      .with_notes("Production completed"),
  )?;

  let now = Utc::now();
  order.status = completed;
  order.total_cost = settlement;
  order.quantity_produced = order.quantity_ordered;
  order.completion_date = Some(now);
  order.updated_at = Some(now);
  uow.update_work_order(&order)?;

  Ok(Completion { work_order: order, consumed, produced, unit_cost })
}

/// Remove an order that never completed. Completed orders are referenced by
/// ledger rows and stay.
pub fn delete_work_order(uow: &mut dyn UnitOfWork, id: Uuid) -> Result<()> {
  let order = load_work_order(&*uow, id)?;
  if order.status == WorkOrderStatus::Completed {
    return Err(Error::WorkOrderClosed { id, status: order.status });
  }
  uow.delete_work_order(id)?;
  Ok(())
}

// ─── Production logs ─────────────────────────────────────────────────────────

pub fn log_production(uow: &mut dyn UnitOfWork, input: NewProductionLog) -> Result<ProductionLog> {
  if input.quantity_produced < 0 {
    return Err(Error::InvalidQuantity(format!(
      "logged production cannot be negative, got {}",
      input.quantity_produced
    )));
  }
  load_work_order(&*uow, input.work_order_id)?;

  let log = ProductionLog {
    log_id:            Uuid::new_v4(),
    work_order_id:     input.work_order_id,
    quantity_produced: input.quantity_produced,
    production_date:   Utc::now(),
    operator_name:     input.operator_name,
    shift_info:        input.shift_info,
    notes:             input.notes,
  };
  uow.insert_production_log(&log)?;
  Ok(log)
}

/// Ledger quantities are whole units; the fractional part of a requirement
/// is dropped.
fn whole_units(quantity: Decimal) -> Result<i64> {
  quantity
    .trunc()
    .to_i64()
    .ok_or_else(|| Error::InvalidQuantity(format!("{quantity} does not fit a ledger quantity")))
}
