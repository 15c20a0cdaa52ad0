//! Production costing: run estimates, the weighted-average unit cost update
//! applied at completion, and the historical repair pass.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{
  Error, Result,
  bom::{self, ResolvedLine},
  store::UnitOfWork,
  work_order::{WorkOrder, WorkOrderQuery, WorkOrderStatus},
};

/// Sum of the priced lines of a resolution.
pub fn total_cost(lines: &[ResolvedLine]) -> Result<Decimal> {
  lines.iter().try_fold(Decimal::ZERO, |sum, l| {
    sum
      .checked_add(l.total_price)
      .ok_or_else(|| Error::out_of_range("total production cost"))
  })
}

/// Cost of building `quantity` units at current raw-material prices.
pub fn estimate_total_cost(uow: &dyn UnitOfWork, product_id: Uuid, quantity: i64) -> Result<Decimal> {
  total_cost(&bom::resolve(uow, product_id, quantity)?)
}

/// Blend existing stock with a new production run.
///
/// Oversold (negative) stock carries no value, so it is floored at zero
/// before weighting.
pub fn weighted_average_cost(
  existing_quantity:  i64,
  existing_unit_cost: Decimal,
  produced_quantity:  i64,
  settlement_cost:    Decimal,
) -> Result<Decimal> {
  let existing = Decimal::from(existing_quantity.max(0));
  let produced = Decimal::from(produced_quantity);
  let overflow = || Error::out_of_range("weighted average cost");

  let units = existing.checked_add(produced).ok_or_else(overflow)?;
  if units > Decimal::ZERO {
    existing
      .checked_mul(existing_unit_cost)
      .and_then(|value| value.checked_add(settlement_cost))
      .and_then(|value| value.checked_div(units))
      .ok_or_else(overflow)
  } else {
    settlement_cost
      .checked_div(Decimal::from(produced_quantity.max(1)))
      .ok_or_else(overflow)
  }
}

/// Recompute and store the unit cost of `product_id` after producing
/// `produced_quantity` units for `settlement_cost`. Must run before the
/// produced units are booked into stock.
pub fn apply_weighted_average(
  uow: &mut dyn UnitOfWork,
  product_id: Uuid,
  produced_quantity: i64,
  settlement_cost: Decimal,
) -> Result<Decimal> {
  let product = uow
    .product(product_id)?
    .ok_or(Error::ProductNotFound(product_id))?;

  let unit_cost = weighted_average_cost(
    product.quantity,
    product.purchase_price,
    produced_quantity,
    settlement_cost,
  )?;
  uow.set_unit_cost(product_id, unit_cost)?;

  Ok(unit_cost)
}

// ─── Historical repair ───────────────────────────────────────────────────────

/// One unit cost written by [`recalculate_historical_costs`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CostRepair {
  pub product_id:      Uuid,
  /// The latest completed order the cost was derived from.
  pub work_order_id:   Uuid,
  pub completion_date: Option<DateTime<Utc>>,
  pub total_cost:      Decimal,
  /// Whether `total_cost` had to be re-estimated from current BOM prices.
  pub estimated:       bool,
  pub unit_cost:       Decimal,
}

/// Reset each finished good's unit cost from its latest completed run.
///
/// Orders without a recorded cost are re-estimated at current prices; the
/// order itself is left untouched. Only the single latest run per product is
/// considered, so blended multi-run history is not reconstructed. Running this
/// twice with no completions in between writes the same costs both times.
pub fn recalculate_historical_costs(uow: &mut dyn UnitOfWork) -> Result<Vec<CostRepair>> {
  let completed = uow.work_orders(&WorkOrderQuery::with_status(WorkOrderStatus::Completed))?;

  let mut latest: HashMap<Uuid, WorkOrder> = HashMap::new();
  for order in completed {
    match latest.get(&order.product_id) {
      Some(current) if current.completion_date >= order.completion_date => {}
      _ => {
        latest.insert(order.product_id, order);
      }
    }
  }

  let mut orders: Vec<WorkOrder> = latest.into_values().collect();
  orders.sort_by_key(|o| o.product_id);

  let mut repairs = Vec::new();
  for order in orders {
    let estimated = order.total_cost <= Decimal::ZERO;
    let total_cost = if estimated {
      estimate_total_cost(&*uow, order.product_id, order.quantity_ordered)?
    } else {
      order.total_cost
    };

    if order.quantity_produced <= 0 {
      continue;
    }
    let unit_cost = total_cost
      .checked_div(Decimal::from(order.quantity_produced))
      .ok_or_else(|| Error::out_of_range("historical unit cost"))?;
    if unit_cost <= Decimal::ZERO {
      continue;
    }

    if !uow.set_unit_cost(order.product_id, unit_cost)? {
      tracing::warn!(
        product_id = %order.product_id,
        work_order_id = %order.work_order_id,
        "skipping cost repair for missing product"
      );
      continue;
    }

    repairs.push(CostRepair {
      product_id: order.product_id,
      work_order_id: order.work_order_id,
      completion_date: order.completion_date,
      total_cost,
      estimated,
      unit_cost,
    });
  }

  Ok(repairs)
}

#[cfg(test)]
mod tests {
  use rust_decimal_macros::dec;

  use super::*;

  #[test]
  fn blends_existing_value_with_settlement() {
    // 10 on hand at 5 (value 50) plus a run of 10 costing 120.
    assert_eq!(weighted_average_cost(10, dec!(5), 10, dec!(120)).unwrap(), dec!(8.5));
  }

  #[test]
  fn empty_stock_takes_the_run_cost() {
    assert_eq!(weighted_average_cost(0, dec!(7), 10, dec!(100)).unwrap(), dec!(10));
  }

  #[test]
  fn oversold_stock_is_floored_at_zero() {
    assert_eq!(weighted_average_cost(-25, dec!(7), 10, dec!(100)).unwrap(), dec!(10));
  }

  #[test]
  fn zero_production_on_empty_stock_divides_by_one() {
    assert_eq!(weighted_average_cost(-3, dec!(7), 0, dec!(42)).unwrap(), dec!(42));
  }

  #[test]
  fn unrepresentable_blend_is_an_invalid_quantity() {
    let err = weighted_average_cost(i64::MAX, Decimal::MAX, 1, dec!(1)).unwrap_err();
    assert!(matches!(err, Error::InvalidQuantity(_)), "{err}");
  }

  #[test]
  fn total_cost_of_nothing_is_zero() {
    assert_eq!(total_cost(&[]).unwrap(), Decimal::ZERO);
  }
}
