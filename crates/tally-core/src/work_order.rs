//! Work orders and their lifecycle.
//!
//! Status changes go through [`WorkOrderStatus::transition_to`], which knows
//! the legal edges of the lifecycle graph:
//!
//! ```text
//! Draft ──► Pending ──► InProgress ──► Completed
//!   │          │  └──────────────────────▲
//!   └──────────┴──────────┴──► Cancelled
//! ```
//!
//! `Completed` and `Cancelled` are terminal.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use strum::{AsRefStr, Display, EnumString};
use uuid::Uuid;

use crate::{Error, Result, production_log::ProductionLog};

// ─── Status ──────────────────────────────────────────────────────────────────

#[derive(
  Debug,
  Clone,
  Copy,
  PartialEq,
  Eq,
  Hash,
  Default,
  Serialize,
  Deserialize,
  Display,
  EnumString,
  AsRefStr,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum WorkOrderStatus {
  Draft,
  #[default]
  Pending,
  InProgress,
  Completed,
  Cancelled,
}

impl WorkOrderStatus {
  /// Statuses returned by the "active work orders" listing.
  pub const ACTIVE: [Self; 2] = [Self::Pending, Self::InProgress];

  pub fn is_terminal(self) -> bool { matches!(self, Self::Completed | Self::Cancelled) }

  pub fn can_transition_to(self, next: Self) -> bool {
    use WorkOrderStatus::*;
    matches!(
      (self, next),
      (Draft, Pending)
        | (Draft, Cancelled)
        | (Pending, InProgress)
        | (Pending, Completed)
        | (Pending, Cancelled)
        | (InProgress, Completed)
        | (InProgress, Cancelled)
    )
  }

  /// Validate a move to `next`, returning the new status.
  pub fn transition_to(self, next: Self) -> Result<Self> {
    if self.can_transition_to(next) {
      Ok(next)
    } else {
      Err(Error::InvalidTransition { from: self, to: next })
    }
  }
}

// ─── WorkOrder ───────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorkOrder {
  pub work_order_id:     Uuid,
  pub order_number:      String,
  /// The finished good this order builds.
  pub product_id:        Uuid,
  pub quantity_ordered:  i64,
  pub quantity_produced: i64,
  /// Live estimate until completion, then the settlement cost.
  pub total_cost:        Decimal,
  pub status:            WorkOrderStatus,
  pub duration_minutes:  i64,
  pub start_date:        Option<DateTime<Utc>>,
  pub completion_date:   Option<DateTime<Utc>>,
  pub notes:             Option<String>,
  pub build_reference:   Option<String>,
  pub created_at:        DateTime<Utc>,
  pub updated_at:        Option<DateTime<Utc>>,
}

impl WorkOrder {
  /// The reference stamped on every ledger entry this order produces.
  pub fn ledger_reference(&self) -> String { format!("WO-{}", self.order_number) }

  /// Apply a status change, refusing illegal edges.
  pub fn transition_to(&mut self, next: WorkOrderStatus) -> Result<()> {
    self.status = self.status.transition_to(next)?;
    Ok(())
  }

  /// Refuse edits to orders that have reached a terminal status.
  pub fn ensure_open(&self) -> Result<()> {
    if self.status.is_terminal() {
      return Err(Error::WorkOrderClosed {
        id:     self.work_order_id,
        status: self.status,
      });
    }
    Ok(())
  }
}

/// A work order together with its production log entries.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorkOrderWithLogs {
  #[serde(flatten)]
  pub work_order: WorkOrder,
  pub logs:       Vec<ProductionLog>,
}

// ─── Inputs ──────────────────────────────────────────────────────────────────

/// Input to [`crate::service::ProductionService::create_work_order`].
#[derive(Debug, Clone, Deserialize)]
pub struct NewWorkOrder {
  pub order_number:     String,
  pub product_id:       Uuid,
  pub quantity_ordered: i64,
  #[serde(default)]
  pub duration_minutes: i64,
  #[serde(default)]
  pub notes:            Option<String>,
  #[serde(default)]
  pub build_reference:  Option<String>,
}

impl NewWorkOrder {
  pub fn new(order_number: impl Into<String>, product_id: Uuid, quantity_ordered: i64) -> Self {
    Self {
      order_number: order_number.into(),
      product_id,
      quantity_ordered,
      duration_minutes: 0,
      notes: None,
      build_reference: None,
    }
  }
}

/// Changes accepted by [`crate::service::ProductionService::update_work_order`].
/// Absent fields are left as they are.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct WorkOrderChanges {
  pub order_number:     Option<String>,
  pub product_id:       Option<Uuid>,
  pub quantity_ordered: Option<i64>,
  pub duration_minutes: Option<i64>,
  pub notes:            Option<String>,
  pub build_reference:  Option<String>,
  /// Only `Pending` and `Cancelled` may be requested here; starting and
  /// completing have their own operations.
  pub status:           Option<WorkOrderStatus>,
}

/// Parameters for listing work orders.
#[derive(Debug, Clone, Default)]
pub struct WorkOrderQuery {
  /// Restrict to these statuses; empty means all.
  pub statuses:   Vec<WorkOrderStatus>,
  pub product_id: Option<Uuid>,
}

impl WorkOrderQuery {
  pub fn active() -> Self {
    Self { statuses: WorkOrderStatus::ACTIVE.to_vec(), product_id: None }
  }

  pub fn with_status(status: WorkOrderStatus) -> Self {
    Self { statuses: vec![status], product_id: None }
  }
}

pub(crate) fn validate_order_quantity(quantity: i64) -> Result<()> {
  if quantity <= 0 {
    return Err(Error::InvalidQuantity(format!(
      "quantity ordered must be positive, got {quantity}"
    )));
  }
  Ok(())
}
