//! Error types for `tally-core`.

use rust_decimal::Decimal;
use thiserror::Error;
use uuid::Uuid;

use crate::work_order::WorkOrderStatus;

#[derive(Debug, Error)]
pub enum Error {
  #[error("product not found: {0}")]
  ProductNotFound(Uuid),

  #[error("work order not found: {0}")]
  WorkOrderNotFound(Uuid),

  #[error("bom line not found: {0}")]
  BomLineNotFound(Uuid),

  #[error("invalid work order transition: {from} -> {to}")]
  InvalidTransition {
    from: WorkOrderStatus,
    to:   WorkOrderStatus,
  },

  #[error("work order {id} is {status} and can no longer be changed")]
  WorkOrderClosed { id: Uuid, status: WorkOrderStatus },

  #[error("invalid quantity: {0}")]
  InvalidQuantity(String),

  #[error("raw material {raw_material_id} is already on the bom of {finished_product_id}")]
  DuplicateBomLine {
    finished_product_id: Uuid,
    raw_material_id:     Uuid,
  },

  #[error("insufficient stock of {product_id}: need {needed}, have {on_hand}")]
  InsufficientStock {
    product_id: Uuid,
    needed:     Decimal,
    on_hand:    i64,
  },

  /// A failure inside the persistence collaborator. The unit of work that
  /// raised it has been rolled back.
  #[error("storage error: {0}")]
  Storage(#[source] Box<dyn std::error::Error + Send + Sync>),
}

impl Error {
  pub fn is_not_found(&self) -> bool {
    matches!(
      self,
      Self::ProductNotFound(_) | Self::WorkOrderNotFound(_) | Self::BomLineNotFound(_)
    )
  }

  /// Arithmetic on a quantity or amount left the representable range.
  pub(crate) fn out_of_range(what: impl std::fmt::Display) -> Self {
    Self::InvalidQuantity(format!("{what} is out of range"))
  }
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
