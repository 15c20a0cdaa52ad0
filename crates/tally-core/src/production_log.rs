//! Production logs: an append-only audit trail of shop-floor activity against
//! a work order. The engine writes them but never reads them back for any
//! decision.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProductionLog {
  pub log_id:            Uuid,
  pub work_order_id:     Uuid,
  pub quantity_produced: i64,
  /// Server-assigned.
  pub production_date:   DateTime<Utc>,
  pub operator_name:     Option<String>,
  pub shift_info:        Option<String>,
  pub notes:             Option<String>,
}

/// Input to [`crate::service::ProductionService::log_production`].
#[derive(Debug, Clone, Deserialize)]
pub struct NewProductionLog {
  pub work_order_id:     Uuid,
  pub quantity_produced: i64,
  #[serde(default)]
  pub operator_name:     Option<String>,
  #[serde(default)]
  pub shift_info:        Option<String>,
  #[serde(default)]
  pub notes:             Option<String>,
}

/// Parameters for listing production logs.
#[derive(Debug, Clone, Default)]
pub struct ProductionLogQuery {
  pub work_order_id: Option<Uuid>,
  pub limit:         Option<usize>,
}
