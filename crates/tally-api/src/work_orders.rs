//! Handlers for `/work-orders` endpoints.
//!
//! | Method   | Path | Notes |
//! |----------|------|-------|
//! | `GET`    | `/work-orders` | `?active=true`, `?status=<status>`, `?product_id=<id>` |
//! | `POST`   | `/work-orders` | Created `pending`, priced at current BOM cost |
//! | `GET`    | `/work-orders/{id}` | Includes production logs |
//! | `PATCH`  | `/work-orders/{id}` | Re-prices the order; 409 once closed |
//! | `DELETE` | `/work-orders/{id}` | 409 for completed orders |
//! | `POST`   | `/work-orders/{id}/start` | |
//! | `POST`   | `/work-orders/{id}/complete` | Consumes materials, books output |
//! | `GET`    | `/work-orders/{id}/logs` | Optional `?limit=<n>` |
//! | `POST`   | `/work-orders/{id}/logs` | |

use axum::{
  Json,
  extract::{Path, Query, State},
  http::StatusCode,
  response::IntoResponse,
};
use serde::Deserialize;
use tally_core::{
  ProductionService,
  engine::Completion,
  production_log::{NewProductionLog, ProductionLog, ProductionLogQuery},
  store::ProductionStore,
  work_order::{
    NewWorkOrder, WorkOrder, WorkOrderChanges, WorkOrderQuery, WorkOrderStatus, WorkOrderWithLogs,
  },
};
use uuid::Uuid;

use crate::error::Result;

// ─── List ─────────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct ListParams {
  /// Pending and in-progress only. Overrides `status`.
  #[serde(default)]
  pub active:     bool,
  pub status:     Option<WorkOrderStatus>,
  pub product_id: Option<Uuid>,
}

/// `GET /work-orders`
pub async fn list<S: ProductionStore + 'static>(
  State(service): State<ProductionService<S>>,
  Query(params): Query<ListParams>,
) -> Result<Json<Vec<WorkOrder>>> {
  let mut query = if params.active {
    WorkOrderQuery::active()
  } else if let Some(status) = params.status {
    WorkOrderQuery::with_status(status)
  } else {
    WorkOrderQuery::default()
  };
  query.product_id = params.product_id;
  Ok(Json(service.work_orders(query).await?))
}

// ─── CRUD ─────────────────────────────────────────────────────────────────────

/// `POST /work-orders`
pub async fn create<S: ProductionStore + 'static>(
  State(service): State<ProductionService<S>>,
  Json(body): Json<NewWorkOrder>,
) -> Result<impl IntoResponse> {
  let order = service.create_work_order(body).await?;
  Ok((StatusCode::CREATED, Json(order)))
}

/// `GET /work-orders/{id}`
pub async fn get_one<S: ProductionStore + 'static>(
  State(service): State<ProductionService<S>>,
  Path(id): Path<Uuid>,
) -> Result<Json<WorkOrderWithLogs>> {
  Ok(Json(service.work_order(id).await?))
}

/// `PATCH /work-orders/{id}`
pub async fn update<S: ProductionStore + 'static>(
  State(service): State<ProductionService<S>>,
  Path(id): Path<Uuid>,
  Json(changes): Json<WorkOrderChanges>,
) -> Result<Json<WorkOrder>> {
  Ok(Json(service.update_work_order(id, changes).await?))
}

/// `DELETE /work-orders/{id}`
pub async fn delete_one<S: ProductionStore + 'static>(
  State(service): State<ProductionService<S>>,
  Path(id): Path<Uuid>,
) -> Result<StatusCode> {
  service.delete_work_order(id).await?;
  Ok(StatusCode::NO_CONTENT)
}

// ─── Lifecycle ────────────────────────────────────────────────────────────────

/// `POST /work-orders/{id}/start`
pub async fn start<S: ProductionStore + 'static>(
  State(service): State<ProductionService<S>>,
  Path(id): Path<Uuid>,
) -> Result<Json<WorkOrder>> {
  Ok(Json(service.start_work_order(id).await?))
}

/// `POST /work-orders/{id}/complete`
pub async fn complete<S: ProductionStore + 'static>(
  State(service): State<ProductionService<S>>,
  Path(id): Path<Uuid>,
) -> Result<Json<Completion>> {
  Ok(Json(service.complete_work_order(id).await?))
}

// ─── Production logs ──────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct LogParams {
  pub limit: Option<usize>,
}

/// `GET /work-orders/{id}/logs`
pub async fn logs<S: ProductionStore + 'static>(
  State(service): State<ProductionService<S>>,
  Path(id): Path<Uuid>,
  Query(params): Query<LogParams>,
) -> Result<Json<Vec<ProductionLog>>> {
  // 404 rather than an empty list for unknown orders.
  service.work_order(id).await?;
  let logs = service
    .production_logs(ProductionLogQuery { work_order_id: Some(id), limit: params.limit })
    .await?;
  Ok(Json(logs))
}

#[derive(Debug, Deserialize)]
pub struct LogBody {
  pub quantity_produced: i64,
  #[serde(default)]
  pub operator_name:     Option<String>,
  #[serde(default)]
  pub shift_info:        Option<String>,
  #[serde(default)]
  pub notes:             Option<String>,
}

/// `POST /work-orders/{id}/logs`
pub async fn add_log<S: ProductionStore + 'static>(
  State(service): State<ProductionService<S>>,
  Path(id): Path<Uuid>,
  Json(body): Json<LogBody>,
) -> Result<impl IntoResponse> {
  let log = service
    .log_production(NewProductionLog {
      work_order_id:     id,
      quantity_produced: body.quantity_produced,
      operator_name:     body.operator_name,
      shift_info:        body.shift_info,
      notes:             body.notes,
    })
    .await?;
  Ok((StatusCode::CREATED, Json(log)))
}
