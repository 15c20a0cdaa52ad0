//! Resolution and costing queries for a prospective production run.
//!
//! All three take `?quantity=<n>` and refuse non-positive quantities.

use axum::{
  Json,
  extract::{Path, Query, State},
};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tally_core::{ProductionService, bom::ResolvedLine, store::ProductionStore};
use uuid::Uuid;

use crate::error::Result;

#[derive(Debug, Deserialize)]
pub struct QuantityParams {
  pub quantity: i64,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct Feasibility {
  pub product_id:  Uuid,
  pub quantity:    i64,
  pub can_produce: bool,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct CostEstimate {
  pub product_id: Uuid,
  pub quantity:   i64,
  pub total_cost: Decimal,
}

/// `GET /products/{id}/feasibility?quantity=<n>`
pub async fn feasibility<S: ProductionStore + 'static>(
  State(service): State<ProductionService<S>>,
  Path(product_id): Path<Uuid>,
  Query(QuantityParams { quantity }): Query<QuantityParams>,
) -> Result<Json<Feasibility>> {
  let can_produce = service.can_produce(product_id, quantity).await?;
  Ok(Json(Feasibility { product_id, quantity, can_produce }))
}

/// `GET /products/{id}/requirements?quantity=<n>`, the itemised resolution.
pub async fn requirements<S: ProductionStore + 'static>(
  State(service): State<ProductionService<S>>,
  Path(product_id): Path<Uuid>,
  Query(QuantityParams { quantity }): Query<QuantityParams>,
) -> Result<Json<Vec<ResolvedLine>>> {
  Ok(Json(service.work_order_details(product_id, quantity).await?))
}

/// `GET /products/{id}/cost?quantity=<n>`
pub async fn cost<S: ProductionStore + 'static>(
  State(service): State<ProductionService<S>>,
  Path(product_id): Path<Uuid>,
  Query(QuantityParams { quantity }): Query<QuantityParams>,
) -> Result<Json<CostEstimate>> {
  let total_cost = service.calculate_total_cost(product_id, quantity).await?;
  Ok(Json(CostEstimate { product_id, quantity, total_cost }))
}
