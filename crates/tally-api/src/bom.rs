//! Handlers for `/bom-lines` endpoints.
//!
//! Deleting a line deactivates it; the row stays on record and can be
//! reactivated with `PATCH {"is_active": true}`.

use axum::{
  Json,
  extract::{Path, Query, State},
  http::StatusCode,
  response::IntoResponse,
};
use serde::{Deserialize, Serialize};
use tally_core::{
  ProductionService,
  bom::{BomLine, BomLineChanges, BomLineView, NewBomLine},
  store::ProductionStore,
};
use uuid::Uuid;

use crate::error::Result;

/// `GET /bom-lines`: every active line with product names.
pub async fn list<S: ProductionStore + 'static>(
  State(service): State<ProductionService<S>>,
) -> Result<Json<Vec<BomLineView>>> {
  Ok(Json(service.bom_lines().await?))
}

/// `POST /bom-lines`
pub async fn create<S: ProductionStore + 'static>(
  State(service): State<ProductionService<S>>,
  Json(body): Json<NewBomLine>,
) -> Result<impl IntoResponse> {
  let line = service.add_bom_line(body).await?;
  Ok((StatusCode::CREATED, Json(line)))
}

/// `GET /bom-lines/{id}`
pub async fn get_one<S: ProductionStore + 'static>(
  State(service): State<ProductionService<S>>,
  Path(id): Path<Uuid>,
) -> Result<Json<BomLine>> {
  Ok(Json(service.bom_line(id).await?))
}

/// `PATCH /bom-lines/{id}`
pub async fn update<S: ProductionStore + 'static>(
  State(service): State<ProductionService<S>>,
  Path(id): Path<Uuid>,
  Json(changes): Json<BomLineChanges>,
) -> Result<Json<BomLine>> {
  Ok(Json(service.update_bom_line(id, changes).await?))
}

/// `DELETE /bom-lines/{id}`
pub async fn deactivate<S: ProductionStore + 'static>(
  State(service): State<ProductionService<S>>,
  Path(id): Path<Uuid>,
) -> Result<Json<BomLine>> {
  Ok(Json(service.deactivate_bom_line(id).await?))
}

#[derive(Debug, Deserialize)]
pub struct ExistsParams {
  pub finished_product_id: Uuid,
  pub raw_material_id:     Uuid,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct Exists {
  pub exists: bool,
}

/// `GET /bom-lines/exists?finished_product_id=<id>&raw_material_id=<id>`
pub async fn exists<S: ProductionStore + 'static>(
  State(service): State<ProductionService<S>>,
  Query(params): Query<ExistsParams>,
) -> Result<Json<Exists>> {
  let exists = service
    .bom_line_exists(params.finished_product_id, params.raw_material_id)
    .await?;
  Ok(Json(Exists { exists }))
}
