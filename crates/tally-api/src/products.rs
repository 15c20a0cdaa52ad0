//! Handlers for `/products` endpoints.
//!
//! | Method | Path | Notes |
//! |--------|------|-------|
//! | `GET`  | `/products` | Optional `?kind=finished_good\|raw_material`, `?low_stock=true` |
//! | `POST` | `/products` | Body: [`NewProduct`]; opening stock is booked to the ledger |
//! | `GET`  | `/products/{id}` | 404 if not found |
//! | `GET`  | `/products/{id}/bom` | Active BOM lines of a finished good |
//! | `GET`  | `/products/{id}/reconcile` | Stored quantity vs. ledger replay |

use axum::{
  Json,
  extract::{Path, Query, State},
  http::StatusCode,
  response::IntoResponse,
};
use serde::Deserialize;
use tally_core::{
  ProductionService,
  bom::BomLine,
  ledger::Reconciliation,
  product::{NewProduct, Product, ProductKind},
  store::ProductionStore,
};
use uuid::Uuid;

use crate::error::Result;

#[derive(Debug, Deserialize)]
pub struct ListParams {
  pub kind:      Option<ProductKind>,
  #[serde(default)]
  pub low_stock: bool,
}

/// `GET /products[?kind=<kind>][&low_stock=true]`
pub async fn list<S: ProductionStore + 'static>(
  State(service): State<ProductionService<S>>,
  Query(params): Query<ListParams>,
) -> Result<Json<Vec<Product>>> {
  let mut products = if params.low_stock {
    service.low_stock_products().await?
  } else {
    service.list_products(params.kind).await?
  };
  if let Some(kind) = params.kind {
    products.retain(|p| p.kind == kind);
  }
  Ok(Json(products))
}

/// `POST /products`
pub async fn create<S: ProductionStore + 'static>(
  State(service): State<ProductionService<S>>,
  Json(body): Json<NewProduct>,
) -> Result<impl IntoResponse> {
  let product = service.add_product(body).await?;
  Ok((StatusCode::CREATED, Json(product)))
}

/// `GET /products/{id}`
pub async fn get_one<S: ProductionStore + 'static>(
  State(service): State<ProductionService<S>>,
  Path(id): Path<Uuid>,
) -> Result<Json<Product>> {
  Ok(Json(service.product(id).await?))
}

/// `GET /products/{id}/bom`
pub async fn bom<S: ProductionStore + 'static>(
  State(service): State<ProductionService<S>>,
  Path(id): Path<Uuid>,
) -> Result<Json<Vec<BomLine>>> {
  Ok(Json(service.bom_for_product(id).await?))
}

/// `GET /products/{id}/reconcile`
pub async fn reconcile<S: ProductionStore + 'static>(
  State(service): State<ProductionService<S>>,
  Path(id): Path<Uuid>,
) -> Result<Json<Reconciliation>> {
  Ok(Json(service.reconcile(id).await?))
}
