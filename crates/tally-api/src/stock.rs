//! Handlers for `/stock-transactions`.

use axum::{
  Json,
  extract::{Query, State},
  http::StatusCode,
  response::IntoResponse,
};
use serde::Deserialize;
use tally_core::{
  ProductionService,
  ledger::{NewStockTransaction, StockTransaction, TransactionQuery},
  store::ProductionStore,
};
use uuid::Uuid;

use crate::error::Result;

#[derive(Debug, Deserialize)]
pub struct ListParams {
  pub product_id:   Option<Uuid>,
  pub limit:        Option<usize>,
  #[serde(default)]
  pub newest_first: bool,
}

/// `GET /stock-transactions[?product_id=<id>][&limit=<n>][&newest_first=true]`
pub async fn list<S: ProductionStore + 'static>(
  State(service): State<ProductionService<S>>,
  Query(params): Query<ListParams>,
) -> Result<Json<Vec<StockTransaction>>> {
  let query = TransactionQuery {
    product_id:   params.product_id,
    newest_first: params.newest_first,
    limit:        params.limit,
  };
  Ok(Json(service.transactions(query).await?))
}

/// `POST /stock-transactions`: a manual receipt, issue or count correction.
pub async fn record<S: ProductionStore + 'static>(
  State(service): State<ProductionService<S>>,
  Json(body): Json<NewStockTransaction>,
) -> Result<impl IntoResponse> {
  let transaction = service.record_transaction(body).await?;
  Ok((StatusCode::CREATED, Json(transaction)))
}
