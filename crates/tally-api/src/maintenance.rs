//! On-demand maintenance jobs.

use axum::{Json, extract::State};
use tally_core::{ProductionService, costing::CostRepair, store::ProductionStore};

use crate::error::Result;

/// `POST /maintenance/recalculate-costs`
pub async fn recalculate_costs<S: ProductionStore + 'static>(
  State(service): State<ProductionService<S>>,
) -> Result<Json<Vec<CostRepair>>> {
  Ok(Json(service.recalculate_historical_costs().await?))
}
