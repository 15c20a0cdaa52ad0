//! JSON REST API for Tally.
//!
//! Exposes an axum [`Router`] backed by a [`ProductionService`] over any
//! [`ProductionStore`]. Auth and TLS are the caller's responsibility.
//!
//! # Mounting
//!
//! ```rust,ignore
//! .nest("/api", tally_api::api_router(service.clone()))
//! ```

pub mod bom;
pub mod error;
pub mod maintenance;
pub mod production;
pub mod products;
pub mod stock;
pub mod work_orders;

use std::{path::PathBuf, time::Duration};

use axum::{
  Router,
  routing::{get, post},
};
use serde::Deserialize;
use tally_core::{ProductionService, engine::EngineConfig, store::ProductionStore};
use tower_http::trace::TraceLayer;

pub use error::ApiError;

// ─── Configuration ────────────────────────────────────────────────────────────

/// Runtime server configuration, deserialised from `tally.toml` and `TALLY_*`
/// environment variables.
#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
  #[serde(default = "default_host")]
  pub host:            String,
  #[serde(default = "default_port")]
  pub port:            u16,
  #[serde(default = "default_store_path")]
  pub store_path:      PathBuf,
  /// How long a write waits on a locked database file.
  #[serde(default = "default_busy_timeout_ms")]
  pub busy_timeout_ms: u64,
  #[serde(default)]
  pub engine:          EngineConfig,
}

impl ServerConfig {
  pub fn busy_timeout(&self) -> Duration { Duration::from_millis(self.busy_timeout_ms) }
}

fn default_host() -> String { "127.0.0.1".to_owned() }

fn default_port() -> u16 { 5240 }

fn default_store_path() -> PathBuf { PathBuf::from("tally.db") }

fn default_busy_timeout_ms() -> u64 { 5_000 }

// ─── Router ───────────────────────────────────────────────────────────────────

/// Build a fully-materialised API router for `service`.
///
/// The returned `Router<()>` can be nested into any parent router regardless
/// of its own state type.
pub fn api_router<S>(service: ProductionService<S>) -> Router<()>
where
  S: ProductionStore + 'static,
{
  Router::new()
    // Products
    .route("/products", get(products::list::<S>).post(products::create::<S>))
    .route("/products/{id}", get(products::get_one::<S>))
    .route("/products/{id}/bom", get(products::bom::<S>))
    .route("/products/{id}/reconcile", get(products::reconcile::<S>))
    // Resolution and costing
    .route("/products/{id}/feasibility", get(production::feasibility::<S>))
    .route("/products/{id}/requirements", get(production::requirements::<S>))
    .route("/products/{id}/cost", get(production::cost::<S>))
    // Bill of materials
    .route("/bom-lines", get(bom::list::<S>).post(bom::create::<S>))
    .route("/bom-lines/exists", get(bom::exists::<S>))
    .route(
      "/bom-lines/{id}",
      get(bom::get_one::<S>)
        .patch(bom::update::<S>)
        .delete(bom::deactivate::<S>),
    )
    // Work orders
    .route(
      "/work-orders",
      get(work_orders::list::<S>).post(work_orders::create::<S>),
    )
    .route(
      "/work-orders/{id}",
      get(work_orders::get_one::<S>)
        .patch(work_orders::update::<S>)
        .delete(work_orders::delete_one::<S>),
    )
    .route("/work-orders/{id}/start", post(work_orders::start::<S>))
    .route("/work-orders/{id}/complete", post(work_orders::complete::<S>))
    .route(
      "/work-orders/{id}/logs",
      get(work_orders::logs::<S>).post(work_orders::add_log::<S>),
    )
    // Stock ledger
    .route(
      "/stock-transactions",
      get(stock::list::<S>).post(stock::record::<S>),
    )
    // Maintenance
    .route(
      "/maintenance/recalculate-costs",
      post(maintenance::recalculate_costs::<S>),
    )
    .layer(TraceLayer::new_for_http())
    .with_state(service)
}

#[cfg(test)]
mod tests;
