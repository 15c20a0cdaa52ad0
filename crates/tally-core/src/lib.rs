//! Core types and the production engine for Tally.
//!
//! This crate owns the domain model (products, bills of materials, the stock
//! ledger, work orders) and the engine that drives them: BOM resolution,
//! feasibility, costing, and the work order lifecycle. It is free of HTTP and
//! database dependencies; storage backends implement [`store::ProductionStore`].

pub mod bom;
pub mod costing;
pub mod engine;
pub mod error;
pub mod ledger;
pub mod product;
pub mod production_log;
pub mod service;
pub mod store;
pub mod work_order;

pub use error::{Error, Result};
pub use service::ProductionService;
