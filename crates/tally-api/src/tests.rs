//! Router tests against an in-memory store.

use std::sync::Arc;

use axum::{
  Router,
  body::Body,
  http::{Request, StatusCode, header},
  response::Response,
};
use rust_decimal_macros::dec;
use serde_json::{Value, json};
use tally_core::{
  ProductionService,
  bom::NewBomLine,
  engine::EngineConfig,
  product::{NewProduct, Product, ProductKind},
};
use tally_store_sqlite::SqliteStore;
use tower::ServiceExt as _;
use uuid::Uuid;

use super::*;

async fn make_service() -> ProductionService<SqliteStore> {
  let store = SqliteStore::open_in_memory().await.unwrap();
  ProductionService::new(Arc::new(store), EngineConfig::default())
}

async fn send(app: Router, method: &str, uri: &str, body: Option<Value>) -> Response {
  let mut builder = Request::builder().method(method).uri(uri);
  let body = match body {
    Some(json) => {
      builder = builder.header(header::CONTENT_TYPE, "application/json");
      Body::from(json.to_string())
    }
    None => Body::empty(),
  };
  app.oneshot(builder.body(body).unwrap()).await.unwrap()
}

async fn json_body(resp: Response) -> Value {
  let bytes = axum::body::to_bytes(resp.into_body(), usize::MAX)
    .await
    .unwrap();
  serde_json::from_slice(&bytes).unwrap()
}

/// A cabinet needing 2 hinges and 3 screws, with `hinges` hinges on hand.
async fn seed(service: &ProductionService<SqliteStore>, hinges: i64) -> (Product, Product) {
  let cabinet = service
    .add_product(NewProduct::new("Cabinet", "FG-1", ProductKind::FinishedGood))
    .await
    .unwrap();
  let hinge = service
    .add_product(
      NewProduct::new("Hinge", "RM-1", ProductKind::RawMaterial)
        .with_quantity(hinges)
        .with_purchase_price(dec!(3)),
    )
    .await
    .unwrap();
  let screw = service
    .add_product(
      NewProduct::new("Screw", "RM-2", ProductKind::RawMaterial)
        .with_quantity(100)
        .with_purchase_price(dec!(2)),
    )
    .await
    .unwrap();
  for (raw, per_unit) in [(&hinge, dec!(2)), (&screw, dec!(3))] {
    service
      .add_bom_line(NewBomLine::new(cabinet.product_id, raw.product_id, per_unit))
      .await
      .unwrap();
  }
  (cabinet, hinge)
}

// ── Products ─────────────────────────────────────────────────────────────────

#[tokio::test]
async fn create_and_fetch_product() {
  let service = make_service().await;
  let resp = send(
    api_router(service.clone()),
    "POST",
    "/products",
    Some(json!({
      "name": "Hinge",
      "sku": "RM-1",
      "kind": "raw_material",
      "quantity": 25,
      "purchase_price": "1.25"
    })),
  )
  .await;
  assert_eq!(resp.status(), StatusCode::CREATED);
  let created = json_body(resp).await;
  assert_eq!(created["quantity"], 25);
  let id = created["product_id"].as_str().unwrap().to_owned();

  let resp = send(api_router(service), "GET", &format!("/products/{id}"), None).await;
  assert_eq!(resp.status(), StatusCode::OK);
  assert_eq!(json_body(resp).await["name"], "Hinge");
}

#[tokio::test]
async fn list_products_filters_by_kind() {
  let service = make_service().await;
  seed(&service, 10).await;

  let resp = send(api_router(service), "GET", "/products?kind=raw_material", None).await;
  assert_eq!(resp.status(), StatusCode::OK);
  let body = json_body(resp).await;
  assert_eq!(body.as_array().unwrap().len(), 2);
}

#[tokio::test]
async fn unknown_product_is_404() {
  let service = make_service().await;
  let uri = format!("/products/{}", Uuid::new_v4());
  let resp = send(api_router(service), "GET", &uri, None).await;
  assert_eq!(resp.status(), StatusCode::NOT_FOUND);
  assert!(json_body(resp).await["error"].as_str().unwrap().contains("not found"));
}

// ── Resolution ───────────────────────────────────────────────────────────────

#[tokio::test]
async fn feasibility_reports_short_stock() {
  let service = make_service().await;
  let (cabinet, _) = seed(&service, 9).await;
  let id = cabinet.product_id;

  let resp = send(
    api_router(service.clone()),
    "GET",
    &format!("/products/{id}/feasibility?quantity=5"),
    None,
  )
  .await;
  assert_eq!(resp.status(), StatusCode::OK);
  assert_eq!(json_body(resp).await["can_produce"], false);

  let resp = send(
    api_router(service),
    "GET",
    &format!("/products/{id}/requirements?quantity=5"),
    None,
  )
  .await;
  let lines = json_body(resp).await;
  let lines = lines.as_array().unwrap();
  assert_eq!(lines.len(), 2);
  assert_eq!(lines[0]["name"], "Hinge");
  assert_eq!(lines[0]["is_available"], false);
  assert_eq!(lines[1]["is_available"], true);
}

#[tokio::test]
async fn cost_estimate_sums_lines() {
  let service = make_service().await;
  let (cabinet, _) = seed(&service, 100).await;
  let uri = format!("/products/{}/cost?quantity=5", cabinet.product_id);

  let resp = send(api_router(service), "GET", &uri, None).await;
  assert_eq!(resp.status(), StatusCode::OK);
  let body = json_body(resp).await;
  let total: rust_decimal::Decimal = serde_json::from_value(body["total_cost"].clone()).unwrap();
  assert_eq!(total, dec!(60));
}

#[tokio::test]
async fn zero_quantity_is_bad_request() {
  let service = make_service().await;
  let (cabinet, _) = seed(&service, 100).await;
  let uri = format!("/products/{}/feasibility?quantity=0", cabinet.product_id);

  let resp = send(api_router(service), "GET", &uri, None).await;
  assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn overflowing_cost_is_bad_request_and_the_store_survives() {
  let service = make_service().await;
  let (cabinet, hinge) = seed(&service, 100).await;
  let panel = service
    .add_product(
      NewProduct::new("Panel", "RM-3", ProductKind::RawMaterial).with_purchase_price(dec!(100000000)),
    )
    .await
    .unwrap();
  service
    .add_bom_line(NewBomLine::new(cabinet.product_id, panel.product_id, dec!(1000)))
    .await
    .unwrap();

  let uri = format!("/products/{}/cost?quantity={}", cabinet.product_id, i64::MAX);
  let resp = send(api_router(service.clone()), "GET", &uri, None).await;
  assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

  let uri = format!("/products/{}", hinge.product_id);
  let resp = send(api_router(service), "GET", &uri, None).await;
  assert_eq!(resp.status(), StatusCode::OK);
}

// ── Work orders ──────────────────────────────────────────────────────────────

#[tokio::test]
async fn work_order_lifecycle_over_http() {
  let service = make_service().await;
  let (cabinet, hinge) = seed(&service, 100).await;

  let resp = send(
    api_router(service.clone()),
    "POST",
    "/work-orders",
    Some(json!({
      "order_number": "1001",
      "product_id": cabinet.product_id,
      "quantity_ordered": 5
    })),
  )
  .await;
  assert_eq!(resp.status(), StatusCode::CREATED);
  let order = json_body(resp).await;
  assert_eq!(order["status"], "pending");
  let id = order["work_order_id"].as_str().unwrap().to_owned();

  let resp = send(
    api_router(service.clone()),
    "POST",
    &format!("/work-orders/{id}/start"),
    None,
  )
  .await;
  assert_eq!(resp.status(), StatusCode::OK);
  assert_eq!(json_body(resp).await["status"], "in_progress");

  let resp = send(
    api_router(service.clone()),
    "POST",
    &format!("/work-orders/{id}/complete"),
    None,
  )
  .await;
  assert_eq!(resp.status(), StatusCode::OK);
  let completion = json_body(resp).await;
  assert_eq!(completion["work_order"]["status"], "completed");
  assert_eq!(completion["consumed"].as_array().unwrap().len(), 2);
  assert_eq!(completion["produced"]["quantity"], 5);

  let resp = send(
    api_router(service.clone()),
    "POST",
    &format!("/work-orders/{id}/complete"),
    None,
  )
  .await;
  assert_eq!(resp.status(), StatusCode::CONFLICT);

  assert_eq!(service.product(hinge.product_id).await.unwrap().quantity, 90);

  let resp = send(api_router(service), "DELETE", &format!("/work-orders/{id}"), None).await;
  assert_eq!(resp.status(), StatusCode::CONFLICT);
}

#[tokio::test]
async fn active_listing_and_logs() {
  let service = make_service().await;
  let (cabinet, _) = seed(&service, 100).await;

  let resp = send(
    api_router(service.clone()),
    "POST",
    "/work-orders",
    Some(json!({
      "order_number": "1002",
      "product_id": cabinet.product_id,
      "quantity_ordered": 1
    })),
  )
  .await;
  let id = json_body(resp).await["work_order_id"]
    .as_str()
    .unwrap()
    .to_owned();

  let resp = send(
    api_router(service.clone()),
    "POST",
    &format!("/work-orders/{id}/logs"),
    Some(json!({ "quantity_produced": 1, "operator_name": "Sam" })),
  )
  .await;
  assert_eq!(resp.status(), StatusCode::CREATED);

  let resp = send(api_router(service.clone()), "GET", "/work-orders?active=true", None).await;
  assert_eq!(json_body(resp).await.as_array().unwrap().len(), 1);

  let resp = send(api_router(service), "GET", &format!("/work-orders/{id}"), None).await;
  let body = json_body(resp).await;
  assert_eq!(body["order_number"], "1002");
  assert_eq!(body["logs"][0]["operator_name"], "Sam");
}

#[tokio::test]
async fn unknown_work_order_is_404() {
  let service = make_service().await;
  let uri = format!("/work-orders/{}/complete", Uuid::new_v4());
  let resp = send(api_router(service), "POST", &uri, None).await;
  assert_eq!(resp.status(), StatusCode::NOT_FOUND);
}

// ── BOM and maintenance ──────────────────────────────────────────────────────

#[tokio::test]
async fn duplicate_bom_line_is_conflict() {
  let service = make_service().await;
  let (cabinet, hinge) = seed(&service, 1).await;

  let resp = send(
    api_router(service),
    "POST",
    "/bom-lines",
    Some(json!({
      "finished_product_id": cabinet.product_id,
      "raw_material_id": hinge.product_id,
      "quantity_per_unit": "1"
    })),
  )
  .await;
  assert_eq!(resp.status(), StatusCode::CONFLICT);
}

#[tokio::test]
async fn recalculate_costs_endpoint() {
  let service = make_service().await;
  let (cabinet, _) = seed(&service, 100).await;
  let order = service
    .create_work_order(tally_core::work_order::NewWorkOrder::new("1001", cabinet.product_id, 5))
    .await
    .unwrap();
  service.complete_work_order(order.work_order_id).await.unwrap();

  let resp = send(api_router(service), "POST", "/maintenance/recalculate-costs", None).await;
  assert_eq!(resp.status(), StatusCode::OK);
  let repairs = json_body(resp).await;
  assert_eq!(repairs.as_array().unwrap().len(), 1);
  assert_eq!(repairs[0]["estimated"], false);
}

// ── Configuration ────────────────────────────────────────────────────────────

#[test]
fn config_defaults_fill_missing_keys() {
  let cfg: ServerConfig = serde_json::from_value(json!({ "port": 8080 })).unwrap();
  assert_eq!(cfg.port, 8080);
  assert_eq!(cfg.host, "127.0.0.1");
  assert_eq!(cfg.busy_timeout_ms, 5_000);
  assert!(!cfg.engine.enforce_stock_on_completion);
}

#[test]
fn engine_section_is_read() {
  let cfg: ServerConfig = serde_json::from_value(json!({
    "engine": { "enforce_stock_on_completion": true }
  }))
  .unwrap();
  assert!(cfg.engine.enforce_stock_on_completion);
}
