//! Products: finished goods and the raw materials they are built from.
//!
//! A product's on-hand quantity is owned by the stock ledger and its unit cost
//! by the costing engine; nothing else writes either column.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use strum::{AsRefStr, Display, EnumString};
use uuid::Uuid;

/// Default low-stock threshold for new products.
pub const DEFAULT_MINIMUM_STOCK: i64 = 10;

/// Whether a product is built by work orders or consumed by them.
#[derive(
  Debug,
  Clone,
  Copy,
  PartialEq,
  Eq,
  Hash,
  Serialize,
  Deserialize,
  Display,
  EnumString,
  AsRefStr,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum ProductKind {
  FinishedGood,
  RawMaterial,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Product {
  pub product_id:     Uuid,
  pub name:           String,
  pub sku:            String,
  pub description:    Option<String>,
  pub kind:           ProductKind,
  /// Signed: completions do not re-check stock, so raw materials can be
  /// driven below zero.
  pub quantity:       i64,
  /// Unit cost. Rewritten by the weighted-average update for finished goods.
  pub purchase_price: Decimal,
  pub sale_price:     Decimal,
  /// Legacy price column, kept equal to `purchase_price` whenever the costing
  /// engine writes a unit cost.
  pub price:          Decimal,
  pub minimum_stock:  i64,
  pub unit:           Option<String>,
  pub created_at:     DateTime<Utc>,
  pub updated_at:     Option<DateTime<Utc>>,
}

impl Product {
  /// The price used when this product is consumed by a BOM: the purchase
  /// price, or the sale price for legacy rows without a purchase cost.
  pub fn unit_price(&self) -> Decimal {
    if self.purchase_price > Decimal::ZERO {
      self.purchase_price
    } else {
      self.sale_price
    }
  }

  pub fn is_low_stock(&self) -> bool { self.quantity <= self.minimum_stock }
}

/// Input to [`crate::service::ProductionService::add_product`].
///
/// `quantity` is the opening stock; it is booked through the ledger as an
/// adjustment rather than written to the product row directly.
#[derive(Debug, Clone, Deserialize)]
pub struct NewProduct {
  pub name:           String,
  pub sku:            String,
  #[serde(default)]
  pub description:    Option<String>,
  pub kind:           ProductKind,
  #[serde(default)]
  pub quantity:       i64,
  #[serde(default)]
  pub purchase_price: Decimal,
  #[serde(default)]
  pub sale_price:     Decimal,
  #[serde(default = "default_minimum_stock")]
  pub minimum_stock:  i64,
  #[serde(default)]
  pub unit:           Option<String>,
}

fn default_minimum_stock() -> i64 { DEFAULT_MINIMUM_STOCK }

impl NewProduct {
  pub fn new(name: impl Into<String>, sku: impl Into<String>, kind: ProductKind) -> Self {
    Self {
      name: name.into(),
      sku: sku.into(),
      description: None,
      kind,
      quantity: 0,
      purchase_price: Decimal::ZERO,
      sale_price: Decimal::ZERO,
      minimum_stock: DEFAULT_MINIMUM_STOCK,
      unit: None,
    }
  }

  pub fn with_quantity(mut self, quantity: i64) -> Self {
    self.quantity = quantity;
    self
  }

  pub fn with_purchase_price(mut self, price: Decimal) -> Self {
    self.purchase_price = price;
    self
  }

  pub fn with_sale_price(mut self, price: Decimal) -> Self {
    self.sale_price = price;
    self
  }
}
