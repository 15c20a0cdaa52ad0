//! Encoding and decoding helpers between Tally domain types and the plain-text
//! representations stored in SQLite columns.
//!
//! Timestamps are fixed-width RFC 3339 strings (microseconds, `Z` suffix) so
//! that text ordering matches time ordering. Decimals are stored as their
//! exact string form. Enums use their snake_case strum names. UUIDs are
//! hyphenated lowercase strings.

use std::str::FromStr;

use chrono::{DateTime, SecondsFormat, Utc};
use rust_decimal::Decimal;
use tally_core::{
  bom::BomLine,
  ledger::StockTransaction,
  product::Product,
  production_log::ProductionLog,
  work_order::WorkOrder,
};
use uuid::Uuid;

use crate::{Error, Result};

// ─── Scalars ─────────────────────────────────────────────────────────────────

pub fn encode_uuid(id: Uuid) -> String { id.hyphenated().to_string() }

pub fn decode_uuid(s: &str) -> Result<Uuid> { Ok(Uuid::parse_str(s)?) }

pub fn encode_dt(dt: DateTime<Utc>) -> String {
  dt.to_rfc3339_opts(SecondsFormat::Micros, true)
}

pub fn decode_dt(s: &str) -> Result<DateTime<Utc>> {
  DateTime::parse_from_rfc3339(s)
    .map(|dt| dt.with_timezone(&Utc))
    .map_err(|e| Error::DateParse(e.to_string()))
}

fn decode_opt_dt(s: Option<String>) -> Result<Option<DateTime<Utc>>> {
  s.as_deref().map(decode_dt).transpose()
}

pub fn encode_decimal(d: Decimal) -> String { d.to_string() }

pub fn decode_decimal(s: &str) -> Result<Decimal> { Ok(Decimal::from_str(s)?) }

/// Parse a strum-backed enum column.
pub fn decode_enum<E: FromStr>(column: &'static str, s: &str) -> Result<E> {
  s.parse().map_err(|_| Error::UnknownVariant {
    column,
    value: s.to_owned(),
  })
}

// ─── Row types ───────────────────────────────────────────────────────────────
//
// Each `COLUMNS` constant lists the select order that the matching
// `from_row` reads by index.

/// Raw values read directly from a `products` row.
pub struct RawProduct {
  pub product_id:     String,
  pub name:           String,
  pub sku:            String,
  pub description:    Option<String>,
  pub kind:           String,
  pub quantity:       i64,
  pub purchase_price: String,
  pub sale_price:     String,
  pub price:          String,
  pub minimum_stock:  i64,
  pub unit:           Option<String>,
  pub created_at:     String,
  pub updated_at:     Option<String>,
}

impl RawProduct {
  pub const COLUMNS: &'static str = "product_id, name, sku, description, kind, quantity, purchase_price, \
                             sale_price, price, minimum_stock, unit, created_at, updated_at";

  pub fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      product_id:     row.get(0)?,
      name:           row.get(1)?,
      sku:            row.get(2)?,
      description:    row.get(3)?,
      kind:           row.get(4)?,
      quantity:       row.get(5)?,
      purchase_price: row.get(6)?,
      sale_price:     row.get(7)?,
      price:          row.get(8)?,
      minimum_stock:  row.get(9)?,
      unit:           row.get(10)?,
      created_at:     row.get(11)?,
      updated_at:     row.get(12)?,
    })
  }

  pub fn into_product(self) -> Result<Product> {
    Ok(Product {
      product_id:     decode_uuid(&self.product_id)?,
      name:           self.name,
      sku:            self.sku,
      description:    self.description,
      kind:           decode_enum("kind", &self.kind)?,
      quantity:       self.quantity,
      purchase_price: decode_decimal(&self.purchase_price)?,
      sale_price:     decode_decimal(&self.sale_price)?,
      price:          decode_decimal(&self.price)?,
      minimum_stock:  self.minimum_stock,
      unit:           self.unit,
      created_at:     decode_dt(&self.created_at)?,
      updated_at:     decode_opt_dt(self.updated_at)?,
    })
  }
}

/// Raw values read directly from a `bom_lines` row.
pub struct RawBomLine {
  pub bom_line_id:         String,
  pub finished_product_id: String,
  pub raw_material_id:     String,
  pub quantity_per_unit:   String,
  pub unit:                String,
  pub notes:               Option<String>,
  pub is_active:           bool,
  pub created_at:          String,
  pub updated_at:          Option<String>,
}

impl RawBomLine {
  pub const COLUMNS: &'static str = "bom_line_id, finished_product_id, raw_material_id, \
                             quantity_per_unit, unit, notes, is_active, created_at, updated_at";

  pub fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      bom_line_id:         row.get(0)?,
      finished_product_id: row.get(1)?,
      raw_material_id:     row.get(2)?,
      quantity_per_unit:   row.get(3)?,
      unit:                row.get(4)?,
      notes:               row.get(5)?,
      is_active:           row.get(6)?,
      created_at:          row.get(7)?,
      updated_at:          row.get(8)?,
    })
  }

  pub fn into_line(self) -> Result<BomLine> {
    Ok(BomLine {
      bom_line_id:         decode_uuid(&self.bom_line_id)?,
      finished_product_id: decode_uuid(&self.finished_product_id)?,
      raw_material_id:     decode_uuid(&self.raw_material_id)?,
      quantity_per_unit:   decode_decimal(&self.quantity_per_unit)?,
      unit:                self.unit,
      notes:               self.notes,
      is_active:           self.is_active,
      created_at:          decode_dt(&self.created_at)?,
      updated_at:          decode_opt_dt(self.updated_at)?,
    })
  }
}

/// Raw values read directly from a `stock_transactions` row.
pub struct RawStockTransaction {
  pub transaction_id: String,
  pub product_id:     String,
  pub kind:           String,
  pub quantity:       i64,
  pub reference:      Option<String>,
  pub notes:          Option<String>,
  pub recorded_at:    String,
}

impl RawStockTransaction {
  pub const COLUMNS: &'static str =
    "transaction_id, product_id, kind, quantity, reference, notes, recorded_at";

  pub fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      transaction_id: row.get(0)?,
      product_id:     row.get(1)?,
      kind:           row.get(2)?,
      quantity:       row.get(3)?,
      reference:      row.get(4)?,
      notes:          row.get(5)?,
      recorded_at:    row.get(6)?,
    })
  }

  pub fn into_transaction(self) -> Result<StockTransaction> {
    Ok(StockTransaction {
      transaction_id: decode_uuid(&self.transaction_id)?,
      product_id:     decode_uuid(&self.product_id)?,
      kind:           decode_enum("kind", &self.kind)?,
      quantity:       self.quantity,
      reference:      self.reference,
      notes:          self.notes,
      recorded_at:    decode_dt(&self.recorded_at)?,
    })
  }
}

/// Raw values read directly from a `work_orders` row.
pub struct RawWorkOrder {
  pub work_order_id:     String,
  pub order_number:      String,
  pub product_id:        String,
  pub quantity_ordered:  i64,
  pub quantity_produced: i64,
  pub total_cost:        String,
  pub status:            String,
  pub duration_minutes:  i64,
  pub start_date:        Option<String>,
  pub completion_date:   Option<String>,
  pub notes:             Option<String>,
  pub build_reference:   Option<String>,
  pub created_at:        String,
  pub updated_at:        Option<String>,
}

impl RawWorkOrder {
  pub const COLUMNS: &'static str = "work_order_id, order_number, product_id, quantity_ordered, \
                             quantity_produced, total_cost, status, duration_minutes, start_date, \
                             completion_date, notes, build_reference, created_at, updated_at";

  pub fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      work_order_id:     row.get(0)?,
      order_number:      row.get(1)?,
      product_id:        row.get(2)?,
      quantity_ordered:  row.get(3)?,
      quantity_produced: row.get(4)?,
      total_cost:        row.get(5)?,
      status:            row.get(6)?,
      duration_minutes:  row.get(7)?,
      start_date:        row.get(8)?,
      completion_date:   row.get(9)?,
      notes:             row.get(10)?,
      build_reference:   row.get(11)?,
      created_at:        row.get(12)?,
      updated_at:        row.get(13)?,
    })
  }

  pub fn into_work_order(self) -> Result<WorkOrder> {
    Ok(WorkOrder {
      work_order_id:     decode_uuid(&self.work_order_id)?,
      order_number:      self.order_number,
      product_id:        decode_uuid(&self.product_id)?,
      quantity_ordered:  self.quantity_ordered,
      quantity_produced: self.quantity_produced,
      total_cost:        decode_decimal(&self.total_cost)?,
      status:            decode_enum("status", &self.status)?,
      duration_minutes:  self.duration_minutes,
      start_date:        decode_opt_dt(self.start_date)?,
      completion_date:   decode_opt_dt(self.completion_date)?,
      notes:             self.notes,
      build_reference:   self.build_reference,
      created_at:        decode_dt(&self.created_at)?,
      updated_at:        decode_opt_dt(self.updated_at)?,
    })
  }
}

/// Raw values read directly from a `production_logs` row.
pub struct RawProductionLog {
  pub log_id:            String,
  pub work_order_id:     String,
  pub quantity_produced: i64,
  pub production_date:   String,
  pub operator_name:     Option<String>,
  pub shift_info:        Option<String>,
  pub notes:             Option<String>,
}

impl RawProductionLog {
  pub const COLUMNS: &'static str = "log_id, work_order_id, quantity_produced, production_date, \
                             operator_name, shift_info, notes";

  pub fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      log_id:            row.get(0)?,
      work_order_id:     row.get(1)?,
      quantity_produced: row.get(2)?,
      production_date:   row.get(3)?,
      operator_name:     row.get(4)?,
      shift_info:        row.get(5)?,
      notes:             row.get(6)?,
    })
  }

  pub fn into_log(self) -> Result<ProductionLog> {
    Ok(ProductionLog {
      log_id:            decode_uuid(&self.log_id)?,
      work_order_id:     decode_uuid(&self.work_order_id)?,
      quantity_produced: self.quantity_produced,
      production_date:   decode_dt(&self.production_date)?,
      operator_name:     self.operator_name,
      shift_info:        self.shift_info,
      notes:             self.notes,
    })
  }
}
