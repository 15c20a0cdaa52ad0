//! [`SqliteUnit`]: the [`UnitOfWork`] handed to engine closures.
//!
//! A unit borrows the connection of an open transaction; the store decides
//! whether that transaction commits. Every caller-supplied value is bound as a
//! parameter. The only SQL assembled at runtime is the fixed column lists and
//! `?` placeholder runs.

use chrono::Utc;
use rusqlite::{OptionalExtension as _, params, params_from_iter, types::Value};
use rust_decimal::Decimal;
use tally_core::{
  bom::BomLine,
  ledger::{StockEffect, StockTransaction, TransactionQuery},
  product::{Product, ProductKind},
  production_log::{ProductionLog, ProductionLogQuery},
  store::UnitOfWork,
  work_order::{WorkOrder, WorkOrderQuery},
};
use uuid::Uuid;

use crate::{
  Result,
  encode::{
    RawBomLine, RawProduct, RawProductionLog, RawStockTransaction, RawWorkOrder, encode_decimal,
    encode_dt, encode_uuid,
  },
};

pub(crate) struct SqliteUnit<'a> {
  conn: &'a rusqlite::Connection,
}

impl<'a> SqliteUnit<'a> {
  pub(crate) fn new(conn: &'a rusqlite::Connection) -> Self { Self { conn } }

  /// Run `f` against the connection, logging and converting any storage
  /// failure into the engine's error type.
  fn run<T>(&self, f: impl FnOnce(&rusqlite::Connection) -> Result<T>) -> tally_core::Result<T> {
    f(self.conn).map_err(|e| {
      tracing::error!(error = %e, "storage operation failed");
      e.into()
    })
  }
}

/// `?, ?, ?` for `n` bound values.
fn placeholders(n: usize) -> String { vec!["?"; n].join(", ") }

fn sql_limit(limit: usize) -> i64 { i64::try_from(limit).unwrap_or(i64::MAX) }

fn collect_rows<R>(rows: impl Iterator<Item = rusqlite::Result<R>>) -> Result<Vec<R>> {
  Ok(rows.collect::<rusqlite::Result<Vec<R>>>()?)
}

impl UnitOfWork for SqliteUnit<'_> {
  // ── Products ──────────────────────────────────────────────────────────────

  fn product(&self, id: Uuid) -> tally_core::Result<Option<Product>> {
    self.run(|conn| {
      let sql = format!("SELECT {} FROM products WHERE product_id = ?1", RawProduct::COLUMNS);
      conn
        .query_row(&sql, params![encode_uuid(id)], RawProduct::from_row)
        .optional()?
        .map(RawProduct::into_product)
        .transpose()
    })
  }

  fn products_by_ids(&self, ids: &[Uuid]) -> tally_core::Result<Vec<Product>> {
    if ids.is_empty() {
      return Ok(Vec::new());
    }
    self.run(|conn| {
      let sql = format!(
        "SELECT {} FROM products WHERE product_id IN ({})",
        RawProduct::COLUMNS,
        placeholders(ids.len()),
      );
      let mut stmt = conn.prepare(&sql)?;
      let rows = collect_rows(stmt.query_map(
        params_from_iter(ids.iter().map(|id| encode_uuid(*id))),
        RawProduct::from_row,
      )?)?;
      rows.into_iter().map(RawProduct::into_product).collect()
    })
  }

  fn list_products(&self, kind: Option<ProductKind>) -> tally_core::Result<Vec<Product>> {
    self.run(|conn| {
      let rows = match kind {
        Some(kind) => {
          let sql = format!(
            "SELECT {} FROM products WHERE kind = ?1 ORDER BY name, sku",
            RawProduct::COLUMNS
          );
          let mut stmt = conn.prepare(&sql)?;
          collect_rows(stmt.query_map(params![kind.as_ref()], RawProduct::from_row)?)?
        }
        None => {
          let sql = format!("SELECT {} FROM products ORDER BY name, sku", RawProduct::COLUMNS);
          let mut stmt = conn.prepare(&sql)?;
          collect_rows(stmt.query_map([], RawProduct::from_row)?)?
        }
      };
      rows.into_iter().map(RawProduct::into_product).collect()
    })
  }

  fn low_stock_products(&self) -> tally_core::Result<Vec<Product>> {
    self.run(|conn| {
      let sql = format!(
        "SELECT {} FROM products WHERE quantity <= minimum_stock ORDER BY name, sku",
        RawProduct::COLUMNS
      );
      let mut stmt = conn.prepare(&sql)?;
      let rows = collect_rows(stmt.query_map([], RawProduct::from_row)?)?;
      rows.into_iter().map(RawProduct::into_product).collect()
    })
  }

  fn insert_product(&mut self, product: &Product) -> tally_core::Result<()> {
    self.run(|conn| {
      conn.execute(
        "INSERT INTO products (
           product_id, name, sku, description, kind, quantity, purchase_price,
           sale_price, price, minimum_stock, unit, created_at, updated_at
         ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13)",
        params![
          encode_uuid(product.product_id),
          product.name,
          product.sku,
          product.description,
          product.kind.as_ref(),
          product.quantity,
          encode_decimal(product.purchase_price),
          encode_decimal(product.sale_price),
          encode_decimal(product.price),
          product.minimum_stock,
          product.unit,
          encode_dt(product.created_at),
          product.updated_at.map(encode_dt),
        ],
      )?;
      Ok(())
    })
  }

  fn apply_stock_effect(&mut self, product_id: Uuid, effect: StockEffect) -> tally_core::Result<bool> {
    let (sql, quantity) = match effect {
      StockEffect::Increase(q) => (
        "UPDATE products SET quantity = quantity + ?2, updated_at = ?3 WHERE product_id = ?1",
        q,
      ),
      StockEffect::Decrease(q) => (
        "UPDATE products SET quantity = quantity - ?2, updated_at = ?3 WHERE product_id = ?1",
        q,
      ),
      StockEffect::Set(q) => (
        "UPDATE products SET quantity = ?2, updated_at = ?3 WHERE product_id = ?1",
        q,
      ),
    };
    self.run(|conn| {
      let changed = conn.execute(
        sql,
        params![encode_uuid(product_id), quantity, encode_dt(Utc::now())],
      )?;
      Ok(changed == 1)
    })
  }

  fn set_unit_cost(&mut self, product_id: Uuid, unit_cost: Decimal) -> tally_core::Result<bool> {
    self.run(|conn| {
      let changed = conn.execute(
        "UPDATE products SET purchase_price = ?2, price = ?2, updated_at = ?3
         WHERE product_id = ?1",
        params![
          encode_uuid(product_id),
          encode_decimal(unit_cost),
          encode_dt(Utc::now())
        ],
      )?;
      Ok(changed == 1)
    })
  }

  // ── Bill of materials ─────────────────────────────────────────────────────

  fn bom_line(&self, id: Uuid) -> tally_core::Result<Option<BomLine>> {
    self.run(|conn| {
      let sql = format!("SELECT {} FROM bom_lines WHERE bom_line_id = ?1", RawBomLine::COLUMNS);
      conn
        .query_row(&sql, params![encode_uuid(id)], RawBomLine::from_row)
        .optional()?
        .map(RawBomLine::into_line)
        .transpose()
    })
  }

  fn active_bom_lines(&self, finished_product_id: Option<Uuid>) -> tally_core::Result<Vec<BomLine>> {
    self.run(|conn| {
      let rows = match finished_product_id {
        Some(id) => {
          let sql = format!(
            "SELECT {} FROM bom_lines
             WHERE is_active = 1 AND finished_product_id = ?1
             ORDER BY created_at, rowid",
            RawBomLine::COLUMNS
          );
          let mut stmt = conn.prepare(&sql)?;
          collect_rows(stmt.query_map(params![encode_uuid(id)], RawBomLine::from_row)?)?
        }
        None => {
          let sql = format!(
            "SELECT {} FROM bom_lines WHERE is_active = 1 ORDER BY created_at, rowid",
            RawBomLine::COLUMNS
          );
          let mut stmt = conn.prepare(&sql)?;
          collect_rows(stmt.query_map([], RawBomLine::from_row)?)?
        }
      };
      rows.into_iter().map(RawBomLine::into_line).collect()
    })
  }

  fn insert_bom_line(&mut self, line: &BomLine) -> tally_core::Result<()> {
    self.run(|conn| {
      conn.execute(
        "INSERT INTO bom_lines (
           bom_line_id, finished_product_id, raw_material_id, quantity_per_unit,
           unit, notes, is_active, created_at, updated_at
         ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)",
        params![
          encode_uuid(line.bom_line_id),
          encode_uuid(line.finished_product_id),
          encode_uuid(line.raw_material_id),
          encode_decimal(line.quantity_per_unit),
          line.unit,
          line.notes,
          line.is_active,
          encode_dt(line.created_at),
          line.updated_at.map(encode_dt),
        ],
      )?;
      Ok(())
    })
  }

  fn update_bom_line(&mut self, line: &BomLine) -> tally_core::Result<()> {
    self.run(|conn| {
      conn.execute(
        "UPDATE bom_lines
         SET quantity_per_unit = ?2, unit = ?3, notes = ?4, is_active = ?5, updated_at = ?6
         WHERE bom_line_id = ?1",
        params![
          encode_uuid(line.bom_line_id),
          encode_decimal(line.quantity_per_unit),
          line.unit,
          line.notes,
          line.is_active,
          line.updated_at.map(encode_dt),
        ],
      )?;
      Ok(())
    })
  }

  // ── Stock ledger ──────────────────────────────────────────────────────────

  fn insert_stock_transaction(&mut self, transaction: &StockTransaction) -> tally_core::Result<()> {
    self.run(|conn| {
      conn.execute(
        "INSERT INTO stock_transactions (
           transaction_id, product_id, kind, quantity, reference, notes, recorded_at
         ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
        params![
          encode_uuid(transaction.transaction_id),
          encode_uuid(transaction.product_id),
          transaction.kind.as_ref(),
          transaction.quantity,
          transaction.reference,
          transaction.notes,
          encode_dt(transaction.recorded_at),
        ],
      )?;
      Ok(())
    })
  }

  fn stock_transactions(&self, query: &TransactionQuery) -> tally_core::Result<Vec<StockTransaction>> {
    self.run(|conn| {
      let mut sql = format!("SELECT {} FROM stock_transactions", RawStockTransaction::COLUMNS);
      let mut values: Vec<Value> = Vec::new();

      if let Some(product_id) = query.product_id {
        sql.push_str(" WHERE product_id = ?");
        values.push(Value::Text(encode_uuid(product_id)));
      }
      sql.push_str(if query.newest_first {
        " ORDER BY rowid DESC"
      } else {
        " ORDER BY rowid ASC"
      });
      if let Some(limit) = query.limit {
        sql.push_str(" LIMIT ?");
        values.push(Value::Integer(sql_limit(limit)));
      }

      let mut stmt = conn.prepare(&sql)?;
      let rows = collect_rows(stmt.query_map(params_from_iter(values), RawStockTransaction::from_row)?)?;
      rows
        .into_iter()
        .map(RawStockTransaction::into_transaction)
        .collect()
    })
  }

  // ── Work orders ───────────────────────────────────────────────────────────

  fn work_order(&self, id: Uuid) -> tally_core::Result<Option<WorkOrder>> {
    self.run(|conn| {
      let sql = format!(
        "SELECT {} FROM work_orders WHERE work_order_id = ?1",
        RawWorkOrder::COLUMNS
      );
      conn
        .query_row(&sql, params![encode_uuid(id)], RawWorkOrder::from_row)
        .optional()?
        .map(RawWorkOrder::into_work_order)
        .transpose()
    })
  }

  fn work_orders(&self, query: &WorkOrderQuery) -> tally_core::Result<Vec<WorkOrder>> {
    self.run(|conn| {
      let mut sql = format!("SELECT {} FROM work_orders WHERE 1 = 1", RawWorkOrder::COLUMNS);
      let mut values: Vec<Value> = Vec::new();

      if !query.statuses.is_empty() {
        sql.push_str(&format!(" AND status IN ({})", placeholders(query.statuses.len())));
        values.extend(
          query
            .statuses
            .iter()
            .map(|s| Value::Text(s.as_ref().to_owned())),
        );
      }
      if let Some(product_id) = query.product_id {
        sql.push_str(" AND product_id = ?");
        values.push(Value::Text(encode_uuid(product_id)));
      }
      sql.push_str(" ORDER BY created_at DESC, rowid DESC");

      let mut stmt = conn.prepare(&sql)?;
      let rows = collect_rows(stmt.query_map(params_from_iter(values), RawWorkOrder::from_row)?)?;
      rows.into_iter().map(RawWorkOrder::into_work_order).collect()
    })
  }

  fn insert_work_order(&mut self, order: &WorkOrder) -> tally_core::Result<()> {
    self.run(|conn| {
      conn.execute(
        "INSERT INTO work_orders (
           work_order_id, order_number, product_id, quantity_ordered, quantity_produced,
           total_cost, status, duration_minutes, start_date, completion_date, notes,
           build_reference, created_at, updated_at
         ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14)",
        params![
          encode_uuid(order.work_order_id),
          order.order_number,
          encode_uuid(order.product_id),
          order.quantity_ordered,
          order.quantity_produced,
          encode_decimal(order.total_cost),
          order.status.as_ref(),
          order.duration_minutes,
          order.start_date.map(encode_dt),
          order.completion_date.map(encode_dt),
          order.notes,
          order.build_reference,
          encode_dt(order.created_at),
          order.updated_at.map(encode_dt),
        ],
      )?;
      Ok(())
    })
  }

  fn update_work_order(&mut self, order: &WorkOrder) -> tally_core::Result<()> {
    self.run(|conn| {
      conn.execute(
        "UPDATE work_orders SET
           order_number = ?2, product_id = ?3, quantity_ordered = ?4,
           quantity_produced = ?5, total_cost = ?6, status = ?7, duration_minutes = ?8,
           start_date = ?9, completion_date = ?10, notes = ?11, build_reference = ?12,
           updated_at = ?13
         WHERE work_order_id = ?1",
        params![
          encode_uuid(order.work_order_id),
          order.order_number,
          encode_uuid(order.product_id),
          order.quantity_ordered,
          order.quantity_produced,
          encode_decimal(order.total_cost),
          order.status.as_ref(),
          order.duration_minutes,
          order.start_date.map(encode_dt),
          order.completion_date.map(encode_dt),
          order.notes,
          order.build_reference,
          order.updated_at.map(encode_dt),
        ],
      )?;
      Ok(())
    })
  }

  fn delete_work_order(&mut self, id: Uuid) -> tally_core::Result<bool> {
    self.run(|conn| {
      let changed = conn.execute(
        "DELETE FROM work_orders WHERE work_order_id = ?1",
        params![encode_uuid(id)],
      )?;
      Ok(changed == 1)
    })
  }

  // ── Production logs ───────────────────────────────────────────────────────

  fn insert_production_log(&mut self, log: &ProductionLog) -> tally_core::Result<()> {
    self.run(|conn| {
      conn.execute(
        "INSERT INTO production_logs (
           log_id, work_order_id, quantity_produced, production_date,
           operator_name, shift_info, notes
         ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
        params![
          encode_uuid(log.log_id),
          encode_uuid(log.work_order_id),
          log.quantity_produced,
          encode_dt(log.production_date),
          log.operator_name,
          log.shift_info,
          log.notes,
        ],
      )?;
      Ok(())
    })
  }

  fn production_logs(&self, query: &ProductionLogQuery) -> tally_core::Result<Vec<ProductionLog>> {
    self.run(|conn| {
      let mut sql = format!("SELECT {} FROM production_logs", RawProductionLog::COLUMNS);
      let mut values: Vec<Value> = Vec::new();

      if let Some(work_order_id) = query.work_order_id {
        sql.push_str(" WHERE work_order_id = ?");
        values.push(Value::Text(encode_uuid(work_order_id)));
      }
      sql.push_str(" ORDER BY production_date DESC, rowid DESC");
      if let Some(limit) = query.limit {
        sql.push_str(" LIMIT ?");
        values.push(Value::Integer(sql_limit(limit)));
      }

      let mut stmt = conn.prepare(&sql)?;
      let rows = collect_rows(stmt.query_map(params_from_iter(values), RawProductionLog::from_row)?)?;
      rows.into_iter().map(RawProductionLog::into_log).collect()
    })
  }
}
