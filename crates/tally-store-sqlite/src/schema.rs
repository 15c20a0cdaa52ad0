//! SQL schema for the Tally SQLite store.
//!
//! Executed once at connection startup. Money and per-unit quantities are
//! stored as decimal text so that no value ever passes through a float.

/// Full schema DDL; idempotent thanks to `IF NOT EXISTS`.
pub const SCHEMA: &str = "
PRAGMA journal_mode = WAL;
PRAGMA foreign_keys = ON;

CREATE TABLE IF NOT EXISTS products (
    product_id      TEXT PRIMARY KEY,
    name            TEXT NOT NULL,
    sku             TEXT NOT NULL,
    description     TEXT,
    kind            TEXT NOT NULL,              -- 'finished_good' | 'raw_material'
    quantity        INTEGER NOT NULL DEFAULT 0, -- may go negative
    purchase_price  TEXT NOT NULL DEFAULT '0',  -- unit cost
    sale_price      TEXT NOT NULL DEFAULT '0',
    price           TEXT NOT NULL DEFAULT '0',  -- mirrors purchase_price
    minimum_stock   INTEGER NOT NULL DEFAULT 10,
    unit            TEXT,
    created_at      TEXT NOT NULL,
    updated_at      TEXT
);

CREATE TABLE IF NOT EXISTS bom_lines (
    bom_line_id         TEXT PRIMARY KEY,
    finished_product_id TEXT NOT NULL REFERENCES products(product_id),
    raw_material_id     TEXT NOT NULL REFERENCES products(product_id),
    quantity_per_unit   TEXT NOT NULL,
    unit                TEXT NOT NULL DEFAULT 'pcs',
    notes               TEXT,
    is_active           INTEGER NOT NULL DEFAULT 1,
    created_at          TEXT NOT NULL,
    updated_at          TEXT
);

-- At most one active line per (finished product, raw material) pair.
CREATE UNIQUE INDEX IF NOT EXISTS bom_lines_active_pair_idx
    ON bom_lines(finished_product_id, raw_material_id)
    WHERE is_active = 1;

-- The ledger is append-only; rowid order is insertion order.
CREATE TABLE IF NOT EXISTS stock_transactions (
    transaction_id TEXT PRIMARY KEY,
    product_id     TEXT NOT NULL REFERENCES products(product_id),
    kind           TEXT NOT NULL,   -- 'in' | 'out' | 'adjustment'
    quantity       INTEGER NOT NULL,
    reference      TEXT,
    notes          TEXT,
    recorded_at    TEXT NOT NULL
);

CREATE TRIGGER IF NOT EXISTS stock_transactions_no_update
BEFORE UPDATE ON stock_transactions
BEGIN
    SELECT RAISE(ABORT, 'stock transactions are append-only');
END;

CREATE TRIGGER IF NOT EXISTS stock_transactions_no_delete
BEFORE DELETE ON stock_transactions
BEGIN
    SELECT RAISE(ABORT, 'stock transactions are append-only');
END;

CREATE TABLE IF NOT EXISTS work_orders (
    work_order_id     TEXT PRIMARY KEY,
    order_number      TEXT NOT NULL,
    product_id        TEXT NOT NULL REFERENCES products(product_id),
    quantity_ordered  INTEGER NOT NULL,
    quantity_produced INTEGER NOT NULL DEFAULT 0,
    total_cost        TEXT NOT NULL DEFAULT '0',
    status            TEXT NOT NULL,
    duration_minutes  INTEGER NOT NULL DEFAULT 0,
    start_date        TEXT,
    completion_date   TEXT,
    notes             TEXT,
    build_reference   TEXT,
    created_at        TEXT NOT NULL,
    updated_at        TEXT
);

CREATE TABLE IF NOT EXISTS production_logs (
    log_id            TEXT PRIMARY KEY,
    work_order_id     TEXT NOT NULL REFERENCES work_orders(work_order_id) ON DELETE CASCADE,
    quantity_produced INTEGER NOT NULL,
    production_date   TEXT NOT NULL,
    operator_name     TEXT,
    shift_info        TEXT,
    notes             TEXT
);

CREATE INDEX IF NOT EXISTS products_name_idx            ON products(name);
CREATE INDEX IF NOT EXISTS bom_lines_finished_idx       ON bom_lines(finished_product_id);
CREATE INDEX IF NOT EXISTS stock_transactions_prod_idx  ON stock_transactions(product_id);
CREATE INDEX IF NOT EXISTS work_orders_product_idx      ON work_orders(product_id);
CREATE INDEX IF NOT EXISTS work_orders_status_idx       ON work_orders(status);
CREATE INDEX IF NOT EXISTS production_logs_order_idx    ON production_logs(work_order_id);

PRAGMA user_version = 1;
";
