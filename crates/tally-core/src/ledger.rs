//! The stock ledger, the only writer of on-hand quantities.
//!
//! Every movement is an immutable [`StockTransaction`]. [`record`] appends the
//! row and applies its effect through the same [`UnitOfWork`], so a reader can
//! never observe one without the other. Replaying a product's ledger from zero
//! reproduces its stored quantity exactly; [`reconcile`] checks that.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use strum::{AsRefStr, Display, EnumString};
use uuid::Uuid;

use crate::{Error, Result, store::UnitOfWork};

/// Reference stamped on the adjustment that books a new product's opening
/// stock.
pub const OPENING_REFERENCE: &str = "OPENING";

// ─── Types ───────────────────────────────────────────────────────────────────

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
pub enum TransactionKind {
  In,
  Out,
  /// Sets the on-hand quantity absolutely (stock count correction).
  Adjustment,
}

/// A ledger row. Never updated or deleted once written.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StockTransaction {
  pub transaction_id: Uuid,
  pub product_id:     Uuid,
  pub kind:           TransactionKind,
  pub quantity:       i64,
  pub reference:      Option<String>,
  pub notes:          Option<String>,
  /// Server-assigned.
  pub recorded_at:    DateTime<Utc>,
}

impl StockTransaction {
  pub fn effect(&self) -> StockEffect {
    match self.kind {
      TransactionKind::In => StockEffect::Increase(self.quantity),
      TransactionKind::Out => StockEffect::Decrease(self.quantity),
      TransactionKind::Adjustment => StockEffect::Set(self.quantity),
    }
  }
}

/// Input to [`record`].
#[derive(Debug, Clone, Deserialize)]
pub struct NewStockTransaction {
  pub product_id: Uuid,
  pub kind:       TransactionKind,
  pub quantity:   i64,
  #[serde(default)]
  pub reference:  Option<String>,
  #[serde(default)]
  pub notes:      Option<String>,
}

impl NewStockTransaction {
  pub fn new(product_id: Uuid, kind: TransactionKind, quantity: i64) -> Self {
    Self { product_id, kind, quantity, reference: None, notes: None }
  }

  pub fn with_reference(mut self, reference: impl Into<String>) -> Self {
    self.reference = Some(reference.into());
    self
  }

  pub fn with_notes(mut self, notes: impl Into<String>) -> Self {
    self.notes = Some(notes.into());
    self
  }
}

/// What a transaction does to the on-hand quantity.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StockEffect {
  Increase(i64),
  Decrease(i64),
  Set(i64),
}

impl StockEffect {
  /// The quantity after this effect, or `InvalidQuantity` if it would not
  /// fit a ledger quantity.
  pub fn apply(self, current: i64) -> Result<i64> {
    let next = match self {
      Self::Increase(q) => current.checked_add(q),
      Self::Decrease(q) => current.checked_sub(q),
      Self::Set(q) => Some(q),
    };
    next.ok_or_else(|| Error::out_of_range(format!("{current} on hand after {self:?}")))
  }
}

/// Parameters for listing ledger rows.
#[derive(Debug, Clone, Default)]
pub struct TransactionQuery {
  pub product_id:   Option<Uuid>,
  /// Insertion order is the default; set this for "most recent" listings.
  pub newest_first: bool,
  pub limit:        Option<usize>,
}

impl TransactionQuery {
  pub fn for_product(product_id: Uuid) -> Self {
    Self { product_id: Some(product_id), ..Self::default() }
  }

  pub fn recent(limit: usize) -> Self {
    Self { product_id: None, newest_first: true, limit: Some(limit) }
  }
}

/// Stored quantity against the quantity rebuilt from the ledger.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Reconciliation {
  pub product_id:        Uuid,
  pub on_hand:           i64,
  pub replayed:          i64,
  pub transaction_count: usize,
}

impl Reconciliation {
  pub fn is_consistent(&self) -> bool { self.on_hand == self.replayed }
}

// ─── Operations ──────────────────────────────────────────────────────────────

/// Append a transaction and apply its effect to the product, inside `uow`.
///
/// Nothing is written if the product does not exist or the resulting
/// quantity would overflow.
pub fn record(uow: &mut dyn UnitOfWork, input: NewStockTransaction) -> Result<StockTransaction> {
  validate_quantity(input.kind, input.quantity)?;
  let product = uow
    .product(input.product_id)?
    .ok_or(Error::ProductNotFound(input.product_id))?;

  let transaction = StockTransaction {
    transaction_id: Uuid::new_v4(),
    product_id:     input.product_id,
    kind:           input.kind,
    quantity:       input.quantity,
    reference:      input.reference,
    notes:          input.notes,
    recorded_at:    Utc::now(),
  };

  transaction.effect().apply(product.quantity)?;
  if !uow.apply_stock_effect(transaction.product_id, transaction.effect())? {
    return Err(Error::ProductNotFound(transaction.product_id));
  }
  uow.insert_stock_transaction(&transaction)?;

  Ok(transaction)
}

/// Rebuild an on-hand quantity from transactions given in insertion order.
pub fn replay<'a>(transactions: impl IntoIterator<Item = &'a StockTransaction>) -> Result<i64> {
  transactions
    .into_iter()
    .try_fold(0, |quantity, t| t.effect().apply(quantity))
}

pub fn reconcile(uow: &dyn UnitOfWork, product_id: Uuid) -> Result<Reconciliation> {
  let product = uow
    .product(product_id)?
    .ok_or(Error::ProductNotFound(product_id))?;
  let transactions = uow.stock_transactions(&TransactionQuery::for_product(product_id))?;

  Ok(Reconciliation {
    product_id,
    on_hand: product.quantity,
    replayed: replay(&transactions)?,
    transaction_count: transactions.len(),
  })
}

fn validate_quantity(kind: TransactionKind, quantity: i64) -> Result<()> {
  let valid = match kind {
    TransactionKind::In | TransactionKind::Out => quantity > 0,
    TransactionKind::Adjustment => quantity >= 0,
  };
  if valid {
    Ok(())
  } else {
    Err(Error::InvalidQuantity(format!("{kind} of {quantity} units")))
  }
}
