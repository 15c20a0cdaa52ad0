//! Bills of materials, the resolver that expands them into priced
//! requirement lines, and the feasibility check built on top of it.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{
  Error, Result,
  product::{Product, ProductKind},
  store::UnitOfWork,
};

pub const DEFAULT_UNIT: &str = "pcs";

// ─── BomLine ─────────────────────────────────────────────────────────────────

/// One raw material in the recipe of a finished good.
///
/// Lines are never deleted; deactivating a line keeps it for audit while
/// removing it from resolution.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BomLine {
  pub bom_line_id:         Uuid,
  pub finished_product_id: Uuid,
  pub raw_material_id:     Uuid,
  /// Always positive.
  pub quantity_per_unit:   Decimal,
  pub unit:                String,
  pub notes:               Option<String>,
  pub is_active:           bool,
  pub created_at:          DateTime<Utc>,
  pub updated_at:          Option<DateTime<Utc>>,
}

/// Input to [`crate::service::ProductionService::add_bom_line`].
#[derive(Debug, Clone, Deserialize)]
pub struct NewBomLine {
  pub finished_product_id: Uuid,
  pub raw_material_id:     Uuid,
  pub quantity_per_unit:   Decimal,
  #[serde(default)]
  pub unit:                Option<String>,
  #[serde(default)]
  pub notes:               Option<String>,
}

impl NewBomLine {
  pub fn new(finished_product_id: Uuid, raw_material_id: Uuid, quantity_per_unit: Decimal) -> Self {
    Self {
      finished_product_id,
      raw_material_id,
      quantity_per_unit,
      unit: None,
      notes: None,
    }
  }
}

/// Changes accepted by [`crate::service::ProductionService::update_bom_line`].
#[derive(Debug, Clone, Default, Deserialize)]
pub struct BomLineChanges {
  pub quantity_per_unit: Option<Decimal>,
  pub unit:              Option<String>,
  pub notes:             Option<String>,
  pub is_active:         Option<bool>,
}

/// An active line joined with both of its products, for listings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BomLineView {
  #[serde(flatten)]
  pub line:             BomLine,
  pub finished_product: String,
  pub raw_material:     String,
}

pub(crate) fn validate_quantity_per_unit(quantity: Decimal) -> Result<()> {
  if quantity <= Decimal::ZERO {
    return Err(Error::InvalidQuantity(format!(
      "quantity per unit must be positive, got {quantity}"
    )));
  }
  Ok(())
}

// ─── Resolution ──────────────────────────────────────────────────────────────

/// A BOM line scaled to a production quantity and priced at current cost.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResolvedLine {
  pub raw_material_id:   Uuid,
  pub sku:               String,
  pub name:              String,
  pub kind:              ProductKind,
  pub quantity_per_unit: Decimal,
  pub unit:              String,
  /// `quantity_per_unit × quantity`, exact.
  pub quantity_needed:   Decimal,
  pub unit_price:        Decimal,
  /// `unit_price × quantity_needed`, exact.
  pub total_price:       Decimal,
  pub on_hand:           i64,
  pub is_available:      bool,
}

impl ResolvedLine {
  fn new(line: &BomLine, material: &Product, quantity: i64) -> Result<Self> {
    let quantity_needed = line
      .quantity_per_unit
      .checked_mul(Decimal::from(quantity))
      .ok_or_else(|| Error::out_of_range(format!("{quantity} units of {}", material.sku)))?;
    let unit_price = material.unit_price();
    let total_price = unit_price
      .checked_mul(quantity_needed)
      .ok_or_else(|| Error::out_of_range(format!("cost of {quantity_needed} {}", material.sku)))?;
    Ok(Self {
      raw_material_id: material.product_id,
      sku: material.sku.clone(),
      name: material.name.clone(),
      kind: material.kind,
      quantity_per_unit: line.quantity_per_unit,
      unit: line.unit.clone(),
      quantity_needed,
      unit_price,
      total_price,
      on_hand: material.quantity,
      is_available: Decimal::from(material.quantity) >= quantity_needed,
    })
  }
}

/// Expand the active BOM of `finished_product_id` for `quantity` units.
///
/// Lines come back ordered by raw-material name. A missing finished product,
/// or a line pointing at a raw material that no longer exists, is an error.
pub fn resolve(uow: &dyn UnitOfWork, finished_product_id: Uuid, quantity: i64) -> Result<Vec<ResolvedLine>> {
  if uow.product(finished_product_id)?.is_none() {
    return Err(Error::ProductNotFound(finished_product_id));
  }

  let lines = uow.active_bom_lines(Some(finished_product_id))?;
  let ids: Vec<Uuid> = lines.iter().map(|l| l.raw_material_id).collect();
  let materials: HashMap<Uuid, Product> = uow
    .products_by_ids(&ids)?
    .into_iter()
    .map(|p| (p.product_id, p))
    .collect();

  let mut resolved = lines
    .iter()
    .map(|line| {
      let material = materials
        .get(&line.raw_material_id)
        .ok_or(Error::ProductNotFound(line.raw_material_id))?;
      ResolvedLine::new(line, material, quantity)
    })
    .collect::<Result<Vec<_>>>()?;

  resolved.sort_by(|a, b| a.name.cmp(&b.name).then_with(|| a.sku.cmp(&b.sku)));
  Ok(resolved)
}

/// Whether every line of the BOM can be covered from current stock.
///
/// Deliberately a plain boolean; use [`resolve`] and inspect
/// [`ResolvedLine::is_available`] to find out which lines fall short.
pub fn can_produce(uow: &dyn UnitOfWork, finished_product_id: Uuid, quantity: i64) -> Result<bool> {
  Ok(
    resolve(uow, finished_product_id, quantity)?
      .iter()
      .all(|line| line.is_available),
  )
}

/// All active lines with product names, ordered by finished product and then
/// raw material.
pub fn list_active(uow: &dyn UnitOfWork) -> Result<Vec<BomLineView>> {
  let lines = uow.active_bom_lines(None)?;
  let mut ids: Vec<Uuid> = lines
    .iter()
    .flat_map(|l| [l.finished_product_id, l.raw_material_id])
    .collect();
  ids.sort_unstable();
  ids.dedup();

  let names: HashMap<Uuid, String> = uow
    .products_by_ids(&ids)?
    .into_iter()
    .map(|p| (p.product_id, p.name))
    .collect();
  let name_of = |id: &Uuid| names.get(id).cloned().unwrap_or_default();

  let mut views: Vec<BomLineView> = lines
    .into_iter()
    .map(|line| BomLineView {
      finished_product: name_of(&line.finished_product_id),
      raw_material: name_of(&line.raw_material_id),
      line,
    })
    .collect();

  views.sort_by(|a, b| {
    a.finished_product
      .cmp(&b.finished_product)
      .then_with(|| a.raw_material.cmp(&b.raw_material))
  });
  Ok(views)
}

/// Whether an active line already links these two products.
pub fn line_exists(uow: &dyn UnitOfWork, finished_product_id: Uuid, raw_material_id: Uuid) -> Result<bool> {
  Ok(
    uow
      .active_bom_lines(Some(finished_product_id))?
      .iter()
      .any(|l| l.raw_material_id == raw_material_id),
  )
}
