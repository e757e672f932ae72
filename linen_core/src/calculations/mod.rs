//! # Linen Calculations
//!
//! The calculation engine: one pure entry point, [`build_calculations`], that
//! turns a [`PortfolioSnapshot`] into a complete [`CalculationResult`].
//!
//! Engine rules:
//!
//! - Input is plain, JSON-serializable data
//! - Output is a freshly built, JSON-serializable result
//! - No I/O, no shared state, no caching
//!
//! Unlike the file and export layers, the engine cannot fail. Every number it
//! reads goes through a sanitizer first, so a malformed snapshot degrades to
//! zeros (or the documented defaults) instead of an error.
//!
//! ## Order of Operations
//!
//! 1. Sanitize `parLevel` and `margin` once
//! 2. Per property: sanitize stays, then per active item compute
//!    `subtotal = perStay × stays` and `withPar = ⌈subtotal × parLevel⌉`
//! 3. Per item: sum across properties, compare against stock
//! 4. Sum the per-item figures into portfolio totals
//!
//! The ceiling in step 2 happens per property-item, before any summation.
//!
//! ## Example
//!
//! ```rust
//! use linen_core::calculations::build_calculations;
//! use linen_core::snapshot::{PortfolioSnapshot, Property};
//!
//! let snapshot = PortfolioSnapshot::new(
//!     vec![Property::new("1", "Loft").with_stays(1).with_item("Towels", 1)],
//!     vec!["Towels".to_string()],
//! )
//! .with_par_level(1.5);
//!
//! let result = build_calculations(&snapshot);
//! assert_eq!(result.grand_totals["Towels"].total, 2); // ⌈1 × 1.5⌉
//! ```

mod property;
mod totals;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::sanitize::{finite_money, to_margin, to_par_level, to_unit_price, NumericInput};
use crate::snapshot::{ItemMap, PortfolioSnapshot};

/// Figures for one item at one property.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ItemResult {
    /// Sanitized quantity per stay
    pub per_stay: u64,

    /// Sanitized stays at the property
    pub stays: u64,

    /// `per_stay × stays`
    pub subtotal: u64,

    /// `⌈subtotal × parLevel⌉`
    pub with_par: u64,

    /// `with_par × unit price`
    pub item_cost: f64,
}

/// One property's breakdown. Carries the property's own fields so a result
/// can be rendered without the snapshot.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PropertyResult {
    pub id: String,

    pub name: String,

    /// Sanitized stay count
    pub stays: u64,

    /// Raw per-stay quantities as supplied (including inactive items)
    pub items: ItemMap<NumericInput>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,

    /// Active item → figures
    pub item_results: ItemMap<ItemResult>,

    /// Sum of `with_par` across active items
    pub property_total: u64,

    /// Sum of `item_cost` across active items
    pub property_cost: f64,

    /// `property_cost × (1 + margin / 100)`
    pub property_charge_to_owner: f64,
}

impl PropertyResult {
    /// Required units of `item` at this property, `0` if inactive
    pub fn with_par(&self, item: &str) -> u64 {
        self.item_results.get(item).map_or(0, |r| r.with_par)
    }

    /// Name for display, with a placeholder for unnamed properties
    pub fn display_name(&self) -> &str {
        if self.name.is_empty() {
            "Unnamed"
        } else {
            &self.name
        }
    }
}

/// Portfolio-wide figures for one item.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GrandTotal {
    /// Required units after PAR, summed over properties
    pub total: u64,

    /// Required units before PAR, summed over properties
    pub total_before_par: u64,

    /// `total × unit price`
    pub cost: f64,

    /// Sanitized unit price applied to this item
    pub unit_price: f64,

    /// Sanitized stock level
    pub in_stock: u64,

    /// `max(0, total − in_stock)`
    pub to_order: u64,

    /// `to_order × unit price`
    pub order_cost: f64,
}

/// Everything derived from one snapshot.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CalculationResult {
    /// One entry per input property, in input order
    pub property_results: Vec<PropertyResult>,

    /// Active items in the order they were evaluated (duplicates removed)
    pub items: Vec<String>,

    /// Active item → portfolio totals
    pub grand_totals: ItemMap<GrandTotal>,

    pub grand_total: u64,
    pub grand_total_before_par: u64,
    pub grand_total_cost: f64,
    pub grand_total_charge_to_owner: f64,
    pub grand_total_in_stock: u64,
    pub grand_total_to_order: u64,
    pub grand_total_order_cost: f64,

    /// PAR level actually applied
    pub safe_par_level: f64,

    /// Margin actually applied
    pub safe_margin: f64,
}

impl CalculationResult {
    /// Grand total for `item`, all zeros if the item was not active
    pub fn grand_total_for(&self, item: &str) -> GrandTotal {
        self.grand_totals.get(item).copied().unwrap_or_default()
    }

    /// Items with a shortfall and how many units to order, in item order
    pub fn items_to_order(&self) -> Vec<(String, u64)> {
        self.items
            .iter()
            .filter_map(|item| {
                let to_order = self.grand_total_for(item).to_order;
                (to_order > 0).then(|| (item.clone(), to_order))
            })
            .collect()
    }

    /// True when at least one active item has a positive price
    pub fn has_prices(&self) -> bool {
        self.grand_totals.values().any(|g| g.unit_price > 0.0)
    }

    /// Sum of sanitized stays across properties
    pub fn total_stays(&self) -> u64 {
        self.property_results
            .iter()
            .fold(0u64, |sum, p| sum.saturating_add(p.stays))
    }
}

/// Apply the owner margin to a cost.
pub fn charge_to_owner(cost: f64, safe_margin: f64) -> f64 {
    finite_money(cost * (1.0 + safe_margin / 100.0))
}

/// Compute every per-property, per-item and portfolio figure for a snapshot.
///
/// Total over all inputs: never fails, never panics, never mutates the
/// snapshot. See the [module docs](self) for the order of operations.
pub fn build_calculations(snapshot: &PortfolioSnapshot) -> CalculationResult {
    let safe_par_level = to_par_level(snapshot.par_level);
    let safe_margin = to_margin(snapshot.margin);

    let priced_items: Vec<(&str, f64)> = snapshot
        .distinct_active_items()
        .into_iter()
        .map(|item| (item, to_unit_price(snapshot.price(item))))
        .collect();

    let property_results: Vec<PropertyResult> = snapshot
        .properties
        .iter()
        .map(|p| property::property_result(p, &priced_items, safe_par_level, safe_margin))
        .collect();

    let grand_totals = totals::grand_totals(&property_results, &priced_items, &snapshot.inventory);
    let portfolio = totals::PortfolioTotals::sum(&priced_items, &grand_totals);

    debug!(
        properties = property_results.len(),
        items = priced_items.len(),
        grand_total = portfolio.grand_total,
        to_order = portfolio.grand_total_to_order,
        "built calculations"
    );

    CalculationResult {
        property_results,
        items: priced_items.iter().map(|(item, _)| item.to_string()).collect(),
        grand_totals,
        grand_total: portfolio.grand_total,
        grand_total_before_par: portfolio.grand_total_before_par,
        grand_total_cost: portfolio.grand_total_cost,
        grand_total_charge_to_owner: charge_to_owner(portfolio.grand_total_cost, safe_margin),
        grand_total_in_stock: portfolio.grand_total_in_stock,
        grand_total_to_order: portfolio.grand_total_to_order,
        grand_total_order_cost: portfolio.grand_total_order_cost,
        safe_par_level,
        safe_margin,
    }
}
