//! # Portfolio Snapshot
//!
//! The engine's sole input. A snapshot is plain data: the caller owns it,
//! the engine only borrows it, and nothing in it is trusted to be clean.
//!
//! ## JSON Example
//!
//! ```json
//! {
//!   "properties": [
//!     { "id": "1", "name": "Harbour View", "stays": 8, "items": { "Bath Towels": 4 } }
//!   ],
//!   "activeItems": ["Bath Towels"],
//!   "parLevel": 1.5,
//!   "unitPrices": { "Bath Towels": 6.5 },
//!   "margin": 40,
//!   "inventory": { "Bath Towels": 12 }
//! }
//! ```
//!
//! `unitPrices`, `margin` and `inventory` are optional; `margin` defaults to
//! 40 when the field is absent.

use std::collections::{BTreeMap, HashSet};

use serde::{Deserialize, Serialize};

use crate::sanitize::{NumericInput, DEFAULT_MARGIN};

/// Item name → value mapping. A missing key reads as the value's zero.
pub type ItemMap<V> = BTreeMap<String, V>;

/// One rental unit for a planning period.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Property {
    /// Caller-assigned identifier, unique within a portfolio
    pub id: String,

    /// Display label (may be empty)
    #[serde(default)]
    pub name: String,

    /// Guest turnovers in the period (sanitized by the engine)
    #[serde(default)]
    pub stays: NumericInput,

    /// Quantity of each item needed per stay (sanitized by the engine)
    #[serde(default)]
    pub items: ItemMap<NumericInput>,

    /// Free text, never read by calculations
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
}

impl Property {
    /// Create a property with no stays and no items.
    ///
    /// # Example
    ///
    /// ```rust
    /// use linen_core::snapshot::Property;
    ///
    /// let property = Property::new("1", "Harbour View")
    ///     .with_stays(8)
    ///     .with_item("Bath Towels", 4);
    /// assert_eq!(property.quantity("Bath Towels").value(), 4.0);
    /// assert_eq!(property.quantity("Tea Towels").value(), 0.0);
    /// ```
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Property {
            id: id.into(),
            name: name.into(),
            stays: NumericInput::default(),
            items: ItemMap::new(),
            notes: None,
        }
    }

    /// Builder: set the stay count
    pub fn with_stays(mut self, stays: impl Into<NumericInput>) -> Self {
        self.stays = stays.into();
        self
    }

    /// Builder: set the per-stay quantity of one item
    pub fn with_item(mut self, item: impl Into<String>, quantity: impl Into<NumericInput>) -> Self {
        self.items.insert(item.into(), quantity.into());
        self
    }

    /// Builder: attach notes
    pub fn with_notes(mut self, notes: impl Into<String>) -> Self {
        self.notes = Some(notes.into());
        self
    }

    /// Raw per-stay quantity for `item`, `0` when the key is missing
    pub fn quantity(&self, item: &str) -> NumericInput {
        self.items.get(item).copied().unwrap_or_default()
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

fn default_margin() -> NumericInput {
    NumericInput(DEFAULT_MARGIN)
}

fn default_par_level() -> NumericInput {
    NumericInput(1.0)
}

/// Everything the engine needs for one computation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PortfolioSnapshot {
    /// Properties in display order
    #[serde(default)]
    pub properties: Vec<Property>,

    /// Items to include; anything else is ignored even if a property lists it
    #[serde(default)]
    pub active_items: Vec<String>,

    /// Replenishment multiplier, sanitized into `[0.5, 10]`
    #[serde(default = "default_par_level")]
    pub par_level: NumericInput,

    /// Unit price per item
    #[serde(default)]
    pub unit_prices: ItemMap<NumericInput>,

    /// Owner markup percentage, sanitized into `[0, 200]`
    #[serde(default = "default_margin")]
    pub margin: NumericInput,

    /// Units currently in stock per item
    #[serde(default)]
    pub inventory: ItemMap<NumericInput>,
}

impl Default for PortfolioSnapshot {
    fn default() -> Self {
        PortfolioSnapshot {
            properties: Vec::new(),
            active_items: Vec::new(),
            par_level: default_par_level(),
            unit_prices: ItemMap::new(),
            margin: default_margin(),
            inventory: ItemMap::new(),
        }
    }
}

impl PortfolioSnapshot {
    /// Create a snapshot with the given properties and active items,
    /// PAR level 1, margin 40, no prices and no stock.
    pub fn new(properties: Vec<Property>, active_items: Vec<String>) -> Self {
        PortfolioSnapshot {
            properties,
            active_items,
            ..Default::default()
        }
    }

    /// Builder: set the PAR level
    pub fn with_par_level(mut self, par_level: impl Into<NumericInput>) -> Self {
        self.par_level = par_level.into();
        self
    }

    /// Builder: set the owner margin percentage
    pub fn with_margin(mut self, margin: impl Into<NumericInput>) -> Self {
        self.margin = margin.into();
        self
    }

    /// Builder: set one unit price
    pub fn with_price(mut self, item: impl Into<String>, price: impl Into<NumericInput>) -> Self {
        self.unit_prices.insert(item.into(), price.into());
        self
    }

    /// Builder: set one stock level
    pub fn with_stock(mut self, item: impl Into<String>, count: impl Into<NumericInput>) -> Self {
        self.inventory.insert(item.into(), count.into());
        self
    }

    /// Raw unit price for `item`, `0` when unlisted
    pub fn price(&self, item: &str) -> NumericInput {
        self.unit_prices.get(item).copied().unwrap_or_default()
    }

    /// Raw stock level for `item`, `0` when unlisted
    pub fn stock(&self, item: &str) -> NumericInput {
        self.inventory.get(item).copied().unwrap_or_default()
    }

    /// Active items with duplicates removed, first occurrence kept
    pub fn distinct_active_items(&self) -> Vec<&str> {
        let mut seen = HashSet::new();
        self.active_items
            .iter()
            .map(String::as_str)
            .filter(|item| seen.insert(*item))
            .collect()
    }
}

/// Next unused property identifier.
///
/// Numeric-looking ids push the candidate past their value; any remaining
/// string collision is skipped. Non-numeric ids are left alone.
///
/// # Example
///
/// ```rust
/// use linen_core::snapshot::next_property_id;
///
/// assert_eq!(next_property_id(Vec::<&str>::new()), "1");
/// assert_eq!(next_property_id(["1", "2", "7"]), "8");
/// assert_eq!(next_property_id(["villa", "1"]), "2");
/// ```
pub fn next_property_id<I, S>(existing_ids: I) -> String
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let ids: HashSet<String> = existing_ids
        .into_iter()
        .map(|id| id.as_ref().to_string())
        .collect();

    let mut next: u64 = 1;
    for id in &ids {
        if let Some(num) = parse_integer_id(id) {
            if num >= next {
                next = num.saturating_add(1);
            }
        }
    }

    while ids.contains(&next.to_string()) {
        next = next.saturating_add(1);
    }

    next.to_string()
}

/// Ids like "3", " 3", "3.0" and "03" count as numeric; negative ones never
/// beat the starting candidate so they are ignored. Values with no room for a
/// successor in `u64` are treated as plain strings.
fn parse_integer_id(id: &str) -> Option<u64> {
    let trimmed = id.trim();
    if trimmed.is_empty() {
        return None;
    }
    let value: f64 = trimmed.parse().ok()?;
    if value.is_finite() && value.fract() == 0.0 && value >= 0.0 && value < u64::MAX as f64 {
        Some(value as u64)
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_snapshot_from_interface_json() {
        let json = r#"{
            "properties": [
                { "id": "1", "name": "A", "stays": 2, "items": { "Towels": 3 } },
                { "id": "2", "name": "B", "stays": "oops", "items": { "Towels": -1 }, "notes": "sea view" }
            ],
            "activeItems": ["Towels"],
            "parLevel": 1.5
        }"#;
        let snapshot: PortfolioSnapshot = serde_json::from_str(json).unwrap();

        assert_eq!(snapshot.properties.len(), 2);
        assert_eq!(snapshot.margin.value(), DEFAULT_MARGIN);
        assert!(snapshot.unit_prices.is_empty());
        assert!(snapshot.properties[1].stays.value().is_nan());
        assert_eq!(snapshot.properties[1].notes.as_deref(), Some("sea view"));
    }

    #[test]
    fn test_missing_keys_read_as_zero() {
        let snapshot = PortfolioSnapshot::default();
        assert_eq!(snapshot.price("Sheets").value(), 0.0);
        assert_eq!(snapshot.stock("Sheets").value(), 0.0);
        assert_eq!(Property::new("1", "").quantity("Sheets").value(), 0.0);
    }

    #[test]
    fn test_distinct_active_items() {
        let snapshot = PortfolioSnapshot::new(
            vec![],
            vec!["Towels".into(), "Sheets".into(), "Towels".into()],
        );
        assert_eq!(snapshot.distinct_active_items(), vec!["Towels", "Sheets"]);
    }

    #[test]
    fn test_display_name() {
        assert_eq!(Property::new("1", "").display_name(), "Unnamed");
        assert_eq!(Property::new("1", "Loft").display_name(), "Loft");
    }

    #[test]
    fn test_next_property_id_increments_past_max() {
        assert_eq!(next_property_id(["3", "1"]), "4");
        assert_eq!(next_property_id(["10"]), "11");
    }

    #[test]
    fn test_next_property_id_ignores_non_numeric() {
        assert_eq!(next_property_id(["abc", "def"]), "1");
        assert_eq!(next_property_id(["-4", "2.5"]), "1");
    }

    #[test]
    fn test_next_property_id_alternate_spellings() {
        assert_eq!(next_property_id(["02", "3"]), "4");
        assert_eq!(next_property_id(["1.0"]), "2");
        assert_eq!(next_property_id([" 5 ", "x"]), "6");
    }

    #[test]
    fn test_next_property_id_with_ids_beyond_u64() {
        assert_eq!(next_property_id(["18446744073709551615"]), "1");
        assert_eq!(next_property_id(["1e300", "4"]), "5");
        assert_eq!(next_property_id(["99999999999999999999999", "1"]), "2");
    }
}
