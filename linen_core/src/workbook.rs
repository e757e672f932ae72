//! # Workbook
//!
//! The planner's editable state: properties, item selection, prices, margin,
//! stock, saved scenarios and the calculation and order histories.
//!
//! Every setter stores an already-sanitized value, so persisted state is
//! well-formed before the engine ever sees it. The engine itself is only
//! reached through [`Workbook::calculate`], which rebuilds everything from a
//! fresh [`PortfolioSnapshot`].
//!
//! ## Structure
//!
//! ```text
//! Workbook
//! ├── properties: Vec<Property>
//! ├── par_level, margin: f64 (sanitized)
//! ├── active_items, custom_items: Vec<String>
//! ├── unit_prices: ItemMap<f64>, inventory: ItemMap<u64>
//! ├── saved_scenarios: Vec<Scenario>       (newest first)
//! ├── history: Vec<HistoryRecord>          (newest first)
//! └── order_history: Vec<OrderRecord>      (newest first)
//! ```
//!
//! ## Example
//!
//! ```rust
//! use linen_core::workbook::Workbook;
//!
//! let mut workbook = Workbook::new();
//! let id = workbook.add_property();
//! workbook.set_property_stays(&id, 6).unwrap();
//! workbook.set_property_item(&id, "Bath Towels", 4).unwrap();
//!
//! let result = workbook.calculate();
//! assert!(result.grand_total > 0);
//! ```

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};
use uuid::Uuid;

use crate::calculations::{build_calculations, CalculationResult};
use crate::catalog::{default_properties, empty_property, DEFAULT_LINEN_ITEMS};
use crate::errors::{LinenError, LinenResult};
use crate::sanitize::{
    to_margin, to_non_negative_int, to_par_level, to_unit_price, NumericInput, ToNumber,
    DEFAULT_MARGIN, DEFAULT_PAR_LEVEL,
};
use crate::snapshot::{next_property_id, ItemMap, PortfolioSnapshot, Property};

/// Current schema version for persisted workbooks
pub const SCHEMA_VERSION: &str = "0.1.0";

/// Scenario name a fresh workbook starts with
pub const DEFAULT_SCENARIO_NAME: &str = "Default Scenario";

/// A named copy of the planning inputs.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Scenario {
    pub id: String,
    pub name: String,
    pub date: DateTime<Utc>,
    pub properties: Vec<Property>,
    pub par_level: f64,
    pub active_items: Vec<String>,
    #[serde(default)]
    pub custom_items: Vec<String>,
}

/// Name and stays of a property, as recorded in history.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PropertySummary {
    pub name: String,
    pub stays: u64,
}

/// Inputs captured with a history record so it can be restored.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HistorySnapshot {
    pub properties: Vec<Property>,
    pub par_level: f64,
    pub active_items: Vec<String>,
    #[serde(default)]
    pub custom_items: Vec<String>,
}

/// A saved calculation: what was planned, and the totals it produced.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HistoryRecord {
    pub id: String,
    pub date: DateTime<Utc>,
    pub scenario_name: String,
    pub par_level: f64,
    pub properties: Vec<PropertySummary>,
    pub active_items: Vec<String>,
    pub grand_total: u64,
    /// Item → required units after PAR
    pub grand_totals: ItemMap<u64>,
    pub full_snapshot: HistorySnapshot,
}

/// A delivery that was ordered and added to stock.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderRecord {
    pub id: String,
    pub date: DateTime<Utc>,
    pub items: ItemMap<u64>,
    pub total_items: u64,
}

/// Editable planner state.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Workbook {
    pub properties: Vec<Property>,
    pub par_level: f64,
    pub scenario_name: String,
    pub saved_scenarios: Vec<Scenario>,
    pub active_items: Vec<String>,
    pub custom_items: Vec<String>,
    pub unit_prices: ItemMap<f64>,
    pub margin: f64,
    pub inventory: ItemMap<u64>,
    pub order_history: Vec<OrderRecord>,
    pub history: Vec<HistoryRecord>,
}

impl Default for Workbook {
    fn default() -> Self {
        Workbook::new()
    }
}

fn new_record_id() -> String {
    Uuid::new_v4().to_string()
}

/// Store a count as a clean integer input.
fn count_input(value: impl ToNumber) -> NumericInput {
    NumericInput(to_non_negative_int(value) as f64)
}

impl Workbook {
    /// A workbook with the default properties and every default item active.
    pub fn new() -> Self {
        Workbook {
            properties: default_properties(),
            par_level: DEFAULT_PAR_LEVEL,
            scenario_name: DEFAULT_SCENARIO_NAME.to_string(),
            saved_scenarios: Vec::new(),
            active_items: DEFAULT_LINEN_ITEMS.to_vec(),
            custom_items: Vec::new(),
            unit_prices: ItemMap::new(),
            margin: DEFAULT_MARGIN,
            inventory: ItemMap::new(),
            order_history: Vec::new(),
            history: Vec::new(),
        }
    }

    /// The engine's view of the current state.
    pub fn snapshot(&self) -> PortfolioSnapshot {
        PortfolioSnapshot {
            properties: self.properties.clone(),
            active_items: self.active_items.clone(),
            par_level: NumericInput(self.par_level),
            unit_prices: self
                .unit_prices
                .iter()
                .map(|(item, price)| (item.clone(), NumericInput(*price)))
                .collect(),
            margin: NumericInput(self.margin),
            inventory: self
                .inventory
                .iter()
                .map(|(item, count)| (item.clone(), NumericInput(*count as f64)))
                .collect(),
        }
    }

    /// Run the engine over the current state.
    pub fn calculate(&self) -> CalculationResult {
        build_calculations(&self.snapshot())
    }

    /// Re-sanitize every stored number. Used after loading untrusted data.
    pub fn sanitize(&mut self) {
        self.par_level = to_par_level(self.par_level);
        self.margin = to_margin(self.margin);
        for price in self.unit_prices.values_mut() {
            *price = to_unit_price(*price);
        }
        for property in &mut self.properties {
            property.stays = count_input(property.stays);
            for quantity in property.items.values_mut() {
                *quantity = count_input(*quantity);
            }
        }
    }

    // ------------------------------------------------------------------
    // Properties
    // ------------------------------------------------------------------

    fn property_mut(&mut self, id: &str) -> LinenResult<&mut Property> {
        self.properties
            .iter_mut()
            .find(|p| p.id == id)
            .ok_or_else(|| LinenError::not_found("Property", id))
    }

    /// Get a property by id.
    pub fn property(&self, id: &str) -> Option<&Property> {
        self.properties.iter().find(|p| p.id == id)
    }

    /// Append an empty property and return its id.
    pub fn add_property(&mut self) -> String {
        let id = next_property_id(self.properties.iter().map(|p| p.id.as_str()));
        self.properties.push(empty_property(id.clone()));
        debug!(property_id = %id, "added property");
        id
    }

    /// Append a copy of a property under a new id and return that id.
    pub fn duplicate_property(&mut self, id: &str) -> LinenResult<String> {
        let source = self
            .property(id)
            .ok_or_else(|| LinenError::not_found("Property", id))?;

        let new_id = next_property_id(self.properties.iter().map(|p| p.id.as_str()));
        let name = if source.name.is_empty() {
            "Copied Property".to_string()
        } else {
            format!("{} (Copy)", source.name)
        };
        let copy = Property {
            id: new_id.clone(),
            name,
            ..source.clone()
        };

        self.properties.push(copy);
        Ok(new_id)
    }

    /// Remove a property by id, returning it if it existed.
    pub fn remove_property(&mut self, id: &str) -> Option<Property> {
        let index = self.properties.iter().position(|p| p.id == id)?;
        Some(self.properties.remove(index))
    }

    pub fn set_property_name(&mut self, id: &str, name: impl Into<String>) -> LinenResult<()> {
        self.property_mut(id)?.name = name.into();
        Ok(())
    }

    pub fn set_property_notes(&mut self, id: &str, notes: impl Into<String>) -> LinenResult<()> {
        let notes = notes.into();
        self.property_mut(id)?.notes = (!notes.is_empty()).then_some(notes);
        Ok(())
    }

    /// Set a property's stays (sanitized to a non-negative integer).
    pub fn set_property_stays(&mut self, id: &str, stays: impl ToNumber) -> LinenResult<()> {
        self.property_mut(id)?.stays = count_input(stays);
        Ok(())
    }

    /// Set one item's per-stay quantity at one property (sanitized).
    pub fn set_property_item(&mut self, id: &str, item: &str, quantity: impl ToNumber) -> LinenResult<()> {
        self.property_mut(id)?
            .items
            .insert(item.to_string(), count_input(quantity));
        Ok(())
    }

    /// Set one item's per-stay quantity at every property (sanitized).
    pub fn set_item_for_all_properties(&mut self, item: &str, quantity: impl ToNumber) {
        let quantity = count_input(quantity);
        for property in &mut self.properties {
            property.items.insert(item.to_string(), quantity);
        }
    }

    // ------------------------------------------------------------------
    // Items
    // ------------------------------------------------------------------

    /// Default items followed by custom items.
    pub fn all_items(&self) -> Vec<String> {
        DEFAULT_LINEN_ITEMS
            .iter()
            .chain(self.custom_items.iter())
            .cloned()
            .collect()
    }

    /// Add a custom item, activate it and give every property a zero quantity.
    ///
    /// Returns `false` when the trimmed name is blank or already known.
    pub fn add_custom_item(&mut self, name: &str) -> bool {
        let name = name.trim();
        if name.is_empty() || self.all_items().iter().any(|i| i == name) {
            return false;
        }

        self.custom_items.push(name.to_string());
        self.active_items.push(name.to_string());
        for property in &mut self.properties {
            property.items.insert(name.to_string(), NumericInput(0.0));
        }
        info!(item = name, "added custom item");
        true
    }

    /// Remove a custom item from the item lists and from every property.
    pub fn remove_custom_item(&mut self, name: &str) {
        self.custom_items.retain(|i| i != name);
        self.active_items.retain(|i| i != name);
        for property in &mut self.properties {
            property.items.remove(name);
        }
    }

    /// Flip an item between active and inactive.
    pub fn toggle_item(&mut self, name: &str) {
        if self.active_items.iter().any(|i| i == name) {
            self.active_items.retain(|i| i != name);
        } else {
            self.active_items.push(name.to_string());
        }
    }

    /// Activate every known item, keeping the current order first.
    pub fn select_all_items(&mut self) {
        for item in self.all_items() {
            if !self.active_items.contains(&item) {
                self.active_items.push(item);
            }
        }
    }

    /// Deactivate every item.
    pub fn deselect_all_items(&mut self) {
        self.active_items.clear();
    }

    /// True if `item` was added by the user
    pub fn is_custom_item(&self, item: &str) -> bool {
        self.custom_items.iter().any(|i| i == item)
    }

    // ------------------------------------------------------------------
    // Pricing and stock
    // ------------------------------------------------------------------

    pub fn set_par_level(&mut self, value: impl ToNumber) {
        self.par_level = to_par_level(value);
    }

    pub fn set_margin(&mut self, value: impl ToNumber) {
        self.margin = to_margin(value);
    }

    pub fn set_unit_price(&mut self, item: &str, price: impl ToNumber) {
        self.unit_prices.insert(item.to_string(), to_unit_price(price));
    }

    pub fn set_inventory(&mut self, item: &str, count: impl ToNumber) {
        self.inventory.insert(item.to_string(), to_non_negative_int(count));
    }

    // ------------------------------------------------------------------
    // Orders
    // ------------------------------------------------------------------

    /// Record an order and add its quantities to stock.
    ///
    /// # Example
    ///
    /// ```rust
    /// use linen_core::workbook::Workbook;
    ///
    /// let mut workbook = Workbook::new();
    /// workbook.set_inventory("Bath Towels", 3);
    /// workbook.mark_as_ordered([("Bath Towels", 10u64)]);
    /// assert_eq!(workbook.inventory["Bath Towels"], 13);
    /// assert_eq!(workbook.order_history[0].total_items, 10);
    /// ```
    pub fn mark_as_ordered<I, K, Q>(&mut self, ordered: I) -> &OrderRecord
    where
        I: IntoIterator<Item = (K, Q)>,
        K: Into<String>,
        Q: ToNumber,
    {
        let mut items = ItemMap::new();
        for (item, qty) in ordered {
            let entry: &mut u64 = items.entry(item.into()).or_default();
            *entry = entry.saturating_add(to_non_negative_int(qty));
        }

        for (item, qty) in &items {
            let stock = self.inventory.entry(item.clone()).or_default();
            *stock = stock.saturating_add(*qty);
        }

        let total_items = items.values().fold(0u64, |sum, q| sum.saturating_add(*q));
        let record = OrderRecord {
            id: new_record_id(),
            date: Utc::now(),
            items,
            total_items,
        };
        info!(order_id = %record.id, total_items, "marked order as received into stock");

        self.order_history.insert(0, record);
        &self.order_history[0]
    }

    /// Order every current shortfall. Returns `None` when nothing is short.
    pub fn order_shortfalls(&mut self) -> Option<&OrderRecord> {
        let shortfalls = self.calculate().items_to_order();
        if shortfalls.is_empty() {
            return None;
        }
        Some(self.mark_as_ordered(shortfalls))
    }

    /// Delete an order record. Stock is left as it is.
    pub fn delete_order_record(&mut self, id: &str) -> Option<OrderRecord> {
        let index = self.order_history.iter().position(|r| r.id == id)?;
        Some(self.order_history.remove(index))
    }

    // ------------------------------------------------------------------
    // Scenarios
    // ------------------------------------------------------------------

    /// Save the current inputs under the current scenario name.
    ///
    /// Blank names are ignored. A scenario with the same name (trimmed,
    /// case-insensitive) is replaced; the new one goes first.
    pub fn save_scenario(&mut self) -> Option<&Scenario> {
        let name = self.scenario_name.trim().to_string();
        if name.is_empty() {
            return None;
        }

        let key = name.to_lowercase();
        self.saved_scenarios
            .retain(|s| s.name.trim().to_lowercase() != key);

        let scenario = Scenario {
            id: new_record_id(),
            name,
            date: Utc::now(),
            properties: self.properties.clone(),
            par_level: self.par_level,
            active_items: self.active_items.clone(),
            custom_items: self.custom_items.clone(),
        };
        info!(scenario = %scenario.name, "saved scenario");

        self.saved_scenarios.insert(0, scenario);
        self.saved_scenarios.first()
    }

    /// Replace the current inputs with a saved scenario.
    pub fn load_scenario(&mut self, id: &str) -> LinenResult<()> {
        let scenario = self
            .saved_scenarios
            .iter()
            .find(|s| s.id == id)
            .cloned()
            .ok_or_else(|| LinenError::not_found("Scenario", id))?;

        self.properties = scenario.properties;
        self.set_par_level(scenario.par_level);
        self.active_items = scenario.active_items;
        self.custom_items = scenario.custom_items;
        self.scenario_name = scenario.name;
        Ok(())
    }

    pub fn delete_scenario(&mut self, id: &str) -> Option<Scenario> {
        let index = self.saved_scenarios.iter().position(|s| s.id == id)?;
        Some(self.saved_scenarios.remove(index))
    }

    // ------------------------------------------------------------------
    // History
    // ------------------------------------------------------------------

    /// Record the current inputs together with the totals they produce.
    pub fn save_to_history(&mut self) -> &HistoryRecord {
        let result = self.calculate();

        let record = HistoryRecord {
            id: new_record_id(),
            date: Utc::now(),
            scenario_name: self.scenario_name.clone(),
            par_level: self.par_level,
            properties: result
                .property_results
                .iter()
                .map(|p| PropertySummary {
                    name: p.name.clone(),
                    stays: p.stays,
                })
                .collect(),
            active_items: self.active_items.clone(),
            grand_total: result.grand_total,
            grand_totals: result
                .grand_totals
                .iter()
                .map(|(item, g)| (item.clone(), g.total))
                .collect(),
            full_snapshot: HistorySnapshot {
                properties: self.properties.clone(),
                par_level: self.par_level,
                active_items: self.active_items.clone(),
                custom_items: self.custom_items.clone(),
            },
        };
        debug!(record_id = %record.id, grand_total = record.grand_total, "saved to history");

        self.history.insert(0, record);
        &self.history[0]
    }

    /// Restore the inputs captured by a history record.
    pub fn load_from_history(&mut self, id: &str) -> LinenResult<()> {
        let record = self
            .history
            .iter()
            .find(|r| r.id == id)
            .cloned()
            .ok_or_else(|| LinenError::not_found("History record", id))?;

        let snap = record.full_snapshot;
        self.properties = snap.properties;
        self.set_par_level(snap.par_level);
        self.active_items = snap.active_items;
        self.custom_items = snap.custom_items;
        self.scenario_name = record.scenario_name;
        Ok(())
    }

    pub fn delete_history_record(&mut self, id: &str) -> Option<HistoryRecord> {
        let index = self.history.iter().position(|r| r.id == id)?;
        Some(self.history.remove(index))
    }

    pub fn clear_history(&mut self) {
        self.history.clear();
    }

    /// Restore the default properties, PAR level, items and scenario name.
    ///
    /// Prices, margin, stock and all histories are kept.
    pub fn reset_to_defaults(&mut self) {
        self.properties = default_properties();
        self.par_level = DEFAULT_PAR_LEVEL;
        self.active_items = DEFAULT_LINEN_ITEMS.to_vec();
        self.custom_items.clear();
        self.scenario_name = DEFAULT_SCENARIO_NAME.to_string();
    }
}
