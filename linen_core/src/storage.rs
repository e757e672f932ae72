//! # Key-Value Storage
//!
//! The persistence boundary. State is kept in named slots holding JSON
//! values; callers inject whichever store they want ([`MemoryStore`] for
//! tests and scripting, [`crate::file_io::JsonFileStore`] on disk).
//!
//! `load` never fails: a missing slot, or one whose JSON no longer matches
//! the expected shape, yields the caller's default.
//!
//! ## Example
//!
//! ```rust
//! use linen_core::storage::{KeyValueStore, MemoryStore};
//! use linen_core::workbook::Workbook;
//!
//! let mut store = MemoryStore::new();
//! let mut workbook = Workbook::new();
//! workbook.set_par_level(2.5);
//! workbook.save_to(&mut store).unwrap();
//!
//! let restored = Workbook::load_from(&store);
//! assert_eq!(restored.par_level, 2.5);
//! assert_eq!(store.load("linen-margin", 0.0), 40.0);
//! ```

use std::collections::BTreeMap;

use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use tracing::warn;

use crate::errors::LinenResult;
use crate::sanitize::{to_margin, to_non_negative_int, to_par_level, to_unit_price, NumericInput};
use crate::snapshot::ItemMap;
use crate::workbook::Workbook;

/// Slot names used by the workbook.
pub mod slots {
    pub const PROPERTIES: &str = "linen-properties";
    pub const PAR_LEVEL: &str = "linen-par-level";
    pub const SCENARIO_NAME: &str = "linen-scenario-name";
    pub const SAVED_SCENARIOS: &str = "linen-saved-scenarios";
    pub const ACTIVE_ITEMS: &str = "linen-active-items";
    pub const CUSTOM_ITEMS: &str = "linen-custom-items";
    pub const UNIT_PRICES: &str = "linen-unit-prices";
    pub const MARGIN: &str = "linen-margin";
    pub const INVENTORY: &str = "linen-inventory";
    pub const ORDER_HISTORY: &str = "linen-order-history";
    pub const HISTORY: &str = "linen-history";

    /// Every slot, in the order they are written
    pub const ALL: &[&str] = &[
        PROPERTIES,
        PAR_LEVEL,
        SCENARIO_NAME,
        SAVED_SCENARIOS,
        ACTIVE_ITEMS,
        CUSTOM_ITEMS,
        UNIT_PRICES,
        MARGIN,
        INVENTORY,
        ORDER_HISTORY,
        HISTORY,
    ];
}

/// A synchronous store of JSON values keyed by slot name.
pub trait KeyValueStore {
    /// Raw value in a slot, if any
    fn load_value(&self, key: &str) -> Option<Value>;

    /// Replace the value in a slot
    fn save_value(&mut self, key: &str, value: Value) -> LinenResult<()>;

    /// Typed read with a fallback for missing or mismatched slots.
    fn load<T: DeserializeOwned>(&self, key: &str, default: T) -> T
    where
        Self: Sized,
    {
        match self.load_value(key) {
            None => default,
            Some(value) => serde_json::from_value(value).unwrap_or_else(|e| {
                warn!(slot = key, error = %e, "stored value has unexpected shape, using default");
                default
            }),
        }
    }

    /// Typed write.
    fn save<T: Serialize + ?Sized>(&mut self, key: &str, value: &T) -> LinenResult<()>
    where
        Self: Sized,
    {
        let json = serde_json::to_value(value)?;
        self.save_value(key, json)
    }
}

/// In-memory store, ordered by slot name.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MemoryStore {
    values: BTreeMap<String, Value>,
}

impl MemoryStore {
    pub fn new() -> Self {
        MemoryStore::default()
    }

    /// Build a store from existing slot values
    pub fn from_values(values: BTreeMap<String, Value>) -> Self {
        MemoryStore { values }
    }

    /// All slots
    pub fn values(&self) -> &BTreeMap<String, Value> {
        &self.values
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

impl KeyValueStore for MemoryStore {
    fn load_value(&self, key: &str) -> Option<Value> {
        self.values.get(key).cloned()
    }

    fn save_value(&mut self, key: &str, value: Value) -> LinenResult<()> {
        self.values.insert(key.to_string(), value);
        Ok(())
    }
}

impl Workbook {
    /// Read every workbook slot, falling back to defaults, then re-sanitize.
    ///
    /// Numeric slots are read as raw inputs so one malformed entry is
    /// sanitized on its own instead of discarding the whole slot.
    pub fn load_from<S: KeyValueStore>(store: &S) -> Workbook {
        let defaults = Workbook::new();

        let par_level: NumericInput = store.load(slots::PAR_LEVEL, NumericInput(defaults.par_level));
        let margin: NumericInput = store.load(slots::MARGIN, NumericInput(defaults.margin));
        let unit_prices: ItemMap<NumericInput> = store.load(slots::UNIT_PRICES, ItemMap::new());
        let inventory: ItemMap<NumericInput> = store.load(slots::INVENTORY, ItemMap::new());

        let mut workbook = Workbook {
            properties: store.load(slots::PROPERTIES, defaults.properties),
            par_level: to_par_level(par_level),
            scenario_name: store.load(slots::SCENARIO_NAME, defaults.scenario_name),
            saved_scenarios: store.load(slots::SAVED_SCENARIOS, defaults.saved_scenarios),
            active_items: store.load(slots::ACTIVE_ITEMS, defaults.active_items),
            custom_items: store.load(slots::CUSTOM_ITEMS, defaults.custom_items),
            unit_prices: unit_prices
                .into_iter()
                .map(|(item, price)| (item, to_unit_price(price)))
                .collect(),
            margin: to_margin(margin),
            inventory: inventory
                .into_iter()
                .map(|(item, count)| (item, to_non_negative_int(count)))
                .collect(),
            order_history: store.load(slots::ORDER_HISTORY, defaults.order_history),
            history: store.load(slots::HISTORY, defaults.history),
        };
        workbook.sanitize();
        workbook
    }

    /// Write every workbook slot.
    pub fn save_to<S: KeyValueStore>(&self, store: &mut S) -> LinenResult<()> {
        store.save(slots::PROPERTIES, &self.properties)?;
        store.save(slots::PAR_LEVEL, &self.par_level)?;
        store.save(slots::SCENARIO_NAME, &self.scenario_name)?;
        store.save(slots::SAVED_SCENARIOS, &self.saved_scenarios)?;
        store.save(slots::ACTIVE_ITEMS, &self.active_items)?;
        store.save(slots::CUSTOM_ITEMS, &self.custom_items)?;
        store.save(slots::UNIT_PRICES, &self.unit_prices)?;
        store.save(slots::MARGIN, &self.margin)?;
        store.save(slots::INVENTORY, &self.inventory)?;
        store.save(slots::ORDER_HISTORY, &self.order_history)?;
        store.save(slots::HISTORY, &self.history)?;
        Ok(())
    }
}
