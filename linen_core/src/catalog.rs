//! # Item Catalog
//!
//! Default linen items, their display categories, PAR presets and the
//! starting properties of a fresh workbook.
//!
//! Categories are for display only. The engine treats every item key the
//! same way, default or custom.

use once_cell::sync::Lazy;
use serde::Serialize;

use crate::snapshot::Property;

/// A display group of default items.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ItemCategory {
    /// Stable key (e.g. "bedroom")
    pub key: &'static str,
    /// Display label
    pub label: &'static str,
    /// Items in display order
    pub items: &'static [&'static str],
}

/// Label of the bucket holding user-defined items
pub const CUSTOM_CATEGORY_LABEL: &str = "Custom";

/// Built-in item categories.
pub static LINEN_CATEGORIES: &[ItemCategory] = &[
    ItemCategory {
        key: "bedroom",
        label: "Bedroom",
        items: &[
            "Single Duvet Covers",
            "Double Duvet Covers",
            "King Duvet Covers",
            "Single Fitted Sheets",
            "Double Fitted Sheets",
            "King Fitted Sheets",
            "Pillowcases",
        ],
    },
    ItemCategory {
        key: "bathroom",
        label: "Bathroom",
        items: &["Bath Sheets", "Bath Towels", "Hand Towels", "Face Cloths", "Bath Mats"],
    },
    ItemCategory {
        key: "kitchen",
        label: "Kitchen",
        items: &["Tea Towels", "Oven Gloves"],
    },
    ItemCategory {
        key: "extras",
        label: "Extras",
        items: &["Beach Towels", "Bathrobes"],
    },
];

/// Every default item, flattened in category order.
pub static DEFAULT_LINEN_ITEMS: Lazy<Vec<String>> = Lazy::new(|| {
    LINEN_CATEGORIES
        .iter()
        .flat_map(|c| c.items.iter().map(|i| i.to_string()))
        .collect()
});

/// A preset PAR level offered to users.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ParPreset {
    pub value: f64,
    pub label: &'static str,
    pub description: &'static str,
}

/// Common PAR levels, lowest first.
pub static PAR_LEVELS: &[ParPreset] = &[
    ParPreset { value: 1.0, label: "1x", description: "Exact totals for the period" },
    ParPreset { value: 2.0, label: "2x", description: "One set in use, one in laundry" },
    ParPreset { value: 3.0, label: "3x", description: "Industry standard rotation" },
    ParPreset { value: 4.0, label: "4x", description: "Extra reserve for busy seasons" },
    ParPreset { value: 5.0, label: "5x", description: "Maximum buffer, remote sites" },
];

/// True if `item` is one of the built-in items
pub fn is_default_item(item: &str) -> bool {
    DEFAULT_LINEN_ITEMS.iter().any(|i| i == item)
}

/// Display category label for an item; custom items land in "Custom".
pub fn category_for_item(item: &str) -> &'static str {
    LINEN_CATEGORIES
        .iter()
        .find(|c| c.items.iter().any(|i| *i == item))
        .map_or(CUSTOM_CATEGORY_LABEL, |c| c.label)
}

/// A new property with every default item at quantity zero.
pub fn empty_property(id: impl Into<String>) -> Property {
    DEFAULT_LINEN_ITEMS
        .iter()
        .fold(Property::new(id, ""), |p, item| p.with_item(item.clone(), 0))
        .with_stays(0)
}

/// Properties a fresh workbook starts with.
pub fn default_properties() -> Vec<Property> {
    let typical = |id: &str, name: &str, stays: u32, bedrooms: u32| {
        let guests = bedrooms * 2;
        Property {
            name: name.to_string(),
            ..empty_property(id)
        }
        .with_stays(stays)
        .with_item("Double Duvet Covers", bedrooms)
        .with_item("Double Fitted Sheets", bedrooms)
        .with_item("Pillowcases", guests * 2)
        .with_item("Bath Towels", guests)
        .with_item("Hand Towels", guests)
        .with_item("Bath Mats", 1)
        .with_item("Tea Towels", 2)
    };

    vec![
        typical("1", "Property 1", 10, 2),
        typical("2", "Property 2", 8, 3),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sanitize::to_non_negative_int;

    #[test]
    fn test_default_items_are_flattened_in_order() {
        assert_eq!(DEFAULT_LINEN_ITEMS.first().map(String::as_str), Some("Single Duvet Covers"));
        assert_eq!(DEFAULT_LINEN_ITEMS.last().map(String::as_str), Some("Bathrobes"));
        let count: usize = LINEN_CATEGORIES.iter().map(|c| c.items.len()).sum();
        assert_eq!(DEFAULT_LINEN_ITEMS.len(), count);
    }

    #[test]
    fn test_category_lookup() {
        assert_eq!(category_for_item("Tea Towels"), "Kitchen");
        assert_eq!(category_for_item("Hot Tub Covers"), CUSTOM_CATEGORY_LABEL);
        assert!(is_default_item("Bath Mats"));
        assert!(!is_default_item("bath mats"));
    }

    #[test]
    fn test_empty_property_has_all_items_at_zero() {
        let property = empty_property("9");
        assert_eq!(property.id, "9");
        assert!(property.name.is_empty());
        assert_eq!(property.items.len(), DEFAULT_LINEN_ITEMS.len());
        assert!(property.items.values().all(|q| to_non_negative_int(*q) == 0));
    }

    #[test]
    fn test_default_properties_have_unique_ids() {
        let properties = default_properties();
        assert_eq!(properties.len(), 2);
        assert_ne!(properties[0].id, properties[1].id);
        assert_eq!(to_non_negative_int(properties[1].quantity("Pillowcases")), 12);
    }

    #[test]
    fn test_par_presets_are_valid_par_levels() {
        use crate::sanitize::to_par_level;
        for preset in PAR_LEVELS {
            assert_eq!(to_par_level(preset.value), preset.value);
        }
    }
}
