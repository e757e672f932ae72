//! Per-property breakdown.

use super::{charge_to_owner, ItemResult, PropertyResult};
use crate::sanitize::{finite_money, to_non_negative_int};
use crate::snapshot::{ItemMap, Property};

/// Required units once the PAR multiplier is applied.
///
/// Always rounds up: a fractional unit still has to be bought.
pub(crate) fn apply_par(subtotal: u64, safe_par_level: f64) -> u64 {
    // f64 → u64 casts saturate, so a huge subtotal cannot wrap.
    (subtotal as f64 * safe_par_level).ceil() as u64
}

pub(crate) fn property_result(
    property: &Property,
    priced_items: &[(&str, f64)],
    safe_par_level: f64,
    safe_margin: f64,
) -> PropertyResult {
    let stays = to_non_negative_int(property.stays);

    let mut item_results = ItemMap::new();
    let mut property_total: u64 = 0;
    let mut property_cost: f64 = 0.0;

    for &(item, price) in priced_items {
        let per_stay = to_non_negative_int(property.quantity(item));
        let subtotal = per_stay.saturating_mul(stays);
        let with_par = apply_par(subtotal, safe_par_level);
        let item_cost = finite_money(with_par as f64 * price);

        item_results.insert(
            item.to_string(),
            ItemResult {
                per_stay,
                stays,
                subtotal,
                with_par,
                item_cost,
            },
        );
        property_total = property_total.saturating_add(with_par);
        property_cost = finite_money(property_cost + item_cost);
    }

    PropertyResult {
        id: property.id.clone(),
        name: property.name.clone(),
        stays,
        items: property.items.clone(),
        notes: property.notes.clone(),
        item_results,
        property_total,
        property_cost,
        property_charge_to_owner: charge_to_owner(property_cost, safe_margin),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_apply_par_rounds_up() {
        assert_eq!(apply_par(1, 1.5), 2);
        assert_eq!(apply_par(4, 1.0), 4);
        assert_eq!(apply_par(3, 0.5), 2);
        assert_eq!(apply_par(0, 10.0), 0);
    }

    #[test]
    fn test_apply_par_saturates() {
        assert_eq!(apply_par(u64::MAX, 10.0), u64::MAX);
    }

    #[test]
    fn test_fractional_quantities_are_floored() {
        let property = Property::new("1", "Cottage").with_stays(2.9).with_item("Sheets", 1.7);
        let result = property_result(&property, &[("Sheets", 3.0)], 1.0, 0.0);

        let sheets = result.item_results["Sheets"];
        assert_eq!(sheets.per_stay, 1);
        assert_eq!(sheets.stays, 2);
        assert_eq!(sheets.subtotal, 2);
        assert_eq!(result.property_cost, 6.0);
        assert_eq!(result.property_charge_to_owner, 6.0);
    }

    #[test]
    fn test_missing_item_key_is_zero() {
        let property = Property::new("1", "").with_stays(5);
        let result = property_result(&property, &[("Towels", 2.0)], 2.0, 40.0);

        assert_eq!(result.item_results["Towels"].with_par, 0);
        assert_eq!(result.property_total, 0);
        assert_eq!(result.property_cost, 0.0);
    }

    #[test]
    fn test_input_fields_are_carried() {
        let property = Property::new("abc", "Loft").with_notes("key safe 1234").with_stays("4");
        let result = property_result(&property, &[], 1.0, 40.0);

        assert_eq!(result.id, "abc");
        assert_eq!(result.name, "Loft");
        assert_eq!(result.notes.as_deref(), Some("key safe 1234"));
        assert_eq!(result.stays, 4);
        assert!(result.item_results.is_empty());
    }
}
