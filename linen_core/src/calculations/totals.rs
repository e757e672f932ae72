//! Per-item grand totals and portfolio aggregates.
//!
//! Shortfall is computed per item and then summed, so surplus stock of one
//! item never hides a shortfall of another.

use super::{GrandTotal, PropertyResult};
use crate::sanitize::{finite_money, to_non_negative_int, NumericInput};
use crate::snapshot::ItemMap;

pub(crate) fn grand_totals(
    property_results: &[PropertyResult],
    priced_items: &[(&str, f64)],
    inventory: &ItemMap<NumericInput>,
) -> ItemMap<GrandTotal> {
    priced_items
        .iter()
        .map(|&(item, price)| {
            let (total, total_before_par) = property_results
                .iter()
                .filter_map(|pr| pr.item_results.get(item))
                .fold((0u64, 0u64), |(total, before), r| {
                    (total.saturating_add(r.with_par), before.saturating_add(r.subtotal))
                });

            let in_stock = to_non_negative_int(inventory.get(item).copied().unwrap_or_default());
            let to_order = total.saturating_sub(in_stock);

            let grand = GrandTotal {
                total,
                total_before_par,
                cost: finite_money(total as f64 * price),
                unit_price: price,
                in_stock,
                to_order,
                order_cost: finite_money(to_order as f64 * price),
            };
            (item.to_string(), grand)
        })
        .collect()
}

/// The portfolio scalars, minus the owner charge which is derived from cost.
#[derive(Debug, Default, Clone, Copy, PartialEq)]
pub(crate) struct PortfolioTotals {
    pub grand_total: u64,
    pub grand_total_before_par: u64,
    pub grand_total_cost: f64,
    pub grand_total_in_stock: u64,
    pub grand_total_to_order: u64,
    pub grand_total_order_cost: f64,
}

impl PortfolioTotals {
    /// Sum every per-item figure, visiting items in evaluation order.
    pub fn sum(priced_items: &[(&str, f64)], grand_totals: &ItemMap<GrandTotal>) -> Self {
        priced_items
            .iter()
            .filter_map(|(item, _)| grand_totals.get(*item))
            .fold(PortfolioTotals::default(), |acc, g| PortfolioTotals {
                grand_total: acc.grand_total.saturating_add(g.total),
                grand_total_before_par: acc.grand_total_before_par.saturating_add(g.total_before_par),
                grand_total_cost: finite_money(acc.grand_total_cost + g.cost),
                grand_total_in_stock: acc.grand_total_in_stock.saturating_add(g.in_stock),
                grand_total_to_order: acc.grand_total_to_order.saturating_add(g.to_order),
                grand_total_order_cost: finite_money(acc.grand_total_order_cost + g.order_cost),
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::calculations::property::property_result;
    use crate::snapshot::Property;

    fn results(priced: &[(&str, f64)]) -> Vec<PropertyResult> {
        vec![
            property_result(
                &Property::new("1", "").with_stays(3).with_item("Towels", 2).with_item("Sheets", 1),
                priced,
                1.0,
                0.0,
            ),
            property_result(
                &Property::new("2", "").with_stays(1).with_item("Towels", 1),
                priced,
                1.0,
                0.0,
            ),
        ]
    }

    #[test]
    fn test_to_order_floors_at_zero() {
        let priced = [("Towels", 1.0), ("Sheets", 2.0)];
        let mut inventory = ItemMap::new();
        inventory.insert("Towels".to_string(), NumericInput(50.0));

        let totals = grand_totals(&results(&priced), &priced, &inventory);
        assert_eq!(totals["Towels"].total, 7);
        assert_eq!(totals["Towels"].to_order, 0);
        assert_eq!(totals["Towels"].order_cost, 0.0);
        assert_eq!(totals["Sheets"].in_stock, 0);
        assert_eq!(totals["Sheets"].to_order, 3);
        assert_eq!(totals["Sheets"].order_cost, 6.0);
    }

    #[test]
    fn test_portfolio_sums_per_item_shortfalls() {
        let priced = [("Towels", 1.0), ("Sheets", 2.0)];
        let mut inventory = ItemMap::new();
        inventory.insert("Towels".to_string(), NumericInput(50.0));

        let totals = grand_totals(&results(&priced), &priced, &inventory);
        let portfolio = PortfolioTotals::sum(&priced, &totals);

        assert_eq!(portfolio.grand_total, 10);
        assert_eq!(portfolio.grand_total_in_stock, 50);
        // Netting across items would give zero here.
        assert_eq!(portfolio.grand_total_to_order, 3);
        assert_eq!(portfolio.grand_total_cost, 13.0);
        assert_eq!(portfolio.grand_total_order_cost, 6.0);
    }

    #[test]
    fn test_empty_inputs_sum_to_zero() {
        let totals = grand_totals(&[], &[], &ItemMap::new());
        assert!(totals.is_empty());
        assert_eq!(PortfolioTotals::sum(&[], &totals), PortfolioTotals::default());
    }
}
