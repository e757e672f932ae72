//! CSV exports.
//!
//! Two sheets: the per-property results table, and an order sheet
//! comparing requirements against stock. Both end with a `TOTAL` row.

use ::csv::{Terminator, WriterBuilder};

use crate::calculations::CalculationResult;
use crate::errors::{LinenError, LinenResult};

fn money(value: f64) -> String {
    format!("{:.2}", value)
}

fn write_rows(rows: Vec<Vec<String>>) -> LinenResult<String> {
    let mut writer = WriterBuilder::new()
        .terminator(Terminator::Any(b'\n'))
        .flexible(true)
        .from_writer(Vec::new());

    for row in &rows {
        writer
            .write_record(row)
            .map_err(|e| LinenError::export_failed("csv", e.to_string()))?;
    }

    let bytes = writer
        .into_inner()
        .map_err(|e| LinenError::export_failed("csv", e.to_string()))?;
    String::from_utf8(bytes).map_err(|e| LinenError::export_failed("csv", e.to_string()))
}

/// Results table: one row per active item, one column per property.
///
/// Price and cost columns appear only when some active item has a price.
///
/// ```text
/// Item,Harbour View,Loft,Total,Unit Price,Est. Cost
/// Bath Towels,12,6,18,6.50,117.00
/// TOTAL,12,6,18,,117.00
/// ```
pub fn results_csv(result: &CalculationResult) -> LinenResult<String> {
    let priced = result.has_prices();
    let mut rows = Vec::with_capacity(result.items.len() + 2);

    let mut header = vec!["Item".to_string()];
    header.extend(result.property_results.iter().map(|p| p.display_name().to_string()));
    header.push("Total".to_string());
    if priced {
        header.push("Unit Price".to_string());
        header.push("Est. Cost".to_string());
    }
    rows.push(header);

    for item in &result.items {
        let grand = result.grand_total_for(item);
        let mut row = vec![item.clone()];
        row.extend(result.property_results.iter().map(|p| p.with_par(item).to_string()));
        row.push(grand.total.to_string());
        if priced {
            row.push(money(grand.unit_price));
            row.push(money(grand.cost));
        }
        rows.push(row);
    }

    let mut total_row = vec!["TOTAL".to_string()];
    total_row.extend(result.property_results.iter().map(|p| p.property_total.to_string()));
    total_row.push(result.grand_total.to_string());
    if priced {
        total_row.push(String::new());
        total_row.push(money(result.grand_total_cost));
    }
    rows.push(total_row);

    write_rows(rows)
}

/// Order sheet: required units, stock and shortfall per active item.
pub fn order_csv(result: &CalculationResult) -> LinenResult<String> {
    let priced = result.has_prices();
    let mut rows = Vec::with_capacity(result.items.len() + 2);

    let mut header: Vec<String> = ["Item", "Required", "In Stock", "To Order"]
        .iter()
        .map(|s| s.to_string())
        .collect();
    if priced {
        header.push("Order Cost".to_string());
    }
    rows.push(header);

    for item in &result.items {
        let grand = result.grand_total_for(item);
        let mut row = vec![
            item.clone(),
            grand.total.to_string(),
            grand.in_stock.to_string(),
            grand.to_order.to_string(),
        ];
        if priced {
            row.push(money(grand.order_cost));
        }
        rows.push(row);
    }

    let mut total_row = vec![
        "TOTAL".to_string(),
        result.grand_total.to_string(),
        result.grand_total_in_stock.to_string(),
        result.grand_total_to_order.to_string(),
    ];
    if priced {
        total_row.push(money(result.grand_total_order_cost));
    }
    rows.push(total_row);

    write_rows(rows)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::calculations::build_calculations;
    use crate::snapshot::{PortfolioSnapshot, Property};

    fn snapshot() -> PortfolioSnapshot {
        PortfolioSnapshot::new(
            vec![
                Property::new("1", "Harbour View, Flat 2")
                    .with_stays(2)
                    .with_item("Towels", 3)
                    .with_item("Sheets", 1),
                Property::new("2", "").with_stays(1).with_item("Towels", 1).with_item("Sheets", 2),
            ],
            vec!["Towels".to_string(), "Sheets".to_string()],
        )
        .with_par_level(1.5)
        .with_stock("Towels", 5)
        .with_stock("Sheets", 1)
    }

    #[test]
    fn test_results_csv_without_prices() {
        let csv = results_csv(&build_calculations(&snapshot())).unwrap();
        let lines: Vec<&str> = csv.lines().collect();

        assert_eq!(lines[0], "Item,\"Harbour View, Flat 2\",Unnamed,Total");
        assert_eq!(lines[1], "Towels,9,2,11");
        assert_eq!(lines[2], "Sheets,3,3,6");
        assert_eq!(lines[3], "TOTAL,12,5,17");
        assert_eq!(lines.len(), 4);
    }

    #[test]
    fn test_results_csv_with_prices() {
        let priced = snapshot().with_price("Towels", 2).with_price("Sheets", 5);
        let csv = results_csv(&build_calculations(&priced)).unwrap();
        let lines: Vec<&str> = csv.lines().collect();

        assert!(lines[0].ends_with("Total,Unit Price,Est. Cost"));
        assert_eq!(lines[1], "Towels,9,2,11,2.00,22.00");
        assert_eq!(lines[3], "TOTAL,12,5,17,,52.00");
    }

    #[test]
    fn test_order_csv() {
        let priced = snapshot().with_price("Towels", 2).with_price("Sheets", 5);
        let csv = order_csv(&build_calculations(&priced)).unwrap();
        let lines: Vec<&str> = csv.lines().collect();

        assert_eq!(lines[0], "Item,Required,In Stock,To Order,Order Cost");
        assert_eq!(lines[1], "Towels,11,5,6,12.00");
        assert_eq!(lines[2], "Sheets,6,1,5,25.00");
        assert_eq!(lines[3], "TOTAL,17,6,11,37.00");
    }

    #[test]
    fn test_empty_result_still_has_header_and_total() {
        let csv = results_csv(&build_calculations(&PortfolioSnapshot::default())).unwrap();
        assert_eq!(csv, "Item,Total\nTOTAL,0\n");
    }
}
