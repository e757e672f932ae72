//! Plain-text report for e-mail, and the `mailto:` link that opens it.

use chrono::NaiveDate;
use percent_encoding::{utf8_percent_encode, AsciiSet, NON_ALPHANUMERIC};

use super::{format_gbp, format_par_level};
use crate::calculations::CalculationResult;
use crate::catalog::is_default_item;

fn format_date(date: NaiveDate) -> String {
    date.format("%d/%m/%Y").to_string()
}

/// `Linen Calculator Report - 16/10/2026`
pub fn email_subject(date: NaiveDate) -> String {
    format!("Linen Calculator Report - {}", format_date(date))
}

/// Report body: header block, one line per item that needs stock, then totals.
///
/// Items outside the default catalog are tagged `[Custom]`. A cost is
/// appended to an item line only when it is positive.
pub fn email_body(result: &CalculationResult, date: NaiveDate) -> String {
    let mut lines = vec![
        "Linen Calculator Report".to_string(),
        format!("Date: {}", format_date(date)),
        format!("PAR Level: {}", format_par_level(result.safe_par_level)),
        format!(
            "Properties: {} | Total Stays: {}",
            result.property_results.len(),
            result.total_stays()
        ),
        String::new(),
        "--- Order Summary ---".to_string(),
        String::new(),
    ];

    for item in &result.items {
        let grand = result.grand_total_for(item);
        if grand.total == 0 {
            continue;
        }
        let tag = if is_default_item(item) { "" } else { " [Custom]" };
        let mut line = format!("{}{}: {}", item, tag, grand.total);
        if grand.cost > 0.0 {
            line.push_str(&format!(" ({})", format_gbp(grand.cost)));
        }
        lines.push(line);
    }

    lines.push(String::new());
    lines.push(format!("GRAND TOTAL: {} items", result.grand_total));
    if result.has_prices() {
        lines.push(format!("ESTIMATED COST: {}", format_gbp(result.grand_total_cost)));
    }
    lines.push(String::new());
    lines.push("(PDF report attached separately)".to_string());

    lines.join("\n")
}

/// The `encodeURIComponent` set: everything but `A-Z a-z 0-9 - _ . ! ~ * ' ( )`.
const URI_COMPONENT: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'_')
    .remove(b'.')
    .remove(b'!')
    .remove(b'~')
    .remove(b'*')
    .remove(b'\'')
    .remove(b'(')
    .remove(b')');

fn encode_component(input: &str) -> String {
    utf8_percent_encode(input, URI_COMPONENT).to_string()
}

/// `mailto:?subject=...&body=...` with both parts percent-encoded.
pub fn mailto_link(subject: &str, body: &str) -> String {
    format!(
        "mailto:?subject={}&body={}",
        encode_component(subject),
        encode_component(body)
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::calculations::build_calculations;
    use crate::snapshot::{PortfolioSnapshot, Property};

    fn date() -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 3, 7).unwrap()
    }

    #[test]
    fn test_subject() {
        assert_eq!(email_subject(date()), "Linen Calculator Report - 07/03/2026");
    }

    #[test]
    fn test_body_lists_items_with_totals() {
        let snapshot = PortfolioSnapshot::new(
            vec![
                Property::new("1", "Loft")
                    .with_stays(3)
                    .with_item("Bath Towels", 2)
                    .with_item("Hammock Covers", 1),
                Property::new("2", "Barn").with_stays(1).with_item("Bath Towels", 1),
            ],
            vec![
                "Bath Towels".to_string(),
                "Hammock Covers".to_string(),
                "Tea Towels".to_string(),
            ],
        )
        .with_par_level(2)
        .with_price("Bath Towels", 4.5);

        let body = email_body(&build_calculations(&snapshot), date());
        let lines: Vec<&str> = body.lines().collect();

        assert_eq!(lines[0], "Linen Calculator Report");
        assert_eq!(lines[1], "Date: 07/03/2026");
        assert_eq!(lines[2], "PAR Level: 2x");
        assert_eq!(lines[3], "Properties: 2 | Total Stays: 4");
        assert_eq!(lines[5], "--- Order Summary ---");
        assert_eq!(lines[7], "Bath Towels: 14 (£63.00)");
        assert_eq!(lines[8], "Hammock Covers [Custom]: 6");
        assert!(!body.contains("Tea Towels"));
        assert!(body.contains("GRAND TOTAL: 20 items"));
        assert!(body.contains("ESTIMATED COST: £63.00"));
        assert!(body.ends_with("(PDF report attached separately)"));
    }

    #[test]
    fn test_body_without_prices_omits_cost() {
        let snapshot = PortfolioSnapshot::new(
            vec![Property::new("1", "Loft").with_stays(1).with_item("Pillowcases", 4)],
            vec!["Pillowcases".to_string()],
        );
        let body = email_body(&build_calculations(&snapshot), date());

        assert!(body.contains("Pillowcases: 4\n"));
        assert!(!body.contains("ESTIMATED COST"));
        assert!(!body.contains('£'));
    }

    #[test]
    fn test_mailto_encoding() {
        let link = mailto_link("Report - 07/03/2026", "Line one\nTowels: 3 (£6.00)");
        assert_eq!(
            link,
            "mailto:?subject=Report%20-%2007%2F03%2F2026&body=Line%20one%0ATowels%3A%203%20(%C2%A36.00)"
        );
    }

    #[test]
    fn test_encode_keeps_unreserved() {
        assert_eq!(encode_component("a-Z_0.!~*'()"), "a-Z_0.!~*'()");
        assert_eq!(encode_component("&=?#+"), "%26%3D%3F%23%2B");
    }

    #[test]
    fn test_encode_multibyte_characters() {
        assert_eq!(encode_component("Café"), "Caf%C3%A9");
        assert_eq!(encode_component("\u{1F9FA}"), "%F0%9F%A7%BA");
        assert_eq!(encode_component("a\r\nb"), "a%0D%0Ab");
    }
}
