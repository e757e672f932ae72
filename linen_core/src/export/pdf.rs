//! # PDF Report
//!
//! Renders a [`CalculationResult`] as a landscape A4 report using Typst.
//!
//! - The template is embedded as a string constant
//! - Data is injected via string replacement before compilation
//! - Output is raw PDF bytes (`Vec<u8>`)
//!
//! ## Example
//!
//! ```rust,no_run
//! use chrono::NaiveDate;
//! use linen_core::calculations::build_calculations;
//! use linen_core::export::pdf::render_results_pdf;
//! use linen_core::snapshot::{PortfolioSnapshot, Property};
//!
//! let snapshot = PortfolioSnapshot::new(
//!     vec![Property::new("1", "Loft").with_stays(4).with_item("Bath Towels", 2)],
//!     vec!["Bath Towels".to_string()],
//! );
//! let result = build_calculations(&snapshot);
//! let date = NaiveDate::from_ymd_opt(2026, 10, 16).unwrap();
//! let pdf_bytes = render_results_pdf(&result, date).unwrap();
//! std::fs::write("linen-calculator-results.pdf", pdf_bytes).unwrap();
//! ```

use chrono::{Datelike, NaiveDate};
use typst::diag::{FileError, FileResult};
use typst::foundations::{Bytes, Datetime};
use typst::syntax::{FileId, Source};
use typst::text::{Font, FontBook};
use typst::utils::LazyHash;
use typst::{Library, LibraryExt, World};
use typst_pdf::PdfOptions;

use super::{format_gbp, format_par_level};
use crate::calculations::CalculationResult;
use crate::errors::{LinenError, LinenResult};

// ============================================================================
// Typst World
// ============================================================================

/// A Typst world with a single in-memory source and the bundled fonts.
struct PdfWorld {
    main: Source,
    book: LazyHash<FontBook>,
    fonts: Vec<Font>,
    library: LazyHash<Library>,
    /// Date reported to `datetime.today()`
    date: NaiveDate,
}

impl PdfWorld {
    fn new(source: String, date: NaiveDate) -> Self {
        let fonts = Self::load_fonts();
        let book = FontBook::from_fonts(&fonts);

        PdfWorld {
            main: Source::detached(source),
            book: LazyHash::new(book),
            fonts,
            library: LazyHash::new(Library::default()),
            date,
        }
    }

    fn load_fonts() -> Vec<Font> {
        typst_assets::fonts()
            .flat_map(|font_bytes| Font::iter(Bytes::new(font_bytes.to_vec())))
            .collect()
    }
}

impl World for PdfWorld {
    fn library(&self) -> &LazyHash<Library> {
        &self.library
    }

    fn book(&self) -> &LazyHash<FontBook> {
        &self.book
    }

    fn main(&self) -> FileId {
        self.main.id()
    }

    fn source(&self, id: FileId) -> FileResult<Source> {
        if id == self.main.id() {
            Ok(self.main.clone())
        } else {
            Err(FileError::NotFound(id.vpath().as_rootless_path().into()))
        }
    }

    fn file(&self, id: FileId) -> FileResult<Bytes> {
        Err(FileError::NotFound(id.vpath().as_rootless_path().into()))
    }

    fn font(&self, index: usize) -> Option<Font> {
        self.fonts.get(index).cloned()
    }

    fn today(&self, _offset: Option<i64>) -> Option<Datetime> {
        Datetime::from_ymd(
            self.date.year(),
            u8::try_from(self.date.month()).ok()?,
            u8::try_from(self.date.day()).ok()?,
        )
    }
}

// ============================================================================
// Template
// ============================================================================

const RESULTS_TEMPLATE: &str = r##"
#set page(
  paper: "a4",
  flipped: true,
  margin: (x: 1.5cm, y: 1.5cm),
  footer: context [
    #line(length: 100%, stroke: 0.5pt + gray)
    #v(4pt)
    #grid(
      columns: (1fr, 1fr),
      align(left)[#text(size: 8pt, fill: gray)[Linen Calculator]],
      align(right)[#text(size: 8pt, fill: gray)[Page #counter(page).display()]],
    )
  ]
)

#set text(font: "Libertinus Serif", size: 9pt)

#text(size: 18pt, weight: "bold")[Linen Calculator Results]
#v(2pt)
#text(size: 10pt, fill: rgb("#555555"))[{{SUBTITLE}}]

#v(10pt)

#table(
  columns: ({{COLUMNS}}),
  inset: 5pt,
  stroke: 0.5pt + rgb("#bbbbbb"),
  align: (x, y) => if x == 0 { left } else { right },
  fill: (x, y) => if y == 0 { rgb("#e8eef7") } else if calc.odd(y) { white } else { rgb("#f7f7f7") },
  table.header(
{{HEADER}}
  ),
{{ROWS}}
{{TOTAL_ROW}}
)
{{ORDER_SECTION}}
"##;

const ORDER_SECTION_TEMPLATE: &str = r##"
#v(14pt)
#text(size: 12pt, weight: "bold")[Order Summary]
#v(4pt)

#table(
  columns: ({{COLUMNS}}),
  inset: 5pt,
  stroke: 0.5pt + rgb("#bbbbbb"),
  align: (x, y) => if x == 0 { left } else { right },
  table.header(
{{HEADER}}
  ),
{{ROWS}}
{{TOTAL_ROW}}
)
"##;

// ============================================================================
// Rendering
// ============================================================================

/// Render the results report.
///
/// The breakdown table has one column per property (headed by its name and
/// stays), a total column, and price and cost columns when any item is
/// priced. An order summary follows when stock has been recorded.
pub fn render_results_pdf(result: &CalculationResult, date: NaiveDate) -> LinenResult<Vec<u8>> {
    let source = RESULTS_TEMPLATE
        .replace("{{SUBTITLE}}", &escape_typst(&subtitle(result, date)))
        .replace("{{COLUMNS}}", &breakdown_columns(result))
        .replace("{{HEADER}}", &breakdown_header(result))
        .replace("{{ROWS}}", &breakdown_rows(result))
        .replace("{{TOTAL_ROW}}", &breakdown_total_row(result))
        .replace("{{ORDER_SECTION}}", &order_section(result));

    let world = PdfWorld::new(source, date);

    let warned = typst::compile(&world);

    let document = warned.output.map_err(|errors| {
        let error_msgs: Vec<String> = errors.iter().map(|e| e.message.to_string()).collect();
        LinenError::export_failed("pdf", format!("Typst compilation failed: {}", error_msgs.join("; ")))
    })?;

    let pdf_bytes = typst_pdf::pdf(&document, &PdfOptions::default()).map_err(|errors| {
        let error_msgs: Vec<String> = errors.iter().map(|e| e.message.to_string()).collect();
        LinenError::export_failed("pdf", format!("PDF rendering failed: {}", error_msgs.join("; ")))
    })?;

    Ok(pdf_bytes)
}

fn subtitle(result: &CalculationResult, date: NaiveDate) -> String {
    let mut parts = vec![
        format!("Generated: {}", date.format("%d/%m/%Y")),
        format!("PAR Level: {}", format_par_level(result.safe_par_level)),
        format!("Total Items: {}", result.grand_total),
    ];
    if result.has_prices() {
        parts.push(format!("Est. Cost: {}", format_gbp(result.grand_total_cost)));
    }
    parts.join(" | ")
}

fn cell(text: &str) -> String {
    format!("[{}]", escape_typst(text))
}

fn bold_cell(text: &str) -> String {
    format!("[*{}*]", escape_typst(text))
}

fn row(cells: Vec<String>) -> String {
    format!("  {},", cells.join(", "))
}

fn breakdown_columns(result: &CalculationResult) -> String {
    let mut columns = vec!["2fr".to_string()];
    columns.extend(result.property_results.iter().map(|_| "1fr".to_string()));
    columns.push("1fr".to_string());
    if result.has_prices() {
        columns.push("1fr".to_string());
        columns.push("1fr".to_string());
    }
    format!("{},", columns.join(", "))
}

fn breakdown_header(result: &CalculationResult) -> String {
    let mut cells = vec![bold_cell("Item")];
    cells.extend(result.property_results.iter().map(|p| {
        format!(
            "[*{}* \\ #text(size: 7pt)[({} stays)]]",
            escape_typst(p.display_name()),
            p.stays
        )
    }));
    cells.push(bold_cell("Total"));
    if result.has_prices() {
        cells.push(bold_cell("Unit Price"));
        cells.push(bold_cell("Est. Cost"));
    }
    row(cells)
}

fn breakdown_rows(result: &CalculationResult) -> String {
    let priced = result.has_prices();
    result
        .items
        .iter()
        .map(|item| {
            let grand = result.grand_total_for(item);
            let mut cells = vec![cell(item)];
            cells.extend(
                result
                    .property_results
                    .iter()
                    .map(|p| cell(&p.with_par(item).to_string())),
            );
            cells.push(bold_cell(&grand.total.to_string()));
            if priced {
                cells.push(cell(&format_gbp(grand.unit_price)));
                cells.push(cell(&format_gbp(grand.cost)));
            }
            row(cells)
        })
        .collect::<Vec<_>>()
        .join("\n")
}

fn breakdown_total_row(result: &CalculationResult) -> String {
    let mut cells = vec![bold_cell("TOTAL")];
    cells.extend(
        result
            .property_results
            .iter()
            .map(|p| bold_cell(&p.property_total.to_string())),
    );
    cells.push(bold_cell(&result.grand_total.to_string()));
    if result.has_prices() {
        cells.push("[]".to_string());
        cells.push(bold_cell(&format_gbp(result.grand_total_cost)));
    }
    row(cells)
}

fn order_section(result: &CalculationResult) -> String {
    if result.grand_total_in_stock == 0 {
        return String::new();
    }
    let priced = result.has_prices();

    let mut columns = vec!["2fr", "1fr", "1fr", "1fr"];
    let mut header = vec![
        bold_cell("Item"),
        bold_cell("Required"),
        bold_cell("In Stock"),
        bold_cell("To Order"),
    ];
    if priced {
        columns.push("1fr");
        header.push(bold_cell("Order Cost"));
    }

    let rows = result
        .items
        .iter()
        .map(|item| {
            let grand = result.grand_total_for(item);
            let mut cells = vec![
                cell(item),
                cell(&grand.total.to_string()),
                cell(&grand.in_stock.to_string()),
                bold_cell(&grand.to_order.to_string()),
            ];
            if priced {
                cells.push(cell(&format_gbp(grand.order_cost)));
            }
            row(cells)
        })
        .collect::<Vec<_>>()
        .join("\n");

    let mut total = vec![
        bold_cell("TOTAL"),
        bold_cell(&result.grand_total.to_string()),
        bold_cell(&result.grand_total_in_stock.to_string()),
        bold_cell(&result.grand_total_to_order.to_string()),
    ];
    if priced {
        total.push(bold_cell(&format_gbp(result.grand_total_order_cost)));
    }

    ORDER_SECTION_TEMPLATE
        .replace("{{COLUMNS}}", &format!("{},", columns.join(", ")))
        .replace("{{HEADER}}", &row(header))
        .replace("{{ROWS}}", &rows)
        .replace("{{TOTAL_ROW}}", &row(total))
}

/// Escape characters that Typst markup would otherwise interpret
fn escape_typst(s: &str) -> String {
    s.chars()
        .map(|c| match c {
            '*' | '_' | '#' | '$' | '@' | '<' | '>' | '\\' | '`' | '[' | ']' | '=' | '-' | '+'
            | '/' | '~' => format!("\\{}", c),
            _ => c.to_string(),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::calculations::build_calculations;
    use crate::snapshot::{PortfolioSnapshot, Property};

    fn date() -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 10, 16).unwrap()
    }

    #[test]
    fn test_pdf_generation() {
        let snapshot = PortfolioSnapshot::new(
            vec![
                Property::new("1", "Harbour #1 [Sea View] - *main*")
                    .with_stays(6)
                    .with_item("Bath Towels", 2)
                    .with_item("Pillowcases", 4),
                Property::new("2", "").with_stays(2).with_item("Bath Towels", 1),
            ],
            vec!["Bath Towels".to_string(), "Pillowcases".to_string()],
        )
        .with_par_level(1.5)
        .with_price("Bath Towels", 6.5)
        .with_stock("Bath Towels", 10);

        let pdf = render_results_pdf(&build_calculations(&snapshot), date());
        assert!(pdf.is_ok(), "PDF generation failed: {:?}", pdf.err());

        let pdf_bytes = pdf.unwrap();
        assert!(pdf_bytes.starts_with(b"%PDF"), "Output is not a valid PDF");
        assert!(pdf_bytes.len() > 1000, "PDF seems too small");
    }

    #[test]
    fn test_pdf_for_empty_portfolio() {
        let pdf = render_results_pdf(&build_calculations(&PortfolioSnapshot::default()), date()).unwrap();
        assert!(pdf.starts_with(b"%PDF"));
    }

    #[test]
    fn test_subtitle() {
        let snapshot = PortfolioSnapshot::new(
            vec![Property::new("1", "Loft").with_stays(2).with_item("Towels", 2)],
            vec!["Towels".to_string()],
        )
        .with_par_level(2)
        .with_price("Towels", 1.25);
        let result = build_calculations(&snapshot);

        assert_eq!(
            subtitle(&result, date()),
            "Generated: 16/10/2026 | PAR Level: 2x | Total Items: 8 | Est. Cost: £10.00"
        );
    }

    #[test]
    fn test_escape_typst() {
        assert_eq!(escape_typst("Flat #2 [top]"), "Flat \\#2 \\[top\\]");
        assert_eq!(escape_typst("16/10/2026"), "16\\/10\\/2026");
        assert_eq!(escape_typst("Plain name"), "Plain name");
    }

    #[test]
    fn test_order_section_only_with_stock() {
        let snapshot = PortfolioSnapshot::new(
            vec![Property::new("1", "Loft").with_stays(1).with_item("Towels", 3)],
            vec!["Towels".to_string()],
        );
        assert!(order_section(&build_calculations(&snapshot)).is_empty());

        let stocked = snapshot.with_stock("Towels", 1);
        let section = order_section(&build_calculations(&stocked));
        assert!(section.contains("Order Summary"));
        assert!(section.contains("[*2*]"));
    }
}
