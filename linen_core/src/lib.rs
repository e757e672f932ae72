//! # linen_core - Linen Supply Calculation Engine
//!
//! `linen_core` works out how much linen a holiday rental portfolio needs:
//! per property and item, across the portfolio, against stock on hand, and
//! what it costs. All inputs and outputs are JSON-serializable.
//!
//! ## Design Philosophy
//!
//! - **Stateless core**: [`build_calculations`] is a pure function of a snapshot
//! - **Total over input**: malformed numbers are sanitized, never rejected
//! - **JSON-First**: All types implement Serialize/Deserialize
//! - **Rich Errors**: Structured error types outside the core
//!
//! ## Quick Start
//!
//! ```rust
//! use linen_core::{build_calculations, PortfolioSnapshot, Property};
//!
//! let snapshot = PortfolioSnapshot::new(
//!     vec![
//!         Property::new("1", "Harbour View").with_stays(4).with_item("Bath Towels", 2),
//!         Property::new("2", "Loft").with_stays(2).with_item("Bath Towels", 1),
//!     ],
//!     vec!["Bath Towels".to_string()],
//! )
//! .with_par_level(1.5)
//! .with_stock("Bath Towels", 10);
//!
//! let result = build_calculations(&snapshot);
//! assert_eq!(result.grand_total, 15); // ⌈8 × 1.5⌉ + ⌈2 × 1.5⌉
//! assert_eq!(result.grand_total_to_order, 5);
//! ```
//!
//! ## Modules
//!
//! - [`calculations`] - The engine and its result types
//! - [`sanitize`] - Numeric coercion and the four sanitizers
//! - [`snapshot`] - Engine input: properties, active items, prices, stock
//! - [`catalog`] - Built-in linen categories and PAR presets
//! - [`workbook`] - Editable state: scenarios, history, orders
//! - [`storage`] - Key-value persistence boundary
//! - [`file_io`] - File-backed store with atomic saves and locking
//! - [`export`] - CSV, e-mail and PDF renderers
//! - [`errors`] - Structured error types

pub mod calculations;
pub mod catalog;
pub mod errors;
pub mod export;
pub mod file_io;
pub mod sanitize;
pub mod snapshot;
pub mod storage;
pub mod workbook;

// Re-export commonly used types at crate root for convenience
pub use calculations::{build_calculations, CalculationResult, GrandTotal, PropertyResult};
pub use errors::{LinenError, LinenResult};
pub use file_io::{load_workbook, save_workbook, JsonFileStore, StoreLock};
pub use sanitize::{to_margin, to_non_negative_int, to_par_level, to_unit_price, NumericInput, ToNumber};
pub use snapshot::{next_property_id, PortfolioSnapshot, Property};
pub use storage::{KeyValueStore, MemoryStore};
pub use workbook::Workbook;
