//! Command-line surface of the `linen` binary.

use std::path::PathBuf;

use clap::{Parser, Subcommand};

/// Parsed CLI arguments.
#[derive(Debug, Parser)]
#[command(
    name = "linen",
    version,
    disable_help_subcommand = true,
    about = "Linen supply calculator for holiday rental portfolios"
)]
pub struct Args {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Run the calculation on a snapshot JSON file.
    Calc {
        /// Portfolio snapshot (JSON).
        snapshot: PathBuf,
        /// Print the full result as JSON instead of a summary table.
        #[arg(long)]
        json: bool,
    },

    /// Export the results table (or order sheet) as CSV.
    Csv {
        snapshot: PathBuf,
        /// Export the order sheet instead of the per-property table.
        #[arg(long)]
        orders: bool,
        /// Write to this file instead of stdout.
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Print the e-mail report body and a mailto link.
    Email { snapshot: PathBuf },

    /// Render the PDF report.
    Pdf {
        snapshot: PathBuf,
        #[arg(short, long)]
        output: PathBuf,
    },

    /// Print the next free property id for a snapshot.
    NextId { snapshot: PathBuf },

    /// Work with a saved `.linen` workbook.
    Workbook {
        /// Workbook file.
        file: PathBuf,
        #[command(subcommand)]
        action: WorkbookAction,
    },
}

#[derive(Debug, Subcommand)]
pub enum WorkbookAction {
    /// Summarise the workbook.
    Show,

    /// Create a workbook with the default properties and items.
    Init {
        /// Overwrite an existing file.
        #[arg(long)]
        force: bool,
    },

    /// Calculate from the workbook's current inputs.
    Calc {
        #[arg(long)]
        json: bool,
        /// Also record the result in the workbook history.
        #[arg(long)]
        save_history: bool,
    },

    /// Order every shortfall and add it to stock.
    Order,

    /// List saved history records.
    History,

    /// Set the PAR level (clamped to 0.5 - 10).
    Par {
        #[arg(allow_hyphen_values = true)]
        value: String,
    },

    /// Set the owner margin percentage (clamped to 0 - 200).
    Margin {
        #[arg(allow_hyphen_values = true)]
        value: String,
    },

    /// Set the unit price of an item.
    Price {
        item: String,
        #[arg(allow_hyphen_values = true)]
        value: String,
    },

    /// Set the stock level of an item.
    Stock {
        item: String,
        #[arg(allow_hyphen_values = true)]
        count: String,
    },
}
