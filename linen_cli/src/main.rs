//! # Linen CLI
//!
//! Command-line driver for `linen_core`: run the calculation on a snapshot
//! file, export it, or edit a saved `.linen` workbook.
//!
//! Logging goes to stderr and is controlled by `RUST_LOG` (default `info`).

mod args;

use std::fs;
use std::path::Path;
use std::process::ExitCode;

use anyhow::{Context, Result};
use chrono::Local;
use clap::Parser;
use tracing::info;

use args::{Args, Command, WorkbookAction};
use linen_core::export::{csv, email, format_gbp, format_par_level, pdf};
use linen_core::file_io::{load_workbook, save_workbook};
use linen_core::{
    next_property_id, CalculationResult, LinenError, PortfolioSnapshot, StoreLock, Workbook,
};

fn main() -> ExitCode {
    init_tracing();
    let args = Args::parse();

    match run(args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("linen: error: {:#}", e);
            if let Some(linen_err) = e.downcast_ref::<LinenError>() {
                if let Ok(json) = serde_json::to_string(linen_err) {
                    eprintln!("{}", json);
                }
            }
            ExitCode::FAILURE
        }
    }
}

fn init_tracing() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()),
        )
        .with_writer(std::io::stderr)
        .init();
}

fn run(args: Args) -> Result<()> {
    match args.command {
        Command::Calc { snapshot, json } => {
            let result = linen_core::build_calculations(&read_snapshot(&snapshot)?);
            print_result(&result, json)
        }
        Command::Csv { snapshot, orders, output } => {
            let result = linen_core::build_calculations(&read_snapshot(&snapshot)?);
            let text = if orders {
                csv::order_csv(&result)?
            } else {
                csv::results_csv(&result)?
            };
            match output {
                Some(path) => write_output(&path, text.as_bytes()),
                None => {
                    print!("{}", text);
                    Ok(())
                }
            }
        }
        Command::Email { snapshot } => {
            let result = linen_core::build_calculations(&read_snapshot(&snapshot)?);
            let today = Local::now().date_naive();
            let subject = email::email_subject(today);
            let body = email::email_body(&result, today);
            println!("Subject: {}\n\n{}\n", subject, body);
            println!("{}", email::mailto_link(&subject, &body));
            Ok(())
        }
        Command::Pdf { snapshot, output } => {
            let result = linen_core::build_calculations(&read_snapshot(&snapshot)?);
            let bytes = pdf::render_results_pdf(&result, Local::now().date_naive())?;
            write_output(&output, &bytes)
        }
        Command::NextId { snapshot } => {
            let snapshot = read_snapshot(&snapshot)?;
            println!("{}", next_property_id(snapshot.properties.iter().map(|p| p.id.as_str())));
            Ok(())
        }
        Command::Workbook { file, action } => run_workbook(&file, action),
    }
}

fn run_workbook(path: &Path, action: WorkbookAction) -> Result<()> {
    match action {
        WorkbookAction::Show => {
            let workbook = load_workbook(path)?;
            print_workbook(&workbook);
            Ok(())
        }
        WorkbookAction::Calc { json, save_history: false } => {
            let workbook = load_workbook(path)?;
            print_result(&workbook.calculate(), json)
        }
        WorkbookAction::History => {
            let workbook = load_workbook(path)?;
            if workbook.history.is_empty() {
                println!("No saved calculations.");
            }
            for record in &workbook.history {
                println!(
                    "{}  {}  {}  PAR {}  {} items",
                    record.id,
                    record.date.format("%d/%m/%Y %H:%M"),
                    record.scenario_name,
                    format_par_level(record.par_level),
                    record.grand_total
                );
            }
            Ok(())
        }
        WorkbookAction::Init { force } => {
            if path.exists() && !force {
                anyhow::bail!("{} already exists (use --force to overwrite)", path.display());
            }
            let _lock = StoreLock::acquire(path, current_user())
                .with_context(|| format!("could not lock {}", path.display()))?;
            save_workbook(&Workbook::new(), path)?;
            println!("Created {}", path.display());
            Ok(())
        }
        action => edit_workbook(path, |workbook| apply_edit(workbook, action)),
    }
}

/// Load, modify and save a workbook while holding its lock.
fn edit_workbook<F>(path: &Path, edit: F) -> Result<()>
where
    F: FnOnce(&mut Workbook) -> Result<()>,
{
    let _lock = StoreLock::acquire(path, current_user())
        .with_context(|| format!("could not lock {}", path.display()))?;

    let mut workbook = load_workbook(path)?;
    edit(&mut workbook)?;
    save_workbook(&workbook, path)?;
    info!(path = %path.display(), "workbook saved");
    Ok(())
}

fn apply_edit(workbook: &mut Workbook, action: WorkbookAction) -> Result<()> {
    match action {
        WorkbookAction::Calc { json, .. } => {
            let record = workbook.save_to_history();
            println!("Saved to history as {}", record.id);
            print_result(&workbook.calculate(), json)?;
        }
        WorkbookAction::Order => match workbook.order_shortfalls() {
            Some(record) => {
                println!("Ordered {} items:", record.total_items);
                for (item, qty) in &record.items {
                    println!("  {:<24} {:>6}", item, qty);
                }
            }
            None => println!("Nothing to order."),
        },
        WorkbookAction::Par { value } => {
            workbook.set_par_level(value.as_str());
            println!("PAR level: {}", format_par_level(workbook.par_level));
        }
        WorkbookAction::Margin { value } => {
            workbook.set_margin(value.as_str());
            println!("Margin: {}%", workbook.margin);
        }
        WorkbookAction::Price { item, value } => {
            workbook.set_unit_price(&item, value.as_str());
            println!("{}: {}", item, format_gbp(workbook.unit_prices[&item]));
        }
        WorkbookAction::Stock { item, count } => {
            workbook.set_inventory(&item, count.as_str());
            println!("{}: {} in stock", item, workbook.inventory[&item]);
        }
        WorkbookAction::Show | WorkbookAction::History | WorkbookAction::Init { .. } => {}
    }
    Ok(())
}

fn read_snapshot(path: &Path) -> Result<PortfolioSnapshot> {
    let text = fs::read_to_string(path).map_err(|e| {
        LinenError::file_error("read", path.display().to_string(), e.to_string())
    })?;
    let snapshot = serde_json::from_str(&text)
        .map_err(LinenError::from)
        .with_context(|| format!("invalid snapshot {}", path.display()))?;
    Ok(snapshot)
}

fn write_output(path: &Path, bytes: &[u8]) -> Result<()> {
    fs::write(path, bytes).map_err(|e| {
        LinenError::file_error("write", path.display().to_string(), e.to_string())
    })?;
    info!(path = %path.display(), bytes = bytes.len(), "wrote output");
    Ok(())
}

fn current_user() -> String {
    std::env::var("USER")
        .or_else(|_| std::env::var("USERNAME"))
        .unwrap_or_else(|_| "linen".to_string())
}

fn print_result(result: &CalculationResult, json: bool) -> Result<()> {
    if json {
        println!("{}", serde_json::to_string_pretty(result)?);
        return Ok(());
    }

    let priced = result.has_prices();
    println!(
        "PAR {} | margin {}% | {} properties | {} stays",
        format_par_level(result.safe_par_level),
        result.safe_margin,
        result.property_results.len(),
        result.total_stays()
    );
    println!();
    println!("{:<24} {:>8} {:>8} {:>8} {:>12}", "Item", "Total", "Stock", "Order", "Cost");
    for item in &result.items {
        let g = result.grand_total_for(item);
        let cost = if priced { format_gbp(g.cost) } else { String::new() };
        println!("{:<24} {:>8} {:>8} {:>8} {:>12}", item, g.total, g.in_stock, g.to_order, cost);
    }
    println!();
    println!("Grand total: {} (before PAR {})", result.grand_total, result.grand_total_before_par);
    println!("To order:    {}", result.grand_total_to_order);
    if priced {
        println!("Est. cost:   {}", format_gbp(result.grand_total_cost));
        println!("Order cost:  {}", format_gbp(result.grand_total_order_cost));
        println!("Charge to owners: {}", format_gbp(result.grand_total_charge_to_owner));
    }
    Ok(())
}

fn print_workbook(workbook: &Workbook) {
    println!("Scenario:   {}", workbook.scenario_name);
    println!("PAR level:  {}", format_par_level(workbook.par_level));
    println!("Margin:     {}%", workbook.margin);
    println!("Properties: {}", workbook.properties.len());
    for property in &workbook.properties {
        println!("  [{}] {} ({} stays)", property.id, property.display_name(), property.stays);
    }
    println!("Active items: {}", workbook.active_items.join(", "));
    if !workbook.custom_items.is_empty() {
        println!("Custom items: {}", workbook.custom_items.join(", "));
    }
    println!("Saved scenarios: {}", workbook.saved_scenarios.len());
    println!("History records: {}", workbook.history.len());
    println!("Orders: {}", workbook.order_history.len());
}
