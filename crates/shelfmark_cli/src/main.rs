//! CLI smoke entry point.
//!
//! # Responsibility
//! - Open the configured catalog store and print row counts.
//! - Verify `shelfmark_core` wiring without a presentation layer.

use log::info;
use shelfmark_core::{core_version, init_logging, CatalogConfig, CatalogService};
use std::process::ExitCode;

fn main() -> ExitCode {
    match run() {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("shelfmark error: {err}");
            ExitCode::FAILURE
        }
    }
}

fn run() -> Result<(), Box<dyn std::error::Error>> {
    let config = CatalogConfig::from_env()?;
    if let Some(log) = &config.log {
        init_logging(log)?;
    }

    let mut service = CatalogService::open(&config)?;
    let categories = service.get_all_categories()?.recv()?.len();
    let books = service.get_all_books()?.recv()?.len();
    let authors = service.get_all_authors()?.recv()?.len();
    let audit_entries = service.get_all_audit_log()?.recv()?.len();
    info!(
        "event=cli_summary module=cli status=ok categories={categories} books={books} authors={authors} audit_entries={audit_entries}"
    );

    println!("shelfmark_core version={}", core_version());
    println!(
        "categories={categories} books={books} authors={authors} audit_entries={audit_entries}"
    );
    service.close()?;
    Ok(())
}
