//! Binary entry point that glues the file-backed catalog to the menu shell.
//! The bootstrapping pipeline is deliberately short: bring up tracing, open
//! the persistence gateway, hydrate the catalog from disk, drive the menu
//! loop until the user exits, and flush everything back out on the way down.

use std::process::ExitCode;

use anyhow::Result;
use tracing::error;
use tracing_subscriber::EnvFilter;

use library_catalog_manager::{ui, FileStore, LibraryService};

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("library_catalog_manager=info")),
        )
        .init();

    match run() {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            error!(error = %err, "unexpected failure");
            eprintln!("The application encountered an unexpected error: {err:#}");
            ExitCode::FAILURE
        }
    }
}

/// Bootstrap, run, and tear down the service. An error from the menu loop
/// still triggers a best-effort save before it propagates; a missing or
/// empty data directory is the normal first-run state, not an error.
fn run() -> Result<()> {
    let store = FileStore::default_location()?;
    println!("Data directory: {}", store.data_dir().display());

    let mut service = LibraryService::new(store);
    let (books, members) = service.load_all();
    if books == 0 && members == 0 {
        println!("No existing data found. Starting with an empty library.");
    } else {
        println!("Loaded {books} book(s) and {members} member(s).");
    }

    let result = ui::run_menu(&mut service);

    match service.save_all() {
        Ok(()) => println!("All library data saved. Goodbye."),
        Err(err) => eprintln!("Warning: some data may not have been saved: {err}"),
    }

    result
}
