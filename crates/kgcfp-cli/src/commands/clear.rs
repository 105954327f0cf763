//! Clear command implementation.

use crate::cli::ClearArgs;
use crate::error::Result;
use crate::output::Formatter;
use kgcfp_domain::GraphStore;
use kgcfp_store::SqliteGraphStore;
use std::io::{self, Write};
use std::path::Path;

/// Execute the clear command.
pub fn execute_clear(args: ClearArgs, db_path: &Path, formatter: &Formatter) -> Result<()> {
    let mut store = SqliteGraphStore::open(db_path)?;
    let stats = store.stats()?;

    if !args.yes {
        println!(
            "About to delete {} node(s) and {} relationship(s) from {}",
            stats.total_nodes(),
            stats.total_edges(),
            db_path.display()
        );
        print!("Continue? [y/N] ");
        io::stdout().flush()?;

        let mut response = String::new();
        io::stdin().read_line(&mut response)?;

        if !response.trim().eq_ignore_ascii_case("y") {
            println!("{}", formatter.info("Operation cancelled"));
            return Ok(());
        }
    }

    store.clear()?;
    println!("{}", formatter.success("Database cleared"));
    Ok(())
}
