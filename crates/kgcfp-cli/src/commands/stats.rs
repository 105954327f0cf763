//! Stats command implementation.

use crate::error::Result;
use crate::output::Formatter;
use kgcfp_domain::GraphStore;
use kgcfp_store::SqliteGraphStore;
use std::path::Path;

/// Execute the stats command.
pub fn execute_stats(db_path: &Path, formatter: &Formatter) -> Result<()> {
    let store = SqliteGraphStore::open(db_path)?;
    println!("{}", formatter.format_stats(&store.stats()?)?);
    Ok(())
}
