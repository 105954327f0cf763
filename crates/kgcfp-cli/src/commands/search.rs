//! Search command implementation.

use crate::cli::SearchArgs;
use crate::error::{CliError, Result};
use crate::output::Formatter;
use kgcfp_store::SqliteGraphStore;
use std::path::Path;

/// Execute the search command.
pub fn execute_search(args: SearchArgs, db_path: &Path, formatter: &Formatter) -> Result<()> {
    if args.query.trim().is_empty() {
        return Err(CliError::InvalidInput("Search text must not be empty".to_string()));
    }
    if args.limit == 0 {
        return Err(CliError::InvalidInput("Limit must be positive".to_string()));
    }

    let store = SqliteGraphStore::open(db_path)?;
    let nodes = store.search_nodes(args.query.trim(), args.limit)?;
    println!("{}", formatter.format_nodes(&nodes)?);

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::OutputFormat;

    #[test]
    fn test_blank_query_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let formatter = Formatter::new(OutputFormat::Table, false);
        let args = SearchArgs {
            query: "  ".to_string(),
            limit: 10,
        };
        let result = execute_search(args, &dir.path().join("graph.db"), &formatter);
        assert!(matches!(result, Err(CliError::InvalidInput(_))));
    }
}
