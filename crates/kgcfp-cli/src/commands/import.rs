//! Import command implementation.

use crate::cli::ImportArgs;
use crate::error::Result;
use crate::output::Formatter;
use kgcfp_importer::{GraphImporter, ImportOptions};
use kgcfp_store::SqliteGraphStore;
use std::path::Path;

/// Execute the import command.
pub fn execute_import(args: ImportArgs, db_path: &Path, formatter: &Formatter) -> Result<()> {
    let store = SqliteGraphStore::open(db_path)?;
    let mut importer = GraphImporter::new(store);

    let report = importer.import_directory(&args.input, ImportOptions { clear: args.clear })?;
    println!("{}", formatter.format_import(&report)?);
    println!("{}", formatter.format_stats(&importer.stats()?)?);

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::OutputFormat;
    use kgcfp_domain::{ExtractionResult, GraphStore, NodeLabel};
    use std::fs;

    #[test]
    fn test_import_into_file_database() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("output");
        fs::create_dir(&input).unwrap();

        let result: ExtractionResult = serde_json::from_str(
            r#"{"source_file": "a.md", "persons": [{"id": "person_gu", "name": "顾恺之"}]}"#,
        )
        .unwrap();
        fs::write(
            input.join("a_extracted.json"),
            serde_json::to_string(&result).unwrap(),
        )
        .unwrap();

        let db = dir.path().join("graph.db");
        let formatter = Formatter::new(OutputFormat::Quiet, false);
        execute_import(ImportArgs { input, clear: true }, &db, &formatter).unwrap();

        let store = SqliteGraphStore::open(&db).unwrap();
        assert!(store.get_node(NodeLabel::Person, "person_gu").unwrap().is_some());
    }
}
