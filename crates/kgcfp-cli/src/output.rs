//! Output formatting for the CLI.

use crate::config::OutputFormat;
use crate::error::Result;
use colored::*;
use kgcfp_domain::{GraphStats, PropertyValue, StoredNode};
use kgcfp_importer::ImportReport;
use serde_json::json;
use tabled::{
    builder::Builder,
    settings::{object::Rows, Alignment, Modify, Style},
};

/// Property shown next to a node id in tables, first match wins
const DISPLAY_KEYS: [&str; 4] = ["name", "title", "modern_address", "quality_rank"];

/// Output formatter.
pub struct Formatter {
    format: OutputFormat,
    color_enabled: bool,
}

impl Formatter {
    /// Create a new formatter.
    pub fn new(format: OutputFormat, color_enabled: bool) -> Self {
        Self {
            format,
            color_enabled,
        }
    }

    /// Format graph statistics.
    pub fn format_stats(&self, stats: &GraphStats) -> Result<String> {
        match self.format {
            OutputFormat::Json => Ok(serde_json::to_string_pretty(&json!({
                "nodes": stats.nodes_by_label,
                "edges": stats.edges_by_type,
                "total_nodes": stats.total_nodes(),
                "total_edges": stats.total_edges(),
            }))?),
            OutputFormat::Quiet => Ok(format!("{} {}", stats.total_nodes(), stats.total_edges())),
            OutputFormat::Table => {
                if stats.total_nodes() == 0 {
                    return Ok(self.colorize("The graph is empty.", "yellow"));
                }

                let mut builder = Builder::default();
                builder.push_record(["Kind", "Name", "Count"]);
                for (label, count) in &stats.nodes_by_label {
                    builder.push_record(["node".to_string(), label.clone(), count.to_string()]);
                }
                for (relation, count) in &stats.edges_by_type {
                    builder.push_record(["edge".to_string(), relation.clone(), count.to_string()]);
                }
                Ok(self.render(builder))
            }
        }
    }

    /// Format search results.
    pub fn format_nodes(&self, nodes: &[StoredNode]) -> Result<String> {
        match self.format {
            OutputFormat::Json => {
                let nodes: Vec<serde_json::Value> = nodes
                    .iter()
                    .map(|n| {
                        json!({
                            "label": n.label.as_str(),
                            "id": n.id,
                            "properties": n.properties,
                        })
                    })
                    .collect();
                Ok(serde_json::to_string_pretty(&nodes)?)
            }
            OutputFormat::Quiet => Ok(nodes
                .iter()
                .map(|n| n.id.as_str())
                .collect::<Vec<_>>()
                .join("\n")),
            OutputFormat::Table => {
                if nodes.is_empty() {
                    return Ok(self.colorize("No nodes found.", "yellow"));
                }

                let mut builder = Builder::default();
                builder.push_record(["Label", "ID", "Name", "Source"]);
                for node in nodes {
                    builder.push_record([
                        node.label.as_str(),
                        node.id.as_str(),
                        display_name(node),
                        text_property(node, "source_book").unwrap_or("-"),
                    ]);
                }
                Ok(self.render(builder))
            }
        }
    }

    /// Format the outcome of an import run.
    pub fn format_import(&self, report: &ImportReport) -> Result<String> {
        match self.format {
            OutputFormat::Json => Ok(serde_json::to_string_pretty(&json!({
                "files": report.files,
                "nodes": report.nodes,
                "edges": report.edges,
                "edges_skipped": report.edges_skipped,
            }))?),
            OutputFormat::Quiet => Ok(report.total_nodes().to_string()),
            OutputFormat::Table => Ok(self.success(&format!(
                "Imported {} file(s): {}",
                report.files, report
            ))),
        }
    }

    fn render(&self, builder: Builder) -> String {
        let mut table = builder.build();
        table
            .with(Style::rounded())
            .with(Modify::new(Rows::first()).with(Alignment::center()));
        table.to_string()
    }

    /// Format a success message.
    pub fn success(&self, message: &str) -> String {
        self.colorize(&format!("✓ {}", message), "green")
    }

    /// Format an info message.
    pub fn info(&self, message: &str) -> String {
        self.colorize(&format!("ℹ {}", message), "blue")
    }

    /// Format a warning message.
    pub fn warning(&self, message: &str) -> String {
        self.colorize(&format!("⚠ {}", message), "yellow")
    }

    /// Colorize text if color is enabled.
    fn colorize(&self, text: &str, color: &str) -> String {
        if !self.color_enabled {
            return text.to_string();
        }

        match color {
            "green" => text.green().to_string(),
            "blue" => text.blue().to_string(),
            "yellow" => text.yellow().to_string(),
            _ => text.to_string(),
        }
    }
}

fn text_property<'a>(node: &'a StoredNode, key: &str) -> Option<&'a str> {
    node.properties.get(key).and_then(PropertyValue::as_text)
}

fn display_name(node: &StoredNode) -> &str {
    DISPLAY_KEYS
        .iter()
        .find_map(|key| text_property(node, key))
        .unwrap_or("-")
}

#[cfg(test)]
mod tests {
    use super::*;
    use kgcfp_domain::{NodeLabel, Properties};

    fn painter() -> StoredNode {
        let mut properties = Properties::new();
        properties.insert("name".into(), PropertyValue::Text("吴道子".into()));
        properties.insert("source_book".into(), PropertyValue::Text("画史-唐".into()));
        StoredNode {
            label: NodeLabel::Person,
            id: "person_wu".into(),
            properties,
        }
    }

    fn stats() -> GraphStats {
        let mut stats = GraphStats::default();
        stats.nodes_by_label.insert("Person".into(), 2);
        stats.nodes_by_label.insert("Work".into(), 1);
        stats.edges_by_type.insert("CREATED".into(), 1);
        stats
    }

    #[test]
    fn test_stats_table() {
        let formatter = Formatter::new(OutputFormat::Table, false);
        let output = formatter.format_stats(&stats()).unwrap();
        assert!(output.contains("Person"));
        assert!(output.contains("CREATED"));
    }

    #[test]
    fn test_stats_json() {
        let formatter = Formatter::new(OutputFormat::Json, false);
        let output = formatter.format_stats(&stats()).unwrap();
        let value: serde_json::Value = serde_json::from_str(&output).unwrap();
        assert_eq!(value["total_nodes"], 3);
        assert_eq!(value["edges"]["CREATED"], 1);
    }

    #[test]
    fn test_empty_stats() {
        let formatter = Formatter::new(OutputFormat::Table, false);
        let output = formatter.format_stats(&GraphStats::default()).unwrap();
        assert!(output.contains("empty"));
    }

    #[test]
    fn test_nodes_table_shows_name() {
        let formatter = Formatter::new(OutputFormat::Table, false);
        let output = formatter.format_nodes(&[painter()]).unwrap();
        assert!(output.contains("吴道子"));
        assert!(output.contains("画史-唐"));
    }

    #[test]
    fn test_nodes_quiet() {
        let formatter = Formatter::new(OutputFormat::Quiet, false);
        let output = formatter.format_nodes(&[painter()]).unwrap();
        assert_eq!(output, "person_wu");
    }

    #[test]
    fn test_nodes_json_keeps_properties() {
        let formatter = Formatter::new(OutputFormat::Json, false);
        let output = formatter.format_nodes(&[painter()]).unwrap();
        let value: serde_json::Value = serde_json::from_str(&output).unwrap();
        assert_eq!(value[0]["label"], "Person");
        assert_eq!(value[0]["properties"]["name"], "吴道子");
    }

    #[test]
    fn test_colorize_disabled() {
        let formatter = Formatter::new(OutputFormat::Table, false);
        assert_eq!(formatter.success("test"), "✓ test");
    }
}
