//! Graph vocabulary shared by the store and the importer

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use std::fmt;

/// Node labels in the persisted graph
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum NodeLabel {
    /// Dynasty or sub-period
    Period,
    /// Geographic location
    Location,
    /// Subject-matter class
    Iconography,
    /// Historical figure
    Person,
    /// Artwork
    Work,
    /// Critical record
    Literature,
}

impl NodeLabel {
    /// Every label, in import order
    pub const ALL: [NodeLabel; 6] = [
        NodeLabel::Period,
        NodeLabel::Location,
        NodeLabel::Iconography,
        NodeLabel::Person,
        NodeLabel::Work,
        NodeLabel::Literature,
    ];

    /// Label as stored
    pub fn as_str(self) -> &'static str {
        match self {
            NodeLabel::Period => "Period",
            NodeLabel::Location => "Location",
            NodeLabel::Iconography => "Iconography",
            NodeLabel::Person => "Person",
            NodeLabel::Work => "Work",
            NodeLabel::Literature => "Literature",
        }
    }

    /// Parse a stored label
    pub fn parse(s: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|label| label.as_str() == s)
    }
}

impl fmt::Display for NodeLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Relationship type used when a social label cannot be made safe
pub const FALLBACK_RELATION: &str = "RELATED_TO";

/// A relationship-type token derived from free text; always safe to use as a type name
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct RelationToken(String);

impl RelationToken {
    /// Normalise a free-text label (e.g. a social relation type) into a token.
    ///
    /// Uppercases, turns whitespace and `/`, `\`, `-` into `_`, collapses runs of
    /// `_`. Anything else that is not alphanumeric makes the label unsafe and the
    /// token falls back to [`FALLBACK_RELATION`].
    pub fn normalize(raw: &str) -> Self {
        let mut token = String::with_capacity(raw.len());
        for c in raw.trim().chars() {
            let mapped = if c.is_whitespace() || matches!(c, '/' | '\\' | '-') {
                '_'
            } else {
                c
            };
            if mapped == '_' && (token.is_empty() || token.ends_with('_')) {
                continue;
            }
            token.extend(mapped.to_uppercase());
        }
        while token.ends_with('_') {
            token.pop();
        }

        let safe = !token.is_empty()
            && token.chars().all(|c| c == '_' || c.is_alphanumeric());
        if safe {
            Self(token)
        } else {
            Self(FALLBACK_RELATION.to_string())
        }
    }

    /// The token text
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// Relationship types in the graph
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum RelationType {
    /// Person -> Location, from a CV record
    WorkedAt,
    /// Person -> Period, from a CV record
    ActiveIn,
    /// Person -> Work
    Created,
    /// Work -> Period
    DatedTo,
    /// Work -> Iconography
    Depicts,
    /// Person -> Literature
    Wrote,
    /// Literature -> Person
    Critiques,
    /// Literature -> Work
    Records,
    /// Person -> Person, typed by the normalised social label
    Social(RelationToken),
}

impl RelationType {
    /// Social relation type from a free-text label
    pub fn social(label: &str) -> Self {
        RelationType::Social(RelationToken::normalize(label))
    }

    /// Type name as stored
    pub fn as_str(&self) -> &str {
        match self {
            RelationType::WorkedAt => "WORKED_AT",
            RelationType::ActiveIn => "ACTIVE_IN",
            RelationType::Created => "CREATED",
            RelationType::DatedTo => "DATED_TO",
            RelationType::Depicts => "DEPICTS",
            RelationType::Wrote => "WROTE",
            RelationType::Critiques => "CRITIQUES",
            RelationType::Records => "RECORDS",
            RelationType::Social(token) => token.as_str(),
        }
    }

    /// Parse a stored type name; unknown names are treated as social tokens
    pub fn parse(s: &str) -> Self {
        match s {
            "WORKED_AT" => RelationType::WorkedAt,
            "ACTIVE_IN" => RelationType::ActiveIn,
            "CREATED" => RelationType::Created,
            "DATED_TO" => RelationType::DatedTo,
            "DEPICTS" => RelationType::Depicts,
            "WROTE" => RelationType::Wrote,
            "CRITIQUES" => RelationType::Critiques,
            "RECORDS" => RelationType::Records,
            other => RelationType::social(other),
        }
    }
}

impl fmt::Display for RelationType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A scalar property value; the store holds nothing else
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum PropertyValue {
    /// Boolean
    Bool(bool),
    /// Integer
    Integer(i64),
    /// Floating point
    Float(f64),
    /// Text, including JSON-encoded composite values
    Text(String),
}

impl PropertyValue {
    /// Text content, if this is a text value
    pub fn as_text(&self) -> Option<&str> {
        match self {
            PropertyValue::Text(s) => Some(s),
            _ => None,
        }
    }
}

/// Property map of a node or edge
pub type Properties = BTreeMap<String, PropertyValue>;

/// Convert a JSON value to a scalar property; `None` for `null`.
///
/// Objects and arrays are encoded as JSON text.
pub fn scalar_property(value: &Value) -> Option<PropertyValue> {
    match value {
        Value::Null => None,
        Value::Bool(b) => Some(PropertyValue::Bool(*b)),
        Value::Number(n) => Some(match n.as_i64() {
            Some(i) => PropertyValue::Integer(i),
            None => PropertyValue::Float(n.as_f64().unwrap_or_default()),
        }),
        Value::String(s) => Some(PropertyValue::Text(s.clone())),
        composite => Some(PropertyValue::Text(composite.to_string())),
    }
}

/// Flatten a record into node properties, leaving out `id` and null fields
pub fn to_properties<T: Serialize>(record: &T) -> Result<Properties, serde_json::Error> {
    let value = serde_json::to_value(record)?;
    let Value::Object(fields) = value else {
        return Err(serde::ser::Error::custom("record did not serialize to an object"));
    };

    Ok(fields
        .iter()
        .filter(|(key, _)| key.as_str() != "id")
        .filter_map(|(key, value)| scalar_property(value).map(|v| (key.clone(), v)))
        .collect())
}

/// Address of a node: label plus identifier
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NodeRef<'a> {
    /// Node label
    pub label: NodeLabel,
    /// Node identifier
    pub id: &'a str,
}

impl<'a> NodeRef<'a> {
    /// Create a node reference
    pub fn new(label: NodeLabel, id: &'a str) -> Self {
        Self { label, id }
    }
}

/// Outcome of an edge merge
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MergeOutcome {
    /// The edge exists now (created or updated)
    Merged,
    /// An endpoint was missing; nothing was written
    Skipped,
}

/// A node read back from the store
#[derive(Debug, Clone, PartialEq)]
pub struct StoredNode {
    /// Label
    pub label: NodeLabel,
    /// Identifier
    pub id: String,
    /// Properties
    pub properties: Properties,
}

/// An edge read back from the store
#[derive(Debug, Clone, PartialEq)]
pub struct StoredEdge {
    /// Source label
    pub source_label: NodeLabel,
    /// Source identifier
    pub source_id: String,
    /// Relationship type
    pub relation: RelationType,
    /// Target label
    pub target_label: NodeLabel,
    /// Target identifier
    pub target_id: String,
    /// Properties
    pub properties: Properties,
}

/// Counts by node label and by relationship type
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GraphStats {
    /// Nodes per label
    pub nodes_by_label: BTreeMap<String, usize>,
    /// Edges per relationship type
    pub edges_by_type: BTreeMap<String, usize>,
}

impl GraphStats {
    /// Total number of nodes
    pub fn total_nodes(&self) -> usize {
        self.nodes_by_label.values().sum()
    }

    /// Total number of edges
    pub fn total_edges(&self) -> usize {
        self.edges_by_type.values().sum()
    }

    /// Count for one relationship type
    pub fn edges_of(&self, relation: &str) -> usize {
        self.edges_by_type.get(relation).copied().unwrap_or(0)
    }

    /// Count for one label
    pub fn nodes_of(&self, label: NodeLabel) -> usize {
        self.nodes_by_label.get(label.as_str()).copied().unwrap_or(0)
    }

    /// Multi-line report, largest groups first
    pub fn summary(&self) -> String {
        fn sorted(map: &BTreeMap<String, usize>) -> Vec<(&String, &usize)> {
            let mut entries: Vec<_> = map.iter().collect();
            entries.sort_by(|a, b| b.1.cmp(a.1).then_with(|| a.0.cmp(b.0)));
            entries
        }

        let mut lines = vec!["=== Database Statistics ===".to_string()];
        for (label, count) in sorted(&self.nodes_by_label) {
            lines.push(format!("  {label}: {count}"));
        }
        lines.push("=== Relationships ===".to_string());
        for (relation, count) in sorted(&self.edges_by_type) {
            lines.push(format!("  {relation}: {count}"));
        }
        lines.join("\n")
    }
}
