//! Extraction results and the persisted intermediate form

use crate::entity::{
    null_as_default, CvRecord, Entity, Iconography, Literature, Location, Period, Person,
    SocialRelation, Work,
};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt;

/// Entities extracted from one chunk, or aggregated over one document.
///
/// This is also the exact shape written to `<stem>_extracted.json`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ExtractionResult {
    /// Source file name (or provenance label for a single chunk)
    pub source_file: String,

    /// M1.1 temporal entities
    #[serde(default, deserialize_with = "null_as_default")]
    pub periods: Vec<Period>,

    /// M1.2 spatial entities
    #[serde(default, deserialize_with = "null_as_default")]
    pub locations: Vec<Location>,

    /// M1.3 iconography entities
    #[serde(default, deserialize_with = "null_as_default")]
    pub iconographies: Vec<Iconography>,

    /// M2.1 people
    #[serde(default, deserialize_with = "null_as_default")]
    pub persons: Vec<Person>,

    /// M2.2 career records
    #[serde(default, deserialize_with = "null_as_default")]
    pub cv_records: Vec<CvRecord>,

    /// M2.3 social relations
    #[serde(default, deserialize_with = "null_as_default")]
    pub social_relations: Vec<SocialRelation>,

    /// M3.1 works
    #[serde(default, deserialize_with = "null_as_default")]
    pub works: Vec<Work>,

    /// M3.2 literature and criticism
    #[serde(default, deserialize_with = "null_as_default")]
    pub literature: Vec<Literature>,

    /// Human-readable notes about extraction quality and failures
    #[serde(default, deserialize_with = "null_as_default")]
    pub extraction_notes: Vec<String>,
}

impl ExtractionResult {
    /// An empty result for the given source
    pub fn empty(source_file: impl Into<String>) -> Self {
        Self {
            source_file: source_file.into(),
            ..Default::default()
        }
    }

    /// An empty result carrying a single note
    pub fn with_note(source_file: impl Into<String>, note: impl Into<String>) -> Self {
        let mut result = Self::empty(source_file);
        result.extraction_notes.push(note.into());
        result
    }

    /// Append all records and notes of `other`, preserving order
    pub fn absorb(&mut self, other: ExtractionResult) {
        self.periods.extend(other.periods);
        self.locations.extend(other.locations);
        self.iconographies.extend(other.iconographies);
        self.persons.extend(other.persons);
        self.cv_records.extend(other.cv_records);
        self.social_relations.extend(other.social_relations);
        self.works.extend(other.works);
        self.literature.extend(other.literature);
        self.extraction_notes.extend(other.extraction_notes);
    }

    /// Collapse repeated identifiers within each kind to their first occurrence
    pub fn dedupe(&mut self) {
        dedupe_by_id(&mut self.periods);
        dedupe_by_id(&mut self.locations);
        dedupe_by_id(&mut self.iconographies);
        dedupe_by_id(&mut self.persons);
        dedupe_by_id(&mut self.cv_records);
        dedupe_by_id(&mut self.social_relations);
        dedupe_by_id(&mut self.works);
        dedupe_by_id(&mut self.literature);
    }

    /// Record counts per kind
    pub fn counts(&self) -> EntityCounts {
        EntityCounts {
            periods: self.periods.len(),
            locations: self.locations.len(),
            iconographies: self.iconographies.len(),
            persons: self.persons.len(),
            cv_records: self.cv_records.len(),
            social_relations: self.social_relations.len(),
            works: self.works.len(),
            literature: self.literature.len(),
        }
    }

    /// True when no records of any kind are present
    pub fn is_empty(&self) -> bool {
        self.counts().total() == 0
    }
}

/// Keep the first record for every identifier; later duplicates are dropped whole.
pub fn dedupe_by_id<T: Entity>(items: &mut Vec<T>) {
    let mut seen = HashSet::new();
    items.retain(|item| seen.insert(item.id().to_string()));
}

/// Per-kind record counts
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EntityCounts {
    /// Periods
    pub periods: usize,
    /// Locations
    pub locations: usize,
    /// Iconographies
    pub iconographies: usize,
    /// Persons
    pub persons: usize,
    /// CV records
    pub cv_records: usize,
    /// Social relations
    pub social_relations: usize,
    /// Works
    pub works: usize,
    /// Literature
    pub literature: usize,
}

impl EntityCounts {
    /// Sum across all kinds
    pub fn total(&self) -> usize {
        self.periods
            + self.locations
            + self.iconographies
            + self.persons
            + self.cv_records
            + self.social_relations
            + self.works
            + self.literature
    }
}

impl std::ops::AddAssign for EntityCounts {
    fn add_assign(&mut self, rhs: Self) {
        self.periods += rhs.periods;
        self.locations += rhs.locations;
        self.iconographies += rhs.iconographies;
        self.persons += rhs.persons;
        self.cv_records += rhs.cv_records;
        self.social_relations += rhs.social_relations;
        self.works += rhs.works;
        self.literature += rhs.literature;
    }
}

impl fmt::Display for EntityCounts {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} periods, {} locations, {} iconographies, {} persons, {} cv records, \
             {} social relations, {} works, {} literature",
            self.periods,
            self.locations,
            self.iconographies,
            self.persons,
            self.cv_records,
            self.social_relations,
            self.works,
            self.literature
        )
    }
}

/// The combined document written next to the per-file results
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CombinedExtraction {
    /// Number of processed files
    pub total_files: usize,
    /// Sum of periods
    pub total_periods: usize,
    /// Sum of locations
    pub total_locations: usize,
    /// Sum of iconographies
    pub total_iconographies: usize,
    /// Sum of persons
    pub total_persons: usize,
    /// Sum of CV records
    pub total_cv_records: usize,
    /// Sum of social relations
    pub total_social_relations: usize,
    /// Sum of works
    pub total_works: usize,
    /// Sum of literature records
    pub total_literature: usize,
    /// Every per-file result
    pub results: Vec<ExtractionResult>,
}

impl CombinedExtraction {
    /// Build the combined summary from per-file results
    pub fn from_results(results: Vec<ExtractionResult>) -> Self {
        let mut totals = EntityCounts::default();
        for result in &results {
            totals += result.counts();
        }

        Self {
            total_files: results.len(),
            total_periods: totals.periods,
            total_locations: totals.locations,
            total_iconographies: totals.iconographies,
            total_persons: totals.persons,
            total_cv_records: totals.cv_records,
            total_social_relations: totals.social_relations,
            total_works: totals.works,
            total_literature: totals.literature,
            results,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn person(id: &str, name: &str) -> Person {
        serde_json::from_value(serde_json::json!({"id": id, "name": name})).unwrap()
    }

    #[test]
    fn test_dedupe_keeps_first_seen() {
        let mut persons = vec![person("p1", "张三"), person("p2", "李四"), person("p1", "张三丰")];
        dedupe_by_id(&mut persons);

        assert_eq!(persons.len(), 2);
        assert_eq!(persons[0].name, "张三");
        assert_eq!(persons[1].id, "p2");
    }

    #[test]
    fn test_absorb_then_dedupe() {
        let mut total = ExtractionResult::empty("doc.md");
        let mut first = ExtractionResult::empty("chunk-1");
        first.persons.push(person("p1", "顾恺之"));
        first.extraction_notes.push("note a".to_string());
        let mut second = ExtractionResult::empty("chunk-2");
        second.persons.push(person("p1", "顾长康"));
        second.extraction_notes.push("note b".to_string());

        total.absorb(first);
        total.absorb(second);
        total.dedupe();

        assert_eq!(total.persons.len(), 1);
        assert_eq!(total.persons[0].name, "顾恺之");
        assert_eq!(total.extraction_notes, vec!["note a", "note b"]);
        assert_eq!(total.source_file, "doc.md");
    }

    #[test]
    fn test_persisted_form_keys() {
        let result = ExtractionResult::with_note("a.md", "nothing found");
        let json = serde_json::to_value(&result).unwrap();
        let obj = json.as_object().unwrap();
        for key in [
            "source_file",
            "periods",
            "locations",
            "iconographies",
            "persons",
            "cv_records",
            "social_relations",
            "works",
            "literature",
            "extraction_notes",
        ] {
            assert!(obj.contains_key(key), "missing key {key}");
        }
    }

    #[test]
    fn test_combined_totals() {
        let mut a = ExtractionResult::empty("a.md");
        a.persons.push(person("p1", "甲"));
        let mut b = ExtractionResult::empty("b.md");
        b.persons.push(person("p2", "乙"));
        b.persons.push(person("p3", "丙"));

        let combined = CombinedExtraction::from_results(vec![a, b]);
        assert_eq!(combined.total_files, 2);
        assert_eq!(combined.total_persons, 3);
        assert_eq!(combined.total_works, 0);
    }

    proptest! {
        #[test]
        fn prop_dedupe_one_per_id(ids in proptest::collection::vec(0u8..8, 0..40)) {
            let mut persons: Vec<Person> = ids
                .iter()
                .enumerate()
                .map(|(i, id)| person(&format!("p{id}"), &format!("n{i}")))
                .collect();
            let original = persons.clone();
            dedupe_by_id(&mut persons);

            let distinct: HashSet<_> = ids.iter().collect();
            prop_assert_eq!(persons.len(), distinct.len());
            for kept in &persons {
                let first = original.iter().find(|p| p.id == kept.id).unwrap();
                prop_assert_eq!(kept, first);
            }
        }
    }
}
