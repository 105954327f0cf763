//! Integration tests for kgcfp-importer against the SQLite graph store

use kgcfp_domain::{
    ExtractionResult, GraphStore, NodeLabel, NodeRef, RelationType, FALLBACK_RELATION,
};
use kgcfp_importer::{GraphImporter, ImportOptions, ImporterError};
use kgcfp_store::SqliteGraphStore;
use serde_json::json;
use std::fs;

fn importer() -> GraphImporter<SqliteGraphStore> {
    let mut importer = GraphImporter::new(SqliteGraphStore::in_memory().unwrap());
    importer.create_constraints().unwrap();
    importer
}

fn result(value: serde_json::Value) -> ExtractionResult {
    serde_json::from_value(value).unwrap()
}

fn painter_result() -> ExtractionResult {
    result(json!({
        "source_file": "画家录.md",
        "persons": [{"id": "p1", "name": "张三", "source_book": "画家录-画家小传"}],
        "works": [{"id": "w1", "title": "画1", "creator_ref": "p1", "source_book": "画家录-画家小传"}]
    }))
}

#[test]
fn test_painter_and_work_make_one_created_edge() {
    let mut importer = importer();
    let report = importer.import_result(&painter_result()).unwrap();

    assert_eq!(report.total_nodes(), 2);
    assert_eq!(report.edges_of("CREATED"), 1);
    assert_eq!(report.edges_skipped, 0);

    let stats = importer.stats().unwrap();
    assert_eq!(stats.total_nodes(), 2);
    assert_eq!(stats.total_edges(), 1);
    assert_eq!(stats.edges_of("CREATED"), 1);

    let work = importer.store().get_node(NodeLabel::Work, "w1").unwrap().unwrap();
    assert_eq!(work.properties["title"].as_text(), Some("画1"));
    assert_eq!(work.properties["creator_ref"].as_text(), Some("p1"));
    assert!(!work.properties.contains_key("id"));
}

#[test]
fn test_import_is_idempotent() {
    let mut importer = importer();
    let data = result(json!({
        "source_file": "a.md",
        "periods": [{"id": "period_tang", "name": "唐", "time_range": {"start": 618, "end": 907}}],
        "persons": [
            {"id": "person_wu", "name": "吴道子", "other_names": ["吴道玄"]},
            {"id": "person_zhang", "name": "张孝师"}
        ],
        "social_relations": [
            {"id": "rel_1", "source_id": "person_zhang", "target_id": "person_wu", "relation_type": "Master_Student"}
        ],
        "works": [{"id": "work_1", "title": "天王送子图", "creator_ref": "person_wu", "period_ref": "period_tang"}]
    }));

    importer.import_result(&data).unwrap();
    let first = importer.stats().unwrap();
    importer.import_result(&data).unwrap();
    let second = importer.stats().unwrap();

    assert_eq!(first, second);
    assert_eq!(second.total_nodes(), 4);
    assert_eq!(second.edges_of("MASTER_STUDENT"), 1);
    assert_eq!(second.edges_of("DATED_TO"), 1);
}

#[test]
fn test_dangling_creator_is_skipped() {
    let mut importer = importer();
    let data = result(json!({
        "source_file": "a.md",
        "works": [{"id": "w9", "title": "佚名画", "creator_ref": "person_missing"}]
    }));

    let report = importer.import_result(&data).unwrap();

    assert_eq!(report.nodes_of(NodeLabel::Work), 1);
    assert_eq!(report.total_edges(), 0);
    assert_eq!(report.edges_skipped, 1);
    assert!(importer.store().get_node(NodeLabel::Work, "w9").unwrap().is_some());
    assert_eq!(importer.stats().unwrap().total_edges(), 0);
}

#[test]
fn test_social_relation_types_are_normalized() {
    let mut importer = importer();
    let data = result(json!({
        "source_file": "a.md",
        "persons": [
            {"id": "p_a", "name": "甲"},
            {"id": "p_b", "name": "乙"},
            {"id": "p_c", "name": "丙"}
        ],
        "social_relations": [
            {"id": "r1", "source_id": "p_a", "target_id": "p_b", "relation_type": "师生/同门", "formal_name": "师生"},
            {"id": "r2", "source_id": "p_a", "target_id": "p_c", "relation_type": "x]->(y"}
        ]
    }));

    importer.import_result(&data).unwrap();

    let edges = importer.store().outgoing_edges(NodeRef::new(NodeLabel::Person, "p_a")).unwrap();
    let types: Vec<&str> = edges.iter().map(|e| e.relation.as_str()).collect();
    assert!(types.contains(&"师生_同门"));
    assert!(types.contains(&FALLBACK_RELATION));

    let mentorship = edges
        .iter()
        .find(|e| e.relation == RelationType::social("师生/同门"))
        .unwrap();
    assert_eq!(mentorship.properties["formal_name"].as_text(), Some("师生"));
}

#[test]
fn test_literature_targets_person_or_work() {
    let mut importer = importer();
    let data = result(json!({
        "source_file": "a.md",
        "persons": [
            {"id": "person_gu", "name": "顾恺之"},
            {"id": "person_xie", "name": "谢赫", "primary_role": "Critic"}
        ],
        "works": [{"id": "work_luoshen", "title": "洛神赋图"}],
        "literature": [
            {"id": "lit_1", "target_ref": "person_gu", "author_ref": "person_xie", "quality_rank": "第三品"},
            {"id": "lit_2", "target_ref": "work_luoshen"}
        ]
    }));

    let report = importer.import_result(&data).unwrap();

    assert_eq!(report.edges_of("CRITIQUES"), 1);
    assert_eq!(report.edges_of("RECORDS"), 1);
    assert_eq!(report.edges_of("WROTE"), 1);
    // each record tries both targets; one of the two always misses
    assert_eq!(report.edges_skipped, 2);

    let lit = importer
        .store()
        .outgoing_edges(NodeRef::new(NodeLabel::Literature, "lit_1"))
        .unwrap();
    assert_eq!(lit.len(), 1);
    assert_eq!(lit[0].relation, RelationType::Critiques);
    assert_eq!(lit[0].target_id, "person_gu");

    let wrote = importer
        .store()
        .outgoing_edges(NodeRef::new(NodeLabel::Person, "person_xie"))
        .unwrap();
    assert_eq!(wrote[0].relation, RelationType::Wrote);
    assert_eq!(wrote[0].target_label, NodeLabel::Literature);
}

#[test]
fn test_cv_record_edges_carry_properties() {
    let mut importer = importer();
    let data = result(json!({
        "source_file": "a.md",
        "periods": [{"id": "period_yuan", "name": "元"}],
        "locations": [{"id": "loc_beijing", "modern_address": "北京市"}],
        "persons": [{"id": "person_zhao", "name": "赵孟頫"}],
        "cv_records": [{
            "id": "cv_1",
            "person_ref": "person_zhao",
            "official_title": "翰林学士承旨",
            "rank": "从一品",
            "tenure": {"start": 1316, "end": 1322},
            "location_ref": "loc_beijing",
            "time_ref": "period_yuan"
        }]
    }));

    let report = importer.import_result(&data).unwrap();
    assert_eq!(report.edges_of("WORKED_AT"), 1);
    assert_eq!(report.edges_of("ACTIVE_IN"), 1);

    let edges = importer
        .store()
        .outgoing_edges(NodeRef::new(NodeLabel::Person, "person_zhao"))
        .unwrap();
    let worked = edges.iter().find(|e| e.relation == RelationType::WorkedAt).unwrap();
    assert_eq!(worked.properties["official_title"].as_text(), Some("翰林学士承旨"));
    let tenure: serde_json::Value =
        serde_json::from_str(worked.properties["tenure"].as_text().unwrap()).unwrap();
    assert_eq!(tenure, json!({"start": 1316, "end": 1322}));
    assert!(!worked.properties.contains_key("event_type"));
}

#[test]
fn test_import_directory_with_clear() {
    let dir = tempfile::tempdir().unwrap();
    fs::write(
        dir.path().join("画家录_extracted.json"),
        serde_json::to_string_pretty(&painter_result()).unwrap(),
    )
    .unwrap();
    fs::write(dir.path().join("combined_extraction.json"), "{}").unwrap();

    let mut importer = importer();
    let stale = result(json!({"source_file": "old.md", "persons": [{"id": "p_old", "name": "旧"}]}));
    importer.import_result(&stale).unwrap();

    let report = importer
        .import_directory(dir.path(), ImportOptions { clear: true })
        .unwrap();

    assert_eq!(report.files, 1);
    let stats = importer.stats().unwrap();
    assert_eq!(stats.total_nodes(), 2);
    assert_eq!(stats.edges_of("CREATED"), 1);

    let store = importer.into_inner();
    assert!(store.get_node(NodeLabel::Person, "p_old").unwrap().is_none());
    assert_eq!(store.constraint_names().unwrap().len(), NodeLabel::ALL.len());
}

#[test]
fn test_import_directory_without_clear_keeps_existing() {
    let dir = tempfile::tempdir().unwrap();
    fs::write(
        dir.path().join("a_extracted.json"),
        serde_json::to_string(&painter_result()).unwrap(),
    )
    .unwrap();

    let mut importer = importer();
    let other = result(json!({"source_file": "b.md", "persons": [{"id": "p_other", "name": "丁"}]}));
    importer.import_result(&other).unwrap();

    importer
        .import_directory(dir.path(), ImportOptions::default())
        .unwrap();
    assert_eq!(importer.stats().unwrap().nodes_of(NodeLabel::Person), 2);
}

#[test]
fn test_missing_directory_is_fatal() {
    let mut importer = importer();
    let dir = tempfile::tempdir().unwrap();
    let missing = dir.path().join("nope");

    let result = importer.import_directory(&missing, ImportOptions::default());
    assert!(matches!(result, Err(ImporterError::DirectoryNotFound(_))));
}

#[test]
fn test_invalid_file_is_reported() {
    let dir = tempfile::tempdir().unwrap();
    fs::write(dir.path().join("bad_extracted.json"), "{not json").unwrap();

    let mut importer = importer();
    let result = importer.import_directory(dir.path(), ImportOptions::default());
    assert!(matches!(result, Err(ImporterError::InvalidFile { .. })));
}
