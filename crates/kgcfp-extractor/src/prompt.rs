//! Prompt construction for entity extraction

use kgcfp_domain::Prompt;

/// Marker appended to input that was cut to the character budget
pub const TRUNCATION_MARKER: &str = "...[truncated]";

/// Cut `text` to at most `max_chars` characters, marking the cut
pub fn truncate_input(text: &str, max_chars: usize) -> String {
    match text.char_indices().nth(max_chars) {
        Some((cut, _)) => format!("{}{}", &text[..cut], TRUNCATION_MARKER),
        None => text.to_string(),
    }
}

/// Builds prompts for the model to extract entities from one chunk
pub struct PromptBuilder<'a> {
    text: &'a str,
    source_label: &'a str,
}

impl<'a> PromptBuilder<'a> {
    /// Create a new prompt builder
    pub fn new(text: &'a str, source_label: &'a str) -> Self {
        Self { text, source_label }
    }

    /// Build the two-part extraction prompt
    pub fn build(&self) -> Prompt {
        let mut system = String::with_capacity(EXTRACTION_INSTRUCTIONS.len() + SCHEMA.len() + 32);
        system.push_str(EXTRACTION_INSTRUCTIONS);
        system.push_str("\n\nOutput format (JSON):\n");
        system.push_str(SCHEMA);

        let user = format!(
            "Extract all entities from the following text from \"{}\":\n\n\
             ---TEXT START---\n{}\n---TEXT END---\n\n\
             Return ONLY valid JSON.",
            self.source_label, self.text
        );

        Prompt { system, user }
    }
}

const EXTRACTION_INSTRUCTIONS: &str = r#"You are an expert in Chinese art history specializing in extracting structured information from classical Chinese painting texts.

Entity types to extract:

Taxonomy
1. Periods (时期): dynasties and sub-periods with Gregorian time ranges
2. Locations (地点): historical and modern names, coordinates
3. Iconography (题材): subject-matter classes (religious figures, scenes, etc.)

Historical figures and social networks
4. Persons (人物): painters, collectors, critics, patrons
   - names (name, courtesy name 字, pseudonym 号), role, choronym (籍贯), birth/death years, period reference, authority ids (Wikidata, CBDB)
5. CV records (履历): official posts and career moves
   - entry mode (科举/荐举), official title, rank, tenure, location
6. Social relations (社会关系): teacher-student, kinship, colleague, friendship

Artworks and evidence
7. Works (作品): paintings and calligraphies
   - title, creator, period, status (存世), support (媒介), dimensions, repository
8. Literature (文献著录): criticism and catalogue records
   - source book, quality rank (神品/妙品/能品/逸品), quotes

IMPORTANT:
- Return ONLY valid JSON, no explanations
- Use empty arrays [] for missing entity types
- Give every record an id of the form <kind>_<slug>
- Link entities via references (period_ref, creator_ref, person_ref, etc.)
- For Chinese dynasty mapping, use: 魏晋=220-420, 南北朝=420-589, 隋=581-618, 唐=618-907, 五代=907-960, 宋=960-1279, 元=1271-1368, 明=1368-1644, 清=1644-1911"#;

const SCHEMA: &str = r#"{
  "source_file": "string",
  "periods": [{ "id": "string", "name": "string", "time_range": {"start": 0, "end": 0}, "dynastic_info": "string" }],
  "locations": [{ "id": "string", "historical_names": [{"name": "string", "period": "string"}], "modern_address": "string", "coordinates": [0, 0] }],
  "iconographies": [{ "id": "string", "name": {"zh": "string"}, "parent_id": "string", "visual_elements": ["string"] }],
  "persons": [{ "id": "string", "primary_role": "string", "name": "string", "courtesy_name": "string", "pseudonym": "string", "other_names": ["string"], "choronym": "string", "birth_death": {"birth": 0, "death": 0}, "period_ref": "string", "authority_ids": {"Wikidata": "string", "CBDB": "string"}, "biography": "string" }],
  "cv_records": [{ "id": "string", "person_ref": "string", "entry_mode": "string", "official_title": "string", "rank": "string", "tenure": {"start": 0, "end": 0}, "location_ref": "string", "time_ref": "string", "event_type": "string" }],
  "social_relations": [{ "id": "string", "source_id": "string", "target_id": "string", "relation_type": "string", "formal_name": "string" }],
  "works": [{ "id": "string", "title": "string", "creator_ref": "string", "period_ref": "string", "icon_ref": "string", "status": "string", "support": "string", "dimensions": {"height": 0, "width": 0, "unit": "cm"}, "repository": "string", "description": "string" }],
  "literature": [{ "id": "string", "target_ref": "string", "source_book": "string", "author_ref": "string", "quality_rank": "string", "quote": "string" }]
}"#;
