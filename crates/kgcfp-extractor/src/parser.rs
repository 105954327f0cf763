//! Parse model output into typed extraction results
//!
//! The model is not trusted to answer with JSON only, so the response is
//! scanned for balanced `{ ... }` spans and the first one that parses as a JSON
//! object is used.

use kgcfp_domain::{Entity, ExtractionResult};
use serde_json::{Map, Value};
use tracing::{debug, warn};

const PREVIEW_CHARS: usize = 200;

/// Candidate object spans of `text`, in order of their opening brace
///
/// Every `{` opens a candidate that ends at its balanced `}`; a candidate that
/// is never closed yields nothing and the scan moves on to the next `{`. Braces
/// inside JSON strings (including escaped quotes) do not count. The iterator is
/// lazy, so callers that stop at the first usable span pay for no more.
pub fn json_object_spans(text: &str) -> impl Iterator<Item = &str> + '_ {
    text.char_indices()
        .filter(|&(_, c)| c == '{')
        .filter_map(move |(start, _)| balanced_span(text, start))
}

/// The span from the `{` at byte `start` to its balanced `}`
fn balanced_span(text: &str, start: usize) -> Option<&str> {
    let mut depth = 0usize;
    let mut in_string = false;
    let mut escaped = false;

    for (i, c) in text[start..].char_indices() {
        if in_string {
            if escaped {
                escaped = false;
            } else if c == '\\' {
                escaped = true;
            } else if c == '"' {
                in_string = false;
            }
            continue;
        }

        match c {
            '"' => in_string = true,
            '{' => depth += 1,
            '}' => {
                depth -= 1;
                if depth == 0 {
                    return Some(&text[start..=start + i]);
                }
            }
            _ => {}
        }
    }

    None
}

/// First JSON object embedded in `text`
///
/// `Err` carries the extraction note describing why nothing usable was found.
pub fn find_json_object(text: &str) -> Result<Map<String, Value>, String> {
    let mut found_span = false;
    let mut first_error = None;

    for span in json_object_spans(text) {
        found_span = true;
        match serde_json::from_str::<Value>(span) {
            Ok(Value::Object(map)) => return Ok(map),
            Ok(_) => {}
            Err(e) => {
                first_error.get_or_insert(e);
            }
        }
    }

    if !found_span {
        return Err(format!("No JSON object found in response: {}", preview(text)));
    }

    let reason = first_error.map_or_else(|| "not an object".to_string(), |e| e.to_string());
    Err(format!("Failed to parse JSON from response: {}: {}", reason, preview(text)))
}

fn preview(text: &str) -> String {
    text.chars().take(PREVIEW_CHARS).collect()
}

/// Turn a raw model response into a typed result stamped with `source_label`
///
/// Never fails: anything unusable becomes an extraction note on an otherwise
/// empty result.
pub fn parse_response(response: &str, source_label: &str) -> ExtractionResult {
    let mut data = match find_json_object(response) {
        Ok(data) => data,
        Err(note) => {
            warn!("{}: {}", source_label, note);
            return ExtractionResult::with_note(source_label, note);
        }
    };

    // Bookkeeping fields are ours, not the model's.
    data.insert("source_file".to_string(), Value::String(source_label.to_string()));
    data.remove("extraction_notes");

    let mut result: ExtractionResult = match serde_json::from_value(Value::Object(data)) {
        Ok(result) => result,
        Err(e) => {
            let note = format!("Response did not match extraction schema: {}", e);
            warn!("{}: {}", source_label, note);
            return ExtractionResult::with_note(source_label, note);
        }
    };

    let mut notes = Vec::new();
    drop_blank_ids(&mut result.periods, &mut notes);
    drop_blank_ids(&mut result.locations, &mut notes);
    drop_blank_ids(&mut result.iconographies, &mut notes);
    drop_blank_ids(&mut result.persons, &mut notes);
    drop_blank_ids(&mut result.cv_records, &mut notes);
    drop_blank_ids(&mut result.social_relations, &mut notes);
    drop_blank_ids(&mut result.works, &mut notes);
    drop_blank_ids(&mut result.literature, &mut notes);
    result.extraction_notes.extend(notes);

    stamp(&mut result.periods, source_label);
    stamp(&mut result.locations, source_label);
    stamp(&mut result.iconographies, source_label);
    stamp(&mut result.persons, source_label);
    stamp(&mut result.cv_records, source_label);
    stamp(&mut result.social_relations, source_label);
    stamp(&mut result.works, source_label);
    stamp(&mut result.literature, source_label);

    debug!("{}: parsed {}", source_label, result.counts());
    result
}

fn drop_blank_ids<T: Entity>(items: &mut Vec<T>, notes: &mut Vec<String>) {
    let before = items.len();
    items.retain(|item| !item.id().trim().is_empty());
    let dropped = before - items.len();
    if dropped > 0 {
        notes.push(format!("Dropped {} {} record(s) without an id", dropped, T::KIND));
    }
}

fn stamp<T: Entity>(items: &mut [T], label: &str) {
    for item in items {
        item.stamp_provenance(label);
    }
}
