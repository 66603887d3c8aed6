use super::draft_models::SlideDraft;
use serde_json::Value;

/// Cuts the text down to the span between the first `{` and the last `}`.
///
/// Models like to wrap JSON in prose or code fences; anything outside the
/// outermost braces is dropped. Text without such a span is returned as is.
pub fn extract_json_object(raw: &str) -> &str {
    match (raw.find('{'), raw.rfind('}')) {
        (Some(start), Some(end)) if start < end => &raw[start..=end],
        _ => raw,
    }
}

/// Parses one chunk response into slide drafts.
///
/// A response without a `slides` array yields no drafts. Individual entries
/// that are not slide objects are skipped.
pub fn parse_slides_response(raw: &str) -> Result<Vec<SlideDraft>, serde_json::Error> {
    let parsed: Value = serde_json::from_str(extract_json_object(raw))?;

    let Some(Value::Array(entries)) = parsed.get("slides") else {
        return Ok(Vec::new());
    };

    let mut drafts = Vec::with_capacity(entries.len());
    for (index, entry) in entries.iter().enumerate() {
        if !entry.is_object() {
            tracing::warn!("Skipping slide entry {}: not an object", index);
            continue;
        }
        match serde_json::from_value::<SlideDraft>(entry.clone()) {
            Ok(draft) => drafts.push(draft),
            Err(e) => tracing::warn!("Skipping slide entry {}: {}", index, e),
        }
    }
    Ok(drafts)
}
