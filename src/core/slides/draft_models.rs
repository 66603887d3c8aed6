// Domain models for slide drafting. These are plain data: lessons come in from
// the course store, drafts come back from the model, and the preview bundle is
// what the user reviews before anything is written to Google Slides.

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

// ============================================================================
// LESSON INPUT
// ============================================================================

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LessonPage {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub content: String,
}

impl LessonPage {
    pub fn has_content(&self) -> bool {
        !self.content.trim().is_empty()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Lesson {
    pub id: String,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub unit_id: Option<String>,
    #[serde(default)]
    pub pages: Vec<LessonPage>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Subject {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub title: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Unit {
    pub id: String,
    #[serde(default)]
    pub name: String,
}

// ============================================================================
// SLIDE DRAFTS
// ============================================================================

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TableData {
    #[serde(default, deserialize_with = "text_list")]
    pub headers: Vec<String>,
    #[serde(default, deserialize_with = "text_rows")]
    pub rows: Vec<Vec<String>>,
}

impl TableData {
    pub fn has_rows(&self) -> bool {
        !self.rows.is_empty()
    }

    pub fn has_headers(&self) -> bool {
        !self.headers.is_empty()
    }

    /// Header width wins; otherwise the first row decides. Never zero.
    pub fn column_count(&self) -> usize {
        if self.has_headers() {
            self.headers.len()
        } else {
            self.rows.first().map(Vec::len).unwrap_or(0).max(1)
        }
    }

    pub fn row_count(&self) -> usize {
        self.rows.len() + usize::from(self.has_headers())
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SpeakerNotes {
    #[serde(default, deserialize_with = "optional_text")]
    pub talking_points: Option<String>,
    #[serde(default, deserialize_with = "optional_text")]
    pub interactive_element: Option<String>,
    #[serde(default, deserialize_with = "optional_text")]
    pub slide_timing: Option<String>,
}

/// Notes arrive structured from the model, or as free text once a user edits them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum NotesContent {
    Edited(String),
    Structured(SpeakerNotes),
}

impl NotesContent {
    /// Flattens notes into the block written to the speaker-notes box.
    pub fn to_notes_text(&self) -> String {
        match self {
            NotesContent::Edited(text) => text.clone(),
            NotesContent::Structured(notes) => {
                let or_na = |value: &Option<String>| match value.as_deref().map(str::trim) {
                    Some(v) if !v.is_empty() => v.to_string(),
                    _ => "N/A".to_string(),
                };
                format!(
                    "[TALKING POINTS]\n{}\n\n[INTERACTIVE ELEMENT]\n{}\n\n[SUGGESTED TIMING: {}]",
                    or_na(&notes.talking_points),
                    or_na(&notes.interactive_element),
                    or_na(&notes.slide_timing)
                )
            }
        }
    }
}

pub const NO_SPEAKER_NOTES: &str = "No speaker notes available.";

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SlideDraft {
    #[serde(default, deserialize_with = "flexible_text")]
    pub title: String,
    #[serde(default, deserialize_with = "flexible_text")]
    pub body: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub table_data: Option<TableData>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<NotesContent>,
}

impl SlideDraft {
    /// The opening slide every deck starts with. Built locally, no model call.
    pub fn title_slide(lesson: &Lesson, subject: &Subject) -> Self {
        Self {
            title: lesson.title.clone(),
            body: format!("Subject: {}", subject.title),
            table_data: None,
            notes: Some(NotesContent::Structured(SpeakerNotes {
                talking_points: Some("Introduction to the lesson topic.".to_string()),
                interactive_element: Some("N/A".to_string()),
                slide_timing: Some("1 min".to_string()),
            })),
        }
    }

    /// Fills a blank title with "Slide N" (1-based deck position).
    pub fn with_fallback_title(mut self, position: usize) -> Self {
        if self.title.trim().is_empty() {
            self.title = format!("Slide {}", position);
        }
        self
    }

    pub fn has_table_rows(&self) -> bool {
        self.table_data.as_ref().is_some_and(TableData::has_rows)
    }

    pub fn notes_text(&self) -> String {
        self.notes
            .as_ref()
            .map(NotesContent::to_notes_text)
            .unwrap_or_else(|| NO_SPEAKER_NOTES.to_string())
    }

    /// Normalizes a (possibly user-edited) draft right before materializing it.
    pub fn prepared(&self, position: usize) -> Self {
        let body = self
            .body
            .split('\n')
            .map(str::trim)
            .collect::<Vec<_>>()
            .join("\n");
        Self {
            body,
            ..self.clone()
        }
        .with_fallback_title(position)
    }
}

// ============================================================================
// PREVIEW + TARGET
// ============================================================================

/// Where a deck lands and what it is called.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MaterializationTarget {
    pub presentation_title: String,
    pub subject_name: String,
    pub unit_name: String,
}

pub const DEFAULT_SUBJECT_NAME: &str = "General Subject";
pub const DEFAULT_UNIT_NAME: &str = "General Unit";
pub const DEFAULT_PRESENTATION_TITLE: &str = "New Presentation";

impl MaterializationTarget {
    pub fn new(
        presentation_title: impl Into<String>,
        subject_name: impl Into<String>,
        unit_name: impl Into<String>,
    ) -> Self {
        Self {
            presentation_title: presentation_title.into(),
            subject_name: subject_name.into(),
            unit_name: unit_name.into(),
        }
    }

    /// Replaces blank fields with the defaults used for folder and file names.
    pub fn sanitized(&self) -> Self {
        let or_default = |value: &str, default: &str| {
            let trimmed = value.trim();
            if trimmed.is_empty() {
                default.to_string()
            } else {
                value.to_string()
            }
        };
        Self {
            presentation_title: or_default(&self.presentation_title, DEFAULT_PRESENTATION_TITLE),
            subject_name: or_default(&self.subject_name, DEFAULT_SUBJECT_NAME),
            unit_name: or_default(&self.unit_name, DEFAULT_UNIT_NAME),
        }
    }
}

/// Result of one generation run, held until the user confirms or discards it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PreviewBundle {
    pub slides: Vec<SlideDraft>,
    pub source_lesson_ids: Vec<String>,
    pub source_lesson_data: Vec<Lesson>,
    pub source_unit_data: Vec<Unit>,
    pub subject: Subject,
}

impl PreviewBundle {
    pub fn materialization_target(&self) -> MaterializationTarget {
        let lesson = self
            .source_lesson_ids
            .first()
            .and_then(|id| self.source_lesson_data.iter().find(|l| &l.id == id));
        let unit = lesson
            .and_then(|l| l.unit_id.as_ref())
            .and_then(|unit_id| self.source_unit_data.iter().find(|u| &u.id == unit_id));

        let lesson_title = lesson
            .map(|l| l.title.as_str())
            .filter(|t| !t.trim().is_empty())
            .unwrap_or("Untitled Lesson");

        MaterializationTarget::new(
            format!("Presentation: {}", lesson_title),
            self.subject.title.clone(),
            unit.map(|u| u.name.clone()).unwrap_or_default(),
        )
        .sanitized()
    }
}

// ============================================================================
// LENIENT FIELD PARSING
// ============================================================================
// Model output is loosely typed: bodies show up as arrays of lines, timings as
// numbers, table cells as null. Everything is coerced into text.

fn value_to_text(value: Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::String(s) => s,
        Value::Array(items) => items
            .into_iter()
            .map(value_to_text)
            .collect::<Vec<_>>()
            .join("\n"),
        other => other.to_string(),
    }
}

fn flexible_text<'de, D: Deserializer<'de>>(deserializer: D) -> Result<String, D::Error> {
    Ok(value_to_text(Value::deserialize(deserializer)?))
}

fn optional_text<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<String>, D::Error> {
    Ok(match Value::deserialize(deserializer)? {
        Value::Null => None,
        other => Some(value_to_text(other)),
    })
}

fn text_list<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Vec<String>, D::Error> {
    Ok(match Value::deserialize(deserializer)? {
        Value::Array(items) => items.into_iter().map(value_to_text).collect(),
        _ => Vec::new(),
    })
}

// A row that is not an array still occupies a table row, it just has no cells.
fn text_rows<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Vec<Vec<String>>, D::Error> {
    Ok(match Value::deserialize(deserializer)? {
        Value::Array(rows) => rows
            .into_iter()
            .map(|row| match row {
                Value::Array(cells) => cells.into_iter().map(value_to_text).collect(),
                _ => Vec::new(),
            })
            .collect(),
        _ => Vec::new(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn body_accepts_lines_and_scalars() {
        let draft: SlideDraft =
            serde_json::from_value(json!({ "title": "T", "body": ["one", "two"] })).unwrap();
        assert_eq!(draft.body, "one\ntwo");

        let draft: SlideDraft = serde_json::from_value(json!({ "body": 42 })).unwrap();
        assert_eq!(draft.body, "42");
        assert_eq!(draft.title, "");
    }

    #[test]
    fn notes_accept_structured_and_edited_forms() {
        let structured: SlideDraft = serde_json::from_value(json!({
            "title": "T",
            "notes": { "talkingPoints": "Talk", "slideTiming": 3 }
        }))
        .unwrap();
        assert_eq!(
            structured.notes_text(),
            "[TALKING POINTS]\nTalk\n\n[INTERACTIVE ELEMENT]\nN/A\n\n[SUGGESTED TIMING: 3]"
        );

        let edited: SlideDraft =
            serde_json::from_value(json!({ "title": "T", "notes": "my own notes" })).unwrap();
        assert_eq!(edited.notes_text(), "my own notes");

        let none: SlideDraft = serde_json::from_value(json!({ "title": "T" })).unwrap();
        assert_eq!(none.notes_text(), NO_SPEAKER_NOTES);
    }

    #[test]
    fn table_rows_tolerate_odd_cells() {
        let table: TableData = serde_json::from_value(json!({
            "headers": ["H1", "H2"],
            "rows": [["a", null], "junk", [1, true]]
        }))
        .unwrap();
        assert_eq!(table.rows, vec![vec!["a".to_string(), "".to_string()], vec![], vec!["1".to_string(), "true".to_string()]]);
        assert_eq!(table.row_count(), 4);
        assert_eq!(table.column_count(), 2);
    }

    #[test]
    fn column_count_falls_back_to_first_row() {
        let table = TableData {
            headers: vec![],
            rows: vec![vec!["a".into(), "b".into(), "c".into()], vec!["d".into()]],
        };
        assert_eq!(table.column_count(), 3);
        assert_eq!(table.row_count(), 2);

        let empty_first = TableData {
            headers: vec![],
            rows: vec![vec![]],
        };
        assert_eq!(empty_first.column_count(), 1);
    }

    #[test]
    fn prepared_trims_body_lines_and_names_untitled_slides() {
        let draft = SlideDraft {
            title: "  ".into(),
            body: "  first  \n\tsecond".into(),
            ..Default::default()
        };
        let prepared = draft.prepared(4);
        assert_eq!(prepared.title, "Slide 4");
        assert_eq!(prepared.body, "first\nsecond");
    }

    #[test]
    fn target_is_derived_from_first_lesson_and_its_unit() {
        let bundle = PreviewBundle {
            slides: vec![],
            source_lesson_ids: vec!["l2".into()],
            source_lesson_data: vec![
                Lesson {
                    id: "l1".into(),
                    title: "Other".into(),
                    ..Default::default()
                },
                Lesson {
                    id: "l2".into(),
                    title: "Photosynthesis".into(),
                    unit_id: Some("u1".into()),
                    pages: vec![],
                },
            ],
            source_unit_data: vec![Unit {
                id: "u1".into(),
                name: "Plants".into(),
            }],
            subject: Subject {
                id: "s".into(),
                title: "Science".into(),
            },
        };

        assert_eq!(
            bundle.materialization_target(),
            MaterializationTarget::new("Presentation: Photosynthesis", "Science", "Plants")
        );
    }

    #[test]
    fn target_defaults_when_context_is_missing() {
        let bundle = PreviewBundle {
            slides: vec![],
            source_lesson_ids: vec!["missing".into()],
            source_lesson_data: vec![],
            source_unit_data: vec![],
            subject: Subject::default(),
        };

        assert_eq!(
            bundle.materialization_target(),
            MaterializationTarget::new(
                "Presentation: Untitled Lesson",
                DEFAULT_SUBJECT_NAME,
                DEFAULT_UNIT_NAME
            )
        );
    }
}
