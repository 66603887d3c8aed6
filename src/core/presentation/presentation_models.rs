// Read models for the parts of a Slides API `presentations.get` response the
// materializer looks at. Everything defaults so partial responses still parse.
// See: https://developers.google.com/slides/api/reference/rest/v1/presentations

use serde::Deserialize;

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Presentation {
    pub presentation_id: String,
    pub slides: Vec<Page>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Page {
    pub object_id: String,
    pub page_elements: Vec<PageElement>,
    pub slide_properties: Option<SlideProperties>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SlideProperties {
    pub notes_page: Option<NotesPage>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct NotesPage {
    pub object_id: String,
    pub page_elements: Vec<PageElement>,
    pub notes_properties: Option<NotesProperties>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct NotesProperties {
    pub speaker_notes_object_id: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct PageElement {
    pub object_id: String,
    pub shape: Option<Shape>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Shape {
    pub text: Option<TextContent>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct TextContent {
    pub text_elements: Vec<TextElement>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct TextElement {
    pub text_run: Option<TextRun>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct TextRun {
    pub content: Option<String>,
}

impl PageElement {
    /// Concatenated text runs of a shape. Non-shape elements have no text.
    pub fn plain_text(&self) -> String {
        self.shape
            .as_ref()
            .and_then(|s| s.text.as_ref())
            .map(|text| {
                text.text_elements
                    .iter()
                    .filter_map(|el| el.text_run.as_ref()?.content.as_deref())
                    .collect()
            })
            .unwrap_or_default()
    }

    /// Case-insensitive substring match against the shape's text.
    pub fn contains_tag(&self, tag: &str) -> bool {
        let text = self.plain_text();
        !text.is_empty() && text.to_lowercase().contains(&tag.to_lowercase())
    }
}

impl Page {
    /// First shape whose text carries `tag`, e.g. `{{title}}`.
    pub fn find_shape_by_tag(&self, tag: &str) -> Option<&PageElement> {
        self.page_elements.iter().find(|el| el.contains_tag(tag))
    }

    pub fn notes_page(&self) -> Option<&NotesPage> {
        self.slide_properties.as_ref()?.notes_page.as_ref()
    }

    pub fn notes_page_id(&self) -> Option<&str> {
        self.notes_page()
            .map(|n| n.object_id.as_str())
            .filter(|id| !id.is_empty())
    }

    pub fn speaker_notes_id(&self) -> Option<&str> {
        self.notes_page()?
            .notes_properties
            .as_ref()?
            .speaker_notes_object_id
            .as_deref()
            .filter(|id| !id.is_empty())
    }

    /// Whether the speaker-notes shape is actually on the notes page. The API
    /// may report the id before the shape exists.
    pub fn has_speaker_notes_shape(&self) -> bool {
        match (self.notes_page(), self.speaker_notes_id()) {
            (Some(notes), Some(id)) => notes.page_elements.iter().any(|el| el.object_id == id),
            _ => false,
        }
    }
}
