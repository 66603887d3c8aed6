use tracing::debug;

use super::layout::{
    body_font_size, clean_body, is_bullet_list, strip_emphasis, NOTES_FRAME, NOTES_ID_PREFIX,
    TABLE_FRAME,
};
use super::presentation_models::Page;
use super::requests::{Request, TableCellLocation};
use crate::core::slides::{SlideDraft, TableData};

pub const TITLE_TAG: &str = "{{title}}";
pub const BODY_TAG: &str = "{{body}}";

/// Requests that bring a freshly cloned template to `draft_count` slides.
/// Deletions and duplications go out as separate batches, deletions first.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct SlideCountPlan {
    pub deletions: Vec<Request>,
    pub duplications: Vec<Request>,
}

impl SlideCountPlan {
    pub fn is_empty(&self) -> bool {
        self.deletions.is_empty() && self.duplications.is_empty()
    }
}

/// Keeps the first (master) slide, drops the rest, then duplicates the master
/// until there is one slide per draft.
pub fn plan_slide_count(slides: &[Page], draft_count: usize) -> SlideCountPlan {
    let Some(master) = slides.first() else {
        return SlideCountPlan::default();
    };
    SlideCountPlan {
        deletions: slides[1..]
            .iter()
            .map(|slide| Request::delete_object(&slide.object_id))
            .collect(),
        duplications: (1..draft_count)
            .map(|_| Request::duplicate_object(&master.object_id))
            .collect(),
    }
}

/// Pools the population requests for every (slide, draft) pair in order.
/// Slides without a matching draft are left untouched.
pub fn plan_deck_content<F>(slides: &[Page], drafts: &[SlideDraft], mut next_id: F) -> Vec<Request>
where
    F: FnMut() -> String,
{
    slides
        .iter()
        .zip(drafts)
        .flat_map(|(slide, draft)| plan_slide_content(slide, draft, &mut next_id))
        .collect()
}

pub fn plan_slide_content<F>(slide: &Page, draft: &SlideDraft, next_id: &mut F) -> Vec<Request>
where
    F: FnMut() -> String,
{
    let mut requests = Vec::new();
    let title_shape = slide.find_shape_by_tag(TITLE_TAG);
    let body_shape = slide.find_shape_by_tag(BODY_TAG);

    if let Some(title) = title_shape {
        requests.push(Request::delete_all_text(&title.object_id));
        push_insert(&mut requests, Request::insert_text(&title.object_id, strip_emphasis(&draft.title)));
    }

    match (body_shape, draft.table_data.as_ref().filter(|_| draft.has_table_rows())) {
        (Some(body), Some(table)) => {
            requests.push(Request::delete_object(&body.object_id));
            plan_table(&mut requests, &slide.object_id, table, next_id());
        }
        (Some(body), None) => {
            let text = clean_body(&draft.body);
            requests.push(Request::delete_all_text(&body.object_id));
            if !text.is_empty() {
                requests.push(Request::insert_text(&body.object_id, text.as_str()));
                if is_bullet_list(&text) {
                    requests.push(Request::bullet_list(&body.object_id));
                }
                requests.push(Request::font_size(&body.object_id, body_font_size(&text)));
            }
        }
        (None, _) => debug!(slide = %slide.object_id, "No body placeholder on slide"),
    }

    plan_speaker_notes(&mut requests, slide, &draft.notes_text(), next_id);
    requests
}

fn plan_table(requests: &mut Vec<Request>, page_id: &str, table: &TableData, table_id: String) {
    let columns = table.column_count();
    requests.push(Request::create_table(
        &table_id,
        page_id,
        TABLE_FRAME,
        table.row_count(),
        columns,
    ));

    let mut fill_cell = |row: usize, column: usize, text: &str, header: bool| {
        let text = text.trim();
        if text.is_empty() || column >= columns {
            return;
        }
        let location = TableCellLocation::new(row, column);
        requests.push(Request::insert_cell_text(&table_id, location, text));
        if header {
            requests.push(Request::bold_cell(&table_id, location));
            requests.push(Request::shade_cell(&table_id, location));
        }
    };

    for (column, header) in table.headers.iter().enumerate() {
        fill_cell(0, column, header, true);
    }
    let offset = usize::from(table.has_headers());
    for (row, cells) in table.rows.iter().enumerate() {
        for (column, cell) in cells.iter().enumerate() {
            fill_cell(row + offset, column, cell, false);
        }
    }
}

fn plan_speaker_notes<F>(requests: &mut Vec<Request>, slide: &Page, notes: &str, next_id: &mut F)
where
    F: FnMut() -> String,
{
    let Some(notes_page_id) = slide.notes_page_id() else {
        return;
    };
    if notes.is_empty() {
        return;
    }

    let shape_id = match slide.speaker_notes_id() {
        Some(id) => {
            // The id can be reported before the shape exists; then there is nothing to clear.
            if slide.has_speaker_notes_shape() {
                requests.push(Request::delete_all_text(id));
            }
            id.to_string()
        }
        None => {
            let id = format!("{NOTES_ID_PREFIX}{}", next_id());
            requests.push(Request::create_text_box(&id, notes_page_id, NOTES_FRAME));
            requests.push(Request::mark_as_body_placeholder(&id));
            id
        }
    };
    requests.push(Request::insert_text_at_start(shape_id, notes));
}

fn push_insert(requests: &mut Vec<Request>, request: Request) {
    match &request {
        Request::InsertText { text, .. } if text.is_empty() => {}
        _ => requests.push(request),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::slides::{NotesContent, SpeakerNotes};
    use serde_json::json;

    fn template_slide(id: &str, with_notes_shape: bool) -> Page {
        let notes_elements = if with_notes_shape {
            json!([{ "objectId": format!("{id}_speaker"), "shape": {} }])
        } else {
            json!([])
        };
        serde_json::from_value(json!({
            "objectId": id,
            "pageElements": [
                { "objectId": format!("{id}_title"), "shape": { "text": { "textElements": [
                    { "textRun": { "content": "{{title}}\n" } }
                ] } } },
                { "objectId": format!("{id}_body"), "shape": { "text": { "textElements": [
                    { "textRun": { "content": "{{body}}\n" } }
                ] } } }
            ],
            "slideProperties": { "notesPage": {
                "objectId": format!("{id}_notes"),
                "notesProperties": { "speakerNotesObjectId": format!("{id}_speaker") },
                "pageElements": notes_elements
            } }
        }))
        .unwrap()
    }

    fn counter() -> impl FnMut() -> String {
        let mut n = 0;
        move || {
            n += 1;
            format!("gen_{n}")
        }
    }

    fn draft(title: &str, body: &str) -> SlideDraft {
        SlideDraft {
            title: title.to_string(),
            body: body.to_string(),
            table_data: None,
            notes: None,
        }
    }

    #[test]
    fn slide_count_deletes_extras_then_duplicates_master() {
        let slides = vec![
            template_slide("master", true),
            template_slide("extra_1", true),
            template_slide("extra_2", true),
        ];
        let plan = plan_slide_count(&slides, 4);
        assert_eq!(
            plan.deletions,
            vec![Request::delete_object("extra_1"), Request::delete_object("extra_2")]
        );
        assert_eq!(plan.duplications.len(), 3);
        assert!(plan.duplications.iter().all(|r| r.object_id() == "master"));

        assert!(plan_slide_count(&slides[..1], 1).is_empty());
        assert!(plan_slide_count(&[], 5).is_empty());
    }

    #[test]
    fn fills_title_and_body_with_bullets_and_font_size() {
        let slide = template_slide("s1", true);
        let requests =
            plan_slide_content(&slide, &draft("**Cells**", "- A\n\n- B\n- C"), &mut counter());

        assert_eq!(requests[0], Request::delete_all_text("s1_title"));
        assert_eq!(requests[1], Request::insert_text("s1_title", "Cells"));
        assert_eq!(requests[2], Request::delete_all_text("s1_body"));
        assert_eq!(requests[3], Request::insert_text("s1_body", "- A\n- B\n- C"));
        assert_eq!(requests[4], Request::bullet_list("s1_body"));
        assert_eq!(requests[5], Request::font_size("s1_body", 20.0));
    }

    #[test]
    fn mixed_body_gets_no_bullets() {
        let slide = template_slide("s1", true);
        let requests = plan_slide_content(&slide, &draft("T", "A\n- B"), &mut counter());
        assert!(!requests
            .iter()
            .any(|r| matches!(r, Request::CreateParagraphBullets { .. })));
    }

    #[test]
    fn long_body_shrinks_font() {
        let slide = template_slide("s1", true);
        let requests = plan_slide_content(&slide, &draft("T", &"y".repeat(650)), &mut counter());
        assert!(requests.contains(&Request::font_size("s1_body", 16.0)));
    }

    #[test]
    fn empty_body_only_clears_text() {
        let slide = template_slide("s1", true);
        let requests = plan_slide_content(&slide, &draft("T", "  "), &mut counter());
        assert!(requests.contains(&Request::delete_all_text("s1_body")));
        assert!(!requests.iter().any(|r| matches!(
            r,
            Request::InsertText { object_id, .. } if object_id == "s1_body"
        )));
    }

    #[test]
    fn uneven_table_rows_are_tolerated() {
        let slide = template_slide("s1", true);
        let mut d = draft("Compare", "ignored");
        d.table_data = Some(TableData {
            headers: vec!["H1".into(), "H2".into()],
            rows: vec![vec!["a".into(), "b".into()], vec!["c".into()]],
        });

        let requests = plan_slide_content(&slide, &d, &mut counter());

        assert!(requests.contains(&Request::delete_object("s1_body")));
        assert!(requests.iter().any(|r| matches!(
            r,
            Request::CreateTable { object_id, rows: 3, columns: 2, .. } if object_id == "gen_1"
        )));
        let cells: Vec<(usize, usize, &str)> = requests
            .iter()
            .filter_map(|r| match r {
                Request::InsertText {
                    cell_location: Some(loc),
                    text,
                    ..
                } => Some((loc.row_index, loc.column_index, text.as_str())),
                _ => None,
            })
            .collect();
        assert_eq!(
            cells,
            vec![(0, 0, "H1"), (0, 1, "H2"), (1, 0, "a"), (1, 1, "b"), (2, 0, "c")]
        );
        let header_styles = requests
            .iter()
            .filter(|r| matches!(r, Request::UpdateTableCellProperties { .. }))
            .count();
        assert_eq!(header_styles, 2);
    }

    #[test]
    fn table_without_headers_uses_first_row_width_and_skips_overflow() {
        let slide = template_slide("s1", true);
        let mut d = draft("T", "");
        d.table_data = Some(TableData {
            headers: vec![],
            rows: vec![vec!["a".into()], vec!["b".into(), "overflow".into()]],
        });
        let requests = plan_slide_content(&slide, &d, &mut counter());
        assert!(requests
            .iter()
            .any(|r| matches!(r, Request::CreateTable { rows: 2, columns: 1, .. })));
        assert!(!requests.iter().any(|r| matches!(
            r,
            Request::InsertText { text, .. } if text == "overflow"
        )));
    }

    #[test]
    fn header_only_table_keeps_the_text_body() {
        let slide = template_slide("s1", true);
        let mut d = draft("T", "Plain body");
        d.table_data = Some(TableData {
            headers: vec!["H1".into()],
            rows: vec![],
        });
        let requests = plan_slide_content(&slide, &d, &mut counter());
        assert!(!requests.iter().any(|r| matches!(r, Request::CreateTable { .. })));
        assert!(requests.contains(&Request::insert_text("s1_body", "Plain body")));
    }

    #[test]
    fn table_without_body_placeholder_is_not_created() {
        let mut slide = template_slide("s1", true);
        slide.page_elements.truncate(1);
        let mut d = draft("T", "");
        d.table_data = Some(TableData {
            headers: vec![],
            rows: vec![vec!["a".into()]],
        });
        let requests = plan_slide_content(&slide, &d, &mut counter());
        assert!(!requests.iter().any(|r| matches!(r, Request::CreateTable { .. })));
    }

    #[test]
    fn existing_notes_shape_is_replaced() {
        let slide = template_slide("s1", true);
        let mut d = draft("T", "b");
        d.notes = Some(NotesContent::Structured(SpeakerNotes {
            talking_points: Some("Say hi".into()),
            interactive_element: None,
            slide_timing: Some("2 min".into()),
        }));
        let requests = plan_slide_content(&slide, &d, &mut counter());
        let tail = &requests[requests.len() - 2..];
        assert_eq!(tail[0], Request::delete_all_text("s1_speaker"));
        assert_eq!(
            tail[1],
            Request::insert_text_at_start(
                "s1_speaker",
                "[TALKING POINTS]\nSay hi\n\n[INTERACTIVE ELEMENT]\nN/A\n\n[SUGGESTED TIMING: 2 min]"
            )
        );
    }

    #[test]
    fn reported_but_absent_notes_shape_is_written_without_clearing() {
        let slide = template_slide("s1", false);
        let requests = plan_slide_content(&slide, &draft("T", "b"), &mut counter());
        assert!(!requests.contains(&Request::delete_all_text("s1_speaker")));
        assert_eq!(
            requests.last(),
            Some(&Request::insert_text_at_start(
                "s1_speaker",
                "No speaker notes available."
            ))
        );
    }

    #[test]
    fn missing_notes_shape_is_created_as_body_placeholder() {
        let mut slide = template_slide("s1", false);
        if let Some(notes) = slide
            .slide_properties
            .as_mut()
            .and_then(|p| p.notes_page.as_mut())
        {
            notes.notes_properties = None;
        }
        let mut d = draft("T", "b");
        d.notes = Some(NotesContent::Edited("My own notes".into()));
        let requests = plan_slide_content(&slide, &d, &mut counter());
        let tail = &requests[requests.len() - 3..];
        assert_eq!(tail[0], Request::create_text_box("notes_gen_1", "s1_notes", NOTES_FRAME));
        assert_eq!(tail[1], Request::mark_as_body_placeholder("notes_gen_1"));
        assert_eq!(tail[2], Request::insert_text_at_start("notes_gen_1", "My own notes"));
    }

    #[test]
    fn deck_content_pairs_slides_with_drafts_in_order() {
        let slides = vec![template_slide("s1", true), template_slide("s2", true)];
        let drafts = vec![draft("One", "a"), draft("Two", "b"), draft("Three", "c")];
        let requests = plan_deck_content(&slides, &drafts, counter());
        assert!(requests.contains(&Request::insert_text("s1_title", "One")));
        assert!(requests.contains(&Request::insert_text("s2_title", "Two")));
        assert!(!requests.iter().any(|r| matches!(
            r,
            Request::InsertText { text, .. } if text == "Three"
        )));
    }
}
