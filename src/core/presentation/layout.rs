use rand::seq::SliceRandom;

use super::requests::Frame;

/// Where a table replacing the `{{body}}` shape goes.
pub const TABLE_FRAME: Frame = Frame {
    x: 50.0,
    y: 100.0,
    width: 600.0,
    height: 300.0,
};

/// Where a speaker-notes box goes when the notes page has none.
pub const NOTES_FRAME: Frame = Frame {
    x: 35.0,
    y: 60.0,
    width: 550.0,
    height: 400.0,
};

pub const OBJECT_ID_PREFIX: &str = "gen_";
pub const NOTES_ID_PREFIX: &str = "notes_";

const BASE36: &[u8] = b"0123456789abcdefghijklmnopqrstuvwxyz";
const OBJECT_ID_SUFFIX_LEN: usize = 9;

/// Removes markdown emphasis markers and surrounding whitespace.
pub fn strip_emphasis(text: &str) -> String {
    text.replace('*', "").trim().to_string()
}

/// Collapses runs of consecutive newlines into a single newline.
pub fn collapse_newlines(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut previous_newline = false;
    for ch in text.chars() {
        if ch == '\n' {
            if previous_newline {
                continue;
            }
            previous_newline = true;
        } else {
            previous_newline = false;
        }
        out.push(ch);
    }
    out
}

/// Cleans a draft body for insertion into the `{{body}}` shape.
pub fn clean_body(text: &str) -> String {
    collapse_newlines(&strip_emphasis(text))
}

/// Shrinks the font as the body grows so it stays inside the placeholder box.
pub fn body_font_size(text: &str) -> f64 {
    match text.chars().count() {
        n if n > 800 => 14.0,
        n if n > 600 => 16.0,
        n if n > 400 => 18.0,
        _ => 20.0,
    }
}

/// True when the body has at least two lines and every line is a `- ` item.
pub fn is_bullet_list(text: &str) -> bool {
    let lines: Vec<&str> = text.split('\n').map(str::trim).collect();
    lines.len() >= 2 && lines.iter().all(|line| line.starts_with("- "))
}

/// Fresh object id for a created element, e.g. `gen_k3x9a0q2m`.
pub fn generate_object_id() -> String {
    let mut rng = rand::thread_rng();
    let suffix: String = (0..OBJECT_ID_SUFFIX_LEN)
        .filter_map(|_| BASE36.choose(&mut rng).map(|b| *b as char))
        .collect();
    format!("{OBJECT_ID_PREFIX}{suffix}")
}
