use std::path::Path;

use chrono::NaiveDateTime;

pub const DELIMITER: &str = "---";
pub const DATE_FORMAT: &str = "%Y-%m-%dT%H:%M:%S";

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FrontMatter {
    pub title: String,
    pub date: NaiveDateTime,
}

impl FrontMatter {
    pub fn new(title: impl Into<String>, date: NaiveDateTime) -> Self {
        Self {
            title: title.into(),
            date,
        }
    }

    /// The block as it is prepended, trailing blank line included.
    pub fn render(&self) -> String {
        format!(
            "{DELIMITER}\ntitle: {}\ndate: {}\ntags: [ ]\n{DELIMITER}\n\n",
            self.title,
            self.date.format(DATE_FORMAT)
        )
    }
}

/// File name of `path` with its last extension removed.
pub fn title_from_path(path: &Path) -> String {
    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    match name.rfind('.') {
        Some(dot) => name[..dot].to_string(),
        None => name,
    }
}

/// Drop the first line, newline included, when it is a level-1 heading (`# `).
pub fn strip_leading_heading(text: &str) -> &str {
    if !text.starts_with("# ") {
        return text;
    }
    match text.find('\n') {
        Some(nl) => &text[nl + 1..],
        None => "",
    }
}

/// Heading-strip `text` and prepend front matter.
pub fn prepare_document(text: &str, front: &FrontMatter) -> String {
    let body = strip_leading_heading(text);
    if body.len() != text.len() {
        tracing::info!("removed leading title heading");
    }
    let mut out = front.render();
    out.push_str(body);
    out
}
