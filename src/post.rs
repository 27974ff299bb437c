//! Document mode: turn the single Markdown file in a directory into a post.
//!
//! The document gets front matter, every supported file under `images/` is
//! converted to its canonical AVIF name, and the document's image references
//! are rewritten to match. A directory with zero or several Markdown files is
//! rejected before anything is modified.

use std::path::{Path, PathBuf};

use chrono::NaiveDateTime;

use crate::{
    convert::{BatchReport, ConvertOptions, convert_batch},
    encode_ffmpeg::Encoder,
    error::{Img2AvifError, Img2AvifResult},
    front_matter::{FrontMatter, prepare_document, title_from_path},
    rewrite::{IMAGES_DIR, rewrite_references},
};

#[derive(Clone, Debug)]
pub struct PostOptions {
    pub convert: ConvertOptions,
    /// Timestamp written into the front matter.
    pub now: NaiveDateTime,
}

impl PostOptions {
    pub fn new(max_width: Option<u32>) -> Self {
        Self {
            convert: ConvertOptions::document(max_width),
            now: chrono::Local::now().naive_local(),
        }
    }
}

#[derive(Debug)]
pub struct PostReport {
    pub document: PathBuf,
    pub images: BatchReport,
}

/// The one `*.md` file directly inside `dir`.
pub fn find_single_markdown(dir: &Path) -> Img2AvifResult<PathBuf> {
    let entries = std::fs::read_dir(dir).map_err(|e| Img2AvifError::read(dir, e))?;

    let mut found = Vec::new();
    for entry in entries {
        let path = entry.map_err(|e| Img2AvifError::read(dir, e))?.path();
        if path.is_file() && path.extension().and_then(|e| e.to_str()) == Some("md") {
            found.push(path);
        }
    }
    found.sort();

    match found.len() {
        0 => Err(Img2AvifError::precondition(format!(
            "no Markdown file found in '{}'",
            dir.display()
        ))),
        1 => Ok(found.remove(0)),
        n => {
            let names: Vec<_> = found
                .iter()
                .filter_map(|p| p.file_name())
                .map(|n| n.to_string_lossy())
                .collect();
            Err(Img2AvifError::precondition(format!(
                "found {n} Markdown files in '{}' ({}); keep exactly one",
                dir.display(),
                names.join(", ")
            )))
        }
    }
}

/// Regular files directly under `images_dir`, sorted by path.
pub fn list_images(images_dir: &Path) -> Img2AvifResult<Vec<PathBuf>> {
    let entries = std::fs::read_dir(images_dir).map_err(|e| Img2AvifError::read(images_dir, e))?;
    let mut files = Vec::new();
    for entry in entries {
        let path = entry.map_err(|e| Img2AvifError::read(images_dir, e))?.path();
        if path.is_file() {
            files.push(path);
        }
    }
    files.sort();
    Ok(files)
}

/// Prepare `document` in place.
#[tracing::instrument(skip_all, fields(document = %document.display()))]
pub fn prepare_post(
    document: &Path,
    opts: &PostOptions,
    encoder: &dyn Encoder,
) -> Img2AvifResult<PostReport> {
    let text = std::fs::read_to_string(document).map_err(|e| Img2AvifError::read(document, e))?;

    let front = FrontMatter::new(title_from_path(document), opts.now);
    let content = prepare_document(&text, &front);

    let images_dir = document
        .parent()
        .unwrap_or_else(|| Path::new(""))
        .join(IMAGES_DIR);

    let images = if images_dir.is_dir() {
        let files = list_images(&images_dir)?;
        if files.is_empty() {
            tracing::info!(dir = %images_dir.display(), "no images to process");
        } else {
            tracing::info!(count = files.len(), "processing images");
        }
        convert_batch(&files, &opts.convert, encoder)
    } else {
        tracing::info!(dir = %images_dir.display(), "no images directory, skipping image processing");
        BatchReport::default()
    };

    let content = rewrite_references(&content, &images.mapping());

    std::fs::write(document, content).map_err(|e| Img2AvifError::write(document, e))?;
    tracing::info!("saved");

    Ok(PostReport {
        document: document.to_path_buf(),
        images,
    })
}

/// Locate the single Markdown file in `dir` and prepare it.
pub fn prepare_post_in_dir(
    dir: &Path,
    opts: &PostOptions,
    encoder: &dyn Encoder,
) -> Img2AvifResult<PostReport> {
    let document = find_single_markdown(dir)?;
    tracing::info!(document = %document.display(), "found document");
    prepare_post(&document, opts, encoder)
}
