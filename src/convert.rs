//! Per-image conversion and the continue-on-error batch driver.
//!
//! Sources already in the target format are never transcoded: their bytes are
//! named as-is and a sibling copy is written under the canonical name, leaving
//! the source untouched. Everything else goes through the encoder into a
//! `temp_` working file, which is renamed to its canonical name; the source is
//! then removed unless the caller asked to keep it.

use std::path::{Path, PathBuf};

use crate::{
    encode_ffmpeg::{EncodeJob, Encoder, Template, plan_scaled_size},
    error::{Img2AvifError, Img2AvifResult},
    format::{AllowList, SourceFormat},
    naming::{CanonicalName, TARGET_EXT, canonical_name},
    rewrite::NameMapping,
};

pub const TEMP_PREFIX: &str = "temp_";

#[derive(Clone, Debug)]
pub struct ConvertOptions {
    pub max_width: Option<u32>,
    pub allow: AllowList,
    /// Delete a transcoded source once its canonical file is in place.
    pub remove_transcoded_source: bool,
}

impl ConvertOptions {
    pub fn standalone(max_width: Option<u32>) -> Self {
        Self {
            max_width: max_width.filter(|w| *w > 0),
            allow: AllowList::Standalone,
            remove_transcoded_source: true,
        }
    }

    pub fn document(max_width: Option<u32>) -> Self {
        Self {
            max_width: max_width.filter(|w| *w > 0),
            allow: AllowList::Document,
            remove_transcoded_source: true,
        }
    }

    pub fn keep_originals(mut self, keep: bool) -> Self {
        self.remove_transcoded_source = !keep;
        self
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Outcome {
    /// Target-format source duplicated under its canonical name.
    Copied,
    /// Source already carried its canonical name; nothing touched.
    AlreadyCanonical,
    Transcoded,
}

#[derive(Clone, Debug)]
pub struct Conversion {
    pub input: PathBuf,
    pub output: PathBuf,
    pub name: CanonicalName,
    pub outcome: Outcome,
}

#[derive(Debug)]
pub enum ItemResult {
    Converted(Conversion),
    Skipped { path: PathBuf, reason: String },
    Failed { path: PathBuf, error: Img2AvifError },
}

/// Everything that happened to one batch, in processing order.
#[derive(Debug, Default)]
pub struct BatchReport {
    pub items: Vec<ItemResult>,
    /// Some input needed transcoding but the encoder could not be launched.
    pub encoder_missing: bool,
}

impl BatchReport {
    pub fn conversions(&self) -> impl Iterator<Item = &Conversion> {
        self.items.iter().filter_map(|i| match i {
            ItemResult::Converted(c) => Some(c),
            _ => None,
        })
    }

    pub fn failed_count(&self) -> usize {
        self.items
            .iter()
            .filter(|i| matches!(i, ItemResult::Failed { .. }))
            .count()
    }

    pub fn skipped_count(&self) -> usize {
        self.items
            .iter()
            .filter(|i| matches!(i, ItemResult::Skipped { .. }))
            .count()
    }

    /// Original file name -> canonical name for every successful item.
    pub fn mapping(&self) -> NameMapping {
        let mut mapping = NameMapping::new();
        for c in self.conversions() {
            if let Some(orig) = file_name_str(&c.input) {
                mapping.insert(orig, c.name.clone());
            }
        }
        mapping
    }
}

fn file_name_str(path: &Path) -> Option<&str> {
    path.file_name().and_then(|n| n.to_str())
}

fn sibling(input: &Path, name: &str) -> PathBuf {
    input.parent().unwrap_or_else(|| Path::new("")).join(name)
}

/// `<dir>/temp_<file name>.avif`
pub fn temp_path_for(input: &Path) -> PathBuf {
    let base = input
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    sibling(input, &format!("{TEMP_PREFIX}{base}.{TARGET_EXT}"))
}

/// Convert one already-classified image.
pub fn convert_image(
    input: &Path,
    format: SourceFormat,
    opts: &ConvertOptions,
    encoder: &dyn Encoder,
) -> Img2AvifResult<Conversion> {
    if !input.exists() {
        return Err(Img2AvifError::missing_input(input));
    }

    if format.is_target() {
        let bytes = std::fs::read(input).map_err(|e| Img2AvifError::read(input, e))?;
        let name = canonical_name(&bytes);
        let output = sibling(input, name.as_str());

        if name.names(input) {
            tracing::debug!(path = %input.display(), "already canonically named");
            return Ok(Conversion {
                input: input.to_path_buf(),
                output,
                name,
                outcome: Outcome::AlreadyCanonical,
            });
        }

        std::fs::write(&output, &bytes).map_err(|e| Img2AvifError::write(&output, e))?;
        return Ok(Conversion {
            input: input.to_path_buf(),
            output,
            name,
            outcome: Outcome::Copied,
        });
    }

    let temp = temp_path_for(input);
    // A failed encode leaves `temp` behind for inspection.
    encoder.encode(&EncodeJob {
        input,
        output: &temp,
        template: Template::for_format(format),
        max_width: opts.max_width,
    })?;

    let bytes = std::fs::read(&temp).map_err(|e| Img2AvifError::read(&temp, e))?;
    let name = canonical_name(&bytes);
    let output = sibling(input, name.as_str());

    if temp != output {
        std::fs::rename(&temp, &output).map_err(|e| Img2AvifError::rename(&temp, &output, e))?;
    }

    if opts.remove_transcoded_source && input != output {
        tracing::debug!(path = %input.display(), "removing transcoded source");
        std::fs::remove_file(input).map_err(|e| Img2AvifError::write(input, e))?;
    }

    Ok(Conversion {
        input: input.to_path_buf(),
        output,
        name,
        outcome: Outcome::Transcoded,
    })
}

/// Classify, then convert or skip, one path. Never fails: every problem is
/// folded into the returned [`ItemResult`].
pub fn process_path(input: &Path, opts: &ConvertOptions, encoder: &dyn Encoder) -> ItemResult {
    if !input.exists() {
        let error = Img2AvifError::missing_input(input);
        tracing::error!("{error}");
        return ItemResult::Failed {
            path: input.to_path_buf(),
            error,
        };
    }

    let Some(format) = opts.allow.classify(input) else {
        tracing::warn!(path = %input.display(), "skipping unsupported file");
        return ItemResult::Skipped {
            path: input.to_path_buf(),
            reason: "unsupported file extension".to_string(),
        };
    };

    match convert_image(input, format, opts, encoder) {
        Ok(c) => {
            tracing::info!(
                input = %c.input.display(),
                output = %c.output.display(),
                outcome = ?c.outcome,
                "converted"
            );
            ItemResult::Converted(c)
        }
        Err(error) => {
            tracing::error!("failed to convert '{}': {error}", input.display());
            ItemResult::Failed {
                path: input.to_path_buf(),
                error,
            }
        }
    }
}

/// True when at least one accepted input is not already in the target format.
pub fn needs_encoder<P: AsRef<Path>>(inputs: &[P], allow: AllowList) -> bool {
    inputs
        .iter()
        .any(|p| allow.classify(p.as_ref()).is_some_and(|f| !f.is_target()))
}

/// Sequentially process `inputs`; a failing item never stops the batch.
///
/// A missing encoder is reported once up front; target-format inputs still
/// go through and the rest fail individually.
pub fn convert_batch<P: AsRef<Path>>(
    inputs: &[P],
    opts: &ConvertOptions,
    encoder: &dyn Encoder,
) -> BatchReport {
    let mut report = BatchReport::default();
    if needs_encoder(inputs, opts.allow) && !encoder.is_available() {
        tracing::warn!(
            encoder = %encoder.describe(),
            "encoder not found on PATH; non-AVIF inputs will fail"
        );
        report.encoder_missing = true;
    }
    for input in inputs {
        report
            .items
            .push(process_path(input.as_ref(), opts, encoder));
    }
    report
}

/// What a conversion would do, without touching anything.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Plan {
    pub input: PathBuf,
    pub format: SourceFormat,
    /// `None` for pass-through copies.
    pub template: Option<Template>,
    pub source_size: Option<(u32, u32)>,
    pub target_size: Option<(u32, u32)>,
}

pub fn plan_image(input: &Path, opts: &ConvertOptions) -> Img2AvifResult<Option<Plan>> {
    if !input.exists() {
        return Err(Img2AvifError::missing_input(input));
    }
    let Some(format) = opts.allow.classify(input) else {
        return Ok(None);
    };

    let source_size = image::image_dimensions(input).ok();
    let (template, target_size) = if format.is_target() {
        (None, source_size)
    } else {
        (
            Some(Template::for_format(format)),
            source_size.map(|(w, h)| plan_scaled_size(w, h, opts.max_width)),
        )
    };

    Ok(Some(Plan {
        input: input.to_path_buf(),
        format,
        template,
        source_size,
        target_size,
    }))
}
