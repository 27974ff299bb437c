use std::{
    ffi::OsString,
    path::Path,
    process::{Command, Stdio},
};

use crate::{
    error::{Img2AvifError, Img2AvifResult},
    format::SourceFormat,
    settings::EncoderSettings,
};

/// One of the fixed encoder argument layouts, chosen by source format.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Template {
    /// Animated sources: variable frame timing, palette pixel format, infinite loop.
    Animated,
    /// Sources that may carry alpha: flattened over an opaque background first.
    Transparent,
    Generic,
}

impl Template {
    pub fn for_format(format: SourceFormat) -> Self {
        match format {
            SourceFormat::Gif => Self::Animated,
            SourceFormat::Png => Self::Transparent,
            SourceFormat::Jpeg | SourceFormat::Bmp | SourceFormat::Webp | SourceFormat::Avif => {
                Self::Generic
            }
        }
    }
}

/// A single transcode request.
#[derive(Clone, Copy, Debug)]
pub struct EncodeJob<'a> {
    pub input: &'a Path,
    pub output: &'a Path,
    pub template: Template,
    /// Cap on output width; aspect ratio is kept and height forced even.
    pub max_width: Option<u32>,
}

/// The transcode capability. Implementations write the encoded artifact to
/// `job.output` and report any failure against `job.input`.
pub trait Encoder {
    fn encode(&self, job: &EncodeJob<'_>) -> Img2AvifResult<()>;

    /// Whether `encode` can be expected to launch at all.
    fn is_available(&self) -> bool {
        true
    }

    /// Name used in diagnostics.
    fn describe(&self) -> String {
        "encoder".to_string()
    }
}

/// `scale=w=min(iw\,N):h=-2`, or nothing when uncapped.
///
/// The backslash escapes the comma for the encoder's filter-graph parser.
pub fn scale_filter(max_width: Option<u32>) -> Option<String> {
    max_width
        .filter(|w| *w > 0)
        .map(|w| format!("scale=w=min(iw\\,{w}):h=-2"))
}

/// Output size the scale filter yields for a `src_w`x`src_h` source.
///
/// Width is capped at `max_width` (never upscaled). Height follows the aspect
/// ratio and is rounded to the nearest even value, never below 2, matching the
/// encoder's `h=-2` rule. A 481-pixel-high source therefore plans 482, not 480:
/// this is nearest-even, not round-down.
pub fn plan_scaled_size(src_w: u32, src_h: u32, max_width: Option<u32>) -> (u32, u32) {
    let Some(max) = max_width.filter(|w| *w > 0) else {
        return (src_w, src_h);
    };
    if src_w == 0 || src_h == 0 {
        return (src_w, src_h);
    }

    let w = src_w.min(max);
    let num = u64::from(w) * u64::from(src_h);
    let den = u64::from(src_w) * 2;
    let half = (num + den / 2) / den;
    let h = u32::try_from(half * 2).unwrap_or(u32::MAX & !1).max(2);
    (w, h)
}

/// Full argument vector (program excluded) for `job` under `settings`.
pub fn build_args(settings: &EncoderSettings, job: &EncodeJob<'_>) -> Vec<OsString> {
    let scale = scale_filter(job.max_width);
    let crf = settings.crf.to_string();

    let mut args: Vec<OsString> = vec![
        if settings.overwrite { "-y" } else { "-n" }.into(),
        "-loglevel".into(),
        "error".into(),
        "-i".into(),
        job.input.as_os_str().to_owned(),
    ];

    match job.template {
        Template::Animated => {
            if let Some(scale) = &scale {
                args.extend(["-vf".into(), scale.into()]);
            }
            for a in ["-vsync", "vfr", "-pix_fmt", "rgb8", "-loop", "0"] {
                args.push(a.into());
            }
            args.extend(["-c:v".into(), (&settings.codec).into()]);
            args.extend(["-crf".into(), crf.into()]);
        }
        Template::Transparent => {
            let mut graph = "[1][0]scale2ref[bg][img];[bg][img]overlay".to_string();
            if let Some(scale) = &scale {
                graph.push(',');
                graph.push_str(scale);
            }
            args.extend(["-f".into(), "lavfi".into()]);
            args.extend(["-i".into(), format!("color={}:s=1x1", settings.background).into()]);
            args.extend(["-filter_complex".into(), graph.into()]);
            args.extend(["-c:v".into(), (&settings.codec).into()]);
            args.extend(["-pix_fmt".into(), "yuv420p".into()]);
            args.extend(["-crf".into(), crf.into()]);
        }
        Template::Generic => {
            if let Some(scale) = &scale {
                args.extend(["-vf".into(), scale.into()]);
            }
            args.extend(["-c:v".into(), (&settings.codec).into()]);
            args.extend(["-crf".into(), crf.into()]);
        }
    }

    args.push(job.output.as_os_str().to_owned());
    args
}

pub fn is_encoder_available(program: &str) -> bool {
    Command::new(program)
        .arg("-version")
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .status()
        .map(|s| s.success())
        .unwrap_or(false)
}

/// Shells out to the system `ffmpeg` (or whatever `settings.program` names).
#[derive(Clone, Debug, Default)]
pub struct FfmpegEncoder {
    settings: EncoderSettings,
}

impl FfmpegEncoder {
    pub fn new(settings: EncoderSettings) -> Img2AvifResult<Self> {
        settings.validate()?;
        tracing::debug!(settings = %settings.to_json(), "encoder settings");
        Ok(Self { settings })
    }

}

impl Encoder for FfmpegEncoder {
    fn is_available(&self) -> bool {
        is_encoder_available(&self.settings.program)
    }

    fn describe(&self) -> String {
        self.settings.program.clone()
    }

    #[tracing::instrument(skip_all, fields(input = %job.input.display()))]
    fn encode(&self, job: &EncodeJob<'_>) -> Img2AvifResult<()> {
        let args = build_args(&self.settings, job);
        tracing::debug!(program = %self.settings.program, ?args, "running encoder");

        let output = Command::new(&self.settings.program)
            .args(&args)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::piped())
            .output()
            .map_err(|e| {
                Img2AvifError::encode(
                    job.input,
                    format!(
                        "failed to spawn {} (is it installed and on PATH?): {e}",
                        self.settings.program
                    ),
                )
            })?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(Img2AvifError::encode(
                job.input,
                format!(
                    "{} failed ({}): {}",
                    self.settings.program,
                    output.status,
                    stderr.trim()
                ),
            ));
        }

        Ok(())
    }
}
