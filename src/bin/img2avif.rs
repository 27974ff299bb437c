use std::path::{Path, PathBuf};

use anyhow::Context as _;
use clap::{ArgAction, Parser};
use img2avif::{ConvertOptions, EncoderSettings, FfmpegEncoder, ItemResult};

/// Convert images to AVIF, naming each output after the MD5 of its bytes.
#[derive(Parser, Debug)]
#[command(name = "img2avif", version)]
#[command(after_help = "Supported inputs: jpg, jpeg, png, gif, bmp, webp, avif")]
struct Cli {
    /// Image files to convert.
    #[arg(required = true, value_name = "IMAGE")]
    inputs: Vec<PathBuf>,

    /// Maximum output width in pixels (aspect ratio kept, height rounded to even).
    #[arg(short = 'w', long = "max-width", value_name = "PX")]
    max_width: Option<u32>,

    /// Keep transcoded source files instead of deleting them.
    #[arg(long)]
    keep_originals: bool,

    /// Encoder settings JSON (program, codec, crf, background, overwrite).
    #[arg(long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Print what would happen without running the encoder or writing files.
    #[arg(long)]
    dry_run: bool,

    /// More diagnostics (repeatable).
    #[arg(short, long, action = ArgAction::Count)]
    verbose: u8,

    /// Only report errors.
    #[arg(short, long, conflicts_with = "verbose")]
    quiet: bool,
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    img2avif::logging::init(cli.verbose, cli.quiet);

    let settings = EncoderSettings::load(cli.config.as_deref())
        .with_context(|| "load encoder settings")?;
    let encoder = FfmpegEncoder::new(settings)?;
    let opts = ConvertOptions::standalone(cli.max_width).keep_originals(cli.keep_originals);

    if cli.dry_run {
        return dry_run(&cli.inputs, &opts);
    }

    let report = img2avif::convert_batch(&cli.inputs, &opts, &encoder);

    for item in &report.items {
        if let ItemResult::Converted(c) = item {
            println!("{} -> {}", display_name(&c.input), display_name(&c.output));
        }
    }

    let failed = report.failed_count();
    if failed > 0 {
        tracing::warn!(failed, total = report.items.len(), "some images were not converted");
    }

    Ok(())
}

fn dry_run(inputs: &[PathBuf], opts: &ConvertOptions) -> anyhow::Result<()> {
    for input in inputs {
        match img2avif::plan_image(input, opts) {
            Ok(Some(plan)) => {
                let action = match plan.template {
                    Some(t) => format!("transcode ({t:?})"),
                    None => "copy".to_string(),
                };
                let size = match (plan.source_size, plan.target_size) {
                    (Some((sw, sh)), Some((tw, th))) => format!("{sw}x{sh} -> {tw}x{th}"),
                    _ => "size unknown".to_string(),
                };
                println!("{}: {action}, {size}", display_name(input));
            }
            Ok(None) => println!("{}: skip (unsupported)", display_name(input)),
            Err(e) => tracing::error!("{e}"),
        }
    }
    Ok(())
}

fn display_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}
