use std::path::PathBuf;

use anyhow::Context as _;
use clap::{ArgAction, Parser};
use img2avif::{EncoderSettings, FfmpegEncoder, ItemResult, PostOptions};

/// Turn the single Markdown file in a directory into a blog post: add front
/// matter, convert `images/` to content-addressed AVIF files and rewrite the
/// image links to match.
#[derive(Parser, Debug)]
#[command(name = "wiz2blog", version)]
struct Cli {
    /// Directory holding exactly one `.md` file and an optional `images/` directory.
    #[arg(long, default_value = ".")]
    dir: PathBuf,

    /// Maximum image width in pixels (aspect ratio kept, height rounded to even).
    #[arg(short = 'w', long = "max-width", value_name = "PX")]
    max_width: Option<u32>,

    /// Encoder settings JSON (program, codec, crf, background, overwrite).
    #[arg(long, value_name = "FILE")]
    config: Option<PathBuf>,

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
    let opts = PostOptions::new(cli.max_width);

    let report = img2avif::prepare_post_in_dir(&cli.dir, &opts, &encoder)
        .with_context(|| format!("prepare post in '{}'", cli.dir.display()))?;

    for item in &report.images.items {
        if let ItemResult::Converted(c) = item {
            println!("{} -> {}", c.input.display(), c.output.display());
        }
    }

    let failed = report.images.failed_count();
    if failed > 0 {
        tracing::warn!(failed, "some images were not converted; their links are unchanged");
    }
    tracing::info!(document = %report.document.display(), "done");
    Ok(())
}
