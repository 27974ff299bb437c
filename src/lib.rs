#![forbid(unsafe_code)]

pub mod convert;
pub mod encode_ffmpeg;
pub mod error;
pub mod format;
pub mod front_matter;
pub mod logging;
pub mod naming;
pub mod post;
pub mod rewrite;
pub mod settings;

pub use convert::{
    BatchReport, ConvertOptions, Conversion, ItemResult, Outcome, Plan, convert_batch,
    convert_image, needs_encoder, plan_image, process_path,
};
pub use encode_ffmpeg::{
    EncodeJob, Encoder, FfmpegEncoder, Template, build_args, is_encoder_available,
    plan_scaled_size, scale_filter,
};
pub use error::{Img2AvifError, Img2AvifResult};
pub use format::{AllowList, SourceFormat};
pub use front_matter::{FrontMatter, prepare_document, strip_leading_heading};
pub use naming::{CanonicalName, TARGET_EXT, canonical_name};
pub use post::{PostOptions, PostReport, find_single_markdown, prepare_post, prepare_post_in_dir};
pub use rewrite::{IMAGES_DIR, NameMapping, find_image_refs, rewrite_references};
pub use settings::EncoderSettings;
