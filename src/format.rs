use std::path::Path;

/// Source formats the converters know how to handle.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum SourceFormat {
    Jpeg,
    Png,
    Gif,
    Bmp,
    Webp,
    Avif,
}

impl SourceFormat {
    /// Classify by lowercase extension. `None` for anything unsupported.
    pub fn from_extension(ext: &str) -> Option<Self> {
        match ext.to_ascii_lowercase().as_str() {
            "jpg" | "jpeg" => Some(Self::Jpeg),
            "png" => Some(Self::Png),
            "gif" => Some(Self::Gif),
            "bmp" => Some(Self::Bmp),
            "webp" => Some(Self::Webp),
            "avif" => Some(Self::Avif),
            _ => None,
        }
    }

    pub fn from_path(path: &Path) -> Option<Self> {
        path.extension()
            .and_then(|e| e.to_str())
            .and_then(Self::from_extension)
    }

    /// Already in the target format; never transcoded.
    pub fn is_target(self) -> bool {
        self == Self::Avif
    }
}

/// Which extensions a given tool accepts.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum AllowList {
    /// jpg, jpeg, png, gif, bmp, webp, avif
    Standalone,
    /// jpg, jpeg, png, gif, avif
    Document,
}

impl AllowList {
    pub fn accepts(self, format: SourceFormat) -> bool {
        match self {
            Self::Standalone => true,
            Self::Document => !matches!(format, SourceFormat::Bmp | SourceFormat::Webp),
        }
    }

    /// Classify `path` and apply the allow-list in one step.
    pub fn classify(self, path: &Path) -> Option<SourceFormat> {
        SourceFormat::from_path(path).filter(|f| self.accepts(*f))
    }
}
