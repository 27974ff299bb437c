use std::path::{Path, PathBuf};

pub type Img2AvifResult<T> = Result<T, Img2AvifError>;

#[derive(thiserror::Error, Debug)]
pub enum Img2AvifError {
    #[error("missing input: '{}' does not exist", .0.display())]
    MissingInput(PathBuf),

    #[error("read error: '{}': {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("write error: '{}': {source}", path.display())]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("encode error: '{}': {msg}", path.display())]
    Encode { path: PathBuf, msg: String },

    #[error("rename error: '{}' -> '{}': {source}", from.display(), to.display())]
    Rename {
        from: PathBuf,
        to: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("precondition failed: {0}")]
    Precondition(String),

    #[error("config error: {0}")]
    Config(String),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl Img2AvifError {
    pub fn missing_input(path: impl Into<PathBuf>) -> Self {
        Self::MissingInput(path.into())
    }

    pub fn read(path: &Path, source: std::io::Error) -> Self {
        Self::Read {
            path: path.to_path_buf(),
            source,
        }
    }

    pub fn write(path: &Path, source: std::io::Error) -> Self {
        Self::Write {
            path: path.to_path_buf(),
            source,
        }
    }

    pub fn encode(path: &Path, msg: impl Into<String>) -> Self {
        Self::Encode {
            path: path.to_path_buf(),
            msg: msg.into(),
        }
    }

    pub fn rename(from: &Path, to: &Path, source: std::io::Error) -> Self {
        Self::Rename {
            from: from.to_path_buf(),
            to: to.to_path_buf(),
            source,
        }
    }

    pub fn precondition(msg: impl Into<String>) -> Self {
        Self::Precondition(msg.into())
    }

    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// The path the failure is attached to, when there is one.
    pub fn path(&self) -> Option<&Path> {
        match self {
            Self::MissingInput(p) => Some(p.as_path()),
            Self::Read { path, .. } | Self::Write { path, .. } | Self::Encode { path, .. } => {
                Some(path.as_path())
            }
            Self::Rename { from, .. } => Some(from.as_path()),
            Self::Precondition(_) | Self::Config(_) | Self::Other(_) => None,
        }
    }
}
