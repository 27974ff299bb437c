use std::{fs::File, io::BufReader, path::Path};

use serde::{Deserialize, Serialize};

use crate::error::{Img2AvifError, Img2AvifResult};

/// Knobs for the external encoder. Every field has a default, so a config file
/// only needs to name what it changes.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct EncoderSettings {
    /// Encoder executable, looked up on PATH.
    pub program: String,
    pub codec: String,
    /// Constant rate factor passed as `-crf`.
    pub crf: u8,
    /// Colour transparent sources are flattened onto.
    pub background: String,
    /// Pass `-y` so a stale working file does not block the encoder.
    pub overwrite: bool,
}

impl Default for EncoderSettings {
    fn default() -> Self {
        Self {
            program: "ffmpeg".to_string(),
            codec: "libaom-av1".to_string(),
            crf: 32,
            background: "white".to_string(),
            overwrite: true,
        }
    }
}

impl EncoderSettings {
    pub fn validate(&self) -> Img2AvifResult<()> {
        if self.program.trim().is_empty() {
            return Err(Img2AvifError::config("encoder program must be non-empty"));
        }
        if self.codec.trim().is_empty() {
            return Err(Img2AvifError::config("encoder codec must be non-empty"));
        }
        if self.crf > 63 {
            return Err(Img2AvifError::config(format!(
                "crf must be in 0..=63, got {}",
                self.crf
            )));
        }
        if self.background.trim().is_empty() {
            return Err(Img2AvifError::config("background colour must be non-empty"));
        }
        Ok(())
    }

    pub fn from_path(path: &Path) -> Img2AvifResult<Self> {
        let f = File::open(path).map_err(|e| Img2AvifError::read(path, e))?;
        let settings: Self = serde_json::from_reader(BufReader::new(f)).map_err(|e| {
            Img2AvifError::config(format!("parse '{}': {e}", path.display()))
        })?;
        settings.validate()?;
        Ok(settings)
    }

    /// Compact JSON of the effective settings, for diagnostics.
    pub fn to_json(&self) -> String {
        serde_json::to_string(self).unwrap_or_else(|e| format!("<unserializable: {e}>"))
    }

    /// Defaults when `path` is `None`, otherwise the parsed file.
    pub fn load(path: Option<&Path>) -> Img2AvifResult<Self> {
        match path {
            Some(p) => Self::from_path(p),
            None => Ok(Self::default()),
        }
    }
}
