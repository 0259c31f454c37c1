use std::path::PathBuf;

pub const DEFAULT_MAX_FILE_SIZE_MB: f64 = 50.0;

/// Variant name of the reference snapshot compiled into the crate.
pub const BUILTIN_VARIANT: &str = "builtin";

const BYTES_PER_MB: f64 = 1024.0 * 1024.0;

/// User-facing settings shared by every front end.
#[derive(Debug, Clone, PartialEq)]
pub struct Settings {
    /// Files above this size are never read for content matching.
    pub max_file_size_mb: f64,
    /// Selects which reference snapshot to load (`<reference_dir>/<variant>.json`).
    pub variant: String,
    pub reference_dir: Option<PathBuf>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            max_file_size_mb: DEFAULT_MAX_FILE_SIZE_MB,
            variant: BUILTIN_VARIANT.to_string(),
            reference_dir: None,
        }
    }
}

impl Settings {
    pub fn max_file_size_bytes(&self) -> u64 {
        (self.max_file_size_mb.max(0.0) * BYTES_PER_MB) as u64
    }

    /// Human-readable limit for messages, e.g. `50` or `0.5`.
    pub fn max_file_size_label(&self) -> String {
        if self.max_file_size_mb.fract() == 0.0 {
            format!("{}", self.max_file_size_mb as u64)
        } else {
            format!("{}", self.max_file_size_mb)
        }
    }
}
