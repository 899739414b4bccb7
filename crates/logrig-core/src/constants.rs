//! Constants and default values for logrig

use std::path::{Path, PathBuf};

/// Default minimum level
pub const DEFAULT_LEVEL: &str = "INFO";

/// Default rotation expression
pub const DEFAULT_ROTATION: &str = "20 MB";

/// Default retention expression
pub const DEFAULT_RETENTION: &str = "30 days";

/// Default line format
pub const DEFAULT_FORMAT: &str = "{time} | {level} | {name} | {message}";

/// Active file name when no preset or custom naming applies
pub const DEFAULT_ACTIVE_NAME: &str = "[{name}]latest.temp.log";

/// Rotated file name when no preset or custom naming applies
pub const DEFAULT_ROTATED_NAME: &str = "[{name}]{timestamp}.log";

/// Extension appended to gzip-compressed rotated files
pub const GZIP_EXTENSION: &str = "gz";

/// Environment variable overriding the level
pub const ENV_LEVEL: &str = "LOGRIG_LEVEL";

/// Environment variable overriding the base path
pub const ENV_PATH: &str = "LOGRIG_PATH";

/// Environment variable overriding the rotation expression
pub const ENV_ROTATION: &str = "LOGRIG_ROTATION";

/// Environment variable overriding the retention expression
pub const ENV_RETENTION: &str = "LOGRIG_RETENTION";

/// Environment variable overriding the compression codec
pub const ENV_COMPRESSION: &str = "LOGRIG_COMPRESSION";

/// Environment variable overriding the line format
pub const ENV_FORMAT: &str = "LOGRIG_FORMAT";

/// Config file names to search for (in priority order)
pub const CONFIG_FILES: &[&str] = &[
    "logrig.toml",
    "logrig.yaml",
    "logrig.yml",
    "logrig.json",
];

/// Expand a leading `~/` to the user's home directory
pub fn expand_home(path: &Path) -> PathBuf {
    match path.strip_prefix("~") {
        Ok(rest) => dirs::home_dir()
            .map(|home| home.join(rest))
            .unwrap_or_else(|| path.to_path_buf()),
        Err(_) => path.to_path_buf(),
    }
}
