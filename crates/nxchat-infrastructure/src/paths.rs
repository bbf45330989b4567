//! Unified path management for NxChat files.
//!
//! # Directory Structure
//!
//! ```text
//! ~/.config/nxchat/            # Config directory
//! └── config.toml              # Widget configuration
//!
//! ~/.local/share/nxchat/       # Data directory
//! ├── storage.json             # Durable client storage (visitor ids, history)
//! └── logs/                    # Application logs
//!     └── nxchat.log.YYYY-MM-DD
//! ```

use std::fmt;
use std::path::PathBuf;

const APP_DIR: &str = "nxchat";

/// Errors that can occur during path resolution.
#[derive(Debug)]
pub enum PathError {
    /// Home/config directory could not be determined.
    HomeDirNotFound,
}

impl fmt::Display for PathError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PathError::HomeDirNotFound => write!(f, "Cannot find home directory"),
        }
    }
}

impl std::error::Error for PathError {}

impl From<PathError> for nxchat_core::NxChatError {
    fn from(err: PathError) -> Self {
        nxchat_core::NxChatError::config(err.to_string())
    }
}

/// Resolves NxChat directories.
///
/// With a base override every directory lives under that base, which keeps
/// tests and portable installs away from the user's real config.
#[derive(Debug, Clone, Default)]
pub struct NxChatPaths {
    base: Option<PathBuf>,
}

impl NxChatPaths {
    pub fn new(base: Option<PathBuf>) -> Self {
        Self { base }
    }

    /// Returns the config directory (e.g. `~/.config/nxchat/`).
    pub fn config_dir(&self) -> Result<PathBuf, PathError> {
        match &self.base {
            Some(base) => Ok(base.join("config")),
            None => dirs::config_dir()
                .map(|dir| dir.join(APP_DIR))
                .ok_or(PathError::HomeDirNotFound),
        }
    }

    /// Returns the data directory (e.g. `~/.local/share/nxchat/`).
    pub fn data_dir(&self) -> Result<PathBuf, PathError> {
        match &self.base {
            Some(base) => Ok(base.join("data")),
            None => dirs::data_dir()
                .map(|dir| dir.join(APP_DIR))
                .ok_or(PathError::HomeDirNotFound),
        }
    }

    pub fn config_file(&self) -> Result<PathBuf, PathError> {
        Ok(self.config_dir()?.join("config.toml"))
    }

    pub fn storage_file(&self) -> Result<PathBuf, PathError> {
        Ok(self.data_dir()?.join("storage.json"))
    }

    pub fn logs_dir(&self) -> Result<PathBuf, PathError> {
        Ok(self.data_dir()?.join("logs"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_base_override() {
        let paths = NxChatPaths::new(Some(PathBuf::from("/tmp/nx")));
        assert_eq!(
            paths.config_file().unwrap(),
            PathBuf::from("/tmp/nx/config/config.toml")
        );
        assert_eq!(
            paths.storage_file().unwrap(),
            PathBuf::from("/tmp/nx/data/storage.json")
        );
        assert_eq!(paths.logs_dir().unwrap(), PathBuf::from("/tmp/nx/data/logs"));
    }
}
