//! User configuration read from `~/.staffdesk/config.toml`.
//!
//! ```toml
//! dev_mode = false
//! theme = "dark"
//! bell_on_error = true
//! seed_on_first_run = true
//!
//! [[admins]]
//! host_user_id = 123456789
//! name = "Chief Administrator"
//! ```

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::auth::{default_admins, Admin};
use crate::error::Result;
use crate::fields::Theme;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct Config {
    /// Stand in for a missing host or user with the first admin.
    pub dev_mode: bool,
    pub theme: Theme,
    pub bell_on_error: bool,
    /// Fill an absent data file with the demo dataset.
    pub seed_on_first_run: bool,
    pub admins: Vec<Admin>,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            dev_mode: true,
            theme: Theme::Auto,
            bell_on_error: false,
            seed_on_first_run: true,
            admins: default_admins(),
        }
    }
}

impl Config {
    /// Read the file; a missing file yields the defaults.
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            log::debug!("no config at {}, using defaults", path.display());
            return Ok(Config::default());
        }
        let text = fs::read_to_string(path)?;
        let mut config: Config = toml::from_str(&text)?;
        if config.admins.is_empty() {
            config.admins = default_admins();
        }
        Ok(config)
    }
}

/// `~/.staffdesk`, or the working directory when there is no home.
pub fn data_dir() -> PathBuf {
    dirs::home_dir().unwrap_or_else(|| PathBuf::from(".")).join(".staffdesk")
}

pub fn default_config_path() -> PathBuf {
    data_dir().join("config.toml")
}

pub fn default_db_path() -> PathBuf {
    data_dir().join("staffdesk.json")
}

pub fn log_path() -> PathBuf {
    data_dir().join("staffdesk.log")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partial_file_keeps_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        fs::write(
            &path,
            "dev_mode = false\ntheme = \"dark\"\n\n[[admins]]\nhost_user_id = 42\nname = \"Ops\"\n",
        )
        .unwrap();
        let config = Config::load(&path).unwrap();
        assert!(!config.dev_mode);
        assert_eq!(config.theme, Theme::Dark);
        assert!(config.seed_on_first_run);
        assert_eq!(config.admins, vec![Admin { host_user_id: 42, name: "Ops".into() }]);
    }

    #[test]
    fn test_missing_or_broken_file() {
        let dir = tempfile::tempdir().unwrap();
        assert_eq!(Config::load(&dir.path().join("none.toml")).unwrap(), Config::default());

        let path = dir.path().join("bad.toml");
        fs::write(&path, "dev_mode = \"maybe\"").unwrap();
        assert!(matches!(Config::load(&path), Err(crate::error::AppError::Config(_))));
    }
}
