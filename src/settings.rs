//! Code for loading program settings.
use crate::get_windvalue_config_dir;
use crate::input::read_toml;
use crate::log::{DEFAULT_LOG_LEVEL, parse_log_level};
use anyhow::{Context, Result, ensure};
use documented::DocumentedFields;
use serde::{Deserialize, Serialize};
use std::fmt::Write;
use std::path::{Path, PathBuf};

const SETTINGS_FILE_NAME: &str = "settings.toml";

/// Upper limit on `num_threads`, to catch typos
const MAX_NUM_THREADS: usize = 1024;

const DEFAULT_SETTINGS_FILE_HEADER: &str = "# This file contains the program settings for windvalue.
# Every setting is optional; remove the leading '#' to change a value.
";

/// Default log level for program
fn default_log_level() -> String {
    DEFAULT_LOG_LEVEL.to_string()
}

/// Get the path to where the settings file will be read from
pub fn get_settings_file_path() -> PathBuf {
    let mut path = get_windvalue_config_dir();
    path.push(SETTINGS_FILE_NAME);

    path
}

/// Program settings from config file
#[derive(Debug, DocumentedFields, Serialize, Deserialize, PartialEq)]
pub struct Settings {
    /// The default program log level
    #[serde(default = "default_log_level")]
    pub log_level: String,
    /// Whether to write into an existing, non-empty output folder by default
    #[serde(default)]
    pub overwrite: bool,
    /// The number of worker threads used to run work units (0 means one per CPU)
    #[serde(default)]
    pub num_threads: usize,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
            overwrite: false,
            num_threads: 0,
        }
    }
}

impl Settings {
    /// Read the contents of the settings file in the user's config directory.
    ///
    /// If the file is not present, default values for settings will be used
    ///
    /// # Returns
    ///
    /// The program settings as a `Settings` struct or an error if the file is invalid
    pub fn load() -> Result<Settings> {
        Self::load_from_path(&get_settings_file_path())
    }

    /// Read from the specified path, falling back to defaults if there is no file
    pub fn load_from_path(file_path: &Path) -> Result<Settings> {
        if !file_path.is_file() {
            return Ok(Settings::default());
        }

        read_toml(file_path)
    }

    /// Check that the settings hold usable values
    pub fn validate(&self) -> Result<()> {
        parse_log_level(&self.log_level).context("Invalid log_level")?;
        ensure!(
            self.num_threads <= MAX_NUM_THREADS,
            "num_threads must be at most {MAX_NUM_THREADS}"
        );

        Ok(())
    }

    /// The contents of the default settings file
    pub fn default_file_contents() -> String {
        // Settings object with default values set by serde
        let settings: Settings =
            toml::from_str("").expect("Cannot create settings from empty TOML file");

        // Convert to TOML
        let settings_raw = toml::to_string(&settings).expect("Could not convert settings to TOML");

        // Iterate through the generated TOML, commenting out lines and adding docs
        let mut out = DEFAULT_SETTINGS_FILE_HEADER.to_string();
        for line in settings_raw.split('\n') {
            if let Some(last) = line.find('=') {
                // Add documentation from doc comments
                let field = line[..last].trim();

                // Use doc comment to document parameter. All fields should have doc comments.
                let docs = Settings::get_field_docs(field).expect("Missing doc comment for field");
                for line in docs.split('\n') {
                    write!(&mut out, "\n# # {}\n", line.trim()).unwrap();
                }

                writeln!(&mut out, "# {}", line.trim()).unwrap();
            }
        }

        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;
    use std::fs::File;
    use std::io::Write;
    use tempfile::tempdir;

    #[test]
    fn test_settings_load_from_path_no_file() {
        let dir = tempdir().unwrap();
        let file_path = dir.path().join(SETTINGS_FILE_NAME); // NB: doesn't exist
        assert_eq!(
            Settings::load_from_path(&file_path).unwrap(),
            Settings::default()
        );
    }

    #[test]
    fn test_settings_load_from_path() {
        let dir = tempdir().unwrap();
        let file_path = dir.path().join(SETTINGS_FILE_NAME);

        {
            let mut file = File::create(&file_path).unwrap();
            writeln!(file, "log_level = \"warn\"\nnum_threads = 2").unwrap();
        }

        assert_eq!(
            Settings::load_from_path(&file_path).unwrap(),
            Settings {
                log_level: "warn".to_string(),
                overwrite: false,
                num_threads: 2,
            }
        );
    }

    #[rstest]
    #[case("debug", 0, true)]
    #[case("WARN", 8, true)]
    #[case("verbose", 0, false)]
    #[case("info", 5000, false)]
    fn test_validate(#[case] log_level: &str, #[case] num_threads: usize, #[case] valid: bool) {
        let settings = Settings {
            log_level: log_level.into(),
            overwrite: false,
            num_threads,
        };
        assert_eq!(settings.validate().is_ok(), valid);
    }

    #[test]
    fn test_default_file_contents() {
        let contents = Settings::default_file_contents();
        assert!(contents.starts_with(DEFAULT_SETTINGS_FILE_HEADER));
        assert!(contents.contains("# num_threads = 0"));

        // Every setting is commented out, so the file parses to the defaults
        let settings: Settings = toml::from_str(&contents).unwrap();
        assert_eq!(settings, Settings::default());
    }
}
