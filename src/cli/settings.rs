//! The `settings` command, for inspecting and changing the program settings file.
use crate::log::LOG_LEVEL_ENV_VAR;
use crate::settings::{Settings, get_settings_file_path};
use anyhow::{Context, Result};
use clap::Subcommand;
use std::env;
use std::fs;
use std::path::Path;

/// Subcommands for settings
#[derive(Subcommand)]
pub enum SettingsSubcommands {
    /// Open the settings file in a text editor, creating it first if needed
    Edit,
    /// Print the path of the settings file
    Path,
    /// Print the settings in effect and where each value comes from
    Show,
    /// Check that the settings file is valid
    Check,
    /// Print a commented-out template for `settings.toml`
    DumpDefault,
}

impl SettingsSubcommands {
    /// Execute the supplied settings subcommand
    pub fn execute(self) -> Result<()> {
        let file_path = get_settings_file_path();
        match self {
            Self::Edit => edit_settings_file(&file_path)?,
            Self::Path => {
                println!("{}", file_path.display());
                if !file_path.is_file() {
                    eprintln!("(file does not exist yet, so default settings are used)");
                }
            }
            Self::Show => {
                let settings = load_valid_settings(&file_path)?;
                let env_log_level = env::var(LOG_LEVEL_ENV_VAR).ok();
                print!(
                    "{}",
                    describe_settings(&settings, file_path.is_file(), env_log_level.as_deref())
                );
            }
            Self::Check => {
                load_valid_settings(&file_path)?;
                println!("Settings are valid: {}", file_path.display());
            }
            Self::DumpDefault => print!("{}", Settings::default_file_contents()),
        }

        Ok(())
    }
}

/// Write the template settings file if there is no file yet. Returns whether it was created.
fn create_settings_file_if_missing(file_path: &Path) -> Result<bool> {
    if file_path.is_file() {
        return Ok(false);
    }

    if let Some(dir_path) = file_path.parent() {
        fs::create_dir_all(dir_path)
            .with_context(|| format!("Failed to create directory: {}", dir_path.display()))?;
    }
    fs::write(file_path, Settings::default_file_contents())
        .with_context(|| format!("Failed to write {}", file_path.display()))?;

    Ok(true)
}

/// Let the user edit the settings file, then check what they wrote
fn edit_settings_file(file_path: &Path) -> Result<()> {
    if create_settings_file_if_missing(file_path)? {
        println!("Created settings file: {}", file_path.display());
    }

    println!("Opening settings file for editing: {}", file_path.display());
    edit::edit_file(file_path)?;

    load_valid_settings(file_path).context("The edited settings file is invalid.")?;

    Ok(())
}

/// Load the settings from `file_path` and check their values
fn load_valid_settings(file_path: &Path) -> Result<Settings> {
    let settings = Settings::load_from_path(file_path).context("Failed to load settings.")?;
    settings
        .validate()
        .with_context(|| format!("Invalid settings in {}", file_path.display()))?;

    Ok(settings)
}

/// A listing of the settings in effect, noting defaults and overrides
fn describe_settings(settings: &Settings, from_file: bool, env_log_level: Option<&str>) -> String {
    let source = if from_file { "settings file" } else { "default" };
    let log_level = match env_log_level {
        Some(level) => format!(
            "{level:?} (from {LOG_LEVEL_ENV_VAR}; {source} value is {:?})",
            settings.log_level
        ),
        None => format!("{:?} ({source})", settings.log_level),
    };
    let num_threads = match settings.num_threads {
        0 => "0 (one per CPU)".to_string(),
        n => n.to_string(),
    };

    format!(
        "log_level = {log_level}\noverwrite = {}\nnum_threads = {num_threads}\n",
        settings.overwrite
    )
}
