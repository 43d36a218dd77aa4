//! Code for writing run metadata to file
use anyhow::{Result, anyhow};
use crate::pipeline::Stage;
use chrono::prelude::*;
use platform_info::{PlatformInfo, PlatformInfoAPI, UNameAPI};
use serde::Serialize;
use std::fs;
use std::path::Path;

/// The output file name for metadata
const METADATA_FILE_NAME: &str = "metadata.toml";

/// Information about the program build via `built` crate
mod built_info {
    // The file has been placed there by the build script.
    include!(concat!(env!("OUT_DIR"), "/built.rs"));
}

/// Get information about program version from git
fn get_git_hash() -> String {
    let Some(hash) = built_info::GIT_COMMIT_HASH_SHORT else {
        return "unknown".into();
    };

    if built_info::GIT_DIRTY == Some(true) {
        format!("{hash}-dirty")
    } else {
        hash.into()
    }
}

#[derive(Serialize)]
struct Metadata<'a> {
    run: RunMetadata<'a>,
    program: ProgramMetadata<'a>,
    platform: PlatformMetadata,
}

/// Information about the pipeline run
#[derive(Serialize)]
struct RunMetadata<'a> {
    /// Path to the project which was run
    project_path: &'a Path,
    /// The date and time on which the run started
    datetime: String,
    /// The years processed
    years: &'a [u32],
    /// The stages run
    stages: Vec<String>,
}

impl<'a> RunMetadata<'a> {
    fn new(project_path: &'a Path, years: &'a [u32], stages: &[Stage]) -> Self {
        let dt = Local::now();
        Self {
            project_path,
            datetime: dt.to_rfc2822(),
            years,
            stages: stages.iter().map(ToString::to_string).collect(),
        }
    }
}

#[derive(Serialize)]
struct ProgramMetadata<'a> {
    /// The program name
    name: &'a str,
    /// The program version as specified in Cargo.toml
    version: &'a str,
    /// The target architecture for the build (e.g. x86_64-unknown-linux-gnu)
    target: &'a str,
    /// Whether it is a debug build
    is_debug: bool,
    /// The version of rustc used to compile windvalue
    rustc_version: &'a str,
    /// When windvalue was built
    build_time_utc: &'a str,
    /// The git commit hash for the version of windvalue (if known)
    git_commit_hash: String,
}

impl Default for ProgramMetadata<'_> {
    fn default() -> Self {
        Self {
            name: built_info::PKG_NAME,
            version: built_info::PKG_VERSION,
            target: built_info::TARGET,
            is_debug: built_info::DEBUG,
            rustc_version: built_info::RUSTC_VERSION,
            build_time_utc: built_info::BUILT_TIME_UTC,
            git_commit_hash: get_git_hash(),
        }
    }
}

/// Information about the platform on which windvalue is running.
///
/// The fields correspond to different data available from the [`PlatformInfo`] struct.
#[derive(Serialize)]
struct PlatformMetadata {
    sysname: String,
    nodename: String,
    release: String,
    version: String,
    machine: String,
    osname: String,
}

impl PlatformMetadata {
    fn new() -> Result<Self> {
        let info =
            PlatformInfo::new().map_err(|err| anyhow!("Unable to determine platform info: {err}"))?;
        Ok(Self {
            sysname: info.sysname().to_string_lossy().into(),
            nodename: info.nodename().to_string_lossy().into(),
            release: info.release().to_string_lossy().into(),
            version: info.version().to_string_lossy().into(),
            machine: info.machine().to_string_lossy().into(),
            osname: info.osname().to_string_lossy().into(),
        })
    }
}

/// Write metadata to the specified output path in TOML format
pub fn write_metadata(
    output_path: &Path,
    project_path: &Path,
    years: &[u32],
    stages: &[Stage],
) -> Result<()> {
    let metadata = Metadata {
        run: RunMetadata::new(project_path, years, stages),
        program: ProgramMetadata::default(),
        platform: PlatformMetadata::new()?,
    };
    let file_path = output_path.join(METADATA_FILE_NAME);
    fs::write(&file_path, toml::to_string(&metadata)?)?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_write_metadata() {
        let dir = tempdir().unwrap();
        write_metadata(
            dir.path(),
            Path::new("demos/simple"),
            &[2020, 2021],
            &[Stage::WindPower, Stage::Regions],
        )
        .unwrap();

        let contents = fs::read_to_string(dir.path().join(METADATA_FILE_NAME)).unwrap();
        let metadata: toml::Table = toml::from_str(&contents).unwrap();
        let run = metadata["run"].as_table().unwrap();
        assert_eq!(run["project_path"].as_str(), Some("demos/simple"));
        assert_eq!(run["years"].as_array().unwrap().len(), 2);
        assert_eq!(
            run["stages"].as_array().unwrap()[0].as_str(),
            Some("wind_power")
        );
        assert_eq!(metadata["program"]["name"].as_str(), Some("windvalue"));
    }
}
