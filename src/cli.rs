//! The command line interface for the pipeline.
use crate::input::boundary::read_boundary;
use crate::log;
use crate::output::metadata::write_metadata;
use crate::output::{create_output_directory, get_output_dir};
use crate::pipeline::{self, RunOptions, Stage};
use crate::project::Project;
use crate::region::parse_region_str;
use crate::settings::Settings;
use crate::year::parse_year_str;
use ::log::{info, warn};
use anyhow::{Context, Result};
use clap::{Args, CommandFactory, Parser, Subcommand};
use std::path::{Path, PathBuf};

pub mod example;
use example::ExampleSubcommands;
pub mod settings;
use settings::SettingsSubcommands;

/// The command line interface for the pipeline.
#[derive(Parser)]
#[command(version, about)]
struct Cli {
    /// The available commands.
    #[command(subcommand)]
    command: Option<Commands>,
    /// Flag to provide the CLI docs as markdown
    #[arg(long, hide = true)]
    markdown_help: bool,
}

/// Options for the run command
#[derive(Args, Default)]
pub struct RunOpts {
    /// Directory for output files
    #[arg(short, long)]
    pub output_dir: Option<PathBuf>,
    /// Whether to write into the output directory if it already exists and is not empty
    #[arg(long)]
    pub overwrite: bool,
    /// Only run the given stage (may be repeated). By default every stage is run.
    #[arg(long = "stage", value_enum)]
    pub stages: Vec<Stage>,
    /// Years to process, e.g. "2020", "2015-2017" or "2015;2020" (default: all)
    #[arg(long)]
    pub years: Option<String>,
    /// Regions to process, e.g. "DE" or "DE;DK_1" (default: all)
    #[arg(long)]
    pub regions: Option<String>,
}

/// The available commands.
#[derive(Subcommand)]
enum Commands {
    /// Run the pipeline for a project.
    Run {
        /// Path to the project directory.
        project_dir: PathBuf,
        /// Other run options
        #[command(flatten)]
        opts: RunOpts,
    },
    /// Manage example projects.
    Example {
        /// The available subcommands for managing example projects.
        #[command(subcommand)]
        subcommand: ExampleSubcommands,
    },
    /// Validate a project.
    Validate {
        /// The path to the project directory.
        project_dir: PathBuf,
    },
    /// Manage settings file.
    Settings {
        /// The subcommands for managing the settings file.
        #[command(subcommand)]
        subcommand: SettingsSubcommands,
    },
}

impl Commands {
    /// Execute the supplied CLI command
    fn execute(self) -> Result<()> {
        match self {
            Self::Run { project_dir, opts } => handle_run_command(&project_dir, &opts, None),
            Self::Example { subcommand } => subcommand.execute(),
            Self::Validate { project_dir } => handle_validate_command(&project_dir, None),
            Self::Settings { subcommand } => subcommand.execute(),
        }
    }
}

/// Parse CLI arguments and start the program
pub fn run_cli() -> Result<()> {
    let cli = Cli::parse();

    // Invoked as: `$ windvalue --markdown-help`
    if cli.markdown_help {
        clap_markdown::print_help_markdown::<Cli>();
        return Ok(());
    }

    let Some(command) = cli.command else {
        // Output program help
        let help_str = Cli::command().render_long_help().to_string();
        println!("{help_str}");
        return Ok(());
    };

    command.execute()
}

/// Handle the `run` command.
pub fn handle_run_command(
    project_path: &Path,
    opts: &RunOpts,
    settings: Option<Settings>,
) -> Result<()> {
    // Load program settings, if not provided
    let settings = if let Some(settings) = settings {
        settings
    } else {
        Settings::load().context("Failed to load settings.")?
    };

    // Get path to output folder
    let pathbuf: PathBuf;
    let output_path = if let Some(p) = opts.output_dir.as_deref() {
        p
    } else {
        pathbuf = get_output_dir(project_path)?;
        &pathbuf
    };

    // This setting can be overridden by command-line argument
    let allow_overwrite = opts.overwrite || settings.overwrite;
    let overwrite = create_output_directory(output_path, allow_overwrite).with_context(|| {
        format!(
            "Failed to create output directory: {}",
            output_path.display()
        )
    })?;

    // Initialise program logger
    log::init(Some(&settings.log_level), Some(output_path))
        .context("Failed to initialise logging.")?;

    // Load the project to run
    let project = Project::from_path(project_path).context("Failed to load project.")?;
    info!("Loaded project from {}", project_path.display());
    info!("Output folder: {}", output_path.display());

    // NB: We have to wait until the logger is initialised to display this warning
    if overwrite {
        warn!("Files in the output folder will be overwritten");
    }

    let options = RunOptions {
        stages: opts.stages.clone(),
        years: opts
            .years
            .as_deref()
            .map(|s| parse_year_str(s, project.years()))
            .transpose()
            .context("Invalid --years option.")?,
        regions: opts
            .regions
            .as_deref()
            .map(|s| parse_region_str(s, &project.regions))
            .transpose()
            .context("Invalid --regions option.")?,
        num_threads: settings.num_threads,
    };
    let years = options.years.as_deref().unwrap_or(project.years());
    write_metadata(
        output_path,
        project_path,
        years,
        &options.selected_stages(),
    )
    .context("Failed to save metadata.")?;

    // Run the pipeline
    let summary = pipeline::run(&project, output_path, &options)?;
    info!(
        "Run complete: {} unit(s) completed, {} skipped, {} failed",
        summary.count("completed"),
        summary.count("skipped"),
        summary.count("failed")
    );
    if summary.count("failed") > 0 {
        warn!(
            "Some units failed. See {} for details.",
            output_path.join("unit_status.csv").display()
        );
    }

    Ok(())
}

/// Handle the `validate` command.
pub fn handle_validate_command(project_path: &Path, settings: Option<Settings>) -> Result<()> {
    // Load program settings, if not provided
    let settings = if let Some(settings) = settings {
        settings
    } else {
        Settings::load().context("Failed to load settings.")?
    };

    // Initialise program logger (we won't save log files when running the validate command)
    log::init(Some(&settings.log_level), None).context("Failed to initialise logging.")?;

    // Load/validate the project and its region boundaries
    let project = Project::from_path(project_path).context("Failed to validate project.")?;
    for region in &project.regions {
        read_boundary(&project.boundary_file(region))
            .with_context(|| format!("Invalid boundary for region {region}."))?;
    }
    info!(
        "Project validation successful! ({} region(s), {} year(s))",
        project.regions.len(),
        project.years().len()
    );

    Ok(())
}
