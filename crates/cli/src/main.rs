// exofile CLI - merge exoplanet parameter tables from several archives

mod config_cmd;
mod exit_codes;
mod lookup;
mod merge;

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{ArgAction, Parser, Subcommand};
use exofile_config::SettingsError;
use exofile_io::IoError;
use exofile_merge::MergeError;
use tracing_subscriber::EnvFilter;

use config_cmd::ConfigCommands;
use exit_codes::{EXIT_BAD_TABLE, EXIT_INVALID_CONFIG, EXIT_IO, EXIT_SUCCESS, EXIT_USAGE};

#[derive(Parser)]
#[command(name = "exofile")]
#[command(about = "Merge exoplanet parameter tables into one row per planet")]
#[command(long_version = long_version())]
#[command(version)]
struct Cli {
    /// More log output on stderr (-v info, -vv debug). EXOFILE_LOG overrides.
    #[arg(short, long, action = ArgAction::Count, global = true)]
    verbose: u8,

    /// Settings file to use instead of the per-user one
    #[arg(long, env = "EXOFILE_SETTINGS", global = true)]
    settings: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Merge source tables and apply override files
    #[command(after_help = "\
Examples:
  exofile merge archive.csv --config merge.toml --output exofile.csv
  exofile merge archive.csv composite.csv --custom custom.csv --refs-output refs.csv
  exofile merge archive.csv --sheet sheet.csv --json > report.json
  exofile merge archive.csv --epoch-jd 2460000.5 --output exofile.json

Overrides are applied sheet first, then custom: the custom file wins.
Paths not given on the command line fall back to `exofile config` settings.")]
    Merge {
        /// Source CSV tables, most authoritative first
        #[arg(required = true)]
        sources: Vec<PathBuf>,

        /// Merge configuration (TOML)
        #[arg(long, short = 'c')]
        config: Option<PathBuf>,

        /// CSV export of the shared corrections sheet (`name [unit]` headers)
        #[arg(long)]
        sheet: Option<PathBuf>,

        /// Local CSV of manual corrections with a units row
        #[arg(long)]
        custom: Option<PathBuf>,

        /// Write the merged table here (.csv or .json); stdout when absent
        #[arg(long, short = 'o')]
        output: Option<PathBuf>,

        /// Write the provenance table here
        #[arg(long)]
        refs_output: Option<PathBuf>,

        /// Print the merge report as JSON on stdout
        #[arg(long)]
        json: bool,

        /// Julian date for ephemeris ranking (default: config value, then now)
        #[arg(long)]
        epoch_jd: Option<f64>,

        /// Source files have no units row under the header
        #[arg(long)]
        no_units_row: bool,
    },

    /// Check a merge configuration without merging
    #[command(after_help = "\
Examples:
  exofile validate merge.toml")]
    Validate {
        /// Path to the merge configuration (TOML)
        config: PathBuf,
    },

    /// Show one planet's row from a merged table
    #[command(after_help = "\
Examples:
  exofile lookup exofile.csv 'TOI-700 d'
  exofile lookup exofile.csv 'TOI-700' --refs refs.csv
  exofile lookup exofile.csv 'K2-18 b' --json

A partial name is accepted when it matches exactly one planet.")]
    Lookup {
        /// Merged table written by `exofile merge`
        table: PathBuf,

        /// Planet name, or an unambiguous part of it
        name: String,

        /// Column holding planet names
        #[arg(long, default_value = "pl_name")]
        entity_column: String,

        /// Provenance table written with --refs-output
        #[arg(long)]
        refs: Option<PathBuf>,

        /// Print the row as a JSON object
        #[arg(long)]
        json: bool,

        /// Table has no units row under the header
        #[arg(long)]
        no_units_row: bool,
    },

    /// Show or change persisted settings
    #[command(subcommand)]
    Config(ConfigCommands),
}

fn long_version() -> &'static str {
    concat!(
        env!("CARGO_PKG_VERSION"),
        " (", env!("GIT_COMMIT_HASH"), ")",
        "\nmerge:   exofile-merge ", env!("CARGO_PKG_VERSION"),
        "\ntarget:  ", env!("TARGET"),
        "\nbuild:   ", env!("BUILD_PROFILE"),
    )
}

fn init_logging(verbose: u8) {
    let default = match verbose {
        0 => "warn",
        1 => "info",
        _ => "debug",
    };
    let filter = EnvFilter::try_from_env("EXOFILE_LOG")
        .or_else(|_| EnvFilter::try_from_default_env())
        .unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let result = match cli.command {
        Commands::Merge {
            sources,
            config,
            sheet,
            custom,
            output,
            refs_output,
            json,
            epoch_jd,
            no_units_row,
        } => merge::cmd_merge(merge::MergeArgs {
            sources,
            config,
            sheet,
            custom,
            output,
            refs_output,
            json,
            epoch_jd,
            units_row: !no_units_row,
            settings: cli.settings,
        }),
        Commands::Validate { config } => merge::cmd_validate(config),
        Commands::Lookup { table, name, entity_column, refs, json, no_units_row } => {
            lookup::cmd_lookup(table, name, entity_column, refs, json, !no_units_row)
        }
        Commands::Config(cmd) => config_cmd::cmd_config(cmd, cli.settings),
    };

    match result {
        Ok(()) => ExitCode::from(EXIT_SUCCESS),
        Err(CliError { code, message, hint }) => {
            if !message.is_empty() {
                eprintln!("error: {}", message);
            }
            if let Some(hint) = hint {
                eprintln!("hint:  {}", hint);
            }
            ExitCode::from(code)
        }
    }
}

#[derive(Debug)]
pub struct CliError {
    pub code: u8,
    pub message: String,
    pub hint: Option<String>,
}

impl CliError {
    pub fn args(msg: impl Into<String>) -> Self {
        Self { code: EXIT_USAGE, message: msg.into(), hint: None }
    }

    pub fn io(msg: impl Into<String>) -> Self {
        Self { code: EXIT_IO, message: msg.into(), hint: None }
    }

    pub fn config(msg: impl Into<String>) -> Self {
        Self { code: EXIT_INVALID_CONFIG, message: msg.into(), hint: None }
    }

    pub fn table(msg: impl Into<String>) -> Self {
        Self { code: EXIT_BAD_TABLE, message: msg.into(), hint: None }
    }

    /// Map a merge failure to its exit code.
    pub fn merge(err: MergeError) -> Self {
        match err {
            MergeError::ConfigParse(_) | MergeError::ConfigValidation(_) => {
                Self::config(err.to_string())
            }
            MergeError::MissingColumn { .. } => Self::table(err.to_string())
                .with_hint("check entity_column and reference_column in the merge config"),
            MergeError::Table(_) => Self::table(err.to_string()),
        }
    }

    /// Map a read/write failure. Only filesystem errors count as I/O;
    /// everything else means the file content is unusable.
    pub fn file(err: IoError) -> Self {
        match err {
            IoError::File { .. } => Self::io(err.to_string()),
            _ => Self::table(err.to_string()),
        }
    }

    pub fn settings(err: SettingsError) -> Self {
        match err {
            SettingsError::UnknownKey(_) => Self::args(err.to_string())
                .with_hint("run `exofile config show` to list settings"),
            SettingsError::Parse { .. } => Self::config(err.to_string())
                .with_hint("fix the file or run `exofile config reset`"),
            _ => Self::io(err.to_string()),
        }
    }

    /// Add a hint to an existing error.
    pub fn with_hint(mut self, hint: impl Into<String>) -> Self {
        self.hint = Some(hint.into());
        self
    }
}
