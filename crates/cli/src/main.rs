mod commands;

use std::path::PathBuf;
use std::process;

use clap::{Parser, Subcommand, ValueEnum};
use directus_tools_core::{ClientConfig, ConfigError};
use tracing_subscriber::EnvFilter;

use commands::{Action, Report};

/// Output format for CLI responses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub(crate) enum OutputFormat {
    Text,
    Json,
}

/// Directus schema administration commands.
///
/// Requires DIRECTUS_API_HOST and DIRECTUS_ADMIN_TOKEN to be set.
#[derive(Parser)]
#[command(
    name = "directus-tools",
    version,
    about = "Directus schema administration commands",
    after_help = "Requires the DIRECTUS_API_HOST and DIRECTUS_ADMIN_TOKEN environment variables.\n\
                  Optional: DIRECTUS_PROJECT (default \"_\"), DIRECTUS_TIMEOUT_SECS (default 60)."
)]
struct Cli {
    /// Output format (text or json)
    #[arg(long, global = true, default_value = "text", value_enum)]
    output: OutputFormat,

    /// Suppress non-essential output and lower logging to warnings
    #[arg(long, global = true)]
    quiet: bool,

    /// Log every request sent to the API
    #[arg(long, global = true, conflicts_with = "quiet")]
    verbose: bool,

    /// Directory receiving before/after snapshots when a patch changes a collection
    #[arg(long, global = true, default_value = ".")]
    artifacts_dir: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
#[command(rename_all = "snake_case")]
pub(crate) enum Commands {
    /// Call the root path of the API to display version, name, etc.
    ApiInfo,

    /// Create a new collection from a schema file
    CreateCollection {
        /// Collection schema JSON file; the name is read from its "collection" attribute
        file: PathBuf,
    },

    /// Patch an existing collection from a schema file
    ///
    /// Only adds or updates fields; use drop_field to remove one. The API may
    /// ignore some attribute changes (unique fields cannot be made non-unique),
    /// so the definition is compared before and after, and both snapshots are
    /// left in --artifacts-dir for manual comparison when they differ.
    Patch {
        /// Collection schema JSON file
        file: PathBuf,
    },

    /// Drop a collection including all its data, if it exists
    DropCollection {
        collection: String,
    },

    /// Insert the items of a JSON file into a collection
    InsertItems {
        collection: String,
        /// JSON file with one item or an array of items
        file: PathBuf,
    },

    /// Create an M2O relation
    #[command(name = "create_m2o")]
    CreateM2o {
        many_collection: String,
        many_field: String,
        one_collection: String,
        field_one: Option<String>,
    },

    /// Delete every M2O relation matching the collection and field names
    ///
    /// FIELD_ONE defaults to null, which matches relations without one.
    #[command(name = "delete_m2o")]
    DeleteM2o {
        many_collection: String,
        many_field: String,
        one_collection: String,
        field_one: Option<String>,
    },

    /// Print the definition of a field
    GetFieldDef {
        collection: String,
        field: String,
    },

    /// Delete a field from a collection
    DropField {
        collection: String,
        field: String,
    },

    /// Rename a field by creating a copy, moving the data, and dropping the original
    ///
    /// Does not work for relation fields.
    RenameField {
        collection: String,
        current_field: String,
        new_field: String,
    },

    /// Copy every non-null value of one field into another field of the same collection
    ///
    /// Completes a rename that stopped after the new field was created: run
    /// this, then drop_field on the old field.
    CopyFieldData {
        collection: String,
        from_field: String,
        to_field: String,
    },

    /// GET any project-relative path and print the response
    GetData {
        /// Path such as /collections or /items/posts
        path: String,
    },
}

fn main() {
    let cli = Cli::parse();
    init_logging(cli.verbose, cli.quiet);

    let config = match ClientConfig::from_env() {
        Ok(config) => config,
        Err(ConfigError::MissingVariables(names)) => {
            for name in names {
                eprintln!("environment variable {} must be set", name);
            }
            process::exit(2);
        }
        Err(e) => {
            eprintln!("{}", e);
            process::exit(2);
        }
    };

    tracing::debug!(config = ?config, "loaded configuration");

    let action = match Action::prepare(cli.command) {
        Ok(action) => action,
        Err(e) => {
            report_error(&e.to_string(), cli.output, cli.quiet);
            process::exit(1);
        }
    };

    let migrator = directus_tools_core::connect(&config, cli.artifacts_dir);

    // A cheap call first, so a wrong host or token fails before any mutation.
    if let Err(e) = migrator.client().api_info() {
        report_error(
            &format!("cannot reach the API at {}: {}", config.project_url(), e),
            cli.output,
            cli.quiet,
        );
        process::exit(1);
    }

    match action.run(&migrator) {
        Ok(report) => print_report(&report, cli.output, cli.quiet),
        Err(e) => {
            report_error(&e.to_string(), cli.output, cli.quiet);
            process::exit(1);
        }
    }
}

fn init_logging(verbose: bool, quiet: bool) {
    let default_level = if verbose {
        "debug"
    } else if quiet {
        "warn"
    } else {
        "info"
    };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

fn print_report(report: &Report, output: OutputFormat, quiet: bool) {
    match report {
        Report::Document(document) => {
            let pretty = serde_json::to_string_pretty(document)
                .unwrap_or_else(|e| format!("serialization error: {}", e));
            println!("{}", pretty);
        }
        Report::Done { message, details } => {
            if quiet {
                return;
            }
            match output {
                OutputFormat::Text => println!("{}", message),
                OutputFormat::Json => println!(
                    "{}",
                    serde_json::to_string_pretty(details).unwrap_or_default()
                ),
            }
        }
    }
}

pub(crate) fn report_error(msg: &str, output: OutputFormat, quiet: bool) {
    if quiet {
        return;
    }
    match output {
        OutputFormat::Text => eprintln!("error: {}", msg),
        OutputFormat::Json => {
            eprintln!("{}", serde_json::json!({ "error": msg }));
        }
    }
}
