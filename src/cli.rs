//! Command-line interface implementation for StempelWerk.
//! Provides argument parsing and help text formatting using clap.

use clap::{error::ErrorKind, ArgAction, CommandFactory, Parser};
use std::path::PathBuf;

/// Command-line arguments structure for StempelWerk.
#[derive(Parser, Debug)]
#[command(
    author,
    version,
    about = "StempelWerk: automatic code generation from Jinja templates",
    long_about = None
)]
pub struct Args {
    /// Path to JSON file containing configuration
    #[arg(value_name = "CONFIG_FILE")]
    pub config_file: PathBuf,

    /// Only process modified templates
    #[arg(short = 'm', long = "only-modified")]
    pub only_modified: bool,

    /// String or file containing JSON-formatted global variables
    #[arg(short, long, value_name = "JSON")]
    pub globals: Option<String>,

    /// Display less output; repeat (-qq) to display minimal output
    #[arg(short, long, action = ArgAction::Count, conflicts_with = "verbose")]
    pub quiet: u8,

    /// Display more output and include debug information
    #[arg(short, long)]
    pub verbose: bool,
}

impl Args {
    /// Verbosity from -2 (minimal output) to 1 (debug information).
    pub fn verbosity(&self) -> i8 {
        if self.verbose {
            1
        } else {
            -(self.quiet.min(2) as i8)
        }
    }
}

/// Parses command line arguments and returns the Args structure.
///
/// # Returns
/// * `Args` - Parsed command line arguments
///
/// # Exits
/// * With status code 1 if the configuration file is missing
/// * With clap's default error handling for other argument errors
pub fn get_args() -> Args {
    match Args::try_parse() {
        Ok(args) => args,
        Err(e) => {
            if e.kind() == ErrorKind::MissingRequiredArgument {
                eprintln!("{e}");
                let _ = Args::command()
                    .help_template(
                        r#"{about-section}
{usage-heading} {usage}

{all-args}
{after-help}
"#,
                    )
                    .print_help();
                std::process::exit(1);
            } else {
                e.exit();
            }
        }
    }
}
