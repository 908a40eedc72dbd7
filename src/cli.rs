//! Command-line argument parsing for cgsh.

use clap::Parser;
use command_graph::shell::{OutputFormat, ShellConfig};
use std::path::PathBuf;

/// An interactive shell over the command-graph dispatcher.
#[derive(Parser, Debug)]
#[command(name = "cgsh")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Config file path
    #[arg(long, value_name = "PATH", env = "CGSH_CONFIG")]
    pub config: Option<PathBuf>,

    /// Source to issue commands as (defaults to the config's source)
    #[arg(short = 's', long, value_name = "NAME")]
    pub source: Option<String>,

    /// Execute a single command line and exit
    #[arg(short = 'e', long, value_name = "LINE", conflicts_with = "complete")]
    pub exec: Option<String>,

    /// Print completions for a single command line and exit
    #[arg(long, value_name = "LINE")]
    pub complete: Option<String>,

    /// Output format: text or json
    #[arg(long, value_name = "FORMAT", default_value = "text")]
    pub output: String,

    /// Write logs to the cgsh log file instead of stderr
    #[arg(long)]
    pub log_file: bool,
}

impl Cli {
    /// Parses command-line arguments.
    pub fn parse_args() -> Self {
        Self::parse()
    }

    /// Returns the config file path to use.
    ///
    /// Uses the --config argument if provided, otherwise the default path.
    pub fn config_path(&self) -> PathBuf {
        self.config.clone().unwrap_or_else(ShellConfig::default_path)
    }

    /// Parses the output format from the --output argument.
    pub fn parse_output_format(&self) -> Result<OutputFormat, String> {
        self.output.parse()
    }

    /// Returns true if no single-shot line was given.
    pub fn is_interactive(&self) -> bool {
        self.exec.is_none() && self.complete.is_none()
    }
}
