//! cgsh - a demo shell for the command-graph dispatcher.

mod cli;
mod logging;

use cli::Cli;
use command_graph::shell::{Shell, ShellConfig, ShellError};
use tokio::io::BufReader;
use tracing::{error, info};

#[tokio::main]
async fn main() {
    let cli = Cli::parse_args();

    if cli.log_file {
        logging::init_file_logging();
    } else {
        logging::init_stderr_logging();
    }

    match run(cli).await {
        Ok(true) => {}
        Ok(false) => std::process::exit(1),
        Err(e) => {
            error!("{}: {}", e.category(), e);
            std::process::exit(1);
        }
    }
}

/// Runs cgsh. Returns false when a single-shot command failed.
async fn run(cli: Cli) -> Result<bool, ShellError> {
    let output = cli.parse_output_format().map_err(ShellError::config)?;

    let config_path = cli.config_path();
    info!("Loading config from: {}", config_path.display());
    let config = ShellConfig::load_from_file(&config_path)?;

    let shell = Shell::new(&config, cli.source.as_deref(), output)?;

    if let Some(line) = &cli.exec {
        let report = shell.execute(line);
        let rendered = shell.render_exec(&report)?;
        if !rendered.is_empty() {
            println!("{rendered}");
        }
        return Ok(report.ok);
    }

    if let Some(line) = &cli.complete {
        println!("{}", shell.render_completion(&shell.complete(line))?);
        return Ok(true);
    }

    let stdin = BufReader::new(tokio::io::stdin());
    shell.run(stdin, tokio::io::stdout(), true).await?;
    Ok(true)
}
