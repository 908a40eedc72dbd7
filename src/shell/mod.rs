//! cgsh: a small line-based host for the dispatcher.
//!
//! Each input line is dispatched as the configured source. A line that
//! starts with `?` is completed instead of executed. Results are rendered
//! as plain text or as one JSON object per line.

pub mod commands;
pub mod config;
pub mod source;

use serde::Serialize;
use thiserror::Error;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt};
use tracing::{debug, info};

use crate::dispatcher::CommandDispatcher;
use crate::error::StateError;

pub use config::{ShellConfig, SourceConfig};
pub use source::{ShellSource, SourcePermissions};

/// Errors raised by the shell itself, as opposed to command failures,
/// which are reported to the user and never end the loop.
#[derive(Error, Debug)]
pub enum ShellError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Registration error: {0}")]
    Registration(#[from] StateError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl ShellError {
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// Returns the error category as a string for display purposes.
    pub fn category(&self) -> &'static str {
        match self {
            Self::Config(_) => "Configuration Error",
            Self::Registration(_) => "Registration Error",
            Self::Io(_) => "I/O Error",
            Self::Serialization(_) => "Serialization Error",
        }
    }
}

/// Output format for reports.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum OutputFormat {
    /// Replies and errors as plain lines.
    #[default]
    Text,
    /// One JSON object per report.
    Json,
}

impl std::str::FromStr for OutputFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "text" => Ok(Self::Text),
            "json" => Ok(Self::Json),
            _ => Err(format!("Invalid output format: {s}. Expected: text or json")),
        }
    }
}

/// The result of executing one line.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct ExecReport {
    pub line: String,
    pub ok: bool,
    pub replies: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// The result of completing one line.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct CompletionReport {
    pub line: String,
    pub completions: Vec<String>,
}

/// A dispatcher loaded with the demo modules, bound to one source.
pub struct Shell {
    dispatcher: CommandDispatcher<ShellSource>,
    source: ShellSource,
    prompt: String,
    output: OutputFormat,
}

impl Shell {
    /// Builds a shell for the named source, or the config's default source.
    pub fn new(config: &ShellConfig, source: Option<&str>, output: OutputFormat) -> Result<Self, ShellError> {
        let Some((name, source_config)) = config.get_source(source) else {
            let name = source.unwrap_or(&config.source);
            return Err(ShellError::config(format!(
                "Source '{name}' not found in config file"
            )));
        };
        let source = ShellSource::new(name, source_config);

        let mut dispatcher = CommandDispatcher::<ShellSource>::builder()
            .authorizer(SourcePermissions)
            .build();
        for module in commands::all() {
            dispatcher.register(module)?;
        }
        info!(source = source.name(), "Shell ready");

        Ok(Self {
            dispatcher,
            source,
            prompt: config.prompt.clone(),
            output,
        })
    }

    pub fn source(&self) -> &ShellSource {
        &self.source
    }

    pub fn execute(&self, line: &str) -> ExecReport {
        let result = self.dispatcher.dispatch(self.source.clone(), line);
        let replies = self.source.take_replies();
        match result {
            Ok(()) => ExecReport {
                line: line.to_string(),
                ok: true,
                replies,
                category: None,
                error: None,
            },
            Err(error) => {
                debug!(%error, "Command failed");
                ExecReport {
                    line: line.to_string(),
                    ok: false,
                    replies,
                    category: Some(error.category().to_string()),
                    error: Some(error.to_string()),
                }
            }
        }
    }

    pub fn complete(&self, line: &str) -> CompletionReport {
        CompletionReport {
            line: line.to_string(),
            completions: self.dispatcher.complete(self.source.clone(), line),
        }
    }

    /// Executes or completes one line and renders the report. Blank lines
    /// render nothing.
    pub fn handle(&self, line: &str) -> Result<Option<String>, ShellError> {
        if line.trim().is_empty() {
            return Ok(None);
        }

        let rendered = match line.strip_prefix('?') {
            Some(partial) => self.render_completion(&self.complete(partial))?,
            None => self.render_exec(&self.execute(line))?,
        };
        Ok(Some(rendered).filter(|text| !text.is_empty()))
    }

    /// Runs the read-eval-print loop until input ends or `exit` is read.
    pub async fn run<R, W>(&self, reader: R, mut writer: W, interactive: bool) -> Result<(), ShellError>
    where
        R: AsyncBufRead + Unpin,
        W: AsyncWrite + Unpin,
    {
        let mut lines = reader.lines();
        loop {
            if interactive {
                writer.write_all(self.prompt.as_bytes()).await?;
                writer.flush().await?;
            }

            let Some(line) = lines.next_line().await? else {
                break;
            };
            let line = line.trim_end();
            if matches!(line.trim(), "exit" | "quit") {
                break;
            }

            if let Some(output) = self.handle(line)? {
                writer.write_all(output.as_bytes()).await?;
                writer.write_all(b"\n").await?;
            }
        }
        writer.flush().await?;
        Ok(())
    }

    pub fn render_exec(&self, report: &ExecReport) -> Result<String, ShellError> {
        if self.output == OutputFormat::Json {
            return Ok(serde_json::to_string(report)?);
        }

        let mut lines = report.replies.clone();
        if let (Some(category), Some(error)) = (&report.category, &report.error) {
            lines.push(format!("{category}: {error}"));
        }
        Ok(lines.join("\n"))
    }

    pub fn render_completion(&self, report: &CompletionReport) -> Result<String, ShellError> {
        if self.output == OutputFormat::Json {
            return Ok(serde_json::to_string(report)?);
        }
        if report.completions.is_empty() {
            return Ok("(no completions)".to_string());
        }
        Ok(report.completions.join("  "))
    }
}
