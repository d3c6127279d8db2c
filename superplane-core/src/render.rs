//! Output rendering.
//!
//! Structured formats (JSON, YAML) are a uniform serialization of the value.
//! Text is laid out by the command itself through [`Renderer::render_text`],
//! and the renderer refuses calls that do not match its format.

use crate::error::{CliError, CliResult};
use serde::Serialize;
use std::fmt;
use std::io::{self, Write};
use std::str::FromStr;
use std::sync::{Arc, Mutex, PoisonError};

/// Supported output formats.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OutputFormat {
    #[default]
    Text,
    Json,
    Yaml,
}

impl OutputFormat {
    pub fn as_str(&self) -> &'static str {
        match self {
            OutputFormat::Text => "text",
            OutputFormat::Json => "json",
            OutputFormat::Yaml => "yaml",
        }
    }
}

impl fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for OutputFormat {
    type Err = CliError;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        match raw {
            "text" => Ok(OutputFormat::Text),
            "json" => Ok(OutputFormat::Json),
            "yaml" => Ok(OutputFormat::Yaml),
            _ => Err(CliError::InvalidFormat(format!(
                "invalid output format {:?}, expected one of: text, json, yaml",
                raw
            ))),
        }
    }
}

/// Writes command results to the output sink in the requested format.
pub struct Renderer {
    format: OutputFormat,
    sink: Box<dyn Write + Send>,
}

impl fmt::Debug for Renderer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Renderer")
            .field("format", &self.format)
            .finish_non_exhaustive()
    }
}

impl Renderer {
    /// Creates a renderer; an empty format means `text`.
    pub fn new(raw_format: &str, sink: Box<dyn Write + Send>) -> CliResult<Self> {
        let format = if raw_format.is_empty() {
            OutputFormat::Text
        } else {
            raw_format.parse()?
        };

        Ok(Self { format, sink })
    }

    /// Renderer writing to standard output.
    pub fn stdout(raw_format: &str) -> CliResult<Self> {
        Self::new(raw_format, Box::new(io::stdout()))
    }

    pub fn format(&self) -> OutputFormat {
        self.format
    }

    pub fn is_text(&self) -> bool {
        self.format == OutputFormat::Text
    }

    /// Serializes `value` as JSON or YAML. Fails under text output.
    pub fn render<T: Serialize + ?Sized>(&mut self, value: &T) -> CliResult<()> {
        let mut payload = match self.format {
            OutputFormat::Json => serde_json::to_string_pretty(value)?,
            OutputFormat::Yaml => serde_yaml::to_string(value)?,
            OutputFormat::Text => {
                return Err(CliError::unsupported("text output requires render_text"))
            }
        };

        if !payload.ends_with('\n') {
            payload.push('\n');
        }

        self.sink
            .write_all(payload.as_bytes())
            .and_then(|_| self.sink.flush())
            .map_err(|e| CliError::io("failed to write output", e))
    }

    /// Hands the sink to a command-specific text layout. Fails under JSON/YAML.
    pub fn render_text<F>(&mut self, render: F) -> CliResult<()>
    where
        F: FnOnce(&mut dyn Write) -> io::Result<()>,
    {
        if !self.is_text() {
            return Err(CliError::unsupported(
                "render_text can only be used with text output",
            ));
        }

        render(self.sink.as_mut())
            .and_then(|_| self.sink.flush())
            .map_err(|e| CliError::io("failed to write output", e))
    }
}

/// In-memory sink whose clones share one buffer.
#[derive(Debug, Clone, Default)]
pub struct SharedBuffer {
    inner: Arc<Mutex<Vec<u8>>>,
}

impl SharedBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Everything written so far, lossily decoded as UTF-8.
    pub fn contents(&self) -> String {
        let bytes = self.inner.lock().unwrap_or_else(PoisonError::into_inner);
        String::from_utf8_lossy(&bytes).into_owned()
    }
}

impl Write for SharedBuffer {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.inner
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}
