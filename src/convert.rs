//! Chinese script conversion (traditional to simplified).
//!
//! The pipeline only needs `convert(text) -> text`; [`ScriptConverter`] is
//! that seam. Two implementations ship with the crate:
//!
//! - [`Passthrough`]: returns the input unchanged.
//! - [`OpenCc`]: pipes text through the `opencc` command-line tool, e.g.
//!   `opencc -c tw2s.json`.

use crate::config::{ConverterKind, SiteConfig};
use crate::error::ConvertError;
use std::process::Stdio;
use tokio::io::AsyncWriteExt;
use tokio::process::Command;
use tracing::{debug, instrument};

/// Rewrites text from one Chinese script to another.
///
/// Conversion is async so an external process never blocks the other
/// articles sharing the runtime with the caller.
///
/// # Arguments
///
/// * `text` - Title or body text, already normalized.
///
/// # Returns
///
/// The converted text, or a [`ConvertError`] that aborts the article.
pub trait ScriptConverter {
    async fn convert(&self, text: &str) -> Result<String, ConvertError>;
}

/// Returns its input unchanged.
#[derive(Debug, Clone, Copy, Default)]
pub struct Passthrough;

impl ScriptConverter for Passthrough {
    async fn convert(&self, text: &str) -> Result<String, ConvertError> {
        Ok(text.to_string())
    }
}

/// Runs `<program> -c <config>` once per call, text in on stdin, result on stdout.
#[derive(Debug, Clone)]
pub struct OpenCc {
    program: String,
    config: String,
}

impl OpenCc {
    /// The `opencc` binary from `PATH` with the given profile, e.g. `tw2s.json`.
    pub fn new(config: impl Into<String>) -> Self {
        Self::with_program("opencc", config)
    }

    pub fn with_program(program: impl Into<String>, config: impl Into<String>) -> Self {
        Self {
            program: program.into(),
            config: config.into(),
        }
    }
}

impl ScriptConverter for OpenCc {
    #[instrument(level = "debug", skip_all, fields(program = %self.program, config = %self.config))]
    async fn convert(&self, text: &str) -> Result<String, ConvertError> {
        let spawn_err = |source| ConvertError::Spawn {
            program: self.program.clone(),
            source,
        };

        let mut child = Command::new(&self.program)
            .arg("-c")
            .arg(&self.config)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(spawn_err)?;

        // Write stdin while stdout drains; stdin closes when the writer finishes.
        let stdin = child.stdin.take();
        let write = async move {
            if let Some(mut stdin) = stdin {
                stdin.write_all(text.as_bytes()).await?;
            }
            Ok::<(), std::io::Error>(())
        };
        let (written, output) = tokio::join!(write, child.wait_with_output());
        let output = output.map_err(spawn_err)?;

        if !output.status.success() {
            return Err(ConvertError::Exit {
                program: self.program.clone(),
                status: output.status.to_string(),
                stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            });
        }
        written.map_err(spawn_err)?;
        debug!(bytes_in = text.len(), bytes_out = output.stdout.len(), "converted");
        Ok(String::from_utf8(output.stdout)?)
    }
}

/// Either converter, chosen from [`SiteConfig::converter`].
#[derive(Debug, Clone)]
pub enum Converter {
    Passthrough(Passthrough),
    OpenCc(OpenCc),
}

impl Converter {
    pub fn from_config(site: &SiteConfig) -> Self {
        match site.converter {
            ConverterKind::None => Converter::Passthrough(Passthrough),
            ConverterKind::Opencc => Converter::OpenCc(OpenCc::new(site.opencc_config.clone())),
        }
    }
}

impl ScriptConverter for Converter {
    async fn convert(&self, text: &str) -> Result<String, ConvertError> {
        match self {
            Converter::Passthrough(c) => c.convert(text).await,
            Converter::OpenCc(c) => c.convert(text).await,
        }
    }
}
