//! Clipboard adapters.
//!
//! The clipboard is write-only and best effort. Writes still return an
//! explicit [`ClipboardError`] so callers can log or surface failures.

use std::process::Stdio;
use std::sync::Arc;

use async_trait::async_trait;
use thiserror::Error;
use tokio::io::AsyncWriteExt;
use tokio::process::Command;
use tokio::sync::RwLock;

/// Clipboard error type.
#[derive(Error, Debug)]
pub enum ClipboardError {
    /// No clipboard is configured.
    #[error("Clipboard unavailable")]
    Unavailable,

    /// The clipboard command could not be run or fed.
    #[error("Clipboard I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The clipboard command exited unsuccessfully.
    #[error("Clipboard command `{command}` exited with {status}")]
    CommandFailed { command: String, status: String },
}

/// Destination for exported text.
#[async_trait]
pub trait Clipboard: Send + Sync + std::fmt::Debug {
    async fn write_text(&self, text: &str) -> Result<(), ClipboardError>;
}

/// Clipboard kept in process memory.
#[derive(Debug, Clone, Default)]
pub struct MemoryClipboard {
    contents: Arc<RwLock<Option<String>>>,
}

impl MemoryClipboard {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Last written text.
    pub async fn contents(&self) -> Option<String> {
        self.contents.read().await.clone()
    }
}

#[async_trait]
impl Clipboard for MemoryClipboard {
    async fn write_text(&self, text: &str) -> Result<(), ClipboardError> {
        *self.contents.write().await = Some(text.to_string());
        Ok(())
    }
}

/// Clipboard that always fails. Used when nothing is configured.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoClipboard;

#[async_trait]
impl Clipboard for NoClipboard {
    async fn write_text(&self, _text: &str) -> Result<(), ClipboardError> {
        Err(ClipboardError::Unavailable)
    }
}

/// Pipes text into an external program such as `wl-copy`, `xclip` or `pbcopy`.
#[derive(Debug, Clone)]
pub struct CommandClipboard {
    command: String,
    args: Vec<String>,
}

impl CommandClipboard {
    pub fn new(command: impl Into<String>, args: Vec<String>) -> Self {
        Self {
            command: command.into(),
            args,
        }
    }
}

#[async_trait]
impl Clipboard for CommandClipboard {
    async fn write_text(&self, text: &str) -> Result<(), ClipboardError> {
        let mut child = Command::new(&self.command)
            .args(&self.args)
            .stdin(Stdio::piped())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .spawn()?;

        if let Some(mut stdin) = child.stdin.take() {
            stdin.write_all(text.as_bytes()).await?;
            stdin.shutdown().await?;
        }

        let status = child.wait().await?;
        if status.success() {
            Ok(())
        } else {
            Err(ClipboardError::CommandFailed {
                command: self.command.clone(),
                status: status.to_string(),
            })
        }
    }
}
