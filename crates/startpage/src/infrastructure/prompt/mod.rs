//! Terminal implementation of the [`Prompter`] dialogs.
//!
//! Each dialog writes a prompt and awaits one line of input.  End of input,
//! an I/O error, or a blank answer dismisses the dialog.
//!
//! The reader and writer are generic so tests can drive the prompter with
//! in-memory buffers; [`TerminalPrompter::stdio`] wires it to the process's
//! stdin and stdout.

pub mod mock;

use std::path::PathBuf;

use async_trait::async_trait;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt, BufReader, Stdin, Stdout};
use tokio::sync::Mutex;
use tracing::debug;

use crate::application::workflow::{Confirmation, Prompter, UrlForm};

struct Console<R, W> {
    reader: R,
    writer: W,
}

/// Line-oriented prompter over an async reader/writer pair.
pub struct TerminalPrompter<R, W> {
    console: Mutex<Console<R, W>>,
}

impl TerminalPrompter<BufReader<Stdin>, Stdout> {
    /// A prompter on the process's stdin/stdout.
    pub fn stdio() -> Self {
        Self::new(BufReader::new(tokio::io::stdin()), tokio::io::stdout())
    }
}

impl<R, W> TerminalPrompter<R, W>
where
    R: AsyncBufRead + Unpin + Send,
    W: AsyncWrite + Unpin + Send,
{
    pub fn new(reader: R, writer: W) -> Self {
        Self {
            console: Mutex::new(Console { reader, writer }),
        }
    }

    /// Consumes the prompter and returns the writer, e.g. to inspect output.
    pub fn into_writer(self) -> W {
        self.console.into_inner().writer
    }

    /// Writes `prompt` and reads one trimmed line; `None` if dismissed.
    async fn ask(&self, prompt: &str) -> Option<String> {
        let mut console = self.console.lock().await;
        let Console { reader, writer } = &mut *console;

        if let Err(e) = write_prompt(writer, prompt).await {
            debug!("prompt could not be written: {e}");
            return None;
        }

        let mut line = String::new();
        match reader.read_line(&mut line).await {
            Ok(0) => None,
            Ok(_) => Some(line.trim().to_string()).filter(|answer| !answer.is_empty()),
            Err(e) => {
                debug!("prompt input could not be read: {e}");
                None
            }
        }
    }
}

async fn write_prompt<W: AsyncWrite + Unpin>(writer: &mut W, prompt: &str) -> std::io::Result<()> {
    writer.write_all(prompt.as_bytes()).await?;
    writer.flush().await
}

/// Title and body text for a confirmation dialog.
pub fn describe(request: &Confirmation) -> (&'static str, String) {
    match request {
        Confirmation::DeleteCategory { name, urls, .. } => (
            "Delete Category?",
            match urls {
                0 => format!("\"{name}\" will be deleted."),
                1 => format!("\"{name}\" and its 1 URL will be deleted."),
                n => format!("\"{name}\" and its {n} URLs will be deleted."),
            },
        ),
        Confirmation::RemoveUrl { name, .. } => ("Delete URL?", format!("\"{name}\" will be removed.")),
    }
}

#[async_trait]
impl<R, W> Prompter for TerminalPrompter<R, W>
where
    R: AsyncBufRead + Unpin + Send,
    W: AsyncWrite + Unpin + Send,
{
    async fn category_name(&self) -> Option<String> {
        self.ask("Category name: ").await
    }

    async fn url_entry(&self) -> Option<UrlForm> {
        let name = self.ask("Name: ").await?;
        let url = self.ask("URL: ").await?;
        Some(UrlForm { name, url })
    }

    async fn confirm(&self, request: &Confirmation) -> bool {
        let (title, body) = describe(request);
        let answer = self.ask(&format!("{title} {body} [y/N] ")).await;
        matches!(answer.as_deref(), Some("y" | "Y" | "yes" | "Yes" | "YES"))
    }

    async fn import_file(&self) -> Option<PathBuf> {
        self.ask("File to import: ").await.map(PathBuf::from)
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
