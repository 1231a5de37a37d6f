//! Foreground capture loop.
//!
//! Speech-to-text lives outside this crate; anything that can hand over a
//! lowercase transcript implements `TranscriptSource`. The bundled source
//! reads typed lines from stdin.

use async_trait::async_trait;
use regex::Regex;
use std::io::BufRead;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;

use crate::core::Assistant;
use crate::error::Result;

/// Pause after a capture error before listening again.
const ERROR_BACKOFF: Duration = Duration::from_secs(1);

/// Lines buffered between the reader thread and the capture loop.
const LINE_BUFFER: usize = 16;

#[async_trait]
pub trait TranscriptSource: Send {
    /// Next transcript, or `None` once the source is closed.
    ///
    /// Must be cancel safe: the capture loop drops a pending `listen` when
    /// the assistant stops.
    async fn listen(&mut self) -> Result<Option<String>>;
}

/// Reads one command per line from stdin, or any other blocking reader.
///
/// Reads happen on a dedicated thread so a pending read never holds up
/// runtime shutdown.
pub struct StdinSource {
    lines: mpsc::Receiver<std::io::Result<String>>,
}

impl StdinSource {
    pub fn new() -> Self {
        Self::from_reader(std::io::BufReader::new(std::io::stdin()))
    }

    pub fn from_reader<R>(reader: R) -> Self
    where
        R: BufRead + Send + 'static,
    {
        let (tx, rx) = mpsc::channel(LINE_BUFFER);
        let spawned = std::thread::Builder::new()
            .name("neurofusion-input".to_string())
            .spawn(move || {
                for line in reader.lines() {
                    let failed = line.is_err();
                    if tx.blocking_send(line).is_err() || failed {
                        break;
                    }
                }
            });
        if let Err(e) = spawned {
            tracing::error!("Failed to start input reader: {}", e);
        }

        Self { lines: rx }
    }
}

impl Default for StdinSource {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl TranscriptSource for StdinSource {
    async fn listen(&mut self) -> Result<Option<String>> {
        match self.lines.recv().await {
            Some(line) => Ok(Some(line?.to_lowercase())),
            None => Ok(None),
        }
    }
}

/// Remove whole-word occurrences of the wake word and trim the rest.
pub fn strip_wake_word(text: &str, wake_word: &str) -> String {
    let wake_word = wake_word.trim();
    if wake_word.is_empty() {
        return text.trim().to_string();
    }

    let pattern = format!(r"(?i)\b{}\b[,.!]?", regex::escape(wake_word));
    match Regex::new(&pattern) {
        Ok(re) => re
            .replace_all(text, "")
            .split_whitespace()
            .collect::<Vec<_>>()
            .join(" "),
        Err(e) => {
            tracing::warn!("Bad wake word {:?}: {}", wake_word, e);
            text.trim().to_string()
        }
    }
}

/// Feed transcripts to the assistant until `exit`/`quit` or end of input.
pub async fn run_capture_loop<S: TranscriptSource>(assistant: Arc<Assistant>, mut source: S) {
    tracing::info!("Listening for commands");

    while assistant.is_running() {
        let heard = tokio::select! {
            heard = source.listen() => heard,
            _ = assistant.stopped() => break,
        };
        let text = match heard {
            Ok(Some(text)) => text,
            Ok(None) => {
                tracing::info!("Input closed");
                break;
            }
            Err(e) => {
                tracing::error!("Capture error: {}", e);
                tokio::time::sleep(ERROR_BACKOFF).await;
                continue;
            }
        };

        let wake_word = assistant.settings().await.wake_word;
        let command = strip_wake_word(&text, &wake_word);
        if command.is_empty() {
            continue;
        }

        let response = assistant.execute(&command).await;
        println!("AI: {}", response);
    }

    tracing::info!("Capture loop stopped");
}

/// Run the capture loop, then keep going until the assistant is told to
/// exit. Closed input alone does not end the session.
pub async fn capture_until_exit<S: TranscriptSource>(assistant: Arc<Assistant>, source: S) {
    run_capture_loop(assistant.clone(), source).await;
    if assistant.is_running() {
        tracing::info!("Input closed; still serving until exit or Ctrl+C");
        assistant.stopped().await;
    }
}
