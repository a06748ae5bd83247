//! Speech output: bounded FIFO queue drained by one worker task
//!
//! The engine only produces text. This module owns the queue, the worker
//! and the platform voice. Utterances are spoken strictly in submission
//! order; a full queue drops the newest utterance. Sink failures are logged
//! and counted, never propagated into the analysis pipeline.

use std::process::Command;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use tokio::sync::mpsc::{self, error::TrySendError};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::error::{FormError, Result};
use crate::types::EngineEvent;

// =============================================================================
// SINKS
// =============================================================================

/// Something that can say a line of text. Calls may block until playback
/// finishes.
pub trait SpeechSink: Send + Sync {
    fn speak(&self, text: &str) -> Result<()>;
}

/// Platform text-to-speech through the system's command-line voice
#[derive(Debug, Clone, Default)]
pub struct CommandSpeechSink;

impl CommandSpeechSink {
    fn command(text: &str) -> Command {
        if cfg!(target_os = "macos") {
            let mut cmd = Command::new("say");
            cmd.arg(text);
            cmd
        } else if cfg!(target_os = "windows") {
            let escaped = text.replace('\'', "''");
            let mut cmd = Command::new("powershell");
            cmd.arg("-Command").arg(format!(
                "(New-Object -ComObject SAPI.SpVoice).Speak('{}')",
                escaped
            ));
            cmd
        } else {
            let mut cmd = Command::new("espeak");
            cmd.arg(text);
            cmd
        }
    }
}

impl SpeechSink for CommandSpeechSink {
    fn speak(&self, text: &str) -> Result<()> {
        let output = Self::command(text)
            .output()
            .map_err(|e| FormError::Speech(format!("voice unavailable: {}", e)))?;
        if output.status.success() {
            Ok(())
        } else {
            Err(FormError::Speech(format!(
                "voice exited with {}: {}",
                output.status,
                String::from_utf8_lossy(&output.stderr).trim()
            )))
        }
    }
}

/// Writes utterances to the log instead of a speaker
#[derive(Debug, Clone, Default)]
pub struct LogSpeechSink;

impl SpeechSink for LogSpeechSink {
    fn speak(&self, text: &str) -> Result<()> {
        info!(text, "speak");
        Ok(())
    }
}

// =============================================================================
// QUEUE
// =============================================================================

/// What happens to utterances still queued at shutdown
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DrainPolicy {
    /// Speak everything already queued, then stop
    Drain,
    /// Drop whatever has not started playing
    Discard,
}

/// Totals reported when the worker stops
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SpeechStats {
    pub spoken: u64,
    pub failed: u64,
    /// Rejected at enqueue because the queue was full
    pub dropped: u64,
    /// Left unspoken by a `Discard` shutdown
    pub discarded: u64,
}

/// Producer handle for the speech worker
pub struct SpeechQueue {
    tx: Option<mpsc::Sender<String>>,
    discard: Arc<AtomicBool>,
    dropped: Arc<AtomicU64>,
    worker: Option<JoinHandle<SpeechStats>>,
}

impl SpeechQueue {
    /// Start the worker on the current tokio runtime
    pub fn spawn(sink: Arc<dyn SpeechSink>, capacity: usize) -> Self {
        let (tx, rx) = mpsc::channel(capacity.max(1));
        let discard = Arc::new(AtomicBool::new(false));
        let worker = tokio::spawn(run_worker(rx, sink, discard.clone()));
        Self {
            tx: Some(tx),
            discard,
            dropped: Arc::new(AtomicU64::new(0)),
            worker: Some(worker),
        }
    }

    /// Queue an utterance without waiting. `Ok(false)` when the queue was
    /// full and the utterance was dropped.
    pub fn enqueue(&self, text: impl Into<String>) -> Result<bool> {
        let tx = self.tx.as_ref().ok_or(FormError::QueueClosed)?;
        match tx.try_send(text.into()) {
            Ok(()) => Ok(true),
            Err(TrySendError::Full(text)) => {
                self.dropped.fetch_add(1, Ordering::Relaxed);
                warn!(text = %text, "speech queue full, utterance dropped");
                Ok(false)
            }
            Err(TrySendError::Closed(_)) => Err(FormError::QueueClosed),
        }
    }

    /// Queue every `Speak` event, in order. Returns how many were accepted.
    pub fn enqueue_events<'a>(&self, events: impl IntoIterator<Item = &'a EngineEvent>) -> Result<usize> {
        let mut accepted = 0;
        for event in events {
            if let EngineEvent::Speak { text } = event {
                if self.enqueue(text.as_str())? {
                    accepted += 1;
                }
            }
        }
        Ok(accepted)
    }

    /// Stop accepting utterances and wait for the worker. Playback already
    /// in progress always finishes.
    pub async fn shutdown(mut self, policy: DrainPolicy) -> SpeechStats {
        if policy == DrainPolicy::Discard {
            self.discard.store(true, Ordering::SeqCst);
        }
        // Closing the sender ends the worker's loop once the queue is empty
        self.tx.take();

        let mut stats = match self.worker.take() {
            Some(worker) => worker.await.unwrap_or_else(|e| {
                warn!(error = %e, "speech worker panicked");
                SpeechStats::default()
            }),
            None => SpeechStats::default(),
        };
        stats.dropped = self.dropped.load(Ordering::Relaxed);
        info!(
            spoken = stats.spoken,
            failed = stats.failed,
            dropped = stats.dropped,
            discarded = stats.discarded,
            ?policy,
            "speech queue stopped"
        );
        stats
    }
}

async fn run_worker(
    mut rx: mpsc::Receiver<String>,
    sink: Arc<dyn SpeechSink>,
    discard: Arc<AtomicBool>,
) -> SpeechStats {
    let mut stats = SpeechStats::default();
    while let Some(text) = rx.recv().await {
        if discard.load(Ordering::SeqCst) {
            stats.discarded += 1;
            continue;
        }
        debug!(text = %text, "speaking");
        let sink = sink.clone();
        let outcome = tokio::task::spawn_blocking(move || sink.speak(&text)).await;
        match outcome {
            Ok(Ok(())) => stats.spoken += 1,
            Ok(Err(e)) => {
                stats.failed += 1;
                warn!(error = %e, "speech failed");
            }
            Err(e) => {
                stats.failed += 1;
                warn!(error = %e, "speech task aborted");
            }
        }
    }
    stats
}

// =============================================================================
// TESTS
// =============================================================================
