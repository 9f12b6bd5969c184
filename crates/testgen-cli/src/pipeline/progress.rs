// crates/testgen-cli/src/pipeline/progress.rs
// ============================================================================
// Module: Progress Events
// Description: The driver's progress-event shape and the Sink-style trait
//              implementations deliver it through (spec.md §6).
// Purpose: Let a caller observe stage-by-stage job progress without coupling
//          the driver to any one transport.
// Dependencies: serde, serde_json, std::io, std::sync
// ============================================================================

//! ## Overview
//! [`ProgressEvent`] is emitted once per stage transition: `pending` before a
//! stage starts queuing, `running` when it begins work, `completed` on
//! success, `failed` on the first error that ends the job (spec.md §6, §7:
//! "the progress stream carries a final event `status=failed` with the
//! triggering stage"). [`ProgressSink`] is deliberately narrow: one method,
//! no assumptions about delivery transport. [`LogSink`] is the reference
//! implementation, writing one JSON object per line to any `Write`.

use std::io::Write;
use std::sync::Mutex;

use serde::Deserialize;
use serde::Serialize;
use thiserror::Error;

/// A stage's lifecycle state at the moment a [`ProgressEvent`] was emitted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProgressStatus {
    /// The stage is queued but has not started.
    Pending,
    /// The stage is actively running.
    Running,
    /// The stage finished without error.
    Completed,
    /// The stage (and therefore the job) failed.
    Failed,
}

/// One progress event: `(job_id, stage_id, status, progress_percent)`
/// (spec.md §6).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProgressEvent {
    /// The job this event belongs to.
    pub job_id: String,
    /// Which of the six pipeline stages this event describes, 1-indexed
    /// (spec.md §6: `stage_id ∈ 1..6`).
    pub stage_id: u8,
    /// The stage's lifecycle state.
    pub status: ProgressStatus,
    /// Coarse completion percentage for the whole job, 0-100.
    pub progress_percent: u8,
}

/// Errors a [`ProgressSink`] implementation can raise while delivering an
/// event.
#[derive(Debug, Error)]
pub enum SinkError {
    /// The sink's underlying writer failed.
    #[error("progress sink write failed: {0}")]
    WriteFailed(String),
}

/// Delivers [`ProgressEvent`]s to wherever a caller wants them observed.
///
/// Kept separate from [`crate::pipeline::store::ArtifactStore`] so a future
/// implementation could redact or route progress independently of artifact
/// persistence (spec.md §9 ambient-stack notes).
pub trait ProgressSink: Send + Sync {
    /// Delivers one progress event.
    ///
    /// # Errors
    ///
    /// Returns [`SinkError`] when delivery fails. A failed delivery does not
    /// retroactively undo the stage transition it describes.
    fn emit(&self, event: &ProgressEvent) -> Result<(), SinkError>;
}

/// Writes one JSON object per line to any `Write`.
pub struct LogSink<W: Write + Send> {
    /// Output writer, guarded so multiple stages can emit from the same
    /// sink without interleaving partial lines.
    writer: Mutex<W>,
}

impl<W: Write + Send> LogSink<W> {
    /// Builds a log sink writing to `writer`.
    pub fn new(writer: W) -> Self {
        Self { writer: Mutex::new(writer) }
    }
}

impl<W: Write + Send> ProgressSink for LogSink<W> {
    fn emit(&self, event: &ProgressEvent) -> Result<(), SinkError> {
        #[expect(clippy::unwrap_used, reason = "poisoned only on a panicking holder; this crate never panics while holding the lock")]
        let mut guard = self.writer.lock().unwrap();
        serde_json::to_writer(&mut *guard, event).map_err(|err| SinkError::WriteFailed(err.to_string()))?;
        guard.write_all(b"\n").map_err(|err| SinkError::WriteFailed(err.to_string()))
    }
}

/// A sink that records every event in memory, in emission order. Used by
/// tests that assert on the exact progress transcript of a job.
#[derive(Default)]
pub struct RecordingSink {
    /// Accumulated events, guarded for interior mutability behind a shared
    /// reference.
    events: Mutex<Vec<ProgressEvent>>,
}

impl RecordingSink {
    /// Builds an empty recording sink.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns a snapshot of every event recorded so far, in emission order.
    #[must_use]
    pub fn events(&self) -> Vec<ProgressEvent> {
        #[expect(clippy::unwrap_used, reason = "poisoned only on a panicking holder; this crate never panics while holding the lock")]
        self.events.lock().unwrap().clone()
    }
}

impl ProgressSink for RecordingSink {
    fn emit(&self, event: &ProgressEvent) -> Result<(), SinkError> {
        #[expect(clippy::unwrap_used, reason = "poisoned only on a panicking holder; this crate never panics while holding the lock")]
        self.events.lock().unwrap().push(event.clone());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn log_sink_writes_one_json_line_per_event() {
        let buffer: Vec<u8> = Vec::new();
        let sink = LogSink::new(buffer);
        sink.emit(&ProgressEvent { job_id: "job-1".to_string(), stage_id: 1, status: ProgressStatus::Running, progress_percent: 10 }).expect("emit");
        sink.emit(&ProgressEvent { job_id: "job-1".to_string(), stage_id: 1, status: ProgressStatus::Completed, progress_percent: 16 }).expect("emit");
        #[expect(clippy::unwrap_used, reason = "test-only lock acquisition")]
        let guard = sink.writer.lock().unwrap();
        let text = String::from_utf8(guard.clone()).expect("utf8");
        assert_eq!(text.lines().count(), 2);
    }

    #[test]
    fn recording_sink_preserves_emission_order() {
        let sink = RecordingSink::new();
        sink.emit(&ProgressEvent { job_id: "job-1".to_string(), stage_id: 1, status: ProgressStatus::Running, progress_percent: 0 }).expect("emit");
        sink.emit(&ProgressEvent { job_id: "job-1".to_string(), stage_id: 2, status: ProgressStatus::Running, progress_percent: 16 }).expect("emit");
        let events = sink.events();
        assert_eq!(events.len(), 2);
        assert_eq!(events[0].stage_id, 1);
        assert_eq!(events[1].stage_id, 2);
    }
}
