//! JSONL audit trail logging.
//!
//! Each keeper run appends entries to an audit.jsonl file, one JSON object
//! per line, in the same shape as the pool's own event log.

use std::fs::{self, OpenOptions};
use std::io::{BufWriter, Write};
use std::path::Path;

use chrono::{DateTime, Utc};
use serde::Serialize;

use poolbook::{ApplyOutcome, PoolError, PoolEvent, PoolState};

use crate::error::Result;

/// An audit entry written to the JSONL trail.
///
/// Payloads sit under `data` rather than being flattened: share and value
/// amounts are `u128`, which only the direct JSON writer handles.
#[derive(Debug, Clone, Serialize)]
pub struct AuditEvent<T> {
    pub event: &'static str,
    pub ts: DateTime<Utc>,
    pub data: T,
}

/// Append-only audit logger.
pub struct AuditLog {
    writer: BufWriter<std::fs::File>,
}

impl AuditLog {
    /// Open (or create) the audit log file for appending.
    pub fn open(path: &Path) -> Result<Self> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }

        let file = OpenOptions::new().create(true).append(true).open(path)?;

        Ok(Self {
            writer: BufWriter::new(file),
        })
    }

    /// Log an event with a serializable payload.
    pub fn log<T: Serialize>(&mut self, event: &'static str, data: T) -> Result<()> {
        let entry = AuditEvent {
            event,
            ts: Utc::now(),
            data,
        };
        let json = serde_json::to_string(&entry).map_err(std::io::Error::other)?;
        writeln!(self.writer, "{json}")?;
        self.writer.flush()?;
        Ok(())
    }

    /// Log an event with no additional data.
    pub fn log_simple(&mut self, event: &'static str) -> Result<()> {
        self.log(event, serde_json::json!({}))
    }
}

#[derive(Serialize)]
struct RunStarted<'a> {
    script_file: &'a str,
    admin: u64,
    steps: usize,
}

#[derive(Serialize)]
struct StepEntry<'a> {
    index: usize,
    op: &'static str,
    input: &'a PoolEvent,
    #[serde(skip_serializing_if = "Option::is_none")]
    outcome: Option<&'a ApplyOutcome>,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<StepError<'a>>,
}

#[derive(Serialize)]
struct StepError<'a> {
    kind: &'static str,
    message: String,
    detail: &'a PoolError,
}

#[derive(Serialize)]
struct RunCompleted<'a> {
    applied: usize,
    rejected: usize,
    state: &'a PoolState,
}

/// Convenience: log a run start event.
pub fn log_run_started(
    audit: &mut AuditLog,
    script_file: &str,
    admin: u64,
    steps: usize,
) -> Result<()> {
    audit.log(
        "run_started",
        RunStarted {
            script_file,
            admin,
            steps,
        },
    )
}

/// Convenience: log one applied or rejected step.
pub fn log_step(
    audit: &mut AuditLog,
    index: usize,
    input: &PoolEvent,
    result: &std::result::Result<ApplyOutcome, PoolError>,
) -> Result<()> {
    let (event, entry) = match result {
        Ok(outcome) => (
            "step_applied",
            StepEntry {
                index,
                op: input.name(),
                input,
                outcome: Some(outcome),
                error: None,
            },
        ),
        Err(e) => (
            "step_rejected",
            StepEntry {
                index,
                op: input.name(),
                input,
                outcome: None,
                error: Some(StepError {
                    kind: e.kind(),
                    message: e.to_string(),
                    detail: e,
                }),
            },
        ),
    };
    audit.log(event, entry)
}

/// Convenience: log run completion with the final pool totals.
pub fn log_run_completed(
    audit: &mut AuditLog,
    applied: usize,
    rejected: usize,
    state: &PoolState,
) -> Result<()> {
    audit.log(
        "run_completed",
        RunCompleted {
            applied,
            rejected,
            state,
        },
    )
}
