//! File-based persistence via JSON Lines event sourcing.
//!
//! Events are stored as one JSON object per line (`.jsonl` format).
//! A pool is restored by replaying its log against the same [`PoolConfig`].
//!
//! # Usage
//!
//! ```ignore
//! use poolbook::{Pool, PoolConfig, AccountId};
//! use std::path::Path;
//!
//! let config = PoolConfig::new(AccountId(1));
//! pool.save(Path::new("pool.jsonl")).unwrap();
//! let pool = Pool::load(config, Path::new("pool.jsonl")).unwrap();
//! ```

use std::fs::{File, OpenOptions};
use std::io::{self, BufRead, BufReader, BufWriter, Write};
use std::path::Path;

use crate::event::PoolEvent;
use crate::oracle::ValueOracle;
use crate::pool::{Pool, PoolConfig};

/// Write `events` to `path`, replacing whatever was there.
pub fn save_events(events: &[PoolEvent], path: &Path) -> io::Result<()> {
    write_lines(File::create(path)?, events)
}

/// Append `events` to `path`, creating the file if it does not exist.
pub fn append_events(events: &[PoolEvent], path: &Path) -> io::Result<()> {
    let file = OpenOptions::new().create(true).append(true).open(path)?;
    write_lines(file, events)
}

fn write_lines(file: File, events: &[PoolEvent]) -> io::Result<()> {
    let mut out = BufWriter::new(file);
    for event in events {
        serde_json::to_writer(&mut out, event)?;
        out.write_all(b"\n")?;
    }
    out.flush()
}

/// Read every event from a JSON Lines log, skipping blank lines.
///
/// A line that fails to parse is reported by its 1-based number, together
/// with the operation it names when it names one.
pub fn load_events(path: &Path) -> io::Result<Vec<PoolEvent>> {
    let reader = BufReader::new(File::open(path)?);
    let mut events = Vec::new();

    for (idx, line) in reader.lines().enumerate() {
        let line = line?;
        let line = line.trim();
        if !line.is_empty() {
            events.push(parse_event(line, idx + 1)?);
        }
    }

    Ok(events)
}

fn parse_event(line: &str, number: usize) -> io::Result<PoolEvent> {
    serde_json::from_str(line).map_err(|e| {
        // Events are externally tagged: `{"deposit": {...}}`
        let op = serde_json::from_str::<serde_json::Value>(line)
            .ok()
            .and_then(|v| match v {
                serde_json::Value::Object(map) if map.len() == 1 => map.keys().next().cloned(),
                _ => None,
            });
        let msg = match op {
            Some(op) => format!("line {number} ({op}): {e}"),
            None => format!("line {number}: {e}"),
        };
        io::Error::new(io::ErrorKind::InvalidData, msg)
    })
}

impl<O: ValueOracle> Pool<O> {
    /// Save the pool's event log to a file.
    ///
    /// Requires the `persistence` feature.
    pub fn save(&self, path: &Path) -> io::Result<()> {
        save_events(self.events(), path)
    }

    /// Append the in-memory event log to `path`, then clear it.
    ///
    /// Returns the number of events written. Called periodically, this keeps
    /// memory bounded while the file stays a complete replay log.
    pub fn flush_events(&mut self, path: &Path) -> io::Result<usize> {
        append_events(self.events(), path)?;
        let written = self.events().len();
        self.clear_events();
        Ok(written)
    }
}

impl Pool {
    /// Load a pool by replaying a saved event log.
    ///
    /// Requires the `persistence` feature.
    pub fn load(config: PoolConfig, path: &Path) -> io::Result<Self> {
        let events = load_events(path)?;
        Ok(Self::replay(config, &events))
    }
}
