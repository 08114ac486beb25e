//! JSONL file sink for session events.
//!
//! Each [`SessionEvent`] is serialized as a single JSON line carrying
//! `session_id`, `type`, `timestamp`, and the event payload, appended via a
//! buffered writer. This is the machine-readable transcript of a run,
//! separate from `tracing`-based diagnostic logs.

use roundtable_application::{EventSink, SessionEvent};
use roundtable_domain::SessionId;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use tracing::warn;

/// JSONL event log that writes one JSON object per line.
///
/// Thread-safe via `Mutex<BufWriter<File>>`. Flushes after every line and on
/// `Drop`; the log is append-only and must survive a crash mid-session.
pub struct JsonlEventLog {
    writer: Mutex<BufWriter<File>>,
    path: PathBuf,
}

impl JsonlEventLog {
    /// Create a new log writing to the given path.
    ///
    /// Creates the file (and parent directories) if they don't exist.
    /// Returns `None` if the file cannot be created.
    pub fn new(path: impl AsRef<Path>) -> Option<Self> {
        let path = path.as_ref();

        if let Some(parent) = path.parent()
            && let Err(e) = std::fs::create_dir_all(parent)
        {
            warn!("Could not create event log directory {}: {}", parent.display(), e);
            return None;
        }

        let file = match File::create(path) {
            Ok(f) => f,
            Err(e) => {
                warn!("Could not create event log file {}: {}", path.display(), e);
                return None;
            }
        };

        Some(Self {
            writer: Mutex::new(BufWriter::new(file)),
            path: path.to_path_buf(),
        })
    }

    /// Get the path to the log file.
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl EventSink for JsonlEventLog {
    fn publish(&self, session_id: &SessionId, event: SessionEvent) {
        let timestamp = chrono::Utc::now().to_rfc3339_opts(chrono::SecondsFormat::Millis, true);

        // SessionEvent serializes as {"type": ..., "data": ...}; annotate the
        // record with the topic and timestamp at the top level.
        let record = match serde_json::to_value(&event) {
            Ok(serde_json::Value::Object(mut map)) => {
                map.insert(
                    "session_id".to_string(),
                    serde_json::Value::String(session_id.to_string()),
                );
                map.insert("timestamp".to_string(), serde_json::Value::String(timestamp));
                serde_json::Value::Object(map)
            }
            Ok(other) => serde_json::json!({
                "session_id": session_id,
                "timestamp": timestamp,
                "data": other,
            }),
            Err(e) => {
                warn!(session = %session_id, "failed to serialize event: {}", e);
                return;
            }
        };

        let Ok(line) = serde_json::to_string(&record) else {
            return;
        };

        if let Ok(mut writer) = self.writer.lock() {
            let _ = writeln!(writer, "{}", line);
            let _ = writer.flush();
        }
    }
}

impl Drop for JsonlEventLog {
    fn drop(&mut self) {
        if let Ok(mut writer) = self.writer.lock() {
            let _ = writer.flush();
        }
    }
}
