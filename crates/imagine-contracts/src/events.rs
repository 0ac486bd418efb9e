use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::PathBuf;
use std::sync::{Arc, Mutex};

use anyhow::{anyhow, Context};
use chrono::{SecondsFormat, Utc};
use serde_json::{Map, Value};
use uuid::Uuid;

pub type EventPayload = Map<String, Value>;

/// Every line the session log can contain, in the order a full run produces them.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventKind {
    SessionStarted,
    ConfigurationFailed,
    TargetSkipped,
    TargetsConfigured,
    TargetStarted,
    ArtifactCreated,
    TargetFailed,
    SessionFinished,
}

impl EventKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::SessionStarted => "session_started",
            Self::ConfigurationFailed => "configuration_failed",
            Self::TargetSkipped => "target_skipped",
            Self::TargetsConfigured => "targets_configured",
            Self::TargetStarted => "target_started",
            Self::ArtifactCreated => "artifact_created",
            Self::TargetFailed => "target_failed",
            Self::SessionFinished => "session_finished",
        }
    }
}

/// Append-only JSONL log for one interactive session.
///
/// Each line carries `type`, `session_id`, `seq` and `ts`. `seq` starts at 1 and is assigned
/// under the write lock, so it always matches line order. Payload keys never replace these.
#[derive(Debug, Clone)]
pub struct EventWriter {
    inner: Arc<SessionLog>,
}

#[derive(Debug)]
struct SessionLog {
    path: PathBuf,
    session_id: String,
    next_seq: Mutex<u64>,
}

impl EventWriter {
    pub fn new(path: impl Into<PathBuf>, session_id: impl Into<String>) -> Self {
        Self {
            inner: Arc::new(SessionLog {
                path: path.into(),
                session_id: session_id.into(),
                next_seq: Mutex::new(1),
            }),
        }
    }

    pub fn for_new_session(path: impl Into<PathBuf>) -> Self {
        Self::new(path, Uuid::new_v4().to_string())
    }

    pub fn session_id(&self) -> &str {
        &self.inner.session_id
    }

    /// Writes one event and returns it as written. A failed write does not consume a `seq`.
    pub fn emit(&self, kind: EventKind, payload: EventPayload) -> anyhow::Result<Value> {
        let log = &self.inner;
        let mut next_seq = log
            .next_seq
            .lock()
            .map_err(|_| anyhow!("session log lock poisoned"))?;

        let mut event = Map::new();
        event.insert("type".to_string(), Value::from(kind.as_str()));
        event.insert("session_id".to_string(), Value::from(log.session_id.as_str()));
        event.insert("seq".to_string(), Value::from(*next_seq));
        event.insert(
            "ts".to_string(),
            Value::from(Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true)),
        );
        for (key, value) in payload {
            event.entry(key).or_insert(value);
        }

        let mut line = serde_json::to_string(&event)?;
        line.push('\n');
        if let Some(parent) = log.path.parent().filter(|dir| !dir.as_os_str().is_empty()) {
            fs::create_dir_all(parent)
                .with_context(|| format!("creating {}", parent.display()))?;
        }
        OpenOptions::new()
            .create(true)
            .append(true)
            .open(&log.path)
            .and_then(|mut file| file.write_all(line.as_bytes()))
            .with_context(|| format!("appending to {}", log.path.display()))?;

        *next_seq += 1;
        Ok(Value::Object(event))
    }
}

#[cfg(test)]
mod tests {
    use chrono::DateTime;

    use super::*;

    fn payload(key: &str, value: &str) -> EventPayload {
        let mut payload = EventPayload::new();
        payload.insert(key.to_string(), Value::from(value));
        payload
    }

    #[test]
    fn emit_writes_one_compact_line_per_event() -> anyhow::Result<()> {
        let temp = tempfile::tempdir()?;
        let path = temp.path().join("logs").join("events.jsonl");
        let writer = EventWriter::new(&path, "session-1");

        let emitted = writer.emit(EventKind::SessionStarted, payload("provider", "openai"))?;
        writer.emit(EventKind::SessionFinished, EventPayload::new())?;

        let content = fs::read_to_string(&path)?;
        let rows = content
            .lines()
            .map(serde_json::from_str::<Value>)
            .collect::<Result<Vec<Value>, _>>()?;
        assert_eq!(rows.len(), 2);

        assert_eq!(rows[0], emitted);
        assert_eq!(rows[0]["type"], "session_started");
        assert_eq!(rows[0]["session_id"], "session-1");
        assert_eq!(rows[0]["provider"], "openai");
        DateTime::parse_from_rfc3339(rows[0]["ts"].as_str().unwrap_or(""))?;

        assert_eq!(rows[1]["type"], "session_finished");
        assert_eq!(rows[1]["seq"], 2);
        Ok(())
    }

    #[test]
    fn payload_cannot_replace_default_keys() -> anyhow::Result<()> {
        let temp = tempfile::tempdir()?;
        let writer = EventWriter::new(temp.path().join("events.jsonl"), "session-1");

        let mut spoofed = payload("type", "spoofed");
        spoofed.insert("session_id".to_string(), Value::from("other"));
        spoofed.insert("seq".to_string(), Value::from(99));
        let emitted = writer.emit(EventKind::TargetStarted, spoofed)?;

        assert_eq!(emitted["type"], "target_started");
        assert_eq!(emitted["session_id"], "session-1");
        assert_eq!(emitted["seq"], 1);
        Ok(())
    }

    #[test]
    fn failed_writes_do_not_consume_a_sequence_number() -> anyhow::Result<()> {
        let temp = tempfile::tempdir()?;
        let blocker = temp.path().join("blocker");
        fs::write(&blocker, b"")?;

        let broken = EventWriter::new(blocker.join("events.jsonl"), "session-1");
        let err = broken
            .emit(EventKind::TargetStarted, EventPayload::new())
            .unwrap_err();
        assert!(format!("{err:#}").contains("blocker"));

        let writer = EventWriter::new(temp.path().join("events.jsonl"), "session-1");
        writer.emit(EventKind::TargetStarted, EventPayload::new())?;
        let emitted = writer.emit(EventKind::TargetFailed, EventPayload::new())?;
        assert_eq!(emitted["seq"], 2);
        Ok(())
    }

    #[test]
    fn new_sessions_get_distinct_ids() {
        let a = EventWriter::for_new_session("events.jsonl");
        let b = EventWriter::for_new_session("events.jsonl");
        assert_ne!(a.session_id(), b.session_id());
        assert_eq!(a.session_id().len(), 36);
    }
}
