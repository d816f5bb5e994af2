use std::fs::{self, File, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};

use common::err::decode_error::ReError;
use decoder::event::{Event, EventKind};

use crate::EventSink;

/// Appends one JSON object per line, partitioned by event kind into three
/// named logs under `log_dir`: query/prepare/execute/close traffic in
/// `sql_history.jsonl`, row payloads in `data_results.jsonl`, and tagged
/// business events in `order_tracking.jsonl`.
pub struct FileSink {
    sql_history: File,
    data_results: File,
    order_tracking: File,
}

impl FileSink {
    pub fn open(log_dir: impl AsRef<Path>) -> Result<Self, ReError> {
        let dir = log_dir.as_ref();
        fs::create_dir_all(dir)?;
        Ok(FileSink {
            sql_history: open_append(dir, "sql_history.jsonl")?,
            data_results: open_append(dir, "data_results.jsonl")?,
            order_tracking: open_append(dir, "order_tracking.jsonl")?,
        })
    }

    fn file_for(&mut self, kind: EventKind) -> &mut File {
        match kind {
            EventKind::Query
            | EventKind::Prepare
            | EventKind::Execute
            | EventKind::Close
            | EventKind::PrepareOk
            | EventKind::Cmd => &mut self.sql_history,
            EventKind::Row => &mut self.data_results,
            EventKind::Order => &mut self.order_tracking,
        }
    }
}

fn open_append(dir: &Path, name: &str) -> Result<File, ReError> {
    let path: PathBuf = dir.join(name);
    OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .map_err(ReError::from)
}

impl EventSink for FileSink {
    fn name(&self) -> &'static str {
        "file"
    }

    fn handle(&mut self, event: &Event) {
        let line = match serde_json::to_string(event) {
            Ok(s) => s,
            Err(e) => {
                tracing::warn!("file sink: failed to serialize event: {e}");
                return;
            }
        };
        let kind = event.kind;
        let file = self.file_for(kind);
        if let Err(e) = writeln!(file, "{line}") {
            tracing::warn!("file sink: write failed for {kind:?}: {e}");
        }
    }

    fn flush(&mut self) {
        let _ = self.sql_history.flush();
        let _ = self.data_results.flush();
        let _ = self.order_tracking.flush();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use decoder::endpoint::Endpoint;
    use std::net::IpAddr;

    fn ep(port: u16) -> Endpoint {
        Endpoint::new("127.0.0.1".parse::<IpAddr>().unwrap(), port)
    }

    #[test]
    fn query_event_lands_in_sql_history() {
        let dir = tempfile::tempdir().unwrap();
        let mut sink = FileSink::open(dir.path()).unwrap();
        let mut event = Event::new(
            "2024-01-01 00:00:00.000000".to_string(),
            ep(1),
            ep(3306),
            "abcd1234".to_string(),
            EventKind::Query,
        );
        event.full_query = Some("SELECT 1".to_string());
        sink.handle(&event);
        sink.flush();

        let content = fs::read_to_string(dir.path().join("sql_history.jsonl")).unwrap();
        assert!(content.contains("SELECT 1"));
    }

    #[test]
    fn order_event_lands_in_order_tracking() {
        let dir = tempfile::tempdir().unwrap();
        let mut sink = FileSink::open(dir.path()).unwrap();
        let mut event = Event::new(
            "2024-01-01 00:00:00.000000".to_string(),
            ep(1),
            ep(3306),
            "abcd1234".to_string(),
            EventKind::Order,
        );
        event.seat_no = Some("39번".to_string());
        sink.handle(&event);
        sink.flush();

        let content = fs::read_to_string(dir.path().join("order_tracking.jsonl")).unwrap();
        assert!(content.contains("39번"));
    }
}
