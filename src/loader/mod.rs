//! Raw store writer: JSON batch discovery, cleaning, and loading.
//!
//! Recursively discovers every JSON file under the message directory,
//! flattens single-object and array files into one record set, cleans it
//! (date coercion, first-seen deduplication), and fully replaces the
//! raw message table. Per-file and per-field failures degrade softly; a
//! database write failure fails the load loud. Source JSON stays on disk
//! either way, so re-running after any failure is always safe.

use std::collections::HashSet;
use std::path::{Path, PathBuf};

use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use serde::Deserialize;
use tracing::{info, warn};

use crate::models::RawMessage;
use crate::repository::{DieselError, MessageRepository};

/// Result of one loader run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadOutcome {
    /// No JSON files found; the database was not touched. Not an error.
    NoFiles,
    /// Table replaced with this many rows.
    Loaded(usize),
}

/// JSON-facing record shape. Every field is defaulted so a missing or
/// null field degrades to a default instead of rejecting the record.
#[derive(Debug, Deserialize)]
struct MessageIn {
    #[serde(default)]
    message_id: i64,
    #[serde(default)]
    channel_name: String,
    #[serde(default)]
    channel_title: String,
    #[serde(default)]
    message_date: Option<String>,
    #[serde(default)]
    message_text: Option<String>,
    #[serde(default)]
    has_media: bool,
    #[serde(default)]
    image_path: Option<String>,
    #[serde(default)]
    views: i64,
    #[serde(default)]
    forwards: i64,
}

impl MessageIn {
    fn into_message(self) -> RawMessage {
        let message_date = self.message_date.as_deref().and_then(|raw| {
            let parsed = parse_message_date(raw);
            if parsed.is_none() {
                warn!(value = raw, "unparsable message_date coerced to null");
            }
            parsed
        });

        RawMessage {
            message_id: self.message_id,
            channel_name: self.channel_name,
            channel_title: self.channel_title,
            message_date,
            message_text: self.message_text,
            has_media: self.has_media,
            image_path: self.image_path,
            views: self.views,
            forwards: self.forwards,
        }
    }
}

/// Parse a message timestamp, accepting RFC 3339 plus the common naive
/// forms the scraper has emitted over time. Returns None on anything
/// unparsable (soft-fail, per field).
pub fn parse_message_date(raw: &str) -> Option<DateTime<Utc>> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.with_timezone(&Utc));
    }
    for format in ["%Y-%m-%dT%H:%M:%S", "%Y-%m-%d %H:%M:%S"] {
        if let Ok(naive) = NaiveDateTime::parse_from_str(raw, format) {
            return Some(naive.and_utc());
        }
    }
    if let Ok(date) = NaiveDate::parse_from_str(raw, "%Y-%m-%d") {
        return Some(date.and_hms_opt(0, 0, 0)?.and_utc());
    }
    None
}

/// Recursively collect every `*.json` file under `base`, sorted by full
/// path. Sorting makes discovery order (and therefore the first-seen
/// dedup tie-break) deterministic across runs.
pub fn discover_json_files(base: &Path) -> Vec<PathBuf> {
    let mut files = Vec::new();
    collect_json_files(base, &mut files);
    files.sort();
    files
}

fn collect_json_files(dir: &Path, files: &mut Vec<PathBuf>) {
    let entries = match std::fs::read_dir(dir) {
        Ok(entries) => entries,
        Err(_) => return,
    };
    for entry in entries.flatten() {
        let path = entry.path();
        if path.is_dir() {
            collect_json_files(&path, files);
        } else if path.extension().is_some_and(|ext| ext == "json") {
            files.push(path);
        }
    }
}

/// Read and flatten one JSON file. A file holds either a single record
/// object or an array of records; both become a flat list.
fn read_file(path: &Path) -> Result<Vec<RawMessage>, serde_json::Error> {
    let raw = std::fs::read_to_string(path)
        .map_err(|e| serde_json::Error::io(std::io::Error::new(e.kind(), e.to_string())))?;

    #[derive(Deserialize)]
    #[serde(untagged)]
    enum OneOrMany {
        Many(Vec<MessageIn>),
        One(MessageIn),
    }

    let records = match serde_json::from_str::<OneOrMany>(&raw)? {
        OneOrMany::Many(records) => records,
        OneOrMany::One(record) => vec![record],
    };

    Ok(records.into_iter().map(MessageIn::into_message).collect())
}

/// Drop duplicate `(message_id, channel_name)` records, keeping the
/// first occurrence in input order.
pub fn dedup_messages(msgs: Vec<RawMessage>) -> Vec<RawMessage> {
    let mut seen: HashSet<(i64, String)> = HashSet::new();
    msgs.into_iter()
        .filter(|msg| seen.insert((msg.message_id, msg.channel_name.clone())))
        .collect()
}

/// Discover, flatten, and clean all JSON batches under `base`.
///
/// Unreadable or malformed files are logged and skipped; the batch
/// continues.
pub fn collect_messages(base: &Path) -> Option<Vec<RawMessage>> {
    let files = discover_json_files(base);
    if files.is_empty() {
        warn!(directory = %base.display(), "no JSON files found, exiting gracefully");
        return None;
    }

    let mut all = Vec::new();
    for file in &files {
        match read_file(file) {
            Ok(mut records) => {
                info!(file = %file.display(), records = records.len(), "loaded batch");
                all.append(&mut records);
            }
            Err(e) => {
                warn!(file = %file.display(), error = %e, "skipping unreadable file");
            }
        }
    }

    Some(dedup_messages(all))
}

/// Load all JSON batches under `base` into the raw message table,
/// replacing its entire contents.
pub async fn load(base: &Path, repo: &MessageRepository) -> Result<LoadOutcome, DieselError> {
    let Some(messages) = collect_messages(base) else {
        return Ok(LoadOutcome::NoFiles);
    };

    let rows = repo.replace_all(&messages).await?;
    info!(rows, "raw message table replaced");
    Ok(LoadOutcome::Loaded(rows))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    fn msg(id: i64, channel: &str, text: &str) -> RawMessage {
        RawMessage {
            message_id: id,
            channel_name: channel.to_string(),
            channel_title: String::new(),
            message_date: None,
            message_text: Some(text.to_string()),
            has_media: false,
            image_path: None,
            views: 0,
            forwards: 0,
        }
    }

    #[test]
    fn parses_rfc3339_and_naive_dates() {
        assert!(parse_message_date("2024-05-05T12:30:00+00:00").is_some());
        assert!(parse_message_date("2024-05-05T12:30:00").is_some());
        assert!(parse_message_date("2024-05-05 12:30:00").is_some());
        assert!(parse_message_date("2024-05-05").is_some());
    }

    #[test]
    fn unparsable_date_coerces_to_none() {
        assert_eq!(parse_message_date("not-a-date"), None);
        assert_eq!(parse_message_date(""), None);
    }

    #[test]
    fn dedup_keeps_first_seen() {
        let deduped = dedup_messages(vec![
            msg(1, "acme", "first"),
            msg(1, "acme", "second"),
            msg(1, "other", "kept"),
        ]);
        assert_eq!(deduped.len(), 2);
        assert_eq!(deduped[0].message_text.as_deref(), Some("first"));
        assert_eq!(deduped[1].channel_name, "other");
    }

    #[test]
    fn discovery_is_recursive_and_sorted() {
        let dir = tempfile::tempdir().unwrap();
        fs::create_dir_all(dir.path().join("2024-05-06")).unwrap();
        fs::create_dir_all(dir.path().join("2024-05-05")).unwrap();
        fs::write(dir.path().join("2024-05-06/b.json"), "[]").unwrap();
        fs::write(dir.path().join("2024-05-05/a.json"), "[]").unwrap();
        fs::write(dir.path().join("2024-05-05/notes.txt"), "skip").unwrap();

        let files = discover_json_files(dir.path());
        assert_eq!(files.len(), 2);
        assert!(files[0].ends_with("2024-05-05/a.json"));
        assert!(files[1].ends_with("2024-05-06/b.json"));
    }

    #[test]
    fn discovery_of_missing_directory_is_empty() {
        assert!(discover_json_files(Path::new("/nonexistent/telepulse")).is_empty());
    }

    #[test]
    fn accepts_single_object_and_array_files() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(
            dir.path().join("one.json"),
            r#"{"message_id": 1, "channel_name": "acme"}"#,
        )
        .unwrap();
        fs::write(
            dir.path().join("two.json"),
            r#"[{"message_id": 2, "channel_name": "acme"}, {"message_id": 3, "channel_name": "acme"}]"#,
        )
        .unwrap();

        let messages = collect_messages(dir.path()).unwrap();
        assert_eq!(messages.len(), 3);
    }

    #[test]
    fn malformed_file_is_skipped_not_fatal() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("bad.json"), "{not json").unwrap();
        fs::write(
            dir.path().join("good.json"),
            r#"[{"message_id": 7, "channel_name": "acme", "message_date": "not-a-date"}]"#,
        )
        .unwrap();

        let messages = collect_messages(dir.path()).unwrap();
        assert_eq!(messages.len(), 1);
        assert_eq!(messages[0].message_id, 7);
        // Soft field failure: record loads, date becomes null.
        assert_eq!(messages[0].message_date, None);
    }

    #[test]
    fn missing_fields_default() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(
            dir.path().join("sparse.json"),
            r#"[{"message_id": 9, "channel_name": "acme"}]"#,
        )
        .unwrap();

        let messages = collect_messages(dir.path()).unwrap();
        assert_eq!(messages[0].views, 0);
        assert_eq!(messages[0].forwards, 0);
        assert!(!messages[0].has_media);
        assert_eq!(messages[0].channel_title, "");
    }

    #[test]
    fn empty_directory_yields_none() {
        let dir = tempfile::tempdir().unwrap();
        assert!(collect_messages(dir.path()).is_none());
    }
}
