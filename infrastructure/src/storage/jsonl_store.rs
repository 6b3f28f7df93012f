//! JSONL transcript store.
//!
//! One file per session under a directory, one JSON object per line:
//!
//! ```text
//! {"type":"title","title":"Explain lifetimes","timestamp":"..."}
//! {"type":"message","role":"user","content":"Explain lifetimes","timestamp":"..."}
//! {"type":"message","role":"assistant","content":"A lifetime is...","reason":"completed","timestamp":"..."}
//! ```
//!
//! The title record is written once, before the first prompt of a session.

use async_trait::async_trait;
use chatrelay_application::{StoreError, TranscriptStore};
use chatrelay_domain::{Prompt, SessionId, TerminalReason, derive_title};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tokio::io::AsyncWriteExt;
use tracing::debug;

/// Who produced a message
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Assistant,
}

/// One line of a session file
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum TranscriptRecord {
    Title {
        title: String,
        timestamp: String,
    },
    Message {
        role: Role,
        content: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        reason: Option<TerminalReason>,
        timestamp: String,
    },
}

/// [`TranscriptStore`] that appends JSON lines to per-session files.
pub struct JsonlTranscriptStore {
    dir: PathBuf,
}

impl JsonlTranscriptStore {
    /// Create a store rooted at `dir`, creating the directory if needed.
    pub async fn open(dir: impl Into<PathBuf>) -> Result<Self, StoreError> {
        let dir = dir.into();
        tokio::fs::create_dir_all(&dir).await?;
        debug!("Transcript store at {}", dir.display());
        Ok(Self { dir })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Path of the file holding `session_id`'s transcript.
    pub fn session_path(&self, session_id: &SessionId) -> PathBuf {
        self.dir.join(format!("{}.jsonl", file_stem(session_id)))
    }

    /// Read back every record of a session, oldest first.
    ///
    /// A session that was never written has no records.
    pub async fn read(&self, session_id: &SessionId) -> Result<Vec<TranscriptRecord>, StoreError> {
        let path = self.session_path(session_id);
        let content = match tokio::fs::read_to_string(&path).await {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(e.into()),
        };

        content
            .lines()
            .filter(|line| !line.trim().is_empty())
            .map(|line| {
                serde_json::from_str(line).map_err(|e| StoreError::Serialization(e.to_string()))
            })
            .collect()
    }

    async fn append(&self, path: &Path, records: &[TranscriptRecord]) -> Result<(), StoreError> {
        let mut buf = String::new();
        for record in records {
            let line =
                serde_json::to_string(record).map_err(|e| StoreError::Serialization(e.to_string()))?;
            buf.push_str(&line);
            buf.push('\n');
        }

        let mut file = tokio::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(path)
            .await?;
        file.write_all(buf.as_bytes()).await?;
        file.flush().await?;
        Ok(())
    }
}

#[async_trait]
impl TranscriptStore for JsonlTranscriptStore {
    async fn record_prompt(
        &self,
        session_id: &SessionId,
        prompt: &Prompt,
    ) -> Result<(), StoreError> {
        let path = self.session_path(session_id);
        let first_message = !tokio::fs::try_exists(&path).await?;
        let timestamp = now();

        let mut records = Vec::with_capacity(2);
        if first_message {
            records.push(TranscriptRecord::Title {
                title: derive_title(prompt.content()),
                timestamp: timestamp.clone(),
            });
        }
        records.push(TranscriptRecord::Message {
            role: Role::User,
            content: prompt.content().to_string(),
            reason: None,
            timestamp,
        });

        self.append(&path, &records).await
    }

    async fn record_reply(
        &self,
        session_id: &SessionId,
        text: &str,
        reason: TerminalReason,
    ) -> Result<(), StoreError> {
        let record = TranscriptRecord::Message {
            role: Role::Assistant,
            content: text.to_string(),
            reason: Some(reason),
            timestamp: now(),
        };
        self.append(&self.session_path(session_id), &[record]).await
    }
}

fn now() -> String {
    chrono::Utc::now().to_rfc3339_opts(chrono::SecondsFormat::Millis, true)
}

/// File-system-safe, collision-free name for a session id.
///
/// ASCII letters, digits and `-` pass through; every other byte becomes
/// `_xx` (lowercase hex).
fn file_stem(session_id: &SessionId) -> String {
    let mut stem = String::with_capacity(session_id.as_str().len());
    for byte in session_id.as_str().bytes() {
        if byte.is_ascii_alphanumeric() || byte == b'-' {
            stem.push(byte as char);
        } else {
            stem.push_str(&format!("_{:02x}", byte));
        }
    }
    stem
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sid(s: &str) -> SessionId {
        SessionId::parse(s).unwrap()
    }

    fn prompt(s: &str) -> Prompt {
        Prompt::new(s).unwrap()
    }

    #[test]
    fn test_file_stem_escapes_unsafe_bytes() {
        assert_eq!(file_stem(&sid("chat-42")), "chat-42");
        assert_eq!(file_stem(&sid("../etc")), "_2e_2e_2fetc");
        assert_eq!(file_stem(&sid("a_b")), "a_5fb");
        // Distinct ids never share a file.
        assert_ne!(file_stem(&sid("a/b")), file_stem(&sid("a_2fb")));
    }

    #[tokio::test]
    async fn test_first_prompt_writes_title_then_message() {
        let dir = tempfile::tempdir().unwrap();
        let store = JsonlTranscriptStore::open(dir.path()).await.unwrap();

        store
            .record_prompt(&sid("s1"), &prompt("Explain lifetimes"))
            .await
            .unwrap();
        store
            .record_reply(&sid("s1"), "A lifetime is...", TerminalReason::Completed)
            .await
            .unwrap();

        let records = store.read(&sid("s1")).await.unwrap();
        assert_eq!(records.len(), 3);
        assert!(matches!(
            &records[0],
            TranscriptRecord::Title { title, .. } if title == "Explain lifetimes"
        ));
        assert!(matches!(
            &records[1],
            TranscriptRecord::Message { role: Role::User, content, reason: None, .. }
                if content == "Explain lifetimes"
        ));
        assert!(matches!(
            &records[2],
            TranscriptRecord::Message {
                role: Role::Assistant,
                content,
                reason: Some(TerminalReason::Completed),
                ..
            } if content == "A lifetime is..."
        ));
    }

    #[tokio::test]
    async fn test_title_only_on_first_message() {
        let dir = tempfile::tempdir().unwrap();
        let store = JsonlTranscriptStore::open(dir.path()).await.unwrap();

        store.record_prompt(&sid("s1"), &prompt("one")).await.unwrap();
        store
            .record_reply(&sid("s1"), "1", TerminalReason::Completed)
            .await
            .unwrap();
        store.record_prompt(&sid("s1"), &prompt("two")).await.unwrap();

        let titles = store
            .read(&sid("s1"))
            .await
            .unwrap()
            .into_iter()
            .filter(|r| matches!(r, TranscriptRecord::Title { .. }))
            .count();
        assert_eq!(titles, 1);
    }

    #[tokio::test]
    async fn test_long_prompt_title_is_truncated() {
        let dir = tempfile::tempdir().unwrap();
        let store = JsonlTranscriptStore::open(dir.path()).await.unwrap();
        let long = "x".repeat(80);

        store.record_prompt(&sid("s1"), &prompt(&long)).await.unwrap();

        let records = store.read(&sid("s1")).await.unwrap();
        let TranscriptRecord::Title { title, .. } = &records[0] else {
            panic!("expected a title record first");
        };
        assert_eq!(title, &format!("{}...", "x".repeat(50)));
    }

    #[tokio::test]
    async fn test_cancelled_and_empty_replies_are_recorded() {
        let dir = tempfile::tempdir().unwrap();
        let store = JsonlTranscriptStore::open(dir.path()).await.unwrap();

        store
            .record_reply(&sid("s1"), "", TerminalReason::Failed)
            .await
            .unwrap();
        store
            .record_reply(&sid("s1"), "Hello", TerminalReason::Cancelled)
            .await
            .unwrap();

        let raw = std::fs::read_to_string(store.session_path(&sid("s1"))).unwrap();
        let lines: Vec<serde_json::Value> = raw
            .lines()
            .map(|l| serde_json::from_str(l).unwrap())
            .collect();
        assert_eq!(lines[0]["reason"], "failed");
        assert_eq!(lines[0]["content"], "");
        assert_eq!(lines[1]["reason"], "cancelled");
        assert_eq!(lines[1]["role"], "assistant");
        assert!(lines[1]["timestamp"].is_string());
    }

    #[tokio::test]
    async fn test_sessions_use_separate_files() {
        let dir = tempfile::tempdir().unwrap();
        let store = JsonlTranscriptStore::open(dir.path()).await.unwrap();

        store.record_prompt(&sid("a"), &prompt("for a")).await.unwrap();
        store.record_prompt(&sid("b"), &prompt("for b")).await.unwrap();

        assert_eq!(store.read(&sid("a")).await.unwrap().len(), 2);
        assert_eq!(store.read(&sid("b")).await.unwrap().len(), 2);
        assert!(store.read(&sid("c")).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_open_creates_nested_directory() {
        let dir = tempfile::tempdir().unwrap();
        let nested = dir.path().join("deep").join("transcripts");
        let store = JsonlTranscriptStore::open(&nested).await.unwrap();
        assert!(store.dir().is_dir());
    }
}
