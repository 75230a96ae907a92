//! Quiz store implementations.
//!
//! [`JsonDirStore`] keeps one pretty-printed JSON file per quiz under a
//! directory. [`MemoryStore`] keeps everything in process, for tests and
//! one-shot runs.

use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use anyhow::{Context, Result};
use async_trait::async_trait;
use uuid::Uuid;

use crate::model::{QuestionSource, Quiz, QuizId, StoredQuiz};
use crate::traits::QuizStore;

fn new_record(quiz: &Quiz, source: QuestionSource) -> StoredQuiz {
    StoredQuiz {
        id: QuizId(Uuid::new_v4().to_string()),
        created_at: chrono::Utc::now(),
        source,
        quiz: quiz.clone(),
    }
}

/// File-backed store: `<dir>/<id>.json`.
#[derive(Debug, Clone)]
pub struct JsonDirStore {
    dir: PathBuf,
}

impl JsonDirStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Path for an id, or `None` if the id could escape the directory.
    fn path_for(&self, id: &QuizId) -> Option<PathBuf> {
        let valid = !id.as_str().is_empty()
            && id
                .as_str()
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_');
        valid.then(|| self.dir.join(format!("{id}.json")))
    }

    async fn read_record(path: &Path) -> Result<StoredQuiz> {
        let content = tokio::fs::read_to_string(path)
            .await
            .with_context(|| format!("failed to read quiz from {}", path.display()))?;
        serde_json::from_str(&content)
            .with_context(|| format!("failed to parse quiz JSON: {}", path.display()))
    }
}

#[async_trait]
impl QuizStore for JsonDirStore {
    async fn save(&self, quiz: &Quiz, source: QuestionSource) -> Result<StoredQuiz> {
        let record = new_record(quiz, source);
        let path = self.dir.join(format!("{}.json", record.id));

        let json = serde_json::to_string_pretty(&record).context("failed to serialize quiz")?;
        tokio::fs::create_dir_all(&self.dir)
            .await
            .with_context(|| format!("failed to create store dir {}", self.dir.display()))?;
        tokio::fs::write(&path, json)
            .await
            .with_context(|| format!("failed to write quiz to {}", path.display()))?;

        tracing::debug!("saved quiz {} to {}", record.id, path.display());
        Ok(record)
    }

    async fn load(&self, id: &QuizId) -> Result<Option<StoredQuiz>> {
        let Some(path) = self.path_for(id) else {
            return Ok(None);
        };
        match tokio::fs::metadata(&path).await {
            Ok(_) => Self::read_record(&path).await.map(Some),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e).with_context(|| format!("failed to stat {}", path.display())),
        }
    }

    async fn list(&self) -> Result<Vec<StoredQuiz>> {
        let mut records = Vec::new();

        let mut entries = match tokio::fs::read_dir(&self.dir).await {
            Ok(entries) => entries,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(records),
            Err(e) => {
                return Err(e)
                    .with_context(|| format!("failed to read directory: {}", self.dir.display()))
            }
        };

        while let Some(entry) = entries.next_entry().await? {
            let path = entry.path();
            if path.extension().is_some_and(|ext| ext == "json") {
                match Self::read_record(&path).await {
                    Ok(record) => records.push(record),
                    Err(e) => tracing::warn!("skipping {}: {e:#}", path.display()),
                }
            }
        }

        records.sort_by_key(|r| r.created_at);
        Ok(records)
    }

    async fn delete(&self, id: &QuizId) -> Result<bool> {
        let Some(path) = self.path_for(id) else {
            return Ok(false);
        };
        match tokio::fs::remove_file(&path).await {
            Ok(()) => Ok(true),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(false),
            Err(e) => Err(e).with_context(|| format!("failed to delete {}", path.display())),
        }
    }
}

/// In-process store.
#[derive(Debug, Default)]
pub struct MemoryStore {
    records: Mutex<Vec<StoredQuiz>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.records.lock().map(|r| r.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[async_trait]
impl QuizStore for MemoryStore {
    async fn save(&self, quiz: &Quiz, source: QuestionSource) -> Result<StoredQuiz> {
        let record = new_record(quiz, source);
        self.records
            .lock()
            .map_err(|_| anyhow::anyhow!("memory store lock poisoned"))?
            .push(record.clone());
        Ok(record)
    }

    async fn load(&self, id: &QuizId) -> Result<Option<StoredQuiz>> {
        let records = self
            .records
            .lock()
            .map_err(|_| anyhow::anyhow!("memory store lock poisoned"))?;
        Ok(records.iter().find(|r| &r.id == id).cloned())
    }

    async fn list(&self) -> Result<Vec<StoredQuiz>> {
        let records = self
            .records
            .lock()
            .map_err(|_| anyhow::anyhow!("memory store lock poisoned"))?;
        Ok(records.clone())
    }

    async fn delete(&self, id: &QuizId) -> Result<bool> {
        let mut records = self
            .records
            .lock()
            .map_err(|_| anyhow::anyhow!("memory store lock poisoned"))?;
        let before = records.len();
        records.retain(|r| &r.id != id);
        Ok(records.len() != before)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{AnswerKey, Question};

    fn sample_quiz() -> Quiz {
        Quiz {
            title: "Rust basics".into(),
            questions: vec![Question {
                text: "Which keyword declares a constant?".into(),
                options: vec!["let".into(), "const".into(), "mut".into(), "N/A".into()],
                correct_answer: AnswerKey::B,
            }],
        }
    }

    #[tokio::test]
    async fn json_store_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let store = JsonDirStore::new(dir.path().join("quizzes"));

        let saved = store
            .save(&sample_quiz(), QuestionSource::Parsed)
            .await
            .unwrap();
        let loaded = store.load(&saved.id).await.unwrap().unwrap();
        assert_eq!(loaded.quiz, sample_quiz());
        assert_eq!(loaded.source, QuestionSource::Parsed);
        assert_eq!(loaded.id, saved.id);
    }

    #[tokio::test]
    async fn json_store_missing_and_hostile_ids() {
        let dir = tempfile::tempdir().unwrap();
        let store = JsonDirStore::new(dir.path());
        assert!(store.load(&QuizId::from("nope")).await.unwrap().is_none());
        assert!(store
            .load(&QuizId::from("../etc/passwd"))
            .await
            .unwrap()
            .is_none());
        assert!(!store.delete(&QuizId::from("../x")).await.unwrap());
    }

    #[tokio::test]
    async fn json_store_list_skips_corrupt_files() {
        let dir = tempfile::tempdir().unwrap();
        let store = JsonDirStore::new(dir.path());
        store
            .save(&sample_quiz(), QuestionSource::Generated)
            .await
            .unwrap();
        std::fs::write(dir.path().join("broken.json"), "{ not json").unwrap();
        std::fs::write(dir.path().join("notes.txt"), "ignored").unwrap();

        let all = store.list().await.unwrap();
        assert_eq!(all.len(), 1);
        assert_eq!(all[0].source, QuestionSource::Generated);
    }

    #[tokio::test]
    async fn json_store_list_of_missing_dir_is_empty() {
        let dir = tempfile::tempdir().unwrap();
        let store = JsonDirStore::new(dir.path().join("never-created"));
        assert!(store.list().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn json_store_delete() {
        let dir = tempfile::tempdir().unwrap();
        let store = JsonDirStore::new(dir.path());
        let saved = store
            .save(&sample_quiz(), QuestionSource::Parsed)
            .await
            .unwrap();
        assert!(store.delete(&saved.id).await.unwrap());
        assert!(!store.delete(&saved.id).await.unwrap());
        assert!(store.load(&saved.id).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn memory_store_round_trip() {
        let store = MemoryStore::new();
        let saved = store
            .save(&sample_quiz(), QuestionSource::Parsed)
            .await
            .unwrap();
        assert_eq!(store.len(), 1);
        assert_eq!(
            store.load(&saved.id).await.unwrap().unwrap().quiz,
            sample_quiz()
        );
        assert!(store.delete(&saved.id).await.unwrap());
        assert!(store.is_empty());
    }
}
