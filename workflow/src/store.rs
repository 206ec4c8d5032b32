use crate::session::SubmissionResult;
use std::io::ErrorKind;
use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("session storage failed: {0}")]
    Io(#[from] std::io::Error),
    #[error("stored session is corrupt: {0}")]
    Corrupt(#[from] serde_json::Error),
}

/// Durable mirror of the active submission.
pub trait SessionStore {
    fn save(&mut self, result: &SubmissionResult) -> Result<(), StoreError>;

    fn load(&self) -> Result<Option<SubmissionResult>, StoreError>;

    fn clear(&mut self) -> Result<(), StoreError>;
}

/// Keeps the session as a JSON document on disk.
#[derive(Debug, Clone)]
pub struct FileStore {
    path: PathBuf,
}

impl FileStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        FileStore { path: path.into() }
    }
}

impl SessionStore for FileStore {
    fn save(&mut self, result: &SubmissionResult) -> Result<(), StoreError> {
        let json = serde_json::to_vec_pretty(result)?;
        std::fs::write(&self.path, json)?;
        Ok(())
    }

    fn load(&self) -> Result<Option<SubmissionResult>, StoreError> {
        match std::fs::read(&self.path) {
            Ok(bytes) => Ok(Some(serde_json::from_slice(&bytes)?)),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    fn clear(&mut self) -> Result<(), StoreError> {
        match std::fs::remove_file(&self.path) {
            Err(e) if e.kind() != ErrorKind::NotFound => Err(e.into()),
            _ => Ok(()),
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    saved: Option<SubmissionResult>,
}

impl MemoryStore {
    pub fn with(result: SubmissionResult) -> Self {
        MemoryStore {
            saved: Some(result),
        }
    }

    pub fn saved(&self) -> Option<&SubmissionResult> {
        self.saved.as_ref()
    }
}

impl SessionStore for MemoryStore {
    fn save(&mut self, result: &SubmissionResult) -> Result<(), StoreError> {
        self.saved = Some(result.clone());
        Ok(())
    }

    fn load(&self) -> Result<Option<SubmissionResult>, StoreError> {
        Ok(self.saved.clone())
    }

    fn clear(&mut self) -> Result<(), StoreError> {
        self.saved = None;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use common::models::Provider;

    fn result() -> SubmissionResult {
        SubmissionResult {
            submission_id: "openai-1-abc".to_string(),
            sentences: Vec::new(),
            native_language: "polsk".to_string(),
            original_text: "Jeg heter Ole.".to_string(),
            provider: Provider::OpenAi,
        }
    }

    #[test]
    fn file_store_round_trip_and_clear() {
        let dir = tempfile::tempdir().unwrap();
        let mut store = FileStore::new(dir.path().join("session.json"));
        assert!(store.load().unwrap().is_none());

        store.save(&result()).unwrap();
        assert_eq!(store.load().unwrap(), Some(result()));

        store.clear().unwrap();
        assert!(store.load().unwrap().is_none());
        store.clear().unwrap();
    }

    #[test]
    fn corrupt_file_is_reported() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("session.json");
        std::fs::write(&path, "{ not json").unwrap();
        assert!(matches!(
            FileStore::new(path).load(),
            Err(StoreError::Corrupt(_))
        ));
    }
}
