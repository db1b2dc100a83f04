//! In-memory collaborators that record every call.

use async_trait::async_trait;
use bytes::Bytes;
use pixelhook_captioning::{CaptionError, CaptionModel};
use pixelhook_core::{Caption, DbCredentials, ImageBytes, StorageBackend};
use pixelhook_db::{CaptionRepository, CaptionSession, PersistOutcome, PersistenceError};
use pixelhook_infra::{SecretError, SecretSource};
use pixelhook_storage::{Storage, StorageError, StorageResult};
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

/// Object store backed by a map of `(bucket, key)` to `(body, content type)`.
#[derive(Default)]
pub struct RecordingStorage {
    objects: Mutex<HashMap<(String, String), (Bytes, String)>>,
    downloads: AtomicUsize,
    uploads: AtomicUsize,
    fail_uploads: bool,
}

impl RecordingStorage {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn failing_uploads() -> Self {
        Self {
            fail_uploads: true,
            ..Self::default()
        }
    }

    pub fn put(&self, bucket: &str, key: &str, data: Vec<u8>) {
        self.objects.lock().unwrap().insert(
            (bucket.to_string(), key.to_string()),
            (Bytes::from(data), "application/octet-stream".to_string()),
        );
    }

    pub fn object(&self, bucket: &str, key: &str) -> Option<(Bytes, String)> {
        self.objects
            .lock()
            .unwrap()
            .get(&(bucket.to_string(), key.to_string()))
            .cloned()
    }

    pub fn downloads(&self) -> usize {
        self.downloads.load(Ordering::SeqCst)
    }

    pub fn uploads(&self) -> usize {
        self.uploads.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Storage for RecordingStorage {
    async fn download(&self, bucket: &str, key: &str) -> StorageResult<Bytes> {
        self.downloads.fetch_add(1, Ordering::SeqCst);
        self.object(bucket, key)
            .map(|(data, _)| data)
            .ok_or_else(|| StorageError::NotFound(format!("{}/{}", bucket, key)))
    }

    async fn upload_with_key(
        &self,
        bucket: &str,
        key: &str,
        data: Bytes,
        content_type: &str,
    ) -> StorageResult<String> {
        self.uploads.fetch_add(1, Ordering::SeqCst);
        if self.fail_uploads {
            return Err(StorageError::UploadFailed("access denied".to_string()));
        }
        self.objects.lock().unwrap().insert(
            (bucket.to_string(), key.to_string()),
            (data, content_type.to_string()),
        );
        Ok(format!("memory://{}/{}", bucket, key))
    }

    fn backend_type(&self) -> StorageBackend {
        StorageBackend::Local
    }
}

/// Secret source returning a fixed payload, or failing with `NotFound`.
pub struct ScriptedSecretSource {
    payload: Option<String>,
    calls: AtomicUsize,
}

impl ScriptedSecretSource {
    pub fn valid() -> Self {
        Self::with_payload(
            r#"{"host":"captions.db.internal","username":"captioner","password":"pw-123","dbname":"media","port":3306}"#,
        )
    }

    pub fn with_payload(payload: &str) -> Self {
        Self {
            payload: Some(payload.to_string()),
            calls: AtomicUsize::new(0),
        }
    }

    pub fn missing() -> Self {
        Self {
            payload: None,
            calls: AtomicUsize::new(0),
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl SecretSource for ScriptedSecretSource {
    async fn secret_string(&self, secret_id: &str) -> Result<String, SecretError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.payload
            .clone()
            .ok_or_else(|| SecretError::NotFound(secret_id.to_string()))
    }
}

#[derive(Default)]
struct RepositoryState {
    /// identifier -> stored caption
    rows: HashMap<String, Option<String>>,
    opens: usize,
    updates: Vec<(String, String)>,
    closes: usize,
}

/// Caption table held in memory. Only identifiers added with `insert_row` exist.
#[derive(Default)]
pub struct RecordingCaptionRepository {
    state: Arc<Mutex<RepositoryState>>,
    refuse_connections: bool,
    fail_updates: bool,
}

impl RecordingCaptionRepository {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn refusing_connections() -> Self {
        Self {
            refuse_connections: true,
            ..Self::default()
        }
    }

    pub fn failing_updates() -> Self {
        Self {
            fail_updates: true,
            ..Self::default()
        }
    }

    pub fn insert_row(&self, identifier: &str) {
        self.state
            .lock()
            .unwrap()
            .rows
            .insert(identifier.to_string(), None);
    }

    pub fn caption_for(&self, identifier: &str) -> Option<String> {
        self.state
            .lock()
            .unwrap()
            .rows
            .get(identifier)
            .cloned()
            .flatten()
    }

    pub fn opens(&self) -> usize {
        self.state.lock().unwrap().opens
    }

    pub fn updates(&self) -> Vec<(String, String)> {
        self.state.lock().unwrap().updates.clone()
    }

    pub fn closes(&self) -> usize {
        self.state.lock().unwrap().closes
    }
}

#[async_trait]
impl CaptionRepository for RecordingCaptionRepository {
    async fn open(
        &self,
        credentials: &DbCredentials,
    ) -> Result<Box<dyn CaptionSession>, PersistenceError> {
        if self.refuse_connections {
            return Err(PersistenceError::Connect(format!(
                "Can't connect to MySQL server on '{}'",
                credentials.host
            )));
        }
        self.state.lock().unwrap().opens += 1;
        Ok(Box::new(RecordingSession {
            state: self.state.clone(),
            fail_updates: self.fail_updates,
        }))
    }
}

struct RecordingSession {
    state: Arc<Mutex<RepositoryState>>,
    fail_updates: bool,
}

#[async_trait]
impl CaptionSession for RecordingSession {
    async fn update_caption(
        self: Box<Self>,
        identifier: &str,
        caption: &Caption,
    ) -> Result<PersistOutcome, PersistenceError> {
        let mut state = self.state.lock().unwrap();
        state
            .updates
            .push((identifier.to_string(), caption.as_str().to_string()));
        state.closes += 1;

        if self.fail_updates {
            return Err(PersistenceError::Execute("Lock wait timeout exceeded".to_string()));
        }

        match state.rows.get_mut(identifier) {
            Some(row) => {
                *row = Some(caption.as_str().to_string());
                Ok(PersistOutcome::Updated { rows: 1 })
            }
            None => Ok(PersistOutcome::NotFound),
        }
    }

    async fn close(self: Box<Self>) {
        self.state.lock().unwrap().closes += 1;
    }
}

/// Caption model with a canned answer.
pub struct ScriptedCaptionModel {
    answer: Option<String>,
    accepted: Vec<&'static str>,
    received: Mutex<Vec<&'static str>>,
}

impl ScriptedCaptionModel {
    pub fn answering(caption: &str) -> Self {
        Self {
            answer: Some(caption.to_string()),
            accepted: vec!["image/jpeg", "image/png", "image/webp"],
            received: Mutex::new(Vec::new()),
        }
    }

    /// Model whose API always returns a server error.
    pub fn failing() -> Self {
        Self {
            answer: None,
            ..Self::answering("")
        }
    }

    pub fn accepting(mut self, media_types: &[&'static str]) -> Self {
        self.accepted = media_types.to_vec();
        self
    }

    /// Media types of the images the model was asked to caption
    pub fn received(&self) -> Vec<&'static str> {
        self.received.lock().unwrap().clone()
    }
}

#[async_trait]
impl CaptionModel for ScriptedCaptionModel {
    fn name(&self) -> &str {
        "scripted"
    }

    fn accepts(&self, media_type: &str) -> bool {
        self.accepted.contains(&media_type)
    }

    async fn caption(&self, image: &ImageBytes) -> Result<Caption, CaptionError> {
        self.received.lock().unwrap().push(image.content_type());
        match &self.answer {
            Some(text) => Caption::new(text).ok_or(CaptionError::EmptyCaption),
            None => Err(CaptionError::Api {
                status: 503,
                body: "model overloaded".to_string(),
            }),
        }
    }
}
