use std::io::Write;
use std::path::{Path, PathBuf};

use anyhow::{anyhow, Context, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

/// A message that qualified as a submission, as stored on disk.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Submission {
    pub id: u64,
    pub text: String,
    /// Telegram file id of the attached photo, if any
    #[serde(default)]
    pub photo: Option<String>,
    #[serde(default)]
    pub favorite: bool,
    #[serde(default)]
    pub selected: bool,
    #[serde(with = "chrono::serde::ts_milliseconds")]
    pub created_at: DateTime<Utc>,
}

/// Input for a new submission
#[derive(Debug, Clone, Default)]
pub struct NewSubmission {
    pub text: String,
    pub photo: Option<String>,
}

/// Which boolean a toggle button flips
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flag {
    Favorite,
    Selected,
}

/// Filtered views the manager can request
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum View {
    All,
    Favorites,
    Selected,
}

impl View {
    pub fn matches(&self, submission: &Submission) -> bool {
        match self {
            View::All => true,
            View::Favorites => submission.favorite,
            View::Selected => submission.selected,
        }
    }
}

/// The whole persisted document. Insertion order is id order.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StoreDocument {
    #[serde(default)]
    pub submissions: Vec<Submission>,
    #[serde(default)]
    pub last_id: u64,
}

impl StoreDocument {
    /// Append a submission with the next id (pre-incremented `last_id`), both flags cleared.
    pub fn push(&mut self, new: NewSubmission, now: DateTime<Utc>) -> Submission {
        self.last_id += 1;
        let submission = Submission {
            id: self.last_id,
            text: new.text,
            photo: new.photo,
            favorite: false,
            selected: false,
            created_at: now,
        };
        self.submissions.push(submission.clone());
        submission
    }

    /// Flip one flag on the submission with `id`. Returns its 0-based position.
    pub fn toggle(&mut self, id: u64, flag: Flag) -> Option<usize> {
        let index = self.submissions.iter().position(|s| s.id == id)?;
        let submission = &mut self.submissions[index];
        match flag {
            Flag::Favorite => submission.favorite = !submission.favorite,
            Flag::Selected => submission.selected = !submission.selected,
        }
        Some(index)
    }

    pub fn filtered(&self, view: View) -> Vec<Submission> {
        self.submissions
            .iter()
            .filter(|s| view.matches(s))
            .cloned()
            .collect()
    }
}

/// Result of a successful toggle: the updated record and its place in the full list
#[derive(Debug, Clone)]
pub struct Toggled {
    pub submission: Submission,
    pub index: usize,
    pub total: usize,
}

/// Flat-file JSON store. Every read loads the whole document; every write
/// replaces it atomically. Read-modify-write operations are serialized.
pub struct JsonStore {
    path: PathBuf,
    write_lock: Mutex<()>,
}

impl JsonStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        info!("Submission store at: {}", path.display());
        Self {
            path,
            write_lock: Mutex::new(()),
        }
    }

    #[cfg(test)]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Load the document. A missing or unparsable file yields the empty document.
    pub async fn load(&self) -> StoreDocument {
        read_document(&self.path).await
    }

    /// Overwrite the document completely. Read-modify-write callers hold `write_lock`.
    pub async fn save(&self, document: &StoreDocument) -> Result<()> {
        let data = serde_json::to_vec_pretty(document).context("serialize store")?;
        let path = self.path.clone();
        tokio::task::spawn_blocking(move || write_atomic(&path, &data))
            .await
            .context("store writer task failed")?
    }

    /// Record a new submission and persist it.
    pub async fn insert(&self, new: NewSubmission) -> Result<Submission> {
        let _guard = self.write_lock.lock().await;
        let mut document = self.load().await;
        let submission = document.push(new, Utc::now());
        self.save(&document).await?;
        debug!(id = submission.id, "Submission stored");
        Ok(submission)
    }

    /// Flip a flag and persist. `None` when the id is unknown; nothing is written then.
    pub async fn toggle(&self, id: u64, flag: Flag) -> Result<Option<Toggled>> {
        let _guard = self.write_lock.lock().await;
        let mut document = self.load().await;
        let Some(index) = document.toggle(id, flag) else {
            return Ok(None);
        };
        self.save(&document).await?;
        Ok(Some(Toggled {
            submission: document.submissions[index].clone(),
            index,
            total: document.submissions.len(),
        }))
    }

    pub async fn list(&self, view: View) -> Vec<Submission> {
        self.load().await.filtered(view)
    }
}

async fn read_document(path: &Path) -> StoreDocument {
    let data = match tokio::fs::read_to_string(path).await {
        Ok(data) => data,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return StoreDocument::default(),
        Err(e) => {
            warn!("Failed to read store {}: {}; using empty store", path.display(), e);
            return StoreDocument::default();
        }
    };

    match serde_json::from_str(&data) {
        Ok(document) => document,
        Err(e) => {
            warn!("Store {} is not valid JSON: {}; using empty store", path.display(), e);
            StoreDocument::default()
        }
    }
}

fn write_atomic(path: &Path, data: &[u8]) -> Result<()> {
    let dir = match path.parent() {
        Some(dir) if !dir.as_os_str().is_empty() => dir,
        _ => Path::new("."),
    };
    std::fs::create_dir_all(dir).with_context(|| format!("create dir {}", dir.display()))?;

    let mut tmp = tempfile::NamedTempFile::new_in(dir)
        .with_context(|| format!("create temp file in {}", dir.display()))?;
    tmp.write_all(data).context("write temp file")?;
    tmp.flush().context("flush temp file")?;
    tmp.as_file_mut().sync_all().context("sync temp file")?;
    tmp.persist(path)
        .map_err(|e| anyhow!("persist store {}: {}", path.display(), e))?;
    Ok(())
}
