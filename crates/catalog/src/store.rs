use std::path::{Path, PathBuf};
use std::time::SystemTime;

use chrono::{DateTime, Utc};
use rand::Rng;
use serde::{Deserialize, Serialize};
use tokio::io::AsyncWriteExt;
use tracing::{debug, warn};

const STAGING_PREFIX: &str = ".upload-";
const MAX_NAME_LEN: usize = 255;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CatalogError {
    NotFound,
    InvalidName(String),
    Io(String),
}

impl std::fmt::Display for CatalogError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CatalogError::NotFound => write!(f, "model not found"),
            CatalogError::InvalidName(name) => write!(f, "invalid model file name: {name:?}"),
            CatalogError::Io(msg) => write!(f, "model storage error: {msg}"),
        }
    }
}

impl std::error::Error for CatalogError {}

fn io_err(context: &str, e: std::io::Error) -> CatalogError {
    if e.kind() == std::io::ErrorKind::NotFound {
        CatalogError::NotFound
    } else {
        CatalogError::Io(format!("{context}: {e}"))
    }
}

/// A file as it sits in the store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredModel {
    pub filename: String,
    pub size: u64,
    pub modified: DateTime<Utc>,
}

/// Listing entry handed to the browser.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ModelRecord {
    pub filename: String,
    pub original_name: String,
    pub url: String,
    pub size: u64,
    pub uploaded_at: DateTime<Utc>,
}

impl StoredModel {
    /// `base_url` is prepended to `/models/<filename>`; pass `""` for a relative URL.
    pub fn into_record(self, base_url: &str) -> ModelRecord {
        ModelRecord {
            url: model_url(base_url, &self.filename),
            original_name: self.filename.clone(),
            filename: self.filename,
            size: self.size,
            uploaded_at: self.modified,
        }
    }
}

pub fn model_url(base_url: &str, filename: &str) -> String {
    format!("{}/models/{filename}", base_url.trim_end_matches('/'))
}

/// Reject anything that is not a single, visible file name.
pub fn validate_name(name: &str) -> Result<&str, CatalogError> {
    let bad = name.is_empty()
        || name.len() > MAX_NAME_LEN
        || name.starts_with('.')
        || name.contains(['/', '\\', '\0']);
    if bad {
        return Err(CatalogError::InvalidName(name.to_string()));
    }
    Ok(name)
}

/// Name a freshly uploaded file is stored under.
///
/// `.gltf` documents and the buffers/textures uploaded next to one keep
/// their original name so the document's relative URIs still resolve.
/// Everything else gets `<field>-<unix ms>-<random><ext>`.
pub fn storage_name(original: &str, field: &str, keep_original: bool) -> Result<String, CatalogError> {
    // Browsers may send a path; only the last component is meaningful.
    let base = original.rsplit(['/', '\\']).next().unwrap_or(original);
    let base = validate_name(base)?;
    if keep_original {
        return Ok(base.to_string());
    }

    let ext = Path::new(base)
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| format!(".{e}"))
        .unwrap_or_default();
    let millis = Utc::now().timestamp_millis();
    let suffix: u32 = rand::thread_rng().gen_range(0..1_000_000_000);
    Ok(format!("{field}-{millis}-{suffix}{ext}"))
}

/// Directory-backed store of uploaded models and their sibling assets.
#[derive(Debug, Clone)]
pub struct ModelStore {
    root: PathBuf,
}

impl ModelStore {
    pub async fn open(root: impl Into<PathBuf>) -> Result<Self, CatalogError> {
        let root = root.into();
        tokio::fs::create_dir_all(&root)
            .await
            .map_err(|e| CatalogError::Io(format!("create {root:?}: {e}")))?;
        Ok(Self { root })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn path(&self, name: &str) -> Result<PathBuf, CatalogError> {
        Ok(self.root.join(validate_name(name)?))
    }

    pub async fn contains(&self, name: &str) -> Result<bool, CatalogError> {
        let path = self.path(name)?;
        match tokio::fs::metadata(&path).await {
            Ok(meta) => Ok(meta.is_file()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(false),
            Err(e) => Err(io_err("stat", e)),
        }
    }

    pub async fn stat(&self, name: &str) -> Result<StoredModel, CatalogError> {
        let path = self.path(name)?;
        let meta = tokio::fs::metadata(&path).await.map_err(|e| io_err("stat", e))?;
        if !meta.is_file() {
            return Err(CatalogError::NotFound);
        }
        Ok(StoredModel {
            filename: name.to_string(),
            size: meta.len(),
            modified: meta
                .modified()
                .map(DateTime::<Utc>::from)
                .unwrap_or_else(|_| DateTime::<Utc>::from(SystemTime::UNIX_EPOCH)),
        })
    }

    /// Stored files, sorted by name. Staging and other hidden files are skipped.
    pub async fn list(&self) -> Result<Vec<StoredModel>, CatalogError> {
        let mut entries = tokio::fs::read_dir(&self.root)
            .await
            .map_err(|e| CatalogError::Io(format!("read {:?}: {e}", self.root)))?;

        let mut models = Vec::new();
        while let Some(entry) = entries
            .next_entry()
            .await
            .map_err(|e| CatalogError::Io(format!("read {:?}: {e}", self.root)))?
        {
            let Some(name) = entry.file_name().to_str().map(str::to_string) else {
                continue;
            };
            if validate_name(&name).is_err() {
                continue;
            }
            match self.stat(&name).await {
                Ok(model) => models.push(model),
                Err(CatalogError::NotFound) => {}
                Err(e) => warn!("skipping {name}: {e}"),
            }
        }

        models.sort_by(|a, b| a.filename.cmp(&b.filename));
        Ok(models)
    }

    pub async fn read(&self, name: &str) -> Result<Vec<u8>, CatalogError> {
        let path = self.path(name)?;
        tokio::fs::read(&path).await.map_err(|e| io_err("read", e))
    }

    pub async fn delete(&self, name: &str) -> Result<(), CatalogError> {
        let path = self.path(name)?;
        tokio::fs::remove_file(&path)
            .await
            .map_err(|e| io_err("delete", e))?;
        debug!("deleted model {name}");
        Ok(())
    }

    /// Start an upload. The staged file lives inside the store directory so
    /// committing is a rename; dropping it uncommitted removes it.
    pub async fn stage(&self) -> Result<StagedUpload, CatalogError> {
        let named = tempfile::Builder::new()
            .prefix(STAGING_PREFIX)
            .tempfile_in(&self.root)
            .map_err(|e| CatalogError::Io(format!("stage in {:?}: {e}", self.root)))?;
        let (file, temp) = named.into_parts();
        Ok(StagedUpload {
            file: tokio::fs::File::from_std(file),
            temp,
            root: self.root.clone(),
            len: 0,
        })
    }
}

/// Upload in progress. Released (deleted) on drop unless committed.
#[derive(Debug)]
pub struct StagedUpload {
    file: tokio::fs::File,
    temp: tempfile::TempPath,
    root: PathBuf,
    len: u64,
}

impl StagedUpload {
    pub async fn write(&mut self, chunk: &[u8]) -> Result<(), CatalogError> {
        self.file
            .write_all(chunk)
            .await
            .map_err(|e| CatalogError::Io(format!("write staged upload: {e}")))?;
        self.len += chunk.len() as u64;
        Ok(())
    }

    pub fn len(&self) -> u64 {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Move the staged bytes to `name`, replacing any file already stored there.
    pub async fn commit(mut self, name: &str) -> Result<StoredModel, CatalogError> {
        let name = validate_name(name)?;
        self.file
            .flush()
            .await
            .map_err(|e| CatalogError::Io(format!("flush staged upload: {e}")))?;
        self.file
            .sync_all()
            .await
            .map_err(|e| CatalogError::Io(format!("sync staged upload: {e}")))?;

        let dest = self.root.join(name);
        let StagedUpload { file, temp, len, .. } = self;
        drop(file);
        temp.persist(&dest)
            .map_err(|e| CatalogError::Io(format!("commit {dest:?}: {}", e.error)))?;

        Ok(StoredModel {
            filename: name.to_string(),
            size: len,
            modified: Utc::now(),
        })
    }
}
