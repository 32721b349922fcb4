#![deny(missing_docs)]
//! Filesystem-backed persistence for chorus.
//!
//! Profiles and templates live in one pretty-printed JSON array each; chat
//! exports are one JSON file per export. Built-in profiles and templates are
//! written the first time their file is read.

mod builtin;

use std::path::{Path, PathBuf};
use std::sync::Arc;

use async_trait::async_trait;
use chorus_types::{
    ChatExport, Profile, ProfileDraft, RecordStore, StorageError, Template, TemplateDraft,
};
use chrono::Utc;
use serde::Serialize;
use serde::de::DeserializeOwned;
use tokio::sync::Mutex;

/// Directory used by [`FsStore::default_location`], under the home directory.
pub const APP_DIR_NAME: &str = ".ollama-multi-chat";

const PROFILES_FILE: &str = "profiles.json";
const TEMPLATES_FILE: &str = "templates.json";
const EXPORTS_DIR: &str = "exports";

/// Filesystem-backed store for profiles, templates and chat exports.
///
/// Directory layout:
/// ```text
/// root/
///   profiles.json
///   templates.json
///   exports/
///     chat-<name>-<millis>.json
/// ```
///
/// Cloning is cheap; clones share one write lock so concurrent
/// read-modify-write cycles on the same file do not lose updates.
#[derive(Debug, Clone)]
pub struct FsStore {
    root: PathBuf,
    write_lock: Arc<Mutex<()>>,
}

impl FsStore {
    /// Create a store rooted at the given directory.
    ///
    /// The directory is created lazily on first write.
    pub fn new(root: &Path) -> Self {
        Self {
            root: root.to_path_buf(),
            write_lock: Arc::new(Mutex::new(())),
        }
    }

    /// Store under `~/.ollama-multi-chat`. `None` when no home directory is
    /// known.
    pub fn default_location() -> Option<Self> {
        dirs::home_dir().map(|home| Self::new(&home.join(APP_DIR_NAME)))
    }

    /// Root directory of the store.
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Profile records.
    pub fn profiles(&self) -> ProfileStore {
        ProfileStore {
            store: self.clone(),
        }
    }

    /// Template records.
    pub fn templates(&self) -> TemplateStore {
        TemplateStore {
            store: self.clone(),
        }
    }

    fn exports_dir(&self) -> PathBuf {
        self.root.join(EXPORTS_DIR)
    }

    /// Save a chat export and return the file it was written to.
    pub async fn export_chat(&self, export: &ChatExport) -> Result<PathBuf, StorageError> {
        let dir = self.exports_dir();
        tokio::fs::create_dir_all(&dir).await?;
        let filename = format!(
            "chat-{}-{}.json",
            sanitize(&export.name),
            Utc::now().timestamp_millis()
        );
        let path = dir.join(filename);
        let contents = serde_json::to_string_pretty(export)?;
        tokio::fs::write(&path, contents).await?;
        tracing::debug!(path = %path.display(), "chorus.store.export");
        Ok(path)
    }

    /// Read a chat export back from `path`.
    pub async fn import_chat(&self, path: &Path) -> Result<ChatExport, StorageError> {
        let contents = match tokio::fs::read_to_string(path).await {
            Ok(contents) => contents,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Err(StorageError::NotFound(path.display().to_string()));
            }
            Err(e) => return Err(e.into()),
        };
        Ok(serde_json::from_str(&contents)?)
    }

    /// Paths of all saved exports, sorted by file name.
    pub async fn exported_chats(&self) -> Result<Vec<PathBuf>, StorageError> {
        let mut entries = match tokio::fs::read_dir(self.exports_dir()).await {
            Ok(entries) => entries,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(vec![]),
            Err(e) => return Err(e.into()),
        };

        let mut paths = Vec::new();
        while let Some(entry) = entries.next_entry().await? {
            let path = entry.path();
            if path.extension().is_some_and(|ext| ext == "json") {
                paths.push(path);
            }
        }
        paths.sort();
        Ok(paths)
    }

    /// Read a record file, seeding it with `seed` when it does not exist yet.
    async fn load<R>(&self, file: &str, seed: fn() -> Vec<R>) -> Result<Vec<R>, StorageError>
    where
        R: Serialize + DeserializeOwned,
    {
        let path = self.root.join(file);
        match tokio::fs::read_to_string(&path).await {
            Ok(contents) => Ok(serde_json::from_str(&contents)?),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                let records = seed();
                self.save(file, &records).await?;
                tracing::debug!(file, records = records.len(), "chorus.store.seeded");
                Ok(records)
            }
            Err(e) => Err(e.into()),
        }
    }

    async fn save<R: Serialize>(&self, file: &str, records: &[R]) -> Result<(), StorageError> {
        tokio::fs::create_dir_all(&self.root).await?;
        let contents = serde_json::to_string_pretty(records)?;
        tokio::fs::write(self.root.join(file), contents).await?;
        Ok(())
    }
}

/// Replace everything but ASCII letters and digits with `_`.
fn sanitize(name: &str) -> String {
    name.chars()
        .map(|c| if c.is_ascii_alphanumeric() { c } else { '_' })
        .collect()
}

fn new_id() -> String {
    uuid::Uuid::new_v4().to_string()
}

/// Profiles persisted in `profiles.json`.
#[derive(Debug, Clone)]
pub struct ProfileStore {
    store: FsStore,
}

#[async_trait]
impl RecordStore for ProfileStore {
    type Record = Profile;
    type Draft = ProfileDraft;

    async fn list(&self) -> Result<Vec<Profile>, StorageError> {
        self.store.load(PROFILES_FILE, builtin::profiles).await
    }

    async fn get(&self, id: &str) -> Result<Option<Profile>, StorageError> {
        Ok(self.list().await?.into_iter().find(|p| p.id == id))
    }

    async fn create(&self, draft: ProfileDraft) -> Result<Profile, StorageError> {
        let _write = self.store.write_lock.lock().await;
        let mut profiles = self.list().await?;
        let profile = Profile {
            id: new_id(),
            name: draft.name,
            description: draft.description,
            system_prompt: draft.system_prompt,
            created_at: Utc::now(),
            is_built_in: false,
        };
        profiles.push(profile.clone());
        self.store.save(PROFILES_FILE, &profiles).await?;
        Ok(profile)
    }

    async fn delete(&self, id: &str) -> Result<bool, StorageError> {
        let _write = self.store.write_lock.lock().await;
        let mut profiles = self.list().await?;
        let before = profiles.len();
        profiles.retain(|p| p.id != id || p.is_built_in);
        if profiles.len() == before {
            return Ok(false);
        }
        self.store.save(PROFILES_FILE, &profiles).await?;
        Ok(true)
    }
}

/// Templates persisted in `templates.json`.
#[derive(Debug, Clone)]
pub struct TemplateStore {
    store: FsStore,
}

#[async_trait]
impl RecordStore for TemplateStore {
    type Record = Template;
    type Draft = TemplateDraft;

    async fn list(&self) -> Result<Vec<Template>, StorageError> {
        self.store.load(TEMPLATES_FILE, builtin::templates).await
    }

    async fn get(&self, id: &str) -> Result<Option<Template>, StorageError> {
        Ok(self.list().await?.into_iter().find(|t| t.id == id))
    }

    async fn create(&self, draft: TemplateDraft) -> Result<Template, StorageError> {
        let _write = self.store.write_lock.lock().await;
        let mut templates = self.list().await?;
        let template = Template {
            id: new_id(),
            name: draft.name,
            description: draft.description,
            model_names: draft.model_names,
            created_at: Utc::now(),
            is_built_in: false,
        };
        templates.push(template.clone());
        self.store.save(TEMPLATES_FILE, &templates).await?;
        Ok(template)
    }

    async fn delete(&self, id: &str) -> Result<bool, StorageError> {
        let _write = self.store.write_lock.lock().await;
        let mut templates = self.list().await?;
        let before = templates.len();
        templates.retain(|t| t.id != id || t.is_built_in);
        if templates.len() == before {
            return Ok(false);
        }
        self.store.save(TEMPLATES_FILE, &templates).await?;
        Ok(true)
    }
}
