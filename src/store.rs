//! File-backed story library: keyed upsert / get / list / delete.

use std::path::PathBuf;

use tokio::sync::Mutex;

use crate::error::StoreError;
use crate::story::Story;

pub struct StoryStore {
    path: PathBuf,
    // Held across every read-modify-write of the file.
    write_lock: Mutex<()>,
}

impl StoryStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            write_lock: Mutex::new(()),
        }
    }

    async fn read_all(&self) -> Result<Vec<Story>, StoreError> {
        match tokio::fs::read(&self.path).await {
            Ok(data) if data.iter().all(u8::is_ascii_whitespace) => Ok(Vec::new()),
            Ok(data) => Ok(serde_json::from_slice(&data)?),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(Vec::new()),
            Err(e) => Err(e.into()),
        }
    }

    async fn write_all(&self, stories: &[Story]) -> Result<(), StoreError> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent).await?;
        }
        let data = serde_json::to_vec_pretty(stories)?;
        // 先写临时文件再重命名，避免写一半的文件
        let tmp = self
            .path
            .with_extension(format!("{}.tmp", uuid::Uuid::new_v4().simple()));
        tokio::fs::write(&tmp, data).await?;
        tokio::fs::rename(&tmp, &self.path).await?;
        Ok(())
    }

    /// Insert `story`, replacing any stored story with the same id.
    pub async fn upsert(&self, story: &Story) -> Result<(), StoreError> {
        let _guard = self.write_lock.lock().await;
        let mut stories = self.read_all().await?;
        match stories.iter_mut().find(|s| s.id == story.id) {
            Some(existing) => *existing = story.clone(),
            None => stories.push(story.clone()),
        }
        self.write_all(&stories).await?;
        log::debug!("Saved story {} ({} in library)", story.id, stories.len());
        Ok(())
    }

    pub async fn get(&self, id: &str) -> Result<Option<Story>, StoreError> {
        Ok(self.read_all().await?.into_iter().find(|s| s.id == id))
    }

    /// All stories, newest first.
    pub async fn list(&self) -> Result<Vec<Story>, StoreError> {
        let mut stories = self.read_all().await?;
        stories.sort_by(|a, b| b.timestamp.cmp(&a.timestamp));
        Ok(stories)
    }

    /// Returns false when no story had that id.
    pub async fn delete(&self, id: &str) -> Result<bool, StoreError> {
        let _guard = self.write_lock.lock().await;
        let mut stories = self.read_all().await?;
        let before = stories.len();
        stories.retain(|s| s.id != id);
        if stories.len() == before {
            return Ok(false);
        }
        self.write_all(&stories).await?;
        log::debug!("Deleted story {}", id);
        Ok(true)
    }
}
