//! Durable snapshot store: per-language project lists and per-project
//! content snapshots as pretty-printed JSON under `data/`.
//!
//! Writes are full overwrites; sync never merges. Reads tolerate absent
//! files (empty list / `None`). Concurrent writers for the same
//! `{projectId, language}` key are not coordinated here; callers must
//! serialize those.
use std::collections::HashSet;
use std::io::ErrorKind;
use std::path::PathBuf;
use thiserror::Error;
use tokio::fs;
use tracing::info;

use crate::model::{Language, Project, ProjectSnapshot};

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("duplicate slug '{slug}' in {language} project list")]
    DuplicateSlug { slug: String, language: Language },
}

pub struct SnapshotStore {
    data_dir: PathBuf,
}

impl SnapshotStore {
    pub fn new(data_dir: impl Into<PathBuf>) -> Self {
        Self {
            data_dir: data_dir.into(),
        }
    }

    fn project_list_path(&self, language: Language) -> PathBuf {
        self.data_dir.join(format!("projects-{language}.json"))
    }

    fn content_path(&self, project_id: &str, language: Language) -> PathBuf {
        self.data_dir
            .join("content")
            .join(format!("{project_id}-{language}.json"))
    }

    /// Replace the project list snapshot for one language.
    ///
    /// Slugs are the cross-language join key, so a duplicate non-empty
    /// slug within one language is rejected rather than silently letting
    /// one project shadow another.
    pub async fn write_project_list(
        &self,
        language: Language,
        projects: &[Project],
    ) -> Result<(), StoreError> {
        let mut seen = HashSet::new();
        for project in projects {
            if !project.slug.is_empty() && !seen.insert(project.slug.as_str()) {
                return Err(StoreError::DuplicateSlug {
                    slug: project.slug.clone(),
                    language,
                });
            }
        }

        fs::create_dir_all(&self.data_dir).await?;
        let path = self.project_list_path(language);
        let json = serde_json::to_vec_pretty(projects)?;
        fs::write(&path, json).await?;
        info!(path = %path.display(), count = projects.len(), "wrote project list snapshot");
        Ok(())
    }

    /// Read the project list for one language; empty if never synced.
    pub async fn read_project_list(&self, language: Language) -> Result<Vec<Project>, StoreError> {
        match fs::read(self.project_list_path(language)).await {
            Ok(bytes) => Ok(serde_json::from_slice(&bytes)?),
            Err(err) if err.kind() == ErrorKind::NotFound => Ok(Vec::new()),
            Err(err) => Err(err.into()),
        }
    }

    /// Replace the content snapshot for one `{projectId, language}` key.
    pub async fn write_project_content(
        &self,
        project_id: &str,
        language: Language,
        snapshot: &ProjectSnapshot,
    ) -> Result<(), StoreError> {
        let path = self.content_path(project_id, language);
        if let Some(dir) = path.parent() {
            fs::create_dir_all(dir).await?;
        }
        let json = serde_json::to_vec_pretty(snapshot)?;
        fs::write(&path, json).await?;
        info!(path = %path.display(), blocks = snapshot.blocks.len(), "wrote content snapshot");
        Ok(())
    }

    /// Read a content snapshot; `None` if never synced.
    pub async fn read_project_content(
        &self,
        project_id: &str,
        language: Language,
    ) -> Result<Option<ProjectSnapshot>, StoreError> {
        match fs::read(self.content_path(project_id, language)).await {
            Ok(bytes) => Ok(Some(serde_json::from_slice(&bytes)?)),
            Err(err) if err.kind() == ErrorKind::NotFound => Ok(None),
            Err(err) => Err(err.into()),
        }
    }
}
