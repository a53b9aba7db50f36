//! Pipeline orchestration: remote fetch → tree resolution → media
//! localization → snapshot write.
use chrono::Utc;
use thiserror::Error;
use tracing::{info, instrument, warn};

use crate::config::Config;
use crate::images;
use crate::media::MediaLocalizer;
use crate::model::{Language, ProjectSnapshot, SyncSummary};
use crate::notion::ContentSource;
use crate::resolver;
use crate::store::{SnapshotStore, StoreError};

#[derive(Debug, Error)]
pub enum SyncError {
    /// The requested id is unknown in the primary language's local list.
    #[error("project {project_id} not found in {language} project list")]
    ProjectNotFound {
        project_id: String,
        language: Language,
    },
    /// The slug has no counterpart in the target language's local list.
    #[error("no {language} project matches slug '{slug}'")]
    NoCounterpart { slug: String, language: Language },
    #[error(transparent)]
    Store(#[from] StoreError),
    #[error("remote source error: {0}")]
    Source(#[from] anyhow::Error),
}

/// The content synchronization pipeline. Built once at startup from an
/// explicit client value; no global state.
pub struct Pipeline<S> {
    source: S,
    store: SnapshotStore,
    media: MediaLocalizer,
    database_zh: String,
    database_en: String,
}

impl<S: ContentSource> Pipeline<S> {
    pub fn new(source: S, cfg: &Config) -> Self {
        Self {
            source,
            store: SnapshotStore::new(&cfg.app.data_dir),
            media: MediaLocalizer::new(&cfg.app.public_dir),
            database_zh: cfg.notion.databases.zh.clone(),
            database_en: cfg.notion.databases.en.clone(),
        }
    }

    /// The snapshot store, for read-only consumers (CLI, rendering glue).
    pub fn store(&self) -> &SnapshotStore {
        &self.store
    }

    fn database_id(&self, language: Language) -> &str {
        match language {
            Language::Zh => &self.database_zh,
            Language::En => &self.database_en,
        }
    }

    /// Sync one language's project list: fetch, attach static covers,
    /// replace the list snapshot.
    #[instrument(skip(self))]
    pub async fn sync_all_projects(&self, language: Language) -> Result<SyncSummary, SyncError> {
        let database_id = self.database_id(language);
        info!(%language, database_id, "starting project list sync");

        let mut projects = self.source.list_projects(database_id).await?;
        if projects.is_empty() {
            warn!(%language, "no projects returned; empty database or misconfigured fields");
        }
        for project in &mut projects {
            project.local_image = Some(images::cover_image(&project.name).to_string());
        }

        self.store.write_project_list(language, &projects).await?;
        info!(count = projects.len(), %language, "project list synced");
        Ok(SyncSummary {
            count: projects.len(),
            language,
            projects,
        })
    }

    /// Sync one project's content tree for one language.
    ///
    /// `project_id` is always a primary-language id; for other languages
    /// the matching remote page is resolved through the slug join, while
    /// the snapshot (and all localized media) stays keyed by the requested
    /// id.
    #[instrument(skip(self))]
    pub async fn sync_project_content(
        &self,
        project_id: &str,
        language: Language,
    ) -> Result<ProjectSnapshot, SyncError> {
        let source_project_id = self.resolve_source_project_id(project_id, language).await?;
        info!(project_id, %source_project_id, %language, "starting content sync");

        let content = self.source.fetch_page_blocks(&source_project_id).await?;
        let mut blocks = resolver::resolve_tree(&self.source, content.blocks).await;
        self.media.localize_tree(&mut blocks, project_id).await;

        let snapshot = ProjectSnapshot {
            page: content.page,
            blocks,
            synced_at: Utc::now(),
            language,
            source_project_id,
        };
        self.store
            .write_project_content(project_id, language, &snapshot)
            .await?;
        info!(
            project_id,
            source_project_id = %snapshot.source_project_id,
            blocks = snapshot.blocks.len(),
            %language,
            "project content synced"
        );
        Ok(snapshot)
    }

    /// Map a primary-language project id to the remote id valid in the
    /// target language's database, joining the two local lists on slug.
    async fn resolve_source_project_id(
        &self,
        project_id: &str,
        language: Language,
    ) -> Result<String, SyncError> {
        if language == Language::PRIMARY {
            return Ok(project_id.to_string());
        }

        let primary = self.store.read_project_list(Language::PRIMARY).await?;
        let origin = primary
            .iter()
            .find(|p| p.id == project_id)
            .ok_or_else(|| SyncError::ProjectNotFound {
                project_id: project_id.to_string(),
                language: Language::PRIMARY,
            })?;

        let targets = self.store.read_project_list(language).await?;
        let counterpart = targets
            .iter()
            .find(|p| p.slug == origin.slug)
            .ok_or_else(|| SyncError::NoCounterpart {
                slug: origin.slug.clone(),
                language,
            })?;

        info!(
            slug = %origin.slug,
            resolved = %counterpart.id,
            %language,
            "resolved cross-language project id"
        );
        Ok(counterpart.id.clone())
    }
}
