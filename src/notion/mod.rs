//! Remote content client for the Notion API.
//!
//! Mirrors the documented HTTP surface this pipeline reads: database
//! queries (project lists), page retrieval and block-children listing,
//! all cursor-paginated with hard page ceilings so a misbehaving source
//! cannot keep us looping forever.
use anyhow::{anyhow, Context, Result};
use async_trait::async_trait;
use reqwest::{Client, StatusCode, Url};
use serde_json::{json, Value};
use std::fmt;
use std::future::Future;
use tracing::{debug, info, warn};

use crate::model::{project_from_page, Project};
use crate::notion::model::{Block, Page, PageContent, PageMeta};
use crate::retry::{with_retry, RetryPolicy};

pub mod model;

const NOTION_API_BASE: &str = "https://api.notion.com/";
const PAGE_SIZE: u32 = 100;

/// Page-count ceiling for root-level pagination (database queries, a
/// page's own block list). Reaching it is a warning, not an error.
pub const ROOT_PAGE_LIMIT: u32 = 50;
/// Page-count ceiling for per-block child fetches.
pub const CHILD_PAGE_LIMIT: u32 = 20;

/// Read-only view of the remote content source. `NotionClient` is the
/// real implementation; tests substitute scripted fakes.
#[async_trait]
pub trait ContentSource: Send + Sync {
    /// All projects in one database, in the source's return order.
    async fn list_projects(&self, database_id: &str) -> Result<Vec<Project>>;

    /// Page metadata plus its root-level blocks. Retried per the client's
    /// retry policy; this is the pipeline's only retried operation.
    async fn fetch_page_blocks(&self, page_id: &str) -> Result<PageContent>;

    /// One block's direct children across pagination boundaries.
    async fn fetch_block_children(&self, block_id: &str) -> Result<Vec<Block>>;
}

#[derive(Clone)]
pub struct NotionClient {
    http: Client,
    base_url: Url,
    token: String,
    version: String,
    retry: RetryPolicy,
}

impl fmt::Debug for NotionClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NotionClient")
            .field("base_url", &self.base_url)
            .field("retry", &self.retry)
            .finish_non_exhaustive()
    }
}

impl NotionClient {
    pub fn new(token: String, version: String, retry: RetryPolicy) -> Self {
        let base_url = Url::parse(NOTION_API_BASE).expect("valid default Notion URL");
        Self::with_base_url(token, version, retry, base_url)
    }

    pub fn with_base_url(token: String, version: String, retry: RetryPolicy, base_url: Url) -> Self {
        let http = Client::builder()
            .user_agent("folio-sync/0.1")
            .no_proxy()
            .build()
            .expect("reqwest client");
        Self {
            http,
            base_url,
            token,
            version,
            retry,
        }
    }

    pub fn build_query_request(
        &self,
        database_id: &str,
        cursor: Option<&str>,
    ) -> Result<reqwest::Request> {
        let endpoint = self
            .base_url
            .join(&format!("v1/databases/{database_id}/query"))
            .context("invalid Notion base URL")?;
        self.http
            .post(endpoint)
            .header("Authorization", format!("Bearer {}", self.token))
            .header("Notion-Version", &self.version)
            .header("Content-Type", "application/json")
            .json(&build_query_body(cursor))
            .build()
            .context("failed to build Notion query request")
    }

    pub fn build_children_request(
        &self,
        block_id: &str,
        cursor: Option<&str>,
    ) -> Result<reqwest::Request> {
        let endpoint = self
            .base_url
            .join(&format!("v1/blocks/{block_id}/children"))
            .context("invalid Notion base URL")?;
        let mut builder = self
            .http
            .get(endpoint)
            .header("Authorization", format!("Bearer {}", self.token))
            .header("Notion-Version", &self.version)
            .query(&[("page_size", PAGE_SIZE.to_string())]);
        if let Some(cursor) = cursor {
            builder = builder.query(&[("start_cursor", cursor)]);
        }
        builder
            .build()
            .context("failed to build Notion children request")
    }

    pub fn build_page_request(&self, page_id: &str) -> Result<reqwest::Request> {
        let endpoint = self
            .base_url
            .join(&format!("v1/pages/{page_id}"))
            .context("invalid Notion base URL")?;
        self.http
            .get(endpoint)
            .header("Authorization", format!("Bearer {}", self.token))
            .header("Notion-Version", &self.version)
            .build()
            .context("failed to build Notion page request")
    }

    async fn execute(&self, request: reqwest::Request, what: &str) -> Result<reqwest::Response> {
        debug!(url = %request.url(), what, "sending notion request");
        let res = self
            .http
            .execute(request)
            .await
            .with_context(|| format!("failed to reach Notion ({what})"))?;

        if res.status() == StatusCode::TOO_MANY_REQUESTS {
            let body = res.text().await.unwrap_or_default();
            warn!(what, "rate limited by Notion: {}", body);
            return Err(anyhow!("received 429 from Notion: {}", body));
        }
        if !res.status().is_success() {
            let status = res.status();
            let body = res.text().await.unwrap_or_default();
            return Err(anyhow!("notion error {} ({what}): {}", status, body));
        }
        Ok(res)
    }

    async fn query_database_page(
        &self,
        database_id: &str,
        cursor: Option<String>,
    ) -> Result<Page<Value>> {
        let request = self.build_query_request(database_id, cursor.as_deref())?;
        let res = self.execute(request, "database query").await?;
        res.json().await.context("invalid Notion query response")
    }

    async fn children_page(&self, block_id: &str, cursor: Option<String>) -> Result<Page<Block>> {
        let request = self.build_children_request(block_id, cursor.as_deref())?;
        let res = self.execute(request, "block children").await?;
        res.json().await.context("invalid Notion children response")
    }

    async fn retrieve_page(&self, page_id: &str) -> Result<PageMeta> {
        let request = self.build_page_request(page_id)?;
        let res = self.execute(request, "page retrieve").await?;
        res.json().await.context("invalid Notion page response")
    }

    pub async fn list_projects(&self, database_id: &str) -> Result<Vec<Project>> {
        let pages = paginate(ROOT_PAGE_LIMIT, "database query", |cursor| {
            self.query_database_page(database_id, cursor)
        })
        .await?;
        let projects: Vec<Project> = pages.iter().filter_map(project_from_page).collect();
        info!(count = projects.len(), database_id, "fetched project list");
        Ok(projects)
    }

    pub async fn fetch_page_blocks(&self, page_id: &str) -> Result<PageContent> {
        with_retry(&self.retry, "page fetch", || {
            self.fetch_page_blocks_once(page_id)
        })
        .await
    }

    async fn fetch_page_blocks_once(&self, page_id: &str) -> Result<PageContent> {
        let page = self.retrieve_page(page_id).await?;
        let blocks = paginate(ROOT_PAGE_LIMIT, "page blocks", |cursor| {
            self.children_page(page_id, cursor)
        })
        .await?;
        Ok(PageContent { page, blocks })
    }

    pub async fn fetch_block_children(&self, block_id: &str) -> Result<Vec<Block>> {
        paginate(CHILD_PAGE_LIMIT, "block children", |cursor| {
            self.children_page(block_id, cursor)
        })
        .await
    }
}

#[async_trait]
impl ContentSource for NotionClient {
    async fn list_projects(&self, database_id: &str) -> Result<Vec<Project>> {
        NotionClient::list_projects(self, database_id).await
    }

    async fn fetch_page_blocks(&self, page_id: &str) -> Result<PageContent> {
        NotionClient::fetch_page_blocks(self, page_id).await
    }

    async fn fetch_block_children(&self, block_id: &str) -> Result<Vec<Block>> {
        NotionClient::fetch_block_children(self, block_id).await
    }
}

fn build_query_body(cursor: Option<&str>) -> Value {
    let mut body = json!({ "page_size": PAGE_SIZE });
    if let Some(cursor) = cursor {
        body["start_cursor"] = json!(cursor);
    }
    body
}

/// Drive a cursor-paginated fetch to completion, concatenating results in
/// return order. Stops when the source reports no more pages or when
/// `max_pages` fetches have been issued; hitting the ceiling logs a
/// warning and yields the partial result.
pub async fn paginate<T, F, Fut>(max_pages: u32, label: &str, mut fetch: F) -> Result<Vec<T>>
where
    F: FnMut(Option<String>) -> Fut,
    Fut: Future<Output = Result<Page<T>>>,
{
    let mut all = Vec::new();
    let mut cursor: Option<String> = None;
    let mut pages = 0u32;
    loop {
        let page = fetch(cursor.take()).await?;
        pages += 1;
        all.extend(page.results);
        if !page.has_more {
            break;
        }
        let Some(next) = page.next_cursor else { break };
        if pages >= max_pages {
            warn!(label, max_pages, "pagination ceiling reached; using partial results");
            break;
        }
        cursor = Some(next);
    }
    Ok(all)
}
