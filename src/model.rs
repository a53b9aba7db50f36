//! Domain entities: languages, projects and persisted snapshots.
use chrono::{DateTime, Datelike, Utc};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;
use std::str::FromStr;

use crate::notion::model::{Block, PageMeta};

/// Content language. Each language is backed by its own Notion database
/// with unrelated page ids; `Zh` is the primary language whose ids anchor
/// cross-language lookups.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, clap::ValueEnum,
)]
#[serde(rename_all = "lowercase")]
pub enum Language {
    Zh,
    En,
}

impl Language {
    /// The language whose project ids are used as the canonical keys.
    pub const PRIMARY: Language = Language::Zh;

    pub fn as_str(&self) -> &'static str {
        match self {
            Language::Zh => "zh",
            Language::En => "en",
        }
    }
}

impl fmt::Display for Language {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Language {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "zh" => Ok(Language::Zh),
            "en" => Ok(Language::En),
            other => Err(format!("unknown language '{other}' (expected zh|en)")),
        }
    }
}

/// One portfolio entry, transformed from a Notion database page.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Project {
    pub id: String,
    pub name: String,
    pub tags: Vec<String>,
    pub year: i32,
    /// Remote cover url from the database page, if any. Cover art shown on
    /// the site comes from the static map in [`crate::images`] instead.
    pub image: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub local_image: Option<String>,
    pub slug: String,
    pub created: DateTime<Utc>,
    pub updated: DateTime<Utc>,
}

/// The persisted unit for one project's content in one language.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ProjectSnapshot {
    pub page: PageMeta,
    pub blocks: Vec<Block>,
    pub synced_at: DateTime<Utc>,
    pub language: Language,
    /// Remote page id the content was fetched from. For non-primary
    /// languages this differs from the id the snapshot is saved under.
    pub source_project_id: String,
}

/// Result of a full project-list sync.
#[derive(Debug, Clone, Serialize)]
pub struct SyncSummary {
    pub count: usize,
    pub language: Language,
    pub projects: Vec<Project>,
}

static SLUG_STRIP: Lazy<Regex> = Lazy::new(|| Regex::new(r"[^a-z0-9_\s-]").expect("valid regex"));
static SLUG_COLLAPSE: Lazy<Regex> = Lazy::new(|| Regex::new(r"[\s_-]+").expect("valid regex"));

/// Derive the URL-safe slug for a project name.
///
/// Lowercases, strips everything outside `[a-z0-9_\s-]`, collapses runs of
/// whitespace/underscores/hyphens to a single hyphen and trims hyphens at
/// both ends. Deterministic and idempotent; used as the cross-language
/// join key, so it must stay stable.
pub fn slugify(name: &str) -> String {
    let lowered = name.to_lowercase();
    let stripped = SLUG_STRIP.replace_all(&lowered, "");
    let collapsed = SLUG_COLLAPSE.replace_all(&stripped, "-");
    collapsed.trim_matches('-').to_string()
}

/// Transform one Notion database page into a [`Project`].
///
/// Returns `None` only when the page carries no id; missing properties
/// degrade to empty/default values, matching the lenient shape of the
/// source database.
pub fn project_from_page(page: &Value) -> Option<Project> {
    let id = page.get("id")?.as_str()?.to_string();
    let properties = page.get("properties").cloned().unwrap_or(Value::Null);

    let name = properties
        .pointer("/Name/title/0/text/content")
        .or_else(|| properties.pointer("/Name/title/0/plain_text"))
        .and_then(Value::as_str)
        .unwrap_or_default()
        .to_string();

    let tags = properties
        .pointer("/Tag/multi_select")
        .and_then(Value::as_array)
        .map(|tags| {
            tags.iter()
                .filter_map(|t| t.get("name").and_then(Value::as_str))
                .map(str::to_string)
                .collect()
        })
        .unwrap_or_default();

    let year = properties
        .pointer("/Year/number")
        .and_then(Value::as_i64)
        .map(|y| y as i32)
        .unwrap_or_else(|| Utc::now().year());

    let image = properties
        .pointer("/Image/files/0")
        .and_then(|file| match file.get("type").and_then(Value::as_str) {
            Some("file") => file.pointer("/file/url"),
            _ => file.pointer("/external/url"),
        })
        .and_then(Value::as_str)
        .map(str::to_string);

    let created = parse_timestamp(page.get("created_time"));
    let updated = parse_timestamp(page.get("last_edited_time"));
    let slug = slugify(&name);

    Some(Project {
        id,
        name,
        tags,
        year,
        image,
        local_image: None,
        slug,
        created,
        updated,
    })
}

fn parse_timestamp(value: Option<&Value>) -> DateTime<Utc> {
    value
        .and_then(Value::as_str)
        .and_then(|s| DateTime::parse_from_rfc3339(s).ok())
        .map(|dt| dt.with_timezone(&Utc))
        .unwrap_or_else(Utc::now)
}
