//! Media localization: download embedded assets and rewrite blocks to
//! point at local copies.
//!
//! Strictly best-effort: a failed download logs a warning and leaves the
//! block's remote reference in place with `local_path = None`. One broken
//! asset must never abort the sync of a page. Destination names are
//! content-addressed by `{projectId}-{blockId}`, so re-localizing a block
//! overwrites instead of duplicating.
use anyhow::{Context, Result};
use percent_encoding::percent_decode_str;
use reqwest::{Client, Url};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tokio::fs;
use tokio::io::AsyncWriteExt;
use tracing::{info, warn};

use futures::future::BoxFuture;
use futures::FutureExt;

use crate::notion::model::{Block, BlockKind, MediaBody};

/// Notion's S3 URLs reject requests without a browser-like user agent.
const USER_AGENT: &str = "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36";

const VIDEO_EXTENSIONS: &[&str] = &[".mp4", ".mov", ".avi", ".mkv", ".webm"];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MediaKind {
    Image,
    File,
    Pdf,
    Video,
}

impl MediaKind {
    /// Subdirectory under `public/projects/` the asset lands in.
    pub fn subdir(&self) -> &'static str {
        match self {
            MediaKind::Image => "content",
            MediaKind::File | MediaKind::Pdf => "files",
            MediaKind::Video => "videos",
        }
    }

    /// Per-kind download timeout; videos are expected to be large.
    pub fn timeout(&self) -> Duration {
        match self {
            MediaKind::Image => Duration::from_secs(30),
            MediaKind::File | MediaKind::Pdf => Duration::from_secs(60),
            MediaKind::Video => Duration::from_secs(180),
        }
    }
}

pub struct MediaLocalizer {
    http: Client,
    public_dir: PathBuf,
}

impl MediaLocalizer {
    pub fn new(public_dir: impl Into<PathBuf>) -> Self {
        let http = Client::builder()
            .user_agent(USER_AGENT)
            .build()
            .expect("reqwest client");
        Self {
            http,
            public_dir: public_dir.into(),
        }
    }

    /// Walk a resolved tree depth-first (parent before children, resolver
    /// order) and localize every media block in place.
    pub async fn localize_tree(&self, blocks: &mut [Block], project_id: &str) {
        for block in blocks.iter_mut() {
            self.localize_block(block, project_id).await;
        }
    }

    fn localize_block<'a>(&'a self, block: &'a mut Block, project_id: &'a str) -> BoxFuture<'a, ()> {
        async move {
            let Block { id, kind, children, .. } = block;
            if let Some((media_kind, body)) = media_target(kind) {
                self.localize_media(media_kind, body, project_id, id).await;
            }
            for child in children.iter_mut() {
                self.localize_block(child, project_id).await;
            }
        }
        .boxed()
    }

    async fn localize_media(
        &self,
        kind: MediaKind,
        body: &mut MediaBody,
        project_id: &str,
        block_id: &str,
    ) {
        let url = body.source.url().to_string();
        if url.is_empty() {
            return;
        }
        let file_name = destination_name(kind, project_id, block_id, body.name.as_deref(), &url);
        let rel_path = format!("/projects/{}/{}", kind.subdir(), file_name);
        let dest = self
            .public_dir
            .join("projects")
            .join(kind.subdir())
            .join(&file_name);

        match self.download(&url, &dest, kind.timeout()).await {
            Ok(()) => {
                info!(path = %rel_path, "localized media asset");
                body.local_path = Some(rel_path);
            }
            Err(err) => {
                warn!(url = %url, error = %err, "failed to localize media; keeping remote reference");
                body.local_path = None;
            }
        }
    }

    async fn download(&self, url: &str, dest: &Path, timeout: Duration) -> Result<()> {
        if let Some(dir) = dest.parent() {
            fs::create_dir_all(dir)
                .await
                .with_context(|| format!("failed to create {}", dir.display()))?;
        }
        let mut res = self
            .http
            .get(url)
            .timeout(timeout)
            .send()
            .await
            .context("download request failed")?
            .error_for_status()
            .context("download returned error status")?;

        let mut file = fs::File::create(dest)
            .await
            .with_context(|| format!("failed to create {}", dest.display()))?;
        while let Some(chunk) = res.chunk().await.context("download stream failed")? {
            file.write_all(&chunk)
                .await
                .context("failed to write media chunk")?;
        }
        file.flush().await.context("failed to flush media file")?;
        Ok(())
    }
}

fn media_target(kind: &mut BlockKind) -> Option<(MediaKind, &mut MediaBody)> {
    match kind {
        BlockKind::Image { image } => Some((MediaKind::Image, image)),
        BlockKind::File { file } => Some((MediaKind::File, file)),
        BlockKind::Pdf { pdf } => Some((MediaKind::Pdf, pdf)),
        BlockKind::Video { video } => Some((MediaKind::Video, video)),
        _ => None,
    }
}

/// Destination file name for one media asset.
pub fn destination_name(
    kind: MediaKind,
    project_id: &str,
    block_id: &str,
    declared_name: Option<&str>,
    url: &str,
) -> String {
    match kind {
        MediaKind::Image => {
            let ext = url_extension(url).unwrap_or_else(|| ".jpg".to_string());
            format!("{project_id}-{block_id}{ext}")
        }
        MediaKind::File => {
            let name = declared_name
                .filter(|n| !n.is_empty())
                .unwrap_or("unnamed-file");
            let name = ensure_extension(name, url, ".bin");
            format!("{project_id}-{block_id}-{}", clean_file_name(&name))
        }
        MediaKind::Pdf => {
            // PDF blocks typically carry no name; fall back to the URL's
            // last path segment.
            let name = declared_name
                .filter(|n| !n.is_empty())
                .map(str::to_string)
                .or_else(|| url_file_name(url))
                .unwrap_or_else(|| "document.pdf".to_string());
            let name = ensure_extension(&name, url, ".pdf");
            format!("{project_id}-{block_id}-{}", clean_file_name(&name))
        }
        MediaKind::Video => {
            let name = declared_name
                .filter(|n| has_video_extension(n))
                .map(str::to_string)
                .or_else(|| url_file_name(url).filter(|n| has_video_extension(n)))
                .unwrap_or_else(|| {
                    let ext = url_extension(url).unwrap_or_else(|| ".mp4".to_string());
                    format!("video{ext}")
                });
            format!("{project_id}-{block_id}-{}", clean_file_name(&name))
        }
    }
}

fn has_video_extension(name: &str) -> bool {
    extension_of(name)
        .map(|ext| VIDEO_EXTENSIONS.contains(&ext.as_str()))
        .unwrap_or(false)
}

fn extension_of(name: &str) -> Option<String> {
    Path::new(name)
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| format!(".{}", e.to_ascii_lowercase()))
}

/// Extension from the URL path (query stripped), lowercased, with dot.
fn url_extension(url: &str) -> Option<String> {
    let parsed = Url::parse(url).ok()?;
    extension_of(parsed.path())
}

/// Last path segment of the URL, percent-decoded.
fn url_file_name(url: &str) -> Option<String> {
    let parsed = Url::parse(url).ok()?;
    let segment = parsed.path_segments()?.last()?;
    if segment.is_empty() {
        return None;
    }
    Some(
        percent_decode_str(segment)
            .decode_utf8_lossy()
            .into_owned(),
    )
}

fn ensure_extension(name: &str, url: &str, fallback: &str) -> String {
    if extension_of(name).is_some() {
        return name.to_string();
    }
    let ext = url_extension(url).unwrap_or_else(|| fallback.to_string());
    format!("{name}{ext}")
}

/// Replace filesystem-illegal characters in a declared file name.
fn clean_file_name(name: &str) -> String {
    name.chars()
        .map(|c| match c {
            '<' | '>' | ':' | '"' | '/' | '\\' | '|' | '?' | '*' => '-',
            other => other,
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::notion::model::{ExternalFile, MediaSource};
    use tempfile::tempdir;

    #[test]
    fn image_name_from_url_extension() {
        let name = destination_name(
            MediaKind::Image,
            "p1",
            "b1",
            None,
            "https://s3.example/photo.PNG?X-Amz-Signature=abc",
        );
        assert_eq!(name, "p1-b1.png");
    }

    #[test]
    fn image_name_defaults_to_jpg() {
        let name = destination_name(MediaKind::Image, "p1", "b1", None, "https://s3.example/blob");
        assert_eq!(name, "p1-b1.jpg");
    }

    #[test]
    fn file_name_cleans_illegal_characters() {
        let name = destination_name(
            MediaKind::File,
            "p1",
            "b2",
            Some("my:report/final?.pdf"),
            "https://s3.example/x",
        );
        assert_eq!(name, "p1-b2-my-report-final-.pdf");
    }

    #[test]
    fn file_name_takes_extension_from_url_when_missing() {
        let name = destination_name(
            MediaKind::File,
            "p1",
            "b3",
            Some("archive"),
            "https://s3.example/archive.zip?sig=1",
        );
        assert_eq!(name, "p1-b3-archive.zip");
    }

    #[test]
    fn file_name_without_declared_name() {
        let name = destination_name(MediaKind::File, "p1", "b4", None, "https://s3.example/x");
        assert_eq!(name, "p1-b4-unnamed-file.bin");
    }

    #[test]
    fn pdf_name_inferred_from_url_segment() {
        let name = destination_name(
            MediaKind::Pdf,
            "p1",
            "b5",
            None,
            "https://s3.example/docs/White%20Paper.pdf?sig=1",
        );
        assert_eq!(name, "p1-b5-White Paper.pdf");
    }

    #[test]
    fn pdf_name_defaults_when_url_has_no_segment() {
        let name = destination_name(MediaKind::Pdf, "p1", "b6", None, "https://s3.example/");
        assert_eq!(name, "p1-b6-document.pdf");
    }

    #[test]
    fn video_trusts_declared_name_only_with_known_extension() {
        let trusted = destination_name(
            MediaKind::Video,
            "p1",
            "b7",
            Some("demo.MP4"),
            "https://s3.example/raw",
        );
        assert_eq!(trusted, "p1-b7-demo.MP4");

        let from_url = destination_name(
            MediaKind::Video,
            "p1",
            "b7",
            Some("demo.txt"),
            "https://s3.example/clip.mov?sig=2",
        );
        assert_eq!(from_url, "p1-b7-clip.mov");

        let fallback = destination_name(
            MediaKind::Video,
            "p1",
            "b7",
            None,
            "https://s3.example/stream",
        );
        assert_eq!(fallback, "p1-b7-video.mp4");
    }

    #[test]
    fn kind_table() {
        assert_eq!(MediaKind::Image.subdir(), "content");
        assert_eq!(MediaKind::Pdf.subdir(), "files");
        assert_eq!(MediaKind::Video.subdir(), "videos");
        assert_eq!(MediaKind::Image.timeout(), Duration::from_secs(30));
        assert_eq!(MediaKind::File.timeout(), Duration::from_secs(60));
        assert_eq!(MediaKind::Video.timeout(), Duration::from_secs(180));
    }

    fn image_block(id: &str, url: &str) -> Block {
        Block {
            id: id.into(),
            has_children: false,
            kind: BlockKind::Image {
                image: MediaBody {
                    source: MediaSource::External {
                        external: ExternalFile { url: url.into() },
                    },
                    name: None,
                    caption: vec![],
                    local_path: None,
                },
            },
            children: vec![],
        }
    }

    #[tokio::test]
    async fn failed_download_leaves_remote_reference_intact() {
        let td = tempdir().unwrap();
        let localizer = MediaLocalizer::new(td.path());
        // Nothing listens here; the request fails fast.
        let mut blocks = vec![image_block("b1", "http://127.0.0.1:1/broken.png")];

        localizer.localize_tree(&mut blocks, "p1").await;

        match &blocks[0].kind {
            BlockKind::Image { image } => {
                assert!(image.local_path.is_none());
                assert_eq!(image.source.url(), "http://127.0.0.1:1/broken.png");
            }
            other => panic!("wrong kind: {other:?}"),
        }
    }

    #[tokio::test]
    async fn failed_download_in_child_does_not_disturb_siblings() {
        let td = tempdir().unwrap();
        let localizer = MediaLocalizer::new(td.path());
        let mut parent = image_block("p", "http://127.0.0.1:1/a.png");
        parent.has_children = true;
        parent.children = vec![image_block("c", "http://127.0.0.1:1/b.png")];
        let mut blocks = vec![parent];

        localizer.localize_tree(&mut blocks, "p1").await;

        assert_eq!(blocks[0].children.len(), 1);
    }
}
