//! Static cover-image table and curated display order.
//!
//! Project covers are pre-rendered site assets mapped by project name, not
//! downloaded from the remote source; unknown names fall back to the
//! default background.
use once_cell::sync::Lazy;
use std::collections::HashMap;
use tracing::warn;

use crate::model::Project;

pub const DEFAULT_COVER: &str = "/background.png";

static COVER_IMAGES: Lazy<HashMap<&'static str, &'static str>> = Lazy::new(|| {
    HashMap::from([
        (
            "Zoom Docs - Contextual AI tools",
            "/1Zoom Docs - Contextual AI tools.png",
        ),
        (
            "Zoom Docs - Ask AI Companion",
            "/2Zoom Docs - Ask AI Companion1.png",
        ),
        ("Zoom Docs - AI meeting doc", "/3Zoom Docs - AI meeting doc.png"),
        ("Zoom Docs - Page editor", "/4Zoom Docs - Page editor.png"),
        ("Light - Mainsite", "/5Light - Mainsite.png"),
        ("Light - GTD", "/6Light - GTD.png"),
        ("希悦校园 Chalk 3.0", "/7希悦校园 Chalk.png"),
    ])
});

static DISPLAY_ORDER: &[&str] = &[
    "Zoom Docs - Contextual AI tools",
    "Zoom Docs - Ask AI Companion",
    "Zoom Docs - AI meeting doc",
    "Zoom Docs - Page editor",
    "Light - Mainsite",
    "Light - GTD",
    "希悦校园 Chalk 3.0",
];

/// Cover image path for a project name, defaulting when unmapped.
pub fn cover_image(name: &str) -> &'static str {
    match COVER_IMAGES.get(name) {
        Some(path) => path,
        None => {
            warn!(name, "no cover image mapping; using default");
            DEFAULT_COVER
        }
    }
}

/// Stable-sort projects into the curated display order; names outside the
/// table keep their relative order after the known ones.
pub fn sort_by_display_order(projects: &mut [Project]) {
    projects.sort_by_key(|p| {
        DISPLAY_ORDER
            .iter()
            .position(|name| *name == p.name)
            .unwrap_or(usize::MAX)
    });
}
