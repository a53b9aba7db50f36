//! Content synchronization pipeline for a Notion-backed portfolio site.
//!
//! The pipeline pulls a project list and per-project block trees from the
//! Notion API, resolves nested children across pagination boundaries,
//! downloads embedded media to local storage, and persists a render-ready
//! JSON snapshot per `{project, language}` pair.

pub mod config;
pub mod images;
pub mod media;
pub mod model;
pub mod notion;
pub mod resolver;
pub mod retry;
pub mod store;
pub mod sync;
