//! Data sources for listings and diffs.
//!
//! The tree core only sees [`ChangesetSource`]. Concrete sources read a
//! content-addressed JSON export, a results directory, or a live server.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use async_trait::async_trait;
use sha1::{Digest, Sha1};

use crate::config::SourceSettings;
use crate::error::{AppError, Result};
use crate::tree::node::{Node, NodeId};

pub mod http;
pub mod json_dir;
#[cfg(test)]
pub mod memory;
pub mod snapshot_dir;

/// Where a changeset's listings and diffs come from.
#[async_trait]
pub trait ChangesetSource: Send + Sync {
    /// Short human-readable description for titles and logs.
    fn describe(&self) -> String;

    /// Top-level listing. Subtrees not included are unloaded.
    async fn initial_listing(&self) -> Result<Vec<Node>>;

    /// Direct children of `id`. Repeated calls return equivalent data.
    async fn children(&self, id: &NodeId) -> Result<Vec<Node>>;

    /// Unified diff of `id`, one entry per line, line endings included.
    async fn diff_lines(&self, id: &NodeId) -> Result<Vec<String>>;
}

/// Kind of source to open.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceKind {
    /// Pick from the location: URL → HTTP, otherwise inspect the directory.
    Auto,
    JsonDir,
    SnapshotDir,
    Http,
}

impl SourceKind {
    /// Parse the kind from config string.
    pub fn from_str(s: &str) -> Self {
        match s {
            "json_dir" | "json" => SourceKind::JsonDir,
            "snapshot_dir" | "results" => SourceKind::SnapshotDir,
            "http" => SourceKind::Http,
            _ => SourceKind::Auto,
        }
    }
}

/// Lowercase hex SHA-1 of an identity, the file name used by exports.
pub fn content_address(id: &NodeId) -> String {
    hex::encode(Sha1::digest(id.as_str().as_bytes()))
}

fn is_url(location: &str) -> bool {
    location.starts_with("http://") || location.starts_with("https://")
}

/// Resolve the directory layout under `path` for `SourceKind::Auto`.
fn detect_dir_kind(path: &Path) -> Option<(SourceKind, PathBuf)> {
    if path.join(json_dir::INITIAL_LISTING_FILE).is_file() {
        return Some((SourceKind::JsonDir, path.to_path_buf()));
    }
    let nested = path.join("json");
    if nested.join(json_dir::INITIAL_LISTING_FILE).is_file() {
        return Some((SourceKind::JsonDir, nested));
    }
    let tree_json = snapshot_dir::TREE_FILE;
    if path.join(tree_json).is_file() || path.join("tree").join(tree_json).is_file() {
        return Some((SourceKind::SnapshotDir, path.to_path_buf()));
    }
    None
}

/// Open the source described by `settings`.
pub fn open(settings: &SourceSettings) -> Result<Arc<dyn ChangesetSource>> {
    let location = settings.location.as_str();
    let kind = match settings.kind {
        SourceKind::Auto if is_url(location) => SourceKind::Http,
        other => other,
    };

    match kind {
        SourceKind::Http => Ok(Arc::new(http::HttpSource::new(
            location,
            settings.content_addressed,
            settings.request_timeout,
        )?)),
        SourceKind::JsonDir => Ok(Arc::new(json_dir::JsonDirSource::new(location))),
        SourceKind::SnapshotDir => Ok(Arc::new(snapshot_dir::SnapshotDirSource::load(
            Path::new(location),
        )?)),
        SourceKind::Auto => match detect_dir_kind(Path::new(location)) {
            Some((SourceKind::JsonDir, dir)) => Ok(Arc::new(json_dir::JsonDirSource::new(dir))),
            Some((_, dir)) => Ok(Arc::new(snapshot_dir::SnapshotDirSource::load(&dir)?)),
            None => Err(AppError::InvalidPath(format!(
                "{} is neither a URL nor a changeset export directory",
                location
            ))),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    fn settings(location: &str, kind: SourceKind) -> SourceSettings {
        SourceSettings {
            kind,
            location: location.to_string(),
            content_addressed: false,
            request_timeout: Some(Duration::from_secs(5)),
        }
    }

    #[test]
    fn content_address_is_hex_sha1() {
        assert_eq!(
            content_address(&NodeId::from("abc")),
            "a9993e364706816aba3e25717850c26c9cd0d89d"
        );
    }

    #[test]
    fn source_kind_from_str() {
        assert_eq!(SourceKind::from_str("json_dir"), SourceKind::JsonDir);
        assert_eq!(SourceKind::from_str("results"), SourceKind::SnapshotDir);
        assert_eq!(SourceKind::from_str("http"), SourceKind::Http);
        assert_eq!(SourceKind::from_str("whatever"), SourceKind::Auto);
    }

    #[test]
    fn auto_picks_http_for_urls() {
        let source = open(&settings("http://localhost:5000", SourceKind::Auto)).unwrap();
        assert!(source.describe().contains("localhost:5000"));
    }

    #[test]
    fn auto_detects_json_export() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("changed_files"), "[]").unwrap();
        let location = dir.path().to_string_lossy().to_string();
        let source = open(&settings(&location, SourceKind::Auto)).unwrap();
        assert!(source.describe().starts_with("json"));
    }

    #[test]
    fn auto_detects_nested_json_export() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::create_dir(dir.path().join("json")).unwrap();
        std::fs::write(dir.path().join("json").join("changed_files"), "[]").unwrap();
        let location = dir.path().to_string_lossy().to_string();
        let source = open(&settings(&location, SourceKind::Auto)).unwrap();
        assert!(source.describe().starts_with("json"));
    }

    #[test]
    fn auto_detects_results_directory() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::create_dir(dir.path().join("tree")).unwrap();
        std::fs::write(dir.path().join("tree").join("tree.json"), "[]").unwrap();
        std::fs::write(dir.path().join("tree").join("children.json"), "{}").unwrap();
        let location = dir.path().to_string_lossy().to_string();
        let source = open(&settings(&location, SourceKind::Auto)).unwrap();
        assert!(source.describe().starts_with("results"));
    }

    #[test]
    fn auto_rejects_unknown_directory() {
        let dir = tempfile::tempdir().unwrap();
        let location = dir.path().to_string_lossy().to_string();
        let err = match open(&settings(&location, SourceKind::Auto)) {
            Ok(_) => panic!("expected an error"),
            Err(e) => e,
        };
        assert!(matches!(err, AppError::InvalidPath(_)));
    }
}
