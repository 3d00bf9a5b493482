use std::path::{Path, PathBuf};

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use tracing::debug;

use crate::error::{AppError, Result};
use crate::source::{content_address, ChangesetSource};
use crate::tree::node::{Node, NodeId};

/// File holding the top-level listing.
pub const INITIAL_LISTING_FILE: &str = "changed_files";
/// Directory of children listings, one file per content address.
pub const CHILDREN_DIR: &str = "children";
/// Directory of diffs, one file per content address.
pub const DIFF_DIR: &str = "diff";

/// A static export where every listing and diff is a JSON file named by the
/// SHA-1 of the node identity.
///
/// ```text
/// <root>/changed_files
/// <root>/children/<sha1(key)>
/// <root>/diff/<sha1(key)>
/// ```
#[derive(Debug, Clone)]
pub struct JsonDirSource {
    root: PathBuf,
}

impl JsonDirSource {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    fn addressed(&self, dir: &str, id: &NodeId) -> PathBuf {
        self.root.join(dir).join(content_address(id))
    }

    async fn read_json<T: DeserializeOwned>(path: &Path, id: &str) -> Result<T> {
        debug!(path = %path.display(), "reading export file");
        let content = match tokio::fs::read_to_string(path).await {
            Ok(c) => c,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Err(AppError::NotFound(id.to_string()))
            }
            Err(e) => return Err(e.into()),
        };
        Ok(serde_json::from_str(&content)?)
    }
}

#[async_trait]
impl ChangesetSource for JsonDirSource {
    fn describe(&self) -> String {
        format!("json export {}", self.root.display())
    }

    async fn initial_listing(&self) -> Result<Vec<Node>> {
        let path = self.root.join(INITIAL_LISTING_FILE);
        Self::read_json(&path, INITIAL_LISTING_FILE).await
    }

    async fn children(&self, id: &NodeId) -> Result<Vec<Node>> {
        Self::read_json(&self.addressed(CHILDREN_DIR, id), id.as_str()).await
    }

    async fn diff_lines(&self, id: &NodeId) -> Result<Vec<String>> {
        let lines: Option<Vec<String>> =
            Self::read_json(&self.addressed(DIFF_DIR, id), id.as_str()).await?;
        lines.ok_or_else(|| AppError::NotFound(id.to_string()))
    }
}
