use std::collections::HashMap;
use std::path::{Component, Path, PathBuf};

use async_trait::async_trait;
use tracing::{info, warn};

use crate::error::{AppError, Result};
use crate::source::ChangesetSource;
use crate::tree::node::{Node, NodeId};

/// Top-level listing inside the tree directory.
pub const TREE_FILE: &str = "tree.json";
/// Map of identity to children listing inside the tree directory.
pub const CHILDREN_FILE: &str = "children.json";
/// Name under which a directory's own diff is stored in the disk tree.
pub const DIR_META_FILENAME: &str = ".__this_directory__";

/// A results directory produced by a diff run.
///
/// ```text
/// <run>/tree/tree.json       top-level listing
/// <run>/tree/children.json   { key: [children...] }
/// <run>/disk/<path>          raw diff of a file, mirrored by path
/// <run>/memory/<pid>         raw diff of a process
/// ```
///
/// A bare directory holding `tree.json` and `children.json` works too, with
/// no diffs available.
#[derive(Debug)]
pub struct SnapshotDirSource {
    root: PathBuf,
    tree: Vec<Node>,
    children: HashMap<NodeId, Vec<Node>>,
    disk_dir: Option<PathBuf>,
    memory_dir: Option<PathBuf>,
}

impl SnapshotDirSource {
    /// Read both listing files up front.
    pub fn load(run: &Path) -> Result<Self> {
        let tree_dir = if run.join("tree").join(TREE_FILE).is_file() {
            run.join("tree")
        } else {
            run.to_path_buf()
        };

        let tree: Vec<Node> =
            serde_json::from_str(&std::fs::read_to_string(tree_dir.join(TREE_FILE))?)?;
        let children: HashMap<NodeId, Vec<Node>> =
            serde_json::from_str(&std::fs::read_to_string(tree_dir.join(CHILDREN_FILE))?)?;

        let existing = |name: &str| Some(run.join(name)).filter(|p| p.is_dir());
        let source = Self {
            root: run.to_path_buf(),
            tree,
            children,
            disk_dir: existing("disk"),
            memory_dir: existing("memory"),
        };
        info!(
            roots = source.tree.len(),
            listed_parents = source.children.len(),
            diffs = source.disk_dir.is_some(),
            "results directory loaded"
        );
        Ok(source)
    }

    /// Where the raw diff for `id` would be stored, if anywhere.
    fn diff_path(&self, id: &NodeId) -> Option<PathBuf> {
        let key = id.as_str();
        if !key.is_empty() && key.chars().all(|c| c.is_ascii_digit()) {
            return self.memory_dir.as_ref().map(|dir| dir.join(key));
        }

        let disk = self.disk_dir.as_ref()?;
        let posix = key.replace('\\', "/");
        let mut path = disk.clone();
        for component in Path::new(&posix).components() {
            if let Component::Normal(part) = component {
                path.push(part);
            }
        }
        let dir_meta = path.join(DIR_META_FILENAME);
        if dir_meta.is_file() {
            Some(dir_meta)
        } else {
            Some(path)
        }
    }
}

#[async_trait]
impl ChangesetSource for SnapshotDirSource {
    fn describe(&self) -> String {
        format!("results {}", self.root.display())
    }

    async fn initial_listing(&self) -> Result<Vec<Node>> {
        Ok(self.tree.clone())
    }

    async fn children(&self, id: &NodeId) -> Result<Vec<Node>> {
        self.children
            .get(id)
            .cloned()
            .ok_or_else(|| AppError::NotFound(id.to_string()))
    }

    async fn diff_lines(&self, id: &NodeId) -> Result<Vec<String>> {
        let Some(path) = self.diff_path(id) else {
            return Err(AppError::NotFound(id.to_string()));
        };
        match tokio::fs::read_to_string(&path).await {
            Ok(content) => Ok(content.split_inclusive('\n').map(str::to_string).collect()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                warn!(%id, path = %path.display(), "no diff stored");
                Err(AppError::NotFound(id.to_string()))
            }
            Err(e) => Err(e.into()),
        }
    }
}
