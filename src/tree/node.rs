use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::{AppError, Result};

/// Stable identity of a node, unique across the whole changeset tree.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NodeId(String);

impl NodeId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for NodeId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

/// How a path changed between the two sides of the changeset.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChangeStatus {
    Added,
    Removed,
    Modified,
    #[default]
    Unchanged,
}

impl ChangeStatus {
    pub fn label(&self) -> &'static str {
        match self {
            ChangeStatus::Added => "added",
            ChangeStatus::Removed => "removed",
            ChangeStatus::Modified => "modified",
            ChangeStatus::Unchanged => "unchanged",
        }
    }
}

/// A node record as delivered by a listing.
///
/// `children` is `None` until the subtree has been fetched; that absence is
/// what marks a subtree as unloaded, as opposed to `Some(vec![])`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Node {
    #[serde(rename = "key")]
    pub id: NodeId,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub is_directory: bool,
    #[serde(default)]
    pub is_leaf: bool,
    #[serde(default)]
    pub status: ChangeStatus,
    #[serde(default)]
    pub lines_added: u64,
    #[serde(default)]
    pub lines_removed: u64,
    #[serde(default)]
    pub num_children: Option<u64>,
    #[serde(default)]
    pub num_direct_children: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub children: Option<Vec<Node>>,
}

impl Node {
    /// Leaf record with no counts, for building listings in code.
    #[cfg(test)]
    pub fn file(id: &str) -> Self {
        Self {
            id: NodeId::from(id),
            title: Some(id.rsplit('/').next().unwrap_or(id).to_string()),
            is_directory: false,
            is_leaf: true,
            status: ChangeStatus::Modified,
            lines_added: 0,
            lines_removed: 0,
            num_children: Some(0),
            num_direct_children: Some(0),
            children: None,
        }
    }

    /// Unloaded directory record with the given counts.
    #[cfg(test)]
    pub fn dir(id: &str, num_children: u64, num_direct_children: u64) -> Self {
        Self {
            id: NodeId::from(id),
            title: Some(id.rsplit('/').next().unwrap_or(id).to_string()),
            is_directory: true,
            is_leaf: false,
            status: ChangeStatus::Modified,
            lines_added: 0,
            lines_removed: 0,
            num_children: Some(num_children),
            num_direct_children: Some(num_direct_children),
            children: None,
        }
    }

    #[cfg(test)]
    pub fn with_children(mut self, children: Vec<Node>) -> Self {
        self.children = Some(children);
        self
    }

    /// Listings emit `"children": []` on directories that were not expanded
    /// server-side. On a non-leaf node that means "not fetched yet".
    pub fn normalize(&mut self) {
        if !self.is_leaf && self.children.as_ref().is_some_and(|c| c.is_empty()) {
            self.children = None;
        }
        if let Some(children) = &mut self.children {
            for child in children.iter_mut() {
                child.normalize();
            }
        }
    }

    /// Validated metadata for this record (children excluded).
    pub fn meta(&self) -> Result<NodeMeta> {
        let count = |value: Option<u64>, field: &str| -> Result<u64> {
            match value {
                Some(v) => Ok(v),
                None if self.is_leaf => Ok(0),
                None => Err(AppError::MalformedNode {
                    id: self.id.to_string(),
                    reason: format!("missing {}", field),
                }),
            }
        };

        Ok(NodeMeta {
            id: self.id.clone(),
            title: self
                .title
                .clone()
                .unwrap_or_else(|| self.id.to_string()),
            is_directory: self.is_directory,
            is_leaf: self.is_leaf,
            status: self.status,
            lines_added: self.lines_added,
            lines_removed: self.lines_removed,
            num_children: count(self.num_children, "numChildren")?,
            num_direct_children: count(self.num_direct_children, "numDirectChildren")?,
        })
    }
}

/// Node metadata after validation; what the cache and the snapshot store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NodeMeta {
    pub id: NodeId,
    pub title: String,
    pub is_directory: bool,
    pub is_leaf: bool,
    pub status: ChangeStatus,
    pub lines_added: u64,
    pub lines_removed: u64,
    /// Total descendants beneath this node.
    pub num_children: u64,
    /// Immediate children.
    pub num_direct_children: u64,
}

impl NodeMeta {
    /// Line counts worth showing: only on non-directories with a change.
    pub fn line_stats(&self) -> Option<(u64, u64)> {
        if self.is_directory || (self.lines_added == 0 && self.lines_removed == 0) {
            None
        } else {
            Some((self.lines_added, self.lines_removed))
        }
    }
}
