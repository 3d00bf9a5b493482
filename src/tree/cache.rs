use std::collections::HashMap;

use hashlink::LinkedHashMap;

use crate::error::{AppError, Result};
use crate::tree::node::{Node, NodeId, NodeMeta};

/// A cached node: validated metadata plus the identities of its loaded children.
#[derive(Debug, Clone, PartialEq)]
pub struct CachedNode {
    pub meta: NodeMeta,
    /// `None` until the children of this node have been listed.
    pub children: Option<Vec<NodeId>>,
    /// Empty-folder iconography, derived by `NodeCache::refresh_icons`.
    pub folder_icon: bool,
}

impl CachedNode {
    pub fn is_loaded(&self) -> bool {
        self.children.is_some()
    }
}

/// Flat index of every node seen this session, keyed by identity.
///
/// Entries are never evicted. Iteration follows first-insertion order.
#[derive(Debug, Default)]
pub struct NodeCache {
    entries: LinkedHashMap<NodeId, CachedNode>,
}

impl NodeCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn get(&self, id: &NodeId) -> Option<&CachedNode> {
        self.entries.get(id)
    }

    pub fn contains(&self, id: &NodeId) -> bool {
        self.entries.contains_key(id)
    }

    /// Entries in first-insertion order.
    pub fn iter(&self) -> impl Iterator<Item = (&NodeId, &CachedNode)> {
        self.entries.iter()
    }

    /// Insert `node` and every node already present beneath it.
    pub fn put(&mut self, node: &Node) -> Result<()> {
        self.put_all(std::slice::from_ref(node))
    }

    /// Insert a batch of listing records (and their nested children).
    ///
    /// The whole batch is validated first: a malformed record or an identity
    /// already bound to different metadata leaves the cache untouched.
    pub fn put_all(&mut self, nodes: &[Node]) -> Result<()> {
        let mut flat = Vec::new();
        for node in nodes {
            Self::flatten(node, &mut flat)?;
        }

        let mut seen: HashMap<&NodeId, &NodeMeta> = HashMap::new();
        for (meta, _) in &flat {
            if let Some(previous) = seen.insert(&meta.id, meta) {
                if previous != meta {
                    return Err(AppError::IdentityCollision(meta.id.to_string()));
                }
            }
            if let Some(existing) = self.entries.get(&meta.id) {
                if &existing.meta != meta {
                    return Err(AppError::IdentityCollision(meta.id.to_string()));
                }
            }
        }

        for (meta, children) in flat {
            match self.entries.get_mut(&meta.id) {
                Some(existing) => {
                    existing.meta = meta;
                    // A loaded child list is never dropped by a shallower record.
                    if children.is_some() {
                        existing.children = children;
                    }
                }
                None => {
                    let folder_icon = meta.is_directory && meta.is_leaf;
                    self.entries.insert(
                        meta.id.clone(),
                        CachedNode {
                            meta,
                            children,
                            folder_icon,
                        },
                    );
                }
            }
        }
        Ok(())
    }

    /// Record the loaded child list of `parent`.
    pub fn set_children(&mut self, parent: &NodeId, children: Vec<NodeId>) -> Result<()> {
        let entry = self
            .entries
            .get_mut(parent)
            .ok_or_else(|| AppError::UnknownNode(parent.to_string()))?;
        entry.children = Some(children);
        Ok(())
    }

    /// Re-derive the folder icon of every cached node from its own fields.
    pub fn refresh_icons(&mut self) {
        for entry in self.entries.values_mut() {
            entry.folder_icon = entry.meta.is_directory && entry.meta.is_leaf;
        }
    }

    /// Whether every loaded child of `id` is a leaf. `None` when `id` is
    /// unknown or its children are not loaded.
    pub fn children_all_leaves(&self, id: &NodeId) -> Option<bool> {
        let children = self.get(id)?.children.as_ref()?;
        Some(
            children
                .iter()
                .all(|child| self.get(child).is_some_and(|c| c.meta.is_leaf)),
        )
    }

    fn flatten(node: &Node, out: &mut Vec<(NodeMeta, Option<Vec<NodeId>>)>) -> Result<()> {
        let meta = node.meta()?;
        let child_ids = node
            .children
            .as_ref()
            .map(|children| children.iter().map(|c| c.id.clone()).collect());
        out.push((meta, child_ids));
        if let Some(children) = &node.children {
            for child in children {
                Self::flatten(child, out)?;
            }
        }
        Ok(())
    }
}
