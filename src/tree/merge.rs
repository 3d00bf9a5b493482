//! Persistent tree snapshot and the splice that attaches freshly loaded
//! children to it.
//!
//! Snapshot nodes are immutable and shared through `Arc`. Attaching children
//! rebuilds only the path from a root down to the target node; every other
//! subtree is carried over by pointer, so change detection can compare with
//! `Arc::ptr_eq`.

use std::sync::Arc;

use crate::error::Result;
use crate::tree::node::{Node, NodeId, NodeMeta};

/// One node of the rendered tree.
#[derive(Debug, Clone, PartialEq)]
pub struct TreeNode {
    pub meta: NodeMeta,
    /// `None` while the subtree has not been fetched.
    pub children: Option<Vec<Arc<TreeNode>>>,
}

impl TreeNode {
    /// Build a snapshot subtree from a listing record.
    pub fn from_node(node: &Node) -> Result<Arc<TreeNode>> {
        let children = match &node.children {
            Some(children) => Some(
                children
                    .iter()
                    .map(TreeNode::from_node)
                    .collect::<Result<Vec<_>>>()?,
            ),
            None => None,
        };
        Ok(Arc::new(TreeNode {
            meta: node.meta()?,
            children,
        }))
    }

    pub fn id(&self) -> &NodeId {
        &self.meta.id
    }
}

/// The full nested tree handed to the rendering surface.
#[derive(Debug, Clone, Default)]
pub struct Snapshot {
    roots: Vec<Arc<TreeNode>>,
}

impl Snapshot {
    pub fn from_listing(nodes: &[Node]) -> Result<Self> {
        let roots = nodes
            .iter()
            .map(TreeNode::from_node)
            .collect::<Result<Vec<_>>>()?;
        Ok(Self { roots })
    }

    pub fn roots(&self) -> &[Arc<TreeNode>] {
        &self.roots
    }

    pub fn is_empty(&self) -> bool {
        self.roots.is_empty()
    }

    /// Depth-first search for a node by identity.
    #[cfg(test)]
    pub fn find(&self, id: &NodeId) -> Option<&Arc<TreeNode>> {
        fn walk<'a>(nodes: &'a [Arc<TreeNode>], id: &NodeId) -> Option<&'a Arc<TreeNode>> {
            for node in nodes {
                if node.id() == id {
                    return Some(node);
                }
                if let Some(found) = node.children.as_deref().and_then(|c| walk(c, id)) {
                    return Some(found);
                }
            }
            None
        }
        walk(&self.roots, id)
    }

    /// Identities from a root down to `id`, inclusive. `None` if absent.
    #[cfg(test)]
    pub fn path_to(&self, id: &NodeId) -> Option<Vec<NodeId>> {
        fn walk(nodes: &[Arc<TreeNode>], id: &NodeId, path: &mut Vec<NodeId>) -> bool {
            for node in nodes {
                path.push(node.id().clone());
                if node.id() == id {
                    return true;
                }
                if let Some(children) = &node.children {
                    if walk(children, id, path) {
                        return true;
                    }
                }
                path.pop();
            }
            false
        }
        let mut path = Vec::new();
        walk(&self.roots, id, &mut path).then_some(path)
    }

    /// Number of nodes present in the snapshot.
    pub fn node_count(&self) -> usize {
        fn count(nodes: &[Arc<TreeNode>]) -> usize {
            nodes
                .iter()
                .map(|n| 1 + n.children.as_deref().map_or(0, count))
                .sum()
        }
        count(&self.roots)
    }
}

/// Attach `children` at `target`, returning a new snapshot.
///
/// The target's previous children, if any, are replaced outright. If
/// `target` is not in the snapshot the result shares every root with the
/// input.
pub fn merge(snapshot: &Snapshot, target: &NodeId, children: &[Arc<TreeNode>]) -> Snapshot {
    let roots = splice_all(&snapshot.roots, target, children)
        .unwrap_or_else(|| snapshot.roots.clone());
    Snapshot { roots }
}

/// Rebuilt list if any node in `nodes` (or beneath) is `target`, else `None`.
fn splice_all(
    nodes: &[Arc<TreeNode>],
    target: &NodeId,
    children: &[Arc<TreeNode>],
) -> Option<Vec<Arc<TreeNode>>> {
    let mut rebuilt: Option<Vec<Arc<TreeNode>>> = None;
    for (i, node) in nodes.iter().enumerate() {
        if let Some(replacement) = splice(node, target, children) {
            let list = rebuilt.get_or_insert_with(|| nodes.to_vec());
            list[i] = replacement;
        }
    }
    rebuilt
}

fn splice(
    node: &Arc<TreeNode>,
    target: &NodeId,
    children: &[Arc<TreeNode>],
) -> Option<Arc<TreeNode>> {
    if node.id() == target {
        return Some(Arc::new(TreeNode {
            meta: node.meta.clone(),
            children: Some(children.to_vec()),
        }));
    }
    let current = node.children.as_deref()?;
    let rebuilt = splice_all(current, target, children)?;
    Some(Arc::new(TreeNode {
        meta: node.meta.clone(),
        children: Some(rebuilt),
    }))
}
