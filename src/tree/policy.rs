//! Decides which loaded nodes are shown expanded without the user asking.
//!
//! Two rules run at two moments. At initial load, directories with a mix of
//! subdirectories and files are opened while they stay small. After an
//! incremental load, a newly revealed child is opened when it has nothing to
//! hide or when its (already listed) children are a short run of files that
//! is unlikely to push the view past a comfortable height.
//!
//! Both rules are local estimates. Neither walks the visible tree.

use tracing::debug;

use crate::tree::cache::NodeCache;
use crate::tree::node::NodeId;

/// Default bound (exclusive) on direct children for initial expansion.
pub const DEFAULT_INITIAL_MAX_DIRECT_CHILDREN: u64 = 10;
/// Default cap on the number of nodes expanded at initial load.
pub const DEFAULT_INITIAL_EXPAND_CEILING: usize = 1000;
/// Default bound (inclusive) on direct children for incremental expansion.
pub const DEFAULT_INCREMENTAL_MAX_DIRECT_CHILDREN: u64 = 10;
/// Default estimate of rows that fit comfortably in the view.
pub const DEFAULT_VISIBLE_ROW_CEILING: usize = 20;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExpansionLimits {
    pub initial_max_direct_children: u64,
    pub initial_expand_ceiling: usize,
    pub incremental_max_direct_children: u64,
    pub visible_row_ceiling: usize,
}

impl Default for ExpansionLimits {
    fn default() -> Self {
        Self {
            initial_max_direct_children: DEFAULT_INITIAL_MAX_DIRECT_CHILDREN,
            initial_expand_ceiling: DEFAULT_INITIAL_EXPAND_CEILING,
            incremental_max_direct_children: DEFAULT_INCREMENTAL_MAX_DIRECT_CHILDREN,
            visible_row_ceiling: DEFAULT_VISIBLE_ROW_CEILING,
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct ExpansionPolicy {
    limits: ExpansionLimits,
}

impl ExpansionPolicy {
    pub fn new(limits: ExpansionLimits) -> Self {
        Self { limits }
    }

    /// Nodes to expand right after the root listing, in cache order.
    ///
    /// Only nodes whose children arrived with the listing are candidates.
    pub fn initial_expansions(&self, cache: &NodeCache) -> Vec<NodeId> {
        let mut expanded = Vec::new();
        for (id, entry) in cache.iter() {
            let Some(children) = &entry.children else {
                continue;
            };
            if children.is_empty() {
                continue;
            }
            if expanded.len() >= self.limits.initial_expand_ceiling {
                debug!(
                    ceiling = self.limits.initial_expand_ceiling,
                    "initial expansion ceiling reached"
                );
                break;
            }

            let all_leaves = cache.children_all_leaves(id).unwrap_or(true);
            if !all_leaves
                && entry.meta.num_direct_children < self.limits.initial_max_direct_children
            {
                expanded.push(id.clone());
            }
        }
        expanded
    }

    /// Whether a freshly revealed non-leaf child should be opened.
    ///
    /// A child whose own children are not listed yet counts as having no
    /// non-leaf children and adds no rows; opening it then fetches them.
    pub fn should_auto_expand(&self, cache: &NodeCache, id: &NodeId) -> bool {
        let Some(entry) = cache.get(id) else {
            return false;
        };

        if entry.meta.num_children == 0 {
            return true;
        }
        if entry.meta.num_direct_children > self.limits.incremental_max_direct_children {
            return false;
        }

        if cache.children_all_leaves(id) == Some(false) {
            return false;
        }

        let listed = entry.children.as_ref().map_or(0, Vec::len);
        let estimated_rows = cache.len() + listed;
        if estimated_rows < self.limits.visible_row_ceiling {
            debug!(%id, estimated_rows, "auto-expanding");
            true
        } else {
            debug!(%id, estimated_rows, "not auto-expanding, view would overflow");
            false
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tree::node::Node;

    fn id(s: &str) -> NodeId {
        NodeId::from(s)
    }

    fn cache_of(nodes: &[Node]) -> NodeCache {
        let mut cache = NodeCache::new();
        cache.put_all(nodes).unwrap();
        cache
    }

    #[test]
    fn initial_expands_mixed_small_directory() {
        let cache = cache_of(&[Node::dir("/a", 3, 1).with_children(vec![
            Node::file("/a/x"),
            Node::dir("/a/d", 2, 2),
        ])]);
        let policy = ExpansionPolicy::default();
        assert_eq!(policy.initial_expansions(&cache), vec![id("/a")]);
    }

    #[test]
    fn initial_never_expands_leaf_uniform_directory() {
        let files: Vec<Node> = (0..3).map(|i| Node::file(&format!("/a/{}", i))).collect();
        let cache = cache_of(&[Node::dir("/a", 3, 3).with_children(files)]);
        assert!(ExpansionPolicy::default()
            .initial_expansions(&cache)
            .is_empty());
    }

    #[test]
    fn initial_skips_nodes_without_loaded_children() {
        let cache = cache_of(&[Node::dir("/a", 3, 1)]);
        assert!(ExpansionPolicy::default()
            .initial_expansions(&cache)
            .is_empty());
    }

    #[test]
    fn initial_direct_children_bound_is_exclusive() {
        let mut children: Vec<Node> = (0..9).map(|i| Node::file(&format!("/a/{}", i))).collect();
        children.push(Node::dir("/a/sub", 1, 1));
        let cache = cache_of(&[Node::dir("/a", 10, 10).with_children(children.clone())]);
        assert!(ExpansionPolicy::default()
            .initial_expansions(&cache)
            .is_empty());

        let cache = cache_of(&[Node::dir("/a", 10, 9).with_children(children)]);
        assert_eq!(
            ExpansionPolicy::default().initial_expansions(&cache),
            vec![id("/a")]
        );
    }

    #[test]
    fn initial_expansion_respects_global_ceiling() {
        // 2000 eligible directories, each with one subdirectory.
        let nodes: Vec<Node> = (0..2000)
            .map(|i| {
                Node::dir(&format!("/d{}", i), 1, 0)
                    .with_children(vec![Node::dir(&format!("/d{}/sub", i), 1, 1)])
            })
            .collect();
        let cache = cache_of(&nodes);
        let expanded = ExpansionPolicy::default().initial_expansions(&cache);
        assert_eq!(expanded.len(), 1000);
        assert_eq!(expanded[0], id("/d0"));
    }

    #[test]
    fn incremental_expands_trivial_child() {
        let cache = cache_of(&[Node::dir("/a", 0, 0)]);
        assert!(ExpansionPolicy::default().should_auto_expand(&cache, &id("/a")));
    }

    #[test]
    fn incremental_trivial_child_wins_over_row_ceiling() {
        let mut nodes: Vec<Node> = (0..50).map(|i| Node::file(&format!("/f{}", i))).collect();
        nodes.push(Node::dir("/empty", 0, 0));
        let cache = cache_of(&nodes);
        assert!(ExpansionPolicy::default().should_auto_expand(&cache, &id("/empty")));
    }

    #[test]
    fn incremental_rejects_wide_child_before_leaf_check() {
        let cache = cache_of(&[Node::dir("/a", 11, 11)]);
        assert!(!ExpansionPolicy::default().should_auto_expand(&cache, &id("/a")));
    }

    #[test]
    fn incremental_expands_unlisted_small_directory() {
        let cache = cache_of(&[Node::dir("/a", 2, 2)]);
        assert!(ExpansionPolicy::default().should_auto_expand(&cache, &id("/a")));
    }

    #[test]
    fn incremental_unlisted_directory_stops_at_row_ceiling() {
        let mut nodes: Vec<Node> = (0..19).map(|i| Node::file(&format!("/f{}", i))).collect();
        nodes.push(Node::dir("/a", 2, 2));
        // 20 cached + 0 listed children is not below the ceiling
        let cache = cache_of(&nodes);
        assert!(!ExpansionPolicy::default().should_auto_expand(&cache, &id("/a")));

        let cache = cache_of(&nodes[1..]);
        assert!(ExpansionPolicy::default().should_auto_expand(&cache, &id("/a")));
    }

    #[test]
    fn placeholder_children_count_as_unlisted() {
        let mut node: Node = serde_json::from_str(
            r#"{"key": "/a", "isDirectory": true, "isLeaf": false,
                "numChildren": 2, "numDirectChildren": 2, "children": []}"#,
        )
        .unwrap();
        node.normalize();
        let cache = cache_of(&[node]);
        assert!(ExpansionPolicy::default().should_auto_expand(&cache, &id("/a")));
    }

    #[test]
    fn incremental_expands_short_run_of_files() {
        let cache = cache_of(&[Node::dir("/a", 2, 2)
            .with_children(vec![Node::file("/a/1"), Node::file("/a/2")])]);
        // 3 cached + 2 children = 5 < 20
        assert!(ExpansionPolicy::default().should_auto_expand(&cache, &id("/a")));
    }

    #[test]
    fn incremental_rejects_mixed_children() {
        let cache = cache_of(&[Node::dir("/a", 3, 1)
            .with_children(vec![Node::file("/a/1"), Node::dir("/a/d", 2, 2)])]);
        assert!(!ExpansionPolicy::default().should_auto_expand(&cache, &id("/a")));
    }

    #[test]
    fn incremental_rejects_when_view_would_overflow() {
        let mut nodes: Vec<Node> = (0..15).map(|i| Node::file(&format!("/f{}", i))).collect();
        nodes.push(
            Node::dir("/a", 2, 2).with_children(vec![Node::file("/a/1"), Node::file("/a/2")]),
        );
        // 18 cached + 2 children = 20, not below the ceiling
        let cache = cache_of(&nodes);
        assert_eq!(cache.len(), 18);
        assert!(!ExpansionPolicy::default().should_auto_expand(&cache, &id("/a")));
    }

    #[test]
    fn incremental_unknown_node_is_not_expanded() {
        let cache = NodeCache::new();
        assert!(!ExpansionPolicy::default().should_auto_expand(&cache, &id("/ghost")));
    }

    #[test]
    fn custom_limits_apply() {
        let cache = cache_of(&[Node::dir("/a", 2, 2)
            .with_children(vec![Node::file("/a/1"), Node::file("/a/2")])]);
        let tight = ExpansionPolicy::new(ExpansionLimits {
            visible_row_ceiling: 5,
            ..Default::default()
        });
        assert!(!tight.should_auto_expand(&cache, &id("/a")));
    }
}
