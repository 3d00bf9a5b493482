use std::collections::{HashMap, HashSet};
use std::sync::Mutex;

use async_trait::async_trait;

use crate::error::{AppError, Result};
use crate::source::ChangesetSource;
use crate::tree::node::{Node, NodeId};

/// In-memory source built from a fully nested tree. Counts children fetches
/// per identity and can be told to fail for chosen identities.
#[derive(Debug, Default)]
pub struct MemorySource {
    roots: Vec<Node>,
    children: HashMap<NodeId, Vec<Node>>,
    diffs: HashMap<NodeId, Vec<String>>,
    fetches: Mutex<HashMap<NodeId, usize>>,
    failing: Mutex<HashSet<NodeId>>,
}

fn shallow(node: &Node) -> Node {
    Node {
        children: None,
        ..node.clone()
    }
}

impl MemorySource {
    /// Listings are served one level at a time: every node that has
    /// `children` in `tree` becomes listable, with its children shallow.
    pub fn from_tree(tree: Vec<Node>) -> Self {
        let mut children = HashMap::new();
        fn index(node: &Node, map: &mut HashMap<NodeId, Vec<Node>>) {
            if let Some(kids) = &node.children {
                map.insert(node.id.clone(), kids.iter().map(shallow).collect());
                for kid in kids {
                    index(kid, map);
                }
            }
        }
        for root in &tree {
            index(root, &mut children);
        }
        Self {
            roots: tree.iter().map(shallow).collect(),
            children,
            ..Default::default()
        }
    }

    pub fn with_diff(mut self, id: &str, lines: &[&str]) -> Self {
        self.diffs.insert(
            NodeId::from(id),
            lines.iter().map(|l| l.to_string()).collect(),
        );
        self
    }

    pub fn initial_listing_now(&self) -> Vec<Node> {
        self.roots.clone()
    }

    pub fn fail(&self, id: &NodeId) {
        self.failing.lock().unwrap().insert(id.clone());
    }

    pub fn heal(&self, id: &NodeId) {
        self.failing.lock().unwrap().remove(id);
    }

    pub fn fetch_count(&self, id: &NodeId) -> usize {
        self.fetches.lock().unwrap().get(id).copied().unwrap_or(0)
    }
}

#[async_trait]
impl ChangesetSource for MemorySource {
    fn describe(&self) -> String {
        "memory".to_string()
    }

    async fn initial_listing(&self) -> Result<Vec<Node>> {
        Ok(self.initial_listing_now())
    }

    async fn children(&self, id: &NodeId) -> Result<Vec<Node>> {
        *self.fetches.lock().unwrap().entry(id.clone()).or_insert(0) += 1;
        if self.failing.lock().unwrap().contains(id) {
            return Err(AppError::Transport(format!("connection reset fetching {}", id)));
        }
        self.children
            .get(id)
            .cloned()
            .ok_or_else(|| AppError::NotFound(id.to_string()))
    }

    async fn diff_lines(&self, id: &NodeId) -> Result<Vec<String>> {
        self.diffs
            .get(id)
            .cloned()
            .ok_or_else(|| AppError::NotFound(id.to_string()))
    }
}
