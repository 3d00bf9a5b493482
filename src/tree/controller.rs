use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use tracing::{debug, info, warn};

use crate::error::{AppError, Result};
use crate::source::ChangesetSource;
use crate::tree::cache::NodeCache;
use crate::tree::merge::{self, Snapshot, TreeNode};
use crate::tree::node::{Node, NodeId};
use crate::tree::policy::ExpansionPolicy;

/// Load progress of one node's children.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum LoadState {
    #[default]
    Unloaded,
    Loading,
    Loaded,
    /// The last fetch failed; a new expansion request retries it.
    Failed(String),
}

/// What an expansion request led to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExpandOutcome {
    /// Children are already present; nothing to fetch.
    AlreadyLoaded,
    /// A fetch for this node is in flight; no second fetch is issued.
    AlreadyLoading,
    /// Leaves have no children to show.
    NotExpandable,
    /// The identity is not in the cache.
    Unknown,
    /// The caller must fetch this node's children and report back through
    /// `LoadController::complete_load`.
    Fetch,
}

/// Owns the node cache, the rendered snapshot and the expanded set of one
/// browsing session, and drives expansions through them.
#[derive(Debug, Default)]
pub struct LoadController {
    cache: NodeCache,
    snapshot: Snapshot,
    expanded: HashSet<NodeId>,
    states: HashMap<NodeId, LoadState>,
    in_flight: HashSet<NodeId>,
    policy: ExpansionPolicy,
}

impl LoadController {
    pub fn new(policy: ExpansionPolicy) -> Self {
        Self {
            policy,
            ..Default::default()
        }
    }

    pub fn cache(&self) -> &NodeCache {
        &self.cache
    }

    pub fn snapshot(&self) -> &Snapshot {
        &self.snapshot
    }

    pub fn policy(&self) -> &ExpansionPolicy {
        &self.policy
    }

    pub fn is_expanded(&self, id: &NodeId) -> bool {
        self.expanded.contains(id)
    }

    #[cfg(test)]
    pub fn expanded_count(&self) -> usize {
        self.expanded.len()
    }

    #[cfg(test)]
    pub fn is_in_flight(&self, id: &NodeId) -> bool {
        self.in_flight.contains(id)
    }

    pub fn in_flight_count(&self) -> usize {
        self.in_flight.len()
    }

    pub fn load_state(&self, id: &NodeId) -> LoadState {
        if let Some(state) = self.states.get(id) {
            return state.clone();
        }
        match self.cache.get(id) {
            Some(entry) if entry.is_loaded() => LoadState::Loaded,
            _ => LoadState::Unloaded,
        }
    }

    /// Install the root listing and apply the initial expansion rule.
    pub fn load_initial(&mut self, mut nodes: Vec<Node>) -> Result<()> {
        for node in nodes.iter_mut() {
            node.normalize();
        }
        self.cache.put_all(&nodes)?;
        self.cache.refresh_icons();
        self.snapshot = Snapshot::from_listing(&nodes)?;

        for (id, entry) in self.cache.iter() {
            if entry.is_loaded() {
                self.states.insert(id.clone(), LoadState::Loaded);
            }
        }

        let initial = self.policy.initial_expansions(&self.cache);
        info!(
            roots = nodes.len(),
            cached = self.cache.len(),
            auto_expanded = initial.len(),
            "initial listing loaded"
        );
        self.expanded.extend(initial);
        Ok(())
    }

    /// Mark `id` expanded and say whether its children must be fetched.
    pub fn request_expand(&mut self, id: &NodeId) -> ExpandOutcome {
        let Some(entry) = self.cache.get(id) else {
            warn!(%id, "expand requested for unknown node");
            return ExpandOutcome::Unknown;
        };
        if entry.meta.is_leaf {
            return ExpandOutcome::NotExpandable;
        }
        let loaded = entry.is_loaded();

        self.expanded.insert(id.clone());
        if loaded {
            return ExpandOutcome::AlreadyLoaded;
        }
        if self.in_flight.contains(id) {
            debug!(%id, "fetch already in flight");
            return ExpandOutcome::AlreadyLoading;
        }

        self.in_flight.insert(id.clone());
        self.states.insert(id.clone(), LoadState::Loading);
        debug!(%id, "loading children");
        ExpandOutcome::Fetch
    }

    /// Remove `id` from the expanded set. A fetch in flight still lands.
    pub fn collapse(&mut self, id: &NodeId) -> bool {
        self.expanded.remove(id)
    }

    /// Apply the result of a children fetch for `id`.
    ///
    /// Returns the auto-expanded children whose own children must now be
    /// fetched. On failure the node moves to `LoadState::Failed` and the
    /// error is returned.
    pub fn complete_load(
        &mut self,
        id: &NodeId,
        result: Result<Vec<Node>>,
    ) -> Result<Vec<NodeId>> {
        self.in_flight.remove(id);

        let applied = result.and_then(|children| self.apply_children(id, children));
        match applied {
            Ok(children) => {
                self.states.insert(id.clone(), LoadState::Loaded);
                Ok(self.auto_expand(&children))
            }
            Err(err) => {
                warn!(%id, error = %err, "loading children failed");
                self.states
                    .insert(id.clone(), LoadState::Failed(err.to_string()));
                Err(err)
            }
        }
    }

    /// Fetch `pending` and everything the policy opens beneath it, until no
    /// fetch is outstanding. Individual failures are recorded per node; a
    /// fatal error stops the run.
    pub async fn drive<S>(&mut self, source: &S, pending: Vec<NodeId>) -> Result<()>
    where
        S: ChangesetSource + ?Sized,
    {
        let mut queue = pending;
        while let Some(id) = queue.pop() {
            let result = source.children(&id).await;
            match self.complete_load(&id, result) {
                Ok(more) => queue.extend(more),
                Err(err) if err.is_fatal() => return Err(err),
                Err(_) => {}
            }
        }
        Ok(())
    }

    /// Expand `id` and fetch whatever that takes, including auto-expansions.
    pub async fn expand_with<S>(&mut self, source: &S, id: &NodeId) -> Result<ExpandOutcome>
    where
        S: ChangesetSource + ?Sized,
    {
        let outcome = self.request_expand(id);
        if outcome == ExpandOutcome::Fetch {
            self.drive(source, vec![id.clone()]).await?;
        }
        Ok(outcome)
    }

    fn apply_children(&mut self, id: &NodeId, mut children: Vec<Node>) -> Result<Vec<NodeId>> {
        if !self.cache.contains(id) {
            return Err(AppError::UnknownNode(id.to_string()));
        }
        for child in children.iter_mut() {
            child.normalize();
        }

        let subtrees = children
            .iter()
            .map(TreeNode::from_node)
            .collect::<Result<Vec<Arc<TreeNode>>>>()?;
        self.cache.put_all(&children)?;
        let ids: Vec<NodeId> = children.iter().map(|c| c.id.clone()).collect();
        self.cache.set_children(id, ids.clone())?;
        self.cache.refresh_icons();

        self.snapshot = merge::merge(&self.snapshot, id, &subtrees);
        for child in &children {
            if child.children.is_some() {
                self.states.insert(child.id.clone(), LoadState::Loaded);
            }
        }
        debug!(%id, children = ids.len(), cached = self.cache.len(), "children merged");
        Ok(ids)
    }

    fn auto_expand(&mut self, children: &[NodeId]) -> Vec<NodeId> {
        let mut to_fetch = Vec::new();
        for child in children {
            let is_leaf = self.cache.get(child).map_or(true, |c| c.meta.is_leaf);
            if is_leaf || !self.policy.should_auto_expand(&self.cache, child) {
                continue;
            }
            if self.request_expand(child) == ExpandOutcome::Fetch {
                to_fetch.push(child.clone());
            }
        }
        to_fetch
    }
}
