use std::sync::Arc;

use crate::tree::controller::{LoadController, LoadState};
use crate::tree::merge::TreeNode;
use crate::tree::node::{ChangeStatus, NodeId};

/// A flattened representation of a visible tree row.
#[derive(Debug, Clone, PartialEq)]
pub struct FlatItem {
    pub id: NodeId,
    pub label: String,
    pub depth: usize,
    pub is_directory: bool,
    pub is_leaf: bool,
    /// Directory with nothing beneath it.
    pub folder_icon: bool,
    pub status: ChangeStatus,
    pub line_stats: Option<(u64, u64)>,
    /// Descendant count, shown while the node is collapsed.
    pub badge: Option<u64>,
    pub is_expanded: bool,
    pub is_last_sibling: bool,
    pub load_state: LoadState,
}

/// Rows currently visible plus cursor and scroll position.
#[derive(Debug, Default)]
pub struct TreeView {
    pub flat_items: Vec<FlatItem>,
    pub selected_index: usize,
    pub scroll_offset: usize,
}

impl TreeView {
    pub fn new() -> Self {
        Self::default()
    }

    /// Re-derive the visible rows from the controller's snapshot and
    /// expanded set. The cursor stays on the same identity when it survives.
    pub fn rebuild(&mut self, ctl: &LoadController) {
        let selected = self.selected_id().cloned();

        self.flat_items.clear();
        let roots = ctl.snapshot().roots();
        for (i, root) in roots.iter().enumerate() {
            Self::flatten_node(ctl, root, 0, i == roots.len() - 1, &mut self.flat_items);
        }

        if let Some(index) = selected.and_then(|id| self.find_index(&id)) {
            self.selected_index = index;
        }
        // Clamp selected index
        if !self.flat_items.is_empty() && self.selected_index >= self.flat_items.len() {
            self.selected_index = self.flat_items.len() - 1;
        }
    }

    fn flatten_node(
        ctl: &LoadController,
        node: &Arc<TreeNode>,
        depth: usize,
        is_last: bool,
        items: &mut Vec<FlatItem>,
    ) {
        let id = node.id();
        let is_expanded = ctl.is_expanded(id);
        let folder_icon = ctl.cache().get(id).is_some_and(|c| c.folder_icon);
        let meta = &node.meta;

        items.push(FlatItem {
            id: id.clone(),
            label: meta.title.clone(),
            depth,
            is_directory: meta.is_directory,
            is_leaf: meta.is_leaf,
            folder_icon,
            status: meta.status,
            line_stats: meta.line_stats(),
            badge: (!is_expanded && meta.num_children > 0).then_some(meta.num_children),
            is_expanded,
            is_last_sibling: is_last,
            load_state: ctl.load_state(id),
        });

        if !is_expanded {
            return;
        }
        if let Some(children) = &node.children {
            for (i, child) in children.iter().enumerate() {
                Self::flatten_node(ctl, child, depth + 1, i == children.len() - 1, items);
            }
        }
    }

    pub fn selected(&self) -> Option<&FlatItem> {
        self.flat_items.get(self.selected_index)
    }

    pub fn selected_id(&self) -> Option<&NodeId> {
        self.selected().map(|item| &item.id)
    }

    pub fn find_index(&self, id: &NodeId) -> Option<usize> {
        self.flat_items.iter().position(|item| &item.id == id)
    }

    pub fn select_next(&mut self) {
        if self.selected_index + 1 < self.flat_items.len() {
            self.selected_index += 1;
        }
    }

    pub fn select_prev(&mut self) {
        self.selected_index = self.selected_index.saturating_sub(1);
    }

    pub fn select_first(&mut self) {
        self.selected_index = 0;
    }

    pub fn select_last(&mut self) {
        self.selected_index = self.flat_items.len().saturating_sub(1);
    }

    #[cfg(test)]
    pub fn select_id(&mut self, id: &NodeId) -> bool {
        match self.find_index(id) {
            Some(index) => {
                self.selected_index = index;
                true
            }
            None => false,
        }
    }

    /// Move the cursor to the row that owns the selected one.
    pub fn select_parent(&mut self) -> bool {
        let Some(item) = self.selected() else {
            return false;
        };
        let depth = item.depth;
        if depth == 0 {
            return false;
        }
        match (0..self.selected_index)
            .rev()
            .find(|&i| self.flat_items[i].depth < depth)
        {
            Some(index) => {
                self.selected_index = index;
                true
            }
            None => false,
        }
    }

    /// Update the scroll offset to ensure the selected item is visible.
    pub fn update_scroll(&mut self, visible_height: usize) {
        if visible_height == 0 {
            return;
        }
        if self.selected_index < self.scroll_offset {
            self.scroll_offset = self.selected_index;
        } else if self.selected_index >= self.scroll_offset + visible_height {
            self.scroll_offset = self.selected_index - visible_height + 1;
        }
    }
}
