//! Headless mode: load a changeset, open its top-level directories, let
//! auto-expansion run to completion and write the visible tree as text.

use tracing::info;

use crate::error::Result;
use crate::source::ChangesetSource;
use crate::tree::controller::{LoadController, LoadState};
use crate::tree::node::NodeId;
use crate::tree::policy::ExpansionPolicy;
use crate::tree::view::{FlatItem, TreeView};

/// Load everything the expansion policy opens and return the visible rows.
pub async fn expanded_rows(
    source: &dyn ChangesetSource,
    policy: ExpansionPolicy,
) -> Result<Vec<String>> {
    let mut ctl = LoadController::new(policy);
    ctl.load_initial(source.initial_listing().await?)?;

    let roots: Vec<NodeId> = ctl
        .snapshot()
        .roots()
        .iter()
        .filter(|root| !root.meta.is_leaf)
        .map(|root| root.id().clone())
        .collect();
    for id in &roots {
        ctl.expand_with(source, id).await?;
    }

    let mut view = TreeView::new();
    view.rebuild(&ctl);
    info!(
        rows = view.flat_items.len(),
        nodes = ctl.snapshot().node_count(),
        "tree printed"
    );
    Ok(view.flat_items.iter().map(format_row).collect())
}

fn format_row(item: &FlatItem) -> String {
    let marker = match (item.is_leaf, item.is_expanded) {
        (true, _) => ' ',
        (false, true) => '-',
        (false, false) => '+',
    };
    let mut row = format!(
        "{}{} {} [{}]",
        "  ".repeat(item.depth),
        marker,
        item.label,
        item.status.label()
    );
    if let Some((added, removed)) = item.line_stats {
        if added > 0 {
            row.push_str(&format!(" +{}", added));
        }
        if removed > 0 {
            row.push_str(&format!(" -{}", removed));
        }
    }
    if let Some(count) = item.badge {
        row.push_str(&format!(" ({})", count));
    }
    if let LoadState::Failed(reason) = &item.load_state {
        row.push_str(&format!(" failed: {}", reason));
    }
    row
}
