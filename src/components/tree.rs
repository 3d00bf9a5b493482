use ratatui::{
    buffer::Buffer,
    layout::Rect,
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Widget},
};

use crate::theme::ThemeColors;
use crate::tree::controller::LoadState;
use crate::tree::view::{FlatItem, TreeView};

/// Tree widget that renders the changeset tree with box-drawing characters.
pub struct TreeWidget<'a> {
    view: &'a TreeView,
    theme: &'a ThemeColors,
    use_icons: bool,
    block: Option<Block<'a>>,
}

impl<'a> TreeWidget<'a> {
    pub fn new(view: &'a TreeView, theme: &'a ThemeColors, use_icons: bool) -> Self {
        Self {
            view,
            theme,
            use_icons,
            block: None,
        }
    }

    pub fn block(mut self, block: Block<'a>) -> Self {
        self.block = block.into();
        self
    }

    /// Build the prefix string for tree indentation using box-drawing characters.
    ///
    /// Continuation lines depend on whether each ancestor was a last sibling,
    /// found by walking back to the nearest row at that depth.
    fn build_prefix(item: &FlatItem, items: &[FlatItem], item_index: usize) -> String {
        if item.depth == 0 {
            return String::new();
        }

        let mut parts: Vec<&str> = Vec::new();
        for d in 1..item.depth {
            let mut ancestor_is_last = false;
            for j in (0..item_index).rev() {
                if items[j].depth == d {
                    ancestor_is_last = items[j].is_last_sibling;
                    break;
                }
                if items[j].depth < d {
                    break;
                }
            }
            parts.push(if ancestor_is_last { "   " } else { "│  " });
        }

        parts.push(if item.is_last_sibling { "└──" } else { "├──" });
        parts.join("")
    }

    fn item_indicator(&self, item: &FlatItem) -> &'static str {
        match (self.use_icons, item.is_leaf) {
            (true, false) if item.is_expanded => "\u{f07c} ",
            (true, false) => "\u{f07b} ",
            (true, true) if item.folder_icon => "\u{f114} ",
            (true, true) => "\u{f15b} ",
            (false, false) if item.is_expanded => "[-] ",
            (false, false) => "[+] ",
            (false, true) if item.folder_icon => "[D] ",
            (false, true) => "[F] ",
        }
    }

    /// Trailing decorations: line counts, child badge, load state.
    fn suffix_spans(&self, item: &FlatItem) -> Vec<Span<'static>> {
        let mut spans = Vec::new();
        if let Some((added, removed)) = item.line_stats {
            if added > 0 {
                spans.push(Span::styled(
                    format!(" +{}", added),
                    Style::default().fg(self.theme.added_fg),
                ));
            }
            if removed > 0 {
                spans.push(Span::styled(
                    format!(" -{}", removed),
                    Style::default().fg(self.theme.removed_fg),
                ));
            }
        }
        if let Some(count) = item.badge {
            spans.push(Span::styled(
                format!(" ({})", count),
                Style::default().fg(self.theme.dim_fg),
            ));
        }
        match &item.load_state {
            LoadState::Loading => spans.push(Span::styled(
                " loading…",
                Style::default()
                    .fg(self.theme.info_fg)
                    .add_modifier(Modifier::ITALIC),
            )),
            LoadState::Failed(_) => spans.push(Span::styled(
                " failed (r to retry)",
                Style::default().fg(self.theme.error_fg),
            )),
            LoadState::Unloaded | LoadState::Loaded => {}
        }
        spans
    }
}

impl<'a> Widget for TreeWidget<'a> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let inner_area = if let Some(block) = &self.block {
            let inner = block.inner(area);
            block.clone().render(area, buf);
            inner
        } else {
            area
        };

        let items = &self.view.flat_items;
        let selected = self.view.selected_index;
        let visible_height = inner_area.height as usize;

        if items.is_empty() || visible_height == 0 {
            return;
        }

        let scroll = self.view.scroll_offset;
        let visible_items = items.iter().enumerate().skip(scroll).take(visible_height);

        for (i, (idx, item)) in visible_items.enumerate() {
            let y = inner_area.y + i as u16;

            let prefix = Self::build_prefix(item, items, idx);
            let indicator = self.item_indicator(item);

            let selected_style = Style::default()
                .bg(self.theme.tree_selected_bg)
                .fg(self.theme.tree_selected_fg)
                .add_modifier(Modifier::BOLD);
            let indicator_style = if idx == selected {
                selected_style
            } else if item.is_directory {
                Style::default().fg(self.theme.tree_dir_fg)
            } else {
                Style::default().fg(self.theme.tree_fg)
            };
            let name_style = if idx == selected {
                selected_style
            } else if item.is_directory {
                Style::default()
                    .fg(self.theme.status_fg(item.status))
                    .add_modifier(Modifier::BOLD)
            } else {
                Style::default().fg(self.theme.status_fg(item.status))
            };

            let mut spans = vec![
                Span::styled(prefix, Style::default().fg(self.theme.dim_fg)),
                Span::styled(indicator, indicator_style),
                Span::styled(item.label.clone(), name_style),
            ];
            spans.extend(self.suffix_spans(item));

            buf.set_line(inner_area.x, y, &Line::from(spans), inner_area.width);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::theme;
    use crate::tree::controller::LoadController;
    use crate::tree::node::{ChangeStatus, Node, NodeId};
    use crate::tree::policy::ExpansionPolicy;

    fn row(buf: &Buffer, y: u16, width: u16) -> String {
        (0..width)
            .map(|x| buf.cell((x, y)).unwrap().symbol().to_string())
            .collect()
    }

    fn sample_view() -> (LoadController, TreeView) {
        let mut ctl = LoadController::new(ExpansionPolicy::default());
        let mut hosts = Node::file("/etc/hosts");
        hosts.lines_added = 3;
        hosts.lines_removed = 1;
        let mut ssh = Node::dir("/etc/ssh", 4, 2);
        ssh.status = ChangeStatus::Added;
        ctl.load_initial(vec![
            Node::dir("/etc", 6, 2).with_children(vec![hosts, ssh]),
            Node::file("/README"),
        ])
        .unwrap();
        let mut view = TreeView::new();
        view.rebuild(&ctl);
        (ctl, view)
    }

    #[test]
    fn renders_prefixes_and_labels() {
        let (_ctl, view) = sample_view();
        let tc = theme::dark_theme();
        let area = Rect::new(0, 0, 40, 4);
        let mut buf = Buffer::empty(area);
        TreeWidget::new(&view, &tc, false).render(area, &mut buf);

        assert!(row(&buf, 0, 40).starts_with("[-] etc"));
        assert!(row(&buf, 1, 40).starts_with("├──[F] hosts"));
        assert!(row(&buf, 2, 40).starts_with("└──[+] ssh"));
        assert!(row(&buf, 3, 40).starts_with("[F] README"));
    }

    #[test]
    fn shows_line_counts_and_badge() {
        let (_ctl, view) = sample_view();
        let tc = theme::dark_theme();
        let area = Rect::new(0, 0, 40, 4);
        let mut buf = Buffer::empty(area);
        TreeWidget::new(&view, &tc, false).render(area, &mut buf);

        assert!(row(&buf, 1, 40).contains("hosts +3 -1"));
        assert!(row(&buf, 2, 40).contains("ssh (4)"));
        // Expanded rows carry no badge.
        assert!(!row(&buf, 0, 40).contains("(6)"));
    }

    #[test]
    fn status_colors_unselected_rows() {
        let (_ctl, view) = sample_view();
        let tc = theme::dark_theme();
        let area = Rect::new(0, 0, 40, 4);
        let mut buf = Buffer::empty(area);
        TreeWidget::new(&view, &tc, false).render(area, &mut buf);

        // "└──" and "[+] " take 7 cells; the label starts right after.
        assert_eq!(buf.cell((3, 2)).unwrap().fg, tc.tree_dir_fg);
        assert_eq!(buf.cell((7, 2)).unwrap().fg, tc.added_fg);
        assert_eq!(buf.cell((0, 0)).unwrap().bg, tc.tree_selected_bg);
    }

    #[test]
    fn loading_and_failed_rows_are_marked() {
        let (mut ctl, mut view) = sample_view();
        let ssh = NodeId::from("/etc/ssh");
        ctl.request_expand(&ssh);
        view.rebuild(&ctl);
        let tc = theme::dark_theme();
        let area = Rect::new(0, 0, 50, 4);
        let mut buf = Buffer::empty(area);
        TreeWidget::new(&view, &tc, false).render(area, &mut buf);
        assert!(row(&buf, 2, 50).contains("loading"));

        let _ = ctl.complete_load(&ssh, Err(crate::error::AppError::Transport("x".into())));
        view.rebuild(&ctl);
        let mut buf = Buffer::empty(area);
        TreeWidget::new(&view, &tc, false).render(area, &mut buf);
        assert!(row(&buf, 2, 50).contains("failed"));
    }

    #[test]
    fn zero_area_does_not_panic() {
        let (_ctl, view) = sample_view();
        let tc = theme::dark_theme();
        let area = Rect::new(0, 0, 0, 0);
        let mut buf = Buffer::empty(area);
        TreeWidget::new(&view, &tc, true).render(area, &mut buf);
    }
}
