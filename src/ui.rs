use ratatui::{
    layout::{Constraint, Direction, Layout},
    style::Style,
    text::{Line, Span},
    widgets::{Block, Borders},
    Frame,
};

use crate::app::App;
use crate::components::diff::DiffWidget;
use crate::components::status_bar::StatusBarWidget;
use crate::components::tree::TreeWidget;
use crate::tree::view::FlatItem;

/// One-line description of a row for the status bar.
fn node_info(item: &FlatItem) -> String {
    let mut info = item.status.label().to_string();
    if let Some((added, removed)) = item.line_stats {
        info.push_str(&format!(" +{} -{}", added, removed));
    }
    if let Some(count) = item.badge {
        info.push_str(&format!(" | {} below", count));
    }
    info
}

/// Render the application UI.
pub fn render(app: &mut App, frame: &mut Frame) {
    let [main_area, status_area] = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Min(1), Constraint::Length(1)])
        .areas(frame.area());
    let [tree_area, diff_area] = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(40), Constraint::Percentage(60)])
        .areas(main_area);

    // Update scroll offset to keep selected item visible
    let visible_height = tree_area.height.saturating_sub(2) as usize;
    app.view.update_scroll(visible_height);

    let tree_title = if app.initial_loading {
        format!(" {} (loading…) ", app.source_name())
    } else {
        format!(" {} ", app.source_name())
    };
    let tree_block = Block::default()
        .title(tree_title)
        .borders(Borders::ALL)
        .border_style(Style::default().fg(app.theme.border_focused_fg));
    frame.render_widget(
        TreeWidget::new(&app.view, &app.theme, app.use_icons).block(tree_block),
        tree_area,
    );

    let mut diff_title = vec![Span::raw(" Diff ")];
    if let (Some(id), Some(summary)) = (&app.diff.shown, &app.diff.summary) {
        diff_title = vec![
            Span::raw(format!(" {} ", id)),
            Span::styled(
                format!("{} ", summary.status.label()),
                Style::default().fg(app.theme.status_fg(summary.status)),
            ),
            Span::styled(
                format!("+{} ", summary.added),
                Style::default().fg(app.theme.added_fg),
            ),
            Span::styled(
                format!("-{} ", summary.removed),
                Style::default().fg(app.theme.removed_fg),
            ),
        ];
    }
    let diff_block = Block::default()
        .title(Line::from(diff_title))
        .borders(Borders::ALL)
        .border_style(Style::default().fg(app.theme.border_fg));
    frame.render_widget(DiffWidget::new(&app.diff, &app.theme).block(diff_block), diff_area);

    let (node_id, info) = match app.view.selected() {
        Some(item) => (item.id.to_string(), node_info(item)),
        None => (String::new(), String::new()),
    };
    let in_flight = app.controller.in_flight_count();
    let activity = format!("loading {}", in_flight);
    let mut status_bar = StatusBarWidget::new(&node_id, &info, &app.theme);
    if in_flight > 0 {
        status_bar = status_bar.activity(&activity);
    }
    if let Some((msg, is_error)) = &app.status_message {
        status_bar = status_bar.status_message(msg, *is_error);
    }
    frame.render_widget(status_bar, status_area);
}
