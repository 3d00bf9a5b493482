use ratatui::{
    buffer::Buffer,
    layout::Rect,
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::Widget,
};

use crate::theme::ThemeColors;

const KEY_HINTS: &str = " l/h:open/close  d:diff  r:retry  q:quit ";

/// Status bar widget: selected identity, node info and key hints, or a
/// status message that takes over the whole bar.
pub struct StatusBarWidget<'a> {
    node_id: &'a str,
    node_info: &'a str,
    theme: &'a ThemeColors,
    status_message: Option<&'a str>,
    is_error: bool,
    activity: Option<&'a str>,
}

impl<'a> StatusBarWidget<'a> {
    pub fn new(node_id: &'a str, node_info: &'a str, theme: &'a ThemeColors) -> Self {
        Self {
            node_id,
            node_info,
            theme,
            status_message: None,
            is_error: false,
            activity: None,
        }
    }

    pub fn status_message(mut self, msg: &'a str, is_error: bool) -> Self {
        self.status_message = Some(msg);
        self.is_error = is_error;
        self
    }

    /// Outstanding fetches, shown next to the node info.
    pub fn activity(mut self, activity: &'a str) -> Self {
        self.activity = Some(activity);
        self
    }
}

/// Keep the last `budget` characters, marking the cut with "...".
fn truncate_left(s: &str, budget: usize) -> String {
    let len = s.chars().count();
    if len <= budget {
        return s.to_string();
    }
    if budget <= 3 {
        return s.chars().take(budget).collect();
    }
    let tail: String = s.chars().skip(len - (budget - 3)).collect();
    format!("...{}", tail)
}

impl<'a> Widget for StatusBarWidget<'a> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        if area.height == 0 || area.width == 0 {
            return;
        }

        let width = area.width as usize;

        if let Some(msg) = self.status_message {
            let style = if self.is_error {
                Style::default()
                    .bg(self.theme.error_fg)
                    .fg(self.theme.status_bg)
            } else {
                Style::default().fg(self.theme.info_fg)
            };
            let display: String = msg.chars().take(width).collect();
            let display = format!("{:<width$}", display, width = width);
            buf.set_line(area.x, area.y, &Line::from(Span::styled(display, style)), area.width);
            return;
        }

        // Normal bar: [identity] [info] [activity] [key_hints]
        let hints_len = KEY_HINTS.len();
        let remaining = width.saturating_sub(hints_len);
        let activity = self.activity.unwrap_or("");
        let extra = if activity.is_empty() {
            0
        } else {
            activity.chars().count() + 1
        };

        let info_len = self.node_info.chars().count();
        let id_budget = remaining
            .saturating_sub(info_len)
            .saturating_sub(extra)
            .saturating_sub(1);
        let id_display = truncate_left(self.node_id, id_budget);
        let id_len = id_display.chars().count();

        let gap = remaining
            .saturating_sub(id_len)
            .saturating_sub(info_len)
            .saturating_sub(extra);

        let mut spans = vec![
            Span::styled(id_display, Style::default().fg(self.theme.status_fg)),
            Span::raw(" ".repeat(gap)),
            Span::styled(
                self.node_info.to_string(),
                Style::default().fg(self.theme.info_fg),
            ),
        ];
        if !activity.is_empty() {
            spans.push(Span::raw(" "));
            spans.push(Span::styled(
                activity.to_string(),
                Style::default()
                    .fg(self.theme.modified_fg)
                    .add_modifier(Modifier::BOLD),
            ));
        }

        let used: usize = spans.iter().map(|s| s.content.chars().count()).sum();
        let pad = width.saturating_sub(used).saturating_sub(hints_len);
        if pad > 0 {
            spans.push(Span::raw(" ".repeat(pad)));
        }
        spans.push(Span::styled(
            KEY_HINTS,
            Style::default()
                .fg(self.theme.dim_fg)
                .add_modifier(Modifier::DIM),
        ));

        buf.set_line(area.x, area.y, &Line::from(spans), area.width);
    }
}
