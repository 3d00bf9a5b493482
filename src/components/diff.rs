use ratatui::{
    buffer::Buffer,
    layout::Rect,
    style::Style,
    text::{Line, Span},
    widgets::{Block, Widget},
};

use crate::diff::DiffState;
use crate::theme::ThemeColors;

/// Diff widget that renders the selected node's diff.
pub struct DiffWidget<'a> {
    diff_state: &'a DiffState,
    theme: &'a ThemeColors,
    block: Option<Block<'a>>,
}

impl<'a> DiffWidget<'a> {
    pub fn new(diff_state: &'a DiffState, theme: &'a ThemeColors) -> Self {
        Self {
            diff_state,
            theme,
            block: None,
        }
    }

    pub fn block(mut self, block: Block<'a>) -> Self {
        self.block = block.into();
        self
    }

    fn placeholder(&self) -> Line<'a> {
        if let Some(err) = &self.diff_state.error {
            return Line::from(Span::styled(
                format!("No diff: {}", err),
                Style::default().fg(self.theme.error_fg),
            ));
        }
        let msg = if self.diff_state.pending.is_some() {
            "Loading diff…"
        } else if self.diff_state.shown.is_some() {
            "Empty diff"
        } else {
            "No diff selected"
        };
        Line::from(Span::styled(msg, Style::default().fg(self.theme.dim_fg)))
    }
}

impl<'a> Widget for DiffWidget<'a> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let inner = if let Some(block) = &self.block {
            let inner = block.inner(area);
            block.clone().render(area, buf);
            inner
        } else {
            area
        };

        if inner.width == 0 || inner.height == 0 {
            return;
        }

        let lines = &self.diff_state.content_lines;
        if lines.is_empty() {
            buf.set_line(inner.x, inner.y, &self.placeholder(), inner.width);
            return;
        }

        let visible_height = inner.height as usize;
        let start = self.diff_state.scroll_offset.min(lines.len());
        let end = (start + visible_height).min(lines.len());

        for (i, line) in lines[start..end].iter().enumerate() {
            let y = inner.y + i as u16;
            buf.set_line(inner.x, y, line, inner.width);
        }
    }
}
