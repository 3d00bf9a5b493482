//! Diff panel state: which node's diff is shown, and turning raw diff lines
//! into styled terminal lines.

use ratatui::style::{Color, Style};
use ratatui::text::{Line, Span};
use syntect::easy::HighlightLines;
use syntect::highlighting::{Theme, ThemeSet};
use syntect::parsing::SyntaxSet;
use syntect::util::LinesWithEndings;
use tracing::debug;

use crate::error::Result;
use crate::theme::ThemeColors;
use crate::tree::node::{ChangeStatus, NodeId};

/// Turns diff text into display lines.
pub trait DiffRenderer: Send {
    fn render(&self, text: &str) -> Vec<Line<'static>>;
}

/// Load a theme from the built-in theme set by name, with fallback.
pub fn load_theme(theme_name: Option<&str>) -> Theme {
    let ts = ThemeSet::load_defaults();
    let name = theme_name.unwrap_or("base16-ocean.dark");
    ts.themes
        .get(name)
        .or_else(|| ts.themes.get("base16-ocean.dark"))
        .cloned()
        .unwrap_or_default()
}

fn syntect_color_to_ratatui(c: syntect::highlighting::Color) -> Color {
    Color::Rgb(c.r, c.g, c.b)
}

/// Highlights unified diffs with syntect's bundled `Diff` grammar.
pub struct SyntectDiffRenderer {
    syntax_set: SyntaxSet,
    theme: Theme,
    gutter_fg: Color,
    plain_fg: Color,
}

impl SyntectDiffRenderer {
    /// `colors` supplies the gutter colour and the colour of lines the
    /// highlighter rejects.
    pub fn new(theme_name: &str, colors: &ThemeColors) -> Self {
        Self {
            syntax_set: SyntaxSet::load_defaults_newlines(),
            theme: load_theme(Some(theme_name)),
            gutter_fg: colors.diff_line_nr_fg,
            plain_fg: colors.diff_fg,
        }
    }
}

impl DiffRenderer for SyntectDiffRenderer {
    fn render(&self, text: &str) -> Vec<Line<'static>> {
        let ss = &self.syntax_set;
        let syntax = ss
            .find_syntax_by_name("Diff")
            .or_else(|| ss.find_syntax_by_extension("diff"))
            .unwrap_or_else(|| ss.find_syntax_plain_text());
        let mut highlighter = HighlightLines::new(syntax, &self.theme);

        let total = text.lines().count().max(1);
        let line_num_width = total.to_string().len();
        let mut result = Vec::with_capacity(total);

        for (i, line) in LinesWithEndings::from(text).enumerate() {
            let mut spans: Vec<Span<'static>> = Vec::new();
            let num = format!("{:>width$} │ ", i + 1, width = line_num_width);
            spans.push(Span::styled(num, Style::default().fg(self.gutter_fg)));

            match highlighter.highlight_line(line, ss) {
                Ok(ranges) => {
                    for (style, piece) in ranges {
                        let piece = piece.trim_end_matches(['\n', '\r']);
                        if piece.is_empty() {
                            continue;
                        }
                        let fg = syntect_color_to_ratatui(style.foreground);
                        spans.push(Span::styled(piece.to_string(), Style::default().fg(fg)));
                    }
                }
                Err(_) => {
                    spans.push(Span::styled(
                        line.trim_end_matches(['\n', '\r']).to_string(),
                        Style::default().fg(self.plain_fg),
                    ));
                }
            }
            result.push(Line::from(spans));
        }
        result
    }
}

/// Status and line counts read back from a unified diff.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DiffSummary {
    pub status: ChangeStatus,
    pub added: usize,
    pub removed: usize,
}

impl DiffSummary {
    /// The second header line tells how the file changed (`new file mode`,
    /// `deleted file mode`, anything else is a modification).
    pub fn from_lines(lines: &[String]) -> Self {
        let status = match lines.get(1) {
            Some(l) if l.starts_with("new") => ChangeStatus::Added,
            Some(l) if l.starts_with("deleted") => ChangeStatus::Removed,
            _ => ChangeStatus::Modified,
        };
        let added = lines
            .iter()
            .filter(|l| l.starts_with('+') && !l.starts_with("++"))
            .count();
        let removed = lines
            .iter()
            .filter(|l| l.starts_with('-') && !l.starts_with("--"))
            .count();
        Self {
            status,
            added,
            removed,
        }
    }
}

/// State of the diff panel.
///
/// Only the most recent request is honored: a response for any other node
/// is dropped when it arrives.
#[derive(Default)]
pub struct DiffState {
    /// Node whose diff is on screen.
    pub shown: Option<NodeId>,
    /// Node whose diff was last requested and has not arrived yet.
    pub pending: Option<NodeId>,
    pub content_lines: Vec<Line<'static>>,
    pub summary: Option<DiffSummary>,
    pub error: Option<String>,
    pub scroll_offset: usize,
}

impl DiffState {
    /// Record a request for `id`'s diff. Returns `false` when that diff is
    /// already on screen or on its way.
    pub fn request(&mut self, id: &NodeId) -> bool {
        if self.pending.as_ref() == Some(id) {
            return false;
        }
        if self.pending.is_none() && self.shown.as_ref() == Some(id) && self.error.is_none() {
            return false;
        }
        self.pending = Some(id.clone());
        true
    }

    /// Install a diff response. Returns `false` for a stale response.
    pub fn complete(
        &mut self,
        id: &NodeId,
        result: Result<Vec<String>>,
        renderer: &dyn DiffRenderer,
    ) -> bool {
        if self.pending.as_ref() != Some(id) {
            debug!(%id, "dropping stale diff");
            return false;
        }
        self.pending = None;
        self.shown = Some(id.clone());
        self.scroll_offset = 0;

        match result {
            Ok(lines) => {
                let text = lines.concat();
                self.summary = Some(DiffSummary::from_lines(&lines));
                self.content_lines = renderer.render(&text);
                self.error = None;
            }
            Err(err) => {
                self.summary = None;
                self.content_lines.clear();
                self.error = Some(err.to_string());
            }
        }
        true
    }

    pub fn scroll_down(&mut self, amount: usize) {
        let max = self.content_lines.len().saturating_sub(1);
        self.scroll_offset = (self.scroll_offset + amount).min(max);
    }

    pub fn scroll_up(&mut self, amount: usize) {
        self.scroll_offset = self.scroll_offset.saturating_sub(amount);
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::error::AppError;

    /// One unstyled line per input line.
    pub(crate) struct PlainRenderer;

    impl DiffRenderer for PlainRenderer {
        fn render(&self, text: &str) -> Vec<Line<'static>> {
            text.lines().map(|l| Line::from(l.to_string())).collect()
        }
    }

    fn lines(raw: &[&str]) -> Vec<String> {
        raw.iter().map(|l| l.to_string()).collect()
    }

    fn id(s: &str) -> NodeId {
        NodeId::from(s)
    }

    #[test]
    fn summary_of_new_file() {
        let summary = DiffSummary::from_lines(&lines(&[
            "diff --git a/x b/x\n",
            "new file mode 100644\n",
            "--- /dev/null\n",
            "+++ b/x\n",
            "+one\n",
            "+two\n",
        ]));
        assert_eq!(summary.status, ChangeStatus::Added);
        assert_eq!(summary.added, 2);
        assert_eq!(summary.removed, 0);
    }

    #[test]
    fn summary_of_deleted_file() {
        let summary = DiffSummary::from_lines(&lines(&[
            "diff --git a/x b/x\n",
            "deleted file mode 100644\n",
            "--- a/x\n",
            "+++ /dev/null\n",
            "-gone\n",
        ]));
        assert_eq!(summary.status, ChangeStatus::Removed);
        assert_eq!(summary.removed, 1);
    }

    #[test]
    fn summary_of_modification_ignores_headers() {
        let summary = DiffSummary::from_lines(&lines(&[
            "diff --git a/x b/x\n",
            "index 1..2 100644\n",
            "--- a/x\n",
            "+++ b/x\n",
            "@@ -1 +1 @@\n",
            "-old\n",
            "+new\n",
            " same\n",
        ]));
        assert_eq!(summary.status, ChangeStatus::Modified);
        assert_eq!((summary.added, summary.removed), (1, 1));
    }

    #[test]
    fn summary_of_empty_diff() {
        let summary = DiffSummary::from_lines(&[]);
        assert_eq!(summary.status, ChangeStatus::Modified);
        assert_eq!((summary.added, summary.removed), (0, 0));
    }

    #[test]
    fn latest_request_wins() {
        let mut state = DiffState::default();
        assert!(state.request(&id("/a")));
        assert!(state.request(&id("/b")));
        assert!(!state.complete(&id("/a"), Ok(lines(&["+x\n"])), &PlainRenderer));
        assert!(state.shown.is_none());
        assert!(state.complete(&id("/b"), Ok(lines(&["+y\n"])), &PlainRenderer));
        assert_eq!(state.shown, Some(id("/b")));
        assert!(state.pending.is_none());
    }

    #[test]
    fn lines_are_concatenated_verbatim() {
        let mut state = DiffState::default();
        state.request(&id("/a"));
        state.complete(
            &id("/a"),
            Ok(lines(&["--- a\n", "+++ b\n", "+partial", " line\n"])),
            &PlainRenderer,
        );
        assert_eq!(state.content_lines.len(), 3);
        assert_eq!(state.content_lines[2], Line::from("+partial line"));
    }

    #[test]
    fn repeated_request_for_shown_diff_is_skipped() {
        let mut state = DiffState::default();
        state.request(&id("/a"));
        state.complete(&id("/a"), Ok(lines(&["+x\n"])), &PlainRenderer);
        assert!(!state.request(&id("/a")));
        assert!(state.request(&id("/b")));
        assert!(!state.request(&id("/b")));
    }

    #[test]
    fn failed_diff_records_error_and_allows_retry() {
        let mut state = DiffState::default();
        state.request(&id("/a"));
        state.complete(&id("/a"), Err(AppError::NotFound("/a".into())), &PlainRenderer);
        assert!(state.error.as_deref().unwrap().contains("/a"));
        assert!(state.content_lines.is_empty());
        assert!(state.request(&id("/a")));
    }

    #[test]
    fn scroll_is_clamped() {
        let mut state = DiffState::default();
        state.request(&id("/a"));
        state.complete(&id("/a"), Ok(lines(&["1\n", "2\n", "3\n"])), &PlainRenderer);
        state.scroll_down(10);
        assert_eq!(state.scroll_offset, 2);
        state.scroll_up(5);
        assert_eq!(state.scroll_offset, 0);
    }

    #[test]
    fn syntect_renderer_numbers_every_line() {
        let renderer = SyntectDiffRenderer::new("base16-ocean.dark", &crate::theme::dark_theme());
        let rendered = renderer.render("--- a/x\n+++ b/x\n-old\n+new\n");
        assert_eq!(rendered.len(), 4);
        let text: String = rendered[3]
            .spans
            .iter()
            .map(|s| s.content.as_ref())
            .collect();
        assert_eq!(text, "4 │ +new");
    }

    #[test]
    fn load_theme_invalid_falls_back() {
        let theme = load_theme(Some("nonexistent-theme"));
        assert!(!theme.scopes.is_empty() || theme.settings.background.is_some());
    }
}
