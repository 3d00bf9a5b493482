//! Theme data model: built-in palettes and resolution from config.
//!
//! Two built-in palettes (dark and light) plus custom color overrides from
//! the config file. Change-status colors are shared by both palettes.

use ratatui::style::Color;

use crate::config::{ThemeColorsConfig, ThemeConfig};
use crate::tree::node::ChangeStatus;

// ── Runtime theme colors ─────────────────────────────────────────────────────

/// All runtime colors used in the UI.
///
/// Constructed from a config-level `ThemeConfig` via `resolve_theme()`.
#[derive(Debug, Clone)]
pub struct ThemeColors {
    // Tree panel
    pub tree_fg: Color,
    pub tree_selected_bg: Color,
    pub tree_selected_fg: Color,
    pub tree_dir_fg: Color,

    // Diff panel
    pub diff_fg: Color,
    pub diff_line_nr_fg: Color,

    // Status bar
    pub status_bg: Color,
    pub status_fg: Color,

    // Borders & chrome
    pub border_fg: Color,
    pub border_focused_fg: Color,

    // Change status
    pub added_fg: Color,
    pub removed_fg: Color,
    pub modified_fg: Color,
    pub unchanged_fg: Color,

    // Semantic colors (not configurable, consistent across themes)
    pub error_fg: Color,
    pub info_fg: Color,
    pub dim_fg: Color,
}

impl ThemeColors {
    pub fn status_fg(&self, status: ChangeStatus) -> Color {
        match status {
            ChangeStatus::Added => self.added_fg,
            ChangeStatus::Removed => self.removed_fg,
            ChangeStatus::Modified => self.modified_fg,
            ChangeStatus::Unchanged => self.unchanged_fg,
        }
    }
}

// ── Built-in palettes ────────────────────────────────────────────────────────

const ADDED: Color = Color::Rgb(82, 196, 26); // #52c41a
const REMOVED: Color = Color::Rgb(235, 47, 150); // #eb2f96
const MODIFIED: Color = Color::Rgb(208, 180, 76); // #d0b44c

/// Dark theme using Catppuccin Mocha palette.
pub fn dark_theme() -> ThemeColors {
    ThemeColors {
        tree_fg: Color::Rgb(205, 214, 244),          // #cdd6f4 (text)
        tree_selected_bg: Color::Rgb(69, 71, 90),    // #45475a (surface1)
        tree_selected_fg: Color::Rgb(205, 214, 244), // #cdd6f4
        tree_dir_fg: Color::Rgb(137, 180, 250),      // #89b4fa (blue)

        diff_fg: Color::Rgb(205, 214, 244),
        diff_line_nr_fg: Color::Rgb(108, 112, 134), // #6c7086

        status_bg: Color::Rgb(30, 30, 46), // #1e1e2e (base)
        status_fg: Color::Rgb(205, 214, 244),

        border_fg: Color::Rgb(88, 91, 112), // #585b70 (surface2)
        border_focused_fg: Color::Rgb(137, 180, 250),

        added_fg: ADDED,
        removed_fg: REMOVED,
        modified_fg: MODIFIED,
        unchanged_fg: Color::Rgb(205, 214, 244),

        error_fg: Color::Rgb(243, 139, 168), // #f38ba8 (red)
        info_fg: Color::Rgb(137, 180, 250),  // #89b4fa (blue)
        dim_fg: Color::Rgb(108, 112, 134),   // #6c7086
    }
}

/// Light theme, the Catppuccin Latte counterpart.
pub fn light_theme() -> ThemeColors {
    ThemeColors {
        tree_fg: Color::Rgb(76, 79, 105),             // #4c4f69 (text)
        tree_selected_bg: Color::Rgb(204, 208, 218),  // #ccd0da (surface1)
        tree_selected_fg: Color::Rgb(76, 79, 105),
        tree_dir_fg: Color::Rgb(30, 102, 245), // #1e66f5 (blue)

        diff_fg: Color::Rgb(76, 79, 105),
        diff_line_nr_fg: Color::Rgb(156, 160, 176),

        status_bg: Color::Rgb(239, 241, 245), // #eff1f5 (base)
        status_fg: Color::Rgb(76, 79, 105),

        border_fg: Color::Rgb(172, 176, 190), // #acb0be (surface2)
        border_focused_fg: Color::Rgb(30, 102, 245),

        added_fg: ADDED,
        removed_fg: REMOVED,
        modified_fg: MODIFIED,
        unchanged_fg: Color::Rgb(76, 79, 105),

        error_fg: Color::Rgb(210, 15, 57), // #d20f39 (red)
        info_fg: Color::Rgb(30, 102, 245),
        dim_fg: Color::Rgb(156, 160, 176),
    }
}

// ── Color parsing ────────────────────────────────────────────────────────────

/// Parse a hex color string like `"#aabbcc"` into a `ratatui::style::Color`.
/// Returns `None` for malformed input.
pub fn parse_hex_color(hex: &str) -> Option<Color> {
    let hex = hex.strip_prefix('#').unwrap_or(hex);
    if hex.len() != 6 {
        return None;
    }
    let r = u8::from_str_radix(&hex[0..2], 16).ok()?;
    let g = u8::from_str_radix(&hex[2..4], 16).ok()?;
    let b = u8::from_str_radix(&hex[4..6], 16).ok()?;
    Some(Color::Rgb(r, g, b))
}

// ── Theme resolution ─────────────────────────────────────────────────────────

/// Resolve the final `ThemeColors` from config.
///
/// - `"dark"` (default): dark Catppuccin palette
/// - `"light"`: light Catppuccin palette
/// - `"custom"`: start from dark palette, then override with custom hex values
pub fn resolve_theme(config: &ThemeConfig) -> ThemeColors {
    let scheme = config.scheme.as_deref().unwrap_or("dark");
    match scheme {
        "light" => light_theme(),
        "custom" => {
            let mut theme = dark_theme();
            if let Some(custom) = &config.custom {
                apply_custom_colors(&mut theme, custom);
            }
            theme
        }
        _ => dark_theme(),
    }
}

/// Apply custom hex color overrides on top of an existing theme.
fn apply_custom_colors(theme: &mut ThemeColors, custom: &ThemeColorsConfig) {
    let overrides: [(&Option<String>, &mut Color); 13] = [
        (&custom.tree_fg, &mut theme.tree_fg),
        (&custom.tree_selected_bg, &mut theme.tree_selected_bg),
        (&custom.tree_selected_fg, &mut theme.tree_selected_fg),
        (&custom.tree_dir_fg, &mut theme.tree_dir_fg),
        (&custom.diff_fg, &mut theme.diff_fg),
        (&custom.diff_line_nr_fg, &mut theme.diff_line_nr_fg),
        (&custom.status_bg, &mut theme.status_bg),
        (&custom.status_fg, &mut theme.status_fg),
        (&custom.border_fg, &mut theme.border_fg),
        (&custom.added_fg, &mut theme.added_fg),
        (&custom.removed_fg, &mut theme.removed_fg),
        (&custom.modified_fg, &mut theme.modified_fg),
        (&custom.unchanged_fg, &mut theme.unchanged_fg),
    ];
    for (hex, slot) in overrides {
        if let Some(color) = hex.as_deref().and_then(parse_hex_color) {
            *slot = color;
        }
    }
}

// ── Tests ────────────────────────────────────────────────────────────────────
