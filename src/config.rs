//! Application configuration: TOML file loading, CLI overrides, and defaults.
//!
//! Resolution order (first found wins, values merge/override):
//! 1. CLI flags (`SOURCE`, `--theme`, `--log-level`, etc.)
//! 2. Explicit `--config <file>`
//! 3. `$DIFF_TREE_CONFIG` environment variable (path to config file)
//! 4. Project-local `.diff-tree.toml` in the current working directory
//! 5. Global `~/.config/diff-tree/config.toml`
//! 6. Built-in defaults

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::Deserialize;

use crate::source::SourceKind;
use crate::tree::policy::{
    ExpansionLimits, DEFAULT_INCREMENTAL_MAX_DIRECT_CHILDREN, DEFAULT_INITIAL_EXPAND_CEILING,
    DEFAULT_INITIAL_MAX_DIRECT_CHILDREN, DEFAULT_VISIBLE_ROW_CEILING,
};

// ── Section configs ──────────────────────────────────────────────────────────

/// General application settings.
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct GeneralConfig {
    /// Enable mouse support.
    pub mouse: Option<bool>,
}

/// Where listings and diffs are read from.
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct SourceConfig {
    /// "auto", "json_dir", "snapshot_dir" or "http".
    pub kind: Option<String>,
    /// Directory path or base URL (overridden by the CLI positional arg).
    pub location: Option<String>,
    /// Address per-node resources by SHA-1 of the identity (HTTP only).
    pub content_addressed: Option<bool>,
    /// HTTP request timeout in milliseconds.
    pub request_timeout_ms: Option<u64>,
}

/// Auto-expansion limits.
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct ExpansionConfig {
    pub initial_max_direct_children: Option<u64>,
    pub initial_expand_ceiling: Option<usize>,
    pub incremental_max_direct_children: Option<u64>,
    pub visible_row_ceiling: Option<usize>,
}

/// Tree panel settings.
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct TreeConfig {
    /// Use nerd font icons (false = ASCII fallback).
    pub use_icons: Option<bool>,
}

/// Diff panel settings.
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct DiffConfig {
    /// Syntax highlighting theme (syntect theme name).
    pub syntax_theme: Option<String>,
}

/// Log output settings.
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct LogConfig {
    /// `tracing` filter directive, e.g. "info" or "diff_tree_tui=debug".
    pub level: Option<String>,
    /// Log file used while the terminal UI is running.
    pub file: Option<String>,
}

/// Color settings for a single theme palette.
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct ThemeColorsConfig {
    pub tree_fg: Option<String>,
    pub tree_selected_bg: Option<String>,
    pub tree_selected_fg: Option<String>,
    pub tree_dir_fg: Option<String>,
    pub diff_fg: Option<String>,
    pub diff_line_nr_fg: Option<String>,
    pub status_bg: Option<String>,
    pub status_fg: Option<String>,
    pub border_fg: Option<String>,
    pub added_fg: Option<String>,
    pub removed_fg: Option<String>,
    pub modified_fg: Option<String>,
    pub unchanged_fg: Option<String>,
}

/// Theme configuration section.
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct ThemeConfig {
    /// Color scheme: "dark", "light", "custom".
    pub scheme: Option<String>,
    /// Custom color overrides.
    pub custom: Option<ThemeColorsConfig>,
}

// ── Top-level config ─────────────────────────────────────────────────────────

/// Top-level application configuration.
///
/// All fields are optional so that partial configs from different sources
/// can be merged together (CLI overrides file, file overrides defaults).
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct AppConfig {
    pub general: GeneralConfig,
    pub source: SourceConfig,
    pub expansion: ExpansionConfig,
    pub tree: TreeConfig,
    pub diff: DiffConfig,
    pub log: LogConfig,
    pub theme: ThemeConfig,
}

/// Resolved source settings handed to `source::open`.
#[derive(Debug, Clone, PartialEq)]
pub struct SourceSettings {
    pub kind: SourceKind,
    pub location: String,
    pub content_addressed: bool,
    pub request_timeout: Option<Duration>,
}

// ── Default constants ────────────────────────────────────────────────────────

/// Default HTTP request timeout.
pub const DEFAULT_REQUEST_TIMEOUT_MS: u64 = 30_000;
/// Default log filter.
pub const DEFAULT_LOG_LEVEL: &str = "info";
/// Default syntect theme for diffs.
pub const DEFAULT_SYNTAX_THEME: &str = "base16-ocean.dark";

// ── Config file locator ──────────────────────────────────────────────────────

/// Return the list of candidate config file paths in priority order.
///
/// Does NOT include the CLI `--config` path, which is handled separately.
fn candidate_paths() -> Vec<PathBuf> {
    let mut paths = Vec::new();

    if let Ok(env_path) = std::env::var("DIFF_TREE_CONFIG") {
        paths.push(PathBuf::from(env_path));
    }

    if let Ok(cwd) = std::env::current_dir() {
        paths.push(cwd.join(".diff-tree.toml"));
    }

    if let Some(config_dir) = dirs::config_dir() {
        paths.push(config_dir.join("diff-tree").join("config.toml"));
    }

    paths
}

/// Try to read and parse a TOML config file. Returns `None` if the file
/// doesn't exist or can't be parsed (with a warning printed to stderr).
///
/// Logging is not initialised yet when config loads, hence stderr.
fn load_file(path: &Path) -> Option<AppConfig> {
    let content = match std::fs::read_to_string(path) {
        Ok(c) => c,
        Err(_) => return None,
    };
    match toml::from_str::<AppConfig>(&content) {
        Ok(cfg) => Some(cfg),
        Err(e) => {
            eprintln!(
                "Warning: failed to parse config file {}: {}",
                path.display(),
                e
            );
            None
        }
    }
}

// ── Merge logic ──────────────────────────────────────────────────────────────

impl AppConfig {
    /// Merge `other` on top of `self`; `other`'s `Some` values win.
    pub fn merge(self, other: &AppConfig) -> AppConfig {
        AppConfig {
            general: GeneralConfig {
                mouse: other.general.mouse.or(self.general.mouse),
            },
            source: SourceConfig {
                kind: other.source.kind.clone().or(self.source.kind),
                location: other.source.location.clone().or(self.source.location),
                content_addressed: other
                    .source
                    .content_addressed
                    .or(self.source.content_addressed),
                request_timeout_ms: other
                    .source
                    .request_timeout_ms
                    .or(self.source.request_timeout_ms),
            },
            expansion: ExpansionConfig {
                initial_max_direct_children: other
                    .expansion
                    .initial_max_direct_children
                    .or(self.expansion.initial_max_direct_children),
                initial_expand_ceiling: other
                    .expansion
                    .initial_expand_ceiling
                    .or(self.expansion.initial_expand_ceiling),
                incremental_max_direct_children: other
                    .expansion
                    .incremental_max_direct_children
                    .or(self.expansion.incremental_max_direct_children),
                visible_row_ceiling: other
                    .expansion
                    .visible_row_ceiling
                    .or(self.expansion.visible_row_ceiling),
            },
            tree: TreeConfig {
                use_icons: other.tree.use_icons.or(self.tree.use_icons),
            },
            diff: DiffConfig {
                syntax_theme: other.diff.syntax_theme.clone().or(self.diff.syntax_theme),
            },
            log: LogConfig {
                level: other.log.level.clone().or(self.log.level),
                file: other.log.file.clone().or(self.log.file),
            },
            theme: ThemeConfig {
                scheme: other.theme.scheme.clone().or(self.theme.scheme),
                custom: match (&self.theme.custom, &other.theme.custom) {
                    (_, Some(o)) => Some(o.clone()),
                    (Some(s), None) => Some(s.clone()),
                    (None, None) => None,
                },
            },
        }
    }

    /// Load the final merged configuration.
    ///
    /// `cli_config_path` is an explicit config file path from `--config`.
    /// `cli_overrides` are partial overrides derived from CLI flags.
    pub fn load(cli_config_path: Option<&Path>, cli_overrides: Option<&AppConfig>) -> AppConfig {
        let mut config = AppConfig::default();

        // Walk in reverse so that highest-priority (env var) overwrites lower.
        for path in candidate_paths().iter().rev() {
            if let Some(file_cfg) = load_file(path) {
                config = config.merge(&file_cfg);
            }
        }

        if let Some(cli_path) = cli_config_path {
            if let Some(file_cfg) = load_file(cli_path) {
                config = config.merge(&file_cfg);
            }
        }

        if let Some(overrides) = cli_overrides {
            config = config.merge(overrides);
        }

        config
    }

    // ── Convenience getters with built-in defaults ──────────────────────────

    /// Whether mouse support is enabled.
    pub fn mouse_enabled(&self) -> bool {
        self.general.mouse.unwrap_or(true)
    }

    /// Source settings, or `None` when no location was given anywhere.
    pub fn source_settings(&self) -> Option<SourceSettings> {
        let location = self.source.location.clone()?;
        let timeout_ms = self
            .source
            .request_timeout_ms
            .unwrap_or(DEFAULT_REQUEST_TIMEOUT_MS);
        Some(SourceSettings {
            kind: SourceKind::from_str(self.source.kind.as_deref().unwrap_or("auto")),
            location,
            content_addressed: self.source.content_addressed.unwrap_or(false),
            request_timeout: (timeout_ms > 0).then(|| Duration::from_millis(timeout_ms)),
        })
    }

    /// Auto-expansion limits.
    pub fn expansion_limits(&self) -> ExpansionLimits {
        let e = &self.expansion;
        ExpansionLimits {
            initial_max_direct_children: e
                .initial_max_direct_children
                .unwrap_or(DEFAULT_INITIAL_MAX_DIRECT_CHILDREN),
            initial_expand_ceiling: e
                .initial_expand_ceiling
                .unwrap_or(DEFAULT_INITIAL_EXPAND_CEILING),
            incremental_max_direct_children: e
                .incremental_max_direct_children
                .unwrap_or(DEFAULT_INCREMENTAL_MAX_DIRECT_CHILDREN),
            visible_row_ceiling: e
                .visible_row_ceiling
                .unwrap_or(DEFAULT_VISIBLE_ROW_CEILING),
        }
    }

    /// Whether to use nerd font icons.
    pub fn use_icons(&self) -> bool {
        self.tree.use_icons.unwrap_or(true)
    }

    /// Syntax highlighting theme name.
    pub fn syntax_theme_name(&self) -> &str {
        self.diff
            .syntax_theme
            .as_deref()
            .unwrap_or(DEFAULT_SYNTAX_THEME)
    }

    /// Log filter directive.
    pub fn log_level(&self) -> &str {
        self.log.level.as_deref().unwrap_or(DEFAULT_LOG_LEVEL)
    }

    /// Log file for TUI mode: configured path, else `<cache dir>/diff-tree/diff-tree.log`.
    pub fn log_file(&self) -> Option<PathBuf> {
        match &self.log.file {
            Some(file) => Some(PathBuf::from(file)),
            None => dirs::cache_dir().map(|d| d.join("diff-tree").join("diff-tree.log")),
        }
    }

    /// Theme scheme: "dark", "light", or "custom".
    pub fn theme_scheme(&self) -> &str {
        self.theme.scheme.as_deref().unwrap_or("dark")
    }
}

// ── Tests ────────────────────────────────────────────────────────────────────
