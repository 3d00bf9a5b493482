mod app;
mod components;
mod config;
mod diff;
mod error;
mod event;
mod handler;
mod logging;
mod print;
mod source;
mod theme;
mod tree;
mod tui;
mod ui;

use std::path::PathBuf;
use std::time::Duration;

use clap::Parser;
use tracing::info;

use crate::app::App;
use crate::config::{AppConfig, GeneralConfig, LogConfig, SourceConfig, ThemeConfig};
use crate::diff::SyntectDiffRenderer;
use crate::error::AppError;
use crate::event::EventHandler;
use crate::tree::policy::ExpansionPolicy;
use crate::tui::{install_panic_hook, Tui};

/// Browse a changeset as a lazily loaded tree with per-file diffs.
#[derive(Parser, Debug)]
#[command(name = "dtree", version, about)]
struct Cli {
    /// Export directory, results directory or http(s):// base URL
    source: Option<String>,

    /// Path to a config file
    #[arg(long)]
    config: Option<PathBuf>,

    /// Print the auto-expanded tree to stdout instead of opening the UI
    #[arg(long)]
    print: bool,

    /// Log filter, e.g. "debug" or "diff_tree_tui=trace"
    #[arg(long)]
    log_level: Option<String>,

    /// Color scheme: dark, light or custom
    #[arg(long)]
    theme: Option<String>,

    /// Disable mouse capture
    #[arg(long)]
    no_mouse: bool,

    /// Address per-node HTTP resources by SHA-1 of the identity
    #[arg(long)]
    content_addressed: bool,
}

impl Cli {
    /// Only flags the user actually passed become overrides.
    fn overrides(&self) -> AppConfig {
        AppConfig {
            general: GeneralConfig {
                mouse: self.no_mouse.then_some(false),
            },
            source: SourceConfig {
                location: self.source.clone(),
                content_addressed: self.content_addressed.then_some(true),
                ..Default::default()
            },
            log: LogConfig {
                level: self.log_level.clone(),
                ..Default::default()
            },
            theme: ThemeConfig {
                scheme: self.theme.clone(),
                ..Default::default()
            },
            ..Default::default()
        }
    }
}

#[tokio::main]
async fn main() -> error::Result<()> {
    let cli = Cli::parse();
    let cfg = AppConfig::load(cli.config.as_deref(), Some(&cli.overrides()));

    let settings = cfg.source_settings().ok_or_else(|| {
        AppError::InvalidPath("no source given (pass SOURCE or set [source] location)".into())
    })?;
    let policy = ExpansionPolicy::new(cfg.expansion_limits());

    if cli.print {
        logging::init_stderr(cfg.log_level())?;
        let source = source::open(&settings)?;
        info!(source = %source.describe(), "printing tree");
        for row in print::expanded_rows(source.as_ref(), policy).await? {
            println!("{}", row);
        }
        return Ok(());
    }

    let _log_guard = match cfg.log_file() {
        Some(path) => Some(logging::init_file(cfg.log_level(), &path)?),
        None => None,
    };
    let source = source::open(&settings)?;
    info!(source = %source.describe(), theme = cfg.theme_scheme(), "starting browser");

    install_panic_hook();

    let mut tui = Tui::enter(cfg.mouse_enabled())?;
    let mut events = EventHandler::new(Duration::from_millis(16));
    let colors = theme::resolve_theme(&cfg.theme);
    let renderer = SyntectDiffRenderer::new(cfg.syntax_theme_name(), &colors);
    let mut app = App::new(
        source,
        policy,
        Box::new(renderer),
        colors,
        cfg.use_icons(),
        events.sender(),
    );
    app.start();

    loop {
        tui.draw(|frame| ui::render(&mut app, frame))?;
        app.handle_event(events.next().await?);
        if app.should_quit {
            break;
        }
    }

    tui.exit()?;
    match app.fatal.take() {
        Some(err) => Err(err),
        None => Ok(()),
    }
}
