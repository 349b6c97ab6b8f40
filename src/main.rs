//! vmux - demo host for the multiplexer engine
//!
//! Runs the multiplexer full-screen in the current terminal. Every pane hosts
//! a small echo shell (`echo`, `clear`, `exit`).
//!
//! # Keybindings (Ctrl+B prefix)
//!
//! | Key | Action |
//! |-----|--------|
//! | c | New window |
//! | n/p | Next/Previous window |
//! | " | Split (stacked panes) |
//! | % | Split (side-by-side panes) |
//! | x | Close pane |
//! | z | Toggle zoom |
//! | Arrow keys | Navigate panes |
//! | d | Detach (quit) |
//! | ? | All bindings |

use std::env;
use std::path::PathBuf;
use std::time::Duration;

use crossterm::event::{self, Event};
use crossterm::terminal;
use tracing::info;
use tracing_subscriber::EnvFilter;

use vmux::core::EchoSession;
use vmux::ui::{KeyMapper, TerminalRenderer};
use vmux::{Config, Multiplexer};

/// Version string from Cargo.toml
const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Poll interval; bounds how late the clock and overlay deadlines update
const POLL_TIMEOUT: Duration = Duration::from_millis(250);

fn print_version() {
    eprintln!("vmux {}", VERSION);
}

fn print_help() {
    eprintln!("vmux {} - A tmux-style terminal multiplexer engine", VERSION);
    eprintln!();
    eprintln!("Usage: vmux [OPTIONS]");
    eprintln!();
    eprintln!("Options:");
    eprintln!("  -v, --version         Show version");
    eprintln!("  -h, --help            Show this help");
    eprintln!();
    eprintln!("Keybindings (Ctrl+B prefix, Ctrl+B ? lists all):");
    eprintln!("  Ctrl+B, c             New window");
    eprintln!("  Ctrl+B, \"             Split pane (stacked)");
    eprintln!("  Ctrl+B, %             Split pane (side by side)");
    eprintln!("  Ctrl+B, Arrow         Move to pane in direction");
    eprintln!("  Ctrl+B, z             Toggle pane zoom");
    eprintln!("  Ctrl+B, :             Command prompt");
    eprintln!("  Ctrl+B, d             Detach (quit)");
    eprintln!();
    eprintln!("Configuration: ~/.vmux/config.toml");
    eprintln!("Log file:      ~/.vmux/vmux.log (level from VMUX_LOG)");
}

fn parse_args() -> Result<(), String> {
    for arg in env::args().skip(1) {
        match arg.as_str() {
            "-h" | "--help" => {
                print_help();
                std::process::exit(0);
            }
            "-v" | "--version" => {
                print_version();
                std::process::exit(0);
            }
            other => return Err(format!("Unknown option: {}", other)),
        }
    }
    Ok(())
}

/// Log to ~/.vmux/vmux.log; the level comes from VMUX_LOG (default info)
fn init_logging() {
    let log_path = Config::config_dir()
        .map(|dir| dir.join("vmux.log"))
        .unwrap_or_else(|| PathBuf::from("vmux.log"));

    // Create log directory if needed
    if let Some(parent) = log_path.parent() {
        let _ = std::fs::create_dir_all(parent);
    }

    let log_file = std::fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(&log_path)
        .ok();

    if let Some(file) = log_file {
        let filter = EnvFilter::try_from_env("VMUX_LOG").unwrap_or_else(|_| EnvFilter::new("info"));
        let subscriber = tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_writer(std::sync::Mutex::new(file))
            .with_ansi(false)
            .finish();
        let _ = tracing::subscriber::set_global_default(subscriber);
    }
}

fn main() -> anyhow::Result<()> {
    if let Err(e) = parse_args() {
        eprintln!("Error: {}", e);
        eprintln!("Use --help for usage information");
        std::process::exit(1);
    }

    init_logging();
    info!("vmux {} starting...", VERSION);

    let config = Config::load();
    let scheme = config.color_scheme();
    let (fg, bg) = (scheme.default_fg, scheme.default_bg);
    let (cols, rows) = terminal::size()?;

    let mut mux = Multiplexer::new(
        cols,
        rows,
        Box::new(move |cols, rows| Box::new(EchoSession::new(cols, rows).with_colors(fg, bg))),
        config,
    );

    let mut renderer = TerminalRenderer::new();
    renderer.init()?;
    let result = run_main_loop(&mut mux, &mut renderer);
    renderer.cleanup()?;

    info!("vmux exiting");
    result
}

fn run_main_loop(mux: &mut Multiplexer, renderer: &mut TerminalRenderer) -> anyhow::Result<()> {
    renderer.render(&mux.render_frame())?;

    while !mux.is_detached() {
        if event::poll(POLL_TIMEOUT)? {
            match event::read()? {
                Event::Key(key_event) => {
                    if let Some(key) = KeyMapper::map(&key_event) {
                        mux.feed_key(&key);
                    }
                }
                Event::Resize(cols, rows) => {
                    mux.resize(cols, rows);
                    renderer.invalidate();
                }
                _ => {}
            }
        }
        mux.expire_timers();

        if mux.is_detached() {
            info!("detached");
            break;
        }
        renderer.render(&mux.render_frame())?;
    }
    Ok(())
}
