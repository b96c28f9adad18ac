//! `mazelink-cli` – Mazelink Command Line Interface
//!
//! Runs a complete operator / relay / observer session in one process with
//! simulated actors and audio, so the protocol can be driven by hand:
//!
//! 1. Loads `~/.mazelink/config.toml`, writing the defaults on first run.
//! 2. Loads the configured maze (or the built-in demo maze).
//! 3. Drops the user into an interactive REPL (`w` / `a` / `d`, `/map`, …).
//! 4. Intercepts Ctrl-C to leave the REPL cleanly.

mod config;
mod repl;

use colored::Colorize;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use tracing::{info, warn};

use mazelink_runtime::Session;
use mazelink_runtime::telemetry::init_tracing;

fn main() {
    let _guard = init_tracing("mazelink");

    print_banner();

    // ── Shared shutdown flag ──────────────────────────────────────────────
    let shutdown = Arc::new(AtomicBool::new(false));
    let shutdown_clone = shutdown.clone();
    if let Err(e) = ctrlc::set_handler(move || {
        println!();
        println!("{}", "⚠  Ctrl-C received – leaving the maze …".yellow().bold());
        shutdown_clone.store(true, Ordering::SeqCst);
    }) {
        warn!(error = %e, "Failed to install Ctrl-C handler");
    }

    // ── Configuration ─────────────────────────────────────────────────────
    let cfg = match config::load() {
        Ok(Some(cfg)) => {
            println!(
                "  Config loaded from {}",
                config::config_path().display().to_string().bold()
            );
            cfg
        }
        Ok(None) => {
            let mut cfg = config::Config::default();
            match config::save(&cfg) {
                Ok(()) => println!(
                    "  {} Default config written to {}",
                    "✓".green().bold(),
                    config::config_path().display().to_string().bold()
                ),
                Err(e) => println!("{}: {}", "Error saving config".red(), e),
            }
            config::apply_env_overrides(&mut cfg);
            cfg
        }
        Err(e) => {
            println!("{}: {}", "Config error".red(), e);
            println!("  Using default configuration.");
            let mut cfg = config::Config::default();
            config::apply_env_overrides(&mut cfg);
            cfg
        }
    };

    // ── Session ───────────────────────────────────────────────────────────
    let session = match build_session(&cfg) {
        Ok(session) => session,
        Err(e) => {
            eprintln!("{}: {}", "Cannot start session".red().bold(), e);
            std::process::exit(1);
        }
    };
    info!(
        maze = %cfg
            .maze_path
            .as_ref()
            .map(|p| p.display().to_string())
            .unwrap_or_else(|| "demo".to_string()),
        tick_hz = cfg.tick_hz,
        "session ready"
    );

    println!();
    print!("{}", repl::render_map(&session));
    println!();
    println!("  Type {} for a list of commands.\n", "/help".bold().cyan());

    let shell = repl::Shell::new(session, cfg.tilt_input(), cfg.frame_dt());
    repl::run(shell, shutdown);
}

fn build_session(cfg: &config::Config) -> Result<Session, String> {
    let grid = cfg.load_grid()?;
    let session_config = cfg.session_config()?;
    Session::builder(Arc::new(grid))
        .config(session_config)
        .observers(1)
        .build()
        .map_err(|e| e.to_string())
}

// ─────────────────────────────────────────────────────────────────────────────
// Banner
// ─────────────────────────────────────────────────────────────────────────────

fn print_banner() {
    println!();
    println!("{}", r#"   __  ___              ___      __"#.bold().cyan());
    println!("{}", r#"  /  |/  /__ ____ ___  / (_)__  / /__"#.bold().cyan());
    println!("{}", r#" / /|_/ / _ `/_ // -_)/ / / _ \/  '_/"#.bold().cyan());
    println!("{}", r#"/_/  /_/\_,_//__/\__//_/_/_//_/_/\_\ "#.bold().cyan());
    println!();
    println!(
        "  {} {}",
        "Mazelink".bold(),
        format!("v{}", env!("CARGO_PKG_VERSION")).dimmed()
    );
    println!("  Shared-control maze navigation");
    println!();
}
