//! game-assist - vision overlay assistant for Dota 2
//!
//! Usage:
//!   game-assist                    Run with hotkeys and overlay (Windows)
//!   game-assist --start            Start capturing immediately
//!   game-assist --upload <file>    Analyze a screenshot once the overlay is up
//!   game-assist --analyze <file>   Analyze a screenshot and print the result
//!   game-assist --help             Show help

// The UI router is only wired up by the Win32 front end
#![cfg_attr(not(windows), allow(dead_code))]

use std::fs::File;
use std::sync::Mutex;

use tracing_subscriber::{EnvFilter, FmtSubscriber};

mod app;
mod args;
mod headless;
mod hotkeys;
#[cfg(windows)]
mod win;

use args::Options;

fn main() -> anyhow::Result<()> {
    let args: Vec<String> = std::env::args().skip(1).collect();

    if args.iter().any(|a| a == "--help" || a == "-h") {
        print_help();
        return Ok(());
    }

    let options = match args::parse_args(&args) {
        Ok(options) => options,
        Err(e) => {
            eprintln!("Error: {}", e);
            eprintln!();
            print_help();
            std::process::exit(1);
        }
    };

    init_logging(options.verbose);

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .thread_name("game-assist-worker")
        .build()?;

    if let Some(path) = options.analyze.clone() {
        return headless::run(&runtime, &path, options.prompt);
    }

    run(runtime, options)
}

fn print_help() {
    println!("game-assist - Dota 2 vision overlay assistant");
    println!();
    println!("USAGE:");
    println!("    game-assist [options]");
    println!();
    println!("OPTIONS:");
    println!("    --start                     Start capturing immediately");
    println!("    --upload <file>             Analyze a screenshot at launch");
    println!("    --analyze <file>            Analyze a screenshot, print the result and exit");
    println!("    --prompt <name>             default, laning, teamfight, items, late");
    println!("    --verbose, -v               Debug logging");
    println!("    --help, -h                  Show this help message");
    println!();
    println!("HOTKEYS:");
    for hotkey in hotkeys::Hotkey::all() {
        println!("    {:<27} {}", hotkey.chord(), hotkey.description());
    }
    println!();
    println!("Settings are read from the GameAssist folder in your config directory.");
    println!("Set RUST_LOG to override the log level; logs go to game-assist.log.");
}

fn init_logging(verbose: bool) {
    // Logs go to a file: the overlay has no console to write to
    if let Ok(log_file) = File::create("game-assist.log") {
        let default_level = if verbose { "debug" } else { "info" };
        let filter = EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| EnvFilter::new(default_level));

        let subscriber = FmtSubscriber::builder()
            .with_env_filter(filter)
            .with_target(false)
            .with_ansi(false)
            .with_writer(Mutex::new(log_file))
            .finish();

        let _ = tracing::subscriber::set_global_default(subscriber);
    }
}

#[cfg(windows)]
fn run(runtime: tokio::runtime::Runtime, options: Options) -> anyhow::Result<()> {
    win::run(runtime, options)
}

#[cfg(not(windows))]
fn run(_runtime: tokio::runtime::Runtime, _options: Options) -> anyhow::Result<()> {
    anyhow::bail!("the overlay needs Windows; use --analyze <file> to analyze a screenshot")
}
