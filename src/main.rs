//! ref-demo - terminal showcase of ref usage patterns
//!
//! Six small components, each using a ref differently, mounted on one page
//! by a retained-mode runtime and drawn with ratatui.

mod components;
mod config;
mod core;
mod data;
mod frontend;
mod snapshot;

use anyhow::{Context, Result};
use clap::{Parser as ClapParser, Subcommand};
use frontend::Frontend;
use std::io::Write;
use std::path::PathBuf;
use std::rc::Rc;

#[derive(ClapParser)]
#[command(name = "ref-demo")]
#[command(about = "Terminal showcase of ref usage patterns", long_about = None)]
struct Cli {
    /// Configuration file path
    #[arg(short, long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Custom data directory (default: ~/.ref-demo)
    /// Can also be set via REF_DEMO_DIR environment variable
    #[arg(long, value_name = "DIR")]
    data_dir: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Mount the page headlessly and print what it renders
    Snapshot {
        /// Page width in cells
        #[arg(long, default_value_t = 80)]
        width: u16,

        /// Print the document tree as JSON instead of text lines
        #[arg(long)]
        json: bool,

        /// Click the first Increase button this many times first
        #[arg(long, value_name = "N", default_value_t = 0)]
        click_increase: u32,
    },
    /// Validate configuration
    ValidateConfig {
        /// Config file to validate (default: the data directory's config.toml)
        #[arg(value_name = "FILE")]
        file: Option<PathBuf>,
    },
}

fn init_logging() -> Result<()> {
    // TUI apps can't log to stdout, so we write to a file
    let dir = config::Config::base_dir()?;
    std::fs::create_dir_all(&dir)
        .context(format!("Failed to create data directory {:?}", dir))?;
    let log_file = std::fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(dir.join("ref-demo.log"))
        .context("Failed to open ref-demo.log")?;

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_writer(std::sync::Mutex::new(log_file))
        .with_ansi(false) // No color codes in log file
        .init();
    Ok(())
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Set custom data directory if specified (via CLI or environment variable)
    if let Some(data_dir) = &cli.data_dir {
        std::env::set_var(config::DIR_ENV, data_dir);
    }
    init_logging()?;
    if let Ok(dir) = std::env::var(config::DIR_ENV) {
        tracing::info!("Using data directory: {}", dir);
    }

    if let Some(Commands::ValidateConfig { file }) = &cli.command {
        let path = file.as_ref().or(cli.config.as_ref());
        let valid = validate_config(path, &mut std::io::stdout(), &mut std::io::stderr())?;
        if !valid {
            std::process::exit(1);
        }
        return Ok(());
    }

    // Load configuration
    let config = match &cli.config {
        Some(path) => config::Config::load_from_path(path)?,
        None => config::Config::load()?,
    };

    match cli.command {
        Some(Commands::Snapshot {
            width,
            json,
            click_increase,
        }) => print_snapshot(
            config,
            snapshot::SnapshotOptions {
                width,
                json,
                clicks: click_increase,
            },
        ),
        _ => run_tui(config),
    }
}

/// Run TUI frontend
fn run_tui(config: config::Config) -> Result<()> {
    use frontend::{TerminalTitle, TuiFrontend};
    use std::time::Duration;

    let mut frontend = TuiFrontend::new()?;
    frontend.set_poll_timeout(Duration::from_millis(config.ui.poll_timeout_ms));

    let meta = Rc::new(TerminalTitle::new());
    let mut app = crate::core::DemoApp::new(config, meta)?;

    while app.running {
        frontend.render(&mut app)?;
        for event in frontend.poll_events()? {
            app.handle_event(event);
            if !app.running {
                break;
            }
        }
    }

    frontend.cleanup()?;
    tracing::info!("exiting");
    Ok(())
}

/// Headless render: text lines (or JSON tree) plus the document title
fn print_snapshot(config: config::Config, options: snapshot::SnapshotOptions) -> Result<()> {
    for line in snapshot::render_snapshot(&config, options)? {
        println!("{}", line);
    }
    Ok(())
}

/// Load and check a config file, reporting to `out` and `err`.
/// Returns false when the file failed to load or has errors.
fn validate_config(
    path: Option<&PathBuf>,
    out: &mut impl Write,
    err: &mut impl Write,
) -> Result<bool> {
    let result = match path {
        Some(path) => {
            writeln!(out, "Validating config file: {:?}", path)?;
            std::fs::read_to_string(path)
                .context(format!("Failed to read config file: {:?}", path))
                .and_then(|contents| config::Config::parse(&contents))
        }
        None => {
            writeln!(out, "Validating default config")?;
            config::Config::load()
        }
    };

    let config = match result {
        Ok(config) => config,
        Err(e) => {
            writeln!(err, "✗ Failed to load config: {:#}", e)?;
            return Ok(false);
        }
    };
    writeln!(out, "✓ Config loaded successfully")?;

    let issues = config.validate();
    let errors = issues.iter().filter(|i| i.is_error()).count();
    let warnings = issues.len() - errors;
    for issue in &issues {
        if issue.is_error() {
            writeln!(err, "✗ Error: {}", issue.message())?;
        } else {
            writeln!(out, "⚠ Warning: {}", issue.message())?;
        }
    }

    if issues.is_empty() {
        writeln!(out, "✓ Config is valid with no issues")?;
    } else {
        if errors > 0 {
            writeln!(err, "\n✗ Found {} error(s)", errors)?;
        }
        if warnings > 0 {
            writeln!(out, "⚠ Found {} warning(s)", warnings)?;
        }
    }

    Ok(errors == 0)
}
