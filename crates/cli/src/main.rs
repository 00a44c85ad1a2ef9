//! `dictation`: a terminal host for the dictation worker.
//!
//! Events are written to stdout as JSON lines; logs go to stderr.

mod app;
mod logging;
mod operator;

use app::{App, LaunchOptions};
use clap::Parser;
use dk_core::config::loader::CONFIG_FILE_NAME;
use dk_core::config::load_config;
use dk_core::preferences::open_store;
use std::path::PathBuf;
use tracing::debug;

#[derive(Parser, Debug)]
#[command(name = "dictation", about = "Supervise a dictation worker and drive it from the terminal", version)]
struct Cli {
    /// Path to the configuration file
    #[arg(long, value_name = "PATH", default_value = CONFIG_FILE_NAME)]
    config: PathBuf,

    /// Worker program, replacing `worker.program` (and its args unless
    /// `--worker-arg` is also given)
    #[arg(long, value_name = "PROGRAM")]
    worker: Option<String>,

    /// Argument passed to the worker; repeat for several
    #[arg(long = "worker-arg", value_name = "ARG", allow_hyphen_values = true)]
    worker_args: Vec<String>,

    /// Model to load, overriding the stored preference
    #[arg(long)]
    model: Option<String>,

    /// Session language, overriding the stored preference
    #[arg(long)]
    language: Option<String>,

    /// Toggle accelerator, e.g. "CommandOrControl+Alt+Space"
    #[arg(long, value_name = "ACCELERATOR")]
    hotkey: Option<String>,

    /// Log level for our crates (error|warn|info|debug|trace)
    #[arg(long, value_name = "LEVEL")]
    log_level: Option<String>,

    /// Do not send `load` after the worker starts
    #[arg(long)]
    no_autoload: bool,

    /// Register the hotkey system-wide (macOS builds with `macos-hotkeys`)
    #[arg(long)]
    system_hotkeys: bool,
}

#[tokio::main]
async fn main() -> color_eyre::Result<()> {
    color_eyre::install()?;
    let cli = Cli::parse();
    logging::init(cli.log_level.as_deref());

    let mut config = load_config(&cli.config)?;
    if let Some(program) = cli.worker {
        config.worker.program = program;
        config.worker.args.clear();
    }
    if !cli.worker_args.is_empty() {
        config.worker.args = cli.worker_args;
    }
    debug!(program = %config.worker.program, args = ?config.worker.args, "worker configured");

    let preferences = open_store(&config.preferences);
    let options = LaunchOptions {
        model: cli.model,
        language: cli.language,
        hotkey: cli.hotkey,
        autoload: !cli.no_autoload,
        system_hotkeys: cli.system_hotkeys,
    };

    App::new(config, preferences, options).run().await
}
