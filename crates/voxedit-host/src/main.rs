//! Headless voice-command host.
//!
//! Loads a file into an in-memory editor, connects to the recognizer and executes whatever it
//! sends until interrupted. `Save` commands write the buffer back to disk.
//!
//! # Usage
//!
//! ```bash
//! cargo run -p voxedit-host -- src/main.rs --root . --settle-ms 100
//! RUST_LOG=voxedit_core=debug cargo run -p voxedit-host -- notes.txt
//! ```

mod settings;

use anyhow::Context;
use clap::Parser;
use settings::Settings;
use std::path::PathBuf;
use tracing::info;
use voxedit_core::{Dispatcher, MemoryEditor, Resolver};
use voxedit_ipc::IpcService;

/// Command line arguments.
#[derive(Parser, Debug)]
#[command(name = "voxedit-host")]
#[command(about = "Drive an in-memory editor from a voice-command recognizer")]
struct Args {
    /// File to edit; created on first save if it does not exist
    #[arg(value_name = "FILE")]
    file: Option<PathBuf>,

    /// Project root searched by "open file" commands (repeatable)
    #[arg(short, long, value_name = "PATH")]
    root: Vec<PathBuf>,

    /// JSON settings file
    #[arg(short, long, value_name = "PATH")]
    config: Option<PathBuf>,

    /// Recognizer port
    #[arg(short, long)]
    port: Option<u16>,

    /// Delay after tab and pane commands, in milliseconds
    #[arg(long, value_name = "MS")]
    settle_ms: Option<u64>,

    /// Verbose logging
    #[arg(short, long)]
    verbose: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();
    setup_tracing(args.verbose);

    let mut settings = Settings::load(args.config.as_deref())?;
    if let Some(port) = args.port {
        settings.ipc.port = port;
    }
    if let Some(settle_ms) = args.settle_ms {
        settings.dispatcher.settle_delay_ms = settle_ms;
    }

    let editor = open_editor(&args)?;
    let mut dispatcher = Dispatcher::new(editor, settings.dispatcher);
    dispatcher.session_mut().subscribe(|change| {
        tracing::debug!(
            change = ?change.change_type,
            version = change.new_version,
            "session changed"
        );
    });

    info!(port = settings.ipc.port, "starting recognizer connection");
    let handle = IpcService::start(settings.ipc, Resolver::new(dispatcher))?;

    tokio::signal::ctrl_c()
        .await
        .context("waiting for interrupt")?;

    info!("shutting down");
    handle.stop().await;
    Ok(())
}

fn open_editor(args: &Args) -> anyhow::Result<MemoryEditor> {
    let mut roots = args.root.clone();
    if roots.is_empty() {
        roots.push(std::env::current_dir().context("resolving working directory")?);
    }

    let Some(file) = &args.file else {
        return Ok(MemoryEditor::new("").with_roots(roots));
    };

    if file.exists() {
        let editor = MemoryEditor::open(file)
            .with_context(|| format!("opening {}", file.display()))?;
        Ok(editor.with_roots(roots))
    } else {
        info!(path = %file.display(), "new file, will be created on save");
        let mut editor = MemoryEditor::new("").with_roots(roots);
        editor.set_save_prompt(Some(file.clone()));
        Ok(editor)
    }
}

fn setup_tracing(verbose: bool) {
    use tracing_subscriber::EnvFilter;

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        if verbose {
            EnvFilter::new("voxedit_core=debug,voxedit_ipc=debug,voxedit_host=debug,info")
        } else {
            EnvFilter::new("info")
        }
    });

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .init();
}
