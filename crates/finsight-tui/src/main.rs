use std::path::PathBuf;

use anyhow::Result;
use clap::Parser;

use finsight_core::{BackendClient, ChatMode, Config, UploadMode};

mod app;
mod handler;
mod logging;
mod markdown;
mod tui;
mod ui;

use app::App;
use tui::EventHandler;

#[derive(Parser)]
#[command(name = "finsight")]
#[command(version)]
#[command(about = "Upload financial statements and ask questions about them")]
struct Cli {
    /// Backend origin (overrides BACKEND_URL and the config file)
    #[arg(long)]
    backend_url: Option<String>,

    /// Upload one file at a time
    #[arg(long)]
    single_file: bool,

    /// Send each question without the earlier conversation
    #[arg(long)]
    single_turn: bool,

    /// PDFs to select for upload on startup
    files: Vec<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Held until exit so buffered log lines reach the file
    let _log_guard = logging::init();

    let config = Config::load().unwrap_or_else(|e| {
        tracing::warn!(error = %e, "could not read config, using defaults");
        Config::new()
    });

    let backend_url = config.resolve_backend_url(cli.backend_url, Config::backend_url_from_env());
    let upload_mode = if cli.single_file { UploadMode::Single } else { config.upload_mode() };
    let chat_mode = if cli.single_turn { ChatMode::SingleTurn } else { config.chat_mode() };

    tracing::info!(
        %backend_url,
        upload_mode = upload_mode.as_str(),
        chat_mode = chat_mode.as_str(),
        "starting"
    );

    let mut app = App::new(BackendClient::new(&backend_url), upload_mode, chat_mode);
    if !cli.files.is_empty() {
        app.select_paths(&cli.files);
    }
    app.check_health();

    tui::install_panic_hook();
    let mut terminal = tui::init()?;
    let result = run(&mut terminal, &mut app).await;
    tui::restore()?;

    if let Err(e) = &result {
        tracing::error!(error = %e, "exited with error");
    }
    result
}

async fn run(terminal: &mut tui::Tui, app: &mut App) -> Result<()> {
    let mut events = EventHandler::new();

    while !app.should_quit {
        terminal.draw(|frame| ui::render(app, frame))?;

        match events.next().await {
            Some(event) => handler::handle_event(app, event).await?,
            None => break,
        }
    }

    Ok(())
}
