mod app;
mod ui;

use anyhow::Result;
use api::ApiClient;
use clap::Parser;
use config::{API_URL_ENV, AppConfig, Overrides, PathManager, Settings, load_env_file};
use crossterm::{
    event::{self, DisableMouseCapture, EnableMouseCapture, Event, MouseEventKind},
    execute,
    terminal::{EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode},
};
use ratatui::{Terminal, backend::CrosstermBackend};
use std::io;
use std::path::PathBuf;
use std::sync::Arc;
use tropictrek_core::{ChatController, ControllerOptions};

#[cfg(not(debug_assertions))]
use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

use crate::app::App;
use crate::ui::ui;

#[derive(Parser, Debug)]
#[command(name = "tropictrek", about = "Caribbean travel planning chat")]
struct Args {
    /// Base URL of the TropicTrek backend
    #[arg(long, env = API_URL_ENV)]
    api_url: Option<String>,

    /// Folder where downloaded itineraries are saved
    #[arg(long)]
    download_dir: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load environment variables from .env files before clap reads them
    load_env_file();
    let args = Args::parse();

    // Setup file-based logging
    // In dev mode, use local ./tropictrek.log that gets recreated on each run
    // In release mode, use the platform log directory with daily rotation
    #[cfg(debug_assertions)]
    let log_file = {
        let path = PathBuf::from("./tropictrek.log");
        // Truncate existing log file
        let _ = std::fs::remove_file(&path);
        std::fs::File::create(&path)?
    };
    #[cfg(debug_assertions)]
    let (non_blocking, _guard) = tracing_appender::non_blocking(log_file);

    #[cfg(not(debug_assertions))]
    let (non_blocking, _guard) = {
        let log_dir = PathManager::logs_dir().unwrap_or_else(|| PathBuf::from("."));
        std::fs::create_dir_all(&log_dir)?;
        let file_appender = RollingFileAppender::new(Rotation::DAILY, &log_dir, "tropictrek.log");
        tracing_appender::non_blocking(file_appender)
    };

    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with(fmt::layer().with_writer(non_blocking).with_ansi(false))
        .init();

    tracing::info!("Starting TropicTrek TUI");

    let settings = Settings::load();
    let config = AppConfig::resolve(
        &settings,
        Overrides {
            api_url: args.api_url,
            download_dir: args.download_dir,
        },
    );
    tracing::info!(
        api_url = %config.api_url,
        download_dir = %config.download_dir.display(),
        settings = ?PathManager::settings_path(),
        "Resolved configuration"
    );

    let client = ApiClient::new(&config.api_url, config.request_timeout)?;
    let mut controller = ChatController::new(
        Arc::new(client),
        ControllerOptions {
            download_dir: config.download_dir,
            max_input_chars: config.max_input_chars,
            probe_images: config.probe_images,
        },
    );
    controller.mount();
    let mut app = App::new(controller);

    // Setup terminal
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen, EnableMouseCapture)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let result = run(&mut terminal, &mut app);

    // Restore terminal
    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen, DisableMouseCapture)?;
    terminal.show_cursor()?;

    tracing::info!("TropicTrek TUI exiting");
    result
}

fn run(terminal: &mut Terminal<CrosstermBackend<io::Stdout>>, app: &mut App) -> Result<()> {
    while !app.should_quit() {
        // Render UI
        terminal.draw(|f| ui(f, app))?;

        // Update app state
        app.check_controller_events();
        if app.controller.is_loading() {
            app.advance_thinking_animation();
        }

        // Handle input
        if event::poll(std::time::Duration::from_millis(100))? {
            match event::read()? {
                Event::Key(key) => app.handle_key_event(key),
                Event::Mouse(mouse) => match mouse.kind {
                    MouseEventKind::ScrollUp => app.scroll_up(3),
                    MouseEventKind::ScrollDown => app.scroll_down(3),
                    _ => {} // Ignore other mouse events
                },
                _ => {} // Ignore other events
            }
        }
    }
    Ok(())
}
