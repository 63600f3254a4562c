use api::ApiClient;
use clap::Parser;
use config::{API_URL_ENV, AppConfig, Overrides, Settings, load_env_file};
use tropictrek_core::{
    ChatController, ControllerEvent, ControllerOptions, ConversationTurn, DisplayBlock, Sender,
    TextLine, render_turn,
};

use std::io::{self, BufRead, Write};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::Level;
use tracing_subscriber::FmtSubscriber;

#[derive(Parser, Debug)]
#[command(author, version, about = "TropicTrek travel chat in the terminal", long_about = None)]
struct Args {
    #[arg(long, short)]
    tracing: bool,

    /// Base URL of the TropicTrek backend
    #[arg(long, env = API_URL_ENV)]
    api_url: Option<String>,

    /// Folder where downloaded itineraries are saved
    #[arg(long)]
    download_dir: Option<PathBuf>,
}

// Application state
struct AppState {
    controller: ChatController,
    api_url: String,
}

fn setup_tracing(enable: bool) {
    if enable {
        let subscriber = FmtSubscriber::builder()
            .with_max_level(Level::TRACE)
            .with_writer(io::stderr)
            .finish();
        tracing::subscriber::set_global_default(subscriber)
            .expect("Setting default subscriber failed");
    } else {
        let subscriber = FmtSubscriber::builder()
            .with_max_level(Level::ERROR)
            .with_writer(io::sink)
            .finish();
        tracing::subscriber::set_global_default(subscriber)
            .expect("Setting default subscriber failed");
    }
}

fn print_status_bar(state: &AppState) {
    let terminal_width: usize = 80;
    let session = state
        .controller
        .session()
        .map(|s| s.as_str().chars().take(8).collect::<String>())
        .unwrap_or_else(|| "new".to_string());
    let status = format!(
        " {} • session {} • {} itineraries ",
        state.api_url,
        session,
        state.controller.pdfs().len()
    );
    let padding = terminal_width.saturating_sub(status.chars().count());
    let left_pad = padding / 2;
    let right_pad = padding - left_pad;

    println!("┌{}┐", "─".repeat(terminal_width - 2));
    println!("│{}{}{}│", " ".repeat(left_pad), status, " ".repeat(right_pad));
    println!("└{}┘", "─".repeat(terminal_width - 2));
}

/// Plain-text rendition of a turn: image captions, PDF links and videos on
/// their own lines, emphasis markers dropped.
fn print_turn(controller: &ChatController, turn: &ConversationTurn) {
    match turn.sender() {
        Sender::User => return,
        Sender::Assistant => println!("TropicTrek ({}):", turn.timestamp().format("%H:%M")),
    }

    for block in render_turn(turn.content()).blocks {
        match block {
            DisplayBlock::Images(images) => {
                for image in images {
                    let failed = controller.image_failed(&image.url);
                    if failed {
                        println!("  [{}]", image.display_label(true));
                    } else {
                        println!("  [Image: {}] {}", image.display_label(false), image.url);
                    }
                }
            }
            DisplayBlock::PdfLink(link) => println!("  [PDF: {}] {}", link.label, link.url),
            DisplayBlock::Video(video) => println!("  [Video] {}", video.embed_url()),
            DisplayBlock::Text(TextLine::Blank) => println!(),
            DisplayBlock::Text(TextLine::Text(spans)) => {
                let text: String = spans.iter().map(|s| s.text.as_str()).collect();
                println!("{}", text);
            }
        }
    }

    if let Some(pdf_id) = turn.pdf_id().filter(|_| turn.offers_pdf_actions()) {
        let number = controller.pdfs().number_of(pdf_id).unwrap_or(0);
        println!();
        println!("📄 Your itinerary PDF is ready! Type /download {} to save it.", number);
    }
}

fn report(event: ControllerEvent) {
    match event {
        ControllerEvent::PdfSaved { path, .. } => {
            println!("Itinerary saved to {}", path.display());
        }
        ControllerEvent::DownloadFailed { .. } => {
            eprintln!("Failed to download PDF. Please try again.");
        }
        ControllerEvent::HealthChecked { reachable: false } => {
            eprintln!("TropicTrek backend is unreachable. Messages may fail until it is back.");
        }
        ControllerEvent::HealthChecked { reachable: true }
        | ControllerEvent::ReplyReceived { .. }
        | ControllerEvent::ImageChecked { .. } => {}
    }
}

/// Wait for every outstanding backend call.
async fn drain_events(controller: &mut ChatController) {
    while let Some(event) = controller.next_event().await {
        report(event);
    }
}

/// Report calls that already finished without waiting for the rest.
/// Returns how many were reported.
fn report_ready_events(controller: &mut ChatController) -> usize {
    let mut reported = 0;
    while let Some(event) = controller.try_next_event() {
        report(event);
        reported += 1;
    }
    reported
}

async fn send_message(state: &mut AppState, message: &str) {
    if let Err(e) = state.controller.set_input(message) {
        eprintln!("{}", e);
        return;
    }
    if state.controller.submit().is_none() {
        return;
    }

    let before = state.controller.turns().len();
    drain_events(&mut state.controller).await;

    for turn in &state.controller.turns()[before..] {
        print_turn(&state.controller, turn);
    }
}

// Slash command handling
mod commands {
    use super::*;
    use tropictrek_core::{Command, HELP_TEXT};

    pub enum CommandResult {
        Continue,
        Exit,
    }

    pub async fn execute(command: Command, state: &mut AppState) -> CommandResult {
        match command {
            Command::Quit => {
                println!("Goodbye!");
                return CommandResult::Exit;
            }
            Command::Help => {
                println!("{}", HELP_TEXT);
                println!("  Ctrl+D             - Exit the chat");
            }
            Command::ListPdfs => {
                let pdfs = state.controller.pdfs();
                if pdfs.is_empty() {
                    println!("No itineraries yet.");
                }
                for (i, record) in pdfs.iter().enumerate() {
                    println!("  {}. {} ({})", i + 1, record.label, record.file_name);
                }
            }
            Command::Download(number) => {
                let pdf_id = state
                    .controller
                    .pdfs()
                    .by_number(number)
                    .map(|r| r.pdf_id.clone());
                match pdf_id {
                    Some(pdf_id) => {
                        println!("Preparing your PDF download...");
                        state.controller.request_download(&pdf_id);
                        drain_events(&mut state.controller).await;
                    }
                    None => println!("No such itinerary. Use /pdfs to list them."),
                }
            }
            Command::Preview(_) => {
                println!("Previewing itineraries needs the full-screen app (tropictrek).");
            }
        }
        println!();
        CommandResult::Continue
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    load_env_file();
    let args = Args::parse();

    setup_tracing(args.tracing);

    let config = AppConfig::resolve(
        &Settings::load(),
        Overrides {
            api_url: args.api_url,
            download_dir: args.download_dir,
        },
    );
    tracing::info!("Using backend at {}", config.api_url);

    let client = ApiClient::new(&config.api_url, config.request_timeout)?;
    let mut controller = ChatController::new(
        Arc::new(client),
        ControllerOptions {
            download_dir: config.download_dir,
            max_input_chars: config.max_input_chars,
            probe_images: config.probe_images,
        },
    );
    // The health check reports in the background; the prompt is not held for it
    controller.mount();

    let mut state = AppState {
        controller,
        api_url: config.api_url,
    };

    println!();
    println!("Welcome to TropicTrek! Ask about any island in the Eastern Caribbean.");
    println!("Type /help for commands, Ctrl+D or /quit to exit.");
    println!();

    let stdin = io::stdin();
    let mut lines = stdin.lock().lines();

    loop {
        report_ready_events(&mut state.controller);
        print_status_bar(&state);
        print!("> ");
        io::stdout().flush()?;

        let line = match lines.next() {
            Some(Ok(line)) => line,
            Some(Err(e)) => {
                eprintln!("Error reading input: {}", e);
                break;
            }
            None => {
                println!();
                println!("Goodbye!");
                break;
            }
        };

        let input = line.trim();

        if input.is_empty() {
            continue;
        }

        // Try to parse as command
        if tropictrek_core::Command::is_command(input) {
            match tropictrek_core::Command::parse(input) {
                Ok(cmd) => match commands::execute(cmd, &mut state).await {
                    commands::CommandResult::Exit => break,
                    commands::CommandResult::Continue => continue,
                },
                Err(err) => {
                    println!("{}", err);
                    println!();
                    continue;
                }
            }
        }

        send_message(&mut state, input).await;
        println!();
    }

    println!(
        "Conversation had {} messages",
        state.controller.turns().len()
    );
    Ok(())
}
