use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::{bail, Result};
use carreira_core::{
    config::{self, Config},
    logging::{self, LogTarget},
    Conversation, TurnController,
};
use clap::{Parser, Subcommand};
use tracing::{info, warn};

mod app;
mod handler;
mod tui;
mod ui;

use app::App;

#[derive(Parser)]
#[command(name = "carreira")]
#[command(version, about = "CarreiraTI: assistente de carreira em TI no terminal")]
struct Cli {
    /// Write logs to this file instead of the default location
    #[arg(long, global = true)]
    log_file: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Open the interactive chat (default)
    Chat,
    /// Ask a single question and print the answer
    Ask {
        /// Your question
        #[arg(required = true, num_args = 1..)]
        question: Vec<String>,
    },
    /// Store the Groq API key in the config file
    SetKey {
        /// The API key
        key: String,
    },
}

#[tokio::main]
async fn main() -> Result<ExitCode> {
    // A missing .env is fine; the key may come from the environment or config
    dotenv::dotenv().ok();

    let cli = Cli::parse();
    let command = cli.command.unwrap_or(Commands::Chat);

    let loaded = Config::load();
    let config_level = loaded
        .as_ref()
        .ok()
        .and_then(|config| config.log_level.clone());

    let (target, default_level) = match (&command, cli.log_file) {
        (_, Some(path)) => (LogTarget::File(path), "info"),
        (Commands::Chat, None) => match logging::default_log_path() {
            Some(path) => (LogTarget::File(path), "info"),
            None => (LogTarget::Stderr, "error"),
        },
        _ => (LogTarget::Stderr, "warn"),
    };
    let level = config_level.as_deref().unwrap_or(default_level);
    // Stderr would draw over the chat screen
    let stderr = LogTarget::Stderr;
    let fallback = match command {
        Commands::Chat => None,
        _ => Some(&stderr),
    };
    let _log_guard = logging::init_or_fallback(&target, fallback, level);

    let config = match loaded {
        Ok(config) => config,
        Err(e) => {
            warn!("ignoring unusable config: {}", e);
            Config::new()
        }
    };

    match command {
        Commands::SetKey { key } => set_key(&key),
        Commands::Ask { question } => ask(&config, &question.join(" ")).await,
        Commands::Chat => run_chat(&config).await,
    }
}

fn build_controller(config: &Config) -> (TurnController, Option<config::KeySource>) {
    let credential = config::load_credential(config);
    let key_source = credential.as_ref().map(|c| c.source());
    let controller =
        TurnController::from_credential(credential.as_ref(), config.request_timeout());
    (controller, key_source)
}

fn set_key(key: &str) -> Result<ExitCode> {
    if key.trim().is_empty() {
        bail!("A chave da API não pode ser vazia.");
    }

    let mut config = Config::load_or_default();
    config.groq_api_key = Some(key.trim().to_string());
    config.save()?;

    let path = Config::config_path()?;
    info!("api key stored in {}", path.display());
    println!("Chave salva em {}", path.display());
    Ok(ExitCode::SUCCESS)
}

async fn ask(config: &Config, question: &str) -> Result<ExitCode> {
    let (controller, _) = build_controller(config);
    if let Some(e) = controller.startup_diagnostic() {
        eprintln!("{}", e);
    }

    let mut conversation = Conversation::new();
    let outcome = match controller.submit(&mut conversation, question).await {
        Ok(outcome) => outcome,
        Err(e) => bail!("Pergunta inválida: {}", e),
    };

    if let Some(reply) = conversation.last() {
        println!("{}", reply.content());
    }

    Ok(if outcome.is_answered() {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    })
}

async fn run_chat(config: &Config) -> Result<ExitCode> {
    let (controller, key_source) = build_controller(config);
    info!(
        "starting chat (client {})",
        if controller.is_degraded() { "unavailable" } else { "ready" }
    );

    tui::install_panic_hook();
    let mut terminal = tui::init()?;
    let mut events = tui::EventHandler::new();
    let mut app = App::new(controller, key_source);

    let result = run_loop(&mut terminal, &mut events, &mut app).await;

    tui::restore()?;
    result?;
    info!("chat closed after {} messages", app.conversation.len());
    Ok(ExitCode::SUCCESS)
}

async fn run_loop(
    terminal: &mut tui::Tui,
    events: &mut tui::EventHandler,
    app: &mut App,
) -> Result<()> {
    while !app.should_quit {
        terminal.draw(|frame| ui::render(app, frame))?;

        match events.next().await {
            Some(event) => handler::handle_event(app, event)?,
            None => break,
        }

        app.poll_turn().await;
    }
    Ok(())
}
