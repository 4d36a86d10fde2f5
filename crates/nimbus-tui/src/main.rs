use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{bail, Result};
use clap::{Parser, Subcommand};
use colored::*;
use nimbus_core::{
    ChatMessage, Config, ExchangeController, HttpBackend, WeatherCategory, UNREACHABLE_NOTICE,
};
use tracing::{info, warn};

mod app;
mod handler;
mod logging;
mod tui;
mod ui;

use app::App;
use tui::{EventHandler, Tui};

#[derive(Parser)]
#[command(name = "nimbus")]
#[command(version)]
#[command(about = "Chat with an AI weather assistant from your terminal")]
struct Cli {
    /// Weather backend base URL (overrides NIMBUS_BACKEND_URL and the config file)
    #[arg(long, global = true)]
    backend_url: Option<String>,

    /// Request timeout in seconds, 0 to wait indefinitely
    #[arg(long, global = true)]
    timeout: Option<u64>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Ask a single weather question and print the answer
    Ask {
        /// Your question, e.g. "weather in Lisbon"
        query: String,
    },
    /// Check that the weather backend is reachable
    Health,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let _log_guard = match cli.command {
        None => Some(logging::init_file()?),
        Some(_) => {
            logging::init_stderr()?;
            None
        }
    };

    let config_path = Config::get_config_path().ok();
    let config = Config::load().unwrap_or_else(|err| {
        warn!(error = %err, "could not load config, using defaults");
        Config::new()
    });

    let backend_url = config.resolve_backend_url(cli.backend_url.as_deref());
    let backend = HttpBackend::new(&backend_url, config.resolve_timeout(cli.timeout))?;

    match cli.command {
        None => run_tui(&config, backend, config_path).await,
        Some(Commands::Ask { query }) => ask(backend, &query).await,
        Some(Commands::Health) => health(&backend).await,
    }
}

async fn run_tui(
    config: &Config,
    backend: HttpBackend,
    config_path: Option<PathBuf>,
) -> Result<()> {
    info!(backend = %backend.base_url(), "starting weather assistant");

    tui::install_panic_hook();
    let mut terminal = tui::init()?;
    let mut app = App::new(config, backend, config_path);

    let result = run(&mut terminal, &mut app).await;

    tui::restore()?;
    info!(messages = app.conversation().len(), "session ended");
    result
}

async fn run(terminal: &mut Tui, app: &mut App) -> Result<()> {
    let mut events = EventHandler::new();

    while !app.should_quit {
        terminal.draw(|frame| ui::render(app, frame))?;

        tokio::select! {
            maybe_event = events.next() => match maybe_event {
                Some(event) => handler::handle_event(app, event).await,
                None => break,
            },
            _ = app.settle_reply(), if app.is_loading() => {}
        }
    }

    Ok(())
}

async fn ask(backend: HttpBackend, query: &str) -> Result<()> {
    let backend_url = backend.base_url().to_string();
    let mut controller = ExchangeController::new(Arc::new(backend));

    println!("🔍 Asking about: {}", query.trim().cyan());

    let Some(reply) = controller.submit(query).await.cloned() else {
        bail!("Nothing to ask: the question is empty");
    };
    let category = controller.session().category();

    print_reply(&reply, category);

    if reply.text == UNREACHABLE_NOTICE {
        println!("Make sure the weather backend is running at {}", backend_url.bold());
    }

    Ok(())
}

fn print_reply(reply: &ChatMessage, category: WeatherCategory) {
    println!(
        "\n{} {}",
        "✦ Assistant".bold().blue(),
        reply.timestamp.format("%H:%M").to_string().dimmed()
    );
    println!("{}", reply.text);

    if let Some(insights) = &reply.insights {
        println!();
        println!("  🌡 {}", insights.temperature);
        println!("  ☔ {}", insights.rain);
        println!("  👕 {}", insights.clothing);
        println!("  🚨 {}", insights.caution);
        println!("  💡 {}", insights.advice.italic());
    }

    println!("\n{} {}", "Weather:".dimmed(), category.display_name().bold().yellow());
}

async fn health(backend: &HttpBackend) -> Result<()> {
    println!("🩺 Checking {}", backend.base_url().cyan());

    match backend.health().await {
        Ok(status) if status.is_healthy() => {
            println!("{} {}", "●".green(), "healthy".bold().green());
            Ok(())
        }
        Ok(status) => {
            println!("{} backend reports: {}", "●".yellow(), status.status.yellow());
            Ok(())
        }
        Err(e) => {
            println!("{}: {}", "Error connecting to weather backend".red(), e);
            bail!("weather backend is unreachable at {}", backend.base_url())
        }
    }
}
