//! # Moodtune
//!
//! Pick a mood, or show a photo of your face, and get songs that fit. Past
//! sessions, song ratings and the theme are kept in a small local store.
//!
//! ## Usage
//!
//! ```bash
//! # Songs for a mood
//! moodtune pick happy
//!
//! # Songs for the mood detected in a photo
//! moodtune scan selfie.jpg
//!
//! # Past sessions and ratings
//! moodtune history
//! moodtune replay 1718000000000
//! moodtune rate "Clocks" "Coldplay" 4
//!
//! # Everything at once
//! moodtune session
//! ```

use anyhow::{bail, Result};
use clap::{CommandFactory, Parser};
use log::{debug, info};
use moodtune::app::{App, Event};
use moodtune::cli::{self, Command, ThemeChoice};
use moodtune::client::{GeminiClient, RecommendationClient};
use moodtune::config::RuntimeConfig;
use moodtune::db::SqliteStore;
use moodtune::store::{KeyValueStore, MemoryStore};
use moodtune::theme::Theme;
use moodtune::{camera, completion, mood, render, session};
use std::io::{self, BufRead, Write};

/// Main entry point for the Moodtune application.
///
/// Initializes logging, parses command-line arguments, builds the app and
/// routes the subcommand to it.
///
/// # Logging
///
/// Controlled via `RUST_LOG`:
/// - `RUST_LOG=debug moodtune pick happy` - Enable debug logging
/// - `RUST_LOG=moodtune::app=debug moodtune session` - State transitions only
#[tokio::main]
async fn main() -> Result<()> {
    env_logger::init();

    let args = cli::Args::parse();

    // Commands that need neither storage nor the network
    match &args.command {
        Command::Completion { shell } => {
            let mut cmd = cli::Args::command();
            completion::generate_completions(completion::shell_to_completion_shell(shell), &mut cmd);
            return Ok(());
        }
        Command::CompleteMoods => {
            completion::print_mood_completions();
            return Ok(());
        }
        Command::Moods => {
            print!("{}", render::render_mood_selector());
            return Ok(());
        }
        _ => {}
    }

    let config = build_config(&args)?;
    debug!("Runtime config: {config:?}");

    let store: Box<dyn KeyValueStore> = if config.ephemeral {
        info!("Using in-memory store");
        Box::new(MemoryStore::new())
    } else {
        info!("Using store at {}", config.store_path().display());
        Box::new(SqliteStore::open(&config.store_path())?)
    };
    let client = GeminiClient::new(config.gemini.clone())?;
    let mut app = App::new(store, client, config.stale_results);

    run_command(&mut app, args.command).await
}

fn build_config(args: &cli::Args) -> Result<RuntimeConfig> {
    let mut config = RuntimeConfig::new(args.data_dir.clone())?;
    config.ephemeral = args.ephemeral;
    config.stale_results = args.stale_results;
    config.gemini.api_key = args.api_key.clone();
    config.gemini.model = args.model.clone();
    config.gemini.endpoint = args.endpoint.clone();
    config.gemini.timeout_secs = args.timeout;
    Ok(config)
}

async fn run_command<S, C>(app: &mut App<S, C>, command: Command) -> Result<()>
where
    S: KeyValueStore,
    C: RecommendationClient + 'static,
{
    match command {
        Command::Pick { mood: name } => {
            let Some(mood) = mood::find_mood(&name) else {
                bail!(
                    "Unknown mood `{name}'. Pick one of: {}",
                    mood::catalog_names().join(", ")
                );
            };
            info!("Picked mood: {mood}");
            app.dispatch(Event::SelectMood(mood)).await;
            show(app);
        }
        Command::Scan { image } => {
            app.dispatch(Event::OpenCamera).await;
            let event = match camera::capture_from_file(&image) {
                Ok(image) => Event::ImageCaptured(image),
                Err(e) => Event::CaptureFailed(e.to_string()),
            };
            app.dispatch(event).await;
            show(app);
        }
        Command::History => {
            app.dispatch(Event::OpenHistory).await;
            show(app);
        }
        Command::Replay { id } => {
            if !app.replay(&id).await {
                bail!("No history item with id {id}. See `moodtune history`.");
            }
            show(app);
        }
        Command::Rate { title, artist, rating } => {
            let song = moodtune::song::Song::new(title, artist);
            app.rate(&song, rating)?;
            println!(
                "{} by {}  {}",
                song.title,
                song.artist,
                render::stars(rating)
            );
        }
        Command::ClearHistory { yes } => {
            let confirmed = yes || confirm("Delete all history? Ratings are kept. [y/N] ")?;
            if app.persistence_mut().clear_history(confirmed) {
                println!("History cleared.");
            } else {
                println!("History kept.");
            }
        }
        Command::Theme { choice } => {
            let persistence = app.persistence_mut();
            let theme = match choice {
                None => persistence.get_theme(),
                Some(ThemeChoice::Toggle) => persistence.toggle_theme(),
                Some(ThemeChoice::Light) => {
                    persistence.set_theme(Theme::Light);
                    Theme::Light
                }
                Some(ThemeChoice::Dark) => {
                    persistence.set_theme(Theme::Dark);
                    Theme::Dark
                }
            };
            println!("{theme}");
        }
        Command::Session => {
            let stdin = tokio::io::BufReader::new(tokio::io::stdin());
            session::run(app, stdin, io::stdout()).await?;
        }
        Command::Moods | Command::Completion { .. } | Command::CompleteMoods => {}
    }

    Ok(())
}

fn show<S: KeyValueStore, C: RecommendationClient>(app: &App<S, C>) {
    let persistence = app.persistence();
    print!(
        "{}",
        render::render(app.state(), persistence.history(), persistence.get_theme())
    );
}

fn confirm(prompt: &str) -> Result<bool> {
    print!("{prompt}");
    io::stdout().flush()?;

    let mut answer = String::new();
    io::stdin().lock().read_line(&mut answer)?;
    Ok(matches!(answer.trim(), "y" | "Y" | "yes"))
}
