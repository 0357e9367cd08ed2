//! Interactive session: a line-oriented front end for the state machine.
//!
//! Reads commands from any `AsyncBufRead` and writes the rendered view after
//! each one. Client calls run alongside input, so `b` or `x` typed while the
//! loader is up takes effect before the answer comes back.

use crate::app::{run_request, App, Event, View};
use crate::camera::capture_from_file;
use crate::client::RecommendationClient;
use crate::mood::catalog;
use crate::render::render;
use crate::store::KeyValueStore;
use anyhow::{Context, Result};
use futures_util::future::{BoxFuture, FutureExt};
use futures_util::stream::{FuturesUnordered, StreamExt};
use std::io::Write;
use std::path::Path;
use tokio::io::{AsyncBufRead, AsyncBufReadExt};

pub const HELP: &str = "\
Commands:
  <1-16>          pick a mood
  c [photo]       open the camera (then give a photo path)
  h               history
  o <n>           open the n-th history item
  r <n> <0-5>     rate the n-th song
  b               back (closes the camera)
  d               dismiss the error message
  x               start over
  t               toggle theme
  ?               this help
  q               quit
";

/// One parsed input line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    PickMood(usize),
    Camera(Option<String>),
    CloseCamera,
    Photo(String),
    History,
    OpenHistoryItem(usize),
    Rate { index: usize, rating: u8 },
    Back,
    Dismiss,
    Reset,
    ToggleTheme,
    Help,
    Quit,
    Unknown(String),
}

/// Parse `line` in the context of `view`. In the camera view anything that is
/// not a command is a photo path.
pub fn parse_command(line: &str, view: View) -> Option<Command> {
    let line = line.trim();
    if line.is_empty() {
        return None;
    }

    let mut parts = line.split_whitespace();
    let head = parts.next()?;
    let rest: Vec<&str> = parts.collect();

    let command = match (head, rest.as_slice()) {
        ("q" | "quit", []) => Command::Quit,
        ("?" | "help", []) => Command::Help,
        ("b" | "back", []) if view == View::Camera => Command::CloseCamera,
        ("b" | "back", []) => Command::Back,
        ("d" | "dismiss", []) => Command::Dismiss,
        ("x" | "reset", []) => Command::Reset,
        ("t" | "theme", []) => Command::ToggleTheme,
        ("h" | "history", []) => Command::History,
        ("c" | "camera", []) => Command::Camera(None),
        ("c" | "camera", _) => Command::Camera(Some(line[head.len()..].trim().to_string())),
        ("o", [n]) => match n.parse() {
            Ok(n) => Command::OpenHistoryItem(n),
            Err(_) => Command::Unknown(line.to_string()),
        },
        ("r", [n, rating]) => match (n.parse(), rating.parse()) {
            (Ok(index), Ok(rating)) => Command::Rate { index, rating },
            _ => Command::Unknown(line.to_string()),
        },
        _ if view == View::Camera => Command::Photo(line.to_string()),
        (n, []) => match n.parse() {
            Ok(n) => Command::PickMood(n),
            Err(_) => Command::Unknown(line.to_string()),
        },
        _ => Command::Unknown(line.to_string()),
    };
    Some(command)
}

/// Client calls still out, each resolving to its outcome event.
type Pending = FuturesUnordered<BoxFuture<'static, Option<Event>>>;

enum Step {
    Redraw,
    Quiet,
    Quit,
}

/// Run until `q` or end of input. At end of input, calls still out are
/// awaited and their outcomes shown.
pub async fn run<S, C, R, W>(app: &mut App<S, C>, input: R, mut output: W) -> Result<()>
where
    S: KeyValueStore,
    C: RecommendationClient + 'static,
    R: AsyncBufRead + Unpin,
    W: Write,
{
    write_screen(app, &mut output)?;
    writeln!(output, "Type ? for help.")?;

    let mut lines = input.lines();
    let mut pending = Pending::new();

    loop {
        tokio::select! {
            biased;

            Some(outcome) = pending.next(), if !pending.is_empty() => {
                if let Some(event) = outcome {
                    send(app, &mut pending, event);
                    write_screen(app, &mut output)?;
                }
            }
            line = lines.next_line() => {
                let Some(line) = line.context("Failed to read input")? else {
                    break;
                };
                match execute(app, &mut pending, &line, &mut output).await? {
                    Step::Redraw => write_screen(app, &mut output)?,
                    Step::Quiet => {}
                    Step::Quit => return Ok(()),
                }
            }
        }
    }

    while let Some(outcome) = pending.next().await {
        if let Some(event) = outcome {
            send(app, &mut pending, event);
            write_screen(app, &mut output)?;
        }
    }
    Ok(())
}

/// Apply `event` and start any client calls it asks for.
fn send<S, C>(app: &mut App<S, C>, pending: &mut Pending, event: Event)
where
    S: KeyValueStore,
    C: RecommendationClient + 'static,
{
    for effect in app.handle(event) {
        let client = app.client();
        pending.push(async move { run_request(client.as_ref(), effect).await }.boxed());
    }
}

async fn execute<S, C, W>(
    app: &mut App<S, C>,
    pending: &mut Pending,
    line: &str,
    output: &mut W,
) -> Result<Step>
where
    S: KeyValueStore,
    C: RecommendationClient + 'static,
    W: Write,
{
    let Some(command) = parse_command(line, app.state().view) else {
        return Ok(Step::Quiet);
    };
    log::debug!("Session command: {command:?}");

    match command {
        Command::Quit => return Ok(Step::Quit),
        Command::Help => {
            write!(output, "{HELP}")?;
            return Ok(Step::Quiet);
        }
        Command::Unknown(text) => {
            writeln!(output, "Unknown command `{text}'. Type ? for help.")?;
            return Ok(Step::Quiet);
        }
        Command::PickMood(n) => match catalog().into_iter().nth(n.wrapping_sub(1)) {
            Some(mood) => send(app, pending, Event::SelectMood(mood)),
            None => {
                writeln!(output, "Pick a mood between 1 and 16.")?;
                return Ok(Step::Quiet);
            }
        },
        Command::Camera(path) => {
            send(app, pending, Event::OpenCamera);
            if let Some(path) = path {
                take_photo(app, pending, &path);
            }
        }
        Command::CloseCamera => send(app, pending, Event::CloseCamera),
        Command::Photo(path) => take_photo(app, pending, &path),
        Command::History => send(app, pending, Event::OpenHistory),
        Command::OpenHistoryItem(n) => {
            let id = app
                .persistence()
                .history()
                .get(n.wrapping_sub(1))
                .map(|item| item.id.clone());
            match id {
                Some(id) => {
                    app.replay(&id).await;
                }
                None => {
                    writeln!(output, "No history item {n}.")?;
                    return Ok(Step::Quiet);
                }
            }
        }
        Command::Rate { index, rating } => {
            let song = app.state().songs.get(index.wrapping_sub(1)).cloned();
            match song {
                Some(song) => {
                    if let Err(e) = app.rate(&song, rating) {
                        writeln!(output, "{e}")?;
                        return Ok(Step::Quiet);
                    }
                }
                None => {
                    writeln!(output, "No song {index} on screen.")?;
                    return Ok(Step::Quiet);
                }
            }
        }
        Command::Back => send(app, pending, Event::Back),
        Command::Dismiss => send(app, pending, Event::DismissError),
        Command::Reset => send(app, pending, Event::Reset),
        Command::ToggleTheme => {
            app.persistence_mut().toggle_theme();
        }
    }

    Ok(Step::Redraw)
}

fn take_photo<S, C>(app: &mut App<S, C>, pending: &mut Pending, path: &str)
where
    S: KeyValueStore,
    C: RecommendationClient + 'static,
{
    let event = match capture_from_file(Path::new(path)) {
        Ok(image) => Event::ImageCaptured(image),
        Err(e) => Event::CaptureFailed(e.to_string()),
    };
    send(app, pending, event);
}

fn write_screen<S: KeyValueStore, C: RecommendationClient, W: Write>(
    app: &App<S, C>,
    output: &mut W,
) -> Result<()> {
    let persistence = app.persistence();
    let screen = render(app.state(), persistence.history(), persistence.get_theme());
    writeln!(output, "{screen}")?;
    Ok(())
}
