//! Text renderers for each view.
//!
//! Everything here is a pure function from state to a `String`; printing is
//! left to the caller.

use crate::app::{AppState, View, ANALYZING_MESSAGE};
use crate::mood::{Mood, MOODS};
use crate::song::{HistoryItem, Song, MAX_RATING};
use crate::theme::Theme;
use chrono::{DateTime, Local};
use std::fmt::Write as _;

const SELECTOR_COLUMNS: usize = 4;

/// Render whatever the current view is.
pub fn render(state: &AppState, history: &[HistoryItem], theme: Theme) -> String {
    let mut out = render_header(theme);

    match state.view {
        View::Home => {
            if let Some(error) = &state.error {
                out.push_str(&render_error(error));
                out.push('\n');
            }
            out.push_str(&render_mood_selector());
        }
        View::Camera => out.push_str(&render_camera()),
        View::Loading => out.push_str(&render_loader(
            state.loading_message.as_deref().unwrap_or(ANALYZING_MESSAGE),
        )),
        View::Results => out.push_str(&render_song_list(state.mood.as_ref(), &state.songs)),
        View::History => out.push_str(&render_history(history)),
    }

    out
}

pub fn render_header(theme: Theme) -> String {
    let badge = match theme {
        Theme::Light => "☀️ light",
        Theme::Dark => "🌙 dark",
    };
    format!("🎧 Moodtune  [{badge}]\n\n")
}

/// Numbered grid of catalog moods.
pub fn render_mood_selector() -> String {
    let mut out = String::from("How are you feeling?\n");
    for (i, (name, emoji)) in MOODS.iter().enumerate() {
        let _ = write!(out, "{:>3}. {emoji} {name:<13}", i + 1);
        if (i + 1) % SELECTOR_COLUMNS == 0 {
            out.push('\n');
        }
    }
    if MOODS.len() % SELECTOR_COLUMNS != 0 {
        out.push('\n');
    }
    out
}

pub fn render_camera() -> String {
    "📷 Scan your face expression: give the path of a photo (jpg, png, webp or gif).\n"
        .to_string()
}

pub fn render_loader(message: &str) -> String {
    format!("⏳ {message}\n")
}

pub fn render_error(message: &str) -> String {
    format!("⚠️  Oops! Something went wrong.\n    {message}\n")
}

/// "★★★☆☆" for 3.
pub fn stars(rating: u8) -> String {
    let filled = usize::from(rating.min(MAX_RATING));
    let empty = usize::from(MAX_RATING) - filled;
    format!("{}{}", "★".repeat(filled), "☆".repeat(empty))
}

pub fn render_song(index: usize, song: &Song) -> String {
    let mut line = format!("{:>3}. {} by {}", index + 1, song.title, song.artist);
    match (&song.link, song.language.is_empty()) {
        (Some(link), _) => {
            let _ = write!(line, " <{link}>");
        }
        (None, false) => {
            let _ = write!(line, " ({})", song.language);
        }
        (None, true) => {}
    }
    let _ = write!(line, "  {}", stars(song.stars()));
    line
}

pub fn render_song_list(mood: Option<&Mood>, songs: &[Song]) -> String {
    let mut out = match mood {
        Some(mood) => format!("Songs for when you feel {mood}\n"),
        None => "Your songs\n".to_string(),
    };
    if songs.is_empty() {
        out.push_str("  No songs.\n");
    }
    for (i, song) in songs.iter().enumerate() {
        out.push_str(&render_song(i, song));
        out.push('\n');
    }
    out
}

/// Newest first, as stored.
pub fn render_history(history: &[HistoryItem]) -> String {
    if history.is_empty() {
        return "No history yet. Pick a mood to get started.\n".to_string();
    }

    let mut out = String::from("Your mood history\n");
    for (i, item) in history.iter().enumerate() {
        let _ = writeln!(
            out,
            "{:>3}. {}  {}  {} songs  [{}]",
            i + 1,
            format_timestamp(item.timestamp),
            item.mood,
            item.songs.len(),
            item.id
        );
    }
    out
}

/// Local date and time for a millisecond timestamp.
pub fn format_timestamp(millis: i64) -> String {
    DateTime::from_timestamp_millis(millis)
        .map(|utc| utc.with_timezone(&Local).format("%Y-%m-%d %H:%M").to_string())
        .unwrap_or_else(|| "unknown time".to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::app::Event;

    #[test]
    fn test_stars() {
        assert_eq!(stars(0), "☆☆☆☆☆");
        assert_eq!(stars(3), "★★★☆☆");
        assert_eq!(stars(9), "★★★★★");
    }

    #[test]
    fn test_selector_lists_every_mood() {
        let selector = render_mood_selector();
        for (name, _) in MOODS {
            assert!(selector.contains(name), "{name} missing");
        }
        assert!(selector.contains(" 16. "));
    }

    #[test]
    fn test_song_line_prefers_link() {
        let mut song = Song::new("Clocks", "Coldplay").with_language("English");
        assert!(render_song(0, &song).contains("(English)"));

        song.link = Some("https://example.com".to_string());
        song.rating = Some(2);
        let line = render_song(0, &song);
        assert!(line.contains("<https://example.com>"));
        assert!(line.ends_with("★★☆☆☆"));
    }

    #[test]
    fn test_home_view_shows_error_banner() {
        let mut state = AppState::default();
        state.apply(Event::OpenCamera);
        state.apply(Event::CaptureFailed("denied".to_string()));

        let screen = render(&state, &[], Theme::Dark);
        assert!(screen.contains("Something went wrong"));
        assert!(screen.contains("How are you feeling?"));
        assert!(screen.contains("dark"));
    }

    #[test]
    fn test_history_rendering() {
        assert!(render_history(&[]).contains("No history yet"));

        let item = HistoryItem::new(
            Mood::new("Calm", "😌"),
            vec![Song::new("Weightless", "Marconi Union")],
            1_700_000_000_000,
        );
        let out = render_history(&[item]);
        assert!(out.contains("😌 Calm"));
        assert!(out.contains("1 songs"));
        assert!(out.contains("[1700000000000]"));
    }
}
