//! # Command-Line Interface Module
//!
//! Clap definitions for Moodtune. Each subcommand is one user intent that
//! gets turned into state-machine events in `main`.
//!
//! ## Examples
//!
//! ```bash
//! moodtune pick happy
//! moodtune scan ~/selfie.jpg
//! moodtune history
//! moodtune rate "Walking on Sunshine" "Katrina and the Waves" 5
//! moodtune session
//! ```

use crate::app::StaleResultPolicy;
use crate::client::{DEFAULT_ENDPOINT, DEFAULT_MODEL, DEFAULT_TIMEOUT_SECS};
use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

/// Shell types supported for completion generation
#[derive(Copy, Clone, PartialEq, Eq, PartialOrd, Ord, ValueEnum, Debug)]
pub enum Shell {
    Bash,
    Zsh,
    Fish,
    PowerShell,
    Elvish,
}

/// Argument to `theme`
#[derive(Copy, Clone, PartialEq, Eq, ValueEnum, Debug)]
pub enum ThemeChoice {
    Light,
    Dark,
    Toggle,
}

/// Main application arguments structure.
#[derive(Parser, Debug)]
#[command(name = "moodtune")]
#[command(about = "Moodtune: song recommendations for how you feel, from a mood or a photo")]
#[command(version)]
pub struct Args {
    /// Directory for the store database (defaults to the platform data dir)
    #[arg(long, global = true, value_hint = clap::ValueHint::DirPath)]
    pub data_dir: Option<PathBuf>,

    /// Keep history, ratings and theme in memory only
    #[arg(long, global = true)]
    pub ephemeral: bool,

    /// Gemini API key
    #[arg(long, global = true, env = "GEMINI_API_KEY", hide_env_values = true)]
    pub api_key: Option<String>,

    /// Gemini model name
    #[arg(long, global = true, env = "MOODTUNE_MODEL", default_value = DEFAULT_MODEL)]
    pub model: String,

    /// Base URL of the generative language API
    #[arg(long, global = true, env = "MOODTUNE_ENDPOINT", default_value = DEFAULT_ENDPOINT)]
    pub endpoint: String,

    /// Request timeout in seconds
    #[arg(long, global = true, default_value_t = DEFAULT_TIMEOUT_SECS)]
    pub timeout: u64,

    /// What to do with results that arrive after you navigated away
    #[arg(long, global = true, value_enum, default_value_t = StaleResultPolicy::Discard)]
    pub stale_results: StaleResultPolicy,

    /// The subcommand to execute
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// List the moods you can pick
    Moods,

    /// Get songs for a mood from the catalog
    Pick {
        /// Mood name, case-insensitive (see `moodtune moods`)
        #[arg(value_hint = clap::ValueHint::Other)]
        mood: String,
    },

    /// Detect your mood from a photo and get songs for it
    Scan {
        /// Photo of your face (jpg, png, webp or gif)
        #[arg(value_hint = clap::ValueHint::FilePath)]
        image: PathBuf,
    },

    /// Show past recommendation sessions, newest first
    History,

    /// Show the songs of a past session again, without asking the service
    Replay {
        /// History item id, as printed by `moodtune history`
        id: String,
    },

    /// Rate a song from 1 to 5 stars, or 0 to clear the rating
    Rate {
        title: String,
        artist: String,
        #[arg(value_parser = clap::value_parser!(u8).range(0..=5))]
        rating: u8,
    },

    /// Delete all history (ratings are kept)
    ClearHistory {
        /// Do not ask for confirmation
        #[arg(short, long)]
        yes: bool,
    },

    /// Show or change the theme
    Theme {
        #[arg(value_enum)]
        choice: Option<ThemeChoice>,
    },

    /// Interactive session
    Session,

    /// Generate shell completions
    ///
    /// Usage: moodtune completion bash > ~/.local/share/bash-completion/completions/moodtune
    Completion {
        shell: Shell,
    },

    /// List mood names for completion (hidden command)
    #[command(hide = true)]
    CompleteMoods,
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition_is_valid() {
        Args::command().debug_assert();
    }

    #[test]
    fn test_parse_pick_with_globals() {
        let args = Args::try_parse_from([
            "moodtune",
            "pick",
            "happy",
            "--ephemeral",
            "--stale-results",
            "apply",
            "--api-key",
            "k",
        ])
        .unwrap();
        assert!(args.ephemeral);
        assert_eq!(args.stale_results, StaleResultPolicy::Apply);
        assert_eq!(args.api_key.as_deref(), Some("k"));
        assert!(matches!(args.command, Command::Pick { ref mood } if mood == "happy"));
    }

    #[test]
    fn test_rate_rejects_out_of_range() {
        assert!(Args::try_parse_from(["moodtune", "rate", "T", "A", "6"]).is_err());
        assert!(Args::try_parse_from(["moodtune", "rate", "T", "A", "0"]).is_ok());
    }
}
