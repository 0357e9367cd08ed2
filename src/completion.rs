//! # Shell Completion Module
//!
//! Completion scripts through `clap_complete`, plus the mood-name list used
//! for dynamic completion of `moodtune pick`.
//!
//! ```bash
//! moodtune completion bash > ~/.local/share/bash-completion/completions/moodtune
//! moodtune completion zsh > ~/.config/zsh/completions/_moodtune
//! ```

use crate::mood::catalog_names;
use clap::Command;
use clap_complete::{generate, Generator, Shell as CompletionShell};
use std::io;

/// Generate shell completions for the given shell
pub fn generate_completions<G: Generator>(gen: G, cmd: &mut Command) {
    generate(gen, cmd, cmd.get_name().to_string(), &mut io::stdout());
}

pub fn shell_to_completion_shell(shell: &crate::cli::Shell) -> CompletionShell {
    match shell {
        crate::cli::Shell::Bash => CompletionShell::Bash,
        crate::cli::Shell::Zsh => CompletionShell::Zsh,
        crate::cli::Shell::Fish => CompletionShell::Fish,
        crate::cli::Shell::PowerShell => CompletionShell::PowerShell,
        crate::cli::Shell::Elvish => CompletionShell::Elvish,
    }
}

/// Mood names, lowercase, sorted. `pick` matches case-insensitively.
pub fn get_mood_completions() -> Vec<String> {
    let mut names: Vec<String> = catalog_names().iter().map(|n| n.to_lowercase()).collect();
    names.sort();
    names
}

/// Print one mood per line for completion scripts.
pub fn print_mood_completions() {
    for name in get_mood_completions() {
        println!("{name}");
    }
}
