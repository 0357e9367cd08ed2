//! The fixed mood catalog.
//!
//! Moods are picked by the user or detected from a photo. A detected label
//! that is not in the catalog still becomes a [`Mood`], with the default emoji.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Emoji used for moods that are not in the catalog.
pub const DEFAULT_EMOJI: &str = "🎵";

/// A named emotional category with its emoji.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Mood {
    pub name: String,
    pub emoji: String,
}

impl Mood {
    pub fn new(name: impl Into<String>, emoji: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            emoji: emoji.into(),
        }
    }
}

impl std::fmt::Display for Mood {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} {}", self.emoji, self.name)
    }
}

/// (name, emoji) pairs, in display order.
pub const MOODS: [(&str, &str); 16] = [
    ("Happy", "😄"),
    ("Sad", "😢"),
    ("Energetic", "⚡️"),
    ("Calm", "😌"),
    ("Romantic", "🥰"),
    ("Party", "🥳"),
    ("Angry", "😠"),
    ("Focused", "🤔"),
    ("Relaxed", "🧘"),
    ("Hopeful", "🙏"),
    ("Silly", "🤪"),
    ("Melancholic", "🌧️"),
    ("Surprised", "😮"),
    ("Anxious", "😥"),
    ("Loved", "❤️"),
    ("Confident", "😎"),
];

lazy_static::lazy_static! {
    /// Lowercase name -> catalog index
    static ref MOOD_INDEX: HashMap<String, usize> = MOODS
        .iter()
        .enumerate()
        .map(|(i, (name, _))| (name.to_lowercase(), i))
        .collect();
}

/// Every catalog entry as an owned [`Mood`].
pub fn catalog() -> Vec<Mood> {
    MOODS.iter().map(|(name, emoji)| Mood::new(*name, *emoji)).collect()
}

/// Catalog names, for completions and help text.
pub fn catalog_names() -> Vec<&'static str> {
    MOODS.iter().map(|(name, _)| *name).collect()
}

/// Case-insensitive catalog lookup.
pub fn find_mood(name: &str) -> Option<Mood> {
    let key = name.trim().to_lowercase();
    MOOD_INDEX.get(&key).map(|&i| {
        let (name, emoji) = MOODS[i];
        Mood::new(name, emoji)
    })
}

/// Catalog entry for `label`, or a synthesized mood with [`DEFAULT_EMOJI`].
pub fn resolve_mood(label: &str) -> Mood {
    if let Some(mood) = find_mood(label) {
        return mood;
    }

    let label = label.trim().to_lowercase();
    let mut chars = label.chars();
    let name = match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    };
    log::debug!("Mood `{name}' not in catalog, using default emoji");
    Mood::new(name, DEFAULT_EMOJI)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_catalog_has_unique_names() {
        let names = catalog_names();
        assert_eq!(names.len(), 16);
        assert_eq!(MOOD_INDEX.len(), names.len());
    }

    #[test]
    fn test_find_mood_ignores_case_and_whitespace() {
        let mood = find_mood("  hAPPy\n").expect("Happy is in the catalog");
        assert_eq!(mood, Mood::new("Happy", "😄"));
        assert!(find_mood("Bored").is_none());
    }

    #[test]
    fn test_resolve_mood_falls_back_to_default_emoji() {
        let mood = resolve_mood("NOSTALGIC");
        assert_eq!(mood.name, "Nostalgic");
        assert_eq!(mood.emoji, DEFAULT_EMOJI);

        assert_eq!(resolve_mood("calm"), Mood::new("Calm", "😌"));
    }
}
