//! Recommended songs and the history items they are saved in.

use crate::error::RatingError;
use crate::mood::Mood;
use serde::{Deserialize, Serialize};

/// Highest star rating.
pub const MAX_RATING: u8 = 5;

/// One recommended song.
///
/// `rating` is a view of the ratings table, joined in on load. The table is
/// the source of truth; the copy stored with a history item is only a
/// snapshot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Song {
    pub title: String,
    pub artist: String,
    #[serde(default)]
    pub language: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub link: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rating: Option<u8>,
}

impl Song {
    pub fn new(title: impl Into<String>, artist: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            artist: artist.into(),
            language: String::new(),
            link: None,
            rating: None,
        }
    }

    #[must_use]
    pub fn with_language(mut self, language: impl Into<String>) -> Self {
        self.language = language.into();
        self
    }

    pub fn key(&self) -> SongKey {
        SongKey::new(&self.title, &self.artist)
    }

    /// Rating with "unrated" as 0.
    pub fn stars(&self) -> u8 {
        self.rating.unwrap_or(0)
    }
}

/// Case-insensitive song identity: the join key for ratings.
///
/// Title and artist stay separate fields everywhere, including storage, so
/// no pair of songs can share a key.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SongKey {
    title: String,
    artist: String,
}

impl SongKey {
    pub fn new(title: &str, artist: &str) -> Self {
        Self {
            title: title.to_lowercase(),
            artist: artist.to_lowercase(),
        }
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn artist(&self) -> &str {
        &self.artist
    }
}

impl std::fmt::Display for SongKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:?} by {:?}", self.title, self.artist)
    }
}

/// Reject ratings above [`MAX_RATING`].
pub fn validate_rating(rating: u8) -> Result<u8, RatingError> {
    if rating > MAX_RATING {
        return Err(RatingError(rating));
    }
    Ok(rating)
}

/// A saved recommendation session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HistoryItem {
    pub id: String,
    pub mood: Mood,
    pub songs: Vec<Song>,
    /// Milliseconds since the Unix epoch
    pub timestamp: i64,
}

impl HistoryItem {
    /// The id is derived from the timestamp.
    pub fn new(mood: Mood, songs: Vec<Song>, timestamp: i64) -> Self {
        Self {
            id: timestamp.to_string(),
            mood,
            songs,
            timestamp,
        }
    }
}
