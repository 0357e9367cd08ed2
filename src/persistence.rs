//! History, ratings and theme on top of a [`KeyValueStore`].
//!
//! Storage failures never escape this module. They are logged and degrade to
//! empty or default values, so the app keeps working without persisted state.

use crate::error::{RatingError, StorageError};
use crate::song::{validate_rating, HistoryItem, Song, SongKey, MAX_RATING};
use crate::store::{KeyValueStore, HISTORY_KEY, RATINGS_KEY, THEME_KEY};
use crate::theme::Theme;
use log::{debug, error, warn};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashSet};

/// Song identity -> rating 1..=5. Absent means unrated.
pub type RatingsTable = BTreeMap<SongKey, u8>;

/// One row of the stored ratings list.
#[derive(Debug, Serialize, Deserialize)]
struct StoredRating {
    title: String,
    artist: String,
    rating: u8,
}

pub struct Persistence<S: KeyValueStore> {
    store: S,
    history: Vec<HistoryItem>,
}

impl<S: KeyValueStore> Persistence<S> {
    /// Wrap `store` and load the history from it.
    pub fn new(store: S) -> Self {
        let mut persistence = Self {
            store,
            history: Vec::new(),
        };
        persistence.load_history();
        persistence
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    /// Newest-first in-memory history.
    pub fn history(&self) -> &[HistoryItem] {
        &self.history
    }

    pub fn find_history_item(&self, id: &str) -> Option<&HistoryItem> {
        self.history.iter().find(|item| item.id == id)
    }

    /// Reload history from storage, joining every song against the current
    /// ratings table.
    pub fn load_history(&mut self) -> &[HistoryItem] {
        let mut items: Vec<HistoryItem> = self.read_json(HISTORY_KEY).unwrap_or_default();

        let mut seen = HashSet::new();
        items.retain(|item| seen.insert(item.id.clone()));
        items.sort_by(|a, b| b.timestamp.cmp(&a.timestamp));

        let ratings = self.ratings();
        for item in &mut items {
            apply_ratings(&mut item.songs, &ratings);
        }

        debug!("Loaded {} history items", items.len());
        self.history = items;
        &self.history
    }

    /// Prepend `item` and persist the whole list.
    ///
    /// On a storage failure the in-memory list is kept as is.
    pub fn save_history_item(&mut self, item: HistoryItem) {
        self.history.retain(|existing| existing.id != item.id);
        self.history.insert(0, item);
        self.persist_history();
    }

    /// Empty history in memory and in storage. Does nothing unless the user
    /// `confirmed`. Ratings are left alone.
    pub fn clear_history(&mut self, confirmed: bool) -> bool {
        if !confirmed {
            debug!("History clear not confirmed");
            return false;
        }

        self.history.clear();
        if let Err(e) = self.store.remove(HISTORY_KEY) {
            error!("Failed to clear stored history: {e}");
        }
        true
    }

    /// The full ratings table; empty when missing or corrupt.
    pub fn ratings(&self) -> RatingsTable {
        let rows: Vec<StoredRating> = self.read_json(RATINGS_KEY).unwrap_or_default();
        rows.into_iter()
            .filter(|row| (1..=MAX_RATING).contains(&row.rating))
            .map(|row| (SongKey::new(&row.title, &row.artist), row.rating))
            .collect()
    }

    /// 0 when the song is unrated.
    pub fn get_rating(&self, song: &Song) -> u8 {
        self.ratings().get(&song.key()).copied().unwrap_or(0)
    }

    /// Store `rating` for `song` (0 removes it), then update every history
    /// entry holding the same song and persist history.
    pub fn set_rating(&mut self, song: &Song, rating: u8) -> Result<(), RatingError> {
        let rating = validate_rating(rating)?;
        let key = song.key();

        let mut table = self.ratings();
        if rating == 0 {
            table.remove(&key);
        } else {
            table.insert(key.clone(), rating);
        }
        let rows: Vec<StoredRating> = table
            .iter()
            .map(|(key, &rating)| StoredRating {
                title: key.title().to_string(),
                artist: key.artist().to_string(),
                rating,
            })
            .collect();
        if let Err(e) = write_json(&mut self.store, RATINGS_KEY, &rows) {
            error!("Failed to save ratings: {e}");
        }

        let mut touched = 0usize;
        for item in &mut self.history {
            touched += set_song_rating(&mut item.songs, &key, rating);
        }
        debug!("Rated `{key}' {rating}, updated {touched} history songs");
        self.persist_history();
        Ok(())
    }

    /// Stored theme, else the system preference.
    pub fn get_theme(&self) -> Theme {
        match self.store.get(THEME_KEY) {
            Ok(Some(value)) => value.parse().unwrap_or_else(|e| {
                warn!("Ignoring stored theme: {e}");
                Theme::system_preference()
            }),
            Ok(None) => Theme::system_preference(),
            Err(e) => {
                error!("Failed to read theme: {e}");
                Theme::system_preference()
            }
        }
    }

    pub fn set_theme(&mut self, theme: Theme) {
        if let Err(e) = self.store.set(THEME_KEY, theme.as_str()) {
            error!("Failed to save theme: {e}");
        }
    }

    pub fn toggle_theme(&mut self) -> Theme {
        let theme = self.get_theme().toggled();
        self.set_theme(theme);
        theme
    }

    fn persist_history(&mut self) {
        if let Err(e) = write_json(&mut self.store, HISTORY_KEY, &self.history) {
            error!("Failed to save history, keeping it in memory: {e}");
        }
    }

    /// Missing, unreadable and malformed values all read as `None`.
    fn read_json<T: serde::de::DeserializeOwned>(&self, key: &str) -> Option<T> {
        let raw = match self.store.get(key) {
            Ok(raw) => raw?,
            Err(e) => {
                error!("Failed to read `{key}': {e}");
                return None;
            }
        };

        match serde_json::from_str(&raw) {
            Ok(value) => Some(value),
            Err(e) => {
                warn!("Ignoring malformed `{key}': {e}");
                None
            }
        }
    }
}

fn write_json<S, T>(store: &mut S, key: &str, value: &T) -> Result<(), StorageError>
where
    S: KeyValueStore,
    T: Serialize,
{
    let raw = serde_json::to_string(value)?;
    store.set(key, &raw)
}

/// Join `songs` against `ratings`; unrated songs get `None`.
pub fn apply_ratings(songs: &mut [Song], ratings: &RatingsTable) {
    for song in songs {
        song.rating = ratings.get(&song.key()).copied();
    }
}

/// Set the rating of every song matching `key`. Returns how many matched.
pub fn set_song_rating(songs: &mut [Song], key: &SongKey, rating: u8) -> usize {
    let mut count = 0;
    for song in songs.iter_mut().filter(|song| &song.key() == key) {
        song.rating = (rating > 0).then_some(rating);
        count += 1;
    }
    count
}
