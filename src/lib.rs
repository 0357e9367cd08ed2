//! Mood-to-music recommendations.
//!
//! Core modules:
//! - [`app`] - View-state machine (reducer) and its async driver
//! - [`client`] - Recommendation client for the Gemini API
//! - [`persistence`] - History, ratings and theme over a key-value store
//! - [`mood`] - The fixed mood catalog
//!
//! ### Supporting Modules
//!
//! - [`song`] - Song, song identity and history item models
//! - [`store`] - Key-value store capability and the in-memory store
//! - [`db`] - SQLite-backed key-value store
//! - [`camera`] - Photo capture from an image file
//! - [`theme`] - Light/dark preference
//! - [`render`] - Text renderers for each view
//! - [`session`] - Interactive line-oriented front end
//! - [`config`] - Data directory and runtime configuration
//! - [`cli`] - Command-line interface definitions with clap
//! - [`completion`] - Shell completion generation
//! - [`error`] - Typed errors for the component seams
//!
//! ## Quick Start Example
//!
//! ```no_run
//! use moodtune::app::{App, Event, StaleResultPolicy, View};
//! use moodtune::client::{GeminiClient, GeminiConfig};
//! use moodtune::store::MemoryStore;
//!
//! # async fn demo() -> anyhow::Result<()> {
//! let client = GeminiClient::new(GeminiConfig {
//!     api_key: Some("your-key".to_string()),
//!     ..GeminiConfig::default()
//! })?;
//! let mut app = App::new(MemoryStore::new(), client, StaleResultPolicy::Discard);
//!
//! let mood = moodtune::mood::find_mood("happy").expect("in the catalog");
//! let state = app.dispatch(Event::SelectMood(mood)).await;
//! if state.view == View::Results {
//!     for song in &state.songs {
//!         println!("{} by {}", song.title, song.artist);
//!     }
//! }
//! # Ok(())
//! # }
//! ```
//!
//! ## Error Handling
//!
//! Recommendation failures never escape the state machine: they land the
//! user on Home with a fixed message. Storage failures never escape
//! [`persistence`]: they are logged and read as empty or default values.
//! Setup code (`config`, [`db::SqliteStore::open`]) returns
//! `anyhow::Result`.

pub mod app;
pub mod camera;
pub mod cli;
pub mod client;
pub mod completion;
pub mod config;
pub mod db;
pub mod error;
pub mod mood;
pub mod persistence;
pub mod render;
pub mod session;
pub mod song;
pub mod store;
pub mod theme;
