//! The view-state machine.
//!
//! [`AppState::apply`] is the only place state changes. It consumes an
//! [`Event`] and returns the [`Effect`]s the caller must run; it does no I/O
//! itself. [`App`] is the driver: it runs effects against the recommendation
//! client and persistence, and feeds their outcomes back in as events.
//! Outcomes may arrive after the user has moved on; [`StaleResultPolicy`]
//! decides what happens to them.
//!
//! ## Views
//!
//! ```text
//! Home ──pick mood──────────────▶ Loading ──ok──▶ Results ──back──▶ Home | History
//!  │                               ▲   └──err──▶ Home + error
//!  └──open camera──▶ Camera ──photo┘
//! History ──select item──▶ Results (no network call)
//! ```
//!
//! Every outcome carries the id of the request that produced it. Only the
//! in-flight request's outcome is applied, so each Loading period ends
//! exactly once.

use crate::camera::ImageData;
use crate::client::RecommendationClient;
use crate::error::{RatingError, USER_ERROR_MESSAGE};
use crate::mood::{resolve_mood, Mood};
use crate::persistence::{apply_ratings, set_song_rating, Persistence};
use crate::song::{HistoryItem, Song, SongKey};
use crate::store::KeyValueStore;
use log::{debug, info, warn};
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;
use std::sync::Arc;

pub type RequestId = u64;

/// Loader text while a photo is being read.
pub const ANALYZING_MESSAGE: &str = "Analyzing your mood...";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum View {
    Home,
    Camera,
    Loading,
    Results,
    History,
}

/// What happens to an in-flight request when the user leaves the loader.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum StaleResultPolicy {
    /// Forget the request; its outcome is dropped when it arrives
    #[default]
    Discard,
    /// Keep the request; its outcome still replaces whatever view is shown
    Apply,
}

/// User intents and asynchronous outcomes.
#[derive(Debug, Clone)]
pub enum Event {
    OpenCamera,
    CloseCamera,
    SelectMood(Mood),
    ImageCaptured(ImageData),
    CaptureFailed(String),
    MoodDetected { request: RequestId, label: String },
    SongsLoaded { request: RequestId, mood: Mood, songs: Vec<Song> },
    RequestFailed { request: RequestId, reason: String },
    OpenHistory,
    SelectHistoryItem(HistoryItem),
    SongRated { key: SongKey, rating: u8 },
    Back,
    Reset,
    DismissError,
}

/// Work the reducer asks the driver to do.
#[derive(Debug, Clone, PartialEq)]
pub enum Effect {
    DetectMood { request: RequestId, image: ImageData },
    RecommendSongs { request: RequestId, mood: Mood },
    RecordHistory { mood: Mood, songs: Vec<Song> },
}

#[derive(Debug, Clone)]
pub struct AppState {
    pub view: View,
    /// Where `Back` goes from Results
    pub results_origin: View,
    pub mood: Option<Mood>,
    pub songs: Vec<Song>,
    pub error: Option<String>,
    pub loading_message: Option<String>,
    in_flight: Option<RequestId>,
    next_request: RequestId,
    policy: StaleResultPolicy,
}

impl Default for AppState {
    fn default() -> Self {
        Self::new(StaleResultPolicy::default())
    }
}

impl AppState {
    pub fn new(policy: StaleResultPolicy) -> Self {
        Self {
            view: View::Home,
            results_origin: View::Home,
            mood: None,
            songs: Vec::new(),
            error: None,
            loading_message: None,
            in_flight: None,
            next_request: 1,
            policy,
        }
    }

    pub fn is_loading(&self) -> bool {
        self.view == View::Loading
    }

    pub fn in_flight(&self) -> Option<RequestId> {
        self.in_flight
    }

    /// Apply `event` and return the effects to run.
    pub fn apply(&mut self, event: Event) -> Vec<Effect> {
        debug!("{:?} <- {}", self.view, event_name(&event));

        match event {
            Event::OpenCamera => {
                if self.is_loading() {
                    warn!("Ignoring camera while a request is loading");
                    return Vec::new();
                }
                self.error = None;
                self.view = View::Camera;
            }
            Event::CloseCamera => {
                if self.view == View::Camera {
                    self.view = View::Home;
                }
            }
            Event::SelectMood(mood) => {
                if self.is_loading() {
                    warn!("Ignoring mood `{}' while a request is loading", mood.name);
                    return Vec::new();
                }
                let request = self.begin_request(format!("Finding {} songs...", mood.name));
                self.mood = Some(mood.clone());
                return vec![Effect::RecommendSongs { request, mood }];
            }
            Event::ImageCaptured(image) => {
                if self.view != View::Camera {
                    warn!("Ignoring photo outside the camera view");
                    return Vec::new();
                }
                let request = self.begin_request(ANALYZING_MESSAGE.to_string());
                return vec![Effect::DetectMood { request, image }];
            }
            Event::CaptureFailed(reason) => {
                if self.view == View::Camera {
                    warn!("Capture failed: {reason}");
                    self.fail();
                }
            }
            Event::MoodDetected { request, label } => {
                if !self.accepts(request) {
                    return Vec::new();
                }
                let mood = resolve_mood(&label);
                info!("Detected mood: {mood}");
                if self.is_loading() {
                    self.loading_message = Some(format!("Finding {} songs...", mood.name));
                }
                self.mood = Some(mood.clone());
                return vec![Effect::RecommendSongs { request, mood }];
            }
            Event::SongsLoaded { request, mood, songs } => {
                if !self.accepts(request) {
                    return Vec::new();
                }
                self.in_flight = None;
                self.loading_message = None;
                self.error = None;
                self.view = View::Results;
                self.results_origin = View::Home;
                self.mood = Some(mood.clone());
                self.songs = songs.clone();
                return vec![Effect::RecordHistory { mood, songs }];
            }
            Event::RequestFailed { request, reason } => {
                if !self.accepts(request) {
                    return Vec::new();
                }
                warn!("Recommendation request {request} failed: {reason}");
                self.in_flight = None;
                self.fail();
            }
            Event::OpenHistory => {
                if self.is_loading() {
                    warn!("Ignoring history while a request is loading");
                    return Vec::new();
                }
                self.error = None;
                self.view = View::History;
            }
            Event::SelectHistoryItem(item) => {
                if self.view != View::History {
                    warn!("Ignoring history item outside the history view");
                    return Vec::new();
                }
                self.view = View::Results;
                self.results_origin = View::History;
                self.mood = Some(item.mood);
                self.songs = item.songs;
            }
            Event::SongRated { key, rating } => {
                set_song_rating(&mut self.songs, &key, rating);
            }
            Event::Back => match self.view {
                View::Results => self.view = self.results_origin,
                View::Camera | View::History => self.view = View::Home,
                View::Loading => {
                    self.leave_loading();
                    self.view = View::Home;
                }
                View::Home => self.error = None,
            },
            Event::Reset => {
                if self.is_loading() {
                    self.leave_loading();
                }
                self.view = View::Home;
                self.results_origin = View::Home;
                self.mood = None;
                self.songs.clear();
                self.error = None;
            }
            Event::DismissError => self.error = None,
        }

        Vec::new()
    }

    fn begin_request(&mut self, message: String) -> RequestId {
        let request = self.next_request;
        self.next_request += 1;
        if let Some(old) = self.in_flight.replace(request) {
            debug!("Request {request} supersedes {old}");
        }
        self.view = View::Loading;
        self.loading_message = Some(message);
        self.error = None;
        self.mood = None;
        self.songs.clear();
        request
    }

    fn accepts(&self, request: RequestId) -> bool {
        if self.in_flight == Some(request) {
            return true;
        }
        warn!("Dropping stale outcome of request {request}");
        false
    }

    fn leave_loading(&mut self) {
        self.loading_message = None;
        if self.policy == StaleResultPolicy::Discard {
            if let Some(request) = self.in_flight.take() {
                debug!("Discarding request {request}");
            }
        }
    }

    fn fail(&mut self) {
        self.view = View::Home;
        self.loading_message = None;
        self.mood = None;
        self.songs.clear();
        self.error = Some(USER_ERROR_MESSAGE.to_string());
    }
}

fn event_name(event: &Event) -> &'static str {
    match event {
        Event::OpenCamera => "OpenCamera",
        Event::CloseCamera => "CloseCamera",
        Event::SelectMood(_) => "SelectMood",
        Event::ImageCaptured(_) => "ImageCaptured",
        Event::CaptureFailed(_) => "CaptureFailed",
        Event::MoodDetected { .. } => "MoodDetected",
        Event::SongsLoaded { .. } => "SongsLoaded",
        Event::RequestFailed { .. } => "RequestFailed",
        Event::OpenHistory => "OpenHistory",
        Event::SelectHistoryItem(_) => "SelectHistoryItem",
        Event::SongRated { .. } => "SongRated",
        Event::Back => "Back",
        Event::Reset => "Reset",
        Event::DismissError => "DismissError",
    }
}

/// Milliseconds since the Unix epoch.
pub fn now_millis() -> i64 {
    chrono::Utc::now().timestamp_millis()
}

/// Runs the state machine against a client and a store.
///
/// [`App::dispatch`] awaits each client call before returning. A front end
/// that keeps taking input while a call is out uses [`App::handle`] for
/// events, runs the returned effects with [`run_request`] on a handle from
/// [`App::client`], and feeds each outcome back through [`App::handle`].
pub struct App<S: KeyValueStore, C: RecommendationClient> {
    state: AppState,
    persistence: Persistence<S>,
    client: Arc<C>,
    clock: fn() -> i64,
}

impl<S: KeyValueStore, C: RecommendationClient> App<S, C> {
    pub fn new(store: S, client: C, policy: StaleResultPolicy) -> Self {
        Self {
            state: AppState::new(policy),
            persistence: Persistence::new(store),
            client: Arc::new(client),
            clock: now_millis,
        }
    }

    /// Replace the clock used to stamp history items.
    #[must_use]
    pub fn with_clock(mut self, clock: fn() -> i64) -> Self {
        self.clock = clock;
        self
    }

    pub fn state(&self) -> &AppState {
        &self.state
    }

    pub fn persistence(&self) -> &Persistence<S> {
        &self.persistence
    }

    pub fn persistence_mut(&mut self) -> &mut Persistence<S> {
        &mut self.persistence
    }

    pub fn client(&self) -> Arc<C> {
        Arc::clone(&self.client)
    }

    /// Apply `event` and run every resulting effect to completion.
    pub async fn dispatch(&mut self, event: Event) -> &AppState {
        let mut pending: VecDeque<Effect> = self.handle(event).into();
        while let Some(effect) = pending.pop_front() {
            if let Some(outcome) = self.perform(effect).await {
                pending.extend(self.handle(outcome));
            }
        }
        &self.state
    }

    /// Apply `event` and run its local effects. Returns the client calls
    /// still to make; nothing is awaited.
    pub fn handle(&mut self, event: Event) -> Vec<Effect> {
        let event = match event {
            Event::SongsLoaded { request, mood, mut songs } => {
                apply_ratings(&mut songs, &self.persistence.ratings());
                Event::SongsLoaded { request, mood, songs }
            }
            other => other,
        };

        let mut requests = Vec::new();
        for effect in self.state.apply(event) {
            match effect {
                Effect::RecordHistory { mood, songs } => self.record_history(mood, songs),
                request => requests.push(request),
            }
        }
        requests
    }

    /// Run one effect; client calls come back as an outcome event.
    pub async fn perform(&mut self, effect: Effect) -> Option<Event> {
        match effect {
            Effect::RecordHistory { mood, songs } => {
                self.record_history(mood, songs);
                None
            }
            request => run_request(self.client.as_ref(), request).await,
        }
    }

    fn record_history(&mut self, mood: Mood, songs: Vec<Song>) {
        let item = HistoryItem::new(mood, songs, (self.clock)());
        info!("Saving history item {} ({} songs)", item.id, item.songs.len());
        self.persistence.save_history_item(item);
    }

    /// Rate `song` everywhere: ratings table, history and the current list.
    pub fn rate(&mut self, song: &Song, rating: u8) -> Result<(), RatingError> {
        self.persistence.set_rating(song, rating)?;
        self.state.apply(Event::SongRated {
            key: song.key(),
            rating,
        });
        Ok(())
    }

    /// Open history and replay the item with `id`. `false` if there is none.
    pub async fn replay(&mut self, id: &str) -> bool {
        let Some(item) = self.persistence.find_history_item(id).cloned() else {
            return false;
        };
        if self.state.view != View::History {
            self.dispatch(Event::OpenHistory).await;
        }
        self.dispatch(Event::SelectHistoryItem(item)).await;
        self.state.view == View::Results
    }
}

/// Make the client call behind `effect` and turn its result into an outcome
/// event. `RecordHistory` needs no client and yields `None`.
pub async fn run_request<C>(client: &C, effect: Effect) -> Option<Event>
where
    C: RecommendationClient + ?Sized,
{
    let outcome = match effect {
        Effect::DetectMood { request, image } => match client.detect_mood_from_image(&image).await {
            Ok(label) => Event::MoodDetected { request, label },
            Err(e) => Event::RequestFailed {
                request,
                reason: e.to_string(),
            },
        },
        Effect::RecommendSongs { request, mood } => match client.recommend_by_mood(&mood.name).await {
            Ok(songs) => Event::SongsLoaded { request, mood, songs },
            Err(e) => Event::RequestFailed {
                request,
                reason: e.to_string(),
            },
        },
        Effect::RecordHistory { .. } => return None,
    };
    Some(outcome)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn happy() -> Mood {
        Mood::new("Happy", "😄")
    }

    fn songs() -> Vec<Song> {
        vec![Song::new("Walking on Sunshine", "Katrina and the Waves")]
    }

    fn start_mood_request(state: &mut AppState) -> RequestId {
        let effects = state.apply(Event::SelectMood(happy()));
        match effects.as_slice() {
            [Effect::RecommendSongs { request, mood }] => {
                assert_eq!(mood, &happy());
                *request
            }
            other => panic!("unexpected effects {other:?}"),
        }
    }

    #[test]
    fn test_select_mood_goes_to_loading_then_results() {
        let mut state = AppState::default();
        let request = start_mood_request(&mut state);
        assert_eq!(state.view, View::Loading);
        assert!(state.loading_message.is_some());

        let effects = state.apply(Event::SongsLoaded {
            request,
            mood: happy(),
            songs: songs(),
        });
        assert_eq!(state.view, View::Results);
        assert_eq!(state.songs, songs());
        assert_eq!(state.in_flight(), None);
        assert_eq!(
            effects,
            vec![Effect::RecordHistory {
                mood: happy(),
                songs: songs()
            }]
        );
    }

    #[test]
    fn test_failure_returns_home_with_error() {
        let mut state = AppState::default();
        let request = start_mood_request(&mut state);

        let effects = state.apply(Event::RequestFailed {
            request,
            reason: "boom".to_string(),
        });
        assert!(effects.is_empty());
        assert_eq!(state.view, View::Home);
        assert_eq!(state.error.as_deref(), Some(USER_ERROR_MESSAGE));
        assert!(state.loading_message.is_none());
        assert!(state.songs.is_empty());
    }

    #[test]
    fn test_no_new_request_while_loading() {
        let mut state = AppState::default();
        let request = start_mood_request(&mut state);

        assert!(state.apply(Event::SelectMood(Mood::new("Sad", "😢"))).is_empty());
        assert!(state.apply(Event::OpenCamera).is_empty());
        assert_eq!(state.in_flight(), Some(request));
        assert_eq!(state.view, View::Loading);
    }

    #[test]
    fn test_exactly_one_outcome_per_request() {
        let mut state = AppState::default();
        let request = start_mood_request(&mut state);
        state.apply(Event::SongsLoaded {
            request,
            mood: happy(),
            songs: songs(),
        });

        // A second outcome for the same request is dropped
        state.apply(Event::RequestFailed {
            request,
            reason: "late".to_string(),
        });
        assert_eq!(state.view, View::Results);
        assert!(state.error.is_none());
    }

    #[test]
    fn test_camera_flow_detects_then_recommends() {
        let mut state = AppState::default();
        state.apply(Event::OpenCamera);
        assert_eq!(state.view, View::Camera);

        let image = ImageData::from_bytes("image/png", b"face");
        let effects = state.apply(Event::ImageCaptured(image.clone()));
        let request = match effects.as_slice() {
            [Effect::DetectMood { request, image: sent }] => {
                assert_eq!(sent, &image);
                *request
            }
            other => panic!("unexpected effects {other:?}"),
        };
        assert_eq!(state.loading_message.as_deref(), Some(ANALYZING_MESSAGE));

        let effects = state.apply(Event::MoodDetected {
            request,
            label: "happy".to_string(),
        });
        assert_eq!(
            effects,
            vec![Effect::RecommendSongs {
                request,
                mood: happy()
            }]
        );
        assert_eq!(state.view, View::Loading);
    }

    #[test]
    fn test_capture_failure_lands_home_with_error() {
        let mut state = AppState::default();
        state.apply(Event::OpenCamera);
        state.apply(Event::CaptureFailed("no camera".to_string()));
        assert_eq!(state.view, View::Home);
        assert_eq!(state.error.as_deref(), Some(USER_ERROR_MESSAGE));
    }

    #[test]
    fn test_close_camera_only_leaves_the_camera() {
        let mut state = AppState::default();
        state.apply(Event::OpenHistory);
        state.apply(Event::CloseCamera);
        assert_eq!(state.view, View::History);

        state.apply(Event::OpenCamera);
        assert!(state.apply(Event::CloseCamera).is_empty());
        assert_eq!(state.view, View::Home);
    }

    #[test]
    fn test_dismiss_error_keeps_the_view() {
        let mut state = AppState::default();
        let request = start_mood_request(&mut state);
        state.apply(Event::RequestFailed {
            request,
            reason: "boom".to_string(),
        });
        assert!(state.error.is_some());

        state.apply(Event::DismissError);
        assert!(state.error.is_none());
        assert_eq!(state.view, View::Home);
    }

    #[test]
    fn test_back_from_results_returns_to_origin() {
        let mut state = AppState::default();
        let request = start_mood_request(&mut state);
        state.apply(Event::SongsLoaded {
            request,
            mood: happy(),
            songs: songs(),
        });
        state.apply(Event::Back);
        assert_eq!(state.view, View::Home);

        state.apply(Event::OpenHistory);
        state.apply(Event::SelectHistoryItem(HistoryItem::new(happy(), songs(), 1)));
        assert_eq!(state.view, View::Results);
        state.apply(Event::Back);
        assert_eq!(state.view, View::History);
        state.apply(Event::Back);
        assert_eq!(state.view, View::Home);
    }

    #[test]
    fn test_navigating_away_discards_outcome_by_default() {
        let mut state = AppState::new(StaleResultPolicy::Discard);
        let request = start_mood_request(&mut state);
        state.apply(Event::Reset);
        assert_eq!(state.view, View::Home);

        let effects = state.apply(Event::SongsLoaded {
            request,
            mood: happy(),
            songs: songs(),
        });
        assert!(effects.is_empty());
        assert_eq!(state.view, View::Home);
        assert!(state.songs.is_empty());
    }

    #[test]
    fn test_apply_policy_keeps_late_outcome() {
        let mut state = AppState::new(StaleResultPolicy::Apply);
        let request = start_mood_request(&mut state);
        state.apply(Event::Back);
        assert_eq!(state.view, View::Home);

        let effects = state.apply(Event::SongsLoaded {
            request,
            mood: happy(),
            songs: songs(),
        });
        assert_eq!(effects.len(), 1);
        assert_eq!(state.view, View::Results);
    }

    #[test]
    fn test_new_request_supersedes_old_one() {
        let mut state = AppState::new(StaleResultPolicy::Apply);
        let first = start_mood_request(&mut state);
        state.apply(Event::Reset);
        let second = start_mood_request(&mut state);
        assert_ne!(first, second);

        state.apply(Event::RequestFailed {
            request: first,
            reason: "old".to_string(),
        });
        assert_eq!(state.view, View::Loading);
        assert_eq!(state.in_flight(), Some(second));
    }

    #[test]
    fn test_song_rated_updates_current_list() {
        let mut state = AppState::default();
        state.apply(Event::OpenHistory);
        state.apply(Event::SelectHistoryItem(HistoryItem::new(happy(), songs(), 1)));

        state.apply(Event::SongRated {
            key: SongKey::new("walking on sunshine", "KATRINA AND THE WAVES"),
            rating: 4,
        });
        assert_eq!(state.songs[0].rating, Some(4));

        state.apply(Event::SongRated {
            key: songs()[0].key(),
            rating: 0,
        });
        assert_eq!(state.songs[0].rating, None);
    }
}
