//! Recommendation client for the Gemini generative language API.
//!
//! Two calls: songs for a mood name, and a one-word mood for a photo. Neither
//! retries; any failure goes straight back to the caller as a
//! [`RecommendationError`]. Responses are validated before they become
//! [`Song`] values.

use crate::camera::ImageData;
use crate::error::RecommendationError;
use crate::mood::{catalog_names, find_mood};
use crate::song::Song;
use async_trait::async_trait;
use log::{debug, info, warn};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::time::Duration;

pub const DEFAULT_ENDPOINT: &str = "https://generativelanguage.googleapis.com/v1beta";
pub const DEFAULT_MODEL: &str = "gemini-2.5-flash";
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Number of songs asked for per mood.
const SONG_COUNT: usize = 10;

/// Anything that can turn a mood or a photo into recommendations.
#[async_trait]
pub trait RecommendationClient: Send + Sync {
    /// Songs for `mood_name`.
    async fn recommend_by_mood(&self, mood_name: &str) -> Result<Vec<Song>, RecommendationError>;

    /// Single-word mood label for the face in `image`.
    async fn detect_mood_from_image(&self, image: &ImageData) -> Result<String, RecommendationError>;
}

/// Connection settings for [`GeminiClient`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GeminiConfig {
    /// Missing keys only fail once a request is made
    #[serde(skip_serializing)]
    pub api_key: Option<String>,
    pub model: String,
    pub endpoint: String,
    pub timeout_secs: u64,
}

impl Default for GeminiConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            model: DEFAULT_MODEL.to_string(),
            endpoint: DEFAULT_ENDPOINT.to_string(),
            timeout_secs: DEFAULT_TIMEOUT_SECS,
        }
    }
}

pub struct GeminiClient {
    http: Client,
    config: GeminiConfig,
}

impl GeminiClient {
    pub fn new(config: GeminiConfig) -> Result<Self, RecommendationError> {
        let http = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .user_agent(concat!("moodtune/", env!("CARGO_PKG_VERSION")))
            .build()?;
        Ok(Self { http, config })
    }

    fn url(&self) -> Result<String, RecommendationError> {
        let key = self
            .config
            .api_key
            .as_deref()
            .filter(|k| !k.trim().is_empty())
            .ok_or(RecommendationError::MissingApiKey)?;
        Ok(format!(
            "{}/models/{}:generateContent?key={}",
            self.config.endpoint.trim_end_matches('/'),
            self.config.model,
            key
        ))
    }

    /// POST `body` and return the concatenated candidate text.
    async fn generate(&self, body: &Value) -> Result<String, RecommendationError> {
        let url = self.url()?;
        let response = self.http.post(&url).json(body).send().await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            warn!("Gemini request failed: {status}");
            return Err(RecommendationError::Status {
                status: status.as_u16(),
                body,
            });
        }

        let parsed: GenerateContentResponse = response.json().await?;
        let text = parsed.text();
        debug!("Gemini answered with {} characters", text.len());
        if text.trim().is_empty() {
            return Err(RecommendationError::InvalidPayload(
                "response contained no text".to_string(),
            ));
        }
        Ok(text)
    }
}

#[async_trait]
impl RecommendationClient for GeminiClient {
    async fn recommend_by_mood(&self, mood_name: &str) -> Result<Vec<Song>, RecommendationError> {
        info!("Requesting songs for mood: {mood_name}");
        let text = self.generate(&songs_request_body(mood_name)).await?;
        parse_songs_payload(&text)
    }

    async fn detect_mood_from_image(&self, image: &ImageData) -> Result<String, RecommendationError> {
        info!("Requesting mood detection for a {} image", image.mime_type);
        let text = self.generate(&mood_request_body(image)).await?;
        parse_mood_label(&text)
    }
}

/// Request body asking for songs as JSON.
pub fn songs_request_body(mood_name: &str) -> Value {
    let prompt = format!(
        "Recommend {SONG_COUNT} songs for someone who is feeling {mood_name}. \
         Mix well-known and lesser-known tracks from different languages. \
         Respond only with a JSON array of objects with the string fields \
         \"title\", \"artist\" and \"language\"."
    );
    json!({
        "contents": [{ "parts": [{ "text": prompt }] }],
        "generationConfig": { "responseMimeType": "application/json" }
    })
}

/// Request body asking for a one-word mood for the face in `image`.
pub fn mood_request_body(image: &ImageData) -> Value {
    let prompt = format!(
        "Look at the facial expression of the person in this photo and answer \
         with exactly one word describing their mood. Prefer one of: {}.",
        catalog_names().join(", ")
    );
    json!({
        "contents": [{
            "parts": [
                { "text": prompt },
                { "inline_data": { "mime_type": image.mime_type, "data": image.base64 } }
            ]
        }]
    })
}

#[derive(Debug, Deserialize)]
struct GenerateContentResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    content: Option<Content>,
}

#[derive(Debug, Deserialize)]
struct Content {
    #[serde(default)]
    parts: Vec<Part>,
}

#[derive(Debug, Deserialize)]
struct Part {
    text: Option<String>,
}

impl GenerateContentResponse {
    fn text(&self) -> String {
        self.candidates
            .first()
            .and_then(|c| c.content.as_ref())
            .map(|content| {
                content
                    .parts
                    .iter()
                    .filter_map(|p| p.text.as_deref())
                    .collect::<String>()
            })
            .unwrap_or_default()
    }
}

/// Validate the model's song list.
///
/// Accepts a bare array or `{"songs": [...]}`, optionally inside a Markdown
/// code fence. Every record needs non-empty string `title` and `artist`;
/// `language` and `link` must be strings when present.
pub fn parse_songs_payload(text: &str) -> Result<Vec<Song>, RecommendationError> {
    let value: Value = serde_json::from_str(strip_code_fence(text))?;

    let records = match &value {
        Value::Array(records) => records,
        Value::Object(map) => match map.get("songs") {
            Some(Value::Array(records)) => records,
            _ => return Err(invalid("expected a `songs` array")),
        },
        _ => return Err(invalid("expected an array of songs")),
    };

    if records.is_empty() {
        return Err(invalid("no songs returned"));
    }

    records
        .iter()
        .enumerate()
        .map(|(i, record)| parse_song_record(i, record))
        .collect()
}

fn parse_song_record(index: usize, record: &Value) -> Result<Song, RecommendationError> {
    let fields = record
        .as_object()
        .ok_or_else(|| invalid(format!("song {index} is not an object")))?;

    let required = |name: &str| -> Result<String, RecommendationError> {
        match fields.get(name) {
            Some(Value::String(s)) if !s.trim().is_empty() => Ok(s.trim().to_string()),
            _ => Err(invalid(format!("song {index} is missing `{name}'"))),
        }
    };
    let optional = |name: &str| -> Result<Option<String>, RecommendationError> {
        match fields.get(name) {
            None | Some(Value::Null) => Ok(None),
            Some(Value::String(s)) => Ok(Some(s.trim().to_string())),
            Some(_) => Err(invalid(format!("song {index} has a non-string `{name}'"))),
        }
    };

    let mut song = Song::new(required("title")?, required("artist")?);
    song.language = optional("language")?.unwrap_or_default();
    song.link = optional("link")?.filter(|l| !l.is_empty());
    Ok(song)
}

/// First catalog mood named in the model's answer, else its first word.
pub fn parse_mood_label(text: &str) -> Result<String, RecommendationError> {
    let mut words = text
        .split(|c: char| !c.is_alphabetic())
        .filter(|word| !word.is_empty())
        .peekable();
    let first = *words.peek().ok_or(RecommendationError::NoMoodDetected)?;

    let label = words.find(|word| find_mood(word).is_some()).unwrap_or(first);
    Ok(label.to_string())
}

fn strip_code_fence(text: &str) -> &str {
    let trimmed = text.trim();
    let Some(rest) = trimmed.strip_prefix("```") else {
        return trimmed;
    };
    // Drop the info string (e.g. `json`) on the opening line
    let body = rest.split_once('\n').map_or("", |(_, body)| body);
    body.trim_end().strip_suffix("```").unwrap_or(body).trim()
}

fn invalid(reason: impl Into<String>) -> RecommendationError {
    RecommendationError::InvalidPayload(reason.into())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_plain_array() {
        let songs = parse_songs_payload(
            r#"[{"title":"Walking on Sunshine","artist":"Katrina and the Waves","language":"English"}]"#,
        )
        .unwrap();
        assert_eq!(songs.len(), 1);
        assert_eq!(songs[0].title, "Walking on Sunshine");
        assert_eq!(songs[0].language, "English");
        assert_eq!(songs[0].rating, None);
    }

    #[test]
    fn test_parse_fenced_object_with_links() {
        let text = "```json\n{\"songs\": [{\"title\": \"Happy\", \"artist\": \"Pharrell Williams\", \"link\": \"https://youtu.be/x\"}]}\n```";
        let songs = parse_songs_payload(text).unwrap();
        assert_eq!(songs[0].link.as_deref(), Some("https://youtu.be/x"));
        assert_eq!(songs[0].language, "");
    }

    #[test]
    fn test_parse_rejects_schema_violations() {
        let cases = [
            "not json",
            "{}",
            "[]",
            "\"a string\"",
            r#"[{"title":"No Artist"}]"#,
            r#"[{"title":"","artist":"Someone"}]"#,
            r#"[{"title":"T","artist":"A","language":3}]"#,
            r#"["just a title"]"#,
        ];
        for case in cases {
            let err = parse_songs_payload(case).unwrap_err();
            assert!(
                matches!(err, RecommendationError::InvalidPayload(_)),
                "{case} gave {err:?}"
            );
        }
    }

    #[test]
    fn test_parse_mood_label() {
        assert_eq!(parse_mood_label("Happy").unwrap(), "Happy");
        assert_eq!(parse_mood_label("  **Calm**.\n").unwrap(), "Calm");
        assert_eq!(parse_mood_label("I think happy").unwrap(), "happy");
        assert_eq!(parse_mood_label("The person looks Calm.").unwrap(), "Calm");
        assert_eq!(parse_mood_label("Mischievous").unwrap(), "Mischievous");
        assert!(matches!(
            parse_mood_label(" ... \n"),
            Err(RecommendationError::NoMoodDetected)
        ));
    }

    #[test]
    fn test_request_bodies() {
        let body = songs_request_body("Happy");
        let prompt = body["contents"][0]["parts"][0]["text"].as_str().unwrap();
        assert!(prompt.contains("feeling Happy"));
        assert_eq!(
            body["generationConfig"]["responseMimeType"],
            "application/json"
        );

        let image = ImageData::from_bytes("image/png", b"png");
        let body = mood_request_body(&image);
        let inline = &body["contents"][0]["parts"][1]["inline_data"];
        assert_eq!(inline["mime_type"], "image/png");
        assert_eq!(inline["data"], image.base64.as_str());
    }

    #[test]
    fn test_response_text_joins_parts() {
        let response: GenerateContentResponse = serde_json::from_str(
            r#"{"candidates":[{"content":{"parts":[{"text":"[{\"title\":"},{"text":"\"A\",\"artist\":\"B\"}]"}]}}]}"#,
        )
        .unwrap();
        let songs = parse_songs_payload(&response.text()).unwrap();
        assert_eq!(songs[0].artist, "B");

        let empty: GenerateContentResponse = serde_json::from_str("{}").unwrap();
        assert_eq!(empty.text(), "");
    }

    #[tokio::test]
    async fn test_missing_api_key_fails_before_network() {
        let client = GeminiClient::new(GeminiConfig::default()).unwrap();
        let err = client.recommend_by_mood("Happy").await.unwrap_err();
        assert!(matches!(err, RecommendationError::MissingApiKey));
    }
}
