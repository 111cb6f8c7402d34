//! Deepgram transcription client
//!
//! Pre-recorded audio is posted to `/listen` with the `nova-2` model, smart
//! formatting, punctuation and diarization enabled. Word-level speaker tags are folded
//! into "Speaker N: ..." paragraphs.

use async_trait::async_trait;
use serde::Deserialize;

use super::{http_client, ServiceError, Transcriber, Transcript};

const SERVICE: &str = "Deepgram";

const LISTEN_PARAMS: [(&str, &str); 7] = [
    ("model", "nova-2"),
    ("smart_format", "true"),
    ("punctuate", "true"),
    ("diarize", "true"),
    ("utterances", "true"),
    ("sentiment", "true"),
    ("language", "en"),
];

#[derive(Debug, Deserialize)]
pub struct ListenResponse {
    pub results: ListenResults,
}

#[derive(Debug, Deserialize)]
pub struct ListenResults {
    #[serde(default)]
    pub channels: Vec<Channel>,
}

#[derive(Debug, Deserialize)]
pub struct Channel {
    #[serde(default)]
    pub alternatives: Vec<Alternative>,
}

#[derive(Debug, Deserialize)]
pub struct Alternative {
    #[serde(default)]
    pub transcript: String,
    #[serde(default)]
    pub confidence: Option<f64>,
    #[serde(default)]
    pub words: Vec<Word>,
}

#[derive(Debug, Deserialize)]
pub struct Word {
    #[serde(default)]
    pub word: String,
    #[serde(default)]
    pub punctuated_word: Option<String>,
    /// Absent when diarization did not run
    #[serde(default)]
    pub speaker: u32,
}

/// Deepgram API client
pub struct DeepgramClient {
    http_client: reqwest::Client,
    api_key: String,
    base_url: String,
}

impl DeepgramClient {
    pub fn new(api_key: String, base_url: String) -> Result<Self, ServiceError> {
        Ok(Self {
            http_client: http_client(SERVICE)?,
            api_key,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }
}

#[async_trait]
impl Transcriber for DeepgramClient {
    async fn transcribe(
        &self,
        audio: Vec<u8>,
        content_type: &str,
    ) -> Result<Transcript, ServiceError> {
        let url = format!("{}/listen", self.base_url);
        tracing::info!(bytes = audio.len(), content_type = %content_type, "Transcribing audio with Deepgram");

        let response = self
            .http_client
            .post(&url)
            .query(&LISTEN_PARAMS)
            .header(reqwest::header::AUTHORIZATION, format!("Token {}", self.api_key))
            .header(reqwest::header::CONTENT_TYPE, content_type)
            .body(audio)
            .send()
            .await
            .map_err(|e| ServiceError::network(SERVICE, e))?;

        if !response.status().is_success() {
            return Err(ServiceError::from_response(SERVICE, response).await);
        }

        let listen: ListenResponse = response
            .json()
            .await
            .map_err(|e| ServiceError::parse(SERVICE, e))?;

        let transcript = reduce_listen_response(listen);
        if transcript.preferred_text().trim().is_empty() {
            return Err(ServiceError::Empty(
                "Transcription returned empty text.".to_string(),
            ));
        }

        tracing::info!(
            chars = transcript.text.len(),
            confidence = ?transcript.confidence,
            "Transcription complete"
        );
        Ok(transcript)
    }
}

/// Reduce a `/listen` response to the first alternative of the first channel
pub fn reduce_listen_response(response: ListenResponse) -> Transcript {
    let alternative = response
        .results
        .channels
        .into_iter()
        .next()
        .and_then(|channel| channel.alternatives.into_iter().next());

    match alternative {
        Some(alt) => {
            let speaker_labelled = if alt.words.is_empty() {
                None
            } else {
                Some(format_diarized(&alt.words))
            };
            Transcript {
                text: alt.transcript,
                speaker_labelled,
                confidence: alt.confidence,
            }
        }
        None => Transcript {
            text: String::new(),
            speaker_labelled: None,
            confidence: None,
        },
    }
}

/// Fold words into "Speaker N: ..." paragraphs, one per change of speaker
pub fn format_diarized(words: &[Word]) -> String {
    let mut paragraphs: Vec<String> = Vec::new();
    let mut current: Option<u32> = None;

    for word in words {
        let text = word.punctuated_word.as_deref().unwrap_or(&word.word);
        if current != Some(word.speaker) {
            paragraphs.push(format!("Speaker {}:", word.speaker));
            current = Some(word.speaker);
        }
        if let Some(paragraph) = paragraphs.last_mut() {
            paragraph.push(' ');
            paragraph.push_str(text);
        }
    }

    paragraphs.join("\n\n")
}
