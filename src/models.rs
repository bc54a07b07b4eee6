//! Data models and structures
//!
//! Defines dream submissions, generated prompts and images, the structured
//! interpretation returned by the chat model, session history entries and
//! the environment configuration.

use crate::{Error, Result};
use chrono::{DateTime, Local};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;
use uuid::Uuid;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[serde(rename_all = "lowercase")]
pub enum Emotion {
    Joy,
    Sadness,
    Anger,
    Fear,
    Anxiety,
    Surprise,
    Relief,
    Anticipation,
    Confusion,
}

impl Emotion {
    pub const ALL: [Emotion; 9] = [
        Emotion::Joy,
        Emotion::Sadness,
        Emotion::Anger,
        Emotion::Fear,
        Emotion::Anxiety,
        Emotion::Surprise,
        Emotion::Relief,
        Emotion::Anticipation,
        Emotion::Confusion,
    ];

    pub fn label(&self) -> &'static str {
        match self {
            Emotion::Joy => "joy",
            Emotion::Sadness => "sadness",
            Emotion::Anger => "anger",
            Emotion::Fear => "fear",
            Emotion::Anxiety => "anxiety",
            Emotion::Surprise => "surprise",
            Emotion::Relief => "relief",
            Emotion::Anticipation => "anticipation",
            Emotion::Confusion => "confusion",
        }
    }

    /// Parse a comma separated list such as `"fear, relief"`.
    pub fn parse_list(input: &str) -> Result<BTreeSet<Emotion>> {
        input
            .split(',')
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(|s| s.parse::<Emotion>())
            .collect()
    }
}

impl fmt::Display for Emotion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for Emotion {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        let needle = s.trim().to_lowercase();
        Emotion::ALL
            .into_iter()
            .find(|e| e.label() == needle)
            .ok_or_else(|| Error::InvalidInput(format!("Unknown emotion '{}'", s.trim())))
    }
}

/// Strength of the felt emotions on a 1-10 scale.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(try_from = "u8", into = "u8")]
pub struct EmotionIntensity(u8);

impl EmotionIntensity {
    pub const MIN: u8 = 1;
    pub const MAX: u8 = 10;

    pub fn new(value: u8) -> Result<Self> {
        if (Self::MIN..=Self::MAX).contains(&value) {
            Ok(Self(value))
        } else {
            Err(Error::InvalidInput(format!(
                "Emotion intensity must be between {} and {}, got {}",
                Self::MIN,
                Self::MAX,
                value
            )))
        }
    }

    pub fn value(&self) -> u8 {
        self.0
    }
}

impl Default for EmotionIntensity {
    fn default() -> Self {
        Self(5)
    }
}

impl TryFrom<u8> for EmotionIntensity {
    type Error = Error;

    fn try_from(value: u8) -> Result<Self> {
        Self::new(value)
    }
}

impl From<EmotionIntensity> for u8 {
    fn from(value: EmotionIntensity) -> Self {
        value.0
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum InterpretationStyle {
    Spiritual,
    #[default]
    Psychological,
}

impl InterpretationStyle {
    pub fn label(&self) -> &'static str {
        match self {
            InterpretationStyle::Spiritual => "spiritual",
            InterpretationStyle::Psychological => "psychological",
        }
    }
}

impl fmt::Display for InterpretationStyle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for InterpretationStyle {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "spiritual" => Ok(InterpretationStyle::Spiritual),
            "psychological" => Ok(InterpretationStyle::Psychological),
            other => Err(Error::InvalidInput(format!(
                "Unknown interpretation style '{}'",
                other
            ))),
        }
    }
}

/// One dream as entered by the user. Immutable once built.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct DreamSubmission {
    narrative: String,
    primary_emotions: BTreeSet<Emotion>,
    emotion_intensity: EmotionIntensity,
    additional_emotion_notes: String,
    interpretation_style: InterpretationStyle,
}

impl DreamSubmission {
    pub fn new(narrative: impl Into<String>, style: InterpretationStyle) -> Result<Self> {
        let narrative = narrative.into().trim().to_string();
        if narrative.is_empty() {
            return Err(Error::InvalidInput(
                "Dream narrative must not be empty".to_string(),
            ));
        }

        Ok(Self {
            narrative,
            primary_emotions: BTreeSet::new(),
            emotion_intensity: EmotionIntensity::default(),
            additional_emotion_notes: String::new(),
            interpretation_style: style,
        })
    }

    pub fn with_emotions(mut self, emotions: impl IntoIterator<Item = Emotion>) -> Self {
        self.primary_emotions = emotions.into_iter().collect();
        self
    }

    pub fn with_intensity(mut self, intensity: EmotionIntensity) -> Self {
        self.emotion_intensity = intensity;
        self
    }

    pub fn with_notes(mut self, notes: impl Into<String>) -> Self {
        self.additional_emotion_notes = notes.into().trim().to_string();
        self
    }

    pub fn narrative(&self) -> &str {
        &self.narrative
    }

    pub fn primary_emotions(&self) -> &BTreeSet<Emotion> {
        &self.primary_emotions
    }

    pub fn emotion_intensity(&self) -> EmotionIntensity {
        self.emotion_intensity
    }

    pub fn additional_emotion_notes(&self) -> &str {
        &self.additional_emotion_notes
    }

    pub fn interpretation_style(&self) -> InterpretationStyle {
        self.interpretation_style
    }

    /// Emotions joined for display and prompts, `None` when nothing was picked.
    pub fn emotions_csv(&self) -> Option<String> {
        if self.primary_emotions.is_empty() {
            return None;
        }
        Some(
            self.primary_emotions
                .iter()
                .map(Emotion::label)
                .collect::<Vec<_>>()
                .join(", "),
        )
    }
}

/// Prompt text handed to the image model.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(transparent)]
pub struct GeneratedPrompt(String);

impl GeneratedPrompt {
    pub fn new(text: impl Into<String>) -> Self {
        Self(text.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for GeneratedPrompt {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct GeneratedImage {
    pub source_prompt: GeneratedPrompt,
    pub url: String,
}

/// Structured reading returned by the chat model.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct DreamInterpretation {
    pub symbolic_meaning: String,
    pub psychological_interpretation: String,
    pub key_symbols: Vec<String>,
    pub emotional_analysis: String,
    pub future_advice: String,
    pub positive_aspects: String,
    pub points_to_consider: String,
}

impl DreamInterpretation {
    /// Text kept in the session history for this reading.
    pub fn summary(&self) -> String {
        format!(
            "Symbolic meaning: {}\nPsychological interpretation: {}\nEmotional analysis: {}\nAdvice: {}",
            self.symbolic_meaning,
            self.psychological_interpretation,
            self.emotional_analysis,
            self.future_advice
        )
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HistoryEntry {
    pub id: Uuid,
    pub timestamp: DateTime<Local>,
    pub submission: DreamSubmission,
    pub image: GeneratedImage,
    pub summary: String,
}

impl HistoryEntry {
    pub fn new(
        submission: DreamSubmission,
        image: GeneratedImage,
        interpretation: &DreamInterpretation,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            timestamp: Local::now(),
            submission,
            image,
            summary: interpretation.summary(),
        }
    }
}

/// Outcome of the single-image script flow.
#[derive(Debug, Clone)]
pub struct Visualization {
    pub keywords: String,
    pub prompt: GeneratedPrompt,
    pub image: GeneratedImage,
}

// Configuration
pub const API_KEY_VAR: &str = "OPENAI_API_KEY";

#[derive(Debug, Clone)]
pub struct Config {
    pub openai_api_key: String,
    pub openai_base_url: String,
    pub chat_model: String,
    pub image_model: String,
    pub image_size: String,
    pub image_quality: String,
    pub output_dir: PathBuf,
    pub image_concurrency: usize,
    pub image_retries: usize,
    pub retry_delay_ms: u64,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok();

        Ok(Self {
            openai_api_key: std::env::var(API_KEY_VAR)
                .ok()
                .filter(|key| !key.trim().is_empty())
                .ok_or_else(|| Error::Config(format!("{} not set", API_KEY_VAR)))?,
            openai_base_url: std::env::var("OPENAI_BASE_URL")
                .unwrap_or_else(|_| "https://api.openai.com".to_string()),
            chat_model: std::env::var("DREAM_CHAT_MODEL")
                .unwrap_or_else(|_| "gpt-4o-mini".to_string()),
            image_model: std::env::var("DREAM_IMAGE_MODEL")
                .unwrap_or_else(|_| "dall-e-3".to_string()),
            image_size: std::env::var("DREAM_IMAGE_SIZE")
                .unwrap_or_else(|_| "1024x1024".to_string()),
            image_quality: std::env::var("DREAM_IMAGE_QUALITY")
                .unwrap_or_else(|_| "standard".to_string()),
            output_dir: std::env::var("DREAM_OUTPUT_DIR")
                .map(PathBuf::from)
                .unwrap_or_else(|_| PathBuf::from("output")),
            image_concurrency: parse_env_or("DREAM_IMAGE_CONCURRENCY", 3)?,
            image_retries: parse_env_or("DREAM_IMAGE_RETRIES", 2)?,
            retry_delay_ms: parse_env_or("DREAM_RETRY_DELAY_MS", 2000)?,
        })
    }
}

fn parse_env_or<T: FromStr>(key: &str, default: T) -> Result<T> {
    match std::env::var(key) {
        Ok(raw) => parse_setting(key, &raw),
        Err(_) => Ok(default),
    }
}

fn parse_setting<T: FromStr>(key: &str, raw: &str) -> Result<T> {
    raw.trim()
        .parse()
        .map_err(|_| Error::Config(format!("{} has invalid value '{}'", key, raw)))
}
