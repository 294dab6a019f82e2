pub mod whisper_cpp;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// A single recognized token with its own timing, in seconds.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Word {
    #[serde(default)]
    pub text: String,
    pub start: f64,
    pub end: f64,
}

impl Word {
    pub fn new(text: impl Into<String>, start: f64, end: f64) -> Self {
        Self {
            text: text.into(),
            start,
            end,
        }
    }
}

/// One unit of recognized speech.
///
/// Whisper-style JSON carries `start`/`end`/`text` on every segment and adds a
/// `words` array when word timestamps were requested, so `Words` is tried first.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Segment {
    Words { words: Vec<Word> },
    Flat { start: f64, end: f64, text: String },
}

impl Segment {
    pub fn is_word_level(&self) -> bool {
        matches!(self, Segment::Words { .. })
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Transcription {
    #[serde(default)]
    pub segments: Vec<Segment>,
}

impl Transcription {
    pub fn new(segments: Vec<Segment>) -> Self {
        Self { segments }
    }

    pub fn from_json_str(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn word_count(&self) -> usize {
        self.segments
            .iter()
            .map(|segment| match segment {
                Segment::Words { words } => words.len(),
                Segment::Flat { .. } => 0,
            })
            .sum()
    }
}

pub fn load_transcript_json(path: &Path) -> Result<Transcription> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read transcript {:?}", path))?;
    Transcription::from_json_str(&content)
        .with_context(|| format!("Failed to parse transcript {:?}", path))
}
