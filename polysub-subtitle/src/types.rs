use serde::{Deserialize, Serialize};

/// Per-word timing, when the transcription engine provides it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WordTiming {
    pub start: f64,
    pub end: f64,
    pub word: String,
}

/// One transcribed (or translated) segment, timings in seconds.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Segment {
    pub start: f64,
    pub end: f64,
    pub text: String,
    pub original_text: Option<String>,
    pub words: Option<Vec<WordTiming>>,
}

impl Segment {
    pub fn new(start: f64, end: f64, text: impl Into<String>) -> Self {
        Self {
            start,
            end,
            text: text.into(),
            original_text: None,
            words: None,
        }
    }

    pub fn with_words(mut self, words: Vec<WordTiming>) -> Self {
        self.words = Some(words);
        self
    }

    pub fn with_original_text(mut self, text: impl Into<String>) -> Self {
        self.original_text = Some(text.into());
        self
    }
}

/// A reflowed output line, after line-breaking. Line numbering
/// is re-assigned 1-based across the whole stream, independent of segment
/// boundaries.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Line {
    pub id: usize,
    pub start: f64,
    pub end: f64,
    pub text: String,
    pub original_text: Option<String>,
}

/// Writer configuration.
#[derive(Debug, Clone, Copy)]
pub struct WriterConfig {
    pub max_line_width: usize,
    pub max_line_count: usize,
}

impl Default for WriterConfig {
    fn default() -> Self {
        Self {
            max_line_width: 42,
            max_line_count: 2,
        }
    }
}
