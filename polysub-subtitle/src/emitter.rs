use tracing::instrument;

use crate::linebreak::reflow;
use crate::types::{Segment, WriterConfig};
use crate::writers::{write_json, write_srt, write_vtt};

/// The three artifact bodies the pipeline driver uploads.
#[derive(Debug, Clone)]
pub struct EmittedSubtitles {
    pub srt: String,
    pub vtt: String,
    pub json: String,
}

/// Line-breaking + SRT/WebVTT/JSON writer facade.
#[derive(Debug, Clone)]
pub struct SubtitleEmitter {
    config: WriterConfig,
}

impl SubtitleEmitter {
    pub fn new(config: WriterConfig) -> Self {
        Self { config }
    }

    #[instrument(skip(self, segments), fields(segment_count = segments.len()))]
    pub fn emit(&self, segments: &[Segment]) -> serde_json::Result<EmittedSubtitles> {
        let lines = reflow(segments, &self.config);
        Ok(EmittedSubtitles {
            srt: write_srt(&lines),
            vtt: write_vtt(&lines),
            json: write_json(&lines)?,
        })
    }
}

impl Default for SubtitleEmitter {
    fn default() -> Self {
        Self::new(WriterConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn emit_is_deterministic_for_same_input() {
        let emitter = SubtitleEmitter::default();
        let segments = vec![Segment::new(0.0, 2.0, "hello there friend")];
        let a = emitter.emit(&segments).unwrap();
        let b = emitter.emit(&segments).unwrap();
        assert_eq!(a.srt, b.srt);
        assert_eq!(a.vtt, b.vtt);
        assert_eq!(a.json, b.json);
    }

    #[test]
    fn timestamps_are_non_negative_and_ordered() {
        let emitter = SubtitleEmitter::default();
        let segments = vec![
            Segment::new(0.0, 1.0, "first"),
            Segment::new(1.0, 2.0, "second"),
        ];
        let emitted = emitter.emit(&segments).unwrap();
        assert!(emitted.srt.contains("00:00:00,000 --> 00:00:01,000"));
        assert!(emitted.vtt.contains("00:00:01.000 --> 00:00:02.000"));
    }
}
