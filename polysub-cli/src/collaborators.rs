use std::path::{Path, PathBuf};
use std::process::Stdio;

use async_trait::async_trait;
use serde::Deserialize;
use tokio::process::Command;
use tokio_util::sync::CancellationToken;
use tracing::{instrument, warn};

use polysub_core::PipelineErrorKind;
use polysub_pipeline::{AudioExtractor, ExtractedAudio, StageError, Transcriber, TranscriptionOutput};
use polysub_subtitle::Segment;

/// Probes and extracts mono 16 kHz audio by shelling out to `ffprobe`/
/// `ffmpeg`.
pub struct FfmpegExtractor {
    ffprobe_bin: String,
    ffmpeg_bin: String,
    work_dir: PathBuf,
}

impl FfmpegExtractor {
    pub fn new(ffprobe_bin: impl Into<String>, ffmpeg_bin: impl Into<String>, work_dir: PathBuf) -> Self {
        Self {
            ffprobe_bin: ffprobe_bin.into(),
            ffmpeg_bin: ffmpeg_bin.into(),
            work_dir,
        }
    }

    async fn probe_duration(&self, source_handle: &str) -> Result<f64, StageError> {
        let output = Command::new(&self.ffprobe_bin)
            .args([
                "-v",
                "error",
                "-show_entries",
                "format=duration",
                "-of",
                "default=noprint_wrappers=1:nokey=1",
                source_handle,
            ])
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .output()
            .await
            .map_err(|err| StageError::Transient(format!("ffprobe spawn failed: {err}")))?;

        if !output.status.success() {
            return Err(StageError::Fatal(
                PipelineErrorKind::ExtractionFailed,
                format!("ffprobe exited with {}", output.status),
            ));
        }

        String::from_utf8_lossy(&output.stdout)
            .trim()
            .parse::<f64>()
            .map_err(|err| StageError::Fatal(PipelineErrorKind::ExtractionFailed, format!("unparseable duration: {err}")))
    }
}

#[async_trait]
impl AudioExtractor for FfmpegExtractor {
    #[instrument(skip(self, cancel), fields(source_handle))]
    async fn extract(&self, source_handle: &str, cancel: CancellationToken) -> Result<ExtractedAudio, StageError> {
        let duration = tokio::select! {
            res = self.probe_duration(source_handle) => res?,
            _ = cancel.cancelled() => return Err(StageError::Fatal(PipelineErrorKind::Cancelled, "cancelled during probe".to_string())),
        };

        tokio::fs::create_dir_all(&self.work_dir)
            .await
            .map_err(|err| StageError::Fatal(PipelineErrorKind::ExtractionFailed, err.to_string()))?;
        let out_path = self.work_dir.join(format!("{:x}.wav", rand_suffix(source_handle)));

        let status = tokio::select! {
            res = Command::new(&self.ffmpeg_bin)
                .args(["-y", "-i", source_handle, "-ac", "1", "-ar", "16000", "-vn"])
                .arg(&out_path)
                .stdout(Stdio::null())
                .stderr(Stdio::piped())
                .status() => res,
            _ = cancel.cancelled() => return Err(StageError::Fatal(PipelineErrorKind::Cancelled, "cancelled during extract".to_string())),
        };

        let status = status.map_err(|err| StageError::Transient(format!("ffmpeg spawn failed: {err}")))?;
        if !status.success() {
            return Err(StageError::Transient(format!("ffmpeg exited with {status}")));
        }

        Ok(ExtractedAudio {
            local_path: out_path,
            duration_seconds: duration.ceil() as u64,
        })
    }
}

fn rand_suffix(seed: &str) -> u64 {
    use std::collections::hash_map::DefaultHasher;
    use std::hash::{Hash, Hasher};
    let mut hasher = DefaultHasher::new();
    seed.hash(&mut hasher);
    hasher.finish()
}

#[derive(Deserialize)]
struct WhisperSegment {
    start: f64,
    end: f64,
    text: String,
}

#[derive(Deserialize)]
struct WhisperOutput {
    language: String,
    segments: Vec<WhisperSegment>,
}

/// Speech-to-segments by shelling out to a configured whisper-compatible
/// binary, one JSON document on stdout.
pub struct CommandLineTranscriber {
    binary: String,
    model_free: String,
    model_paid: String,
}

impl CommandLineTranscriber {
    pub fn new(binary: impl Into<String>, model_free: impl Into<String>, model_paid: impl Into<String>) -> Self {
        Self {
            binary: binary.into(),
            model_free: model_free.into(),
            model_paid: model_paid.into(),
        }
    }

    fn model_for_tier(&self, model_tier: &str) -> &str {
        if model_tier == "free" {
            &self.model_free
        } else {
            &self.model_paid
        }
    }
}

#[async_trait]
impl Transcriber for CommandLineTranscriber {
    #[instrument(skip(self, cancel), fields(model_tier))]
    async fn transcribe(
        &self,
        audio_path: &Path,
        source_language: Option<&str>,
        model_tier: &str,
        cancel: CancellationToken,
    ) -> Result<TranscriptionOutput, StageError> {
        let model = self.model_for_tier(model_tier);
        let mut command = Command::new(&self.binary);
        command.arg("--model").arg(model).arg("--output-json").arg(audio_path);
        if let Some(lang) = source_language {
            command.arg("--language").arg(lang);
        }

        let output = tokio::select! {
            res = command.stdout(Stdio::piped()).stderr(Stdio::piped()).output() => res,
            _ = cancel.cancelled() => return Err(StageError::Fatal(PipelineErrorKind::Cancelled, "cancelled during transcribe".to_string())),
        };

        let output = output.map_err(|err| StageError::Transient(format!("transcriber spawn failed: {err}")))?;
        if !output.status.success() {
            warn!(status = %output.status, "transcriber process failed");
            return Err(StageError::Transient(format!("transcriber exited with {}", output.status)));
        }

        let parsed: WhisperOutput = serde_json::from_slice(&output.stdout)
            .map_err(|err| StageError::Fatal(PipelineErrorKind::TranscriptionFailed, format!("malformed transcriber output: {err}")))?;

        Ok(TranscriptionOutput {
            detected_language: parsed.language,
            segments: parsed.segments.into_iter().map(|s| Segment::new(s.start, s.end, s.text)).collect(),
        })
    }
}
