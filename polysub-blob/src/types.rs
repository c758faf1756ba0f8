use std::pin::Pin;

use bytes::Bytes;
use futures::Stream;
use serde::{Deserialize, Serialize};

/// Stream of bytes for blob content.
pub type ByteStream = Pin<Box<dyn Stream<Item = Result<Bytes, std::io::Error>> + Send>>;

/// Object category under a tenant's prefix.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum BlobKind {
    Audio,
    SubtitlesSrt,
    SubtitlesVtt,
    SubtitlesJson,
}

impl BlobKind {
    /// The `kind` path segment used in object keys.
    pub fn path(&self) -> &'static str {
        match self {
            BlobKind::Audio => "audio",
            BlobKind::SubtitlesSrt => "subtitles/srt",
            BlobKind::SubtitlesVtt => "subtitles/vtt",
            BlobKind::SubtitlesJson => "subtitles/json",
        }
    }

    /// The file extension conventionally stored alongside this kind.
    pub fn extension(&self) -> &'static str {
        match self {
            BlobKind::Audio => ".wav",
            BlobKind::SubtitlesSrt => ".srt",
            BlobKind::SubtitlesVtt => ".vtt",
            BlobKind::SubtitlesJson => ".json",
        }
    }
}

/// Result of a successful low-level store write.
#[derive(Debug, Clone)]
pub struct PutResult {
    pub size_bytes: u64,
    pub etag: Option<String>,
}
