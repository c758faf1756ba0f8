pub mod emitter;
pub mod linebreak;
pub mod timestamp;
pub mod types;
pub mod writers;

pub use emitter::{EmittedSubtitles, SubtitleEmitter};
pub use types::{Line, Segment, WordTiming, WriterConfig};
