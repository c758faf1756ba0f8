use crate::types::{Line, Segment, WriterConfig};

struct VisualLine {
    text: String,
    start: f64,
    end: f64,
    original_text: Option<String>,
}

/// Packs `words` (each `width` characters, one separator each) into lines no
/// wider than `max_width`. Mirrors the greedy-packing fallback the original
/// subtitle generator uses when no per-word timing is available.
fn pack_greedy(words: &[&str], max_width: usize) -> Vec<String> {
    let mut lines = Vec::new();
    let mut current = String::new();

    for word in words {
        let candidate_len = if current.is_empty() {
            word.len()
        } else {
            current.len() + 1 + word.len()
        };

        if candidate_len > max_width && !current.is_empty() {
            lines.push(std::mem::take(&mut current));
        }

        if !current.is_empty() {
            current.push(' ');
        }
        current.push_str(word);
    }

    if !current.is_empty() {
        lines.push(current);
    }

    lines
}

fn visual_lines_for_segment(segment: &Segment, max_width: usize) -> Vec<VisualLine> {
    if let Some(words) = &segment.words {
        let mut lines = Vec::new();
        let mut current_words: Vec<&str> = Vec::new();
        let mut current_width = 0usize;
        let mut line_start = None;
        let mut line_end = 0.0;

        for word in words {
            let extra = if current_words.is_empty() {
                word.word.len()
            } else {
                1 + word.word.len()
            };

            if current_width + extra > max_width && !current_words.is_empty() {
                lines.push(VisualLine {
                    text: current_words.join(" "),
                    start: line_start.unwrap_or(segment.start),
                    end: line_end,
                    original_text: segment.original_text.clone(),
                });
                current_words.clear();
                current_width = 0;
                line_start = None;
            }

            if line_start.is_none() {
                line_start = Some(word.start);
            }
            line_end = word.end;
            current_width += if current_words.is_empty() { word.word.len() } else { 1 + word.word.len() };
            current_words.push(&word.word);
        }

        if !current_words.is_empty() {
            lines.push(VisualLine {
                text: current_words.join(" "),
                start: line_start.unwrap_or(segment.start),
                end: line_end,
                original_text: segment.original_text.clone(),
            });
        }

        if lines.is_empty() {
            lines.push(VisualLine {
                text: String::new(),
                start: segment.start,
                end: segment.end,
                original_text: segment.original_text.clone(),
            });
        }

        lines
    } else {
        let words: Vec<&str> = segment.text.split_whitespace().collect();
        let packed = pack_greedy(&words, max_width);
        let n = packed.len().max(1);
        let duration = segment.end - segment.start;
        let slice = duration / n as f64;

        packed
            .into_iter()
            .enumerate()
            .map(|(i, text)| {
                let start = segment.start + slice * i as f64;
                let end = if i + 1 == n { segment.end } else { start + slice };
                VisualLine {
                    text,
                    start,
                    end,
                    original_text: segment.original_text.clone(),
                }
            })
            .collect()
    }
}

/// Groups a segment's visual lines into cues of at most `max_line_count`
/// wrapped lines each, joined by `\n`.
fn group_into_cues(visual_lines: Vec<VisualLine>, max_line_count: usize) -> Vec<VisualLine> {
    let mut cues = Vec::new();
    for chunk in visual_lines.chunks(max_line_count.max(1)) {
        let text = chunk.iter().map(|l| l.text.as_str()).collect::<Vec<_>>().join("\n");
        let start = chunk.first().map(|l| l.start).unwrap_or(0.0);
        let end = chunk.last().map(|l| l.end).unwrap_or(0.0);
        let original_text = chunk.first().and_then(|l| l.original_text.clone());
        cues.push(VisualLine {
            text,
            start,
            end,
            original_text,
        });
    }
    cues
}

/// Reflows segments into emitted cues: word-boundary wrapping when per-word
/// timing is present, greedy text wrapping with equal time division
/// otherwise. Drops segments whose text is whitespace-only
/// (transcribing-stage empty-segment policy applies upstream, but the
/// emitter defends against it too).
pub fn reflow(segments: &[Segment], config: &WriterConfig) -> Vec<Line> {
    let mut cues = Vec::new();

    for segment in segments {
        if segment.text.trim().is_empty() {
            continue;
        }
        let visual = visual_lines_for_segment(segment, config.max_line_width);
        cues.extend(group_into_cues(visual, config.max_line_count));
    }

    let mut lines: Vec<Line> = Vec::with_capacity(cues.len());
    for (index, cue) in cues.into_iter().enumerate() {
        let mut start = cue.start;
        if let Some(prev) = lines.last() {
            if start < prev.end {
                start = prev.end;
            }
        }
        let end = cue.end.max(start);
        lines.push(Line {
            id: index + 1,
            start,
            end,
            text: cue.text,
            original_text: cue.original_text,
        });
    }

    lines
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::WordTiming;

    #[test]
    fn fallback_wraps_and_divides_duration_equally() {
        let segment = Segment::new(
            0.0,
            4.0,
            "the quick brown fox jumps over the lazy dog and then some more words here",
        );
        let config = WriterConfig { max_line_width: 20, max_line_count: 99 };
        let lines = reflow(&[segment], &config);
        assert!(lines.len() > 1);
        for w in lines.windows(2) {
            assert!(w[1].start >= w[0].end);
        }
    }

    #[test]
    fn word_timed_segment_breaks_at_word_boundaries() {
        let words = vec![
            WordTiming { start: 0.0, end: 0.5, word: "hello".into() },
            WordTiming { start: 0.5, end: 1.0, word: "there".into() },
            WordTiming { start: 1.0, end: 1.5, word: "friend".into() },
        ];
        let segment = Segment::new(0.0, 1.5, "hello there friend").with_words(words);
        let config = WriterConfig { max_line_width: 11, max_line_count: 99 };
        let lines = reflow(&[segment], &config);
        assert_eq!(lines[0].text, "hello there");
        assert_eq!(lines[0].start, 0.0);
        assert_eq!(lines[0].end, 1.0);
    }

    #[test]
    fn whitespace_only_segment_is_dropped() {
        let segment = Segment::new(0.0, 1.0, "   ");
        let lines = reflow(&[segment], &WriterConfig::default());
        assert!(lines.is_empty());
    }

    #[test]
    fn line_numbering_is_reassigned_1_based_across_stream() {
        let segments = vec![
            Segment::new(0.0, 2.0, "first segment here with enough words to wrap twice over"),
            Segment::new(2.0, 4.0, "second segment also long enough to wrap more than once"),
        ];
        let config = WriterConfig { max_line_width: 15, max_line_count: 1 };
        let lines = reflow(&segments, &config);
        for (i, line) in lines.iter().enumerate() {
            assert_eq!(line.id, i + 1);
        }
    }
}
