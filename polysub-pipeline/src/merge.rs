use polysub_subtitle::Segment;

const MAX_MERGED_DURATION_SECS: f64 = 4.0;

fn lacks_sentence_final_punctuation(text: &str) -> bool {
    !matches!(text.trim_end().chars().last(), Some('.') | Some('!') | Some('?'))
}

fn starts_lowercase(text: &str) -> bool {
    text.trim_start().chars().next().map(|c| c.is_lowercase()).unwrap_or(false)
}

/// Drops whitespace-only segments and merges consecutive segments whose gap
/// is non-positive and whose text suggests a single broken sentence
///.
pub fn merge_consecutive_segments(segments: Vec<Segment>) -> Vec<Segment> {
    let mut merged: Vec<Segment> = Vec::new();

    for segment in segments {
        if segment.text.trim().is_empty() {
            continue;
        }

        if let Some(prev) = merged.last_mut() {
            let gap = segment.start - prev.end;
            let combined_duration = segment.end - prev.start;
            let should_merge = gap <= 0.0
                && combined_duration <= MAX_MERGED_DURATION_SECS
                && (starts_lowercase(&segment.text) || lacks_sentence_final_punctuation(&prev.text));

            if should_merge {
                prev.end = segment.end;
                prev.text = format!("{} {}", prev.text.trim_end(), segment.text.trim_start());
                if let (Some(prev_words), Some(words)) = (&mut prev.words, segment.words.clone()) {
                    prev_words.extend(words);
                }
                continue;
            }
        }

        merged.push(segment);
    }

    merged
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn drops_whitespace_only_segments() {
        let segments = vec![Segment::new(0.0, 1.0, "hello"), Segment::new(1.0, 2.0, "   ")];
        let result = merge_consecutive_segments(segments);
        assert_eq!(result.len(), 1);
    }

    #[test]
    fn merges_split_sentence_on_zero_gap() {
        let segments = vec![Segment::new(0.0, 1.0, "I went to the"), Segment::new(1.0, 1.5, "store today.")];
        let result = merge_consecutive_segments(segments);
        assert_eq!(result.len(), 1);
        assert_eq!(result[0].text, "I went to the store today.");
        assert_eq!(result[0].end, 1.5);
    }

    #[test]
    fn does_not_merge_across_a_gap() {
        let segments = vec![Segment::new(0.0, 1.0, "hello"), Segment::new(1.5, 2.0, "world")];
        let result = merge_consecutive_segments(segments);
        assert_eq!(result.len(), 2);
    }

    #[test]
    fn does_not_merge_past_duration_cap() {
        let segments = vec![Segment::new(0.0, 3.5, "a long running clause that"), Segment::new(3.5, 4.6, "keeps going")];
        let result = merge_consecutive_segments(segments);
        assert_eq!(result.len(), 2);
    }

    #[test]
    fn keeps_separate_sentences_with_terminal_punctuation_and_capital() {
        let segments = vec![Segment::new(0.0, 1.0, "Hello there."), Segment::new(1.0, 2.0, "Goodbye now.")];
        let result = merge_consecutive_segments(segments);
        assert_eq!(result.len(), 2);
    }
}
