use serde::Serialize;
use std::fmt::Write as _;

use crate::timestamp::{format_srt, format_vtt};
use crate::types::Line;

/// `i\n{start} --> {end}\n{text}\n\n` per line.
pub fn write_srt(lines: &[Line]) -> String {
    let mut out = String::new();
    for line in lines {
        let _ = writeln!(out, "{}", line.id);
        let _ = writeln!(out, "{} --> {}", format_srt(line.start), format_srt(line.end));
        let _ = writeln!(out, "{}", line.text);
        let _ = writeln!(out);
    }
    out
}

/// `WEBVTT\n\n` header then `{start} --> {end}\n{text}\n\n` per line.
pub fn write_vtt(lines: &[Line]) -> String {
    let mut out = String::from("WEBVTT\n\n");
    for line in lines {
        let _ = writeln!(out, "{} --> {}", format_vtt(line.start), format_vtt(line.end));
        let _ = writeln!(out, "{}", line.text);
        let _ = writeln!(out);
    }
    out
}

#[derive(Serialize)]
struct JsonEntry<'a> {
    id: usize,
    start: f64,
    end: f64,
    text: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    original_text: Option<&'a str>,
}

/// A single UTF-8, `\n`-terminated JSON array of `{id, start, end, text}`
/// (plus `original_text` when translated).
pub fn write_json(lines: &[Line]) -> serde_json::Result<String> {
    let entries: Vec<JsonEntry> = lines
        .iter()
        .map(|line| JsonEntry {
            id: line.id,
            start: line.start,
            end: line.end,
            text: &line.text,
            original_text: line.original_text.as_deref(),
        })
        .collect();
    let mut s = serde_json::to_string(&entries)?;
    s.push('\n');
    Ok(s)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_lines() -> Vec<Line> {
        vec![
            Line { id: 1, start: 0.0, end: 1.5, text: "hello".into(), original_text: None },
            Line { id: 2, start: 1.5, end: 3.0, text: "world".into(), original_text: Some("mundo".into()) },
        ]
    }

    #[test]
    fn srt_format_has_index_timing_and_blank_line() {
        let srt = write_srt(&sample_lines());
        assert!(srt.starts_with("1\n00:00:00,000 --> 00:00:01,500\nhello\n\n"));
    }

    #[test]
    fn vtt_has_header_and_dot_separator() {
        let vtt = write_vtt(&sample_lines());
        assert!(vtt.starts_with("WEBVTT\n\n"));
        assert!(vtt.contains("00:00:00.000 --> 00:00:01.500"));
    }

    #[test]
    fn json_is_array_and_newline_terminated() {
        let json = write_json(&sample_lines()).unwrap();
        assert!(json.ends_with('\n'));
        let parsed: serde_json::Value = serde_json::from_str(json.trim_end()).unwrap();
        assert_eq!(parsed.as_array().unwrap().len(), 2);
        assert_eq!(parsed[0]["text"], "hello");
        assert_eq!(parsed[1]["original_text"], "mundo");
    }
}
