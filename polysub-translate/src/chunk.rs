use std::collections::HashMap;

/// A greedily-packed group of segment indices serialized as `[SEGk] <text>`
/// lines, kept under the per-call character budget.
#[derive(Debug, Clone)]
pub struct Block {
    pub indices: Vec<usize>,
    pub prompt: String,
}

fn marker_line(index: usize, text: &str) -> String {
    format!("[SEG{index}] {text}")
}

/// Groups `(index, text)` pairs into blocks whose serialized prompt stays
/// under `char_budget` characters, including the newline separators.
pub fn chunk_texts(texts: &[(usize, &str)], char_budget: usize) -> Vec<Block> {
    let mut blocks = Vec::new();
    let mut indices = Vec::new();
    let mut prompt = String::new();

    for (index, text) in texts {
        let line = marker_line(*index, text);
        let extra = if prompt.is_empty() { line.len() } else { line.len() + 1 };

        if !prompt.is_empty() && prompt.len() + extra > char_budget {
            blocks.push(Block {
                indices: std::mem::take(&mut indices),
                prompt: std::mem::take(&mut prompt),
            });
        }

        if !prompt.is_empty() {
            prompt.push('\n');
        }
        prompt.push_str(&line);
        indices.push(*index);
    }

    if !indices.is_empty() {
        blocks.push(Block { indices, prompt });
    }

    blocks
}

/// Parses a provider's response back into `index -> translated text` by
/// splitting on the `[SEGk]` markers. Lines whose marker fails to parse are
/// simply absent from the returned map; callers fall back to the original
/// text for any index missing from it.
pub fn parse_markers(response: &str) -> HashMap<usize, String> {
    let mut out = HashMap::new();
    for line in response.lines() {
        let line = line.trim();
        let Some(rest) = line.strip_prefix("[SEG") else { continue };
        let Some(close) = rest.find(']') else { continue };
        let Ok(index) = rest[..close].parse::<usize>() else { continue };
        let text = rest[close + 1..].trim_start();
        out.insert(index, text.to_string());
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn packs_within_budget() {
        let texts = vec![(0, "a".repeat(10).leak() as &str), (1, "b".repeat(10).leak() as &str)];
        let blocks = chunk_texts(&texts, 20);
        assert_eq!(blocks.len(), 2);
    }

    #[test]
    fn fits_multiple_short_segments_in_one_block() {
        let texts = vec![(0, "hi"), (1, "there"), (2, "friend")];
        let blocks = chunk_texts(&texts, 4000);
        assert_eq!(blocks.len(), 1);
        assert_eq!(blocks[0].indices, vec![0, 1, 2]);
    }

    #[test]
    fn roundtrips_markers() {
        let response = "[SEG0] olá\n[SEG1] mundo";
        let parsed = parse_markers(response);
        assert_eq!(parsed.get(&0), Some(&"olá".to_string()));
        assert_eq!(parsed.get(&1), Some(&"mundo".to_string()));
    }

    #[test]
    fn malformed_marker_is_dropped() {
        let response = "[SEGx] broken\n[SEG2] ok";
        let parsed = parse_markers(response);
        assert!(!parsed.contains_key(&0));
        assert_eq!(parsed.get(&2), Some(&"ok".to_string()));
    }
}
