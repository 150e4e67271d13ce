//! Character-level text tokeniser.
//!
//! F5-TTS vocabularies list one token per line of `vocab.txt`; the token id is
//! the line index.  Text is split into Unicode characters and each character
//! looked up.  Unknown characters map to id 0 (the filler token on line 0).
//!
//! Checkpoints without a vocabulary are byte-level: every UTF-8 byte is its
//! own id.

use std::{collections::HashMap, path::Path};

use anyhow::{Context, Result};

/// Id used for characters missing from the vocabulary.
pub const UNKNOWN_ID: i64 = 0;

#[derive(Debug, Clone)]
pub enum TextTokenizer {
    Vocab(HashMap<char, i64>),
    Bytes,
}

impl TextTokenizer {
    /// Load `vocab.txt`, or use the byte-level tokenizer when `path` is `None`.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let Some(path) = path else {
            return Ok(Self::Bytes);
        };
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("Cannot read vocabulary: {}", path.display()))?;
        Ok(Self::from_vocab_text(&text))
    }

    /// Build a vocabulary from the contents of `vocab.txt`.
    ///
    /// Only the first character of each line is significant; the first
    /// occurrence of a character keeps its id.
    pub fn from_vocab_text(text: &str) -> Self {
        let mut map = HashMap::new();
        for (i, line) in text.split('\n').enumerate() {
            let line = line.strip_suffix('\r').unwrap_or(line);
            if let Some(c) = line.chars().next() {
                map.entry(c).or_insert(i as i64);
            }
        }
        Self::Vocab(map)
    }

    pub fn encode(&self, text: &str) -> Vec<i64> {
        match self {
            Self::Vocab(map) => text
                .chars()
                .map(|c| map.get(&c).copied().unwrap_or(UNKNOWN_ID))
                .collect(),
            Self::Bytes => text.bytes().map(i64::from).collect(),
        }
    }

    /// Number of distinct tokens (256 for the byte tokenizer).
    pub fn len(&self) -> usize {
        match self {
            Self::Vocab(map) => map.len(),
            Self::Bytes => 256,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_vocab_ids_are_line_indices() {
        let tok = TextTokenizer::from_vocab_text(" \nп\nр\nи\nв\nе\nт\n");
        assert_eq!(tok.encode("привет"), vec![1, 2, 3, 4, 5, 6]);
        assert_eq!(tok.encode("и т"), vec![3, 0, 6]);
    }

    #[test]
    fn test_unknown_maps_to_zero() {
        let tok = TextTokenizer::from_vocab_text("_\na\n");
        assert_eq!(tok.encode("ab"), vec![1, UNKNOWN_ID]);
    }

    #[test]
    fn test_crlf_lines() {
        let tok = TextTokenizer::from_vocab_text("_\r\nx\r\ny\r\n");
        assert_eq!(tok.encode("yx"), vec![2, 1]);
        assert_eq!(tok.len(), 3);
    }

    #[test]
    fn test_byte_tokenizer() {
        let tok = TextTokenizer::Bytes;
        assert_eq!(tok.encode("hi"), vec![104, 105]);
        // Cyrillic letters are two bytes each in UTF-8.
        assert_eq!(tok.encode("п").len(), 2);
        assert_eq!(tok.len(), 256);
    }

    #[test]
    fn test_load_without_vocab() {
        assert!(matches!(TextTokenizer::load(None).unwrap(), TextTokenizer::Bytes));
    }

    #[test]
    fn test_load_from_file() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("vocab.txt");
        std::fs::write(&path, " \na\nb").unwrap();
        let tok = TextTokenizer::load(Some(&path)).unwrap();
        assert_eq!(tok.encode("ba"), vec![2, 1]);
    }
}
