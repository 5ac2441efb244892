//! Dictionary lookups used by the speaker transforms.

use std::collections::HashSet;
use std::path::Path;

/// Answers whether a token is a real word
pub trait Lexicon: Send + Sync {
    fn is_word(&self, word: &str) -> bool;
}

/// Lexicon backed by a newline-separated word list (e.g. `/usr/share/dict/words`)
#[derive(Debug, Clone, Default)]
pub struct WordListLexicon {
    words: HashSet<String>,
}

/// Words the puzzle relies on that common dictionaries lack
pub const EXTRA_WORDS: &[&str] = &["spam"];

impl WordListLexicon {
    pub fn new<I, S>(words: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let words = words
            .into_iter()
            .map(|w| w.as_ref().trim().to_lowercase())
            .filter(|w| !w.is_empty())
            .collect();
        Self { words }
    }

    /// Load a word list from disk, one word per line
    pub fn from_file(path: impl AsRef<Path>) -> std::io::Result<Self> {
        let contents = std::fs::read_to_string(path.as_ref())?;
        let mut lexicon = Self::new(contents.lines());
        lexicon.add_all(EXTRA_WORDS);
        tracing::info!(
            path = %path.as_ref().display(),
            words = lexicon.len(),
            "Loaded dictionary"
        );
        Ok(lexicon)
    }

    pub fn add(&mut self, word: &str) {
        self.words.insert(word.to_lowercase());
    }

    pub fn add_all(&mut self, words: &[&str]) {
        for word in words {
            self.add(word);
        }
    }

    pub fn len(&self) -> usize {
        self.words.len()
    }

    pub fn is_empty(&self) -> bool {
        self.words.is_empty()
    }
}

impl Lexicon for WordListLexicon {
    fn is_word(&self, word: &str) -> bool {
        !word.is_empty() && self.words.contains(&word.to_lowercase())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_lookup_is_case_insensitive() {
        let lexicon = WordListLexicon::new(["Hello", "world"]);
        assert!(lexicon.is_word("hello"));
        assert!(lexicon.is_word("HELLO"));
        assert!(lexicon.is_word("World"));
        assert!(!lexicon.is_word("xyzzy"));
        assert!(!lexicon.is_word(""));
    }

    #[test]
    fn test_from_file_adds_extra_words() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "cat\nsat\n\n  the  ").unwrap();

        let lexicon = WordListLexicon::from_file(file.path()).unwrap();
        assert!(lexicon.is_word("cat"));
        assert!(lexicon.is_word("the"));
        assert!(lexicon.is_word("spam"));
        assert_eq!(lexicon.len(), 4);
    }

    #[test]
    fn test_from_missing_file_fails() {
        assert!(WordListLexicon::from_file("/nonexistent/words").is_err());
    }
}
