//! Per-speaker text transforms.
//!
//! Every speaker role garbles chat text in its own way; players have to work
//! out which transform they were given and phrase their messages so the
//! transformed output spells the answer.

use crate::lexicon::Lexicon;
use crate::translate::TranslationClient;
use crate::types::SpeakerRole;
use regex::{Captures, Regex};
use std::path::Path;
use std::sync::{Arc, LazyLock};

static WORD: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\w+").expect("valid regex"));

/// Separators for translation; apostrophes stay inside words ("don't")
static TRANSLATE_SEPARATOR: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[^\w']+").expect("valid regex"));

static REFERENCE_WORD: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[\w']+(?:-[\w']+)?").expect("valid regex"));

/// Which transform a role applies
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Strategy {
    /// Mask unknown words, then translate to French
    Translate,
    /// Replace each sentence with the reference word its letter score indexes
    LexicalScore,
    /// Reverse every known word
    Reverse,
    PassThrough,
}

impl Strategy {
    pub fn for_role(role: SpeakerRole) -> Self {
        match role.get() {
            1 => Strategy::Translate,
            2 => Strategy::LexicalScore,
            3 => Strategy::Reverse,
            _ => Strategy::PassThrough,
        }
    }
}

/// Reference text split into words, addressed from 1.
///
/// Slot 0 is reserved so a sentence score indexes the text directly.
#[derive(Debug, Clone)]
pub struct ReferenceIndex {
    words: Vec<String>,
}

impl ReferenceIndex {
    pub fn from_text(text: &str) -> Self {
        let mut words = vec![String::new()];
        words.extend(
            REFERENCE_WORD
                .find_iter(text)
                .map(|m| m.as_str().to_lowercase()),
        );
        Self { words }
    }

    pub fn from_file(path: impl AsRef<Path>) -> std::io::Result<Self> {
        let text = std::fs::read_to_string(path.as_ref())?;
        let index = Self::from_text(&text);
        tracing::info!(
            path = %path.as_ref().display(),
            words = index.len() - 1,
            "Loaded reference text"
        );
        Ok(index)
    }

    /// Number of slots, counting the reserved one
    pub fn len(&self) -> usize {
        self.words.len()
    }

    pub fn is_empty(&self) -> bool {
        self.words.len() <= 1
    }

    /// Word at a 1-based score, if the score lands inside the text
    pub fn get(&self, score: u32) -> Option<&str> {
        let index = score as usize;
        (index > 0 && index < self.words.len()).then(|| self.words[index].as_str())
    }
}

fn mask(word: &str) -> String {
    "*".repeat(word.chars().count())
}

/// Sum of alphabet positions (a=1..z=26); anything else scores 0
pub fn letter_score(word: &str) -> u32 {
    word.chars()
        .filter(|c| c.is_ascii_alphabetic())
        .map(|c| (c.to_ascii_lowercase() as u8 - b'a' + 1) as u32)
        .sum()
}

/// Lower-case known words and star out the rest, keeping separators as-is
pub fn mask_for_translation(lexicon: &dyn Lexicon, text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let push_word = |word: &str, out: &mut String| {
        if word.is_empty() {
            return;
        }
        if lexicon.is_word(word) {
            out.push_str(&word.to_lowercase());
        } else {
            out.push_str(&mask(word));
        }
    };

    let mut last = 0;
    for sep in TRANSLATE_SEPARATOR.find_iter(text) {
        push_word(&text[last..sep.start()], &mut out);
        out.push_str(sep.as_str());
        last = sep.end();
    }
    push_word(&text[last..], &mut out);

    out.trim().to_string()
}

pub fn lexical_score(lexicon: &dyn Lexicon, reference: &ReferenceIndex, text: &str) -> String {
    let mut out: Vec<String> = Vec::new();

    for sentence in text.split(['.', '!', '?']) {
        let mut total = 0;
        for word in WORD.find_iter(sentence).map(|m| m.as_str()) {
            if lexicon.is_word(word) {
                total += letter_score(word);
            } else {
                out.push(mask(word));
            }
        }

        if let Some(word) = reference.get(total) {
            out.push(word.to_string());
        }
        tracing::trace!(sentence, total, "Scored sentence");
    }

    out.join(" ")
}

pub fn reverse_words(lexicon: &dyn Lexicon, text: &str) -> String {
    WORD.replace_all(text, |caps: &Captures| {
        let word = &caps[0];
        if lexicon.is_word(word) {
            word.chars().rev().collect::<String>()
        } else {
            mask(word)
        }
    })
    .into_owned()
}

/// The transform pipeline shared by every team
pub struct TextTransform {
    lexicon: Arc<dyn Lexicon>,
    reference: ReferenceIndex,
    translator: Option<Arc<TranslationClient>>,
}

impl TextTransform {
    pub fn new(
        lexicon: Arc<dyn Lexicon>,
        reference: ReferenceIndex,
        translator: Option<Arc<TranslationClient>>,
    ) -> Self {
        Self {
            lexicon,
            reference,
            translator,
        }
    }

    pub async fn transform(&self, role: SpeakerRole, text: &str) -> String {
        match Strategy::for_role(role) {
            Strategy::Translate => self.translate(text).await,
            Strategy::LexicalScore => lexical_score(self.lexicon.as_ref(), &self.reference, text),
            Strategy::Reverse => reverse_words(self.lexicon.as_ref(), text),
            Strategy::PassThrough => text.to_string(),
        }
    }

    async fn translate(&self, text: &str) -> String {
        let masked = mask_for_translation(self.lexicon.as_ref(), text);
        if masked.is_empty() {
            return String::new();
        }

        match &self.translator {
            Some(translator) => translator.translate(&masked).await,
            None => {
                tracing::warn!("No translator configured, dropping translation");
                String::new()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lexicon::WordListLexicon;
    use crate::translate::mock::{CountingTokens, EchoBackend, ScriptedBackend};
    use crate::translate::TranslateError;

    fn lexicon() -> WordListLexicon {
        WordListLexicon::new(["hello", "world", "a", "b", "the", "cat", "sat", "don't"])
    }

    fn role(n: u32) -> SpeakerRole {
        SpeakerRole::new(n).unwrap()
    }

    #[test]
    fn test_strategy_for_role() {
        assert_eq!(Strategy::for_role(role(1)), Strategy::Translate);
        assert_eq!(Strategy::for_role(role(2)), Strategy::LexicalScore);
        assert_eq!(Strategy::for_role(role(3)), Strategy::Reverse);
        assert_eq!(Strategy::for_role(role(4)), Strategy::PassThrough);
    }

    #[test]
    fn test_reverse_words() {
        let lex = lexicon();
        assert_eq!(reverse_words(&lex, "hello world xyzzy"), "olleh dlrow *****");
        assert_eq!(reverse_words(&lex, "Hello, world!!"), "olleH, dlrow!!");
        assert_eq!(reverse_words(&lex, "  "), "  ");
    }

    #[test]
    fn test_letter_score() {
        assert_eq!(letter_score("a"), 1);
        assert_eq!(letter_score("Cat"), 24);
        assert_eq!(letter_score("z9_"), 26);
        assert_eq!(letter_score(""), 0);
    }

    #[test]
    fn test_reference_index_reserves_slot_zero() {
        let reference = ReferenceIndex::from_text("The cat sat.");
        assert_eq!(reference.len(), 4);
        assert_eq!(reference.get(0), None);
        assert_eq!(reference.get(1), Some("the"));
        assert_eq!(reference.get(2), Some("cat"));
        assert_eq!(reference.get(3), Some("sat"));
        assert_eq!(reference.get(4), None);
    }

    #[test]
    fn test_reference_index_keeps_hyphens_and_apostrophes() {
        let reference = ReferenceIndex::from_text("self-evident, that all men's rights");
        assert_eq!(reference.get(1), Some("self-evident"));
        assert_eq!(reference.get(4), Some("men's"));
    }

    #[test]
    fn test_lexical_score_selects_reference_word() {
        let lex = lexicon();
        let reference = ReferenceIndex::from_text("the cat sat");

        // "b" scores 2 -> "cat"
        assert_eq!(lexical_score(&lex, &reference, "b"), "cat");
        // "a a" scores 2 as well; unknown words are starred
        assert_eq!(lexical_score(&lex, &reference, "a xyzzy a"), "***** cat");
        // Two sentences score independently
        assert_eq!(lexical_score(&lex, &reference, "a. b! a a a?"), "the cat sat");
    }

    #[test]
    fn test_lexical_score_out_of_range() {
        let lex = lexicon();
        let reference = ReferenceIndex::from_text("the cat sat");

        assert_eq!(lexical_score(&lex, &reference, "xyzzy"), "*****");
        assert_eq!(lexical_score(&lex, &reference, "hello"), "");
        assert_eq!(lexical_score(&lex, &reference, ""), "");
    }

    #[test]
    fn test_mask_for_translation() {
        let lex = lexicon();
        assert_eq!(mask_for_translation(&lex, "Hello, WORLD"), "hello, world");
        assert_eq!(mask_for_translation(&lex, "hello frobnitz!"), "hello ********!");
        assert_eq!(mask_for_translation(&lex, " don't  cat "), "don't  cat");
        assert_eq!(mask_for_translation(&lex, "   "), "");
    }

    #[tokio::test]
    async fn test_transform_dispatch() {
        let tokens = Arc::new(CountingTokens::default());
        let translator = Arc::new(TranslationClient::new(tokens, Arc::new(EchoBackend)));
        let transform = TextTransform::new(
            Arc::new(lexicon()),
            ReferenceIndex::from_text("the cat sat"),
            Some(translator),
        );

        assert_eq!(transform.transform(role(1), "hello xyzzy").await, "[hello *****]");
        assert_eq!(transform.transform(role(2), "b").await, "cat");
        assert_eq!(transform.transform(role(3), "hello").await, "olleh");
        assert_eq!(transform.transform(role(4), "Hello!").await, "Hello!");
    }

    #[tokio::test]
    async fn test_translation_failure_is_empty() {
        let backend = Arc::new(ScriptedBackend::new(vec![Err(TranslateError::Status(500))]));
        let translator = Arc::new(TranslationClient::new(
            Arc::new(CountingTokens::default()),
            backend.clone(),
        ));
        let transform = TextTransform::new(
            Arc::new(lexicon()),
            ReferenceIndex::from_text(""),
            Some(translator),
        );

        assert_eq!(transform.transform(role(1), "hello").await, "");
        // Blank input never reaches the remote
        assert_eq!(transform.transform(role(1), "   ").await, "");
        assert_eq!(backend.call_count(), 1);
    }

    #[tokio::test]
    async fn test_translation_without_translator() {
        let transform =
            TextTransform::new(Arc::new(lexicon()), ReferenceIndex::from_text(""), None);
        assert_eq!(transform.transform(role(1), "hello").await, "");
    }
}
