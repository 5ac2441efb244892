use serde::{Deserialize, Serialize};
use std::fmt;

/// Opaque ID types
pub type TeamId = String;
pub type SessionId = String;
pub type WaitToken = String;

/// A speaker role, numbered from 1
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SpeakerRole(u32);

impl SpeakerRole {
    pub const FIRST: SpeakerRole = SpeakerRole(1);

    pub fn new(n: u32) -> Option<Self> {
        (n >= 1).then_some(Self(n))
    }

    pub fn get(self) -> u32 {
        self.0
    }

    /// The role after this one, wrapping back to 1 after `count`
    pub fn next(self, count: u32) -> Self {
        if self.0 >= count {
            Self::FIRST
        } else {
            Self(self.0 + 1)
        }
    }
}

impl fmt::Display for SpeakerRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Speaker {}", self.0)
    }
}

/// Uppercase the text and keep only its word runs, single-space separated.
///
/// `"War, AND Peace!"` becomes `"WAR AND PEACE"`.
pub fn canonicalize(text: &str) -> String {
    text.to_uppercase()
        .split(|c: char| !(c.is_alphanumeric() || c == '_'))
        .filter(|w| !w.is_empty())
        .collect::<Vec<_>>()
        .join(" ")
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Clue {
    /// What the mayor says when the clue comes up
    pub text: String,
    /// Canonical answer
    pub answer: String,
    /// What the mayor says once it is solved
    pub response: String,
}

impl Clue {
    /// The answer is canonicalized so matching is exact string equality
    pub fn new(text: impl Into<String>, answer: &str, response: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            answer: canonicalize(answer),
            response: response.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Round {
    pub clues: Vec<Clue>,
}

impl Round {
    pub fn new(clues: Vec<Clue>) -> Self {
        Self { clues }
    }

    pub fn len(&self) -> usize {
        self.clues.len()
    }

    pub fn is_empty(&self) -> bool {
        self.clues.is_empty()
    }
}

/// Where a team's round scheduler is
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "state", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SchedulerPhase {
    Idle,
    Running { round: usize, clue: usize },
    Complete,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_canonicalize() {
        assert_eq!(canonicalize("War, AND Peace!"), "WAR AND PEACE");
        assert_eq!(canonicalize("  sang\tcher  "), "SANG CHER");
        assert_eq!(canonicalize("four_cent coins"), "FOUR_CENT COINS");
        assert_eq!(canonicalize("...!"), "");
    }

    #[test]
    fn test_canonicalize_is_idempotent() {
        for text in ["WAR AND PEACE", "stab animal paws!!", "The English-Patient"] {
            let once = canonicalize(text);
            assert_eq!(canonicalize(&once), once);
        }
    }

    #[test]
    fn test_role_wraps() {
        let role = SpeakerRole::FIRST;
        assert_eq!(role.next(3).get(), 2);
        assert_eq!(role.next(3).next(3).get(), 3);
        assert_eq!(role.next(3).next(3).next(3), SpeakerRole::FIRST);
        assert_eq!(SpeakerRole::FIRST.next(1), SpeakerRole::FIRST);
        assert!(SpeakerRole::new(0).is_none());
        assert_eq!(SpeakerRole::new(2).unwrap().to_string(), "Speaker 2");
    }

    #[test]
    fn test_clue_answer_is_canonical() {
        let clue = Clue::new("prompt", "war and peace", "response");
        assert_eq!(clue.answer, "WAR AND PEACE");
    }
}
