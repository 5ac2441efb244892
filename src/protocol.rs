use crate::types::*;
use serde::{Deserialize, Serialize};

pub const MAYOR: &str = "Mayor";

/// Events pushed to every client of a team
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "method", rename_all = "snake_case")]
pub enum ChatEvent {
    AddChat {
        id: String,
        who: String,
        text: String,
        /// Transformed text (absent for announcements)
        #[serde(default, skip_serializing_if = "Option::is_none")]
        alt: Option<String>,
        /// Wait tokens of the sender, so its own tabs can recognise the echo
        #[serde(default, skip_serializing_if = "Vec::is_empty")]
        wids: Vec<WaitToken>,
        /// Sticky events are replayed to clients that join later
        #[serde(default)]
        sticky: bool,
    },
}

impl ChatEvent {
    pub fn mayor(text: impl Into<String>) -> Self {
        ChatEvent::AddChat {
            id: ulid::Ulid::new().to_string(),
            who: MAYOR.to_string(),
            text: text.into(),
            alt: None,
            wids: Vec::new(),
            sticky: true,
        }
    }

    pub fn speaker(role: SpeakerRole, text: String, alt: String, wids: Vec<WaitToken>) -> Self {
        ChatEvent::AddChat {
            id: ulid::Ulid::new().to_string(),
            who: role.to_string(),
            text,
            alt: Some(alt),
            wids,
            sticky: false,
        }
    }

    pub fn who(&self) -> &str {
        match self {
            ChatEvent::AddChat { who, .. } => who,
        }
    }

    pub fn text(&self) -> &str {
        match self {
            ChatEvent::AddChat { text, .. } => text,
        }
    }

    pub fn alt(&self) -> Option<&str> {
        match self {
            ChatEvent::AddChat { alt, .. } => alt.as_deref(),
        }
    }

    pub fn is_sticky(&self) -> bool {
        match self {
            ChatEvent::AddChat { sticky, .. } => *sticky,
        }
    }
}

/// `POST /chatsubmit`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SubmitRequest {
    pub team: TeamId,
    pub session: SessionId,
    pub text: String,
}

/// `POST /chatwait`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WaitRequest {
    pub team: TeamId,
    pub session: SessionId,
    pub wait_id: WaitToken,
}
