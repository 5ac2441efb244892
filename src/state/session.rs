use crate::types::*;
use chrono::{DateTime, Utc};
use std::collections::{HashMap, VecDeque};

#[derive(Debug, Clone)]
pub struct SessionEntry {
    /// Assigned on first contact, never changes
    pub role: SpeakerRole,
    /// Every wait token this session has registered, oldest first
    pub wait_tokens: Vec<WaitToken>,
}

/// One long-poll registration, in arrival order
#[derive(Debug, Clone)]
pub struct WaitRecord {
    pub token: WaitToken,
    pub session: SessionId,
    pub arrived_at: DateTime<Utc>,
}

/// Session → speaker role map for one team
#[derive(Debug)]
pub struct SessionRegistry {
    speaker_count: u32,
    next_role: SpeakerRole,
    sessions: HashMap<SessionId, SessionEntry>,
    wait_queue: VecDeque<WaitRecord>,
}

impl SessionRegistry {
    pub fn new(speaker_count: u32) -> Self {
        Self {
            speaker_count: speaker_count.max(1),
            next_role: SpeakerRole::FIRST,
            sessions: HashMap::new(),
            wait_queue: VecDeque::new(),
        }
    }

    /// Record a wait token, assigning a role round-robin if the session is new.
    /// Returns the session's role.
    pub fn register_or_touch(&mut self, session: &str, wait_token: WaitToken) -> SpeakerRole {
        self.wait_queue.push_back(WaitRecord {
            token: wait_token.clone(),
            session: session.to_string(),
            arrived_at: Utc::now(),
        });

        if let Some(entry) = self.sessions.get_mut(session) {
            if !entry.wait_tokens.contains(&wait_token) {
                entry.wait_tokens.push(wait_token);
            }
            return entry.role;
        }

        let role = self.next_role;
        self.next_role = role.next(self.speaker_count);
        self.sessions.insert(
            session.to_string(),
            SessionEntry {
                role,
                wait_tokens: vec![wait_token],
            },
        );

        tracing::info!(session, role = role.get(), "Assigned speaker role");
        role
    }

    pub fn role_of(&self, session: &str) -> Option<SpeakerRole> {
        self.sessions.get(session).map(|entry| entry.role)
    }

    pub fn wait_tokens_of(&self, session: &str) -> Vec<WaitToken> {
        self.sessions
            .get(session)
            .map(|entry| entry.wait_tokens.clone())
            .unwrap_or_default()
    }

    pub fn wait_queue(&self) -> &VecDeque<WaitRecord> {
        &self.wait_queue
    }

    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }
}
