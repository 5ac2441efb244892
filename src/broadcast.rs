use crate::protocol::ChatEvent;
use crate::types::TeamId;
use async_trait::async_trait;
use std::collections::{HashMap, VecDeque};
use tokio::sync::{broadcast, RwLock};

/// Delivers events to every connected client of a team
#[async_trait]
pub trait BroadcastSink: Send + Sync {
    async fn send(&self, team: &str, event: ChatEvent);
}

const CHANNEL_CAPACITY: usize = 256;

/// Sticky events kept per team; the oldest are dropped first
pub const MAX_HISTORY: usize = 100;

struct TeamChannel {
    tx: broadcast::Sender<ChatEvent>,
    /// Sticky events, replayed to late subscribers
    history: VecDeque<ChatEvent>,
}

impl TeamChannel {
    fn new() -> Self {
        let (tx, _rx) = broadcast::channel(CHANNEL_CAPACITY);
        Self {
            tx,
            history: VecDeque::new(),
        }
    }
}

/// In-process sink backed by one tokio broadcast channel per team
pub struct ChannelSink {
    teams: RwLock<HashMap<TeamId, TeamChannel>>,
    history_limit: usize,
}

impl Default for ChannelSink {
    fn default() -> Self {
        Self::with_history_limit(MAX_HISTORY)
    }
}

impl ChannelSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_history_limit(history_limit: usize) -> Self {
        Self {
            teams: RwLock::new(HashMap::new()),
            history_limit,
        }
    }

    /// Sticky history so far plus a receiver for everything after it
    pub async fn subscribe(&self, team: &str) -> (Vec<ChatEvent>, broadcast::Receiver<ChatEvent>) {
        let mut teams = self.teams.write().await;
        let channel = teams
            .entry(team.to_string())
            .or_insert_with(TeamChannel::new);
        (
            channel.history.iter().cloned().collect(),
            channel.tx.subscribe(),
        )
    }
}

#[async_trait]
impl BroadcastSink for ChannelSink {
    async fn send(&self, team: &str, event: ChatEvent) {
        let mut teams = self.teams.write().await;
        let channel = teams
            .entry(team.to_string())
            .or_insert_with(TeamChannel::new);

        if event.is_sticky() && self.history_limit > 0 {
            if channel.history.len() >= self.history_limit {
                channel.history.pop_front();
            }
            channel.history.push_back(event.clone());
        }

        // No receivers connected is fine
        let receivers = channel.tx.send(event).unwrap_or(0);
        tracing::trace!(team, receivers, "Broadcast event");
    }
}
