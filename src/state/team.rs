use super::matcher::ClueBoard;
use super::scheduler::RoundScheduler;
use super::session::SessionRegistry;
use crate::broadcast::BroadcastSink;
use crate::config::GameConfig;
use crate::protocol::ChatEvent;
use crate::puzzle::Puzzle;
use crate::transform::TextTransform;
use crate::types::*;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::sync::Mutex;
use tokio::task::JoinHandle;

/// Everything one team's game needs
pub struct TeamState {
    pub team: TeamId,
    config: Arc<GameConfig>,
    puzzle: Arc<Puzzle>,
    transform: Arc<TextTransform>,
    sink: Arc<dyn BroadcastSink>,
    sessions: Mutex<SessionRegistry>,
    board: Arc<ClueBoard>,
    started: AtomicBool,
    scheduler: Mutex<Option<JoinHandle<()>>>,
}

impl TeamState {
    pub fn new(
        team: TeamId,
        config: Arc<GameConfig>,
        puzzle: Arc<Puzzle>,
        transform: Arc<TextTransform>,
        sink: Arc<dyn BroadcastSink>,
    ) -> Self {
        let sessions = SessionRegistry::new(config.speaker_count);
        Self {
            team,
            config,
            puzzle,
            transform,
            sink,
            sessions: Mutex::new(sessions),
            board: Arc::new(ClueBoard::new()),
            started: AtomicBool::new(false),
            scheduler: Mutex::new(None),
        }
    }

    /// A client started waiting. Starts the game the first time any session
    /// of this team shows up.
    pub async fn on_wait(&self, session: &str, wait_token: WaitToken) -> SpeakerRole {
        self.ensure_started().await;
        self.sessions
            .lock()
            .await
            .register_or_touch(session, wait_token)
    }

    async fn ensure_started(&self) {
        if self
            .started
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            return;
        }

        let scheduler = RoundScheduler::new(
            self.team.clone(),
            self.board.clone(),
            self.puzzle.clone(),
            self.config.timing.clone(),
            self.sink.clone(),
        );
        let handle = tokio::spawn(scheduler.run());
        *self.scheduler.lock().await = Some(handle);
    }

    /// Transform and broadcast a chat line, then offer the transformed text
    /// as an answer. Returns the broadcast event, or None if the sender has
    /// no role.
    pub async fn send_chat(&self, session: &str, text: &str) -> Option<ChatEvent> {
        let text = text.to_lowercase();

        let (role, text, wids) = match self.debug_override(&text) {
            Some((role, rest)) => (role, rest.to_string(), Vec::new()),
            None => {
                let sessions = self.sessions.lock().await;
                let Some(role) = sessions.role_of(session) else {
                    tracing::debug!(team = %self.team, session, "Chat from unknown session ignored");
                    return None;
                };
                (role, text, sessions.wait_tokens_of(session))
            }
        };

        let alt = self.transform.transform(role, &text).await;
        tracing::debug!(team = %self.team, %role, %text, %alt, "Chat");

        let event = ChatEvent::speaker(role, text, alt.clone(), wids);
        self.sink.send(&self.team, event.clone()).await;

        self.board.try_answer(&alt).await;
        Some(event)
    }

    /// `N:` prefix in debug mode speaks as role N
    fn debug_override<'a>(&self, text: &'a str) -> Option<(SpeakerRole, &'a str)> {
        if !self.config.debug {
            return None;
        }
        let (prefix, rest) = text.split_once(':')?;
        // Plain decimal only: no sign, no leading zero
        if prefix.is_empty()
            || prefix.starts_with('0')
            || !prefix.bytes().all(|b| b.is_ascii_digit())
        {
            return None;
        }
        let n: u32 = prefix.parse().ok()?;
        if n > self.config.speaker_count {
            return None;
        }
        SpeakerRole::new(n).map(|role| (role, rest))
    }

    pub async fn role_of(&self, session: &str) -> Option<SpeakerRole> {
        self.sessions.lock().await.role_of(session)
    }

    pub async fn session_count(&self) -> usize {
        self.sessions.lock().await.len()
    }

    pub fn is_started(&self) -> bool {
        self.started.load(Ordering::Acquire)
    }

    pub async fn phase(&self) -> SchedulerPhase {
        self.board.phase().await
    }

    pub fn board(&self) -> &Arc<ClueBoard> {
        &self.board
    }

    /// Wait for the game to finish; returns immediately if it never started
    pub async fn join_scheduler(&self) {
        let handle = self.scheduler.lock().await.take();
        if let Some(handle) = handle {
            if let Err(e) = handle.await {
                tracing::error!(team = %self.team, "Scheduler task failed: {}", e);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::broadcast::ChannelSink;
    use crate::lexicon::WordListLexicon;
    use crate::transform::ReferenceIndex;

    fn team(debug: bool) -> (TeamState, Arc<ChannelSink>) {
        let lexicon = Arc::new(WordListLexicon::new(["hello", "world", "town"]));
        let reference = ReferenceIndex::from_text("alpha beta gamma");
        let transform = Arc::new(TextTransform::new(lexicon, reference, None));
        let sink = Arc::new(ChannelSink::new());
        let config = Arc::new(GameConfig {
            speaker_count: 4,
            debug,
            ..GameConfig::default()
        });
        let state = TeamState::new(
            "red".to_string(),
            config,
            Arc::new(Puzzle::town_hall()),
            transform,
            sink.clone(),
        );
        (state, sink)
    }

    #[tokio::test(start_paused = true)]
    async fn test_scheduler_starts_once() {
        let (state, _) = team(false);
        assert!(!state.is_started());

        state.on_wait("a", "w1".to_string()).await;
        state.on_wait("b", "w2".to_string()).await;
        state.on_wait("a", "w3".to_string()).await;

        assert!(state.is_started());
        assert_eq!(state.session_count().await, 2);
        assert!(state.scheduler.lock().await.is_some());
    }

    #[tokio::test]
    async fn test_unknown_session_is_ignored() {
        let (state, sink) = team(false);
        let (_, mut rx) = sink.subscribe("red").await;

        assert!(state.send_chat("nobody", "hello").await.is_none());
        assert!(rx.try_recv().is_err());
    }

    #[tokio::test(start_paused = true)]
    async fn test_chat_is_lowercased_and_carries_wait_tokens() {
        let (state, sink) = team(false);
        let (_, mut rx) = sink.subscribe("red").await;
        state.on_wait("a", "w1".to_string()).await;
        state.on_wait("b", "w2".to_string()).await;
        state.on_wait("c", "w3".to_string()).await;
        state.on_wait("c", "w4".to_string()).await;

        // Third speaker reverses words
        let event = state.send_chat("c", "Hello World").await.unwrap();
        assert_eq!(event.who(), "Speaker 3");
        assert_eq!(event.text(), "hello world");
        assert_eq!(event.alt(), Some("olleh dlrow"));

        let received = rx.recv().await.unwrap();
        assert_eq!(received, event);
        match received {
            ChatEvent::AddChat { wids, .. } => assert_eq!(wids, vec!["w3", "w4"]),
        }
    }

    #[tokio::test]
    async fn test_debug_override() {
        let (state, _) = team(true);

        // No session needed, no wait tokens attached
        let event = state.send_chat("nobody", "4:Town Hall").await.unwrap();
        assert_eq!(event.who(), "Speaker 4");
        assert_eq!(event.text(), "town hall");
        assert_eq!(event.alt(), Some("town hall"));
        match event {
            ChatEvent::AddChat { wids, .. } => assert!(wids.is_empty()),
        }

        // Out of range prefixes are ordinary text
        assert!(state.send_chat("nobody", "5:hello").await.is_none());
        assert!(state.send_chat("nobody", "0:hello").await.is_none());
    }

    #[tokio::test]
    async fn test_debug_override_needs_plain_digits() {
        let (state, _) = team(true);
        for line in ["+1:hello", "01:hello", " 1:hello", ":hello", "1 :hello"] {
            assert!(state.send_chat("nobody", line).await.is_none(), "{}", line);
        }
        assert_eq!(
            state.send_chat("nobody", "1:hello").await.unwrap().who(),
            "Speaker 1"
        );
    }

    #[tokio::test]
    async fn test_debug_override_disabled() {
        let (state, _) = team(false);
        assert!(state.send_chat("nobody", "4:hello").await.is_none());
    }

    #[tokio::test]
    async fn test_join_without_start_returns() {
        let (state, _) = team(false);
        state.join_scheduler().await;
        assert_eq!(state.phase().await, SchedulerPhase::Idle);
    }
}
