mod matcher;
mod scheduler;
mod session;
mod team;

pub use matcher::{ClueBoard, Progress};
pub use scheduler::{classify, next_step, ClueOutcome, RoundScheduler, Step};
pub use session::{SessionEntry, SessionRegistry, WaitRecord};
pub use team::TeamState;

use crate::broadcast::ChannelSink;
use crate::config::{AppConfig, ConfigError, GameConfig};
use crate::lexicon::WordListLexicon;
use crate::protocol::ChatEvent;
use crate::puzzle::Puzzle;
use crate::transform::{ReferenceIndex, TextTransform};
use crate::translate::{
    GoogleTranslateBackend, ServiceAccount, ServiceAccountExchange, TokenCache, TranslationClient,
};
use crate::types::*;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;

/// Shared application state
pub struct AppState {
    teams: RwLock<HashMap<TeamId, Arc<TeamState>>>,
    config: Arc<GameConfig>,
    puzzle: Arc<Puzzle>,
    transform: Arc<TextTransform>,
    /// Per-team event channels that WebSocket clients subscribe to
    pub events: Arc<ChannelSink>,
}

impl AppState {
    pub fn new(config: GameConfig, puzzle: Puzzle, transform: TextTransform) -> Self {
        Self {
            teams: RwLock::new(HashMap::new()),
            config: Arc::new(config),
            puzzle: Arc::new(puzzle),
            transform: Arc::new(transform),
            events: Arc::new(ChannelSink::new()),
        }
    }

    /// Load every resource the server needs. Any failure here is fatal.
    pub fn from_config(config: &AppConfig) -> Result<Self, ConfigError> {
        let game = config.game_config()?;

        let lexicon =
            WordListLexicon::from_file(&config.dictionary_path).map_err(|source| {
                ConfigError::File {
                    what: "dictionary",
                    path: config.dictionary_path.clone(),
                    source,
                }
            })?;

        let reference_path = config
            .reference_text_path
            .as_ref()
            .ok_or(ConfigError::MissingReferenceText)?;
        let reference =
            ReferenceIndex::from_file(reference_path).map_err(|source| ConfigError::File {
                what: "reference text",
                path: reference_path.clone(),
                source,
            })?;

        let translator = build_translator(config)?;

        let puzzle = match &config.puzzle_path {
            Some(path) => Puzzle::from_file(path)?,
            None => Puzzle::town_hall(),
        };
        tracing::info!(
            rounds = puzzle.rounds.len(),
            clues = puzzle.clue_count(),
            "Puzzle loaded"
        );

        let transform = TextTransform::new(Arc::new(lexicon), reference, Some(translator));
        Ok(Self::new(game, puzzle, transform))
    }

    /// Look up a team, creating it on first mention. Teams are never removed.
    pub async fn team(&self, team: &str) -> Arc<TeamState> {
        if let Some(state) = self.teams.read().await.get(team) {
            return state.clone();
        }

        let mut teams = self.teams.write().await;
        teams
            .entry(team.to_string())
            .or_insert_with(|| {
                tracing::info!(team, "New team");
                Arc::new(TeamState::new(
                    team.to_string(),
                    self.config.clone(),
                    self.puzzle.clone(),
                    self.transform.clone(),
                    self.events.clone(),
                ))
            })
            .clone()
    }

    /// `chatwait`: register the session and start the team's game if needed
    pub async fn on_wait(&self, team: &str, session: &str, wait_token: WaitToken) -> SpeakerRole {
        self.team(team).await.on_wait(session, wait_token).await
    }

    /// `chatsubmit`: broadcast a chat line for the team
    pub async fn submit(&self, team: &str, session: &str, text: &str) -> Option<ChatEvent> {
        self.team(team).await.send_chat(session, text).await
    }

    pub async fn team_count(&self) -> usize {
        self.teams.read().await.len()
    }

    pub fn debug(&self) -> bool {
        self.config.debug
    }
}

/// Credentials, token cache and translate backend, wired together
pub fn build_translator(config: &AppConfig) -> Result<Arc<TranslationClient>, ConfigError> {
    let path = config
        .credentials_path
        .as_ref()
        .ok_or(ConfigError::MissingCredentials)?;
    let account = ServiceAccount::from_file(path).map_err(|e| ConfigError::Credentials {
        path: path.clone(),
        reason: e.to_string(),
    })?;
    tracing::info!(client_email = %account.client_email, "Loaded service account");

    let exchange = ServiceAccountExchange::new(&account, config.token_url.clone())?;
    let tokens = TokenCache::new(Arc::new(exchange));
    let backend = GoogleTranslateBackend::new(config.translate_url.clone())
        .map_err(|e| ConfigError::Client(e.to_string()))?;

    Ok(Arc::new(TranslationClient::new(
        Arc::new(tokens),
        Arc::new(backend),
    )))
}
