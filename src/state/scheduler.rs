//! The mayor: walks each team through the puzzle's rounds.
//!
//! Within a round the clues are cycled in order. Solved clues are skipped,
//! an unsolved one is announced and left open until it is answered or times
//! out, and the round ends once every clue is solved or the last unsolved
//! one has timed out.

use super::matcher::ClueBoard;
use crate::broadcast::BroadcastSink;
use crate::config::GameTiming;
use crate::protocol::ChatEvent;
use crate::puzzle::Puzzle;
use crate::types::*;
use std::collections::HashSet;
use std::sync::Arc;
use tokio::time::{sleep, Instant};

/// What to do next within a round
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Step {
    /// Open the clue at this index
    Activate(usize),
    RoundOver,
}

/// How an opened clue ended
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClueOutcome {
    Solved,
    /// Timed out with other clues still unsolved
    Deferred,
    /// Timed out and nothing else in the round is left
    TimedOutLast,
}

/// Find the next clue to open, starting at `cursor` and wrapping.
pub fn next_step(round: &Round, solved: &HashSet<String>, cursor: usize) -> Step {
    if solved.len() >= round.len() {
        return Step::RoundOver;
    }

    (0..round.len())
        .map(|offset| (cursor + offset) % round.len())
        .find(|&index| !solved.contains(&round.clues[index].answer))
        .map(Step::Activate)
        .unwrap_or(Step::RoundOver)
}

/// Classify a closed clue given how many answers the round has after it
pub fn classify(was_solved: bool, solved_count: usize, round_len: usize) -> ClueOutcome {
    if was_solved {
        ClueOutcome::Solved
    } else if solved_count + 1 < round_len {
        ClueOutcome::Deferred
    } else {
        ClueOutcome::TimedOutLast
    }
}

pub struct RoundScheduler {
    team: TeamId,
    board: Arc<ClueBoard>,
    puzzle: Arc<Puzzle>,
    timing: GameTiming,
    sink: Arc<dyn BroadcastSink>,
}

impl RoundScheduler {
    pub fn new(
        team: TeamId,
        board: Arc<ClueBoard>,
        puzzle: Arc<Puzzle>,
        timing: GameTiming,
        sink: Arc<dyn BroadcastSink>,
    ) -> Self {
        Self {
            team,
            board,
            puzzle,
            timing,
            sink,
        }
    }

    /// Run the whole puzzle to completion
    pub async fn run(self) {
        tracing::info!(team = %self.team, "Game starting");
        sleep(self.timing.start_delay).await;

        self.announce(&self.puzzle.intro).await;
        sleep(self.timing.intro_pause).await;

        for (index, round) in self.puzzle.rounds.iter().enumerate() {
            self.run_round(index, round).await;
        }

        self.announce(&self.puzzle.outro).await;
        self.board.complete().await;
        tracing::info!(team = %self.team, "Game complete");
    }

    async fn run_round(&self, round_index: usize, round: &Round) {
        tracing::info!(team = %self.team, round = round_index + 1, "Round starting");
        self.board.begin_round(round_index).await;

        let mut cursor = 0;
        loop {
            let solved = self.board.solved().await;
            let index = match next_step(round, &solved, cursor) {
                Step::Activate(index) => index,
                Step::RoundOver => break,
            };

            let clue = &round.clues[index];
            match self.run_clue(round_index, index, clue, round.len()).await {
                ClueOutcome::Solved => self.announce(&clue.response).await,
                ClueOutcome::Deferred => {
                    self.announce(&self.puzzle.come_back_later).await;
                    sleep(self.timing.retry_pause).await;
                }
                ClueOutcome::TimedOutLast => break,
            }
            cursor = index + 1;
        }

        tracing::info!(team = %self.team, round = round_index + 1, "Round over");
    }

    async fn run_clue(
        &self,
        round_index: usize,
        index: usize,
        clue: &Clue,
        round_len: usize,
    ) -> ClueOutcome {
        self.board.activate(round_index, index, clue).await;
        self.announce(&clue.text).await;

        let deadline = Instant::now() + self.timing.clue_timeout;
        self.board.wait_for_answer(&clue.answer, deadline).await;

        // A late answer can still land before this point; whatever the
        // board says on close is the outcome
        let was_solved = self.board.deactivate().await;
        let solved_count = self.board.solved().await.len();
        let outcome = classify(was_solved, solved_count, round_len);

        tracing::debug!(team = %self.team, answer = %clue.answer, ?outcome, "Clue closed");
        outcome
    }

    async fn announce(&self, text: &str) {
        self.sink.send(&self.team, ChatEvent::mayor(text)).await;
    }
}
