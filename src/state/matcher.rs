//! Active clue, solved answers, and the wake-up signal between the answer
//! matcher and the round scheduler.

use crate::types::*;
use std::collections::HashSet;
use tokio::sync::{Mutex, Notify};
use tokio::time::Instant;

#[derive(Debug)]
pub struct Progress {
    pub phase: SchedulerPhase,
    /// At most one clue is open at a time
    pub active: Option<Clue>,
    /// Answers solved in the current round
    pub solved: HashSet<String>,
}

/// One team's clue state, guarded by a single lock
#[derive(Debug)]
pub struct ClueBoard {
    progress: Mutex<Progress>,
    solved_signal: Notify,
}

impl Default for ClueBoard {
    fn default() -> Self {
        Self::new()
    }
}

impl ClueBoard {
    pub fn new() -> Self {
        Self {
            progress: Mutex::new(Progress {
                phase: SchedulerPhase::Idle,
                active: None,
                solved: HashSet::new(),
            }),
            solved_signal: Notify::new(),
        }
    }

    /// Offer a transformed chat line as an answer to the open clue.
    ///
    /// Returns true if it solved the clue. Never fails; anything that doesn't
    /// match is ignored.
    pub async fn try_answer(&self, raw_text: &str) -> bool {
        let canonical = canonicalize(raw_text);
        let mut guard = self.progress.lock().await;
        let progress = &mut *guard;

        let solved = match &progress.active {
            Some(clue) if clue.answer == canonical => progress.solved.insert(canonical),
            _ => false,
        };

        if solved {
            tracing::info!(answer = raw_text, "Clue solved");
            self.solved_signal.notify_waiters();
        }
        solved
    }

    /// Start a round with nothing solved
    pub async fn begin_round(&self, round: usize) {
        let mut progress = self.progress.lock().await;
        progress.solved.clear();
        progress.active = None;
        progress.phase = SchedulerPhase::Running { round, clue: 0 };
    }

    pub async fn activate(&self, round: usize, cursor: usize, clue: &Clue) {
        let mut progress = self.progress.lock().await;
        progress.active = Some(clue.clone());
        progress.phase = SchedulerPhase::Running {
            round,
            clue: cursor,
        };
    }

    /// Close the open clue; returns whether its answer was solved
    pub async fn deactivate(&self) -> bool {
        let mut progress = self.progress.lock().await;
        match progress.active.take() {
            Some(clue) => progress.solved.contains(&clue.answer),
            None => false,
        }
    }

    pub async fn complete(&self) {
        let mut progress = self.progress.lock().await;
        progress.active = None;
        progress.phase = SchedulerPhase::Complete;
    }

    /// Suspend until `answer` is solved or `deadline` passes.
    ///
    /// Every wake-up re-checks the solved set, so a notification for some
    /// other reason just goes back to waiting for the time that is left.
    pub async fn wait_for_answer(&self, answer: &str, deadline: Instant) -> bool {
        loop {
            // Register before checking so a notification in between is kept
            let notified = self.solved_signal.notified();
            tokio::pin!(notified);
            notified.as_mut().enable();

            if self.is_solved(answer).await {
                return true;
            }
            if Instant::now() >= deadline {
                return false;
            }

            let _ = tokio::time::timeout_at(deadline, notified).await;
        }
    }

    pub async fn is_solved(&self, answer: &str) -> bool {
        self.progress.lock().await.solved.contains(answer)
    }

    pub async fn solved(&self) -> HashSet<String> {
        self.progress.lock().await.solved.clone()
    }

    pub async fn active(&self) -> Option<Clue> {
        self.progress.lock().await.active.clone()
    }

    pub async fn phase(&self) -> SchedulerPhase {
        self.progress.lock().await.phase
    }

    /// Wake every waiter without solving anything
    #[cfg(test)]
    pub(crate) fn poke(&self) {
        self.solved_signal.notify_waiters();
    }
}
