//! Word game screen state.
//!
//! # Responsibility
//! - Track the current word, score and countdown.
//! - Emit `GameEvent::Finished` when the countdown reaches zero.
//!
//! # Invariants
//! - The current word is never empty.
//! - `Finished` is delivered at most once per game; `restore` only
//!   re-queues a signal that was saved unacknowledged.
//! - The countdown thread is stopped on `teardown` and on drop.

use crate::model::word_pool::WordPool;
use crate::timer::{Countdown, CountdownTick};
use crate::viewmodel::event::EventQueue;
use log::info;
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Total game length.
pub const GAME_DURATION: Duration = Duration::from_secs(120);
/// Countdown tick period.
pub const TICK_PERIOD: Duration = Duration::from_secs(1);

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GameConfig {
    pub duration: Duration,
    pub tick: Duration,
    /// Fixed shuffle seed; `None` uses OS entropy.
    pub seed: Option<u64>,
}

impl Default for GameConfig {
    fn default() -> Self {
        Self {
            duration: GAME_DURATION,
            tick: TICK_PERIOD,
            seed: None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GameEvent {
    Finished,
}

/// Screen state kept across host recreation.
///
/// An acknowledged `Finished` is never saved; an unacknowledged one is
/// carried by `finish_pending` so the host still gets to navigate.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GameSavedState {
    pub word: String,
    pub score: i32,
    pub remaining_secs: u64,
    pub finished: bool,
    #[serde(default)]
    pub finish_pending: bool,
}

pub struct GameViewModel {
    words: WordPool,
    word: String,
    score: i32,
    remaining_secs: u64,
    finished: bool,
    events: EventQueue<GameEvent>,
    countdown: Option<Countdown>,
}

impl GameViewModel {
    /// Starts a new game: score 0, first word drawn, countdown running.
    pub fn new(config: &GameConfig) -> std::io::Result<Self> {
        let mut game = Self::idle(config);
        game.word = game.words.next_word().to_string();
        game.countdown = Some(Countdown::start(config.duration, config.tick)?);
        info!(
            "event=game_start module=viewmodel status=ok duration_s={}",
            config.duration.as_secs()
        );
        Ok(game)
    }

    /// Recreates a game from saved state.
    ///
    /// `remaining_secs` is clamped to the configured game length. A finished
    /// game stays finished; `Finished` is pending again only if it was still
    /// unacknowledged when saved, or if the game ends by this restore.
    pub fn restore(state: GameSavedState, config: &GameConfig) -> std::io::Result<Self> {
        let mut game = Self::idle(config);
        game.word = if state.word.is_empty() {
            game.words.next_word().to_string()
        } else {
            state.word
        };
        game.score = state.score;
        game.remaining_secs = state.remaining_secs.min(config.duration.as_secs());
        game.finished = state.finished || game.remaining_secs == 0;
        if game.finished {
            game.remaining_secs = 0;
            if state.finish_pending || !state.finished {
                game.events.emit(GameEvent::Finished);
            }
        } else {
            let remaining = Duration::from_secs(game.remaining_secs);
            game.countdown = Some(Countdown::start(remaining, config.tick)?);
        }
        Ok(game)
    }

    fn idle(config: &GameConfig) -> Self {
        let words = match config.seed {
            Some(seed) => WordPool::with_seed(seed),
            None => WordPool::new(),
        };
        Self {
            words,
            word: String::new(),
            score: 0,
            remaining_secs: config.duration.as_secs(),
            finished: false,
            events: EventQueue::new(),
            countdown: None,
        }
    }

    pub fn word(&self) -> &str {
        &self.word
    }

    pub fn score(&self) -> i32 {
        self.score
    }

    pub fn remaining_secs(&self) -> u64 {
        self.remaining_secs
    }

    pub fn is_finished(&self) -> bool {
        self.finished
    }

    /// Countdown as `MM:SS`, or `H:MM:SS` from one hour up.
    pub fn current_time_text(&self) -> String {
        format_elapsed_time(self.remaining_secs)
    }

    /// Hint revealing one random letter of the current word.
    pub fn word_hint(&self) -> String {
        let letters = self.word.chars().count().max(1);
        let position = rand::thread_rng().gen_range(1..=letters);
        hint_for(&self.word, position)
    }

    pub fn on_skip(&mut self) {
        self.score -= 1;
        self.next_word();
    }

    pub fn on_correct(&mut self) {
        self.score += 1;
        self.next_word();
    }

    fn next_word(&mut self) {
        self.word = self.words.next_word().to_string();
    }

    /// Applies ticks delivered by the countdown since the last call.
    ///
    /// Returns whether any tick arrived.
    pub fn pump_timer(&mut self) -> bool {
        let ticks = match &self.countdown {
            Some(countdown) => countdown.drain(),
            None => return false,
        };
        let changed = !ticks.is_empty();
        for tick in ticks {
            self.apply_tick(tick);
        }
        changed
    }

    fn apply_tick(&mut self, tick: CountdownTick) {
        match tick {
            CountdownTick::Remaining(left) => self.remaining_secs = left.as_secs(),
            CountdownTick::Finished => {
                self.remaining_secs = 0;
                if !self.finished {
                    self.finished = true;
                    self.events.emit(GameEvent::Finished);
                    info!(
                        "event=game_finish module=viewmodel status=ok score={}",
                        self.score
                    );
                }
            }
        }
    }

    pub fn pending_event(&self) -> Option<&GameEvent> {
        self.events.peek()
    }

    pub fn take_event(&mut self) -> Option<GameEvent> {
        self.events.take()
    }

    /// Acknowledges the finish signal after the host has navigated.
    pub fn on_game_finish_complete(&mut self) {
        if self.events.peek() == Some(&GameEvent::Finished) {
            self.events.take();
        }
    }

    pub fn save_state(&self) -> GameSavedState {
        GameSavedState {
            word: self.word.clone(),
            score: self.score,
            remaining_secs: self.remaining_secs,
            finished: self.finished,
            finish_pending: self.events.peek() == Some(&GameEvent::Finished),
        }
    }

    /// Stops the countdown. Further `pump_timer` calls see no ticks.
    pub fn teardown(&mut self) {
        if let Some(mut countdown) = self.countdown.take() {
            countdown.stop();
            info!("event=game_teardown module=viewmodel status=ok");
        }
    }

    pub fn is_timer_running(&self) -> bool {
        self.countdown.as_ref().is_some_and(Countdown::is_running)
    }
}

impl Drop for GameViewModel {
    fn drop(&mut self) {
        self.teardown();
    }
}

/// Formats whole seconds like a stopwatch.
pub fn format_elapsed_time(total_secs: u64) -> String {
    let hours = total_secs / 3600;
    let minutes = (total_secs % 3600) / 60;
    let seconds = total_secs % 60;
    if hours > 0 {
        format!("{hours}:{minutes:02}:{seconds:02}")
    } else {
        format!("{minutes:02}:{seconds:02}")
    }
}

/// Hint text for `word` revealing the 1-based `position`.
pub fn hint_for(word: &str, position: usize) -> String {
    let letters = word.chars().count();
    let letter = word
        .chars()
        .nth(position.saturating_sub(1))
        .map(|letter| letter.to_uppercase().to_string())
        .unwrap_or_default();
    format!("Current word has {letters} letters  \nThe letter at position {position} is {letter}")
}
