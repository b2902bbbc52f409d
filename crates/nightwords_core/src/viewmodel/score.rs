//! Final score screen state.

use crate::viewmodel::event::EventQueue;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScoreEvent {
    PlayAgain,
}

#[derive(Debug, Clone)]
pub struct ScoreViewModel {
    score: i32,
    events: EventQueue<ScoreEvent>,
}

impl ScoreViewModel {
    pub fn new(final_score: i32) -> Self {
        Self {
            score: final_score,
            events: EventQueue::new(),
        }
    }

    pub fn score(&self) -> i32 {
        self.score
    }

    pub fn on_play_again(&mut self) {
        self.events.emit(ScoreEvent::PlayAgain);
    }

    pub fn pending_event(&self) -> Option<&ScoreEvent> {
        self.events.peek()
    }

    /// Acknowledges the play-again signal after navigating.
    pub fn on_play_again_complete(&mut self) -> Option<ScoreEvent> {
        self.events.take()
    }
}

#[cfg(test)]
mod tests {
    use super::{ScoreEvent, ScoreViewModel};

    #[test]
    fn play_again_is_delivered_once() {
        let mut score = ScoreViewModel::new(-3);
        assert_eq!(score.score(), -3);

        score.on_play_again();
        assert_eq!(score.pending_event(), Some(&ScoreEvent::PlayAgain));
        assert_eq!(score.on_play_again_complete(), Some(ScoreEvent::PlayAgain));
        assert_eq!(score.on_play_again_complete(), None);
    }
}
