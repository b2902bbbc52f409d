//! Read-only detail screen for one night.

use crate::model::sleep_night::{NightId, SleepNight};
use crate::store::{SleepStore, StoreResult, Subscription};
use crate::viewmodel::event::EventQueue;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DetailEvent {
    NavigateToSleepTracker,
}

pub struct SleepDetailViewModel {
    night_id: NightId,
    night: Option<SleepNight>,
    updates: Subscription,
    events: EventQueue<DetailEvent>,
}

impl SleepDetailViewModel {
    /// Loads the night; a missing id leaves `night()` empty.
    pub fn new(store: &SleepStore, night_id: NightId) -> StoreResult<Self> {
        let updates = store.subscribe();
        let night = store.get(night_id).wait()?;
        let mut detail = Self {
            night_id,
            night,
            updates,
            events: EventQueue::new(),
        };
        detail.refresh();
        Ok(detail)
    }

    /// Re-reads the night from the newest broadcast, if any.
    pub fn refresh(&mut self) -> bool {
        let Some(nights) = self.updates.latest() else {
            return false;
        };
        let night = nights
            .iter()
            .find(|night| night.night_id == self.night_id)
            .cloned();
        let changed = night != self.night;
        self.night = night;
        changed
    }

    pub fn night_id(&self) -> NightId {
        self.night_id
    }

    pub fn night(&self) -> Option<&SleepNight> {
        self.night.as_ref()
    }

    pub fn on_close(&mut self) {
        self.events.emit(DetailEvent::NavigateToSleepTracker);
    }

    pub fn pending_event(&self) -> Option<&DetailEvent> {
        self.events.peek()
    }

    /// Acknowledges navigation.
    pub fn done_navigating(&mut self) -> Option<DetailEvent> {
        self.events.take()
    }
}
