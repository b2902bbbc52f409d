//! Sleep quality rating screen state.

use crate::model::sleep_night::NightId;
use crate::store::{SleepStore, StoreResult};
use crate::viewmodel::event::EventQueue;
use log::{debug, info};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QualityEvent {
    NavigateToSleepTracker,
}

pub struct SleepQualityViewModel {
    store: SleepStore,
    night_id: NightId,
    events: EventQueue<QualityEvent>,
}

impl SleepQualityViewModel {
    pub fn new(store: SleepStore, night_id: NightId) -> Self {
        Self {
            store,
            night_id,
            events: EventQueue::new(),
        }
    }

    pub fn night_id(&self) -> NightId {
        self.night_id
    }

    /// Stores `quality` on the night and navigates back.
    ///
    /// Values are stored as given. When the night no longer exists nothing
    /// is written and no event is emitted; the host must then navigate back
    /// to the tracker itself (`pending_event()` stays `None`).
    pub fn on_set_sleep_quality(&mut self, quality: i32) -> StoreResult<()> {
        let Some(mut night) = self.store.get(self.night_id).wait()? else {
            debug!(
                "event=sleep_quality module=viewmodel status=skipped reason=not_found night_id={}",
                self.night_id
            );
            return Ok(());
        };

        night.sleep_quality = quality;
        match self.store.update(&night).wait() {
            Ok(()) => {}
            Err(err) if err.is_not_found() => return Ok(()),
            Err(err) => return Err(err),
        }

        self.events.emit(QualityEvent::NavigateToSleepTracker);
        info!(
            "event=sleep_quality module=viewmodel status=ok night_id={} quality={quality}",
            self.night_id
        );
        Ok(())
    }

    pub fn pending_event(&self) -> Option<&QualityEvent> {
        self.events.peek()
    }

    /// Acknowledges navigation.
    pub fn done_navigating(&mut self) -> Option<QualityEvent> {
        self.events.take()
    }
}
