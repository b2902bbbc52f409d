//! Sleep tracker screen state.
//!
//! # Responsibility
//! - Start and stop tonight's session; clear the history.
//! - Mirror the nights collection from store broadcasts.
//! - Derive button flags and emit navigation/snackbar events.
//!
//! # Invariants
//! - `start_enabled == tonight.is_none()`, `stop_enabled == tonight.is_some()`,
//!   `clear_enabled == !nights.is_empty()`.
//! - Each effective `on_stop_tracking` emits exactly one
//!   `NavigateToSleepQuality`.

use crate::clock::{Clock, SystemClock};
use crate::list::model::{format_nights, NightFormatter};
use crate::model::sleep_night::{NightId, SleepNight};
use crate::store::{NightsSnapshot, SleepStore, StoreResult, Subscription};
use crate::viewmodel::event::EventQueue;
use chrono::TimeZone;
use log::{debug, info};
use std::fmt::Display;
use std::sync::Arc;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TrackerEvent {
    /// Tonight was closed; ask the user to rate it.
    NavigateToSleepQuality(NightId),
    /// A row was tapped.
    NavigateToSleepDetail(NightId),
    /// History was cleared.
    ShowClearedSnackbar,
}

pub struct SleepTrackerViewModel {
    store: SleepStore,
    clock: Arc<dyn Clock>,
    updates: Subscription,
    nights: NightsSnapshot,
    tonight: Option<SleepNight>,
    events: EventQueue<TrackerEvent>,
}

impl SleepTrackerViewModel {
    pub fn new(store: SleepStore) -> StoreResult<Self> {
        Self::with_clock(store, Arc::new(SystemClock))
    }

    /// Loads tonight and the nights collection.
    pub fn with_clock(store: SleepStore, clock: Arc<dyn Clock>) -> StoreResult<Self> {
        let updates = store.subscribe();
        let tonight = store.get_open_night().wait()?;
        let mut tracker = Self {
            store,
            clock,
            updates,
            nights: NightsSnapshot::from(Vec::new()),
            tonight,
            events: EventQueue::new(),
        };
        tracker.refresh();
        Ok(tracker)
    }

    /// Pulls the newest broadcast snapshot, if any.
    ///
    /// Returns whether the nights collection changed identity.
    pub fn refresh(&mut self) -> bool {
        match self.updates.latest() {
            Some(nights) => {
                self.nights = nights;
                true
            }
            None => false,
        }
    }

    pub fn nights(&self) -> &NightsSnapshot {
        &self.nights
    }

    pub fn tonight(&self) -> Option<&SleepNight> {
        self.tonight.as_ref()
    }

    pub fn start_enabled(&self) -> bool {
        self.tonight.is_none()
    }

    pub fn stop_enabled(&self) -> bool {
        self.tonight.is_some()
    }

    pub fn clear_enabled(&self) -> bool {
        !self.nights.is_empty()
    }

    /// History summary text for the current nights.
    pub fn nights_text<Tz>(&self, formatter: &NightFormatter<Tz>) -> String
    where
        Tz: TimeZone,
        Tz::Offset: Display,
    {
        format_nights(&self.nights, formatter)
    }

    /// Creates an open night unless one is already running.
    pub fn on_start_tracking(&mut self) -> StoreResult<()> {
        if self.tonight.is_some() {
            debug!("event=sleep_start module=viewmodel status=skipped reason=already_open");
            return Ok(());
        }

        let night = SleepNight::starting_at(self.clock.now_millis());
        let night_id = self.store.insert(&night).wait()?;
        self.tonight = self.store.get_open_night().wait()?;
        self.refresh();
        info!("event=sleep_start module=viewmodel status=ok night_id={night_id}");
        Ok(())
    }

    /// Closes tonight and asks the host to navigate to the rating screen.
    ///
    /// No-op when nothing is open or tonight vanished from the store.
    pub fn on_stop_tracking(&mut self) -> StoreResult<()> {
        let Some(mut night) = self.tonight.clone() else {
            debug!("event=sleep_stop module=viewmodel status=skipped reason=nothing_open");
            return Ok(());
        };

        night.close_at(self.clock.now_millis());
        match self.store.update(&night).wait() {
            Ok(()) => {}
            Err(err) if err.is_not_found() => {
                debug!(
                    "event=sleep_stop module=viewmodel status=skipped reason=not_found night_id={}",
                    night.night_id
                );
                self.tonight = None;
                return Ok(());
            }
            Err(err) => return Err(err),
        }

        self.tonight = self.store.get_open_night().wait()?;
        self.refresh();
        self.events
            .emit(TrackerEvent::NavigateToSleepQuality(night.night_id));
        info!(
            "event=sleep_stop module=viewmodel status=ok night_id={} duration_ms={}",
            night.night_id,
            night.duration_ms()
        );
        Ok(())
    }

    /// Deletes every night and shows the cleared snackbar.
    pub fn on_clear(&mut self) -> StoreResult<()> {
        let removed = self.store.clear().wait()?;
        self.tonight = None;
        self.refresh();
        self.events.emit(TrackerEvent::ShowClearedSnackbar);
        info!("event=sleep_clear module=viewmodel status=ok removed={removed}");
        Ok(())
    }

    pub fn on_night_clicked(&mut self, night_id: NightId) {
        self.events
            .emit(TrackerEvent::NavigateToSleepDetail(night_id));
    }

    pub fn pending_event(&self) -> Option<&TrackerEvent> {
        self.events.peek()
    }

    /// Consumes the oldest event once the host has acted on it.
    pub fn take_event(&mut self) -> Option<TrackerEvent> {
        self.events.take()
    }
}
