//! Snapshot fan-out from the store worker to observers.
//!
//! # Invariants
//! - A subscriber holds at most one undelivered snapshot, always the
//!   newest; older ones are replaced, so a holder that never drains
//!   does not grow memory.
//! - Subscribers whose `Subscription` is gone are pruned on the next publish.

use crate::model::sleep_night::SleepNight;
use crossbeam_channel::{bounded, Receiver, Sender, TrySendError};
use std::sync::{Arc, Mutex, PoisonError};
use std::time::{Duration, Instant};

/// Immutable view of every night, most recent first.
pub type NightsSnapshot = Arc<[SleepNight]>;

type Slot = Arc<Mutex<Option<NightsSnapshot>>>;

/// Worker-side end of one subscription.
pub(crate) struct Subscriber {
    slot: Slot,
    wake: Sender<()>,
}

impl Subscriber {
    /// Replaces the pending snapshot. Returns `false` once the
    /// `Subscription` has been dropped.
    fn deliver(&self, snapshot: &NightsSnapshot) -> bool {
        *self.slot.lock().unwrap_or_else(PoisonError::into_inner) = Some(Arc::clone(snapshot));
        match self.wake.try_send(()) {
            Ok(()) | Err(TrySendError::Full(())) => true,
            Err(TrySendError::Disconnected(())) => false,
        }
    }
}

/// Creates a linked subscriber/subscription pair.
pub(crate) fn channel() -> (Subscriber, Subscription) {
    let slot = Slot::default();
    let (wake_tx, wake_rx) = bounded(1);
    (
        Subscriber {
            slot: Arc::clone(&slot),
            wake: wake_tx,
        },
        Subscription {
            slot,
            wake: wake_rx,
        },
    )
}

/// Worker-owned subscriber list.
#[derive(Default)]
pub(crate) struct Broadcaster {
    subscribers: Vec<Subscriber>,
}

impl Broadcaster {
    /// Sends `initial` to `subscriber` and keeps it if still connected.
    pub(crate) fn register(&mut self, subscriber: Subscriber, initial: &NightsSnapshot) {
        if subscriber.deliver(initial) {
            self.subscribers.push(subscriber);
        }
    }

    pub(crate) fn publish(&mut self, snapshot: &NightsSnapshot) {
        self.subscribers
            .retain(|subscriber| subscriber.deliver(snapshot));
    }

    pub(crate) fn len(&self) -> usize {
        self.subscribers.len()
    }
}

/// Observer end of `SleepStore::subscribe`.
///
/// The first snapshot is the collection as of subscription; a newer one
/// replaces it after every successful write.
#[derive(Debug)]
pub struct Subscription {
    slot: Slot,
    wake: Receiver<()>,
}

impl Subscription {
    /// Takes the newest undelivered snapshot, if any.
    pub fn latest(&self) -> Option<NightsSnapshot> {
        while self.wake.try_recv().is_ok() {}
        self.take()
    }

    /// Blocks up to `timeout` for a snapshot not yet taken.
    ///
    /// Returns `None` on timeout or once the store has shut down.
    pub fn wait_next(&self, timeout: Duration) -> Option<NightsSnapshot> {
        let deadline = Instant::now().checked_add(timeout);
        loop {
            if let Some(snapshot) = self.latest() {
                return Some(snapshot);
            }
            let woke = match deadline {
                Some(deadline) => self.wake.recv_deadline(deadline).is_ok(),
                None => self.wake.recv().is_ok(),
            };
            if !woke {
                return self.take();
            }
        }
    }

    fn take(&self) -> Option<NightsSnapshot> {
        self.slot
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take()
    }
}

#[cfg(test)]
mod tests {
    use super::{channel, Broadcaster, NightsSnapshot};
    use crate::model::sleep_night::SleepNight;
    use std::time::Duration;

    fn snapshot(ids: &[i64]) -> NightsSnapshot {
        ids.iter()
            .map(|&id| SleepNight {
                night_id: id,
                ..SleepNight::starting_at(0)
            })
            .collect::<Vec<_>>()
            .into()
    }

    #[test]
    fn undrained_subscriber_keeps_only_newest() {
        let mut broadcaster = Broadcaster::default();
        let (subscriber, subscription) = channel();
        broadcaster.register(subscriber, &snapshot(&[]));

        for id in 1..=500 {
            broadcaster.publish(&snapshot(&[id]));
        }

        let newest = subscription.latest().unwrap();
        assert_eq!(newest[0].night_id, 500);
        assert_eq!(subscription.latest(), None);
        assert_eq!(subscription.wait_next(Duration::from_millis(10)), None);
    }

    #[test]
    fn dropped_subscription_is_pruned() {
        let mut broadcaster = Broadcaster::default();
        let (subscriber, subscription) = channel();
        broadcaster.register(subscriber, &snapshot(&[1]));
        assert_eq!(broadcaster.len(), 1);

        drop(subscription);
        broadcaster.publish(&snapshot(&[2]));
        assert_eq!(broadcaster.len(), 0);
    }

    #[test]
    fn wait_next_returns_pending_snapshot_immediately() {
        let mut broadcaster = Broadcaster::default();
        let (subscriber, subscription) = channel();
        broadcaster.register(subscriber, &snapshot(&[7]));

        let first = subscription.wait_next(Duration::from_secs(1)).unwrap();
        assert_eq!(first[0].night_id, 7);
    }
}
