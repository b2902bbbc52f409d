//! Countdown timer delivering fixed-period ticks from one background thread.
//!
//! # Responsibility
//! - Report the time left once per period until the deadline.
//! - Report `Finished` exactly once when the deadline passes.
//!
//! # Invariants
//! - One thread per `Countdown`; `stop` (or drop) joins it, so no tick is
//!   produced after teardown.

use crossbeam_channel::{bounded, select, tick, unbounded, Receiver, Sender};
use log::{debug, error};
use std::thread::JoinHandle;
use std::time::{Duration, Instant};

/// One message from a running countdown.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CountdownTick {
    /// Time left before the deadline.
    Remaining(Duration),
    /// Deadline reached; no further ticks follow.
    Finished,
}

/// Handle to a running countdown thread.
#[derive(Debug)]
pub struct Countdown {
    ticks: Receiver<CountdownTick>,
    stop: Option<Sender<()>>,
    thread: Option<JoinHandle<()>>,
}

impl Countdown {
    /// Starts counting down `total` in steps of `period`.
    ///
    /// # Errors
    /// - `InvalidInput` when `total` does not fit on the monotonic clock.
    /// - The countdown thread could not be spawned.
    pub fn start(total: Duration, period: Duration) -> std::io::Result<Self> {
        let deadline = Instant::now().checked_add(total).ok_or_else(|| {
            std::io::Error::new(
                std::io::ErrorKind::InvalidInput,
                format!("countdown of {}s is out of range", total.as_secs()),
            )
        })?;
        let (ticks_tx, ticks_rx) = unbounded();
        let (stop_tx, stop_rx) = bounded::<()>(0);
        let thread = std::thread::Builder::new()
            .name("nightwords-countdown".to_string())
            .spawn(move || run_countdown(deadline, period, ticks_tx, stop_rx))?;

        debug!(
            "event=countdown_start module=timer status=ok total_ms={} period_ms={}",
            total.as_millis(),
            period.as_millis()
        );
        Ok(Self {
            ticks: ticks_rx,
            stop: Some(stop_tx),
            thread: Some(thread),
        })
    }

    /// Ticks delivered since the last drain, oldest first.
    pub fn drain(&self) -> Vec<CountdownTick> {
        self.ticks.try_iter().collect()
    }

    /// Blocks up to `timeout` for the next tick.
    pub fn next_tick(&self, timeout: Duration) -> Option<CountdownTick> {
        self.ticks.recv_timeout(timeout).ok()
    }

    pub fn is_running(&self) -> bool {
        self.thread
            .as_ref()
            .is_some_and(|thread| !thread.is_finished())
    }

    /// Stops the thread and waits for it to exit. Idempotent.
    pub fn stop(&mut self) {
        // Dropping the sender wakes the thread's `select!`.
        self.stop.take();
        if let Some(thread) = self.thread.take() {
            if thread.join().is_err() {
                error!("event=countdown_stop module=timer status=error error_code=thread_panicked");
            }
        }
    }
}

impl Drop for Countdown {
    fn drop(&mut self) {
        self.stop();
    }
}

fn run_countdown(
    deadline: Instant,
    period: Duration,
    ticks: Sender<CountdownTick>,
    stop: Receiver<()>,
) {
    let ticker = tick(period);
    loop {
        select! {
            recv(stop) -> _ => break,
            recv(ticker) -> _ => {
                let now = Instant::now();
                let message = if now >= deadline {
                    CountdownTick::Finished
                } else {
                    CountdownTick::Remaining(deadline - now)
                };
                if ticks.send(message).is_err() || message == CountdownTick::Finished {
                    break;
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{Countdown, CountdownTick};
    use std::time::Duration;

    #[test]
    fn short_countdown_finishes_once() {
        let countdown =
            Countdown::start(Duration::from_millis(30), Duration::from_millis(5)).unwrap();

        let mut finished = 0;
        while let Some(tick) = countdown.next_tick(Duration::from_secs(2)) {
            if tick == CountdownTick::Finished {
                finished += 1;
            }
        }
        assert_eq!(finished, 1);
    }

    #[test]
    fn out_of_range_total_is_rejected() {
        let err = Countdown::start(Duration::MAX, Duration::from_millis(5)).unwrap_err();
        assert_eq!(err.kind(), std::io::ErrorKind::InvalidInput);
    }

    #[test]
    fn stop_ends_ticking() {
        let mut countdown =
            Countdown::start(Duration::from_secs(60), Duration::from_millis(5)).unwrap();
        assert!(countdown.next_tick(Duration::from_secs(2)).is_some());

        countdown.stop();
        assert!(!countdown.is_running());
        countdown.drain();
        assert_eq!(countdown.next_tick(Duration::from_millis(50)), None);
    }
}
