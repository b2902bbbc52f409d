//! Sleep night domain model.
//!
//! # Responsibility
//! - Define the canonical record for one tracked sleep session.
//! - Provide lifecycle helpers for open/closed session semantics.
//!
//! # Invariants
//! - `night_id` is assigned by storage, starts at 1 and is never reused.
//! - A night is open while `end_time_milli == start_time_milli`.
//! - `sleep_quality == UNSET_QUALITY` until the user rates the night.

use serde::{Deserialize, Serialize};

/// Stable identifier for one stored sleep night.
pub type NightId = i64;

/// Sentinel stored in `sleep_quality` before the user picks a rating.
pub const UNSET_QUALITY: i32 = -1;

/// Highest rating offered by the quality screen.
pub const MAX_QUALITY: i32 = 5;

/// Canonical record for one sleep session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SleepNight {
    /// Storage-assigned id. `0` until the night has been inserted.
    pub night_id: NightId,
    /// Unix epoch milliseconds when tracking started.
    pub start_time_milli: i64,
    /// Unix epoch milliseconds when tracking stopped; equals start while open.
    pub end_time_milli: i64,
    /// Rating in `0..=5`, or `UNSET_QUALITY`.
    pub sleep_quality: i32,
}

impl SleepNight {
    /// Creates an unsaved, open night starting at `start_time_milli`.
    ///
    /// # Invariants
    /// - `night_id` is `0`; storage assigns the real id on insert.
    /// - End equals start and quality is unset.
    pub fn starting_at(start_time_milli: i64) -> Self {
        Self {
            night_id: 0,
            start_time_milli,
            end_time_milli: start_time_milli,
            sleep_quality: UNSET_QUALITY,
        }
    }

    /// Returns whether tracking for this night is still running.
    pub fn is_open(&self) -> bool {
        self.end_time_milli == self.start_time_milli
    }

    /// Returns whether the user has rated this night.
    pub fn has_quality(&self) -> bool {
        self.sleep_quality != UNSET_QUALITY
    }

    /// Tracked duration in milliseconds. Zero while open.
    pub fn duration_ms(&self) -> i64 {
        self.end_time_milli.saturating_sub(self.start_time_milli)
    }

    /// Closes the night at `now_milli`.
    ///
    /// The end is clamped to `start + 1` so a closed night never reads as
    /// open, even when the clock has not advanced since start.
    pub fn close_at(&mut self, now_milli: i64) {
        self.end_time_milli = now_milli.max(self.start_time_milli.saturating_add(1));
    }
}

/// Human-readable label for a numeric quality rating.
pub fn quality_label(quality: i32) -> &'static str {
    match quality {
        0 => "Very bad",
        1 => "Poor",
        2 => "So-so",
        3 => "OK",
        4 => "Pretty good",
        5 => "Excellent",
        _ => "--",
    }
}

/// Icon resource name for a numeric quality rating.
///
/// Unrated or out-of-range values map to the "active" icon.
pub fn quality_icon(quality: i32) -> &'static str {
    match quality {
        0 => "ic_sleep_0",
        1 => "ic_sleep_1",
        2 => "ic_sleep_2",
        3 => "ic_sleep_3",
        4 => "ic_sleep_4",
        5 => "ic_sleep_5",
        _ => "ic_sleep_active",
    }
}
