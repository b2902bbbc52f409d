//! Application core for the Nightwords sleep tracker and word game.
//! The UI shell renders what this crate exposes and forwards taps back.

pub mod clock;
pub mod db;
pub mod diff;
pub mod list;
pub mod logging;
pub mod model;
pub mod repo;
pub mod store;
pub mod timer;
pub mod viewmodel;

pub use clock::{Clock, ManualClock, SystemClock};
pub use diff::{diff, DiffCounts, DiffError, DiffOp, DiffResult, Diffable};
pub use list::adapter::{
    ListAdapter, ListHost, LocalSleepNightAdapter, RowBuffer, SleepNightAdapter,
};
pub use list::model::{
    build_display_items, format_nights, DisplayItem, NightFormatter, NightRow, RowKey,
};
pub use logging::{default_log_level, init_logging, logging_status};
pub use model::sleep_night::{NightId, SleepNight, UNSET_QUALITY};
pub use model::word_pool::WordPool;
pub use repo::sleep_repo::{RepoError, RepoResult, SleepRepository, SqliteSleepRepository};
pub use store::{
    NightsSnapshot, SleepStore, StoreCall, StoreConfig, StoreError, StoreResult, Subscription,
};
pub use viewmodel::game::{GameConfig, GameEvent, GameSavedState, GameViewModel};
pub use viewmodel::score::{ScoreEvent, ScoreViewModel};
pub use viewmodel::sleep_detail::{DetailEvent, SleepDetailViewModel};
pub use viewmodel::sleep_quality::{QualityEvent, SleepQualityViewModel};
pub use viewmodel::sleep_tracker::{SleepTrackerViewModel, TrackerEvent};

/// Minimal health-check API for host integration.
pub fn ping() -> &'static str {
    "pong"
}

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}

#[cfg(test)]
mod tests {
    use super::{core_version, ping};

    #[test]
    fn ping_returns_pong() {
        assert_eq!(ping(), "pong");
    }

    #[test]
    fn version_is_not_empty() {
        assert!(!core_version().is_empty());
    }
}
