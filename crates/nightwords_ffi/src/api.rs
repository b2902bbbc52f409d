//! FFI use-case API for Flutter-facing calls.
//!
//! # Responsibility
//! - Expose one opaque session per screen to Dart via FRB.
//! - Flatten core state, list patches and one-shot events into plain
//!   transfer types.
//!
//! # Invariants
//! - Exported functions must not panic across FFI boundary.
//! - Errors cross the boundary as UTF-8 messages.
//! - Sessions opened from one tracker share its store worker.

use log::warn;
use nightwords_core::model::sleep_night::{quality_icon, quality_label, SleepNight};
use nightwords_core::{
    core_version as core_version_inner, init_logging as init_logging_inner, ping as ping_inner,
    DetailEvent, DisplayItem, GameConfig, GameEvent, GameSavedState, GameViewModel, ListHost,
    LocalSleepNightAdapter, NightFormatter, QualityEvent, ScoreEvent, ScoreViewModel,
    SleepDetailViewModel, SleepNightAdapter, SleepQualityViewModel, SleepStore,
    SleepTrackerViewModel, StoreConfig, TrackerEvent,
};
use std::fmt::Display;
use std::sync::{Mutex, MutexGuard, PoisonError};

/// Minimal health-check API for FRB smoke integration.
///
/// # FFI contract
/// - Sync call, non-blocking.
/// - Never throws; always returns a UTF-8 string.
#[flutter_rust_bridge::frb(sync)]
pub fn ping() -> String {
    ping_inner().to_owned()
}

/// Expose core crate version through FFI.
///
/// # FFI contract
/// - Sync call, non-blocking.
/// - Never throws; always returns a UTF-8 string.
#[flutter_rust_bridge::frb(sync)]
pub fn core_version() -> String {
    core_version_inner().to_owned()
}

/// Initializes Rust core logging once per process.
///
/// Input semantics:
/// - `level`: one of `trace|debug|info|warn|error` (case-insensitive).
/// - `log_dir`: absolute directory path where rolling logs are written.
///
/// # FFI contract
/// - Sync call; may perform small file-system setup work.
/// - Safe to call repeatedly with the same `level + log_dir` (idempotent).
/// - Reconfiguration attempts with different level or directory return error.
/// - Never panics; returns empty string on success and error message on failure.
#[flutter_rust_bridge::frb(sync)]
pub fn init_logging(level: String, log_dir: String) -> String {
    match init_logging_inner(level.as_str(), log_dir.as_str()) {
        Ok(()) => String::new(),
        Err(err) => err,
    }
}

/// One sleep list row. `night_id` is `None` for the header.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SleepRow {
    pub night_id: Option<i64>,
    pub duration_text: String,
    pub quality_text: String,
    pub quality_icon: String,
}

impl From<&DisplayItem> for SleepRow {
    fn from(item: &DisplayItem) -> Self {
        match item {
            DisplayItem::Header => Self {
                night_id: None,
                duration_text: String::new(),
                quality_text: String::new(),
                quality_icon: String::new(),
            },
            DisplayItem::Night(row) => Self {
                night_id: Some(row.night_id),
                duration_text: row.duration_text.clone(),
                quality_text: row.quality_text.to_string(),
                quality_icon: row.quality_icon.to_string(),
            },
        }
    }
}

/// Row primitive for the Dart list view, in apply order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ListPatch {
    Insert { index: usize, row: SleepRow },
    Remove { index: usize },
    Move { from: usize, to: usize },
    Rebind { index: usize, row: SleepRow },
}

/// Tracker screen state for one frame.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TrackerSnapshot {
    pub start_enabled: bool,
    pub stop_enabled: bool,
    pub clear_enabled: bool,
    pub rows: Vec<SleepRow>,
    pub nights_text: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TrackerSignal {
    NavigateToSleepQuality { night_id: i64 },
    NavigateToSleepDetail { night_id: i64 },
    ShowClearedSnackbar,
}

impl From<TrackerEvent> for TrackerSignal {
    fn from(event: TrackerEvent) -> Self {
        match event {
            TrackerEvent::NavigateToSleepQuality(night_id) => {
                Self::NavigateToSleepQuality { night_id }
            }
            TrackerEvent::NavigateToSleepDetail(night_id) => {
                Self::NavigateToSleepDetail { night_id }
            }
            TrackerEvent::ShowClearedSnackbar => Self::ShowClearedSnackbar,
        }
    }
}

// Records adapter primitives until the next `sync_list` drains them.
#[derive(Default)]
struct PatchRecorder {
    patches: Vec<ListPatch>,
}

impl ListHost<DisplayItem> for PatchRecorder {
    fn insert_row(&mut self, index: usize, item: &DisplayItem) {
        self.patches.push(ListPatch::Insert {
            index,
            row: SleepRow::from(item),
        });
    }

    fn remove_row(&mut self, index: usize) {
        self.patches.push(ListPatch::Remove { index });
    }

    fn move_row(&mut self, from: usize, to: usize) {
        self.patches.push(ListPatch::Move { from, to });
    }

    fn rebind_row(&mut self, index: usize, item: &DisplayItem) {
        self.patches.push(ListPatch::Rebind {
            index,
            row: SleepRow::from(item),
        });
    }
}

struct TrackerState {
    tracker: SleepTrackerViewModel,
    list: LocalSleepNightAdapter<PatchRecorder>,
}

/// Sleep tracker screen session; owns the store for its child screens.
#[flutter_rust_bridge::frb(opaque)]
pub struct SleepTrackerSession {
    store: SleepStore,
    state: Mutex<TrackerState>,
}

impl SleepTrackerSession {
    /// Opens the sleep database at `db_path` and loads tonight.
    ///
    /// A blank `db_path` opens a private in-memory database.
    ///
    /// # FFI contract
    /// - Async call; opens and migrates the database.
    /// - Never panics.
    pub fn open(db_path: String) -> Result<SleepTrackerSession, String> {
        let trimmed = db_path.trim();
        let config = if trimmed.is_empty() {
            StoreConfig::in_memory()
        } else {
            StoreConfig::file(trimmed)
        };
        let store = SleepStore::open(&config).map_err(|err| ffi_error("tracker_open", err))?;
        let tracker =
            SleepTrackerViewModel::new(store.clone()).map_err(|err| ffi_error("tracker_open", err))?;
        Ok(Self {
            store,
            state: Mutex::new(TrackerState {
                tracker,
                list: SleepNightAdapter::new(PatchRecorder::default(), NightFormatter::local()),
            }),
        })
    }

    pub fn start_tracking(&self) -> Result<(), String> {
        lock(&self.state)
            .tracker
            .on_start_tracking()
            .map_err(|err| ffi_error("tracker_start", err))
    }

    pub fn stop_tracking(&self) -> Result<(), String> {
        lock(&self.state)
            .tracker
            .on_stop_tracking()
            .map_err(|err| ffi_error("tracker_stop", err))
    }

    pub fn clear(&self) -> Result<(), String> {
        lock(&self.state)
            .tracker
            .on_clear()
            .map_err(|err| ffi_error("tracker_clear", err))
    }

    /// Forwards a tap on list `position`. Returns `false` for the header
    /// or a stale position.
    #[flutter_rust_bridge::frb(sync)]
    pub fn night_clicked(&self, position: usize) -> bool {
        let mut state = lock(&self.state);
        match state.list.night_id_at(position) {
            Some(night_id) => {
                state.tracker.on_night_clicked(night_id);
                true
            }
            None => false,
        }
    }

    /// Applies the newest nights broadcast to the list and returns the row
    /// patches the Dart list must replay, in order.
    #[flutter_rust_bridge::frb(sync)]
    pub fn sync_list(&self) -> Result<Vec<ListPatch>, String> {
        let mut guard = lock(&self.state);
        let state = &mut *guard;
        state.tracker.refresh();
        state
            .list
            .submit_nights(state.tracker.nights())
            .map_err(|err| ffi_error("tracker_sync_list", err))?;
        Ok(std::mem::take(&mut state.list.host_mut().patches))
    }

    #[flutter_rust_bridge::frb(sync)]
    pub fn snapshot(&self) -> TrackerSnapshot {
        let state = lock(&self.state);
        TrackerSnapshot {
            start_enabled: state.tracker.start_enabled(),
            stop_enabled: state.tracker.stop_enabled(),
            clear_enabled: state.tracker.clear_enabled(),
            rows: state.list.items().iter().map(SleepRow::from).collect(),
            nights_text: state.tracker.nights_text(&NightFormatter::local()),
        }
    }

    /// Consumes the oldest pending navigation or snackbar signal.
    #[flutter_rust_bridge::frb(sync)]
    pub fn take_event(&self) -> Option<TrackerSignal> {
        lock(&self.state).tracker.take_event().map(TrackerSignal::from)
    }

    #[flutter_rust_bridge::frb(sync)]
    pub fn quality_session(&self, night_id: i64) -> SleepQualitySession {
        SleepQualitySession {
            state: Mutex::new(SleepQualityViewModel::new(self.store.clone(), night_id)),
        }
    }

    pub fn detail_session(&self, night_id: i64) -> Result<SleepDetailSession, String> {
        let detail = SleepDetailViewModel::new(&self.store, night_id)
            .map_err(|err| ffi_error("detail_open", err))?;
        Ok(SleepDetailSession {
            state: Mutex::new(detail),
        })
    }
}

/// Sleep quality rating screen session.
#[flutter_rust_bridge::frb(opaque)]
pub struct SleepQualitySession {
    state: Mutex<SleepQualityViewModel>,
}

impl SleepQualitySession {
    /// Rates the night. Returns whether navigation back is now pending;
    /// `false` means the night no longer exists and the host must return
    /// to the tracker on its own.
    pub fn set_quality(&self, quality: i32) -> Result<bool, String> {
        let mut quality_vm = lock(&self.state);
        quality_vm
            .on_set_sleep_quality(quality)
            .map_err(|err| ffi_error("quality_set", err))?;
        Ok(quality_vm.pending_event() == Some(&QualityEvent::NavigateToSleepTracker))
    }

    /// Acknowledges navigation; `true` if a signal was pending.
    #[flutter_rust_bridge::frb(sync)]
    pub fn done_navigating(&self) -> bool {
        lock(&self.state).done_navigating().is_some()
    }
}

/// Detail fields for one night.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NightDetail {
    pub night_id: i64,
    pub quality_text: String,
    pub quality_icon: String,
    pub duration_text: String,
    pub start_text: String,
    /// `None` while the night is still open.
    pub end_text: Option<String>,
}

fn night_detail(night: &SleepNight) -> NightDetail {
    let formatter = NightFormatter::local();
    NightDetail {
        night_id: night.night_id,
        quality_text: quality_label(night.sleep_quality).to_string(),
        quality_icon: quality_icon(night.sleep_quality).to_string(),
        duration_text: formatter.duration_text(night),
        start_text: formatter.date_text(night.start_time_milli),
        end_text: (!night.is_open()).then(|| formatter.date_text(night.end_time_milli)),
    }
}

/// Read-only night detail screen session.
#[flutter_rust_bridge::frb(opaque)]
pub struct SleepDetailSession {
    state: Mutex<SleepDetailViewModel>,
}

impl SleepDetailSession {
    /// Pulls the newest broadcast; returns whether the night changed.
    #[flutter_rust_bridge::frb(sync)]
    pub fn refresh(&self) -> bool {
        lock(&self.state).refresh()
    }

    #[flutter_rust_bridge::frb(sync)]
    pub fn night(&self) -> Option<NightDetail> {
        lock(&self.state).night().map(night_detail)
    }

    #[flutter_rust_bridge::frb(sync)]
    pub fn close(&self) {
        lock(&self.state).on_close();
    }

    #[flutter_rust_bridge::frb(sync)]
    pub fn done_navigating(&self) -> bool {
        matches!(
            lock(&self.state).done_navigating(),
            Some(DetailEvent::NavigateToSleepTracker)
        )
    }
}

/// Game screen state for one frame.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GameSnapshot {
    pub word: String,
    pub score: i32,
    pub remaining_secs: u64,
    pub time_text: String,
    pub finished: bool,
    /// Finish signal waiting for `finish_complete`.
    pub finish_pending: bool,
}

/// Saved game fields kept by the host across recreation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GameState {
    pub word: String,
    pub score: i32,
    pub remaining_secs: u64,
    pub finished: bool,
    /// Finish signal saved before `finish_complete` was called.
    pub finish_pending: bool,
}

impl From<GameSavedState> for GameState {
    fn from(saved: GameSavedState) -> Self {
        Self {
            word: saved.word,
            score: saved.score,
            remaining_secs: saved.remaining_secs,
            finished: saved.finished,
            finish_pending: saved.finish_pending,
        }
    }
}

impl From<GameState> for GameSavedState {
    fn from(state: GameState) -> Self {
        Self {
            word: state.word,
            score: state.score,
            remaining_secs: state.remaining_secs,
            finished: state.finished,
            finish_pending: state.finish_pending,
        }
    }
}

/// Word game screen session; runs its own countdown thread.
#[flutter_rust_bridge::frb(opaque)]
pub struct GameSession {
    state: Mutex<GameViewModel>,
}

impl GameSession {
    /// Starts a new game. `seed` fixes the word order.
    #[flutter_rust_bridge::frb(sync)]
    pub fn start(seed: Option<u64>) -> Result<GameSession, String> {
        let config = GameConfig {
            seed,
            ..GameConfig::default()
        };
        let game = GameViewModel::new(&config).map_err(|err| ffi_error("game_start", err))?;
        Ok(Self {
            state: Mutex::new(game),
        })
    }

    /// Recreates a game from state returned by `save`.
    #[flutter_rust_bridge::frb(sync)]
    pub fn restore(saved: GameState) -> Result<GameSession, String> {
        let game = GameViewModel::restore(saved.into(), &GameConfig::default())
            .map_err(|err| ffi_error("game_restore", err))?;
        Ok(Self {
            state: Mutex::new(game),
        })
    }

    #[flutter_rust_bridge::frb(sync)]
    pub fn skip(&self) -> GameSnapshot {
        let mut game = lock(&self.state);
        game.on_skip();
        game_snapshot(&game)
    }

    #[flutter_rust_bridge::frb(sync)]
    pub fn correct(&self) -> GameSnapshot {
        let mut game = lock(&self.state);
        game.on_correct();
        game_snapshot(&game)
    }

    /// Applies pending countdown ticks and returns the resulting state.
    #[flutter_rust_bridge::frb(sync)]
    pub fn pump(&self) -> GameSnapshot {
        let mut game = lock(&self.state);
        game.pump_timer();
        game_snapshot(&game)
    }

    #[flutter_rust_bridge::frb(sync)]
    pub fn hint(&self) -> String {
        lock(&self.state).word_hint()
    }

    /// Acknowledges the finish signal once the host has navigated.
    #[flutter_rust_bridge::frb(sync)]
    pub fn finish_complete(&self) {
        lock(&self.state).on_game_finish_complete();
    }

    #[flutter_rust_bridge::frb(sync)]
    pub fn save(&self) -> GameState {
        lock(&self.state).save_state().into()
    }

    /// Stops the countdown thread. The session stays readable.
    #[flutter_rust_bridge::frb(sync)]
    pub fn teardown(&self) {
        lock(&self.state).teardown();
    }
}

fn game_snapshot(game: &GameViewModel) -> GameSnapshot {
    GameSnapshot {
        word: game.word().to_string(),
        score: game.score(),
        remaining_secs: game.remaining_secs(),
        time_text: game.current_time_text(),
        finished: game.is_finished(),
        finish_pending: game.pending_event() == Some(&GameEvent::Finished),
    }
}

/// Final score screen session.
#[flutter_rust_bridge::frb(opaque)]
pub struct ScoreSession {
    state: Mutex<ScoreViewModel>,
}

impl ScoreSession {
    #[flutter_rust_bridge::frb(sync)]
    pub fn new(final_score: i32) -> ScoreSession {
        Self {
            state: Mutex::new(ScoreViewModel::new(final_score)),
        }
    }

    #[flutter_rust_bridge::frb(sync)]
    pub fn score(&self) -> i32 {
        lock(&self.state).score()
    }

    #[flutter_rust_bridge::frb(sync)]
    pub fn play_again(&self) {
        lock(&self.state).on_play_again();
    }

    /// Acknowledges play-again; `true` if the signal was pending.
    #[flutter_rust_bridge::frb(sync)]
    pub fn play_again_complete(&self) -> bool {
        lock(&self.state).on_play_again_complete() == Some(ScoreEvent::PlayAgain)
    }
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

fn ffi_error(op: &'static str, err: impl Display) -> String {
    warn!("event=ffi_call module=ffi status=error op={op} error={err}");
    format!("{op} failed: {err}")
}

#[cfg(test)]
mod tests {
    use super::{
        core_version, init_logging, ping, GameSession, GameState, ListPatch, ScoreSession,
        SleepTrackerSession, TrackerSignal,
    };

    fn open_tracker() -> (tempfile::TempDir, SleepTrackerSession) {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("sleep_history.db");
        let session = SleepTrackerSession::open(path.to_string_lossy().into_owned()).unwrap();
        (dir, session)
    }

    #[test]
    fn ping_returns_pong() {
        assert_eq!(ping(), "pong");
    }

    #[test]
    fn version_is_not_empty() {
        assert!(!core_version().is_empty());
    }

    #[test]
    fn init_logging_rejects_empty_log_dir() {
        let error = init_logging("info".to_string(), String::new());
        assert!(!error.is_empty());
    }

    #[test]
    fn init_logging_rejects_unsupported_level() {
        let error = init_logging("verbose".to_string(), "tmp/logs".to_string());
        assert!(!error.is_empty());
    }

    #[test]
    fn tracker_session_round_trip() {
        let (_dir, tracker) = open_tracker();
        assert!(tracker.snapshot().start_enabled);
        assert!(!tracker.snapshot().clear_enabled);

        tracker.start_tracking().unwrap();
        let patches = tracker.sync_list().unwrap();
        assert_eq!(patches.len(), 2);
        assert!(matches!(patches[0], ListPatch::Insert { index: 0, .. }));
        assert!(tracker.snapshot().stop_enabled);

        tracker.stop_tracking().unwrap();
        let Some(TrackerSignal::NavigateToSleepQuality { night_id }) = tracker.take_event() else {
            panic!("stop should navigate to the quality screen");
        };
        assert_eq!(tracker.take_event(), None);

        let quality = tracker.quality_session(night_id);
        assert!(quality.set_quality(4).unwrap());
        assert!(quality.done_navigating());
        assert!(!quality.done_navigating());

        let patches = tracker.sync_list().unwrap();
        assert!(patches
            .iter()
            .all(|patch| matches!(patch, ListPatch::Rebind { index: 1, .. })));
        assert!(!patches.is_empty());
        let snapshot = tracker.snapshot();
        assert_eq!(snapshot.rows[1].quality_text, "Pretty good");
        assert!(snapshot.start_enabled);

        let detail = tracker.detail_session(night_id).unwrap();
        let night = detail.night().unwrap();
        assert_eq!(night.night_id, night_id);
        assert!(night.end_text.is_some());
    }

    #[test]
    fn tapping_header_is_ignored() {
        let (_dir, tracker) = open_tracker();
        tracker.start_tracking().unwrap();
        tracker.sync_list().unwrap();

        assert!(!tracker.night_clicked(0));
        assert!(tracker.night_clicked(1));
        assert!(matches!(
            tracker.take_event(),
            Some(TrackerSignal::NavigateToSleepDetail { .. })
        ));
    }

    #[test]
    fn rating_missing_night_does_not_navigate() {
        let tracker = SleepTrackerSession::open(String::new()).unwrap();
        let quality = tracker.quality_session(404);
        assert!(!quality.set_quality(3).unwrap());
        assert!(!quality.done_navigating());
    }

    #[test]
    fn game_session_save_and_restore() {
        let game = GameSession::start(Some(9)).unwrap();
        game.correct();
        let snapshot = game.skip();
        assert_eq!(snapshot.score, 0);
        assert!(!snapshot.word.is_empty());

        let saved = game.save();
        game.teardown();
        let restored = GameSession::restore(saved.clone()).unwrap();
        let snapshot = restored.pump();
        assert_eq!(snapshot.word, saved.word);
        assert!(!snapshot.finish_pending);
        restored.teardown();
    }

    #[test]
    fn restored_pending_finish_is_reported_until_acknowledged() {
        let saved = GameState {
            word: "crow".to_string(),
            score: 5,
            remaining_secs: 0,
            finished: true,
            finish_pending: true,
        };

        let restored = GameSession::restore(saved).unwrap();
        assert!(restored.pump().finish_pending);
        restored.finish_complete();
        assert!(!restored.pump().finish_pending);
        assert!(!restored.save().finish_pending);
    }

    #[test]
    fn restore_with_huge_remaining_time_does_not_fail() {
        let saved = GameState {
            word: "bag".to_string(),
            score: 0,
            remaining_secs: u64::MAX,
            finished: false,
            finish_pending: false,
        };

        let restored = GameSession::restore(saved).unwrap();
        assert_eq!(restored.pump().remaining_secs, 120);
        restored.teardown();
    }

    #[test]
    fn score_session_play_again_once() {
        let score = ScoreSession::new(7);
        assert_eq!(score.score(), 7);
        score.play_again();
        assert!(score.play_again_complete());
        assert!(!score.play_again_complete());
    }
}
