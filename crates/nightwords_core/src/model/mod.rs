//! Domain model shared by the sleep tracker and the word game.
//!
//! # Responsibility
//! - Define canonical records owned by the record store.
//! - Hold small pure domain helpers (word pool, quality labels).
//!
//! # Invariants
//! - Every sleep night is identified by a stable `NightId` assigned by storage.
//! - Nights are never deleted one by one; only bulk clear removes them.

pub mod sleep_night;
pub mod word_pool;
