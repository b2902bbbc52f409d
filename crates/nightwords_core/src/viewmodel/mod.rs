//! Per-screen view-state holders.
//!
//! # Responsibility
//! - Hold observable screen state derived from the record store or game.
//! - Expose user intents and publish one-shot events.
//!
//! # Invariants
//! - Holders receive their `SleepStore` handle by construction; there is no
//!   global store.
//! - Store round trips are blocking and must be issued off the UI thread.
//! - A lookup miss is a silent no-op, never an error.

pub mod event;
pub mod game;
pub mod score;
pub mod sleep_detail;
pub mod sleep_quality;
pub mod sleep_tracker;
