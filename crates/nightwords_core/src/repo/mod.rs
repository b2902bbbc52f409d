//! Repository layer over the sleep database.
//!
//! # Responsibility
//! - Define the data access contract used by the store worker.
//! - Isolate SQL details from the store and view-state layers.
//!
//! # Invariants
//! - Repository APIs return semantic errors (`NotFound`) in addition to DB
//!   transport errors.

pub mod sleep_repo;
