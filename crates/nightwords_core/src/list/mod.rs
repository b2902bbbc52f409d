//! Sleep list presentation: display model plus incremental list adapter.
//!
//! # Responsibility
//! - Turn record snapshots into header-prefixed display sequences.
//! - Patch a host list view with the minimal diff between sequences.
//!
//! # See also
//! - `crate::diff`

pub mod adapter;
pub mod model;
