//! Flutter-facing bindings for the Nightwords core.

pub mod api;
