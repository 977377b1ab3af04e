//! Nightfall — Roles bounded context.
//!
//! Owns the static role catalog, the roster and death ledgers, and the
//! wake-order resolver that turns a roster into the night's slot sequence.

pub mod application;
pub mod domain;
