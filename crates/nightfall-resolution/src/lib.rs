//! Nightfall — Resolution bounded context.
//!
//! Role action handlers stage the moderator's choices into a per-night
//! scratchpad; the night pipeline reduces that scratchpad and the carried-over
//! state into new deaths and side effects; the victory module decides when
//! the game is over. Everything here is pure and synchronous.

pub mod domain;
