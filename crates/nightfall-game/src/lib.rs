//! Nightfall — Game Session bounded context.
//!
//! Owns the single live game: the phase state machine, the night's slot
//! sequence and undo stack, day execution, the discussion timer and the
//! snapshot handed to persistence after every moderator action.

pub mod application;
pub mod domain;
