//! Domain layer for the Resolution context.

pub mod handlers;
pub mod pipeline;
pub mod powers;
pub mod scratchpad;
pub mod victory;
