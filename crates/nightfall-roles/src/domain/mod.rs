//! Domain layer for the Roles context.

pub mod catalog;
pub mod roster;
pub mod wake_order;
