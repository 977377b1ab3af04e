//! Application layer for the Roles context.

pub mod wake_order_source;
