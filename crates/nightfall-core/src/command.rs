//! Moderator command abstraction.

use uuid::Uuid;

/// Trait implemented by every moderator command.
pub trait Command: Send + Sync + std::fmt::Debug {
    /// Stable command name, used in logs (e.g. `game.advance_night`).
    fn command_type(&self) -> &'static str;

    /// Correlation ID carried into every event the command produces.
    fn correlation_id(&self) -> Uuid;
}
