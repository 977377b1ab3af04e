//! Shared application state.

use std::sync::Arc;

use nightfall_core::clock::Clock;
use nightfall_core::snapshot::SnapshotRepository;
use nightfall_game::domain::aggregates::GameSession;
use nightfall_roles::application::wake_order_source::WakeOrderSource;
use tokio::sync::Mutex;

/// Wake-order defaults for new games.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GameDefaults {
    /// Variant used when a start request names none.
    pub variant: String,
    /// Merge base-role wake orders under the variant's.
    pub include_base_roles: bool,
}

/// Application state shared across all request handlers.
///
/// The live game sits behind one async mutex; commands and the elapsed-time
/// ticker both take it, so they never interleave.
#[derive(Clone)]
pub struct AppState {
    /// The game in progress, if any.
    pub game: Arc<Mutex<Option<GameSession>>>,
    /// Clock for event timestamps.
    pub clock: Arc<dyn Clock>,
    /// Snapshot persistence.
    pub snapshots: Arc<dyn SnapshotRepository>,
    /// Per-variant wake orders.
    pub wake_orders: Arc<dyn WakeOrderSource>,
    /// Defaults for new games.
    pub defaults: GameDefaults,
}

impl AppState {
    /// Create new application state with no game running.
    #[must_use]
    pub fn new(
        clock: Arc<dyn Clock>,
        snapshots: Arc<dyn SnapshotRepository>,
        wake_orders: Arc<dyn WakeOrderSource>,
        defaults: GameDefaults,
    ) -> Self {
        Self {
            game: Arc::new(Mutex::new(None)),
            clock,
            snapshots,
            wake_orders,
            defaults,
        }
    }
}
