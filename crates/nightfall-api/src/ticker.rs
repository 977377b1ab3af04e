//! Background task that feeds elapsed time into the running game.

use std::time::Duration;

use nightfall_game::application::command_handlers;
use nightfall_game::domain::commands::Tick;
use tokio::task::JoinHandle;
use tokio::time::{self, MissedTickBehavior};
use tracing::debug;
use uuid::Uuid;

use crate::state::AppState;

/// Interval between ticks.
pub const TICK_INTERVAL: Duration = Duration::from_secs(1);

/// Spawns a task that ticks the game once per [`TICK_INTERVAL`].
///
/// Ticks go through the same lock as moderator commands.
pub fn spawn_ticker(state: AppState) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut interval = time::interval(TICK_INTERVAL);
        interval.set_missed_tick_behavior(MissedTickBehavior::Skip);
        // The first tick completes immediately.
        interval.tick().await;

        loop {
            interval.tick().await;
            let command = Tick {
                correlation_id: Uuid::new_v4(),
                seconds: 1,
            };
            let mut game = state.game.lock().await;
            if let Some(result) =
                command_handlers::handle_tick(&command, &mut game, state.clock.as_ref())
                && !result.events.is_empty()
            {
                debug!(events = result.events.len(), phase = %result.phase, "timer ticked");
            }
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    use std::sync::Arc;

    use chrono::Utc;
    use nightfall_roles::application::wake_order_source::YamlWakeOrderSource;
    use nightfall_test_support::{FixedClock, RecordingSnapshotRepository};

    use crate::state::GameDefaults;

    #[tokio::test]
    async fn test_ticker_without_game_keeps_running() {
        let state = AppState::new(
            Arc::new(FixedClock(Utc::now())),
            Arc::new(RecordingSnapshotRepository::new()),
            Arc::new(YamlWakeOrderSource::default()),
            GameDefaults {
                variant: "base".to_owned(),
                include_base_roles: true,
            },
        );

        let handle = spawn_ticker(state.clone());
        time::sleep(Duration::from_millis(1_200)).await;

        assert!(!handle.is_finished());
        assert!(state.game.lock().await.is_none());
        handle.abort();
    }
}
