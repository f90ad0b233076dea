//! Process-wide keyframe ticker (§5: "Keyframe ticker: 3 s").

use std::time::Duration;

use crate::registry::Registry;

const KEYFRAME_TICK: Duration = Duration::from_secs(3);

/// Spawn the global keyframe ticker. Every tick, every room currently known
/// to `registry` has its `dispatch_keyframe` invoked; rooms created after the
/// ticker starts are picked up on the next tick via `Registry::all_rooms`.
pub fn spawn_keyframe_ticker(registry: Registry) {
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(KEYFRAME_TICK);
        loop {
            ticker.tick().await;
            for room in registry.all_rooms() {
                room.peers.dispatch_keyframe().await;
            }
        }
    });
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tick_interval_is_three_seconds() {
        assert_eq!(KEYFRAME_TICK.as_secs(), 3);
    }
}
