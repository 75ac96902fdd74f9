use directory_core::SessionTracker;
use std::sync::Arc;
use uuid::Uuid;

pub fn create_shared_tracker() -> Arc<SessionTracker> {
    Arc::new(SessionTracker::new())
}

/// Signs a fresh player in and returns their id.
#[allow(dead_code)]
pub fn sign_in_new_player(tracker: &SessionTracker) -> Uuid {
    let player_id = Uuid::new_v4();
    let committed = tracker
        .try_begin_session(player_id)
        .expect("fresh player should not be active")
        .commit();
    assert!(committed);
    player_id
}
