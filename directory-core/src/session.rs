use dashmap::DashMap;
use dashmap::mapref::entry::Entry;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, Instant};
use tracing::debug;
use uuid::Uuid;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SessionError {
    #[error("player {0} already has an active session")]
    AlreadyActive(Uuid),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum SessionState {
    /// Sign-in in progress; blocks other sign-ins but is not yet visible as active.
    Reserved,
    Active,
}

#[derive(Debug, Clone)]
struct SessionEntry {
    state: SessionState,
    token: u64,
    since: Instant,
}

/// Process-local set of signed-in player ids.
///
/// Membership is not persisted: a restart signs everybody out.
pub struct SessionTracker {
    sessions: DashMap<Uuid, SessionEntry>,
    next_token: AtomicU64,
}

impl SessionTracker {
    pub fn new() -> Self {
        Self {
            sessions: DashMap::new(),
            next_token: AtomicU64::new(1),
        }
    }

    /// Claims the session slot for `player_id`.
    ///
    /// Check and insert happen under the map's shard lock, so of two racing
    /// callers exactly one gets a reservation. The slot is released again if
    /// the reservation is dropped without [`SessionReservation::commit`].
    pub fn try_begin_session(
        &self,
        player_id: Uuid,
    ) -> Result<SessionReservation<'_>, SessionError> {
        let token = self.next_token.fetch_add(1, Ordering::Relaxed);

        match self.sessions.entry(player_id) {
            Entry::Occupied(_) => Err(SessionError::AlreadyActive(player_id)),
            Entry::Vacant(vacant) => {
                vacant.insert(SessionEntry {
                    state: SessionState::Reserved,
                    token,
                    since: Instant::now(),
                });
                debug!("Reserved session for player {}", player_id);

                Ok(SessionReservation {
                    tracker: self,
                    player_id,
                    token,
                    committed: false,
                })
            }
        }
    }

    /// Removes the player's session. Ending a session that does not exist is
    /// not an error; the return value only reports whether one was removed.
    pub fn end_session(&self, player_id: Uuid) -> bool {
        let removed = self.sessions.remove(&player_id).is_some();
        if removed {
            debug!("Ended session for player {}", player_id);
        }
        removed
    }

    pub fn is_active(&self, player_id: Uuid) -> bool {
        self.sessions
            .get(&player_id)
            .map(|entry| entry.state == SessionState::Active)
            .unwrap_or(false)
    }

    pub fn active_duration(&self, player_id: Uuid) -> Option<Duration> {
        self.sessions
            .get(&player_id)
            .filter(|entry| entry.state == SessionState::Active)
            .map(|entry| entry.since.elapsed())
    }

    pub fn active_count(&self) -> usize {
        self.sessions
            .iter()
            .filter(|entry| entry.state == SessionState::Active)
            .count()
    }

    /// Drops every session, as a process restart would.
    pub fn clear(&self) {
        self.sessions.clear();
    }

    fn activate(&self, player_id: Uuid, token: u64) -> bool {
        match self.sessions.get_mut(&player_id) {
            Some(mut entry) if entry.token == token => {
                entry.state = SessionState::Active;
                entry.since = Instant::now();
                true
            }
            _ => false,
        }
    }

    fn release(&self, player_id: Uuid, token: u64) {
        let released = self
            .sessions
            .remove_if(&player_id, |_, entry| {
                entry.token == token && entry.state == SessionState::Reserved
            })
            .is_some();

        if released {
            debug!("Released session reservation for player {}", player_id);
        }
    }
}

impl Default for SessionTracker {
    fn default() -> Self {
        Self::new()
    }
}

/// A claimed but not yet active session slot.
#[must_use = "an uncommitted reservation is released when dropped"]
pub struct SessionReservation<'a> {
    tracker: &'a SessionTracker,
    player_id: Uuid,
    token: u64,
    committed: bool,
}

impl SessionReservation<'_> {
    /// Marks the session active. Returns `false` if the slot was ended while
    /// the reservation was pending, in which case nothing is activated.
    pub fn commit(mut self) -> bool {
        self.committed = true;
        self.tracker.activate(self.player_id, self.token)
    }
}

impl Drop for SessionReservation<'_> {
    fn drop(&mut self) {
        if !self.committed {
            self.tracker.release(self.player_id, self.token);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_begin_commit_end_cycle() {
        let tracker = SessionTracker::new();
        let player_id = Uuid::new_v4();

        let reservation = tracker.try_begin_session(player_id).unwrap();
        assert!(!tracker.is_active(player_id));
        assert!(reservation.commit());
        assert!(tracker.is_active(player_id));
        assert_eq!(tracker.active_count(), 1);

        assert!(tracker.end_session(player_id));
        assert!(!tracker.is_active(player_id));
        assert_eq!(tracker.active_count(), 0);
    }

    #[test]
    fn test_second_begin_is_rejected_while_active() {
        let tracker = SessionTracker::new();
        let player_id = Uuid::new_v4();

        assert!(tracker.try_begin_session(player_id).unwrap().commit());

        let second = tracker.try_begin_session(player_id);
        assert_eq!(second.err(), Some(SessionError::AlreadyActive(player_id)));
    }

    #[test]
    fn test_pending_reservation_blocks_other_callers() {
        let tracker = SessionTracker::new();
        let player_id = Uuid::new_v4();

        let _reservation = tracker.try_begin_session(player_id).unwrap();
        assert!(tracker.try_begin_session(player_id).is_err());
    }

    #[test]
    fn test_dropped_reservation_is_released() {
        let tracker = SessionTracker::new();
        let player_id = Uuid::new_v4();

        {
            let _reservation = tracker.try_begin_session(player_id).unwrap();
        }

        assert!(!tracker.is_active(player_id));
        assert!(tracker.try_begin_session(player_id).unwrap().commit());
    }

    #[test]
    fn test_end_session_is_idempotent() {
        let tracker = SessionTracker::new();
        let player_id = Uuid::new_v4();

        assert!(!tracker.end_session(player_id));
        assert!(tracker.try_begin_session(player_id).unwrap().commit());
        assert!(tracker.end_session(player_id));
        assert!(!tracker.end_session(player_id));
    }

    #[test]
    fn test_stale_reservation_does_not_release_newer_session() {
        let tracker = SessionTracker::new();
        let player_id = Uuid::new_v4();

        let stale = tracker.try_begin_session(player_id).unwrap();
        // Signed out while the first sign-in was still pending
        tracker.end_session(player_id);
        assert!(tracker.try_begin_session(player_id).unwrap().commit());

        assert!(!stale.commit());
        assert!(tracker.is_active(player_id));
    }

    #[test]
    fn test_clear_resets_membership() {
        let tracker = SessionTracker::new();
        for _ in 0..5 {
            assert!(tracker.try_begin_session(Uuid::new_v4()).unwrap().commit());
        }
        assert_eq!(tracker.active_count(), 5);

        tracker.clear();
        assert_eq!(tracker.active_count(), 0);
    }
}
