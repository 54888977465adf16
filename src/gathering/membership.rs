//! Membership operations over the session store
//!
//! Joining, leaving and connection lookups. A session whose last participant
//! leaves is deleted in the same call, so the store never holds an empty one.

use crate::error::Result;
use crate::gathering::store::SessionStore;
use crate::types::{ConnectionId, GatheringId};
use tracing::debug;

/// What happened when a connection was removed from a gathering
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RemovalOutcome {
    /// The connection was not a participant
    NotParticipating,
    /// The connection left; others remain
    Left { remaining: usize },
    /// The connection was the last participant and the gathering was deleted
    GatheringDeleted,
}

impl SessionStore {
    /// Join connections to an existing gathering
    pub fn add_participants(
        &mut self,
        gathering_id: GatheringId,
        connection_ids: &[ConnectionId],
    ) -> Result<()> {
        self.require_mut(gathering_id)?
            .add_participants(connection_ids)
    }

    /// Remove a connection from a gathering, deleting the gathering if it empties
    pub fn remove_from_session(
        &mut self,
        connection_id: ConnectionId,
        gathering_id: GatheringId,
    ) -> Result<RemovalOutcome> {
        let session = self.require_mut(gathering_id)?;

        if !session.remove_participant(connection_id) {
            return Ok(RemovalOutcome::NotParticipating);
        }

        if session.is_empty() {
            self.remove(gathering_id);
            debug!(
                "Connection {} left gathering {}; gathering deleted",
                connection_id, gathering_id
            );
            return Ok(RemovalOutcome::GatheringDeleted);
        }

        let remaining = session.participant_count();
        debug!(
            "Connection {} left gathering {} ({} remaining)",
            connection_id, gathering_id, remaining
        );
        Ok(RemovalOutcome::Left { remaining })
    }

    /// Gathering the connection currently participates in
    pub fn find_session_of(&self, connection_id: ConnectionId) -> Option<GatheringId> {
        self.iter()
            .find(|(_, session)| session.contains(connection_id))
            .map(|(id, _)| id)
    }

    /// Remove a connection from whichever gathering holds it
    ///
    /// A connection that is in no gathering is left alone; this is how
    /// clients that vanished without leaving get cleaned up.
    pub fn remove_from_all_sessions(
        &mut self,
        connection_id: ConnectionId,
    ) -> Option<(GatheringId, RemovalOutcome)> {
        let gathering_id = self.find_session_of(connection_id)?;
        self.remove_from_session(connection_id, gathering_id)
            .ok()
            .map(|outcome| (gathering_id, outcome))
    }

    /// A participant of `gathering_id` other than `my_connection_id`
    pub fn find_other_participant(
        &self,
        my_connection_id: ConnectionId,
        gathering_id: GatheringId,
    ) -> Option<ConnectionId> {
        self.get(gathering_id)?
            .other_participant(my_connection_id)
    }
}
