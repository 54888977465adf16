//! Gathering session state and participant bookkeeping
//!
//! A `GatheringSession` is one registry entry: the live session returned to
//! clients, the cleaned copy used for template comparison, the criteria list
//! used for criteria search, and the connections currently joined.

use crate::error::{RendezvousError, Result};
use crate::types::{ConnectionId, GatheringId, MatchmakeSession, MatchmakeSessionSearchCriteria};
use std::collections::HashSet;

/// Concrete registry entry for one gathering
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GatheringSession {
    /// Game-visible state, mutated as connections join and leave
    game_session: MatchmakeSession,
    /// Cleaned snapshot compared against search templates
    search_session: MatchmakeSession,
    /// Criteria list compared during criteria search
    search_criteria: Vec<MatchmakeSessionSearchCriteria>,
    /// Joined connections in join order
    participants: Vec<ConnectionId>,
}

impl GatheringSession {
    /// Create an entry with no participants
    pub fn new(
        game_session: MatchmakeSession,
        search_session: MatchmakeSession,
        search_criteria: Vec<MatchmakeSessionSearchCriteria>,
    ) -> Self {
        Self {
            game_session,
            search_session,
            search_criteria,
            participants: Vec::new(),
        }
    }

    pub fn id(&self) -> GatheringId {
        self.game_session.id()
    }

    pub fn game_session(&self) -> &MatchmakeSession {
        &self.game_session
    }

    pub(crate) fn game_session_mut(&mut self) -> &mut MatchmakeSession {
        &mut self.game_session
    }

    pub fn search_session(&self) -> &MatchmakeSession {
        &self.search_session
    }

    pub fn search_criteria(&self) -> &[MatchmakeSessionSearchCriteria] {
        &self.search_criteria
    }

    pub fn participants(&self) -> &[ConnectionId] {
        &self.participants
    }

    pub fn participant_count(&self) -> usize {
        self.participants.len()
    }

    pub fn is_empty(&self) -> bool {
        self.participants.is_empty()
    }

    pub fn is_full(&self) -> bool {
        self.participants.len() >= self.game_session.maximum_participants()
    }

    pub fn contains(&self, connection_id: ConnectionId) -> bool {
        self.participants.contains(&connection_id)
    }

    /// A session accepts newcomers while it has room and is open
    pub fn is_joinable(&self) -> bool {
        !self.is_full() && self.game_session.open_participation
    }

    /// Append connections to the session
    ///
    /// Either every connection is appended or none is. Fails with
    /// `GatheringFull` when the batch does not fit and with
    /// `AlreadyParticipating` when any connection is already joined or
    /// repeated within the batch.
    pub fn add_participants(&mut self, connection_ids: &[ConnectionId]) -> Result<()> {
        let gathering_id = self.id();

        if self.participants.len() + connection_ids.len()
            > self.game_session.maximum_participants()
        {
            return Err(RendezvousError::GatheringFull { gathering_id }.into());
        }

        let mut seen = HashSet::with_capacity(connection_ids.len());
        for &connection_id in connection_ids {
            if self.contains(connection_id) || !seen.insert(connection_id) {
                return Err(RendezvousError::AlreadyParticipating {
                    connection_id,
                    gathering_id,
                }
                .into());
            }
        }

        self.participants.extend_from_slice(connection_ids);
        self.sync_participation_count();
        Ok(())
    }

    /// Remove a connection, returning whether it was joined
    pub fn remove_participant(&mut self, connection_id: ConnectionId) -> bool {
        let before = self.participants.len();
        self.participants.retain(|&id| id != connection_id);
        let removed = self.participants.len() != before;
        if removed {
            self.sync_participation_count();
        }
        removed
    }

    /// First participant that is not `my_connection_id`
    pub fn other_participant(&self, my_connection_id: ConnectionId) -> Option<ConnectionId> {
        self.participants
            .iter()
            .copied()
            .find(|&id| id != my_connection_id)
    }

    pub(crate) fn set_open_participation(&mut self, open: bool) {
        self.game_session.open_participation = open;
    }

    fn sync_participation_count(&mut self) {
        self.game_session.participation_count = self.participants.len() as u32;
    }
}
