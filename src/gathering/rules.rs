//! Per-game matchmaking rules supplied by the embedding application
//!
//! The core compares sessions structurally. Which fields take part in that
//! comparison is a per-game decision, so it is injected here. Implementations
//! must be pure: no side effects and the same output for the same input.

use crate::types::{MatchmakeSession, MatchmakeSessionSearchCriteria, Pid};

/// Game-specific matchmaking capability
pub trait MatchmakeRules: Send + Sync {
    /// Strip fields that must not influence template matching
    fn cleanup_search_session(&self, session: MatchmakeSession) -> MatchmakeSession;

    /// Normalize a criteria list before it is stored or compared
    fn cleanup_search_criteria(
        &self,
        criteria: Vec<MatchmakeSessionSearchCriteria>,
    ) -> Vec<MatchmakeSessionSearchCriteria>;

    /// Extra game-specific acceptance test for a criteria-search candidate
    fn criteria_check(
        &self,
        _requester: Pid,
        _session: &MatchmakeSession,
        _criteria: &[MatchmakeSessionSearchCriteria],
    ) -> bool {
        true
    }
}

/// Rules that ignore the fields the server itself assigns
///
/// Identifier, owner, host, participation count, start time, session key,
/// progress and the openness flag are reset; everything else the game sent
/// takes part in matching. Criteria are compared as given.
#[derive(Debug, Clone, Default)]
pub struct StandardMatchmakeRules;

impl StandardMatchmakeRules {
    pub fn new() -> Self {
        Self
    }
}

impl MatchmakeRules for StandardMatchmakeRules {
    fn cleanup_search_session(&self, mut session: MatchmakeSession) -> MatchmakeSession {
        session.gathering.id = 0;
        session.gathering.owner_pid = 0;
        session.gathering.host_pid = 0;
        session.participation_count = 0;
        session.started_time = None;
        session.session_key.clear();
        session.progress_score = 0;
        session.open_participation = false;
        session
    }

    fn cleanup_search_criteria(
        &self,
        criteria: Vec<MatchmakeSessionSearchCriteria>,
    ) -> Vec<MatchmakeSessionSearchCriteria> {
        criteria
    }
}
