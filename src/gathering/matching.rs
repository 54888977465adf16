//! Gathering search for auto-matchmake requests
//!
//! Both search modes run in two phases: collect every structurally matching
//! gathering, then return the first candidate that can still take a
//! participant. A full or closed candidate never hides the next one.

use crate::gathering::rules::MatchmakeRules;
use crate::gathering::store::SessionStore;
use crate::types::{GatheringId, MatchmakeSession, MatchmakeSessionSearchCriteria, Pid};
use std::sync::Arc;
use tracing::debug;

/// Result of a gathering search
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MatchingResult {
    /// A joinable gathering matched the request
    MatchedToGathering(GatheringId),
    /// No joinable gathering matched; the caller should create one
    CreateNewGathering,
}

impl MatchingResult {
    pub fn gathering_id(&self) -> Option<GatheringId> {
        match self {
            MatchingResult::MatchedToGathering(id) => Some(*id),
            MatchingResult::CreateNewGathering => None,
        }
    }
}

/// Structural matcher over the session store
#[derive(Clone)]
pub struct GatheringMatcher {
    rules: Arc<dyn MatchmakeRules>,
}

impl GatheringMatcher {
    pub fn new(rules: Arc<dyn MatchmakeRules>) -> Self {
        Self { rules }
    }

    /// Find a joinable gathering whose cleaned session equals `template`
    ///
    /// `template` must already have gone through the same cleanup that was
    /// applied when the gatherings were created.
    pub fn search_by_matchmake_session(
        &self,
        store: &SessionStore,
        template: &MatchmakeSession,
    ) -> MatchingResult {
        let candidates: Vec<GatheringId> = store
            .iter()
            .filter(|(_, session)| session.search_session() == template)
            .map(|(id, _)| id)
            .collect();

        debug!("Template search found {} candidates", candidates.len());
        first_joinable(store, &candidates)
    }

    /// Find a joinable gathering whose criteria list equals `criteria`
    ///
    /// Lists must have the same length and be equal entry by entry. Each
    /// gathering is considered at most once, and the game-specific check from
    /// the rules must accept it.
    pub fn search_by_search_criteria(
        &self,
        store: &SessionStore,
        requester: Pid,
        criteria: &[MatchmakeSessionSearchCriteria],
    ) -> MatchingResult {
        let candidates: Vec<GatheringId> = store
            .iter()
            .filter(|(_, session)| criteria_lists_match(session.search_criteria(), criteria))
            .filter(|(_, session)| {
                self.rules
                    .criteria_check(requester, session.game_session(), criteria)
            })
            .map(|(id, _)| id)
            .collect();

        debug!(
            "Criteria search over {} entries found {} candidates",
            criteria.len(),
            candidates.len()
        );
        first_joinable(store, &candidates)
    }
}

fn criteria_lists_match(
    stored: &[MatchmakeSessionSearchCriteria],
    requested: &[MatchmakeSessionSearchCriteria],
) -> bool {
    stored.len() == requested.len() && stored.iter().zip(requested).all(|(a, b)| a == b)
}

fn first_joinable(store: &SessionStore, candidates: &[GatheringId]) -> MatchingResult {
    candidates
        .iter()
        .copied()
        .find(|id| store.get(*id).is_some_and(|session| session.is_joinable()))
        .map(MatchingResult::MatchedToGathering)
        .unwrap_or(MatchingResult::CreateNewGathering)
}
