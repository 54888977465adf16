//! Test fixtures and helpers shared by the integration tests

#![allow(dead_code)]

use mockall::mock;
use rendezvous_room::gathering::{GatheringManager, MatchmakeRules, StandardMatchmakeRules};
use rendezvous_room::notification::{
    ConnectionDirectory, InMemoryConnectionDirectory, MockNotificationDispatcher,
};
use rendezvous_room::types::{
    AnyGathering, ConnectionId, Gathering, MatchmakeSession, MatchmakeSessionSearchCriteria, Pid,
    Requester,
};
use std::collections::HashSet;
use std::sync::Arc;

mock! {
    pub Directory {}

    impl ConnectionDirectory for Directory {
        fn connection_for(&self, pid: Pid) -> Option<ConnectionId>;
    }
}

/// Manager wired to a recording dispatcher and a live directory
pub struct TestSystem {
    pub manager: GatheringManager,
    pub dispatcher: Arc<MockNotificationDispatcher>,
    pub directory: Arc<InMemoryConnectionDirectory>,
}

impl TestSystem {
    /// Register `requester` so notifications addressed to its pid reach it
    pub fn connect(&self, requester: Requester) {
        self.directory
            .register(requester.pid, requester.connection_id);
    }
}

pub fn create_test_system() -> TestSystem {
    create_test_system_with_rules(Arc::new(StandardMatchmakeRules::new()))
}

pub fn create_test_system_with_rules(rules: Arc<dyn MatchmakeRules>) -> TestSystem {
    let dispatcher = Arc::new(MockNotificationDispatcher::new());
    let directory = Arc::new(InMemoryConnectionDirectory::new());
    let manager = GatheringManager::builder()
        .rules(rules)
        .dispatcher(dispatcher.clone())
        .directory(directory.clone())
        .build()
        .unwrap();

    TestSystem {
        manager,
        dispatcher,
        directory,
    }
}

/// Connection N belongs to pid N + 1000
pub fn requester(connection_id: ConnectionId) -> Requester {
    Requester::new(connection_id, connection_id + 1000)
}

pub fn create_test_session(game_mode: u32, max_participants: u16) -> MatchmakeSession {
    MatchmakeSession {
        gathering: Gathering {
            maximum_participants: max_participants,
            minimum_participants: 1,
            ..Default::default()
        },
        game_mode,
        attributes: vec![0, 0, game_mode],
        open_participation: true,
        ..Default::default()
    }
}

pub fn create_test_template(game_mode: u32, max_participants: u16) -> AnyGathering {
    AnyGathering::MatchmakeSession(create_test_session(game_mode, max_participants))
}

pub fn create_test_criteria(game_mode: &str) -> MatchmakeSessionSearchCriteria {
    MatchmakeSessionSearchCriteria {
        game_mode: game_mode.to_string(),
        minimum_participants: "1".to_string(),
        maximum_participants: "4".to_string(),
        vacant_only: true,
        ..Default::default()
    }
}

/// Rules that refuse criteria matches for gatherings owned by blocked pids
pub struct BlockingRules {
    blocked_owners: HashSet<Pid>,
}

impl BlockingRules {
    pub fn new(blocked_owners: impl IntoIterator<Item = Pid>) -> Self {
        Self {
            blocked_owners: blocked_owners.into_iter().collect(),
        }
    }
}

impl MatchmakeRules for BlockingRules {
    fn cleanup_search_session(&self, session: MatchmakeSession) -> MatchmakeSession {
        StandardMatchmakeRules::new().cleanup_search_session(session)
    }

    fn cleanup_search_criteria(
        &self,
        criteria: Vec<MatchmakeSessionSearchCriteria>,
    ) -> Vec<MatchmakeSessionSearchCriteria> {
        criteria
    }

    fn criteria_check(
        &self,
        _requester: Pid,
        session: &MatchmakeSession,
        _criteria: &[MatchmakeSessionSearchCriteria],
    ) -> bool {
        !self.blocked_owners.contains(&session.owner_pid())
    }
}

/// Check the registry invariants over the identifier range `1..=max_id`
pub async fn assert_registry_consistent(manager: &GatheringManager, max_id: u32) {
    let mut seen = HashSet::new();

    for gathering_id in 1..=max_id {
        let Some(session) = manager.get_session(gathering_id).await.unwrap() else {
            continue;
        };
        let participants = manager.participants(gathering_id).await.unwrap().unwrap();

        assert_eq!(session.id(), gathering_id);
        assert!(!participants.is_empty(), "gathering {} is empty", gathering_id);
        assert!(participants.len() <= session.maximum_participants());
        assert_eq!(session.participation_count as usize, participants.len());

        for connection_id in participants {
            assert!(
                seen.insert(connection_id),
                "connection {} is in more than one gathering",
                connection_id
            );
        }
    }
}
