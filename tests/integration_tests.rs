//! Integration tests for the rendezvous-room matchmaking core
//!
//! These tests drive the gathering manager through its public API:
//! - Complete template and criteria matchmaking workflows
//! - Owner notifications
//! - Gathering deletion and identifier reuse
//! - Result codes handed back to the remote-call layer

mod fixtures;

use rendezvous_room::error::{result_code, RendezvousError, ResultCode};
use rendezvous_room::gathering::GatheringManager;
use rendezvous_room::gathering::StandardMatchmakeRules;
use rendezvous_room::notification::MockNotificationDispatcher;
use rendezvous_room::types::{AnyGathering, AutoMatchmakeParam, MatchmakeResponse};
use std::sync::Arc;

use fixtures::{
    assert_registry_consistent, create_test_criteria, create_test_session, create_test_system,
    create_test_system_with_rules, create_test_template, requester, BlockingRules,
    MockDirectory,
};

#[tokio::test]
async fn test_complete_template_workflow() {
    let system = create_test_system();
    let (a, b, c, d, e) = (
        requester(1),
        requester(2),
        requester(3),
        requester(4),
        requester(5),
    );
    system.connect(a);

    // Step 1: A creates a gathering
    let session = system
        .manager
        .auto_matchmake(a, create_test_template(1, 4), "")
        .await
        .unwrap();
    assert_eq!(session.participation_count, 1);
    assert_eq!(session.owner_pid(), a.pid);
    assert_eq!(session.host_pid(), a.pid);
    let gathering_id = session.id();
    system.dispatcher.clear();

    // Step 2: B finds A's gathering and A is told about it
    let joined = system
        .manager
        .auto_matchmake(b, create_test_template(1, 4), "hello")
        .await
        .unwrap();
    assert_eq!(joined.id(), gathering_id);
    assert_eq!(joined.participation_count, 2);

    let events = system.dispatcher.dispatched_to(a.connection_id);
    assert_eq!(events.len(), 1);
    assert_eq!(events[0].notification_type, 3001);
    assert_eq!(events[0].param1, gathering_id);
    assert_eq!(events[0].param2, b.pid);
    assert_eq!(events[0].str_param, "hello");

    // Step 3: C and D fill the gathering
    for r in [c, d] {
        let joined = system
            .manager
            .auto_matchmake(r, create_test_template(1, 4), "")
            .await
            .unwrap();
        assert_eq!(joined.id(), gathering_id);
    }
    let full = system.manager.get_session(gathering_id).await.unwrap().unwrap();
    assert_eq!(full.participation_count, 4);

    // Step 4: E is turned away from the full gathering and gets a new one
    let overflow = system
        .manager
        .auto_matchmake(e, create_test_template(1, 4), "")
        .await
        .unwrap();
    assert_ne!(overflow.id(), gathering_id);
    assert_eq!(overflow.owner_pid(), e.pid);
    assert_eq!(overflow.participation_count, 1);

    assert_eq!(system.manager.session_count().await.unwrap(), 2);
    assert_registry_consistent(&system.manager, 8).await;

    let stats = system.manager.get_stats().await.unwrap();
    assert_eq!(stats.gatherings_created, 2);
    assert_eq!(stats.participants_joined, 5);
}

#[tokio::test]
async fn test_different_templates_do_not_mix() {
    let system = create_test_system();

    let first = system
        .manager
        .auto_matchmake(requester(1), create_test_template(1, 4), "")
        .await
        .unwrap();
    let second = system
        .manager
        .auto_matchmake(requester(2), create_test_template(2, 4), "")
        .await
        .unwrap();

    assert_ne!(first.id(), second.id());
    assert_eq!(system.manager.session_count().await.unwrap(), 2);
}

#[tokio::test]
async fn test_empty_gathering_is_reclaimed() {
    let system = create_test_system();

    let session = system
        .manager
        .auto_matchmake(requester(1), create_test_template(1, 4), "")
        .await
        .unwrap();
    system
        .manager
        .auto_matchmake(requester(2), create_test_template(1, 4), "")
        .await
        .unwrap();

    system.manager.remove_connection(1).await.unwrap();
    assert!(system.manager.get_session(session.id()).await.unwrap().is_some());

    system.manager.remove_connection(2).await.unwrap();
    assert!(system.manager.get_session(session.id()).await.unwrap().is_none());
    assert_eq!(system.manager.session_count().await.unwrap(), 0);

    // The freed identifier is the lowest one again
    let next = system
        .manager
        .auto_matchmake(requester(3), create_test_template(5, 4), "")
        .await
        .unwrap();
    assert_eq!(next.id(), session.id());
}

#[tokio::test]
async fn test_criteria_workflow() {
    let system = create_test_system();
    let criteria = vec![create_test_criteria("1"), create_test_criteria("2")];

    let first = system
        .manager
        .auto_matchmake_with_search_criteria(
            requester(1),
            criteria.clone(),
            create_test_template(1, 4),
            "",
        )
        .await
        .unwrap();

    let second = system
        .manager
        .auto_matchmake_with_search_criteria(
            requester(2),
            criteria.clone(),
            create_test_template(9, 4),
            "",
        )
        .await
        .unwrap();
    assert_eq!(second.id(), first.id());
    assert_eq!(second.participation_count, 2);

    // One criteria entry fewer never matches
    let shorter = system
        .manager
        .auto_matchmake_with_search_criteria(
            requester(3),
            criteria[..1].to_vec(),
            create_test_template(1, 4),
            "",
        )
        .await
        .unwrap();
    assert_ne!(shorter.id(), first.id());

    // Neither does one entry more, even when the first two are identical
    let mut longer_criteria = criteria.clone();
    longer_criteria.push(create_test_criteria("3"));
    let longer = system
        .manager
        .auto_matchmake_with_search_criteria(
            requester(4),
            longer_criteria,
            create_test_template(1, 4),
            "",
        )
        .await
        .unwrap();
    assert_ne!(longer.id(), first.id());
    assert_ne!(longer.id(), shorter.id());
    assert_eq!(system.manager.session_count().await.unwrap(), 3);
}

#[tokio::test]
async fn test_empty_criteria_match_each_other() {
    let system = create_test_system();

    let first = system
        .manager
        .auto_matchmake_with_search_criteria(requester(1), vec![], create_test_template(1, 4), "")
        .await
        .unwrap();
    let second = system
        .manager
        .auto_matchmake_with_search_criteria(requester(2), vec![], create_test_template(1, 4), "")
        .await
        .unwrap();

    assert_eq!(first.id(), second.id());
}

#[tokio::test]
async fn test_auto_matchmake_with_param() {
    let system = create_test_system();
    system.connect(requester(1));

    let param = AutoMatchmakeParam {
        source_matchmake_session: create_test_session(3, 2),
        search_criteria: vec![create_test_criteria("3")],
        join_message: "ready".to_string(),
    };

    let first = system
        .manager
        .auto_matchmake_with_param(requester(1), param.clone())
        .await
        .unwrap();
    system.dispatcher.clear();

    let second = system
        .manager
        .auto_matchmake_with_param(requester(2), param.clone())
        .await
        .unwrap();
    assert_eq!(second.id(), first.id());

    let events = system.dispatcher.dispatched_to(1);
    assert_eq!(events.len(), 1);
    assert_eq!(events[0].str_param, "ready");

    // Capacity of two reached
    let third = system
        .manager
        .auto_matchmake_with_param(requester(3), param)
        .await
        .unwrap();
    assert_ne!(third.id(), first.id());
}

#[tokio::test]
async fn test_criteria_check_rejects_candidate() {
    let system = create_test_system_with_rules(Arc::new(BlockingRules::new([1001])));
    let criteria = vec![create_test_criteria("1")];

    let blocked = system
        .manager
        .auto_matchmake_with_search_criteria(
            requester(1),
            criteria.clone(),
            create_test_template(1, 4),
            "",
        )
        .await
        .unwrap();
    let other = system
        .manager
        .auto_matchmake_with_search_criteria(
            requester(2),
            criteria.clone(),
            create_test_template(1, 4),
            "",
        )
        .await
        .unwrap();
    assert_ne!(other.id(), blocked.id());

    // The second gathering's owner is not blocked
    let joined = system
        .manager
        .auto_matchmake_with_search_criteria(requester(3), criteria, create_test_template(1, 4), "")
        .await
        .unwrap();
    assert_eq!(joined.id(), other.id());
}

#[tokio::test]
async fn test_owner_without_connection_is_not_notified() {
    let system = create_test_system();

    system
        .manager
        .auto_matchmake(requester(1), create_test_template(1, 4), "")
        .await
        .unwrap();
    system
        .manager
        .auto_matchmake(requester(2), create_test_template(1, 4), "")
        .await
        .unwrap();

    assert!(system.dispatcher.dispatched().is_empty());
}

#[tokio::test]
async fn test_owner_lookup_through_directory() {
    let mut directory = MockDirectory::new();
    directory
        .expect_connection_for()
        .withf(|pid| *pid == 1001)
        .times(2)
        .returning(|_| Some(1));

    let dispatcher = Arc::new(MockNotificationDispatcher::new());
    let manager = GatheringManager::builder()
        .rules(Arc::new(StandardMatchmakeRules::new()))
        .dispatcher(dispatcher.clone())
        .directory(Arc::new(directory))
        .build()
        .unwrap();

    manager
        .auto_matchmake(requester(1), create_test_template(1, 4), "")
        .await
        .unwrap();
    manager
        .auto_matchmake(requester(2), create_test_template(1, 4), "")
        .await
        .unwrap();

    let events = dispatcher.dispatched_to(1);
    assert_eq!(events.len(), 2);
    assert_eq!(events[0].param2, 1001);
    assert_eq!(events[1].param2, 1002);
}

#[tokio::test]
async fn test_json_payload_end_to_end() {
    let system = create_test_system();
    let bytes = serde_json::to_vec(&create_test_template(4, 3)).unwrap();

    let gathering = AnyGathering::from_json(&bytes).unwrap();
    let session = system
        .manager
        .auto_matchmake(requester(1), gathering, "")
        .await
        .unwrap();

    assert_eq!(session.game_mode, 4);
    assert_eq!(session.maximum_participants(), 3);
}

#[tokio::test]
async fn test_result_codes() {
    let system = create_test_system();

    let response = MatchmakeResponse::from_result(
        system
            .manager
            .auto_matchmake(requester(1), create_test_template(1, 4), "")
            .await,
    );
    assert_eq!(response.code, ResultCode::Success);
    assert!(response.session.is_some());

    let err = system
        .manager
        .auto_matchmake(requester(2), create_test_template(1, 1000), "")
        .await
        .unwrap_err();
    assert_eq!(result_code(&err), ResultCode::InvalidArgument);

    let err = system
        .manager
        .close_participation(requester(2), 1)
        .await
        .unwrap_err();
    assert_eq!(result_code(&err), ResultCode::PermissionDenied);
    assert!(matches!(
        err.downcast_ref::<RendezvousError>(),
        Some(RendezvousError::PermissionDenied { .. })
    ));
}
