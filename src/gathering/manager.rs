//! Gathering manager: the auto-matchmake workflow
//!
//! Every request runs Leave → Search → Create-if-absent → Join under one
//! write lock on the session store, so two requests can never both take the
//! last slot of a gathering. The owner notification is sent after the lock is
//! released and its failure never undoes the join.

use crate::config::MatchmakingSettings;
use crate::error::{RendezvousError, Result};
use crate::gathering::instance::GatheringSession;
use crate::gathering::matching::{GatheringMatcher, MatchingResult};
use crate::gathering::membership::RemovalOutcome;
use crate::gathering::rules::MatchmakeRules;
use crate::gathering::store::SessionStore;
use crate::metrics::MetricsCollector;
use crate::notification::{ConnectionDirectory, NotificationDispatcher, NotificationEvent};
use crate::types::{
    AnyGathering, AutoMatchmakeParam, ConnectionId, GatheringId, MatchmakeSession,
    MatchmakeSessionSearchCriteria, Requester,
};
use crate::utils::{as_millis_f64, current_timestamp};
use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};
use std::time::Instant;
use tracing::{debug, error, info, warn};

/// Statistics about gathering manager operations
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GatheringManagerStats {
    /// Total number of gatherings created
    pub gatherings_created: u64,
    /// Total number of gatherings deleted after emptying
    pub gatherings_deleted: u64,
    /// Total number of successful joins
    pub participants_joined: u64,
    /// Total matchmake requests received
    pub matchmake_requests: u64,
    /// Matchmake requests that ended in an error
    pub matchmake_failures: u64,
}

/// How a request looks for an existing gathering
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum SearchMode {
    Template,
    Criteria,
}

impl SearchMode {
    fn label(&self) -> &'static str {
        match self {
            SearchMode::Template => "template",
            SearchMode::Criteria => "criteria",
        }
    }
}

/// What the locked part of a request produced
struct JoinOutcome {
    session: MatchmakeSession,
    created: bool,
}

/// The main gathering manager
#[derive(Clone)]
pub struct GatheringManager {
    /// Every live gathering, behind one exclusion domain
    store: Arc<RwLock<SessionStore>>,
    /// Per-game cleanup and criteria checks
    rules: Arc<dyn MatchmakeRules>,
    matcher: GatheringMatcher,
    /// Delivery of owner notifications
    dispatcher: Arc<dyn NotificationDispatcher>,
    /// Player identity to connection lookup
    directory: Arc<dyn ConnectionDirectory>,
    settings: MatchmakingSettings,
    stats: Arc<RwLock<GatheringManagerStats>>,
    metrics_collector: Arc<MetricsCollector>,
}

/// Builder that refuses to produce a manager without its capabilities
#[derive(Default)]
pub struct GatheringManagerBuilder {
    rules: Option<Arc<dyn MatchmakeRules>>,
    dispatcher: Option<Arc<dyn NotificationDispatcher>>,
    directory: Option<Arc<dyn ConnectionDirectory>>,
    settings: MatchmakingSettings,
    metrics_collector: Option<Arc<MetricsCollector>>,
    store: Option<SessionStore>,
}

impl GatheringManagerBuilder {
    pub fn rules(mut self, rules: Arc<dyn MatchmakeRules>) -> Self {
        self.rules = Some(rules);
        self
    }

    pub fn dispatcher(mut self, dispatcher: Arc<dyn NotificationDispatcher>) -> Self {
        self.dispatcher = Some(dispatcher);
        self
    }

    pub fn directory(mut self, directory: Arc<dyn ConnectionDirectory>) -> Self {
        self.directory = Some(directory);
        self
    }

    pub fn settings(mut self, settings: MatchmakingSettings) -> Self {
        self.settings = settings;
        self
    }

    pub fn metrics(mut self, metrics_collector: Arc<MetricsCollector>) -> Self {
        self.metrics_collector = Some(metrics_collector);
        self
    }

    /// Start from a specific store, e.g. one with a smaller identifier space
    pub fn store(mut self, store: SessionStore) -> Self {
        self.store = Some(store);
        self
    }

    pub fn build(self) -> Result<GatheringManager> {
        let rules = self.rules.ok_or_else(|| missing("matchmake rules"))?;
        let dispatcher = self
            .dispatcher
            .ok_or_else(|| missing("notification dispatcher"))?;
        let directory = self
            .directory
            .ok_or_else(|| missing("connection directory"))?;
        let metrics_collector = match self.metrics_collector {
            Some(collector) => collector,
            None => Arc::new(MetricsCollector::new()?),
        };

        Ok(GatheringManager {
            store: Arc::new(RwLock::new(self.store.unwrap_or_default())),
            matcher: GatheringMatcher::new(rules.clone()),
            rules,
            dispatcher,
            directory,
            settings: self.settings,
            stats: Arc::new(RwLock::new(GatheringManagerStats::default())),
            metrics_collector,
        })
    }
}

fn missing(capability: &str) -> anyhow::Error {
    warn!("Gathering manager is missing its {}", capability);
    RendezvousError::ConfigurationMissing {
        capability: capability.to_string(),
    }
    .into()
}

impl GatheringManager {
    pub fn builder() -> GatheringManagerBuilder {
        GatheringManagerBuilder::default()
    }

    /// Join the requester to a gathering equal to `any_gathering`, creating one if needed
    pub async fn auto_matchmake(
        &self,
        requester: Requester,
        any_gathering: AnyGathering,
        message: &str,
    ) -> Result<MatchmakeSession> {
        self.run_matchmake(
            requester,
            SearchMode::Template,
            any_gathering,
            Vec::new(),
            message,
        )
        .await
    }

    /// Join the requester to a gathering with an equal criteria list, creating one if needed
    pub async fn auto_matchmake_with_search_criteria(
        &self,
        requester: Requester,
        search_criteria: Vec<MatchmakeSessionSearchCriteria>,
        any_gathering: AnyGathering,
        message: &str,
    ) -> Result<MatchmakeSession> {
        self.run_matchmake(
            requester,
            SearchMode::Criteria,
            any_gathering,
            search_criteria,
            message,
        )
        .await
    }

    /// Criteria matchmaking driven by an `AutoMatchmakeParam`
    pub async fn auto_matchmake_with_param(
        &self,
        requester: Requester,
        param: AutoMatchmakeParam,
    ) -> Result<MatchmakeSession> {
        self.run_matchmake(
            requester,
            SearchMode::Criteria,
            AnyGathering::MatchmakeSession(param.source_matchmake_session),
            param.search_criteria,
            &param.join_message,
        )
        .await
    }

    async fn run_matchmake(
        &self,
        requester: Requester,
        mode: SearchMode,
        source: AnyGathering,
        search_criteria: Vec<MatchmakeSessionSearchCriteria>,
        message: &str,
    ) -> Result<MatchmakeSession> {
        let start_time = Instant::now();

        info!(
            "Processing auto-matchmake - connection: {}, pid: {}, mode: {}, criteria: {}",
            requester.connection_id,
            requester.pid,
            mode.label(),
            search_criteria.len()
        );

        let (deleted_previous, result) = match self.write_store() {
            Ok(mut store) => {
                self.matchmake_locked(&mut store, requester, mode, source, search_criteria)
            }
            Err(e) => (false, Err(e)),
        };

        let duration = start_time.elapsed();
        self.record_request(&result, deleted_previous, mode, duration);

        let outcome = match result {
            Ok(outcome) => outcome,
            Err(e) => {
                warn!(
                    "Auto-matchmake failed - connection: {}, mode: {}, time: {:.2}ms, error: {}",
                    requester.connection_id,
                    mode.label(),
                    as_millis_f64(duration),
                    e
                );
                return Err(e);
            }
        };

        info!(
            "Connection {} joined gathering {} ({}/{}, created: {}) in {:.2}ms",
            requester.connection_id,
            outcome.session.id(),
            outcome.session.participation_count,
            outcome.session.maximum_participants(),
            outcome.created,
            as_millis_f64(duration)
        );

        if self.settings.notify_owner_on_join {
            self.notify_owner(&outcome.session, requester, message).await;
        }

        Ok(outcome.session)
    }

    /// Leave, then the whole search-decide-join sequence; runs with the store write-locked
    ///
    /// The flag reports whether leaving deleted the previous gathering. Leave
    /// happens before the payload is checked, so it is reported even when the
    /// request itself fails.
    fn matchmake_locked(
        &self,
        store: &mut SessionStore,
        requester: Requester,
        mode: SearchMode,
        source: AnyGathering,
        search_criteria: Vec<MatchmakeSessionSearchCriteria>,
    ) -> (bool, Result<JoinOutcome>) {
        // A client can vanish without leaving, so clear any previous membership first
        let deleted_previous = matches!(
            store.remove_from_all_sessions(requester.connection_id),
            Some((_, RemovalOutcome::GatheringDeleted))
        );

        let result = source
            .into_matchmake_session()
            .and_then(|source| {
                self.validate_template(&source)?;
                Ok(source)
            })
            .and_then(|source| {
                self.join_or_create(store, requester, mode, source, search_criteria)
            });

        (deleted_previous, result)
    }

    fn join_or_create(
        &self,
        store: &mut SessionStore,
        requester: Requester,
        mode: SearchMode,
        source: MatchmakeSession,
        search_criteria: Vec<MatchmakeSessionSearchCriteria>,
    ) -> Result<JoinOutcome> {
        let search_session = self.rules.cleanup_search_session(source.clone());
        let search_criteria = self.rules.cleanup_search_criteria(search_criteria);

        let matching = match mode {
            SearchMode::Template => self
                .matcher
                .search_by_matchmake_session(store, &search_session),
            SearchMode::Criteria => {
                self.matcher
                    .search_by_search_criteria(store, requester.pid, &search_criteria)
            }
        };

        let (gathering_id, created) = match matching {
            MatchingResult::MatchedToGathering(id) => {
                debug!(
                    "Matched connection {} to existing gathering {}",
                    requester.connection_id, id
                );
                (id, false)
            }
            MatchingResult::CreateNewGathering => {
                let id = create_gathering(store, requester, source, search_session, search_criteria)?;
                (id, true)
            }
        };

        if let Err(e) = store.add_participants(gathering_id, &[requester.connection_id]) {
            if created {
                // Never leave an empty gathering behind
                store.remove(gathering_id);
            }
            return Err(e);
        }

        let session = store.require(gathering_id)?.game_session().clone();
        Ok(JoinOutcome { session, created })
    }

    fn validate_template(&self, source: &MatchmakeSession) -> Result<()> {
        let maximum = source.gathering.maximum_participants;
        if maximum == 0 || maximum > self.settings.max_participants_limit {
            return Err(RendezvousError::InvalidArgument {
                reason: format!(
                    "maximum participants {} outside 1..={}",
                    maximum, self.settings.max_participants_limit
                ),
            }
            .into());
        }
        Ok(())
    }

    /// Tell the gathering owner that `requester` joined
    async fn notify_owner(&self, session: &MatchmakeSession, requester: Requester, message: &str) {
        let owner = session.owner_pid();
        let Some(target) = self.directory.connection_for(owner) else {
            debug!(
                "Owner {} of gathering {} has no connection, skipping notification",
                owner,
                session.id()
            );
            return;
        };

        let event = NotificationEvent::new_participant(owner, session.id(), requester.pid, message);
        match self.dispatcher.dispatch(target, event).await {
            Ok(()) => {
                debug!(
                    "NewParticipant notification sent to connection {} for gathering {}",
                    target,
                    session.id()
                );
                self.metrics_collector.record_notification(true);
            }
            Err(e) => {
                warn!(
                    "Failed to notify owner {} (connection {}) of gathering {}: {}",
                    owner,
                    target,
                    session.id(),
                    e
                );
                self.metrics_collector.record_notification(false);
            }
        }
    }

    /// Drop a disconnected connection from whichever gathering holds it
    pub async fn remove_connection(&self, connection_id: ConnectionId) -> Result<Option<GatheringId>> {
        let removed = {
            let mut store = self.write_store()?;
            store.remove_from_all_sessions(connection_id)
        };

        match removed {
            Some((gathering_id, outcome)) => {
                info!(
                    "Removed connection {} from gathering {} ({:?})",
                    connection_id, gathering_id, outcome
                );
                if outcome == RemovalOutcome::GatheringDeleted {
                    self.record_deleted()?;
                }
                Ok(Some(gathering_id))
            }
            None => {
                debug!("Connection {} was in no gathering", connection_id);
                Ok(None)
            }
        }
    }

    /// Let new participants find the gathering again; owner only
    pub async fn open_participation(
        &self,
        requester: Requester,
        gathering_id: GatheringId,
    ) -> Result<()> {
        self.set_participation(requester, gathering_id, true)
    }

    /// Hide the gathering from searches; owner only
    pub async fn close_participation(
        &self,
        requester: Requester,
        gathering_id: GatheringId,
    ) -> Result<()> {
        self.set_participation(requester, gathering_id, false)
    }

    fn set_participation(
        &self,
        requester: Requester,
        gathering_id: GatheringId,
        open: bool,
    ) -> Result<()> {
        let mut store = self.write_store()?;
        let session = store.require_mut(gathering_id)?;

        if session.game_session().owner_pid() != requester.pid {
            return Err(RendezvousError::PermissionDenied {
                reason: format!(
                    "pid {} does not own gathering {}",
                    requester.pid, gathering_id
                ),
            }
            .into());
        }

        session.set_open_participation(open);
        info!(
            "Gathering {} participation {} by owner {}",
            gathering_id,
            if open { "opened" } else { "closed" },
            requester.pid
        );
        Ok(())
    }

    /// Current game-visible state of a gathering
    pub async fn get_session(&self, gathering_id: GatheringId) -> Result<Option<MatchmakeSession>> {
        let store = self.read_store()?;
        Ok(store
            .get(gathering_id)
            .map(|session| session.game_session().clone()))
    }

    /// Connections joined to a gathering, in join order
    pub async fn participants(&self, gathering_id: GatheringId) -> Result<Option<Vec<ConnectionId>>> {
        let store = self.read_store()?;
        Ok(store
            .get(gathering_id)
            .map(|session| session.participants().to_vec()))
    }

    /// Gathering the connection is in, if any
    pub async fn find_session_of(&self, connection_id: ConnectionId) -> Result<Option<GatheringId>> {
        let store = self.read_store()?;
        Ok(store.find_session_of(connection_id))
    }

    /// Another participant of the gathering, for relay or host hand-off
    pub async fn find_other_participant(
        &self,
        my_connection_id: ConnectionId,
        gathering_id: GatheringId,
    ) -> Result<Option<ConnectionId>> {
        let store = self.read_store()?;
        Ok(store.find_other_participant(my_connection_id, gathering_id))
    }

    pub async fn session_count(&self) -> Result<usize> {
        Ok(self.read_store()?.len())
    }

    /// Get current manager statistics
    pub async fn get_stats(&self) -> Result<GatheringManagerStats> {
        let stats = self
            .stats
            .read()
            .map_err(|_| RendezvousError::InternalError {
                message: "Failed to acquire stats lock".to_string(),
            })?;
        Ok(stats.clone())
    }

    pub fn metrics(&self) -> Arc<MetricsCollector> {
        self.metrics_collector.clone()
    }

    fn read_store(&self) -> Result<RwLockReadGuard<'_, SessionStore>> {
        self.store.read().map_err(|_| {
            RendezvousError::InternalError {
                message: "Failed to acquire session store lock".to_string(),
            }
            .into()
        })
    }

    fn write_store(&self) -> Result<RwLockWriteGuard<'_, SessionStore>> {
        self.store.write().map_err(|_| {
            RendezvousError::InternalError {
                message: "Failed to acquire session store lock".to_string(),
            }
            .into()
        })
    }

    fn record_request(
        &self,
        result: &Result<JoinOutcome>,
        deleted_previous: bool,
        mode: SearchMode,
        duration: std::time::Duration,
    ) {
        self.metrics_collector
            .record_matchmake_request(mode.label(), result.is_ok(), duration);

        let Ok(mut stats) = self.stats.write() else {
            error!("Failed to acquire stats lock");
            return;
        };
        stats.matchmake_requests += 1;

        if deleted_previous {
            stats.gatherings_deleted += 1;
            self.metrics_collector.record_gathering_deleted();
        }

        match result {
            Ok(outcome) => {
                stats.participants_joined += 1;
                self.metrics_collector.record_participant_joined();
                if outcome.created {
                    stats.gatherings_created += 1;
                    self.metrics_collector.record_gathering_created();
                }
            }
            Err(_) => stats.matchmake_failures += 1,
        }
    }

    fn record_deleted(&self) -> Result<()> {
        let mut stats = self
            .stats
            .write()
            .map_err(|_| RendezvousError::InternalError {
                message: "Failed to acquire stats lock".to_string(),
            })?;
        stats.gatherings_deleted += 1;
        self.metrics_collector.record_gathering_deleted();
        Ok(())
    }
}

/// Allocate an identifier and store a new gathering owned and hosted by the requester
fn create_gathering(
    store: &mut SessionStore,
    requester: Requester,
    source: MatchmakeSession,
    search_session: MatchmakeSession,
    search_criteria: Vec<MatchmakeSessionSearchCriteria>,
) -> Result<GatheringId> {
    let gathering_id = store.allocate_id().map_err(|e| {
        error!("No gatherings available! Gatherings are not being deleted properly");
        e
    })?;

    let mut game_session = source;
    game_session.gathering.id = gathering_id;
    game_session.gathering.owner_pid = requester.pid;
    game_session.gathering.host_pid = requester.pid;
    game_session.participation_count = 0;
    game_session.started_time = Some(current_timestamp());

    store.insert(
        gathering_id,
        GatheringSession::new(game_session, search_session, search_criteria),
    )?;

    info!(
        "Created gathering {} for pid {} (connection {})",
        gathering_id, requester.pid, requester.connection_id
    );
    Ok(gathering_id)
}
