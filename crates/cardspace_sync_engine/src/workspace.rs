//! A single handle bundling the replica with its sync machinery.

use crate::clock::Clock;
use crate::config::SyncConfig;
use crate::engine::{SyncEngine, SyncStats, SyncStatus};
use crate::error::SyncResult;
use crate::gateway::RemoteGateway;
use crate::scheduler::{SyncScheduler, TriggerOutcome};
use cardspace_core::{Card, OwnerId, ReplicaStore};
use chrono::{DateTime, Utc};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tokio::task::JoinHandle;

/// The session-wide workspace handle.
///
/// Commands go to [`Workspace::replica`]; sync triggers and status queries go
/// through the workspace itself.
pub struct Workspace<G: RemoteGateway> {
    replica: Arc<ReplicaStore>,
    engine: Arc<SyncEngine<G>>,
    scheduler: Arc<SyncScheduler<G>>,
    poll_interval: Duration,
}

impl<G: RemoteGateway> Workspace<G> {
    /// Wires a replica to a gateway.
    pub fn new(
        replica: Arc<ReplicaStore>,
        gateway: G,
        clock: Arc<dyn Clock>,
        config: &SyncConfig,
    ) -> Self {
        let engine = Arc::new(SyncEngine::new(
            Arc::clone(&replica),
            gateway,
            Arc::clone(&clock),
        ));
        let scheduler = Arc::new(SyncScheduler::new(
            Arc::clone(&engine),
            clock,
            config.sync_interval,
        ));
        Self {
            replica,
            engine,
            scheduler,
            poll_interval: config.poll_interval,
        }
    }

    /// Returns the replica for issuing commands.
    pub fn replica(&self) -> &Arc<ReplicaStore> {
        &self.replica
    }

    /// Returns the engine.
    pub fn engine(&self) -> &Arc<SyncEngine<G>> {
        &self.engine
    }

    /// Returns the scheduler.
    pub fn scheduler(&self) -> &Arc<SyncScheduler<G>> {
        &self.scheduler
    }

    /// Returns the current cards in display order.
    pub fn current_cards(&self) -> Vec<Card> {
        self.replica.current_cards()
    }

    /// Returns the sync status.
    pub fn sync_status(&self) -> SyncStatus {
        self.engine.sync_status()
    }

    /// Returns when the last sync succeeded.
    pub fn last_synced_at(&self) -> Option<DateTime<Utc>> {
        self.engine.last_synced_at()
    }

    /// Returns sync statistics.
    pub fn stats(&self) -> SyncStats {
        self.engine.stats()
    }

    /// See [`SyncScheduler::on_sign_in`].
    pub fn on_sign_in(&self, owner: OwnerId) -> SyncResult<TriggerOutcome> {
        self.scheduler.on_sign_in(owner)
    }

    /// See [`SyncScheduler::on_sign_out`].
    pub fn on_sign_out(&self, owner: &OwnerId) -> SyncResult<TriggerOutcome> {
        self.scheduler.on_sign_out(owner)
    }

    /// See [`SyncScheduler::on_user_requested_sync`].
    pub fn on_user_requested_sync(&self, owner: &OwnerId) -> SyncResult<TriggerOutcome> {
        self.scheduler.on_user_requested_sync(owner)
    }

    /// See [`SyncScheduler::tick`].
    pub fn tick(&self) -> SyncResult<TriggerOutcome> {
        self.scheduler.tick()
    }
}

impl<G: RemoteGateway + 'static> Workspace<G> {
    /// Starts the background interval driver, polling at the configured
    /// `poll_interval`. See [`SyncScheduler::spawn_interval`].
    pub fn spawn_interval(&self, shutdown: watch::Receiver<bool>) -> JoinHandle<()> {
        self.scheduler.spawn_interval(self.poll_interval, shutdown)
    }
}
