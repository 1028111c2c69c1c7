//! Decides when reconciliation runs.
//!
//! Triggers and their policies:
//!
//! | trigger | action |
//! |---|---|
//! | sign-in | cloud-preferred reconcile |
//! | interval while signed in | local-preferred reconcile |
//! | user request | cloud-preferred reconcile |
//! | sign-out | push the local replica, no fetch |
//!
//! At most one attempt is in flight at a time. A trigger that arrives while
//! another attempt runs is dropped, not queued; sign-out is the exception and
//! waits for the running attempt so the final push is never skipped.

use crate::clock::Clock;
use crate::engine::{ReconcileOutcome, SyncEngine};
use crate::error::SyncResult;
use crate::gateway::RemoteGateway;
use cardspace_core::OwnerId;
use cardspace_sync_protocol::MergePolicy;
use chrono::{DateTime, Utc};
use parking_lot::{Mutex, RwLock};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::{debug, info, warn};

/// What caused a sync attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncTrigger {
    /// The owner just signed in.
    SignIn,
    /// The background interval elapsed.
    Interval,
    /// The user asked for a refresh.
    UserRequested,
    /// The owner is signing out.
    SignOut,
}

impl SyncTrigger {
    /// Returns the merge policy for this trigger, or `None` for a plain push.
    pub fn policy(&self) -> Option<MergePolicy> {
        match self {
            SyncTrigger::SignIn | SyncTrigger::UserRequested => Some(MergePolicy::CloudPreferred),
            SyncTrigger::Interval => Some(MergePolicy::LocalPreferred),
            SyncTrigger::SignOut => None,
        }
    }
}

/// What a trigger led to.
#[derive(Debug, Clone, PartialEq)]
pub enum TriggerOutcome {
    /// A reconciliation ran.
    Reconciled(ReconcileOutcome),
    /// The local replica was pushed.
    Pushed,
    /// Another attempt was in flight; this one was dropped.
    Dropped,
    /// The interval has not elapsed yet.
    NotDue,
    /// Nobody is signed in.
    Idle,
}

#[derive(Debug, Clone)]
struct Session {
    owner: OwnerId,
    next_due: DateTime<Utc>,
}

/// Serializes sync attempts and runs the interval schedule.
///
/// Time comes from the injected [`Clock`]; [`SyncScheduler::tick`] does the
/// interval bookkeeping and can be driven by hand in tests or by
/// [`SyncScheduler::spawn_interval`] in a running application.
pub struct SyncScheduler<G: RemoteGateway> {
    engine: Arc<SyncEngine<G>>,
    clock: Arc<dyn Clock>,
    interval: chrono::Duration,
    session: RwLock<Option<Session>>,
    in_flight: Mutex<()>,
}

impl<G: RemoteGateway> SyncScheduler<G> {
    /// Creates a scheduler running local-preferred syncs every `interval`.
    pub fn new(engine: Arc<SyncEngine<G>>, clock: Arc<dyn Clock>, interval: Duration) -> Self {
        Self {
            engine,
            clock,
            interval: chrono::Duration::from_std(interval).unwrap_or(chrono::Duration::MAX),
            session: RwLock::new(None),
            in_flight: Mutex::new(()),
        }
    }

    /// Returns the engine.
    pub fn engine(&self) -> &Arc<SyncEngine<G>> {
        &self.engine
    }

    /// Returns the signed-in owner.
    pub fn owner(&self) -> Option<OwnerId> {
        self.session.read().as_ref().map(|s| s.owner.clone())
    }

    /// Returns when the next interval sync is due.
    pub fn next_due(&self) -> Option<DateTime<Utc>> {
        self.session.read().as_ref().map(|s| s.next_due)
    }

    /// Starts a session and pulls the owner's workspace, cloud-preferred.
    ///
    /// # Errors
    ///
    /// Returns the reconciliation error. The session stays open either way
    /// and the interval schedule keeps running.
    pub fn on_sign_in(&self, owner: OwnerId) -> SyncResult<TriggerOutcome> {
        info!(%owner, "signed in");
        *self.session.write() = Some(Session {
            owner: owner.clone(),
            next_due: self.due_after(self.clock.now()),
        });
        self.run(&owner, SyncTrigger::SignIn)
    }

    /// Pulls the owner's workspace on request, cloud-preferred.
    ///
    /// Returns [`TriggerOutcome::Idle`] unless `owner` is signed in.
    ///
    /// # Errors
    ///
    /// Returns the reconciliation error.
    pub fn on_user_requested_sync(&self, owner: &OwnerId) -> SyncResult<TriggerOutcome> {
        self.run(owner, SyncTrigger::UserRequested)
    }

    /// Pushes the local replica and ends the session.
    ///
    /// Waits for an in-flight attempt instead of dropping the push, and
    /// returns only once the push has completed or failed. The session ends
    /// even if the push fails.
    ///
    /// # Errors
    ///
    /// Returns the push error.
    pub fn on_sign_out(&self, owner: &OwnerId) -> SyncResult<TriggerOutcome> {
        let _guard = self.in_flight.lock();
        let result = self.engine.push_local(owner).map(|()| TriggerOutcome::Pushed);

        if let Err(e) = &result {
            warn!(%owner, error = %e, "could not save workspace before sign-out");
        }
        {
            let mut session = self.session.write();
            if session.as_ref().is_some_and(|s| &s.owner == owner) {
                *session = None;
            }
        }
        // Still holding the guard, so a trigger queued behind the push sees
        // the closed session.
        self.engine.reset();
        info!(%owner, "signed out");
        result
    }

    /// Runs the interval sync if it is due.
    ///
    /// # Errors
    ///
    /// Returns the reconciliation error. The next attempt is scheduled
    /// regardless.
    pub fn tick(&self) -> SyncResult<TriggerOutcome> {
        let now = self.clock.now();
        let owner = {
            let mut session = self.session.write();
            let Some(session) = session.as_mut() else {
                return Ok(TriggerOutcome::Idle);
            };
            if now < session.next_due {
                return Ok(TriggerOutcome::NotDue);
            }
            session.next_due = self.due_after(now);
            session.owner.clone()
        };
        self.run(&owner, SyncTrigger::Interval)
    }

    fn is_signed_in(&self, owner: &OwnerId) -> bool {
        self.session
            .read()
            .as_ref()
            .is_some_and(|s| &s.owner == owner)
    }

    fn due_after(&self, now: DateTime<Utc>) -> DateTime<Utc> {
        now.checked_add_signed(self.interval)
            .unwrap_or(DateTime::<Utc>::MAX_UTC)
    }

    fn run(&self, owner: &OwnerId, trigger: SyncTrigger) -> SyncResult<TriggerOutcome> {
        let Some(_guard) = self.in_flight.try_lock() else {
            debug!(%owner, ?trigger, "sync already in flight, dropping trigger");
            return Ok(TriggerOutcome::Dropped);
        };

        if trigger != SyncTrigger::SignOut && !self.is_signed_in(owner) {
            debug!(%owner, ?trigger, "no session for owner, ignoring trigger");
            return Ok(TriggerOutcome::Idle);
        }

        match trigger.policy() {
            Some(policy) => self
                .engine
                .reconcile(owner, policy)
                .map(TriggerOutcome::Reconciled),
            None => self.engine.push_local(owner).map(|()| TriggerOutcome::Pushed),
        }
    }
}

impl<G: RemoteGateway + 'static> SyncScheduler<G> {
    /// Spawns a task calling [`tick`](Self::tick) every `poll`.
    ///
    /// Each tick runs on the blocking pool. The task exits when `shutdown`
    /// becomes `true` or its sender is dropped. Must be called from within a
    /// tokio runtime.
    pub fn spawn_interval(
        self: &Arc<Self>,
        poll: Duration,
        mut shutdown: watch::Receiver<bool>,
    ) -> JoinHandle<()> {
        let scheduler = Arc::clone(self);
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(poll);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            loop {
                tokio::select! {
                    _ = ticker.tick() => {
                        let s = Arc::clone(&scheduler);
                        match tokio::task::spawn_blocking(move || s.tick()).await {
                            Ok(Ok(TriggerOutcome::Reconciled(outcome))) => {
                                debug!(pushed = outcome.pushed, "interval sync finished");
                            }
                            Ok(Ok(_)) => {}
                            Ok(Err(e)) => warn!(error = %e, "interval sync failed"),
                            Err(e) => warn!(error = %e, "interval sync task aborted"),
                        }
                    }
                    changed = shutdown.changed() => {
                        if changed.is_err() || *shutdown.borrow() {
                            debug!("interval driver stopping");
                            break;
                        }
                    }
                }
            }
        })
    }
}
