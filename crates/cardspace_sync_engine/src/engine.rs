//! The reconciliation engine.

use crate::clock::Clock;
use crate::error::{SyncError, SyncResult};
use crate::gateway::RemoteGateway;
use cardspace_core::{Card, OwnerId, ReplicaStore, WorkspaceSnapshot};
use cardspace_sync_protocol::{merge_cards, MergePolicy};
use chrono::{DateTime, Utc};
use parking_lot::RwLock;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Whether the replica is known to match the remote document.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncStatus {
    /// Local edits may not be in the remote document.
    Unsynced,
    /// An attempt is in flight.
    Syncing,
    /// The last attempt succeeded and nothing changed locally since.
    Synced,
}

/// Statistics about sync attempts.
#[derive(Debug, Clone, Default)]
pub struct SyncStats {
    /// Successful reconciliations and pushes.
    pub cycles_completed: u64,
    /// Documents written to the remote store.
    pub pushes: u64,
    /// Ids where both sides held differing cards.
    pub conflicts_resolved: u64,
    /// Attempts that failed to reach the remote store.
    pub transport_failures: u64,
    /// Message of the most recent failure, cleared on success.
    pub last_error: Option<String>,
}

/// Result of one reconciliation.
#[derive(Debug, Clone, PartialEq)]
pub struct ReconcileOutcome {
    /// Policy the merge ran with.
    pub policy: MergePolicy,
    /// Whether the owner had a remote document.
    pub remote_found: bool,
    /// Number of cards in the merge result.
    pub merged: usize,
    /// Ids where the preferred side overrode a differing card.
    pub conflicts: usize,
    /// Ids only the local replica held.
    pub local_only: usize,
    /// Ids only the remote document held.
    pub remote_only: usize,
    /// Whether the replica changed on write-back.
    pub replica_changed: bool,
    /// Whether the merge result was pushed.
    pub pushed: bool,
}

#[derive(Debug)]
struct EngineState {
    status: SyncStatus,
    synced_revision: u64,
    last_synced_at: Option<DateTime<Utc>>,
}

/// Merges the local replica with the remote document.
///
/// A reconciliation reads a snapshot of the replica, fetches the owner's
/// document, merges the two under a [`MergePolicy`], pushes the result if the
/// remote document differs from it, and finally writes the result back into
/// the replica. Local commands keep applying while the attempt is in flight;
/// cards created meanwhile survive the write-back.
///
/// Any failure before the write-back leaves the replica untouched and the
/// status `Unsynced`.
///
/// # Example
///
/// ```rust
/// use cardspace_core::{CardVariant, Position, ReplicaStore};
/// use cardspace_sync_engine::{MemoryGateway, MergePolicy, SyncEngine, SyncStatus, SystemClock};
/// use std::sync::Arc;
///
/// let replica = Arc::new(ReplicaStore::open_in_memory().unwrap());
/// let engine = SyncEngine::new(Arc::clone(&replica), MemoryGateway::new(), Arc::new(SystemClock));
///
/// replica.create_card(CardVariant::Text, Position::new(0.0, 0.0)).unwrap();
/// engine.reconcile(&"owner".into(), MergePolicy::CloudPreferred).unwrap();
/// assert_eq!(engine.sync_status(), SyncStatus::Synced);
/// ```
pub struct SyncEngine<G: RemoteGateway> {
    replica: Arc<ReplicaStore>,
    gateway: G,
    clock: Arc<dyn Clock>,
    state: RwLock<EngineState>,
    stats: RwLock<SyncStats>,
}

impl<G: RemoteGateway> SyncEngine<G> {
    /// Creates a new engine over `replica`.
    pub fn new(replica: Arc<ReplicaStore>, gateway: G, clock: Arc<dyn Clock>) -> Self {
        Self {
            replica,
            gateway,
            clock,
            state: RwLock::new(EngineState {
                status: SyncStatus::Unsynced,
                synced_revision: 0,
                last_synced_at: None,
            }),
            stats: RwLock::new(SyncStats::default()),
        }
    }

    /// Returns the replica.
    pub fn replica(&self) -> &Arc<ReplicaStore> {
        &self.replica
    }

    /// Returns the gateway.
    pub fn gateway(&self) -> &G {
        &self.gateway
    }

    /// Returns the current status.
    ///
    /// A `Synced` status turns `Unsynced` as soon as the replica applies a
    /// local command.
    pub fn sync_status(&self) -> SyncStatus {
        let state = self.state.read();
        match state.status {
            SyncStatus::Synced if self.replica.revision() != state.synced_revision => {
                SyncStatus::Unsynced
            }
            status => status,
        }
    }

    /// Returns when the last attempt succeeded.
    pub fn last_synced_at(&self) -> Option<DateTime<Utc>> {
        self.state.read().last_synced_at
    }

    /// Returns the current stats.
    pub fn stats(&self) -> SyncStats {
        self.stats.read().clone()
    }

    /// Runs one reconciliation for `owner`.
    ///
    /// # Errors
    ///
    /// Returns an error if the remote store cannot be reached or rejects the
    /// request, or if the result cannot be persisted locally.
    pub fn reconcile(&self, owner: &OwnerId, policy: MergePolicy) -> SyncResult<ReconcileOutcome> {
        self.set_status(SyncStatus::Syncing);
        let snapshot = self.replica.snapshot();
        debug!(%owner, ?policy, revision = snapshot.revision, "reconciling");

        let fetched = match self.gateway.fetch_remote(owner) {
            Ok(fetched) => fetched,
            Err(e) => return Err(self.fail(owner, e)),
        };

        let (merged, conflicts, local_only, remote_only, push) = match fetched.document() {
            Some(doc) => {
                let remote = usable_cards(owner, &doc.cards_data);
                let outcome = merge_cards(&snapshot.cards, &remote, policy);
                for id in &outcome.conflicts {
                    debug!(card = %id, ?policy, "both sides changed card, keeping preferred");
                }
                let push = !outcome.matches(&doc.cards_data);
                (
                    outcome.cards,
                    outcome.conflicts.len(),
                    outcome.local_only,
                    outcome.remote_only,
                    push,
                )
            }
            None => {
                info!(%owner, "no remote document, creating it from the local replica");
                let local_only = snapshot.cards.len();
                (snapshot.cards, 0, local_only, 0, true)
            }
        };

        let now = self.clock.now();
        if push {
            let document = WorkspaceSnapshot::new(merged.clone(), now);
            if let Err(e) = self.gateway.push_remote(owner, &document) {
                return Err(self.fail(owner, e));
            }
        }

        let merged_len = merged.len();
        let replica_changed = match self.replica.apply_merge(merged) {
            Ok(changed) => changed,
            Err(e) => return Err(self.fail(owner, SyncError::from(e))),
        };

        self.succeed(snapshot.revision, now, push, conflicts as u64);
        let outcome = ReconcileOutcome {
            policy,
            remote_found: fetched.document().is_some(),
            merged: merged_len,
            conflicts,
            local_only,
            remote_only,
            replica_changed,
            pushed: push,
        };
        info!(
            %owner,
            ?policy,
            cards = outcome.merged,
            conflicts = outcome.conflicts,
            local_only = outcome.local_only,
            remote_only = outcome.remote_only,
            pushed = outcome.pushed,
            "reconciled"
        );
        Ok(outcome)
    }

    /// Writes the local replica to the remote store without fetching.
    ///
    /// # Errors
    ///
    /// Returns an error if the remote store cannot be reached or rejects the
    /// request.
    pub fn push_local(&self, owner: &OwnerId) -> SyncResult<()> {
        self.set_status(SyncStatus::Syncing);
        let snapshot = self.replica.snapshot();
        let now = self.clock.now();

        let document = WorkspaceSnapshot::new(snapshot.cards, now);
        if let Err(e) = self.gateway.push_remote(owner, &document) {
            return Err(self.fail(owner, e));
        }

        self.succeed(snapshot.revision, now, true, 0);
        info!(%owner, cards = document.len(), "pushed local replica");
        Ok(())
    }

    /// Forgets the synced state, e.g. after the owner signs out.
    pub fn reset(&self) {
        let mut state = self.state.write();
        state.status = SyncStatus::Unsynced;
        state.last_synced_at = None;
    }

    fn set_status(&self, status: SyncStatus) {
        self.state.write().status = status;
    }

    fn succeed(&self, revision: u64, at: DateTime<Utc>, pushed: bool, conflicts: u64) {
        {
            let mut state = self.state.write();
            state.status = SyncStatus::Synced;
            state.synced_revision = revision;
            state.last_synced_at = Some(at);
        }

        let mut stats = self.stats.write();
        stats.cycles_completed += 1;
        stats.conflicts_resolved += conflicts;
        if pushed {
            stats.pushes += 1;
        }
        stats.last_error = None;
    }

    fn fail(&self, owner: &OwnerId, error: SyncError) -> SyncError {
        warn!(%owner, error = %error, "sync attempt failed, replica left unchanged");
        self.set_status(SyncStatus::Unsynced);

        let mut stats = self.stats.write();
        if error.is_transport() {
            stats.transport_failures += 1;
        }
        stats.last_error = Some(error.to_string());
        error
    }
}

/// Drops remote cards that cannot be stored locally.
fn usable_cards(owner: &OwnerId, cards: &[Card]) -> Vec<Card> {
    cards
        .iter()
        .filter(|card| {
            let ok = card.is_finite();
            if !ok {
                warn!(%owner, card = %card.id, "ignoring remote card with non-finite geometry");
            }
            ok
        })
        .cloned()
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::ManualClock;
    use crate::gateway::{MemoryGateway, RemoteFetch};
    use cardspace_core::{Card, CardVariant, Position};
    use cardspace_sync_protocol::RemoteDocument;
    use std::sync::Barrier;
    use std::thread;
    use std::time::Duration;

    struct Fixture {
        replica: Arc<ReplicaStore>,
        gateway: Arc<MemoryGateway>,
        clock: Arc<ManualClock>,
        engine: SyncEngine<Arc<MemoryGateway>>,
    }

    fn fixture() -> Fixture {
        let replica = Arc::new(ReplicaStore::open_in_memory().unwrap());
        let gateway = Arc::new(MemoryGateway::new());
        let clock = Arc::new(ManualClock::default());
        let engine = SyncEngine::new(
            Arc::clone(&replica),
            Arc::clone(&gateway),
            Arc::clone(&clock) as Arc<dyn Clock>,
        );
        Fixture {
            replica,
            gateway,
            clock,
            engine,
        }
    }

    fn owner() -> OwnerId {
        OwnerId::from("owner-1")
    }

    fn text(id: &str, title: &str) -> Card {
        Card::new(id.into(), CardVariant::Text, Position::default()).with_title(title)
    }

    fn seed_remote(f: &Fixture, cards: Vec<Card>) {
        f.gateway
            .insert_document(RemoteDocument::new(owner(), cards, f.clock.now()));
    }

    #[test]
    fn starts_unsynced() {
        let f = fixture();
        assert_eq!(f.engine.sync_status(), SyncStatus::Unsynced);
        assert!(f.engine.last_synced_at().is_none());
    }

    #[test]
    fn not_found_pushes_local_replica() {
        let f = fixture();
        let id = f
            .replica
            .create_card(CardVariant::Text, Position::default())
            .unwrap();

        let outcome = f.engine.reconcile(&owner(), MergePolicy::CloudPreferred).unwrap();
        assert!(!outcome.remote_found);
        assert!(outcome.pushed);
        assert_eq!(outcome.local_only, 1);
        assert_eq!(outcome.remote_only, 0);

        let doc = f.gateway.document(&owner()).unwrap();
        assert_eq!(doc.cards_data.len(), 1);
        assert_eq!(doc.cards_data[0].id, id);
        assert_eq!(f.engine.sync_status(), SyncStatus::Synced);
        assert_eq!(f.engine.last_synced_at(), Some(f.clock.now()));
    }

    #[test]
    fn cloud_preferred_twice_is_stable() {
        let f = fixture();
        seed_remote(&f, vec![text("a", "remote a")]);
        f.replica.import(vec![text("b", "local b")]).unwrap();

        let first = f.engine.reconcile(&owner(), MergePolicy::CloudPreferred).unwrap();
        assert!(first.replica_changed);
        assert!(first.pushed);
        assert_eq!(f.engine.sync_status(), SyncStatus::Synced);
        let after_first = f.replica.current_cards();

        f.clock.advance(Duration::from_secs(10));
        let second = f.engine.reconcile(&owner(), MergePolicy::CloudPreferred).unwrap();
        assert!(!second.replica_changed);
        assert!(!second.pushed);
        assert_eq!(f.replica.current_cards(), after_first);
        assert_eq!(f.engine.sync_status(), SyncStatus::Synced);
        assert_eq!(f.gateway.push_count(), 1);
    }

    #[test]
    fn tie_break_by_policy() {
        let f = fixture();
        seed_remote(&f, vec![text("x", "R")]);
        f.replica.import(vec![text("x", "L")]).unwrap();

        f.engine.reconcile(&owner(), MergePolicy::LocalPreferred).unwrap();
        assert_eq!(f.replica.current_cards()[0].title, "L");
        assert_eq!(f.gateway.document(&owner()).unwrap().cards_data[0].title, "L");

        seed_remote(&f, vec![text("x", "R")]);
        f.engine.reconcile(&owner(), MergePolicy::CloudPreferred).unwrap();
        assert_eq!(f.replica.current_cards()[0].title, "R");
        assert_eq!(f.engine.stats().conflicts_resolved, 2);
    }

    #[test]
    fn local_preferred_disjoint_union_converges() {
        let f = fixture();
        seed_remote(&f, vec![text("c", "c"), text("d", "d")]);
        f.replica
            .import(vec![text("a", "a"), text("b", "b")])
            .unwrap();

        let outcome = f.engine.reconcile(&owner(), MergePolicy::LocalPreferred).unwrap();
        assert!(outcome.pushed);
        assert_eq!(outcome.local_only, 2);
        assert_eq!(outcome.remote_only, 2);
        assert_eq!(outcome.conflicts, 0);

        let ids: Vec<String> = f
            .replica
            .current_cards()
            .iter()
            .map(|c| c.id.to_string())
            .collect();
        assert_eq!(ids, ["a", "b", "c", "d"]);
        assert_eq!(
            f.gateway.document(&owner()).unwrap().cards_data,
            f.replica.current_cards()
        );
    }

    #[test]
    fn transport_failure_leaves_replica_untouched() {
        let f = fixture();
        seed_remote(&f, vec![text("r", "remote")]);
        f.replica.import(vec![text("l", "local")]).unwrap();
        let before = f.replica.current_cards();

        f.gateway.set_online(false);
        let err = f
            .engine
            .reconcile(&owner(), MergePolicy::CloudPreferred)
            .unwrap_err();
        assert!(err.is_transport());
        assert_eq!(f.replica.current_cards(), before);
        assert_eq!(f.engine.sync_status(), SyncStatus::Unsynced);

        let stats = f.engine.stats();
        assert_eq!(stats.transport_failures, 1);
        assert!(stats.last_error.is_some());

        f.gateway.set_online(true);
        f.engine.reconcile(&owner(), MergePolicy::CloudPreferred).unwrap();
        assert_eq!(f.engine.sync_status(), SyncStatus::Synced);
        assert!(f.engine.stats().last_error.is_none());
    }

    #[test]
    fn local_edit_invalidates_synced() {
        let f = fixture();
        let id = f
            .replica
            .create_card(CardVariant::Text, Position::default())
            .unwrap();
        f.engine.reconcile(&owner(), MergePolicy::CloudPreferred).unwrap();
        assert_eq!(f.engine.sync_status(), SyncStatus::Synced);

        // A no-op command does not count as an edit.
        f.replica.move_card(&"ghost".into(), 1.0, 1.0).unwrap();
        assert_eq!(f.engine.sync_status(), SyncStatus::Synced);

        f.replica.move_card(&id, 5.0, 5.0).unwrap();
        assert_eq!(f.engine.sync_status(), SyncStatus::Unsynced);
    }

    #[test]
    fn push_local_skips_fetch() {
        let f = fixture();
        seed_remote(&f, vec![text("stale", "old")]);
        f.replica
            .create_card(CardVariant::Text, Position::new(0.0, 0.0))
            .unwrap();

        f.engine.push_local(&owner()).unwrap();
        assert_eq!(f.gateway.fetch_count(), 0);

        let doc = f.gateway.document(&owner()).unwrap();
        assert_eq!(doc.cards_data, f.replica.current_cards());
        assert_eq!(f.engine.sync_status(), SyncStatus::Synced);
    }

    #[test]
    fn reset_forgets_sync() {
        let f = fixture();
        f.engine.push_local(&owner()).unwrap();
        f.engine.reset();
        assert_eq!(f.engine.sync_status(), SyncStatus::Unsynced);
        assert!(f.engine.last_synced_at().is_none());
    }

    #[test]
    fn one_sided_counts_follow_the_sides() {
        let f = fixture();
        for policy in [MergePolicy::CloudPreferred, MergePolicy::LocalPreferred] {
            seed_remote(&f, vec![text("shared", "R"), text("r1", "r1"), text("r2", "r2")]);
            f.replica
                .import(vec![text("l1", "l1"), text("shared", "L")])
                .unwrap();
            let outcome = f.engine.reconcile(&owner(), policy).unwrap();
            assert_eq!(outcome.local_only, 1, "{policy:?}");
            assert_eq!(outcome.remote_only, 2, "{policy:?}");
            assert_eq!(outcome.conflicts, 1, "{policy:?}");
        }
    }

    #[test]
    fn non_finite_remote_card_is_ignored() {
        let f = fixture();
        f.replica.import(vec![text("a", "local a")]).unwrap();

        let mut broken = text("a", "remote a");
        broken.position.x = f64::NAN;
        let mut broken_only = text("b", "remote b");
        broken_only.position.y = f64::INFINITY;
        seed_remote(&f, vec![broken, broken_only, text("c", "remote c")]);

        let outcome = f.engine.reconcile(&owner(), MergePolicy::CloudPreferred).unwrap();
        assert!(outcome.pushed);

        let cards = f.replica.current_cards();
        let ids: Vec<String> = cards.iter().map(|c| c.id.to_string()).collect();
        assert_eq!(ids, ["c", "a"]);
        assert_eq!(cards[1].title, "local a");
        assert_eq!(f.gateway.document(&owner()).unwrap().cards_data, cards);
        assert_eq!(outcome.remote_only, 1);
        assert_eq!(outcome.local_only, 1);
    }

    /// Applies a local command while the fetch is in flight, then waits to be
    /// released.
    struct PausingGateway {
        inner: MemoryGateway,
        replica: Arc<ReplicaStore>,
        entered: Barrier,
        release: Barrier,
    }

    impl RemoteGateway for PausingGateway {
        fn fetch_remote(&self, owner: &OwnerId) -> SyncResult<RemoteFetch> {
            self.replica
                .create_card(CardVariant::Text, Position::new(9.0, 9.0))
                .unwrap();
            self.entered.wait();
            self.release.wait();
            self.inner.fetch_remote(owner)
        }

        fn push_remote(&self, owner: &OwnerId, snapshot: &WorkspaceSnapshot) -> SyncResult<()> {
            self.inner.push_remote(owner, snapshot)
        }
    }

    #[test]
    fn command_during_reconcile_survives_and_stays_unsynced() {
        let replica = Arc::new(ReplicaStore::open_in_memory().unwrap());
        let early = replica
            .create_card(CardVariant::Text, Position::default())
            .unwrap();
        let gateway = PausingGateway {
            inner: MemoryGateway::new(),
            replica: Arc::clone(&replica),
            entered: Barrier::new(2),
            release: Barrier::new(2),
        };
        let clock = Arc::new(ManualClock::default());
        let engine = SyncEngine::new(Arc::clone(&replica), gateway, clock as Arc<dyn Clock>);

        let outcome = thread::scope(|scope| {
            let running =
                scope.spawn(|| engine.reconcile(&owner(), MergePolicy::CloudPreferred));
            engine.gateway().entered.wait();
            assert_eq!(engine.sync_status(), SyncStatus::Syncing);
            engine.gateway().release.wait();
            running.join().unwrap()
        })
        .unwrap();

        // The push carries only what the snapshot held.
        assert!(outcome.pushed);
        let pushed = engine.gateway().inner.document(&owner()).unwrap();
        assert_eq!(pushed.cards_data.len(), 1);
        assert_eq!(pushed.cards_data[0].id, early);

        let cards = replica.current_cards();
        assert_eq!(cards.len(), 2);
        assert_eq!(cards[0].id, early);
        assert_eq!(cards[1].position, Position::new(9.0, 9.0));
        assert_eq!(engine.sync_status(), SyncStatus::Unsynced);
        assert!(engine.last_synced_at().is_some());
    }
}
