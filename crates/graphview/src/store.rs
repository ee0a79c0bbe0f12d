use futures::future::BoxFuture;
use serde::Serialize;
use tracing::{debug, warn};

use crate::history::GraphHistory;
use crate::snapshot::StructuralGraph;

/// Body sent to the backend when the history changes.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct HistoryUpdate {
    pub graph_history: Vec<StructuralGraph>,
    pub current_index: usize,
}

/// Durable storage for the graph history, usually a backend call.
pub trait Persister {
    fn persist(&self, update: HistoryUpdate) -> BoxFuture<'_, anyhow::Result<()>>;
}

impl<F, Fut> Persister for F
where
    F: Fn(HistoryUpdate) -> Fut,
    Fut: Future<Output = anyhow::Result<()>> + Send + 'static,
{
    fn persist(&self, update: HistoryUpdate) -> BoxFuture<'_, anyhow::Result<()>> {
        Box::pin(self(update))
    }
}

pub type MutationId = u64;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum MutationKind {
    CreateNode,
    UpdateNode,
    DeleteNode,
    CreateEdge,
}

impl MutationKind {
    pub fn success_message(&self) -> &'static str {
        match self {
            MutationKind::CreateNode => "Node created successfully",
            MutationKind::UpdateNode => "Node updated successfully",
            MutationKind::DeleteNode => "Node deleted successfully",
            MutationKind::CreateEdge => "Connection created successfully",
        }
    }

    pub fn failure_message(&self) -> &'static str {
        match self {
            MutationKind::CreateNode => "Failed to create node",
            MutationKind::UpdateNode => "Failed to update node",
            MutationKind::DeleteNode => "Failed to delete node",
            MutationKind::CreateEdge => "Failed to create connection",
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum MutationStatus {
    Pending,
    Committed,
    Failed,
}

#[derive(Clone, Debug, PartialEq)]
pub struct Mutation {
    pub id: MutationId,
    pub kind: MutationKind,
    /// History index of the snapshot this mutation produced.
    pub entry: usize,
    pub status: MutationStatus,
}

/// A staged mutation waiting for its persistence result.
#[derive(Clone, Debug, PartialEq)]
pub struct PendingCommit {
    pub id: MutationId,
    pub kind: MutationKind,
    pub update: HistoryUpdate,
}

#[derive(Debug, PartialEq, Eq, thiserror::Error)]
pub enum StoreError {
    #[error("unknown mutation {0}")]
    UnknownMutation(MutationId),
    #[error("mutation {0} has not failed")]
    NotFailed(MutationId),
    #[error("mutation {0} is no longer the newest entry")]
    NotNewest(MutationId),
}

/// In-memory graph history plus the persistence state of each mutation.
///
/// Commits are optimistic: the new snapshot becomes current as soon as it is
/// staged, and a failed save leaves it in place until the caller retries or
/// rolls it back.
#[derive(Debug, Default)]
pub struct GraphStore {
    history: GraphHistory,
    mutations: Vec<Mutation>,
    next_id: MutationId,
}

impl GraphStore {
    pub fn new(history: GraphHistory) -> Self {
        Self {
            history,
            mutations: Vec::new(),
            next_id: 1,
        }
    }

    pub fn current_snapshot(&self) -> &StructuralGraph {
        self.history.current_snapshot()
    }

    pub fn history(&self) -> (&[StructuralGraph], usize) {
        self.history.history()
    }

    pub fn timeline(&self) -> &GraphHistory {
        &self.history
    }

    pub fn timeline_mut(&mut self) -> &mut GraphHistory {
        &mut self.history
    }

    pub fn mutations(&self) -> &[Mutation] {
        &self.mutations
    }

    pub fn mutation(&self, id: MutationId) -> Option<&Mutation> {
        self.mutations.iter().find(|m| m.id == id)
    }

    pub fn update(&self) -> HistoryUpdate {
        let (snapshots, current) = self.history.history();
        HistoryUpdate {
            graph_history: snapshots.to_vec(),
            current_index: current,
        }
    }

    /// Append `snapshot` after the current entry and make it current in one
    /// step. Mutations whose entries were cut off the timeline are forgotten.
    pub fn stage(&mut self, snapshot: StructuralGraph, kind: MutationKind) -> PendingCommit {
        let entry = self.history.push(snapshot);
        self.mutations.retain(|m| m.entry < entry);

        let id = self.next_id.max(1);
        self.next_id = id + 1;
        self.mutations.push(Mutation {
            id,
            kind,
            entry,
            status: MutationStatus::Pending,
        });
        debug!(id, ?kind, entry, "staged graph mutation");

        PendingCommit {
            id,
            kind,
            update: self.update(),
        }
    }

    /// Record the persistence outcome. Returns the new status, or `None` if the
    /// mutation is unknown (for example cut off by a later edit). Committed
    /// mutations are forgotten; only pending and failed ones are tracked.
    pub fn resolve(&mut self, id: MutationId, accepted: bool) -> Option<MutationStatus> {
        let index = self.mutations.iter().position(|m| m.id == id)?;
        if accepted {
            self.mutations.remove(index);
            return Some(MutationStatus::Committed);
        }
        let mutation = &mut self.mutations[index];
        warn!(id, kind = ?mutation.kind, "graph mutation was not persisted");
        mutation.status = MutationStatus::Failed;
        Some(mutation.status)
    }

    /// Re-issue a failed mutation with the current history as payload.
    pub fn retry(&mut self, id: MutationId) -> Result<PendingCommit, StoreError> {
        let update = self.update();
        let mutation = self
            .mutations
            .iter_mut()
            .find(|m| m.id == id)
            .ok_or(StoreError::UnknownMutation(id))?;
        if mutation.status != MutationStatus::Failed {
            return Err(StoreError::NotFailed(id));
        }
        mutation.status = MutationStatus::Pending;
        Ok(PendingCommit {
            id,
            kind: mutation.kind,
            update,
        })
    }

    /// Drop a failed mutation's snapshot. Only the newest entry can be rolled
    /// back. If it was current, the previous snapshot becomes current;
    /// otherwise the timeline position is kept.
    pub fn rollback(&mut self, id: MutationId) -> Result<(), StoreError> {
        let mutation = self.mutation(id).ok_or(StoreError::UnknownMutation(id))?;
        if mutation.status != MutationStatus::Failed {
            return Err(StoreError::NotFailed(id));
        }
        if mutation.entry + 1 != self.history.len() {
            return Err(StoreError::NotNewest(id));
        }
        self.history.pop();
        self.mutations.retain(|m| m.id != id);
        debug!(id, "rolled back failed mutation");
        Ok(())
    }

    /// Stage, persist and resolve in one go. Returns whether the backend
    /// accepted the update.
    pub async fn commit<P: Persister + ?Sized>(
        &mut self,
        snapshot: StructuralGraph,
        kind: MutationKind,
        persister: &P,
    ) -> bool {
        let pending = self.stage(snapshot, kind);
        let accepted = persist(persister, pending.update).await;
        self.resolve(pending.id, accepted);
        accepted
    }
}

/// Run a persister and flatten its outcome to a success flag.
pub async fn persist<P: Persister + ?Sized>(persister: &P, update: HistoryUpdate) -> bool {
    match persister.persist(update).await {
        Ok(()) => true,
        Err(err) => {
            warn!("failed to persist graph history: {err:#}");
            false
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::node::{Node, NodeType};
    use std::sync::{Arc, Mutex};

    fn grown(store: &GraphStore, id: &str) -> StructuralGraph {
        let mut graph = store.current_snapshot().clone();
        graph.nodes.push(Node::new(id, id, NodeType::Trait));
        graph
    }

    #[test]
    fn test_commit_success() {
        let saved = Arc::new(Mutex::new(Vec::new()));
        let sink = saved.clone();
        let persister = move |update: HistoryUpdate| {
            sink.lock().unwrap().push(update.current_index);
            async { anyhow::Ok(()) }
        };

        let mut store = GraphStore::default();
        let next = grown(&store, "2");
        let ok = smol::block_on(store.commit(next, MutationKind::CreateNode, &persister));

        assert!(ok);
        assert_eq!(store.history().1, 1);
        assert_eq!(*saved.lock().unwrap(), vec![1]);
        assert!(store.mutations().is_empty());
    }

    #[test]
    fn test_failed_commit_keeps_optimistic_entry() {
        let persister = |_update: HistoryUpdate| async { Err::<(), _>(anyhow::anyhow!("offline")) };
        let mut store = GraphStore::default();
        let next = grown(&store, "2");
        let ok = smol::block_on(store.commit(next, MutationKind::CreateNode, &persister));

        assert!(!ok);
        assert!(store.current_snapshot().node("2").is_some());
        assert_eq!(store.mutations()[0].status, MutationStatus::Failed);
    }

    #[test]
    fn test_retry_and_rollback() {
        let mut store = GraphStore::default();
        let first = store.stage(grown(&store, "2"), MutationKind::CreateNode);
        assert_eq!(store.resolve(first.id, false), Some(MutationStatus::Failed));

        let again = store.retry(first.id).unwrap();
        assert_eq!(again.id, first.id);
        assert_eq!(store.retry(first.id), Err(StoreError::NotFailed(first.id)));
        store.resolve(first.id, false);

        store.rollback(first.id).unwrap();
        assert_eq!(store.history().0.len(), 1);
        assert!(store.current_snapshot().node("2").is_none());
        assert_eq!(store.rollback(first.id), Err(StoreError::UnknownMutation(first.id)));
    }

    #[test]
    fn test_rollback_keeps_earlier_timeline_position() {
        let mut store = GraphStore::default();
        store.stage(grown(&store, "2"), MutationKind::CreateNode);
        let second = store.stage(grown(&store, "3"), MutationKind::CreateNode);
        store.resolve(second.id, false);
        store.timeline_mut().seek(0);

        store.rollback(second.id).unwrap();
        assert_eq!(store.history().0.len(), 2);
        assert_eq!(store.history().1, 0);
        assert!(store.current_snapshot().node("2").is_none());
    }

    #[test]
    fn test_rollback_requires_newest() {
        let mut store = GraphStore::default();
        let first = store.stage(grown(&store, "2"), MutationKind::CreateNode);
        let second = store.stage(grown(&store, "3"), MutationKind::CreateNode);
        store.resolve(first.id, false);
        store.resolve(second.id, true);
        assert_eq!(store.rollback(first.id), Err(StoreError::NotNewest(first.id)));
    }

    #[test]
    fn test_queued_commits_resolve_out_of_order() {
        let mut store = GraphStore::default();
        let a = store.stage(grown(&store, "2"), MutationKind::CreateNode);
        let b = store.stage(grown(&store, "3"), MutationKind::CreateNode);
        assert_eq!(b.update.graph_history.len(), 3);

        assert_eq!(store.resolve(b.id, true), Some(MutationStatus::Committed));
        assert_eq!(store.mutations().len(), 1);
        assert_eq!(store.resolve(a.id, true), Some(MutationStatus::Committed));
        assert!(store.mutations().is_empty());
        assert_eq!(store.resolve(a.id, true), None);
    }

    #[test]
    fn test_stage_after_seek_forgets_cut_mutations() {
        let mut store = GraphStore::default();
        let a = store.stage(grown(&store, "2"), MutationKind::CreateNode);
        store.timeline_mut().seek(0);
        let b = store.stage(grown(&store, "3"), MutationKind::CreateNode);

        assert_eq!(store.resolve(a.id, true), None);
        assert_eq!(store.resolve(b.id, true), Some(MutationStatus::Committed));
        assert!(store.current_snapshot().node("2").is_none());
    }
}
