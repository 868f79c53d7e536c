//! In-memory relationship store.
//!
//! Relationships are grouped per `resource_id`. Every batch runs inside one
//! `DashMap` entry guard, so writes to the same resource are serialized and
//! never interleave, while disjoint resources proceed in parallel. Nothing
//! awaits while a guard is held: a batch is applied completely or not at all.
//!
//! Writers also hold the `epoch` lock shared. A read spanning several
//! resources takes it exclusively, so it sees every resource at the same
//! point between batches.

use std::collections::{BTreeSet, HashMap};

use dashmap::DashMap;
use iam_runtime_sdk::Relationship;
use parking_lot::RwLock;

#[derive(Debug, Default)]
pub struct RelationshipStore {
    resources: DashMap<String, BTreeSet<Relationship>>,
    epoch: RwLock<()>,
}

impl RelationshipStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a batch. Returns how many tuples were not already present.
    pub fn insert(&self, resource_id: &str, relationships: &[Relationship]) -> usize {
        if relationships.is_empty() {
            return 0;
        }

        let _epoch = self.epoch.read();
        let mut entry = self.resources.entry(resource_id.to_owned()).or_default();
        relationships
            .iter()
            .filter(|r| entry.insert((*r).clone()))
            .count()
    }

    /// Remove a batch. Returns how many tuples were actually present.
    pub fn remove(&self, resource_id: &str, relationships: &[Relationship]) -> usize {
        let _epoch = self.epoch.read();
        let Some(mut entry) = self.resources.get_mut(resource_id) else {
            return 0;
        };

        let removed = relationships.iter().filter(|r| entry.remove(*r)).count();
        let now_empty = entry.is_empty();
        drop(entry);

        if now_empty {
            self.resources.remove_if(resource_id, |_, set| set.is_empty());
        }
        removed
    }

    /// Copy of every relationship currently held on `resource_id`.
    #[must_use]
    pub fn snapshot(&self, resource_id: &str) -> BTreeSet<Relationship> {
        self.resources
            .get(resource_id)
            .map(|set| set.value().clone())
            .unwrap_or_default()
    }

    /// Copy the relationships of every listed resource as of one instant.
    ///
    /// No batch is applied between the first and the last copy. A single
    /// resource needs no store-wide lock: its entry guard already orders it
    /// against writers.
    #[must_use]
    pub fn snapshot_many<'a, I>(&self, resource_ids: I) -> HashMap<String, BTreeSet<Relationship>>
    where
        I: IntoIterator<Item = &'a str>,
    {
        let ids: BTreeSet<&str> = resource_ids.into_iter().collect();

        let _epoch = (ids.len() > 1).then(|| self.epoch.write());
        ids.into_iter()
            .map(|id| (id.to_owned(), self.snapshot(id)))
            .collect()
    }

    #[must_use]
    pub fn contains(&self, resource_id: &str, relationship: &Relationship) -> bool {
        self.resources
            .get(resource_id)
            .is_some_and(|set| set.contains(relationship))
    }

    /// Total number of stored tuples.
    #[must_use]
    pub fn len(&self) -> usize {
        self.resources.iter().map(|set| set.len()).sum()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.resources.is_empty()
    }
}

#[cfg(test)]
#[cfg_attr(coverage_nightly, coverage(off))]
mod tests {
    use std::sync::Arc;
    use std::sync::atomic::{AtomicBool, Ordering};
    use std::sync::mpsc;
    use std::time::Duration;

    use super::*;

    fn rel(relation: &str, subject: &str) -> Relationship {
        Relationship::new(relation, subject)
    }

    #[test]
    fn insert_is_idempotent() {
        let store = RelationshipStore::new();

        assert_eq!(store.insert("doc", &[rel("viewer", "bob")]), 1);
        assert_eq!(store.insert("doc", &[rel("viewer", "bob")]), 0);
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn duplicates_inside_a_batch_collapse() {
        let store = RelationshipStore::new();

        let inserted = store.insert("doc", &[rel("viewer", "bob"), rel("viewer", "bob")]);

        assert_eq!(inserted, 1);
        assert_eq!(store.snapshot("doc").len(), 1);
    }

    #[test]
    fn remove_of_absent_tuple_is_a_no_op() {
        let store = RelationshipStore::new();
        store.insert("doc", &[rel("viewer", "bob")]);

        assert_eq!(store.remove("doc", &[rel("editor", "bob")]), 0);
        assert_eq!(store.remove("other", &[rel("viewer", "bob")]), 0);
        assert!(store.contains("doc", &rel("viewer", "bob")));
    }

    #[test]
    fn removing_the_last_tuple_drops_the_resource() {
        let store = RelationshipStore::new();
        store.insert("doc", &[rel("viewer", "bob")]);

        assert_eq!(store.remove("doc", &[rel("viewer", "bob")]), 1);
        assert!(store.is_empty());
    }

    #[test]
    fn empty_batch_creates_nothing() {
        let store = RelationshipStore::new();

        assert_eq!(store.insert("doc", &[]), 0);
        assert!(store.is_empty());
    }

    #[test]
    fn resources_are_independent() {
        let store = RelationshipStore::new();
        store.insert("a", &[rel("viewer", "bob")]);
        store.insert("b", &[rel("viewer", "carol")]);

        store.remove("a", &[rel("viewer", "bob")]);

        assert!(store.snapshot("a").is_empty());
        assert!(store.contains("b", &rel("viewer", "carol")));
    }

    #[test]
    fn concurrent_batches_on_one_resource_never_interleave() {
        let store = Arc::new(RelationshipStore::new());
        let batch: Vec<Relationship> = (0..64).map(|i| rel("member", &format!("user-{i}"))).collect();

        let handles: Vec<_> = (0..8)
            .map(|n| {
                let store = Arc::clone(&store);
                let batch = batch.clone();
                std::thread::spawn(move || {
                    for _ in 0..50 {
                        if n % 2 == 0 {
                            store.insert("group", &batch);
                        } else {
                            store.remove("group", &batch);
                        }
                        let size = store.snapshot("group").len();
                        assert!(size == 0 || size == batch.len(), "partial batch observed: {size}");
                    }
                })
            })
            .collect();

        for handle in handles {
            handle.join().unwrap();
        }
    }

    /// Runs `writer` in a loop on another thread while `check` inspects
    /// multi-resource snapshots on this one.
    fn race_snapshots(
        writer: impl Fn(&RelationshipStore) + Send + 'static,
        check: impl Fn(&HashMap<String, BTreeSet<Relationship>>),
    ) {
        let store = Arc::new(RelationshipStore::new());
        let stop = Arc::new(AtomicBool::new(false));

        let handle = {
            let store = Arc::clone(&store);
            let stop = Arc::clone(&stop);
            std::thread::spawn(move || {
                while !stop.load(Ordering::Relaxed) {
                    writer(&store);
                }
            })
        };

        for _ in 0..20_000 {
            check(&store.snapshot_many(["a", "b"]));
        }
        stop.store(true, Ordering::Relaxed);
        handle.join().unwrap();
    }

    #[test]
    fn multi_resource_snapshot_never_mixes_states() {
        let grant = [rel("greeter", "hello")];

        // `a` and `b` are never held at the same time.
        race_snapshots(
            move |store| {
                store.insert("a", &grant);
                store.remove("a", &grant);
                store.insert("b", &grant);
                store.remove("b", &grant);
            },
            |snap| {
                assert!(
                    snap["a"].is_empty() || snap["b"].is_empty(),
                    "observed a and b together"
                );
            },
        );
    }

    #[test]
    fn multi_resource_snapshot_respects_write_order() {
        let grant = [rel("greeter", "hello")];

        // `b` only exists while `a` does.
        race_snapshots(
            move |store| {
                store.insert("a", &grant);
                store.insert("b", &grant);
                store.remove("b", &grant);
                store.remove("a", &grant);
            },
            |snap| {
                assert!(
                    snap["b"].is_empty() || !snap["a"].is_empty(),
                    "observed b without a"
                );
            },
        );
    }

    #[test]
    fn snapshot_many_dedupes_resources() {
        let store = RelationshipStore::new();
        store.insert("a", &[rel("viewer", "bob")]);

        let snap = store.snapshot_many(["a", "a", "missing"]);

        assert_eq!(snap.len(), 2);
        assert_eq!(snap["a"].len(), 1);
        assert!(snap["missing"].is_empty());
    }

    #[test]
    fn write_to_another_resource_completes_while_one_is_locked() {
        let store = Arc::new(RelationshipStore::new());

        // Hold a write guard on "busy" for the whole test.
        let busy = store.resources.entry("busy".to_owned()).or_default();

        // Pick a resource whose shard is not the one held above.
        let free = (0..1024)
            .map(|i| format!("free-{i}"))
            .find(|id| store.resources.try_entry(id.clone()).is_some())
            .expect("some resource must live on another shard");

        let (tx, rx) = mpsc::channel();
        let writer = {
            let store = Arc::clone(&store);
            let free = free.clone();
            std::thread::spawn(move || {
                let inserted = store.insert(&free, &[rel("viewer", "bob")]);
                tx.send(inserted).unwrap();
            })
        };

        let inserted = rx
            .recv_timeout(Duration::from_secs(5))
            .expect("write to a disjoint resource was blocked");
        assert_eq!(inserted, 1);
        writer.join().unwrap();

        drop(busy);
        assert!(store.contains(&free, &rel("viewer", "bob")));
    }
}
