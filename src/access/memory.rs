use std::collections::{HashMap, HashSet};
use std::sync::{
    Arc, PoisonError, RwLock,
    atomic::{AtomicBool, AtomicUsize, Ordering},
};

use uuid::Uuid;

use super::datastore::{Actor, DataStore, OrderRecord, StoreError, StoreRecord};

/// In-memory [`DataStore`] for tests. Counts lookups (so short-circuit
/// behavior is observable) and can be switched into a failing mode to
/// exercise the upstream-unavailable path.
#[derive(Clone, Default)]
pub struct MemoryStore {
    inner: Arc<Inner>,
}

#[derive(Default)]
struct Inner {
    actors: RwLock<HashMap<Uuid, Actor>>,
    stores: RwLock<HashMap<Uuid, StoreRecord>>,
    orders: RwLock<HashMap<Uuid, OrderRecord>>,
    lookups: AtomicUsize,
    failing: AtomicBool,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert_actor(&self, actor: Actor) {
        self.inner
            .actors
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(actor.id, actor);
    }

    pub fn insert_store(&self, store: StoreRecord) {
        self.inner
            .stores
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(store.id, store);
    }

    pub fn insert_order(&self, order: OrderRecord) {
        self.inner
            .orders
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(order.id, order);
    }

    /// Number of data-store reads performed so far.
    pub fn lookup_count(&self) -> usize {
        self.inner.lookups.load(Ordering::SeqCst)
    }

    /// When set, every read fails with [`StoreError`].
    pub fn set_failing(&self, failing: bool) {
        self.inner.failing.store(failing, Ordering::SeqCst);
    }

    fn record_lookup(&self) -> Result<(), StoreError> {
        self.inner.lookups.fetch_add(1, Ordering::SeqCst);
        if self.inner.failing.load(Ordering::SeqCst) {
            Err(StoreError(anyhow::anyhow!("injected backend outage")))
        } else {
            Ok(())
        }
    }
}

impl DataStore for MemoryStore {
    async fn get_actor(&self, id: Uuid) -> Result<Option<Actor>, StoreError> {
        self.record_lookup()?;
        Ok(self
            .inner
            .actors
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(&id)
            .copied())
    }

    async fn get_store(&self, id: Uuid) -> Result<Option<StoreRecord>, StoreError> {
        self.record_lookup()?;
        Ok(self
            .inner
            .stores
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(&id)
            .copied())
    }

    async fn get_order(&self, id: Uuid) -> Result<Option<OrderRecord>, StoreError> {
        self.record_lookup()?;
        Ok(self
            .inner
            .orders
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(&id)
            .cloned())
    }

    async fn stores_owned_by(&self, actor_id: Uuid) -> Result<HashSet<Uuid>, StoreError> {
        self.record_lookup()?;
        Ok(self
            .inner
            .stores
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .values()
            .filter(|s| s.owner_id == actor_id)
            .map(|s| s.id)
            .collect())
    }
}
