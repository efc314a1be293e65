//! Observable client-side cache for one resource collection.
//!
//! # Design
//! A `ResourceStore` mirrors what the server has confirmed, nothing more:
//! entries are inserted, replaced or removed only after the gateway call
//! resolves. Each request kind (list, create, update, delete) has its own
//! lane with an independent `Lifecycle`, so a slow list never hides the
//! outcome of a create.
//!
//! Entries are held as `Arc<E>`. Reconciliation only swaps the `Arc`s it has
//! to, so anything unchanged keeps its identity and observers can compare
//! with `Arc::ptr_eq`.
//!
//! Writes addressed to an existing id (update, delete) are serialized per id:
//! while one is in flight, a second is refused with `StoreError::Busy`.
//! Writes on different ids, and all list/create calls, run freely and settle
//! in resolution order.

use std::collections::{BTreeMap, HashMap};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use serde::Serialize;
use tracing::{debug, warn};
use uuid::Uuid;

use crate::error::{ApiError, NormalizedError, StoreError};
use crate::resource::{Gateway, Resource};
use crate::types::EntityId;

/// Request lifecycle of one lane.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Lifecycle {
    #[default]
    Idle,
    Loading,
    Succeeded,
    Failed,
}

impl Lifecycle {
    pub fn is_settled(&self) -> bool {
        matches!(self, Lifecycle::Succeeded | Lifecycle::Failed)
    }
}

/// The independently tracked request kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Lane {
    List,
    Create,
    Update,
    Delete,
}

impl Lane {
    pub fn as_str(&self) -> &'static str {
        match self {
            Lane::List => "list",
            Lane::Create => "create",
            Lane::Update => "update",
            Lane::Delete => "delete",
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct LaneState {
    pub status: Lifecycle,
    pub error: Option<NormalizedError>,
}

impl LaneState {
    pub(crate) fn loading() -> Self {
        Self {
            status: Lifecycle::Loading,
            error: None,
        }
    }

    pub(crate) fn succeeded() -> Self {
        Self {
            status: Lifecycle::Succeeded,
            error: None,
        }
    }

    pub(crate) fn failed(error: NormalizedError) -> Self {
        Self {
            status: Lifecycle::Failed,
            error: Some(error),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Lanes {
    pub list: LaneState,
    pub create: LaneState,
    pub update: LaneState,
    pub delete: LaneState,
}

impl Lanes {
    pub fn get(&self, lane: Lane) -> &LaneState {
        match lane {
            Lane::List => &self.list,
            Lane::Create => &self.create,
            Lane::Update => &self.update,
            Lane::Delete => &self.delete,
        }
    }

    fn get_mut(&mut self, lane: Lane) -> &mut LaneState {
        match lane {
            Lane::List => &mut self.list,
            Lane::Create => &mut self.create,
            Lane::Update => &mut self.update,
            Lane::Delete => &mut self.delete,
        }
    }
}

/// Everything a view needs to render one collection.
#[derive(Debug, Clone)]
pub struct StoreSnapshot<E> {
    pub items: Vec<Arc<E>>,
    pub lanes: Lanes,
}

impl<E> Default for StoreSnapshot<E> {
    fn default() -> Self {
        Self {
            items: Vec::new(),
            lanes: Lanes::default(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct SubscriptionId(u64);

type Callback<E> = Arc<dyn Fn(&StoreSnapshot<E>) + Send + Sync>;

struct Subscribers<E> {
    next_id: AtomicU64,
    callbacks: Mutex<BTreeMap<SubscriptionId, Callback<E>>>,
}

impl<E> Subscribers<E> {
    fn new() -> Self {
        Self {
            next_id: AtomicU64::new(0),
            callbacks: Mutex::new(BTreeMap::new()),
        }
    }

    fn subscribe(&self, callback: Callback<E>) -> SubscriptionId {
        let id = SubscriptionId(self.next_id.fetch_add(1, Ordering::Relaxed));
        lock(&self.callbacks).insert(id, callback);
        id
    }

    fn unsubscribe(&self, id: SubscriptionId) -> bool {
        lock(&self.callbacks).remove(&id).is_some()
    }

    /// Callbacks run without the registry lock held, so they may subscribe,
    /// unsubscribe or read the store.
    fn notify(&self, snapshot: &StoreSnapshot<E>) {
        let callbacks: Vec<Callback<E>> = lock(&self.callbacks).values().cloned().collect();
        for callback in callbacks {
            callback(snapshot);
        }
    }
}

/// Marks an id as having a write in flight until dropped.
struct InFlight<'a> {
    registry: &'a Mutex<HashMap<EntityId, Uuid>>,
    id: EntityId,
    token: Uuid,
}

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        let mut registry = lock(self.registry);
        if registry.get(&self.id) == Some(&self.token) {
            registry.remove(&self.id);
        }
    }
}

/// Cache plus lifecycle lanes for the collection described by `R`.
pub struct ResourceStore<R: Resource> {
    gateway: Gateway<R>,
    state: Mutex<StoreSnapshot<R::Entity>>,
    subscribers: Subscribers<R::Entity>,
    in_flight: Mutex<HashMap<EntityId, Uuid>>,
}

impl<R: Resource> std::fmt::Debug for ResourceStore<R> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let state = lock(&self.state);
        f.debug_struct("ResourceStore")
            .field("resource", &R::NAME)
            .field("items", &state.items.len())
            .field("lanes", &state.lanes)
            .finish()
    }
}

impl<R: Resource> ResourceStore<R> {
    pub fn new(gateway: Gateway<R>) -> Self {
        Self {
            gateway,
            state: Mutex::new(StoreSnapshot::default()),
            subscribers: Subscribers::new(),
            in_flight: Mutex::new(HashMap::new()),
        }
    }

    pub fn gateway(&self) -> &Gateway<R> {
        &self.gateway
    }

    pub fn snapshot(&self) -> StoreSnapshot<R::Entity> {
        lock(&self.state).clone()
    }

    pub fn items(&self) -> Vec<Arc<R::Entity>> {
        lock(&self.state).items.clone()
    }

    pub fn get(&self, id: EntityId) -> Option<Arc<R::Entity>> {
        lock(&self.state)
            .items
            .iter()
            .find(|item| R::id(item) == id)
            .cloned()
    }

    pub fn lane(&self, lane: Lane) -> LaneState {
        lock(&self.state).lanes.get(lane).clone()
    }

    pub fn is_in_flight(&self, id: EntityId) -> bool {
        lock(&self.in_flight).contains_key(&id)
    }

    /// Register a callback run after every lane transition.
    pub fn subscribe<F>(&self, callback: F) -> SubscriptionId
    where
        F: Fn(&StoreSnapshot<R::Entity>) + Send + Sync + 'static,
    {
        self.subscribers.subscribe(Arc::new(callback))
    }

    pub fn unsubscribe(&self, id: SubscriptionId) -> bool {
        self.subscribers.unsubscribe(id)
    }

    /// Return a settled lane to `Idle`, clearing its error. A lane that is
    /// still loading is left alone.
    pub fn reset(&self, lane: Lane) {
        let snapshot = {
            let mut state = lock(&self.state);
            let current = state.lanes.get_mut(lane);
            if !current.status.is_settled() {
                return;
            }
            *current = LaneState::default();
            state.clone()
        };
        self.subscribers.notify(&snapshot);
    }

    /// Replace the cache with the server's list.
    pub async fn fetch(&self, filter: &R::Filter) -> Result<Vec<Arc<R::Entity>>, StoreError> {
        self.begin(Lane::List);
        let result = self.gateway.list(filter).await;
        self.settle(Lane::List, result, |items, fetched| {
            reconcile_list::<R>(items, fetched);
            items.clone()
        })
    }

    /// Create on the server, then append the confirmed record.
    pub async fn create(&self, draft: R::Draft) -> Result<Arc<R::Entity>, StoreError> {
        self.begin(Lane::Create);
        let result = self.gateway.create(draft).await;
        self.settle(Lane::Create, result, |items, created| {
            let id = R::id(&created);
            upsert::<R>(items, id, Arc::new(created))
        })
    }

    /// Update on the server, then replace the entry with the matching id.
    pub async fn update(&self, id: EntityId, draft: R::Draft) -> Result<Arc<R::Entity>, StoreError> {
        let _guard = self.claim(id)?;
        self.begin(Lane::Update);
        let result = self.gateway.update(id, draft).await;
        self.settle(Lane::Update, result, |items, updated| {
            let updated = Arc::new(updated);
            let mut replaced = false;
            for slot in items.iter_mut().filter(|item| R::id(item) == id) {
                *slot = updated.clone();
                replaced = true;
            }
            if !replaced {
                debug!(resource = R::NAME, id, "updated entry was not cached");
            }
            updated
        })
    }

    /// Delete on the server, then drop every entry with that id.
    pub async fn delete(&self, id: EntityId) -> Result<EntityId, StoreError> {
        let _guard = self.claim(id)?;
        self.begin(Lane::Delete);
        let result = self.gateway.delete(id).await;
        self.settle(Lane::Delete, result, |items, deleted| {
            items.retain(|item| R::id(item) != deleted);
            deleted
        })
    }

    /// Settle the list lane with a result fetched elsewhere, as if `fetch`
    /// had resolved with it. The lane must have been moved to `Loading` with
    /// `begin(Lane::List)` first.
    pub(crate) fn settle_list(&self, result: Result<Vec<R::Entity>, ApiError>) {
        let _ = self.settle(Lane::List, result, |items, fetched| {
            reconcile_list::<R>(items, fetched)
        });
    }

    fn claim(&self, id: EntityId) -> Result<InFlight<'_>, StoreError> {
        let mut registry = lock(&self.in_flight);
        if registry.contains_key(&id) {
            debug!(resource = R::NAME, id, "refusing write, another is in flight");
            return Err(StoreError::Busy {
                resource: R::NAME,
                id,
            });
        }
        let token = Uuid::new_v4();
        registry.insert(id, token);
        Ok(InFlight {
            registry: &self.in_flight,
            id,
            token,
        })
    }

    pub(crate) fn begin(&self, lane: Lane) {
        let snapshot = {
            let mut state = lock(&self.state);
            *state.lanes.get_mut(lane) = LaneState::loading();
            state.clone()
        };
        debug!(resource = R::NAME, lane = lane.as_str(), "loading");
        self.subscribers.notify(&snapshot);
    }

    fn settle<T, O>(
        &self,
        lane: Lane,
        result: Result<T, ApiError>,
        apply: impl FnOnce(&mut Vec<Arc<R::Entity>>, T) -> O,
    ) -> Result<O, StoreError> {
        let (outcome, snapshot) = {
            let mut state = lock(&self.state);
            let outcome = match result {
                Ok(value) => {
                    let out = apply(&mut state.items, value);
                    *state.lanes.get_mut(lane) = LaneState::succeeded();
                    Ok(out)
                }
                Err(err) => {
                    *state.lanes.get_mut(lane) = LaneState::failed(err.normalized());
                    Err(err)
                }
            };
            (outcome, state.clone())
        };

        match &outcome {
            Ok(_) => debug!(
                resource = R::NAME,
                lane = lane.as_str(),
                items = snapshot.items.len(),
                "succeeded"
            ),
            Err(err) => warn!(resource = R::NAME, lane = lane.as_str(), error = %err, "failed"),
        }
        self.subscribers.notify(&snapshot);
        outcome.map_err(StoreError::from)
    }
}

/// Replace `items` with `fetched`, reusing the existing `Arc` of every entry
/// that came back unchanged.
fn reconcile_list<R: Resource>(items: &mut Vec<Arc<R::Entity>>, fetched: Vec<R::Entity>) {
    let mut previous: HashMap<EntityId, Arc<R::Entity>> = items
        .drain(..)
        .map(|item| (R::id(&item), item))
        .collect();
    items.extend(fetched.into_iter().map(|entity| {
        match previous.remove(&R::id(&entity)) {
            Some(existing) if *existing == entity => existing,
            _ => Arc::new(entity),
        }
    }));
}

/// Replace the first entry with `id` or append; later duplicates are dropped
/// so the id appears exactly once.
fn upsert<R: Resource>(
    items: &mut Vec<Arc<R::Entity>>,
    id: EntityId,
    entity: Arc<R::Entity>,
) -> Arc<R::Entity> {
    match items.iter().position(|item| R::id(item) == id) {
        Some(index) => {
            items[index] = entity.clone();
            let mut seen = 0;
            items.retain(|item| {
                if R::id(item) != id {
                    return true;
                }
                seen += 1;
                seen == 1
            });
        }
        None => items.push(entity.clone()),
    }
    entity
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}
