//! Scripted provider and helpers shared by the controller tests.

use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use chrono::NaiveDate;
use tokio::sync::oneshot;
use tracing_subscriber::EnvFilter;

use stockflow_core::{
    Money, MovementPage, MovementPayload, MovementQuery, MovementRecord, PageInfo, QuantityUpdate,
    Resource,
};

use crate::controller::ControllerEventEmitter;
use crate::error::{ServiceError, ServiceResult};
use crate::service::MovementService;
use crate::state::{ControllerFault, ControllerSnapshot};

/// Routes controller logs to the test harness. Honors `RUST_LOG`.
pub(crate) fn init_test_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("debug")),
        )
        .with_test_writer()
        .try_init();
}

// =============================================================================
// Fixtures
// =============================================================================

pub(crate) fn day(d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(2024, 6, d).unwrap()
}

pub(crate) fn payload(code: &str, quantity: i64, cents: i64) -> MovementPayload {
    MovementPayload::new(day(1), code, format!("{code} description"), Money::from_cents(cents), quantity)
}

pub(crate) fn record(resource: Resource, id: &str) -> MovementRecord {
    payload(id, 1, 100).into_record(id, resource)
}

/// A page holding `records` with totals computed from `total`.
pub(crate) fn page_of(records: Vec<MovementRecord>, page: u32, limit: u32, total: u64) -> MovementPage {
    MovementPage {
        data: records,
        pagination: PageInfo::from_total(page, limit, total),
    }
}

// =============================================================================
// Scripted Service
// =============================================================================

/// One provider call, as observed by [`ScriptedService`].
#[derive(Debug, Clone, PartialEq)]
pub(crate) enum Call {
    GetAll(Resource, MovementQuery),
    Create(Resource),
    Update(Resource, String),
    Delete(Resource, String),
    UpdateQuantity(String),
}

enum Reply {
    Now(ServiceResult<MovementPage>),
    Later(oneshot::Receiver<ServiceResult<MovementPage>>),
}

/// In-memory provider with scriptable listing replies.
///
/// Listing calls consume queued replies per resource in FIFO order and fall
/// back to serving the in-memory store. A deferred reply whose sender is
/// dropped resolves as [`ServiceError::Cancelled`].
#[derive(Default)]
pub(crate) struct ScriptedService {
    calls: Mutex<Vec<Call>>,
    store: Mutex<HashMap<Resource, Vec<MovementRecord>>>,
    replies: Mutex<HashMap<Resource, VecDeque<Reply>>>,
    mutation_failure: Mutex<Option<String>>,
    next_id: AtomicU64,
}

impl ScriptedService {
    pub(crate) fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Replaces the stored rows of `resource`.
    pub(crate) fn seed(&self, resource: Resource, records: Vec<MovementRecord>) {
        self.store.lock().unwrap().insert(resource, records);
    }

    pub(crate) fn stored(&self, resource: Resource) -> Vec<MovementRecord> {
        self.store
            .lock()
            .unwrap()
            .get(&resource)
            .cloned()
            .unwrap_or_default()
    }

    /// Queues an immediate reply for the next listing of `resource`.
    pub(crate) fn reply_next(&self, resource: Resource, reply: ServiceResult<MovementPage>) {
        self.push_reply(resource, Reply::Now(reply));
    }

    /// Queues a reply for the next listing of `resource` that resolves when
    /// the returned sender fires.
    pub(crate) fn defer_next(&self, resource: Resource) -> oneshot::Sender<ServiceResult<MovementPage>> {
        let (tx, rx) = oneshot::channel();
        self.push_reply(resource, Reply::Later(rx));
        tx
    }

    /// Makes the next mutation fail with `message`.
    pub(crate) fn fail_next_mutation(&self, message: &str) {
        *self.mutation_failure.lock().unwrap() = Some(message.to_string());
    }

    pub(crate) fn calls(&self) -> Vec<Call> {
        self.calls.lock().unwrap().clone()
    }

    pub(crate) fn call_count(&self) -> usize {
        self.calls.lock().unwrap().len()
    }

    /// Listing queries issued for `resource`, oldest first.
    pub(crate) fn fetches(&self, resource: Resource) -> Vec<MovementQuery> {
        self.calls()
            .into_iter()
            .filter_map(|call| match call {
                Call::GetAll(r, query) if r == resource => Some(query),
                _ => None,
            })
            .collect()
    }

    fn push_reply(&self, resource: Resource, reply: Reply) {
        self.replies
            .lock()
            .unwrap()
            .entry(resource)
            .or_default()
            .push_back(reply);
    }

    fn log(&self, call: Call) {
        self.calls.lock().unwrap().push(call);
    }

    fn take_mutation_failure(&self) -> ServiceResult<()> {
        match self.mutation_failure.lock().unwrap().take() {
            Some(message) => Err(ServiceError::rejected(message)),
            None => Ok(()),
        }
    }

    fn serve(&self, resource: Resource, query: &MovementQuery) -> MovementPage {
        let matching: Vec<MovementRecord> = self
            .stored(resource)
            .into_iter()
            .filter(|r| query.start_date.map_or(true, |start| r.date >= start))
            .filter(|r| query.end_date.map_or(true, |end| r.date <= end))
            .filter(|r| {
                query
                    .category
                    .as_deref()
                    .map_or(true, |tag| r.category.as_deref() == Some(tag))
            })
            .filter(|r| {
                query.search.as_deref().map_or(true, |term| {
                    let term = term.to_lowercase();
                    r.product_code.to_lowercase().contains(&term)
                        || r.description.to_lowercase().contains(&term)
                })
            })
            .collect();

        let total = matching.len() as u64;
        let data = matching
            .into_iter()
            .skip(query.offset() as usize)
            .take(query.limit as usize)
            .collect();

        page_of(data, query.page, query.limit, total)
    }

    fn not_found(resource: Resource, id: &str) -> ServiceError {
        ServiceError::rejected(format!("{} not found: {id}", resource.singular()))
    }
}

#[async_trait]
impl MovementService for ScriptedService {
    async fn get_all(&self, resource: Resource, query: &MovementQuery) -> ServiceResult<MovementPage> {
        self.log(Call::GetAll(resource, query.clone()));

        let reply = self
            .replies
            .lock()
            .unwrap()
            .get_mut(&resource)
            .and_then(VecDeque::pop_front);

        match reply {
            Some(Reply::Now(result)) => result,
            Some(Reply::Later(rx)) => rx.await.unwrap_or(Err(ServiceError::Cancelled)),
            None => Ok(self.serve(resource, query)),
        }
    }

    async fn create(&self, resource: Resource, payload: &MovementPayload) -> ServiceResult<MovementRecord> {
        self.log(Call::Create(resource));
        self.take_mutation_failure()?;

        let id = format!("rec-{}", self.next_id.fetch_add(1, Ordering::SeqCst) + 1);
        let record = payload.clone().into_record(id, resource);
        self.store
            .lock()
            .unwrap()
            .entry(resource)
            .or_default()
            .insert(0, record.clone());
        Ok(record)
    }

    async fn update(
        &self,
        resource: Resource,
        id: &str,
        payload: &MovementPayload,
    ) -> ServiceResult<MovementRecord> {
        self.log(Call::Update(resource, id.to_string()));
        self.take_mutation_failure()?;

        let mut store = self.store.lock().unwrap();
        let slot = store
            .get_mut(&resource)
            .and_then(|rows| rows.iter_mut().find(|r| r.id == id))
            .ok_or_else(|| Self::not_found(resource, id))?;
        *slot = payload.clone().into_record(id, resource);
        Ok(slot.clone())
    }

    async fn delete(&self, resource: Resource, id: &str) -> ServiceResult<()> {
        self.log(Call::Delete(resource, id.to_string()));
        self.take_mutation_failure()?;

        let mut store = self.store.lock().unwrap();
        let rows = store.entry(resource).or_default();
        let before = rows.len();
        rows.retain(|r| r.id != id);
        if rows.len() == before {
            return Err(Self::not_found(resource, id));
        }
        Ok(())
    }

    async fn update_quantity(&self, id: &str, update: &QuantityUpdate) -> ServiceResult<MovementRecord> {
        self.log(Call::UpdateQuantity(id.to_string()));
        self.take_mutation_failure()?;

        let mut store = self.store.lock().unwrap();
        let row = store
            .get_mut(&Resource::Exits)
            .and_then(|rows| rows.iter_mut().find(|r| r.id == id))
            .ok_or_else(|| Self::not_found(Resource::Exits, id))?;
        row.quantity = update.quantity;
        Ok(row.clone())
    }
}

/// Yields until `service` has seen at least `count` calls.
pub(crate) async fn wait_for_calls(service: &ScriptedService, count: usize) {
    for _ in 0..10_000 {
        if service.call_count() >= count {
            return;
        }
        tokio::task::yield_now().await;
    }
    panic!("expected {count} calls, saw {:?}", service.calls());
}

// =============================================================================
// Recording Emitter
// =============================================================================

/// Keeps every emitted fault and counts state notifications.
#[derive(Default)]
pub(crate) struct RecordingEmitter {
    states: AtomicUsize,
    last_state: Mutex<Option<ControllerSnapshot>>,
    faults: Mutex<Vec<ControllerFault>>,
}

impl RecordingEmitter {
    pub(crate) fn state_count(&self) -> usize {
        self.states.load(Ordering::SeqCst)
    }

    pub(crate) fn last_state(&self) -> Option<ControllerSnapshot> {
        self.last_state.lock().unwrap().clone()
    }

    pub(crate) fn faults(&self) -> Vec<ControllerFault> {
        self.faults.lock().unwrap().clone()
    }
}

impl ControllerEventEmitter for RecordingEmitter {
    fn emit_state(&self, snapshot: &ControllerSnapshot) {
        self.states.fetch_add(1, Ordering::SeqCst);
        *self.last_state.lock().unwrap() = Some(snapshot.clone());
    }

    fn emit_error(&self, fault: &ControllerFault) {
        self.faults.lock().unwrap().push(fault.clone());
    }
}
