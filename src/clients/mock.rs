//! # Mock Order Backend
//!
//! [`MockOrderService`] implements [`OrderSource`], [`OrderSink`] and [`OrgInfo`] in
//! memory so controllers and coordinators can be tested without a server.
//!
//! Responses are queued per operation with a fluent builder and consumed in order:
//!
//! ```ignore
//! let mock = MockOrderService::new();
//! mock.expect_list().return_ok(vec![order]);
//! let gate = mock.expect_list().hold();      // stays outstanding until released
//! mock.expect_set_status().return_err(TransportError::Unavailable("down".into()));
//!
//! let source: Arc<dyn OrderSource> = Arc::new(mock.clone());
//! // ... drive the code under test ...
//! gate.release_ok(vec![]);
//! mock.verify(); // every queued expectation was consumed
//! ```
//!
//! Every call is recorded ([`MockOrderService::calls`]) and the number of list calls
//! outstanding at the same time is tracked, which is how the "one fetch in flight"
//! guarantee of the sync controller is asserted.

use crate::clients::{OrderSink, OrderSource, OrgInfo, TransportError};
use crate::model::{Correction, Order, OrderId, OrderStatus, Org, OrgId, StatusFilter};
use async_trait::async_trait;
use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use tokio::sync::oneshot;

// =============================================================================
// EXPECTATION BUILDER API
// =============================================================================

/// A queued response: either immediate, or held open until a [`Gate`] releases it.
enum Expectation<T> {
    Ready(Result<T, TransportError>),
    Held(oneshot::Receiver<Result<T, TransportError>>),
}

type Queue<T> = Arc<Mutex<VecDeque<Expectation<T>>>>;

/// Builder returned by the `expect_*` methods.
pub struct ExpectationBuilder<T> {
    queue: Queue<T>,
}

impl<T> ExpectationBuilder<T> {
    /// Answer the next call with `value`.
    pub fn return_ok(self, value: T) {
        self.queue
            .lock()
            .unwrap()
            .push_back(Expectation::Ready(Ok(value)));
    }

    /// Fail the next call with `error`.
    pub fn return_err(self, error: TransportError) {
        self.queue
            .lock()
            .unwrap()
            .push_back(Expectation::Ready(Err(error)));
    }

    /// Keep the next call pending until the returned gate is released.
    pub fn hold(self) -> Gate<T> {
        let (tx, rx) = oneshot::channel();
        self.queue.lock().unwrap().push_back(Expectation::Held(rx));
        Gate { tx }
    }
}

/// Releases a held call. Dropping the gate fails the call with `Unavailable`.
pub struct Gate<T> {
    tx: oneshot::Sender<Result<T, TransportError>>,
}

impl<T> Gate<T> {
    pub fn release_ok(self, value: T) {
        // the caller may have been cancelled meanwhile
        let _ = self.tx.send(Ok(value));
    }

    pub fn release_err(self, error: TransportError) {
        let _ = self.tx.send(Err(error));
    }
}

/// A recorded call against the mock.
#[derive(Debug, Clone, PartialEq)]
pub enum Call {
    List { org: OrgId, filter: StatusFilter },
    ApplyCorrection(Correction),
    SetStatus { id: OrderId, status: OrderStatus },
    GetOrg,
}

/// In-memory order backend with expectation tracking.
#[derive(Clone, Default)]
pub struct MockOrderService {
    lists: Queue<Vec<Order>>,
    corrections: Queue<Order>,
    statuses: Queue<Order>,
    orgs: Queue<Org>,
    default_orders: Arc<Mutex<Option<Vec<Order>>>>,
    calls: Arc<Mutex<Vec<Call>>>,
    outstanding_lists: Arc<AtomicUsize>,
    max_outstanding_lists: Arc<AtomicUsize>,
}

impl MockOrderService {
    pub fn new() -> Self {
        Self::default()
    }

    /// List calls with no queued expectation answer with these orders instead of panicking.
    pub fn with_orders(self, orders: Vec<Order>) -> Self {
        self.set_orders(orders);
        self
    }

    /// Replaces the fallback list answer, e.g. to simulate the server changing.
    pub fn set_orders(&self, orders: Vec<Order>) {
        *self.default_orders.lock().unwrap() = Some(orders);
    }

    pub fn expect_list(&self) -> ExpectationBuilder<Vec<Order>> {
        ExpectationBuilder {
            queue: self.lists.clone(),
        }
    }

    pub fn expect_apply_correction(&self) -> ExpectationBuilder<Order> {
        ExpectationBuilder {
            queue: self.corrections.clone(),
        }
    }

    pub fn expect_set_status(&self) -> ExpectationBuilder<Order> {
        ExpectationBuilder {
            queue: self.statuses.clone(),
        }
    }

    pub fn expect_org(&self) -> ExpectationBuilder<Org> {
        ExpectationBuilder {
            queue: self.orgs.clone(),
        }
    }

    /// All calls in the order they were made.
    pub fn calls(&self) -> Vec<Call> {
        self.calls.lock().unwrap().clone()
    }

    pub fn list_calls(&self) -> usize {
        self.count(|call| matches!(call, Call::List { .. }))
    }

    pub fn corrections(&self) -> Vec<Correction> {
        self.calls()
            .into_iter()
            .filter_map(|call| match call {
                Call::ApplyCorrection(correction) => Some(correction),
                _ => None,
            })
            .collect()
    }

    pub fn status_calls(&self) -> Vec<(OrderId, OrderStatus)> {
        self.calls()
            .into_iter()
            .filter_map(|call| match call {
                Call::SetStatus { id, status } => Some((id, status)),
                _ => None,
            })
            .collect()
    }

    /// List calls currently awaiting a response.
    pub fn outstanding_lists(&self) -> usize {
        self.outstanding_lists.load(Ordering::SeqCst)
    }

    /// Highest number of list calls that were ever outstanding at once.
    pub fn max_outstanding_lists(&self) -> usize {
        self.max_outstanding_lists.load(Ordering::SeqCst)
    }

    /// Verifies that all expectations were consumed.
    pub fn verify(&self) {
        let remaining = self.lists.lock().unwrap().len()
            + self.corrections.lock().unwrap().len()
            + self.statuses.lock().unwrap().len()
            + self.orgs.lock().unwrap().len();
        if remaining != 0 {
            panic!("Not all expectations were met. {remaining} remaining");
        }
    }

    fn count(&self, pred: impl Fn(&Call) -> bool) -> usize {
        self.calls.lock().unwrap().iter().filter(|c| pred(c)).count()
    }

    fn record(&self, call: Call) {
        self.calls.lock().unwrap().push(call);
    }
}

async fn resolve<T>(queue: &Queue<T>, fallback: Option<T>, what: &str) -> Result<T, TransportError> {
    let next = queue.lock().unwrap().pop_front();
    match (next, fallback) {
        (Some(Expectation::Ready(response)), _) => response,
        (Some(Expectation::Held(rx)), _) => rx
            .await
            .unwrap_or_else(|_| Err(TransportError::Unavailable(format!("{what} gate dropped")))),
        (None, Some(value)) => Ok(value),
        (None, None) => panic!("Unexpected {what} call"),
    }
}

/// Decrements the outstanding counter however the call ends, including cancellation.
struct OutstandingGuard(Arc<AtomicUsize>);

impl Drop for OutstandingGuard {
    fn drop(&mut self) {
        self.0.fetch_sub(1, Ordering::SeqCst);
    }
}

#[async_trait]
impl OrderSource for MockOrderService {
    async fn list(&self, org: &OrgId, filter: StatusFilter) -> Result<Vec<Order>, TransportError> {
        self.record(Call::List {
            org: org.clone(),
            filter,
        });
        let now = self.outstanding_lists.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_outstanding_lists.fetch_max(now, Ordering::SeqCst);
        let _guard = OutstandingGuard(self.outstanding_lists.clone());

        let fallback = self.default_orders.lock().unwrap().clone();
        resolve(&self.lists, fallback, "list").await
    }
}

#[async_trait]
impl OrderSink for MockOrderService {
    async fn apply_correction(&self, correction: &Correction) -> Result<Order, TransportError> {
        self.record(Call::ApplyCorrection(correction.clone()));
        resolve(&self.corrections, None, "apply_correction").await
    }

    async fn set_status(&self, id: &OrderId, status: OrderStatus) -> Result<Order, TransportError> {
        self.record(Call::SetStatus {
            id: id.clone(),
            status,
        });
        resolve(&self.statuses, None, "set_status").await
    }
}

#[async_trait]
impl OrgInfo for MockOrderService {
    async fn get(&self) -> Result<Org, TransportError> {
        self.record(Call::GetOrg);
        resolve(&self.orgs, None, "org").await
    }
}
