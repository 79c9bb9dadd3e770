use crate::model::{Order, OrderId, StatusFilter};
use chrono::{DateTime, Utc};
use std::collections::HashMap;

/// The client's full view of one organization's orders.
///
/// Orders keep the order the backend returned them in. A snapshot is never edited
/// after it has been published; the controller builds a new one and swaps it in.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Snapshot {
    orders: Vec<Order>,
    index: HashMap<OrderId, usize>,
    /// Incremented on every replacement.
    pub version: u64,
    /// When the backend produced the orders, `None` until the first fetch lands.
    pub fetched_at: Option<DateTime<Utc>>,
}

impl Snapshot {
    pub fn new(orders: Vec<Order>, version: u64, fetched_at: Option<DateTime<Utc>>) -> Self {
        let mut snapshot = Self {
            orders: Vec::with_capacity(orders.len()),
            index: HashMap::with_capacity(orders.len()),
            version,
            fetched_at,
        };
        for order in orders {
            // a duplicate id keeps its first position and takes the later content
            match snapshot.index.get(&order.id) {
                Some(&pos) => snapshot.orders[pos] = order,
                None => {
                    snapshot.index.insert(order.id.clone(), snapshot.orders.len());
                    snapshot.orders.push(order);
                }
            }
        }
        snapshot
    }

    pub fn orders(&self) -> &[Order] {
        &self.orders
    }

    pub fn get(&self, id: &OrderId) -> Option<&Order> {
        self.index.get(id).map(|&pos| &self.orders[pos])
    }

    pub fn len(&self) -> usize {
        self.orders.len()
    }

    pub fn is_empty(&self) -> bool {
        self.orders.is_empty()
    }

    /// A copy with `order` replacing the entry of the same id, or removed when
    /// `keep` is false. Returns `None` if the id is not part of this snapshot.
    pub(crate) fn with_entry(&self, order: Order, keep: bool) -> Option<Snapshot> {
        self.get(&order.id)?;
        let orders = self
            .orders
            .iter()
            .filter_map(|existing| {
                if existing.id != order.id {
                    Some(existing.clone())
                } else if keep {
                    Some(order.clone())
                } else {
                    None
                }
            })
            .collect();
        Some(Snapshot::new(orders, self.version + 1, self.fetched_at))
    }
}

/// How a refresh presents itself to readers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum RefreshMode {
    /// Background refresh; readers keep the current view and see `refreshing`.
    Soft,
    /// Blocking refresh; readers see `loading` until the snapshot lands.
    Hard,
}

/// What happened to a refresh a caller waited on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RefreshOutcome {
    /// A new snapshot with this version was published.
    Applied { version: u64 },
    /// The result was dropped because the filter changed before it arrived.
    Discarded,
}

/// Everything readers of the controller can observe, published as one value.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SyncState {
    pub snapshot: Snapshot,
    pub filter: StatusFilter,
    /// A hard refresh is pending; show a placeholder instead of the snapshot.
    pub loading: bool,
    /// A soft refresh is pending; keep showing the snapshot.
    pub refreshing: bool,
    /// Message of the last failed refresh, cleared by the next successful one.
    pub last_error: Option<String>,
    /// Number of poll ticks seen so far.
    pub ticks: u64,
}
