//! Query and count views over a snapshot. Pure functions, recomputed on demand.

use crate::model::{Order, OrderStatus};
use crate::sync::Snapshot;

/// Orders whose customer identity, raw text or rendered items contain `query`,
/// ignoring case. A blank query returns every order. Snapshot order is kept.
pub fn filter<'a>(snapshot: &'a Snapshot, query: &str) -> Vec<&'a Order> {
    let needle = query.trim().to_lowercase();
    if needle.is_empty() {
        return snapshot.orders().iter().collect();
    }
    snapshot
        .orders()
        .iter()
        .filter(|order| haystack(order).contains(&needle))
        .collect()
}

fn haystack(order: &Order) -> String {
    let mut text = String::new();
    for field in [&order.customer_name, &order.source_phone, &order.raw_text]
        .into_iter()
        .flatten()
    {
        text.push_str(field);
        text.push(' ');
    }
    for item in &order.items {
        text.push_str(&item.render());
        text.push(' ');
    }
    text.to_lowercase()
}

/// Per-status totals for the filter tabs.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StatusCounts {
    pub all: usize,
    pub pending: usize,
    pub shipped: usize,
    pub paid: usize,
    pub delivered: usize,
}

impl StatusCounts {
    pub fn get(&self, status: OrderStatus) -> usize {
        match status {
            OrderStatus::Pending => self.pending,
            OrderStatus::Shipped => self.shipped,
            OrderStatus::Paid => self.paid,
            OrderStatus::Delivered => self.delivered,
        }
    }
}

pub fn status_counts(snapshot: &Snapshot) -> StatusCounts {
    snapshot
        .orders()
        .iter()
        .fold(StatusCounts::default(), |mut counts, order| {
            counts.all += 1;
            match order.status {
                OrderStatus::Pending => counts.pending += 1,
                OrderStatus::Shipped => counts.shipped += 1,
                OrderStatus::Paid => counts.paid += 1,
                OrderStatus::Delivered => counts.delivered += 1,
            }
            counts
        })
}
