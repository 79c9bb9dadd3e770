//! Order status values and the client-side transition rule.
//!
//! The client does not own a transition graph. It only refuses two things locally:
//! re-selecting the current status (no write at all) and targeting `delivered`,
//! which only the backend ever sets. Everything else is forwarded and the order
//! service decides whether the move is legal.

use serde::{Deserialize, Deserializer, Serialize};
use std::fmt::Display;
use std::str::FromStr;
use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum OrderStatus {
    Pending,
    Shipped,
    Paid,
    /// Terminal state set by the backend only.
    Delivered,
}

impl OrderStatus {
    pub const ALL: [OrderStatus; 4] = [
        OrderStatus::Pending,
        OrderStatus::Shipped,
        OrderStatus::Paid,
        OrderStatus::Delivered,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            OrderStatus::Pending => "pending",
            OrderStatus::Shipped => "shipped",
            OrderStatus::Paid => "paid",
            OrderStatus::Delivered => "delivered",
        }
    }

    /// Whether the client may request this status from the order service.
    pub fn is_client_settable(self) -> bool {
        !matches!(self, OrderStatus::Delivered)
    }
}

impl Display for OrderStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for OrderStatus {
    type Err = StatusError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        OrderStatus::ALL
            .into_iter()
            .find(|status| status.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| StatusError::Unknown(s.to_string()))
    }
}

/// Accepts any casing the backend sends, e.g. `"Paid"`.
impl<'de> Deserialize<'de> for OrderStatus {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        raw.parse().map_err(serde::de::Error::custom)
    }
}

/// Status filter sent with every list request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum StatusFilter {
    #[default]
    All,
    Only(OrderStatus),
}

impl StatusFilter {
    /// Query value for the list endpoint; `None` means no filtering.
    pub fn as_query(self) -> Option<&'static str> {
        match self {
            StatusFilter::All => None,
            StatusFilter::Only(status) => Some(status.as_str()),
        }
    }

    pub fn matches(self, status: OrderStatus) -> bool {
        match self {
            StatusFilter::All => true,
            StatusFilter::Only(wanted) => wanted == status,
        }
    }
}

impl Display for StatusFilter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_query().unwrap_or("all"))
    }
}

impl FromStr for StatusFilter {
    type Err = StatusError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.trim().eq_ignore_ascii_case("all") {
            return Ok(StatusFilter::All);
        }
        s.parse().map(StatusFilter::Only)
    }
}

#[derive(Debug, Clone, Error, PartialEq)]
pub enum StatusError {
    #[error("unknown order status: {0}")]
    Unknown(String),

    #[error("status {0} can only be set by the order service")]
    ServerOnly(OrderStatus),
}

/// Outcome of asking to move an order from `current` to `target`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transition {
    /// Target equals the current status: nothing to send.
    Unchanged,
    /// Forward this status to the order service.
    Apply(OrderStatus),
}

pub fn transition(current: OrderStatus, target: OrderStatus) -> Result<Transition, StatusError> {
    if current == target {
        return Ok(Transition::Unchanged);
    }
    if !target.is_client_settable() {
        return Err(StatusError::ServerOnly(target));
    }
    Ok(Transition::Apply(target))
}
