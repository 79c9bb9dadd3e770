use crate::clients::TransportError;
use crate::model::{Correction, Order, OrderId, OrderStatus, Org, OrgId, StatusFilter};
use async_trait::async_trait;

/// Read side of the order backend.
#[async_trait]
pub trait OrderSource: Send + Sync {
    /// Current orders of `org`, optionally restricted to one status.
    async fn list(&self, org: &OrgId, filter: StatusFilter) -> Result<Vec<Order>, TransportError>;
}

/// Write side of the order backend. Both calls return the authoritative order.
#[async_trait]
pub trait OrderSink: Send + Sync {
    async fn apply_correction(&self, correction: &Correction) -> Result<Order, TransportError>;

    async fn set_status(&self, id: &OrderId, status: OrderStatus) -> Result<Order, TransportError>;
}

/// Organization metadata for the authenticated merchant.
#[async_trait]
pub trait OrgInfo: Send + Sync {
    async fn get(&self) -> Result<Org, TransportError>;
}
