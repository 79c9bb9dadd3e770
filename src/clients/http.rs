//! HTTP+JSON implementation of the backend collaborators.

use crate::clients::{OrderSink, OrderSource, OrgInfo, TransportError};
use crate::lifecycle::Settings;
use crate::model::{Correction, Order, OrderId, OrderStatus, Org, OrgId, StatusFilter};
use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderName, HeaderValue, AUTHORIZATION};
use reqwest::{Client, Response};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::time::Duration;
use tracing::{debug, instrument, warn};

const TUNNEL_WARNING_HEADER: &str = "ngrok-skip-browser-warning";

/// Talks to the order backend with an explicit bearer credential.
///
/// The credential comes from [`Settings`]; nothing here reads ambient storage.
#[derive(Clone)]
pub struct HttpOrderService {
    http: Client,
    api_base: String,
    list_limit: u32,
}

#[derive(Serialize)]
struct AiFixBody<'a> {
    human_fixed: &'a Correction,
}

#[derive(Serialize)]
struct StatusBody {
    status: OrderStatus,
}

impl HttpOrderService {
    pub fn new(
        api_base: &str,
        token: Option<&str>,
        list_limit: u32,
        timeout: Duration,
    ) -> Result<Self, TransportError> {
        let mut headers = HeaderMap::new();
        headers.insert(
            HeaderName::from_static(TUNNEL_WARNING_HEADER),
            HeaderValue::from_static("true"),
        );
        if let Some(token) = token.filter(|t| !t.is_empty()) {
            let mut value = HeaderValue::from_str(&format!("Bearer {token}"))
                .map_err(|e| TransportError::Http(format!("invalid bearer token: {e}")))?;
            value.set_sensitive(true);
            headers.insert(AUTHORIZATION, value);
        }
        let http = Client::builder()
            .default_headers(headers)
            .timeout(timeout)
            .build()?;
        Ok(Self {
            http,
            api_base: api_base.trim_end_matches('/').to_string(),
            list_limit,
        })
    }

    pub fn from_settings(settings: &Settings) -> Result<Self, TransportError> {
        Self::new(
            &settings.api_base,
            settings.token.as_deref(),
            settings.list_limit,
            settings.request_timeout(),
        )
    }

    fn url(&self, path: &str) -> String {
        format!("{}{path}", self.api_base)
    }
}

async fn read_json<T: DeserializeOwned>(response: Response) -> Result<T, TransportError> {
    let status = response.status();
    let body = response.bytes().await?;
    if !status.is_success() {
        return Err(TransportError::Status {
            status: status.as_u16(),
            body: String::from_utf8_lossy(&body).into_owned(),
        });
    }
    Ok(serde_json::from_slice(&body)?)
}

#[async_trait]
impl OrderSource for HttpOrderService {
    #[instrument(skip_all, fields(org = %org, filter = %filter))]
    async fn list(&self, org: &OrgId, filter: StatusFilter) -> Result<Vec<Order>, TransportError> {
        let mut query = vec![("limit", self.list_limit.to_string())];
        if let Some(status) = filter.as_query() {
            query.push(("status", status.to_string()));
        }
        let response = self
            .http
            .get(self.url(&format!("/api/admin/orgs/{org}/orders")))
            .query(&query)
            .send()
            .await?;

        let body: serde_json::Value = read_json(response).await?;
        let serde_json::Value::Array(rows) = body else {
            warn!("order list response is not an array, treating as empty");
            return Ok(Vec::new());
        };
        // one malformed row must not hide the rest of the list
        let total = rows.len();
        let orders: Vec<Order> = rows
            .into_iter()
            .filter_map(|row| {
                let id = row.get("id").cloned();
                serde_json::from_value(row)
                    .map_err(|e| warn!(?id, error = %e, "Skipping undecodable order"))
                    .ok()
            })
            .collect();
        debug!(count = orders.len(), skipped = total - orders.len(), "Listed orders");
        Ok(orders)
    }
}

#[async_trait]
impl OrderSink for HttpOrderService {
    #[instrument(skip_all, fields(order_id = %correction.order_id))]
    async fn apply_correction(&self, correction: &Correction) -> Result<Order, TransportError> {
        debug!(?correction, "Sending correction");
        let response = self
            .http
            .post(self.url(&format!("/api/orders/{}/ai-fix", correction.order_id)))
            .json(&AiFixBody {
                human_fixed: correction,
            })
            .send()
            .await?;
        read_json(response).await
    }

    #[instrument(skip_all, fields(order_id = %id, status = %status))]
    async fn set_status(&self, id: &OrderId, status: OrderStatus) -> Result<Order, TransportError> {
        let response = self
            .http
            .post(self.url(&format!("/api/orders/{id}/status")))
            .json(&StatusBody { status })
            .send()
            .await?;
        read_json(response).await
    }
}

#[async_trait]
impl OrgInfo for HttpOrderService {
    #[instrument(skip_all)]
    async fn get(&self) -> Result<Org, TransportError> {
        let response = self.http.get(self.url("/api/org/me")).send().await?;
        read_json(response).await
    }
}
