use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use std::fmt::Display;

use super::OrderStatus;

/// Reason attached to a correction when the operator leaves it blank.
pub const DEFAULT_CORRECTION_REASON: &str = "human_fix";

/// Opaque identifier assigned to an order by the backend.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct OrderId(pub String);

impl From<&str> for OrderId {
    fn from(id: &str) -> Self {
        Self(id.to_string())
    }
}

impl From<String> for OrderId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

impl Display for OrderId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Identifier of the organization (merchant workspace) whose orders are mirrored.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct OrgId(pub String);

impl From<&str> for OrgId {
    fn from(id: &str) -> Self {
        Self(id.to_string())
    }
}

impl Display for OrgId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// One line of a parsed order.
///
/// `canonical` is the resolved product label, `name` the raw fallback. Callers should
/// not branch on which one is present; use [`Item::label`] instead.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Item {
    #[serde(default = "default_qty", deserialize_with = "qty_or_default")]
    pub qty: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub unit: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub canonical: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
}

fn default_qty() -> f64 {
    1.0
}

/// Numbers and numeric strings are taken as is; null or anything else means 1.
fn qty_or_default<'de, D>(deserializer: D) -> Result<f64, D::Error>
where
    D: Deserializer<'de>,
{
    let qty = match Option::<Value>::deserialize(deserializer)? {
        Some(Value::Number(n)) => n.as_f64(),
        Some(Value::String(s)) => s.trim().parse().ok(),
        _ => None,
    };
    Ok(qty.filter(|q| q.is_finite()).unwrap_or_else(default_qty))
}

impl Item {
    /// Builds an item with a resolved label.
    pub fn canonical(qty: f64, unit: Option<&str>, canonical: impl Into<String>) -> Self {
        Self {
            qty,
            unit: unit.map(str::to_string),
            canonical: Some(canonical.into()),
            name: None,
        }
    }

    /// The display label: canonical when present and non-empty, else the raw name.
    pub fn label(&self) -> &str {
        [self.canonical.as_deref(), self.name.as_deref()]
            .into_iter()
            .flatten()
            .find(|label| !label.is_empty())
            .unwrap_or("")
    }

    /// Renders the item as `qty unit label`, the same shape the line parser accepts.
    pub fn render(&self) -> String {
        let mut out = self.qty.to_string();
        if let Some(unit) = self.unit.as_deref().filter(|u| !u.is_empty()) {
            out.push(' ');
            out.push_str(unit);
        }
        out.push(' ');
        out.push_str(self.label());
        out.trim().to_string()
    }
}

/// One unit of customer intent, as served by the backend.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Order {
    pub id: OrderId,
    pub created_at: DateTime<Utc>,
    pub status: OrderStatus,
    #[serde(default)]
    pub customer_name: Option<String>,
    #[serde(default)]
    pub source_phone: Option<String>,
    #[serde(default)]
    pub raw_text: Option<String>,
    #[serde(default)]
    pub audio_url: Option<String>,
    #[serde(default, deserialize_with = "items_or_empty")]
    pub items: Vec<Item>,
    #[serde(default)]
    pub parse_reason: Option<String>,
}

fn items_or_empty<'de, D>(deserializer: D) -> Result<Vec<Item>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<Vec<Item>>::deserialize(deserializer)?.unwrap_or_default())
}

impl Order {
    /// Creates a pending order with no items, mostly useful for tests and fixtures.
    pub fn new(id: impl Into<OrderId>, created_at: DateTime<Utc>) -> Self {
        Self {
            id: id.into(),
            created_at,
            status: OrderStatus::Pending,
            customer_name: None,
            source_phone: None,
            raw_text: None,
            audio_url: None,
            items: Vec::new(),
            parse_reason: None,
        }
    }

    /// Name shown for the customer: their name, else the sending phone number.
    pub fn customer_label(&self) -> &str {
        [self.customer_name.as_deref(), self.source_phone.as_deref()]
            .into_iter()
            .flatten()
            .find(|who| !who.is_empty())
            .unwrap_or("Customer")
    }

    /// Items rendered on a single line, separated by a middle dot.
    pub fn items_display(&self) -> String {
        self.items
            .iter()
            .map(Item::render)
            .collect::<Vec<_>>()
            .join(" · ")
    }

    /// Current items, one per line, ready to be edited into a correction.
    pub fn correction_draft(&self) -> String {
        self.items
            .iter()
            .map(Item::render)
            .collect::<Vec<_>>()
            .join("\n")
    }
}

/// A human fix for an order: the complete replacement item list.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Correction {
    #[serde(skip)]
    pub order_id: OrderId,
    pub items: Vec<Item>,
    pub reason: String,
}

impl Correction {
    pub fn new(order_id: OrderId, items: Vec<Item>, reason: Option<&str>) -> Self {
        let reason = reason
            .map(str::trim)
            .filter(|r| !r.is_empty())
            .unwrap_or(DEFAULT_CORRECTION_REASON)
            .to_string();
        Self {
            order_id,
            items,
            reason,
        }
    }
}

/// Organization metadata. Read once by the surrounding application.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Org {
    pub id: OrgId,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub plan: Option<String>,
    #[serde(default)]
    pub wa_phone_number_id: Option<String>,
}

/// Coarse relative age of a timestamp: `42s ago`, `5m ago`, `3h ago`, `2d ago`.
pub fn time_ago(at: DateTime<Utc>, now: DateTime<Utc>) -> String {
    let secs = (now - at).num_seconds().max(1);
    if secs < 60 {
        return format!("{secs}s ago");
    }
    let mins = secs / 60;
    if mins < 60 {
        return format!("{mins}m ago");
    }
    let hours = mins / 60;
    if hours < 24 {
        return format!("{hours}h ago");
    }
    format!("{}d ago", hours / 24)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};

    fn at() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 5, 1, 9, 30, 0).unwrap()
    }

    #[test]
    fn label_prefers_canonical_over_name() {
        let item = Item {
            qty: 1.0,
            unit: None,
            canonical: Some("flour".into()),
            name: Some("atta".into()),
        };
        assert_eq!(item.label(), "flour");

        let raw = Item {
            canonical: Some(String::new()),
            ..item.clone()
        };
        assert_eq!(raw.label(), "atta");
    }

    #[test]
    fn render_drops_missing_unit_and_trailing_zero() {
        assert_eq!(Item::canonical(3.0, Some("kg"), "flour").render(), "3 kg flour");
        assert_eq!(Item::canonical(2.5, None, "milk").render(), "2.5 milk");
    }

    #[test]
    fn order_display_helpers() {
        let mut order = Order::new("o1", at());
        order.source_phone = Some("+911234".into());
        order.items = vec![
            Item::canonical(2.0, Some("kg"), "rice"),
            Item::canonical(1.0, None, "bread"),
        ];

        assert_eq!(order.customer_label(), "+911234");
        assert_eq!(order.items_display(), "2 kg rice · 1 bread");
        assert_eq!(order.correction_draft(), "2 kg rice\n1 bread");
    }

    #[test]
    fn deserializes_backend_order_with_sparse_items() {
        let json = r#"{
            "id": "ord_7",
            "created_at": "2024-05-01T09:30:00Z",
            "status": "shipped",
            "customer_name": "Asha",
            "items": [{"qty": null, "name": "sugar"}, {"qty": 2, "unit": "ltr", "canonical": "milk"}],
            "parse_reason": "human_fix"
        }"#;
        let order: Order = serde_json::from_str(json).unwrap();

        assert_eq!(order.status, OrderStatus::Shipped);
        assert_eq!(order.items[0].qty, 1.0);
        assert_eq!(order.items[0].label(), "sugar");
        assert_eq!(order.items[1].render(), "2 ltr milk");
        assert_eq!(order.raw_text, None);
    }

    #[test]
    fn qty_accepts_numeric_strings() {
        let items: Vec<Item> = serde_json::from_str(
            r#"[{"qty": "2.5", "canonical": "milk"}, {"qty": "a few", "name": "eggs"}, {"qty": true, "name": "salt"}]"#,
        )
        .unwrap();
        assert_eq!(items[0].qty, 2.5);
        assert_eq!(items[1].qty, 1.0);
        assert_eq!(items[2].qty, 1.0);
    }

    #[test]
    fn correction_reason_defaults_when_blank() {
        let c = Correction::new("o1".into(), vec![], Some("   "));
        assert_eq!(c.reason, DEFAULT_CORRECTION_REASON);

        let c = Correction::new("o1".into(), vec![], Some("wrong unit"));
        assert_eq!(c.reason, "wrong unit");
    }

    #[test]
    fn time_ago_buckets() {
        let now = at();
        assert_eq!(time_ago(now, now), "1s ago");
        assert_eq!(time_ago(now - Duration::seconds(59), now), "59s ago");
        assert_eq!(time_ago(now - Duration::minutes(5), now), "5m ago");
        assert_eq!(time_ago(now - Duration::hours(3), now), "3h ago");
        assert_eq!(time_ago(now - Duration::days(2), now), "2d ago");
    }
}
