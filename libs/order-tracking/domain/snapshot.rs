//! Order snapshot model
//!
//! A snapshot is the full state of one order as last pushed by the server.
//! Every field is normalized on construction, so a held snapshot is always
//! fully defaulted. Snapshots are replaced wholesale, never patched.

use crate::error::{Result, TrackerError};
use chrono::{DateTime, NaiveDateTime, Utc};
use serde::Serialize;
use serde_json::{Map, Value};

/// Shown when the server sends no client name
pub const DEFAULT_CLIENT_NAME: &str = "No data";
/// Shown when the server sends no price
pub const DEFAULT_TOTAL_PRICE: &str = "0.00";

static NULL: Value = Value::Null;

/// Lifecycle status of an order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum OrderStatus {
    Pending,
    InProgress,
    Completed,
}

impl OrderStatus {
    /// Parse the wire label. Unknown labels fall back to `Pending`.
    pub fn from_wire(label: &str) -> Self {
        match label {
            "in_progress" => OrderStatus::InProgress,
            "completed" => OrderStatus::Completed,
            _ => OrderStatus::Pending,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            OrderStatus::Pending => "pending",
            OrderStatus::InProgress => "in_progress",
            OrderStatus::Completed => "completed",
        }
    }
}

impl std::fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One entry of `package_details`
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PackageDetail {
    pub name: Option<String>,
    /// Fields other than `name`, kept verbatim
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl PackageDetail {
    fn from_object(object: &Map<String, Value>) -> Self {
        let mut extra = object.clone();
        let name = extra
            .remove("name")
            .and_then(|v| text_of(&v))
            .filter(|s| !s.is_empty());
        Self { name, extra }
    }
}

/// Fields the progress projection depends on
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProjectionInputs {
    pub status: OrderStatus,
    pub started_at: Option<DateTime<Utc>>,
    pub total_duration_minutes: Option<u32>,
}

/// Normalized order data
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OrderSnapshot {
    pub id: i64,
    pub status: OrderStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub started_at: Option<DateTime<Utc>>,
    pub total_duration_minutes: Option<u32>,
    pub queue_position: u32,
    pub package_details: Vec<PackageDetail>,
    pub client_name: String,
    pub client_phone: String,
    pub employee_name: String,
    pub car_brand: String,
    pub car_model: String,
    pub car_license_plate: String,
    pub branch_phone: String,
    pub total_price: String,
}

impl OrderSnapshot {
    /// Normalize a decoded payload
    ///
    /// `created_fallback` and `updated_fallback` stand in for absent or
    /// unparsable timestamps. Fails only when the payload is not an object.
    pub fn from_value(
        value: &Value,
        created_fallback: DateTime<Utc>,
        updated_fallback: DateTime<Utc>,
    ) -> Result<Self> {
        let object = value.as_object().ok_or_else(|| {
            TrackerError::MalformedMessage(format!("expected JSON object, got {}", kind_of(value)))
        })?;

        let field = |key: &str| object.get(key).unwrap_or(&NULL);

        Ok(Self {
            id: integer_of(field("id")).unwrap_or(0),
            status: field("status")
                .as_str()
                .map(OrderStatus::from_wire)
                .unwrap_or(OrderStatus::Pending),
            created_at: timestamp_of(field("created_at")).unwrap_or(created_fallback),
            updated_at: timestamp_of(field("updated_at")).unwrap_or(updated_fallback),
            started_at: timestamp_of(field("started_at")),
            total_duration_minutes: minutes_of(field("total_duration")),
            queue_position: integer_of(field("queue_position"))
                .and_then(|n| u32::try_from(n).ok())
                .unwrap_or(0),
            package_details: field("package_details")
                .as_array()
                .map(|entries| {
                    entries
                        .iter()
                        .filter_map(Value::as_object)
                        .map(PackageDetail::from_object)
                        .collect()
                })
                .unwrap_or_default(),
            client_name: non_empty_text(field("client_name"))
                .unwrap_or_else(|| DEFAULT_CLIENT_NAME.to_string()),
            client_phone: text_of(field("client_phone")).unwrap_or_default(),
            employee_name: text_of(field("employee_name")).unwrap_or_default(),
            car_brand: text_of(field("car_brand")).unwrap_or_default(),
            car_model: text_of(field("car_model")).unwrap_or_default(),
            car_license_plate: text_of(field("car_license_plate")).unwrap_or_default(),
            branch_phone: text_of(field("branch_phone")).unwrap_or_default(),
            total_price: non_empty_text(field("total_price"))
                .unwrap_or_else(|| DEFAULT_TOTAL_PRICE.to_string()),
        })
    }

    /// Decode and normalize a raw text payload
    pub fn from_json(
        payload: &str,
        created_fallback: DateTime<Utc>,
        updated_fallback: DateTime<Utc>,
    ) -> Result<Self> {
        let value: Value = serde_json::from_str(payload)?;
        Self::from_value(&value, created_fallback, updated_fallback)
    }

    pub fn projection_inputs(&self) -> ProjectionInputs {
        ProjectionInputs {
            status: self.status,
            started_at: self.started_at,
            total_duration_minutes: self.total_duration_minutes,
        }
    }

    /// Name of the first package, if any
    pub fn package_name(&self) -> Option<&str> {
        self.package_details.first().and_then(|p| p.name.as_deref())
    }

    pub fn car_description(&self) -> String {
        [self.car_brand.as_str(), self.car_model.as_str()]
            .iter()
            .filter(|s| !s.is_empty())
            .copied()
            .collect::<Vec<_>>()
            .join(" ")
    }
}

fn kind_of(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

/// Strings pass through, numbers and booleans render as text
fn text_of(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

fn non_empty_text(value: &Value) -> Option<String> {
    text_of(value).filter(|s| !s.trim().is_empty())
}

fn integer_of(value: &Value) -> Option<i64> {
    match value {
        Value::Number(n) => n.as_i64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

fn minutes_of(value: &Value) -> Option<u32> {
    match value {
        Value::Number(n) => n
            .as_u64()
            .or_else(|| n.as_f64().filter(|f| *f >= 0.0).map(|f| f.floor() as u64))
            .and_then(|m| u32::try_from(m).ok()),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

/// RFC 3339, or a naive ISO 8601 timestamp taken as UTC
fn timestamp_of(value: &Value) -> Option<DateTime<Utc>> {
    let raw = value.as_str()?.trim();
    if raw.is_empty() {
        return None;
    }
    if let Ok(ts) = DateTime::parse_from_rfc3339(raw) {
        return Some(ts.with_timezone(&Utc));
    }
    NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S%.f")
        .or_else(|_| NaiveDateTime::parse_from_str(raw, "%Y-%m-%d %H:%M:%S%.f"))
        .ok()
        .map(|naive| naive.and_utc())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use serde_json::json;

    fn fallback() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap()
    }

    #[test]
    fn test_empty_object_is_fully_defaulted() {
        let snapshot = OrderSnapshot::from_value(&json!({}), fallback(), fallback()).unwrap();

        assert_eq!(snapshot.id, 0);
        assert_eq!(snapshot.status, OrderStatus::Pending);
        assert_eq!(snapshot.created_at, fallback());
        assert_eq!(snapshot.updated_at, fallback());
        assert_eq!(snapshot.started_at, None);
        assert_eq!(snapshot.total_duration_minutes, None);
        assert_eq!(snapshot.queue_position, 0);
        assert!(snapshot.package_details.is_empty());
        assert_eq!(snapshot.client_name, DEFAULT_CLIENT_NAME);
        assert_eq!(snapshot.client_phone, "");
        assert_eq!(snapshot.total_price, DEFAULT_TOTAL_PRICE);
    }

    #[test]
    fn test_wrong_types_normalize() {
        let payload = json!({
            "id": "42",
            "status": "exploded",
            "queue_position": -3,
            "package_details": "not a list",
            "total_price": 1500,
            "client_name": "",
            "client_phone": 996555123456u64,
            "started_at": "yesterday",
        });
        let snapshot = OrderSnapshot::from_value(&payload, fallback(), fallback()).unwrap();

        assert_eq!(snapshot.id, 42);
        assert_eq!(snapshot.status, OrderStatus::Pending);
        assert_eq!(snapshot.queue_position, 0);
        assert!(snapshot.package_details.is_empty());
        assert_eq!(snapshot.total_price, "1500");
        assert_eq!(snapshot.client_name, DEFAULT_CLIENT_NAME);
        assert_eq!(snapshot.client_phone, "996555123456");
        assert_eq!(snapshot.started_at, None);
    }

    #[test]
    fn test_numeric_strings_accepted_for_id_and_queue_position() {
        let payload = json!({"id": "17", "queue_position": " 3 "});
        let snapshot = OrderSnapshot::from_value(&payload, fallback(), fallback()).unwrap();
        assert_eq!(snapshot.id, 17);
        assert_eq!(snapshot.queue_position, 3);

        let negative = json!({"queue_position": "-2"});
        let snapshot = OrderSnapshot::from_value(&negative, fallback(), fallback()).unwrap();
        assert_eq!(snapshot.queue_position, 0);
    }

    #[test]
    fn test_fractional_queue_position_is_zero() {
        let snapshot =
            OrderSnapshot::from_value(&json!({"queue_position": 2.5}), fallback(), fallback())
                .unwrap();
        assert_eq!(snapshot.queue_position, 0);
    }

    #[test]
    fn test_full_payload() {
        let payload = json!({
            "id": 17,
            "status": "in_progress",
            "client_name": "Aibek",
            "client_phone": "996555123456",
            "employee_name": "Nurlan",
            "package_details": [{"name": "Complex wash", "price": 800}, 5, {"price": 1}],
            "total_price": "800.00",
            "created_at": "2024-05-01T10:00:00Z",
            "started_at": "2024-05-01T10:15:00+06:00",
            "updated_at": "2024-05-01T10:15:00.123456",
            "total_duration": 45,
            "queue_position": 0,
            "car_brand": "Toyota",
            "car_model": "Camry",
            "car_license_plate": "01KG123ABC",
            "branch_phone": "+996312000000",
        });
        let snapshot = OrderSnapshot::from_value(&payload, fallback(), fallback()).unwrap();

        assert_eq!(snapshot.id, 17);
        assert_eq!(snapshot.status, OrderStatus::InProgress);
        assert_eq!(
            snapshot.started_at,
            Some(Utc.with_ymd_and_hms(2024, 5, 1, 4, 15, 0).unwrap())
        );
        assert_eq!(snapshot.total_duration_minutes, Some(45));
        assert_eq!(snapshot.package_details.len(), 2);
        assert_eq!(snapshot.package_name(), Some("Complex wash"));
        assert_eq!(snapshot.package_details[0].extra.get("price"), Some(&json!(800)));
        assert_eq!(snapshot.package_details[1].name, None);
        assert_eq!(snapshot.car_description(), "Toyota Camry");
        assert_ne!(snapshot.updated_at, fallback());
    }

    #[test]
    fn test_non_object_is_malformed() {
        let err = OrderSnapshot::from_value(&json!([1, 2]), fallback(), fallback()).unwrap_err();
        assert!(matches!(err, TrackerError::MalformedMessage(_)));

        let err = OrderSnapshot::from_json("{not json", fallback(), fallback()).unwrap_err();
        assert!(matches!(err, TrackerError::MalformedMessage(_)));
    }

    #[test]
    fn test_status_labels() {
        assert_eq!(OrderStatus::from_wire("pending"), OrderStatus::Pending);
        assert_eq!(OrderStatus::from_wire("in_progress"), OrderStatus::InProgress);
        assert_eq!(OrderStatus::from_wire("completed"), OrderStatus::Completed);
        assert_eq!(OrderStatus::InProgress.to_string(), "in_progress");
    }
}
