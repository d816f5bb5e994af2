use serde::Serialize;

use crate::codec::Value;
use crate::endpoint::Endpoint;

/// The category of a decoded event, carried as `kind` in the JSONL record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum EventKind {
    Query,
    Prepare,
    Execute,
    Close,
    PrepareOk,
    Row,
    Order,
    /// A command with no dedicated handling (anything other than QUERY,
    /// STMT_PREPARE, STMT_EXECUTE, STMT_CLOSE).
    Cmd,
}

/// Which order-tracking table an `ORDER` event was extracted from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum OrderKind {
    TbOrder,
    TbSuborder,
}

/// One structured record emitted by the decoder (and annotated in place by
/// the classifier). Produced by value and handed to sinks; never shared.
#[derive(Debug, Clone, Serialize)]
pub struct Event {
    pub ts: String,
    pub src: Endpoint,
    pub dst: Endpoint,
    pub tx_id: String,
    pub kind: EventKind,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub full_query: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub query: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub params: Option<Vec<Value>>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub rows: Option<Vec<Value>>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub unknown_stmt: Option<bool>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub order_kind: Option<OrderKind>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub seat_no: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub total_price: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub order_time: Option<String>,
}

impl Event {
    pub fn new(ts: String, src: Endpoint, dst: Endpoint, tx_id: String, kind: EventKind) -> Self {
        Event {
            ts,
            src,
            dst,
            tx_id,
            kind,
            full_query: None,
            query: None,
            params: None,
            rows: None,
            unknown_stmt: None,
            order_kind: None,
            seat_no: None,
            total_price: None,
            order_time: None,
        }
    }

    /// A short human-readable line for the structured-line sink's `summary` field.
    pub fn summary(&self) -> String {
        match self.kind {
            EventKind::Query | EventKind::Prepare => self
                .full_query
                .clone()
                .unwrap_or_else(|| "<no query>".to_string()),
            EventKind::Execute => self
                .query
                .clone()
                .unwrap_or_else(|| "<unknown statement>".to_string()),
            EventKind::Close => format!("CLOSE tx_id={}", self.tx_id),
            EventKind::PrepareOk => format!("PREPARE_OK tx_id={}", self.tx_id),
            EventKind::Row => format!("ROW {} value(s)", self.rows.as_ref().map_or(0, Vec::len)),
            EventKind::Order => format!(
                "ORDER {:?} seat={:?} total={:?}",
                self.order_kind, self.seat_no, self.total_price
            ),
            EventKind::Cmd => format!("CMD tx_id={}", self.tx_id),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::net::IpAddr;

    fn ep(port: u16) -> Endpoint {
        Endpoint::new("127.0.0.1".parse::<IpAddr>().unwrap(), port)
    }

    #[test]
    fn query_event_serializes_full_query_but_not_unset_fields() {
        let mut e = Event::new(
            "2024-01-01 00:00:00.000000".to_string(),
            ep(1),
            ep(3306),
            "abcd1234".to_string(),
            EventKind::Query,
        );
        e.full_query = Some("SELECT 1".to_string());
        let json = serde_json::to_string(&e).unwrap();
        assert!(json.contains("\"full_query\":\"SELECT 1\""));
        assert!(!json.contains("params"));
        assert!(!json.contains("order_kind"));
    }

    #[test]
    fn value_null_serializes_as_json_null() {
        let json = serde_json::to_string(&Value::Null).unwrap();
        assert_eq!(json, "null");
    }
}
