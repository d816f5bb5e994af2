use common::config::ClassifierConfig;

use crate::codec::Value;
use crate::event::{Event, EventKind, OrderKind};

/// Inspects `QUERY`/`EXECUTE` events and tags the ones that represent a
/// business-level order, extracting seat/price/time fields from the
/// parameter vector by the site's configured positional convention.
pub struct EventClassifier {
    config: ClassifierConfig,
}

impl EventClassifier {
    pub fn new(config: ClassifierConfig) -> Self {
        EventClassifier { config }
    }

    /// Normalizes a query the same way regardless of which table/verb it
    /// references: strips bracket/backtick quoting, collapses whitespace,
    /// lowercases.
    pub fn normalize(query: &str) -> String {
        let stripped: String = query
            .chars()
            .filter(|c| !matches!(c, '[' | ']' | '`'))
            .collect();
        let collapsed = stripped.split_whitespace().collect::<Vec<_>>().join(" ");
        collapsed.to_lowercase()
    }

    fn order_kind(&self, normalized: &str) -> Option<OrderKind> {
        if self
            .config
            .suborder_table_tokens
            .iter()
            .any(|t| normalized.contains(t.as_str()))
        {
            return Some(OrderKind::TbSuborder);
        }
        if self
            .config
            .order_table_tokens
            .iter()
            .any(|t| normalized.contains(t.as_str()))
        {
            return Some(OrderKind::TbOrder);
        }
        None
    }

    fn is_order_verb(&self, normalized: &str) -> bool {
        self.config
            .verb_tokens
            .iter()
            .any(|v| normalized.contains(v.as_str()))
    }

    /// Given a just-produced `QUERY`/`EXECUTE` event, returns a tagged
    /// `ORDER` event if it qualifies, or `None` otherwise. Leaves `event`
    /// itself untouched — callers forward both to the sink.
    pub fn classify(&self, event: &Event) -> Option<Event> {
        if !matches!(event.kind, EventKind::Query | EventKind::Execute) {
            return None;
        }
        let query = event.query.as_deref().or(event.full_query.as_deref())?;
        let normalized = Self::normalize(query);
        let order_kind = self.order_kind(&normalized)?;
        if !self.is_order_verb(&normalized) {
            return None;
        }

        let mut tagged = event.clone();
        tagged.kind = EventKind::Order;
        tagged.order_kind = Some(order_kind);
        tagged.seat_no = Some(self.extract_seat_no(event.params.as_deref()));
        tagged.total_price = Some(self.extract_total_price(event.params.as_deref()));
        tagged.order_time = Some(self.extract_order_time(event.params.as_deref()));
        Some(tagged)
    }

    fn extract_seat_no(&self, params: Option<&[Value]>) -> String {
        let idx = self.config.seat_no_index;
        match params.and_then(|p| p.get(idx)) {
            Some(v) => match value_as_text(v) {
                Some(s) => format!("{}번", s),
                None => "N/A".to_string(),
            },
            None => "N/A".to_string(),
        }
    }

    fn extract_total_price(&self, params: Option<&[Value]>) -> String {
        let idx = self.config.total_price_index;
        match params.and_then(|p| p.get(idx)) {
            Some(v) => match value_as_i64(v) {
                Some(n) => format!("{}원", group_thousands(n)),
                None => "0원".to_string(),
            },
            None => "0원".to_string(),
        }
    }

    fn extract_order_time(&self, params: Option<&[Value]>) -> String {
        let idx = self.config.order_time_index;
        match params.and_then(|p| p.get(idx)) {
            Some(v) => value_as_text(v).unwrap_or_else(|| "N/A".to_string()),
            None => "N/A".to_string(),
        }
    }
}

fn value_as_text(v: &Value) -> Option<String> {
    match v {
        Value::Str(s) => Some(s.clone()),
        Value::Int(i) => Some(i.to_string()),
        Value::Float(f) => Some(f.to_string()),
        Value::Double(d) => Some(d.to_string()),
        _ => None,
    }
}

fn value_as_i64(v: &Value) -> Option<i64> {
    match v {
        Value::Int(i) => Some(*i),
        Value::Str(s) => s.trim().parse::<i64>().ok(),
        Value::Float(f) => Some(*f as i64),
        Value::Double(d) => Some(*d as i64),
        _ => None,
    }
}

fn group_thousands(n: i64) -> String {
    let negative = n < 0;
    let digits = n.unsigned_abs().to_string();
    let mut grouped = String::new();
    for (i, c) in digits.chars().rev().enumerate() {
        if i != 0 && i % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(c);
    }
    let grouped: String = grouped.chars().rev().collect();
    if negative {
        format!("-{}", grouped)
    } else {
        grouped
    }
}
