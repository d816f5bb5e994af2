use std::time::Duration;

use decoder::event::{Event, EventKind};

use crate::EventSink;

/// Posts `ORDER` events to a configured URL with a short timeout. Every
/// other event kind is ignored. A failed POST is logged and dropped —
/// it never blocks or panics the decoder.
pub struct HttpSink {
    client: reqwest::blocking::Client,
    url: String,
}

impl HttpSink {
    pub fn new(url: impl Into<String>, timeout: Duration) -> Self {
        let client = reqwest::blocking::Client::builder()
            .timeout(timeout)
            .build()
            .unwrap_or_else(|_| reqwest::blocking::Client::new());
        HttpSink {
            client,
            url: url.into(),
        }
    }
}

impl EventSink for HttpSink {
    fn name(&self) -> &'static str {
        "http"
    }

    fn handle(&mut self, event: &Event) {
        if event.kind != EventKind::Order {
            return;
        }
        let result = self.client.post(&self.url).json(event).send();
        match result {
            Ok(resp) if !resp.status().is_success() => {
                tracing::warn!(
                    "http sink: POST {} returned status {}",
                    self.url,
                    resp.status()
                );
            }
            Err(e) => {
                tracing::warn!("http sink: POST {} failed: {e}", self.url);
            }
            Ok(_) => {}
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use decoder::endpoint::Endpoint;
    use std::net::IpAddr;

    fn ep(port: u16) -> Endpoint {
        Endpoint::new("127.0.0.1".parse::<IpAddr>().unwrap(), port)
    }

    #[test]
    fn non_order_events_are_ignored_without_network_access() {
        // unroutable address: if handle() tried to send, this would hang past
        // the short timeout instead of returning immediately.
        let mut sink = HttpSink::new("http://127.0.0.1:1", Duration::from_millis(50));
        let event = Event::new(
            "2024-01-01 00:00:00.000000".to_string(),
            ep(1),
            ep(3306),
            "abcd1234".to_string(),
            EventKind::Query,
        );
        sink.handle(&event);
    }
}
