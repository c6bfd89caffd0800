//! Conversion of raw store records into [`Event`]s.

use serde_json::{Map, Value};

use crate::types::{from_millis, Event, EventRecord};

/// Parses a raw message into an event body.
///
/// A JSON object becomes the body verbatim. Anything else, including valid
/// JSON that is not an object, becomes `{"message": <raw text>}`.
#[must_use]
pub fn parse_body(message: &str) -> Map<String, Value> {
    match serde_json::from_str::<Value>(message) {
        Ok(Value::Object(body)) => body,
        _ => {
            let mut body = Map::with_capacity(1);
            body.insert("message".to_string(), Value::String(message.to_string()));
            body
        }
    }
}

/// Normalizes a filter-call record into an [`Event`] owned by `group`.
#[must_use]
pub fn normalize(record: EventRecord, group: &str) -> Event {
    let body = parse_body(&record.message);

    Event {
        id: record.event_id,
        stream: record.stream_name,
        group: group.to_string(),
        ingested_at: from_millis(record.ingestion_time),
        created_at: from_millis(record.timestamp),
        body,
    }
}

impl Event {
    /// Normalizes a filter-call record. See [`normalize`].
    #[must_use]
    pub fn from_record(record: EventRecord, group: &str) -> Self {
        normalize(record, group)
    }
}
