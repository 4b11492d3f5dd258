// mpv JSON IPC message shapes.
//
// Requests are `{"command": [...], "request_id": N}` lines. Replies echo the
// request id with an `error` string ("success" on success) and optional
// `data`. Events carry an `event` name and event-specific fields.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::engine::backend::{EndReason, Notification, PropertyValue};

/// mpv's error string for a property that currently has no value.
pub(crate) const PROPERTY_UNAVAILABLE: &str = "property unavailable";
pub(crate) const SUCCESS: &str = "success";

#[derive(Debug, Serialize)]
pub(crate) struct Request<'a> {
    pub command: &'a [Value],
    pub request_id: u64,
}

/// Outcome of a request: `Ok(data)` on success, `Err(error string)` otherwise.
pub(crate) type Reply = Result<Option<Value>, String>;

#[derive(Debug, Default, Deserialize)]
struct RawMessage {
    #[serde(default)]
    event: Option<String>,
    #[serde(default)]
    request_id: Option<u64>,
    #[serde(default)]
    error: Option<String>,
    #[serde(default)]
    data: Option<Value>,
    #[serde(default)]
    reason: Option<String>,
    #[serde(default)]
    name: Option<String>,
}

/// A decoded line from the IPC socket.
#[derive(Debug, PartialEq)]
pub(crate) enum Incoming {
    Reply { request_id: u64, reply: Reply },
    Event(Notification),
}

/// Decode one line. `Ok(None)` for messages that are neither a reply nor
/// an event.
pub(crate) fn parse_line(line: &str) -> Result<Option<Incoming>, serde_json::Error> {
    let raw: RawMessage = serde_json::from_str(line)?;

    if let Some(event) = raw.event {
        return Ok(Some(Incoming::Event(to_notification(
            &event,
            raw.reason.as_deref(),
            raw.name,
        ))));
    }

    let Some(request_id) = raw.request_id else {
        return Ok(None);
    };
    let reply = match raw.error.as_deref() {
        Some(SUCCESS) | None => Ok(raw.data.filter(|d| !d.is_null())),
        Some(other) => Err(other.to_owned()),
    };
    Ok(Some(Incoming::Reply { request_id, reply }))
}

fn to_notification(event: &str, reason: Option<&str>, name: Option<String>) -> Notification {
    match event {
        "start-file" => Notification::StartFile,
        "end-file" => Notification::EndFile {
            reason: EndReason::from_name(reason.unwrap_or_default()),
        },
        "idle" => Notification::Idle,
        "property-change" => Notification::PropertyChange {
            property: name.unwrap_or_default(),
        },
        "shutdown" => Notification::Shutdown,
        other => Notification::Other(other.to_owned()),
    }
}

/// JSON value to typed property. `None` for null or structured values.
pub(crate) fn to_property_value(value: Value) -> Option<PropertyValue> {
    match value {
        Value::Bool(b) => Some(PropertyValue::Flag(b)),
        Value::Number(n) => n
            .as_i64()
            .map(PropertyValue::Int)
            .or_else(|| n.as_f64().map(PropertyValue::Double)),
        Value::String(s) => Some(PropertyValue::Text(s)),
        Value::Null | Value::Array(_) | Value::Object(_) => None,
    }
}

pub(crate) fn from_property_value(value: PropertyValue) -> Value {
    match value {
        PropertyValue::Flag(b) => Value::Bool(b),
        PropertyValue::Int(i) => Value::from(i),
        PropertyValue::Double(d) => Value::from(d),
        PropertyValue::Text(s) => Value::String(s),
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]

    use serde_json::json;

    use super::*;

    #[test]
    fn success_reply_with_data() {
        let parsed = parse_line(r#"{"data":42.5,"error":"success","request_id":7}"#).unwrap();
        assert_eq!(
            parsed,
            Some(Incoming::Reply {
                request_id: 7,
                reply: Ok(Some(json!(42.5)))
            })
        );
    }

    #[test]
    fn unavailable_property_reply() {
        let parsed = parse_line(r#"{"error":"property unavailable","request_id":3}"#).unwrap();
        assert_eq!(
            parsed,
            Some(Incoming::Reply {
                request_id: 3,
                reply: Err(PROPERTY_UNAVAILABLE.to_owned())
            })
        );
    }

    #[test]
    fn end_file_event_carries_reason() {
        let parsed = parse_line(r#"{"event":"end-file","reason":"eof","playlist_entry_id":1}"#)
            .unwrap();
        assert_eq!(
            parsed,
            Some(Incoming::Event(Notification::EndFile {
                reason: EndReason::Eof
            }))
        );
    }

    #[test]
    fn unknown_events_pass_through_by_name() {
        let parsed = parse_line(r#"{"event":"playback-restart"}"#).unwrap();
        assert_eq!(
            parsed,
            Some(Incoming::Event(Notification::Other("playback-restart".into())))
        );
    }

    #[test]
    fn property_values_by_json_kind() {
        assert_eq!(to_property_value(json!(true)), Some(PropertyValue::Flag(true)));
        assert_eq!(to_property_value(json!(80)), Some(PropertyValue::Int(80)));
        assert_eq!(to_property_value(json!(1.5)), Some(PropertyValue::Double(1.5)));
        assert_eq!(to_property_value(Value::Null), None);
    }
}
