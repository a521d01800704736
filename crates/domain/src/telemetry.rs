//! Telemetry — inbound messages from the gateway's live event stream.
//!
//! [`Telemetry::from_json`] is the parsing contract for websocket frames;
//! the virtual gateway renders its changes as such frames and parses them
//! back through [`Telemetry::from_value`].

use serde_json::{Map, Value};

use crate::id::DeviceId;

/// What a telemetry message carries.
#[derive(Debug, Clone, PartialEq)]
pub enum Payload {
    /// Partial state map; fields absent from it are unchanged.
    State(Map<String, Value>),
    /// Raw vendor button code (`button * 1000 + event`).
    Button { code: u32 },
}

/// One inbound message addressed to a device by its unique id.
#[derive(Debug, Clone, PartialEq)]
pub struct Telemetry {
    pub id: DeviceId,
    pub payload: Payload,
}

/// Why a gateway message could not be turned into [`Telemetry`].
#[derive(Debug, thiserror::Error)]
pub enum TelemetryError {
    #[error("malformed json")]
    Json(#[from] serde_json::Error),

    #[error("message has no {0} field")]
    MissingField(&'static str),

    #[error("button event {0} is not a valid code")]
    InvalidButtonCode(Value),
}

impl Telemetry {
    #[must_use]
    pub fn state(id: impl Into<DeviceId>, state: Map<String, Value>) -> Self {
        Self {
            id: id.into(),
            payload: Payload::State(state),
        }
    }

    #[must_use]
    pub fn button(id: impl Into<DeviceId>, code: u32) -> Self {
        Self {
            id: id.into(),
            payload: Payload::Button { code },
        }
    }

    /// Parse a gateway event of the form
    /// `{"uniqueid": "...", "state": {...}}`.
    ///
    /// A `buttonevent` field inside `state` makes it a button payload.
    ///
    /// # Errors
    ///
    /// Returns [`TelemetryError`] when the message is not JSON or lacks the
    /// `uniqueid` / `state` fields.
    pub fn from_json(raw: &str) -> Result<Self, TelemetryError> {
        let value: Value = serde_json::from_str(raw)?;
        Self::from_value(value)
    }

    /// Same as [`from_json`](Self::from_json) for an already-parsed value.
    ///
    /// # Errors
    ///
    /// See [`from_json`](Self::from_json).
    pub fn from_value(mut value: Value) -> Result<Self, TelemetryError> {
        let id = value
            .get("uniqueid")
            .and_then(Value::as_str)
            .map(DeviceId::from)
            .ok_or(TelemetryError::MissingField("uniqueid"))?;
        let Some(Value::Object(state)) = value.get_mut("state").map(Value::take) else {
            return Err(TelemetryError::MissingField("state"));
        };

        match state.get("buttonevent") {
            Some(code) => {
                let code = code
                    .as_u64()
                    .and_then(|c| u32::try_from(c).ok())
                    .ok_or_else(|| TelemetryError::InvalidButtonCode(code.clone()))?;
                Ok(Self::button(id, code))
            }
            None => Ok(Self::state(id, state)),
        }
    }
}
