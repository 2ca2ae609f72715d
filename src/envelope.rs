//! The response value handed to the client.

use http::StatusCode;
use serde_json::{json, Value};

use crate::error::ValidationError;

/// What the envelope carries: handler data or an error report, never both.
#[derive(Debug, Clone, PartialEq)]
pub enum Payload {
    Data(Value),
    Error { message: String, details: Value },
}

/// Status code plus payload, built once per request.
#[derive(Debug, Clone, PartialEq)]
pub struct ResponseEnvelope {
    code: StatusCode,
    payload: Payload,
}

impl ResponseEnvelope {
    pub fn new(code: StatusCode, data: impl Into<Value>) -> Self {
        Self {
            code,
            payload: Payload::Data(data.into()),
        }
    }

    /// A 200 response carrying `data`.
    pub fn ok(data: impl Into<Value>) -> Self {
        Self::new(StatusCode::OK, data)
    }

    /// An error response with `{error_message, error_details}` as payload.
    pub fn error(code: StatusCode, message: impl Into<String>, details: impl Into<Value>) -> Self {
        Self {
            code,
            payload: Payload::Error {
                message: message.into(),
                details: details.into(),
            },
        }
    }

    pub fn code(&self) -> StatusCode {
        self.code
    }

    pub fn payload(&self) -> &Payload {
        &self.payload
    }

    pub fn is_error(&self) -> bool {
        matches!(self.payload, Payload::Error { .. })
    }

    /// The payload as it appears under `data` in the rendered response.
    pub fn payload_value(&self) -> Value {
        match &self.payload {
            Payload::Data(data) => data.clone(),
            Payload::Error { message, details } => json!({
                "error_message": message,
                "error_details": details,
            }),
        }
    }

    /// Element count of a container payload, 0 for scalars.
    pub fn count(&self) -> usize {
        match &self.payload {
            Payload::Data(Value::Array(items)) => items.len(),
            Payload::Data(Value::Object(fields)) => fields.len(),
            Payload::Data(_) => 0,
            // rendered as a two-field object
            Payload::Error { .. } => 2,
        }
    }
}

impl Default for ResponseEnvelope {
    fn default() -> Self {
        Self::ok(Value::Null)
    }
}

impl From<&ValidationError> for ResponseEnvelope {
    fn from(err: &ValidationError) -> Self {
        Self::error(err.status(), err.message(), err.details())
    }
}

impl From<ValidationError> for ResponseEnvelope {
    fn from(err: ValidationError) -> Self {
        Self::from(&err)
    }
}
