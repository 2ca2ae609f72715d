//! Error types for endpoint declaration, request decoding and validation.

use std::path::PathBuf;

use http::StatusCode;
use serde_json::{json, Value};
use thiserror::Error;

use crate::types::{DataType, HttpMethod};

/// Errors while declaring parameters (`InvalidSpecConfiguration`).
///
/// These are programmer errors raised at endpoint setup, never while a
/// request is being handled.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SpecError {
    #[error("parameter '{name}' cannot be scoped to {method}: only GET and POST are allowed")]
    DisallowedMethod { name: String, method: HttpMethod },

    #[error("unknown request method \"{value}\"")]
    UnknownMethod { value: String },

    #[error("unknown data type \"{value}\": expected one of string, int, bool, float, array, object, date, datetime, null")]
    UnknownDataType { value: String },

    #[error("parameter declared without a name")]
    MissingName,

    #[error("parameter '{name}' declared without a data type")]
    MissingDataType { name: String },

    #[error("parameter '{name}' is declared twice for {method}")]
    DuplicateName { name: String, method: HttpMethod },
}

impl SpecError {
    /// Returns the exit code for this error type.
    pub fn exit_code(&self) -> i32 {
        2
    }
}

/// Errors while decoding the wire form of a request.
#[derive(Debug, Error)]
pub enum RequestError {
    #[error("unknown request method \"{value}\"")]
    UnknownMethod { value: String },

    #[error("invalid query string: {source}")]
    InvalidQuery {
        #[source]
        source: serde_urlencoded::de::Error,
    },

    #[error("invalid form body: {source}")]
    InvalidForm {
        #[source]
        source: serde_urlencoded::de::Error,
    },

    #[error("invalid JSON body: {source}")]
    InvalidJson {
        #[source]
        source: serde_json::Error,
    },

    #[error("JSON body must be an object, got {actual}")]
    JsonNotObject { actual: String },

    #[error("cannot read request body: {source}")]
    ReadBody {
        #[source]
        source: std::io::Error,
    },
}

impl RequestError {
    /// Returns the exit code for this error type.
    pub fn exit_code(&self) -> i32 {
        match self {
            RequestError::ReadBody { .. } => 3,
            _ => 2,
        }
    }
}

/// A request that fails the endpoint's declared rules.
///
/// Every variant is reported to the client as a 400 envelope carrying
/// [`message`](Self::message) and [`details`](Self::details).
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ValidationError {
    /// Reported as 400, not 405, to match the behaviour clients already rely on.
    #[error("request method {method} is not allowed")]
    MethodNotAllowed { method: String },

    #[error("unexpected {method} parameters: {}", .names.join(", "))]
    UnexpectedParameter { method: HttpMethod, names: Vec<String> },

    #[error("missing required {method} parameters: {}", .names.join(", "))]
    MissingRequiredParameter { method: HttpMethod, names: Vec<String> },

    #[error("{method} parameter '{name}' is not of type {expected}")]
    TypeMismatch {
        method: HttpMethod,
        name: String,
        expected: DataType,
    },
}

impl ValidationError {
    /// HTTP status the error is reported with.
    pub fn status(&self) -> StatusCode {
        StatusCode::BAD_REQUEST
    }

    /// Client-facing `error_message`.
    pub fn message(&self) -> String {
        match self {
            ValidationError::MethodNotAllowed { .. } => {
                "The request method is not allowed for this resource.".to_string()
            }
            ValidationError::UnexpectedParameter { method, .. } => {
                format!("Some given {method} parameters are not allowed for this resource")
            }
            ValidationError::MissingRequiredParameter { method, .. } => {
                format!("Some necessary {method} parameters are not given to this resource")
            }
            ValidationError::TypeMismatch { method, name, .. } => {
                format!("Invalid data type for {method} parameter '{name}'.")
            }
        }
    }

    /// Client-facing `error_details`.
    pub fn details(&self) -> Value {
        match self {
            ValidationError::MethodNotAllowed { method } => json!([method]),
            ValidationError::UnexpectedParameter { names, .. }
            | ValidationError::MissingRequiredParameter { names, .. } => json!(names),
            ValidationError::TypeMismatch { name, expected, .. } => {
                let mut details = serde_json::Map::new();
                details.insert(name.clone(), Value::String(expected.as_str().to_string()));
                Value::Object(details)
            }
        }
    }

    /// Returns the exit code for this error type.
    pub fn exit_code(&self) -> i32 {
        1
    }
}

/// Errors while producing the outgoing response.
#[derive(Debug, Error)]
pub enum ResponseError {
    #[error("cannot serialize response: {source}")]
    Serialize {
        #[source]
        source: serde_json::Error,
    },

    #[error("response body is not UTF-8: {source}")]
    Encoding {
        #[source]
        source: std::string::FromUtf8Error,
    },

    #[error("cannot build HTTP response: {source}")]
    Http {
        #[source]
        source: http::Error,
    },

    #[error("cannot write response: {source}")]
    Write {
        #[source]
        source: std::io::Error,
    },
}

impl ResponseError {
    /// Returns the exit code for this error type.
    pub fn exit_code(&self) -> i32 {
        match self {
            ResponseError::Write { .. } => 3,
            _ => 2,
        }
    }
}

/// Errors loading an endpoint declaration file.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("file not found: {path}")]
    FileNotFound { path: PathBuf },

    #[error("cannot read {path}: {source}")]
    ReadError {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid JSON: {source}")]
    InvalidJson {
        #[source]
        source: serde_json::Error,
    },

    #[error("invalid endpoint declaration: {0}")]
    InvalidDeclaration(#[from] SpecError),
}

impl ConfigError {
    /// Returns the exit code for this error type.
    pub fn exit_code(&self) -> i32 {
        match self {
            ConfigError::FileNotFound { .. } | ConfigError::ReadError { .. } => 3,
            _ => 2,
        }
    }
}
