//! JSON Endpoint
//!
//! Parameter validation and wrapped JSON responses for small HTTP endpoints.
//!
//! An endpoint declares which request methods it accepts and which parameters
//! may arrive in the query string (GET) or the body (POST). A request is
//! checked against those declarations and answered with a JSON envelope that
//! wraps the payload in metadata.
//!
//! # Example
//!
//! ```
//! use json_endpoint::{Api, DataType, HttpMethod, ParameterSpec, RequestContext, ResponseEnvelope};
//! use serde_json::json;
//!
//! let id = ParameterSpec::builder()
//!     .name("id")
//!     .required(true)
//!     .data_type(DataType::Int)
//!     .methods([HttpMethod::Get])
//!     .unwrap()
//!     .build()
//!     .unwrap();
//!
//! // Query string values are strings, so "abc" is not an int.
//! let request = RequestContext::from_raw("GET", "id=abc", None, b"").unwrap();
//! let reply = Api::new(request)
//!     .allow_methods([HttpMethod::Get])
//!     .parameter(id)
//!     .unwrap()
//!     .run(|_| ResponseEnvelope::ok(json!([])));
//!
//! let body = reply.render();
//! assert_eq!(body["meta"]["response_code"], 400);
//! assert_eq!(body["data"]["error_details"], json!({"id": "int"}));
//! ```
//!
//! # Validation Order
//!
//! | Step | Failure | `error_details` |
//! |------|---------|-----------------|
//! | Request method is allowed | `MethodNotAllowed` | `[method]` |
//! | POST, then GET: no undeclared parameters | `UnexpectedParameter` | offending names |
//! | POST, then GET: required parameters present | `MissingRequiredParameter` | missing names |
//! | POST, then GET: values match declared types | `TypeMismatch` | `{name: type}` |
//!
//! The first failure stops validation and is answered with status 400.
//!
//! # Default Wrapper
//!
//! ```json
//! {
//!     "meta": {
//!         "response_code": "{{ response_code }}",
//!         "host": "{{ host }}",
//!         "count": "{{ count }}",
//!         "runtime": "{{ runtime }}"
//!     },
//!     "data": "{{ data }}"
//! }
//! ```

mod api;
mod config;
mod datetime;
mod envelope;
mod error;
mod parameter;
mod request;
mod response;
pub mod status;
mod types;
mod validator;
mod wrapper;

pub use api::Api;
pub use config::{load_config, load_config_str, EndpointConfig, ParameterDecl};
pub use datetime::{is_parseable as is_date, parse as parse_date};
pub use envelope::{Payload, ResponseEnvelope};
pub use error::{ConfigError, RequestError, ResponseError, SpecError, ValidationError};
pub use parameter::{ParameterMeta, ParameterSpec, ParameterSpecBuilder};
pub use request::RequestContext;
pub use response::{Reply, ResponseBuilder, JSON_CONTENT_TYPE};
pub use types::{json_type_name, DataType, HttpMethod, PARAMETER_METHODS};
pub use validator::RequestValidator;
pub use wrapper::{scheme_host, Placeholder, RenderValues, WrapperTemplate};

pub use http::StatusCode;
