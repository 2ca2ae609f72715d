//! One request in, one response out.

use std::time::Instant;

use serde_json::Value;
use tracing::debug;

use crate::envelope::ResponseEnvelope;
use crate::error::{SpecError, ValidationError};
use crate::parameter::ParameterSpec;
use crate::request::RequestContext;
use crate::response::{Reply, ResponseBuilder};
use crate::types::HttpMethod;
use crate::validator::RequestValidator;
use crate::wrapper::WrapperTemplate;

/// An endpoint bound to a single request.
///
/// ```
/// use json_endpoint::{Api, DataType, HttpMethod, ParameterSpec, RequestContext, ResponseEnvelope};
/// use serde_json::json;
///
/// let request = RequestContext::new("GET").query_param("id", 7);
/// let id = ParameterSpec::builder()
///     .name("id")
///     .required(true)
///     .data_type(DataType::Int)
///     .methods([HttpMethod::Get])
///     .unwrap()
///     .build()
///     .unwrap();
///
/// let reply = Api::new(request)
///     .allow_methods([HttpMethod::Get])
///     .parameter(id)
///     .unwrap()
///     .run(|request| ResponseEnvelope::ok(json!({ "id": request.parameter("id") })));
///
/// let body = reply.render();
/// assert_eq!(body["meta"]["response_code"], 200);
/// assert_eq!(body["data"]["id"], 7);
/// ```
#[derive(Debug, Clone)]
pub struct Api {
    request: RequestContext,
    validator: RequestValidator,
    wrapper: Option<WrapperTemplate>,
    started: Instant,
}

impl Api {
    /// Start handling `request`; `{{ runtime }}` is measured from here.
    pub fn new(request: RequestContext) -> Self {
        Self::with_validator(request, RequestValidator::new())
    }

    pub fn with_validator(request: RequestContext, validator: RequestValidator) -> Self {
        Self {
            request,
            validator,
            wrapper: None,
            started: Instant::now(),
        }
    }

    pub fn allow_methods<I>(mut self, methods: I) -> Self
    where
        I: IntoIterator<Item = HttpMethod>,
    {
        self.validator = self.validator.allow_methods(methods);
        self
    }

    /// # Errors
    ///
    /// See [`RequestValidator::parameter`].
    pub fn parameter(mut self, spec: ParameterSpec) -> Result<Self, SpecError> {
        self.validator = self.validator.parameter(spec)?;
        Ok(self)
    }

    /// Use a custom wrapper instead of the default one.
    pub fn wrapper(mut self, wrapper: WrapperTemplate) -> Self {
        self.wrapper = Some(wrapper);
        self
    }

    pub fn request(&self) -> &RequestContext {
        &self.request
    }

    pub fn validator(&self) -> &RequestValidator {
        &self.validator
    }

    /// Look up a request parameter, GET before POST.
    pub fn param(&self, name: &str) -> Option<&Value> {
        self.request.parameter(name)
    }

    /// # Errors
    ///
    /// Returns the first rule the request breaks.
    pub fn validate(&self) -> Result<(), ValidationError> {
        self.validator.validate(&self.request)
    }

    /// Finish the request with `envelope`.
    pub fn send(self, envelope: ResponseEnvelope) -> Reply {
        let mut builder = ResponseBuilder::new(&self.request, self.started);
        if let Some(wrapper) = self.wrapper {
            builder = builder.wrapper(wrapper);
        }
        Reply::new(builder, envelope)
    }

    /// Finish the request with an error payload, discarding any data.
    pub fn send_error(
        self,
        code: http::StatusCode,
        message: impl Into<String>,
        details: impl Into<Value>,
    ) -> Reply {
        self.send(ResponseEnvelope::error(code, message, details))
    }

    /// Validate, then either reply with the validation error or hand the
    /// request to `handler` and reply with its envelope.
    pub fn run<F>(self, handler: F) -> Reply
    where
        F: FnOnce(&RequestContext) -> ResponseEnvelope,
    {
        match self.validate() {
            Ok(()) => {
                let envelope = handler(&self.request);
                debug!(code = envelope.code().as_u16(), "handler finished");
                self.send(envelope)
            }
            Err(err) => self.send(ResponseEnvelope::from(err)),
        }
    }
}
