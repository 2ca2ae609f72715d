//! Rendering and writing the wrapped JSON response.

use std::io::Write;
use std::time::Instant;

use http::header::CONTENT_TYPE;
use serde::Serialize;
use serde_json::Value;
use tracing::debug;

use crate::envelope::ResponseEnvelope;
use crate::error::ResponseError;
use crate::request::RequestContext;
use crate::status;
use crate::wrapper::{scheme_host, RenderValues, WrapperTemplate};

pub const JSON_CONTENT_TYPE: &str = "application/json";

const INDENT: &[u8] = b"    ";

/// Turns a [`ResponseEnvelope`] into the bytes sent to the client.
///
/// The output methods take `self`, so one builder sends at most one response.
#[derive(Debug, Clone)]
pub struct ResponseBuilder {
    started: Instant,
    host: String,
    wrapper: WrapperTemplate,
}

impl ResponseBuilder {
    /// `started` is the instant `{{ runtime }}` is measured from.
    pub fn new(request: &RequestContext, started: Instant) -> Self {
        Self {
            started,
            host: scheme_host(request.is_secure(), request.host_header()),
            wrapper: WrapperTemplate::default(),
        }
    }

    /// Replace the default wrapper.
    pub fn wrapper(mut self, wrapper: WrapperTemplate) -> Self {
        self.wrapper = wrapper;
        self
    }

    /// Apply the wrapper to an envelope.
    pub fn render(&self, envelope: &ResponseEnvelope) -> Value {
        let data = envelope.payload_value();
        let values = RenderValues {
            response_code: envelope.code().as_u16(),
            host: &self.host,
            count: envelope.count(),
            runtime: self.started.elapsed().as_secs_f64(),
            data: &data,
        };
        let rendered = self.wrapper.render(&values);
        debug!(
            code = values.response_code,
            count = values.count,
            runtime = values.runtime,
            "rendered response"
        );
        rendered
    }

    /// Pretty-printed response body with literal Unicode.
    ///
    /// # Errors
    ///
    /// Returns `ResponseError::Serialize` if the rendered value cannot be
    /// serialized.
    pub fn body(&self, envelope: &ResponseEnvelope) -> Result<String, ResponseError> {
        to_pretty_json(&self.render(envelope))
    }

    /// Build the complete HTTP response.
    ///
    /// # Errors
    ///
    /// Returns `ResponseError` if the body cannot be serialized or the
    /// response cannot be assembled.
    pub fn into_http(self, envelope: ResponseEnvelope) -> Result<http::Response<String>, ResponseError> {
        let body = self.body(&envelope)?;
        http::Response::builder()
            .status(envelope.code())
            .header(CONTENT_TYPE, JSON_CONTENT_TYPE)
            .body(body)
            .map_err(|source| ResponseError::Http { source })
    }

    /// Write the response in CGI form: a `Status` line, the content type,
    /// a blank line and the body.
    ///
    /// # Errors
    ///
    /// Returns `ResponseError::Write` if the writer fails.
    pub fn write_cgi<W: Write>(self, envelope: ResponseEnvelope, mut out: W) -> Result<(), ResponseError> {
        let body = self.body(&envelope)?;
        let code = envelope.code().as_u16();
        let reason = status::reason(code)
            .or_else(|| envelope.code().canonical_reason())
            .unwrap_or("");

        write!(
            out,
            "Status: {code} {reason}\r\nContent-Type: {JSON_CONTENT_TYPE}\r\n\r\n{body}"
        )
        .and_then(|()| out.flush())
        .map_err(|source| ResponseError::Write { source })
    }
}

/// A response ready to leave: the envelope and the builder that renders it.
#[derive(Debug, Clone)]
pub struct Reply {
    builder: ResponseBuilder,
    envelope: ResponseEnvelope,
}

impl Reply {
    pub fn new(builder: ResponseBuilder, envelope: ResponseEnvelope) -> Self {
        Self { builder, envelope }
    }

    pub fn envelope(&self) -> &ResponseEnvelope {
        &self.envelope
    }

    pub fn render(&self) -> Value {
        self.builder.render(&self.envelope)
    }

    /// # Errors
    ///
    /// See [`ResponseBuilder::body`].
    pub fn body(&self) -> Result<String, ResponseError> {
        self.builder.body(&self.envelope)
    }

    /// # Errors
    ///
    /// See [`ResponseBuilder::into_http`].
    pub fn into_http(self) -> Result<http::Response<String>, ResponseError> {
        self.builder.into_http(self.envelope)
    }

    /// # Errors
    ///
    /// See [`ResponseBuilder::write_cgi`].
    pub fn write_cgi<W: Write>(self, out: W) -> Result<(), ResponseError> {
        self.builder.write_cgi(self.envelope, out)
    }
}

fn to_pretty_json(value: &Value) -> Result<String, ResponseError> {
    let mut buf = Vec::new();
    let formatter = serde_json::ser::PrettyFormatter::with_indent(INDENT);
    let mut serializer = serde_json::Serializer::with_formatter(&mut buf, formatter);
    value
        .serialize(&mut serializer)
        .map_err(|source| ResponseError::Serialize { source })?;
    String::from_utf8(buf).map_err(|source| ResponseError::Encoding { source })
}
