//! Incoming request parameters.
//!
//! A [`RequestContext`] is built once per request, either directly or from
//! the wire forms a host server hands over (query string, raw body, CGI
//! variables), and is read-only afterwards.

use serde_json::{Map, Value};

use crate::error::RequestError;
use crate::types::HttpMethod;

const FORM_CONTENT_TYPE: &str = "application/x-www-form-urlencoded";
const JSON_CONTENT_TYPE: &str = "application/json";

/// The per-request view of method, parameters and connection.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RequestContext {
    method: String,
    query: Map<String, Value>,
    body: Map<String, Value>,
    secure: bool,
    host: String,
}

impl RequestContext {
    pub fn new(method: impl Into<String>) -> Self {
        Self {
            method: method.into(),
            ..Self::default()
        }
    }

    /// Replace the GET-sourced parameters.
    pub fn with_query(mut self, query: Map<String, Value>) -> Self {
        self.query = query;
        self
    }

    /// Replace the POST-sourced parameters.
    pub fn with_body(mut self, body: Map<String, Value>) -> Self {
        self.body = body;
        self
    }

    pub fn query_param(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.query.insert(name.into(), value.into());
        self
    }

    pub fn body_param(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.body.insert(name.into(), value.into());
        self
    }

    /// Mark the connection as TLS-terminated.
    pub fn secure(mut self, secure: bool) -> Self {
        self.secure = secure;
        self
    }

    /// Set the `Host` header value.
    pub fn host(mut self, host: impl Into<String>) -> Self {
        self.host = host.into();
        self
    }

    /// Decode a request from its wire parts.
    ///
    /// The query string becomes the GET parameters. The body is decoded as a
    /// JSON object when it parses as one, then form fields (for
    /// `application/x-www-form-urlencoded` bodies) are merged on top; both
    /// become the POST parameters.
    ///
    /// # Errors
    ///
    /// Returns `RequestError` if the method is empty, the query or form body
    /// is malformed, or a body declared as JSON is not a JSON object.
    pub fn from_raw(
        method: &str,
        query: &str,
        content_type: Option<&str>,
        body: &[u8],
    ) -> Result<Self, RequestError> {
        let method = method.trim();
        if method.is_empty() || !method.bytes().all(|b| b.is_ascii_alphabetic()) {
            return Err(RequestError::UnknownMethod {
                value: method.to_string(),
            });
        }

        let query = query.strip_prefix('?').unwrap_or(query);
        let pairs: Vec<(String, String)> = serde_urlencoded::from_str(query)
            .map_err(|source| RequestError::InvalidQuery { source })?;

        let mime = content_type
            .and_then(|ct| ct.split(';').next())
            .map(|ct| ct.trim().to_ascii_lowercase());

        Ok(Self {
            method: method.to_string(),
            query: decode_pairs(pairs),
            body: decode_body(mime.as_deref(), body)?,
            secure: false,
            host: String::new(),
        })
    }

    /// Decode a request from CGI meta-variables and the request body.
    ///
    /// Reads `REQUEST_METHOD`, `QUERY_STRING`, `CONTENT_TYPE`, `HTTPS` and
    /// `HTTP_HOST` through `var`. The connection is secure only when `HTTPS`
    /// is exactly `on`.
    ///
    /// # Errors
    ///
    /// Same as [`RequestContext::from_raw`].
    pub fn from_cgi<F>(var: F, body: &[u8]) -> Result<Self, RequestError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let method = var("REQUEST_METHOD").unwrap_or_default();
        let query = var("QUERY_STRING").unwrap_or_default();
        let content_type = var("CONTENT_TYPE");

        let context = Self::from_raw(&method, &query, content_type.as_deref(), body)?
            .secure(var("HTTPS").as_deref() == Some("on"))
            .host(var("HTTP_HOST").unwrap_or_default());
        Ok(context)
    }

    /// The method as sent by the client.
    pub fn method(&self) -> &str {
        &self.method
    }

    /// The method, if it is in the known vocabulary.
    pub fn http_method(&self) -> Option<HttpMethod> {
        HttpMethod::parse(&self.method)
    }

    pub fn is_secure(&self) -> bool {
        self.secure
    }

    pub fn host_header(&self) -> &str {
        &self.host
    }

    pub fn get_parameters(&self) -> &Map<String, Value> {
        &self.query
    }

    pub fn post_parameters(&self) -> &Map<String, Value> {
        &self.body
    }

    /// Parameters from the given source; only GET and POST carry any.
    pub fn parameters_for(&self, method: HttpMethod) -> Option<&Map<String, Value>> {
        match method {
            HttpMethod::Get => Some(&self.query),
            HttpMethod::Post => Some(&self.body),
            _ => None,
        }
    }

    /// All parameters, GET values shadowing POST values of the same name.
    pub fn all_parameters(&self) -> Map<String, Value> {
        let mut merged = self.body.clone();
        for (name, value) in &self.query {
            merged.insert(name.clone(), value.clone());
        }
        merged
    }

    /// Look up a parameter by name, GET first.
    pub fn parameter(&self, name: &str) -> Option<&Value> {
        self.query.get(name).or_else(|| self.body.get(name))
    }
}

fn decode_body(mime: Option<&str>, body: &[u8]) -> Result<Map<String, Value>, RequestError> {
    let mut params = Map::new();
    if body.iter().all(u8::is_ascii_whitespace) {
        return Ok(params);
    }

    let is_json = mime == Some(JSON_CONTENT_TYPE);
    match serde_json::from_slice::<Value>(body) {
        Ok(Value::Object(map)) => params = map,
        Ok(other) if is_json => {
            return Err(RequestError::JsonNotObject {
                actual: crate::types::json_type_name(&other).to_string(),
            })
        }
        Err(source) if is_json => return Err(RequestError::InvalidJson { source }),
        _ => {}
    }

    if mime == Some(FORM_CONTENT_TYPE) {
        let pairs: Vec<(String, String)> = serde_urlencoded::from_bytes(body)
            .map_err(|source| RequestError::InvalidForm { source })?;
        for (name, value) in decode_pairs(pairs) {
            params.insert(name, value);
        }
    }

    Ok(params)
}

/// Fold urlencoded pairs into a parameter map.
///
/// Each bracket opens one level: `name[]=v` appends to a list, `name[key]=v`
/// fills a map, and `a[b][]=v` nests both. A plain repeated name keeps the
/// last value, as does any name whose brackets don't close.
fn decode_pairs(pairs: Vec<(String, String)>) -> Map<String, Value> {
    let mut params = Map::new();
    for (name, value) in pairs {
        let value = Value::String(value);
        match split_path(&name) {
            Some((base, keys)) => {
                let slot = params.entry(base.to_string()).or_insert(Value::Null);
                insert_nested(slot, &keys, value);
            }
            None => {
                params.insert(name, value);
            }
        }
    }
    params
}

/// Split `base[k1][k2]` into `("base", ["k1", "k2"])`.
fn split_path(name: &str) -> Option<(&str, Vec<&str>)> {
    let open = name.find('[')?;
    if open == 0 {
        return None;
    }

    let mut keys = Vec::new();
    let mut rest = &name[open..];
    while !rest.is_empty() {
        let inner = rest.strip_prefix('[')?;
        let close = inner.find(']')?;
        let key = &inner[..close];
        if key.contains('[') {
            return None;
        }
        keys.push(key);
        rest = &inner[close + 1..];
    }
    Some((&name[..open], keys))
}

/// Store `value` under `keys` below `slot`, replacing scalars that are in the way.
fn insert_nested(slot: &mut Value, keys: &[&str], value: Value) {
    let Some((key, rest)) = keys.split_first() else {
        *slot = value;
        return;
    };

    if key.is_empty() {
        if !slot.is_array() {
            *slot = Value::Array(Vec::new());
        }
        if let Value::Array(items) = slot {
            items.push(Value::Null);
            if let Some(last) = items.last_mut() {
                insert_nested(last, rest, value);
            }
        }
    } else {
        if !slot.is_object() {
            *slot = Value::Object(Map::new());
        }
        if let Value::Object(fields) = slot {
            let child = fields.entry(key.to_string()).or_insert(Value::Null);
            insert_nested(child, rest, value);
        }
    }
}
