//! Response wrapper templates.
//!
//! A wrapper is a JSON object whose string leaves may be placeholder tokens.
//! Rendering walks the top level and one level below it:
//!
//! | Token | Replaced with |
//! |-------|---------------|
//! | `{{ response_code }}` | status code as a number |
//! | `{{ host }}` | scheme-qualified host |
//! | `{{ count }}` | element count of the payload |
//! | `{{ runtime }}` | seconds since the request started, as a float |
//! | `{{ data }}` | the payload itself |
//!
//! Only a leaf that is exactly a token is replaced. Any other leaf, including
//! a string that merely contains a token, is kept as written.

use serde_json::{json, Map, Value};

/// Known placeholder tokens.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Placeholder {
    ResponseCode,
    Host,
    Count,
    Runtime,
    Data,
}

impl Placeholder {
    pub fn all() -> &'static [Placeholder] {
        &[
            Placeholder::ResponseCode,
            Placeholder::Host,
            Placeholder::Count,
            Placeholder::Runtime,
            Placeholder::Data,
        ]
    }

    pub fn token(&self) -> &'static str {
        match self {
            Placeholder::ResponseCode => "{{ response_code }}",
            Placeholder::Host => "{{ host }}",
            Placeholder::Count => "{{ count }}",
            Placeholder::Runtime => "{{ runtime }}",
            Placeholder::Data => "{{ data }}",
        }
    }

    /// Returns the placeholder `s` consists of, if any.
    pub fn from_token(s: &str) -> Option<Self> {
        Placeholder::all().iter().copied().find(|p| p.token() == s)
    }
}

/// Live values substituted into a wrapper.
#[derive(Debug, Clone, Copy)]
pub struct RenderValues<'a> {
    pub response_code: u16,
    pub host: &'a str,
    pub count: usize,
    pub runtime: f64,
    pub data: &'a Value,
}

impl RenderValues<'_> {
    fn value(&self, placeholder: Placeholder) -> Value {
        match placeholder {
            Placeholder::ResponseCode => json!(self.response_code),
            Placeholder::Host => Value::String(self.host.to_string()),
            Placeholder::Count => json!(self.count),
            Placeholder::Runtime => json!(self.runtime),
            Placeholder::Data => self.data.clone(),
        }
    }
}

/// The shape of a rendered response.
#[derive(Debug, Clone, PartialEq)]
pub struct WrapperTemplate {
    template: Map<String, Value>,
}

impl WrapperTemplate {
    pub fn new(template: Map<String, Value>) -> Self {
        Self { template }
    }

    pub fn template(&self) -> &Map<String, Value> {
        &self.template
    }

    /// Substitute placeholders with `values`.
    pub fn render(&self, values: &RenderValues<'_>) -> Value {
        let rendered = self
            .template
            .iter()
            .map(|(key, child)| {
                let child = match child {
                    Value::Object(fields) => Value::Object(
                        fields
                            .iter()
                            .map(|(k, leaf)| (k.clone(), render_leaf(leaf, values)))
                            .collect(),
                    ),
                    Value::Array(items) => {
                        Value::Array(items.iter().map(|leaf| render_leaf(leaf, values)).collect())
                    }
                    leaf => render_leaf(leaf, values),
                };
                (key.clone(), child)
            })
            .collect();
        Value::Object(rendered)
    }
}

impl Default for WrapperTemplate {
    /// `{ meta: { response_code, host, count, runtime }, data }`
    fn default() -> Self {
        let mut meta = Map::new();
        meta.insert("response_code".into(), Placeholder::ResponseCode.token().into());
        meta.insert("host".into(), Placeholder::Host.token().into());
        meta.insert("count".into(), Placeholder::Count.token().into());
        meta.insert("runtime".into(), Placeholder::Runtime.token().into());

        let mut template = Map::new();
        template.insert("meta".into(), Value::Object(meta));
        template.insert("data".into(), Placeholder::Data.token().into());
        Self { template }
    }
}

fn render_leaf(leaf: &Value, values: &RenderValues<'_>) -> Value {
    leaf.as_str()
        .and_then(Placeholder::from_token)
        .map(|placeholder| values.value(placeholder))
        .unwrap_or_else(|| leaf.clone())
}

/// Scheme-qualified host as reported in `{{ host }}`.
///
/// A secure connection yields just `https://`, without the host; a plain one
/// yields `http://` followed by the `Host` header.
// TODO: append the host on secure connections once existing clients stop
// depending on the bare scheme.
pub fn scheme_host(secure: bool, host: &str) -> String {
    if secure {
        "https://".to_string()
    } else {
        format!("http://{host}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn template(value: Value) -> WrapperTemplate {
        match value {
            Value::Object(map) => WrapperTemplate::new(map),
            other => panic!("template must be an object, got {other}"),
        }
    }

    fn values(data: &Value) -> RenderValues<'_> {
        RenderValues {
            response_code: 200,
            host: "http://localhost",
            count: 2,
            runtime: 0.5,
            data,
        }
    }

    #[test]
    fn default_wrapper() {
        let data = json!({"a": 1, "b": 2});
        let rendered = WrapperTemplate::default().render(&values(&data));
        assert_eq!(
            rendered,
            json!({
                "meta": {
                    "response_code": 200,
                    "host": "http://localhost",
                    "count": 2,
                    "runtime": 0.5
                },
                "data": {"a": 1, "b": 2}
            })
        );
    }

    #[test]
    fn custom_wrapper_keeps_unknown_leaves() {
        let wrapper = template(json!({
            "status": "{{ response_code }}",
            "version": 3,
            "note": "static text",
            "result": "{{ data }}",
            "info": { "enabled": true, "unknown": "{{ nope }}" }
        }));
        let data = json!([1, 2]);
        let rendered = wrapper.render(&values(&data));
        assert_eq!(
            rendered,
            json!({
                "status": 200,
                "version": 3,
                "note": "static text",
                "result": [1, 2],
                "info": { "enabled": true, "unknown": "{{ nope }}" }
            })
        );
    }

    #[test]
    fn only_one_level_is_rendered() {
        let nested = json!({"outer": {"inner": {"code": "{{ response_code }}"}}});
        let data = Value::Null;
        let rendered = template(nested.clone()).render(&values(&data));
        assert_eq!(rendered, nested);
    }

    #[test]
    fn embedded_tokens_are_left_as_written() {
        let wrapper = template(json!({
            "summary": "{{ count }} items",
            "code": "status {{ response_code }}",
            "origin": "from {{ host }}",
            "raw": "payload: {{ data }}",
            "meta": { "elapsed": "{{ runtime }}s" }
        }));
        let data = json!({"x": 1, "y": 2});
        let rendered = wrapper.render(&values(&data));
        assert_eq!(
            rendered,
            json!({
                "summary": "{{ count }} items",
                "code": "status {{ response_code }}",
                "origin": "from {{ host }}",
                "raw": "payload: {{ data }}",
                "meta": { "elapsed": "{{ runtime }}s" }
            })
        );
    }

    #[test]
    fn list_children_are_rendered() {
        let wrapper = template(json!({"codes": ["{{ response_code }}", "{{ count }}"]}));
        let data = Value::Null;
        let rendered = wrapper.render(&values(&data));
        assert_eq!(rendered, json!({"codes": [200, 2]}));
    }

    #[test]
    fn placeholder_lookup() {
        assert_eq!(
            Placeholder::from_token("{{ runtime }}"),
            Some(Placeholder::Runtime)
        );
        assert_eq!(Placeholder::from_token("{{runtime}}"), None);
        assert_eq!(Placeholder::from_token(" {{ runtime }}"), None);
    }

    #[test]
    fn scheme_host_quirk() {
        assert_eq!(scheme_host(false, "example.com"), "http://example.com");
        assert_eq!(scheme_host(true, "example.com"), "https://");
    }
}
