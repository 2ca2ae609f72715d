//! Core types for parameter declarations.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::datetime;
use crate::error::SpecError;

/// Methods a parameter declaration may be scoped to.
pub const PARAMETER_METHODS: &[HttpMethod] = &[HttpMethod::Get, HttpMethod::Post];

/// Returns the JSON type name for log and error messages.
pub fn json_type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

/// Primitive type a parameter value is checked against.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DataType {
    String,
    Int,
    Bool,
    Float,
    Array,
    Object,
    Date,
    Datetime,
    Null,
}

impl DataType {
    /// Every declarable type, in declaration order.
    pub fn all() -> &'static [DataType] {
        &[
            DataType::String,
            DataType::Int,
            DataType::Bool,
            DataType::Float,
            DataType::Array,
            DataType::Object,
            DataType::Date,
            DataType::Datetime,
            DataType::Null,
        ]
    }

    /// Returns the wire name used in declarations and error details.
    pub fn as_str(&self) -> &'static str {
        match self {
            DataType::String => "string",
            DataType::Int => "int",
            DataType::Bool => "bool",
            DataType::Float => "float",
            DataType::Array => "array",
            DataType::Object => "object",
            DataType::Date => "date",
            DataType::Datetime => "datetime",
            DataType::Null => "null",
        }
    }

    /// Parse a type name.
    ///
    /// Returns `None` for unknown names (caller should error).
    pub fn parse(s: &str) -> Option<Self> {
        DataType::all().iter().copied().find(|t| t.as_str() == s)
    }

    /// Check whether `value` is natively of this type.
    ///
    /// The check is strict: the string `"5"` is not an `int`, and the
    /// number `5` is not a `float`. `date` and `datetime` accept any string
    /// the permissive date parser understands.
    pub fn matches(&self, value: &Value) -> bool {
        match self {
            DataType::String => value.is_string(),
            DataType::Int => value.is_i64(),
            DataType::Bool => value.is_boolean(),
            DataType::Float => value.is_f64(),
            DataType::Array => value.is_array(),
            DataType::Object => value.is_object(),
            DataType::Date | DataType::Datetime => value
                .as_str()
                .map(datetime::is_parseable)
                .unwrap_or(false),
            DataType::Null => value.is_null(),
        }
    }
}

impl fmt::Display for DataType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for DataType {
    type Err = SpecError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        DataType::parse(s).ok_or_else(|| SpecError::UnknownDataType {
            value: s.to_string(),
        })
    }
}

/// The closed HTTP method vocabulary.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum HttpMethod {
    Get,
    Post,
    Put,
    Delete,
    Patch,
    Options,
    Head,
    Trace,
    Connect,
}

impl HttpMethod {
    pub fn all() -> &'static [HttpMethod] {
        &[
            HttpMethod::Get,
            HttpMethod::Post,
            HttpMethod::Put,
            HttpMethod::Delete,
            HttpMethod::Patch,
            HttpMethod::Options,
            HttpMethod::Head,
            HttpMethod::Trace,
            HttpMethod::Connect,
        ]
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            HttpMethod::Get => "GET",
            HttpMethod::Post => "POST",
            HttpMethod::Put => "PUT",
            HttpMethod::Delete => "DELETE",
            HttpMethod::Patch => "PATCH",
            HttpMethod::Options => "OPTIONS",
            HttpMethod::Head => "HEAD",
            HttpMethod::Trace => "TRACE",
            HttpMethod::Connect => "CONNECT",
        }
    }

    /// Parse a method name. Matching is exact (`"get"` is not a method).
    pub fn parse(s: &str) -> Option<Self> {
        HttpMethod::all().iter().copied().find(|m| m.as_str() == s)
    }

    /// Returns true if `s` names a method in the vocabulary.
    pub fn is_valid(s: &str) -> bool {
        HttpMethod::parse(s).is_some()
    }

    /// Whether parameter declarations may be scoped to this method.
    pub fn is_parameter_method(&self) -> bool {
        PARAMETER_METHODS.contains(self)
    }
}

impl fmt::Display for HttpMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for HttpMethod {
    type Err = SpecError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        HttpMethod::parse(s).ok_or_else(|| SpecError::UnknownMethod {
            value: s.to_string(),
        })
    }
}

impl From<HttpMethod> for http::Method {
    fn from(method: HttpMethod) -> Self {
        match method {
            HttpMethod::Get => http::Method::GET,
            HttpMethod::Post => http::Method::POST,
            HttpMethod::Put => http::Method::PUT,
            HttpMethod::Delete => http::Method::DELETE,
            HttpMethod::Patch => http::Method::PATCH,
            HttpMethod::Options => http::Method::OPTIONS,
            HttpMethod::Head => http::Method::HEAD,
            HttpMethod::Trace => http::Method::TRACE,
            HttpMethod::Connect => http::Method::CONNECT,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn data_type_parse_valid() {
        assert_eq!(DataType::parse("int"), Some(DataType::Int));
        assert_eq!(DataType::parse("datetime"), Some(DataType::Datetime));
        assert_eq!(DataType::parse("null"), Some(DataType::Null));
    }

    #[test]
    fn data_type_parse_invalid() {
        assert_eq!(DataType::parse("integer"), None);
        assert_eq!(DataType::parse("INT"), None);
        assert_eq!(DataType::parse(""), None);
    }

    #[test]
    fn numeric_string_is_not_int() {
        assert!(!DataType::Int.matches(&json!("5")));
        assert!(DataType::Int.matches(&json!(5)));
        assert!(DataType::Int.matches(&json!(-5)));
    }

    #[test]
    fn int_must_fit_in_i64() {
        assert!(DataType::Int.matches(&json!(i64::MAX)));
        assert!(!DataType::Int.matches(&json!(u64::MAX)));
    }

    #[test]
    fn integer_is_not_float() {
        assert!(!DataType::Float.matches(&json!(5)));
        assert!(DataType::Float.matches(&json!(5.0)));
        assert!(DataType::Float.matches(&json!(0.25)));
    }

    #[test]
    fn container_types() {
        assert!(DataType::Array.matches(&json!([1, 2])));
        assert!(!DataType::Array.matches(&json!({"a": 1})));
        assert!(DataType::Object.matches(&json!({"a": 1})));
        assert!(!DataType::Object.matches(&json!([])));
    }

    #[test]
    fn scalar_types() {
        assert!(DataType::String.matches(&json!("x")));
        assert!(!DataType::String.matches(&json!(1)));
        assert!(DataType::Bool.matches(&json!(false)));
        assert!(!DataType::Bool.matches(&json!("true")));
        assert!(DataType::Null.matches(&Value::Null));
        assert!(!DataType::Null.matches(&json!("")));
    }

    #[test]
    fn date_types_need_parseable_strings() {
        assert!(DataType::Date.matches(&json!("2024-03-01")));
        assert!(DataType::Datetime.matches(&json!("tomorrow")));
        assert!(!DataType::Date.matches(&json!("not a date")));
        assert!(!DataType::Date.matches(&json!(20240301)));
    }

    #[test]
    fn predicate_is_stable() {
        let value = json!("next monday");
        assert_eq!(
            DataType::Date.matches(&value),
            DataType::Date.matches(&value)
        );
    }

    #[test]
    fn method_parse_is_exact() {
        assert_eq!(HttpMethod::parse("GET"), Some(HttpMethod::Get));
        assert_eq!(HttpMethod::parse("CONNECT"), Some(HttpMethod::Connect));
        assert_eq!(HttpMethod::parse("get"), None);
        assert!(!HttpMethod::is_valid("FETCH"));
    }

    #[test]
    fn only_get_and_post_scope_parameters() {
        assert!(HttpMethod::Get.is_parameter_method());
        assert!(HttpMethod::Post.is_parameter_method());
        assert!(!HttpMethod::Put.is_parameter_method());
    }

    #[test]
    fn method_converts_to_http() {
        assert_eq!(http::Method::from(HttpMethod::Patch), http::Method::PATCH);
    }
}
