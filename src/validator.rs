//! Request validation against declared parameters.

use serde_json::{Map, Value};
use tracing::{debug, warn};

use crate::error::{SpecError, ValidationError};
use crate::parameter::{ParameterMeta, ParameterSpec};
use crate::request::RequestContext;
use crate::types::{json_type_name, HttpMethod};

/// Parameter sources in the order they are checked.
const SOURCE_ORDER: [HttpMethod; 2] = [HttpMethod::Post, HttpMethod::Get];

/// Registry of the methods and parameters one endpoint accepts.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RequestValidator {
    allowed_methods: Vec<HttpMethod>,
    parameters: Vec<ParameterSpec>,
}

impl RequestValidator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the request methods the endpoint accepts, replacing any earlier set.
    pub fn allow_methods<I>(mut self, methods: I) -> Self
    where
        I: IntoIterator<Item = HttpMethod>,
    {
        self.allowed_methods = methods.into_iter().collect();
        self
    }

    /// Register a parameter declaration.
    ///
    /// # Errors
    ///
    /// Returns `SpecError::DuplicateName` if a parameter with the same name is
    /// already registered for one of the same methods.
    pub fn parameter(mut self, spec: ParameterSpec) -> Result<Self, SpecError> {
        let clash = self.parameters.iter().find_map(|existing| {
            if existing.name() != spec.name() {
                return None;
            }
            spec.methods()
                .iter()
                .copied()
                .find(|m| existing.applies_to(*m))
        });
        if let Some(method) = clash {
            return Err(SpecError::DuplicateName {
                name: spec.name().to_string(),
                method,
            });
        }

        self.parameters.push(spec);
        Ok(self)
    }

    pub fn allowed_methods(&self) -> &[HttpMethod] {
        &self.allowed_methods
    }

    pub fn parameters(&self) -> &[ParameterSpec] {
        &self.parameters
    }

    /// Validation metadata for every registered parameter.
    pub fn describe(&self) -> Vec<ParameterMeta> {
        self.parameters.iter().map(ParameterSpec::describe).collect()
    }

    /// Check a request against the endpoint's rules.
    ///
    /// Checks run in a fixed order and stop at the first failure: request
    /// method, then for POST and GET in turn unexpected parameters, missing
    /// required parameters and value types.
    ///
    /// # Errors
    ///
    /// Returns the first `ValidationError` found.
    pub fn validate(&self, request: &RequestContext) -> Result<(), ValidationError> {
        let method = request
            .http_method()
            .filter(|m| self.allowed_methods.contains(m));
        if method.is_none() {
            warn!(method = request.method(), "request method not allowed");
            return Err(ValidationError::MethodNotAllowed {
                method: request.method().to_string(),
            });
        }

        for source in SOURCE_ORDER {
            if let Some(given) = request.parameters_for(source) {
                self.validate_source(source, given)?;
            }
        }

        debug!(method = request.method(), "request validated");
        Ok(())
    }

    fn validate_source(
        &self,
        method: HttpMethod,
        given: &Map<String, Value>,
    ) -> Result<(), ValidationError> {
        let allowed: Vec<&ParameterSpec> = self
            .parameters
            .iter()
            .filter(|p| p.applies_to(method))
            .collect();

        let unexpected: Vec<String> = given
            .keys()
            .filter(|name| !allowed.iter().any(|p| p.name() == name.as_str()))
            .cloned()
            .collect();
        if !unexpected.is_empty() {
            warn!(%method, names = ?unexpected, "unexpected parameters");
            return Err(ValidationError::UnexpectedParameter {
                method,
                names: unexpected,
            });
        }

        let missing: Vec<String> = allowed
            .iter()
            .filter(|p| p.is_required() && !given.contains_key(p.name()))
            .map(|p| p.name().to_string())
            .collect();
        if !missing.is_empty() {
            warn!(%method, names = ?missing, "missing required parameters");
            return Err(ValidationError::MissingRequiredParameter {
                method,
                names: missing,
            });
        }

        for (name, value) in given {
            let Some(spec) = allowed.iter().find(|p| p.name() == name.as_str()) else {
                continue;
            };
            if !spec.data_type().matches(value) {
                warn!(
                    %method,
                    name = name.as_str(),
                    expected = spec.data_type().as_str(),
                    actual = json_type_name(value),
                    "parameter type mismatch"
                );
                return Err(ValidationError::TypeMismatch {
                    method,
                    name: name.clone(),
                    expected: spec.data_type(),
                });
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::DataType;
    use serde_json::json;

    fn param(name: &str, required: bool, data_type: DataType, methods: &[HttpMethod]) -> ParameterSpec {
        ParameterSpec::builder()
            .name(name)
            .required(required)
            .data_type(data_type)
            .methods(methods.iter().copied())
            .unwrap()
            .build()
            .unwrap()
    }

    fn get_only() -> RequestValidator {
        RequestValidator::new()
            .allow_methods([HttpMethod::Get])
            .parameter(param("id", true, DataType::Int, &[HttpMethod::Get]))
            .unwrap()
    }

    #[test]
    fn accepts_valid_request() {
        let request = RequestContext::new("GET").query_param("id", 5);
        assert!(get_only().validate(&request).is_ok());
    }

    #[test]
    fn method_not_allowed() {
        let request = RequestContext::new("POST");
        assert_eq!(
            get_only().validate(&request),
            Err(ValidationError::MethodNotAllowed {
                method: "POST".into()
            })
        );
    }

    #[test]
    fn unknown_method_not_allowed() {
        let request = RequestContext::new("BREW");
        let err = get_only().validate(&request).unwrap_err();
        assert_eq!(err.details(), json!(["BREW"]));
    }

    #[test]
    fn no_allowed_methods_rejects_everything() {
        let validator = RequestValidator::new();
        assert!(validator.validate(&RequestContext::new("GET")).is_err());
    }

    #[test]
    fn unexpected_before_missing() {
        let request = RequestContext::new("GET").query_param("other", "x");
        assert_eq!(
            get_only().validate(&request),
            Err(ValidationError::UnexpectedParameter {
                method: HttpMethod::Get,
                names: vec!["other".into()],
            })
        );
    }

    #[test]
    fn missing_required() {
        let request = RequestContext::new("GET");
        assert_eq!(
            get_only().validate(&request),
            Err(ValidationError::MissingRequiredParameter {
                method: HttpMethod::Get,
                names: vec!["id".into()],
            })
        );
    }

    #[test]
    fn type_mismatch() {
        let request = RequestContext::new("GET").query_param("id", "abc");
        assert_eq!(
            get_only().validate(&request),
            Err(ValidationError::TypeMismatch {
                method: HttpMethod::Get,
                name: "id".into(),
                expected: DataType::Int,
            })
        );
    }

    #[test]
    fn post_is_checked_before_get() {
        let validator = RequestValidator::new()
            .allow_methods([HttpMethod::Get, HttpMethod::Post])
            .parameter(param("a", true, DataType::String, &[HttpMethod::Get]))
            .unwrap();
        let request = RequestContext::new("GET").body_param("stray", 1);

        let err = validator.validate(&request).unwrap_err();
        assert_eq!(
            err,
            ValidationError::UnexpectedParameter {
                method: HttpMethod::Post,
                names: vec!["stray".into()],
            }
        );
    }

    #[test]
    fn post_type_error_wins_over_missing_get_parameter() {
        let validator = RequestValidator::new()
            .allow_methods([HttpMethod::Get, HttpMethod::Post])
            .parameter(param("id", true, DataType::Int, &[HttpMethod::Get]))
            .unwrap()
            .parameter(param("qty", false, DataType::Int, &[HttpMethod::Post]))
            .unwrap();
        let request = RequestContext::new("POST").body_param("qty", "three");

        assert_eq!(
            validator.validate(&request).unwrap_err(),
            ValidationError::TypeMismatch {
                method: HttpMethod::Post,
                name: "qty".into(),
                expected: DataType::Int,
            }
        );
    }

    #[test]
    fn parameter_scoped_to_post_is_unexpected_in_query() {
        let validator = RequestValidator::new()
            .allow_methods([HttpMethod::Get, HttpMethod::Post])
            .parameter(param("token", false, DataType::String, &[HttpMethod::Post]))
            .unwrap();
        let request = RequestContext::new("POST").query_param("token", "t");

        assert!(matches!(
            validator.validate(&request),
            Err(ValidationError::UnexpectedParameter {
                method: HttpMethod::Get,
                ..
            })
        ));
    }

    #[test]
    fn first_type_mismatch_wins() {
        let validator = RequestValidator::new()
            .allow_methods([HttpMethod::Post])
            .parameter(param("a", false, DataType::Int, &[HttpMethod::Post]))
            .unwrap()
            .parameter(param("b", false, DataType::Int, &[HttpMethod::Post]))
            .unwrap();
        let request = RequestContext::new("POST")
            .body_param("b", "x")
            .body_param("a", "y");

        let err = validator.validate(&request).unwrap_err();
        assert_eq!(err.details(), json!({"b": "int"}));
    }

    #[test]
    fn duplicate_names_rejected_per_method() {
        let validator = RequestValidator::new()
            .parameter(param("id", false, DataType::Int, &[HttpMethod::Get]))
            .unwrap();

        let err = validator
            .clone()
            .parameter(param("id", false, DataType::String, &[HttpMethod::Get, HttpMethod::Post]))
            .unwrap_err();
        assert_eq!(
            err,
            SpecError::DuplicateName {
                name: "id".into(),
                method: HttpMethod::Get,
            }
        );

        // Same name under a different method is a separate declaration.
        assert!(validator
            .parameter(param("id", false, DataType::String, &[HttpMethod::Post]))
            .is_ok());
    }

    #[test]
    fn describe_lists_parameters_in_order() {
        let validator = RequestValidator::new()
            .parameter(param("b", false, DataType::Bool, &[HttpMethod::Get]))
            .unwrap()
            .parameter(param("a", true, DataType::Float, &[HttpMethod::Post]))
            .unwrap();
        let names: Vec<String> = validator
            .describe()
            .into_iter()
            .map(|m| m.parameter_name)
            .collect();
        assert_eq!(names, vec!["b", "a"]);
    }
}
