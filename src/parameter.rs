//! Declarations of accepted request parameters.

use serde::Serialize;

use crate::error::SpecError;
use crate::types::{DataType, HttpMethod};

/// One accepted request parameter.
///
/// Built once at endpoint setup through [`ParameterSpec::builder`] and
/// immutable afterwards.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParameterSpec {
    name: String,
    required: bool,
    data_type: DataType,
    methods: Vec<HttpMethod>,
}

/// Validation metadata for a [`ParameterSpec`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ParameterMeta {
    pub parameter_name: String,
    pub is_required: bool,
    pub data_type: DataType,
    pub allowed_methods: Vec<HttpMethod>,
}

impl ParameterSpec {
    pub fn builder() -> ParameterSpecBuilder {
        ParameterSpecBuilder::default()
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn is_required(&self) -> bool {
        self.required
    }

    pub fn data_type(&self) -> DataType {
        self.data_type
    }

    pub fn methods(&self) -> &[HttpMethod] {
        &self.methods
    }

    /// Whether the parameter is accepted in the given request source.
    pub fn applies_to(&self, method: HttpMethod) -> bool {
        self.methods.contains(&method)
    }

    pub fn describe(&self) -> ParameterMeta {
        ParameterMeta {
            parameter_name: self.name.clone(),
            is_required: self.required,
            data_type: self.data_type,
            allowed_methods: self.methods.clone(),
        }
    }
}

/// Fluent builder for [`ParameterSpec`].
///
/// ```
/// use json_endpoint::{DataType, HttpMethod, ParameterSpec};
///
/// let spec = ParameterSpec::builder()
///     .name("id")
///     .required(true)
///     .data_type(DataType::Int)
///     .methods([HttpMethod::Get])
///     .unwrap()
///     .build()
///     .unwrap();
///
/// assert!(spec.applies_to(HttpMethod::Get));
/// assert!(!spec.applies_to(HttpMethod::Post));
/// ```
#[derive(Debug, Clone, Default)]
pub struct ParameterSpecBuilder {
    name: Option<String>,
    required: bool,
    data_type: Option<DataType>,
    methods: Vec<HttpMethod>,
}

impl ParameterSpecBuilder {
    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// Defaults to false.
    pub fn required(mut self, required: bool) -> Self {
        self.required = required;
        self
    }

    pub fn data_type(mut self, data_type: DataType) -> Self {
        self.data_type = Some(data_type);
        self
    }

    /// Scope the parameter to request sources.
    ///
    /// # Errors
    ///
    /// Returns `SpecError::DisallowedMethod` if any method is not GET or POST.
    pub fn methods<I>(mut self, methods: I) -> Result<Self, SpecError>
    where
        I: IntoIterator<Item = HttpMethod>,
    {
        let mut scoped = Vec::new();
        for method in methods {
            if !method.is_parameter_method() {
                return Err(SpecError::DisallowedMethod {
                    name: self.name.clone().unwrap_or_default(),
                    method,
                });
            }
            if !scoped.contains(&method) {
                scoped.push(method);
            }
        }
        self.methods = scoped;
        Ok(self)
    }

    /// # Errors
    ///
    /// Returns `SpecError::MissingName` or `SpecError::MissingDataType` if
    /// either was never set.
    pub fn build(self) -> Result<ParameterSpec, SpecError> {
        let name = match self.name {
            Some(name) if !name.is_empty() => name,
            _ => return Err(SpecError::MissingName),
        };
        let data_type = self
            .data_type
            .ok_or_else(|| SpecError::MissingDataType { name: name.clone() })?;

        Ok(ParameterSpec {
            name,
            required: self.required,
            data_type,
            methods: self.methods,
        })
    }
}
