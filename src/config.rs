//! Endpoint declarations loaded from JSON.
//!
//! ```json
//! {
//!   "allowed_methods": ["GET", "POST"],
//!   "parameters": [
//!     { "name": "id", "required": true, "type": "int", "methods": ["GET"] }
//!   ],
//!   "wrapper": { "status": "{{ response_code }}", "result": "{{ data }}" }
//! }
//! ```

use std::path::Path;

use serde::Deserialize;
use serde_json::{Map, Value};

use crate::api::Api;
use crate::error::{ConfigError, SpecError};
use crate::parameter::ParameterSpec;
use crate::request::RequestContext;
use crate::types::{DataType, HttpMethod};
use crate::validator::RequestValidator;
use crate::wrapper::WrapperTemplate;

/// One declared endpoint.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct EndpointConfig {
    pub allowed_methods: Vec<HttpMethod>,
    #[serde(default)]
    pub parameters: Vec<ParameterDecl>,
    #[serde(default)]
    pub wrapper: Option<Map<String, Value>>,
}

/// One declared parameter, as written in the file.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ParameterDecl {
    pub name: String,
    #[serde(default)]
    pub required: bool,
    #[serde(rename = "type")]
    pub data_type: DataType,
    #[serde(default)]
    pub methods: Vec<HttpMethod>,
}

impl ParameterDecl {
    /// # Errors
    ///
    /// Returns `SpecError` if the declaration is not a valid parameter.
    pub fn to_spec(&self) -> Result<ParameterSpec, SpecError> {
        ParameterSpec::builder()
            .name(&self.name)
            .required(self.required)
            .data_type(self.data_type)
            .methods(self.methods.iter().copied())?
            .build()
    }
}

impl EndpointConfig {
    /// Build the validator for this endpoint.
    ///
    /// # Errors
    ///
    /// Returns the first `SpecError` among the declared parameters.
    pub fn validator(&self) -> Result<RequestValidator, SpecError> {
        self.parameters.iter().try_fold(
            RequestValidator::new().allow_methods(self.allowed_methods.iter().copied()),
            |validator, decl| validator.parameter(decl.to_spec()?),
        )
    }

    pub fn wrapper_template(&self) -> Option<WrapperTemplate> {
        self.wrapper.clone().map(WrapperTemplate::new)
    }

    /// Bind this endpoint to a request.
    ///
    /// # Errors
    ///
    /// See [`EndpointConfig::validator`].
    pub fn api(&self, request: RequestContext) -> Result<Api, SpecError> {
        let api = Api::with_validator(request, self.validator()?);
        Ok(match self.wrapper_template() {
            Some(wrapper) => api.wrapper(wrapper),
            None => api,
        })
    }
}

/// Load an endpoint declaration from a file.
///
/// # Errors
///
/// Returns `ConfigError::FileNotFound` if the file doesn't exist,
/// or `ConfigError::InvalidJson` if it isn't a valid declaration.
pub fn load_config(path: &Path) -> Result<EndpointConfig, ConfigError> {
    if !path.exists() {
        return Err(ConfigError::FileNotFound {
            path: path.to_path_buf(),
        });
    }

    let content = std::fs::read_to_string(path).map_err(|source| ConfigError::ReadError {
        path: path.to_path_buf(),
        source,
    })?;

    load_config_str(&content)
}

/// Load an endpoint declaration from a JSON string.
///
/// # Errors
///
/// Returns `ConfigError::InvalidJson` if the string isn't a valid declaration.
pub fn load_config_str(content: &str) -> Result<EndpointConfig, ConfigError> {
    serde_json::from_str(content).map_err(|source| ConfigError::InvalidJson { source })
}
