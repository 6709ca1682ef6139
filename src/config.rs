//! Instrumentation configuration.
//!
//! Every field except `debug` is required; [`TelemetryConfigBuilder::build`]
//! fails fast on a missing one so misconfiguration surfaces at setup time,
//! before any request is instrumented.

use thiserror::Error;

/// Validated instrumentation configuration.
#[derive(Clone, Debug)]
pub struct TelemetryConfig {
    api_key: String,
    service_name: String,
    service_version: String,
    collector_url: String,
    debug: bool,
}

impl TelemetryConfig {
    /// Starts building a [`TelemetryConfig`].
    pub fn builder() -> TelemetryConfigBuilder {
        TelemetryConfigBuilder::default()
    }

    /// API key sent to the collector by the export pipeline.
    pub fn api_key(&self) -> &str {
        &self.api_key
    }

    /// Logical name of the instrumented service.
    pub fn service_name(&self) -> &str {
        &self.service_name
    }

    /// Version of the instrumented service.
    pub fn service_version(&self) -> &str {
        &self.service_version
    }

    /// Collector endpoint. Requests whose URL contains this value are never
    /// traced.
    pub fn collector_url(&self) -> &str {
        &self.collector_url
    }

    /// Whether instrumentation-internal debug logging is enabled.
    pub fn debug(&self) -> bool {
        self.debug
    }
}

/// Builder for [`TelemetryConfig`].
#[derive(Debug, Default)]
pub struct TelemetryConfigBuilder {
    api_key: Option<String>,
    service_name: Option<String>,
    service_version: Option<String>,
    collector_url: Option<String>,
    debug: bool,
}

impl TelemetryConfigBuilder {
    /// Assign the collector API key.
    pub fn with_api_key<T: Into<String>>(mut self, api_key: T) -> Self {
        self.api_key = Some(api_key.into());
        self
    }

    /// Assign the service name recorded for this process.
    pub fn with_service_name<T: Into<String>>(mut self, name: T) -> Self {
        self.service_name = Some(name.into());
        self
    }

    /// Assign the service version recorded for this process.
    pub fn with_service_version<T: Into<String>>(mut self, version: T) -> Self {
        self.service_version = Some(version.into());
        self
    }

    /// Assign the collector endpoint used for loop prevention.
    pub fn with_collector_url<T: Into<String>>(mut self, url: T) -> Self {
        self.collector_url = Some(url.into());
        self
    }

    /// Enable instrumentation-internal debug logging.
    pub fn with_debug(mut self, debug: bool) -> Self {
        self.debug = debug;
        self
    }

    /// Validate and build the configuration.
    ///
    /// An unset or empty required field is a [`ConfigError::MissingField`];
    /// no recovery is attempted.
    pub fn build(self) -> Result<TelemetryConfig, ConfigError> {
        Ok(TelemetryConfig {
            api_key: required(self.api_key, "api_key")?,
            service_name: required(self.service_name, "service_name")?,
            service_version: required(self.service_version, "service_version")?,
            collector_url: required(self.collector_url, "collector_url")?,
            debug: self.debug,
        })
    }
}

fn required(value: Option<String>, field: &'static str) -> Result<String, ConfigError> {
    match value {
        Some(value) if !value.is_empty() => Ok(value),
        _ => Err(ConfigError::MissingField(field)),
    }
}

/// Errors raised while validating a [`TelemetryConfig`].
#[derive(Debug, Error, PartialEq, Eq)]
#[non_exhaustive]
pub enum ConfigError {
    /// A required configuration field was not supplied or was empty.
    #[error("missing required configuration field `{0}`")]
    MissingField(&'static str),
}
