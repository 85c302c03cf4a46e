//! Upstream connection descriptors.

use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;
use url::Url;

use crate::config::schema::ConnectionConfig;
use crate::connections::parameter::ParameterValue;
use crate::connections::profile::CacheProfile;
use crate::upstream::UpstreamError;

/// A named upstream service.
///
/// The registry owns one instance per name. Callers get shallow clones:
/// path, parameters and timeout are copied, while cache profiles are
/// shared behind an `Arc` and never mutated.
#[derive(Debug, Clone)]
pub struct Connection {
    name: String,
    protocol: String,
    host: String,
    path: Option<String>,
    parameters: BTreeMap<String, ParameterValue>,
    headers: BTreeMap<String, String>,
    timeout: Option<Duration>,
    profiles: Arc<BTreeMap<String, CacheProfile>>,
}

impl Connection {
    /// Create a connection with no parameters, headers or profiles.
    pub fn new(name: impl Into<String>, protocol: impl Into<String>, host: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            protocol: protocol.into(),
            host: host.into(),
            path: None,
            parameters: BTreeMap::new(),
            headers: BTreeMap::new(),
            timeout: None,
            profiles: Arc::new(BTreeMap::new()),
        }
    }

    /// Build a connection from its configuration entry.
    ///
    /// Later profiles with a repeated name replace earlier ones; validation
    /// rejects such configs before they get here.
    pub fn from_config(config: &ConnectionConfig) -> Self {
        let profiles = config
            .cache
            .iter()
            .map(|p| (p.profile.clone(), p.clone()))
            .collect();

        Self {
            name: config.name.clone(),
            protocol: config.protocol.clone(),
            host: config.host.clone(),
            path: config.path.clone(),
            parameters: config.parameters.clone(),
            headers: config.headers.clone(),
            timeout: None,
            profiles: Arc::new(profiles),
        }
    }

    pub fn with_path(mut self, path: impl Into<String>) -> Self {
        self.path = Some(path.into());
        self
    }

    pub fn with_parameter(mut self, key: impl Into<String>, value: ParameterValue) -> Self {
        self.parameters.insert(key.into(), value);
        self
    }

    pub fn with_header(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.insert(key.into(), value.into());
        self
    }

    pub fn with_profile(mut self, profile: CacheProfile) -> Self {
        Arc::make_mut(&mut self.profiles).insert(profile.profile.clone(), profile);
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn host(&self) -> &str {
        &self.host
    }

    pub fn path(&self) -> Option<&str> {
        self.path.as_deref()
    }

    pub fn headers(&self) -> &BTreeMap<String, String> {
        &self.headers
    }

    pub fn parameter(&self, key: &str) -> Option<&ParameterValue> {
        self.parameters.get(key)
    }

    pub fn timeout(&self) -> Option<Duration> {
        self.timeout
    }

    /// Look up a cache profile by name.
    pub fn profile(&self, name: &str) -> Option<&CacheProfile> {
        self.profiles.get(name)
    }

    /// Replace the path on this copy.
    pub fn set_path(&mut self, path: impl Into<String>) {
        self.path = Some(path.into());
    }

    /// Bound the upstream call made with this copy.
    pub fn set_timeout(&mut self, timeout: Duration) {
        self.timeout = Some(timeout);
    }

    /// Full request URL with resolved query parameters.
    ///
    /// Fails when a secret-backed parameter has no value.
    pub fn url(&self) -> Result<Url, UpstreamError> {
        let base = format!(
            "{}://{}{}",
            self.protocol,
            self.host,
            self.path.as_deref().unwrap_or("")
        );
        let mut url = Url::parse(&base).map_err(|e| UpstreamError::InvalidUrl {
            connection: self.name.clone(),
            reason: e.to_string(),
        })?;

        if !self.parameters.is_empty() {
            let mut query = url.query_pairs_mut();
            for (key, value) in &self.parameters {
                let resolved = value.resolve().ok_or_else(|| UpstreamError::MissingParameter {
                    connection: self.name.clone(),
                    parameter: key.clone(),
                })?;
                query.append_pair(key, &resolved);
            }
        }

        Ok(url)
    }
}
