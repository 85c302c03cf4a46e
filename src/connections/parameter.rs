//! Static request parameters, optionally backed by a secret.

use serde::{Deserialize, Serialize};

/// Marker used by deployments that have not configured a secret yet.
pub const BLANK: &str = "BLANK";

/// A static query parameter value.
///
/// Secrets are read from the environment each time they are resolved, so a
/// rotated value is picked up without rebuilding the registry.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(untagged)]
pub enum ParameterValue {
    /// A literal value from configuration.
    Literal(String),
    /// A value read from the named environment variable.
    Secret { env: String },
}

impl ParameterValue {
    /// Resolve the parameter to its current value.
    ///
    /// Returns `None` for a secret whose variable is not set.
    pub fn resolve(&self) -> Option<String> {
        match self {
            ParameterValue::Literal(value) => Some(value.clone()),
            ParameterValue::Secret { env } => std::env::var(env).ok(),
        }
    }

    /// True when the value is unusable: unset, empty, or the `BLANK` marker.
    pub fn is_blank(&self) -> bool {
        match self.resolve() {
            Some(value) => value.trim().is_empty() || value == BLANK,
            None => true,
        }
    }
}

impl From<&str> for ParameterValue {
    fn from(value: &str) -> Self {
        ParameterValue::Literal(value.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_literal_resolves() {
        let value = ParameterValue::from("metric");
        assert_eq!(value.resolve().as_deref(), Some("metric"));
        assert!(!value.is_blank());
    }

    #[test]
    fn test_blank_marker() {
        assert!(ParameterValue::from(BLANK).is_blank());
        assert!(ParameterValue::from("  ").is_blank());
    }

    #[test]
    fn test_missing_secret_is_blank() {
        let value = ParameterValue::Secret {
            env: "API_FANOUT_TEST_SECRET_THAT_IS_NEVER_SET".into(),
        };
        assert_eq!(value.resolve(), None);
        assert!(value.is_blank());
    }

    #[test]
    fn test_untagged_toml_forms() {
        #[derive(Deserialize)]
        struct Params {
            q: ParameterValue,
            appid: ParameterValue,
        }
        let params: Params = toml::from_str(
            r#"
            q = "Chicago"
            appid = { env = "WEATHER_API_KEY" }
            "#,
        )
        .unwrap();
        assert_eq!(params.q, ParameterValue::from("Chicago"));
        assert_eq!(params.appid, ParameterValue::Secret { env: "WEATHER_API_KEY".into() });
    }
}
