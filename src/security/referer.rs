//! Referer allow-list.

use url::Url;

/// Accepts requests whose referer host ends with an allowed suffix.
#[derive(Debug, Clone, Default)]
pub struct RefererPolicy {
    allowed: Vec<String>,
}

impl RefererPolicy {
    pub fn new(allowed: Vec<String>) -> Self {
        let allowed = allowed
            .into_iter()
            .map(|entry| entry.trim().to_ascii_lowercase())
            .filter(|entry| !entry.is_empty())
            .collect();
        Self { allowed }
    }

    /// An empty allow-list accepts everything, including a missing referer.
    pub fn is_allowed(&self, referer: &str) -> bool {
        if self.allowed.is_empty() {
            return true;
        }

        let host = match Url::parse(referer.trim()) {
            Ok(url) => url.host_str().map(str::to_ascii_lowercase),
            Err(_) => None,
        };

        match host {
            Some(host) => self.allowed.iter().any(|suffix| host.ends_with(suffix.as_str())),
            None => false,
        }
    }
}
