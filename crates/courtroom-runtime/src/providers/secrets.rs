//! API key handling.
//!
//! A key is resolved once, when the provider is built: the provider setting
//! wins, then the environment variable. A blank key is refused at that point
//! rather than surfacing later as a 401 from the backend.
//!
//! The resolved key only leaves [`ApiCredential`] through
//! [`ApiCredential::expose`], when the `Authorization` header is built.

use secrecy::{ExposeSecret, SecretString};
use serde_json::Value as JsonValue;
use std::fmt;

use super::ProviderError;

/// Where a key was resolved from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyOrigin {
    /// `settings.<key>` in the provider config, or the CLI `--api-key` flag
    Settings,
    Environment,
    /// Handed to a provider constructor in code
    Inline,
}

impl fmt::Display for KeyOrigin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            KeyOrigin::Settings => "provider settings",
            KeyOrigin::Environment => "environment",
            KeyOrigin::Inline => "inline",
        })
    }
}

pub struct ApiCredential {
    key: SecretString,
    origin: KeyOrigin,
}

impl ApiCredential {
    /// Wrap a key passed in code. Not checked; see [`ApiCredential::is_blank`].
    pub fn inline(key: impl Into<String>) -> Self {
        Self {
            key: SecretString::from(key.into()),
            origin: KeyOrigin::Inline,
        }
    }

    /// Resolve a key from `settings[setting]`, falling back to `env_var`.
    ///
    /// A setting that is present but blank does not fall back: an explicit
    /// empty `--api-key ""` is an error, not a request for the env value.
    /// Surrounding whitespace is stripped.
    pub fn resolve(
        settings: &JsonValue,
        setting: &str,
        env_var: &str,
    ) -> Result<Self, ProviderError> {
        if let Some(raw) = settings.get(setting).and_then(JsonValue::as_str) {
            return Self::non_blank(raw, KeyOrigin::Settings).ok_or_else(|| {
                ProviderError::NotConfigured(format!("provider setting '{setting}' is blank"))
            });
        }

        match std::env::var(env_var) {
            Ok(raw) => Self::non_blank(&raw, KeyOrigin::Environment).ok_or_else(|| {
                ProviderError::NotConfigured(format!("{env_var} is set but blank"))
            }),
            Err(_) => Err(ProviderError::NotConfigured(format!(
                "API key required: set '{setting}' in provider settings or {env_var}"
            ))),
        }
    }

    fn non_blank(raw: &str, origin: KeyOrigin) -> Option<Self> {
        let key = raw.trim();
        (!key.is_empty()).then(|| Self {
            key: SecretString::from(key.to_string()),
            origin,
        })
    }

    pub fn expose(&self) -> &str {
        self.key.expose_secret()
    }

    /// Only possible for inline keys; resolved keys are never blank.
    pub fn is_blank(&self) -> bool {
        self.key.expose_secret().trim().is_empty()
    }

    pub fn origin(&self) -> KeyOrigin {
        self.origin
    }
}

impl fmt::Debug for ApiCredential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("ApiCredential")
            .field(&self.origin)
            .field(&"[REDACTED]")
            .finish()
    }
}

impl fmt::Display for ApiCredential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "API key from {} [REDACTED]", self.origin)
    }
}
