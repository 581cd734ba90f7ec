//! Provider registry: build an [`LlmProvider`] from its type name and settings.
//!
//! ```ignore
//! let registry = ProviderRegistry::with_defaults();
//! let provider = registry.create_from_config(&config.provider)?;
//! ```

use std::collections::BTreeMap;
use std::sync::Arc;

use serde_json::Value as JsonValue;

use super::{LlmProvider, ProviderError};
use crate::config::ProviderConfig;

/// Creates providers of one type from JSON settings.
pub trait ProviderFactory: Send + Sync {
    /// Type name used in `provider.type`, e.g. "groq".
    fn provider_type(&self) -> &'static str;

    fn create(&self, settings: &JsonValue) -> Result<Arc<dyn LlmProvider>, ProviderError>;

    /// Check settings without constructing a provider.
    fn validate_config(&self, settings: &JsonValue) -> Result<(), ProviderError>;

    fn default_config(&self) -> JsonValue {
        serde_json::json!({})
    }
}

/// Provider factories keyed by type name.
#[derive(Default)]
pub struct ProviderRegistry {
    factories: BTreeMap<String, Arc<dyn ProviderFactory>>,
}

impl ProviderRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a factory, replacing any factory with the same type name.
    pub fn register(&mut self, factory: Arc<dyn ProviderFactory>) {
        self.factories
            .insert(factory.provider_type().to_string(), factory);
    }

    pub fn create(
        &self,
        provider_type: &str,
        settings: &JsonValue,
    ) -> Result<Arc<dyn LlmProvider>, ProviderError> {
        self.factory(provider_type)?.create(settings)
    }

    /// Build the provider described by the `provider` section of a runtime config.
    pub fn create_from_config(
        &self,
        config: &ProviderConfig,
    ) -> Result<Arc<dyn LlmProvider>, ProviderError> {
        self.create(&config.provider_type, &config.settings)
    }

    pub fn validate(&self, provider_type: &str, settings: &JsonValue) -> Result<(), ProviderError> {
        self.factory(provider_type)?.validate_config(settings)
    }

    pub fn available_types(&self) -> Vec<&str> {
        self.factories.keys().map(|s| s.as_str()).collect()
    }

    pub fn has_provider(&self, provider_type: &str) -> bool {
        self.factories.contains_key(provider_type)
    }

    pub fn default_config(&self, provider_type: &str) -> Option<JsonValue> {
        self.factories
            .get(provider_type)
            .map(|f| f.default_config())
    }

    fn factory(&self, provider_type: &str) -> Result<&Arc<dyn ProviderFactory>, ProviderError> {
        self.factories.get(provider_type).ok_or_else(|| {
            ProviderError::NotConfigured(format!(
                "Unknown provider type: '{}'. Available: {:?}",
                provider_type,
                self.available_types()
            ))
        })
    }

    /// Registry with every built-in provider registered.
    #[cfg(feature = "groq")]
    pub fn with_defaults() -> Self {
        let mut registry = Self::new();
        registry.register(Arc::new(super::GroqProviderFactory));
        registry
    }

    /// Registry with every built-in provider registered.
    #[cfg(not(feature = "groq"))]
    pub fn with_defaults() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for ProviderRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProviderRegistry")
            .field("providers", &self.available_types())
            .finish()
    }
}
