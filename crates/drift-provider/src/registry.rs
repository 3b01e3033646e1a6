use std::collections::HashMap;
use std::sync::Arc;

use drift_domain::Provider as ProviderKind;

use crate::error::ProviderError;
use crate::provider::Provider;

/// Dispatches discovery calls to the correct cloud-specific [`Provider`]
/// implementation, keyed by [`ProviderKind`].
pub struct ProviderRegistry {
    providers: HashMap<ProviderKind, Arc<dyn Provider>>,
}

impl ProviderRegistry {
    pub fn new() -> Self {
        Self {
            providers: HashMap::new(),
        }
    }

    /// Register an adapter for a cloud. Returns `&mut self` for chaining.
    pub fn register(&mut self, kind: ProviderKind, provider: Arc<dyn Provider>) -> &mut Self {
        self.providers.insert(kind, provider);
        self
    }

    pub fn for_provider(&self, kind: ProviderKind) -> Result<Arc<dyn Provider>, ProviderError> {
        self.providers
            .get(&kind)
            .cloned()
            .ok_or_else(|| ProviderError::NotConfigured(kind.to_string()))
    }

    /// Clouds that currently have a registered adapter.
    pub fn active_providers(&self) -> Vec<ProviderKind> {
        self.providers.keys().copied().collect()
    }
}

impl Default for ProviderRegistry {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::local::LocalProvider;

    #[test]
    fn for_provider_returns_registered_adapter() {
        let mut registry = ProviderRegistry::new();
        registry.register(ProviderKind::Local, Arc::new(LocalProvider::new(1)));
        assert!(registry.for_provider(ProviderKind::Local).is_ok());
    }

    #[test]
    fn for_provider_errors_when_unregistered() {
        let registry = ProviderRegistry::new();
        let result = registry.for_provider(ProviderKind::Aws);
        assert!(matches!(result, Err(ProviderError::NotConfigured(_))));
    }

    #[test]
    fn active_providers_lists_registered_kinds() {
        let mut registry = ProviderRegistry::new();
        registry.register(ProviderKind::Local, Arc::new(LocalProvider::new(1)));
        registry.register(ProviderKind::Aws, Arc::new(LocalProvider::new(1)));
        let mut active = registry.active_providers();
        active.sort_by_key(|k| k.to_string());
        assert_eq!(active.len(), 2);
    }
}
