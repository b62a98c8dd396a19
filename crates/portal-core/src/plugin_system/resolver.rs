use std::sync::Arc;

use crate::plugin_system::provider::{FieldSpecMap, Provider};
use crate::plugin_system::registry::SharedPluginRegistry;

/// Turns a plugin identifier into a live [`Provider`].
///
/// Lookups go through the factory map the loader filled at admission, so a
/// missing provider is a plain lookup miss. Nothing is cached: every call
/// builds a fresh plugin instance from its factory.
#[derive(Clone)]
pub struct CapabilityResolver {
    registry: SharedPluginRegistry,
}

impl CapabilityResolver {
    pub fn new(registry: SharedPluginRegistry) -> Self {
        Self { registry }
    }

    /// `None` unless `identifier` was admitted with `type = provider` and its
    /// implementation exposes the provider capability.
    pub async fn resolve_provider(&self, identifier: &str) -> Option<Arc<dyn Provider>> {
        let factory = {
            let registry = self.registry.read().await;
            let descriptor = registry.descriptor(identifier)?;
            if !descriptor.is_provider() {
                log::debug!("[CapabilityResolver] '{}' is not a provider plugin", identifier);
                return None;
            }
            registry.provider_factory(identifier)
        };

        let Some(factory) = factory else {
            log::warn!("[CapabilityResolver] Provider '{}' has no compiled-in implementation", identifier);
            return None;
        };

        let provider = factory().provider();
        if provider.is_none() {
            log::warn!(
                "[CapabilityResolver] Plugin '{}' does not expose the provider capability",
                identifier
            );
        }
        provider
    }

    /// Field contract of a provider, if it resolves.
    pub async fn order_requirements(&self, identifier: &str) -> Option<FieldSpecMap> {
        self.resolve_provider(identifier)
            .await
            .map(|provider| provider.order_requirements())
    }
}
