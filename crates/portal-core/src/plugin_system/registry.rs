use std::collections::{HashMap, HashSet};
use std::fmt;
use std::sync::Arc;

use tokio::sync::RwLock;

use crate::plugin_system::catalog::PluginFactory;
use crate::plugin_system::error::PluginSystemError;
use crate::plugin_system::manifest::PluginDescriptor;
use crate::plugin_system::traits::Plugin;

/// Registry shared between the loader, the resolver and the order pipeline.
pub type SharedPluginRegistry = Arc<RwLock<PluginRegistry>>;

/// In-process state of plugins admitted during this process lifetime.
///
/// Identifiers are unique: admitting one twice is an error and never
/// overwrites the first admission.
#[derive(Default)]
pub struct PluginRegistry {
    /// Admission order.
    loaded: Vec<String>,
    descriptors: HashMap<String, PluginDescriptor>,
    /// Providers whose manifest sets `can_deploy`.
    deployable: HashSet<String>,
    /// Provider factories, looked up by the capability resolver.
    providers: HashMap<String, PluginFactory>,
    instances: HashMap<String, Arc<dyn Plugin>>,
}

impl fmt::Debug for PluginRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PluginRegistry")
            .field("loaded", &self.loaded)
            .field("deployable", &self.deployable)
            .field("providers", &self.providers.keys().collect::<Vec<_>>())
            .finish()
    }
}

impl PluginRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn shared() -> SharedPluginRegistry {
        Arc::new(RwLock::new(Self::new()))
    }

    pub fn admit(
        &mut self,
        descriptor: PluginDescriptor,
        instance: Option<Arc<dyn Plugin>>,
        factory: Option<PluginFactory>,
    ) -> Result<(), PluginSystemError> {
        let id = descriptor.identifier.clone();
        if self.descriptors.contains_key(&id) {
            return Err(PluginSystemError::DuplicateIdentifier(id));
        }

        if descriptor.can_deploy {
            self.deployable.insert(id.clone());
        }
        if descriptor.is_provider() {
            if let Some(factory) = factory {
                self.providers.insert(id.clone(), factory);
            }
        }
        if let Some(instance) = instance {
            self.instances.insert(id.clone(), instance);
        }
        self.descriptors.insert(id.clone(), descriptor);
        self.loaded.push(id);
        Ok(())
    }

    /// Undo an admission. Returns whether `identifier` was admitted.
    pub fn remove(&mut self, identifier: &str) -> bool {
        if self.descriptors.remove(identifier).is_none() {
            return false;
        }
        self.loaded.retain(|id| id != identifier);
        self.deployable.remove(identifier);
        self.providers.remove(identifier);
        self.instances.remove(identifier);
        true
    }

    pub fn is_loaded(&self, identifier: &str) -> bool {
        self.descriptors.contains_key(identifier)
    }

    /// Identifiers in admission order.
    pub fn loaded(&self) -> &[String] {
        &self.loaded
    }

    pub fn loaded_set(&self) -> HashSet<String> {
        self.loaded.iter().cloned().collect()
    }

    pub fn descriptor(&self, identifier: &str) -> Option<&PluginDescriptor> {
        self.descriptors.get(identifier)
    }

    pub fn is_deployable(&self, identifier: &str) -> bool {
        self.deployable.contains(identifier)
    }

    pub fn deployable(&self) -> &HashSet<String> {
        &self.deployable
    }

    pub fn provider_factory(&self, identifier: &str) -> Option<PluginFactory> {
        self.providers.get(identifier).cloned()
    }

    pub fn instance(&self, identifier: &str) -> Option<Arc<dyn Plugin>> {
        self.instances.get(identifier).cloned()
    }

    pub fn plugin_count(&self) -> usize {
        self.loaded.len()
    }
}
