use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use crate::plugin_system::error::PluginSystemError;
use crate::plugin_system::traits::Plugin;

/// Constructs a fresh plugin instance.
pub type PluginFactory = Arc<dyn Fn() -> Box<dyn Plugin> + Send + Sync>;

/// Compiled-in plugins by identifier.
///
/// The binary fills the catalog before loading; the loader only instantiates
/// plugins whose manifest was admitted. An identifier without a catalog
/// entry can still be admitted, it just has no hooks and no provider.
#[derive(Clone, Default)]
pub struct PluginCatalog {
    factories: BTreeMap<String, PluginFactory>,
}

impl fmt::Debug for PluginCatalog {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PluginCatalog")
            .field("identifiers", &self.identifiers())
            .finish()
    }
}

impl PluginCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register<F>(&mut self, identifier: &str, factory: F) -> Result<(), PluginSystemError>
    where
        F: Fn() -> Box<dyn Plugin> + Send + Sync + 'static,
    {
        if self.factories.contains_key(identifier) {
            return Err(PluginSystemError::RegistrationError {
                plugin_id: identifier.to_string(),
                message: "already registered in the catalog".to_string(),
            });
        }
        self.factories.insert(identifier.to_string(), Arc::new(factory));
        Ok(())
    }

    /// Builder-style [`register`](Self::register).
    pub fn with<F>(mut self, identifier: &str, factory: F) -> Result<Self, PluginSystemError>
    where
        F: Fn() -> Box<dyn Plugin> + Send + Sync + 'static,
    {
        self.register(identifier, factory)?;
        Ok(self)
    }

    pub fn get(&self, identifier: &str) -> Option<PluginFactory> {
        self.factories.get(identifier).cloned()
    }

    pub fn contains(&self, identifier: &str) -> bool {
        self.factories.contains_key(identifier)
    }

    pub fn instantiate(&self, identifier: &str) -> Option<Box<dyn Plugin>> {
        self.factories.get(identifier).map(|factory| factory())
    }

    pub fn identifiers(&self) -> Vec<&str> {
        self.factories.keys().map(String::as_str).collect()
    }
}
