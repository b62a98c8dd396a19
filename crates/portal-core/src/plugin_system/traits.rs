use std::sync::Arc;

use crate::event::EventBus;
use crate::plugin_system::error::PluginSystemError;
use crate::plugin_system::provider::Provider;

/// A compiled-in plugin.
///
/// The manifest in the plugin's directory decides whether it is admitted;
/// this trait supplies its behaviour once it is.
pub trait Plugin: Send + Sync {
    /// Must equal the manifest identifier.
    fn identifier(&self) -> &str;

    /// Subscribe listeners. Called once, right after admission.
    fn register_events(&self, _bus: &EventBus) -> Result<(), PluginSystemError> {
        Ok(())
    }

    /// The provider capability, for `provider` plugins.
    fn provider(&self) -> Option<Arc<dyn Provider>> {
        None
    }
}
