//! VPS provider plugin.
//!
//! Asks for a server name and an optional root password at checkout and
//! hands back a deterministic server reference on deploy.
use std::sync::Arc;

use async_trait::async_trait;
use log::info;
use portal_core::plugin_system::provider::{
    DeployError, DeploymentReceipt, DeploymentRequest, FieldSpec, FieldSpecMap, FieldType, Provider,
};
use portal_core::plugin_system::Plugin;

/// Identifier in `plugin.json` and the catalog.
pub const IDENTIFIER: &str = "vps_provider";

pub const SERVER_NAME_FIELD: &str = "server_name";
pub const ROOT_PASSWORD_FIELD: &str = "root_password";

const MAX_SERVER_NAME_LEN: usize = 63;

#[derive(Debug, Default)]
pub struct VpsProviderPlugin {
    provider: Arc<VpsProvider>,
}

impl Plugin for VpsProviderPlugin {
    fn identifier(&self) -> &str {
        IDENTIFIER
    }

    fn provider(&self) -> Option<Arc<dyn Provider>> {
        Some(Arc::clone(&self.provider) as Arc<dyn Provider>)
    }
}

/// Catalog factory.
pub fn factory() -> Box<dyn Plugin> {
    Box::new(VpsProviderPlugin::default())
}

#[derive(Debug, Default)]
pub struct VpsProvider;

impl VpsProvider {
    fn server_name<'a>(&self, request: &'a DeploymentRequest) -> Result<&'a str, DeployError> {
        let name = request
            .config
            .get(SERVER_NAME_FIELD)
            .map(|name| name.trim())
            .filter(|name| !name.is_empty())
            .ok_or_else(|| DeployError::Rejected(format!("order {} has no {}", request.order.id, SERVER_NAME_FIELD)))?;

        // Hostname label rules
        let valid = name.len() <= MAX_SERVER_NAME_LEN
            && !name.starts_with('-')
            && !name.ends_with('-')
            && name.chars().all(|c| c.is_ascii_alphanumeric() || c == '-');
        if !valid {
            return Err(DeployError::Rejected(format!("'{}' is not a valid server name", name)));
        }
        Ok(name)
    }
}

#[async_trait]
impl Provider for VpsProvider {
    fn order_requirements(&self) -> FieldSpecMap {
        FieldSpecMap::new()
            .with(
                SERVER_NAME_FIELD,
                FieldSpec::required(FieldType::Text, "Server name").with_placeholder("web-01"),
            )
            .with(
                ROOT_PASSWORD_FIELD,
                FieldSpec::optional(FieldType::Password, "Root password"),
            )
    }

    async fn deploy(&self, request: &DeploymentRequest) -> Result<DeploymentReceipt, DeployError> {
        let name = self.server_name(request)?;
        let reference = format!("vps-{}-{}", request.order.id, name);
        info!(
            "[VpsProvider] Provisioning '{}' for order {} ({} days, service '{}')",
            name, request.order.id, request.order.days_left, request.service.uri
        );
        Ok(DeploymentReceipt {
            message: format!("server {} provisioned", reference),
            reference: Some(reference),
        })
    }
}

#[cfg(test)]
mod tests;
