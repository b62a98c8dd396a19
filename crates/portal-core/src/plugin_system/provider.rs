//! The provider capability: the contract a `provider` plugin fulfills orders through.
use std::collections::BTreeMap;
use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::storage::error::StorageSystemError;
use crate::storage::models::{Order, RowId, Service};

/// Input widget kind of a required or optional order field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FieldType {
    Text,
    Textarea,
    Number,
    Password,
    Email,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldSpec {
    #[serde(rename = "type")]
    pub field_type: FieldType,
    pub label: String,
    pub required: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub placeholder: Option<String>,
}

impl FieldSpec {
    pub fn required(field_type: FieldType, label: &str) -> Self {
        Self {
            field_type,
            label: label.to_string(),
            required: true,
            placeholder: None,
        }
    }

    pub fn optional(field_type: FieldType, label: &str) -> Self {
        Self {
            required: false,
            ..Self::required(field_type, label)
        }
    }

    pub fn with_placeholder(mut self, placeholder: &str) -> Self {
        self.placeholder = Some(placeholder.to_string());
        self
    }
}

/// Field key to spec, in declaration order. Required fields are checked in
/// this order, so the first missing one is deterministic.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldSpecMap {
    fields: Vec<(String, FieldSpec)>,
}

impl FieldSpecMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style insert.
    pub fn with(mut self, key: &str, spec: FieldSpec) -> Self {
        self.insert(key, spec);
        self
    }

    /// Insert or replace; a replaced key keeps its position.
    pub fn insert(&mut self, key: &str, spec: FieldSpec) {
        match self.fields.iter_mut().find(|(k, _)| k == key) {
            Some((_, existing)) => *existing = spec,
            None => self.fields.push((key.to_string(), spec)),
        }
    }

    pub fn get(&self, key: &str) -> Option<&FieldSpec> {
        self.fields.iter().find(|(k, _)| k == key).map(|(_, spec)| spec)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &FieldSpec)> {
        self.fields.iter().map(|(k, spec)| (k.as_str(), spec))
    }

    /// Keys of required fields, in declaration order.
    pub fn required(&self) -> impl Iterator<Item = &str> {
        self.iter().filter(|(_, spec)| spec.required).map(|(k, _)| k)
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}

/// Everything a provider gets to fulfill one order.
#[derive(Debug, Clone)]
pub struct DeploymentRequest {
    pub order: Order,
    pub service: Service,
    /// Persisted order configuration.
    pub config: BTreeMap<String, String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct DeploymentReceipt {
    /// Provider-side reference of the provisioned resource.
    pub reference: Option<String>,
    pub message: String,
}

#[derive(Debug, Error)]
pub enum DeployError {
    #[error("Provider rejected the deployment: {0}")]
    Rejected(String),

    #[error("Provider unavailable: {0}")]
    Unavailable(String),

    #[error("Deployment timed out after {0:?}")]
    TimedOut(Duration),

    #[error("Provider '{0}' is not allowed to deploy")]
    NotDeployable(String),

    #[error("Provider '{0}' could not be resolved")]
    ProviderNotFound(String),

    #[error("Service {0} not found")]
    ServiceNotFound(RowId),

    #[error("Storage failure during deployment: {0}")]
    Storage(#[from] StorageSystemError),

    #[error("Deployment failed: {0}")]
    Other(String),
}

/// Order fulfillment capability.
#[async_trait]
pub trait Provider: Send + Sync {
    /// Fields a user must (or may) submit when ordering a service from this provider.
    fn order_requirements(&self) -> FieldSpecMap;

    /// Provision the ordered resource.
    async fn deploy(&self, request: &DeploymentRequest) -> Result<DeploymentReceipt, DeployError>;
}
