use std::fmt;
use std::str::FromStr;
use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use thiserror::Error;

/// Flags a manifest may declare.
pub const KNOWN_FLAGS: [&str; 6] = [
    "hasInstallScript",
    "hasRemovalScript",
    "hasUpdateScript",
    "developerIgnoreInstallScript",
    "developerEscalateInstallScript",
    "userEscalateInstallScript",
];

static IDENTIFIER_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[A-Za-z0-9_]+$").expect("valid identifier regex"));

/// `[A-Za-z0-9_]+`, which also rules out whitespace.
pub fn is_valid_identifier(identifier: &str) -> bool {
    IDENTIFIER_RE.is_match(identifier)
}

/// Plugin capability kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PluginType {
    Event,
    Provider,
    Gateway,
    Components,
}

impl PluginType {
    pub fn as_str(&self) -> &'static str {
        match self {
            PluginType::Event => "event",
            PluginType::Provider => "provider",
            PluginType::Gateway => "gateway",
            PluginType::Components => "components",
        }
    }
}

impl fmt::Display for PluginType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PluginType {
    type Err = DescriptorIssue;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "event" => Ok(PluginType::Event),
            "provider" => Ok(PluginType::Provider),
            "gateway" => Ok(PluginType::Gateway),
            "components" => Ok(PluginType::Components),
            other => Err(DescriptorIssue::UnknownType(other.to_string())),
        }
    }
}

/// Manifest author, either a bare name or a detailed record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Author {
    Name(String),
    Detailed {
        name: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        email: Option<String>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        url: Option<String>,
    },
}

impl Author {
    pub fn name(&self) -> &str {
        match self {
            Author::Name(name) => name,
            Author::Detailed { name, .. } => name,
        }
    }
}

/// Parsed `plugin.json`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PluginDescriptor {
    pub name: String,
    pub identifier: String,
    pub description: String,
    pub flags: Vec<String>,
    pub version: String,
    pub target: String,
    pub author: Vec<Author>,
    pub icon: String,
    pub dependencies: Vec<String>,
    #[serde(rename = "type")]
    pub kind: PluginType,
    #[serde(default)]
    pub can_deploy: bool,
}

impl PluginDescriptor {
    pub fn is_provider(&self) -> bool {
        self.kind == PluginType::Provider
    }

    /// Declared flags outside [`KNOWN_FLAGS`].
    pub fn unknown_flags(&self) -> Vec<&str> {
        self.flags
            .iter()
            .map(String::as_str)
            .filter(|flag| !KNOWN_FLAGS.contains(flag))
            .collect()
    }
}

/// Expected JSON kind of a manifest key.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldKind {
    String,
    StringArray,
    AuthorArray,
    Bool,
}

impl fmt::Display for FieldKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            FieldKind::String => "string",
            FieldKind::StringArray => "array of strings",
            FieldKind::AuthorArray => "array of authors",
            FieldKind::Bool => "boolean",
        })
    }
}

/// First problem found in a manifest.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DescriptorIssue {
    #[error("manifest is not a JSON object")]
    NotAnObject,
    #[error("missing required key '{0}'")]
    MissingField(&'static str),
    #[error("key '{key}' must be a {expected}")]
    WrongKind { key: &'static str, expected: FieldKind },
    #[error("none of the declared flags is recognized")]
    NoRecognizedFlag,
    #[error("identifier '{0}' must match [A-Za-z0-9_]+")]
    InvalidIdentifier(String),
    #[error("unknown plugin type '{0}'")]
    UnknownType(String),
    #[error("malformed manifest: {0}")]
    Malformed(String),
}

const REQUIRED_FIELDS: [(&str, FieldKind); 10] = [
    ("name", FieldKind::String),
    ("identifier", FieldKind::String),
    ("description", FieldKind::String),
    ("flags", FieldKind::StringArray),
    ("version", FieldKind::String),
    ("target", FieldKind::String),
    ("author", FieldKind::AuthorArray),
    ("icon", FieldKind::String),
    ("dependencies", FieldKind::StringArray),
    ("type", FieldKind::String),
];

fn has_kind(value: &Value, kind: FieldKind) -> bool {
    match kind {
        FieldKind::String => value.is_string(),
        FieldKind::Bool => value.is_boolean(),
        FieldKind::StringArray => value
            .as_array()
            .is_some_and(|items| items.iter().all(Value::is_string)),
        FieldKind::AuthorArray => value.as_array().is_some_and(|items| {
            items.iter().all(|item| {
                item.is_string() || item.get("name").is_some_and(Value::is_string)
            })
        }),
    }
}

fn str_field<'a>(map: &'a Map<String, Value>, key: &str) -> &'a str {
    map.get(key).and_then(Value::as_str).unwrap_or_default()
}

/// Schema check for plugin manifests.
///
/// Checks run in a fixed order: required keys and their kinds, flags,
/// identifier shape, then type. Validation never panics; the first issue
/// found is returned.
pub struct DescriptorValidator;

impl DescriptorValidator {
    pub fn validate(manifest: &Value) -> Result<(), DescriptorIssue> {
        let map = manifest.as_object().ok_or(DescriptorIssue::NotAnObject)?;

        for (key, kind) in REQUIRED_FIELDS {
            let value = map.get(key).ok_or(DescriptorIssue::MissingField(key))?;
            if !has_kind(value, kind) {
                return Err(DescriptorIssue::WrongKind { key, expected: kind });
            }
        }
        if let Some(value) = map.get("can_deploy") {
            if !value.is_boolean() {
                return Err(DescriptorIssue::WrongKind {
                    key: "can_deploy",
                    expected: FieldKind::Bool,
                });
            }
        }

        // One recognized flag is enough
        let flags = map.get("flags").and_then(Value::as_array);
        let recognized = flags.is_some_and(|flags| {
            flags
                .iter()
                .filter_map(Value::as_str)
                .any(|flag| KNOWN_FLAGS.contains(&flag))
        });
        if !recognized {
            return Err(DescriptorIssue::NoRecognizedFlag);
        }

        let identifier = str_field(map, "identifier");
        if !is_valid_identifier(identifier) {
            return Err(DescriptorIssue::InvalidIdentifier(identifier.to_string()));
        }

        str_field(map, "type").parse::<PluginType>()?;
        Ok(())
    }

    pub fn is_config_valid(manifest: &Value) -> bool {
        Self::validate(manifest).is_ok()
    }

    /// Validate, then deserialize into a [`PluginDescriptor`].
    pub fn parse(manifest: Value) -> Result<PluginDescriptor, DescriptorIssue> {
        Self::validate(&manifest)?;
        serde_json::from_value(manifest).map_err(|e| DescriptorIssue::Malformed(e.to_string()))
    }
}

/// Builder for descriptors, mostly used to write fixture manifests.
pub struct DescriptorBuilder {
    descriptor: PluginDescriptor,
}

impl DescriptorBuilder {
    pub fn new(identifier: &str, kind: PluginType) -> Self {
        Self {
            descriptor: PluginDescriptor {
                name: identifier.to_string(),
                identifier: identifier.to_string(),
                description: format!("{} plugin", identifier),
                flags: vec!["developerIgnoreInstallScript".to_string()],
                version: "0.1.0".to_string(),
                target: crate::kernel::constants::RUNTIME_VERSION.to_string(),
                author: vec![Author::Name("Unknown".to_string())],
                icon: String::new(),
                dependencies: Vec::new(),
                kind,
                can_deploy: false,
            },
        }
    }

    pub fn name(mut self, name: &str) -> Self {
        self.descriptor.name = name.to_string();
        self
    }

    pub fn description(mut self, description: &str) -> Self {
        self.descriptor.description = description.to_string();
        self
    }

    pub fn version(mut self, version: &str) -> Self {
        self.descriptor.version = version.to_string();
        self
    }

    pub fn author(mut self, author: Author) -> Self {
        self.descriptor.author.push(author);
        self
    }

    /// Replace the flag list.
    pub fn flags(mut self, flags: &[&str]) -> Self {
        self.descriptor.flags = flags.iter().map(|f| f.to_string()).collect();
        self
    }

    pub fn dependency(mut self, dependency: &str) -> Self {
        self.descriptor.dependencies.push(dependency.to_string());
        self
    }

    pub fn can_deploy(mut self, can_deploy: bool) -> Self {
        self.descriptor.can_deploy = can_deploy;
        self
    }

    pub fn build(self) -> PluginDescriptor {
        self.descriptor
    }

    pub fn to_json(&self) -> Value {
        serde_json::to_value(&self.descriptor).unwrap_or(Value::Null)
    }
}
