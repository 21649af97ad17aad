//! API definitions and versions.
//!
//! An [`ApiDefinition`] is the root of a design. It holds one or more
//! [`ApiVersion`]s; the version with an empty version string is the default
//! version, which is also the only one user types are read from when
//! generating storage models.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::action::Resource;
use crate::types::{MediaType, UserType};

/// Errors raised while loading a design from its serialized form.
#[derive(Debug, Error)]
pub enum DefinitionError {
    /// The JSON text could not be decoded into a design.
    #[error("Failed to decode API definition: {0}")]
    Decode(#[from] serde_json::Error),

    /// The design declares no versions at all.
    #[error("API definition '{0}' declares no versions")]
    NoVersions(String),
}

/// One version of an API.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ApiVersion {
    /// Version string; empty for the default version.
    #[serde(default)]
    pub version: String,
    #[serde(default)]
    pub resources: Vec<Resource>,
    #[serde(default)]
    pub media_types: Vec<MediaType>,
    #[serde(default)]
    pub user_types: Vec<UserType>,
}

impl ApiVersion {
    /// Creates the default (unversioned) version.
    pub fn default_version() -> Self {
        Self::default()
    }

    pub fn new(version: impl Into<String>) -> Self {
        Self {
            version: version.into(),
            ..Self::default()
        }
    }

    pub fn is_default(&self) -> bool {
        self.version.is_empty()
    }

    pub fn resource(mut self, resource: Resource) -> Self {
        self.resources.push(resource);
        self
    }

    pub fn media_type(mut self, media_type: MediaType) -> Self {
        self.media_types.push(media_type);
        self
    }

    pub fn user_type(mut self, user_type: UserType) -> Self {
        self.user_types.push(user_type);
        self
    }

    /// Finds a media type by its exact content identifier.
    pub fn media_type_by_identifier(&self, identifier: &str) -> Option<&MediaType> {
        self.media_types
            .iter()
            .find(|m| m.identifier == identifier)
    }

    pub fn media_type_by_name(&self, name: &str) -> Option<&MediaType> {
        self.media_types.iter().find(|m| m.name() == name)
    }

    pub fn user_type_by_name(&self, name: &str) -> Option<&UserType> {
        self.user_types.iter().find(|u| u.name == name)
    }
}

/// A complete design.
///
/// ## Examples
///
/// ```
/// use modelsmith_define::{ApiDefinition, ApiVersion};
///
/// let api = ApiDefinition::new("cellar").version(ApiVersion::default_version());
/// assert!(api.default_version().is_some());
///
/// let json = serde_json::to_string(&api).unwrap();
/// let back = ApiDefinition::from_json_str(&json).unwrap();
/// assert_eq!(back.name, "cellar");
/// ```
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ApiDefinition {
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub versions: Vec<ApiVersion>,
}

impl ApiDefinition {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: String::new(),
            versions: Vec::new(),
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    pub fn version(mut self, version: ApiVersion) -> Self {
        self.versions.push(version);
        self
    }

    /// Returns the default (empty version string) version, if declared.
    pub fn default_version(&self) -> Option<&ApiVersion> {
        self.versions.iter().find(|v| v.is_default())
    }

    /// Decodes a design from JSON.
    ///
    /// ## Errors
    ///
    /// Returns `DefinitionError::Decode` for malformed JSON and
    /// `DefinitionError::NoVersions` when the design has no versions.
    pub fn from_json_str(json: &str) -> Result<Self, DefinitionError> {
        let api: ApiDefinition = serde_json::from_str(json)?;
        if api.versions.is_empty() {
            return Err(DefinitionError::NoVersions(api.name));
        }
        Ok(api)
    }
}
