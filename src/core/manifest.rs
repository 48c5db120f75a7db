use crate::core::UpdatePackage;
use serde::{Deserialize, Serialize};

/// Manifest schema version. Injected through `UpdateManifest::new` so the
/// literal is part of the constructor's contract.
pub const API_VERSION: &str = "v1alpha1";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Os {
    #[serde(rename = "type")]
    pub os_type: String,
    pub version: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OsConfig {
    pub arch: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Metadata {
    pub os: Os,
    pub config: OsConfig,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UpdateManifest {
    #[serde(rename = "apiVersion")]
    pub api_version: String,
    pub metadata: Metadata,
    pub updates: Vec<UpdatePackage>,
}

impl UpdateManifest {
    pub fn new(api_version: &str, metadata: Metadata, updates: Vec<UpdatePackage>) -> Self {
        Self {
            api_version: api_version.to_string(),
            metadata,
            updates,
        }
    }
}
