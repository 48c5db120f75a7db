use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UpdatePackage {
    pub name: String,
    #[serde(rename = "installedVersion")]
    pub installed_version: String,
    #[serde(rename = "fixedVersion")]
    pub fixed_version: String,
    #[serde(rename = "vulnerabilityID")]
    pub vulnerability_id: String,
}
