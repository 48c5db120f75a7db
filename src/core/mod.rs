mod manifest;
mod policy;
mod update;

pub use manifest::{API_VERSION, Metadata, Os, OsConfig, UpdateManifest};
pub use policy::VulnIdPolicy;
pub use update::UpdatePackage;
