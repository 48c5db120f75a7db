use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Which identifier goes into `vulnerabilityID`. The two observed scanner
/// integrations disagree, so both behaviors stay selectable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum VulnIdPolicy {
    /// First CVE in source order; empty when the finding carries none.
    #[serde(rename = "cve")]
    CveFirst,
    /// The finding's own scanner-internal identifier, always.
    #[serde(rename = "finding-id")]
    FindingId,
}

impl VulnIdPolicy {
    pub const fn as_str(self) -> &'static str {
        match self {
            VulnIdPolicy::CveFirst => "cve",
            VulnIdPolicy::FindingId => "finding-id",
        }
    }
}

impl fmt::Display for VulnIdPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for VulnIdPolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "cve" => Ok(VulnIdPolicy::CveFirst),
            "finding-id" => Ok(VulnIdPolicy::FindingId),
            _ => Err(format!(
                "脆弱性IDポリシーが不正です: {s}（cve|finding-id を指定してください）"
            )),
        }
    }
}
