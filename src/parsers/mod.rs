//! Scanner report decoders producing the scanner-agnostic intermediate form.
//!
//! Each decoder implements `ReportParser`, turning one tool's report document
//! into a `ParsedReport` of raw findings plus report-level metadata.

mod snyk;

pub use snyk::SnykParser;

use crate::error::Error;

/// One entry of a scanner's upgrade-path hint sequence. The source format
/// mixes version-coordinate strings with non-informative markers (booleans in
/// practice); anything that is not a string is a marker.
#[derive(Debug, Clone, PartialEq, serde::Deserialize)]
#[serde(untagged)]
pub enum UpgradePathEntry {
    Coordinate(String),
    Marker(serde_json::Value),
}

/// One reported vulnerability instance, decoded but not yet judged.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct RawFinding {
    pub id: String,
    pub package_name: String,
    pub installed_version: String,
    pub is_upgradable: bool,
    /// Append-ordered from least-specific (root) to most-specific (leaf).
    pub upgrade_path: Vec<UpgradePathEntry>,
    pub cve_ids: Vec<String>,
    /// Scanner-supplied remediation descriptors, carried through untouched.
    pub fixed_in: Vec<String>,
}

/// Decoded report: raw findings plus document-level metadata.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ParsedReport {
    /// Combined distribution tag, conventionally `"<osType>:<osVersion>"`.
    pub distribution: String,
    pub findings: Vec<RawFinding>,
}

/// Trait for pluggable scanner report decoders.
pub trait ReportParser {
    /// Decode raw report bytes into the intermediate form. Fails only on
    /// structurally invalid input; missing fields default to zero values.
    fn decode(&self, data: &[u8]) -> Result<ParsedReport, Error>;

    /// The scanner name this decoder handles.
    fn scanner(&self) -> &str;
}

pub fn parser_for(name: &str) -> Option<Box<dyn ReportParser>> {
    match name.trim().to_ascii_lowercase().as_str() {
        "snyk" => Some(Box::new(SnykParser::new())),
        _ => None,
    }
}

pub fn scanner_names() -> &'static [&'static str] {
    &["snyk"]
}
