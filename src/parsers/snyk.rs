//! Decoder for Snyk container/OS-package test reports (`snyk test --json`).

use serde::Deserialize;

use crate::error::Error;
use crate::parsers::{ParsedReport, RawFinding, ReportParser, UpgradePathEntry};

#[derive(Default)]
pub struct SnykParser;

impl SnykParser {
    pub fn new() -> Self {
        Self
    }
}

impl ReportParser for SnykParser {
    fn decode(&self, data: &[u8]) -> Result<ParsedReport, Error> {
        let report: SnykReport = serde_json::from_slice(data)?;

        let findings = report
            .vulnerabilities
            .into_iter()
            .map(|vuln| RawFinding {
                id: vuln.id,
                package_name: vuln.package_name,
                installed_version: vuln.version,
                is_upgradable: vuln.is_upgradable,
                upgrade_path: vuln.upgrade_path,
                cve_ids: vuln.identifiers.cve,
                fixed_in: vuln.fixed_in,
            })
            .collect();

        Ok(ParsedReport {
            distribution: report.package_manager,
            findings,
        })
    }

    fn scanner(&self) -> &str {
        "snyk"
    }
}

// -- Snyk report schema (subset) --
//
// For OS-package scans Snyk reports the distro as the package manager,
// e.g. "debian:11". Fields absent in a document decode to zero values.

#[derive(Debug, Deserialize, Default)]
#[serde(rename_all = "camelCase", default)]
struct SnykReport {
    package_manager: String,
    vulnerabilities: Vec<SnykVuln>,
}

#[derive(Debug, Deserialize, Default)]
#[serde(rename_all = "camelCase", default)]
struct SnykVuln {
    id: String,
    package_name: String,
    version: String,
    upgrade_path: Vec<UpgradePathEntry>,
    is_upgradable: bool,
    identifiers: SnykIdentifiers,
    fixed_in: Vec<String>,
}

#[derive(Debug, Deserialize, Default)]
#[serde(default)]
struct SnykIdentifiers {
    #[serde(rename = "CVE")]
    cve: Vec<String>,
}
