//! Turns a decoded scanner report into the canonical update manifest.

use crate::core::{API_VERSION, Metadata, Os, OsConfig, UpdateManifest, UpdatePackage, VulnIdPolicy};
use crate::error::Error;
use crate::parsers::{ParsedReport, RawFinding, UpgradePathEntry};

#[derive(Debug, Clone)]
pub struct NormalizeOptions {
    pub vuln_id: VulnIdPolicy,
    /// Architecture is not derivable from every report format; this is the
    /// value stamped into `metadata.config.arch` (empty by default).
    pub default_arch: String,
}

impl Default for NormalizeOptions {
    fn default() -> Self {
        Self {
            vuln_id: VulnIdPolicy::CveFirst,
            default_arch: String::new(),
        }
    }
}

/// Why a finding produced no update entry. Skips are silent by design; the
/// reason exists so the decision is testable, not to feed a diagnostic channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    NotUpgradable,
    NoFixedVersion,
    EmptyPackageName,
    EmptyInstalledVersion,
}

pub struct Normalizer {
    opts: NormalizeOptions,
}

impl Normalizer {
    pub fn new(opts: NormalizeOptions) -> Self {
        Self { opts }
    }

    /// Build the manifest. The only error is `NoUpdates`: per-finding
    /// anomalies never abort the rest of the document.
    pub fn normalize(&self, report: &ParsedReport) -> Result<UpdateManifest, Error> {
        let (os_type, os_version) = split_distribution(&report.distribution);

        let metadata = Metadata {
            os: Os {
                os_type,
                version: os_version,
            },
            config: OsConfig {
                arch: self.opts.default_arch.clone(),
            },
        };

        let updates: Vec<UpdatePackage> = report
            .findings
            .iter()
            .filter_map(|finding| self.evaluate(finding).ok())
            .collect();

        if updates.is_empty() {
            return Err(Error::NoUpdates);
        }

        Ok(UpdateManifest::new(API_VERSION, metadata, updates))
    }

    /// Eligibility filter + assembly for one finding. Every `Ok` entry
    /// satisfies: name, installed version and fixed version are non-empty.
    fn evaluate(&self, finding: &RawFinding) -> Result<UpdatePackage, SkipReason> {
        if !finding.is_upgradable {
            return Err(SkipReason::NotUpgradable);
        }

        let fixed_version =
            fixed_version_from_path(&finding.upgrade_path).ok_or(SkipReason::NoFixedVersion)?;
        if fixed_version.is_empty() {
            return Err(SkipReason::NoFixedVersion);
        }
        if finding.package_name.is_empty() {
            return Err(SkipReason::EmptyPackageName);
        }
        if finding.installed_version.is_empty() {
            return Err(SkipReason::EmptyInstalledVersion);
        }

        let vulnerability_id = match self.opts.vuln_id {
            VulnIdPolicy::CveFirst => finding.cve_ids.first().cloned().unwrap_or_default(),
            VulnIdPolicy::FindingId => finding.id.clone(),
        };

        Ok(UpdatePackage {
            name: finding.package_name.clone(),
            installed_version: finding.installed_version.clone(),
            fixed_version,
            vulnerability_id,
        })
    }
}

/// Split the combined distribution tag (`"debian:11"`) on the first colon
/// only. Anything else degrades to empty identity, never an error.
fn split_distribution(tag: &str) -> (String, String) {
    match tag.split_once(':') {
        Some((os_type, os_version)) => (os_type.to_string(), os_version.to_string()),
        None => (String::new(), String::new()),
    }
}

/// Scan the upgrade path from the most-specific end toward the root and take
/// the first version-coordinate string. `"name@version"` yields the version
/// half (first `@` wins); a bare string is taken as the version itself.
/// Markers are skipped without halting the scan.
fn fixed_version_from_path(path: &[UpgradePathEntry]) -> Option<String> {
    for entry in path.iter().rev() {
        if let UpgradePathEntry::Coordinate(coordinate) = entry {
            let version = match coordinate.split_once('@') {
                Some((_, version)) => version,
                None => coordinate.as_str(),
            };
            return Some(version.to_string());
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    fn path(entries: &[serde_json::Value]) -> Vec<UpgradePathEntry> {
        entries
            .iter()
            .map(|v| match v {
                serde_json::Value::String(s) => UpgradePathEntry::Coordinate(s.clone()),
                other => UpgradePathEntry::Marker(other.clone()),
            })
            .collect()
    }

    fn upgradable_finding(name: &str, version: &str, entries: &[serde_json::Value]) -> RawFinding {
        RawFinding {
            id: "SNYK-TEST-1".to_string(),
            package_name: name.to_string(),
            installed_version: version.to_string(),
            is_upgradable: true,
            upgrade_path: path(entries),
            cve_ids: vec![],
            fixed_in: vec![],
        }
    }

    fn report_of(findings: Vec<RawFinding>) -> ParsedReport {
        ParsedReport {
            distribution: "debian:11".to_string(),
            findings,
        }
    }

    fn normalizer() -> Normalizer {
        Normalizer::new(NormalizeOptions::default())
    }

    #[test]
    fn scans_upgrade_path_from_the_end() {
        let finding = upgradable_finding(
            "libx",
            "1.0",
            &[
                serde_json::json!("a@1.0"),
                serde_json::json!("b@2.0"),
                serde_json::json!(true),
                serde_json::json!("c@3.0"),
            ],
        );
        let entry = normalizer().evaluate(&finding).expect("entry");
        assert_eq!(entry.fixed_version, "3.0");
    }

    #[test]
    fn markers_are_skipped_without_halting_the_scan() {
        let finding = upgradable_finding(
            "libx",
            "1.0",
            &[
                serde_json::json!("a@1.0"),
                serde_json::json!(true),
                serde_json::json!("b@2.0"),
            ],
        );
        let entry = normalizer().evaluate(&finding).expect("entry");
        assert_eq!(entry.fixed_version, "2.0");
    }

    #[test]
    fn bare_version_string_is_taken_as_is() {
        let finding = upgradable_finding("libx", "1.0", &[serde_json::json!("9.2.1")]);
        let entry = normalizer().evaluate(&finding).expect("entry");
        assert_eq!(entry.fixed_version, "9.2.1");
    }

    #[test]
    fn splits_on_first_at_sign_only() {
        let finding =
            upgradable_finding("node", "14.0.0", &[serde_json::json!("node@14.21.3@sha256")]);
        let entry = normalizer().evaluate(&finding).expect("entry");
        assert_eq!(entry.fixed_version, "14.21.3@sha256");
    }

    #[test]
    fn exhausted_path_drops_the_finding() {
        let finding = upgradable_finding(
            "libx",
            "1.0",
            &[serde_json::json!(true), serde_json::json!(false)],
        );
        assert_eq!(
            normalizer().evaluate(&finding),
            Err(SkipReason::NoFixedVersion)
        );
    }

    #[test]
    fn empty_version_coordinate_drops_the_finding() {
        let finding = upgradable_finding("libx", "1.0", &[serde_json::json!("libx@")]);
        assert_eq!(
            normalizer().evaluate(&finding),
            Err(SkipReason::NoFixedVersion)
        );
    }

    #[test]
    fn non_upgradable_finding_never_produces_an_entry() {
        let mut finding = upgradable_finding("libx", "1.0", &[serde_json::json!("libx@2.0")]);
        finding.is_upgradable = false;
        assert_eq!(
            normalizer().evaluate(&finding),
            Err(SkipReason::NotUpgradable)
        );
    }

    #[test]
    fn empty_name_and_version_are_rejected() {
        let finding = upgradable_finding("", "1.0", &[serde_json::json!("libx@2.0")]);
        assert_eq!(
            normalizer().evaluate(&finding),
            Err(SkipReason::EmptyPackageName)
        );

        let finding = upgradable_finding("libx", "", &[serde_json::json!("libx@2.0")]);
        assert_eq!(
            normalizer().evaluate(&finding),
            Err(SkipReason::EmptyInstalledVersion)
        );
    }

    #[test]
    fn every_emitted_entry_has_non_empty_fields() {
        // A grab bag of malformed findings around one good one.
        let mut bad_missing_name = upgradable_finding("", "1.0", &[serde_json::json!("x@2.0")]);
        bad_missing_name.cve_ids = vec!["CVE-2024-0001".to_string()];
        let bad_no_path = upgradable_finding("liby", "1.0", &[]);
        let mut not_upgradable = upgradable_finding("libz", "1.0", &[serde_json::json!("z@2")]);
        not_upgradable.is_upgradable = false;
        let good = upgradable_finding("libx", "1.0", &[serde_json::json!("libx@2.0")]);

        let manifest = normalizer()
            .normalize(&report_of(vec![
                bad_missing_name,
                bad_no_path,
                not_upgradable,
                good,
            ]))
            .expect("manifest");

        assert_eq!(manifest.updates.len(), 1);
        for update in &manifest.updates {
            assert!(!update.name.is_empty());
            assert!(!update.installed_version.is_empty());
            assert!(!update.fixed_version.is_empty());
        }
    }

    #[test]
    fn os_identity_is_split_on_first_colon_only() {
        assert_eq!(
            split_distribution("debian:11"),
            ("debian".to_string(), "11".to_string())
        );
        assert_eq!(
            split_distribution("ubuntu:22.04:lts"),
            ("ubuntu".to_string(), "22.04:lts".to_string())
        );
        assert_eq!(split_distribution("debian"), (String::new(), String::new()));
        assert_eq!(split_distribution(""), (String::new(), String::new()));
    }

    #[test]
    fn all_non_remediable_findings_yield_no_updates_error() {
        let mut finding = upgradable_finding("libx", "1.0", &[serde_json::json!("libx@2.0")]);
        finding.is_upgradable = false;
        let err = normalizer()
            .normalize(&report_of(vec![finding]))
            .expect_err("must signal empty result");
        assert!(err.is_no_updates());
    }

    #[test]
    fn cve_first_policy_prefers_cve_and_falls_back_to_empty() {
        let mut with_cve = upgradable_finding("libx", "1.0", &[serde_json::json!("libx@2.0")]);
        with_cve.cve_ids = vec!["CVE-2023-1234".to_string(), "CVE-2023-9999".to_string()];
        let without_cve = upgradable_finding("liby", "1.0", &[serde_json::json!("liby@3.0")]);

        let manifest = normalizer()
            .normalize(&report_of(vec![with_cve, without_cve]))
            .expect("manifest");

        assert_eq!(manifest.updates[0].vulnerability_id, "CVE-2023-1234");
        assert_eq!(manifest.updates[1].vulnerability_id, "");
    }

    #[test]
    fn finding_id_policy_always_uses_the_finding_id() {
        let mut finding = upgradable_finding("libx", "1.0", &[serde_json::json!("libx@2.0")]);
        finding.cve_ids = vec!["CVE-2023-1234".to_string()];

        let normalizer = Normalizer::new(NormalizeOptions {
            vuln_id: VulnIdPolicy::FindingId,
            default_arch: String::new(),
        });
        let manifest = normalizer
            .normalize(&report_of(vec![finding]))
            .expect("manifest");
        assert_eq!(manifest.updates[0].vulnerability_id, "SNYK-TEST-1");
    }

    #[test]
    fn repeated_packages_are_not_deduplicated_and_keep_input_order() {
        let first = upgradable_finding("curl", "7.74.0", &[serde_json::json!("curl@7.74.1")]);
        let second = upgradable_finding("curl", "7.74.0", &[serde_json::json!("curl@7.74.2")]);

        let manifest = normalizer()
            .normalize(&report_of(vec![first, second]))
            .expect("manifest");
        assert_eq!(manifest.updates.len(), 2);
        assert_eq!(manifest.updates[0].fixed_version, "7.74.1");
        assert_eq!(manifest.updates[1].fixed_version, "7.74.2");
    }

    #[test]
    fn default_arch_is_stamped_into_metadata() {
        let finding = upgradable_finding("libx", "1.0", &[serde_json::json!("libx@2.0")]);
        let normalizer = Normalizer::new(NormalizeOptions {
            vuln_id: VulnIdPolicy::CveFirst,
            default_arch: "amd64".to_string(),
        });
        let manifest = normalizer
            .normalize(&report_of(vec![finding]))
            .expect("manifest");
        assert_eq!(manifest.api_version, API_VERSION);
        assert_eq!(manifest.metadata.os.os_type, "debian");
        assert_eq!(manifest.metadata.os.version, "11");
        assert_eq!(manifest.metadata.config.arch, "amd64");
    }
}
