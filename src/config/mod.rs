use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::core::VulnIdPolicy;

#[derive(Debug, Clone, Serialize)]
pub struct EffectiveConfig {
    // Scalar first so the TOML rendering stays valid.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub config_path: Option<String>,
    pub ui: UiConfig,
    pub scanner: ScannerConfig,
    pub manifest: ManifestConfig,
}

#[derive(Debug, Clone, Serialize)]
pub struct UiConfig {
    pub color: bool,
    pub max_table_rows: usize,
}

#[derive(Debug, Clone, Serialize)]
pub struct ScannerConfig {
    pub default: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct ManifestConfig {
    pub vuln_id: VulnIdPolicy,
    pub default_arch: String,
}

impl Default for EffectiveConfig {
    fn default() -> Self {
        Self {
            config_path: None,
            ui: UiConfig {
                color: true,
                max_table_rows: 20,
            },
            scanner: ScannerConfig {
                default: "snyk".to_string(),
            },
            manifest: ManifestConfig {
                vuln_id: VulnIdPolicy::CveFirst,
                default_arch: String::new(),
            },
        }
    }
}

#[derive(Debug, Deserialize)]
struct RawConfig {
    ui: Option<RawUiConfig>,
    scanner: Option<RawScannerConfig>,
    manifest: Option<RawManifestConfig>,
}

#[derive(Debug, Deserialize)]
struct RawUiConfig {
    color: Option<bool>,
    max_table_rows: Option<usize>,
}

#[derive(Debug, Deserialize)]
struct RawScannerConfig {
    default: Option<String>,
}

#[derive(Debug, Deserialize)]
struct RawManifestConfig {
    vuln_id: Option<VulnIdPolicy>,
    default_arch: Option<String>,
}

pub fn default_config_path(home_dir: &Path) -> PathBuf {
    home_dir.join(".config/patchlift/config.toml")
}

pub fn load(config_path: Option<&Path>, home_dir: &Path) -> Result<EffectiveConfig> {
    let mut cfg = EffectiveConfig::default();

    let path = config_path
        .map(ToOwned::to_owned)
        .unwrap_or_else(|| default_config_path(home_dir));

    if path.exists() {
        let s = std::fs::read_to_string(&path)
            .with_context(|| format!("設定ファイルの読み取りに失敗しました: {}", path.display()))?;
        let raw: RawConfig =
            toml::from_str(&s).context("設定ファイル(TOML)の解析に失敗しました")?;
        apply_raw_config(&mut cfg, raw);
        cfg.config_path = Some(path.display().to_string());
    }

    apply_env_overrides(&mut cfg)?;

    Ok(cfg)
}

fn apply_raw_config(cfg: &mut EffectiveConfig, raw: RawConfig) {
    if let Some(ui) = raw.ui {
        if let Some(color) = ui.color {
            cfg.ui.color = color;
        }
        if let Some(max_table_rows) = ui.max_table_rows {
            cfg.ui.max_table_rows = max_table_rows;
        }
    }

    if let Some(scanner) = raw.scanner {
        if let Some(default) = scanner.default {
            cfg.scanner.default = default;
        }
    }

    if let Some(manifest) = raw.manifest {
        if let Some(vuln_id) = manifest.vuln_id {
            cfg.manifest.vuln_id = vuln_id;
        }
        if let Some(default_arch) = manifest.default_arch {
            cfg.manifest.default_arch = default_arch;
        }
    }
}

fn apply_env_overrides(cfg: &mut EffectiveConfig) -> Result<()> {
    if let Ok(v) = std::env::var("PATCHLIFT_UI_COLOR") {
        cfg.ui.color = parse_bool(&v).with_context(|| "PATCHLIFT_UI_COLOR")?;
    }
    if let Ok(v) = std::env::var("PATCHLIFT_UI_MAX_TABLE_ROWS") {
        cfg.ui.max_table_rows = v
            .trim()
            .parse::<usize>()
            .with_context(|| "PATCHLIFT_UI_MAX_TABLE_ROWS")?;
    }
    if let Ok(v) = std::env::var("PATCHLIFT_SCANNER_DEFAULT") {
        let v = v.trim();
        if !v.is_empty() {
            cfg.scanner.default = v.to_string();
        }
    }
    if let Ok(v) = std::env::var("PATCHLIFT_MANIFEST_VULN_ID") {
        cfg.manifest.vuln_id = v
            .parse::<VulnIdPolicy>()
            .map_err(anyhow::Error::msg)
            .with_context(|| "PATCHLIFT_MANIFEST_VULN_ID")?;
    }
    if let Ok(v) = std::env::var("PATCHLIFT_MANIFEST_DEFAULT_ARCH") {
        cfg.manifest.default_arch = v.trim().to_string();
    }

    Ok(())
}

fn parse_bool(s: &str) -> Result<bool> {
    let s = s.trim().to_ascii_lowercase();
    match s.as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        _ => Err(anyhow::anyhow!(
            "真偽値が不正です: {s}（true|false|1|0|yes|no|on|off を指定してください）"
        )),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_bool_accepts_common_spellings() {
        for v in ["1", "true", "YES", " on "] {
            assert!(parse_bool(v).expect("parse"));
        }
        for v in ["0", "false", "No", "off"] {
            assert!(!parse_bool(v).expect("parse"));
        }
        assert!(parse_bool("maybe").is_err());
    }

    #[test]
    fn raw_config_overrides_only_present_fields() {
        let raw: RawConfig = toml::from_str(
            r#"
            [manifest]
            vuln_id = "finding-id"
            "#,
        )
        .expect("parse toml");

        let mut cfg = EffectiveConfig::default();
        apply_raw_config(&mut cfg, raw);

        assert_eq!(cfg.manifest.vuln_id, VulnIdPolicy::FindingId);
        assert_eq!(cfg.manifest.default_arch, "");
        assert_eq!(cfg.scanner.default, "snyk");
        assert!(cfg.ui.color);
    }
}
