use anyhow::Error;
use std::io::{self, Write};
use unicode_width::UnicodeWidthChar;

use crate::core::UpdateManifest;

#[derive(Debug, Clone)]
pub struct UiConfig {
    pub color: bool,
    pub stdout_is_tty: bool,
    pub max_table_rows: usize,
    pub quiet: bool,
    pub verbose: bool,
}

pub fn eprintln_error(err: &Error) {
    let mut stderr = io::stderr().lock();
    let _ = writeln!(stderr, "エラー:");
    let _ = writeln!(stderr, "  {err}");

    let mut causes = err.chain().skip(1).peekable();
    if causes.peek().is_some() {
        let _ = writeln!(stderr, "原因:");
        for cause in causes {
            let _ = writeln!(stderr, "  - {cause}");
        }
    }

    let _ = writeln!(stderr, "次に:");
    let _ = writeln!(
        stderr,
        "  - 詳細を見るには `--verbose` を付けて再実行してください"
    );
    let _ = writeln!(
        stderr,
        "  - 利用可能なコマンド/オプションは `patchlift --help` を参照してください"
    );
}

pub fn print_manifest_summary(manifest: &UpdateManifest, cfg: &UiConfig) {
    if cfg.quiet {
        return;
    }

    let mut out = io::stdout().lock();

    let os = if manifest.metadata.os.os_type.is_empty() {
        "不明".to_string()
    } else {
        format!(
            "{} {}",
            manifest.metadata.os.os_type, manifest.metadata.os.version
        )
    };
    let _ = writeln!(out, "対象OS: {os}");
    if !manifest.metadata.config.arch.is_empty() {
        let _ = writeln!(out, "アーキテクチャ: {}", manifest.metadata.config.arch);
    }

    let total = manifest.updates.len();
    let rows = cfg.max_table_rows.min(total);
    let _ = writeln!(out);
    if total > rows {
        let _ = writeln!(out, "更新対象（{rows}件表示 / 全{total}件）:");
    } else {
        let _ = writeln!(out, "更新対象（{total}件）:");
    }
    print_updates_table(&mut out, manifest, rows, cfg.color);

    if cfg.verbose {
        let _ = writeln!(out);
        let _ = writeln!(out, "apiVersion: {}", manifest.api_version);
    }
}

fn print_updates_table(out: &mut dyn Write, manifest: &UpdateManifest, rows: usize, color: bool) {
    let label_name = "パッケージ";
    let label_installed = "現在";
    let label_fixed = "修正";
    let label_vuln = "脆弱性ID";

    let updates = &manifest.updates[..rows.min(manifest.updates.len())];

    let name_w = updates
        .iter()
        .map(|u| display_width(&u.name))
        .max()
        .unwrap_or(0)
        .max(display_width(label_name));
    let installed_w = updates
        .iter()
        .map(|u| display_width(&u.installed_version))
        .max()
        .unwrap_or(0)
        .max(display_width(label_installed));
    let fixed_w = updates
        .iter()
        .map(|u| display_width(&u.fixed_version))
        .max()
        .unwrap_or(0)
        .max(display_width(label_fixed));
    let vuln_w = display_width(label_vuln);

    let _ = writeln!(
        out,
        "{}  {}  {}  {}",
        pad_end_display(label_name, name_w),
        pad_end_display(label_installed, installed_w),
        pad_end_display(label_fixed, fixed_w),
        label_vuln
    );
    let _ = writeln!(
        out,
        "{}  {}  {}  {}",
        "-".repeat(name_w),
        "-".repeat(installed_w),
        "-".repeat(fixed_w),
        "-".repeat(vuln_w)
    );

    for update in updates {
        let vuln = if update.vulnerability_id.is_empty() {
            "-".to_string()
        } else {
            format_vuln_id(&update.vulnerability_id, color)
        };
        let _ = writeln!(
            out,
            "{}  {}  {}  {vuln}",
            pad_end_display(&update.name, name_w),
            pad_end_display(&update.installed_version, installed_w),
            pad_end_display(&update.fixed_version, fixed_w),
        );
    }
}

fn format_vuln_id(id: &str, color: bool) -> String {
    if !color {
        return id.to_string();
    }
    let code = if id.starts_with("CVE-") { "33" } else { "36" };
    format!("\x1b[{code}m{id}\x1b[0m")
}

fn pad_end_display(s: &str, width: usize) -> String {
    let w = display_width(s);
    if w >= width {
        return s.to_string();
    }
    format!("{s}{}", " ".repeat(width - w))
}

fn display_width(s: &str) -> usize {
    s.chars()
        .map(|ch| UnicodeWidthChar::width(ch).unwrap_or(0))
        .fold(0usize, usize::saturating_add)
}
