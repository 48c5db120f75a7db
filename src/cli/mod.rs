use std::io;
use std::io::IsTerminal;
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Args, CommandFactory, Parser, Subcommand};

use crate::core::{UpdateManifest, VulnIdPolicy};
use crate::error::Error;
use crate::normalize::{NormalizeOptions, Normalizer};
use crate::ui::UiConfig;

#[derive(Debug, Parser)]
#[command(
    name = "patchlift",
    version,
    about = "脆弱性スキャナのレポートを、パッチ適用パイプライン向けの更新マニフェストに正規化する"
)]
pub struct Cli {
    #[arg(long, global = true)]
    pub json: bool,
    #[arg(long = "no-color", global = true)]
    pub no_color: bool,
    #[arg(long, global = true)]
    pub verbose: bool,
    #[arg(long, global = true)]
    pub quiet: bool,
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    Parse(ParseArgs),
    Scanners(ScannersArgs),
    Config(ConfigArgs),
    Completion(CompletionArgs),
}

#[derive(Debug, Args)]
pub struct ParseArgs {
    /// スキャナレポート(JSON)のパス
    pub report: PathBuf,

    #[arg(long)]
    pub scanner: Option<String>,
    #[arg(long = "vuln-id")]
    pub vuln_id: Option<VulnIdPolicy>,
    #[arg(long)]
    pub arch: Option<String>,
    #[arg(short, long)]
    pub output: Option<PathBuf>,
    #[arg(long)]
    pub summary: bool,
}

#[derive(Debug, Args)]
pub struct ScannersArgs {}

#[derive(Debug, Args)]
pub struct ConfigArgs {
    #[arg(long)]
    pub show: bool,
}

#[derive(Debug, Args)]
pub struct CompletionArgs {
    pub shell: String,
}

pub fn run() -> Result<()> {
    let cli = Cli::parse();

    let stdout_is_tty = io::stdout().is_terminal();

    let home_dir = effective_home_dir()?;

    let env_config_path = std::env::var_os("PATCHLIFT_CONFIG").map(PathBuf::from);
    let cfg = crate::config::load(
        cli.config.as_deref().or(env_config_path.as_deref()),
        &home_dir,
    )
    .map_err(crate::exit::invalid_args_err)?;

    let color = stdout_is_tty && cfg.ui.color && !cli.no_color;

    let ui_cfg = UiConfig {
        color,
        stdout_is_tty,
        max_table_rows: cfg.ui.max_table_rows,
        quiet: cli.quiet,
        verbose: cli.verbose,
    };

    match cli.command {
        Commands::Parse(args) => {
            if args.summary && cli.json {
                return Err(crate::exit::invalid_args(
                    "parse --summary は --json と併用できません",
                ));
            }

            let scanner = args
                .scanner
                .unwrap_or_else(|| cfg.scanner.default.clone());
            let Some(parser) = crate::parsers::parser_for(&scanner) else {
                return Err(crate::exit::invalid_args(format!(
                    "未対応のスキャナです: {scanner}（patchlift scanners で一覧を確認してください）"
                )));
            };

            let data = std::fs::read(&args.report).map_err(|source| Error::Io {
                path: args.report.clone(),
                source,
            })?;
            let report = parser.decode(&data)?;

            let normalizer = Normalizer::new(NormalizeOptions {
                vuln_id: args.vuln_id.unwrap_or(cfg.manifest.vuln_id),
                default_arch: args
                    .arch
                    .unwrap_or_else(|| cfg.manifest.default_arch.clone()),
            });

            let manifest = match normalizer.normalize(&report) {
                Ok(manifest) => manifest,
                Err(err) if err.is_no_updates() => {
                    // Nothing to do is a distinct, successful outcome.
                    if !ui_cfg.quiet {
                        eprintln!("{err}");
                    }
                    return Ok(());
                }
                Err(err) => return Err(err.into()),
            };

            if args.summary {
                crate::ui::print_manifest_summary(&manifest, &ui_cfg);
            } else if let Some(path) = args.output {
                let buf = serde_json::to_vec_pretty(&manifest)?;
                std::fs::write(&path, buf).with_context(|| {
                    format!("マニフェストの書き込みに失敗しました: {}", path.display())
                })?;
                if !ui_cfg.quiet {
                    eprintln!(
                        "マニフェストを書き込みました: {}（{}件）",
                        path.display(),
                        manifest.updates.len()
                    );
                }
            } else {
                write_json(&manifest)?;
            }
        }
        Commands::Scanners(_args) => {
            let names = crate::parsers::scanner_names();
            if cli.json {
                let stdout = std::io::stdout();
                serde_json::to_writer_pretty(stdout.lock(), &names)?;
            } else if !ui_cfg.quiet {
                for name in names {
                    println!("{name}");
                }
            }
        }
        Commands::Config(_args) => {
            if _args.show {
                if cli.json {
                    let stdout = std::io::stdout();
                    serde_json::to_writer_pretty(stdout.lock(), &cfg)?;
                } else {
                    println!("{}", toml::to_string_pretty(&cfg)?);
                }
            } else if !ui_cfg.quiet {
                eprintln!("config: `patchlift config --show` を使用してください");
            }
        }
        Commands::Completion(_args) => {
            let shell = parse_shell(&_args.shell)?;
            let mut cmd = Cli::command();
            let mut out = std::io::stdout().lock();
            clap_complete::generate(shell, &mut cmd, "patchlift", &mut out);
        }
    }

    Ok(())
}

fn effective_home_dir() -> Result<PathBuf> {
    std::env::var_os("HOME")
        .map(PathBuf::from)
        .ok_or_else(|| anyhow::anyhow!("環境変数 HOME が設定されていません"))
}

fn write_json(manifest: &UpdateManifest) -> Result<()> {
    use std::io::Write;

    let buf = serde_json::to_vec_pretty(manifest)?;

    let mut stdout = std::io::stdout().lock();
    match stdout.write_all(&buf) {
        Ok(()) => {}
        Err(err) if err.kind() == std::io::ErrorKind::BrokenPipe => return Ok(()),
        Err(err) => return Err(err.into()),
    }
    match stdout.write_all(b"\n") {
        Ok(()) => Ok(()),
        Err(err) if err.kind() == std::io::ErrorKind::BrokenPipe => Ok(()),
        Err(err) => Err(err.into()),
    }
}

fn parse_shell(s: &str) -> Result<clap_complete::Shell> {
    let s = s.trim().to_ascii_lowercase();
    match s.as_str() {
        "bash" => Ok(clap_complete::Shell::Bash),
        "zsh" => Ok(clap_complete::Shell::Zsh),
        "fish" => Ok(clap_complete::Shell::Fish),
        other => Err(crate::exit::invalid_args(format!(
            "未対応のシェルです: {other}（bash|zsh|fish を指定してください）"
        ))),
    }
}
