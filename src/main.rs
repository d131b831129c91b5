use anyhow::{bail, Context, Result};
use clap::Parser;
use std::io::{self, BufRead, Write};
use std::path::{Path, PathBuf};
use tracing_subscriber::EnvFilter;

use figma_texts_updater::{
    load_config, DiffPair, LoadConfigOptions, RewriteOutcome, RunOptions, RunReport,
    RunSummary, UpdaterWorkflow, VersionInfo,
};

#[derive(Parser)]
#[command(name = "texts-updater")]
#[command(about = "对比 Figma 设计稿的两个版本，把文本变更同步到项目源码")]
#[command(version)]
struct Cli {
    /// Figma 设计稿链接
    figma_url: Option<String>,

    /// 旧版本ID（从该版本读取原文本）
    #[arg(long)]
    old: Option<String>,

    /// 新版本ID（更新到该版本）
    #[arg(long)]
    new: Option<String>,

    /// 替换字符串的目录（默认当前目录）
    #[arg(long)]
    dir: Option<PathBuf>,

    /// 查找配置文件的目录
    #[arg(long)]
    cwd: Option<PathBuf>,

    /// 配置文件名
    #[arg(long)]
    config: Option<PathBuf>,

    /// 只列出变更，不修改文件
    #[arg(long)]
    list: bool,

    /// 静默模式(仅输出警告和错误)
    #[arg(long, conflicts_with = "verbose")]
    quiet: bool,

    /// 输出调试信息
    #[arg(short, long)]
    verbose: bool,
}

fn main() {
    dotenvy::dotenv().ok();

    let cli = Cli::parse();
    init_tracing(&cli);

    if let Err(e) = run(cli) {
        eprintln!("错误: {:#}", e);
        std::process::exit(1);
    }
}

fn init_tracing(cli: &Cli) {
    let level = if cli.quiet {
        "warn"
    } else if cli.verbose {
        "debug"
    } else {
        "info"
    };

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("warn,figma_texts_updater={}", level)));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .compact()
        .init();
}

fn run(cli: Cli) -> Result<()> {
    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .context("无法创建异步运行时")?;

    runtime.block_on(execute(cli))
}

async fn execute(cli: Cli) -> Result<()> {
    let cwd = resolve_cwd(cli.cwd.as_deref())?;

    let mut options = LoadConfigOptions {
        cwd: Some(cwd.clone()),
        config_file: cli.config.clone(),
        target_root: cli.dir.clone(),
    };
    let config = load_config(&options).context("加载配置失败")?;

    if let Some(path) = &config.config_path {
        tracing::debug!("使用配置文件 {:?}", path);
    }

    let figma_url = match &cli.figma_url {
        Some(url) => url.trim().to_string(),
        None => prompt_figma_url()?,
    };

    if figma_url.is_empty() {
        bail!("没有提供 Figma 设计稿链接");
    }

    let (old_version, new_version) = match (&cli.old, &cli.new) {
        (Some(old), Some(new)) => (old.clone(), new.clone()),
        _ => {
            let workflow = UpdaterWorkflow::new(config);
            let versions = workflow
                .list_versions(&figma_url)
                .await
                .context("获取版本列表失败")?;

            let Some(versions) = versions else {
                bail!("未找到设计稿的版本");
            };

            print_versions(&versions);
            prompt_versions(&versions, cli.old.as_deref(), cli.new.as_deref())?
        }
    };

    let directory = match &cli.dir {
        Some(dir) => dir.clone(),
        None if cli.list => PathBuf::from("."),
        None => prompt_directory(&cwd)?,
    };

    options.target_root = Some(directory);
    let config = load_config(&options).context("加载配置失败")?;

    if !cli.list && !config.root_dir.is_dir() {
        bail!("目录不存在: {:?}", config.root_dir);
    }

    let workflow = UpdaterWorkflow::new(config);
    let report = workflow
        .run(&RunOptions {
            figma_url,
            old_version: Some(old_version),
            new_version: Some(new_version),
            list_only: cli.list,
        })
        .await
        .context("更新失败")?;

    print_report(&report, cli.quiet);
    Ok(())
}

fn resolve_cwd(cwd: Option<&Path>) -> Result<PathBuf> {
    let current = std::env::current_dir().context("无法获取当前目录")?;

    Ok(match cwd {
        Some(path) => current.join(path),
        None => current,
    })
}

fn print_versions(versions: &[VersionInfo]) {
    println!("可用版本:");
    for (i, version) in versions.iter().enumerate() {
        println!("{}. {}", i + 1, format_version(version));
    }
    println!();
}

fn format_version(version: &VersionInfo) -> String {
    let created = version
        .created_at
        .with_timezone(&chrono::Local)
        .format("%Y-%m-%d %H:%M:%S");

    match &version.label {
        Some(label) => format!("{} • {} | {} | {}", version.id, label, created, version.author),
        None => format!("{} | {} | {}", version.id, created, version.author),
    }
}

fn print_changes(diffs: &[DiffPair]) {
    println!("发现 {} 处文本变更:", diffs.len());
    for pair in diffs {
        println!("• \"{}\" → \"{}\"", pair.old_text, pair.new_text);
    }
}

fn print_outcomes(outcomes: &[RewriteOutcome], quiet: bool) {
    let summary = RunSummary::from_outcomes(outcomes);

    for outcome in outcomes.iter().filter(|o| !o.applied()) {
        if let Some(reason) = outcome.failure_reason() {
            println!("跳过 \"{}\": {}", outcome.old_text, reason);
        }
    }

    if !quiet {
        for outcome in outcomes.iter().filter(|o| o.applied()) {
            if let Some(location) = outcome.location() {
                println!("已更新 {}: \"{}\" → \"{}\"", location, outcome.old_text, outcome.new_text);
            }
        }
    }

    println!(
        "\n完成: 共 {} 处变更，已更新 {} 处，跳过 {} 处",
        summary.total, summary.applied, summary.skipped
    );
}

fn print_report(report: &RunReport, quiet: bool) {
    match report {
        RunReport::Versions(versions) => print_versions(versions),
        RunReport::NoChanges => println!("两个版本之间没有文本变更"),
        RunReport::Preview(diffs) => {
            print_changes(diffs);
            println!("\n预览模式：不会修改任何文件");
        }
        RunReport::Applied { diffs, outcomes } => {
            if !quiet {
                print_changes(diffs);
                println!();
            }
            print_outcomes(outcomes, quiet);
        }
    }
}

/// 读取一行输入，输入结束时返回错误
fn read_line(message: &str) -> Result<String> {
    print!("{}", message);
    io::stdout().flush()?;

    let mut line = String::new();
    let read = io::stdin().lock().read_line(&mut line)?;

    if read == 0 {
        bail!("操作已取消");
    }

    Ok(line.trim().to_string())
}

fn prompt_figma_url() -> Result<String> {
    loop {
        let answer = read_line("请粘贴 Figma 设计稿链接: ")?;

        if answer.contains("figma.com") {
            return Ok(answer);
        }

        println!("请输入有效的 Figma 链接");
    }
}

/// 默认选项：旧版本为最新版本，新版本为第二新的版本；命令行指定的版本优先
fn default_version_indices(versions: &[VersionInfo], old: Option<&str>, new: Option<&str>) -> (usize, usize) {
    let position = |id: &str| versions.iter().position(|v| v.id == id).unwrap_or(0);

    let old_index = old.map(position).unwrap_or(0);
    let new_index = new
        .map(position)
        .unwrap_or_else(|| versions.len().saturating_sub(1).min(1));

    (old_index, new_index)
}

fn prompt_version_index(message: &str, count: usize, default: usize) -> Result<usize> {
    loop {
        let answer = read_line(&format!("{} [{}]: ", message, default + 1))?;

        if answer.is_empty() {
            return Ok(default);
        }

        match answer.parse::<usize>() {
            Ok(n) if (1..=count).contains(&n) => return Ok(n - 1),
            _ => println!("请输入 1 到 {} 之间的序号", count),
        }
    }
}

fn prompt_versions(versions: &[VersionInfo], old: Option<&str>, new: Option<&str>) -> Result<(String, String)> {
    let (old_default, new_default) = default_version_indices(versions, old, new);

    let old_index = prompt_version_index("选择旧版本（从该版本读取原文本）", versions.len(), old_default)?;
    let new_index = prompt_version_index("选择新版本（更新到该版本）", versions.len(), new_default)?;

    Ok((versions[old_index].id.clone(), versions[new_index].id.clone()))
}

fn prompt_directory(cwd: &Path) -> Result<PathBuf> {
    let answer = read_line(&format!("替换字符串的目录（留空为 {}）: ", cwd.display()))?;

    if answer.is_empty() {
        Ok(PathBuf::from("."))
    } else {
        Ok(PathBuf::from(answer))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};

    fn version(id: &str) -> VersionInfo {
        VersionInfo {
            id: id.to_string(),
            label: None,
            created_at: Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap(),
            author: "designer".to_string(),
        }
    }

    #[test]
    fn test_default_version_indices() {
        let versions = vec![version("3"), version("2"), version("1")];
        assert_eq!(default_version_indices(&versions, None, None), (0, 1));
        assert_eq!(default_version_indices(&versions, Some("2"), Some("1")), (1, 2));
        assert_eq!(default_version_indices(&versions, Some("missing"), None), (0, 1));

        let single = vec![version("1")];
        assert_eq!(default_version_indices(&single, None, None), (0, 0));
    }

    #[test]
    fn test_format_version_with_label() {
        let mut v = version("42");
        v.label = Some("Release".to_string());
        let formatted = format_version(&v);
        assert!(formatted.starts_with("42 • Release | "));
        assert!(formatted.ends_with("| designer"));
    }
}
