//! # xtask - 开发辅助工具
//!
//! 提供本地质量门禁与开发辅助命令。
//!
//! ## 命令
//!
//! - `check-all`: 运行 fmt、clippy、test
//! - `cov-runtime`: 运行 gallery-runtime 覆盖率
//! - `cov-workspace`: 运行 workspace 覆盖率
//! - `data-check`: 检查数据目录（角色记录、精灵配置、帧图像、台词）

use std::collections::BTreeSet;
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use gallery_host::{FsSource, HEALTH_BAR_PATH, data::load_unit};
use gallery_runtime::{UnitDescriptor, UnitDialogue};
use walkdir::WalkDir;
use xshell::{Shell, cmd};

fn ensure_cargo_llvm_cov_available(sh: &Shell) -> anyhow::Result<()> {
    match cmd!(sh, "cargo llvm-cov --version").quiet().ignore_stdout().run() {
        Ok(()) => Ok(()),
        Err(_) => anyhow::bail!(
            "cargo llvm-cov 不可用。\n\
请先安装：\n\
  - cargo install cargo-llvm-cov\n\
  - rustup component add llvm-tools-preview\n\
然后重试。"
        ),
    }
}

fn main() -> ExitCode {
    if let Err(e) = real_main() {
        eprintln!("xtask error: {e:#}");
        return ExitCode::from(1);
    }
    ExitCode::from(0)
}

fn real_main() -> anyhow::Result<()> {
    let mut args = std::env::args().skip(1);
    let sub = args.next().unwrap_or_else(|| "help".to_string());
    let sh = Shell::new()?;

    match sub.as_str() {
        "check-all" => {
            eprintln!("\n==> cargo fmt --all -- --check");
            cmd!(sh, "cargo fmt --all -- --check").run()?;

            eprintln!("\n==> cargo clippy --workspace --all-targets");
            cmd!(sh, "cargo clippy --workspace --all-targets").run()?;

            eprintln!("\n==> cargo test --workspace");
            cmd!(sh, "cargo test --workspace").run()?;
        }
        "cov-runtime" => {
            ensure_cargo_llvm_cov_available(&sh)?;

            eprintln!("\n==> cargo llvm-cov -p gallery-runtime --all-features --html");
            cmd!(sh, "cargo llvm-cov -p gallery-runtime --all-features --html").run()?;

            eprintln!("\nCoverage HTML: target/llvm-cov/html/index.html");
        }
        "cov-workspace" => {
            ensure_cargo_llvm_cov_available(&sh)?;

            // 排除 xtask 以免稀释信号
            eprintln!("\n==> cargo llvm-cov --workspace --exclude xtask --all-features --html");
            cmd!(
                sh,
                "cargo llvm-cov --workspace --exclude xtask --all-features --html"
            )
            .run()?;

            eprintln!("\nCoverage HTML: target/llvm-cov/html/index.html");
        }
        "data-check" => {
            let data_dir = args.next().map(PathBuf::from);
            let assets_root = args.next().map(PathBuf::from);
            data_check(data_dir, assets_root)?;
        }
        "help" | "-h" | "--help" => {
            print_help();
        }
        other => anyhow::bail!("unknown xtask subcommand: {other}"),
    }

    Ok(())
}

fn print_help() {
    eprintln!(
        r#"xtask - 开发辅助工具

USAGE:
  cargo xtask <command>

COMMANDS:
  check-all       运行 fmt、clippy、test 门禁检查
  cov-runtime     运行 gallery-runtime 覆盖率报告
  cov-workspace   运行 workspace 覆盖率报告
  data-check      检查数据目录

DATA-CHECK:
  cargo xtask data-check [data_dir] [assets_root]

  默认 data_dir 为 data/，assets_root 为 public/assets/

  检查内容：
    - 角色记录与精灵配置能否解析
    - 每一帧图像是否存在
    - 台词的说话者与指名对象是否在名册中
    - 血条皮肤是否存在
"#
    );
}

//=============================================================================
// data-check 命令实现
//=============================================================================

/// 检查结果
#[derive(Default)]
struct DataCheckResult {
    units: Vec<UnitDescriptor>,
    errors: usize,
    warnings: usize,
}

impl DataCheckResult {
    fn error(&mut self, file: &str, message: impl std::fmt::Display) {
        eprintln!("[ERROR] {file}: {message}");
        self.errors += 1;
    }

    fn warn(&mut self, file: &str, message: impl std::fmt::Display) {
        eprintln!("[WARN] {file}: {message}");
        self.warnings += 1;
    }
}

fn data_check(data_dir: Option<PathBuf>, assets_root: Option<PathBuf>) -> anyhow::Result<()> {
    let data_dir = data_dir.unwrap_or_else(|| PathBuf::from("data"));
    let assets_root = assets_root.unwrap_or_else(|| PathBuf::from("public/assets"));
    if !data_dir.is_dir() {
        anyhow::bail!(
            "数据目录不存在: {}\n请在 workspace 根目录运行，或指定数据目录",
            data_dir.display()
        );
    }

    let files: Vec<PathBuf> = WalkDir::new(&data_dir)
        .max_depth(1)
        .sort_by_file_name()
        .into_iter()
        .filter_map(Result::ok)
        .filter(|e| e.file_type().is_file())
        .map(|e| e.into_path())
        .collect();

    let mut result = DataCheckResult::default();
    let mut dialogue_files = Vec::new();
    let source = FsSource::new(&data_dir);

    for path in &files {
        let Some(name) = path.file_name().and_then(|n| n.to_str()) else {
            continue;
        };
        if name.starts_with("Unit_") {
            check_unit_file(&source, name, &mut result);
        } else if name.starts_with("Dialogue_") && name.ends_with(".json") {
            dialogue_files.push(path.clone());
        }
    }

    check_frames(&assets_root, &mut result);

    let names: BTreeSet<String> = result.units.iter().map(|u| u.detail.name.clone()).collect();
    for path in &dialogue_files {
        check_dialogue_file(path, &names, &mut result);
    }

    eprintln!("─────────────────────────────────────────────────────");
    eprintln!(
        "检查完成: {} 个角色, {} 个台词文件",
        result.units.len(),
        dialogue_files.len()
    );
    if result.errors > 0 {
        eprintln!("❌ {} 个错误, {} 个警告", result.errors, result.warnings);
        anyhow::bail!("数据检查发现错误");
    } else if result.warnings > 0 {
        eprintln!("⚠️  0 个错误, {} 个警告", result.warnings);
    } else {
        eprintln!("✅ 检查通过，无错误");
    }
    Ok(())
}

fn check_unit_file(source: &FsSource, name: &str, result: &mut DataCheckResult) {
    match load_unit(source, name) {
        Ok(Some(unit)) => result.units.push(unit),
        Ok(None) => result.warn(name, "不是 .json 或 .txt，已忽略"),
        Err(e) => result.error(name, e),
    }
}

/// 检查每个角色的全部帧与血条皮肤，并列出没有被引用的图像
fn check_frames(assets_root: &Path, result: &mut DataCheckResult) {
    let mut referenced = BTreeSet::new();
    let mut missing = Vec::new();

    for unit in &result.units {
        for config in [
            &unit.idle_config,
            &unit.walk_config,
            &unit.attack_config,
            &unit.death_config,
        ] {
            for i in 0..config.total_size {
                let frame = config.frame_path(i);
                if !assets_root.join(&frame).is_file() {
                    missing.push((unit.detail.name.clone(), frame.clone()));
                }
                referenced.insert(frame);
            }
        }
    }
    for (unit, frame) in missing {
        result.warn(&unit, format!("帧图像不存在: {frame}"));
    }

    referenced.insert(HEALTH_BAR_PATH.to_string());
    if !result.units.is_empty() && !assets_root.join(HEALTH_BAR_PATH).is_file() {
        result.warn(HEALTH_BAR_PATH, "血条皮肤不存在");
    }

    let unreferenced = WalkDir::new(assets_root)
        .into_iter()
        .filter_map(Result::ok)
        .filter(|e| e.file_type().is_file())
        .filter_map(|e| {
            e.path()
                .strip_prefix(assets_root)
                .ok()
                .map(|p| p.to_string_lossy().replace('\\', "/"))
        })
        .filter(|p| !referenced.contains(p))
        .count();
    if unreferenced > 0 {
        eprintln!("[INFO] {unreferenced} 个图像文件未被任何角色引用");
    }
}

fn check_dialogue_file(path: &Path, names: &BTreeSet<String>, result: &mut DataCheckResult) {
    let file = path.display().to_string();
    let dialogue = match std::fs::read_to_string(path)
        .map_err(|e| e.to_string())
        .and_then(|c| UnitDialogue::from_json(&c).map_err(|e| e.to_string()))
    {
        Ok(d) => d,
        Err(e) => return result.error(&file, e),
    };

    for line in dialogue.normal.iter().chain(dialogue.taunt.iter()) {
        if !line.is_valid() {
            result.warn(&file, format!("{} 的台词为空", line.speaker));
        }
        if !names.contains(&line.speaker) {
            result.warn(&file, format!("说话者不在名册中: {}", line.speaker));
        }
        if let Some(target) = &line.to
            && !names.contains(target)
        {
            result.warn(&file, format!("指名对象不在名册中: {target}"));
        }
    }
}
