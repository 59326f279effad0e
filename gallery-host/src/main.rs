//! # gallery
//!
//! 角色图鉴命令行入口。
//!
//! ```text
//! gallery check                  加载数据与全部资源并输出报告
//! gallery serve [--port N]       运行只读资源服务
//! gallery simulate --ticks N     无界面运行：选中前两个角色并按 60Hz 推进
//! ```

use std::path::PathBuf;
use std::process::ExitCode;
use std::time::Duration;

use clap::{Parser, Subcommand};
use gallery_host::{AppConfig, HostError, LoadStatus, load_gallery};
use gallery_runtime::{ManualClock, Slot, UnitId};
use tracing::{Level, error, info, warn};

/// 60Hz 的逻辑帧间隔
const TICK: Duration = Duration::from_nanos(16_666_667);

#[derive(Parser, Debug)]
#[command(name = "gallery", version, about = "角色图鉴宿主")]
struct Cli {
    /// 配置文件路径
    #[arg(long, global = true, default_value = "config.json")]
    config: PathBuf,

    /// 提高日志级别（-v debug，-vv trace）
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    verbose: u8,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// 加载数据与全部资源并输出报告
    Check,

    /// 运行只读资源服务
    Serve {
        /// 监听端口（覆盖配置文件）
        #[arg(long)]
        port: Option<u16>,
    },

    /// 无界面运行若干帧
    Simulate {
        /// 推进的帧数
        #[arg(long, default_value_t = 600)]
        ticks: u32,
    },
}

fn init_logging(config: &AppConfig, verbose: u8) {
    let level = match verbose {
        0 => config.log_level.parse().unwrap_or(Level::INFO),
        1 => Level::DEBUG,
        _ => Level::TRACE,
    };
    tracing_subscriber::fmt().with_max_level(level).init();
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let loaded = AppConfig::try_load(&cli.config);
    let config = loaded.as_ref().cloned().unwrap_or_default();
    init_logging(&config, cli.verbose);
    match &loaded {
        Ok(_) => info!(path = %cli.config.display(), "配置文件加载成功"),
        Err(e) => warn!(error = %e, "使用默认配置"),
    }

    match run(cli.command, config) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!(error = %e, "运行失败");
            ExitCode::FAILURE
        }
    }
}

fn run(command: Command, mut config: AppConfig) -> Result<(), HostError> {
    match command {
        Command::Check => check(&config),
        Command::Serve { port } => {
            if let Some(port) = port {
                config.server.port = port;
            }
            serve(&config)
        }
        Command::Simulate { ticks } => simulate(&config, ticks),
    }
}

fn check(config: &AppConfig) -> Result<(), HostError> {
    config.validate()?;
    let loaded = load_gallery(config)?;

    println!("角色: {}", loaded.roster.len());
    println!("台词库: {}", loaded.dialogue.len());
    println!("缺失帧: {}", loaded.missing_frames());
    println!("缺失血条: {}", loaded.missing_health_bars());
    println!(
        "状态: {}",
        match loaded.status {
            LoadStatus::Ready => "就绪".to_string(),
            LoadStatus::Loading {
                completed,
                expected,
            } => format!("加载中 {completed}/{expected}"),
        }
    );
    Ok(())
}

#[cfg(feature = "server")]
fn serve(config: &AppConfig) -> Result<(), HostError> {
    use gallery_host::server::{self, ServerState};

    let data = gallery_host::load_gallery_data(config);
    server::serve(config, ServerState::new(data, &config.assets_root))?;
    Ok(())
}

#[cfg(not(feature = "server"))]
fn serve(_config: &AppConfig) -> Result<(), HostError> {
    Err(HostError::ServerDisabled)
}

fn simulate(config: &AppConfig, ticks: u32) -> Result<(), HostError> {
    let loaded = load_gallery(config)?;
    let unit_count = loaded.roster.len();

    let clock = ManualClock::new();
    let mut gallery = loaded.into_gallery(config.canvas.to_canvas(), Box::new(clock.clone()));

    gallery.click_unit(UnitId(0), Slot::Primary);
    if unit_count > 1 {
        gallery.click_unit(UnitId(1), Slot::Secondary);
    }

    let mut last_line = None;
    for _ in 0..ticks {
        clock.advance(TICK);
        gallery.tick();

        let line = gallery.view().line;
        if line != last_line {
            if let Some(line) = &line {
                info!(speaker = %line.speaker, text = %line.text, "台词");
            }
            last_line = line;
        }
    }

    let view = gallery.view();
    match serde_json::to_string_pretty(&view) {
        Ok(json) => println!("{json}"),
        Err(e) => warn!(error = %e, "无法序列化最终状态"),
    }
    Ok(())
}
