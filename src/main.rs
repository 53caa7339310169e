//! Media Manifest CLI
//!
//! Scans a media tree and writes per-category manifests for the converters.

use clap::{Args, Parser, Subcommand};
use log::{error, info};
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use media_manifest::config::{DEFAULT_NUM_WORKERS, DEFAULT_PROBE_PROGRAM};
use media_manifest::{
    logging, manifest, scan_full, CategoryPolicy, InclusionPolicy, ScanConfig, ScanOutcome,
};

const ABOUT: &str = r#"
Media Manifest - 媒体去重与分类清单生成器

使用示例:
  media_manifest scan -s /iphone-dump -d /converted            扫描全部类别
  media_manifest scan -s /dump -d /out --native-only           只收录原生格式 (.heic/.heif/.mov)
  media_manifest scan -s /dump -d /out --native-only-videos    只有视频限制为原生格式
  media_manifest scan -s /dump -d /out --no-slowmo             不生成慢动作清单
  media_manifest scan -s /dump -d /out --json                  JSON格式输出
  media_manifest show /out/data/<时间戳>/photos_<时间戳>.json   显示每个校验和的代表文件
"#;

/// Media deduplication and manifest generator
#[derive(Parser)]
#[command(name = "media_manifest")]
#[command(author, version, about = ABOUT, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// 扫描源目录并生成分类清单
    Scan {
        /// 源目录
        #[arg(short = 's', long, help = "要扫描的源目录")]
        source: PathBuf,

        /// 目标目录
        #[arg(short = 'd', long, help = "清单与日志的输出目录，不存在时自动创建")]
        dest: PathBuf,

        #[command(flatten)]
        policy: PolicyArgs,

        /// 哈希线程数（0 = 自动检测）
        #[arg(short = 'w', long, default_value_t = DEFAULT_NUM_WORKERS, help = "并行哈希线程数，0表示自动检测")]
        workers: usize,

        #[arg(long, default_value = DEFAULT_PROBE_PROGRAM, help = "帧率探测程序 (ffprobe)")]
        probe: String,

        #[arg(long, default_value_t = media_manifest::config::DEFAULT_SLOWMO_FPS_THRESHOLD, help = "高于此帧率视为慢动作")]
        threshold: f64,

        #[arg(long, help = "不输出进度信息")]
        no_progress: bool,

        #[arg(long, help = "输出JSON格式的扫描结果")]
        json: bool,
    },
    /// 显示清单中每个校验和的代表文件
    Show {
        /// 清单文件路径
        manifest: PathBuf,
    },
}

/// Per-category inclusion flags
#[derive(Args, Debug, Default)]
struct PolicyArgs {
    #[arg(long, help = "不收录照片")]
    no_photos: bool,

    #[arg(long, help = "不收录普通视频")]
    no_videos: bool,

    #[arg(long, help = "不收录慢动作视频")]
    no_slowmo: bool,

    #[arg(long, help = "所有类别只收录原生格式，忽略其他图片与视频格式")]
    native_only: bool,

    #[arg(long, help = "照片只收录原生格式 (.heic/.heif)")]
    native_only_photos: bool,

    #[arg(long, help = "普通视频只收录原生格式 (.mov)")]
    native_only_videos: bool,

    #[arg(long, help = "慢动作视频只收录原生格式 (.mov)")]
    native_only_slowmo: bool,
}

impl PolicyArgs {
    fn policy(&self) -> InclusionPolicy {
        let category = |excluded: bool, native_only: bool| {
            CategoryPolicy::new(!excluded, !(self.native_only || native_only))
        };
        InclusionPolicy {
            photos: category(self.no_photos, self.native_only_photos),
            videos: category(self.no_videos, self.native_only_videos),
            slowmo: category(self.no_slowmo, self.native_only_slowmo),
        }
    }
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    match cli.command {
        Some(Commands::Scan {
            source,
            dest,
            policy,
            workers,
            probe,
            threshold,
            no_progress,
            json,
        }) => {
            let config = ScanConfig::builder()
                .source_dir(source)
                .manifest_dir(dest)
                .policy(policy.policy())
                .num_workers(workers)
                .probe_program(probe)
                .slowmo_fps_threshold(threshold)
                .show_progress(!no_progress)
                .build();
            run_scan(config, json)
        }
        Some(Commands::Show { manifest }) => {
            init_console_logging();
            show_manifest(&manifest)
        }
        None => {
            println!("{}", ABOUT);
            println!("使用 'media_manifest scan -h' 查看扫描命令的详细帮助");
            ExitCode::SUCCESS
        }
    }
}

fn init_console_logging() {
    if let Err(e) = logging::init(None) {
        eprintln!("Failed to initialize logging: {}", e);
    }
}

fn run_scan(config: ScanConfig, json: bool) -> ExitCode {
    if let Err(e) = std::fs::create_dir_all(&config.manifest_dir) {
        init_console_logging();
        error!("Cannot create {}: {}", config.manifest_dir.display(), e);
        return ExitCode::from(2);
    }

    let timestamp = manifest::scan_timestamp();
    let log_path = logging::log_file_path(&config.manifest_dir, &timestamp);
    if let Err(e) = logging::init(Some(&log_path)) {
        init_console_logging();
        error!("Cannot open log file {}: {}", log_path.display(), e);
    }

    if let Err(e) = config.validate() {
        error!("{}", e);
        return ExitCode::from(2);
    }

    info!("Source directory:   {}", config.source_dir.display());
    info!("Manifest directory: {}", config.manifest_dir.display());
    for category in media_manifest::Category::MANIFEST {
        let flags = config.policy.for_category(category);
        info!(
            "  {:<7}: {} (non-native: {})",
            category.as_str(),
            if flags.include { "yes" } else { "no" },
            if flags.include_non_native { "yes" } else { "no" }
        );
    }

    let outcome = match scan_full(&config, &timestamp) {
        Ok(outcome) => outcome,
        Err(e) => {
            error!("Scan failed: {}", e);
            return ExitCode::from(2);
        }
    };

    if json {
        match serde_json::to_string_pretty(&outcome) {
            Ok(text) => println!("{}", text),
            Err(e) => error!("Failed to serialize scan result: {}", e),
        }
    } else {
        print_summary(&outcome, &log_path);
    }

    if outcome.manifest_failures.is_empty() {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    }
}

fn print_summary(outcome: &ScanOutcome, log_path: &Path) {
    println!("Scan completed:");
    println!("  Total files:    {}", outcome.total_files);
    println!("  Admitted:       {}", outcome.admitted_files);
    println!("  Duplicates:     {}", outcome.duplicate_files);
    println!("  Unclassified:   {}", outcome.unclassified_files);
    println!("  Filtered out:   {}", outcome.filtered_files);
    println!("  Duration:       {}ms", outcome.duration_ms);
    for (category, path) in &outcome.manifests {
        println!("  {:<7} -> {}", category.as_str(), path.display());
    }
    for (category, e) in &outcome.manifest_failures {
        println!("  {:<7} FAILED: {}", category.as_str(), e.message);
    }
    println!("  Failures:       {}", outcome.failure_summary());
    println!("  Log:            {}", log_path.display());
}

fn show_manifest(path: &Path) -> ExitCode {
    match manifest::read_manifest(path) {
        Ok(None) => {
            println!("No manifest at {}, nothing to do", path.display());
            ExitCode::SUCCESS
        }
        Ok(Some(map)) => {
            for (checksum, representative) in map.representatives() {
                println!("{}  {}", checksum, representative);
            }
            println!(
                "{} unique file(s), {} duplicate(s)",
                map.len(),
                map.duplicate_count()
            );
            ExitCode::SUCCESS
        }
        Err(e) => {
            error!("{}", e);
            ExitCode::FAILURE
        }
    }
}
