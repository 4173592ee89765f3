use clap::Parser;
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use tocforge::toc::batch::output_file_name;
use tocforge::{
    ChainState, Epub, Resolution, Resolver, ResolverConfig, Result, StrategyKind, TocRenderer, TocStyle,
    process_batch,
};
use tracing::debug;

/// 📚 TocForge - EPUB目录解析工具
#[derive(Parser)]
#[command(name = "tocforge")]
#[command(about = "从EPUB文件中解析目录结构")]
#[command(version)]
struct Args {
    /// EPUB文件路径，多个文件时批量处理
    #[arg(required_unless_present = "init_config", help = "要处理的EPUB文件路径")]
    epub_files: Vec<PathBuf>,

    /// YAML配置文件
    #[arg(short, long, help = "解析配置文件路径")]
    config: Option<PathBuf>,

    /// 提取策略
    #[arg(
        short,
        long,
        value_delimiter = ',',
        help = "按顺序尝试的提取策略，例如 ncx,nav,spine"
    )]
    methods: Vec<String>,

    /// 最大目录深度
    #[arg(long, help = "目录最大层数（覆盖配置文件）")]
    max_depth: Option<u32>,

    /// 最大目录条目数
    #[arg(long, help = "目录最大条目数（覆盖配置文件）")]
    max_items: Option<usize>,

    /// 以JSON输出
    #[arg(short, long, help = "以JSON格式输出目录和元数据")]
    json: bool,

    /// 输出目录
    #[arg(short, long, help = "将每本书的目录写入 <文件名>_toc.json")]
    output_dir: Option<PathBuf>,

    /// 目录树显示样式
    #[arg(long, value_enum, default_value = "tree", help = "目录树的显示样式")]
    style: StyleArg,

    /// 显示文件路径
    #[arg(long, help = "在目录树中显示链接目标")]
    show_paths: bool,

    /// 显示深度
    #[arg(long, value_name = "DEPTH", help = "目录树最多显示的层数（不影响JSON输出）")]
    display_depth: Option<u32>,

    /// 详细输出模式
    #[arg(short, long, help = "显示调试日志和策略尝试记录")]
    verbose: bool,

    /// 生成默认配置文件
    #[arg(long, value_name = "PATH", help = "在指定路径生成默认配置文件后退出")]
    init_config: Option<PathBuf>,
}

/// 目录树显示样式
#[derive(clap::ValueEnum, Clone, Copy, Debug)]
enum StyleArg {
    /// 树状符号
    Tree,
    /// 缩进列表
    Indented,
}

impl From<StyleArg> for TocStyle {
    fn from(style: StyleArg) -> Self {
        match style {
            StyleArg::Tree => TocStyle::TreeSymbols,
            StyleArg::Indented => TocStyle::Indented,
        }
    }
}

fn main() -> ExitCode {
    let args = Args::parse();

    let default_level = if args.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| default_level.into()),
        )
        .with_writer(std::io::stderr)
        .init();

    match run(&args) {
        Ok(true) => ExitCode::SUCCESS,
        Ok(false) => ExitCode::FAILURE,
        Err(e) => {
            eprintln!("❌ 错误: {}", e);
            ExitCode::FAILURE
        }
    }
}

/// 执行命令，返回是否所有文件都解析成功
fn run(args: &Args) -> Result<bool> {
    if let Some(path) = &args.init_config {
        ResolverConfig::generate_default_config(path)?;
        println!("✅ 默认配置文件已生成: {}", path.display());
        return Ok(true);
    }

    let resolver = Resolver::new(build_config(args)?)?;
    let config = resolver.config();
    debug!(
        strategies = ?config.strategies,
        max_depth = config.max_depth,
        max_items = config.max_items,
        "解析配置"
    );

    if args.epub_files.len() == 1 {
        return process_single(&resolver, &args.epub_files[0], args);
    }

    let report = process_batch(&resolver, &args.epub_files, args.output_dir.as_deref())?;
    if args.json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        println!("📊 共处理 {} 个文件: 成功 {}, 失败 {}", report.total_files, report.successful, report.failed);
        for result in &report.results {
            match (&result.strategy, &result.error) {
                (Some(strategy), None) => {
                    println!("  ✅ {} [{}] {} 个条目", result.file, strategy, result.item_count)
                }
                (_, Some(error)) => println!("  ❌ {}: {}", result.file, error),
                (None, None) => println!("  ❔ {}", result.file),
            }
        }
        if args.verbose {
            println!("\n📈 策略统计:");
            for (kind, stats) in report.strategy_tally.iter() {
                println!(
                    "  {}: 尝试 {}, 接受 {}, 拒绝 {}",
                    kind, stats.attempts, stats.accepted, stats.rejected
                );
            }
        }
    }

    Ok(report.failed == 0)
}

/// 合并配置文件和命令行参数，命令行优先
fn build_config(args: &Args) -> Result<ResolverConfig> {
    let mut config = match &args.config {
        Some(path) => ResolverConfig::from_file(path)?,
        None => ResolverConfig::default(),
    };

    if !args.methods.is_empty() {
        let strategies = args
            .methods
            .iter()
            .map(|name| name.parse::<StrategyKind>())
            .collect::<Result<Vec<_>>>()?;
        config = config.with_strategies(strategies);
    }
    if let Some(max_depth) = args.max_depth {
        config = config.with_max_depth(max_depth);
    }
    if let Some(max_items) = args.max_items {
        config = config.with_max_items(max_items);
    }

    Ok(config)
}

fn process_single(resolver: &Resolver, path: &Path, args: &Args) -> Result<bool> {
    let mut epub = Epub::open(path)?;
    let resolution = resolver.resolve(&mut epub)?;

    if let Some(dir) = &args.output_dir {
        resolution.save_json(dir.join(output_file_name(path)))?;
    }

    if args.json {
        println!("{}", resolution.to_json()?);
    } else {
        display_resolution(&resolution, args);
    }

    Ok(resolution.is_resolved())
}

fn display_resolution(resolution: &Resolution, args: &Args) {
    if args.verbose {
        println!("🔍 策略尝试记录:");
        for outcome in &resolution.outcomes {
            match &outcome.reason {
                Some(reason) => println!("  ❌ {}: {}", outcome.strategy, reason),
                None => println!("  ✅ {}: {} 个条目", outcome.strategy, outcome.item_count),
            }
        }
        println!();
    }

    match resolution.state {
        ChainState::Accepted(kind) => {
            println!("  📊 {} (来源: {})", resolution.statistics(), kind);
            println!("\n{}", build_renderer(resolution, args));
        }
        _ => println!("⚠️  所有提取策略均失败，未能生成目录"),
    }
}

fn build_renderer<'a>(resolution: &'a Resolution, args: &Args) -> TocRenderer<'a> {
    TocRenderer::new(&resolution.toc)
        .with_title(resolution.metadata.title.clone())
        .with_style(args.style.into())
        .with_show_paths(args.show_paths)
        .with_max_depth(args.display_depth)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tocforge::{ExtractionMetadata, TocItem};

    fn resolution() -> Resolution {
        Resolution {
            toc: vec![
                TocItem::new("第一章", "ch1.xhtml", 0).with_children(vec![TocItem::new("第一节", "ch1.xhtml#s1", 0)]),
                TocItem::new("第二章", "ch2.xhtml", 0),
            ],
            metadata: ExtractionMetadata::default(),
            outcomes: Vec::new(),
            state: ChainState::Accepted(StrategyKind::Ncx),
        }
    }

    #[test]
    fn test_display_depth_limits_rendering() {
        let args = Args::try_parse_from(["tocforge", "book.epub", "--display-depth", "1", "--style", "indented"]).unwrap();
        assert_eq!(args.display_depth, Some(1));

        let resolution = resolution();
        assert_eq!(build_renderer(&resolution, &args).to_string(), "• 第一章\n• 第二章\n");
    }

    #[test]
    fn test_full_depth_by_default() {
        let args = Args::try_parse_from(["tocforge", "book.epub"]).unwrap();
        assert_eq!(args.display_depth, None);

        let resolution = resolution();
        assert!(build_renderer(&resolution, &args).to_string().contains("第一节"));
    }

    #[test]
    fn test_methods_override_config() {
        let args = Args::try_parse_from(["tocforge", "book.epub", "--methods", "nav,guide", "--max-depth", "4"]).unwrap();
        let config = build_config(&args).unwrap();
        assert_eq!(config.strategies, vec![StrategyKind::Nav, StrategyKind::Landmarks]);
        assert_eq!(config.max_depth, 4);
    }
}
