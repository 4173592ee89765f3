pub mod config;
pub mod epub;
pub mod toc;

// === 核心API重新导出 ===

/// EPUB文件读取器
pub use epub::Epub;

/// 错误处理
pub use epub::{EpubError, Result};

/// 归档访问
pub use epub::{ArchiveAccessor, MemoryArchive};

/// 解析配置
pub use config::ResolverConfig;

// === 目录解析 ===

pub use toc::{
    BatchReport,
    ChainState,
    ExtractionMetadata,
    Resolution,
    Resolver,
    StrategyKind,
    StrategyOutcome,
    TocItem,
    TocRenderer,
    TocStatistics,
    TocStyle,
    process_batch,
};

// === 底层组件（高级用法） ===

/// 容器和OPF组件
pub use epub::{Container, Creator, GuideReference, ManifestItem, Metadata, Opf, RootFile, SpineItem};

// === 库信息 ===

/// TocForge库的版本信息
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// TocForge库的描述
pub const DESCRIPTION: &str = "一个从EPUB文件中解析目录结构的Rust库";

// === 便捷函数 ===

/// 打开EPUB文件并解析目录
///
/// # 示例
///
/// ```no_run
/// let resolution = tocforge::resolve_file("book.epub", tocforge::ResolverConfig::default())?;
/// println!("{}", tocforge::TocRenderer::new(&resolution.toc));
/// # Ok::<(), tocforge::EpubError>(())
/// ```
pub fn resolve_file<P: AsRef<std::path::Path>>(path: P, config: ResolverConfig) -> Result<Resolution> {
    let resolver = Resolver::new(config)?;
    let mut epub = Epub::open(path)?;
    resolver.resolve(&mut epub)
}
