//! 策略链协调器
//!
//! 按优先级依次运行提取策略：解析 → 规范化 → 校验，返回第一个被接受的目录。
//! 每次尝试的结果都记录为 [`StrategyOutcome`]。

use crate::config::ResolverConfig;
use crate::epub::error::{EpubError, Result};
use crate::epub::ArchiveAccessor;
use crate::toc::content::{CueDetector, build_from_content, default_detectors};
use crate::toc::error::{StrategyFailure, ValidationRejection};
use crate::toc::item::{TocItem, count_items};
use crate::toc::normalize::Normalizer;
use crate::toc::render::TocStatistics;
use crate::toc::strategy::StrategyKind;
use crate::toc::validate::validate;
use serde::Serialize;
use std::fs;
use std::path::Path;
use tracing::{debug, info, warn};

/// 策略链的状态
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChainState {
    /// 尚未开始
    Pending,
    /// 正在尝试某个策略
    Trying(StrategyKind),
    /// 某个策略的结果被接受
    Accepted(StrategyKind),
    /// 所有策略都失败
    Exhausted,
}

/// 一次策略尝试的记录
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StrategyOutcome {
    /// 策略
    pub strategy: StrategyKind,
    /// 是否被接受
    pub success: bool,
    /// 规范化后的条目数，解析失败时为0
    pub item_count: usize,
    /// 失败原因
    pub reason: Option<String>,
}

impl StrategyOutcome {
    fn accepted(strategy: StrategyKind, item_count: usize) -> Self {
        Self {
            strategy,
            success: true,
            item_count,
            reason: None,
        }
    }

    fn failed(strategy: StrategyKind, item_count: usize, failure: &StrategyFailure) -> Self {
        Self {
            strategy,
            success: false,
            item_count,
            reason: Some(failure.to_string()),
        }
    }
}

/// 书籍元数据，缺失的字段序列化为null
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ExtractionMetadata {
    pub title: Option<String>,
    pub authors: Vec<String>,
    pub language: Option<String>,
    pub publisher: Option<String>,
    pub date: Option<String>,
    /// 最后修改时间(dcterms:modified)
    pub modified: Option<String>,
    pub identifier: Option<String>,
    pub description: Option<String>,
    pub epub_version: Option<String>,
    pub file_size: Option<u64>,
}

impl ExtractionMetadata {
    /// 从归档的OPF包文件中提取元数据
    pub fn from_archive<A: ArchiveAccessor + ?Sized>(archive: &A) -> Self {
        let package = archive.package();
        let metadata = &package.metadata;

        Self {
            title: metadata.title(),
            authors: metadata.authors(),
            language: metadata.language(),
            publisher: metadata.publisher(),
            date: metadata.date(),
            modified: metadata.modified(),
            identifier: metadata.identifier(),
            description: metadata.description(),
            epub_version: Some(package.version.clone()).filter(|version| !version.is_empty()),
            file_size: archive.file_size(),
        }
    }
}

/// 目录解析结果
#[derive(Debug, Clone, PartialEq)]
pub struct Resolution {
    /// 规范化后的目录，策略链耗尽时为空
    pub toc: Vec<TocItem>,
    /// 书籍元数据
    pub metadata: ExtractionMetadata,
    /// 按尝试顺序排列的策略记录
    pub outcomes: Vec<StrategyOutcome>,
    /// 最终状态
    pub state: ChainState,
}

#[derive(Serialize)]
struct ResolutionJson<'a> {
    metadata: &'a ExtractionMetadata,
    toc: &'a [TocItem],
}

impl Resolution {
    /// 被接受的策略
    pub fn accepted_strategy(&self) -> Option<StrategyKind> {
        match self.state {
            ChainState::Accepted(kind) => Some(kind),
            _ => None,
        }
    }

    /// 是否得到了目录
    pub fn is_resolved(&self) -> bool {
        self.accepted_strategy().is_some()
    }

    /// 目录统计信息
    pub fn statistics(&self) -> TocStatistics {
        TocStatistics::from_items(&self.toc)
    }

    /// 序列化为 `{metadata, toc}` 格式的JSON，保留非ASCII字符
    pub fn to_json(&self) -> Result<String> {
        let json = serde_json::to_string_pretty(&ResolutionJson {
            metadata: &self.metadata,
            toc: &self.toc,
        })?;
        Ok(json)
    }

    /// 将JSON写入文件，必要时创建父目录
    pub fn save_json<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let path = path.as_ref();
        if let Some(parent) = path.parent().filter(|parent| !parent.as_os_str().is_empty()) {
            fs::create_dir_all(parent)?;
        }
        fs::write(path, self.to_json()?)?;
        info!(path = %path.display(), "目录已保存");
        Ok(())
    }
}

type Attempt = std::result::Result<Vec<TocItem>, (StrategyFailure, usize)>;

/// 目录解析器
pub struct Resolver {
    config: ResolverConfig,
    detectors: Vec<Box<dyn CueDetector>>,
}

impl Resolver {
    /// 使用给定配置创建解析器，配置无效时返回错误
    pub fn new(config: ResolverConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            config,
            detectors: default_detectors(),
        })
    }

    /// 替换内容启发式的检测规则
    pub fn with_detectors(mut self, detectors: Vec<Box<dyn CueDetector>>) -> Self {
        self.detectors = detectors;
        self
    }

    pub fn config(&self) -> &ResolverConfig {
        &self.config
    }

    /// 解析归档的目录
    ///
    /// # 参数
    /// * `archive` - 已打开的归档
    ///
    /// # 返回值
    /// * `Result<Resolution, EpubError>` - 目录、元数据和策略尝试记录
    ///
    /// 所有策略都失败时：如果没有任何可读的书脊文档，返回
    /// [`EpubError::NoReadableContent`]；否则返回状态为 [`ChainState::Exhausted`] 的空结果。
    pub fn resolve<A: ArchiveAccessor + ?Sized>(&self, archive: &mut A) -> Result<Resolution> {
        let metadata = ExtractionMetadata::from_archive(&*archive);
        let normalizer = Normalizer::new(self.config.max_depth);
        let mut outcomes = Vec::with_capacity(self.config.strategies.len());
        let mut state = ChainState::Pending;

        for &kind in &self.config.strategies {
            state = ChainState::Trying(kind);
            debug!(strategy = %kind, ?state, "尝试提取策略");

            match self.run_strategy(kind, archive, &normalizer) {
                Ok(toc) => {
                    let item_count = count_items(&toc);
                    info!(strategy = %kind, items = item_count, "目录提取成功");
                    outcomes.push(StrategyOutcome::accepted(kind, item_count));
                    return Ok(Resolution {
                        toc,
                        metadata,
                        outcomes,
                        state: ChainState::Accepted(kind),
                    });
                }
                Err((failure, item_count)) => {
                    debug!(strategy = %kind, reason = %failure, "策略失败");
                    outcomes.push(StrategyOutcome::failed(kind, item_count, &failure));
                }
            }
        }

        if !has_readable_content(archive) {
            return Err(EpubError::NoReadableContent);
        }

        warn!(previous = ?state, "所有提取策略均失败");
        Ok(Resolution {
            toc: Vec::new(),
            metadata,
            outcomes,
            state: ChainState::Exhausted,
        })
    }

    fn run_strategy<A: ArchiveAccessor + ?Sized>(
        &self,
        kind: StrategyKind,
        archive: &mut A,
        normalizer: &Normalizer,
    ) -> Attempt {
        let candidate = kind
            .attempt(archive, &self.detectors)
            .map_err(|err| (StrategyFailure::from(err), 0))?;
        let toc = normalizer.normalize(candidate.items, &candidate.source);

        match validate(&toc, &*archive, self.config.max_items) {
            Ok(()) => Ok(toc),
            // 正文线索过多时退回到每个文档一个条目
            Err(ValidationRejection::TooManyItems { count, limit }) if kind == StrategyKind::Content => {
                debug!(count, limit, "内容线索过多，改为按文档生成目录");
                let coarse = build_from_content(archive, &[]).map_err(|err| (StrategyFailure::from(err), count))?;
                let coarse = normalizer.normalize(coarse, archive.package_path());
                let coarse_count = count_items(&coarse);
                validate(&coarse, &*archive, self.config.max_items)
                    .map(|()| coarse)
                    .map_err(|rejection| (StrategyFailure::from(rejection), coarse_count))
            }
            Err(rejection) => Err((StrategyFailure::from(rejection), count_items(&toc))),
        }
    }
}

/// 是否至少有一个书脊文档可读
fn has_readable_content<A: ArchiveAccessor + ?Sized>(archive: &mut A) -> bool {
    archive
        .spine_paths()
        .iter()
        .any(|path| archive.read_text(path).is_ok())
}
