//! 批量处理
//!
//! 每本书在rayon线程池中独立解析，任务之间不共享状态；策略统计由各任务的
//! [`StrategyTally`] 合并得到。

use crate::epub::Epub;
use crate::epub::error::Result;
use crate::toc::resolver::{Resolver, StrategyOutcome};
use crate::toc::strategy::StrategyKind;
use rayon::prelude::*;
use serde::Serialize;
use std::collections::{BTreeMap, HashSet};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

/// 批处理报告的文件名
pub const REPORT_FILE_NAME: &str = "processing_report.json";

/// 单个策略的统计
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct StrategyStats {
    /// 尝试次数
    pub attempts: usize,
    /// 被接受次数
    pub accepted: usize,
    /// 失败或被拒绝次数
    pub rejected: usize,
}

/// 按策略累计的尝试结果
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct StrategyTally {
    strategies: BTreeMap<StrategyKind, StrategyStats>,
}

impl StrategyTally {
    pub fn new() -> Self {
        Self::default()
    }

    /// 记录一次解析中的所有策略尝试
    pub fn record(&mut self, outcomes: &[StrategyOutcome]) {
        for outcome in outcomes {
            let stats = self.strategies.entry(outcome.strategy).or_default();
            stats.attempts += 1;
            if outcome.success {
                stats.accepted += 1;
            } else {
                stats.rejected += 1;
            }
        }
    }

    /// 合并另一个统计
    pub fn merge(mut self, other: StrategyTally) -> Self {
        for (kind, stats) in other.strategies {
            let entry = self.strategies.entry(kind).or_default();
            entry.attempts += stats.attempts;
            entry.accepted += stats.accepted;
            entry.rejected += stats.rejected;
        }
        self
    }

    /// 获取某个策略的统计
    pub fn get(&self, kind: StrategyKind) -> Option<&StrategyStats> {
        self.strategies.get(&kind)
    }

    /// 按策略顺序遍历统计
    pub fn iter(&self) -> impl Iterator<Item = (&StrategyKind, &StrategyStats)> {
        self.strategies.iter()
    }
}

/// 单本书的处理状态
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum BookStatus {
    Success,
    Failed,
}

/// 单本书的处理结果
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BookReport {
    /// 输入文件
    pub file: String,
    pub status: BookStatus,
    /// 被接受的策略
    pub strategy: Option<StrategyKind>,
    /// 目录条目数
    pub item_count: usize,
    /// 写出的JSON文件
    pub output: Option<String>,
    /// 失败原因
    pub error: Option<String>,
}

/// 批处理报告
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BatchReport {
    pub total_files: usize,
    pub successful: usize,
    pub failed: usize,
    pub results: Vec<BookReport>,
    pub strategy_tally: StrategyTally,
}

impl BatchReport {
    /// 将报告写入 `dir/processing_report.json`
    pub fn save_json<P: AsRef<Path>>(&self, dir: P) -> Result<PathBuf> {
        let dir = dir.as_ref();
        fs::create_dir_all(dir)?;
        let path = dir.join(REPORT_FILE_NAME);
        fs::write(&path, serde_json::to_string_pretty(self)?)?;
        Ok(path)
    }
}

/// 并行处理多个EPUB文件
///
/// 指定 `output_dir` 时，每本成功解析的书写出 `<文件名>_toc.json`，并写出批处理报告。
/// 文件名相同的输入依次加上 `_2`、`_3` 等后缀。
pub fn process_batch(resolver: &Resolver, paths: &[PathBuf], output_dir: Option<&Path>) -> Result<BatchReport> {
    let output_names = unique_output_names(paths);
    let (results, strategy_tally) = paths
        .par_iter()
        .zip(output_names.par_iter())
        .map(|(path, output_name)| {
            let mut tally = StrategyTally::new();
            let output = output_dir.map(|dir| dir.join(output_name));
            let report = process_book(resolver, path, output.as_deref(), &mut tally);
            (vec![report], tally)
        })
        .reduce(
            || (Vec::new(), StrategyTally::new()),
            |(mut left, left_tally), (right, right_tally)| {
                left.extend(right);
                (left, left_tally.merge(right_tally))
            },
        );

    let successful = results
        .iter()
        .filter(|report| report.status == BookStatus::Success)
        .count();
    let report = BatchReport {
        total_files: results.len(),
        successful,
        failed: results.len() - successful,
        results,
        strategy_tally,
    };

    if let Some(dir) = output_dir {
        let path = report.save_json(dir)?;
        info!(path = %path.display(), "批处理报告已保存");
    }

    info!(
        total = report.total_files,
        successful = report.successful,
        failed = report.failed,
        "批处理完成"
    );
    Ok(report)
}

fn process_book(resolver: &Resolver, path: &Path, output: Option<&Path>, tally: &mut StrategyTally) -> BookReport {
    let mut report = BookReport {
        file: path.display().to_string(),
        status: BookStatus::Failed,
        strategy: None,
        item_count: 0,
        output: None,
        error: None,
    };

    let resolution = match Epub::open(path).and_then(|mut epub| resolver.resolve(&mut epub)) {
        Ok(resolution) => resolution,
        Err(err) => {
            warn!(path = %path.display(), error = %err, "目录提取失败");
            report.error = Some(err.to_string());
            return report;
        }
    };

    tally.record(&resolution.outcomes);
    report.strategy = resolution.accepted_strategy();
    report.item_count = resolution.statistics().total_items;

    if !resolution.is_resolved() {
        report.error = Some("所有提取策略均失败".to_string());
        return report;
    }

    if let Some(output) = output {
        if let Err(err) = resolution.save_json(output) {
            warn!(path = %output.display(), error = %err, "目录保存失败");
            report.error = Some(err.to_string());
            return report;
        }
        report.output = Some(output.display().to_string());
    }

    report.status = BookStatus::Success;
    report
}

/// `<文件名>_toc.json`
pub fn output_file_name(path: &Path) -> String {
    format!("{}_toc.json", file_stem(path))
}

fn file_stem(path: &Path) -> String {
    path.file_stem()
        .map(|stem| stem.to_string_lossy().to_string())
        .unwrap_or_else(|| "book".to_string())
}

/// 按输入顺序为每本书分配不重复的输出文件名
fn unique_output_names(paths: &[PathBuf]) -> Vec<String> {
    let mut used = HashSet::new();
    paths
        .iter()
        .map(|path| {
            let stem = file_stem(path);
            let mut name = output_file_name(path);
            let mut suffix = 2;
            while !used.insert(name.to_lowercase()) {
                name = format!("{}_{}_toc.json", stem, suffix);
                suffix += 1;
            }
            name
        })
        .collect()
}
