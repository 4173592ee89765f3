pub mod batch;
pub mod content;
pub mod error;
pub mod html;
pub mod item;
pub mod landmarks;
pub mod nav;
pub mod ncx;
pub mod normalize;
pub mod render;
pub mod resolver;
pub mod spine;
pub mod strategy;
pub mod validate;

#[cfg(test)]
mod test_support;

// 重新导出错误
pub use error::{ParseError, StrategyFailure, ValidationRejection};

// 重新导出目录模型
pub use item::{TocItem, count_items, flatten, is_well_leveled, max_level, relevel};

// 重新导出策略链
pub use content::{Cue, CueDetector, HeadingDetector, SemanticMarkerDetector, SeparatorDetector, default_detectors};
pub use landmarks::Landmark;
pub use normalize::Normalizer;
pub use resolver::{ChainState, ExtractionMetadata, Resolution, Resolver, StrategyOutcome};
pub use strategy::{Candidate, StrategyKind};
pub use validate::validate;

// 重新导出显示和批处理
pub use batch::{BatchReport, BookReport, BookStatus, StrategyStats, StrategyTally, process_batch};
pub use render::{TocRenderer, TocStatistics, TocStyle};
