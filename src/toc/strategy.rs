//! 目录提取策略
//!
//! 策略集合是固定的，按 [`StrategyKind::DEFAULT_ORDER`] 或调用者给出的顺序依次尝试。

use crate::epub::{ArchiveAccessor, EpubError};
use crate::toc::content::{CueDetector, build_from_content};
use crate::toc::error::ParseError;
use crate::toc::item::TocItem;
use crate::toc::landmarks::parse_landmarks;
use crate::toc::nav::parse_nav;
use crate::toc::ncx::parse_ncx;
use crate::toc::spine::build_from_spine;
use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter, Result as FmtResult};
use std::str::FromStr;

/// 目录提取策略
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StrategyKind {
    /// EPUB2 NCX导航地图
    Ncx,
    /// EPUB3导航文档
    Nav,
    /// OPF guide或导航文档的landmarks
    Landmarks,
    /// 书脊顺序
    Spine,
    /// 正文内容启发式
    Content,
}

/// 策略解析出的候选目录
#[derive(Debug, Clone, PartialEq)]
pub struct Candidate {
    /// 尚未规范化的目录
    pub items: Vec<TocItem>,
    /// 候选目录所来自的文档
    pub source: String,
}

impl StrategyKind {
    /// 默认的尝试顺序
    pub const DEFAULT_ORDER: [StrategyKind; 5] = [
        StrategyKind::Ncx,
        StrategyKind::Nav,
        StrategyKind::Landmarks,
        StrategyKind::Spine,
        StrategyKind::Content,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            StrategyKind::Ncx => "ncx",
            StrategyKind::Nav => "nav",
            StrategyKind::Landmarks => "landmarks",
            StrategyKind::Spine => "spine",
            StrategyKind::Content => "content",
        }
    }

    /// 运行该策略的解析器，得到候选目录
    pub fn attempt<A: ArchiveAccessor + ?Sized>(
        self,
        archive: &mut A,
        detectors: &[Box<dyn CueDetector>],
    ) -> Result<Candidate, ParseError> {
        match self {
            StrategyKind::Ncx => {
                let path = archive
                    .ncx_path()
                    .ok_or_else(|| ParseError::MissingDocument("NCX文档".to_string()))?;
                let xml = archive.read_text(&path).map_err(|err| ParseError::from_read(&path, err))?;
                let items = parse_ncx(&xml, &path)?;
                Ok(Candidate { items, source: path })
            }
            StrategyKind::Nav => {
                let path = archive
                    .nav_path()
                    .ok_or_else(|| ParseError::MissingDocument("导航文档".to_string()))?;
                let html = archive.read_text(&path).map_err(|err| ParseError::from_read(&path, err))?;
                let items = parse_nav(&html, &path)?;
                Ok(Candidate { items, source: path })
            }
            StrategyKind::Landmarks => Ok(Candidate {
                items: parse_landmarks(archive)?,
                source: archive.package_path().to_string(),
            }),
            StrategyKind::Spine => Ok(Candidate {
                items: build_from_spine(archive)?,
                source: archive.package_path().to_string(),
            }),
            StrategyKind::Content => Ok(Candidate {
                items: build_from_content(archive, detectors)?,
                source: archive.package_path().to_string(),
            }),
        }
    }
}

impl Display for StrategyKind {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        f.write_str(self.as_str())
    }
}

impl FromStr for StrategyKind {
    type Err = EpubError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "ncx" => Ok(StrategyKind::Ncx),
            "nav" => Ok(StrategyKind::Nav),
            "landmarks" | "guide" => Ok(StrategyKind::Landmarks),
            "spine" | "opf" => Ok(StrategyKind::Spine),
            "content" => Ok(StrategyKind::Content),
            other => Err(EpubError::ConfigError(format!(
                "未知的提取策略: {} (可选: ncx, nav, landmarks, spine, content)",
                other
            ))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::toc::content::default_detectors;
    use crate::toc::test_support::archive_with;

    #[test]
    fn test_parse_strategy_names() {
        assert_eq!("NCX".parse::<StrategyKind>().unwrap(), StrategyKind::Ncx);
        assert_eq!(" spine ".parse::<StrategyKind>().unwrap(), StrategyKind::Spine);
        assert_eq!("guide".parse::<StrategyKind>().unwrap(), StrategyKind::Landmarks);
        assert!(matches!("calibre".parse::<StrategyKind>(), Err(EpubError::ConfigError(_))));
    }

    #[test]
    fn test_display_and_serde_names_agree() {
        for kind in StrategyKind::DEFAULT_ORDER {
            let json = serde_json::to_string(&kind).unwrap();
            assert_eq!(json, format!("\"{}\"", kind));
        }
    }

    #[test]
    fn test_missing_documents() {
        let mut archive = archive_with("<manifest/><spine/>", Vec::new());
        let detectors = default_detectors();

        assert!(matches!(
            StrategyKind::Ncx.attempt(&mut archive, &detectors),
            Err(ParseError::MissingDocument(_))
        ));
        assert!(matches!(
            StrategyKind::Nav.attempt(&mut archive, &detectors),
            Err(ParseError::MissingDocument(_))
        ));
    }

    #[test]
    fn test_ncx_declared_but_absent() {
        let mut archive = archive_with(
            r#"<manifest><item id="ncx" href="toc.ncx" media-type="application/x-dtbncx+xml"/></manifest><spine toc="ncx"/>"#,
            Vec::new(),
        );

        let result = StrategyKind::Ncx.attempt(&mut archive, &default_detectors());
        assert_eq!(result, Err(ParseError::MissingDocument("OEBPS/toc.ncx".to_string())));
    }
}
