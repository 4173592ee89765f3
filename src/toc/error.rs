use thiserror::Error;

/// 单个目录策略无法从文档中得到结构时的错误
///
/// 这类错误只会记录在 [`crate::toc::StrategyOutcome`] 中，解析链随后尝试下一个策略。
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ParseError {
    #[error("malformed-ncx: NCX文档结构错误: {0}")]
    MalformedNcx(String),

    #[error("missing-nav-section: 导航文档中没有toc导航")]
    MissingNavSection,

    #[error("missing-document: 找不到{0}")]
    MissingDocument(String),

    #[error("unreadable-document: 无法读取 {path}: {reason}")]
    UnreadableDocument { path: String, reason: String },

    #[error("missing-landmarks: guide和landmarks中都没有条目")]
    MissingLandmarks,

    #[error("empty-spine: 书脊中没有可用的条目")]
    EmptySpine,

    #[error("no-content: 没有可读取的内容文档")]
    NoContent,
}

/// 质量校验拒绝候选目录的原因
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationRejection {
    #[error("empty: 目录为空")]
    Empty,

    #[error("too-many-items: 目录条目过多({count} > {limit})")]
    TooManyItems { count: usize, limit: usize },

    #[error("no-resolvable-href: 没有任何条目指向归档中存在的资源")]
    NoResolvableHref,
}

/// 一次策略尝试失败的原因
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum StrategyFailure {
    #[error(transparent)]
    Parse(#[from] ParseError),

    #[error(transparent)]
    Rejected(#[from] ValidationRejection),
}

impl ParseError {
    /// 将读取文档时的归档错误转换为策略错误
    pub(crate) fn from_read(path: &str, err: crate::epub::EpubError) -> Self {
        match err {
            crate::epub::EpubError::MissingEntry(entry) => ParseError::MissingDocument(entry),
            other => ParseError::UnreadableDocument {
                path: path.to_string(),
                reason: other.to_string(),
            },
        }
    }
}
