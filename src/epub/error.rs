use std::io;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, EpubError>;

/// 归档层面的错误类型
///
/// 这些错误意味着无法从EPUB中读取任何可用内容，会直接返回给调用者。
/// 单个目录策略内部的问题不在此列，见 [`crate::toc::ParseError`]。
#[derive(Error, Debug)]
pub enum EpubError {
    #[error("IO错误: {0}")]
    Io(#[from] io::Error),

    #[error("Zip文件错误: {0}")]
    Zip(#[from] zip::result::ZipError),

    #[error("文件不存在: {0}")]
    NotFound(String),

    #[error("文件不是有效的EPUB格式: {0}")]
    InvalidEpub(String),

    #[error("无效的mimetype: {expected}, 找到: {found}")]
    InvalidMimetype { expected: String, found: String },

    #[error("XML解析错误: {0}")]
    XmlError(#[from] quick_xml::Error),

    #[error("container.xml解析错误: {0}")]
    ContainerParseError(String),

    #[error("OPF文件解析错误: {0}")]
    OpfParseError(String),

    #[error("归档中缺少条目: {0}")]
    MissingEntry(String),

    #[error("没有可读取的内容(no content readable): 书脊为空且没有可读取的内容文档")]
    NoReadableContent,

    #[error("配置错误: {0}")]
    ConfigError(String),

    #[error("JSON序列化错误: {0}")]
    Json(#[from] serde_json::Error),
}
