//! 归档访问接口
//!
//! 目录解析引擎只通过 [`ArchiveAccessor`] 读取EPUB内容：包文件的位置与解析结果、
//! 条目是否存在、条目文本。ZIP文件由 [`crate::epub::Epub`] 实现，
//! 内存中的归档由 [`MemoryArchive`] 实现。

use crate::epub::container::{CONTAINER_PATH, Container, strip_bom};
use crate::epub::error::{EpubError, Result};
use crate::epub::opf::Opf;
use std::collections::BTreeMap;

/// 对EPUB归档的只读访问
pub trait ArchiveAccessor {
    /// OPF包文件在归档中的路径
    fn package_path(&self) -> &str;

    /// 解析后的OPF包文件
    fn package(&self) -> &Opf;

    /// 归档中是否存在指定条目
    fn contains(&self, path: &str) -> bool;

    /// 读取条目的文本内容
    ///
    /// 条目不存在时返回 [`EpubError::MissingEntry`]。
    fn read_text(&mut self, path: &str) -> Result<String>;

    /// 归档中所有条目名称
    fn entry_names(&self) -> Vec<String>;

    /// 源文件大小(字节)，无法得知时为 `None`
    fn file_size(&self) -> Option<u64> {
        None
    }

    /// 将OPF中的相对href解析为归档路径
    fn resolve(&self, href: &str) -> String {
        resolve_href(self.package_path(), href)
    }

    /// NCX文档的归档路径
    ///
    /// 依次查找spine的toc属性、NCX媒体类型的清单项、任意 `.ncx` 条目。
    fn ncx_path(&self) -> Option<String> {
        self.package()
            .get_ncx_href()
            .map(|href| self.resolve(href))
            .or_else(|| {
                self.entry_names()
                    .into_iter()
                    .find(|name| name.to_lowercase().ends_with(".ncx"))
            })
    }

    /// EPUB3导航文档的归档路径
    fn nav_path(&self) -> Option<String> {
        self.package().get_nav_href().map(|href| self.resolve(href))
    }

    /// 按阅读顺序列出脊柱文档的归档路径
    fn spine_paths(&self) -> Vec<String> {
        self.package()
            .spine_items()
            .iter()
            .map(|item| self.resolve(&item.href))
            .collect()
    }
}

/// 将 `href` 相对于文档 `base` 解析为归档内的绝对路径
///
/// 片段(`#...`)原样保留；只有片段的href指向 `base` 本身；
/// 带协议的外部链接不做处理；空href保持为空。
pub fn resolve_href(base: &str, href: &str) -> String {
    let href = href.trim();
    if href.is_empty() {
        return String::new();
    }

    let (resource, fragment) = match href.split_once('#') {
        Some((resource, fragment)) => (resource, Some(fragment)),
        None => (href, None),
    };

    if is_external(resource) {
        return href.to_string();
    }

    let path = if resource.is_empty() {
        base.to_string()
    } else {
        let decoded = percent_encoding::percent_decode_str(resource).decode_utf8_lossy();
        join_path(base, &decoded)
    };

    match fragment {
        Some(fragment) => format!("{}#{}", path, fragment),
        None => path,
    }
}

/// 去掉href中的片段部分
pub fn strip_fragment(href: &str) -> &str {
    href.split_once('#').map_or(href, |(resource, _)| resource)
}

fn is_external(resource: &str) -> bool {
    resource.contains("://") || resource.starts_with("mailto:") || resource.starts_with("data:")
}

/// 以 `base` 所在目录为起点拼接路径，并规范化 `.` 与 `..`
fn join_path(base: &str, relative: &str) -> String {
    let mut parts: Vec<&str> = if relative.starts_with('/') {
        Vec::new()
    } else {
        match base.rsplit_once('/') {
            Some((dir, _)) => dir.split('/').collect(),
            None => Vec::new(),
        }
    };

    for segment in relative.split('/') {
        match segment {
            ".." => {
                parts.pop();
            }
            "." | "" => {}
            segment => parts.push(segment),
        }
    }

    parts.join("/")
}

/// 读取container.xml并解析其指向的OPF包文件
pub(crate) fn load_package<F>(mut read: F) -> Result<(String, Opf)>
where
    F: FnMut(&str) -> Result<String>,
{
    let container = Container::parse_xml(&read(CONTAINER_PATH)?)?;
    let opf_path = container
        .get_opf_path()
        .ok_or_else(|| EpubError::ContainerParseError("container.xml中没有找到有效的rootfile".to_string()))?;

    let opf_content = read(&opf_path)?;
    let opf = Opf::parse_xml(&opf_content).map_err(|e| match e {
        EpubError::XmlError(xml_err) => EpubError::OpfParseError(format!("XML解析错误: {}", xml_err)),
        other => other,
    })?;

    Ok((opf_path, opf))
}

/// 完全位于内存中的EPUB归档
#[derive(Debug, Clone)]
pub struct MemoryArchive {
    entries: BTreeMap<String, String>,
    package_path: String,
    package: Opf,
}

impl MemoryArchive {
    /// 从 (路径, 文本内容) 条目创建归档
    ///
    /// 条目中必须包含 `META-INF/container.xml` 及其指向的OPF文件。
    pub fn new<I, K, V>(entries: I) -> Result<Self>
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        let entries: BTreeMap<String, String> = entries
            .into_iter()
            .map(|(path, content)| (path.into(), content.into()))
            .collect();

        let (package_path, package) = load_package(|path| {
            entries
                .get(path)
                .map(|content| strip_bom(content).to_string())
                .ok_or_else(|| EpubError::MissingEntry(path.to_string()))
        })?;

        Ok(Self {
            entries,
            package_path,
            package,
        })
    }
}

impl ArchiveAccessor for MemoryArchive {
    fn package_path(&self) -> &str {
        &self.package_path
    }

    fn package(&self) -> &Opf {
        &self.package
    }

    fn contains(&self, path: &str) -> bool {
        self.entries.contains_key(path)
    }

    fn read_text(&mut self, path: &str) -> Result<String> {
        self.entries
            .get(path)
            .map(|content| strip_bom(content).to_string())
            .ok_or_else(|| EpubError::MissingEntry(path.to_string()))
    }

    fn entry_names(&self) -> Vec<String> {
        self.entries.keys().cloned().collect()
    }
}
