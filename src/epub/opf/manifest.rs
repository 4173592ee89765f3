//! 清单模块
//!
//! 提供EPUB包中文件清单的结构定义。

/// NCX文档的媒体类型
pub const NCX_MEDIA_TYPE: &str = "application/x-dtbncx+xml";

/// 清单项信息
#[derive(Debug, Clone, PartialEq)]
pub struct ManifestItem {
    /// 项目ID
    pub id: String,
    /// 文件路径(相对于OPF文件)
    pub href: String,
    /// 媒体类型
    pub media_type: String,
    /// 属性(如nav、cover-image等)
    pub properties: Option<String>,
}

impl ManifestItem {
    /// 创建新的清单项
    pub fn new(id: &str, href: &str, media_type: &str) -> Self {
        Self {
            id: id.to_string(),
            href: href.to_string(),
            media_type: media_type.to_string(),
            properties: None,
        }
    }

    /// 设置属性
    pub fn with_properties(mut self, properties: &str) -> Self {
        self.properties = Some(properties.to_string());
        self
    }

    /// 检查是否包含指定属性
    pub fn has_property(&self, property: &str) -> bool {
        self.properties
            .as_deref()
            .is_some_and(|properties| properties.split_whitespace().any(|p| p == property))
    }

    /// 检查是否为EPUB3导航文档
    pub fn is_nav(&self) -> bool {
        self.has_property("nav")
    }

    /// 检查是否为NCX导航文件
    pub fn is_ncx(&self) -> bool {
        self.media_type == NCX_MEDIA_TYPE
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_manifest_item_properties() {
        let nav = ManifestItem::new("nav", "nav.xhtml", "application/xhtml+xml").with_properties("scripted nav");
        assert!(nav.is_nav());
        assert!(!nav.has_property("cover-image"));

        let ncx = ManifestItem::new("ncx", "toc.ncx", NCX_MEDIA_TYPE);
        assert!(ncx.is_ncx());
        assert!(!ncx.is_nav());
    }
}
