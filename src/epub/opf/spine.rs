//! 脊柱与导引模块
//!
//! 提供EPUB包中阅读顺序(spine)和EPUB2导引(guide)的结构定义。

/// 脊柱项信息(阅读顺序)
#[derive(Debug, Clone, PartialEq)]
pub struct SpineItem {
    /// 引用的清单项ID
    pub idref: String,
    /// 是否线性阅读
    pub linear: bool,
}

impl SpineItem {
    /// 创建新的线性脊柱项
    pub fn new(idref: &str) -> Self {
        Self {
            idref: idref.to_string(),
            linear: true,
        }
    }
}

/// EPUB2 `<guide>` 中的一个 `<reference>`
#[derive(Debug, Clone, PartialEq)]
pub struct GuideReference {
    /// 引用类型(如cover、toc、text)
    pub ref_type: String,
    /// 显示标题，可能缺失
    pub title: Option<String>,
    /// 目标路径(相对于OPF文件)
    pub href: String,
}
