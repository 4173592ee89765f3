//! (X)HTML内容文档的辅助函数

use once_cell::sync::Lazy;
use scraper::{ElementRef, Html, Selector};

pub(crate) static NAV_SELECTOR: Lazy<Selector> = Lazy::new(|| Selector::parse("nav").unwrap());
pub(crate) static HEADING_SELECTOR: Lazy<Selector> =
    Lazy::new(|| Selector::parse("h1, h2, h3, h4, h5, h6").unwrap());
pub(crate) static TITLE_SELECTOR: Lazy<Selector> = Lazy::new(|| Selector::parse("title").unwrap());

/// 合并连续空白并去掉首尾空白
pub fn collapse_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// 元素的纯文本(空白已合并)
pub(crate) fn element_text(element: ElementRef) -> String {
    collapse_whitespace(&element.text().collect::<String>())
}

/// 读取 `epub:type` 属性
///
/// 部分文档使用其他命名空间前缀，因此也接受任意 `*:type` 属性。
pub(crate) fn epub_type<'a>(element: ElementRef<'a>) -> Option<&'a str> {
    element
        .value()
        .attrs()
        .find(|(name, _)| *name == "epub:type" || name.ends_with(":type"))
        .map(|(_, value)| value)
}

/// `epub:type` 或 `role` 中是否包含指定语义
pub(crate) fn has_semantic(element: ElementRef, epub_token: &str, role: &str) -> bool {
    let typed = epub_type(element).is_some_and(|value| value.split_whitespace().any(|token| token == epub_token));
    let with_role = element
        .value()
        .attr("role")
        .is_some_and(|value| value.split_whitespace().any(|token| token == role));
    typed || with_role
}

/// 文档 `<title>` 的文本，为空时返回 `None`
pub(crate) fn document_title(document: &Html) -> Option<String> {
    document
        .select(&TITLE_SELECTOR)
        .map(element_text)
        .find(|title| !title.is_empty())
}

/// 文档中第一个非空的 h1–h6 标题文本
pub(crate) fn first_heading(document: &Html) -> Option<String> {
    document
        .select(&HEADING_SELECTOR)
        .map(element_text)
        .find(|text| !text.is_empty())
}

/// 标题元素的级别(h1为1)
pub(crate) fn heading_rank(name: &str) -> Option<u32> {
    match name {
        "h1" => Some(1),
        "h2" => Some(2),
        "h3" => Some(3),
        "h4" => Some(4),
        "h5" => Some(5),
        "h6" => Some(6),
        _ => None,
    }
}
