//! EPUB3导航文档解析器
//!
//! 从 `epub:type="toc"`(或 `role="doc-toc"`)的 `<nav>` 中读取嵌套列表。

use crate::epub::resolve_href;
use crate::toc::error::ParseError;
use crate::toc::html::{NAV_SELECTOR, collapse_whitespace, element_text, has_semantic};
use crate::toc::item::TocItem;
use scraper::{ElementRef, Html, node::Node};

/// 解析导航文档中的toc导航
///
/// # 参数
/// * `html` - 导航文档内容
/// * `nav_path` - 导航文档在归档中的路径，链接相对于它解析
///
/// # 返回值
/// * `Result<Vec<TocItem>, ParseError>` - 目录树；只有landmarks或page-list而没有toc导航时
///   返回 [`ParseError::MissingNavSection`]
pub fn parse_nav(html: &str, nav_path: &str) -> Result<Vec<TocItem>, ParseError> {
    let document = Html::parse_document(html);
    let nav = find_nav(&document, "toc", "doc-toc").ok_or(ParseError::MissingNavSection)?;

    Ok(first_list(nav)
        .map(|list| parse_list(list, nav_path, 0))
        .unwrap_or_default())
}

/// 查找带有指定语义的第一个 `<nav>`
pub(crate) fn find_nav<'a>(document: &'a Html, epub_token: &str, role: &str) -> Option<ElementRef<'a>> {
    document
        .select(&NAV_SELECTOR)
        .find(|nav| has_semantic(*nav, epub_token, role))
}

/// 元素内第一个 `ol`/`ul`
pub(crate) fn first_list(element: ElementRef) -> Option<ElementRef> {
    element
        .descendants()
        .filter_map(ElementRef::wrap)
        .find(|child| is_list(*child))
}

/// 将列表中的每个 `li` 转换为目录节点
pub(crate) fn parse_list(list: ElementRef, nav_path: &str, level: u32) -> Vec<TocItem> {
    list.children()
        .filter_map(ElementRef::wrap)
        .filter(|child| child.value().name() == "li")
        .map(|li| parse_list_item(li, nav_path, level))
        .collect()
}

fn parse_list_item(li: ElementRef, nav_path: &str, level: u32) -> TocItem {
    let (title, href) = match find_label(li) {
        Some(label) => {
            let href = label
                .value()
                .attr("href")
                .map(|href| resolve_href(nav_path, href))
                .unwrap_or_default();
            (element_text(label), href)
        }
        None => (own_text(li), String::new()),
    };

    let mut item = TocItem::new(title, href, level);
    if let Some(nested) = li.children().filter_map(ElementRef::wrap).find(|child| is_list(*child)) {
        item.children = parse_list(nested, nav_path, level + 1);
    }
    item
}

/// 查找条目标签，不进入嵌套列表
///
/// 带href的 `a` 优先；没有链接时使用第一个 `a` 或用作分组标题的 `span`。
fn find_label(li: ElementRef) -> Option<ElementRef> {
    find_own_element(li, &|element| element.value().name() == "a" && element.value().attr("href").is_some())
        .or_else(|| find_own_element(li, &|element| matches!(element.value().name(), "a" | "span")))
}

/// 前序查找第一个满足条件的后代元素，跳过嵌套列表
fn find_own_element<'a>(element: ElementRef<'a>, matches: &dyn Fn(ElementRef<'a>) -> bool) -> Option<ElementRef<'a>> {
    for child in element.children().filter_map(ElementRef::wrap) {
        if is_list(child) {
            continue;
        }
        if matches(child) {
            return Some(child);
        }
        if let Some(found) = find_own_element(child, matches) {
            return Some(found);
        }
    }
    None
}

/// 元素自身的文本节点，不含子元素
fn own_text(element: ElementRef) -> String {
    let text: String = element
        .children()
        .filter_map(|node| match node.value() {
            Node::Text(text) => Some(&**text),
            _ => None,
        })
        .collect();
    collapse_whitespace(&text)
}

fn is_list(element: ElementRef) -> bool {
    matches!(element.value().name(), "ol" | "ul")
}
