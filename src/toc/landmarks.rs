//! 地标解析器
//!
//! 来源依次为OPF的 `<guide>` 和导航文档中的landmarks导航，输出扁平的0级条目。

use crate::epub::{ArchiveAccessor, GuideReference, resolve_href};
use crate::toc::error::ParseError;
use crate::toc::html::{collapse_whitespace, element_text, epub_type};
use crate::toc::item::TocItem;
use crate::toc::nav::{find_nav, first_list};
use scraper::{ElementRef, Html};

/// 一个已解析路径的地标条目
#[derive(Debug, Clone, PartialEq)]
pub struct Landmark {
    /// 地标类型(如cover、toc、bodymatter)
    pub ref_type: String,
    /// 显示标题
    pub title: Option<String>,
    /// 归档内的路径
    pub href: String,
}

impl Landmark {
    fn into_item(self) -> TocItem {
        let title = self
            .title
            .map(|title| collapse_whitespace(&title))
            .filter(|title| !title.is_empty())
            .unwrap_or_else(|| title_for_type(&self.ref_type));
        TocItem::new(title, self.href, 0)
    }
}

/// 从guide或导航文档的landmarks中构建目录
///
/// guide有条目时只使用guide。两处都没有条目时返回 [`ParseError::MissingLandmarks`]。
pub fn parse_landmarks<A: ArchiveAccessor + ?Sized>(archive: &mut A) -> Result<Vec<TocItem>, ParseError> {
    let mut landmarks = guide_landmarks(&*archive, &archive.package().guide);

    if landmarks.is_empty() {
        if let Some(nav_path) = archive.nav_path() {
            // 导航文档不可读时按没有landmarks处理
            if let Ok(html) = archive.read_text(&nav_path) {
                landmarks = nav_landmarks(&html, &nav_path);
            }
        }
    }

    if landmarks.is_empty() {
        return Err(ParseError::MissingLandmarks);
    }

    Ok(landmarks.into_iter().map(Landmark::into_item).collect())
}

fn guide_landmarks<A: ArchiveAccessor + ?Sized>(archive: &A, guide: &[GuideReference]) -> Vec<Landmark> {
    guide
        .iter()
        .map(|reference| Landmark {
            ref_type: reference.ref_type.clone(),
            title: reference.title.clone(),
            href: archive.resolve(&reference.href),
        })
        .collect()
}

/// 读取导航文档中 `epub:type="landmarks"` 的条目
pub fn nav_landmarks(html: &str, nav_path: &str) -> Vec<Landmark> {
    let document = Html::parse_document(html);
    let Some(list) = find_nav(&document, "landmarks", "doc-landmarks").and_then(first_list) else {
        return Vec::new();
    };

    list.descendants()
        .filter_map(ElementRef::wrap)
        .filter(|element| element.value().name() == "a")
        .filter_map(|anchor| {
            let href = anchor.value().attr("href")?;
            Some(Landmark {
                ref_type: epub_type(anchor).unwrap_or_default().to_string(),
                title: Some(element_text(anchor)),
                href: resolve_href(nav_path, href),
            })
        })
        .collect()
}

/// 根据地标类型生成标题
fn title_for_type(ref_type: &str) -> String {
    let title = match ref_type {
        "cover" => "Cover",
        "title-page" | "titlepage" => "Title Page",
        "toc" => "Table of Contents",
        "bodymatter" | "text" | "start" => "Start",
        "preface" => "Preface",
        "foreword" => "Foreword",
        "copyright-page" => "Copyright",
        "acknowledgements" => "Acknowledgements",
        "dedication" => "Dedication",
        "epigraph" => "Epigraph",
        "bibliography" => "Bibliography",
        "glossary" => "Glossary",
        "index" => "Index",
        "loi" => "List of Illustrations",
        "lot" => "List of Tables",
        "colophon" => "Colophon",
        "" => "Landmark",
        other => return capitalize(&other.replace(['-', '_'], " ")),
    };
    title.to_string()
}

fn capitalize(text: &str) -> String {
    let mut chars = text.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}
