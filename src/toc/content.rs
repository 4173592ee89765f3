//! 内容启发式回退
//!
//! 没有任何导航结构时，从书脊文档的正文中推断章节。每个文档依次尝试各个
//! [`CueDetector`]，第一个找到线索的规则生效；所有文档的线索按层级栈组织成树。

use crate::epub::ArchiveAccessor;
use crate::toc::error::ParseError;
use crate::toc::html::{HEADING_SELECTOR, document_title, element_text, heading_rank};
use crate::toc::item::{TocItem, relevel};
use once_cell::sync::Lazy;
use regex::Regex;
use scraper::{ElementRef, Html, Selector};
use std::path::Path;
use tracing::debug;

/// 语义标记段落的最大长度(字符)
const MAX_MARKER_CHARS: usize = 100;
/// 分隔符至少由几个相同的标点组成
const MIN_SEPARATOR_RUN: usize = 3;

const BLOCK_ELEMENTS: &[&str] = &[
    "p", "div", "h1", "h2", "h3", "h4", "h5", "h6", "ul", "ol", "table", "blockquote", "section", "article",
    "pre", "figure",
];

static BLOCK_SELECTOR: Lazy<Selector> = Lazy::new(|| Selector::parse("p, div").unwrap());

static CHAPTER_MARKER: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)^(?:(?:chapter|part|book|prologue|epilogue|глава|часть)\b|第[\d一二三四五六七八九十百千零〇两]+[章部卷回])")
        .unwrap()
});

static SECTION_MARKER: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)^(?:(?:section|раздел)\b|第[\d一二三四五六七八九十百千零〇两]+节)").unwrap());

/// 从正文中检测到的一个章节线索
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Cue {
    /// 标题
    pub title: String,
    /// 推断的层级
    pub level: u32,
    /// 元素的id，用作链接片段
    pub anchor: Option<String>,
}

/// 一条独立的章节检测规则
pub trait CueDetector: Send + Sync {
    /// 规则名称，用于日志
    fn name(&self) -> &'static str;

    /// 在文档中查找线索，按文档顺序返回
    fn detect(&self, document: &Html) -> Vec<Cue>;

    /// 线索是否需要挂在代表整个文档的条目之下
    fn groups_under_document(&self) -> bool {
        false
    }
}

/// h1–h6标题，层级为级别减一
#[derive(Debug, Default, Clone, Copy)]
pub struct HeadingDetector;

impl CueDetector for HeadingDetector {
    fn name(&self) -> &'static str {
        "heading"
    }

    fn detect(&self, document: &Html) -> Vec<Cue> {
        document
            .select(&HEADING_SELECTOR)
            .filter_map(|heading| {
                let rank = heading_rank(heading.value().name())?;
                let title = element_text(heading);
                (!title.is_empty()).then(|| Cue {
                    title,
                    level: rank - 1,
                    anchor: element_id(heading),
                })
            })
            .collect()
    }
}

/// 以 "Chapter"、"Глава"、"第…章" 等词开头的短段落
#[derive(Debug, Default, Clone, Copy)]
pub struct SemanticMarkerDetector;

impl CueDetector for SemanticMarkerDetector {
    fn name(&self) -> &'static str {
        "semantic-marker"
    }

    fn detect(&self, document: &Html) -> Vec<Cue> {
        leaf_blocks(document)
            .filter_map(|block| {
                let text = element_text(block);
                if text.is_empty() || text.chars().count() > MAX_MARKER_CHARS {
                    return None;
                }

                let level = if CHAPTER_MARKER.is_match(&text) {
                    0
                } else if SECTION_MARKER.is_match(&text) {
                    1
                } else {
                    return None;
                };

                Some(Cue {
                    title: text,
                    level,
                    anchor: element_id(block),
                })
            })
            .collect()
    }
}

/// `* * *`、`---`、`~~~` 之类的场景分隔符，每个分隔符开始一个小节
#[derive(Debug, Default, Clone, Copy)]
pub struct SeparatorDetector;

impl CueDetector for SeparatorDetector {
    fn name(&self) -> &'static str {
        "separator"
    }

    fn detect(&self, document: &Html) -> Vec<Cue> {
        leaf_blocks(document)
            .filter(|block| is_separator(&element_text(*block)))
            .enumerate()
            .map(|(index, block)| Cue {
                title: format!("Section {}", index + 1),
                level: 1,
                anchor: element_id(block),
            })
            .collect()
    }

    fn groups_under_document(&self) -> bool {
        true
    }
}

/// 默认规则及其优先级
pub fn default_detectors() -> Vec<Box<dyn CueDetector>> {
    vec![
        Box::new(HeadingDetector),
        Box::new(SemanticMarkerDetector),
        Box::new(SeparatorDetector),
    ]
}

/// 从书脊文档正文中构建目录
///
/// 没有线索的文档贡献一个以 `<title>` 或文件名为标题的条目。
/// 所有书脊文档都不可读时返回 [`ParseError::NoContent`]。
pub fn build_from_content<A: ArchiveAccessor + ?Sized>(
    archive: &mut A,
    detectors: &[Box<dyn CueDetector>],
) -> Result<Vec<TocItem>, ParseError> {
    let mut flat = Vec::new();
    let mut readable_documents = 0usize;

    for path in archive.spine_paths() {
        let html = match archive.read_text(&path) {
            Ok(html) => html,
            Err(err) => {
                debug!(path = %path, error = %err, "跳过不可读的内容文档");
                continue;
            }
        };
        readable_documents += 1;

        let document = Html::parse_document(&html);
        let detection = detectors.iter().find_map(|detector| {
            let cues = detector.detect(&document);
            (!cues.is_empty()).then_some((detector, cues))
        });

        match detection {
            Some((detector, cues)) => {
                debug!(path = %path, rule = detector.name(), cues = cues.len(), "检测到章节线索");
                if detector.groups_under_document() {
                    flat.push(document_item(&document, &path));
                }
                flat.extend(cues.into_iter().map(|cue| cue_item(cue, &path)));
            }
            None => flat.push(document_item(&document, &path)),
        }
    }

    if readable_documents == 0 {
        return Err(ParseError::NoContent);
    }

    Ok(nest_by_level(flat))
}

/// 将带层级的扁平序列组织成树
///
/// 每个条目挂在前面最近的、层级更小的条目之下，跳级的条目随后被重新定级。
pub fn nest_by_level(flat: Vec<TocItem>) -> Vec<TocItem> {
    let mut roots = Vec::new();
    let mut stack: Vec<TocItem> = Vec::new();

    for item in flat {
        while let Some(top) = stack.pop() {
            if top.level < item.level {
                stack.push(top);
                break;
            }
            attach(&mut stack, &mut roots, top);
        }
        stack.push(item);
    }
    while let Some(top) = stack.pop() {
        attach(&mut stack, &mut roots, top);
    }

    relevel(&mut roots, 0);
    roots
}

fn attach(stack: &mut [TocItem], roots: &mut Vec<TocItem>, item: TocItem) {
    match stack.last_mut() {
        Some(parent) => parent.children.push(item),
        None => roots.push(item),
    }
}

fn cue_item(cue: Cue, path: &str) -> TocItem {
    let href = match cue.anchor {
        Some(anchor) => format!("{}#{}", path, anchor),
        None => path.to_string(),
    };
    TocItem::new(cue.title, href, cue.level)
}

/// 代表整个文档的0级条目
fn document_item(document: &Html, path: &str) -> TocItem {
    let title = document_title(document).unwrap_or_else(|| {
        Path::new(path)
            .file_stem()
            .map(|stem| stem.to_string_lossy().to_string())
            .unwrap_or_else(|| path.to_string())
    });
    TocItem::new(title, path, 0)
}

/// 不包含其他块级元素的p/div
fn leaf_blocks(document: &Html) -> impl Iterator<Item = ElementRef<'_>> {
    document.select(&BLOCK_SELECTOR).filter(|block| {
        !block
            .descendants()
            .skip(1)
            .filter_map(ElementRef::wrap)
            .any(|child| BLOCK_ELEMENTS.contains(&child.value().name()))
    })
}

/// 去掉空白后是否只由同一个标点重复组成
fn is_separator(text: &str) -> bool {
    let mut chars = text.chars().filter(|ch| !ch.is_whitespace());
    let Some(first) = chars.next() else {
        return false;
    };
    if !is_separator_char(first) {
        return false;
    }

    let mut run = 1;
    for ch in chars {
        if ch != first {
            return false;
        }
        run += 1;
    }
    run >= MIN_SEPARATOR_RUN
}

fn is_separator_char(ch: char) -> bool {
    ch.is_ascii_punctuation() || matches!(ch, '•' | '·' | '—' | '–' | '※' | '◆' | '◇' | '★' | '☆')
}

fn element_id(element: ElementRef) -> Option<String> {
    element
        .value()
        .attr("id")
        .map(str::trim)
        .filter(|id| !id.is_empty())
        .map(str::to_string)
}
