//! 书脊回退构建器
//!
//! 每个书脊条目生成一个0级条目，标题取文档中第一个h1–h6，读不到时使用 "Section N"。

use crate::epub::ArchiveAccessor;
use crate::toc::error::ParseError;
use crate::toc::html::first_heading;
use crate::toc::item::TocItem;
use scraper::Html;
use tracing::debug;

/// 按书脊顺序构建扁平目录
pub fn build_from_spine<A: ArchiveAccessor + ?Sized>(archive: &mut A) -> Result<Vec<TocItem>, ParseError> {
    let paths = archive.spine_paths();
    if paths.is_empty() {
        return Err(ParseError::EmptySpine);
    }

    let non_linear = archive.package().spine.iter().filter(|item| !item.linear).count();
    if non_linear > 0 {
        debug!(non_linear, "书脊包含linear=\"no\"的条目，按书脊顺序保留");
    }

    let items = paths
        .into_iter()
        .enumerate()
        .map(|(index, path)| {
            let heading = match archive.read_text(&path) {
                Ok(html) => first_heading(&Html::parse_document(&html)),
                Err(err) => {
                    debug!(path = %path, error = %err, "书脊文档不可读");
                    None
                }
            };
            let title = heading.unwrap_or_else(|| format!("Section {}", index + 1));
            TocItem::new(title, path, 0)
        })
        .collect();

    Ok(items)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::toc::test_support::{archive_with, manifest_and_spine};

    #[test]
    fn test_titles_from_headings() {
        let mut archive = archive_with(
            &manifest_and_spine(&["text/a.xhtml", "text/b.xhtml", "text/missing.xhtml"]),
            vec![
                ("OEBPS/text/a.xhtml", "<html><body><h2>Prologue</h2><h1>Later</h1></body></html>"),
                ("OEBPS/text/b.xhtml", "<html><body><p>No heading here</p></body></html>"),
            ],
        );

        let toc = build_from_spine(&mut archive).unwrap();
        let titles: Vec<&str> = toc.iter().map(|item| item.title.as_str()).collect();
        assert_eq!(titles, vec!["Prologue", "Section 2", "Section 3"]);
        assert_eq!(toc[2].href, "OEBPS/text/missing.xhtml");
        assert!(toc.iter().all(|item| item.level == 0));
    }

    #[test]
    fn test_non_linear_items_kept_in_order() {
        let mut archive = archive_with(
            r#"<manifest>
<item id="a" href="a.xhtml" media-type="application/xhtml+xml"/>
<item id="notes" href="notes.xhtml" media-type="application/xhtml+xml"/>
<item id="b" href="b.xhtml" media-type="application/xhtml+xml"/>
</manifest><spine><itemref idref="a"/><itemref idref="notes" linear="no"/><itemref idref="b"/></spine>"#,
            vec![("OEBPS/notes.xhtml", "<html><body><h1>Notes</h1></body></html>")],
        );

        let toc = build_from_spine(&mut archive).unwrap();
        let titles: Vec<&str> = toc.iter().map(|item| item.title.as_str()).collect();
        assert_eq!(titles, vec!["Section 1", "Notes", "Section 3"]);
    }

    #[test]
    fn test_empty_spine() {
        let mut archive = archive_with("<manifest/><spine/>", Vec::new());
        assert_eq!(build_from_spine(&mut archive), Err(ParseError::EmptySpine));
    }

    #[test]
    fn test_unknown_idref_skipped() {
        let mut archive = archive_with(
            r#"<manifest><item id="a" href="a.xhtml" media-type="application/xhtml+xml"/></manifest>
<spine><itemref idref="ghost"/><itemref idref="a"/></spine>"#,
            vec![("OEBPS/a.xhtml", "<html><body><h1>A</h1></body></html>")],
        );

        let toc = build_from_spine(&mut archive).unwrap();
        assert_eq!(toc.len(), 1);
        assert_eq!(toc[0].title, "A");
    }
}
