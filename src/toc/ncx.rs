//! NCX解析器模块
//!
//! 将EPUB2的NCX(Navigation Control file for XML)导航地图转换为目录树。
//! 导航点按文档顺序输出，不按playOrder重排。

use crate::epub::container::strip_bom;
use crate::epub::resolve_href;
use crate::toc::error::ParseError;
use crate::toc::item::TocItem;
use quick_xml::events::{BytesStart, Event};
use quick_xml::reader::Reader;

/// 解析NCX文档
///
/// # 参数
/// * `xml_content` - NCX文件内容
/// * `ncx_path` - NCX在归档中的路径，`content/@src` 相对于它解析
///
/// # 返回值
/// * `Result<Vec<TocItem>, ParseError>` - 按文档顺序的目录树；空的navMap返回空目录，
///   缺少navMap或XML结构错误时返回 [`ParseError::MalformedNcx`]
pub fn parse_ncx(xml_content: &str, ncx_path: &str) -> Result<Vec<TocItem>, ParseError> {
    let mut reader = Reader::from_str(strip_bom(xml_content));
    reader.config_mut().trim_text(true);
    reader.config_mut().expand_empty_elements = true;

    let mut buf = Vec::new();
    let mut roots = Vec::new();
    // 尚未闭合的导航点，栈顶为当前导航点
    let mut nav_point_stack: Vec<TocItem> = Vec::new();
    let mut text_content = String::new();

    let mut open_elements = 0usize;
    let mut saw_root = false;
    let mut saw_nav_map = false;
    let mut in_nav_map = false;
    let mut in_nav_label = false;

    loop {
        let event = reader
            .read_event_into(&mut buf)
            .map_err(|err| ParseError::MalformedNcx(format!("XML解析错误: {}", err)))?;

        match event {
            Event::Start(ref e) => {
                open_elements += 1;
                saw_root = true;

                match e.local_name().as_ref() {
                    b"navMap" => {
                        saw_nav_map = true;
                        in_nav_map = true;
                    }
                    b"navPoint" if in_nav_map => {
                        let level = nav_point_stack.len() as u32;
                        nav_point_stack.push(TocItem::new("", "", level));
                    }
                    b"navLabel" if in_nav_map => in_nav_label = true,
                    b"content" if in_nav_map => {
                        if let Some(current) = nav_point_stack.last_mut() {
                            if current.href.is_empty() {
                                current.href = resolve_href(ncx_path, &content_src(e)?);
                            }
                        }
                    }
                    _ => {}
                }
                text_content.clear();
            }
            Event::End(ref e) => {
                open_elements = open_elements.saturating_sub(1);

                match e.local_name().as_ref() {
                    b"navMap" => in_nav_map = false,
                    b"navLabel" if in_nav_map => in_nav_label = false,
                    b"text" if in_nav_label => {
                        // 多语言标签只取第一个text
                        if let Some(current) = nav_point_stack.last_mut() {
                            if current.title.is_empty() {
                                current.title = text_content.trim().to_string();
                            }
                        }
                    }
                    b"navPoint" if in_nav_map => {
                        if let Some(nav_point) = nav_point_stack.pop() {
                            match nav_point_stack.last_mut() {
                                Some(parent) => parent.children.push(nav_point),
                                None => roots.push(nav_point),
                            }
                        }
                    }
                    _ => {}
                }
                text_content.clear();
            }
            Event::Text(e) => match e.unescape() {
                Ok(text) => text_content.push_str(&text),
                Err(_) => text_content.push_str(&String::from_utf8_lossy(&e)),
            },
            Event::CData(e) => text_content.push_str(&String::from_utf8_lossy(&e)),
            Event::Eof => break,
            _ => {}
        }
        buf.clear();
    }

    if !saw_root {
        return Err(ParseError::MalformedNcx("文档没有根元素".to_string()));
    }
    if open_elements > 0 || !nav_point_stack.is_empty() {
        return Err(ParseError::MalformedNcx("存在未闭合的元素".to_string()));
    }
    if !saw_nav_map {
        return Err(ParseError::MalformedNcx("缺少navMap元素".to_string()));
    }

    Ok(roots)
}

/// 解析content元素的src属性
fn content_src(e: &BytesStart) -> Result<String, ParseError> {
    for attr_result in e.attributes() {
        let attr = attr_result.map_err(|err| ParseError::MalformedNcx(format!("属性错误: {}", err)))?;
        if attr.key.local_name().as_ref() == b"src" {
            return Ok(String::from_utf8_lossy(&attr.value).to_string());
        }
    }
    Ok(String::new())
}

#[cfg(test)]
mod tests {
    use super::*;

    const NCX_PATH: &str = "OEBPS/toc.ncx";

    #[test]
    fn test_parse_nested_nav_points() {
        let ncx = r#"<?xml version="1.0" encoding="UTF-8"?>
<ncx xmlns="http://www.daisy.org/z3986/2005/ncx/" version="2005-1">
  <head><meta name="dtb:uid" content="urn:uuid:1"/></head>
  <docTitle><text>Book</text></docTitle>
  <navMap>
    <navPoint id="np1" playOrder="1">
      <navLabel><text>Chapter 1</text></navLabel>
      <content src="text/ch1.xhtml"/>
      <navPoint id="np2" playOrder="2">
        <navLabel><text>Section 1.1</text></navLabel>
        <content src="text/ch1.xhtml#s1"/>
      </navPoint>
    </navPoint>
  </navMap>
</ncx>"#;

        let toc = parse_ncx(ncx, NCX_PATH).unwrap();
        assert_eq!(toc.len(), 1);
        assert_eq!(toc[0].title, "Chapter 1");
        assert_eq!(toc[0].href, "OEBPS/text/ch1.xhtml");
        assert_eq!(toc[0].level, 0);
        assert_eq!(toc[0].children.len(), 1);
        assert_eq!(toc[0].children[0].title, "Section 1.1");
        assert_eq!(toc[0].children[0].href, "OEBPS/text/ch1.xhtml#s1");
        assert_eq!(toc[0].children[0].level, 1);
    }

    #[test]
    fn test_document_order_ignores_play_order() {
        let ncx = r#"<ncx><navMap>
<navPoint playOrder="2"><navLabel><text>First</text></navLabel><content src="a.xhtml"/></navPoint>
<navPoint playOrder="1"><navLabel><text>Second</text></navLabel><content src="b.xhtml"/></navPoint>
</navMap></ncx>"#;

        let toc = parse_ncx(ncx, NCX_PATH).unwrap();
        let titles: Vec<&str> = toc.iter().map(|item| item.title.as_str()).collect();
        assert_eq!(titles, vec!["First", "Second"]);
    }

    #[test]
    fn test_escaped_text_and_missing_label() {
        let ncx = r#"<ncx><navMap>
<navPoint><navLabel><text>Tom &amp; Jerry</text></navLabel><content src="a.xhtml"/></navPoint>
<navPoint><content src="b.xhtml"/></navPoint>
</navMap></ncx>"#;

        let toc = parse_ncx(ncx, NCX_PATH).unwrap();
        assert_eq!(toc[0].title, "Tom & Jerry");
        assert_eq!(toc[1].title, "");
    }

    #[test]
    fn test_empty_nav_map() {
        let toc = parse_ncx("<ncx><navMap/></ncx>", NCX_PATH).unwrap();
        assert!(toc.is_empty());
    }

    #[test]
    fn test_missing_nav_map() {
        let result = parse_ncx("<ncx><head/></ncx>", NCX_PATH);
        assert!(matches!(result, Err(ParseError::MalformedNcx(_))));
    }

    #[test]
    fn test_malformed_documents() {
        let unclosed = "<ncx><navMap><navPoint><navLabel><text>A</text></navLabel>";
        assert!(matches!(parse_ncx(unclosed, NCX_PATH), Err(ParseError::MalformedNcx(_))));

        let mismatched = "<ncx><navMap></navPoint></ncx>";
        assert!(matches!(parse_ncx(mismatched, NCX_PATH), Err(ParseError::MalformedNcx(_))));

        assert!(matches!(parse_ncx("", NCX_PATH), Err(ParseError::MalformedNcx(_))));
    }
}
