use crate::epub::MemoryArchive;
use crate::epub::container::CONTAINER_PATH;

const CONTAINER_XML: &str =
    r#"<container><rootfiles><rootfile full-path="OEBPS/content.opf" media-type="application/oebps-package+xml"/></rootfiles></container>"#;

/// 以 `OEBPS/content.opf` 为包文件构建内存归档，`opf_body` 为 `<metadata/>` 之后的内容
pub(crate) fn archive_with(opf_body: &str, extra: Vec<(&str, &str)>) -> MemoryArchive {
    let opf = format!(r#"<package version="3.0"><metadata/>{}</package>"#, opf_body);
    let mut entries = vec![(CONTAINER_PATH.to_string(), CONTAINER_XML.to_string())];
    entries.push(("OEBPS/content.opf".to_string(), opf));
    entries.extend(extra.into_iter().map(|(path, content)| (path.to_string(), content.to_string())));
    MemoryArchive::new(entries).unwrap()
}

/// 生成XHTML清单项与对应的spine条目
pub(crate) fn manifest_and_spine(hrefs: &[&str]) -> String {
    let items: String = hrefs
        .iter()
        .enumerate()
        .map(|(index, href)| format!(r#"<item id="c{}" href="{}" media-type="application/xhtml+xml"/>"#, index, href))
        .collect();
    let itemrefs: String = (0..hrefs.len()).map(|index| format!(r#"<itemref idref="c{}"/>"#, index)).collect();
    format!("<manifest>{}</manifest><spine>{}</spine>", items, itemrefs)
}
