//! OPF解析器模块
//!
//! 提供OPF(Open Packaging Format)文件的XML解析功能。

use crate::epub::container::strip_bom;
use crate::epub::error::{EpubError, Result};
use crate::epub::opf::{
    manifest::ManifestItem,
    metadata::Metadata,
    spine::{GuideReference, SpineItem},
};
use quick_xml::events::{BytesStart, Event};
use quick_xml::reader::Reader;
use std::collections::HashMap;

/// OPF文件解析结果
#[derive(Debug, Clone, Default)]
pub struct Opf {
    /// EPUB版本
    pub version: String,
    /// 元数据
    pub metadata: Metadata,
    /// 清单项(文件列表)，保持文档顺序
    pub manifest: Vec<ManifestItem>,
    /// 脊柱(阅读顺序)
    pub spine: Vec<SpineItem>,
    /// 脊柱的toc属性(NCX清单项ID)
    pub spine_toc: Option<String>,
    /// EPUB2导引
    pub guide: Vec<GuideReference>,
}

#[derive(Debug, Clone, Copy, PartialEq)]
enum Section {
    None,
    Metadata,
    Manifest,
    Spine,
    Guide,
}

/// 等待文本内容的meta标签
struct PendingMeta {
    property: String,
    refines: Option<String>,
    scheme: Option<String>,
}

impl Opf {
    /// 解析OPF文件内容
    pub fn parse_xml(xml_content: &str) -> Result<Opf> {
        let mut reader = Reader::from_str(strip_bom(xml_content));
        reader.config_mut().trim_text(true);
        reader.config_mut().expand_empty_elements = true;

        let mut opf = Opf::default();
        let mut buf = Vec::new();
        let mut section = Section::None;
        let mut text_content = String::new();
        let mut dc_attributes = HashMap::new();
        let mut pending_meta: Option<PendingMeta> = None;

        loop {
            match reader.read_event_into(&mut buf)? {
                Event::Start(ref e) => {
                    let local_name = e.local_name();
                    match (section, local_name.as_ref()) {
                        (_, b"package") => {
                            opf.version = attribute(e, b"version")?.unwrap_or_default();
                        }
                        (_, b"metadata") => section = Section::Metadata,
                        (_, b"manifest") => section = Section::Manifest,
                        (_, b"spine") => {
                            section = Section::Spine;
                            opf.spine_toc = attribute(e, b"toc")?;
                        }
                        (_, b"guide") => section = Section::Guide,
                        (Section::Metadata, b"meta") => {
                            pending_meta = Self::handle_meta_tag(e, &mut opf.metadata)?;
                        }
                        (Section::Metadata, _) => {
                            dc_attributes = collect_attributes(e);
                        }
                        (Section::Manifest, b"item") => {
                            if let Some(item) = Self::parse_manifest_item(e)? {
                                opf.manifest.push(item);
                            }
                        }
                        (Section::Spine, b"itemref") => {
                            if let Some(idref) = attribute(e, b"idref")? {
                                let linear = attribute(e, b"linear")?.is_none_or(|value| value != "no");
                                opf.spine.push(SpineItem { idref, linear });
                            }
                        }
                        (Section::Guide, b"reference") => {
                            if let Some(reference) = Self::parse_guide_reference(e)? {
                                opf.guide.push(reference);
                            }
                        }
                        _ => {}
                    }
                    text_content.clear();
                }
                Event::End(ref e) => {
                    let local_name = e.local_name();
                    match (section, local_name.as_ref()) {
                        (_, b"metadata" | b"manifest" | b"spine" | b"guide") => section = Section::None,
                        (Section::Metadata, b"meta") => {
                            if let Some(meta) = pending_meta.take() {
                                let content = text_content.trim();
                                match meta.refines {
                                    Some(refines) => {
                                        opf.metadata.add_refinement(&refines, &meta.property, content, meta.scheme)
                                    }
                                    None => opf.metadata.add_meta(&meta.property, content),
                                }
                            }
                        }
                        (Section::Metadata, name) => {
                            let content = text_content.trim();
                            if !content.is_empty() {
                                let tag = String::from_utf8_lossy(name);
                                opf.metadata.add_dublin_core(&tag, content, std::mem::take(&mut dc_attributes));
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

        Ok(opf)
    }

    /// 处理meta开始标签
    ///
    /// name/content形式立即写入；property形式返回待定状态，等待结束标签时读取文本。
    fn handle_meta_tag(e: &BytesStart, metadata: &mut Metadata) -> Result<Option<PendingMeta>> {
        let name = attribute(e, b"name")?;
        let content = attribute(e, b"content")?;
        let property = attribute(e, b"property")?;
        let refines = attribute(e, b"refines")?;
        let scheme = attribute(e, b"scheme")?;

        if let (Some(name), Some(content)) = (&name, &content) {
            metadata.add_meta(name, content);
        }

        match (property, refines, content) {
            // refines形式也可能把值放在content属性里
            (Some(property), Some(refines), Some(content)) => {
                metadata.add_refinement(&refines, &property, &content, scheme);
                Ok(None)
            }
            (Some(property), refines, _) => Ok(Some(PendingMeta { property, refines, scheme })),
            _ => Ok(None),
        }
    }

    /// 解析清单项，缺少id或href时忽略
    fn parse_manifest_item(e: &BytesStart) -> Result<Option<ManifestItem>> {
        let (Some(id), Some(href)) = (attribute(e, b"id")?, attribute(e, b"href")?) else {
            return Ok(None);
        };

        Ok(Some(ManifestItem {
            id,
            href,
            media_type: attribute(e, b"media-type")?.unwrap_or_default(),
            properties: attribute(e, b"properties")?,
        }))
    }

    /// 解析guide中的reference元素
    fn parse_guide_reference(e: &BytesStart) -> Result<Option<GuideReference>> {
        let Some(href) = attribute(e, b"href")? else {
            return Ok(None);
        };

        Ok(Some(GuideReference {
            ref_type: attribute(e, b"type")?.unwrap_or_default(),
            title: attribute(e, b"title")?.filter(|title| !title.trim().is_empty()),
            href,
        }))
    }

    /// 根据ID获取清单项
    pub fn get_manifest_item(&self, id: &str) -> Option<&ManifestItem> {
        self.manifest.iter().find(|item| item.id == id)
    }

    /// 获取EPUB3导航文档的href(相对于OPF)
    pub fn get_nav_href(&self) -> Option<&str> {
        self.manifest.iter().find(|item| item.is_nav()).map(|item| item.href.as_str())
    }

    /// 获取NCX文件的href(相对于OPF)
    ///
    /// 优先使用spine的toc属性，其次按媒体类型查找。
    pub fn get_ncx_href(&self) -> Option<&str> {
        self.spine_toc
            .as_deref()
            .and_then(|id| self.get_manifest_item(id))
            .or_else(|| self.manifest.iter().find(|item| item.is_ncx()))
            .map(|item| item.href.as_str())
    }

    /// 按阅读顺序获取脊柱对应的清单项，缺失的idref被跳过
    pub fn spine_items(&self) -> Vec<&ManifestItem> {
        self.spine
            .iter()
            .filter_map(|spine_item| self.get_manifest_item(&spine_item.idref))
            .collect()
    }
}

/// 读取单个属性值，按本地名匹配
fn attribute(e: &BytesStart, key: &[u8]) -> Result<Option<String>> {
    for attr_result in e.attributes() {
        let attr = attr_result.map_err(|err| EpubError::XmlError(quick_xml::Error::InvalidAttr(err)))?;
        if attr.key.local_name().as_ref() == key {
            let value = attr
                .unescape_value()
                .map(|value| value.into_owned())
                .unwrap_or_else(|_| String::from_utf8_lossy(&attr.value).into_owned());
            return Ok(Some(value));
        }
    }
    Ok(None)
}

/// 收集元素的全部属性(忽略格式错误的属性)
fn collect_attributes(e: &BytesStart) -> HashMap<String, String> {
    e.attributes()
        .flatten()
        .map(|attr| {
            let key = String::from_utf8_lossy(attr.key.local_name().as_ref()).to_string();
            let value = String::from_utf8_lossy(&attr.value).to_string();
            (key, value)
        })
        .collect()
}
