use crate::epub::error::{EpubError, Result};
use quick_xml::events::Event;
use quick_xml::reader::Reader;

/// container.xml在归档中的固定位置
pub const CONTAINER_PATH: &str = "META-INF/container.xml";

const OPF_MEDIA_TYPE: &str = "application/oebps-package+xml";

/// Container.xml中的rootfile信息
#[derive(Debug, Clone, PartialEq)]
pub struct RootFile {
    pub full_path: String,
    pub media_type: String,
}

/// Container.xml的解析结果
#[derive(Debug, Clone)]
pub struct Container {
    pub rootfiles: Vec<RootFile>,
}

impl Container {
    /// 解析container.xml内容
    ///
    /// 没有任何rootfile条目时返回 `ContainerParseError`。
    pub fn parse_xml(xml_content: &str) -> Result<Container> {
        let mut reader = Reader::from_str(strip_bom(xml_content));
        reader.config_mut().trim_text(true);
        reader.config_mut().expand_empty_elements = true;

        let mut rootfiles = Vec::new();
        let mut buf = Vec::new();
        let mut in_rootfiles = false;

        loop {
            match reader.read_event_into(&mut buf)? {
                Event::Start(ref e) => match e.local_name().as_ref() {
                    b"rootfiles" => in_rootfiles = true,
                    b"rootfile" if in_rootfiles => {
                        let mut full_path = String::new();
                        let mut media_type = String::new();

                        for attr_result in e.attributes() {
                            let attr = attr_result
                                .map_err(|err| EpubError::XmlError(quick_xml::Error::InvalidAttr(err)))?;
                            match attr.key.local_name().as_ref() {
                                b"full-path" => full_path = String::from_utf8_lossy(&attr.value).to_string(),
                                b"media-type" => media_type = String::from_utf8_lossy(&attr.value).to_string(),
                                _ => {}
                            }
                        }

                        // 允许缺少media-type
                        if !full_path.is_empty() {
                            rootfiles.push(RootFile { full_path, media_type });
                        }
                    }
                    _ => {}
                },
                Event::End(ref e) => {
                    if e.local_name().as_ref() == b"rootfiles" {
                        in_rootfiles = false;
                    }
                }
                Event::Eof => break,
                _ => {}
            }
            buf.clear();
        }

        if rootfiles.is_empty() {
            return Err(EpubError::ContainerParseError("没有找到任何rootfile条目".to_string()));
        }

        Ok(Container { rootfiles })
    }

    /// 获取主要的OPF文件路径
    ///
    /// 优先返回 `application/oebps-package+xml` 类型的rootfile，否则返回第一个。
    pub fn get_opf_path(&self) -> Option<String> {
        self.rootfiles
            .iter()
            .find(|rootfile| rootfile.media_type == OPF_MEDIA_TYPE)
            .or_else(|| self.rootfiles.first())
            .map(|rootfile| rootfile.full_path.clone())
    }
}

/// 去掉UTF-8 BOM
pub(crate) fn strip_bom(content: &str) -> &str {
    content.strip_prefix('\u{feff}').unwrap_or(content)
}
