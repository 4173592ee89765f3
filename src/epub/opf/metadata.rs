//! 元数据处理模块
//!
//! 保存OPF `<metadata>` 中的Dublin Core元素和meta标签，并提供书名、作者等常用字段的查询。

use std::collections::HashMap;

/// 一个Dublin Core元素，如 `<dc:title>`、`<dc:creator id="aut1">`
#[derive(Debug, Clone, PartialEq)]
pub struct DublinCore {
    /// 元素内容
    pub value: String,
    /// 元素属性(如 id、role、scheme)
    pub attributes: HashMap<String, String>,
}

/// 基于refines属性的meta标签，如 `<meta refines="#creator" property="role">aut</meta>`
#[derive(Debug, Clone, PartialEq)]
pub struct Refinement {
    /// property属性值(如role、file-as、display-seq)
    pub property: String,
    /// 标签内容
    pub content: String,
    /// scheme属性(如marc:relators)
    pub scheme: Option<String>,
}

/// 创建者信息(作者、编辑者等)
#[derive(Debug, Clone, PartialEq)]
pub struct Creator {
    /// 创建者姓名
    pub name: String,
    /// 角色(如author、editor等)
    pub role: Option<String>,
    /// 显示顺序
    pub display_seq: Option<u32>,
    /// 元素ID(用于关联refines元数据)
    pub id: Option<String>,
}

impl Creator {
    /// 未标注角色的创建者也视为作者
    pub fn is_author(&self) -> bool {
        matches!(self.role.as_deref(), None | Some("author"))
    }
}

/// OPF文件中的元数据信息
#[derive(Debug, Clone, Default)]
pub struct Metadata {
    /// Dublin Core元素，key为去掉命名空间前缀的标签名(如"title")
    dublin_core: HashMap<String, Vec<DublinCore>>,
    /// name或property形式的meta标签
    meta: HashMap<String, String>,
    /// refines形式的meta标签，key为被精化元素的ID(不含#)
    refines: HashMap<String, Vec<Refinement>>,
}

impl Metadata {
    pub fn new() -> Self {
        Self::default()
    }

    /// 添加Dublin Core元数据
    pub fn add_dublin_core(&mut self, tag: &str, value: &str, attributes: HashMap<String, String>) {
        self.dublin_core.entry(tag.to_string()).or_default().push(DublinCore {
            value: value.to_string(),
            attributes,
        });
    }

    /// 添加name/property形式的meta元数据，已存在的键保留首个值
    pub fn add_meta(&mut self, key: &str, content: &str) {
        self.meta.entry(key.to_string()).or_insert_with(|| content.to_string());
    }

    /// 添加refines形式的meta元数据
    pub fn add_refinement(&mut self, refines_id: &str, property: &str, content: &str, scheme: Option<String>) {
        let refines_id = refines_id.trim_start_matches('#');
        self.refines.entry(refines_id.to_string()).or_default().push(Refinement {
            property: property.to_string(),
            content: content.to_string(),
            scheme,
        });
    }

    fn first(&self, tag: &str) -> Option<String> {
        self.dublin_core
            .get(tag)
            .and_then(|values| values.first())
            .map(|dc| dc.value.clone())
    }

    /// 获取标题
    pub fn title(&self) -> Option<String> {
        self.first("title")
    }

    /// 获取语言
    pub fn language(&self) -> Option<String> {
        self.first("language")
    }

    /// 获取出版社
    pub fn publisher(&self) -> Option<String> {
        self.first("publisher")
    }

    /// 获取出版日期
    pub fn date(&self) -> Option<String> {
        self.first("date")
    }

    /// 获取描述
    pub fn description(&self) -> Option<String> {
        self.first("description")
    }

    /// 获取第一个标识符
    pub fn identifier(&self) -> Option<String> {
        self.first("identifier")
    }

    /// 获取修改时间
    pub fn modified(&self) -> Option<String> {
        self.meta.get("dcterms:modified").cloned()
    }

    /// 获取name/property形式的meta值
    pub fn meta(&self, key: &str) -> Option<&str> {
        self.meta.get(key).map(String::as_str)
    }

    /// 获取所有创建者(支持EPUB3的refines关联)，按display-seq排序
    pub fn creators(&self) -> Vec<Creator> {
        let mut creators: Vec<Creator> = self
            .dublin_core
            .get("creator")
            .map(|values| values.iter().map(|dc| self.extract_creator(dc)).collect())
            .unwrap_or_default();

        // sort_by_key是稳定排序，没有display-seq的条目保持文档顺序
        creators.sort_by_key(|creator| creator.display_seq.unwrap_or(u32::MAX));
        creators
    }

    /// 获取作者姓名列表
    pub fn authors(&self) -> Vec<String> {
        self.creators()
            .into_iter()
            .filter(Creator::is_author)
            .map(|creator| creator.name)
            .collect()
    }

    fn extract_creator(&self, dc: &DublinCore) -> Creator {
        let mut creator = Creator {
            name: dc.value.clone(),
            role: dc.attributes.get("role").map(|role| normalize_role(role)),
            display_seq: None,
            id: dc.attributes.get("id").cloned(),
        };

        let refinements = creator.id.as_ref().and_then(|id| self.refines.get(id));
        for refinement in refinements.into_iter().flatten() {
            match refinement.property.as_str() {
                "role" => creator.role = Some(normalize_role(&refinement.content)),
                "display-seq" => creator.display_seq = refinement.content.parse().ok(),
                _ => {}
            }
        }

        creator
    }
}

/// 将marc:relators角色代码映射为可读名称
fn normalize_role(code: &str) -> String {
    match code {
        "aut" => "author".to_string(),
        "edt" => "editor".to_string(),
        "trl" => "translator".to_string(),
        "ill" => "illustrator".to_string(),
        other => other.to_string(),
    }
}
