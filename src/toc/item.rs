//! 目录条目模块
//!
//! 定义解析结果中的目录树节点 [`TocItem`] 以及在整棵树上操作的辅助函数。

use crate::epub::strip_fragment;
use serde::{Deserialize, Serialize};

/// 目录树节点
///
/// `level` 从0开始，子节点的层级总是父节点层级加一。
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TocItem {
    /// 标题
    pub title: String,
    /// 归档内的资源路径，可带 `#片段`
    #[serde(default)]
    pub href: String,
    /// 层级
    #[serde(default)]
    pub level: u32,
    /// 子节点，保持文档顺序
    #[serde(default)]
    pub children: Vec<TocItem>,
    /// 补充说明
    #[serde(default)]
    pub description: Option<String>,
}

impl TocItem {
    /// 创建新的目录节点
    pub fn new(title: impl Into<String>, href: impl Into<String>, level: u32) -> Self {
        Self {
            title: title.into(),
            href: href.into(),
            level,
            children: Vec::new(),
            description: None,
        }
    }

    /// 设置子节点，并按当前层级重新计算子节点层级
    pub fn with_children(mut self, children: Vec<TocItem>) -> Self {
        self.children = children;
        relevel(&mut self.children, self.level + 1);
        self
    }

    /// 添加子节点
    pub fn add_child(&mut self, mut child: TocItem) {
        child.set_level(self.level + 1);
        self.children.push(child);
    }

    /// 设置本节点层级，子树随之调整
    pub fn set_level(&mut self, level: u32) {
        self.level = level;
        relevel(&mut self.children, level + 1);
    }

    /// 去掉片段后的资源路径
    pub fn resource(&self) -> &str {
        strip_fragment(&self.href)
    }

    /// 是否为叶子节点
    pub fn is_leaf(&self) -> bool {
        self.children.is_empty()
    }

    /// 节点及其所有子节点的数量
    pub fn total_items(&self) -> usize {
        1 + count_items(&self.children)
    }

    /// 子树中的最大层级
    pub fn max_level(&self) -> u32 {
        self.children
            .iter()
            .map(TocItem::max_level)
            .max()
            .unwrap_or(self.level)
    }
}

/// 统计森林中的节点总数
pub fn count_items(items: &[TocItem]) -> usize {
    items.iter().map(TocItem::total_items).sum()
}

/// 森林中的最大层级，空森林返回 `None`
pub fn max_level(items: &[TocItem]) -> Option<u32> {
    items.iter().map(TocItem::max_level).max()
}

/// 从 `level` 开始重新计算每个节点的层级
pub fn relevel(items: &mut [TocItem], level: u32) {
    for item in items {
        item.set_level(level);
    }
}

/// 检查层级是否与嵌套位置一致(根节点为0)
pub fn is_well_leveled(items: &[TocItem]) -> bool {
    fn check(items: &[TocItem], level: u32) -> bool {
        items
            .iter()
            .all(|item| item.level == level && check(&item.children, level + 1))
    }
    check(items, 0)
}

/// 前序遍历所有节点
pub fn flatten(items: &[TocItem]) -> Vec<&TocItem> {
    let mut result = Vec::new();
    let mut stack: Vec<&TocItem> = items.iter().rev().collect();
    while let Some(item) = stack.pop() {
        result.push(item);
        stack.extend(item.children.iter().rev());
    }
    result
}
