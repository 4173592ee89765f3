//! 目录树规范化
//!
//! 处理顺序：
//! 1. 整理标题空白，删除空标题条目并将其子节点提升到原位置
//! 2. 将只有片段的href(`#id`)解析到最近祖先的资源上，没有祖先资源时使用来源文档
//! 3. 限制深度，超出部分按前序展开为最后一层的兄弟节点，不丢弃条目
//! 4. 合并相邻且标题和href都相同的兄弟节点
//! 5. 按位置重新计算层级
//!
//! 对已经规范化的树再次规范化不会产生变化。

use crate::toc::html::collapse_whitespace;
use crate::toc::item::{TocItem, relevel};

/// 目录树规范化器
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Normalizer {
    /// 允许的最大层数，至少为1
    pub max_depth: u32,
}

impl Normalizer {
    pub fn new(max_depth: u32) -> Self {
        Self {
            max_depth: max_depth.max(1),
        }
    }

    /// 规范化目录树
    ///
    /// `source` 为候选目录所来自的文档路径。
    pub fn normalize(&self, items: Vec<TocItem>, source: &str) -> Vec<TocItem> {
        let mut items = clean_titles(items);
        resolve_fragments(&mut items, source);
        let items = cap_depth(items, 0, self.max_depth.max(1));
        let mut items = merge_adjacent(items);
        relevel(&mut items, 0);
        items
    }
}

fn clean_titles(items: Vec<TocItem>) -> Vec<TocItem> {
    let mut result = Vec::with_capacity(items.len());
    for mut item in items {
        item.title = collapse_whitespace(&item.title);
        item.description = item
            .description
            .map(|description| collapse_whitespace(&description))
            .filter(|description| !description.is_empty());

        let children = clean_titles(std::mem::take(&mut item.children));
        if item.title.is_empty() {
            result.extend(children);
        } else {
            item.children = children;
            result.push(item);
        }
    }
    result
}

fn resolve_fragments(items: &mut [TocItem], parent_resource: &str) {
    for item in items {
        item.href = item.href.trim().to_string();
        if let Some(fragment) = item.href.strip_prefix('#') {
            item.href = match (parent_resource.is_empty(), fragment.is_empty()) {
                (true, _) => item.href.clone(),
                (false, true) => parent_resource.to_string(),
                (false, false) => format!("{}#{}", parent_resource, fragment),
            };
        }

        let resource = match item.resource() {
            "" => parent_resource.to_string(),
            resource => resource.to_string(),
        };
        resolve_fragments(&mut item.children, &resource);
    }
}

/// `level` 为 `items` 所在的层级；位于最后一层的条目不再保留子节点
fn cap_depth(items: Vec<TocItem>, level: u32, max_depth: u32) -> Vec<TocItem> {
    let mut result = Vec::with_capacity(items.len());
    for mut item in items {
        let children = std::mem::take(&mut item.children);
        if level + 1 >= max_depth {
            result.push(item);
            flatten_into(children, &mut result);
        } else {
            item.children = cap_depth(children, level + 1, max_depth);
            result.push(item);
        }
    }
    result
}

fn flatten_into(items: Vec<TocItem>, result: &mut Vec<TocItem>) {
    for mut item in items {
        let children = std::mem::take(&mut item.children);
        result.push(item);
        flatten_into(children, result);
    }
}

fn merge_adjacent(items: Vec<TocItem>) -> Vec<TocItem> {
    let mut result: Vec<TocItem> = Vec::with_capacity(items.len());
    for item in items {
        match result.last_mut() {
            Some(last) if last.title == item.title && last.href == item.href => {
                last.children.extend(item.children);
                if last.description.is_none() {
                    last.description = item.description;
                }
            }
            _ => result.push(item),
        }
    }

    for item in &mut result {
        item.children = merge_adjacent(std::mem::take(&mut item.children));
    }
    result
}
