//! 目录树显示
//!
//! 提供目录树的控制台渲染(树状符号或缩进)和统计信息。

use crate::toc::item::TocItem;
use std::fmt::{Display, Formatter, Result as FmtResult};

/// 目录树显示样式
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TocStyle {
    /// 使用树状符号（├── └──）
    #[default]
    TreeSymbols,
    /// 使用缩进和符号（• ）
    Indented,
}

/// 目录树渲染器
#[derive(Debug, Clone)]
pub struct TocRenderer<'a> {
    items: &'a [TocItem],
    title: Option<String>,
    style: TocStyle,
    show_paths: bool,
    max_depth: Option<u32>,
}

impl<'a> TocRenderer<'a> {
    pub fn new(items: &'a [TocItem]) -> Self {
        Self {
            items,
            title: None,
            style: TocStyle::TreeSymbols,
            show_paths: false,
            max_depth: None,
        }
    }

    /// 设置书名
    pub fn with_title(mut self, title: Option<String>) -> Self {
        self.title = title;
        self
    }

    /// 设置显示样式
    pub fn with_style(mut self, style: TocStyle) -> Self {
        self.style = style;
        self
    }

    /// 设置是否显示文件路径
    pub fn with_show_paths(mut self, show_paths: bool) -> Self {
        self.show_paths = show_paths;
        self
    }

    /// 设置最大显示深度（None表示显示所有）
    pub fn with_max_depth(mut self, max_depth: Option<u32>) -> Self {
        self.max_depth = max_depth;
        self
    }

    fn label(&self, item: &TocItem) -> String {
        if self.show_paths && !item.href.is_empty() {
            format!("{} → {}", item.title, item.href)
        } else {
            item.title.clone()
        }
    }

    fn within_depth(&self, depth: u32) -> bool {
        self.max_depth.is_none_or(|max_depth| depth < max_depth)
    }

    fn render_tree_style(&self, item: &TocItem, depth: u32, is_last: bool, prefix: &str, result: &mut String) {
        if !self.within_depth(depth) {
            return;
        }

        let branch = if is_last { "└── " } else { "├── " };
        result.push_str(&format!("{}{}{}\n", prefix, branch, self.label(item)));

        let child_prefix = format!("{}{}", prefix, if is_last { "    " } else { "│   " });
        for (index, child) in item.children.iter().enumerate() {
            let is_child_last = index == item.children.len() - 1;
            self.render_tree_style(child, depth + 1, is_child_last, &child_prefix, result);
        }
    }

    fn render_indent_style(&self, item: &TocItem, depth: u32, result: &mut String) {
        if !self.within_depth(depth) {
            return;
        }

        let indent = "  ".repeat(depth as usize);
        result.push_str(&format!("{}• {}\n", indent, self.label(item)));

        for child in &item.children {
            self.render_indent_style(child, depth + 1, result);
        }
    }
}

impl Display for TocRenderer<'_> {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        let mut result = String::new();

        if let Some(ref title) = self.title {
            let depth_info = match self.max_depth {
                Some(max_depth) => format!(" (深度限制: {})", max_depth),
                None => String::new(),
            };
            result.push_str(&format!("📖 {}{}\n", title, depth_info));
            result.push_str("═══════════════════════════════════════\n\n");
        }

        for (index, item) in self.items.iter().enumerate() {
            match self.style {
                TocStyle::TreeSymbols => {
                    let is_last = index == self.items.len() - 1;
                    self.render_tree_style(item, 0, is_last, "", &mut result);
                }
                TocStyle::Indented => self.render_indent_style(item, 0, &mut result),
            }
        }

        write!(f, "{}", result)
    }
}

/// 目录树统计信息
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct TocStatistics {
    /// 总条目数
    pub total_items: usize,
    /// 根节点数
    pub root_count: usize,
    /// 叶子节点数
    pub leaf_count: usize,
    /// 最大层级
    pub max_depth: u32,
}

impl TocStatistics {
    pub fn from_items(items: &[TocItem]) -> Self {
        let mut statistics = Self {
            root_count: items.len(),
            ..Self::default()
        };
        for item in items {
            statistics.visit(item);
        }
        statistics
    }

    fn visit(&mut self, item: &TocItem) {
        self.total_items += 1;
        self.max_depth = self.max_depth.max(item.level);
        if item.is_leaf() {
            self.leaf_count += 1;
        }
        for child in &item.children {
            self.visit(child);
        }
    }
}

impl Display for TocStatistics {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        write!(
            f,
            "目录统计: {} 个章节, {} 个根节点, {} 个叶子节点, 最大深度: {}",
            self.total_items, self.root_count, self.leaf_count, self.max_depth
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Vec<TocItem> {
        vec![
            TocItem::new("第一章", "ch1.xhtml", 0).with_children(vec![
                TocItem::new("1.1", "ch1.xhtml#a", 0),
                TocItem::new("1.2", "ch1.xhtml#b", 0),
            ]),
            TocItem::new("第二章", "ch2.xhtml", 0),
        ]
    }

    #[test]
    fn test_tree_style() {
        let items = sample();
        let rendered = TocRenderer::new(&items).to_string();
        assert_eq!(rendered, "├── 第一章\n│   ├── 1.1\n│   └── 1.2\n└── 第二章\n");
    }

    #[test]
    fn test_indented_style_with_paths_and_depth() {
        let items = sample();
        let rendered = TocRenderer::new(&items)
            .with_style(TocStyle::Indented)
            .with_show_paths(true)
            .with_max_depth(Some(1))
            .to_string();
        assert_eq!(rendered, "• 第一章 → ch1.xhtml\n• 第二章 → ch2.xhtml\n");
    }

    #[test]
    fn test_title_header() {
        let items = sample();
        let rendered = TocRenderer::new(&items).with_title(Some("书名".to_string())).to_string();
        assert!(rendered.starts_with("📖 书名\n"));
    }

    #[test]
    fn test_statistics() {
        let statistics = TocStatistics::from_items(&sample());
        assert_eq!(
            statistics,
            TocStatistics {
                total_items: 4,
                root_count: 2,
                leaf_count: 3,
                max_depth: 1,
            }
        );
        assert_eq!(TocStatistics::from_items(&[]), TocStatistics::default());
    }
}
