//! 目录树的文本显示

use crate::epub::toc::TocNode;
use std::fmt::{Display, Formatter, Result as FmtResult};

/// 目录树显示样式
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TocTreeStyle {
    /// 使用树状符号（├── └──）
    #[default]
    TreeSymbols,
    /// 使用缩进和符号（• ）
    Indented,
}

/// 目录树的显示视图
///
/// 借用一棵目录树，按选定的样式渲染，本身不持有数据。
#[derive(Debug, Clone)]
pub struct TocTreeView<'a> {
    root: &'a TocNode,
    title: Option<String>,
    style: TocTreeStyle,
    show_paths: bool,
    max_depth: Option<usize>,
}

impl<'a> TocTreeView<'a> {
    pub fn new(root: &'a TocNode) -> Self {
        Self {
            root,
            title: None,
            style: TocTreeStyle::TreeSymbols,
            show_paths: true,
            max_depth: None,
        }
    }

    /// 设置文档标题
    pub fn with_title(mut self, title: Option<String>) -> Self {
        self.title = title;
        self
    }

    /// 设置显示样式
    pub fn with_style(mut self, style: TocTreeStyle) -> Self {
        self.style = style;
        self
    }

    /// 设置是否显示文件路径
    pub fn with_show_paths(mut self, show_paths: bool) -> Self {
        self.show_paths = show_paths;
        self
    }

    /// 设置最大显示深度（None表示显示所有）
    pub fn with_max_depth(mut self, max_depth: Option<usize>) -> Self {
        self.max_depth = max_depth;
        self
    }

    /// 顶层条目，合成根节点本身不显示
    fn top_level(&self) -> &'a [TocNode] {
        if self.root.is_root() {
            &self.root.children
        } else {
            std::slice::from_ref(self.root)
        }
    }

    fn label(&self, node: &TocNode) -> String {
        if self.show_paths && !node.href.is_empty() {
            format!("{} → {}", node.title, node.href)
        } else {
            node.title.clone()
        }
    }

    fn within_depth(&self, depth: usize) -> bool {
        self.max_depth.is_none_or(|max_depth| depth < max_depth)
    }

    fn render_node(&self, node: &TocNode, depth: usize, is_last: bool, prefix: &str, result: &mut String) {
        if !self.within_depth(depth) {
            return;
        }

        match self.style {
            TocTreeStyle::TreeSymbols => {
                let branch = if is_last { "└── " } else { "├── " };
                result.push_str(&format!("{}{}{}\n", prefix, branch, self.label(node)));

                let child_prefix = format!("{}{}", prefix, if is_last { "    " } else { "│   " });
                for (index, child) in node.children.iter().enumerate() {
                    let is_child_last = index == node.children.len() - 1;
                    self.render_node(child, depth + 1, is_child_last, &child_prefix, result);
                }
            }
            TocTreeStyle::Indented => {
                let indent = "  ".repeat(depth);
                result.push_str(&format!("{}• {}\n", indent, self.label(node)));

                for child in &node.children {
                    self.render_node(child, depth + 1, false, prefix, result);
                }
            }
        }
    }
}

impl Display for TocTreeView<'_> {
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

        let roots = self.top_level();
        for (index, root) in roots.iter().enumerate() {
            let is_last = index == roots.len() - 1;
            self.render_node(root, 0, is_last, "", &mut result);
        }

        write!(f, "{}", result)
    }
}
