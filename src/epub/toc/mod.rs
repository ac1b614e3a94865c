//! 目录（Table of Contents）模块
//!
//! EPUB2的NCX与EPUB3的导航文档被统一解析为同一种树形结构 [`TocNode`]。

mod nav;
mod ncx;
pub mod tree;

use crate::epub::config::ReaderConfig;
use crate::epub::error::Result;
use crate::epub::path;
use crate::epub::tree::parse_xml;
use serde::Serialize;
use std::fmt::{Display, Formatter, Result as FmtResult};

pub use tree::{TocTreeStyle, TocTreeView};

/// 目录文件的格式
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum TocFormat {
    /// NCX（Navigation Control File）
    Epub2,
    /// 导航文档（Navigation Document）
    Epub3,
}

impl Display for TocFormat {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        match self {
            TocFormat::Epub2 => write!(f, "EPUB2"),
            TocFormat::Epub3 => write!(f, "EPUB3"),
        }
    }
}

/// 目录文件在压缩包中的位置
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TocLocation {
    pub format: TocFormat,
    /// 规范化后的条目路径
    pub path: String,
}

impl TocLocation {
    /// 目录文件所在的目录，目录中的href相对于它解析
    pub fn base_dir(&self) -> String {
        path::dir(&self.path)
    }
}

/// 目录树节点
///
/// 合成的根节点标题与路径均为空，只作为顶层条目的容器。
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct TocNode {
    /// 标题
    pub title: String,
    /// 解析后的路径，可能带有 `#片段`
    pub href: String,
    /// 子节点
    pub children: Vec<TocNode>,
}

impl TocNode {
    /// 创建新的目录节点
    pub fn new(title: impl Into<String>, href: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            href: href.into(),
            children: Vec::new(),
        }
    }

    /// 创建包含顶层条目的合成根节点
    pub fn root(children: Vec<TocNode>) -> Self {
        Self {
            title: String::new(),
            href: String::new(),
            children,
        }
    }

    /// 是否为合成根节点
    pub fn is_root(&self) -> bool {
        self.title.is_empty() && self.href.is_empty()
    }

    /// 添加子节点
    pub fn add_child(&mut self, child: TocNode) {
        self.children.push(child);
    }

    /// 按深度优先先序展开为线性列表，合成根节点不包含在内
    pub fn flatten(&self) -> Vec<&TocNode> {
        let mut nodes = Vec::new();
        self.collect(&mut nodes);
        nodes
    }

    fn collect<'a>(&'a self, nodes: &mut Vec<&'a TocNode>) {
        if !self.is_root() {
            nodes.push(self);
        }
        for child in &self.children {
            child.collect(nodes);
        }
    }

    /// 根据路径查找节点，比较前双方都做规范化
    pub fn find_by_href(&self, href: &str) -> Option<&TocNode> {
        let wanted = path::clean(href.trim());
        self.flatten()
            .into_iter()
            .find(|node| path::clean(&node.href) == wanted)
    }

    /// 节点数量（不含合成根节点）
    pub fn len(&self) -> usize {
        let own = if self.is_root() { 0 } else { 1 };
        own + self.children.iter().map(TocNode::len).sum::<usize>()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// 树的最大深度，合成根节点不计入
    pub fn max_depth(&self) -> usize {
        let below = self.children.iter().map(TocNode::max_depth).max().unwrap_or(0);
        if self.is_root() { below } else { below + 1 }
    }

    /// 收集所有叶子节点（没有子节点的节点）
    pub fn leaves(&self) -> Vec<&TocNode> {
        self.flatten()
            .into_iter()
            .filter(|node| node.children.is_empty())
            .collect()
    }
}

/// 解析目录文件
///
/// # 参数
/// * `location` - 目录文件的格式与路径
/// * `content` - 目录文件内容
/// * `config` - 解析配置
///
/// # 返回值
/// * `Result<Vec<TocNode>>` - 顶层目录条目
pub fn parse_toc(location: &TocLocation, content: &[u8], config: &ReaderConfig) -> Result<Vec<TocNode>> {
    let root = parse_xml(content, config.max_depth)?;
    let base_dir = location.base_dir();
    match location.format {
        TocFormat::Epub3 => nav::parse_nav(&root, &base_dir),
        TocFormat::Epub2 => ncx::parse_ncx(&root, &base_dir),
    }
}
