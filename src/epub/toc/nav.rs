//! EPUB3导航文档解析

use crate::epub::error::{EpubError, Result};
use crate::epub::path;
use crate::epub::toc::TocNode;
use crate::epub::tree::Node;

/// 从导航文档中提取目录条目
///
/// 查找 `type`（包括 `epub:type`）属性包含 `toc` 的nav元素，再取其中第一个ol。
pub(super) fn parse_nav(root: &Node, base_dir: &str) -> Result<Vec<TocNode>> {
    let nav = root
        .find_by(&|node: &Node| {
            node.is_named("nav") && node.attr("type").is_some_and(|t| t.contains("toc"))
        })
        .ok_or(EpubError::TocNavNotFound)?;

    let list = nav
        .children()
        .iter()
        .find_map(|child| child.find("ol"))
        .ok_or(EpubError::TocOlNotFound)?;

    Ok(parse_list(list, base_dir))
}

fn parse_list(list: &Node, base_dir: &str) -> Vec<TocNode> {
    list.children_named("li")
        .filter_map(|item| parse_item(item, base_dir))
        .collect()
}

fn parse_item(item: &Node, base_dir: &str) -> Option<TocNode> {
    let anchor = item.child("a")?;
    let title = anchor.text();
    if title.is_empty() {
        return None;
    }

    let href = anchor
        .attr_trimmed("href")
        .map(|href| path::resolve(base_dir, href))
        .unwrap_or_default();

    let mut node = TocNode::new(title, href);
    if let Some(nested) = item.child("ol") {
        node.children = parse_list(nested, base_dir);
    }
    Some(node)
}
