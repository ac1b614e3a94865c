//! EPUB2 NCX解析

use crate::epub::error::{EpubError, Result};
use crate::epub::path;
use crate::epub::toc::TocNode;
use crate::epub::tree::Node;

/// 从NCX文档的navMap中提取目录条目
pub(super) fn parse_ncx(root: &Node, base_dir: &str) -> Result<Vec<TocNode>> {
    let nav_map = root.find("navMap").ok_or(EpubError::NavMapNotFound)?;
    Ok(parse_nav_points(nav_map, base_dir))
}

fn parse_nav_points(parent: &Node, base_dir: &str) -> Vec<TocNode> {
    parent
        .children_named("navPoint")
        .filter_map(|nav_point| parse_nav_point(nav_point, base_dir))
        .collect()
}

/// 解析单个navPoint，没有标签文本的navPoint被丢弃
fn parse_nav_point(nav_point: &Node, base_dir: &str) -> Option<TocNode> {
    let title = nav_point.child("navLabel").map(Node::text).unwrap_or_default();
    if title.is_empty() {
        return None;
    }

    let href = nav_point
        .child("content")
        .and_then(|content| content.attr_trimmed("src"))
        .map(|src| path::resolve(base_dir, src))
        .unwrap_or_default();

    let mut node = TocNode::new(title, href);
    node.children = parse_nav_points(nav_point, base_dir);
    Some(node)
}
