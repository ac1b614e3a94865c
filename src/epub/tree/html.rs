//! HTML解码器
//!
//! 章节内容和导航文档并不保证是良构的XHTML，因此使用 `scraper`（html5ever）
//! 做容错解析：缺失的结束标签、隐式的html/body元素以及未知标签都会被修复，
//! 然后转换为与XML解码器相同的 [`Node`] 树。

use crate::epub::error::{EpubError, Result};
use crate::epub::tree::{Attributes, Node};
use scraper::node::Node as HtmlNode;
use scraper::{ElementRef, Html};

/// 将HTML/XHTML字节流解析为文档树
///
/// 返回的根节点是 `<html>` 元素。文本节点去除首尾空白，仅含空白的文本节点被丢弃。
pub fn parse_html(content: &[u8], max_depth: usize) -> Result<Node> {
    let content = content.strip_prefix(b"\xEF\xBB\xBF".as_slice()).unwrap_or(content);
    let html = std::str::from_utf8(content)
        .map_err(|e| EpubError::StructuralParse(format!("无效的UTF-8字节序列: {}", e)))?;

    let document = Html::parse_document(html);
    convert_element(document.root_element(), 1, max_depth)
}

/// 递归转换scraper元素
fn convert_element(element: ElementRef, depth: usize, max_depth: usize) -> Result<Node> {
    if depth > max_depth {
        return Err(EpubError::TooDeeplyNested { limit: max_depth });
    }

    let value = element.value();
    let attrs: Attributes = value
        .attrs()
        .map(|(key, val)| (key.to_string(), val.to_string()))
        .collect();
    let mut node = Node::element(value.name(), "", attrs);

    for child in element.children() {
        match child.value() {
            HtmlNode::Text(text) => {
                let text = text.trim();
                if !text.is_empty() {
                    node.push_child(Node::text_node(text));
                }
            }
            HtmlNode::Element(_) => {
                if let Some(child_element) = ElementRef::wrap(child) {
                    node.push_child(convert_element(child_element, depth + 1, max_depth)?);
                }
            }
            _ => {}
        }
    }

    Ok(node)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::epub::config::DEFAULT_MAX_DEPTH;

    fn parse(html: &str) -> Node {
        parse_html(html.as_bytes(), DEFAULT_MAX_DEPTH).expect("解析HTML失败")
    }

    #[test]
    fn test_implicit_html_and_body() {
        let root = parse("<p>Hello<p>World");
        assert!(root.is_named("html"));
        let body = root.find("body").unwrap();
        let paragraphs: Vec<String> = body.children_named("p").map(Node::text).collect();
        assert_eq!(paragraphs, vec!["Hello", "World"]);
    }

    #[test]
    fn test_xhtml_document() {
        let root = parse(
            r#"<?xml version="1.0" encoding="UTF-8"?>
<!DOCTYPE html>
<html xmlns="http://www.w3.org/1999/xhtml">
<head><title>第一章</title></head>
<body>
  <h1>第一章</h1>
  <p class="first">这是第一章的内容。</p>
  <img src="../images/a.png" alt=""/>
</body>
</html>"#,
        );
        assert_eq!(root.find("title").unwrap().text(), "第一章");
        assert_eq!(root.find("p").unwrap().attr("CLASS"), Some("first"));
        assert_eq!(root.find("img").unwrap().attr("src"), Some("../images/a.png"));
        assert!(root.namespace().is_empty());
    }

    #[test]
    fn test_whitespace_only_text_is_dropped() {
        let root = parse("<body>\n  <div>  <span> a </span>\n</div></body>");
        let div = root.find("div").unwrap();
        assert_eq!(div.children().len(), 1);
        assert_eq!(div.text(), "a");
    }

    #[test]
    fn test_unknown_tags_are_kept() {
        let root = parse("<body><custom-tag>x</custom-tag></body>");
        assert_eq!(root.find("custom-tag").unwrap().text(), "x");
    }

    #[test]
    fn test_invalid_utf8() {
        assert!(matches!(
            parse_html(b"<p>\xff\xfe</p>", DEFAULT_MAX_DEPTH),
            Err(EpubError::StructuralParse(_))
        ));
    }

    #[test]
    fn test_depth_limit() {
        let html = format!("<body>{}</body>", "<div>".repeat(40));
        // html > body > 40 个div
        assert!(parse_html(html.as_bytes(), 42).is_ok());
        assert!(matches!(
            parse_html(html.as_bytes(), 41),
            Err(EpubError::TooDeeplyNested { limit: 41 })
        ));
    }
}
