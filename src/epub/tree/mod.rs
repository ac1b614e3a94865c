//! 通用文档树模块
//!
//! XML与HTML解析结果统一表示为 [`Node`] 树。节点只由父节点独占持有，
//! 不存在回指或共享引用，因此遍历时不需要检测环。

pub mod html;
pub mod xml;

use std::collections::BTreeMap;

pub use html::parse_html;
pub use xml::parse_xml;

/// 属性集合，键为属性的本地名
pub type Attributes = BTreeMap<String, String>;

/// 在属性集合中按名称查找（忽略大小写），精确匹配优先
pub fn lookup_attr<'a>(attrs: &'a Attributes, name: &str) -> Option<&'a str> {
    if let Some(value) = attrs.get(name) {
        return Some(value);
    }
    attrs
        .iter()
        .find(|(key, _)| key.eq_ignore_ascii_case(name))
        .map(|(_, value)| value.as_str())
}

/// 节点种类
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NodeKind {
    /// 元素节点
    Element,
    /// 文本节点（内容已去除首尾空白，且不为空）
    Text,
}

/// 文档树中的一个节点
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Node {
    kind: NodeKind,
    name: String,
    namespace: String,
    attrs: Attributes,
    text: Option<String>,
    children: Vec<Node>,
}

impl Node {
    /// 创建元素节点
    pub fn element(name: impl Into<String>, namespace: impl Into<String>, attrs: Attributes) -> Self {
        Self {
            kind: NodeKind::Element,
            name: name.into(),
            namespace: namespace.into(),
            attrs,
            text: None,
            children: Vec::new(),
        }
    }

    /// 创建文本节点
    pub fn text_node(content: impl Into<String>) -> Self {
        Self {
            kind: NodeKind::Text,
            name: String::new(),
            namespace: String::new(),
            attrs: Attributes::new(),
            text: Some(content.into()),
            children: Vec::new(),
        }
    }

    pub(crate) fn push_child(&mut self, child: Node) {
        self.children.push(child);
    }

    pub fn kind(&self) -> NodeKind {
        self.kind
    }

    pub fn is_element(&self) -> bool {
        self.kind == NodeKind::Element
    }

    /// 元素的本地名，文本节点为空字符串
    pub fn name(&self) -> &str {
        &self.name
    }

    /// 元素的命名空间URI，未限定或HTML节点为空字符串
    pub fn namespace(&self) -> &str {
        &self.namespace
    }

    pub fn attrs(&self) -> &Attributes {
        &self.attrs
    }

    /// 文本节点的内容
    pub fn raw_text(&self) -> Option<&str> {
        self.text.as_deref()
    }

    pub fn children(&self) -> &[Node] {
        &self.children
    }

    /// 判断元素名是否匹配（忽略大小写）
    pub fn is_named(&self, name: &str) -> bool {
        self.is_element() && self.name.eq_ignore_ascii_case(name)
    }

    /// 按名称查找属性（忽略大小写）
    pub fn attr(&self, name: &str) -> Option<&str> {
        lookup_attr(&self.attrs, name)
    }

    /// 按名称查找属性，并去掉首尾空白；属性缺失或为空时返回 `None`
    pub fn attr_trimmed(&self, name: &str) -> Option<&str> {
        self.attr(name).map(str::trim).filter(|v| !v.is_empty())
    }

    /// 深度优先（先序）查找第一个名称匹配的节点，包括自身
    pub fn find(&self, name: &str) -> Option<&Node> {
        if self.is_named(name) {
            return Some(self);
        }
        self.children.iter().find_map(|child| child.find(name))
    }

    /// 深度优先（先序）查找第一个满足条件的节点，包括自身
    pub fn find_by<F>(&self, predicate: &F) -> Option<&Node>
    where
        F: Fn(&Node) -> bool,
    {
        if predicate(self) {
            return Some(self);
        }
        self.children.iter().find_map(|child| child.find_by(predicate))
    }

    /// 深度优先（先序）收集所有名称匹配的节点，包括自身
    pub fn find_all(&self, name: &str) -> Vec<&Node> {
        let mut found = Vec::new();
        self.collect_named(name, &mut found);
        found
    }

    fn collect_named<'a>(&'a self, name: &str, found: &mut Vec<&'a Node>) {
        if self.is_named(name) {
            found.push(self);
        }
        for child in &self.children {
            child.collect_named(name, found);
        }
    }

    /// 直接子元素
    pub fn child_elements(&self) -> impl Iterator<Item = &Node> {
        self.children.iter().filter(|child| child.is_element())
    }

    /// 名称匹配的直接子元素
    pub fn children_named<'a>(&'a self, name: &'a str) -> impl Iterator<Item = &'a Node> {
        self.children.iter().filter(move |child| child.is_named(name))
    }

    /// 第一个名称匹配的直接子元素
    pub fn child(&self, name: &str) -> Option<&Node> {
        self.children.iter().find(|child| child.is_named(name))
    }

    /// 提取整棵子树的文本
    ///
    /// 所有文本节点按文档顺序以单个空格连接，并去除首尾空白。
    pub fn text(&self) -> String {
        let mut parts = Vec::new();
        self.collect_text(&mut parts);
        parts.join(" ").trim().to_string()
    }

    fn collect_text<'a>(&'a self, parts: &mut Vec<&'a str>) {
        if let Some(text) = self.text.as_deref() {
            if !text.is_empty() {
                parts.push(text);
            }
        }
        for child in &self.children {
            child.collect_text(parts);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Node {
        let mut attrs = Attributes::new();
        attrs.insert("Type".to_string(), "toc".to_string());
        let mut root = Node::element("nav", "", attrs);

        let mut ol = Node::element("ol", "", Attributes::new());
        let mut li = Node::element("li", "", Attributes::new());
        let mut a = Node::element("a", "", Attributes::new());
        a.push_child(Node::text_node("Chapter"));
        let mut b = Node::element("b", "", Attributes::new());
        b.push_child(Node::text_node("One"));
        a.push_child(b);
        li.push_child(a);
        ol.push_child(li);
        root.push_child(Node::text_node("Contents"));
        root.push_child(ol);
        root
    }

    #[test]
    fn test_attr_is_case_insensitive() {
        let node = sample();
        assert_eq!(node.attr("type"), Some("toc"));
        assert_eq!(node.attr("TYPE"), Some("toc"));
        assert_eq!(node.attr("missing"), None);
    }

    #[test]
    fn test_find_and_find_all() {
        let node = sample();
        assert!(node.find("nav").is_some());
        assert_eq!(node.find("A").map(Node::name), Some("a"));
        assert!(node.find("table").is_none());

        let all = node.find_all("nav");
        assert_eq!(all.len(), 1);
        assert_eq!(node.find_all("li").len(), 1);
    }

    #[test]
    fn test_text_joins_in_document_order() {
        let node = sample();
        assert_eq!(node.text(), "Contents Chapter One");
        assert_eq!(node.find("a").unwrap().text(), "Chapter One");
    }

    #[test]
    fn test_lookup_attr_prefers_exact_key() {
        let mut attrs = Attributes::new();
        attrs.insert("TOC".to_string(), "upper".to_string());
        attrs.insert("toc".to_string(), "lower".to_string());
        assert_eq!(lookup_attr(&attrs, "toc"), Some("lower"));
        assert_eq!(lookup_attr(&attrs, "TOC"), Some("upper"));
        assert_eq!(lookup_attr(&attrs, "Toc"), Some("upper"));
        assert_eq!(lookup_attr(&attrs, "ncx"), None);
    }
}
