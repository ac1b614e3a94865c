//! 脊柱模块
//!
//! 提供EPUB包中阅读顺序（脊柱）的结构定义。

use crate::epub::tree::{Attributes, Node, lookup_attr};
use serde::Serialize;

/// 脊柱项信息(阅读顺序)
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SpineItemRef {
    /// 引用的清单项ID，不保证能在清单中找到
    pub idref: String,
    /// 是否线性阅读，默认为true
    pub linear: bool,
    #[serde(skip)]
    pub attrs: Attributes,
}

impl SpineItemRef {
    fn from_node(node: &Node) -> Self {
        Self {
            idref: node.attr("idref").unwrap_or_default().trim().to_string(),
            linear: !node
                .attr("linear")
                .is_some_and(|linear| linear.trim().eq_ignore_ascii_case("no")),
            attrs: node.attrs().clone(),
        }
    }
}

/// OPF的spine区域
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Spine {
    /// spine元素自身的属性
    attrs: Attributes,
    itemrefs: Vec<SpineItemRef>,
}

impl Spine {
    pub fn from_node(spine_node: &Node) -> Self {
        Self {
            attrs: spine_node.attrs().clone(),
            itemrefs: spine_node
                .children_named("itemref")
                .map(SpineItemRef::from_node)
                .collect(),
        }
    }

    pub fn attrs(&self) -> &Attributes {
        &self.attrs
    }

    /// EPUB2中指向NCX清单项的toc属性
    pub fn toc(&self) -> Option<&str> {
        lookup_attr(&self.attrs, "toc")
            .map(str::trim)
            .filter(|toc| !toc.is_empty())
    }

    pub fn itemrefs(&self) -> &[SpineItemRef] {
        &self.itemrefs
    }

    pub fn len(&self) -> usize {
        self.itemrefs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.itemrefs.is_empty()
    }

    /// 按阅读顺序提取章节ID
    ///
    /// 跳过 `linear="no"`（忽略大小写）以及idref为空的itemref。
    pub fn extract_chapter_ids(&self) -> Vec<String> {
        self.itemrefs
            .iter()
            .filter(|itemref| itemref.linear && !itemref.idref.is_empty())
            .map(|itemref| itemref.idref.clone())
            .collect()
    }
}
