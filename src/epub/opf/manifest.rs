//! 清单模块
//!
//! 提供EPUB包中文件清单的结构定义。

use crate::epub::path;
use crate::epub::tree::{Attributes, Node};
use serde::Serialize;
use std::collections::HashMap;

/// NCX文件的媒体类型
pub const NCX_MEDIA_TYPE: &str = "application/x-dtbncx+xml";

/// 清单项信息
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ManifestItem {
    /// 项目ID
    pub id: String,
    /// 文件路径(相对于OPF文件，未解析)
    pub href: String,
    /// 媒体类型
    pub media_type: String,
    /// 属性(如nav、cover-image等)
    pub properties: Vec<String>,
    /// item元素的全部属性
    #[serde(skip)]
    pub attrs: Attributes,
}

impl ManifestItem {
    /// 从item元素创建清单项，属性原样保留
    pub fn from_node(node: &Node) -> Self {
        let field = |name: &str| node.attr(name).unwrap_or_default().trim().to_string();
        Self {
            id: field("id"),
            href: field("href"),
            media_type: field("media-type"),
            properties: node
                .attr("properties")
                .unwrap_or_default()
                .split_whitespace()
                .map(str::to_string)
                .collect(),
            attrs: node.attrs().clone(),
        }
    }

    /// 检查是否包含指定属性（忽略大小写）
    pub fn has_property(&self, property: &str) -> bool {
        self.properties
            .iter()
            .any(|p| p.eq_ignore_ascii_case(property))
    }

    /// 检查是否为导航文档
    pub fn is_nav(&self) -> bool {
        self.has_property("nav")
    }

    /// 检查是否为NCX文件
    pub fn is_ncx(&self) -> bool {
        self.media_type.eq_ignore_ascii_case(NCX_MEDIA_TYPE)
    }

    /// 相对于给定目录解析href
    pub fn resolved_href(&self, base_dir: &str) -> String {
        path::resolve(base_dir, &self.href)
    }
}

/// OPF的manifest区域
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Manifest {
    items: Vec<ManifestItem>,
}

impl Manifest {
    /// 收集manifest元素下的所有item
    pub fn from_node(manifest_node: &Node) -> Self {
        Self {
            items: manifest_node
                .children_named("item")
                .map(ManifestItem::from_node)
                .collect(),
        }
    }

    pub fn items(&self) -> &[ManifestItem] {
        &self.items
    }

    pub fn iter(&self) -> impl Iterator<Item = &ManifestItem> {
        self.items.iter()
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// 根据ID获取清单项，ID重复时以最后一个为准
    pub fn item_by_id(&self, id: &str) -> Option<&ManifestItem> {
        self.items.iter().rev().find(|item| item.id == id)
    }

    /// 获取清单项的媒体类型
    pub fn media_type_by_id(&self, id: &str) -> Option<&str> {
        self.item_by_id(id)
            .map(|item| item.media_type.as_str())
            .filter(|media_type| !media_type.is_empty())
    }

    /// 构建 id → 解析后路径 的映射
    ///
    /// href相对于OPF文件所在目录解析；OPF位于根目录时直接使用href。
    /// id或href为空的清单项被跳过，ID重复时以最后一个为准。
    ///
    /// # 参数
    /// * `opf_path` - OPF文件在压缩包中的路径
    pub fn href_lookup(&self, opf_path: &str) -> HashMap<String, String> {
        let base_dir = path::dir(opf_path);
        self.items
            .iter()
            .filter(|item| !item.id.is_empty() && !item.href.is_empty())
            .map(|item| (item.id.clone(), item.resolved_href(&base_dir)))
            .collect()
    }
}
