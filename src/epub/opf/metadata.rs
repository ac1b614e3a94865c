//! 元数据模块
//!
//! OPF的metadata区域按 命名空间 → 标签名 → 条目列表 的两级有序结构保存，
//! 重复出现的标签（例如多个subject）保持文档顺序。在此之上提供两种视图：
//! 只包含Dublin Core元素的标准视图，以及包含扩展meta的完整视图。

use crate::epub::error::{EpubError, Result};
use crate::epub::tree::{Attributes, Node, lookup_attr};
use serde::ser::{Serialize, Serializer};
use tracing::warn;

/// 15个Dublin Core元素名，按字母顺序排列
pub const DUBLIN_CORE_ELEMENTS: [&str; 15] = [
    "contributor",
    "coverage",
    "creator",
    "date",
    "description",
    "format",
    "identifier",
    "language",
    "publisher",
    "relation",
    "rights",
    "source",
    "subject",
    "title",
    "type",
];

/// 判断标签是否为Dublin Core元素（忽略大小写）
pub fn is_dublin_core(tag: &str) -> bool {
    let tag = tag.to_ascii_lowercase();
    DUBLIN_CORE_ELEMENTS.binary_search(&tag.as_str()).is_ok()
}

/// 一个元数据元素
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize)]
pub struct MetaEntry {
    /// 元素的文本内容（已去除首尾空白）
    pub value: String,
    /// 元素的全部属性（refines、property、scheme、id等）
    pub attrs: Attributes,
}

impl MetaEntry {
    /// 按名称查找属性（忽略大小写）
    pub fn attr(&self, name: &str) -> Option<&str> {
        lookup_attr(&self.attrs, name)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct TagGroup {
    tag: String,
    entries: Vec<MetaEntry>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct NamespaceGroup {
    namespace: String,
    tags: Vec<TagGroup>,
}

/// 元数据：命名空间 → 标签 → 有序条目
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Metadata {
    namespaces: Vec<NamespaceGroup>,
}

impl Metadata {
    pub fn new() -> Self {
        Self::default()
    }

    /// 从metadata元素构建元数据
    ///
    /// 未限定命名空间的子元素继承metadata元素自身的命名空间。
    /// 标签名或命名空间不合法的子元素会被丢弃。
    pub fn from_node(metadata_node: &Node) -> Self {
        let default_namespace = metadata_node.namespace();
        let mut metadata = Metadata::new();

        for child in metadata_node.child_elements() {
            let namespace = if child.namespace().is_empty() {
                default_namespace
            } else {
                child.namespace()
            };

            if !is_well_formed(child.name()) || namespace.chars().any(char::is_whitespace) {
                warn!(tag = child.name(), namespace, "丢弃不合法的元数据元素");
                continue;
            }

            metadata.push(
                namespace,
                child.name(),
                MetaEntry {
                    value: child.text(),
                    attrs: child.attrs().clone(),
                },
            );
        }

        metadata
    }

    /// 追加一个条目，保持插入顺序
    pub fn push(&mut self, namespace: &str, tag: &str, entry: MetaEntry) {
        let group_index = match self
            .namespaces
            .iter()
            .position(|group| group.namespace == namespace)
        {
            Some(index) => index,
            None => {
                self.namespaces.push(NamespaceGroup {
                    namespace: namespace.to_string(),
                    tags: Vec::new(),
                });
                self.namespaces.len() - 1
            }
        };

        let tags = &mut self.namespaces[group_index].tags;
        match tags.iter_mut().find(|group| group.tag == tag) {
            Some(group) => group.entries.push(entry),
            None => tags.push(TagGroup {
                tag: tag.to_string(),
                entries: vec![entry],
            }),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.namespaces.is_empty()
    }

    /// 所有命名空间，按首次出现的顺序
    pub fn namespaces(&self) -> impl Iterator<Item = &str> {
        self.namespaces.iter().map(|group| group.namespace.as_str())
    }

    /// 指定命名空间与标签下的条目
    pub fn entries(&self, namespace: &str, tag: &str) -> &[MetaEntry] {
        self.namespaces
            .iter()
            .find(|group| group.namespace == namespace)
            .and_then(|group| group.tags.iter().find(|t| t.tag == tag))
            .map(|group| group.entries.as_slice())
            .unwrap_or_default()
    }

    /// 按 (命名空间, 标签, 条目) 遍历全部元数据
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str, &MetaEntry)> {
        self.namespaces.iter().flat_map(|ns| {
            ns.tags.iter().flat_map(move |tag| {
                tag.entries
                    .iter()
                    .map(move |entry| (ns.namespace.as_str(), tag.tag.as_str(), entry))
            })
        })
    }

    /// 返回包含扩展meta在内的全部元数据
    ///
    /// 条目文本为空时使用content属性，二者都为空的条目被跳过。
    /// `meta` 标签的键为 `meta:<name>` 或 `meta:<property>`。
    pub fn get_all(&self) -> MetadataView {
        let mut view = MetadataView::default();
        for (_, tag, entry) in self.iter() {
            let value = if entry.value.is_empty() {
                entry.attr("content").unwrap_or_default()
            } else {
                entry.value.as_str()
            };
            if value.is_empty() {
                continue;
            }

            let key = if tag == "meta" {
                match (entry.attr("name"), entry.attr("property")) {
                    (Some(name), _) if !name.is_empty() => format!("meta:{}", name),
                    (_, Some(property)) if !property.is_empty() => format!("meta:{}", property),
                    _ => tag.to_string(),
                }
            } else {
                tag.to_string()
            };
            view.push(key, value.to_string());
        }
        view
    }

    /// 返回只包含Dublin Core元素的标准视图，键为小写的元素名
    pub fn normalize(&self) -> MetadataView {
        let mut view = MetadataView::default();
        for (_, tag, entry) in self.iter() {
            if !is_dublin_core(tag) {
                continue;
            }
            let value = entry.value.trim();
            if !value.is_empty() {
                view.push(tag.to_ascii_lowercase(), value.to_string());
            }
        }
        view
    }

    /// 获取某个Dublin Core元素的全部值，非Dublin Core键返回空列表
    pub fn get(&self, key: &str) -> Vec<String> {
        let key = key.trim().to_ascii_lowercase();
        if !is_dublin_core(&key) {
            return Vec::new();
        }
        self.normalize()
            .get(&key)
            .map(<[String]>::to_vec)
            .unwrap_or_default()
    }

    /// 获取某个Dublin Core元素的第一个值
    pub fn first(&self, key: &str) -> Option<String> {
        self.get(key).into_iter().next()
    }

    /// 获取某个Dublin Core元素的全部值，未定义时返回 `MetadataUndefined`
    pub fn values(&self, key: &str) -> Result<Vec<String>> {
        let values = self.get(key);
        if values.is_empty() {
            return Err(EpubError::MetadataUndefined(key.trim().to_ascii_lowercase()));
        }
        Ok(values)
    }

    /// 获取某个Dublin Core元素的第一个值，未定义时返回 `MetadataUndefined`
    pub fn value(&self, key: &str) -> Result<String> {
        self.values(key).map(|mut values| values.swap_remove(0))
    }
}

fn is_well_formed(tag: &str) -> bool {
    !tag.is_empty() && !tag.chars().any(char::is_whitespace)
}

/// 键 → 值列表 的有序视图，键按首次出现的顺序排列
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MetadataView {
    entries: Vec<(String, Vec<String>)>,
}

impl MetadataView {
    fn push(&mut self, key: String, value: String) {
        match self.entries.iter_mut().find(|(k, _)| *k == key) {
            Some((_, values)) => values.push(value),
            None => self.entries.push((key, vec![value])),
        }
    }

    pub fn get(&self, key: &str) -> Option<&[String]> {
        self.entries
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, values)| values.as_slice())
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.get(key).is_some()
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(key, _)| key.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &[String])> {
        self.entries
            .iter()
            .map(|(key, values)| (key.as_str(), values.as_slice()))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl Serialize for MetadataView {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.collect_map(self.iter())
    }
}
