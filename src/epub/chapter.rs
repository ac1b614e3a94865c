//! 章节模块
//!
//! 将单个章节的(X)HTML内容解码为有序的段落文本与图片引用。

use crate::epub::config::ReaderConfig;
use crate::epub::error::{EpubError, Result};
use crate::epub::path;
use crate::epub::tree::{Node, parse_html};
use serde::Serialize;

/// 章节内容
///
/// 构造后只读；需要修改时先用 [`Chapter::detached`] 取得独立的副本。
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Chapter {
    id: String,
    path: String,
    title: Option<String>,
    paragraphs: Vec<String>,
    images: Vec<String>,
}

impl Chapter {
    /// 解析章节内容
    ///
    /// # 参数
    /// * `id` - 章节在清单中的ID
    /// * `href` - 章节在压缩包中的路径（已解析）
    /// * `content` - 章节文件内容
    /// * `config` - 解析配置，决定哪些标签被视为段落
    ///
    /// # 返回值
    /// * `Result<Chapter>` - 解码失败时返回 `ChapterUnreadable`
    pub fn parse(id: &str, href: &str, content: &[u8], config: &ReaderConfig) -> Result<Chapter> {
        let root = parse_html(content, config.max_depth).map_err(|e| EpubError::ChapterUnreadable {
            id: id.to_string(),
            path: href.to_string(),
            source: Box::new(e),
        })?;
        Ok(Self::from_root(id, href, &root, config))
    }

    /// 从已解码的文档树构建章节
    pub fn from_root(id: &str, href: &str, root: &Node, config: &ReaderConfig) -> Chapter {
        let title = root
            .find("title")
            .map(Node::text)
            .filter(|title| !title.is_empty());

        // 章节片段可能没有body
        let body = root.find("body").unwrap_or(root);

        let mut paragraphs = Vec::new();
        collect_paragraphs(body, config, &mut paragraphs);

        let base_dir = path::dir(href);
        let images = body
            .find_all("img")
            .into_iter()
            .filter_map(|img| img.attr_trimmed("src"))
            .map(|src| {
                // 外部地址与data URI不是包内文件，原样保留
                if path::has_scheme(src) {
                    src.to_string()
                } else {
                    path::resolve(&base_dir, src)
                }
            })
            .collect();

        Chapter {
            id: id.to_string(),
            path: href.to_string(),
            title,
            paragraphs,
            images,
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    /// 章节在压缩包中的路径
    pub fn path(&self) -> &str {
        &self.path
    }

    pub fn title(&self) -> Option<&str> {
        self.title.as_deref()
    }

    pub fn paragraphs(&self) -> &[String] {
        &self.paragraphs
    }

    /// 图片路径，按文档顺序，保留重复项
    pub fn images(&self) -> &[String] {
        &self.images
    }

    pub fn has_images(&self) -> bool {
        !self.images.is_empty()
    }

    /// 章节的纯文本，段落之间以空行分隔
    pub fn text(&self) -> String {
        self.paragraphs.join("\n\n")
    }

    /// 返回可以自由修改的深拷贝
    pub fn detached(&self) -> Chapter {
        self.clone()
    }
}

/// 遍历子元素收集段落
///
/// 段落标签的整棵子树文本作为一个段落，不再向下查找；其他元素继续递归。
fn collect_paragraphs(node: &Node, config: &ReaderConfig, paragraphs: &mut Vec<String>) {
    for child in node.child_elements() {
        if config.is_paragraph_tag(child.name()) {
            let text = child.text();
            if !text.is_empty() {
                paragraphs.push(text);
            }
        } else {
            collect_paragraphs(child, config, paragraphs);
        }
    }
}
