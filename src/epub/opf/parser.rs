//! OPF解析器模块
//!
//! 提供OPF（Open Packaging Format）文件的解析功能。文档树只解码一次，
//! 元数据、清单、脊柱三部分各自独立推导，一部分缺失不会影响对其他部分的报告。

use crate::epub::config::ReaderConfig;
use crate::epub::error::{EpubError, Result};
use crate::epub::opf::{Manifest, ManifestItem, Metadata, Spine};
use crate::epub::path;
use crate::epub::toc::{TocFormat, TocLocation};
use crate::epub::tree::{Node, parse_xml};
use tracing::debug;

/// OPF文件解析结果
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PackageDocument {
    root: Node,
    metadata: Metadata,
    manifest: Manifest,
    spine: Spine,
}

impl PackageDocument {
    /// 解析OPF文件内容
    ///
    /// # 参数
    /// * `xml_content` - OPF文件的XML内容
    ///
    /// # 返回值
    /// * `Result<PackageDocument, EpubError>` - 解析后的OPF信息
    pub fn parse_xml(xml_content: &[u8]) -> Result<PackageDocument> {
        Self::parse_xml_with_config(xml_content, &ReaderConfig::default())
    }

    /// 使用指定的配置解析OPF文件内容
    pub fn parse_xml_with_config(xml_content: &[u8], config: &ReaderConfig) -> Result<PackageDocument> {
        let root = parse_xml(xml_content, config.max_depth)?;
        Self::from_root(root)
    }

    /// 从已解码的文档树推导三个区域
    pub fn from_root(root: Node) -> Result<PackageDocument> {
        let metadata = Self::parse_metadata(&root);
        let manifest = Self::parse_manifest(&root);
        let spine = Self::parse_spine(&root);

        match (metadata, manifest, spine) {
            (Ok(metadata), Ok(manifest), Ok(spine)) => Ok(PackageDocument {
                root,
                metadata,
                manifest,
                spine,
            }),
            (metadata, manifest, spine) => {
                let mut errors: Vec<EpubError> = [metadata.err(), manifest.err(), spine.err()]
                    .into_iter()
                    .flatten()
                    .collect();
                if errors.len() == 1 {
                    Err(errors.remove(0))
                } else {
                    Err(EpubError::PackageMalformed(errors))
                }
            }
        }
    }

    /// 解析metadata区域
    pub fn parse_metadata(root: &Node) -> Result<Metadata> {
        root.find("metadata")
            .map(Metadata::from_node)
            .ok_or(EpubError::MetadataSectionMissing)
    }

    /// 解析manifest区域
    pub fn parse_manifest(root: &Node) -> Result<Manifest> {
        root.find("manifest")
            .map(Manifest::from_node)
            .ok_or(EpubError::ManifestSectionMissing)
    }

    /// 解析spine区域
    pub fn parse_spine(root: &Node) -> Result<Spine> {
        root.find("spine")
            .map(Spine::from_node)
            .ok_or(EpubError::SpineSectionMissing)
    }

    /// 解码后的文档树
    pub fn root(&self) -> &Node {
        &self.root
    }

    pub fn metadata(&self) -> &Metadata {
        &self.metadata
    }

    pub fn manifest(&self) -> &Manifest {
        &self.manifest
    }

    pub fn spine(&self) -> &Spine {
        &self.spine
    }

    /// package元素的version属性
    pub fn version(&self) -> Option<&str> {
        self.root.attr_trimmed("version")
    }

    /// 获取所有章节文件的路径(按阅读顺序)
    ///
    /// 无法在清单中找到的idref被跳过。
    pub fn chapter_paths(&self, opf_path: &str) -> Vec<String> {
        let lookup = self.manifest.href_lookup(opf_path);
        self.spine
            .extract_chapter_ids()
            .iter()
            .filter_map(|id| lookup.get(id).cloned())
            .collect()
    }

    /// 查找目录文件
    ///
    /// 按优先级依次尝试：
    /// 1. EPUB3：properties包含nav的清单项
    /// 2. EPUB2：spine的toc属性指向的清单项
    /// 3. EPUB2：媒体类型为NCX的清单项
    ///
    /// 都找不到时返回 `None`，表示这本书没有目录。
    pub fn find_toc_file(&self, opf_path: &str) -> Option<TocLocation> {
        let base_dir = path::dir(opf_path);
        let located = |format: TocFormat, href: &str| TocLocation {
            format,
            path: path::resolve(&base_dir, href),
        };
        let with_href = |item: &&ManifestItem| !item.href.is_empty();

        if let Some(item) = self.manifest.iter().filter(with_href).find(|item| item.is_nav()) {
            debug!(href = %item.href, "使用EPUB3导航文档作为目录");
            return Some(located(TocFormat::Epub3, &item.href));
        }

        if let Some(toc_id) = self.spine.toc() {
            // 重复ID以最后一个为准，与href_lookup一致
            if let Some(item) = self.manifest.item_by_id(toc_id).filter(with_href) {
                debug!(href = %item.href, "使用spine toc属性指向的NCX作为目录");
                return Some(located(TocFormat::Epub2, &item.href));
            }
        }

        self.manifest
            .iter()
            .filter(with_href)
            .find(|item| item.is_ncx())
            .map(|item| {
                debug!(href = %item.href, "按媒体类型找到NCX目录");
                located(TocFormat::Epub2, &item.href)
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn package(manifest: &str, spine: &str) -> PackageDocument {
        let xml = format!(
            r#"<?xml version="1.0" encoding="UTF-8"?>
<package xmlns="http://www.idpf.org/2007/opf" version="3.0">
<metadata xmlns:dc="http://purl.org/dc/elements/1.1/"><dc:title>Sample Book</dc:title></metadata>
<manifest>{}</manifest>
{}
</package>"#,
            manifest, spine
        );
        PackageDocument::parse_xml(xml.as_bytes()).expect("解析OPF失败")
    }

    #[test]
    fn test_basic_opf_structure() {
        let opf = package(
            r#"<item id="item1" href="chapter1.xhtml" media-type="application/xhtml+xml"/>"#,
            r#"<spine><itemref idref="item1"/></spine>"#,
        );
        assert_eq!(opf.version(), Some("3.0"));
        assert_eq!(opf.metadata().first("title"), Some("Sample Book".to_string()));
        assert_eq!(opf.manifest().len(), 1);
        assert_eq!(opf.spine().len(), 1);
        assert!(opf.root().is_named("package"));
    }

    #[test]
    fn test_find_toc_file_epub3() {
        let opf = package(
            r#"<item id="nav" href="nav.xhtml" media-type="application/xhtml+xml" properties="nav"/>"#,
            r#"<spine/>"#,
        );
        let toc = opf.find_toc_file("OEBPS/content.opf").unwrap();
        assert_eq!(toc.format, TocFormat::Epub3);
        assert_eq!(toc.format.to_string(), "EPUB3");
        assert_eq!(toc.path, "OEBPS/nav.xhtml");
    }

    #[test]
    fn test_find_toc_file_prefers_nav_over_spine_toc() {
        let opf = package(
            r#"<item id="ncx" href="toc.ncx" media-type="application/x-dtbncx+xml"/>
               <item id="nav" href="nav.xhtml" media-type="application/xhtml+xml" properties="Nav"/>"#,
            r#"<spine toc="ncx"/>"#,
        );
        let toc = opf.find_toc_file("content.opf").unwrap();
        assert_eq!(toc.format, TocFormat::Epub3);
        assert_eq!(toc.path, "nav.xhtml");
    }

    #[test]
    fn test_find_toc_file_spine_toc() {
        let opf = package(
            r#"<item id="other" href="other.ncx" media-type="application/x-dtbncx+xml"/>
               <item id="toc" href="text/../toc.ncx" media-type="text/xml"/>"#,
            r#"<spine toc="toc"/>"#,
        );
        let toc = opf.find_toc_file("OEBPS/content.opf").unwrap();
        assert_eq!(toc.format, TocFormat::Epub2);
        assert_eq!(toc.path, "OEBPS/toc.ncx");
    }

    #[test]
    fn test_find_toc_file_spine_toc_duplicate_id_last_wins() {
        let opf = package(
            r#"<item id="toc" href="old.ncx" media-type="application/x-dtbncx+xml"/>
               <item id="toc" href="new.ncx" media-type="application/x-dtbncx+xml"/>"#,
            r#"<spine TOC="toc"/>"#,
        );
        let toc = opf.find_toc_file("OEBPS/content.opf").unwrap();
        assert_eq!(toc.format, TocFormat::Epub2);
        assert_eq!(toc.path, "OEBPS/new.ncx");
        assert_eq!(opf.manifest().item_by_id("toc").map(|item| item.href.as_str()), Some("new.ncx"));
    }

    #[test]
    fn test_find_toc_file_media_type_fallback() {
        let opf = package(
            r#"<item id="x" href="toc.ncx" media-type="APPLICATION/X-DTBNCX+XML"/>"#,
            r#"<spine toc="missing"/>"#,
        );
        let toc = opf.find_toc_file("OEBPS/content.opf").unwrap();
        assert_eq!(toc.format, TocFormat::Epub2);
        assert_eq!(toc.path, "OEBPS/toc.ncx");
    }

    #[test]
    fn test_find_toc_file_none() {
        let opf = package(
            r#"<item id="ch1" href="ch1.xhtml" media-type="application/xhtml+xml"/>"#,
            r#"<spine/>"#,
        );
        assert!(opf.find_toc_file("OEBPS/content.opf").is_none());
    }

    #[test]
    fn test_chapter_paths_skip_dangling_and_non_linear() {
        let opf = package(
            r#"<item id="ch1" href="text/ch1.xhtml" media-type="application/xhtml+xml"/>
               <item id="ch2" href="text/ch2.xhtml" media-type="application/xhtml+xml"/>"#,
            r#"<spine><itemref idref="ch1"/><itemref idref="ghost"/><itemref idref="ch2" linear="no"/></spine>"#,
        );
        assert_eq!(opf.chapter_paths("OEBPS/content.opf"), vec!["OEBPS/text/ch1.xhtml"]);
    }

    #[test]
    fn test_single_missing_section() {
        let xml = r#"<package><metadata/><manifest/></package>"#;
        assert!(matches!(
            PackageDocument::parse_xml(xml.as_bytes()),
            Err(EpubError::SpineSectionMissing)
        ));
    }

    #[test]
    fn test_every_missing_section_is_reported() {
        let xml = r#"<package><manifest/></package>"#;
        match PackageDocument::parse_xml(xml.as_bytes()) {
            Err(EpubError::PackageMalformed(errors)) => {
                assert_eq!(errors.len(), 2);
                assert!(matches!(errors[0], EpubError::MetadataSectionMissing));
                assert!(matches!(errors[1], EpubError::SpineSectionMissing));
            }
            other => panic!("期望PackageMalformed错误, 实际: {:?}", other),
        }
    }
}
