//! 书籍模块
//!
//! [`Book`] 汇总container、OPF、目录和按阅读顺序排列的章节，由读取操作一次性构建，
//! 之后只提供只读访问。

use crate::epub::archive::{ByteSource, ZipSource};
use crate::epub::chapter::Chapter;
use crate::epub::config::ReaderConfig;
use crate::epub::container::Container;
use crate::epub::error::{EpubError, Result};
use crate::epub::opf::{MetadataView, PackageDocument};
use crate::epub::toc::{TocLocation, TocNode, parse_toc};
use std::path::Path;
use tracing::{debug, info};

/// 一本已解析的EPUB书籍
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Book {
    container: Container,
    package: PackageDocument,
    opf_path: String,
    toc_location: Option<TocLocation>,
    toc: Option<TocNode>,
    chapters: Vec<Chapter>,
}

impl Book {
    /// 从文件路径读取EPUB
    ///
    /// # 参数
    /// * `path` - epub文件的路径
    ///
    /// # 返回值
    /// * `Result<Book, EpubError>` - 成功返回Book实例，失败返回错误
    pub fn from_path<P: AsRef<Path>>(path: P) -> Result<Book> {
        Self::from_path_with_config(path, &ReaderConfig::default())
    }

    /// 使用指定的配置从文件路径读取EPUB
    pub fn from_path_with_config<P: AsRef<Path>>(path: P, config: &ReaderConfig) -> Result<Book> {
        let path = path.as_ref();
        debug!(path = %path.display(), "打开EPUB文件");
        let mut source = ZipSource::open(path)?;
        Self::from_source(&mut source, config)
    }

    /// 从任意数据源读取EPUB
    ///
    /// 读取顺序：
    /// 1. container.xml，定位OPF文件
    /// 2. OPF文件，解析元数据、清单、脊柱
    /// 3. 按阅读顺序解析章节，缺失的条目和无法解析的ID被跳过
    /// 4. 目录（如果存在）
    pub fn from_source<S: ByteSource + ?Sized>(source: &mut S, config: &ReaderConfig) -> Result<Book> {
        let container_path = config.container_path.as_str();
        let container = source
            .read(container_path)
            .and_then(|content| Container::parse_xml_with_config(&content, config))
            .map_err(|e| e.in_artifact("container", container_path))?;

        let opf_path = container
            .find_opf_file()
            .map_err(|e| e.in_artifact("container", container_path))?;
        debug!(opf_path = %opf_path, "找到OPF文件");

        let package = source
            .read(&opf_path)
            .and_then(|content| PackageDocument::parse_xml_with_config(&content, config))
            .map_err(|e| e.in_artifact("OPF", &opf_path))?;

        let chapters = Self::read_chapters(source, &package, &opf_path, config)?;

        let toc_location = package.find_toc_file(&opf_path);
        let toc = match &toc_location {
            Some(location) => {
                let nodes = source
                    .read(&location.path)
                    .and_then(|content| parse_toc(location, &content, config))
                    .map_err(|e| e.in_artifact("TOC", &location.path))?;
                debug!(format = %location.format, path = %location.path, entries = nodes.len(), "解析目录完成");
                Some(TocNode::root(nodes))
            }
            None => {
                debug!("没有找到目录文件");
                None
            }
        };

        info!(
            opf_path = %opf_path,
            chapters = chapters.len(),
            has_toc = toc.is_some(),
            "EPUB读取完成"
        );

        Ok(Book {
            container,
            package,
            opf_path,
            toc_location,
            toc,
            chapters,
        })
    }

    fn read_chapters<S: ByteSource + ?Sized>(
        source: &mut S,
        package: &PackageDocument,
        opf_path: &str,
        config: &ReaderConfig,
    ) -> Result<Vec<Chapter>> {
        let lookup = package.manifest().href_lookup(opf_path);
        let mut chapters = Vec::new();

        for id in package.spine().extract_chapter_ids() {
            let Some(href) = lookup.get(&id) else {
                debug!(id = %id, "脊柱引用的ID不在清单中，跳过");
                continue;
            };

            let content = match source.read(href) {
                Ok(content) => content,
                Err(EpubError::EntryMissing(_)) => {
                    debug!(id = %id, path = %href, "章节文件不存在，跳过");
                    continue;
                }
                Err(e) => {
                    return Err(EpubError::ChapterUnreadable {
                        id,
                        path: href.clone(),
                        source: Box::new(e),
                    });
                }
            };

            chapters.push(Chapter::parse(&id, href, &content, config)?);
        }

        Ok(chapters)
    }

    pub fn container(&self) -> &Container {
        &self.container
    }

    pub fn package(&self) -> &PackageDocument {
        &self.package
    }

    /// OPF文件在压缩包中的路径
    pub fn opf_path(&self) -> &str {
        &self.opf_path
    }

    /// 目录文件的格式与位置，没有目录时为 `None`
    pub fn toc_location(&self) -> Option<&TocLocation> {
        self.toc_location.as_ref()
    }

    /// 目录树（合成根节点），没有目录时为 `None`
    pub fn toc(&self) -> Option<&TocNode> {
        self.toc.as_ref()
    }

    pub fn chapters(&self) -> &[Chapter] {
        &self.chapters
    }

    /// 获取某个Dublin Core元素的全部值
    ///
    /// # 参数
    /// * `key` - 元素名，忽略大小写与首尾空白
    ///
    /// # 返回值
    /// * `Result<Vec<String>>` - 元素缺失或为空时返回 `MetadataUndefined`
    pub fn metadata_values(&self, key: &str) -> Result<Vec<String>> {
        self.package.metadata().values(key)
    }

    /// 获取某个Dublin Core元素的第一个值
    pub fn metadata_value(&self, key: &str) -> Result<String> {
        self.package.metadata().value(key)
    }

    pub fn title(&self) -> Result<String> {
        self.metadata_value("title")
    }

    pub fn creator(&self) -> Result<String> {
        self.metadata_value("creator")
    }

    pub fn subject(&self) -> Result<String> {
        self.metadata_value("subject")
    }

    pub fn description(&self) -> Result<String> {
        self.metadata_value("description")
    }

    pub fn publisher(&self) -> Result<String> {
        self.metadata_value("publisher")
    }

    pub fn contributor(&self) -> Result<String> {
        self.metadata_value("contributor")
    }

    pub fn date(&self) -> Result<String> {
        self.metadata_value("date")
    }

    pub fn r#type(&self) -> Result<String> {
        self.metadata_value("type")
    }

    pub fn format(&self) -> Result<String> {
        self.metadata_value("format")
    }

    pub fn identifier(&self) -> Result<String> {
        self.metadata_value("identifier")
    }

    pub fn language(&self) -> Result<String> {
        self.metadata_value("language")
    }

    pub fn source(&self) -> Result<String> {
        self.metadata_value("source")
    }

    pub fn relation(&self) -> Result<String> {
        self.metadata_value("relation")
    }

    pub fn coverage(&self) -> Result<String> {
        self.metadata_value("coverage")
    }

    pub fn rights(&self) -> Result<String> {
        self.metadata_value("rights")
    }

    /// 包含扩展meta在内的全部元数据
    pub fn all_metadata(&self) -> MetadataView {
        self.package.metadata().get_all()
    }

    pub fn chapter_count(&self) -> usize {
        self.chapters.len()
    }

    /// 根据清单ID获取章节
    pub fn chapter_by_id(&self, id: &str) -> Result<&Chapter> {
        self.chapters
            .iter()
            .find(|chapter| chapter.id() == id)
            .ok_or_else(|| EpubError::ChapterNotFound(id.to_string()))
    }

    /// 根据阅读顺序中的位置（从0开始）获取章节
    pub fn chapter_by_index(&self, index: usize) -> Result<&Chapter> {
        self.chapters
            .get(index)
            .ok_or_else(|| EpubError::ChapterNotFound(format!("索引 {}", index)))
    }

    pub fn chapter_text_by_id(&self, id: &str) -> Result<String> {
        self.chapter_by_id(id).map(Chapter::text)
    }

    pub fn chapter_text_by_index(&self, index: usize) -> Result<String> {
        self.chapter_by_index(index).map(Chapter::text)
    }

    /// 按阅读顺序连接所有章节的文本，空章节被跳过
    pub fn all_chapters_text(&self) -> String {
        self.chapters
            .iter()
            .map(Chapter::text)
            .filter(|text| !text.is_empty())
            .collect::<Vec<_>>()
            .join("\n\n")
    }

    /// 目录的线性视图，不包含合成根节点
    pub fn flatten_toc(&self) -> Vec<&TocNode> {
        self.toc.as_ref().map(TocNode::flatten).unwrap_or_default()
    }

    /// 根据路径查找目录条目
    pub fn find_toc_by_href(&self, href: &str) -> Option<&TocNode> {
        self.toc.as_ref().and_then(|toc| toc.find_by_href(href))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::epub::archive::MemorySource;
    use crate::epub::toc::TocFormat;

    const CONTAINER: &str = r#"<?xml version="1.0"?>
<container version="1.0" xmlns="urn:oasis:names:tc:opendocument:xmlns:container">
  <rootfiles>
    <rootfile full-path="OEBPS/content.opf" media-type="application/oebps-package+xml"/>
  </rootfiles>
</container>"#;

    const OPF: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<package xmlns="http://www.idpf.org/2007/opf" version="2.0">
  <metadata xmlns:dc="http://purl.org/dc/elements/1.1/">
    <dc:title>Sample Book</dc:title>
    <dc:creator>Jane Doe</dc:creator>
    <dc:creator>John Roe</dc:creator>
    <meta name="cover" content="cover-image"/>
  </metadata>
  <manifest>
    <item id="ncx" href="toc.ncx" media-type="application/x-dtbncx+xml"/>
    <item id="ch1" href="text/ch1.xhtml" media-type="application/xhtml+xml"/>
    <item id="ch2" href="text/ch2.xhtml" media-type="application/xhtml+xml"/>
    <item id="gone" href="text/gone.xhtml" media-type="application/xhtml+xml"/>
  </manifest>
  <spine toc="ncx">
    <itemref idref="ch1"/>
    <itemref idref="ghost"/>
    <itemref idref="gone"/>
    <itemref idref="ch2"/>
  </spine>
</package>"#;

    const NCX: &str = r#"<ncx><navMap>
  <navPoint><navLabel><text>Chapter 1</text></navLabel><content src="text/ch1.xhtml"/></navPoint>
  <navPoint><navLabel><text>Chapter 2</text></navLabel><content src="text/ch2.xhtml"/></navPoint>
</navMap></ncx>"#;

    fn sample_source() -> MemorySource {
        MemorySource::new()
            .with_entry("mimetype", "application/epub+zip")
            .with_entry("META-INF/container.xml", CONTAINER)
            .with_entry("OEBPS/content.opf", OPF)
            .with_entry("OEBPS/toc.ncx", NCX)
            .with_entry("OEBPS/text/ch1.xhtml", "<html><head><title>One</title></head><body><p>Hello</p></body></html>")
            .with_entry("OEBPS/text/ch2.xhtml", "<html><body><p>World</p></body></html>")
    }

    fn read(source: &mut MemorySource) -> Result<Book> {
        Book::from_source(source, &ReaderConfig::default())
    }

    #[test]
    fn test_read_book() {
        let book = read(&mut sample_source()).unwrap();
        assert_eq!(book.opf_path(), "OEBPS/content.opf");
        assert_eq!(book.title().unwrap(), "Sample Book");
        assert_eq!(book.creator().unwrap(), "Jane Doe");
        assert_eq!(book.metadata_values("Creator").unwrap(), vec!["Jane Doe", "John Roe"]);
        assert_eq!(book.all_metadata().get("meta:cover").unwrap(), ["cover-image"]);

        assert_eq!(book.chapter_count(), 2);
        assert_eq!(book.chapter_by_index(0).unwrap().title(), Some("One"));
        assert_eq!(book.chapter_text_by_id("ch2").unwrap(), "World");
        assert_eq!(book.all_chapters_text(), "Hello\n\nWorld");

        assert_eq!(book.toc_location().unwrap().format, TocFormat::Epub2);
        let titles: Vec<&str> = book.flatten_toc().iter().map(|n| n.title.as_str()).collect();
        assert_eq!(titles, vec!["Chapter 1", "Chapter 2"]);
        assert_eq!(book.find_toc_by_href("OEBPS/text/ch2.xhtml").unwrap().title, "Chapter 2");
    }

    #[test]
    fn test_missing_metadata() {
        let book = read(&mut sample_source()).unwrap();
        assert!(matches!(book.publisher(), Err(EpubError::MetadataUndefined(key)) if key == "publisher"));
        assert!(matches!(book.metadata_value(""), Err(EpubError::MetadataUndefined(key)) if key.is_empty()));
    }

    #[test]
    fn test_chapter_not_found() {
        let book = read(&mut sample_source()).unwrap();
        assert!(matches!(book.chapter_by_id("gone"), Err(EpubError::ChapterNotFound(_))));
        assert!(matches!(book.chapter_by_index(2), Err(EpubError::ChapterNotFound(_))));
    }

    #[test]
    fn test_missing_container() {
        let mut source = MemorySource::new().with_entry("mimetype", "application/epub+zip");
        let err = read(&mut source).unwrap_err();
        assert!(matches!(err, EpubError::Artifact { artifact: "container", .. }));
        assert!(matches!(err.root_cause(), EpubError::EntryMissing(_)));
    }

    #[test]
    fn test_missing_package_entry() {
        let mut source = MemorySource::new().with_entry("META-INF/container.xml", CONTAINER);
        let err = read(&mut source).unwrap_err();
        assert!(matches!(err, EpubError::Artifact { artifact: "OPF", .. }));
        assert!(matches!(err.root_cause(), EpubError::EntryMissing(path) if path == "OEBPS/content.opf"));
    }

    #[test]
    fn test_declared_toc_missing_is_fatal() {
        let mut source = sample_source();
        source.insert("OEBPS/toc.ncx", "<ncx><docTitle/></ncx>");
        let err = read(&mut source).unwrap_err();
        assert!(matches!(err.root_cause(), EpubError::NavMapNotFound));
    }

    #[test]
    fn test_chapter_failure_reported_before_toc_failure() {
        let mut source = sample_source();
        source.insert("OEBPS/toc.ncx", "<ncx/>");
        source.insert("OEBPS/text/ch2.xhtml", b"<p>\xff</p>".to_vec());
        let err = read(&mut source).unwrap_err();
        assert!(matches!(err, EpubError::ChapterUnreadable { ref id, .. } if id == "ch2"));
    }

    #[test]
    fn test_custom_container_path() {
        let mut source = sample_source();
        source.insert("META-INF/other.xml", CONTAINER);
        let config = ReaderConfig {
            container_path: "META-INF/other.xml".to_string(),
            ..ReaderConfig::default()
        };
        let book = Book::from_source(&mut source, &config).unwrap();
        assert_eq!(book.container().rootfiles.len(), 1);
    }

    #[test]
    fn test_read_is_deterministic() {
        let first = read(&mut sample_source()).unwrap();
        let second = read(&mut sample_source()).unwrap();
        assert_eq!(first, second);
    }
}
