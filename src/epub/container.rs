use crate::epub::config::ReaderConfig;
use crate::epub::error::{EpubError, Result};
use crate::epub::path;
use crate::epub::tree::parse_xml;
use serde::Serialize;

/// OPF包文件的媒体类型
pub const PACKAGE_MEDIA_TYPE: &str = "application/oebps-package+xml";

/// EPUB压缩包的媒体类型，部分书籍在rootfile中错误地使用它
pub const EPUB_MEDIA_TYPE: &str = "application/epub+zip";

/// Container.xml中的rootfile信息
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RootFile {
    pub full_path: String,
    pub media_type: String,
}

impl RootFile {
    /// 判断该rootfile是否可以作为OPF文件
    ///
    /// 媒体类型为空时视为可接受的默认值。
    fn is_package(&self) -> bool {
        let media_type = self.media_type.trim();
        media_type.is_empty()
            || media_type.eq_ignore_ascii_case(PACKAGE_MEDIA_TYPE)
            || media_type.eq_ignore_ascii_case(EPUB_MEDIA_TYPE)
    }
}

/// Container.xml的解析结果
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Container {
    pub rootfiles: Vec<RootFile>,
}

impl Container {
    /// 解析container.xml内容
    ///
    /// # 参数
    /// * `xml_content` - container.xml的文件内容
    ///
    /// # 返回值
    /// * `Result<Container, EpubError>` - 解析后的Container信息
    pub fn parse_xml(xml_content: &[u8]) -> Result<Container> {
        Self::parse_xml_with_config(xml_content, &ReaderConfig::default())
    }

    /// 使用指定配置解析container.xml内容
    pub fn parse_xml_with_config(xml_content: &[u8], config: &ReaderConfig) -> Result<Container> {
        let root = parse_xml(xml_content, config.max_depth)?;

        let rootfiles_node = root
            .find("rootfiles")
            .ok_or_else(|| EpubError::ContainerMalformed("没有找到rootfiles元素".to_string()))?;

        let rootfiles: Vec<RootFile> = rootfiles_node
            .children_named("rootfile")
            .map(|node| RootFile {
                full_path: node.attr("full-path").unwrap_or_default().trim().to_string(),
                media_type: node.attr("media-type").unwrap_or_default().trim().to_string(),
            })
            .collect();

        if rootfiles.is_empty() {
            return Err(EpubError::ContainerMalformed(
                "没有找到任何rootfile条目".to_string(),
            ));
        }

        Ok(Container { rootfiles })
    }

    /// 获取主要的OPF文件路径
    ///
    /// 返回第一个full-path非空、且媒体类型为OPF类型、EPUB类型或为空的rootfile。
    ///
    /// # 返回值
    /// * `Result<String>` - 规范化后的OPF文件完整路径
    pub fn find_opf_file(&self) -> Result<String> {
        self.rootfiles
            .iter()
            .filter(|rootfile| !rootfile.full_path.is_empty())
            .find(|rootfile| rootfile.is_package())
            .map(|rootfile| path::clean(&rootfile.full_path))
            .filter(|opf_path| !opf_path.is_empty())
            .ok_or(EpubError::NoRootFileFound)
    }
}
