pub mod epub;

// === 核心API重新导出 ===

/// 已解析的书籍（主要接口）
pub use epub::Book;

/// 错误处理
pub use epub::{EpubError, Result};

/// 读取配置
pub use epub::ReaderConfig;

// === 数据结构 ===

/// 章节内容
pub use epub::Chapter;

/// 目录
pub use epub::{TocFormat, TocLocation, TocNode, TocTreeStyle, TocTreeView};

// === 底层组件（高级用法） ===

/// 数据源
pub use epub::{ByteSource, MemorySource, ZipSource};

/// 容器组件
pub use epub::{Container, RootFile};

/// OPF组件
pub use epub::{
    Manifest,
    ManifestItem,
    MetaEntry,
    Metadata,
    MetadataView,
    PackageDocument,
    Spine,
    SpineItemRef,
};

/// 文档树
pub use epub::{Node, NodeKind};

// === 库信息 ===

/// Bookloom库的版本信息
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Bookloom库的描述
pub const DESCRIPTION: &str = "一个只读的EPUB2/EPUB3解析库";

// === 便捷函数 ===

/// 快速读取EPUB文件
///
/// 这是 `Book::from_path` 的便捷包装函数。
///
/// # 参数
/// * `path` - EPUB文件路径
///
/// # 返回值
/// * `Result<Book>` - 解析后的书籍
///
/// # 示例
///
/// ```no_run
/// let book = bookloom::read_book("book.epub")?;
/// println!("书名: {}", book.title()?);
/// # Ok::<(), Box<dyn std::error::Error>>(())
/// ```
pub fn read_book<P: AsRef<std::path::Path>>(path: P) -> Result<Book> {
    Book::from_path(path)
}
