pub mod archive;
pub mod book;
pub mod chapter;
pub mod config;
pub mod container;
pub mod error;
pub mod opf;
pub mod path;
pub mod toc;
pub mod tree;

// 重新导出错误处理
pub use error::{EpubError, Result};

// 重新导出读取入口
pub use archive::{ByteSource, MemorySource, ZipSource};
pub use book::Book;
pub use chapter::Chapter;
pub use config::ReaderConfig;

// 重新导出容器相关
pub use container::{Container, RootFile};

// 重新导出OPF相关
pub use opf::{
    Manifest,
    ManifestItem,
    MetaEntry,
    Metadata,
    MetadataView,
    PackageDocument,
    Spine,
    SpineItemRef,
};

// 重新导出目录相关
pub use toc::{TocFormat, TocLocation, TocNode, TocTreeStyle, TocTreeView, parse_toc};

// 重新导出文档树
pub use tree::{Node, NodeKind};
