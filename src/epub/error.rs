use std::io;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, EpubError>;

/// Epub相关的错误类型
#[derive(Error, Debug)]
pub enum EpubError {
    #[error("IO错误: {0}")]
    Io(#[from] io::Error),

    #[error("Zip文件错误: {0}")]
    Zip(#[from] zip::result::ZipError),

    #[error("结构解析错误: {0}")]
    StructuralParse(String),

    #[error("不支持的字符集: {0}")]
    UnsupportedCharset(String),

    #[error("文档嵌套过深: 超过 {limit} 层")]
    TooDeeplyNested { limit: usize },

    #[error("container.xml格式错误: {0}")]
    ContainerMalformed(String),

    #[error("container.xml中没有找到可用的rootfile")]
    NoRootFileFound,

    #[error("OPF文件缺少metadata元素")]
    MetadataSectionMissing,

    #[error("OPF文件缺少manifest元素")]
    ManifestSectionMissing,

    #[error("OPF文件缺少spine元素")]
    SpineSectionMissing,

    #[error("OPF文件格式错误: {}", join_errors(.0))]
    PackageMalformed(Vec<EpubError>),

    #[error("导航文档中没有找到toc类型的nav元素")]
    TocNavNotFound,

    #[error("toc导航元素中没有找到ol列表")]
    TocOlNotFound,

    #[error("NCX文件中没有找到navMap元素")]
    NavMapNotFound,

    #[error("无法读取章节 {id} ({path}): {source}")]
    ChapterUnreadable {
        id: String,
        path: String,
        #[source]
        source: Box<EpubError>,
    },

    #[error("元数据未定义: {0}")]
    MetadataUndefined(String),

    #[error("章节不存在: {0}")]
    ChapterNotFound(String),

    #[error("压缩包中缺少文件: {0}")]
    EntryMissing(String),

    #[error("{artifact} ({path}) 解析失败: {source}")]
    Artifact {
        artifact: &'static str,
        path: String,
        #[source]
        source: Box<EpubError>,
    },

    #[error("配置文件错误: {0}")]
    Config(String),
}

impl EpubError {
    /// 为错误附加所属文件的位置信息
    pub fn in_artifact(self, artifact: &'static str, path: impl Into<String>) -> Self {
        EpubError::Artifact {
            artifact,
            path: path.into(),
            source: Box::new(self),
        }
    }

    /// 去掉位置信息包装，返回最内层的错误
    pub fn root_cause(&self) -> &EpubError {
        match self {
            EpubError::Artifact { source, .. } => source.root_cause(),
            other => other,
        }
    }
}

impl From<quick_xml::Error> for EpubError {
    fn from(err: quick_xml::Error) -> Self {
        EpubError::StructuralParse(err.to_string())
    }
}

impl From<quick_xml::events::attributes::AttrError> for EpubError {
    fn from(err: quick_xml::events::attributes::AttrError) -> Self {
        EpubError::StructuralParse(format!("属性错误: {}", err))
    }
}

fn join_errors(errors: &[EpubError]) -> String {
    errors
        .iter()
        .map(|e| e.to_string())
        .collect::<Vec<_>>()
        .join("; ")
}
