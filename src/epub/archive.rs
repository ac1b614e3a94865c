//! 压缩包访问
//!
//! 解析流程只需要"按名称读取条目"的能力，这里用 [`ByteSource`] 抽象出来，
//! 既可以是磁盘上的ZIP文件，也可以是内存中的条目集合。

use crate::epub::error::{EpubError, Result};
use std::collections::BTreeMap;
use std::fs::File;
use std::io::{BufReader, Read, Seek};
use std::path::Path;
use zip::ZipArchive;
use zip::result::ZipError;

/// 按名称提供条目内容的数据源
pub trait ByteSource {
    /// 列出所有条目名称
    fn entry_names(&self) -> Vec<String>;

    /// 读取指定条目的全部内容
    ///
    /// 条目不存在时返回 `EntryMissing`。
    fn read(&mut self, name: &str) -> Result<Vec<u8>>;

    /// 检查条目是否存在
    fn contains(&self, name: &str) -> bool {
        self.entry_names().iter().any(|entry| entry == name)
    }
}

/// 基于ZIP压缩包的数据源
pub struct ZipSource<R: Read + Seek> {
    archive: ZipArchive<R>,
}

impl ZipSource<BufReader<File>> {
    /// 打开磁盘上的EPUB文件
    ///
    /// # 参数
    /// * `path` - epub文件的路径
    ///
    /// # 返回值
    /// * `Result<ZipSource>` - 成功返回数据源，失败返回IO或ZIP错误
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let file = File::open(path)?;
        Self::new(BufReader::new(file))
    }
}

impl<R: Read + Seek> ZipSource<R> {
    pub fn new(reader: R) -> Result<Self> {
        let archive = ZipArchive::new(reader)?;
        Ok(Self { archive })
    }

    pub fn len(&self) -> usize {
        self.archive.len()
    }

    pub fn is_empty(&self) -> bool {
        self.archive.is_empty()
    }
}

impl<R: Read + Seek> ByteSource for ZipSource<R> {
    fn entry_names(&self) -> Vec<String> {
        self.archive.file_names().map(str::to_string).collect()
    }

    fn contains(&self, name: &str) -> bool {
        self.archive.index_for_name(name).is_some()
    }

    fn read(&mut self, name: &str) -> Result<Vec<u8>> {
        let mut file = match self.archive.by_name(name) {
            Ok(file) => file,
            Err(ZipError::FileNotFound) => return Err(EpubError::EntryMissing(name.to_string())),
            Err(e) => return Err(e.into()),
        };
        let mut buffer = Vec::new();
        file.read_to_end(&mut buffer)?;
        Ok(buffer)
    }
}

/// 内存中的数据源，主要用于测试和已解压的内容
#[derive(Debug, Clone, Default)]
pub struct MemorySource {
    entries: BTreeMap<String, Vec<u8>>,
}

impl MemorySource {
    pub fn new() -> Self {
        Self::default()
    }

    /// 添加条目，同名条目会被覆盖
    pub fn insert(&mut self, name: impl Into<String>, content: impl Into<Vec<u8>>) {
        self.entries.insert(name.into(), content.into());
    }

    pub fn with_entry(mut self, name: impl Into<String>, content: impl Into<Vec<u8>>) -> Self {
        self.insert(name, content);
        self
    }
}

impl ByteSource for MemorySource {
    fn entry_names(&self) -> Vec<String> {
        self.entries.keys().cloned().collect()
    }

    fn contains(&self, name: &str) -> bool {
        self.entries.contains_key(name)
    }

    fn read(&mut self, name: &str) -> Result<Vec<u8>> {
        self.entries
            .get(name)
            .cloned()
            .ok_or_else(|| EpubError::EntryMissing(name.to_string()))
    }
}
