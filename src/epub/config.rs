//! 解析配置模块
//!
//! 提供读取EPUB时使用的可调参数，支持从YAML文件加载配置。

use crate::epub::error::{EpubError, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

/// 默认的最大嵌套深度
pub const DEFAULT_MAX_DEPTH: usize = 256;

/// container.xml在压缩包中的固定位置
pub const DEFAULT_CONTAINER_PATH: &str = "META-INF/container.xml";

/// 读取EPUB时使用的配置
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReaderConfig {
    /// 文档树允许的最大嵌套深度，超过时返回 `TooDeeplyNested`
    pub max_depth: usize,
    /// container.xml的路径
    pub container_path: String,
    /// 被视为段落的标签
    pub paragraph_tags: Vec<String>,
}

impl Default for ReaderConfig {
    fn default() -> Self {
        Self {
            max_depth: DEFAULT_MAX_DEPTH,
            container_path: DEFAULT_CONTAINER_PATH.to_string(),
            paragraph_tags: vec!["p".to_string(), "div".to_string()],
        }
    }
}

impl ReaderConfig {
    /// 从YAML字符串加载配置，缺失的字段使用默认值
    pub fn from_yaml_str(content: &str) -> Result<Self> {
        let config: ReaderConfig = serde_yml::from_str(content)
            .map_err(|e| EpubError::Config(format!("配置文件格式错误: {}", e)))?;
        config.validate()?;
        Ok(config)
    }

    /// 从YAML文件加载配置
    ///
    /// # 参数
    /// * `path` - 配置文件路径
    ///
    /// # 返回值
    /// * `Result<ReaderConfig>` - 加载成功返回配置实例，失败返回错误
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = fs::read_to_string(path.as_ref())
            .map_err(|e| EpubError::Config(format!("无法读取配置文件: {}", e)))?;
        Self::from_yaml_str(&content)
    }

    /// 将配置序列化为YAML
    pub fn to_yaml(&self) -> Result<String> {
        serde_yml::to_string(self)
            .map_err(|e| EpubError::Config(format!("序列化配置失败: {}", e)))
    }

    /// 判断标签是否被视为段落
    pub fn is_paragraph_tag(&self, name: &str) -> bool {
        self.paragraph_tags
            .iter()
            .any(|tag| tag.eq_ignore_ascii_case(name))
    }

    fn validate(&self) -> Result<()> {
        if self.max_depth == 0 {
            return Err(EpubError::Config("max_depth必须大于0".to_string()));
        }
        if self.container_path.trim().is_empty() {
            return Err(EpubError::Config("container_path不能为空".to_string()));
        }
        Ok(())
    }
}
