//! 解析器配置
//!
//! 配置文件为YAML格式，可以用 [`ResolverConfig::generate_default_config`] 生成带注释的默认文件。

use crate::epub::error::{EpubError, Result};
use crate::toc::StrategyKind;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fs;
use std::path::Path;

/// 默认最大目录深度
pub const DEFAULT_MAX_DEPTH: u32 = 8;
/// 默认最大目录条目数
pub const DEFAULT_MAX_ITEMS: usize = 10_000;

/// 目录解析配置
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ResolverConfig {
    /// 按优先级排列的提取策略
    pub strategies: Vec<StrategyKind>,
    /// 规范化后允许的最大层数
    pub max_depth: u32,
    /// 校验时允许的最大条目数
    pub max_items: usize,
}

impl Default for ResolverConfig {
    fn default() -> Self {
        Self {
            strategies: StrategyKind::DEFAULT_ORDER.to_vec(),
            max_depth: DEFAULT_MAX_DEPTH,
            max_items: DEFAULT_MAX_ITEMS,
        }
    }
}

impl ResolverConfig {
    /// 从YAML配置文件加载并校验配置
    ///
    /// 文件中缺省的字段使用默认值。
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = fs::read_to_string(path.as_ref())
            .map_err(|e| EpubError::ConfigError(format!("无法读取配置文件: {}", e)))?;

        Self::from_yaml(&content)
    }

    /// 从YAML文本解析并校验配置
    pub fn from_yaml(content: &str) -> Result<Self> {
        let config: Self =
            serde_yml::from_str(content).map_err(|e| EpubError::ConfigError(format!("配置文件格式错误: {}", e)))?;

        config.validate()?;
        Ok(config)
    }

    /// 将默认配置写入指定路径，必要时创建父目录
    pub fn generate_default_config<P: AsRef<Path>>(path: P) -> Result<()> {
        let yaml_content = serde_yml::to_string(&Self::default())
            .map_err(|e| EpubError::ConfigError(format!("序列化配置失败: {}", e)))?;

        let content_with_header = format!(
            "# 目录解析配置文件\n# strategies: 按优先级尝试的提取策略(ncx, nav, landmarks, spine, content)\n# max_depth: 目录最大层数，更深的条目会被展开到最后一层\n# max_items: 目录最大条目数，超过时该策略的结果被拒绝\n\n{}",
            yaml_content
        );

        let path = path.as_ref();
        if let Some(parent) = path.parent().filter(|parent| !parent.as_os_str().is_empty()) {
            fs::create_dir_all(parent)
                .map_err(|e| EpubError::ConfigError(format!("创建配置目录失败: {}", e)))?;
        }
        fs::write(path, content_with_header).map_err(|e| EpubError::ConfigError(format!("写入配置文件失败: {}", e)))?;

        Ok(())
    }

    /// 校验配置
    ///
    /// 策略列表不能为空或重复，`max_depth` 和 `max_items` 至少为1。
    pub fn validate(&self) -> Result<()> {
        if self.strategies.is_empty() {
            return Err(EpubError::ConfigError("提取策略列表不能为空".to_string()));
        }

        let mut seen = HashSet::new();
        if let Some(duplicate) = self.strategies.iter().find(|kind| !seen.insert(**kind)) {
            return Err(EpubError::ConfigError(format!("提取策略重复: {}", duplicate)));
        }

        if self.max_depth == 0 {
            return Err(EpubError::ConfigError("max_depth必须至少为1".to_string()));
        }
        if self.max_items == 0 {
            return Err(EpubError::ConfigError("max_items必须至少为1".to_string()));
        }

        Ok(())
    }

    /// 设置提取策略
    pub fn with_strategies(mut self, strategies: Vec<StrategyKind>) -> Self {
        self.strategies = strategies;
        self
    }

    /// 设置最大层数
    pub fn with_max_depth(mut self, max_depth: u32) -> Self {
        self.max_depth = max_depth;
        self
    }

    /// 设置最大条目数
    pub fn with_max_items(mut self, max_items: usize) -> Self {
        self.max_items = max_items;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_default_config_is_valid() {
        let config = ResolverConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.strategies.len(), 5);
        assert_eq!(config.strategies[0], StrategyKind::Ncx);
    }

    #[test]
    fn test_partial_yaml_uses_defaults() {
        let config = ResolverConfig::from_yaml("strategies: [nav, spine]\nmax_depth: 3\n").unwrap();
        assert_eq!(config.strategies, vec![StrategyKind::Nav, StrategyKind::Spine]);
        assert_eq!(config.max_depth, 3);
        assert_eq!(config.max_items, DEFAULT_MAX_ITEMS);
    }

    #[test]
    fn test_invalid_configs() {
        assert!(matches!(ResolverConfig::from_yaml("strategies: []"), Err(EpubError::ConfigError(_))));
        assert!(matches!(
            ResolverConfig::from_yaml("strategies: [ncx, ncx]"),
            Err(EpubError::ConfigError(_))
        ));
        assert!(matches!(
            ResolverConfig::from_yaml("strategies: [calibre]"),
            Err(EpubError::ConfigError(_))
        ));
        assert!(matches!(ResolverConfig::from_yaml("max_depth: 0"), Err(EpubError::ConfigError(_))));
    }

    #[test]
    fn test_generate_and_load_default_config() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("conf").join("tocforge.yaml");

        ResolverConfig::generate_default_config(&path).unwrap();
        let content = fs::read_to_string(&path).unwrap();
        assert!(content.starts_with("# 目录解析配置文件"));

        let config = ResolverConfig::from_file(&path).unwrap();
        assert_eq!(config, ResolverConfig::default());
    }
}
