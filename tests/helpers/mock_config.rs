// ==========================================
// Mock 配置实现 - 用于集成测试
// ==========================================

use async_trait::async_trait;
use entity_import::config::{ConfigResult, ImportConfigReader, ImportSettings};

/// Mock 配置结构
#[derive(Debug, Clone)]
pub struct MockConfig {
    pub settings: ImportSettings,
}

impl MockConfig {
    /// 创建默认配置
    pub fn new() -> Self {
        Self {
            settings: ImportSettings::default(),
        }
    }

    pub fn with_max_rows(max_rows: usize) -> Self {
        let mut config = Self::new();
        config.settings.max_rows = max_rows;
        config
    }

    pub fn with_delimiter(delimiter: &str) -> Self {
        let mut config = Self::new();
        config.settings.path_delimiter = delimiter.to_string();
        config
    }
}

#[async_trait]
impl ImportConfigReader for MockConfig {
    async fn get_date_formats(&self) -> ConfigResult<Vec<String>> {
        Ok(self.settings.date_formats.clone())
    }

    async fn get_path_delimiter(&self) -> ConfigResult<String> {
        Ok(self.settings.path_delimiter.clone())
    }

    async fn get_max_rows(&self) -> ConfigResult<usize> {
        Ok(self.settings.max_rows)
    }
}
