// ==========================================
// 实体数据导入引擎 - 导入会话配置值对象
// ==========================================
// 每次会话开始时从 ImportConfigReader 解析一次，会话期间不变
// ==========================================

use crate::config::config_manager::{DEFAULT_MAX_ROWS, DEFAULT_PATH_DELIMITER};
use crate::config::import_config_trait::{ConfigResult, ImportConfigReader};
use crate::importer::type_normalizer::DEFAULT_DATE_FORMATS;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImportSettings {
    pub date_formats: Vec<String>,
    pub path_delimiter: String,
    pub max_rows: usize,
}

impl Default for ImportSettings {
    fn default() -> Self {
        Self {
            date_formats: DEFAULT_DATE_FORMATS.iter().map(|f| f.to_string()).collect(),
            path_delimiter: DEFAULT_PATH_DELIMITER.to_string(),
            max_rows: DEFAULT_MAX_ROWS,
        }
    }
}

impl ImportSettings {
    pub async fn load<R: ImportConfigReader + ?Sized>(reader: &R) -> ConfigResult<Self> {
        Ok(Self {
            date_formats: reader.get_date_formats().await?,
            path_delimiter: reader.get_path_delimiter().await?,
            max_rows: reader.get_max_rows().await?,
        })
    }
}
