// ==========================================
// 实体数据导入引擎 - 导入配置读取 Trait
// ==========================================
// 职责: 定义导入会话所需的配置读取接口（不包含实现）
// 红线: 不包含配置写入、不包含业务逻辑
// ==========================================

use async_trait::async_trait;
use std::error::Error;

pub type ConfigResult<T> = Result<T, Box<dyn Error + Send + Sync>>;

// ==========================================
// ImportConfigReader Trait
// ==========================================
// 用途: 导入会话所需的配置读取接口
// 实现者: ConfigManager（从 config_kv 表读取）
#[async_trait]
pub trait ImportConfigReader: Send + Sync {
    /// 获取日期输入格式列表（chrono 格式串，按顺序尝试）
    ///
    /// # 默认值
    /// - type_normalizer::DEFAULT_DATE_FORMATS
    async fn get_date_formats(&self) -> ConfigResult<Vec<String>>;

    /// 获取规范键路径分隔符
    ///
    /// # 默认值
    /// - "."
    async fn get_path_delimiter(&self) -> ConfigResult<String>;

    /// 获取单个文件允许的最大数据行数
    ///
    /// # 默认值
    /// - 50000
    async fn get_max_rows(&self) -> ConfigResult<usize>;
}
