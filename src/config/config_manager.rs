// ==========================================
// 实体数据导入引擎 - 配置管理器
// ==========================================
// 职责: 配置加载、查询、覆写管理
// 存储: config_kv 表 (key-value + scope)
// ==========================================

use crate::config::import_config_trait::{ConfigResult, ImportConfigReader};
use crate::db::open_sqlite_connection;
use crate::importer::type_normalizer::DEFAULT_DATE_FORMATS;
use async_trait::async_trait;
use rusqlite::{params, Connection};
use serde_json::json;
use std::collections::BTreeMap;
use std::sync::{Arc, Mutex};

pub const DEFAULT_PATH_DELIMITER: &str = ".";
pub const DEFAULT_MAX_ROWS: usize = 50_000;

// ==========================================
// ConfigManager - 配置管理器
// ==========================================
pub struct ConfigManager {
    conn: Arc<Mutex<Connection>>,
}

impl ConfigManager {
    /// 创建新的 ConfigManager 实例
    ///
    /// # 参数
    /// - db_path: 数据库文件路径（需已初始化 schema）
    pub fn new(db_path: &str) -> ConfigResult<Self> {
        let conn = open_sqlite_connection(db_path)?;

        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    /// 从已有连接创建 ConfigManager
    ///
    /// 说明：为保证连接行为一致，会对传入连接再次应用统一 PRAGMA（幂等）。
    pub fn from_connection(conn: Arc<Mutex<Connection>>) -> ConfigResult<Self> {
        {
            let conn_guard = conn.lock().map_err(|e| format!("锁获取失败: {}", e))?;
            crate::db::configure_sqlite_connection(&conn_guard)?;
        }

        Ok(Self { conn })
    }

    /// 从 config_kv 表读取配置值（scope_id='global'）
    fn get_config_value(&self, key: &str) -> ConfigResult<Option<String>> {
        let conn = self.conn.lock().map_err(|e| format!("锁获取失败: {}", e))?;

        let result = conn.query_row(
            "SELECT value FROM config_kv WHERE scope_id = 'global' AND key = ?1",
            params![key],
            |row| row.get::<_, String>(0),
        );

        match result {
            Ok(value) => Ok(Some(value)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(Box::new(e)),
        }
    }

    fn get_config_or_default(&self, key: &str, default: &str) -> ConfigResult<String> {
        Ok(self.get_config_value(key)?.unwrap_or_else(|| default.to_string()))
    }

    /// 写入 global scope 配置（UPSERT）
    pub fn set_global_config_value(&self, key: &str, value: &str) -> ConfigResult<()> {
        let conn = self.conn.lock().map_err(|e| format!("锁获取失败: {}", e))?;
        conn.execute(
            "INSERT INTO config_kv (scope_id, key, value) VALUES ('global', ?1, ?2)
             ON CONFLICT(scope_id, key) DO UPDATE SET value = ?2, updated_at = datetime('now')",
            params![key, value],
        )?;
        Ok(())
    }

    /// 获取所有 global 配置的快照（JSON 格式，键有序）
    pub fn get_config_snapshot(&self) -> ConfigResult<String> {
        let conn = self.conn.lock().map_err(|e| format!("锁获取失败: {}", e))?;

        let mut stmt =
            conn.prepare("SELECT key, value FROM config_kv WHERE scope_id = 'global' ORDER BY key")?;

        let mut config_map: BTreeMap<String, String> = BTreeMap::new();
        let rows = stmt.query_map([], |row| {
            Ok((row.get::<_, String>(0)?, row.get::<_, String>(1)?))
        })?;

        for row in rows {
            let (key, value) = row?;
            config_map.insert(key, value);
        }

        Ok(serde_json::to_string(&json!(config_map))?)
    }
}

// ==========================================
// ImportConfigReader Trait 实现
// ==========================================
#[async_trait]
impl ImportConfigReader for ConfigManager {
    async fn get_date_formats(&self) -> ConfigResult<Vec<String>> {
        let defaults = || DEFAULT_DATE_FORMATS.iter().map(|f| f.to_string()).collect();

        let value = match self.get_config_value(config_keys::DATE_FORMATS)? {
            Some(v) => v,
            None => return Ok(defaults()),
        };

        match serde_json::from_str::<Vec<String>>(&value) {
            Ok(formats) if !formats.is_empty() => Ok(formats),
            _ => {
                tracing::warn!(
                    config_key = config_keys::DATE_FORMATS,
                    raw_value = %value,
                    "日期格式配置无效，使用默认格式"
                );
                Ok(defaults())
            }
        }
    }

    async fn get_path_delimiter(&self) -> ConfigResult<String> {
        let value =
            self.get_config_or_default(config_keys::PATH_DELIMITER, DEFAULT_PATH_DELIMITER)?;
        if value.is_empty() {
            return Ok(DEFAULT_PATH_DELIMITER.to_string());
        }
        Ok(value)
    }

    async fn get_max_rows(&self) -> ConfigResult<usize> {
        let value = self.get_config_or_default(config_keys::MAX_ROWS, "50000")?;
        Ok(value
            .trim()
            .parse::<usize>()
            .ok()
            .filter(|n| *n > 0)
            .unwrap_or(DEFAULT_MAX_ROWS))
    }
}

// ==========================================
// 配置键常量
// ==========================================
pub mod config_keys {
    pub const DATE_FORMATS: &str = "import.date_formats";
    pub const PATH_DELIMITER: &str = "import.path_delimiter";
    pub const MAX_ROWS: &str = "import.max_rows";
}
