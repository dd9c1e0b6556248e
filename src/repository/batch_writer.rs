// ==========================================
// 实体数据导入引擎 - 批量写入边界 Trait
// ==========================================
// 职责: 一次调用写入整批记录（全部成功或整体失败）
// ==========================================

use crate::repository::error::RepositoryResult;
use async_trait::async_trait;
use serde_json::Value;

// ==========================================
// BatchWriter Trait
// ==========================================
// 实现者: SqliteEntityStore（使用 rusqlite 事务）
#[async_trait]
pub trait BatchWriter: Send + Sync {
    /// 批量 upsert
    ///
    /// # 参数
    /// - qualified_table: "{entity_schema}.{entity_type}"
    /// - rows: 已组装、已剪枝的 JSON 对象
    ///
    /// # 返回
    /// - Ok(usize): 写入的记录数
    /// - Err: 写入失败（整批回滚，无逐行反馈）
    async fn upsert_batch(&self, qualified_table: &str, rows: Vec<Value>) -> RepositoryResult<usize>;
}
