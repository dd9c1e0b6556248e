// ==========================================
// 实体数据导入引擎 - Schema / 外键查询边界 Trait
// ==========================================
// 职责: 定义元数据与外键候选项的数据访问接口（不包含业务逻辑）
// 红线: Repository 不含校验规则，只做数据读取
// ==========================================

use crate::domain::{EntityTarget, FieldDescriptor, ForeignKeyOption, ForeignKeyRef};
use crate::repository::error::RepositoryResult;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// 已注册的可导入实体
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EntitySummary {
    pub entity_id: String,
    pub entity_schema: String,
    pub entity_type: String,
    pub display_name: Option<String>,
}

impl EntitySummary {
    pub fn target(&self) -> EntityTarget {
        EntityTarget::new(&self.entity_id, &self.entity_schema, &self.entity_type)
    }
}

// ==========================================
// SchemaStore Trait
// ==========================================
// 用途: 目标 Schema 自省 + 外键表查询
// 实现者: SqliteEntityStore（使用 rusqlite）
#[async_trait]
pub trait SchemaStore: Send + Sync {
    /// 列出可导入实体（供目标选择）
    async fn list_entities(&self) -> RepositoryResult<Vec<EntitySummary>>;

    /// 按实体查询有序字段描述符
    ///
    /// # 参数
    /// - entity_id: 实体 ID
    ///
    /// # 返回
    /// - Ok(Vec<FieldDescriptor>): 声明顺序（该顺序决定列对齐歧义归属）
    /// - Err: 实体不存在或查询失败
    async fn fetch_field_descriptors(&self, entity_id: &str)
        -> RepositoryResult<Vec<FieldDescriptor>>;

    /// 查询外键候选项
    ///
    /// # 参数
    /// - fk: 外键引用（SELECT display_column, source_column FROM source_schema.source_table）
    ///
    /// # 返回
    /// - Ok(Vec<ForeignKeyOption>): {label, id} 有序列表
    async fn fetch_foreign_key_options(
        &self,
        fk: &ForeignKeyRef,
    ) -> RepositoryResult<Vec<ForeignKeyOption>>;
}
