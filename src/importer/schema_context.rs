// ==========================================
// 实体数据导入引擎 - 目标实体上下文
// ==========================================
// 职责: 选定实体后一次性加载字段描述符 + 外键索引
// 约束: 构建后只读；切换实体时整体替换，不做合并
// ==========================================

use crate::domain::{EntityTarget, FieldDescriptor};
use crate::importer::fk_resolver::ForeignKeyIndex;
use crate::repository::{RepositoryResult, SchemaStore};
use std::collections::HashSet;
use tracing::{info, warn};

#[derive(Debug, Clone)]
pub struct SchemaContext {
    pub target: EntityTarget,
    pub descriptors: Vec<FieldDescriptor>,
    pub fk_index: ForeignKeyIndex,
}

impl SchemaContext {
    pub fn new(
        target: EntityTarget,
        descriptors: Vec<FieldDescriptor>,
        fk_index: ForeignKeyIndex,
    ) -> Self {
        Self {
            target,
            descriptors,
            fk_index,
        }
    }

    /// 加载字段描述符并并发构建外键索引
    ///
    /// # 返回
    /// - Err: 描述符加载失败（外键查询失败不会导致 Err）
    pub async fn load<S: SchemaStore + ?Sized>(
        store: &S,
        target: EntityTarget,
    ) -> RepositoryResult<Self> {
        let descriptors = store.fetch_field_descriptors(&target.entity_id).await?;
        let fk_index = ForeignKeyIndex::fetch(store, &descriptors).await;
        let context = Self::new(target, descriptors, fk_index);

        // 行错误以显示名为键，重名字段的错误会互相覆盖
        let duplicates = context.duplicate_display_names();
        if !duplicates.is_empty() {
            warn!(entity_id = %context.target.entity_id, ?duplicates, "字段显示名重复");
        }

        info!(
            entity_id = %context.target.entity_id,
            fields = context.descriptors.len(),
            fk_fields = context.fk_index.len(),
            "目标实体上下文加载完成"
        );
        Ok(context)
    }

    /// 被多个字段共用的显示名（按首次重复出现的顺序）
    pub fn duplicate_display_names(&self) -> Vec<&str> {
        let mut seen = HashSet::new();
        let mut duplicates = Vec::new();
        for field in &self.descriptors {
            let name = field.display_name.as_str();
            if !seen.insert(name) && !duplicates.contains(&name) {
                duplicates.push(name);
            }
        }
        duplicates
    }

    pub fn field(&self, key: &str) -> Option<&FieldDescriptor> {
        self.descriptors.iter().find(|f| f.key == key)
    }

    pub fn displayable_fields(&self) -> impl Iterator<Item = &FieldDescriptor> {
        self.descriptors.iter().filter(|f| f.is_displayable)
    }
}
