// ==========================================
// 实体数据导入引擎 - 外键解析器实现
// ==========================================
// 职责: 标签 → 代理 id（仅单向），未命中追加错误
// 约束:
// - ForeignKeyIndex 每个实体构建一次，会话内只读
// - 仅对被编辑的字段重跑，不整行重跑（避免覆盖已解析的 id）
// - 已存在同字段必填错误时不再追加外键错误
// ==========================================

use crate::domain::{CellValue, FieldDescriptor, ForeignKeyOption, ForeignKeyRef, ImportRow, RowIssue};
use crate::repository::SchemaStore;
use futures::future::join_all;
use std::collections::HashMap;
use tracing::{debug, warn};

// ==========================================
// ForeignKeyIndex - 字段键 → 有序 {label, id}
// ==========================================
#[derive(Debug, Clone, Default)]
pub struct ForeignKeyIndex {
    entries: HashMap<String, Vec<ForeignKeyOption>>,
}

impl ForeignKeyIndex {
    pub fn from_entries<I, K>(entries: I) -> Self
    where
        I: IntoIterator<Item = (K, Vec<ForeignKeyOption>)>,
        K: Into<String>,
    {
        Self {
            entries: entries.into_iter().map(|(k, v)| (k.into(), v)).collect(),
        }
    }

    /// 精确标签匹配（首个命中）
    pub fn lookup(&self, field_key: &str, label: &str) -> Option<&CellValue> {
        self.entries
            .get(field_key)?
            .iter()
            .find(|opt| opt.label == label)
            .map(|opt| &opt.id)
    }

    pub fn options(&self, field_key: &str) -> &[ForeignKeyOption] {
        self.entries
            .get(field_key)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// 并发拉取所有外键候选项
    ///
    /// 每个不同的 ForeignKeyRef 只查询一次；单个查询失败仅记录日志，
    /// 对应字段索引为空（该字段的取值将解析为 not found）
    pub async fn fetch<S: SchemaStore + ?Sized>(store: &S, descriptors: &[FieldDescriptor]) -> Self {
        let mut refs: Vec<&ForeignKeyRef> = Vec::new();
        for fk in descriptors.iter().filter_map(|f| f.foreign_key.as_ref()) {
            if !refs.contains(&fk) {
                refs.push(fk);
            }
        }

        let results = join_all(refs.iter().map(|fk| store.fetch_foreign_key_options(fk))).await;

        let mut by_ref: HashMap<&ForeignKeyRef, Vec<ForeignKeyOption>> = HashMap::new();
        for (fk, result) in refs.into_iter().zip(results) {
            match result {
                Ok(options) => {
                    debug!(table = %fk.qualified_table(), options = options.len(), "外键索引构建完成");
                    by_ref.insert(fk, options);
                }
                Err(e) => {
                    warn!(table = %fk.qualified_table(), error = %e, "外键候选项查询失败，该字段索引置空");
                }
            }
        }

        let entries = descriptors.iter().filter_map(|field| {
            let fk = field.foreign_key.as_ref()?;
            Some((
                field.key.clone(),
                by_ref.get(fk).cloned().unwrap_or_default(),
            ))
        });

        Self::from_entries(entries)
    }
}

/// 单字段解析结果
#[derive(Debug, Clone, PartialEq)]
pub enum FkOutcome {
    /// 非外键字段或当前值为空
    Skipped,
    Resolved(CellValue),
    NotFound(String),
    /// 未命中，但同字段已有必填错误
    Suppressed,
}

// ==========================================
// ForeignKeyResolver
// ==========================================
pub struct ForeignKeyResolver;

impl ForeignKeyResolver {
    /// 对单行单字段执行标签 → id 解析
    ///
    /// # 参数
    /// - row: 目标行（就地修改值与错误集）
    /// - field: 字段描述符（无外键时直接跳过）
    /// - index: 会话外键索引
    ///
    /// # 返回
    /// - FkOutcome
    pub fn resolve_field(
        &self,
        row: &mut ImportRow,
        field: &FieldDescriptor,
        index: &ForeignKeyIndex,
    ) -> FkOutcome {
        if field.foreign_key.is_none() {
            return FkOutcome::Skipped;
        }

        // 该字段旧的外键错误与当前值无关，先移除
        row.remove_errors_where(|e| RowIssue::is_foreign_key_error_for(e, &field.display_name));

        let label = match row.get(&field.key) {
            Some(value) if !value.is_blank() => value.to_string(),
            _ => return FkOutcome::Skipped,
        };

        if let Some(id) = index.lookup(&field.key, &label) {
            let id = id.clone();
            row.set(field.key.clone(), id.clone());
            return FkOutcome::Resolved(id);
        }

        let mandatory_error = RowIssue::mandatory(&field.display_name).to_string();
        if row.has_error(&mandatory_error) {
            return FkOutcome::Suppressed;
        }

        row.add_error(RowIssue::foreign_key_not_found(&field.display_name, &label).to_string());
        FkOutcome::NotFound(label)
    }
}
