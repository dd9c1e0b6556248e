// ==========================================
// 实体数据导入引擎 - 导入会话
// ==========================================
// 职责: 持有目标实体上下文与行集，驱动初始校验与逐格编辑
// 每个字段的阶段顺序（初始解析与编辑一致）:
//   1. 类型规范化（外键字段跳过，按用户输入的标签原文查找）
//   2. 必填校验
//   3. 外键解析（仅外键字段）
//   4. 空值 → null
// 约束: 编辑只影响被编辑行的被编辑字段
// ==========================================

use crate::config::ImportSettings;
use crate::domain::{CellValue, FieldDescriptor, ImportRow, ImportSummary};
use crate::importer::batch_submitter::{BatchSubmitter, SubmitOutcome};
use crate::importer::column_reconciler::ColumnReconciler;
use crate::importer::error::{ImportError, ImportResult};
use crate::importer::fk_resolver::{ForeignKeyIndex, ForeignKeyResolver};
use crate::importer::import_traits::{
    ColumnReconciler as ColumnReconcilerTrait, RawRecord, TypeNormalizer as TypeNormalizerTrait,
};
use crate::importer::path_composer::PathComposer;
use crate::importer::row_validator::RowValidator;
use crate::importer::schema_context::SchemaContext;
use crate::importer::type_normalizer::TypeNormalizer;
use crate::repository::{BatchWriter, RepositoryResult};
use std::collections::BTreeSet;
use std::sync::Arc;
use tracing::{debug, info, instrument};

/// 单字段阶段管道（借用会话各组件）
struct FieldPipeline<'a> {
    normalizer: &'a dyn TypeNormalizerTrait,
    validator: &'a RowValidator,
    resolver: &'a ForeignKeyResolver,
    fk_index: &'a ForeignKeyIndex,
}

impl FieldPipeline<'_> {
    fn apply(&self, row: &mut ImportRow, field: &FieldDescriptor) {
        let normalizable = field.foreign_key.is_none();
        if let Some(value) = row.get(&field.key).filter(|_| normalizable) {
            let normalized = self.normalizer.normalize(value, field.data_type).into_cell();
            row.set(field.key.clone(), normalized);
        }

        self.validator.validate_mandatory(row, field);
        self.resolver.resolve_field(row, field, self.fk_index);

        // 缺失字段保持缺失
        if let Some(value) = row.values.get_mut(&field.key) {
            let current = std::mem::take(value);
            *value = self.normalizer.normalize_null(current);
        }
    }
}

// ==========================================
// ImportSession
// ==========================================
pub struct ImportSession {
    context: Arc<SchemaContext>,
    rows: Vec<ImportRow>,
    normalizer: Box<dyn TypeNormalizerTrait>,
    validator: RowValidator,
    resolver: ForeignKeyResolver,
    submitter: BatchSubmitter,
}

impl ImportSession {
    /// 创建空会话
    ///
    /// # 参数
    /// - context: 目标实体上下文（描述符 + 外键索引）
    /// - settings: 会话配置（日期格式 / 路径分隔符）
    pub fn new(context: Arc<SchemaContext>, settings: &ImportSettings) -> Self {
        Self {
            context,
            rows: Vec::new(),
            normalizer: Box::new(TypeNormalizer::new(settings.date_formats.clone())),
            validator: RowValidator,
            resolver: ForeignKeyResolver,
            submitter: BatchSubmitter::new(PathComposer::new(settings.path_delimiter.clone())),
        }
    }

    /// 替换类型规范化实现
    pub fn with_normalizer(mut self, normalizer: Box<dyn TypeNormalizerTrait>) -> Self {
        self.normalizer = normalizer;
        self
    }

    /// 由原始记录直接构建会话（默认列对齐器）
    pub fn from_records(
        context: Arc<SchemaContext>,
        settings: &ImportSettings,
        records: &[RawRecord],
    ) -> Self {
        let mut session = Self::new(context, settings);
        session.load_records(records, &ColumnReconciler);
        session
    }

    /// 载入原始记录: 列对齐 + 每字段初始阶段
    ///
    /// 已有行集被整体替换
    #[instrument(skip(self, records, reconciler), fields(entity_id = %self.context.target.entity_id, rows = records.len()))]
    pub fn load_records(&mut self, records: &[RawRecord], reconciler: &dyn ColumnReconcilerTrait) {
        let descriptors = &self.context.descriptors;
        let pipeline = FieldPipeline {
            normalizer: self.normalizer.as_ref(),
            validator: &self.validator,
            resolver: &self.resolver,
            fk_index: &self.context.fk_index,
        };

        // 全部记录的表头并集，保证各行使用同一映射
        let headers: Vec<String> = records
            .iter()
            .flat_map(|raw| raw.keys().cloned())
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect();
        let mapping = reconciler.resolve_headers(&headers, descriptors);
        debug!(headers = headers.len(), mapped = mapping.len(), "表头映射解析完成");

        self.rows = records
            .iter()
            .enumerate()
            .map(|(row_key, raw)| {
                let mut row = reconciler.apply_mapping(raw, &mapping, row_key);
                for field in descriptors {
                    pipeline.apply(&mut row, field);
                }
                row
            })
            .collect();

        let summary = self.summary();
        info!(
            total_rows = summary.total_rows,
            clean_rows = summary.clean_rows,
            error_rows = summary.error_rows,
            "导入行初始校验完成"
        );
    }

    pub fn context(&self) -> &SchemaContext {
        &self.context
    }

    pub fn descriptors(&self) -> &[FieldDescriptor] {
        &self.context.descriptors
    }

    pub fn rows(&self) -> &[ImportRow] {
        &self.rows
    }

    pub fn row(&self, row_key: usize) -> Option<&ImportRow> {
        self.rows.iter().find(|r| r.row_key == row_key)
    }

    pub fn display_columns(&self) -> Vec<&FieldDescriptor> {
        self.context.displayable_fields().collect()
    }

    pub fn summary(&self) -> ImportSummary {
        ImportSummary::from_rows(&self.rows)
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// 编辑单元格: 规范化 + 该字段的必填校验 + 外键解析
    ///
    /// # 参数
    /// - row_key: 行键
    /// - field_key: 规范字段键
    /// - value: 新的原始值
    ///
    /// # 返回
    /// - Ok(&ImportRow): 编辑后的行（含最新错误集）
    /// - Err: 行或字段不存在
    pub fn edit_cell(
        &mut self,
        row_key: usize,
        field_key: &str,
        value: impl Into<CellValue>,
    ) -> ImportResult<&ImportRow> {
        let field = self
            .context
            .descriptors
            .iter()
            .find(|f| f.key == field_key)
            .ok_or_else(|| ImportError::UnknownField(field_key.to_string()))?;
        let idx = self
            .rows
            .iter()
            .position(|r| r.row_key == row_key)
            .ok_or(ImportError::RowNotFound(row_key))?;

        let pipeline = FieldPipeline {
            normalizer: self.normalizer.as_ref(),
            validator: &self.validator,
            resolver: &self.resolver,
            fk_index: &self.context.fk_index,
        };

        let row = &mut self.rows[idx];
        row.set(field.key.clone(), value.into());
        pipeline.apply(row, field);

        debug!(row_key, field_key, errors = row.errors.len(), "单元格编辑完成");
        Ok(&self.rows[idx])
    }

    /// 提交前最终必填复核（不重跑外键解析）
    ///
    /// # 返回
    /// - 仍有错误的行数
    pub fn finalize_validation(&mut self) -> usize {
        let descriptors = &self.context.descriptors;
        for row in self.rows.iter_mut() {
            self.validator.validate_row(row, descriptors);
        }
        self.rows.iter().filter(|r| !r.is_clean()).count()
    }

    /// 最终复核后提交干净行
    ///
    /// 会话行集不在此处清空，由调用方按结果决定
    #[instrument(skip(self, writer), fields(entity_id = %self.context.target.entity_id))]
    pub async fn submit<W: BatchWriter + ?Sized>(
        &mut self,
        writer: &W,
    ) -> RepositoryResult<SubmitOutcome> {
        let error_rows = self.finalize_validation();
        debug!(error_rows, "提交前复核完成");
        self.submitter
            .submit(writer, &self.context.target, &self.rows)
            .await
    }
}
