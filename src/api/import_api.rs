// ==========================================
// 实体数据导入API
// ==========================================
// 职责: 对界面暴露导入会话（选择实体 / 上传文件 / 行列表 / 编辑单元格 / 提交）
// 生命周期:
// - 切换目标实体时整体丢弃当前会话（行、索引、已加载文件）
// - 提交成功后清空会话；写入失败保留会话以便重试
// ==========================================

use crate::api::error::{ApiError, ApiResult};
use crate::config::{ImportConfigReader, ImportSettings};
use crate::domain::{CellValue, EntityTarget, FieldDescriptor, ImportRow, ImportSummary};
use crate::importer::{
    build_template_csv, FileFormat, ImportError, ImportResult, ImportSession, RawRecord,
    SchemaContext, SubmitOutcome, UniversalFileParser,
};
use crate::repository::{BatchWriter, EntitySummary, SchemaStore};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::sync::Arc;
use tracing::{error, info, instrument, warn};

/// 提交成功响应
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubmitReport {
    /// 写入的行数
    pub uploaded: usize,
}

pub struct ImportApi<S, W>
where
    S: SchemaStore,
    W: BatchWriter,
{
    schema_store: Arc<S>,
    batch_writer: Arc<W>,
    config: Arc<dyn ImportConfigReader>,
    parser: UniversalFileParser,
    settings: ImportSettings,
    context: Option<Arc<SchemaContext>>,
    session: Option<ImportSession>,
}

impl<S, W> ImportApi<S, W>
where
    S: SchemaStore,
    W: BatchWriter,
{
    pub fn new(schema_store: Arc<S>, batch_writer: Arc<W>, config: Arc<dyn ImportConfigReader>) -> Self {
        Self {
            schema_store,
            batch_writer,
            config,
            parser: UniversalFileParser,
            settings: ImportSettings::default(),
            context: None,
            session: None,
        }
    }

    pub async fn list_entities(&self) -> ApiResult<Vec<EntitySummary>> {
        Ok(self.schema_store.list_entities().await?)
    }

    /// 选择目标实体
    ///
    /// 先丢弃当前会话与上下文，再加载新实体的描述符与外键索引
    #[instrument(skip(self), fields(entity_id = %target.entity_id))]
    pub async fn select_entity(&mut self, target: EntityTarget) -> ApiResult<&SchemaContext> {
        self.session = None;
        self.context = None;

        self.settings = ImportSettings::load(self.config.as_ref())
            .await
            .map_err(|e| ApiError::ConfigError(e.to_string()))?;

        let context = SchemaContext::load(self.schema_store.as_ref(), target)
            .await
            .map_err(|e| {
                error!(error = %e, "目标实体加载失败");
                ApiError::SchemaLoad(e.to_string())
            })?;

        let context = self.context.insert(Arc::new(context));
        Ok(&**context)
    }

    pub fn context(&self) -> Option<&SchemaContext> {
        self.context.as_deref()
    }

    pub fn settings(&self) -> &ImportSettings {
        &self.settings
    }

    /// 上传文件（按扩展名识别格式）
    pub fn load_file<P: AsRef<Path>>(&mut self, file_path: P) -> ApiResult<ImportSummary> {
        let context = self.require_context()?;
        let parsed = self.parser.parse(file_path);
        self.start_session(context, parsed)
    }

    /// 上传字节流
    pub fn load_bytes(&mut self, bytes: &[u8], format: FileFormat) -> ApiResult<ImportSummary> {
        let context = self.require_context()?;
        let parsed = self.parser.parse_bytes(bytes, format);
        self.start_session(context, parsed)
    }

    fn require_context(&self) -> ApiResult<Arc<SchemaContext>> {
        self.context.clone().ok_or(ApiError::NoEntitySelected)
    }

    /// 解析失败对会话是致命的: 不产生任何行
    fn start_session(
        &mut self,
        context: Arc<SchemaContext>,
        parsed: ImportResult<Vec<RawRecord>>,
    ) -> ApiResult<ImportSummary> {
        self.session = None;

        let records = parsed.map_err(|e| {
            warn!(error = %e, "文件解析失败");
            ApiError::from(e)
        })?;

        if records.len() > self.settings.max_rows {
            return Err(ApiError::from(ImportError::TooManyRows {
                actual: records.len(),
                limit: self.settings.max_rows,
            }));
        }

        let session = ImportSession::from_records(context, &self.settings, &records);
        let summary = session.summary();
        self.session = Some(session);

        info!(
            total_rows = summary.total_rows,
            error_rows = summary.error_rows,
            "导入会话已建立"
        );
        Ok(summary)
    }

    pub fn session(&self) -> Option<&ImportSession> {
        self.session.as_ref()
    }

    /// 当前行列表（含实时错误标注）；无会话时为空
    pub fn rows(&self) -> &[ImportRow] {
        self.session.as_ref().map(ImportSession::rows).unwrap_or(&[])
    }

    pub fn display_columns(&self) -> Vec<&FieldDescriptor> {
        self.context
            .as_ref()
            .map(|c| c.displayable_fields().collect())
            .unwrap_or_default()
    }

    pub fn edit_cell(
        &mut self,
        row_key: usize,
        field_key: &str,
        value: impl Into<CellValue>,
    ) -> ApiResult<&ImportRow> {
        let session = self.session.as_mut().ok_or(ApiError::NoActiveSession)?;
        Ok(session.edit_cell(row_key, field_key, value)?)
    }

    /// 提交
    ///
    /// # 返回
    /// - Ok(SubmitReport): 成功，会话已清空
    /// - Err(ApiError::NoValidData): 无可提交行，会话保留
    /// - Err(ApiError::BatchWrite): 写入失败，会话保留
    #[instrument(skip(self))]
    pub async fn submit(&mut self) -> ApiResult<SubmitReport> {
        let session = self.session.as_mut().ok_or(ApiError::NoActiveSession)?;

        let outcome = session.submit(self.batch_writer.as_ref()).await;
        match outcome {
            Ok(SubmitOutcome::Uploaded { uploaded }) => {
                self.session = None;
                Ok(SubmitReport { uploaded })
            }
            Ok(SubmitOutcome::NoValidData) => Err(ApiError::NoValidData),
            Err(e) => Err(ApiError::BatchWrite(e.to_string())),
        }
    }

    /// 放弃当前会话（保留已选实体）
    pub fn clear(&mut self) {
        self.session = None;
    }

    /// 当前实体的导入模板
    pub fn template_csv(&self) -> ApiResult<String> {
        let context = self.context.as_ref().ok_or(ApiError::NoEntitySelected)?;
        Ok(build_template_csv(&context.descriptors)?)
    }
}
