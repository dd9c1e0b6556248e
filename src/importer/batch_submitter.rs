// ==========================================
// 实体数据导入引擎 - 批量提交器
// ==========================================
// 职责: 过滤可提交行 → 组装载荷 → 单次调用批量写入边界
// 过滤: (a) 错误集非空的行 (b) 全空行
// 语义: 整批成功或整批失败，无逐行反馈
// ==========================================

use crate::domain::{EntityTarget, ImportRow};
use crate::importer::path_composer::PathComposer;
use crate::repository::{BatchWriter, RepositoryResult};
use serde_json::Value;
use tracing::{error, info, warn};

/// 提交结果（写入失败走 Err）
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SubmitOutcome {
    /// 无可提交行，未调用写入边界
    NoValidData,
    Uploaded { uploaded: usize },
}

pub struct BatchSubmitter {
    composer: PathComposer,
}

impl BatchSubmitter {
    pub fn new(composer: PathComposer) -> Self {
        Self { composer }
    }

    /// 选出可提交行（干净且非全空）
    pub fn select_rows<'a>(&self, rows: &'a [ImportRow]) -> Vec<&'a ImportRow> {
        rows.iter()
            .filter(|row| row.is_clean() && !row.is_blank())
            .collect()
    }

    pub fn build_payload(&self, rows: &[ImportRow]) -> Vec<Value> {
        self.select_rows(rows)
            .into_iter()
            .map(|row| self.composer.compose(row))
            .collect()
    }

    /// 提交
    ///
    /// # 参数
    /// - writer: 批量写入边界
    /// - target: 目标实体（表名 "{schema}.{table}"）
    /// - rows: 会话行集
    ///
    /// # 返回
    /// - Ok(SubmitOutcome::NoValidData): 无可提交行
    /// - Ok(SubmitOutcome::Uploaded): 写入成功
    /// - Err: 写入失败（原样透传边界错误）
    pub async fn submit<W: BatchWriter + ?Sized>(
        &self,
        writer: &W,
        target: &EntityTarget,
        rows: &[ImportRow],
    ) -> RepositoryResult<SubmitOutcome> {
        let payload = self.build_payload(rows);
        if payload.is_empty() {
            warn!(total_rows = rows.len(), "无可提交的有效数据");
            return Ok(SubmitOutcome::NoValidData);
        }

        let table = target.qualified_name();
        let submitted = payload.len();
        match writer.upsert_batch(&table, payload).await {
            Ok(uploaded) => {
                info!(table = %table, submitted, uploaded, skipped = rows.len() - submitted, "批量提交成功");
                Ok(SubmitOutcome::Uploaded { uploaded })
            }
            Err(e) => {
                error!(table = %table, submitted, error = %e, "批量提交失败");
                Err(e)
            }
        }
    }
}

impl Default for BatchSubmitter {
    fn default() -> Self {
        Self::new(PathComposer::default())
    }
}
