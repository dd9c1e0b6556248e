// ==========================================
// 实体数据导入引擎 - 导入阶段 Trait
// ==========================================
// 职责: 定义导入管道各阶段接口（不包含实现）
// 流程: 文件解析 → 列对齐 → 类型规范化 → (外键解析 / 行校验)
// ==========================================

use crate::domain::{CellValue, DataType, FieldDescriptor, ImportRow, NormalizedValue};
use crate::importer::error::ImportResult;
use std::collections::BTreeMap;
use std::path::Path;

/// 原始行记录: 表头原文 → 单元格原文
///
/// 使用有序 Map，保证列对齐结果与文件中的列顺序无关
pub type RawRecord = BTreeMap<String, String>;

// ==========================================
// FileParser Trait
// ==========================================
// 用途: 文件解析接口（阶段 0）
// 实现者: CsvParser, ExcelParser
pub trait FileParser: Send + Sync {
    /// 解析文件为原始行记录
    ///
    /// # 约定
    /// - 首行为表头（TRIM 后作为键）
    /// - 完全空白的行被跳过
    fn parse_to_raw_records(&self, file_path: &Path) -> ImportResult<Vec<RawRecord>>;

    /// 解析内存中的字节流（上传文件）
    fn parse_bytes(&self, bytes: &[u8]) -> ImportResult<Vec<RawRecord>>;
}

// ==========================================
// ColumnReconciler Trait
// ==========================================
// 用途: 列对齐接口（阶段 1）
// 实现者: ColumnReconcilerImpl
pub trait ColumnReconciler: Send + Sync {
    /// 计算表头 → 规范键映射（只依赖表头集合，不依赖具体行）
    ///
    /// # 返回
    /// - Vec<(规范键, 命中的表头)>，按描述符顺序；未命中的字段不出现
    fn resolve_headers(
        &self,
        headers: &[String],
        descriptors: &[FieldDescriptor],
    ) -> Vec<(String, String)>;

    /// 按已解析的映射复制单元格；行中不存在的表头对应字段缺失
    fn apply_mapping(&self, raw: &RawRecord, mapping: &[(String, String)], row_key: usize) -> ImportRow {
        let mut row = ImportRow::new(row_key);
        for (field_key, header) in mapping {
            if let Some(cell) = raw.get(header) {
                row.set(field_key.clone(), CellValue::Text(cell.clone()));
            }
        }
        row
    }

    /// 以单行自身的表头对齐（errors 为空）
    ///
    /// # 参数
    /// - raw: 原始行记录
    /// - descriptors: 有序字段描述符（顺序决定歧义时的归属）
    /// - row_key: 会话内位置键
    fn reconcile(&self, raw: &RawRecord, descriptors: &[FieldDescriptor], row_key: usize) -> ImportRow {
        let headers: Vec<String> = raw.keys().cloned().collect();
        let mapping = self.resolve_headers(&headers, descriptors);
        self.apply_mapping(raw, &mapping, row_key)
    }
}

// ==========================================
// TypeNormalizer Trait
// ==========================================
// 用途: 类型规范化接口（阶段 2）
// 实现者: TypeNormalizerImpl
pub trait TypeNormalizer: Send + Sync {
    /// 按字段数据类型规范化单元格
    ///
    /// # 规则
    /// - date / timestamp: 可解析 → YYYY-MM-DD；不可解析 → 原值保留
    /// - number / boolean: 可解析 → 对应标量；不可解析 → 原值保留
    /// - 空白: 不在此处置空（见 normalize_null）
    fn normalize(&self, value: &CellValue, data_type: DataType) -> NormalizedValue;

    /// 空值标准化（TRIM 后为空 → null，对所有类型一致）
    fn normalize_null(&self, value: CellValue) -> CellValue;
}
