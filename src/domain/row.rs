// ==========================================
// 实体数据导入引擎 - 导入行模型
// ==========================================
// 职责: ImportRow（规范键 → 标量 + 错误集）/ 行级问题模板 / 导入汇总
// 不变量: errors 非空 ⇔ 当前取值至少违反一条字段约束
// ==========================================

use crate::domain::types::CellValue;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

// ==========================================
// RowIssue - 行级问题（唯一的错误文案模板）
// ==========================================
// 错误集按字符串精确匹配去重，所有文案必须经由此处生成
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RowIssue {
    Mandatory { display_name: String },
    ForeignKeyNotFound { display_name: String, value: String },
}

impl RowIssue {
    pub fn mandatory(display_name: &str) -> Self {
        RowIssue::Mandatory {
            display_name: display_name.to_string(),
        }
    }

    pub fn foreign_key_not_found(display_name: &str, value: &str) -> Self {
        RowIssue::ForeignKeyNotFound {
            display_name: display_name.to_string(),
            value: value.to_string(),
        }
    }

    /// 判断一条错误文案是否为指定字段的外键未命中错误（与取值无关）
    pub fn is_foreign_key_error_for(message: &str, display_name: &str) -> bool {
        let prefix = format!("Invalid {}: '", display_name);
        message.starts_with(&prefix) && message.ends_with("' not found.")
    }
}

impl fmt::Display for RowIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RowIssue::Mandatory { display_name } => write!(f, "{} is mandatory.", display_name),
            RowIssue::ForeignKeyNotFound {
                display_name,
                value,
            } => write!(f, "Invalid {}: '{}' not found.", display_name, value),
        }
    }
}

// ==========================================
// ImportRow - 单条导入记录
// ==========================================
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ImportRow {
    pub row_key: usize, // 会话内稳定的位置键
    pub values: BTreeMap<String, CellValue>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub errors: Vec<String>, // 有序集合
}

impl ImportRow {
    pub fn new(row_key: usize) -> Self {
        Self {
            row_key,
            values: BTreeMap::new(),
            errors: Vec::new(),
        }
    }

    pub fn get(&self, key: &str) -> Option<&CellValue> {
        self.values.get(key)
    }

    pub fn set(&mut self, key: impl Into<String>, value: impl Into<CellValue>) {
        self.values.insert(key.into(), value.into());
    }

    /// 字段缺失 / null / 空白 均视为空
    pub fn is_field_blank(&self, key: &str) -> bool {
        self.values.get(key).map_or(true, CellValue::is_blank)
    }

    pub fn is_clean(&self) -> bool {
        self.errors.is_empty()
    }

    /// 全空行（除 row_key / errors 外无任何有值字段）
    pub fn is_blank(&self) -> bool {
        self.values.values().all(CellValue::is_blank)
    }

    pub fn has_error(&self, message: &str) -> bool {
        self.errors.iter().any(|e| e == message)
    }

    /// 追加错误（已存在则不重复）
    pub fn add_error(&mut self, message: impl Into<String>) -> bool {
        let message = message.into();
        if self.has_error(&message) {
            return false;
        }
        self.errors.push(message);
        true
    }

    pub fn remove_error(&mut self, message: &str) -> bool {
        let before = self.errors.len();
        self.errors.retain(|e| e != message);
        before != self.errors.len()
    }

    pub fn remove_errors_where<F>(&mut self, predicate: F) -> usize
    where
        F: Fn(&str) -> bool,
    {
        let before = self.errors.len();
        self.errors.retain(|e| !predicate(e));
        before - self.errors.len()
    }
}

// ==========================================
// ImportSummary - 会话汇总统计
// ==========================================
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ImportSummary {
    pub total_rows: usize,
    pub clean_rows: usize,
    pub error_rows: usize,
    pub blank_rows: usize,
    pub total_errors: usize,
}

impl ImportSummary {
    pub fn from_rows(rows: &[ImportRow]) -> Self {
        let mut summary = ImportSummary {
            total_rows: rows.len(),
            ..Default::default()
        };
        for row in rows {
            if row.is_blank() {
                summary.blank_rows += 1;
            }
            if row.is_clean() {
                summary.clean_rows += 1;
            } else {
                summary.error_rows += 1;
                summary.total_errors += row.errors.len();
            }
        }
        summary
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_row_issue_templates() {
        assert_eq!(
            RowIssue::mandatory("Start Date").to_string(),
            "Start Date is mandatory."
        );
        assert_eq!(
            RowIssue::foreign_key_not_found("Region", "South").to_string(),
            "Invalid Region: 'South' not found."
        );
    }

    #[test]
    fn test_foreign_key_error_matching() {
        let msg = RowIssue::foreign_key_not_found("Region", "South").to_string();
        assert!(RowIssue::is_foreign_key_error_for(&msg, "Region"));
        assert!(!RowIssue::is_foreign_key_error_for(&msg, "Country"));
        assert!(!RowIssue::is_foreign_key_error_for("Region is mandatory.", "Region"));
    }

    #[test]
    fn test_add_error_deduplicates() {
        let mut row = ImportRow::new(0);
        assert!(row.add_error("Email is mandatory."));
        assert!(!row.add_error("Email is mandatory."));
        assert_eq!(row.errors.len(), 1);
        assert!(row.remove_error("Email is mandatory."));
        assert!(row.is_clean());
    }

    #[test]
    fn test_blank_row_detection() {
        let mut row = ImportRow::new(3);
        row.set("name", CellValue::Null);
        row.set("email", "  ");
        assert!(row.is_blank());
        row.set("email", "a@b.c");
        assert!(!row.is_blank());
    }

    #[test]
    fn test_summary_counts() {
        let mut clean = ImportRow::new(0);
        clean.set("name", "Ann");
        let mut broken = ImportRow::new(1);
        broken.add_error("Name is mandatory.");
        broken.add_error("Invalid Region: 'X' not found.");
        let blank = ImportRow::new(2);

        let summary = ImportSummary::from_rows(&[clean, broken, blank]);
        assert_eq!(summary.total_rows, 3);
        assert_eq!(summary.clean_rows, 2);
        assert_eq!(summary.error_rows, 1);
        assert_eq!(summary.blank_rows, 1);
        assert_eq!(summary.total_errors, 2);
    }
}
