// ==========================================
// 实体数据导入引擎 - 行校验器实现
// ==========================================
// 职责: 必填校验（错误集按精确文案增删，幂等）
// 约束: 校验从不返回 Err，只修改行错误集
// ==========================================

use crate::domain::{FieldDescriptor, ImportRow, RowIssue};

pub struct RowValidator;

impl RowValidator {
    /// 单字段必填校验
    ///
    /// # 返回
    /// - true: 该字段当前违反必填约束
    pub fn validate_mandatory(&self, row: &mut ImportRow, field: &FieldDescriptor) -> bool {
        if !field.is_mandatory {
            return false;
        }

        let message = RowIssue::mandatory(&field.display_name).to_string();
        if row.is_field_blank(&field.key) {
            row.add_error(message);
            true
        } else {
            row.remove_error(&message);
            false
        }
    }

    /// 整行必填校验
    ///
    /// # 返回
    /// - 违反必填约束的字段数
    pub fn validate_row(&self, row: &mut ImportRow, descriptors: &[FieldDescriptor]) -> usize {
        descriptors
            .iter()
            .filter(|field| self.validate_mandatory(row, field))
            .count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{CellValue, DataType};

    fn start_date() -> FieldDescriptor {
        FieldDescriptor::new("start_date", "Start Date", DataType::Date).mandatory()
    }

    #[test]
    fn test_toggle_never_accumulates() {
        let field = start_date();
        let mut row = ImportRow::new(0);

        for _ in 0..5 {
            row.set("start_date", CellValue::Null);
            RowValidator.validate_mandatory(&mut row, &field);
            RowValidator.validate_mandatory(&mut row, &field);
            assert_eq!(row.errors, vec!["Start Date is mandatory.".to_string()]);

            row.set("start_date", "2024-03-15");
            RowValidator.validate_mandatory(&mut row, &field);
            assert!(row.is_clean());
        }
    }

    #[test]
    fn test_absent_field_is_blank() {
        let mut row = ImportRow::new(0);
        assert!(RowValidator.validate_mandatory(&mut row, &start_date()));
    }

    #[test]
    fn test_optional_field_ignored() {
        let field = FieldDescriptor::new("notes", "Notes", DataType::Text);
        let mut row = ImportRow::new(0);
        assert!(!RowValidator.validate_mandatory(&mut row, &field));
        assert!(row.is_clean());
    }

    #[test]
    fn test_validate_row_keeps_other_errors() {
        let fields = vec![
            start_date(),
            FieldDescriptor::new("name", "Name", DataType::Text).mandatory(),
        ];
        let mut row = ImportRow::new(0);
        row.set("name", "Ann");
        row.add_error("Invalid Region: 'X' not found.");

        assert_eq!(RowValidator.validate_row(&mut row, &fields), 1);
        assert_eq!(
            row.errors,
            vec![
                "Invalid Region: 'X' not found.".to_string(),
                "Start Date is mandatory.".to_string()
            ]
        );
    }
}
