// ==========================================
// 实体数据导入引擎 - 列对齐器实现
// ==========================================
// 职责: 任意表头 → 规范字段键
// 匹配优先级（每个描述符独立查找，首个命中即止）:
//   (a) 规范键精确匹配（大小写不敏感，空格 → 下划线）
//   (b) 显示名精确匹配（同上规范化）
//   (c) 表头包含规范键
//   (d) 表头包含显示名
//   兜底: 显示名原文作为查找键（同样只在未占用表头中查找）
// 歧义: 同一表头被多个描述符命中时，先声明者获得；后者继续向下匹配或保持缺失
// 映射按整份文件的表头一次解析，逐行套用
// ==========================================

use crate::domain::FieldDescriptor;
use crate::importer::import_traits::ColumnReconciler as ColumnReconcilerTrait;
use std::collections::HashSet;

pub struct ColumnReconciler;

/// 表头/键规范化: TRIM + 小写 + 空白 → 下划线
fn normalize_header(value: &str) -> String {
    value
        .trim()
        .to_lowercase()
        .chars()
        .map(|c| if c.is_whitespace() { '_' } else { c })
        .collect()
}

impl ColumnReconciler {
    /// 为单个描述符选择表头
    ///
    /// headers 须已排序去重，claimed 为已被先声明描述符占用的表头
    fn match_header<'a>(
        field: &FieldDescriptor,
        headers: &[&'a str],
        claimed: &HashSet<&'a str>,
    ) -> Option<&'a str> {
        let key = normalize_header(&field.key);
        let display = normalize_header(&field.display_name);

        let candidates: Vec<(&'a str, String)> = headers
            .iter()
            .filter(|h| !claimed.contains(*h))
            .map(|h| (*h, normalize_header(h)))
            .collect();

        let exact_key = candidates.iter().find(|(_, n)| *n == key);
        let exact_display = || candidates.iter().find(|(_, n)| *n == display);
        let contains_key = || {
            candidates
                .iter()
                .find(|(_, n)| !key.is_empty() && n.contains(key.as_str()))
        };
        let contains_display = || {
            candidates
                .iter()
                .find(|(_, n)| !display.is_empty() && n.contains(display.as_str()))
        };

        // 兜底: 显示名原文
        let literal = || candidates.iter().find(|(h, _)| *h == field.display_name);

        exact_key
            .or_else(exact_display)
            .or_else(contains_key)
            .or_else(contains_display)
            .or_else(literal)
            .map(|(header, _)| *header)
    }

    /// 依描述符顺序解析所有字段的表头（None 表示未命中）
    fn resolve<'a>(
        headers: &[&'a str],
        descriptors: &[FieldDescriptor],
    ) -> Vec<Option<&'a str>> {
        let mut claimed: HashSet<&'a str> = HashSet::new();
        descriptors
            .iter()
            .map(|field| {
                let matched = Self::match_header(field, headers, &claimed);
                if let Some(header) = matched {
                    claimed.insert(header);
                }
                matched
            })
            .collect()
    }
}

impl ColumnReconcilerTrait for ColumnReconciler {
    fn resolve_headers(
        &self,
        headers: &[String],
        descriptors: &[FieldDescriptor],
    ) -> Vec<(String, String)> {
        let mut ordered: Vec<&str> = headers.iter().map(String::as_str).collect();
        ordered.sort_unstable();
        ordered.dedup();

        let resolved = Self::resolve(&ordered, descriptors);
        descriptors
            .iter()
            .zip(resolved)
            .filter_map(|(field, matched)| Some((field.key.clone(), matched?.to_string())))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{CellValue, DataType};
    use crate::importer::import_traits::RawRecord;

    fn raw(pairs: &[(&str, &str)]) -> RawRecord {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn test_exact_key_match_case_insensitive() {
        let fields = vec![FieldDescriptor::new("start_date", "Begin", DataType::Date)];
        let row = ColumnReconciler.reconcile(&raw(&[("START DATE", "2024-01-01")]), &fields, 0);
        assert_eq!(row.get("start_date"), Some(&CellValue::from("2024-01-01")));
    }

    #[test]
    fn test_display_name_match() {
        let fields = vec![FieldDescriptor::new("dob", "Date of Birth", DataType::Date)];
        let row = ColumnReconciler.reconcile(&raw(&[("date of birth", "1990-05-01")]), &fields, 0);
        assert_eq!(row.get("dob"), Some(&CellValue::from("1990-05-01")));
    }

    #[test]
    fn test_substring_match() {
        let fields = vec![FieldDescriptor::new("phone", "Telephone", DataType::Text)];
        let row = ColumnReconciler.reconcile(&raw(&[("Mobile Phone No", "555")]), &fields, 0);
        assert_eq!(row.get("phone"), Some(&CellValue::from("555")));
    }

    #[test]
    fn test_exact_match_beats_substring_regardless_of_header_order() {
        let fields = vec![FieldDescriptor::new("email", "Email", DataType::Text)];

        let a = raw(&[("Customer Email", "c@x.io"), ("email", "e@x.io")]);
        let b = raw(&[("email", "e@x.io"), ("Customer Email", "c@x.io")]);

        let row_a = ColumnReconciler.reconcile(&a, &fields, 0);
        let row_b = ColumnReconciler.reconcile(&b, &fields, 0);

        assert_eq!(row_a.get("email"), Some(&CellValue::from("e@x.io")));
        assert_eq!(row_a.values, row_b.values);
    }

    #[test]
    fn test_first_declared_descriptor_wins_ambiguous_header() {
        let fields = vec![
            FieldDescriptor::new("contact.email", "Email", DataType::Text),
            FieldDescriptor::new("billing_email", "Email", DataType::Text),
        ];
        let row = ColumnReconciler.reconcile(&raw(&[("Email", "a@x.io")]), &fields, 0);

        assert_eq!(row.get("contact.email"), Some(&CellValue::from("a@x.io")));
        // 表头已被先声明者占用，兜底不再读取
        assert!(row.get("billing_email").is_none());
    }

    #[test]
    fn test_later_descriptor_falls_through_to_own_match() {
        let fields = vec![
            FieldDescriptor::new("email", "Email", DataType::Text),
            FieldDescriptor::new("work_email", "Work Email", DataType::Text),
        ];
        let row = ColumnReconciler.reconcile(
            &raw(&[("Email", "home@x.io"), ("Work Email", "work@x.io")]),
            &fields,
            0,
        );
        assert_eq!(row.get("email"), Some(&CellValue::from("home@x.io")));
        assert_eq!(row.get("work_email"), Some(&CellValue::from("work@x.io")));
    }

    #[test]
    fn test_unmatched_field_is_absent() {
        let fields = vec![FieldDescriptor::new("region", "Region", DataType::Text)];
        let row = ColumnReconciler.reconcile(&raw(&[("Name", "Ann")]), &fields, 7);
        assert_eq!(row.row_key, 7);
        assert!(row.get("region").is_none());
        assert!(row.is_clean());
    }

    #[test]
    fn test_resolve_headers_report() {
        let fields = vec![
            FieldDescriptor::new("name", "Name", DataType::Text),
            FieldDescriptor::new("region", "Region", DataType::Text),
        ];
        let headers = vec!["Full Name".to_string(), "Notes".to_string()];
        let mapping = ColumnReconciler.resolve_headers(&headers, &fields);
        assert_eq!(mapping, vec![("name".to_string(), "Full Name".to_string())]);
    }

    #[test]
    fn test_shared_mapping_keeps_short_row_consistent() {
        let fields = vec![
            FieldDescriptor::new("region", "Region", DataType::Text),
            FieldDescriptor::new("region_code", "Region Code", DataType::Text),
        ];
        let headers = vec!["Region Code".to_string(), "Region".to_string()];
        let mapping = ColumnReconciler.resolve_headers(&headers, &fields);

        // 该行缺少 Region 列，region 不应借用 Region Code 的值
        let short = raw(&[("Region Code", "RC-9")]);
        let row = ColumnReconciler.apply_mapping(&short, &mapping, 0);
        assert!(row.get("region").is_none());
        assert_eq!(row.get("region_code"), Some(&CellValue::from("RC-9")));
    }
}
