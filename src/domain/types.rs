// ==========================================
// 实体数据导入引擎 - 领域类型定义
// ==========================================
// 职责: 字段数据类型 / 单元格取值 / 规范化结果
// ==========================================

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fmt;

// ==========================================
// 字段数据类型 (Data Type)
// ==========================================
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DataType {
    Text,
    Number,
    Date,
    Timestamp,
    Boolean,
    Other,
}

impl DataType {
    /// 从外部 Schema 的类型名解析（大小写不敏感，兼容常见 SQL 类型名）
    pub fn from_type_name(raw: &str) -> Self {
        let name = raw.trim().to_lowercase();
        match name.as_str() {
            "text" | "varchar" | "character varying" | "char" | "character" | "string"
            | "uuid" => DataType::Text,
            "number" | "numeric" | "decimal" | "integer" | "int" | "int2" | "int4" | "int8"
            | "smallint" | "bigint" | "real" | "float" | "float4" | "float8"
            | "double precision" => DataType::Number,
            "date" => DataType::Date,
            "boolean" | "bool" => DataType::Boolean,
            _ if name.starts_with("timestamp") => DataType::Timestamp,
            _ => DataType::Other,
        }
    }

    /// 日期或时间戳类（需要日期规范化）
    pub fn is_temporal(&self) -> bool {
        matches!(self, DataType::Date | DataType::Timestamp)
    }
}

impl fmt::Display for DataType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DataType::Text => write!(f, "text"),
            DataType::Number => write!(f, "number"),
            DataType::Date => write!(f, "date"),
            DataType::Timestamp => write!(f, "timestamp"),
            DataType::Boolean => write!(f, "boolean"),
            DataType::Other => write!(f, "other"),
        }
    }
}

// ==========================================
// 单元格取值 (Cell Value)
// ==========================================
// 行内每个规范字段对应一个标量: string | number | boolean | null
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(untagged)]
pub enum CellValue {
    #[default]
    Null,
    Bool(bool),
    Number(f64),
    Text(String),
}

impl CellValue {
    pub fn is_null(&self) -> bool {
        matches!(self, CellValue::Null)
    }

    /// 空值判定: null 或 TRIM 后为空字符串
    pub fn is_blank(&self) -> bool {
        match self {
            CellValue::Null => true,
            CellValue::Text(s) => s.trim().is_empty(),
            _ => false,
        }
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            CellValue::Text(s) => Some(s.as_str()),
            _ => None,
        }
    }

    /// 转为 JSON 值（整数值的浮点数输出为整数）
    pub fn to_json(&self) -> serde_json::Value {
        match self {
            CellValue::Null => serde_json::Value::Null,
            CellValue::Bool(b) => serde_json::Value::Bool(*b),
            CellValue::Number(n) => {
                if is_integral(*n) {
                    serde_json::Value::from(*n as i64)
                } else {
                    serde_json::Number::from_f64(*n)
                        .map(serde_json::Value::Number)
                        .unwrap_or(serde_json::Value::Null)
                }
            }
            CellValue::Text(s) => serde_json::Value::String(s.clone()),
        }
    }

    /// 从 JSON 标量构造（对象/数组按其 JSON 文本保存）
    pub fn from_json(value: &serde_json::Value) -> Self {
        match value {
            serde_json::Value::Null => CellValue::Null,
            serde_json::Value::Bool(b) => CellValue::Bool(*b),
            serde_json::Value::Number(n) => n.as_f64().map(CellValue::Number).unwrap_or_default(),
            serde_json::Value::String(s) => CellValue::Text(s.clone()),
            other => CellValue::Text(other.to_string()),
        }
    }
}

fn is_integral(n: f64) -> bool {
    n.is_finite() && n.fract() == 0.0 && n.abs() < 1e15
}

impl fmt::Display for CellValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CellValue::Null => Ok(()),
            CellValue::Bool(b) => write!(f, "{}", b),
            CellValue::Number(n) if is_integral(*n) => write!(f, "{}", *n as i64),
            CellValue::Number(n) => write!(f, "{}", n),
            CellValue::Text(s) => write!(f, "{}", s),
        }
    }
}

impl From<&str> for CellValue {
    fn from(value: &str) -> Self {
        CellValue::Text(value.to_string())
    }
}

impl From<String> for CellValue {
    fn from(value: String) -> Self {
        CellValue::Text(value)
    }
}

impl From<f64> for CellValue {
    fn from(value: f64) -> Self {
        CellValue::Number(value)
    }
}

impl From<i64> for CellValue {
    fn from(value: i64) -> Self {
        CellValue::Number(value as f64)
    }
}

impl From<bool> for CellValue {
    fn from(value: bool) -> Self {
        CellValue::Bool(value)
    }
}

impl<T: Into<CellValue>> From<Option<T>> for CellValue {
    fn from(value: Option<T>) -> Self {
        value.map(Into::into).unwrap_or(CellValue::Null)
    }
}

// ==========================================
// 规范化结果 (Normalized Value)
// ==========================================
// 类型规范化阶段的显式标签输出，写回行前转为 CellValue
#[derive(Debug, Clone, PartialEq)]
pub enum NormalizedValue {
    Text(String),
    Number(f64),
    Boolean(bool),
    Date(NaiveDate),
    Null,
}

impl NormalizedValue {
    pub fn into_cell(self) -> CellValue {
        match self {
            NormalizedValue::Text(s) => CellValue::Text(s),
            NormalizedValue::Number(n) => CellValue::Number(n),
            NormalizedValue::Boolean(b) => CellValue::Bool(b),
            NormalizedValue::Date(d) => CellValue::Text(d.format("%Y-%m-%d").to_string()),
            NormalizedValue::Null => CellValue::Null,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_data_type_from_type_name() {
        assert_eq!(DataType::from_type_name("VARCHAR"), DataType::Text);
        assert_eq!(DataType::from_type_name("bigint"), DataType::Number);
        assert_eq!(DataType::from_type_name("date"), DataType::Date);
        assert_eq!(
            DataType::from_type_name("timestamp with time zone"),
            DataType::Timestamp
        );
        assert_eq!(DataType::from_type_name("jsonb"), DataType::Other);
        assert!(DataType::Timestamp.is_temporal());
        assert!(!DataType::Text.is_temporal());
    }

    #[test]
    fn test_cell_value_blank() {
        assert!(CellValue::Null.is_blank());
        assert!(CellValue::from("   ").is_blank());
        assert!(!CellValue::from("x").is_blank());
        assert!(!CellValue::Number(0.0).is_blank());
        assert!(!CellValue::Bool(false).is_blank());
    }

    #[test]
    fn test_cell_value_display_and_json() {
        assert_eq!(CellValue::Number(42.0).to_string(), "42");
        assert_eq!(CellValue::Number(2.5).to_string(), "2.5");
        assert_eq!(CellValue::Number(42.0).to_json(), serde_json::json!(42));
        assert_eq!(CellValue::Null.to_json(), serde_json::Value::Null);
        assert_eq!(
            CellValue::from_json(&serde_json::json!("r1")),
            CellValue::from("r1")
        );
    }

    #[test]
    fn test_cell_value_untagged_serde() {
        let values: Vec<CellValue> =
            serde_json::from_str(r#"[null, true, 1.5, "abc"]"#).unwrap();
        assert_eq!(
            values,
            vec![
                CellValue::Null,
                CellValue::Bool(true),
                CellValue::Number(1.5),
                CellValue::from("abc"),
            ]
        );
    }

    #[test]
    fn test_normalized_date_into_cell() {
        let date = NaiveDate::from_ymd_opt(2024, 3, 15).unwrap();
        assert_eq!(
            NormalizedValue::Date(date).into_cell(),
            CellValue::from("2024-03-15")
        );
    }
}
