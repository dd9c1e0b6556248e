// ==========================================
// 实体数据导入引擎 - 类型规范化实现
// ==========================================
// 职责: 日期 → YYYY-MM-DD / 数值 / 布尔 / 空值 → null
// 约束: 无法解析的原值原样保留，绝不静默置空
// ==========================================

use crate::domain::{CellValue, DataType, NormalizedValue};
use crate::importer::import_traits::TypeNormalizer as TypeNormalizerTrait;
use chrono::{DateTime, NaiveDate, NaiveDateTime};

/// 默认可接受的日期输入格式（按顺序尝试，月/日优先于日/月）
pub const DEFAULT_DATE_FORMATS: &[&str] = &[
    "%Y-%m-%d",
    "%Y/%m/%d",
    "%Y.%m.%d",
    "%Y%m%d",
    "%m/%d/%Y",
    "%m-%d-%Y",
    "%d.%m.%Y",
    "%B %d, %Y",
    "%b %d, %Y",
    "%d %B %Y",
    "%d %b %Y",
];

/// 带时间部分的输入格式（取日期部分）
const DATETIME_FORMATS: &[&str] = &[
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%d %H:%M",
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y/%m/%d %H:%M:%S",
    "%m/%d/%Y %H:%M:%S",
    "%m/%d/%Y %H:%M",
];

pub struct TypeNormalizer {
    date_formats: Vec<String>,
}

impl Default for TypeNormalizer {
    fn default() -> Self {
        Self::new(DEFAULT_DATE_FORMATS.iter().map(|f| f.to_string()).collect())
    }
}

impl TypeNormalizer {
    pub fn new(date_formats: Vec<String>) -> Self {
        Self { date_formats }
    }

    /// 宽松日期解析: RFC3339 → 带时间格式 → 纯日期格式
    pub fn parse_date(&self, value: &str) -> Option<NaiveDate> {
        let trimmed = value.trim();
        if trimmed.is_empty() {
            return None;
        }

        if let Ok(dt) = DateTime::parse_from_rfc3339(trimmed) {
            return Some(dt.date_naive());
        }

        DATETIME_FORMATS
            .iter()
            .find_map(|fmt| NaiveDateTime::parse_from_str(trimmed, fmt).ok())
            .map(|dt| dt.date())
            .or_else(|| {
                self.date_formats
                    .iter()
                    .find_map(|fmt| NaiveDate::parse_from_str(trimmed, fmt).ok())
            })
    }

    pub fn parse_number(&self, value: &str) -> Option<f64> {
        value.trim().parse::<f64>().ok().filter(|n| n.is_finite())
    }

    pub fn parse_boolean(&self, value: &str) -> Option<bool> {
        match value.trim().to_lowercase().as_str() {
            "true" | "yes" | "y" | "1" => Some(true),
            "false" | "no" | "n" | "0" => Some(false),
            _ => None,
        }
    }

    fn keep_raw(value: &CellValue) -> NormalizedValue {
        match value {
            CellValue::Null => NormalizedValue::Null,
            CellValue::Bool(b) => NormalizedValue::Boolean(*b),
            CellValue::Number(n) => NormalizedValue::Number(*n),
            CellValue::Text(s) => NormalizedValue::Text(s.clone()),
        }
    }
}

impl TypeNormalizerTrait for TypeNormalizer {
    fn normalize(&self, value: &CellValue, data_type: DataType) -> NormalizedValue {
        let text = match value {
            CellValue::Text(s) if !s.trim().is_empty() => s.as_str(),
            _ => return Self::keep_raw(value),
        };

        let parsed = match data_type {
            DataType::Date | DataType::Timestamp => self.parse_date(text).map(NormalizedValue::Date),
            DataType::Number => self.parse_number(text).map(NormalizedValue::Number),
            DataType::Boolean => self.parse_boolean(text).map(NormalizedValue::Boolean),
            DataType::Text | DataType::Other => None,
        };

        parsed.unwrap_or_else(|| Self::keep_raw(value))
    }

    fn normalize_null(&self, value: CellValue) -> CellValue {
        if value.is_blank() {
            CellValue::Null
        } else {
            value
        }
    }
}
