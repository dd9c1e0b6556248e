// ==========================================
// 实体数据导入引擎 - 目标 Schema 描述
// ==========================================
// 职责: 字段描述符 / 外键引用 / 目标实体
// 约束: 一次导入会话内只读
// ==========================================

use crate::domain::types::{CellValue, DataType};
use serde::{Deserialize, Serialize};

// ==========================================
// ForeignKeyRef - 外键引用
// ==========================================
// 查询: SELECT display_column, source_column FROM source_schema.source_table
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ForeignKeyRef {
    pub source_schema: String,
    pub source_table: String,
    pub source_column: String,  // 代理键列（写回的 id）
    pub display_column: String, // 人类可读标签列
}

impl ForeignKeyRef {
    pub fn new(
        source_schema: impl Into<String>,
        source_table: impl Into<String>,
        source_column: impl Into<String>,
        display_column: impl Into<String>,
    ) -> Self {
        Self {
            source_schema: source_schema.into(),
            source_table: source_table.into(),
            source_column: source_column.into(),
            display_column: display_column.into(),
        }
    }

    /// "schema.table"
    pub fn qualified_table(&self) -> String {
        format!("{}.{}", self.source_schema, self.source_table)
    }
}

// ==========================================
// ForeignKeyOption - 外键候选项 {label, id}
// ==========================================
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ForeignKeyOption {
    pub label: String,
    pub id: CellValue,
}

impl ForeignKeyOption {
    pub fn new(label: impl Into<String>, id: impl Into<CellValue>) -> Self {
        Self {
            label: label.into(),
            id: id.into(),
        }
    }
}

// ==========================================
// FieldDescriptor - 目标列描述符
// ==========================================
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldDescriptor {
    pub key: String, // 规范键，可含 '.' 路径（如 details.contact_email）
    pub display_name: String,
    pub data_type: DataType,
    pub is_mandatory: bool,
    pub is_displayable: bool,
    pub is_template_column: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub foreign_key: Option<ForeignKeyRef>,
}

impl FieldDescriptor {
    /// 创建描述符（默认: 非必填、可显示、属于模板列、无外键）
    pub fn new(key: impl Into<String>, display_name: impl Into<String>, data_type: DataType) -> Self {
        Self {
            key: key.into(),
            display_name: display_name.into(),
            data_type,
            is_mandatory: false,
            is_displayable: true,
            is_template_column: true,
            foreign_key: None,
        }
    }

    pub fn mandatory(mut self) -> Self {
        self.is_mandatory = true;
        self
    }

    pub fn hidden(mut self) -> Self {
        self.is_displayable = false;
        self
    }

    pub fn without_template(mut self) -> Self {
        self.is_template_column = false;
        self
    }

    pub fn with_foreign_key(mut self, foreign_key: ForeignKeyRef) -> Self {
        self.foreign_key = Some(foreign_key);
        self
    }
}

// ==========================================
// EntityTarget - 导入目标实体
// ==========================================
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EntityTarget {
    pub entity_id: String,
    pub schema: String,
    pub table: String,
}

impl EntityTarget {
    pub fn new(
        entity_id: impl Into<String>,
        schema: impl Into<String>,
        table: impl Into<String>,
    ) -> Self {
        Self {
            entity_id: entity_id.into(),
            schema: schema.into(),
            table: table.into(),
        }
    }

    /// 批量写入目标表名 "{entity_schema}.{entity_type}"
    pub fn qualified_name(&self) -> String {
        format!("{}.{}", self.schema, self.table)
    }
}
