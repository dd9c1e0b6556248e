// ==========================================
// 实体数据导入引擎 - 领域模型层
// ==========================================
// 职责: 定义 Schema 描述、导入行、取值类型
// 红线: 不含数据访问逻辑,不含导入流程逻辑
// ==========================================

pub mod row;
pub mod schema;
pub mod types;

// 重导出核心类型
pub use row::{ImportRow, ImportSummary, RowIssue};
pub use schema::{EntityTarget, FieldDescriptor, ForeignKeyOption, ForeignKeyRef};
pub use types::{CellValue, DataType, NormalizedValue};
