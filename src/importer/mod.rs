// ==========================================
// 实体数据导入引擎 - 导入层
// ==========================================
// 流程: 文件解析 → 列对齐 → 类型规范化 + 初始校验
//       → 逐格编辑（字段级重校验 + 外键解析）
//       → 路径组装 / 剪枝 → 批量提交
// 支持: Excel, CSV
// ==========================================

// 模块声明
pub mod batch_submitter;
pub mod column_reconciler;
pub mod error;
pub mod file_parser;
pub mod fk_resolver;
pub mod import_session;
pub mod import_traits;
pub mod path_composer;
pub mod row_validator;
pub mod schema_context;
pub mod template;
pub mod type_normalizer;

// 重导出核心类型
pub use batch_submitter::{BatchSubmitter, SubmitOutcome};
pub use column_reconciler::ColumnReconciler as ColumnReconcilerImpl;
pub use error::{ImportError, ImportResult};
pub use file_parser::{CsvParser, ExcelParser, FileFormat, UniversalFileParser};
pub use fk_resolver::{FkOutcome, ForeignKeyIndex, ForeignKeyResolver};
pub use import_session::ImportSession;
pub use path_composer::PathComposer;
pub use row_validator::RowValidator;
pub use schema_context::SchemaContext;
pub use template::build_template_csv;
pub use type_normalizer::TypeNormalizer as TypeNormalizerImpl;

// 重导出 Trait 接口
pub use import_traits::{ColumnReconciler, FileParser, RawRecord, TypeNormalizer};
