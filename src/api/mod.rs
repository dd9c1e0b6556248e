// ==========================================
// 实体数据导入引擎 - API 层
// ==========================================
// 职责: 提供界面侧导入接口（行列表 / 单元格编辑 / 提交）
// ==========================================

pub mod error;
pub mod import_api;

// 重导出核心类型
pub use error::{ApiError, ApiResult};
pub use import_api::{ImportApi, SubmitReport};
