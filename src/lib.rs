// ==========================================
// 实体数据导入引擎 - 核心库
// ==========================================
// 职责: 异构表格文件（CSV/XLSX）对齐元数据驱动的目标 Schema，
//       逐格修正后批量提交
// 技术栈: Rust + SQLite（参考存储）
// ==========================================

// ==========================================
// 模块声明
// ==========================================

// 领域层 - 描述符 / 行 / 取值
pub mod domain;

// 数据仓储层 - 外部边界与参考实现
pub mod repository;

// 导入层 - 对齐 / 规范化 / 校验 / 组装 / 提交
pub mod importer;

// 配置层 - 导入配置
pub mod config;

// 数据库基础设施（连接初始化/PRAGMA 统一）
pub mod db;

// 日志系统
pub mod logging;

// API 层 - 界面接口
pub mod api;

// ==========================================
// 重导出核心类型
// ==========================================

pub use domain::{
    CellValue, DataType, EntityTarget, FieldDescriptor, ForeignKeyOption, ForeignKeyRef,
    ImportRow, ImportSummary, NormalizedValue,
};

pub use importer::{ForeignKeyIndex, ImportSession, PathComposer, SchemaContext};

pub use api::{ApiError, ImportApi, SubmitReport};

// ==========================================
// 常量定义
// ==========================================

// 系统版本
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

// 系统名称
pub const APP_NAME: &str = "实体数据导入引擎";
