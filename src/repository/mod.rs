// ==========================================
// 实体数据导入引擎 - 数据仓储层
// ==========================================
// 职责: 外部边界接口（Schema 查询 / 外键查询 / 批量写入）及 SQLite 参考实现
// 约束: 所有取值查询使用参数化；动态表名/列名经标识符校验
// ==========================================

pub mod batch_writer;
pub mod error;
pub mod schema_store;
pub mod sqlite_store;

pub use batch_writer::BatchWriter;
pub use error::{RepositoryError, RepositoryResult};
pub use schema_store::{EntitySummary, SchemaStore};
pub use sqlite_store::SqliteEntityStore;
