// ==========================================
// 实体数据导入引擎 - 仓储层错误类型
// ==========================================
// 工具: thiserror 派生宏
// 说明: 仓储层错误即外部边界错误（Schema 查询 / 外键查询 / 批量写入）
// ==========================================

use thiserror::Error;

/// 仓储层错误类型
#[derive(Error, Debug)]
pub enum RepositoryError {
    // ===== 连接与事务 =====
    #[error("数据库连接失败: {0}")]
    DatabaseConnectionError(String),

    #[error("数据库锁获取失败: {0}")]
    LockError(String),

    #[error("数据库事务失败: {0}")]
    DatabaseTransactionError(String),

    #[error("数据库查询失败: {0}")]
    DatabaseQueryError(String),

    // ===== 元数据边界 =====
    #[error("记录未找到: {entity} with id={id}")]
    NotFound { entity: String, id: String },

    #[error("实体未注册: {0}")]
    EntityNotRegistered(String),

    #[error("非法标识符: {0}")]
    InvalidIdentifier(String),

    #[error("外键源表不可读: {table}: {message}")]
    LookupSourceError { table: String, message: String },

    // ===== 写入边界 =====
    #[error("写入数据违反约束: {0}")]
    ConstraintViolation(String),

    #[error("载荷序列化失败: {0}")]
    SerializationError(String),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl From<rusqlite::Error> for RepositoryError {
    fn from(err: rusqlite::Error) -> Self {
        match err {
            rusqlite::Error::SqliteFailure(code, msg)
                if code.code == rusqlite::ErrorCode::ConstraintViolation =>
            {
                RepositoryError::ConstraintViolation(msg.unwrap_or_else(|| code.to_string()))
            }
            rusqlite::Error::QueryReturnedNoRows => RepositoryError::NotFound {
                entity: "query".to_string(),
                id: "-".to_string(),
            },
            other => RepositoryError::DatabaseQueryError(other.to_string()),
        }
    }
}

impl From<serde_json::Error> for RepositoryError {
    fn from(err: serde_json::Error) -> Self {
        RepositoryError::SerializationError(err.to_string())
    }
}

/// Result 类型别名
pub type RepositoryResult<T> = Result<T, RepositoryError>;
