// ==========================================
// 实体数据导入引擎 - API层错误类型
// ==========================================
// 职责: 定义API层错误类型，转换导入层/仓储层错误为面向界面的错误
// 说明: 行级校验错误不在此处，它们保存在 ImportRow.errors 中
// ==========================================

use crate::importer::error::ImportError;
use crate::repository::error::RepositoryError;
use thiserror::Error;

/// API层错误类型
#[derive(Error, Debug)]
pub enum ApiError {
    // ==========================================
    // 会话状态错误
    // ==========================================
    #[error("尚未选择目标实体")]
    NoEntitySelected,

    #[error("没有进行中的导入会话")]
    NoActiveSession,

    /// 提交时无可用行（非致命，会话保留）
    #[error("没有可提交的有效数据")]
    NoValidData,

    // ==========================================
    // 输入错误
    // ==========================================
    #[error("无效输入: {0}")]
    InvalidInput(String),

    #[error("资源未找到: {0}")]
    NotFound(String),

    // ==========================================
    // 边界 I/O 错误
    // ==========================================
    #[error("文件导入失败: {0}")]
    ImportError(String),

    #[error("目标实体元数据加载失败: {0}")]
    SchemaLoad(String),

    /// 批量写入失败（原样透传边界错误，会话保留以便重试）
    #[error("批量写入失败: {0}")]
    BatchWrite(String),

    #[error("配置读取失败: {0}")]
    ConfigError(String),

    // ==========================================
    // 数据访问错误
    // ==========================================
    #[error("数据库错误: {0}")]
    DatabaseError(String),

    #[error("数据库连接失败: {0}")]
    DatabaseConnectionError(String),

    #[error("数据库事务失败: {0}")]
    DatabaseTransactionError(String),

    // ==========================================
    // 通用错误
    // ==========================================
    #[error("内部错误: {0}")]
    InternalError(String),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

// ==========================================
// 从 ImportError 转换
// ==========================================
impl From<ImportError> for ApiError {
    fn from(err: ImportError) -> Self {
        match err {
            ImportError::RowNotFound(row_key) => {
                ApiError::InvalidInput(format!("行不存在: row_key={}", row_key))
            }
            ImportError::UnknownField(field) => {
                ApiError::InvalidInput(format!("字段不属于当前实体: {}", field))
            }
            ImportError::InternalError(msg) => ApiError::InternalError(msg),
            ImportError::Other(err) => ApiError::Other(err),
            other => ApiError::ImportError(other.to_string()),
        }
    }
}

// ==========================================
// 从 RepositoryError 转换
// ==========================================
impl From<RepositoryError> for ApiError {
    fn from(err: RepositoryError) -> Self {
        match err {
            RepositoryError::NotFound { entity, id } => {
                ApiError::NotFound(format!("{}(id={})不存在", entity, id))
            }
            RepositoryError::EntityNotRegistered(entity_id) => {
                ApiError::NotFound(format!("实体{}未注册", entity_id))
            }
            RepositoryError::DatabaseConnectionError(msg) => ApiError::DatabaseConnectionError(msg),
            RepositoryError::DatabaseTransactionError(msg) => {
                ApiError::DatabaseTransactionError(msg)
            }
            RepositoryError::LockError(msg) => {
                ApiError::DatabaseConnectionError(format!("数据库锁获取失败: {}", msg))
            }
            RepositoryError::InvalidIdentifier(msg) => {
                ApiError::InvalidInput(format!("非法标识符: {}", msg))
            }
            RepositoryError::Other(err) => ApiError::Other(err),
            other => ApiError::DatabaseError(other.to_string()),
        }
    }
}

/// Result 类型别名
pub type ApiResult<T> = Result<T, ApiError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_import_error_mapping() {
        let err: ApiError = ImportError::RowNotFound(3).into();
        assert!(matches!(err, ApiError::InvalidInput(_)));

        let err: ApiError = ImportError::MissingHeader.into();
        assert!(matches!(err, ApiError::ImportError(_)));

        let err: ApiError = ImportError::InternalError("utf8".to_string()).into();
        assert_eq!(err.to_string(), "内部错误: utf8");
    }

    #[test]
    fn test_repository_error_mapping() {
        let err: ApiError = RepositoryError::EntityNotRegistered("x".to_string()).into();
        assert!(matches!(err, ApiError::NotFound(_)));

        let err: ApiError = RepositoryError::DatabaseQueryError("boom".to_string()).into();
        assert_eq!(err.to_string(), "数据库错误: 数据库查询失败: boom");
    }
}
