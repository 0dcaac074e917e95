// ==========================================
// 服装生产排程系统 - API层错误类型
// ==========================================
// 职责: 定义门面层错误类型，转换下层错误为用户可读的错误消息
// 红线: 引擎内的作业 / 工位级问题走诊断，不上抛为错误
// ==========================================

use crate::config::error::ConfigError;
use crate::importer::error::ImportError;
use crate::repository::error::RepositoryError;
use thiserror::Error;

/// API层错误类型
#[derive(Error, Debug)]
pub enum ApiError {
    // ==========================================
    // 输入契约错误
    // ==========================================
    #[error("无效输入: {0}")]
    InvalidInput(String),

    #[error("资源未找到: {0}")]
    NotFound(String),

    // ==========================================
    // 数据访问错误
    // ==========================================
    #[error("数据库错误: {0}")]
    DatabaseError(String),

    #[error("数据库连接失败: {0}")]
    DatabaseConnectionError(String),

    #[error("数据库事务失败: {0}")]
    DatabaseTransactionError(String),

    #[error("数据源读取失败: {0}")]
    DataSourceError(String),

    // ==========================================
    // 配置 / 导入错误
    // ==========================================
    #[error("配置错误: {0}")]
    ConfigError(String),

    #[error("文件导入失败: {0}")]
    ImportError(String),

    // ==========================================
    // 通用错误
    // ==========================================
    #[error("内部错误: {0}")]
    InternalError(String),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

// ==========================================
// 从 RepositoryError 转换
// ==========================================
impl From<RepositoryError> for ApiError {
    fn from(err: RepositoryError) -> Self {
        match err {
            RepositoryError::DatabaseConnectionError(msg) => ApiError::DatabaseConnectionError(msg),
            RepositoryError::DatabaseTransactionError(msg) => {
                ApiError::DatabaseTransactionError(msg)
            }
            RepositoryError::LockError(msg) => {
                ApiError::DatabaseConnectionError(format!("快照库锁获取失败: {}", msg))
            }
            RepositoryError::DatabaseQueryError(msg) => ApiError::DatabaseError(msg),
            RepositoryError::ConstraintViolation(msg) => {
                ApiError::InvalidInput(format!("快照约束违反: {}", msg))
            }
            RepositoryError::FieldValueError { field, value, message } => {
                ApiError::DataSourceError(format!(
                    "快照字段 {}={} 无法解析: {}",
                    field, value, message
                ))
            }
            RepositoryError::Other(err) => ApiError::Other(err),
        }
    }
}

// ==========================================
// 从 ConfigError 转换
// ==========================================
impl From<ConfigError> for ApiError {
    fn from(err: ConfigError) -> Self {
        match err {
            ConfigError::LockError(msg) => {
                ApiError::DatabaseConnectionError(format!("数据库锁获取失败: {}", msg))
            }
            ConfigError::DatabaseError(msg) => ApiError::DatabaseError(msg),
            other => ApiError::ConfigError(other.to_string()),
        }
    }
}

// ==========================================
// 从 ImportError 转换
// ==========================================
impl From<ImportError> for ApiError {
    fn from(err: ImportError) -> Self {
        match err {
            ImportError::FileNotFound(path) => {
                ApiError::NotFound(crate::i18n::t_with_args(
                    "import.file_not_found",
                    &[("path", &path)],
                ))
            }
            ImportError::Other(err) => ApiError::Other(err),
            other => ApiError::ImportError(other.to_string()),
        }
    }
}

impl From<tokio::task::JoinError> for ApiError {
    fn from(err: tokio::task::JoinError) -> Self {
        ApiError::InternalError(format!("计算任务异常终止: {}", err))
    }
}

/// Result 类型别名
pub type ApiResult<T> = Result<T, ApiError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_repository_error_conversion() {
        let api_err: ApiError = RepositoryError::ConstraintViolation(
            "UNIQUE constraint failed: jobs.job_id".to_string(),
        )
        .into();
        assert!(matches!(api_err, ApiError::InvalidInput(msg) if msg.contains("jobs.job_id")));

        let api_err: ApiError = RepositoryError::FieldValueError {
            field: "priority".to_string(),
            value: "ASAP".to_string(),
            message: "未知优先级: ASAP".to_string(),
        }
        .into();
        assert!(matches!(api_err, ApiError::DataSourceError(msg) if msg.contains("priority=ASAP")));
    }

    #[test]
    fn test_config_error_conversion() {
        let api_err: ApiError =
            ConfigError::ValidationError("horizon_days 必须大于 0".to_string()).into();
        match api_err {
            ApiError::ConfigError(msg) => assert!(msg.contains("horizon_days")),
            _ => panic!("Expected ConfigError"),
        }
    }

    #[test]
    fn test_import_error_conversion() {
        let api_err: ApiError = ImportError::FileNotFound("jobs.csv".to_string()).into();
        match api_err {
            ApiError::NotFound(msg) => assert!(msg.contains("jobs.csv")),
            _ => panic!("Expected NotFound"),
        }

        let api_err: ApiError = ImportError::MissingField {
            row: 3,
            field: "deadline".to_string(),
        }
        .into();
        assert!(matches!(api_err, ApiError::ImportError(msg) if msg.contains("deadline")));
    }
}
