// ==========================================
// 服装生产排程系统 - 快照仓储错误类型
// ==========================================
// 工具: thiserror 派生宏
// 红线: 快照行解析失败必须带出字段名与原值
// ==========================================

use thiserror::Error;

/// 快照仓储错误
#[derive(Error, Debug)]
pub enum RepositoryError {
    #[error("快照库连接失败: {0}")]
    DatabaseConnectionError(String),

    #[error("快照库锁获取失败: {0}")]
    LockError(String),

    #[error("快照写入事务失败: {0}")]
    DatabaseTransactionError(String),

    #[error("快照查询失败: {0}")]
    DatabaseQueryError(String),

    /// 同一作业 / 资源 ID 重复写入等
    #[error("快照约束违反: {0}")]
    ConstraintViolation(String),

    #[error("快照字段无法解析 (field={field}, value={value}): {message}")]
    FieldValueError {
        field: String,
        value: String,
        message: String,
    },

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
            rusqlite::Error::SqliteFailure(code, _)
                if matches!(
                    code.code,
                    rusqlite::ErrorCode::CannotOpen
                        | rusqlite::ErrorCode::NotADatabase
                        | rusqlite::ErrorCode::PermissionDenied
                ) =>
            {
                RepositoryError::DatabaseConnectionError(err.to_string())
            }
            other => RepositoryError::DatabaseQueryError(other.to_string()),
        }
    }
}

pub type RepositoryResult<T> = Result<T, RepositoryError>;

#[cfg(test)]
mod tests {
    use super::*;
    use rusqlite::Connection;

    #[test]
    fn test_duplicate_key_maps_to_constraint_violation() {
        let conn = Connection::open_in_memory().unwrap();
        conn.execute("CREATE TABLE t (id TEXT PRIMARY KEY)", []).unwrap();
        conn.execute("INSERT INTO t (id) VALUES ('J1')", []).unwrap();

        let err: RepositoryError = conn
            .execute("INSERT INTO t (id) VALUES ('J1')", [])
            .unwrap_err()
            .into();

        assert!(matches!(err, RepositoryError::ConstraintViolation(_)));
    }

    #[test]
    fn test_query_error_keeps_message() {
        let conn = Connection::open_in_memory().unwrap();
        let err: RepositoryError = conn.execute("SELECT * FROM missing", []).unwrap_err().into();

        match err {
            RepositoryError::DatabaseQueryError(msg) => assert!(msg.contains("missing")),
            other => panic!("unexpected error: {:?}", other),
        }
    }
}
