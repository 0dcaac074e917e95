// ==========================================
// 服装生产排程系统 - 配置层错误类型
// ==========================================
// 工具: thiserror 派生宏
// ==========================================

use thiserror::Error;

/// 配置层错误类型
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("配置读取失败 (key: {key}): {message}")]
    ReadError { key: String, message: String },

    #[error("配置值格式错误 (key: {key}, value: {value}): {message}")]
    ValueError {
        key: String,
        value: String,
        message: String,
    },

    #[error("配置校验失败: {0}")]
    ValidationError(String),

    #[error("配置文件读取失败: {0}")]
    FileError(String),

    #[error("数据库锁获取失败: {0}")]
    LockError(String),

    #[error("数据库错误: {0}")]
    DatabaseError(String),

    #[error(transparent)]
    Json(#[from] serde_json::Error),
}

impl From<rusqlite::Error> for ConfigError {
    fn from(err: rusqlite::Error) -> Self {
        ConfigError::DatabaseError(err.to_string())
    }
}

impl From<std::io::Error> for ConfigError {
    fn from(err: std::io::Error) -> Self {
        ConfigError::FileError(err.to_string())
    }
}

/// Result 类型别名
pub type ConfigResult<T> = Result<T, ConfigError>;
