// ==========================================
// 服装生产排程系统 - 导入模块错误类型
// ==========================================
// 工具: thiserror 派生宏
// 行号约定: 含表头，首条数据行为第 2 行
// ==========================================

use thiserror::Error;

/// 生产数据导入错误
#[derive(Error, Debug)]
pub enum ImportError {
    // ===== 文件层 =====
    #[error("导入文件不存在: {0}")]
    FileNotFound(String),

    #[error("导入文件格式不支持: {0}（仅支持 .xlsx/.xls/.csv）")]
    UnsupportedFormat(String),

    #[error("导入文件读取失败: {0}")]
    FileReadError(String),

    #[error("Excel 解析失败: {0}")]
    ExcelParseError(String),

    #[error("CSV 解析失败: {0}")]
    CsvParseError(String),

    // ===== 记录层 =====
    #[error("必填字段缺失 (行 {row}): {field}")]
    MissingField { row: usize, field: String },

    #[error("字段值无法识别 (行 {row}, 字段 {field}): {message}")]
    TypeConversionError {
        row: usize,
        field: String,
        message: String,
    },

    #[error("时间格式错误 (行 {row}, 字段 {field}): 期望 RFC3339 / YYYY-MM-DD HH:MM:SS / YYYY-MM-DD，实际 {value}")]
    DateFormatError {
        row: usize,
        field: String,
        value: String,
    },

    /// 同一文件内作业号 / 资源号重复
    #[error("主键重复 (行 {row}, 首次出现于行 {first_row}): {key}")]
    DuplicateKey {
        row: usize,
        first_row: usize,
        key: String,
    },

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl From<std::io::Error> for ImportError {
    fn from(err: std::io::Error) -> Self {
        ImportError::FileReadError(err.to_string())
    }
}

impl From<csv::Error> for ImportError {
    fn from(err: csv::Error) -> Self {
        ImportError::CsvParseError(err.to_string())
    }
}

impl From<calamine::Error> for ImportError {
    fn from(err: calamine::Error) -> Self {
        ImportError::ExcelParseError(err.to_string())
    }
}

pub type ImportResult<T> = Result<T, ImportError>;
