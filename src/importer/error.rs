// ==========================================
// 钻井作业计划系统 - 导入模块错误类型
// ==========================================
// 工具: thiserror 派生宏
// 行级错误携带文件名与行号, 整批导入据此中止并回滚
// ==========================================

use crate::api::error::ApiError;
use crate::repository::error::RepositoryError;
use thiserror::Error;

/// 导入模块错误类型
#[derive(Error, Debug)]
pub enum ImportError {
    // ===== 文件相关错误 =====
    #[error("导出目录不存在: {0}")]
    DirectoryNotFound(String),

    #[error("文件不存在: {0}")]
    FileNotFound(String),

    #[error("文件格式不支持: {0}（仅支持 .csv/.json）")]
    UnsupportedFormat(String),

    #[error("文件读取失败: {0}")]
    FileReadError(String),

    #[error("CSV 解析失败: {0}")]
    CsvParseError(String),

    #[error("JSON 解析失败: {0}")]
    JsonParseError(String),

    // ===== 行级错误 =====
    #[error("字段值错误 ({file} 行 {row}, 字段 {field}): {message}")]
    FieldValueError {
        file: String,
        row: usize,
        field: String,
        message: String,
    },

    #[error("记录被拒绝 ({file} 行 {row}): {source}")]
    RowRejected {
        file: String,
        row: usize,
        source: ApiError,
    },

    // ===== 下层错误 =====
    #[error(transparent)]
    Api(#[from] ApiError),

    #[error("数据库错误: {0}")]
    DatabaseError(String),

    // ===== 通用错误 =====
    #[error("内部错误: {0}")]
    InternalError(String),
}

// 实现 From<std::io::Error>
impl From<std::io::Error> for ImportError {
    fn from(err: std::io::Error) -> Self {
        match err.kind() {
            std::io::ErrorKind::NotFound => ImportError::FileNotFound(err.to_string()),
            _ => ImportError::FileReadError(err.to_string()),
        }
    }
}

// 实现 From<RepositoryError>
impl From<RepositoryError> for ImportError {
    fn from(err: RepositoryError) -> Self {
        ImportError::DatabaseError(err.to_string())
    }
}

// 实现 From<csv::Error>
impl From<csv::Error> for ImportError {
    fn from(err: csv::Error) -> Self {
        ImportError::CsvParseError(err.to_string())
    }
}

// 实现 From<serde_json::Error>
impl From<serde_json::Error> for ImportError {
    fn from(err: serde_json::Error) -> Self {
        ImportError::JsonParseError(err.to_string())
    }
}

impl ImportError {
    /// 出错的 (文件, 行号), 非行级错误返回 None
    pub fn location(&self) -> Option<(&str, usize)> {
        match self {
            ImportError::FieldValueError { file, row, .. }
            | ImportError::RowRejected { file, row, .. } => Some((file.as_str(), *row)),
            _ => None,
        }
    }
}

/// Result 类型别名
pub type ImportResult<T> = Result<T, ImportError>;
