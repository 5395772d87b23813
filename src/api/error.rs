// ==========================================
// 钻井作业计划系统 - API层错误类型
// ==========================================
// 职责: 定义API层错误类型, 转换Repository错误为调用方可处理的错误
// Validation / Conflict 携带字段级错误集合
// ==========================================

use crate::domain::{EntityKind, FieldErrors};
use crate::repository::error::RepositoryError;
use thiserror::Error;
use uuid::Uuid;

/// API层错误类型
#[derive(Error, Debug)]
pub enum ApiError {
    // ==========================================
    // 业务校验错误
    // ==========================================
    /// 字段或跨字段规则不满足
    #[error("数据验证失败: {0}")]
    Validation(FieldErrors),

    /// 唯一性 / 重叠 / 存在引用 (校验错误的特化)
    #[error("数据冲突: {0}")]
    Conflict(FieldErrors),

    /// 目标记录不存在
    #[error("资源未找到: {entity}(id={id})")]
    NotFound { entity: String, id: String },

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
}

impl ApiError {
    pub fn validation(field: impl Into<String>, message: impl Into<String>) -> Self {
        ApiError::Validation(FieldErrors::single(field, message))
    }

    pub fn conflict(field: impl Into<String>, message: impl Into<String>) -> Self {
        ApiError::Conflict(FieldErrors::single(field, message))
    }

    pub fn not_found(kind: EntityKind, id: Uuid) -> Self {
        ApiError::NotFound {
            entity: kind.to_string(),
            id: id.to_string(),
        }
    }

    /// Validation 与 Conflict 的字段错误
    pub fn field_errors(&self) -> Option<&FieldErrors> {
        match self {
            ApiError::Validation(errors) | ApiError::Conflict(errors) => Some(errors),
            _ => None,
        }
    }

    pub fn is_validation(&self) -> bool {
        self.field_errors().is_some()
    }
}

// ==========================================
// 从 RepositoryError 转换
// ==========================================
// 约束违反一般已被服务层提前拦截, 这里兜底映射为 Conflict
impl From<RepositoryError> for ApiError {
    fn from(err: RepositoryError) -> Self {
        match err {
            RepositoryError::NotFound { entity, id } => ApiError::NotFound { entity, id },
            RepositoryError::DatabaseConnectionError(msg) => ApiError::DatabaseConnectionError(msg),
            RepositoryError::DatabaseTransactionError(msg) => {
                ApiError::DatabaseTransactionError(msg)
            }
            RepositoryError::LockError(msg) => {
                ApiError::DatabaseConnectionError(format!("数据库锁获取失败: {}", msg))
            }
            RepositoryError::DatabaseQueryError(msg) => ApiError::DatabaseError(msg),
            RepositoryError::UniqueConstraintViolation(msg) => {
                ApiError::conflict(crate::domain::NON_FIELD_ERRORS, format!("唯一约束违反: {}", msg))
            }
            RepositoryError::ForeignKeyViolation(msg) => {
                ApiError::conflict(crate::domain::NON_FIELD_ERRORS, format!("外键约束违反: {}", msg))
            }
            RepositoryError::FieldValueError { field, message } => {
                ApiError::DatabaseError(format!("字段{}错误: {}", field, message))
            }
            RepositoryError::InternalError(msg) => ApiError::InternalError(msg),
        }
    }
}

/// Result 类型别名
pub type ApiResult<T> = Result<T, ApiError>;
