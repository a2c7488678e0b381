//! 统一 API 错误码定义

use serde_repr::{Deserialize_repr, Serialize_repr};

use crate::errors::ShortUrlError;

/// API 错误码枚举
///
/// 使用 serde_repr 序列化为数字。按千位分域：
/// - 0: 成功
/// - 1000-1099: 通用错误
/// - 3000-3099: 链接错误
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize_repr, Deserialize_repr)]
#[repr(i32)]
pub enum ErrorCode {
    Success = 0,

    // 通用错误 1000-1099
    BadRequest = 1000,
    NotFound = 1004,
    InternalServerError = 1005,
    BatchSizeTooLarge = 1010,
    ServiceUnavailable = 1030,

    // 链接错误 3000-3099
    LinkNotFound = 3000,
    LinkAlreadyExists = 3001,
    LinkInvalidUrl = 3002,
    LinkDatabaseError = 3005,
    LinkAllocationFailed = 3007,
}

impl From<&ShortUrlError> for ErrorCode {
    fn from(err: &ShortUrlError) -> Self {
        match err {
            ShortUrlError::NotFound(_) | ShortUrlError::Gone(_) => ErrorCode::LinkNotFound,
            ShortUrlError::Conflict(_) => ErrorCode::LinkAlreadyExists,
            ShortUrlError::Validation(_) => ErrorCode::BadRequest,
            ShortUrlError::Unavailable(_) => ErrorCode::ServiceUnavailable,
            ShortUrlError::ClockRegression(_) => ErrorCode::LinkAllocationFailed,
            ShortUrlError::DatabaseConfig(_) | ShortUrlError::DatabaseOperation(_) => {
                ErrorCode::LinkDatabaseError
            }
            ShortUrlError::Internal(_)
            | ShortUrlError::CachePluginNotFound(_)
            | ShortUrlError::Serialization(_) => ErrorCode::InternalServerError,
        }
    }
}
