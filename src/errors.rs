use std::fmt;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ShortUrlError {
    NotFound(String),
    Conflict(String),
    Gone(String),
    Unavailable(String),
    Internal(String),
    Validation(String),
    ClockRegression(String),
    DatabaseConfig(String),
    DatabaseOperation(String),
    CachePluginNotFound(String),
    Serialization(String),
}

impl ShortUrlError {
    /// 获取错误代码
    pub fn code(&self) -> &'static str {
        match self {
            ShortUrlError::NotFound(_) => "E001",
            ShortUrlError::Conflict(_) => "E002",
            ShortUrlError::Gone(_) => "E003",
            ShortUrlError::Unavailable(_) => "E004",
            ShortUrlError::Internal(_) => "E005",
            ShortUrlError::Validation(_) => "E006",
            ShortUrlError::ClockRegression(_) => "E007",
            ShortUrlError::DatabaseConfig(_) => "E008",
            ShortUrlError::DatabaseOperation(_) => "E009",
            ShortUrlError::CachePluginNotFound(_) => "E010",
            ShortUrlError::Serialization(_) => "E011",
        }
    }

    /// 获取错误类型名称
    pub fn error_type(&self) -> &'static str {
        match self {
            ShortUrlError::NotFound(_) => "Resource Not Found",
            ShortUrlError::Conflict(_) => "Short Code Conflict",
            ShortUrlError::Gone(_) => "Link Inactive Or Expired",
            ShortUrlError::Unavailable(_) => "Upstream Unavailable",
            ShortUrlError::Internal(_) => "Internal Error",
            ShortUrlError::Validation(_) => "Validation Error",
            ShortUrlError::ClockRegression(_) => "Clock Regression",
            ShortUrlError::DatabaseConfig(_) => "Database Configuration Error",
            ShortUrlError::DatabaseOperation(_) => "Database Operation Error",
            ShortUrlError::CachePluginNotFound(_) => "Cache Plugin Not Found",
            ShortUrlError::Serialization(_) => "Serialization Error",
        }
    }

    /// 获取错误详情
    pub fn message(&self) -> &str {
        match self {
            ShortUrlError::NotFound(msg)
            | ShortUrlError::Conflict(msg)
            | ShortUrlError::Gone(msg)
            | ShortUrlError::Unavailable(msg)
            | ShortUrlError::Internal(msg)
            | ShortUrlError::Validation(msg)
            | ShortUrlError::ClockRegression(msg)
            | ShortUrlError::DatabaseConfig(msg)
            | ShortUrlError::DatabaseOperation(msg)
            | ShortUrlError::CachePluginNotFound(msg)
            | ShortUrlError::Serialization(msg) => msg,
        }
    }

    /// 格式化为彩色输出（用于启动失败等终端场景）
    pub fn format_colored(&self) -> String {
        use colored::Colorize;
        format!(
            "{} {} {}\n  {}",
            "[ERROR]".red().bold(),
            self.code().yellow(),
            self.error_type().red(),
            self.message().white()
        )
    }

    /// 格式化为简洁输出
    pub fn format_simple(&self) -> String {
        format!("{}: {}", self.error_type(), self.message())
    }

    /// 对外可见的"找不到"语义：从未存在、已过期、已禁用统一视为 not found
    pub fn is_not_found_class(&self) -> bool {
        matches!(self, ShortUrlError::NotFound(_) | ShortUrlError::Gone(_))
    }

    #[cfg(feature = "server")]
    pub fn http_status(&self) -> actix_web::http::StatusCode {
        use actix_web::http::StatusCode;
        match self {
            ShortUrlError::NotFound(_) | ShortUrlError::Gone(_) => StatusCode::NOT_FOUND,
            ShortUrlError::Conflict(_) => StatusCode::CONFLICT,
            ShortUrlError::Validation(_) => StatusCode::BAD_REQUEST,
            ShortUrlError::Unavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl fmt::Display for ShortUrlError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.format_simple())
    }
}

impl std::error::Error for ShortUrlError {}

// 便捷的构造函数
impl ShortUrlError {
    pub fn not_found<T: Into<String>>(msg: T) -> Self {
        ShortUrlError::NotFound(msg.into())
    }

    pub fn conflict<T: Into<String>>(msg: T) -> Self {
        ShortUrlError::Conflict(msg.into())
    }

    pub fn gone<T: Into<String>>(msg: T) -> Self {
        ShortUrlError::Gone(msg.into())
    }

    pub fn unavailable<T: Into<String>>(msg: T) -> Self {
        ShortUrlError::Unavailable(msg.into())
    }

    pub fn internal<T: Into<String>>(msg: T) -> Self {
        ShortUrlError::Internal(msg.into())
    }

    pub fn validation<T: Into<String>>(msg: T) -> Self {
        ShortUrlError::Validation(msg.into())
    }

    pub fn clock_regression<T: Into<String>>(msg: T) -> Self {
        ShortUrlError::ClockRegression(msg.into())
    }

    pub fn database_config<T: Into<String>>(msg: T) -> Self {
        ShortUrlError::DatabaseConfig(msg.into())
    }

    pub fn database_operation<T: Into<String>>(msg: T) -> Self {
        ShortUrlError::DatabaseOperation(msg.into())
    }

    pub fn cache_plugin_not_found<T: Into<String>>(msg: T) -> Self {
        ShortUrlError::CachePluginNotFound(msg.into())
    }

    pub fn serialization<T: Into<String>>(msg: T) -> Self {
        ShortUrlError::Serialization(msg.into())
    }
}

impl From<sea_orm::DbErr> for ShortUrlError {
    fn from(err: sea_orm::DbErr) -> Self {
        use sea_orm::{DbErr, SqlErr};

        if let Some(SqlErr::UniqueConstraintViolation(detail)) = err.sql_err() {
            return ShortUrlError::Conflict(detail);
        }
        match err {
            DbErr::ConnectionAcquire(_) | DbErr::Conn(_) => {
                ShortUrlError::Unavailable(err.to_string())
            }
            DbErr::RecordNotFound(msg) => ShortUrlError::NotFound(msg),
            other => ShortUrlError::DatabaseOperation(other.to_string()),
        }
    }
}

impl From<serde_json::Error> for ShortUrlError {
    fn from(err: serde_json::Error) -> Self {
        ShortUrlError::Serialization(err.to_string())
    }
}

impl From<redis::RedisError> for ShortUrlError {
    fn from(err: redis::RedisError) -> Self {
        ShortUrlError::Unavailable(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, ShortUrlError>;
