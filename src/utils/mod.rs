#[cfg(feature = "server")]
pub mod ip;
pub mod url_validator;

pub use url_validator::validate_url;

/// 保留的路径前缀，不能作为自定义短码
pub const RESERVED_CODES: &[&str] = &["api", "health"];

/// 短码字符集：`[0-9A-Za-z_-]`
pub fn is_valid_short_code(code: &str) -> bool {
    !code.is_empty()
        && code
            .bytes()
            .all(|b| b.is_ascii_alphanumeric() || b == b'_' || b == b'-')
}

pub fn is_reserved_code(code: &str) -> bool {
    RESERVED_CODES
        .iter()
        .any(|reserved| reserved.eq_ignore_ascii_case(code))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_short_code_charset() {
        assert!(is_valid_short_code("B7"));
        assert!(is_valid_short_code("my-link_01"));
        assert!(!is_valid_short_code(""));
        assert!(!is_valid_short_code("a b"));
        assert!(!is_valid_short_code("a/b"));
        assert!(!is_valid_short_code("码"));
    }

    #[test]
    fn test_reserved_codes() {
        assert!(is_reserved_code("api"));
        assert!(is_reserved_code("Health"));
        assert!(!is_reserved_code("apis"));
    }
}
