//! 随机短码生成器
//!
//! 随机码不保证唯一，调用方在提交前必须检查存储中是否已存在，冲突时重试。

use super::{CodeGenerator, base62::ALPHABET};
use crate::errors::{Result, ShortUrlError};

/// 使用线程本地 CSPRNG 生成指定长度的随机码
pub fn generate_random_code(length: usize) -> String {
    std::iter::repeat_with(|| ALPHABET[rand::random_range(0..ALPHABET.len())] as char)
        .take(length)
        .collect()
}

pub struct RandomGenerator {
    length: usize,
}

impl RandomGenerator {
    pub fn new(length: usize) -> Result<Self> {
        if length == 0 {
            return Err(ShortUrlError::validation(
                "Random code length must be greater than zero",
            ));
        }
        Ok(Self { length })
    }

    pub fn length(&self) -> usize {
        self.length
    }
}

impl CodeGenerator for RandomGenerator {
    fn generate(&self) -> Result<String> {
        Ok(generate_random_code(self.length))
    }

    fn requires_existence_check(&self) -> bool {
        true
    }

    fn name(&self) -> &'static str {
        "random"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fixed_length_and_alphabet() {
        let generator = RandomGenerator::new(8).unwrap();
        for _ in 0..100 {
            let code = generator.generate().unwrap();
            assert_eq!(code.len(), 8);
            assert!(code.chars().all(|c| c.is_ascii_alphanumeric()));
        }
    }

    #[test]
    fn test_zero_length_rejected() {
        assert!(RandomGenerator::new(0).is_err());
    }

    #[test]
    fn test_requires_existence_check() {
        assert!(RandomGenerator::new(6).unwrap().requires_existence_check());
    }
}
