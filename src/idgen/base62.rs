//! Base62 编码（字母表 `0-9A-Za-z`）

/// 短码字母表，生成码与随机码共用
pub const ALPHABET: &[u8; 62] = b"0123456789ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz";

/// 将整数编码为变长 Base62 字符串，高位在前
pub fn encode(mut num: u64) -> String {
    if num == 0 {
        return "0".to_string();
    }

    // u64::MAX 在 Base62 下为 11 位
    let mut buf = [0u8; 11];
    let mut pos = buf.len();
    while num > 0 {
        pos -= 1;
        buf[pos] = ALPHABET[(num % 62) as usize];
        num /= 62;
    }

    buf[pos..].iter().map(|&b| b as char).collect()
}

/// 判断字符是否属于 Base62 字母表
#[inline]
pub fn is_base62(c: char) -> bool {
    c.is_ascii_alphanumeric()
}
