use regex::Regex;

use crate::error::{AntError, Result};

/// 编译只做全字符串匹配的正则
pub fn compile_fullmatch(pattern: &str) -> Result<Regex> {
    Ok(Regex::new(&format!("^(?:{})$", pattern))?)
}

/// 大小写不敏感的比较（与 Unicode 小写化一致）
pub fn eq_lowercase(value: Option<&str>, expected: &str) -> bool {
    value.map_or(false, |v| v.to_lowercase() == expected)
}

/// 解析空格分隔的阻抗值
pub fn parse_impedance_values(s: &str, sample: u64) -> Result<Vec<f64>> {
    s.split_whitespace()
        .map(|token| {
            token.parse::<f64>().map_err(|_| AntError::InvalidImpedance {
                sample,
                value: token.to_string(),
            })
        })
        .collect()
}
