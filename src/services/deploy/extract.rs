//! 从工具输出中提取标识符
//!
//! 依次尝试：
//! 1. `sncast --json` 打印的 JSON 对象
//! 2. 带标签的文本，`Class Hash: 0x...` / `class_hash: 0x...`
//! 3. 可选：文本中最后一个至少 10 位的十六进制串
//!
//! "already declared" 错误里的类哈希没有标签，只能靠第 3 步取出。

use regex::Regex;
use serde_json::Value;
use std::sync::OnceLock;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum IdentifierField {
    ClassHash,
    ContractAddress,
    TransactionHash,
}

impl IdentifierField {
    pub fn label(&self) -> &'static str {
        match self {
            IdentifierField::ClassHash => "Class Hash",
            IdentifierField::ContractAddress => "Contract Address",
            IdentifierField::TransactionHash => "Transaction Hash",
        }
    }

    pub fn json_key(&self) -> &'static str {
        match self {
            IdentifierField::ClassHash => "class_hash",
            IdentifierField::ContractAddress => "contract_address",
            IdentifierField::TransactionHash => "transaction_hash",
        }
    }

    fn pattern(&self) -> &'static Regex {
        static CLASS_HASH: OnceLock<Regex> = OnceLock::new();
        static CONTRACT_ADDRESS: OnceLock<Regex> = OnceLock::new();
        static TRANSACTION_HASH: OnceLock<Regex> = OnceLock::new();

        let cell = match self {
            IdentifierField::ClassHash => &CLASS_HASH,
            IdentifierField::ContractAddress => &CONTRACT_ADDRESS,
            IdentifierField::TransactionHash => &TRANSACTION_HASH,
        };
        cell.get_or_init(|| {
            Regex::new(&format!(
                r"(?i)(?:{}|{})\s*:\s*(0x[0-9a-f]+)",
                regex::escape(self.label()),
                regex::escape(self.json_key())
            ))
            .expect("identifier pattern is valid")
        })
    }
}

/// JSON 和标签都不存在时的处理方式
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Fallback {
    None,
    LastHexToken,
}

/// 从合并后的输出中取出十六进制标识符
pub fn extract_identifier(text: &str, field: IdentifierField, fallback: Fallback) -> Option<String> {
    from_json(text, field)
        .or_else(|| labeled(text, field))
        .or_else(|| match fallback {
            Fallback::LastHexToken => last_hex_token(text),
            Fallback::None => None,
        })
}

fn from_json(text: &str, field: IdentifierField) -> Option<String> {
    text.lines()
        .map(str::trim)
        .filter(|line| line.starts_with('{'))
        .filter_map(|line| serde_json::from_str::<Value>(line).ok())
        .find_map(|value| {
            value
                .get(field.json_key())
                .and_then(Value::as_str)
                .filter(|s| is_hex(s))
                .map(str::to_string)
        })
}

fn labeled(text: &str, field: IdentifierField) -> Option<String> {
    field
        .pattern()
        .captures(text)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str().to_string())
}

fn last_hex_token(text: &str) -> Option<String> {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    let pattern =
        PATTERN.get_or_init(|| Regex::new(r"0x[0-9a-fA-F]{10,}").expect("hex token pattern is valid"));
    pattern.find_iter(text).last().map(|m| m.as_str().to_string())
}

fn is_hex(value: &str) -> bool {
    value
        .strip_prefix("0x")
        .map(|digits| !digits.is_empty() && digits.chars().all(|c| c.is_ascii_hexdigit()))
        .unwrap_or(false)
}
