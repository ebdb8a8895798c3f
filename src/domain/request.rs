//! Request validation
//!
//! Turns untyped JSON payloads into typed requests before any external process runs.

use regex::Regex;
use serde_json::Value;
use std::sync::OnceLock;
use thiserror::Error;

use super::deploy::ContractKind;

/// Default decimals for token contracts
pub const DEFAULT_DECIMALS: u8 = 18;

/// Default instructions for `/build-contract` when none are supplied
pub const DEFAULT_INSTRUCTIONS: &str =
    "Create a minimal counter-like contract with increment/decrement and a getter.";

pub const MIN_INSTRUCTIONS_LEN: usize = 10;
pub const MAX_INSTRUCTIONS_LEN: usize = 2000;

/// Client input rejected before the pipeline starts
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("{message}")]
pub struct ValidationError {
    /// Offending field, if the failure is tied to one
    pub field: Option<String>,
    pub message: String,
}

impl ValidationError {
    pub fn field(field: &str, message: impl Into<String>) -> Self {
        Self {
            field: Some(field.to_string()),
            message: message.into(),
        }
    }

    pub fn body(message: impl Into<String>) -> Self {
        Self {
            field: None,
            message: message.into(),
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct TokenParams {
    pub name: String,
    pub symbol: String,
    pub max_token: u128,
    pub decimals: u8,
}

#[derive(Clone, Debug, PartialEq)]
pub struct NftParams {
    pub name: String,
    pub symbol: String,
    pub base_uri: String,
}

#[derive(Clone, Debug, PartialEq)]
pub struct SourceParams {
    pub code: String,
    pub contract_name: String,
}

/// A validated deployment request
#[derive(Clone, Debug, PartialEq)]
pub enum DeployRequest {
    Token(TokenParams),
    RawSource(SourceParams),
    NftCollection(NftParams),
    /// Bundled contract deployed when source generation is unavailable
    Fallback,
}

impl DeployRequest {
    pub fn kind(&self) -> ContractKind {
        match self {
            DeployRequest::Token(_) => ContractKind::Token,
            DeployRequest::RawSource(_) => ContractKind::RawSource,
            DeployRequest::NftCollection(_) => ContractKind::NftCollection,
            DeployRequest::Fallback => ContractKind::Fallback,
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct MintParams {
    pub contract_address: String,
    pub recipient: String,
    pub uri: String,
}

#[derive(Clone, Debug, PartialEq)]
pub struct BuildParams {
    pub instructions: String,
    pub contract_name: Option<String>,
}

/// Validate a `/create-token` payload
pub fn parse_token_request(payload: &Value) -> Result<DeployRequest, ValidationError> {
    let object = as_object(payload)?;

    let name = literal_field("name", &required_string(object, "name")?)?;
    let symbol = literal_field("symbol", &required_string(object, "symbol")?)?;

    let max_token = object
        .get("max_token")
        .and_then(positive_integer)
        .ok_or_else(|| {
            ValidationError::field("max_token", "'max_token' must be a positive integer")
        })?;

    let decimals = match object.get("decimals") {
        None | Some(Value::Null) => DEFAULT_DECIMALS,
        Some(value) => small_integer(value).ok_or_else(|| {
            ValidationError::field("decimals", "'decimals' must be an integer between 0 and 255")
        })?,
    };

    Ok(DeployRequest::Token(TokenParams {
        name,
        symbol,
        max_token,
        decimals,
    }))
}

/// Validate a `/deploy-nft` payload
pub fn parse_nft_request(payload: &Value) -> Result<DeployRequest, ValidationError> {
    let object = as_object(payload)?;

    let name = required_string(object, "name")?;
    let symbol = required_string(object, "symbol")?;
    let base_uri = required_string(object, "base_uri")?;

    Ok(DeployRequest::NftCollection(NftParams {
        name: literal_field("name", &name)?,
        symbol: literal_field("symbol", &symbol)?,
        base_uri: literal_field("base_uri", &base_uri)?,
    }))
}

/// Validate raw contract source for `/deploy-contract`
///
/// The contract name falls back to the first `#[starknet::contract]` module in the source.
pub fn parse_source_request(
    code: &str,
    contract_name: Option<&str>,
) -> Result<DeployRequest, ValidationError> {
    if code.trim().is_empty() {
        return Err(ValidationError::field("code", "'code' must be a non-empty string"));
    }

    let contract_name = match contract_name.map(str::trim).filter(|n| !n.is_empty()) {
        Some(name) if is_identifier(name) => name.to_string(),
        Some(_) => {
            return Err(ValidationError::field(
                "contract_name",
                "'contract_name' must be a Cairo identifier",
            ))
        }
        None => detect_contract_name(code).ok_or_else(|| {
            ValidationError::field(
                "code",
                "could not find a #[starknet::contract] module in the source",
            )
        })?,
    };

    Ok(DeployRequest::RawSource(SourceParams {
        code: code.to_string(),
        contract_name,
    }))
}

/// Validate a `/mint-nft` payload
pub fn parse_mint_request(payload: &Value) -> Result<MintParams, ValidationError> {
    let object = as_object(payload)?;

    let contract_address = required_string(object, "contract_address")?;
    let recipient = required_string(object, "recipient")?;
    let uri = required_string(object, "uri")?;

    for (field, value) in [("contract_address", &contract_address), ("recipient", &recipient)] {
        if !is_hex_address(value) {
            return Err(ValidationError::field(
                field,
                format!("'{}' must be a 0x-prefixed hex address", field),
            ));
        }
    }

    Ok(MintParams {
        contract_address,
        recipient,
        uri,
    })
}

/// Validate a `/build-contract` payload; an absent body means default instructions
pub fn parse_build_request(payload: Option<&Value>) -> Result<BuildParams, ValidationError> {
    let Some(payload) = payload else {
        return Ok(BuildParams {
            instructions: DEFAULT_INSTRUCTIONS.to_string(),
            contract_name: None,
        });
    };
    let object = as_object(payload)?;

    let instructions = match object.get("instructions") {
        None | Some(Value::Null) => DEFAULT_INSTRUCTIONS.to_string(),
        Some(Value::String(text)) => {
            let trimmed = text.trim();
            let len = trimmed.chars().count();
            if len < MIN_INSTRUCTIONS_LEN {
                return Err(ValidationError::field(
                    "instructions",
                    format!(
                        "Contract instructions must be at least {} characters long",
                        MIN_INSTRUCTIONS_LEN
                    ),
                ));
            }
            if len > MAX_INSTRUCTIONS_LEN {
                return Err(ValidationError::field(
                    "instructions",
                    format!(
                        "Contract instructions must be less than {} characters",
                        MAX_INSTRUCTIONS_LEN
                    ),
                ));
            }
            trimmed.to_string()
        }
        Some(_) => {
            return Err(ValidationError::field(
                "instructions",
                "'instructions' must be a string",
            ))
        }
    };

    let contract_name = match object.get("contract_name").or_else(|| object.get("contractName")) {
        None | Some(Value::Null) => None,
        Some(Value::String(name)) if is_identifier(name) => Some(name.clone()),
        Some(_) => {
            return Err(ValidationError::field(
                "contract_name",
                "'contract_name' must be a Cairo identifier",
            ))
        }
    };

    Ok(BuildParams {
        instructions,
        contract_name,
    })
}

/// Find the first `#[starknet::contract]` module name in Cairo source
pub fn detect_contract_name(code: &str) -> Option<String> {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    let pattern = PATTERN.get_or_init(|| {
        Regex::new(r"#\[starknet::contract\]\s*(?:pub\s+)?mod\s+([A-Za-z_][A-Za-z0-9_]*)")
            .expect("static regex")
    });
    pattern
        .captures(code)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str().to_string())
}

/// `0x` followed by 1..=64 hex digits
pub fn is_hex_address(value: &str) -> bool {
    match value.strip_prefix("0x").or_else(|| value.strip_prefix("0X")) {
        Some(digits) => {
            !digits.is_empty()
                && digits.len() <= 64
                && digits.chars().all(|c| c.is_ascii_hexdigit())
        }
        None => false,
    }
}

fn is_identifier(value: &str) -> bool {
    let mut chars = value.chars();
    matches!(chars.next(), Some(c) if c.is_ascii_alphabetic() || c == '_')
        && chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}

fn as_object(payload: &Value) -> Result<&serde_json::Map<String, Value>, ValidationError> {
    payload
        .as_object()
        .ok_or_else(|| ValidationError::body("Expected a JSON object body"))
}

fn required_string(
    object: &serde_json::Map<String, Value>,
    field: &str,
) -> Result<String, ValidationError> {
    match object.get(field) {
        Some(Value::String(value)) if !value.trim().is_empty() => Ok(value.clone()),
        _ => Err(ValidationError::field(
            field,
            format!("'{}' must be a non-empty string", field),
        )),
    }
}

/// Values spliced into Cairo string literals must not be able to close the literal
fn literal_field(field: &str, value: &str) -> Result<String, ValidationError> {
    if value.trim().is_empty() {
        return Err(ValidationError::field(
            field,
            format!("'{}' must be a non-empty string", field),
        ));
    }
    if value.chars().any(|c| c == '"' || c == '\\' || c.is_control()) {
        return Err(ValidationError::field(
            field,
            format!("'{}' must not contain quotes, backslashes or control characters", field),
        ));
    }
    Ok(value.to_string())
}

fn positive_integer(value: &Value) -> Option<u128> {
    let parsed = match value {
        Value::Number(n) => n.as_u64().map(u128::from),
        Value::String(s) => s.trim().parse::<u128>().ok(),
        _ => None,
    }?;
    (parsed > 0).then_some(parsed)
}

fn small_integer(value: &Value) -> Option<u8> {
    match value {
        Value::Number(n) => n.as_u64().and_then(|v| u8::try_from(v).ok()),
        Value::String(s) => s.trim().parse::<u8>().ok(),
        _ => None,
    }
}
