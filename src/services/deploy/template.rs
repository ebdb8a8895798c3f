//! 合约源码模板
//!
//! 把请求参数替换进源码中的 `let <slot>: <Type> = <literal>;` 赋值，每个槽位只替换第一处。
//! 渲染后源码没有任何变化视为错误，避免在模板不匹配时构建出默认合约。

use regex::{Captures, Regex};
use std::path::{Path, PathBuf};
use std::sync::OnceLock;
use thiserror::Error;
use tracing::{debug, warn};

#[derive(Debug, Error)]
pub enum TemplateError {
    #[error("contract source unchanged after edit")]
    Unchanged,
    #[error("contract source not found: {0}")]
    SourceMissing(PathBuf),
    #[error("failed to rewrite contract source {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SlotKind {
    /// `let name: ByteArray = "...";`
    StringLiteral,
    /// `let max_supply: u256 = 1000;`
    NumericLiteral,
}

#[derive(Debug)]
pub struct TemplateSlot {
    pub name: &'static str,
    pub kind: SlotKind,
    pattern: Regex,
}

impl TemplateSlot {
    fn new(name: &'static str, kind: SlotKind) -> Result<Self, regex::Error> {
        let prefix = format!(
            r"(let\s+(?:mut\s+)?{}\s*:\s*[A-Za-z_][A-Za-z0-9_:<>]*\s*=\s*",
            regex::escape(name)
        );
        let pattern = match kind {
            SlotKind::StringLiteral => format!(r#"{}")([^"\\]*)(")"#, prefix),
            SlotKind::NumericLiteral => {
                format!(r"{})([0-9][0-9_]*(?:_?[ui](?:8|16|32|64|128|256))?)(\s*;)", prefix)
            }
        };
        Ok(Self {
            name,
            kind,
            pattern: Regex::new(&pattern)?,
        })
    }

    /// 替换第一处匹配，槽位不存在时返回 None
    fn apply(&self, source: &str, value: &str) -> Option<String> {
        if !self.pattern.is_match(source) {
            return None;
        }
        let rendered = self
            .pattern
            .replacen(source, 1, |caps: &Captures| {
                format!("{}{}{}", &caps[1], value, &caps[3])
            })
            .into_owned();
        Some(rendered)
    }
}

/// 带命名槽位的合约源码
#[derive(Debug)]
pub struct SourceTemplate {
    slots: Vec<TemplateSlot>,
}

impl SourceTemplate {
    pub fn new(slots: &[(&'static str, SlotKind)]) -> Result<Self, regex::Error> {
        let slots = slots
            .iter()
            .map(|(name, kind)| TemplateSlot::new(name, *kind))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self { slots })
    }

    /// ERC20 代币：名称、符号、最大供应量、精度
    pub fn token() -> &'static SourceTemplate {
        static TEMPLATE: OnceLock<SourceTemplate> = OnceLock::new();
        TEMPLATE.get_or_init(|| {
            SourceTemplate::new(&[
                ("name", SlotKind::StringLiteral),
                ("symbol", SlotKind::StringLiteral),
                ("max_supply", SlotKind::NumericLiteral),
                ("decimals", SlotKind::NumericLiteral),
            ])
            .expect("token slot patterns are valid")
        })
    }

    /// ERC721 集合：名称、符号、基础 URI
    pub fn nft() -> &'static SourceTemplate {
        static TEMPLATE: OnceLock<SourceTemplate> = OnceLock::new();
        TEMPLATE.get_or_init(|| {
            SourceTemplate::new(&[
                ("name", SlotKind::StringLiteral),
                ("symbol", SlotKind::StringLiteral),
                ("base_uri", SlotKind::StringLiteral),
            ])
            .expect("nft slot patterns are valid")
        })
    }

    /// 依次替换有值的槽位，值按原样插入
    pub fn render(&self, source: &str, values: &[(&str, String)]) -> Result<String, TemplateError> {
        let mut rendered = source.to_string();

        for slot in &self.slots {
            let Some((_, value)) = values.iter().find(|(name, _)| *name == slot.name) else {
                continue;
            };
            match slot.apply(&rendered, value) {
                Some(next) => rendered = next,
                None => warn!(slot = slot.name, "Template slot not found in source"),
            }
        }

        if rendered == source {
            return Err(TemplateError::Unchanged);
        }
        Ok(rendered)
    }

    /// 原地渲染 `path` 处的文件
    pub async fn render_file(
        &self,
        path: &Path,
        values: &[(&str, String)],
    ) -> Result<(), TemplateError> {
        let source = match tokio::fs::read_to_string(path).await {
            Ok(source) => source,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Err(TemplateError::SourceMissing(path.to_path_buf()))
            }
            Err(source) => {
                return Err(TemplateError::Io {
                    path: path.to_path_buf(),
                    source,
                })
            }
        };

        let rendered = self.render(&source, values)?;
        tokio::fs::write(path, rendered)
            .await
            .map_err(|source| TemplateError::Io {
                path: path.to_path_buf(),
                source,
            })?;

        debug!(path = %path.display(), "Rendered contract source");
        Ok(())
    }
}
