//! BPE Token Counter - 与部署模型相同的 tiktoken 编码
//!
//! 截断时按 token 前缀解码回原文，保留到最后一个完整 token 的末尾

use tiktoken_rs::CoreBPE;

use crate::application::ConfigurationError;
use crate::config::TokenEncoding;
use crate::domain::TokenCounter;

/// tiktoken 计数器
pub struct BpeTokenCounter {
    bpe: CoreBPE,
    encoding: TokenEncoding,
}

impl BpeTokenCounter {
    pub fn from_encoding(encoding: TokenEncoding) -> Result<Self, ConfigurationError> {
        let bpe = match encoding {
            TokenEncoding::O200kBase => tiktoken_rs::o200k_base(),
            TokenEncoding::Cl100kBase => tiktoken_rs::cl100k_base(),
        }
        .map_err(|e| {
            ConfigurationError::Invalid(format!(
                "Failed to load {} encoding: {}",
                encoding.as_str(),
                e
            ))
        })?;

        tracing::debug!(encoding = encoding.as_str(), "Token encoding loaded");
        Ok(Self { bpe, encoding })
    }

    pub fn encoding(&self) -> TokenEncoding {
        self.encoding
    }
}

impl TokenCounter for BpeTokenCounter {
    fn count(&self, text: &str) -> usize {
        self.bpe.encode_ordinary(text).len()
    }

    fn truncate<'a>(&self, text: &'a str, max_tokens: usize) -> &'a str {
        let tokens = self.bpe.encode_ordinary(text);
        if tokens.len() <= max_tokens {
            return text;
        }

        let mut keep = max_tokens;
        while keep > 0 {
            // 前缀在多字节字符中间断开时 decode 失败，少保留一个 token
            if let Ok(prefix) = self.bpe.decode(tokens[..keep].to_vec()) {
                if text.starts_with(prefix.as_str()) {
                    let kept = &text[..prefix.len()];
                    if self.count(kept) <= max_tokens {
                        return kept;
                    }
                }
            }
            keep -= 1;
        }
        ""
    }
}
