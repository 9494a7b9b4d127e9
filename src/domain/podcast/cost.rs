//! 成本估算（美元）
//!
//! 价格:
//! - Document Intelligence layout: $10 / 1000 页
//! - GPT-4o: 输入 $2.75 / 1M tokens，输出 $11 / 1M tokens
//! - HD 语音: $30 / 1M 字符

use serde::Serialize;

const DOCUMENT_USD_PER_PAGE: f64 = 10.0 / 1_000.0;
const PROMPT_USD_PER_TOKEN: f64 = 2.75 / 1_000_000.0;
const COMPLETION_USD_PER_TOKEN: f64 = 11.0 / 1_000_000.0;
const SPEECH_USD_PER_CHAR: f64 = 30.0 / 1_000_000.0;

pub fn document_cost(pages: u32) -> f64 {
    f64::from(pages) * DOCUMENT_USD_PER_PAGE
}

pub fn generation_cost(prompt_tokens: u32, completion_tokens: u32) -> f64 {
    f64::from(prompt_tokens) * PROMPT_USD_PER_TOKEN
        + f64::from(completion_tokens) * COMPLETION_USD_PER_TOKEN
}

pub fn speech_cost(characters: usize) -> f64 {
    characters as f64 * SPEECH_USD_PER_CHAR
}

/// 各阶段成本
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct CostBreakdown {
    pub document_usd: f64,
    pub generation_usd: f64,
    pub speech_usd: f64,
}

impl CostBreakdown {
    pub fn total(&self) -> f64 {
        self.document_usd + self.generation_usd + self.speech_usd
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn close(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-9
    }

    #[test]
    fn test_document_cost() {
        assert!(close(document_cost(0), 0.0));
        assert!(close(document_cost(3), 0.03));
    }

    #[test]
    fn test_generation_cost() {
        assert!(close(generation_cost(1_000_000, 0), 2.75));
        assert!(close(generation_cost(0, 1_000_000), 11.0));
        assert!(close(generation_cost(2_000, 1_000), 0.0055 + 0.011));
    }

    #[test]
    fn test_speech_cost_and_total() {
        let cost = CostBreakdown {
            document_usd: document_cost(1),
            generation_usd: 0.0,
            speech_usd: speech_cost(10_000),
        };
        assert!(close(cost.speech_usd, 0.3));
        assert!(close(cost.total(), 0.31));
    }
}
