//! 输入 token 预算
//!
//! 生成阶段前对抽取文本做截断：恰好等于上限的文本原样保留，
//! 超出上限时只保留前 `max_tokens` 个 token（保留原始空白与标点）。

/// Token 计数器
pub trait TokenCounter: Send + Sync {
    /// 统计 token 数
    fn count(&self, text: &str) -> usize;

    /// 截断到最多 `max_tokens` 个 token，未超出时返回原文
    fn truncate<'a>(&self, text: &'a str, max_tokens: usize) -> &'a str;
}

/// 以空白分隔的单词作为 token，只用于测试
#[cfg(test)]
#[derive(Debug, Clone, Copy, Default)]
pub(crate) struct WhitespaceTokenCounter;

#[cfg(test)]
impl TokenCounter for WhitespaceTokenCounter {
    fn count(&self, text: &str) -> usize {
        text.split_whitespace().count()
    }

    fn truncate<'a>(&self, text: &'a str, max_tokens: usize) -> &'a str {
        if max_tokens == 0 {
            return "";
        }

        let mut seen = 0;
        let mut in_token = false;
        for (pos, ch) in text.char_indices() {
            if ch.is_whitespace() {
                if in_token {
                    seen += 1;
                    in_token = false;
                    if seen == max_tokens {
                        return &text[..pos];
                    }
                }
            } else {
                in_token = true;
            }
        }
        text
    }
}

/// 预算处理结果
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BudgetedText<'a> {
    pub text: &'a str,
    pub tokens: usize,
    pub truncated: bool,
}

/// 对文本应用 token 上限
pub fn apply_token_budget<'a>(
    counter: &dyn TokenCounter,
    text: &'a str,
    max_tokens: usize,
) -> BudgetedText<'a> {
    let tokens = counter.count(text);
    if tokens <= max_tokens {
        return BudgetedText {
            text,
            tokens,
            truncated: false,
        };
    }

    let kept = counter.truncate(text, max_tokens);
    BudgetedText {
        text: kept,
        tokens: counter.count(kept),
        truncated: true,
    }
}
