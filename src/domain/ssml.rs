//! SSML 构造
//!
//! 每轮对白生成一个 `<speak>` 文档，文本做 XML 转义。

/// 转义 SSML 中的特殊字符
pub fn escape_ssml(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for ch in text.chars() {
        match ch {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&apos;"),
            _ => escaped.push(ch),
        }
    }
    escaped
}

/// 构造单轮对白的 SSML
pub fn build_turn_ssml(language: &str, voice: &str, text: &str) -> String {
    format!(
        "<speak version='1.0' xmlns='http://www.w3.org/2001/10/synthesis' \
         xmlns:mstts='https://www.w3.org/2001/mstts' xml:lang='{}'>\
         <voice name='{}'>{}</voice></speak>",
        escape_ssml(language),
        escape_ssml(voice),
        escape_ssml(text)
    )
}
