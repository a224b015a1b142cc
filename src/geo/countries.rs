//! English to Chinese country names

/// Translate a provider's English country name; unknown names pass through
pub fn translate_country(english: &str) -> &str {
    match english.trim() {
        "United States" => "美国",
        "Canada" => "加拿大",
        "China" => "中国",
        "United Kingdom" => "英国",
        "Germany" => "德国",
        "France" => "法国",
        "Japan" => "日本",
        "Australia" => "澳大利亚",
        "India" => "印度",
        "Brazil" => "巴西",
        "Russia" => "俄罗斯",
        "South Korea" => "韩国",
        "Netherlands" | "The Netherlands" => "荷兰",
        "Singapore" => "新加坡",
        "Hong Kong" => "香港",
        "Taiwan" => "台湾",
        "Reserved" => "预留",
        "Global" => "全球",
        "Unknown" => "未知",
        other => other,
    }
}
