// ==========================================
// ModCon 内容规划系统 - 提示文本渲染
// ==========================================
// 职责: 把引擎输出的 Notice (code + 参数) 渲染为 zh-CN / en 文本
// 约束: 词条 key 为 notice.<code>，占位符写作 %{name}
// 约束: 不支持的语言回退 zh-CN; 缺失词条回退为 code 本身
// 注意: rust_i18n::i18n! 宏已在 lib.rs 中初始化
// ==========================================

/// 默认语言
pub const DEFAULT_LOCALE: &str = "zh-CN";

/// 已提供词条的语言
pub const SUPPORTED_LOCALES: [&str; 2] = ["zh-CN", "en"];

pub fn current_locale() -> String {
    rust_i18n::locale().to_string()
}

/// 把命令行/环境变量给出的语言归一到已支持的语言
///
/// "en-US"、"en_GB" -> "en"; "zh"、"zh_cn" -> "zh-CN"; 其他 -> 默认语言
pub fn resolve_locale(requested: &str) -> &'static str {
    let primary = requested
        .trim()
        .split(['-', '_'])
        .next()
        .unwrap_or_default()
        .to_ascii_lowercase();
    match primary.as_str() {
        "en" => "en",
        _ => DEFAULT_LOCALE,
    }
}

/// 设置语言，返回实际生效的语言
pub fn set_locale(requested: &str) -> &'static str {
    let locale = resolve_locale(requested);
    rust_i18n::set_locale(locale);
    locale
}

/// 渲染提示文本
///
/// # 示例
/// ```no_run
/// use modcon_planner::i18n::notice_text;
/// let msg = notice_text("high_volume", &[("total", "60"), ("threshold", "48")]);
/// ```
pub fn notice_text(code: &str, args: &[(&str, &str)]) -> String {
    let full_key = format!("notice.{}", code);
    let key = full_key.as_str();
    let template = rust_i18n::t!(key).to_string();
    if template.ends_with(key) {
        return code.to_string();
    }

    let mut result = template;
    for (k, v) in args {
        let placeholder = format!("%{{{}}}", k);
        result = result.replace(&placeholder, v);
    }
    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    // locale 是全局状态，测试并行执行时需要串行化
    static LOCALE_TEST_LOCK: Mutex<()> = Mutex::new(());

    #[test]
    fn test_resolve_locale() {
        assert_eq!(resolve_locale("en"), "en");
        assert_eq!(resolve_locale(" en-US "), "en");
        assert_eq!(resolve_locale("EN_gb"), "en");
        assert_eq!(resolve_locale("zh"), "zh-CN");
        assert_eq!(resolve_locale("zh_cn"), "zh-CN");
        assert_eq!(resolve_locale("fr-FR"), DEFAULT_LOCALE);
        assert_eq!(resolve_locale(""), DEFAULT_LOCALE);
    }

    #[test]
    fn test_set_locale_returns_applied_locale() {
        let _guard = LOCALE_TEST_LOCK.lock().unwrap();
        assert_eq!(set_locale("en-US"), "en");
        assert_eq!(current_locale(), "en");

        assert_eq!(set_locale("de"), "zh-CN");
        assert_eq!(current_locale(), "zh-CN");
    }

    #[test]
    fn test_notice_text_fills_placeholders() {
        let _guard = LOCALE_TEST_LOCK.lock().unwrap();
        set_locale("zh-CN");
        let msg = notice_text("high_volume", &[("total", "60"), ("threshold", "48")]);
        assert!(msg.contains("60"));
        assert!(msg.contains("48"));
        assert!(!msg.contains("%{"));

        set_locale("en");
        let msg = notice_text("high_volume", &[("total", "60"), ("threshold", "48")]);
        assert!(msg.contains("high-volume threshold 48"));

        set_locale("zh-CN");
    }

    #[test]
    fn test_unknown_code_falls_back_to_code() {
        let _guard = LOCALE_TEST_LOCK.lock().unwrap();
        set_locale("en");
        assert_eq!(notice_text("no_such_notice", &[]), "no_such_notice");
        set_locale("zh-CN");
    }

    #[test]
    fn test_notice_message_includes_subject() {
        let _guard = LOCALE_TEST_LOCK.lock().unwrap();
        set_locale("en");
        let notice = crate::engine::notice::Notice::error("rule_missing_name").subject("rule_7");
        assert_eq!(notice.message(), "Rule rule_7 has no name");
        set_locale("zh-CN");
    }
}
