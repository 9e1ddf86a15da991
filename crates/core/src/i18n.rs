//! Message catalogs.
//!
//! A [`Translator`] is built once at startup and shared through the
//! application state. Lookups fall back to English, then to the key.

use std::collections::HashMap;

/// Language used when a request does not name a supported one.
pub const DEFAULT_LANGUAGE: &str = "en_US";

/// Languages with a catalog.
pub const SUPPORTED_LANGUAGES: [&str; 2] = ["en_US", "zh_CN"];

const EN_US: &[(&str, &str)] = &[
    ("action.report", "Flag"),
    ("action.edit", "Edit"),
    ("action.close", "Close"),
    ("action.reopen", "Reopen"),
    ("action.pin", "Pin"),
    ("action.unpin", "Unpin"),
    ("action.hide", "Unlist"),
    ("action.show", "List"),
    ("action.delete", "Delete"),
    ("validation.required", "This field is required."),
    ("validation.length", "Length is out of range."),
    ("validation.range", "Value is out of range."),
    ("validation.email", "Not a valid e-mail address."),
    ("validation.url", "Not a valid URL."),
    ("validation.slug", "Only lowercase letters, digits and + # - . are allowed."),
    ("validation.invalid", "Invalid value."),
    ("mail.new_question.subject", "[{site}] New question: {title}"),
    ("mail.new_answer.subject", "[{site}] New answer to: {title}"),
    ("mail.new_comment.subject", "[{site}] New comment"),
    ("mail.invite_answer.subject", "[{site}] You were invited to answer: {title}"),
    ("mail.unsubscribe", "Unsubscribe"),
    ("mail.new_question.body", "A new question was posted: {title}"),
    ("mail.new_answer.body", "Your question {title} received a new answer:"),
    ("mail.new_comment.body", "Someone commented on your post:"),
    ("mail.invite_answer.body", "{inviter} invited you to answer {title}"),
    ("mail.view", "View it on {site}"),
];

const ZH_CN: &[(&str, &str)] = &[
    ("action.report", "举报"),
    ("action.edit", "编辑"),
    ("action.close", "关闭"),
    ("action.reopen", "重新打开"),
    ("action.pin", "置顶"),
    ("action.unpin", "取消置顶"),
    ("action.hide", "隐藏"),
    ("action.show", "显示"),
    ("action.delete", "删除"),
    ("validation.required", "此项必填。"),
    ("validation.length", "长度不符合要求。"),
    ("validation.range", "数值超出范围。"),
    ("validation.email", "邮箱格式不正确。"),
    ("validation.url", "链接格式不正确。"),
    ("validation.slug", "只能包含小写字母、数字和 + # - . 字符。"),
    ("validation.invalid", "值无效。"),
    ("mail.new_question.subject", "[{site}] 新问题：{title}"),
    ("mail.new_answer.subject", "[{site}] 新回答：{title}"),
    ("mail.new_comment.subject", "[{site}] 新评论"),
    ("mail.invite_answer.subject", "[{site}] 邀请你回答：{title}"),
    ("mail.unsubscribe", "退订"),
    ("mail.new_question.body", "有新问题发布：{title}"),
    ("mail.new_answer.body", "你的问题 {title} 有了新回答："),
    ("mail.new_comment.body", "有人评论了你的内容："),
    ("mail.invite_answer.body", "{inviter} 邀请你回答 {title}"),
    ("mail.view", "在 {site} 上查看"),
];

/// Per-language message catalogs.
#[derive(Debug, Clone)]
pub struct Translator {
    catalogs: HashMap<&'static str, HashMap<&'static str, &'static str>>,
}

impl Default for Translator {
    fn default() -> Self {
        Self::new()
    }
}

impl Translator {
    /// Build the bundled catalogs.
    #[must_use]
    pub fn new() -> Self {
        let catalogs = [("en_US", EN_US), ("zh_CN", ZH_CN)]
            .into_iter()
            .map(|(lang, entries)| (lang, entries.iter().copied().collect()))
            .collect();
        Self { catalogs }
    }

    /// Whether a catalog exists for `language`.
    #[must_use]
    pub fn supports(&self, language: &str) -> bool {
        self.catalogs.contains_key(language)
    }

    /// Translate `key`, falling back to English and then to the key itself.
    #[must_use]
    pub fn tr(&self, language: &str, key: &str) -> String {
        self.lookup(language, key)
            .or_else(|| self.lookup(DEFAULT_LANGUAGE, key))
            .map_or_else(|| key.to_string(), ToString::to_string)
    }

    /// Translate `key` and substitute `{name}` placeholders.
    #[must_use]
    pub fn tr_with(&self, language: &str, key: &str, args: &[(&str, &str)]) -> String {
        args.iter()
            .fold(self.tr(language, key), |text, (name, value)| {
                text.replace(&format!("{{{name}}}"), value)
            })
    }

    fn lookup(&self, language: &str, key: &str) -> Option<&'static str> {
        self.catalogs.get(language)?.get(key).copied()
    }
}
