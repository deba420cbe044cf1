//! # 解析选项

use std::{env, fs, path::Path};

use derive_builder::Builder;
use serde::{Deserialize, Serialize};

use crate::TtmlError;

/// 第一行歌词开始得比这个时间晚时，会在最前面补一个空白行。
pub const DEFAULT_MIN_OFFSET_MS: u64 = 1000;

/// TTML 歌词解析选项
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Builder)]
#[builder(setter(into), default)]
#[serde(default)]
pub struct ParsingOptions {
    /// 选择翻译轨道时优先使用的语言（BCP 47 标签，例如 `es` 或 `zh-Hans`）。
    /// 为 `None` 时使用运行环境的语言设置。
    pub preferred_language: Option<String>,
    /// 第一行的开始时间超过该值（毫秒）时，生成一个前导空白行。
    pub min_offset_ms: u64,
}

impl Default for ParsingOptions {
    fn default() -> Self {
        Self {
            preferred_language: None,
            min_offset_ms: DEFAULT_MIN_OFFSET_MS,
        }
    }
}

impl ParsingOptions {
    /// 从 TOML 文本加载解析选项，缺失的字段使用默认值。
    pub fn from_toml_str(content: &str) -> Result<Self, TtmlError> {
        Ok(toml::from_str(content)?)
    }

    /// 读取 TOML 配置文件。
    pub fn from_toml_file(path: impl AsRef<Path>) -> Result<Self, TtmlError> {
        let content = fs::read_to_string(path)?;
        Self::from_toml_str(&content)
    }

    /// 实际用于选择翻译轨道的语言。
    #[must_use]
    pub fn effective_language(&self) -> Option<String> {
        self.preferred_language
            .clone()
            .filter(|lang| !lang.trim().is_empty())
            .or_else(system_language)
    }
}

/// 从 `LC_ALL`、`LC_MESSAGES`、`LANG` 中检测运行环境的语言。
#[must_use]
pub fn system_language() -> Option<String> {
    ["LC_ALL", "LC_MESSAGES", "LANG"]
        .iter()
        .filter_map(|key| env::var(key).ok())
        .find_map(|value| posix_locale_to_language_tag(&value))
}

/// 把 POSIX 风格的 locale（`es_ES.UTF-8@euro`）转换成语言标签（`es-ES`）。
pub(crate) fn posix_locale_to_language_tag(locale: &str) -> Option<String> {
    let without_modifier = locale.split('@').next().unwrap_or_default();
    let without_codeset = without_modifier.split('.').next().unwrap_or_default();
    let tag = without_codeset.trim().replace('_', "-");
    if tag.is_empty() || tag == "C" || tag == "POSIX" {
        return None;
    }
    Some(tag)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_posix_locale_conversion() {
        assert_eq!(
            posix_locale_to_language_tag("es_ES.UTF-8").as_deref(),
            Some("es-ES")
        );
        assert_eq!(
            posix_locale_to_language_tag("de_DE.UTF-8@euro").as_deref(),
            Some("de-DE")
        );
        assert_eq!(posix_locale_to_language_tag("ja").as_deref(), Some("ja"));
        assert_eq!(posix_locale_to_language_tag("C"), None);
        assert_eq!(posix_locale_to_language_tag("POSIX"), None);
        assert_eq!(posix_locale_to_language_tag(""), None);
    }

    #[test]
    fn test_options_from_toml() {
        let options = ParsingOptions::from_toml_str(
            r#"
            preferred_language = "es"
            min_offset_ms = 2500
            "#,
        )
        .unwrap();
        assert_eq!(options.preferred_language.as_deref(), Some("es"));
        assert_eq!(options.min_offset_ms, 2500);

        let defaults = ParsingOptions::from_toml_str("").unwrap();
        assert_eq!(defaults, ParsingOptions::default());

        assert!(matches!(
            ParsingOptions::from_toml_str("min_offset_ms = \"soon\""),
            Err(TtmlError::Config(_))
        ));
        assert!(matches!(
            ParsingOptions::from_toml_file("/nonexistent/ttml_lyrics.toml"),
            Err(TtmlError::Io(_))
        ));
    }

    #[test]
    fn test_builder_and_effective_language() {
        let options = ParsingOptionsBuilder::default()
            .preferred_language(Some("fr-CA".to_string()))
            .build()
            .unwrap();
        assert_eq!(options.min_offset_ms, DEFAULT_MIN_OFFSET_MS);
        assert_eq!(options.effective_language().as_deref(), Some("fr-CA"));
    }
}
