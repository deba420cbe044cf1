//! # 歌词输出模型
//!
//! 这些类型只由合成阶段创建一次，之后不会再被修改。

use std::{
    hash::{DefaultHasher, Hash, Hasher},
    str::FromStr,
};

use serde::Serialize;
use strum_macros::{EnumIter, EnumString};

/// 演唱者。
///
/// 前六个值来自 `<p ttm:agent="...">`，其余是它们对应的背景人声变体。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, EnumString, EnumIter)]
pub enum LyricsActor {
    /// 主唱
    #[strum(serialize = "v1")]
    Voice1,
    /// 第二演唱者
    #[strum(serialize = "v2")]
    Voice2,
    /// 合唱
    #[strum(serialize = "v3")]
    Group,
    /// 对唱
    #[strum(serialize = "D")]
    Duet,
    /// 男声
    #[strum(serialize = "M")]
    Male,
    /// 女声
    #[strum(serialize = "F")]
    Female,
    #[strum(disabled)]
    Voice1Background,
    #[strum(disabled)]
    Voice2Background,
    #[strum(disabled)]
    GroupBackground,
    #[strum(disabled)]
    DuetBackground,
    #[strum(disabled)]
    MaleBackground,
    #[strum(disabled)]
    FemaleBackground,
}

impl LyricsActor {
    /// 把 `ttm:agent` 属性值映射为演唱者，无法识别的值返回 `None`。
    #[must_use]
    pub fn from_agent(value: &str) -> Option<Self> {
        Self::from_str(value.trim()).ok()
    }

    /// 演唱者对应的 `ttm:agent` 属性值。
    #[must_use]
    pub fn agent_value(self) -> &'static str {
        match self.as_background(false) {
            Self::Voice1 => "v1",
            Self::Voice2 => "v2",
            Self::Group => "v3",
            Self::Duet => "D",
            Self::Male => "M",
            _ => "F",
        }
    }

    #[must_use]
    pub const fn is_background(self) -> bool {
        matches!(
            self,
            Self::Voice1Background
                | Self::Voice2Background
                | Self::GroupBackground
                | Self::DuetBackground
                | Self::MaleBackground
                | Self::FemaleBackground
        )
    }

    /// 切换到背景人声变体（`true`）或主人声变体（`false`）。
    #[must_use]
    pub const fn as_background(self, background: bool) -> Self {
        match (self, background) {
            (Self::Voice1 | Self::Voice1Background, true) => Self::Voice1Background,
            (Self::Voice2 | Self::Voice2Background, true) => Self::Voice2Background,
            (Self::Group | Self::GroupBackground, true) => Self::GroupBackground,
            (Self::Duet | Self::DuetBackground, true) => Self::DuetBackground,
            (Self::Male | Self::MaleBackground, true) => Self::MaleBackground,
            (Self::Female | Self::FemaleBackground, true) => Self::FemaleBackground,
            (Self::Voice1 | Self::Voice1Background, false) => Self::Voice1,
            (Self::Voice2 | Self::Voice2Background, false) => Self::Voice2,
            (Self::Group | Self::GroupBackground, false) => Self::Group,
            (Self::Duet | Self::DuetBackground, false) => Self::Duet,
            (Self::Male | Self::MaleBackground, false) => Self::Male,
            (Self::Female | Self::FemaleBackground, false) => Self::Female,
        }
    }
}

/// 一份完整的、可显示的歌词。
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Lyrics {
    /// 文档时长，来自 `<body dur>` 或调用方提供的音轨长度。
    pub duration_millis: u64,
    /// 按开始时间升序排列的歌词行。
    pub lines: Vec<Line>,
}

impl Lyrics {
    #[must_use]
    pub const fn has_content(&self) -> bool {
        !self.lines.is_empty()
    }

    /// 歌词的有效时长。时长未知（为 0）时取所有行结束时间的最大值。
    #[must_use]
    pub fn optimal_duration_millis(&self) -> u64 {
        if self.duration_millis > 0 {
            return self.duration_millis;
        }
        self.lines
            .iter()
            .map(|line| line.start_at + line.duration_millis)
            .max()
            .unwrap_or(0)
    }

    /// 所有行的主歌词文本，以换行连接。
    #[must_use]
    pub fn plain_text(&self) -> String {
        self.lines
            .iter()
            .map(|line| line.content.content.as_str())
            .collect::<Vec<_>>()
            .join("\n")
    }

    /// 所有行的原始文本（包含背景人声），以换行连接。
    #[must_use]
    pub fn raw_text(&self) -> String {
        self.lines
            .iter()
            .map(|line| {
                line.content
                    .raw_content
                    .as_deref()
                    .unwrap_or(&line.content.content)
            })
            .collect::<Vec<_>>()
            .join("\n")
    }
}

/// 一行歌词。
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Line {
    pub start_at: u64,
    pub end: u64,
    pub duration_millis: u64,
    pub content: TextContent,
    pub translation: Option<TextContent>,
    pub actor: Option<LyricsActor>,
}

impl Line {
    /// 由开始时间、时长和文本内容派生出的标识，用于去除重复的行。
    #[must_use]
    pub fn id(&self) -> u64 {
        let mut hasher = DefaultHasher::new();
        self.start_at.hash(&mut hasher);
        self.duration_millis.hash(&mut hasher);
        self.content.content.hash(&mut hasher);
        hasher.finish()
    }

    #[must_use]
    pub const fn is_word_by_word(&self) -> bool {
        !self.content.words.is_empty()
    }

    /// 该行是否由主唱以外的人演唱（通常用于把歌词对齐到另一侧）。
    #[must_use]
    pub fn is_opposite_turn(&self) -> bool {
        self.actor
            .is_some_and(|actor| actor.as_background(false) != LyricsActor::Voice1)
    }

    #[must_use]
    pub fn has_background(&self) -> bool {
        self.content.has_background_vocals()
    }

    pub fn main_words(&self) -> impl Iterator<Item = &Word> {
        self.content.words.iter().filter(|w| !w.is_background)
    }

    pub fn background_words(&self) -> impl Iterator<Item = &Word> {
        self.content.words.iter().filter(|w| w.is_background)
    }
}

/// 一行的文本内容：主歌词、背景人声以及逐字时间。
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct TextContent {
    pub content: String,
    pub background_content: Option<String>,
    pub raw_content: Option<String>,
    pub words: Vec<Word>,
}

impl TextContent {
    /// 没有任何文本的内容，用于前导空白行。
    #[must_use]
    pub fn empty() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn has_background_vocals(&self) -> bool {
        self.words.iter().any(|w| w.is_background)
            && self
                .background_content
                .as_deref()
                .is_some_and(|bg| !bg.trim().is_empty())
    }
}

/// 一个带时间的单词或音节。
///
/// `start_index`/`end_index` 是该词在所属文本（`content` 或
/// `background_content`）中的字符位置，`end_index` 包含在内。
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Word {
    pub content: String,
    pub start_millis: u64,
    pub start_index: usize,
    pub end_millis: u64,
    pub end_index: usize,
    pub duration_millis: u64,
    pub is_background: bool,
    pub actor: Option<LyricsActor>,
}
