//! # 翻译轨道
//!
//! 翻译位于 `<head>` 中，与节点树相互独立：
//!
//! ```xml
//! <translation type="replacement" xml:lang="es">
//!   <text for="L1">Hola<span ttm:role="x-bg">(hey)</span></text>
//! </translation>
//! ```
//!
//! 每种语言一条 [`TranslationTrack`]，每条轨道保存若干已完成的条目，
//! 以及最多一个正在填充的条目。

use std::collections::HashMap;

use tracing::trace;

use super::utils::collapse_whitespace;
use crate::{TextContent, TranslationLookupError};

#[derive(Debug, Clone, Default, PartialEq, Eq)]
struct TranslationEntry {
    content: Option<String>,
    background_content: Option<String>,
}

impl TranslationEntry {
    fn to_text_content(&self) -> TextContent {
        TextContent {
            content: self.content.clone().unwrap_or_default(),
            background_content: self.background_content.clone(),
            raw_content: None,
            words: Vec::new(),
        }
    }
}

/// 正在填充的条目。主文本和背景文本各自只能写入一次。
#[derive(Debug, Clone, PartialEq, Eq)]
struct PendingEntry {
    key: String,
    entry: TranslationEntry,
    background: bool,
}

impl PendingEntry {
    fn set_content(&mut self, content: &str) -> bool {
        let slot = if self.background {
            &mut self.entry.background_content
        } else {
            &mut self.entry.content
        };
        if slot.is_some() {
            return false;
        }
        *slot = Some(collapse_whitespace(content));
        true
    }
}

/// 某一种语言的翻译。
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TranslationTrack {
    translation_type: String,
    language: String,
    entries: HashMap<String, TranslationEntry>,
    pending: Option<PendingEntry>,
    closed: bool,
}

impl TranslationTrack {
    #[must_use]
    pub fn new(translation_type: impl Into<String>, language: impl Into<String>) -> Self {
        Self {
            translation_type: translation_type.into(),
            language: language.into(),
            entries: HashMap::new(),
            pending: None,
            closed: false,
        }
    }

    #[must_use]
    pub fn language(&self) -> &str {
        &self.language
    }

    #[must_use]
    pub fn translation_type(&self) -> &str {
        &self.translation_type
    }

    #[must_use]
    pub const fn is_closed(&self) -> bool {
        self.closed
    }

    #[must_use]
    pub const fn has_pending(&self) -> bool {
        self.pending.is_some()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// 开始填充 `key` 对应的条目。已有未完成的条目，或者该键已经存在时失败。
    pub fn prepare(&mut self, key: &str) -> bool {
        if self.closed || self.pending.is_some() || key.is_empty() {
            return false;
        }
        if self.entries.contains_key(key) {
            trace!("翻译键 '{key}' 重复，忽略");
            return false;
        }
        self.pending = Some(PendingEntry {
            key: key.to_owned(),
            entry: TranslationEntry::default(),
            background: false,
        });
        true
    }

    /// 写入正在填充的条目的主文本或背景文本（由最后一次 [`Self::background`] 决定）。
    pub fn translate(&mut self, content: &str) -> bool {
        if self.closed {
            return false;
        }
        self.pending
            .as_mut()
            .is_some_and(|pending| pending.set_content(content))
    }

    /// 切换之后的 [`Self::translate`] 写入哪一类文本。值没有变化时返回 `false`。
    pub fn background(&mut self, background: bool) -> bool {
        if self.closed {
            return false;
        }
        match self.pending.as_mut() {
            Some(pending) if pending.background != background => {
                pending.background = background;
                true
            }
            _ => false,
        }
    }

    /// 把正在填充的条目移入已完成的集合。
    pub fn finish(&mut self) -> bool {
        if self.closed {
            return false;
        }
        let Some(pending) = self.pending.take() else {
            return false;
        };
        self.entries.insert(pending.key, pending.entry);
        true
    }

    /// 关闭轨道。仍有未完成的条目时失败。
    pub fn close(&mut self) -> bool {
        if self.closed || self.pending.is_some() {
            return false;
        }
        self.closed = true;
        true
    }

    /// 查找 `key` 对应的翻译。只有关闭后的轨道才能查询。
    pub fn get(&self, key: &str) -> Result<TextContent, TranslationLookupError> {
        if !self.closed {
            return Err(TranslationLookupError::NotClosed);
        }
        self.entries
            .get(key)
            .map(TranslationEntry::to_text_content)
            .ok_or(TranslationLookupError::NotFound)
    }

    /// 轨道语言与 `language` 完全相同（不区分大小写）。
    #[must_use]
    pub fn is_language(&self, language: &str) -> bool {
        self.language.trim().eq_ignore_ascii_case(language.trim())
    }

    /// 轨道语言与 `language` 的基础语言相同（`es-MX` 与 `es`）。
    #[must_use]
    pub fn shares_base_language(&self, language: &str) -> bool {
        base_language(self.language.trim()).eq_ignore_ascii_case(base_language(language.trim()))
    }
}

fn base_language(tag: &str) -> &str {
    tag.split(['-', '_']).next().unwrap_or(tag)
}

/// 一次解析中出现的所有翻译轨道，按出现顺序保存。同一时刻最多只有一条轨道处于打开状态。
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TranslationSet {
    tracks: Vec<TranslationTrack>,
    current: Option<usize>,
}

impl TranslationSet {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn tracks(&self) -> &[TranslationTrack] {
        &self.tracks
    }

    /// 正在填充翻译条目（位于 `<text>` 内部）。
    #[must_use]
    pub fn has_pending(&self) -> bool {
        self.current_track().is_some_and(TranslationTrack::has_pending)
    }

    /// 打开一条新的翻译轨道。
    ///
    /// 类型和语言都不能为空；已经有打开的轨道，或者该语言的轨道已经存在时失败。
    pub fn create(&mut self, translation_type: Option<&str>, language: Option<&str>) -> bool {
        let (Some(translation_type), Some(language)) = (
            translation_type.map(str::trim).filter(|s| !s.is_empty()),
            language.map(str::trim).filter(|s| !s.is_empty()),
        ) else {
            trace!("拒绝创建翻译轨道：缺少类型或语言");
            return false;
        };
        if self.current.is_some() {
            trace!("拒绝创建翻译轨道 '{language}'：上一条轨道尚未关闭");
            return false;
        }
        if self
            .tracks
            .iter()
            .any(|track| track.language().eq_ignore_ascii_case(language))
        {
            trace!("拒绝创建翻译轨道：语言 '{language}' 已存在");
            return false;
        }

        self.tracks
            .push(TranslationTrack::new(translation_type, language));
        self.current = Some(self.tracks.len() - 1);
        true
    }

    /// 关闭当前打开的轨道。
    pub fn close_current(&mut self) -> bool {
        let closed = self
            .current_track_mut()
            .is_some_and(TranslationTrack::close);
        if closed {
            self.current = None;
        }
        closed
    }

    pub fn prepare(&mut self, key: Option<&str>) -> bool {
        match (self.current_track_mut(), key) {
            (Some(track), Some(key)) => track.prepare(key.trim()),
            _ => false,
        }
    }

    pub fn translate(&mut self, content: &str) -> bool {
        self.current_track_mut()
            .is_some_and(|track| track.translate(content))
    }

    pub fn background(&mut self, background: bool) -> bool {
        self.current_track_mut()
            .is_some_and(|track| track.background(background))
    }

    pub fn finish(&mut self) -> bool {
        self.current_track_mut()
            .is_some_and(TranslationTrack::finish)
    }

    /// 选择用于合成的轨道。在已关闭的轨道中依次查找语言与 `language` 完全相同的、
    /// 基础语言相同的，都没有时选择第一条。
    #[must_use]
    pub fn select(&self, language: Option<&str>) -> Option<&TranslationTrack> {
        let mut closed = self.tracks.iter().filter(|track| track.is_closed());
        language
            .and_then(|lang| {
                closed
                    .clone()
                    .find(|track| track.is_language(lang))
                    .or_else(|| closed.clone().find(|track| track.shares_base_language(lang)))
            })
            .or_else(|| closed.next())
    }

    fn current_track(&self) -> Option<&TranslationTrack> {
        self.current.map(|index| &self.tracks[index])
    }

    fn current_track_mut(&mut self) -> Option<&mut TranslationTrack> {
        self.current.map(|index| &mut self.tracks[index])
    }
}
