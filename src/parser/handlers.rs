//! # TTML 解析器 - 分发表与事件处理器
//!
//! 只识别六种标签。每个 `(标签, 开始/结束)` 组合通过 [`dispatch`] 映射到一个明确的
//! [`Operation`]，再由 [`handle_start`]/[`handle_end`] 作用到节点树或翻译轨道上。

use quick_xml::{encoding::Decoder, events::BytesStart};
use tracing::trace;

use super::{
    constants::{
        ATTR_AGENT, ATTR_AGENT_ALIAS, ATTR_BEGIN, ATTR_DUR, ATTR_END, ATTR_FOR, ATTR_ITUNES_KEY,
        ATTR_ROLE, ATTR_ROLE_ALIAS, ATTR_TYPE, ATTR_XML_LANG, ROLE_BACKGROUND, TAG_BODY, TAG_DIV,
        TAG_P, TAG_SPAN, TAG_TEXT, TAG_TRANSLATION,
    },
    node::{Node, NodeKind, Timing},
    state::{ParserState, SpanRole},
    utils::{get_string_attribute, get_time_attribute},
};
use crate::{LyricsActor, TtmlError};

/// 驱动程序识别的标签。
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tag {
    Translation,
    Text,
    Body,
    Div,
    P,
    Span,
}

impl Tag {
    /// 按本地名（不含命名空间前缀）识别标签。
    #[must_use]
    pub fn from_local_name(name: &[u8]) -> Option<Self> {
        match name {
            TAG_TRANSLATION => Some(Self::Translation),
            TAG_TEXT => Some(Self::Text),
            TAG_BODY => Some(Self::Body),
            TAG_DIV => Some(Self::Div),
            TAG_P => Some(Self::P),
            TAG_SPAN => Some(Self::Span),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TagEdge {
    Start,
    End,
}

/// 驱动程序对节点树和翻译轨道执行的操作。
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operation {
    CreateTranslation,
    CloseTranslation,
    PrepareTranslation,
    FinishTranslation,
    AddRoot,
    CloseBody,
    OpenSection,
    CloseSection,
    OpenLine,
    CloseLine,
    /// 打开单词或进入背景人声组，取决于 `ttm:role`。
    OpenSpan,
    /// 关闭单词；没有打开的单词时退出背景人声组。
    CloseSpan,
}

/// 分发表。
#[must_use]
pub const fn dispatch(tag: Tag, edge: TagEdge) -> Operation {
    match (tag, edge) {
        (Tag::Translation, TagEdge::Start) => Operation::CreateTranslation,
        (Tag::Translation, TagEdge::End) => Operation::CloseTranslation,
        (Tag::Text, TagEdge::Start) => Operation::PrepareTranslation,
        (Tag::Text, TagEdge::End) => Operation::FinishTranslation,
        (Tag::Body, TagEdge::Start) => Operation::AddRoot,
        (Tag::Body, TagEdge::End) => Operation::CloseBody,
        (Tag::Div, TagEdge::Start) => Operation::OpenSection,
        (Tag::Div, TagEdge::End) => Operation::CloseSection,
        (Tag::P, TagEdge::Start) => Operation::OpenLine,
        (Tag::P, TagEdge::End) => Operation::CloseLine,
        (Tag::Span, TagEdge::Start) => Operation::OpenSpan,
        (Tag::Span, TagEdge::End) => Operation::CloseSpan,
    }
}

/// 处理开始标签。返回操作是否成功；不认识的标签总是成功。
///
/// 只有读取属性失败时才会返回错误。
pub(super) fn handle_start(
    e: &BytesStart,
    decoder: Decoder,
    state: &mut ParserState,
) -> Result<bool, TtmlError> {
    let Some(tag) = Tag::from_local_name(e.local_name().as_ref()) else {
        return Ok(true);
    };

    let succeeded = match dispatch(tag, TagEdge::Start) {
        Operation::CreateTranslation => {
            let translation_type = get_string_attribute(e, decoder, &[ATTR_TYPE])?;
            let language = get_string_attribute(e, decoder, &[ATTR_XML_LANG])?;
            state
                .translations
                .create(translation_type.as_deref(), language.as_deref())
        }
        Operation::PrepareTranslation => {
            let key = get_string_attribute(e, decoder, &[ATTR_FOR])?;
            state.translations.prepare(key.as_deref())
        }
        Operation::AddRoot => {
            let dur = get_time_attribute(e, decoder, &[ATTR_DUR])?;
            state.tree.add_root(Node::body(dur))
        }
        Operation::OpenSection => {
            let mut timing = read_timing(e, decoder)?;
            // `<div>` 不参与计时，没有开始时间时视为从文档开头开始
            timing.begin.get_or_insert(0);
            state.tree.open_section(Node::section(timing))
        }
        Operation::OpenLine => {
            let timing = read_timing(e, decoder)?;
            let actor = get_string_attribute(e, decoder, &[ATTR_AGENT, ATTR_AGENT_ALIAS])?
                .and_then(|agent| LyricsActor::from_agent(&agent));
            let key = get_string_attribute(e, decoder, &[ATTR_ITUNES_KEY])?;
            state.tree.open_line(Node::line(timing, actor, key))
        }
        Operation::OpenSpan => open_span(e, decoder, state)?,
        other => {
            trace!("{other:?} 不是开始标签的操作");
            false
        }
    };

    if !succeeded {
        trace!("开始标签 {tag:?} 的操作失败");
    }
    Ok(succeeded)
}

/// 处理结束标签。返回操作是否成功；不认识的标签总是成功。
pub(super) fn handle_end(local_name: &[u8], state: &mut ParserState) -> bool {
    let Some(tag) = Tag::from_local_name(local_name) else {
        return true;
    };

    let succeeded = match dispatch(tag, TagEdge::End) {
        Operation::CloseTranslation => state.translations.close_current(),
        Operation::FinishTranslation => state.translations.finish(),
        Operation::CloseBody => state.tree.close_node(NodeKind::Body),
        Operation::CloseSection => state.tree.close_node(NodeKind::Section),
        Operation::CloseLine => state.tree.close_node(NodeKind::Line),
        Operation::CloseSpan => close_span(state),
        other => {
            trace!("{other:?} 不是结束标签的操作");
            false
        }
    };

    if !succeeded {
        trace!("结束标签 {tag:?} 的操作失败");
    }
    succeeded
}

fn read_timing(e: &BytesStart, decoder: Decoder) -> Result<Timing, TtmlError> {
    Ok(Timing {
        begin: get_time_attribute(e, decoder, &[ATTR_BEGIN])?,
        end: get_time_attribute(e, decoder, &[ATTR_END])?,
        dur: get_time_attribute(e, decoder, &[ATTR_DUR])?,
    })
}

/// `<span>` 有两种用法：带 `ttm:role="x-bg"` 的背景人声组，以及普通的单词。
/// 其它角色（翻译、音译等内联 span）连同其中的文本一起被跳过。
fn open_span(
    e: &BytesStart,
    decoder: Decoder,
    state: &mut ParserState,
) -> Result<bool, TtmlError> {
    let role = get_string_attribute(e, decoder, &[ATTR_ROLE, ATTR_ROLE_ALIAS])?;
    let in_translation = state.translations.has_pending();

    let (span_role, succeeded) = match role.as_deref().map(str::trim) {
        Some(ROLE_BACKGROUND) if in_translation => {
            state.translations.background(true);
            (SpanRole::Background, true)
        }
        Some(ROLE_BACKGROUND) => (SpanRole::Background, state.tree.enter_background()),
        Some(other) if !other.is_empty() => {
            trace!("跳过角色为 '{other}' 的 span");
            (SpanRole::Ignored, true)
        }
        _ if in_translation => (SpanRole::Passthrough, true),
        _ => {
            let timing = read_timing(e, decoder)?;
            (SpanRole::Word, state.tree.open_word(Node::word(timing)))
        }
    };

    state.span_stack.push(span_role);
    Ok(succeeded)
}

fn close_span(state: &mut ParserState) -> bool {
    match state.span_stack.pop() {
        Some(SpanRole::Ignored | SpanRole::Passthrough) => true,
        Some(SpanRole::Background) if state.translations.has_pending() => {
            state.translations.background(false);
            true
        }
        _ => state.tree.close_node(NodeKind::Word) || state.tree.close_background(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const ALL_TAGS: [Tag; 6] = [
        Tag::Translation,
        Tag::Text,
        Tag::Body,
        Tag::Div,
        Tag::P,
        Tag::Span,
    ];

    #[test]
    fn test_tag_recognition() {
        assert_eq!(Tag::from_local_name(b"p"), Some(Tag::P));
        assert_eq!(Tag::from_local_name(b"span"), Some(Tag::Span));
        assert_eq!(Tag::from_local_name(b"translation"), Some(Tag::Translation));
        assert_eq!(Tag::from_local_name(b"tt"), None);
        assert_eq!(Tag::from_local_name(b"head"), None);
        assert_eq!(Tag::from_local_name(b"br"), None);
    }

    #[test]
    fn test_dispatch_table_is_a_bijection() {
        let mut operations = Vec::new();
        for tag in ALL_TAGS {
            for edge in [TagEdge::Start, TagEdge::End] {
                let operation = dispatch(tag, edge);
                assert!(!operations.contains(&operation), "{operation:?} 重复");
                operations.push(operation);
            }
        }
        assert_eq!(operations.len(), 12);
    }

    #[test]
    fn test_dispatch_pairs_open_and_close() {
        assert_eq!(dispatch(Tag::Body, TagEdge::Start), Operation::AddRoot);
        assert_eq!(dispatch(Tag::Body, TagEdge::End), Operation::CloseBody);
        assert_eq!(dispatch(Tag::Div, TagEdge::Start), Operation::OpenSection);
        assert_eq!(dispatch(Tag::P, TagEdge::End), Operation::CloseLine);
        assert_eq!(dispatch(Tag::Span, TagEdge::End), Operation::CloseSpan);
        assert_eq!(
            dispatch(Tag::Text, TagEdge::Start),
            Operation::PrepareTranslation
        );
        assert_eq!(
            dispatch(Tag::Translation, TagEdge::End),
            Operation::CloseTranslation
        );
    }

    #[test]
    fn test_end_tags_on_empty_state_fail() {
        let mut state = ParserState::default();
        assert!(!handle_end(b"p", &mut state));
        assert!(!handle_end(b"span", &mut state));
        assert!(!handle_end(b"translation", &mut state));
        assert!(handle_end(b"tt", &mut state));
    }
}
