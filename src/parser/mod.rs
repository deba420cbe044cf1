//! # TTML 歌词解析器
//!
//! 解析分为两步：
//!
//! 1. 驱动程序逐个读取 XML 事件，通过分发表把 `(标签, 开始/结束)` 映射成对
//!    [`NodeTree`] 和 [`TranslationSet`] 的操作。
//! 2. 文档读完后关闭节点树，由 [`synthesize`] 生成 [`crate::Lyrics`]。
//!
//! 该解析器只面向 Apple Music 风格的 TTML 歌词，不适合通用的 TTML 字幕文件。

mod constants;
mod handlers;
mod node;
mod state;
mod synthesis;
mod time;
mod translation;
mod tree;
mod utils;

use std::io::BufRead;

use quick_xml::{Reader, events::Event};
use tracing::{debug, error, trace, warn};

pub use self::{
    handlers::{Operation, Tag, TagEdge, dispatch},
    node::{Node, NodeKind, Timing},
    synthesis::synthesize,
    time::parse_time_expression,
    translation::{TranslationSet, TranslationTrack},
    tree::NodeTree,
};
use self::{
    constants::{TAG_BODY, TAG_DIV, TAG_TT},
    handlers::{handle_end, handle_start},
    state::ParserState,
    utils::decode_entity,
};
use crate::{Lyrics, ParsingOptions, TtmlError};

/// 解析 TTML 歌词。
///
/// # 参数
///
/// * `source` - TTML 文档的字节流。
/// * `fallback_duration_ms` - `<body>` 没有 `dur` 属性时使用的文档时长，通常是音轨长度。
/// * `options` - 翻译语言偏好等解析选项。
///
/// # 返回
///
/// * `Ok(Some(Lyrics))` - 成功解析出至少一行歌词。
/// * `Ok(None)` - 文档中没有任何歌词行。
///
/// 文档结构上的问题（比如 `<span>` 出现在 `<p>` 之外）不会导致错误：
/// 驱动程序在第一次违规时停止读取，并用已经得到的内容生成歌词。
///
/// # Errors
///
/// * [`TtmlError::Xml`] / [`TtmlError::Attribute`] / [`TtmlError::Encoding`] - 输入不是合法的 XML。
/// * [`TtmlError::TreeHasNoRoot`] - 文档中没有 `<body>`。
pub fn parse_ttml<R: BufRead>(
    source: R,
    fallback_duration_ms: u64,
    options: &ParsingOptions,
) -> Result<Option<Lyrics>, TtmlError> {
    let mut reader = Reader::from_reader(source);
    reader.config_mut().trim_text(false);
    reader.config_mut().expand_empty_elements = true;

    let mut state = ParserState::default();
    let mut buf = Vec::new();

    loop {
        let event = match reader.read_event_into(&mut buf) {
            Ok(event) => event,
            Err(e) => {
                error!(
                    "TTML 解析错误，位置 {}: {}。无法继续解析",
                    reader.error_position(),
                    e
                );
                return Err(TtmlError::Xml(e));
            }
        };

        let succeeded = match event {
            Event::Start(e) => {
                state.flush_text();
                handle_start(&e, reader.decoder(), &mut state)?
            }
            Event::End(e) => {
                state.flush_text();
                handle_end(e.local_name().as_ref(), &mut state)
            }
            Event::Text(e) => {
                state.text_buffer.push_str(&e.xml_content()?);
                true
            }
            Event::CData(e) => {
                state.text_buffer.push_str(&e.decode()?);
                true
            }
            Event::GeneralRef(e) => {
                let entity_name = String::from_utf8_lossy(e.as_ref());
                match decode_entity(&entity_name) {
                    Some(c) => state.text_buffer.push(c),
                    None => warn!("忽略未知的 XML 实体 '&{entity_name};'"),
                }
                true
            }
            Event::Eof => {
                state.flush_text();
                break;
            }
            _ => true,
        };

        if !succeeded && state.tree.has_root() {
            debug!(
                "位置 {} 处的文档结构无效，停止读取",
                reader.buffer_position()
            );
            break;
        }

        buf.clear();
    }

    state.tree.close();

    let language = options.effective_language();
    let translation = state.translations.select(language.as_deref());
    if let Some(track) = translation {
        trace!(
            "使用语言为 '{}' 的翻译轨道，共 {} 条",
            track.language(),
            track.len()
        );
    }

    synthesize(
        &state.tree,
        translation,
        fallback_duration_ms,
        options.min_offset_ms,
    )
}

/// 解析 TTML 字符串，见 [`parse_ttml`]。
///
/// # Errors
///
/// 与 [`parse_ttml`] 相同。
pub fn parse_ttml_str(
    content: &str,
    fallback_duration_ms: u64,
    options: &ParsingOptions,
) -> Result<Option<Lyrics>, TtmlError> {
    parse_ttml(content.as_bytes(), fallback_duration_ms, options)
}

/// 判断输入是否像是 TTML 歌词：存在 `<tt>` 元素，并且 `<body>` 中至少有一个 `<div>`。
///
/// 读取出错时返回 `false`。
pub fn handles_ttml<R: BufRead>(source: R) -> bool {
    let mut reader = Reader::from_reader(source);
    reader.config_mut().expand_empty_elements = true;

    let mut buf = Vec::new();
    let mut found_tt = false;
    let mut inside_body = false;

    loop {
        match reader.read_event_into(&mut buf) {
            Ok(Event::Start(e)) => match e.local_name().as_ref() {
                TAG_TT => found_tt = true,
                TAG_BODY => inside_body = true,
                TAG_DIV if inside_body => return found_tt,
                _ => {}
            },
            Ok(Event::End(e)) if e.local_name().as_ref() == TAG_BODY => inside_body = false,
            Ok(Event::Eof) => return false,
            Err(e) => {
                debug!("探测 TTML 格式时读取失败: {e}");
                return false;
            }
            Ok(_) => {}
        }
        buf.clear();
    }
}
