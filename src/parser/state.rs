//! # 解析驱动程序的状态

use tracing::trace;

use super::{translation::TranslationSet, tree::NodeTree};

/// 一个已打开的 `<span>` 在驱动程序眼中的角色。结束标签按这个栈决定要做什么。
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(super) enum SpanRole {
    /// 普通的计时单词。
    Word,
    /// `ttm:role="x-bg"` 背景人声组。
    Background,
    /// 带有其它角色的 span，其中的文本被丢弃。
    Ignored,
    /// 翻译条目中不带角色的 span，文本照常交给翻译。
    Passthrough,
}

/// 一次解析的全部可变状态。
#[derive(Debug, Default)]
pub(super) struct ParserState {
    pub(super) tree: NodeTree,
    pub(super) translations: TranslationSet,
    /// 当前打开的 `<span>`，从外到内。
    pub(super) span_stack: Vec<SpanRole>,
    /// 在下一个标签之前累积的文本。文本、CDATA 和实体引用会被合并成一个文本片段。
    pub(super) text_buffer: String,
}

impl ParserState {
    fn in_ignored_span(&self) -> bool {
        self.span_stack.contains(&SpanRole::Ignored)
    }

    /// 把缓冲区里的文本交给翻译轨道或节点树。
    ///
    /// 文本无法被接收时只记录日志，从不中断解析。
    pub(super) fn flush_text(&mut self) {
        if self.text_buffer.is_empty() {
            return;
        }
        let text = std::mem::take(&mut self.text_buffer);

        if self.in_ignored_span() {
            trace!("丢弃被忽略的 span 中的文本 '{text}'");
            return;
        }

        if self.translations.has_pending() {
            if !text.trim().is_empty() && !self.translations.translate(&text) {
                trace!("翻译条目拒绝了文本 '{}'", text.trim());
            }
            return;
        }

        if !self.tree.set_text(&text) && !text.trim().is_empty() {
            trace!("没有节点接收文本 '{}'", text.trim());
        }
    }
}
