//! # 节点
//!
//! 节点只描述自身的数据。父子关系由 [`super::tree::NodeTree`] 用索引维护，
//! 节点上没有指向父节点的引用。

use crate::LyricsActor;

/// 节点种类。合法的包含关系只有 Body ⊃ Section ⊃ Line ⊃ Word。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NodeKind {
    /// `<body>`
    Body,
    /// `<div>`
    Section,
    /// `<p>`
    Line,
    /// `<span>`
    Word,
}

impl NodeKind {
    pub(super) const COUNT: usize = 4;

    pub(super) const fn index(self) -> usize {
        match self {
            Self::Body => 0,
            Self::Section => 1,
            Self::Line => 2,
            Self::Word => 3,
        }
    }

    /// 该种类节点唯一合法的父节点种类。
    #[must_use]
    pub const fn parent(self) -> Option<Self> {
        match self {
            Self::Body => None,
            Self::Section => Some(Self::Body),
            Self::Line => Some(Self::Section),
            Self::Word => Some(Self::Line),
        }
    }

    /// `child` 能否直接挂在该种类的节点下面。
    #[must_use]
    pub fn accepts_child(self, child: Self) -> bool {
        child.parent() == Some(self)
    }
}

/// 节点上的时间属性。`None` 表示文档里没有给出或无法解析，
/// 会在合成阶段被推断出来。
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Timing {
    pub begin: Option<u64>,
    pub end: Option<u64>,
    pub dur: Option<u64>,
}

/// 树中的一个节点。
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Node {
    kind: NodeKind,
    timing: Timing,
    text: Option<String>,
    background: bool,
    actor: Option<LyricsActor>,
    key: Option<String>,
    closed: bool,
    pub(super) children: Vec<usize>,
}

impl Node {
    fn new(kind: NodeKind, timing: Timing) -> Self {
        Self {
            kind,
            timing,
            text: None,
            background: false,
            actor: None,
            key: None,
            closed: false,
            children: Vec::new(),
        }
    }

    /// `<body>` 节点只关心 `dur`。
    #[must_use]
    pub fn body(dur: Option<u64>) -> Self {
        Self::new(
            NodeKind::Body,
            Timing {
                dur,
                ..Timing::default()
            },
        )
    }

    #[must_use]
    pub fn section(timing: Timing) -> Self {
        Self::new(NodeKind::Section, timing)
    }

    /// `key` 是 `itunes:key`，用来关联翻译。
    #[must_use]
    pub fn line(timing: Timing, actor: Option<LyricsActor>, key: Option<String>) -> Self {
        Self {
            actor,
            key,
            ..Self::new(NodeKind::Line, timing)
        }
    }

    #[must_use]
    pub fn word(timing: Timing) -> Self {
        Self::new(NodeKind::Word, timing)
    }

    #[must_use]
    pub const fn kind(&self) -> NodeKind {
        self.kind
    }

    #[must_use]
    pub const fn timing(&self) -> Timing {
        self.timing
    }

    #[must_use]
    pub fn text(&self) -> Option<&str> {
        self.text.as_deref()
    }

    #[must_use]
    pub const fn is_background(&self) -> bool {
        self.background
    }

    #[must_use]
    pub const fn actor(&self) -> Option<LyricsActor> {
        self.actor
    }

    #[must_use]
    pub fn key(&self) -> Option<&str> {
        self.key.as_deref()
    }

    #[must_use]
    pub const fn is_closed(&self) -> bool {
        self.closed
    }

    #[must_use]
    pub fn has_children(&self) -> bool {
        !self.children.is_empty()
    }

    pub(super) fn mark_background(&mut self) -> bool {
        if self.closed || self.kind != NodeKind::Word {
            return false;
        }
        self.background = true;
        true
    }

    /// 单词的文本只能设置一次；没有子节点的行会累积文本。
    pub(super) fn set_text(&mut self, text: &str) -> bool {
        if self.closed {
            return false;
        }
        match self.kind {
            NodeKind::Word if self.text.is_none() => {
                self.text = Some(text.to_owned());
                true
            }
            NodeKind::Line if self.children.is_empty() => {
                self.text.get_or_insert_default().push_str(text);
                true
            }
            _ => false,
        }
    }

    /// 在已经结束的单词后面补一个空格（单词之间的空白文本）。
    pub(super) fn push_trailing_space(&mut self) {
        self.text.get_or_insert_default().push(' ');
    }

    pub(super) fn mark_closed(&mut self) -> bool {
        !std::mem::replace(&mut self.closed, true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_legal_containment() {
        assert!(NodeKind::Body.accepts_child(NodeKind::Section));
        assert!(NodeKind::Section.accepts_child(NodeKind::Line));
        assert!(NodeKind::Line.accepts_child(NodeKind::Word));

        assert!(!NodeKind::Body.accepts_child(NodeKind::Line));
        assert!(!NodeKind::Body.accepts_child(NodeKind::Word));
        assert!(!NodeKind::Section.accepts_child(NodeKind::Word));
        assert!(!NodeKind::Word.accepts_child(NodeKind::Word));
        assert!(!NodeKind::Line.accepts_child(NodeKind::Section));
        assert!(!NodeKind::Section.accepts_child(NodeKind::Body));
    }

    #[test]
    fn test_word_text_is_set_once() {
        let mut word = Node::word(Timing::default());
        assert!(word.set_text("Hel"));
        assert!(!word.set_text("lo"));
        assert_eq!(word.text(), Some("Hel"));
    }

    #[test]
    fn test_closed_node_rejects_mutation() {
        let mut word = Node::word(Timing::default());
        assert!(word.mark_closed());
        assert!(!word.mark_closed());
        assert!(!word.set_text("late"));
        assert!(!word.mark_background());
        assert!(word.text().is_none());
        assert!(!word.is_background());
    }

    #[test]
    fn test_only_words_can_be_background() {
        let mut line = Node::line(Timing::default(), None, None);
        assert!(!line.mark_background());
        let mut word = Node::word(Timing::default());
        assert!(word.mark_background());
        assert!(word.is_background());
    }
}
