//! # 节点树状态机
//!
//! [`NodeTree`] 独占所有节点（存放在一个 `Vec` 里，用索引表示父子关系），
//! 并为每种节点记录当前“打开”的那一个。任意时刻每种节点最多只有一个处于打开状态，
//! 这对应了文档中 `<div>`、`<p>`、`<span>` 依次出现、互不重叠的结构。
//!
//! 所有变更操作都只返回成功与否，不会返回错误。

use tracing::trace;

use super::node::{Node, NodeKind};

/// 一次解析过程中构建的节点树。
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NodeTree {
    nodes: Vec<Node>,
    root: Option<usize>,
    /// 按 [`NodeKind::index`] 索引的“当前打开节点”缓存。
    open: [Option<usize>; NodeKind::COUNT],
    /// 之后打开的单词是否属于背景人声。这是整棵树共享的开关。
    background: bool,
    closed: bool,
}

impl NodeTree {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// 根节点存在且尚未关闭。
    #[must_use]
    pub fn has_root(&self) -> bool {
        self.root.is_some_and(|id| !self.nodes[id].is_closed())
    }

    #[must_use]
    pub const fn is_closed(&self) -> bool {
        self.closed
    }

    #[must_use]
    pub const fn is_background(&self) -> bool {
        self.background
    }

    #[must_use]
    pub fn root(&self) -> Option<&Node> {
        self.root.map(|id| &self.nodes[id])
    }

    /// 该种类当前打开的节点。
    #[must_use]
    pub fn open_node(&self, kind: NodeKind) -> Option<&Node> {
        self.open_id(kind).map(|id| &self.nodes[id])
    }

    /// `node` 的直接子节点，按加入顺序排列。
    pub fn children<'a>(&'a self, node: &'a Node) -> impl Iterator<Item = &'a Node> + 'a {
        node.children.iter().map(|&id| &self.nodes[id])
    }

    /// 设置 `<body>` 根节点。只有在还没有根节点时才会成功。
    pub fn add_root(&mut self, node: Node) -> bool {
        if self.closed || node.is_closed() || self.root.is_some() {
            trace!("拒绝添加根节点：树已关闭或已经存在根节点");
            return false;
        }
        if node.kind() != NodeKind::Body {
            trace!("拒绝添加根节点：{:?} 不能作为根节点", node.kind());
            return false;
        }

        let id = self.push_node(node);
        self.root = Some(id);
        self.open[NodeKind::Body.index()] = Some(id);
        true
    }

    pub fn open_section(&mut self, node: Node) -> bool {
        self.open_child(NodeKind::Section, node)
    }

    pub fn open_line(&mut self, node: Node) -> bool {
        self.open_child(NodeKind::Line, node)
    }

    /// 打开一个单词。如果背景开关处于开启状态，该单词会被标记为背景人声。
    pub fn open_word(&mut self, node: Node) -> bool {
        self.open_child(NodeKind::Word, node)
    }

    fn open_child(&mut self, kind: NodeKind, mut node: Node) -> bool {
        if !self.has_root() || self.closed {
            trace!("拒绝打开 {kind:?}：没有可用的根节点");
            return false;
        }
        if node.kind() != kind || node.is_closed() {
            trace!("拒绝打开 {kind:?}：节点种类为 {:?}", node.kind());
            return false;
        }
        if self.open_id(kind).is_some() {
            trace!("拒绝打开 {kind:?}：已有一个同类节点处于打开状态");
            return false;
        }
        let Some(parent_id) = kind.parent().and_then(|parent| self.open_id(parent)) else {
            trace!("拒绝打开 {kind:?}：父节点没有打开");
            return false;
        };
        if node.timing().begin.is_none() {
            trace!("拒绝打开 {kind:?}：缺少开始时间");
            return false;
        }

        if kind == NodeKind::Word && self.background {
            node.mark_background();
        }

        let id = self.push_node(node);
        self.nodes[parent_id].children.push(id);
        self.open[kind.index()] = Some(id);
        true
    }

    /// 把文本交给当前打开的节点。
    ///
    /// 1. 有打开的单词时，设置该单词的文本（只能设置一次）。
    /// 2. 否则，打开的行还没有子节点时，文本直接属于这一行。
    /// 3. 否则，纯空白的文本视为单词之间的空格，补在这一行最后一个单词后面。
    pub fn set_text(&mut self, text: &str) -> bool {
        if !self.has_root() || self.closed {
            return false;
        }

        if let Some(word_id) = self.open_id(NodeKind::Word) {
            return self.nodes[word_id].set_text(text);
        }

        let Some(line_id) = self.open_id(NodeKind::Line) else {
            return false;
        };
        if !self.nodes[line_id].has_children() {
            return self.nodes[line_id].set_text(text);
        }
        if text.trim().is_empty()
            && let Some(&last_word_id) = self.nodes[line_id].children.last()
        {
            self.nodes[last_word_id].push_trailing_space();
            return true;
        }
        false
    }

    /// 开启背景开关。有单词处于打开状态时失败。
    pub fn enter_background(&mut self) -> bool {
        self.toggle_background(true)
    }

    /// 关闭背景开关。有单词处于打开状态时失败。
    pub fn close_background(&mut self) -> bool {
        self.toggle_background(false)
    }

    fn toggle_background(&mut self, background: bool) -> bool {
        if !self.has_root() || self.open_id(NodeKind::Word).is_some() {
            return false;
        }
        self.background = background;
        true
    }

    /// 关闭该种类当前打开的节点（连同其子节点），之后可以打开下一个同类节点。
    pub fn close_node(&mut self, kind: NodeKind) -> bool {
        if !self.has_root() {
            return false;
        }
        let Some(id) = self.open_id(kind) else {
            trace!("无法关闭 {kind:?}：没有打开的同类节点");
            return false;
        };

        self.close_subtree(id);
        self.open[kind.index()] = None;
        true
    }

    /// 递归关闭所有节点。合成之前必须调用；重复调用不会产生任何变化并返回 `false`。
    pub fn close(&mut self) -> bool {
        let Some(root_id) = self.root else {
            return false;
        };
        if self.closed {
            return false;
        }

        self.close_subtree(root_id);
        self.closed = true;
        self.open = [None; NodeKind::COUNT];
        true
    }

    fn push_node(&mut self, node: Node) -> usize {
        self.nodes.push(node);
        self.nodes.len() - 1
    }

    fn open_id(&self, kind: NodeKind) -> Option<usize> {
        self.open[kind.index()].filter(|&id| !self.nodes[id].is_closed())
    }

    fn close_subtree(&mut self, id: usize) {
        let mut stack = vec![id];
        while let Some(current) = stack.pop() {
            let node = &mut self.nodes[current];
            node.mark_closed();
            stack.extend(node.children.iter().copied());
        }
        for slot in &mut self.open {
            if slot.is_some_and(|open_id| self.nodes[open_id].is_closed()) {
                *slot = None;
            }
        }
    }
}
