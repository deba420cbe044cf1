//! # 歌词合成
//!
//! 把已关闭的节点树（以及选中的翻译轨道）转换成 [`Lyrics`]。
//! 这一步是纯函数：不修改树，也不读取任何外部状态。

use std::collections::HashSet;

use tracing::debug;

use super::{
    node::{Node, NodeKind},
    translation::TranslationTrack,
    tree::NodeTree,
    utils::collapse_whitespace,
};
use crate::{Line, Lyrics, TextContent, TtmlError, Word};

/// 由节点树生成歌词。
///
/// * `translation` - 用于填充 [`Line::translation`] 的轨道，按行的 `itunes:key` 查找。
/// * `fallback_duration_ms` - `<body>` 没有 `dur` 时使用的文档时长。
/// * `min_offset_ms` - 第一行开始得比这更晚时，在前面补一行空白。
///
/// 没有任何歌词行时返回 `Ok(None)`。
///
/// # Errors
///
/// * [`TtmlError::TreeHasNoRoot`] - 树中没有 `<body>` 根节点。
/// * [`TtmlError::TreeNotClosed`] - 还没有调用 [`NodeTree::close`]。
pub fn synthesize(
    tree: &NodeTree,
    translation: Option<&TranslationTrack>,
    fallback_duration_ms: u64,
    min_offset_ms: u64,
) -> Result<Option<Lyrics>, TtmlError> {
    let root = tree.root().ok_or(TtmlError::TreeHasNoRoot)?;
    if !tree.is_closed() {
        return Err(TtmlError::TreeNotClosed);
    }

    let duration_millis = root.timing().dur.unwrap_or(fallback_duration_ms);

    let mut line_nodes: Vec<&Node> = tree
        .children(root)
        .filter(|section| section.kind() == NodeKind::Section)
        .flat_map(|section| tree.children(section))
        .filter(|line| line.kind() == NodeKind::Line)
        .collect();
    line_nodes.sort_by_key(|line| line.timing().begin);

    let mut lines: Vec<Line> = line_nodes
        .iter()
        .enumerate()
        .map(|(index, node)| {
            let next_begin = line_nodes
                .get(index + 1)
                .and_then(|next| next.timing().begin);
            build_line(tree, node, next_begin, duration_millis, translation)
        })
        .collect();

    let mut seen = HashSet::with_capacity(lines.len());
    lines.retain(|line| seen.insert(line.id()));

    if lines.is_empty() {
        debug!("节点树中没有歌词行");
        return Ok(None);
    }

    if let Some(first) = lines.first()
        && first.start_at > min_offset_ms
    {
        let filler = Line {
            start_at: 0,
            end: first.start_at,
            duration_millis: first.start_at,
            content: TextContent::empty(),
            translation: None,
            actor: first.actor,
        };
        lines.insert(0, filler);
    }

    debug!("合成了 {} 行歌词，时长 {duration_millis}ms", lines.len());
    Ok(Some(Lyrics {
        duration_millis,
        lines,
    }))
}

fn build_line(
    tree: &NodeTree,
    node: &Node,
    next_begin: Option<u64>,
    document_end: u64,
    translation: Option<&TranslationTrack>,
) -> Line {
    let timing = node.timing();
    // 能挂到树上的行一定有开始时间
    let start_at = timing.begin.unwrap_or_default();
    let mut end = timing.end.or(next_begin).unwrap_or(document_end);
    // 行开始于文档结尾之前时，不能越过文档结尾
    if start_at < document_end {
        end = end.min(document_end);
    }
    let duration_millis = timing.dur.unwrap_or_else(|| end.saturating_sub(start_at));

    let content = match node.text().map(collapse_whitespace) {
        Some(text) if !text.is_empty() => TextContent {
            raw_content: Some(text.clone()),
            content: text,
            ..TextContent::default()
        },
        _ => word_content(tree, node, end),
    };

    let translation = translation.and_then(|track| {
        let key = node.key()?;
        track.get(key).ok()
    });

    Line {
        start_at,
        end,
        duration_millis,
        content,
        translation,
        actor: node.actor(),
    }
}

/// 主歌词和背景人声各自累积的文本。
#[derive(Default)]
struct TextAccumulator {
    text: String,
    chars: usize,
}

impl TextAccumulator {
    /// 追加一段文本，返回它的字符区间（`end` 包含在内）。
    fn push(&mut self, text: &str) -> (usize, usize) {
        let start = self.chars;
        let len = text.chars().count();
        self.text.push_str(text);
        self.chars += len;
        (start, (start + len).saturating_sub(1))
    }

    fn leading_whitespace(&self) -> usize {
        self.text.chars().take_while(|c| c.is_whitespace()).count()
    }
}

fn word_content(tree: &NodeTree, line: &Node, line_end: u64) -> TextContent {
    let mut word_nodes: Vec<&Node> = tree
        .children(line)
        .filter(|word| word.kind() == NodeKind::Word)
        .collect();
    word_nodes.sort_by_key(|word| word.timing().begin);

    let mut foreground = TextAccumulator::default();
    let mut background = TextAccumulator::default();
    let mut words = Vec::with_capacity(word_nodes.len());

    for (index, node) in word_nodes.iter().enumerate() {
        let timing = node.timing();
        let start_millis = timing.begin.unwrap_or_default();
        let end_millis = timing
            .end
            .or_else(|| word_nodes.get(index + 1).and_then(|n| n.timing().begin))
            .unwrap_or(line_end);
        let duration_millis = timing
            .dur
            .unwrap_or_else(|| end_millis.saturating_sub(start_millis));

        let text = node.text().unwrap_or_default();
        let is_background = node.is_background();
        let accumulator = if is_background {
            &mut background
        } else {
            &mut foreground
        };
        let (start_index, end_index) = accumulator.push(text);

        words.push(Word {
            content: text.to_owned(),
            start_millis,
            start_index,
            end_millis,
            end_index,
            duration_millis,
            is_background,
            actor: line
                .actor()
                .map(|actor| actor.as_background(is_background)),
        });
    }

    let content = foreground.text.trim().to_owned();
    let background_content = Some(background.text.trim())
        .filter(|bg| !bg.is_empty())
        .map(str::to_owned);

    // 索引相对于去掉首尾空白后的文本，末尾的空白不计入
    let foreground_bounds = (
        foreground.leading_whitespace(),
        content.chars().count().saturating_sub(1),
    );
    let background_bounds = (
        background.leading_whitespace(),
        background_content
            .as_deref()
            .map_or(0, |bg| bg.chars().count().saturating_sub(1)),
    );
    for word in &mut words {
        let (offset, last) = if word.is_background {
            background_bounds
        } else {
            foreground_bounds
        };
        word.start_index = word.start_index.saturating_sub(offset).min(last);
        word.end_index = word.end_index.saturating_sub(offset).min(last);
    }

    let raw_content = Some(match &background_content {
        Some(bg) => format!("{content}\n{bg}"),
        None => content.clone(),
    });

    TextContent {
        content,
        background_content,
        raw_content,
        words,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{LyricsActor, parser::node::Timing};

    fn timing(begin: u64, end: Option<u64>) -> Timing {
        Timing {
            begin: Some(begin),
            end,
            dur: None,
        }
    }

    fn tree_with_root(dur: Option<u64>) -> NodeTree {
        let mut tree = NodeTree::new();
        assert!(tree.add_root(Node::body(dur)));
        assert!(tree.open_section(Node::section(timing(0, None))));
        tree
    }

    fn add_word(tree: &mut NodeTree, begin: u64, end: u64, text: &str) {
        assert!(tree.open_word(Node::word(timing(begin, Some(end)))));
        assert!(tree.set_text(text));
        assert!(tree.close_node(NodeKind::Word));
    }

    #[test]
    fn test_preconditions() {
        let tree = NodeTree::new();
        assert!(matches!(
            synthesize(&tree, None, 0, 0),
            Err(TtmlError::TreeHasNoRoot)
        ));

        let tree = tree_with_root(None);
        assert!(matches!(
            synthesize(&tree, None, 0, 0),
            Err(TtmlError::TreeNotClosed)
        ));
    }

    #[test]
    fn test_empty_tree_yields_none() {
        let mut tree = tree_with_root(Some(1000));
        assert!(tree.close());
        assert_eq!(synthesize(&tree, None, 0, 0).ok(), Some(None));
    }

    #[test]
    fn test_plain_line() {
        let mut tree = tree_with_root(None);
        assert!(tree.open_line(Node::line(timing(0, Some(5000)), None, None)));
        assert!(tree.set_text("  Hello \n  world "));
        assert!(tree.close());

        let lyrics = synthesize(&tree, None, 9000, 1000).ok().flatten();
        let lyrics = lyrics.expect("应该生成歌词");
        assert_eq!(lyrics.duration_millis, 9000);
        assert_eq!(lyrics.lines.len(), 1);
        let line = &lyrics.lines[0];
        assert_eq!((line.start_at, line.end, line.duration_millis), (0, 5000, 5000));
        assert_eq!(line.content.content, "Hello world");
        assert!(line.content.words.is_empty());
    }

    #[test]
    fn test_end_inferred_from_next_line_and_document() {
        let mut tree = tree_with_root(Some(10_000));
        assert!(tree.open_line(Node::line(timing(3000, None), None, None)));
        assert!(tree.set_text("second"));
        assert!(tree.close_node(NodeKind::Line));
        assert!(tree.open_line(Node::line(timing(1000, None), None, None)));
        assert!(tree.set_text("first"));
        assert!(tree.close());

        let lyrics = synthesize(&tree, None, 0, 1000).ok().flatten();
        let lyrics = lyrics.expect("应该生成歌词");
        let spans: Vec<_> = lyrics
            .lines
            .iter()
            .map(|l| (l.start_at, l.end, l.content.content.as_str()))
            .collect();
        assert_eq!(spans, vec![(1000, 3000, "first"), (3000, 10_000, "second")]);
    }

    #[test]
    fn test_word_indices_and_background() {
        let mut tree = tree_with_root(None);
        assert!(tree.open_line(Node::line(
            timing(0, Some(3000)),
            Some(LyricsActor::Voice2),
            None
        )));
        add_word(&mut tree, 0, 500, "Hel");
        add_word(&mut tree, 500, 1000, "lo");
        assert!(tree.set_text(" "));
        add_word(&mut tree, 1000, 1500, "you");
        assert!(tree.enter_background());
        add_word(&mut tree, 1500, 2000, "(ooh)");
        assert!(tree.close_background());
        assert!(tree.close());

        let lyrics = synthesize(&tree, None, 0, 1000).ok().flatten();
        let lyrics = lyrics.expect("应该生成歌词");
        let content = &lyrics.lines[0].content;
        assert_eq!(content.content, "Hello you");
        assert_eq!(content.background_content.as_deref(), Some("(ooh)"));
        assert_eq!(content.raw_content.as_deref(), Some("Hello you\n(ooh)"));

        let indices: Vec<_> = content
            .words
            .iter()
            .map(|w| (w.start_index, w.end_index, w.is_background))
            .collect();
        assert_eq!(
            indices,
            vec![(0, 2, false), (3, 5, false), (6, 8, false), (0, 4, true)]
        );
        assert_eq!(
            content.words[3].actor,
            Some(LyricsActor::Voice2Background)
        );
        assert_eq!(content.words[0].actor, Some(LyricsActor::Voice2));
    }

    #[test]
    fn test_line_end_clamped_to_document() {
        let mut tree = tree_with_root(Some(4000));
        assert!(tree.open_line(Node::line(timing(1000, Some(9000)), None, None)));
        assert!(tree.set_text("long"));
        assert!(tree.close());

        let lyrics = synthesize(&tree, None, 0, 1000).ok().flatten();
        let line = lyrics.map(|l| l.lines[0].clone()).expect("应该生成歌词");
        assert_eq!((line.end, line.duration_millis), (4000, 3000));
    }

    #[test]
    fn test_line_after_document_end_keeps_its_timing() {
        let mut tree = tree_with_root(Some(5000));
        assert!(tree.open_line(Node::line(timing(6000, Some(7000)), None, None)));
        assert!(tree.set_text("outro"));
        assert!(tree.close());

        let lyrics = synthesize(&tree, None, 0, 10_000).ok().flatten();
        let line = lyrics.map(|l| l.lines[0].clone()).expect("应该生成歌词");
        assert_eq!(
            (line.start_at, line.end, line.duration_millis),
            (6000, 7000, 1000)
        );
    }

    #[test]
    fn test_trailing_whitespace_stays_inside_indices() {
        let mut tree = tree_with_root(None);
        assert!(tree.open_line(Node::line(timing(0, Some(3000)), None, None)));
        assert!(tree.set_text("\n  "));
        add_word(&mut tree, 0, 1000, "Hello");
        assert!(tree.set_text("\n  "));
        add_word(&mut tree, 1000, 2000, "world");
        assert!(tree.set_text("\n  "));
        assert!(tree.enter_background());
        add_word(&mut tree, 2000, 3000, "(ooh)");
        assert!(tree.close_background());
        assert!(tree.set_text("\n"));
        assert!(tree.close());

        let lyrics = synthesize(&tree, None, 0, 1000).ok().flatten();
        let lyrics = lyrics.expect("应该生成歌词");
        let content = &lyrics.lines[0].content;
        assert_eq!(content.content, "Hello world");
        assert_eq!(content.background_content.as_deref(), Some("(ooh)"));

        let indices: Vec<_> = content
            .words
            .iter()
            .map(|w| (w.start_index, w.end_index))
            .collect();
        assert_eq!(indices, vec![(0, 5), (6, 10), (0, 4)]);
    }

    #[test]
    fn test_filler_line_before_late_start() {
        let mut tree = tree_with_root(None);
        assert!(tree.open_line(Node::line(
            timing(5000, Some(6000)),
            Some(LyricsActor::Voice1),
            None
        )));
        assert!(tree.set_text("late"));
        assert!(tree.close());

        let lyrics = synthesize(&tree, None, 0, 1000).ok().flatten();
        let lyrics = lyrics.expect("应该生成歌词");
        assert_eq!(lyrics.lines.len(), 2);
        let filler = &lyrics.lines[0];
        assert_eq!((filler.start_at, filler.end), (0, 5000));
        assert!(filler.content.content.is_empty());
        assert_eq!(filler.actor, Some(LyricsActor::Voice1));
    }

    #[test]
    fn test_duplicate_lines_are_dropped() {
        let mut tree = tree_with_root(None);
        for _ in 0..2 {
            assert!(tree.open_line(Node::line(timing(0, Some(1000)), None, None)));
            assert!(tree.set_text("again"));
            assert!(tree.close_node(NodeKind::Line));
        }
        assert!(tree.close());

        let lyrics = synthesize(&tree, None, 0, 1000).ok().flatten();
        assert_eq!(lyrics.map(|l| l.lines.len()), Some(1));
    }
}
