//! # TTML Lyrics: A Streaming Parser for Apple Music Style TTML Lyrics
//!
//! This crate turns TTML (Timed Text Markup Language) lyric documents into a small,
//! display-ready model: [`Lyrics`] made of [`Line`]s, each carrying its text, optional
//! per-word timing, background vocals and a translation.
//!
//! Parsing happens in a single forward pass over the XML events. Every recognized
//! `(tag, start/end)` pair is mapped by a dispatch table to one operation on an
//! arena-owned node tree (`body > div > p > span`) or on a translation track. When the
//! document ends the tree is closed and a pure synthesis step produces the output.
//!
//! ## ⚠️ Important: Not a General-Purpose Parser
//!
//! Only the lyric conventions used by Apple Music are understood: `itunes:key`,
//! `ttm:agent`, `ttm:role="x-bg"` background vocals and `<translation>` blocks in the
//! head. Styling, regions and other TTML subtitle features are ignored.
//!
//! ## Examples
//!
//! ```rust
//! use ttml_lyrics::{LyricsParser, TtmlLyricsParser};
//!
//! let ttml = r#"
//! <tt xmlns="http://www.w3.org/ns/ttml" xmlns:itunes="http://music.apple.com/lyric-ttml-internal">
//!   <head>
//!     <iTunesMetadata>
//!       <translations>
//!         <translation type="replacement" xml:lang="es">
//!           <text for="L1">Hola</text>
//!         </translation>
//!       </translations>
//!     </iTunesMetadata>
//!   </head>
//!   <body dur="10s">
//!     <div begin="0s">
//!       <p begin="1.5s" end="4s" itunes:key="L1"><span begin="1.5s" end="2s">Hel</span><span begin="2s" end="4s">lo</span></p>
//!     </div>
//!   </body>
//! </tt>
//! "#;
//!
//! let parser = TtmlLyricsParser::default();
//! assert!(parser.handles(ttml.as_bytes()));
//!
//! let lyrics = parser.parse(ttml.as_bytes(), 0).expect("lyrics");
//! // A blank line fills the gap before the first lyric.
//! assert_eq!(lyrics.lines.len(), 2);
//!
//! let line = &lyrics.lines[1];
//! assert_eq!(line.start_at, 1500);
//! assert_eq!(line.content.content, "Hello");
//! assert_eq!(line.content.words.len(), 2);
//! assert_eq!(line.translation.as_ref().map(|t| t.content.as_str()), Some("Hola"));
//! ```

pub mod config;
pub mod error;
pub mod model;
pub mod parser;

use std::{
    fs::File,
    io::{BufRead, BufReader},
    path::Path,
};

use tracing::error;

pub use config::{ParsingOptions, ParsingOptionsBuilder};
pub use error::{TranslationLookupError, TtmlError};
pub use model::{Line, Lyrics, LyricsActor, TextContent, Word};
pub use parser::{handles_ttml, parse_ttml, parse_ttml_str};

/// 歌词格式解析器的通用接口。
pub trait LyricsParser {
    /// 按文件扩展名判断是否由该解析器处理。
    fn handles_path(&self, path: &Path) -> bool;

    /// 按内容判断是否由该解析器处理。
    fn handles<R: BufRead>(&self, source: R) -> bool;

    /// 解析歌词。失败或没有任何歌词行时返回 `None`。
    fn parse<R: BufRead>(&self, source: R, fallback_duration_ms: u64) -> Option<Lyrics>;
}

/// TTML 歌词解析器。
#[derive(Debug, Clone, Default)]
pub struct TtmlLyricsParser {
    options: ParsingOptions,
}

impl TtmlLyricsParser {
    #[must_use]
    pub const fn new(options: ParsingOptions) -> Self {
        Self { options }
    }

    #[must_use]
    pub const fn options(&self) -> &ParsingOptions {
        &self.options
    }

    /// 打开并解析一个 TTML 文件，保留失败原因。
    ///
    /// # Errors
    ///
    /// 文件无法打开时返回 [`TtmlError::Io`]，其余同 [`parse_ttml`]。
    pub fn parse_file(
        &self,
        path: impl AsRef<Path>,
        fallback_duration_ms: u64,
    ) -> Result<Option<Lyrics>, TtmlError> {
        let file = File::open(path)?;
        parse_ttml(BufReader::new(file), fallback_duration_ms, &self.options)
    }
}

impl LyricsParser for TtmlLyricsParser {
    fn handles_path(&self, path: &Path) -> bool {
        path.extension()
            .and_then(|ext| ext.to_str())
            .is_some_and(|ext| ext.eq_ignore_ascii_case("ttml"))
    }

    fn handles<R: BufRead>(&self, source: R) -> bool {
        handles_ttml(source)
    }

    fn parse<R: BufRead>(&self, source: R, fallback_duration_ms: u64) -> Option<Lyrics> {
        parse_ttml(source, fallback_duration_ms, &self.options).unwrap_or_else(|e| {
            error!("TTML 歌词解析失败: {e}");
            None
        })
    }
}
