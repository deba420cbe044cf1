//! # TTML 解析器 - 常量定义
//!
//! 该模块包含了在解析 TTML 歌词时用到的 XML 标签和属性的常量定义。

pub(super) const TAG_TT: &[u8] = b"tt";
pub(super) const TAG_BODY: &[u8] = b"body";
pub(super) const TAG_DIV: &[u8] = b"div";
pub(super) const TAG_P: &[u8] = b"p";
pub(super) const TAG_SPAN: &[u8] = b"span";
pub(super) const TAG_TRANSLATION: &[u8] = b"translation";
pub(super) const TAG_TEXT: &[u8] = b"text";

pub(super) const ATTR_BEGIN: &[u8] = b"begin";
pub(super) const ATTR_END: &[u8] = b"end";
pub(super) const ATTR_DUR: &[u8] = b"dur";
pub(super) const ATTR_AGENT: &[u8] = b"ttm:agent";
pub(super) const ATTR_AGENT_ALIAS: &[u8] = b"agent";
pub(super) const ATTR_ROLE: &[u8] = b"ttm:role";
pub(super) const ATTR_ROLE_ALIAS: &[u8] = b"role";
pub(super) const ATTR_ITUNES_KEY: &[u8] = b"itunes:key";
pub(super) const ATTR_XML_LANG: &[u8] = b"xml:lang";
pub(super) const ATTR_TYPE: &[u8] = b"type";
pub(super) const ATTR_FOR: &[u8] = b"for";

pub(super) const ROLE_BACKGROUND: &str = "x-bg";
