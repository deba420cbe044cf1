use std::io;

use quick_xml::{
    Error as QuickXmlErrorMain, encoding::EncodingError,
    events::attributes::AttrError as QuickXmlAttrError,
};
use thiserror::Error;

/// 定义 TTML 歌词解析过程中可能发生的各种错误。
///
/// 结构性违规（比如在错误的父节点下打开子节点）不是错误，
/// 它们由 [`crate::parser::NodeTree`] 的操作以 `false` 的形式报告。
#[derive(Error, Debug)]
pub enum TtmlError {
    /// XML 读取错误，通常来自 `quick-xml` 库。
    #[error("读取 XML 错误: {0}")]
    Xml(#[from] QuickXmlErrorMain),
    /// XML 属性解析错误，通常来自 `quick-xml` 库。
    #[error("XML 属性错误: {0}")]
    Attribute(#[from] QuickXmlAttrError),
    /// XML 文本编码或解码错误。
    #[error("文本编码或解码错误: {0}")]
    Encoding(#[from] EncodingError),
    /// 无效的时间表达式。
    #[error("无效的时间格式: {0}")]
    InvalidTime(String),
    /// 读取输入流时发生的 IO 错误。
    #[error("IO 错误: {0}")]
    Io(#[from] io::Error),
    /// 配置文件解析失败。
    #[error("配置解析错误: {0}")]
    Config(#[from] toml::de::Error),
    /// 节点树没有 `<body>` 根节点，无法生成歌词。
    #[error("节点树没有根节点")]
    TreeHasNoRoot,
    /// 节点树在生成歌词之前必须先关闭。
    #[error("节点树尚未关闭，无法读取其中的数据")]
    TreeNotClosed,
}

/// 从翻译轨道中查找翻译文本时可能发生的错误。
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum TranslationLookupError {
    /// 轨道尚未关闭，其内容仍可能变化。
    #[error("翻译轨道尚未关闭")]
    NotClosed,
    /// 轨道中没有该键对应的翻译。
    #[error("未找到对应的翻译")]
    NotFound,
}
