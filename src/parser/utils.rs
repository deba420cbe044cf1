//! # TTML 解析器的工具函数
//!
//! 属性提取、实体解码和文本清理。

use quick_xml::{encoding::Decoder, events::BytesStart};
use tracing::warn;

use super::time::parse_time_expression;
use crate::TtmlError;

/// 从给定的属性名列表中获取第一个找到的属性，并将其转换为目标类型。
///
/// # 参数
/// * `e` - `BytesStart` 事件，代表一个 XML 标签的开始。
/// * `decoder` - 用于解码属性值的解码器。
/// * `attr_names` - 要依次尝试的属性名（包括别名）。
/// * `processor` - 接收解码后的字符串值并返回转换结果的闭包。
pub(super) fn get_attribute_with_aliases<T, F>(
    e: &BytesStart,
    decoder: Decoder,
    attr_names: &[&[u8]],
    processor: F,
) -> Result<Option<T>, TtmlError>
where
    F: Fn(&str) -> Result<T, TtmlError>,
{
    let mut found_attr = None;
    for &name in attr_names {
        if let Some(attr) = e.try_get_attribute(name)? {
            found_attr = Some(attr);
            break;
        }
    }

    found_attr
        .map(|attr| {
            let decoded_value = attr.decode_and_unescape_value(decoder)?;
            processor(&decoded_value)
        })
        .transpose()
}

/// 获取字符串类型的属性值。
pub(super) fn get_string_attribute(
    e: &BytesStart,
    decoder: Decoder,
    attr_names: &[&[u8]],
) -> Result<Option<String>, TtmlError> {
    get_attribute_with_aliases(e, decoder, attr_names, |s| Ok(s.to_owned()))
}

/// 获取并解析为毫秒的时间属性值。
///
/// 属性缺失或时间表达式格式错误时都返回 `Ok(None)`，后者会记录一条警告，
/// 解析继续进行。
pub(super) fn get_time_attribute(
    e: &BytesStart,
    decoder: Decoder,
    attr_names: &[&[u8]],
) -> Result<Option<u64>, TtmlError> {
    let Some(value_str) = get_string_attribute(e, decoder, attr_names)? else {
        return Ok(None);
    };
    match parse_time_expression(&value_str) {
        Ok(ms) => Ok(Some(ms)),
        Err(err) => {
            warn!("时间戳 '{value_str}' 解析失败 ({err})，该时间戳将被忽略。");
            Ok(None)
        }
    }
}

/// 解码一个 XML 实体引用的名称（不含 `&` 和 `;`），无法识别时返回 `None`。
pub(super) fn decode_entity(entity_name: &str) -> Option<char> {
    if let Some(num_str) = entity_name.strip_prefix('#') {
        let (radix, code_point_str) = num_str
            .strip_prefix('x')
            .map_or((10, num_str), |stripped| (16, stripped));
        return u32::from_str_radix(code_point_str, radix)
            .ok()
            .and_then(char::from_u32);
    }

    match entity_name {
        "amp" => Some('&'),
        "lt" => Some('<'),
        "gt" => Some('>'),
        "quot" => Some('"'),
        "apos" => Some('\''),
        _ => None,
    }
}

/// 规范化文本中的空白字符：去掉首尾空白，并把连续的空白合并为一个空格。
pub(crate) fn collapse_whitespace(input: &str) -> String {
    input.split_whitespace().collect::<Vec<_>>().join(" ")
}
