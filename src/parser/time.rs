//! # TTML 时间表达式解析
//!
//! 支持三种语法，按从具体到宽泛的顺序尝试：
//!
//! 1. 完整时钟时间 `[H:]MM:SS[.fff]`
//! 2. 简单时钟时间 `SS[.fff]`
//! 3. 偏移时间 `<数字><单位>`，单位为 `h`、`m`、`s` 或 `ms`
//!
//! 纯数字既可以看作简单时钟时间也可以看作没有单位的偏移时间，
//! 所以简单时钟时间必须排在偏移时间之前。

use std::sync::LazyLock;

use regex::{Captures, Regex};

use crate::TtmlError;

static CLOCK_TIME_COMPLEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(?:([0-9]+):)?([0-5]?[0-9]):([0-5]?[0-9])(?:\.([0-9]{1,3}))?$")
        .expect("未能编译 CLOCK_TIME_COMPLEX")
});

static CLOCK_TIME_SIMPLE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^([0-9]+)(?:\.([0-9]{1,3}))?$").expect("未能编译 CLOCK_TIME_SIMPLE")
});

static OFFSET_TIME: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^([0-9]+)(?:\.([0-9]+))?(ms|h|m|s)$").expect("未能编译 OFFSET_TIME")
});

const MS_PER_SECOND: u64 = 1_000;
const MS_PER_MINUTE: u64 = 60_000;
const MS_PER_HOUR: u64 = 3_600_000;

/// 偏移时间小数部分参与计算的最大位数，超出的位数对毫秒精度没有影响。
const MAX_OFFSET_FRACTION_DIGITS: usize = 9;

/// 解析 TTML 时间表达式到毫秒。
///
/// # Errors
///
/// 表达式不符合任何一种语法，或者数值溢出时返回 [`TtmlError::InvalidTime`]。
pub fn parse_time_expression(expression: &str) -> Result<u64, TtmlError> {
    let expression = expression.trim();

    if let Some(caps) = CLOCK_TIME_COMPLEX.captures(expression) {
        let hours = capture_number(&caps, 1, expression)?;
        let minutes = capture_number(&caps, 2, expression)?;
        let seconds = capture_number(&caps, 3, expression)?;
        let fraction = caps.get(4).map_or(0, |m| fraction_to_ms(m.as_str()));

        return hours
            .checked_mul(MS_PER_HOUR)
            .and_then(|ms| ms.checked_add(minutes * MS_PER_MINUTE))
            .and_then(|ms| ms.checked_add(seconds * MS_PER_SECOND + fraction))
            .ok_or_else(|| overflow(expression));
    }

    if let Some(caps) = CLOCK_TIME_SIMPLE.captures(expression) {
        let seconds = capture_number(&caps, 1, expression)?;
        let fraction = caps.get(2).map_or(0, |m| fraction_to_ms(m.as_str()));

        return seconds
            .checked_mul(MS_PER_SECOND)
            .and_then(|ms| ms.checked_add(fraction))
            .ok_or_else(|| overflow(expression));
    }

    if let Some(caps) = OFFSET_TIME.captures(expression) {
        let scale = match &caps[3] {
            "h" => MS_PER_HOUR,
            "m" => MS_PER_MINUTE,
            "s" => MS_PER_SECOND,
            _ => 1,
        };
        let whole = capture_number(&caps, 1, expression)?;
        let fraction = caps
            .get(2)
            .map_or(0, |m| scaled_fraction(m.as_str(), scale));

        return whole
            .checked_mul(scale)
            .and_then(|ms| ms.checked_add(fraction))
            .ok_or_else(|| overflow(expression));
    }

    Err(TtmlError::InvalidTime(format!(
        "时间表达式 '{expression}' 不符合任何已知格式"
    )))
}

fn capture_number(caps: &Captures<'_>, index: usize, expression: &str) -> Result<u64, TtmlError> {
    caps.get(index).map_or(Ok(0), |m| {
        m.as_str().parse::<u64>().map_err(|e| {
            TtmlError::InvalidTime(format!(
                "无法解析时间表达式 '{expression}' 中的 '{}': {e}",
                m.as_str()
            ))
        })
    })
}

/// 把最多 3 位的小数部分补齐为毫秒，".5" 即 500 毫秒。
fn fraction_to_ms(digits: &str) -> u64 {
    digits
        .bytes()
        .chain(std::iter::repeat(b'0'))
        .take(3)
        .fold(0, |acc, b| acc * 10 + u64::from(b - b'0'))
}

/// 计算偏移时间小数部分对应的毫秒数，向零截断。
fn scaled_fraction(digits: &str, scale: u64) -> u64 {
    let digits = &digits[..digits.len().min(MAX_OFFSET_FRACTION_DIGITS)];
    let numerator = digits
        .bytes()
        .fold(0u64, |acc, b| acc * 10 + u64::from(b - b'0'));
    let denominator = 10u64.pow(u32::try_from(digits.len()).unwrap_or(0));
    numerator * scale / denominator
}

fn overflow(expression: &str) -> TtmlError {
    TtmlError::InvalidTime(format!("时间表达式 '{expression}' 超出范围"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_complex_clock_time() {
        assert_eq!(parse_time_expression("1:02:03.040").unwrap(), 3_723_040);
        assert_eq!(parse_time_expression("02:03.5").unwrap(), 123_500);
        assert_eq!(parse_time_expression("02:03.12").unwrap(), 123_120);
        assert_eq!(parse_time_expression("2:03").unwrap(), 123_000);
        assert_eq!(parse_time_expression("00:00:00.000").unwrap(), 0);
        assert_eq!(parse_time_expression("99:59:59.999").unwrap(), 359_999_999);
    }

    #[test]
    fn test_simple_clock_time() {
        assert_eq!(parse_time_expression("12.345").unwrap(), 12_345);
        assert_eq!(parse_time_expression("12.3").unwrap(), 12_300);
        assert_eq!(parse_time_expression("7").unwrap(), 7_000);
        assert_eq!(parse_time_expression("0").unwrap(), 0);
        assert_eq!(parse_time_expression("75.5").unwrap(), 75_500);
    }

    #[test]
    fn test_offset_time() {
        assert_eq!(parse_time_expression("250ms").unwrap(), 250);
        assert_eq!(parse_time_expression("2.5s").unwrap(), 2_500);
        assert_eq!(parse_time_expression("1.5m").unwrap(), 90_000);
        assert_eq!(parse_time_expression("1h").unwrap(), 3_600_000);
        assert_eq!(parse_time_expression("4.35s").unwrap(), 4_350);
        assert_eq!(parse_time_expression("12.3456s").unwrap(), 12_345);
        assert_eq!(parse_time_expression("0.5ms").unwrap(), 0);
    }

    #[test]
    fn test_malformed_time_expressions() {
        for expression in [
            "", "abc", "1:2:3:4", "01:60:00", "01:00:60", "-10s", "10.s", ".5s", "s", "10.1234",
            "1.5x", "12:34.5678",
        ] {
            assert!(
                matches!(
                    parse_time_expression(expression),
                    Err(TtmlError::InvalidTime(_))
                ),
                "'{expression}' 应当被拒绝"
            );
        }
    }

    #[test]
    fn test_non_ascii_digits_are_rejected() {
        for expression in ["1.١١١١١s", "1.٣", "٣", "٠١:٠٢", "１２.５s"] {
            assert!(
                matches!(
                    parse_time_expression(expression),
                    Err(TtmlError::InvalidTime(_))
                ),
                "'{expression}' 应当被拒绝"
            );
        }
    }

    #[test]
    fn test_overflow_is_rejected() {
        assert!(matches!(
            parse_time_expression("99999999999999999999"),
            Err(TtmlError::InvalidTime(_))
        ));
        assert!(matches!(
            parse_time_expression("9999999999999999h"),
            Err(TtmlError::InvalidTime(_))
        ));
    }
}
