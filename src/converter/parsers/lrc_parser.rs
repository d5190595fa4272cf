//! # LRC 格式解析器

use std::collections::BTreeMap;
use std::sync::LazyLock;

use regex::Regex;
use tracing::{debug, warn};

use crate::converter::types::{ConvertError, LyricDocument, LyricLine};

/// 用于匹配行首一个“形似时间戳”的标签，严格的语法检查交给 `parse_lrc_timestamp`
static LRC_TIME_TAG_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^\[\d+:\d+(?:[.:]\d+)?\]").expect("未能编译 LRC_TIME_TAG_REGEX")
});

/// 严格的时间戳语法：`MM:SS.fff`，秒 2 位，小数 1-3 位。
/// 分钟至少 1 位，超过 99 分钟时生成器会写出 3 位以上的分钟
static LRC_TIMESTAMP_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(\d+):(\d{2})\.(\d{1,3})$").expect("未能编译 LRC_TIMESTAMP_REGEX")
});

/// 解析方括号内的时间戳文本（例如 `"01:02.50"`），返回秒数。
///
/// # 返回
/// 成功时返回 `分钟 × 60 + 秒.小数`；不符合语法时返回 `ConvertError::InvalidTime`。
pub fn parse_lrc_timestamp(tag: &str) -> Result<f64, ConvertError> {
    let caps = LRC_TIMESTAMP_REGEX
        .captures(tag)
        .ok_or_else(|| ConvertError::InvalidTime(tag.to_string()))?;

    let parse = |idx: usize| -> Result<u64, ConvertError> {
        caps[idx]
            .parse::<u64>()
            .map_err(|_| ConvertError::InvalidTime(tag.to_string()))
    };
    let minutes = parse(1)?;
    let seconds = parse(2)?;
    let fraction = parse(3)?;

    // "5" 代表 500 毫秒，"05" 代表 50 毫秒
    let fraction_digits = caps[3].len() as u32;
    let milliseconds = fraction * 10u64.pow(3 - fraction_digits);

    let total_ms = minutes
        .checked_mul(60_000)
        .and_then(|ms| ms.checked_add(seconds * 1000 + milliseconds))
        .ok_or_else(|| ConvertError::InvalidTime(tag.to_string()))?;
    Ok(total_ms as f64 / 1000.0)
}

/// 解析 LRC 格式内容到 `LyricDocument`。
///
/// 解析永远不会失败：无法识别的行和不合法的时间戳会被跳过，
/// 没有任何可用行时返回空文档。
pub fn parse_lrc(content: &str) -> LyricDocument {
    let mut metadata: BTreeMap<String, String> = BTreeMap::new();
    let mut lines: Vec<LyricLine> = Vec::new();

    let content = content.strip_prefix('\u{feff}').unwrap_or(content);

    for (line_num_zero_based, line_str_raw) in content.lines().enumerate() {
        let line_num = line_num_zero_based + 1;
        let line_str = line_str_raw.trim();

        if line_str.is_empty() {
            continue;
        }

        // 逐个剥离行首的时间戳标签
        let mut rest = line_str;
        let mut saw_time_tag = false;
        let mut timestamps: Vec<f64> = Vec::new();
        while let Some(tag) = LRC_TIME_TAG_REGEX.find(rest) {
            saw_time_tag = true;
            let tag_str = tag.as_str();
            let inner = &tag_str[1..tag_str.len() - 1];
            match parse_lrc_timestamp(inner) {
                Ok(seconds) => timestamps.push(seconds),
                Err(e) => warn!("[LRC] 第 {line_num} 行: {e}，已忽略该时间戳"),
            }
            // 标签之间允许有空白
            rest = rest[tag.end()..].trim_start();
        }

        if saw_time_tag {
            let text = rest.trim();
            lines.extend(timestamps.into_iter().map(|t| LyricLine::new(t, text)));
            continue;
        }

        if let Some((key, value)) = parse_metadata_tag(line_str) {
            metadata.insert(key, value);
            continue;
        }

        debug!("[LRC] 第 {line_num} 行无法识别，已跳过: '{line_str}'");
    }

    LyricDocument::new(lines, metadata)
}

/// 尝试将一行解析为 `[key:value]` 元数据，键不能为空。
fn parse_metadata_tag(line: &str) -> Option<(String, String)> {
    let inner = line.strip_prefix('[')?.strip_suffix(']')?;
    let (key, value) = inner.split_once(':')?;
    let key = key.trim();
    if key.is_empty() {
        return None;
    }
    Some((key.to_string(), value.trim().to_string()))
}
