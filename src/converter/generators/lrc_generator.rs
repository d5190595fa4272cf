//! LRC 格式生成器

use std::fmt::Write as FmtWrite;

use crate::converter::types::{ConvertError, LyricDocument};

/// LRC 生成的主入口函数。
///
/// 先输出所有 `[key:value]` 元数据行，再按文档顺序为每一行输出 `[MM:SS.fff]text`。
/// 不会重新排序，调用方应传入已按时间排序的文档。
pub fn generate_lrc(document: &LyricDocument) -> Result<String, ConvertError> {
    let mut lrc_output =
        String::with_capacity(document.metadata.len() * 20 + document.len() * 50);

    for (key, value) in &document.metadata {
        writeln!(lrc_output, "[{key}:{value}]")?;
    }

    for line in document.lines() {
        writeln!(lrc_output, "{}{}", format_lrc_time(line.start_time), line.text)?;
    }

    Ok(lrc_output)
}

/// 将秒数格式化为 LRC 时间标签 `[mm:ss.xxx]`。
///
/// 先四舍五入到毫秒，负数按 0 处理。
pub fn format_lrc_time(seconds: f64) -> String {
    let ms = (seconds.max(0.0) * 1000.0).round() as u64;
    format_lrc_time_ms(ms)
}

/// 将毫秒时间格式化为 LRC 时间字符串 `[mm:ss.xxx]`。
pub fn format_lrc_time_ms(ms: u64) -> String {
    let minutes = ms / 60000;
    let seconds = (ms % 60000) / 1000;
    let milliseconds = ms % 1000;
    format!("[{minutes:02}:{seconds:02}.{milliseconds:03}]")
}
