//! 定义了歌词处理中使用的核心数据类型。

use std::{collections::BTreeMap, fmt};

use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

//=============================================================================
// 1. 错误枚举
//=============================================================================

/// 定义歌词解析和生成过程中可能发生的错误。
#[derive(Error, Debug)]
pub enum ConvertError {
    /// 无效的时间格式字符串。
    #[error("无效的时间格式: {0}")]
    InvalidTime(String),
    /// 字符串格式化错误。
    #[error("格式错误: {0}")]
    Format(#[from] fmt::Error),
}

//=============================================================================
// 2. 歌词行
//=============================================================================

/// 没有结束时间的行，在判断是否处于激活状态时使用的默认时长（秒）。
pub const DEFAULT_LINE_DURATION_SECS: f64 = 3.0;

/// 表示一行带时间戳的歌词。
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LyricLine {
    /// 行的唯一标识。
    pub id: Uuid,
    /// 行的文本内容，已去除首尾空白。
    pub text: String,
    /// 行的开始时间（秒）。
    pub start_time: f64,
    /// 行的结束时间（秒）。
    ///
    /// 解析后会被回填为下一行的开始时间，最后一行保持为 `None`。
    pub end_time: Option<f64>,
}

impl LyricLine {
    /// 创建一个新的、没有结束时间的歌词行。
    #[must_use]
    pub fn new(start_time: f64, text: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            text: text.into(),
            start_time: start_time.max(0.0),
            end_time: None,
        }
    }

    /// 用于判断激活状态的结束时间。
    #[must_use]
    pub fn effective_end(&self) -> f64 {
        self.end_time
            .unwrap_or(self.start_time + DEFAULT_LINE_DURATION_SECS)
    }

    /// 判断给定时间是否落在 `[start_time, effective_end)` 区间内。
    #[must_use]
    pub fn contains(&self, time: f64) -> bool {
        time >= self.start_time && time < self.effective_end()
    }
}

//=============================================================================
// 3. 歌词文档
//=============================================================================

/// 结构化的歌词文档。
///
/// `lines` 在构造之后总是按 `start_time` 升序排列。
/// 不含任何行的文档代表“没有歌词”，与“尚未加载”（`None`）不同。
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LyricDocument {
    lines: Vec<LyricLine>,
    /// 自由格式的元数据标签，例如 `ar`、`ti`、`al`、`offset`。
    pub metadata: BTreeMap<String, String>,
    /// 歌词来源的标签，例如 `"lrclib"`、`"cache"`。
    pub source_label: Option<String>,
}

impl LyricDocument {
    /// 从任意顺序的歌词行构建文档。
    ///
    /// 会对行做稳定排序，并为没有结束时间的行回填结束时间：
    /// 取其后第一个开始时间严格更晚的行的开始时间。
    #[must_use]
    pub fn new(mut lines: Vec<LyricLine>, metadata: BTreeMap<String, String>) -> Self {
        lines.sort_by(|a, b| a.start_time.total_cmp(&b.start_time));
        backfill_end_times(&mut lines);
        Self {
            lines,
            metadata,
            source_label: None,
        }
    }

    /// 一个不含任何行的文档。
    #[must_use]
    pub fn empty() -> Self {
        Self::default()
    }

    /// 设置来源标签。
    #[must_use]
    pub fn with_source_label(mut self, label: impl Into<String>) -> Self {
        self.source_label = Some(label.into());
        self
    }

    /// 按时间排序的歌词行。
    #[must_use]
    pub fn lines(&self) -> &[LyricLine] {
        &self.lines
    }

    /// 歌词行数。
    #[must_use]
    pub fn len(&self) -> usize {
        self.lines.len()
    }

    /// 文档是否不含任何行。
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    /// 读取一个元数据标签的值。
    #[must_use]
    pub fn metadata(&self, key: &str) -> Option<&str> {
        self.metadata.get(key).map(String::as_str)
    }
}

fn backfill_end_times(lines: &mut [LyricLine]) {
    for idx in 0..lines.len() {
        if lines[idx].end_time.is_some() {
            continue;
        }
        let start = lines[idx].start_time;
        lines[idx].end_time = lines[idx + 1..]
            .iter()
            .map(|l| l.start_time)
            .find(|&next| next > start);
    }
}
