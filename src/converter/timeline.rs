//! 根据播放进度在歌词文档中定位当前行。

use crate::converter::types::{LyricDocument, LyricLine};

impl LyricDocument {
    /// 返回第一个 `[start_time, effective_end)` 区间包含 `time` 的行的索引。
    ///
    /// 在第一行之前、两行之间的空隙，或最后一行的默认窗口之后，返回 `None`。
    #[must_use]
    pub fn current_line_index(&self, time: f64) -> Option<usize> {
        // 开始时间晚于 time 的行不可能被激活
        let upper = self.lines().partition_point(|l| l.start_time <= time);
        self.lines()[..upper].iter().position(|l| l.contains(time))
    }

    /// 当前行。
    #[must_use]
    pub fn current_line(&self, time: f64) -> Option<&LyricLine> {
        self.current_line_index(time).map(|i| &self.lines()[i])
    }

    /// 当前行的前一行。
    #[must_use]
    pub fn previous_line(&self, time: f64) -> Option<&LyricLine> {
        let idx = self.current_line_index(time)?;
        idx.checked_sub(1).map(|i| &self.lines()[i])
    }

    /// 当前行的后一行。
    #[must_use]
    pub fn next_line(&self, time: f64) -> Option<&LyricLine> {
        let idx = self.current_line_index(time)?;
        self.lines().get(idx + 1)
    }

    /// 以当前行为中心，返回最多 `window_size` 行。
    ///
    /// 没有当前行时返回空切片。
    #[must_use]
    pub fn lines_around_current(&self, time: f64, window_size: usize) -> &[LyricLine] {
        let Some(idx) = self.current_line_index(time) else {
            return &[];
        };
        let start = idx.saturating_sub(window_size / 2);
        let end = (start + window_size).min(self.len());
        &self.lines()[start..end]
    }
}
