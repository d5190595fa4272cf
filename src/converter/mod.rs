//! 歌词编解码核心模块
//!
//! 在 LRC 文本与 [`LyricDocument`] 之间双向转换，并提供按播放进度定位当前行的时间轴索引。
//! 模块内所有函数都是纯函数，不做任何 I/O。

pub mod generators;
pub mod parsers;
pub mod timeline;
pub mod types;

pub use types::{ConvertError, LyricDocument, LyricLine};

/// 将 LRC 文本解析为 [`LyricDocument`]。
pub fn parse(content: &str) -> LyricDocument {
    parsers::lrc_parser::parse_lrc(content)
}

/// 将 [`LyricDocument`] 序列化为 LRC 文本。
pub fn serialize(document: &LyricDocument) -> Result<String, ConvertError> {
    generators::lrc_generator::generate_lrc(document)
}
