//! 定义了与歌曲身份和歌词搜索相关的核心数据结构，包括搜索输入、搜索结果和匹配度量。

use serde::{Deserialize, Serialize};

use crate::error::{LyricsHelperError, Result};

/// 搜索请求默认返回的候选数量上限。
pub const DEFAULT_RESULT_LIMIT: usize = 10;

/// 代表搜索结果与原始查询元数据的匹配程度。
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
pub enum MatchType {
    /// 标题不匹配。
    #[default]
    None,
    /// 只有标题匹配（互相包含）。
    Title,
    /// 标题和艺术家都匹配（互相包含）。
    TitleAndArtist,
    /// 标题和艺术家都高度相似，几乎是同一首歌。
    Exact,
}

/// 宿主提供的歌曲身份，用于生成缓存文件名和搜索请求。
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TrackIdentity {
    /// 歌曲标题。
    pub title: String,
    /// 艺术家。
    pub artist: String,
    /// 专辑名。
    pub album: Option<String>,
    /// 歌曲时长（秒）。
    pub duration_secs: Option<f64>,
}

impl TrackIdentity {
    /// 创建一个只有标题和艺术家的歌曲身份。
    pub fn new(title: impl Into<String>, artist: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            artist: artist.into(),
            album: None,
            duration_secs: None,
        }
    }

    /// 设置专辑名。
    #[must_use]
    pub fn with_album(mut self, album: impl Into<String>) -> Self {
        self.album = Some(album.into());
        self
    }

    /// 设置时长（秒）。
    #[must_use]
    pub fn with_duration(mut self, duration_secs: f64) -> Self {
        self.duration_secs = Some(duration_secs);
        self
    }

    /// 检查标题和艺术家是否都非空。
    ///
    /// 任何缓存或网络操作之前都必须先通过这个检查。
    pub fn validate(&self) -> Result<()> {
        if self.title.trim().is_empty() {
            return Err(LyricsHelperError::Validation("歌曲标题为空".to_string()));
        }
        if self.artist.trim().is_empty() {
            return Err(LyricsHelperError::Validation("艺术家为空".to_string()));
        }
        Ok(())
    }

    /// 根据歌曲身份构建一个搜索请求。
    pub fn to_search_request(&self, result_limit: usize) -> SearchRequest {
        SearchRequest {
            title: self.title.trim().to_string(),
            artist: Some(self.artist.trim().to_string()),
            album: self.album.clone(),
            duration_secs: self.duration_secs,
            result_limit,
        }
    }
}

/// 发往歌词源的搜索请求。
///
/// 艺术家是可选的，以支持更宽泛的匹配；提供时长时可以走精确查询。
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchRequest {
    /// 歌曲标题。
    pub title: String,
    /// 艺术家。
    pub artist: Option<String>,
    /// 专辑名。
    pub album: Option<String>,
    /// 歌曲时长（秒）。
    pub duration_secs: Option<f64>,
    /// 最多考虑的候选数量。
    pub result_limit: usize,
}

impl SearchRequest {
    /// 创建一个只有标题的请求。
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            artist: None,
            album: None,
            duration_secs: None,
            result_limit: DEFAULT_RESULT_LIMIT,
        }
    }

    /// 设置艺术家。
    #[must_use]
    pub fn with_artist(mut self, artist: impl Into<String>) -> Self {
        self.artist = Some(artist.into());
        self
    }

    /// 关键词搜索使用的查询字符串：`"{title} {artist}"`，没有艺术家时只有标题。
    pub fn keyword_query(&self) -> String {
        match self.artist.as_deref().map(str::trim) {
            Some(artist) if !artist.is_empty() => format!("{} {}", self.title.trim(), artist),
            _ => self.title.trim().to_string(),
        }
    }

    /// 四舍五入后的整数秒时长。
    pub fn rounded_duration(&self) -> Option<u64> {
        self.duration_secs
            .filter(|d| d.is_finite() && *d >= 0.0)
            .map(|d| d.round() as u64)
    }
}

/// 代表关键词搜索返回的一个候选条目。
///
/// 这是所有 Provider 的 `search_songs` 方法需要返回的类型。
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SearchResult {
    /// 候选的歌曲标题。
    pub title: String,
    /// 候选的艺术家。
    pub artist: String,
    /// 候选的专辑名。
    pub album: Option<String>,
    /// 候选的时长（秒）。
    pub duration_secs: Option<f64>,
    /// 候选自带的 LRC 歌词文本。
    pub synced_lyrics: Option<String>,
    /// 在其所在平台的 ID（如果可用）。
    pub provider_id: Option<String>,
    /// 提供商的名称 (例如, "lrclib")。
    pub provider_name: String,
    /// 此候选与请求的匹配程度。
    pub match_type: MatchType,
}

impl SearchResult {
    /// 候选是否带有非空的 LRC 歌词。
    pub fn has_synced_lyrics(&self) -> bool {
        self.synced_lyrics
            .as_deref()
            .is_some_and(|s| !s.trim().is_empty())
    }
}
