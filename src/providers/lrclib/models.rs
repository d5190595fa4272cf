//! LRCLIB API 的响应结构。

use serde::Deserialize;

use crate::model::track::SearchResult;

/// `/search` 返回的数组元素，以及 `/get` 成功时返回的对象。
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LrclibTrack {
    /// LRCLIB 内部 ID。
    pub id: Option<i64>,
    /// 歌曲标题。
    #[serde(default)]
    pub track_name: String,
    /// 艺术家。
    #[serde(default)]
    pub artist_name: String,
    /// 专辑名。
    pub album_name: Option<String>,
    /// 时长（秒）。
    pub duration: Option<f64>,
    /// 是否为纯音乐。
    #[serde(default)]
    pub instrumental: bool,
    /// 不带时间戳的歌词。
    pub plain_lyrics: Option<String>,
    /// LRC 格式的歌词。
    pub synced_lyrics: Option<String>,
}

/// 请求失败时返回的错误对象。
#[derive(Debug, Clone, Deserialize)]
pub struct LrclibErrorResponse {
    /// HTTP 状态码。
    pub code: Option<u16>,
    /// 错误名称，例如 `"TrackNotFound"`。
    pub name: Option<String>,
    /// 错误描述。
    pub message: Option<String>,
}

impl LrclibTrack {
    /// 非空的 LRC 歌词文本。
    pub fn synced_text(&self) -> Option<&str> {
        self.synced_lyrics
            .as_deref()
            .filter(|s| !s.trim().is_empty())
    }

    /// 转换为通用的搜索结果。
    pub fn into_search_result(self, provider_name: &str) -> SearchResult {
        SearchResult {
            title: self.track_name,
            artist: self.artist_name,
            album: self.album_name,
            duration_secs: self.duration,
            synced_lyrics: self.synced_lyrics,
            provider_id: self.id.map(|id| id.to_string()),
            provider_name: provider_name.to_string(),
            ..Default::default()
        }
    }
}
