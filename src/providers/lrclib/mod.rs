//! 此模块实现了与 LRCLIB 进行交互的 `Provider`。
//! API 文档见 https://lrclib.net/docs
//!
//! 获取歌词分两步：先用 `"{title} {artist}"` 做关键词搜索并按标题和艺术家筛选候选，
//! 没有结果（或搜索失败）且请求带有时长时，再调用精确查询接口。

use async_trait::async_trait;
use reqwest::{
    Client, StatusCode,
    header::{ACCEPT, CACHE_CONTROL, USER_AGENT},
};
use serde::de::DeserializeOwned;
use tracing::{debug, info, warn};

use crate::{
    config::HelperConfig,
    converter::{self, types::LyricDocument},
    error::{LyricsHelperError, Result},
    model::track::{SearchRequest, SearchResult},
    providers::Provider,
    search,
};

pub mod models;

use models::{LrclibErrorResponse, LrclibTrack};

const PROVIDER_NAME: &str = "lrclib";

/// 精确查询时没有专辑信息所使用的占位值。
const UNKNOWN_ALBUM: &str = "Unknown";

/// LRCLIB 的客户端实现。
#[derive(Debug, Clone)]
pub struct LrclibClient {
    http_client: Client,
    base_url: String,
    user_agent: String,
}

impl LrclibClient {
    /// 根据配置创建一个新的 `LrclibClient` 实例。
    pub fn new(config: &HelperConfig) -> Result<Self> {
        let http_client = Client::builder()
            .timeout(config.request_timeout())
            .build()?;
        Ok(Self::with_client(
            http_client,
            &config.api_base_url,
            &config.user_agent,
        ))
    }

    /// 使用现成的 HTTP 客户端创建实例。
    pub fn with_client(http_client: Client, base_url: &str, user_agent: &str) -> Self {
        Self {
            http_client,
            base_url: base_url.trim_end_matches('/').to_string(),
            user_agent: user_agent.to_string(),
        }
    }

    /// 发送带有统一请求头的 GET 请求。
    async fn get(&self, url: &str) -> Result<reqwest::Response> {
        debug!("[LRCLIB] GET {url}");
        Ok(self
            .http_client
            .get(url)
            .header(USER_AGENT, &self.user_agent)
            .header(ACCEPT, "application/json")
            .header(CACHE_CONTROL, "no-cache")
            .send()
            .await?)
    }

    /// 读取响应体并解码为 JSON，解码失败返回 `JsonParse` 错误。
    async fn decode<T: DeserializeOwned>(response: reqwest::Response) -> Result<T> {
        let body = response.text().await?;
        Ok(serde_json::from_str(&body)?)
    }

    /// 第一步：关键词搜索，返回第一个匹配候选解析出的文档。
    async fn keyword_lookup(&self, request: &SearchRequest) -> Result<Option<LyricDocument>> {
        let candidates = self.search_songs(request).await?;
        let Some(candidate) = search::select_candidate(request, &candidates) else {
            info!(
                "[LRCLIB] 关键词搜索的 {} 个候选中没有匹配 '{}' 的结果。",
                candidates.len(),
                request.keyword_query()
            );
            return Ok(None);
        };

        info!(
            "[LRCLIB] 关键词搜索命中: '{} - {}' (ID: {:?})",
            candidate.artist, candidate.title, candidate.provider_id
        );
        let document = converter::parse(candidate.synced_lyrics.as_deref().unwrap_or_default());
        if document.is_empty() {
            warn!("[LRCLIB] 命中候选的歌词无法解析出任何行，尝试精确查询。");
            return Ok(None);
        }
        Ok(Some(document))
    }

    /// 第二步：按标题、艺术家、专辑和时长精确查询。
    ///
    /// 404 或错误对象都视为“未找到”，返回 `Ok(None)`。
    async fn exact_lookup(&self, request: &SearchRequest, duration: u64) -> Result<Option<String>> {
        let url = format!(
            "{}/get?track_name={}&artist_name={}&album_name={}&duration={}",
            self.base_url,
            urlencoding::encode(request.title.trim()),
            urlencoding::encode(request.artist.as_deref().unwrap_or_default().trim()),
            urlencoding::encode(request.album.as_deref().unwrap_or(UNKNOWN_ALBUM)),
            duration
        );

        let response = self.get(&url).await?;
        let status = response.status();

        if status == StatusCode::NOT_FOUND {
            info!("[LRCLIB] 精确查询未找到 '{}'。", request.keyword_query());
            return Ok(None);
        }
        if !status.is_success() {
            return match Self::decode::<LrclibErrorResponse>(response).await {
                Ok(err) => {
                    warn!(
                        "[LRCLIB] 精确查询返回错误 {status}: {} ({})，视为未找到。",
                        err.message.unwrap_or_default(),
                        err.name.unwrap_or_default()
                    );
                    Ok(None)
                }
                Err(_) => Err(LyricsHelperError::Network(format!(
                    "LRCLIB 精确查询返回错误: {status}"
                ))),
            };
        }

        let track: LrclibTrack = Self::decode(response).await?;
        Ok(track.synced_text().map(String::from))
    }
}

#[async_trait]
impl Provider for LrclibClient {
    fn name(&self) -> &'static str {
        PROVIDER_NAME
    }

    async fn search_songs(&self, request: &SearchRequest) -> Result<Vec<SearchResult>> {
        let query = request.keyword_query();
        if query.is_empty() {
            return Ok(Vec::new());
        }
        let url = format!("{}/search?q={}", self.base_url, urlencoding::encode(&query));

        let response = self.get(&url).await?;
        let status = response.status();
        if !status.is_success() {
            return Err(LyricsHelperError::Network(format!(
                "LRCLIB 搜索返回错误: {status}"
            )));
        }

        let tracks: Vec<LrclibTrack> = Self::decode(response).await?;
        debug!("[LRCLIB] 搜索 '{query}' 返回 {} 个结果。", tracks.len());

        let mut results: Vec<SearchResult> = tracks
            .into_iter()
            .map(|t| t.into_search_result(PROVIDER_NAME))
            .collect();
        search::grade_candidates(request, &mut results);
        Ok(results)
    }

    async fn get_lyrics(&self, request: &SearchRequest) -> Result<LyricDocument> {
        let keyword_outcome = match self.keyword_lookup(request).await {
            Ok(Some(document)) => return Ok(document.with_source_label(PROVIDER_NAME)),
            Ok(None) => Ok(()),
            Err(e) => {
                warn!("[LRCLIB] 关键词搜索失败: {e}");
                Err(e)
            }
        };

        let Some(duration) = request.rounded_duration() else {
            // 没有时长无法精确查询，关键词搜索的错误原样返回
            return keyword_outcome.map(|()| LyricDocument::empty());
        };

        match self.exact_lookup(request, duration).await? {
            Some(text) => {
                info!("[LRCLIB] 精确查询命中 '{}'。", request.keyword_query());
                Ok(converter::parse(&text).with_source_label(PROVIDER_NAME))
            }
            None => Ok(LyricDocument::empty()),
        }
    }
}
