//! 提供商模块
//!
//! 该模块定义了与歌词源进行交互的核心抽象。

use async_trait::async_trait;

use crate::{
    converter::types::LyricDocument,
    error::Result,
    model::track::{SearchRequest, SearchResult},
};

pub mod lrclib;

/// 定义了所有歌词源提供商需要实现的通用接口。
#[async_trait]
pub trait Provider: Send + Sync {
    ///
    /// 返回提供商的唯一名称。
    ///
    /// 一个全小写的静态字符串，例如 `"lrclib"`。
    ///
    fn name(&self) -> &'static str;

    ///
    /// 根据关键词搜索候选歌曲，按提供商返回的排名排列。
    ///
    /// # 参数
    /// * `request` - 搜索请求，标题必填，艺术家可选。
    ///
    /// # 返回
    /// 一个 `Result`，成功时包含最多 `request.result_limit` 个候选，
    /// 每个候选都已计算好 `match_type`。
    ///
    async fn search_songs(&self, request: &SearchRequest) -> Result<Vec<SearchResult>>;

    ///
    /// 获取与请求匹配的歌词。
    ///
    /// 找不到任何歌词不是错误，此时返回不含任何行的文档。
    ///
    /// # 返回
    /// 一个 `Result`，成功时包含解析后的 `LyricDocument`；
    /// 传输失败或响应无法解码时返回错误。
    ///
    async fn get_lyrics(&self, request: &SearchRequest) -> Result<LyricDocument>;
}
