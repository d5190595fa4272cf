//! 搜索模块
//!
//! 提供候选结果与搜索请求之间的匹配判断，以及对一批候选进行评分和挑选。

use tracing::debug;

use crate::model::track::{SearchRequest, SearchResult};

pub mod matcher;

/// 为一批候选计算匹配类型，并按 `result_limit` 截断。
///
/// 保持提供商返回的原始顺序。
pub fn grade_candidates(request: &SearchRequest, results: &mut Vec<SearchResult>) {
    if request.result_limit > 0 {
        results.truncate(request.result_limit);
    }
    for result in results.iter_mut() {
        result.match_type = matcher::compare_track(request, result);
    }
}

/// 按顺序返回第一个带有 LRC 歌词、且标题与艺术家都匹配的候选。
pub fn select_candidate<'a>(
    request: &SearchRequest,
    results: &'a [SearchResult],
) -> Option<&'a SearchResult> {
    results.iter().find(|result| {
        if !result.has_synced_lyrics() {
            debug!("候选 '{} - {}' 没有 LRC 歌词，跳过。", result.artist, result.title);
            return false;
        }
        matcher::is_match(request, &result.title, &result.artist)
    })
}
