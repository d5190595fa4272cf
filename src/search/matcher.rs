//! 匹配算法模块，简单实现

use strsim::normalized_levenshtein;

use crate::model::track::{MatchType, SearchRequest, SearchResult};

/// 字符串相似度阈值，高于此值则认为几乎相同
const SIMILARITY_THRESHOLD: f64 = 0.85;

/// 大小写不敏感的双向包含检查。
///
/// 任意一方在去除首尾空白后为空时视为不匹配。
pub fn contains_either_way(a: &str, b: &str) -> bool {
    let a = a.trim().to_lowercase();
    let b = b.trim().to_lowercase();
    if a.is_empty() || b.is_empty() {
        return false;
    }
    a.contains(&b) || b.contains(&a)
}

/// 候选的标题和艺术家是否都与请求匹配。
///
/// 请求没有提供艺术家时，只比较标题。
pub fn is_match(request: &SearchRequest, candidate_title: &str, candidate_artist: &str) -> bool {
    if !contains_either_way(candidate_title, &request.title) {
        return false;
    }
    match request.artist.as_deref() {
        Some(artist) if !artist.trim().is_empty() => {
            contains_either_way(candidate_artist, artist)
        }
        _ => true,
    }
}

/// 比较搜索请求和候选结果，返回匹配类型
pub fn compare_track(request: &SearchRequest, result: &SearchResult) -> MatchType {
    if !contains_either_way(&result.title, &request.title) {
        return MatchType::None;
    }

    let Some(artist) = request.artist.as_deref().filter(|a| !a.trim().is_empty()) else {
        return MatchType::Title;
    };
    if !contains_either_way(&result.artist, artist) {
        return MatchType::Title;
    }

    let similar = |a: &str, b: &str| {
        normalized_levenshtein(&a.trim().to_lowercase(), &b.trim().to_lowercase())
            >= SIMILARITY_THRESHOLD
    };
    if similar(&result.title, &request.title) && similar(&result.artist, artist) {
        MatchType::Exact
    } else {
        MatchType::TitleAndArtist
    }
}
