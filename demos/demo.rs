//! 用于演示 `synced_lyrics_rs` 库的核心功能。
//!
//! ## 如何运行
//!
//! ```bash
//! cargo run --package synced_lyrics_rs --example demo
//! ```

use synced_lyrics_rs::error::Result;
use synced_lyrics_rs::model::track::{SearchRequest, TrackIdentity};
use synced_lyrics_rs::{LyricsHelper, config, converter::generators::lrc_generator};

use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    info!("正在初始化...");
    let config = config::load_config()?;
    let helper = LyricsHelper::new(config)?;

    // 这里硬编码了一首歌作为示例。在实际应用中，这些信息来自播放器。
    let track = TrackIdentity::new("I Want to Live", "Borislav Slavov")
        .with_album("Baldur's Gate 3 (Original Game Soundtrack)")
        .with_duration(233.0);

    let candidates = helper
        .search_online(&SearchRequest::new(&track.title).with_artist(&track.artist))
        .await?;
    info!("在线搜索到 {} 个候选:", candidates.len());
    for (i, candidate) in candidates.iter().enumerate() {
        info!(
            "  [{i}] {} - {} ({:?})",
            candidate.artist, candidate.title, candidate.match_type
        );
    }

    if let Err(e) = helper.load_lyrics(&track).await {
        error!("加载歌词失败: {e}");
        return Ok(());
    }

    let state = helper.state();
    let Some(document) = state.current_document else {
        warn!("没有加载到任何歌词。");
        return Ok(());
    };
    if document.is_empty() {
        info!("这首歌没有歌词。");
        return Ok(());
    }

    info!(
        "加载了 {} 行歌词，来源: {}",
        document.len(),
        document.source_label.as_deref().unwrap_or("未知")
    );

    for time in [0.0, 15.0, 30.0, 60.0, 120.0] {
        let current = document
            .current_line(time)
            .map_or("<间奏>", |line| line.text.as_str());
        info!("{} {current}", lrc_generator::format_lrc_time(time));
    }

    info!("缓存占用 {} 字节。", helper.cache().size().await?);
    Ok(())
}
