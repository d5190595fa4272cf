#![warn(missing_docs)]

//! # Synced Lyrics RS
//!
//! 一个 Rust 库，用于获取、缓存 LRC 逐行歌词，并根据播放进度定位当前歌词行。
//!
//! ## 主要功能
//!
//! - **LRC 编解码**: 在 LRC 文本与结构化的 [`LyricDocument`] 之间双向转换，支持一行多个时间戳。
//! - **时间轴索引**: 根据播放时间查找当前行、前后行以及当前行附近的窗口。
//! - **本地缓存**: 每首歌一个 `.lrc` 文件，原子写入。
//! - **在线获取**: 通过 LRCLIB 获取歌词，先关键词搜索，再按时长精确查询。
//! - **协调服务**: [`LyricsHelper`] 负责缓存优先的加载流程、手动导入、在线搜索和批量预取，
//!   并通过 `watch` 通道发布状态快照。
//!
//! ## 获取歌词
//!
//! ```rust,no_run
//! use synced_lyrics_rs::{LyricsHelper, config, model::track::TrackIdentity};
//!
//! async {
//!     let config = config::load_config().unwrap();
//!     let helper = LyricsHelper::new(config).unwrap();
//!
//!     let track = TrackIdentity::new("I Want to Live", "Borislav Slavov").with_duration(233.0);
//!     helper.load_lyrics(&track).await.unwrap();
//!
//!     let state = helper.state();
//!     match state.current_document {
//!         Some(doc) if !doc.is_empty() => {
//!             if let Some(line) = doc.current_line(42.0) {
//!                 println!("当前歌词: {}", line.text);
//!             }
//!         }
//!         Some(_) => println!("这首歌没有歌词。"),
//!         None => println!("尚未加载歌词。"),
//!     }
//! };
//! ```
//!
//! ## 格式转换
//!
//! ```rust
//! use synced_lyrics_rs::converter;
//!
//! let doc = converter::parse("[ti:Song]\n[00:01.00][00:05.00]Hello");
//! assert_eq!(doc.len(), 2);
//! assert_eq!(doc.current_line(5.5).map(|l| l.text.as_str()), Some("Hello"));
//!
//! let lrc = converter::serialize(&doc).unwrap();
//! assert!(lrc.starts_with("[ti:Song]"));
//! ```
pub mod cache;
pub mod config;
pub mod converter;
pub mod error;
pub mod model;
pub mod providers;
pub mod search;

use std::{
    path::Path,
    sync::{
        Arc,
        atomic::{AtomicBool, AtomicU64, Ordering},
    },
};

use tokio::{sync::watch, task::JoinHandle};
use tracing::{debug, error, info, warn};

pub use crate::{
    converter::types::{LyricDocument, LyricLine},
    error::{ErrorKind, LyricsHelperError, Result},
    model::track::{SearchRequest, SearchResult, TrackIdentity},
};

use crate::{cache::LyricsCache, config::HelperConfig, providers::lrclib::LrclibClient};
use crate::providers::Provider;

/// 手动导入的歌词携带的来源标签。
pub const MANUAL_SOURCE_LABEL: &str = "manual";

// ==========================================================
//  状态快照
// ==========================================================

/// [`LyricsHelper`] 发布给宿主界面的不可变状态快照。
#[derive(Debug, Clone, Default)]
pub struct LyricsState {
    /// 当前状态对应的歌曲。
    pub track: Option<TrackIdentity>,
    /// 当前歌词文档。`None` 代表尚未加载，空文档代表这首歌没有歌词。
    pub current_document: Option<Arc<LyricDocument>>,
    /// 是否正在加载。
    pub is_loading: bool,
    /// 最近一次失败的分类。
    pub last_error: Option<ErrorKind>,
    /// 最近一次失败的描述，用于展示。
    pub last_error_message: Option<String>,
}

impl LyricsState {
    /// 当前歌曲确实没有歌词（加载成功但文档为空）。
    pub fn has_no_lyrics(&self) -> bool {
        self.current_document
            .as_deref()
            .is_some_and(LyricDocument::is_empty)
    }
}

/// 一次批量预取的统计结果。
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PrefetchReport {
    /// 获取并写入缓存的歌曲数。
    pub fetched: usize,
    /// 已有缓存而跳过的歌曲数。
    pub skipped_cached: usize,
    /// 标题或艺术家为空而跳过的歌曲数。
    pub skipped_invalid: usize,
    /// 在线上也没有歌词的歌曲数。
    pub empty: usize,
    /// 获取或写入失败的歌曲数。
    pub failed: usize,
    /// 是否在完成之前被中断。
    pub cancelled: bool,
}

// ==========================================================
//  顶层 API
// ==========================================================

/// 顶层歌词助手，协调缓存与歌词源，并持有当前歌词状态。
///
/// 这是与本库交互的主要入口点。每个应用只需要一个实例。
/// 状态只由本结构体修改，宿主通过 [`LyricsHelper::subscribe`] 或
/// [`LyricsHelper::state`] 读取快照。
pub struct LyricsHelper {
    provider: Arc<dyn Provider>,
    cache: Arc<LyricsCache>,
    config: HelperConfig,
    state_tx: watch::Sender<LyricsState>,
    /// 单调递增的请求令牌，只有最新的请求可以写入状态
    latest_request: AtomicU64,
    prefetch_cancelled: AtomicBool,
}

impl LyricsHelper {
    /// 根据配置创建一个使用 LRCLIB 作为歌词源的实例。
    pub fn new(config: HelperConfig) -> Result<Self> {
        let provider = LrclibClient::new(&config)?;
        let cache_dir = config.resolved_cache_dir()?;
        // 默认目录位于系统缓存目录下的应用子目录中，这一层由我们负责创建
        if config.cache_dir.is_none() {
            if let Some(parent) = cache_dir.parent() {
                std::fs::create_dir_all(parent)
                    .map_err(|e| LyricsHelperError::file_system(parent, e))?;
            }
        }
        let cache = LyricsCache::new(cache_dir);
        Ok(Self::with_provider(Arc::new(provider), cache, config))
    }

    /// 使用自定义的歌词源和缓存创建实例。
    pub fn with_provider(
        provider: Arc<dyn Provider>,
        cache: LyricsCache,
        config: HelperConfig,
    ) -> Self {
        info!(
            "[Helper] 使用歌词源 '{}'，缓存目录 {}",
            provider.name(),
            cache.cache_dir().display()
        );
        let (state_tx, _) = watch::channel(LyricsState::default());
        Self {
            provider,
            cache: Arc::new(cache),
            config,
            state_tx,
            latest_request: AtomicU64::new(0),
            prefetch_cancelled: AtomicBool::new(false),
        }
    }

    /// 订阅状态变化。每次变化都会发布一个新的快照。
    pub fn subscribe(&self) -> watch::Receiver<LyricsState> {
        self.state_tx.subscribe()
    }

    /// 当前状态的快照。
    pub fn state(&self) -> LyricsState {
        self.state_tx.borrow().clone()
    }

    /// 底层缓存，可用于诊断（大小、清理）。
    pub fn cache(&self) -> &LyricsCache {
        &self.cache
    }

    /// 当前配置。
    pub fn config(&self) -> &HelperConfig {
        &self.config
    }

    /// 在 tokio 运行时上加载歌词，不阻塞调用方。
    pub fn spawn_load(self: &Arc<Self>, track: TrackIdentity) -> JoinHandle<Result<()>> {
        let helper = Arc::clone(self);
        tokio::spawn(async move { helper.load_lyrics(&track).await })
    }

    /// 为一首歌加载歌词：先读缓存，未命中再请求歌词源。
    ///
    /// 标题或艺术家为空时，状态被置为“没有文档”并直接返回 `Ok(())`，不做任何 I/O。
    /// 获取失败时状态中的 `last_error` 会被设置，同时返回该错误。
    /// 如果在完成之前又有新的加载请求，本次结果会被丢弃，不会覆盖新歌曲的状态。
    pub async fn load_lyrics(&self, track: &TrackIdentity) -> Result<()> {
        let token = self.begin_request();

        if let Err(e) = track.validate() {
            debug!("[Helper] 忽略无效的歌曲: {e}");
            self.publish(token, |state| {
                *state = LyricsState {
                    track: Some(track.clone()),
                    ..Default::default()
                };
            });
            return Ok(());
        }

        self.publish_loading(token, track);

        if let Some(document) = self.cache.read(track).await {
            info!("[Helper] 从缓存加载了 '{} - {}'。", track.artist, track.title);
            self.publish_document(token, Arc::new(document));
            return Ok(());
        }

        let request = track.to_search_request(self.config.search_result_limit);
        match self.provider.get_lyrics(&request).await {
            Ok(document) => {
                if document.is_empty() {
                    info!("[Helper] '{} - {}' 没有可用的歌词。", track.artist, track.title);
                } else {
                    self.persist(&document, track).await;
                }
                self.publish_document(token, Arc::new(document));
                Ok(())
            }
            Err(e) => {
                error!(
                    "[Helper] 获取 '{} - {}' 的歌词失败: {e}",
                    track.artist, track.title
                );
                self.publish_error(token, &e);
                Err(e)
            }
        }
    }

    /// 导入用户选择的歌词文件。
    ///
    /// 文件内容原样写入这首歌的缓存文件，再经由缓存读取路径解析并设为当前文档。
    /// 读取或写入失败会返回错误并记录在状态中。
    pub async fn import_manual(
        &self,
        track: &TrackIdentity,
        source: &Path,
    ) -> Result<Arc<LyricDocument>> {
        track.validate()?;
        let token = self.begin_request();
        self.publish_loading(token, track);

        match self.import_manual_inner(track, source).await {
            Ok(document) => {
                info!(
                    "[Helper] 已从 {} 导入 {} 行歌词。",
                    source.display(),
                    document.len()
                );
                self.publish_document(token, Arc::clone(&document));
                Ok(document)
            }
            Err(e) => {
                error!("[Helper] 导入歌词文件 {} 失败: {e}", source.display());
                self.publish_error(token, &e);
                Err(e)
            }
        }
    }

    async fn import_manual_inner(
        &self,
        track: &TrackIdentity,
        source: &Path,
    ) -> Result<Arc<LyricDocument>> {
        let content = tokio::fs::read_to_string(source)
            .await
            .map_err(|e| LyricsHelperError::file_system(source, e))?;
        let path = self.cache.write_raw(track, &content).await?;
        let document = self.cache.read(track).await.ok_or_else(|| {
            LyricsHelperError::file_system(
                &path,
                std::io::Error::new(std::io::ErrorKind::NotFound, "写入后无法读回缓存文件"),
            )
        })?;
        Ok(Arc::new(document.with_source_label(MANUAL_SOURCE_LABEL)))
    }

    /// 在歌词源中进行关键词搜索，返回候选列表供预览和选择。
    ///
    /// 不修改状态，也不写入缓存。
    pub async fn search_online(&self, request: &SearchRequest) -> Result<Vec<SearchResult>> {
        info!("[Helper] 在线搜索 '{}'", request.keyword_query());
        self.provider.search_songs(request).await
    }

    /// 采用一个在线搜索得到的候选：写入缓存并设为当前文档。
    pub async fn apply_search_result(
        &self,
        track: &TrackIdentity,
        result: &SearchResult,
    ) -> Result<Arc<LyricDocument>> {
        track.validate()?;
        let token = self.begin_request();

        let text = result.synced_lyrics.as_deref().unwrap_or_default();
        let document = converter::parse(text).with_source_label(result.provider_name.clone());
        if !document.is_empty() {
            if let Err(e) = self.cache.write_raw(track, text).await {
                warn!("[Helper] 缓存写入失败，继续使用内存中的歌词: {e}");
            }
        }

        let document = Arc::new(document);
        self.publish(token, |state| {
            *state = LyricsState {
                track: Some(track.clone()),
                current_document: Some(Arc::clone(&document)),
                ..Default::default()
            };
        });
        Ok(document)
    }

    /// 依次为一组歌曲预取歌词并写入缓存。
    ///
    /// 已有缓存的歌曲会被跳过；两次网络请求之间至少间隔 500 毫秒。
    /// 单首歌失败只记录日志，不会中断整个批次。不会修改当前状态。
    /// 批次结束时清除中断请求，之后的批次不受影响。
    pub async fn prefetch_all(&self, tracks: &[TrackIdentity]) -> PrefetchReport {
        let delay = self.config.prefetch_delay();
        let mut report = PrefetchReport::default();
        let mut made_request = false;

        info!("[Helper] 开始预取 {} 首歌的歌词。", tracks.len());

        for track in tracks {
            if self.prefetch_cancelled.load(Ordering::SeqCst) {
                report.cancelled = true;
                break;
            }
            if track.validate().is_err() {
                report.skipped_invalid += 1;
                continue;
            }
            if self.cache.contains(track).await {
                report.skipped_cached += 1;
                continue;
            }

            if made_request {
                tokio::time::sleep(delay).await;
                if self.prefetch_cancelled.load(Ordering::SeqCst) {
                    report.cancelled = true;
                    break;
                }
            }
            made_request = true;

            let request = track.to_search_request(self.config.search_result_limit);
            match self.provider.get_lyrics(&request).await {
                Ok(document) if document.is_empty() => report.empty += 1,
                Ok(document) => match self.cache.write(&document, track).await {
                    Ok(_) => report.fetched += 1,
                    Err(e) => {
                        warn!("[Helper] 预取 '{} - {}' 时写入缓存失败: {e}", track.artist, track.title);
                        report.failed += 1;
                    }
                },
                Err(e) => {
                    warn!("[Helper] 预取 '{} - {}' 失败: {e}", track.artist, track.title);
                    report.failed += 1;
                }
            }
        }

        self.prefetch_cancelled.store(false, Ordering::SeqCst);
        if report.cancelled {
            info!("[Helper] 预取已被中断。");
        }
        info!("[Helper] 预取结束: {report:?}");
        report
    }

    /// 请求中断预取。在处理下一首歌之前生效，不会中断已经发出的请求。
    ///
    /// 没有正在进行的预取时，下一个开始的批次会在处理第一首歌之前停止。
    pub fn cancel_prefetch(&self) {
        self.prefetch_cancelled.store(true, Ordering::SeqCst);
    }

    /// 开始一个新的请求，之前所有请求的结果都将被丢弃。
    fn begin_request(&self) -> u64 {
        self.latest_request.fetch_add(1, Ordering::SeqCst) + 1
    }

    /// 仅当 `token` 仍是最新请求时修改状态并通知订阅者。
    fn publish(&self, token: u64, update: impl FnOnce(&mut LyricsState)) -> bool {
        let applied = self.state_tx.send_if_modified(|state| {
            if self.latest_request.load(Ordering::SeqCst) != token {
                return false;
            }
            update(state);
            true
        });
        if !applied {
            debug!("[Helper] 请求 {token} 已被新的请求取代，丢弃其结果。");
        }
        applied
    }

    fn publish_loading(&self, token: u64, track: &TrackIdentity) {
        self.publish(token, |state| {
            // 切换歌曲时不再显示上一首的歌词
            if state.track.as_ref() != Some(track) {
                state.current_document = None;
            }
            state.track = Some(track.clone());
            state.is_loading = true;
            state.last_error = None;
            state.last_error_message = None;
        });
    }

    fn publish_document(&self, token: u64, document: Arc<LyricDocument>) {
        self.publish(token, |state| {
            state.current_document = Some(document);
            state.is_loading = false;
        });
    }

    fn publish_error(&self, token: u64, err: &LyricsHelperError) {
        self.publish(token, |state| {
            state.is_loading = false;
            state.last_error = err.kind();
            state.last_error_message = Some(err.to_string());
        });
    }

    /// 写入缓存，失败只记录日志。
    async fn persist(&self, document: &LyricDocument, track: &TrackIdentity) {
        if let Err(e) = self.cache.write(document, track).await {
            warn!("[Helper] 缓存写入失败，继续使用内存中的歌词: {e}");
        }
    }
}
