//! 歌词的本地文件缓存。
//!
//! 每首歌对应缓存目录下的一个 LRC 文件，文件名由 `"{artist} - {title}.lrc"` 净化后得到。
//! 文件存在即代表缓存命中，没有过期时间。写入总是先写临时文件再重命名，
//! 同一文件名的并发写入会被串行化。

use std::{
    io,
    path::{Path, PathBuf},
    sync::Arc,
};

use dashmap::DashMap;
use tokio::{fs, sync::Mutex};
use tracing::{debug, info, warn};

use crate::{
    converter::{self, types::LyricDocument},
    error::{LyricsHelperError, Result},
    model::track::TrackIdentity,
};

const LRC_EXTENSION: &str = "lrc";

/// 文件名中需要替换为 `_` 的字符。
const RESERVED_FILENAME_CHARS: [char; 9] = ['/', '\\', ':', '*', '?', '"', '<', '>', '|'];

/// 缓存命中时文档携带的来源标签。
pub const CACHE_SOURCE_LABEL: &str = "cache";

/// 将文件名中的保留字符替换为 `_`。
pub fn sanitize_file_component(component: &str) -> String {
    component
        .chars()
        .map(|c| {
            if RESERVED_FILENAME_CHARS.contains(&c) {
                '_'
            } else {
                c
            }
        })
        .collect()
}

/// 根据歌曲身份生成确定性的缓存文件名。
///
/// 标题和艺术家先去除首尾空白，与搜索请求保持一致。
pub fn cache_file_name(track: &TrackIdentity) -> String {
    format!(
        "{} - {}.{LRC_EXTENSION}",
        sanitize_file_component(track.artist.trim()),
        sanitize_file_component(track.title.trim())
    )
}

/// 基于目录的歌词缓存。
#[derive(Debug)]
pub struct LyricsCache {
    cache_dir: PathBuf,
    write_locks: DashMap<PathBuf, Arc<Mutex<()>>>,
}

impl LyricsCache {
    /// 创建一个新的缓存实例。目录会在第一次写入时创建。
    pub fn new(cache_dir: impl Into<PathBuf>) -> Self {
        Self {
            cache_dir: cache_dir.into(),
            write_locks: DashMap::new(),
        }
    }

    /// 缓存目录。
    pub fn cache_dir(&self) -> &Path {
        &self.cache_dir
    }

    /// 某首歌的缓存文件路径。
    pub fn path_for(&self, track: &TrackIdentity) -> PathBuf {
        self.cache_dir.join(cache_file_name(track))
    }

    /// 某首歌是否已有缓存文件。
    pub async fn contains(&self, track: &TrackIdentity) -> bool {
        fs::try_exists(self.path_for(track)).await.unwrap_or(false)
    }

    /// 读取并解析某首歌的缓存。
    ///
    /// 文件不存在或无法读取时返回 `None`，这是正常的缓存未命中。
    pub async fn read(&self, track: &TrackIdentity) -> Option<LyricDocument> {
        let path = self.path_for(track);
        match fs::read_to_string(&path).await {
            Ok(content) => {
                debug!("[Cache] 命中缓存: {}", path.display());
                Some(converter::parse(&content).with_source_label(CACHE_SOURCE_LABEL))
            }
            Err(e) if e.kind() == io::ErrorKind::NotFound => None,
            Err(e) => {
                warn!("[Cache] 读取缓存文件 {} 失败，视为未命中: {e}", path.display());
                None
            }
        }
    }

    /// 将文档序列化为 LRC 并写入缓存，覆盖已有文件。
    pub async fn write(&self, document: &LyricDocument, track: &TrackIdentity) -> Result<PathBuf> {
        let content = converter::serialize(document)?;
        self.write_raw(track, &content).await
    }

    /// 将原始文本原样写入某首歌的缓存文件，不经过解析。
    pub async fn write_raw(&self, track: &TrackIdentity, content: &str) -> Result<PathBuf> {
        self.ensure_dir().await?;
        let path = self.path_for(track);

        let lock = self
            .write_locks
            .entry(path.clone())
            .or_insert_with(|| Arc::new(Mutex::new(())))
            .clone();
        let result = {
            let _guard = lock.lock().await;
            self.replace_file(&path, track, content).await
        };
        drop(lock);
        // 没有其他写入者持有时移除这个锁
        self.write_locks
            .remove_if(&path, |_, lock| Arc::strong_count(lock) == 1);

        result?;
        debug!("[Cache] 已写入 {}", path.display());
        Ok(path)
    }

    /// 先写临时文件再重命名到 `path`。调用方需持有该路径的写锁。
    async fn replace_file(&self, path: &Path, track: &TrackIdentity, content: &str) -> Result<()> {
        let tmp_path = self.cache_dir.join(format!(
            ".{}.{}.tmp",
            cache_file_name(track),
            uuid::Uuid::new_v4().simple()
        ));
        fs::write(&tmp_path, content)
            .await
            .map_err(|e| LyricsHelperError::file_system(&tmp_path, e))?;

        if let Err(e) = fs::rename(&tmp_path, path).await {
            let _ = fs::remove_file(&tmp_path).await;
            return Err(LyricsHelperError::file_system(path, e));
        }
        Ok(())
    }

    /// 删除某首歌的缓存。返回文件是否曾经存在。
    pub async fn delete(&self, track: &TrackIdentity) -> Result<bool> {
        let path = self.path_for(track);
        match fs::remove_file(&path).await {
            Ok(()) => Ok(true),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(false),
            Err(e) => Err(LyricsHelperError::file_system(&path, e)),
        }
    }

    /// 删除所有缓存文件，返回删除的数量。
    pub async fn clear(&self) -> Result<usize> {
        let files = self.cached_files().await?;
        let mut removed = 0;
        for (path, _) in files {
            match fs::remove_file(&path).await {
                Ok(()) => removed += 1,
                Err(e) if e.kind() == io::ErrorKind::NotFound => {}
                Err(e) => return Err(LyricsHelperError::file_system(&path, e)),
            }
        }
        info!("[Cache] 已清除 {removed} 个缓存文件。");
        Ok(removed)
    }

    /// 所有缓存文件的字节数之和。
    pub async fn size(&self) -> Result<u64> {
        Ok(self.cached_files().await?.iter().map(|(_, len)| len).sum())
    }

    /// 列出缓存目录中的所有 `.lrc` 文件及其大小。目录不存在时返回空列表。
    async fn cached_files(&self) -> Result<Vec<(PathBuf, u64)>> {
        let mut entries = match fs::read_dir(&self.cache_dir).await {
            Ok(entries) => entries,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(LyricsHelperError::file_system(&self.cache_dir, e)),
        };

        let mut files = Vec::new();
        while let Some(entry) = entries
            .next_entry()
            .await
            .map_err(|e| LyricsHelperError::file_system(&self.cache_dir, e))?
        {
            let path = entry.path();
            if path.extension().and_then(|ext| ext.to_str()) != Some(LRC_EXTENSION) {
                continue;
            }
            match entry.metadata().await {
                Ok(meta) if meta.is_file() => files.push((path, meta.len())),
                Ok(_) => {}
                Err(e) => warn!("[Cache] 无法读取 {} 的元数据: {e}", path.display()),
            }
        }
        Ok(files)
    }

    /// 创建缓存目录本身。只创建这一层，父目录由宿主负责。
    async fn ensure_dir(&self) -> Result<()> {
        match fs::create_dir(&self.cache_dir).await {
            Ok(()) => {
                info!("[Cache] 已创建缓存目录 {}", self.cache_dir.display());
                Ok(())
            }
            Err(e) if e.kind() == io::ErrorKind::AlreadyExists => Ok(()),
            Err(e) => Err(LyricsHelperError::file_system(&self.cache_dir, e)),
        }
    }
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;

    use super::*;
    use crate::converter::types::LyricLine;
    use crate::error::ErrorKind;

    fn sample_document() -> LyricDocument {
        let mut metadata = BTreeMap::new();
        metadata.insert("ar".to_string(), "AC/DC".to_string());
        LyricDocument::new(
            vec![
                LyricLine::new(1.0, "first"),
                LyricLine::new(4.5, "second"),
            ],
            metadata,
        )
    }

    fn new_cache() -> (tempfile::TempDir, LyricsCache) {
        let dir = tempfile::tempdir().unwrap();
        let cache = LyricsCache::new(dir.path().join("lyrics"));
        (dir, cache)
    }

    #[test]
    fn test_cache_file_name_sanitization() {
        let track = TrackIdentity::new("T:N:T", "AC/DC");
        assert_eq!(cache_file_name(&track), "AC_DC - T_N_T.lrc");
        assert_eq!(sanitize_file_component(r#"a\b*c?d"e<f>g|h"#), "a_b_c_d_e_f_g_h");
    }

    #[test]
    fn test_cache_file_name_ignores_surrounding_whitespace() {
        assert_eq!(
            cache_file_name(&TrackIdentity::new(" Song ", "Artist\t")),
            cache_file_name(&TrackIdentity::new("Song", "Artist"))
        );
    }

    #[tokio::test]
    async fn test_padded_track_hits_same_entry() {
        let (_dir, cache) = new_cache();
        cache
            .write_raw(&TrackIdentity::new("Song", "Artist"), "[00:01.00]x")
            .await
            .unwrap();
        assert!(cache.contains(&TrackIdentity::new(" Song", "Artist ")).await);
    }

    #[tokio::test]
    async fn test_round_trip_past_99_minutes() {
        let (_dir, cache) = new_cache();
        let track = TrackIdentity::new("Long Mix", "DJ");
        let original = LyricDocument::new(
            vec![
                LyricLine::new(5990.0, "before"),
                LyricLine::new(6001.5, "after"),
            ],
            BTreeMap::new(),
        );

        cache.write(&original, &track).await.unwrap();
        let raw = std::fs::read_to_string(cache.path_for(&track)).unwrap();
        assert!(raw.contains("[100:01.500]after"));

        let cached = cache.read(&track).await.unwrap();
        assert_eq!(cached.len(), 2, "超过 99 分钟的行不应在读回时丢失");
        assert_eq!(cached.lines()[1].start_time, 6001.5);
        assert_eq!(cached.lines()[1].text, "after");
    }

    #[tokio::test]
    async fn test_write_then_read_round_trip() {
        let (_dir, cache) = new_cache();
        let track = TrackIdentity::new("T:N:T", "AC/DC");
        assert!(cache.read(&track).await.is_none(), "空缓存应未命中");

        let original = sample_document();
        let path = cache.write(&original, &track).await.unwrap();
        assert!(path.ends_with("AC_DC - T_N_T.lrc"));
        assert!(cache.contains(&track).await);

        let cached = cache.read(&track).await.expect("写入后应命中缓存");
        let pairs = |d: &LyricDocument| {
            d.lines()
                .iter()
                .map(|l| (l.start_time, l.text.clone()))
                .collect::<Vec<_>>()
        };
        assert_eq!(pairs(&cached), pairs(&original));
        assert_eq!(cached.metadata, original.metadata);
        assert_eq!(cached.source_label.as_deref(), Some(CACHE_SOURCE_LABEL));
    }

    #[tokio::test]
    async fn test_write_overwrites_existing_entry() {
        let (_dir, cache) = new_cache();
        let track = TrackIdentity::new("Song", "Artist");

        cache.write_raw(&track, "[00:01.00]old").await.unwrap();
        cache.write_raw(&track, "[00:02.00]new").await.unwrap();

        let doc = cache.read(&track).await.unwrap();
        assert_eq!(doc.len(), 1);
        assert_eq!(doc.lines()[0].text, "new");
    }

    #[tokio::test]
    async fn test_delete_clear_and_size() {
        let (_dir, cache) = new_cache();
        assert_eq!(cache.size().await.unwrap(), 0, "目录不存在时大小为 0");

        let a = TrackIdentity::new("A", "X");
        let b = TrackIdentity::new("B", "X");
        cache.write_raw(&a, "[00:01.00]aaaa").await.unwrap();
        cache.write_raw(&b, "[00:01.00]bb").await.unwrap();
        assert_eq!(cache.size().await.unwrap(), 14 + 12);

        assert!(cache.delete(&a).await.unwrap());
        assert!(!cache.delete(&a).await.unwrap(), "重复删除应返回 false");
        assert!(cache.read(&a).await.is_none());

        assert_eq!(cache.clear().await.unwrap(), 1);
        assert_eq!(cache.size().await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_missing_parent_directory_is_not_created() {
        let dir = tempfile::tempdir().unwrap();
        let cache = LyricsCache::new(dir.path().join("missing-app-dir").join("lyrics"));
        let err = cache
            .write_raw(&TrackIdentity::new("Song", "Artist"), "[00:01.00]x")
            .await
            .unwrap_err();
        assert_eq!(err.kind(), Some(ErrorKind::FileSystem));
    }

    #[tokio::test]
    async fn test_concurrent_writes_leave_a_complete_file() {
        let dir = tempfile::tempdir().unwrap();
        let cache = Arc::new(LyricsCache::new(dir.path().join("lyrics")));
        let track = TrackIdentity::new("Song", "Artist");

        let handles: Vec<_> = (0..8)
            .map(|i| {
                let cache = Arc::clone(&cache);
                let track = track.clone();
                tokio::spawn(async move {
                    let body = format!("[00:0{i}.00]writer {i}\n").repeat(50);
                    cache.write_raw(&track, &body).await
                })
            })
            .collect();
        for handle in handles {
            handle.await.unwrap().unwrap();
        }

        let doc = cache.read(&track).await.unwrap();
        assert_eq!(doc.len(), 50, "文件内容应来自某一个完整的写入");
        let first = &doc.lines()[0].text;
        assert!(doc.lines().iter().all(|l| &l.text == first));

        let mut entries = std::fs::read_dir(cache.cache_dir()).unwrap();
        assert!(
            entries.all(|e| !e.unwrap().file_name().to_string_lossy().ends_with(".tmp")),
            "不应残留临时文件"
        );
        assert!(cache.write_locks.is_empty(), "写入结束后不应保留锁");
    }

    #[tokio::test]
    async fn test_write_locks_are_released_after_each_write() {
        let (_dir, cache) = new_cache();
        for i in 0..20 {
            let track = TrackIdentity::new(format!("Song {i}"), "Artist");
            cache.write_raw(&track, "[00:01.00]x").await.unwrap();
        }
        assert!(cache.write_locks.is_empty(), "锁表不应随写过的文件数增长");
    }
}
