//! 负责处理库的持久化配置。

use std::fs;
use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::info;

use crate::error::{LyricsHelperError, Result};
use crate::model::track::DEFAULT_RESULT_LIMIT;

const CONFIG_DIR_NAME: &str = "lyrics-helper";
const CONFIG_FILE_NAME: &str = "config.json";

/// 批量预取时两次网络请求之间的最小间隔（毫秒）。
pub const MIN_PREFETCH_DELAY_MS: u64 = 500;

/// 库的配置项。
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(default)]
pub struct HelperConfig {
    /// 歌词缓存目录。为 `None` 时使用系统缓存目录下的 `lyrics-helper/lyrics`。
    pub cache_dir: Option<PathBuf>,
    /// 歌词 API 的基础地址。
    pub api_base_url: String,
    /// 发送请求时使用的客户端标识。
    pub user_agent: String,
    /// 单个请求的超时时间（秒）。
    pub request_timeout_secs: u64,
    /// 批量预取时两次网络请求之间的间隔（毫秒），不会低于 500。
    pub prefetch_delay_ms: u64,
    /// 关键词搜索最多考虑的候选数量。
    pub search_result_limit: usize,
}

impl Default for HelperConfig {
    fn default() -> Self {
        Self {
            cache_dir: None,
            api_base_url: "https://lrclib.net/api".to_string(),
            user_agent: concat!(
                "synced-lyrics-rs/",
                env!("CARGO_PKG_VERSION"),
                " (https://github.com/apoint123/lyrics-helper-rs)"
            )
            .to_string(),
            request_timeout_secs: 10,
            prefetch_delay_ms: MIN_PREFETCH_DELAY_MS,
            search_result_limit: DEFAULT_RESULT_LIMIT,
        }
    }
}

impl HelperConfig {
    /// 实际使用的缓存目录。
    pub fn resolved_cache_dir(&self) -> Result<PathBuf> {
        match &self.cache_dir {
            Some(dir) => Ok(dir.clone()),
            None => default_cache_dir(),
        }
    }

    /// 请求超时时间。
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs.max(1))
    }

    /// 预取间隔，不低于 [`MIN_PREFETCH_DELAY_MS`]。
    pub fn prefetch_delay(&self) -> Duration {
        Duration::from_millis(self.prefetch_delay_ms.max(MIN_PREFETCH_DELAY_MS))
    }
}

/// 系统缓存目录下的默认歌词缓存目录。
pub fn default_cache_dir() -> Result<PathBuf> {
    dirs::cache_dir()
        .map(|dir| dir.join(CONFIG_DIR_NAME).join("lyrics"))
        .ok_or_else(|| {
            LyricsHelperError::Io(std::io::Error::new(
                std::io::ErrorKind::NotFound,
                "无法找到用户缓存目录",
            ))
        })
}

/// 获取应用配置目录下配置文件的完整路径。
pub fn get_config_file_path() -> Result<PathBuf> {
    dirs::config_dir()
        .map(|dir| dir.join(CONFIG_DIR_NAME).join(CONFIG_FILE_NAME))
        .ok_or_else(|| {
            LyricsHelperError::Io(std::io::Error::new(
                std::io::ErrorKind::NotFound,
                "无法找到用户配置目录",
            ))
        })
}

/// 从默认位置加载配置，文件不存在时返回默认配置。
pub fn load_config() -> Result<HelperConfig> {
    load_config_from(&get_config_file_path()?)
}

/// 从指定文件加载配置，文件不存在时返回默认配置。
pub fn load_config_from(path: &std::path::Path) -> Result<HelperConfig> {
    match fs::read_to_string(path) {
        Ok(content) => {
            let config: HelperConfig = serde_json::from_str(&content)?;
            info!("已从 {} 加载配置。", path.display());
            Ok(config)
        }
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            info!("配置文件不存在，将使用默认配置。");
            Ok(HelperConfig::default())
        }
        Err(e) => Err(LyricsHelperError::file_system(path, e)),
    }
}

/// 将配置序列化为 JSON 并保存到默认位置。
pub fn save_config(config: &HelperConfig) -> Result<()> {
    save_config_to(config, &get_config_file_path()?)
}

/// 将配置序列化为 JSON 并保存到指定文件。
pub fn save_config_to(config: &HelperConfig, path: &std::path::Path) -> Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).map_err(|e| LyricsHelperError::file_system(parent, e))?;
    }
    let content = serde_json::to_string_pretty(config)?;
    fs::write(path, content).map_err(|e| LyricsHelperError::file_system(path, e))?;
    info!("配置已保存到 {}。", path.display());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_file_yields_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let config = load_config_from(&dir.path().join("absent.json")).unwrap();
        assert_eq!(config, HelperConfig::default());
    }

    #[test]
    fn test_partial_file_fills_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        fs::write(&path, r#"{ "prefetch_delay_ms": 100, "search_result_limit": 3 }"#).unwrap();

        let config = load_config_from(&path).unwrap();
        assert_eq!(config.search_result_limit, 3);
        assert_eq!(config.api_base_url, "https://lrclib.net/api");
        assert_eq!(
            config.prefetch_delay(),
            Duration::from_millis(MIN_PREFETCH_DELAY_MS),
            "预取间隔不应低于下限"
        );
    }

    #[test]
    fn test_malformed_file_is_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        fs::write(&path, "{ not json").unwrap();
        assert!(matches!(
            load_config_from(&path),
            Err(LyricsHelperError::JsonParse(_))
        ));
    }

    #[test]
    fn test_save_then_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("config.json");
        let config = HelperConfig {
            cache_dir: Some(dir.path().join("lyrics")),
            request_timeout_secs: 3,
            ..Default::default()
        };

        save_config_to(&config, &path).unwrap();
        assert_eq!(load_config_from(&path).unwrap(), config);
        assert_eq!(
            config.resolved_cache_dir().unwrap(),
            dir.path().join("lyrics")
        );
    }
}
