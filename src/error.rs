//! 定义了整个 `synced-lyrics` 库的错误类型 `LyricsHelperError`。

use std::io;

use strum_macros::{Display, EnumString};
use thiserror::Error;

use crate::converter::types::ConvertError;

/// `synced-lyrics` 库的通用错误枚举。
#[derive(Error, Debug)]
pub enum LyricsHelperError {
    /// 歌曲标题或艺术家为空，请求在任何 I/O 之前被拒绝
    #[error("无效的歌曲信息: {0}")]
    Validation(String),

    /// 网络请求失败 (源自 `reqwest::Error`)
    #[error("网络请求失败: {0}")]
    Reqwest(#[from] reqwest::Error),

    /// JSON 解析失败 (源自 `serde_json::Error`)
    #[error("JSON 解析失败: {0}")]
    JsonParse(#[from] serde_json::Error),

    /// I/O 错误 (源自 `io::Error`)
    #[error("I/O 错误: {0}")]
    Io(#[from] io::Error),

    /// 通用的歌词解析错误
    #[error("歌词解析失败: {0}")]
    Parser(String),

    /// 缓存或导入文件的读写错误，附带出错的路径
    #[error("文件操作失败 '{path}': {source}")]
    FileSystem {
        /// 出错的文件路径
        path: String,
        /// 底层 I/O 错误
        #[source]
        source: io::Error,
    },

    /// 更通用的网络层错误
    #[error("网络错误: {0}")]
    Network(String),
}

/// 暴露给宿主界面的错误分类。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString)]
#[strum(serialize_all = "snake_case")]
pub enum ErrorKind {
    /// 传输层失败或超时。
    Network,
    /// 提供商返回了无法解码的内容。
    Parse,
    /// 缓存或导入文件读写失败。
    FileSystem,
}

impl LyricsHelperError {
    /// 将错误归入宿主可见的分类。
    ///
    /// `Validation` 返回 `None`：它会被静默吸收，不应显示为错误。
    pub fn kind(&self) -> Option<ErrorKind> {
        match self {
            Self::Validation(_) => None,
            Self::Reqwest(e) if e.is_decode() => Some(ErrorKind::Parse),
            Self::Reqwest(_) | Self::Network(_) => Some(ErrorKind::Network),
            Self::JsonParse(_) | Self::Parser(_) => Some(ErrorKind::Parse),
            Self::Io(_) | Self::FileSystem { .. } => Some(ErrorKind::FileSystem),
        }
    }

    /// 为 I/O 错误附加路径信息。
    pub(crate) fn file_system(path: impl AsRef<std::path::Path>, source: io::Error) -> Self {
        Self::FileSystem {
            path: path.as_ref().display().to_string(),
            source,
        }
    }
}

/// `LyricsHelperError` 的 `Result` 类型别名，方便在函数签名中使用。
pub type Result<T> = std::result::Result<T, LyricsHelperError>;

impl From<ConvertError> for LyricsHelperError {
    fn from(err: ConvertError) -> Self {
        match err {
            ConvertError::Format(e) => Self::Parser(e.to_string()),
            ConvertError::InvalidTime(s) => Self::Parser(s),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    #[test]
    fn test_error_kind_mapping() {
        let validation = LyricsHelperError::Validation("标题为空".into());
        assert_eq!(validation.kind(), None, "校验错误不应暴露给宿主");

        let network = LyricsHelperError::Network("timeout".into());
        assert_eq!(network.kind(), Some(ErrorKind::Network));

        let json = serde_json::from_str::<Vec<u8>>("{").unwrap_err();
        assert_eq!(LyricsHelperError::from(json).kind(), Some(ErrorKind::Parse));

        let fs = LyricsHelperError::file_system(
            "/tmp/x.lrc",
            io::Error::new(io::ErrorKind::PermissionDenied, "denied"),
        );
        assert_eq!(fs.kind(), Some(ErrorKind::FileSystem));
        assert!(fs.to_string().contains("/tmp/x.lrc"));
    }

    #[test]
    fn test_error_kind_labels() {
        assert_eq!(ErrorKind::FileSystem.to_string(), "file_system");
        assert_eq!(ErrorKind::from_str("network").unwrap(), ErrorKind::Network);
    }
}
