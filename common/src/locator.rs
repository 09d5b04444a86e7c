//! 画像ロケータ
//!
//! カメラ撮影・ファイル選択の結果として渡される不透明な参照を、
//! 文字列の形で「ネットワーク取得可能なURI」か「ファイルパス」に振り分ける。

use std::fmt;
use std::path::{Path, PathBuf};

use url::Url;

use crate::error::{Error, Result};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ImageLocator {
    /// http(s):// または data: のURI
    Url(String),
    /// ローカルファイル（file:// も含む）
    Path(PathBuf),
}

impl ImageLocator {
    pub fn parse(input: &str) -> Result<Self> {
        let trimmed = input.trim();
        if trimmed.is_empty() {
            return Err(Error::InvalidLocator("empty locator".into()));
        }

        let lower = trimmed.to_ascii_lowercase();
        if lower.starts_with("http://") || lower.starts_with("https://") || lower.starts_with("data:") {
            return Ok(ImageLocator::Url(trimmed.to_string()));
        }

        if lower.starts_with("file://") {
            return file_uri_to_path(trimmed).map(ImageLocator::Path);
        }

        Ok(ImageLocator::Path(PathBuf::from(trimmed)))
    }

    pub fn as_url(&self) -> Option<&str> {
        match self {
            ImageLocator::Url(url) => Some(url),
            ImageLocator::Path(_) => None,
        }
    }

    pub fn as_path(&self) -> Option<&Path> {
        match self {
            ImageLocator::Url(_) => None,
            ImageLocator::Path(path) => Some(path),
        }
    }
}

impl std::str::FromStr for ImageLocator {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

impl fmt::Display for ImageLocator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ImageLocator::Url(url) if url.starts_with("data:") => {
                // data: URLは長いので先頭のみ
                let head: String = url.chars().take(32).collect();
                write!(f, "{}...", head)
            }
            ImageLocator::Url(url) => write!(f, "{}", url),
            ImageLocator::Path(path) => write!(f, "{}", path.display()),
        }
    }
}

/// file:// URIをパスに変換（パーセントエンコードを復号、localhost ホストは無視）
fn file_uri_to_path(uri: &str) -> Result<PathBuf> {
    if uri.len() == "file://".len() {
        return Err(Error::InvalidLocator(uri.to_string()));
    }

    let url = Url::parse(uri).map_err(|e| Error::InvalidLocator(format!("{}: {}", uri, e)))?;
    url.to_file_path()
        .map_err(|_| Error::InvalidLocator(format!("{}: not a local file path", uri)))
}

/// Data URLからBase64データ部分を抽出
///
/// "data:image/jpeg;base64,/9j/4AAQ..." → "/9j/4AAQ..."
/// base64 指定のないData URLは対象外（None）。
pub fn data_url_payload(data_url: &str) -> Option<&str> {
    let rest = data_url.strip_prefix("data:")?;
    let (meta, payload) = rest.split_once(',')?;
    if meta.split(';').any(|part| part.eq_ignore_ascii_case("base64")) {
        Some(payload)
    } else {
        None
    }
}
