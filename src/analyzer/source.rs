//! 画像ソース
//!
//! ロケータを画像バイト列に解決する。
//! - UrlSource: http(s) はGETで取得、data: URLはその場でデコード
//! - FileSource: ローカルファイルを読む
//! - LocatorSource: ロケータの形で上記を振り分ける
//!
//! どの経路でも同じバイト列なら同じBase64文字列になる（[`encode_image`]）。

use std::future::Future;

use base64::{engine::general_purpose, Engine as _};
use reqwest::Client;

use crate::error::AnalysisError;
use food_scan_common::{data_url_payload, ImageLocator};

/// ロケータから画像バイト列を得る能力
pub trait ImageSource: Send + Sync {
    fn read(
        &self,
        locator: &ImageLocator,
    ) -> impl Future<Output = Result<Vec<u8>, AnalysisError>> + Send;
}

/// 画像バイト列をBase64（標準アルファベット、パディングあり）に変換
pub fn encode_image(bytes: &[u8]) -> String {
    general_purpose::STANDARD.encode(bytes)
}

#[derive(Debug, Clone)]
pub struct UrlSource {
    client: Client,
}

impl UrlSource {
    pub fn new(client: Client) -> Self {
        Self { client }
    }

    async fn fetch(&self, url: &str) -> Result<Vec<u8>, AnalysisError> {
        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| AnalysisError::ImageReadFailed(format!("fetch {}: {}", url, e)))?;

        if !response.status().is_success() {
            return Err(AnalysisError::ImageReadFailed(format!(
                "fetch {}: status {}",
                url,
                response.status()
            )));
        }

        let body = response
            .bytes()
            .await
            .map_err(|e| AnalysisError::ImageReadFailed(format!("read body {}: {}", url, e)))?;
        Ok(body.to_vec())
    }
}

impl ImageSource for UrlSource {
    async fn read(&self, locator: &ImageLocator) -> Result<Vec<u8>, AnalysisError> {
        let url = locator.as_url().ok_or_else(|| {
            AnalysisError::ImageReadFailed(format!("not a URL locator: {}", locator))
        })?;

        let bytes = if url.starts_with("data:") {
            let payload = data_url_payload(url).ok_or_else(|| {
                AnalysisError::ImageReadFailed("data URL without base64 payload".into())
            })?;
            general_purpose::STANDARD
                .decode(payload.trim())
                .map_err(|e| AnalysisError::ImageReadFailed(format!("decode data URL: {}", e)))?
        } else {
            self.fetch(url).await?
        };

        non_empty(bytes, locator)
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct FileSource;

impl ImageSource for FileSource {
    async fn read(&self, locator: &ImageLocator) -> Result<Vec<u8>, AnalysisError> {
        let path = locator.as_path().ok_or_else(|| {
            AnalysisError::ImageReadFailed(format!("not a file locator: {}", locator))
        })?;

        let bytes = tokio::fs::read(path)
            .await
            .map_err(|e| AnalysisError::ImageReadFailed(format!("{}: {}", path.display(), e)))?;

        non_empty(bytes, locator)
    }
}

/// ロケータの形でソースを選ぶ
#[derive(Debug, Clone)]
pub struct LocatorSource {
    url: UrlSource,
    file: FileSource,
}

impl LocatorSource {
    pub fn new(client: Client) -> Self {
        Self {
            url: UrlSource::new(client),
            file: FileSource,
        }
    }
}

impl ImageSource for LocatorSource {
    async fn read(&self, locator: &ImageLocator) -> Result<Vec<u8>, AnalysisError> {
        match locator {
            ImageLocator::Url(_) => self.url.read(locator).await,
            ImageLocator::Path(_) => self.file.read(locator).await,
        }
    }
}

fn non_empty(bytes: Vec<u8>, locator: &ImageLocator) -> Result<Vec<u8>, AnalysisError> {
    if bytes.is_empty() {
        return Err(AnalysisError::ImageReadFailed(format!("empty image: {}", locator)));
    }
    Ok(bytes)
}
