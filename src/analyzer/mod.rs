//! 食べ物画像の解析パイプライン
//!
//! encode → transmit → parse の順に1回だけ実行する。
//! モデルがJSON契約を守らなかった場合はエラーにせず、フォールバック結果を返す。

mod client;
pub mod source;

pub use source::{encode_image, FileSource, ImageSource, LocatorSource, UrlSource};

use reqwest::Client;

use crate::config::Config;
use crate::error::AnalysisError;
use food_scan_common::{parse_completion, Analysis, ChatRequest, ImageLocator, ScanSession};

pub struct Analyzer<S = LocatorSource> {
    client: Client,
    endpoint: String,
    source: S,
}

impl Analyzer<LocatorSource> {
    pub fn new(config: &Config) -> Result<Self, AnalysisError> {
        let client = build_client(config)?;
        let source = LocatorSource::new(client.clone());
        Ok(Self::with_source(client, config, source))
    }
}

impl<S: ImageSource> Analyzer<S> {
    /// 任意の画像ソースで構築
    ///
    /// `client` は推論リクエストに使う。画像ソースにも同じクライアントを渡せば
    /// タイムアウト設定が共有される（[`build_client`]）。
    pub fn with_source(client: Client, config: &Config, source: S) -> Self {
        Self {
            client,
            endpoint: config.endpoint.clone(),
            source,
        }
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    /// 画像を解析
    pub async fn analyze(&self, locator: &ImageLocator) -> Result<Analysis, AnalysisError> {
        let bytes = self.source.read(locator).await?;
        tracing::debug!(bytes = bytes.len(), image = %locator, "image loaded");

        let request = ChatRequest::for_image(encode_image(&bytes));
        let completion = client::request_completion(&self.client, &self.endpoint, &request).await?;

        let analysis = parse_completion(&completion);
        if analysis.is_fallback() {
            tracing::warn!(chars = completion.len(), "AI response is not a JSON object, using fallback result");
        }
        Ok(analysis)
    }
}

/// 1回のスキャンを実行し、結果をセッションに反映
///
/// 失敗はユーザー向けメッセージとしてセッションに入るため、この関数自体は失敗しない。
/// 失敗の error ログはここで1回だけ出す。
pub async fn scan<S: ImageSource>(
    analyzer: &Analyzer<S>,
    session: &mut ScanSession<Analysis>,
    locator: ImageLocator,
) {
    session.set_image(Some(locator.clone()));
    session.set_analyzing(true);
    session.set_error(None);

    match analyzer.analyze(&locator).await {
        Ok(analysis) => {
            tracing::info!(
                image = %locator,
                food = analysis.food_name(),
                fallback = analysis.is_fallback(),
                "analysis complete"
            );
            session.set_result(Some(analysis));
        }
        Err(e) => {
            tracing::error!(image = %locator, "analysis failed: {}", e);
            session.set_error(Some(e.user_message().to_string()));
        }
    }

    session.set_analyzing(false);
}

/// 設定のタイムアウトを適用した HTTP クライアント
pub fn build_client(config: &Config) -> Result<Client, AnalysisError> {
    let mut builder = Client::builder();
    if let Some(timeout) = config.timeout() {
        builder = builder.timeout(timeout);
    }
    builder
        .build()
        .map_err(|e| AnalysisError::Transport(format!("HTTP client init: {}", e)))
}
