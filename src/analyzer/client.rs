//! 推論エンドポイント呼び出し
//!
//! ChatRequest をJSONでPOSTし、レスポンスの completion テキストを返す。
//! リトライはしない。失敗の詳細は debug で残し、error ログは呼び出し側に任せる。

use reqwest::Client;

use crate::error::AnalysisError;
use food_scan_common::{ChatRequest, CompletionResponse};

pub(crate) async fn request_completion(
    client: &Client,
    endpoint: &str,
    request: &ChatRequest,
) -> Result<String, AnalysisError> {
    tracing::debug!(endpoint, "sending analysis request");

    let response = client
        .post(endpoint)
        .json(request)
        .send()
        .await
        .map_err(|e| {
            tracing::debug!("inference request failed: {}", e);
            transport_error(e)
        })?;

    let status = response.status();
    if !status.is_success() {
        let error_text = response.text().await.unwrap_or_default();
        tracing::debug!("inference endpoint error: {} - {}", status, error_text);
        return Err(AnalysisError::RemoteFailure(status.as_u16()));
    }

    let body = response.text().await.map_err(|e| {
        tracing::debug!("failed to read inference response: {}", e);
        transport_error(e)
    })?;

    let payload: CompletionResponse = serde_json::from_str(&body).map_err(|e| {
        tracing::debug!(body = %body, "inference response is not JSON: {}", e);
        AnalysisError::InvalidResponse(e.to_string())
    })?;

    tracing::debug!(chars = payload.completion.len(), "received completion");
    Ok(payload.completion)
}

fn transport_error(e: reqwest::Error) -> AnalysisError {
    if e.is_timeout() {
        AnalysisError::Timeout
    } else {
        AnalysisError::Transport(e.to_string())
    }
}
