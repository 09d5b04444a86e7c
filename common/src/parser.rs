//! completion パーサー
//!
//! モデルの生テキストを構造化結果として読む。
//! 読めない場合でも失敗にはせず、固定のフォールバック結果を返す。

use serde_json::Value;

use crate::error::{Error, Result};
use crate::types::{Analysis, AnalysisResult, FallbackResult};

/// completion を構造化結果としてパース
///
/// JSONオブジェクトであることを要求する（配列・文字列・数値などはエラー）。
/// 値の範囲チェックやクランプは行わない。
///
/// # Examples
/// ```
/// use food_scan_common::parse_structured;
///
/// let result = parse_structured(r#"{"foodName": "Apple", "healthScore": 90}"#).unwrap();
/// assert_eq!(result.food_name, "Apple");
/// ```
pub fn parse_structured(completion: &str) -> Result<AnalysisResult> {
    let value: Value = serde_json::from_str(completion.trim())
        .map_err(|e| Error::Parse(format!("completion is not valid JSON: {}", e)))?;

    if !value.is_object() {
        return Err(Error::Parse("completion is not a JSON object".into()));
    }

    serde_json::from_value(value)
        .map_err(|e| Error::Parse(format!("unexpected completion shape: {}", e)))
}

/// completion を解析結果に正規化
///
/// パースに失敗した場合は [`FallbackResult`] に生テキストを保持して返す。
pub fn parse_completion(completion: &str) -> Analysis {
    match parse_structured(completion) {
        Ok(result) => Analysis::Structured(result),
        Err(_) => Analysis::Fallback(FallbackResult::from_raw(completion)),
    }
}
