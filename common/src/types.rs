//! 解析結果の型定義
//!
//! CLIと共有される型:
//! - AnalysisResult: モデルがJSON契約を守った場合の構造化結果
//! - FallbackResult: モデルの出力がJSONとして読めなかった場合の固定結果
//! - Analysis: 上記2形状の判別共用体

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};

use crate::score::ScoreBand;

/// foodName が欠落・空のときのプレースホルダ
pub const UNKNOWN_FOOD: &str = "Unknown Food";

/// フォールバック時の固定値
pub const FALLBACK_INGREDIENTS: &str = "Could not identify ingredients";
pub const FALLBACK_ARTIFICIAL: &str = "Unknown";
pub const FALLBACK_HEALTH_SCORE: &str = "50";
pub const FALLBACK_HEALTH_TIP: &str =
    "I couldn't analyze this food properly. Try taking another picture with better lighting!";

/// 添加物なしを表す値
pub const NO_ADDITIVES: &str = "None found!";

/// 健康スコア
///
/// リモートから受け取った値をそのまま保持する（数値・文字列・その他）。
/// 整数として読みたい場合は [`HealthScore::value`] で変換する。
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct HealthScore(Value);

impl HealthScore {
    pub fn new(value: impl Into<Value>) -> Self {
        Self(value.into())
    }

    pub fn raw(&self) -> &Value {
        &self.0
    }

    pub fn is_missing(&self) -> bool {
        self.0.is_null()
    }

    /// スコアを整数に変換
    ///
    /// - 整数はそのまま、小数は切り捨て
    /// - 文字列は前後の空白を除き、先頭の符号と数字のみを読む（"72 points" → 72）
    /// - それ以外は None
    ///
    /// 範囲外の値もクランプせずに返す。
    pub fn value(&self) -> Option<i64> {
        match &self.0 {
            Value::Number(n) => n.as_i64().or_else(|| n.as_f64().map(|f| f.trunc() as i64)),
            Value::String(s) => leading_integer(s),
            _ => None,
        }
    }
}

fn leading_integer(s: &str) -> Option<i64> {
    let s = s.trim();
    let (sign, digits) = match s.strip_prefix('-') {
        Some(rest) => (-1, rest),
        None => (1, s.strip_prefix('+').unwrap_or(s)),
    };
    let end = digits
        .find(|c: char| !c.is_ascii_digit())
        .unwrap_or(digits.len());
    digits[..end].parse::<i64>().ok().map(|n| sign * n)
}

/// 構造化された解析結果（モデルがJSON契約を守った場合）
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalysisResult {
    #[serde(default = "default_food_name", deserialize_with = "lenient_food_name")]
    pub food_name: String,

    #[serde(default, deserialize_with = "lenient_text")]
    pub ingredients: String,

    #[serde(default, deserialize_with = "lenient_text")]
    pub artificial: String,

    #[serde(default, skip_serializing_if = "HealthScore::is_missing")]
    pub health_score: HealthScore,

    #[serde(default, deserialize_with = "lenient_text")]
    pub health_tip: String,

    /// 上記以外のキー（出力時にそのまま戻す）
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Default for AnalysisResult {
    fn default() -> Self {
        Self {
            food_name: default_food_name(),
            ingredients: String::new(),
            artificial: String::new(),
            health_score: HealthScore::default(),
            health_tip: String::new(),
            extra: Map::new(),
        }
    }
}

/// JSONとして読めなかった場合の結果
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FallbackResult {
    pub food_name: String,
    pub ingredients: String,
    pub artificial: String,
    pub health_score: HealthScore,
    pub health_tip: String,
    /// モデルが返した生テキスト
    pub raw_response: String,
}

impl FallbackResult {
    pub fn from_raw(raw_response: impl Into<String>) -> Self {
        Self {
            food_name: UNKNOWN_FOOD.to_string(),
            ingredients: FALLBACK_INGREDIENTS.to_string(),
            artificial: FALLBACK_ARTIFICIAL.to_string(),
            health_score: HealthScore::new(FALLBACK_HEALTH_SCORE),
            health_tip: FALLBACK_HEALTH_TIP.to_string(),
            raw_response: raw_response.into(),
        }
    }
}

/// 解析結果（構造化 or フォールバック）
///
/// シリアライズ時はタグなしで、元の camelCase オブジェクトそのものになる。
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Analysis {
    Structured(AnalysisResult),
    Fallback(FallbackResult),
}

impl Analysis {
    pub fn is_fallback(&self) -> bool {
        matches!(self, Analysis::Fallback(_))
    }

    pub fn food_name(&self) -> &str {
        match self {
            Analysis::Structured(r) => &r.food_name,
            Analysis::Fallback(f) => &f.food_name,
        }
    }

    pub fn ingredients(&self) -> &str {
        match self {
            Analysis::Structured(r) => &r.ingredients,
            Analysis::Fallback(f) => &f.ingredients,
        }
    }

    pub fn artificial(&self) -> &str {
        match self {
            Analysis::Structured(r) => &r.artificial,
            Analysis::Fallback(f) => &f.artificial,
        }
    }

    pub fn health_score(&self) -> &HealthScore {
        match self {
            Analysis::Structured(r) => &r.health_score,
            Analysis::Fallback(f) => &f.health_score,
        }
    }

    pub fn health_tip(&self) -> &str {
        match self {
            Analysis::Structured(r) => &r.health_tip,
            Analysis::Fallback(f) => &f.health_tip,
        }
    }

    pub fn raw_response(&self) -> Option<&str> {
        match self {
            Analysis::Structured(_) => None,
            Analysis::Fallback(f) => Some(&f.raw_response),
        }
    }

    pub fn score_band(&self) -> Option<ScoreBand> {
        self.health_score().value().map(ScoreBand::from_score)
    }
}

fn default_food_name() -> String {
    UNKNOWN_FOOD.to_string()
}

fn lenient_food_name<'de, D: Deserializer<'de>>(deserializer: D) -> Result<String, D::Error> {
    let name = lenient_text(deserializer)?;
    if name.trim().is_empty() {
        Ok(default_food_name())
    } else {
        Ok(name)
    }
}

/// 文字列以外が来ても落とさずに文字列化する
fn lenient_text<'de, D: Deserializer<'de>>(deserializer: D) -> Result<String, D::Error> {
    let value = Value::deserialize(deserializer)?;
    Ok(value_to_text(&value))
}

fn value_to_text(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::String(s) => s.clone(),
        Value::Array(items) => items
            .iter()
            .map(value_to_text)
            .filter(|s| !s.is_empty())
            .collect::<Vec<_>>()
            .join(", "),
        other => other.to_string(),
    }
}
