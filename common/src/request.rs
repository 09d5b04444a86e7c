//! 推論エンドポイントのワイヤ型
//!
//! リクエスト: `{ "messages": [system, user] }`
//! レスポンス: `{ "completion": "<モデルの生テキスト>" }`

use serde::{Deserialize, Serialize};

use crate::prompts::{SYSTEM_PROMPT, USER_PROMPT};

/// チャット形式のリクエスト
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChatRequest {
    pub messages: Vec<Message>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "role", rename_all = "lowercase")]
pub enum Message {
    System { content: String },
    User { content: Vec<ContentPart> },
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum ContentPart {
    Text { text: String },
    Image { image: String },
}

/// エンドポイントのレスポンス
///
/// completion が欠落している場合は空文字列として扱う（→ フォールバック）。
#[derive(Debug, Clone, Default, Deserialize)]
pub struct CompletionResponse {
    #[serde(default)]
    pub completion: String,
}

impl ChatRequest {
    /// Base64画像から解析リクエストを組み立てる
    pub fn for_image(base64_image: impl Into<String>) -> Self {
        Self {
            messages: vec![
                Message::System {
                    content: SYSTEM_PROMPT.to_string(),
                },
                Message::User {
                    content: vec![
                        ContentPart::Text {
                            text: USER_PROMPT.to_string(),
                        },
                        ContentPart::Image {
                            image: base64_image.into(),
                        },
                    ],
                },
            ],
        }
    }
}
