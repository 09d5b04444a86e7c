use thiserror::Error;

/// 画面に出す唯一のエラーメッセージ
pub const USER_ERROR_MESSAGE: &str = "Could not check your food. Please try again!";

/// 解析パイプラインのエラー
///
/// Display は運用者向けの詳細。ユーザーには [`AnalysisError::user_message`] のみを見せる。
#[derive(Error, Debug)]
pub enum AnalysisError {
    #[error("画像読み込みエラー: {0}")]
    ImageReadFailed(String),

    #[error("API request failed with status {0}")]
    RemoteFailure(u16),

    #[error("API呼び出しエラー: {0}")]
    Transport(String),

    #[error("APIリクエストがタイムアウトしました")]
    Timeout,

    #[error("APIレスポンスのパースに失敗: {0}")]
    InvalidResponse(String),
}

impl AnalysisError {
    pub fn user_message(&self) -> &'static str {
        USER_ERROR_MESSAGE
    }

    pub fn status(&self) -> Option<u16> {
        match self {
            AnalysisError::RemoteFailure(status) => Some(*status),
            _ => None,
        }
    }
}

#[derive(Error, Debug)]
pub enum FoodScanError {
    #[error("設定エラー: {0}")]
    Config(String),

    #[error("JSON解析エラー: {0}")]
    JsonParse(#[from] serde_json::Error),

    #[error("IOエラー: {0}")]
    Io(#[from] std::io::Error),

    #[error("CLI実行エラー: {0}")]
    Cli(String),

    #[error(transparent)]
    Analysis(#[from] AnalysisError),
}

pub type Result<T> = std::result::Result<T, FoodScanError>;
