//! エラー型定義

use thiserror::Error;

/// 共通エラー型
#[derive(Error, Debug)]
pub enum Error {
    #[error("Parse error: {0}")]
    Parse(String),

    #[error("Invalid image locator: {0}")]
    InvalidLocator(String),
}

/// Result型エイリアス
pub type Result<T> = std::result::Result<T, Error>;
