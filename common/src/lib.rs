//! Food Scan Common Library
//!
//! CLIと共有される型とユーティリティ（ネットワーク・ファイルIOなし）

pub mod error;
pub mod locator;
pub mod parser;
pub mod prompts;
pub mod request;
pub mod score;
pub mod session;
pub mod types;

pub use error::{Error, Result};
pub use locator::{data_url_payload, ImageLocator};
pub use parser::{parse_completion, parse_structured};
pub use prompts::{SYSTEM_PROMPT, USER_PROMPT};
pub use request::{ChatRequest, CompletionResponse, ContentPart, Message};
pub use score::ScoreBand;
pub use session::{Phase, ScanSession, SessionView};
pub use types::{Analysis, AnalysisResult, FallbackResult, HealthScore};
