//! 健康スコアの区分

use serde::Serialize;

/// スコア帯（表示用ラベル）
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum ScoreBand {
    /// 80以上
    SuperHealthy,
    /// 60-79
    Healthy,
    /// 40-59
    OkSometimes,
    /// 40未満
    NotSoHealthy,
}

impl ScoreBand {
    pub fn from_score(score: i64) -> Self {
        match score {
            s if s >= 80 => ScoreBand::SuperHealthy,
            s if s >= 60 => ScoreBand::Healthy,
            s if s >= 40 => ScoreBand::OkSometimes,
            _ => ScoreBand::NotSoHealthy,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            ScoreBand::SuperHealthy => "Super Healthy!",
            ScoreBand::Healthy => "Healthy!",
            ScoreBand::OkSometimes => "OK Sometimes",
            ScoreBand::NotSoHealthy => "Not So Healthy",
        }
    }
}

impl std::fmt::Display for ScoreBand {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}
