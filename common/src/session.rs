//! スキャンセッション
//!
//! 1回の「撮影 → 解析 → 表示」サイクルの状態を保持する。
//! 結果とエラーは同じ `Phase` の別バリアントなので、両方が同時に
//! セットされることはない。

use crate::locator::ImageLocator;

/// セッションのフェーズ
#[derive(Debug, Clone, Default, PartialEq)]
pub enum Phase<T> {
    /// 画像なし
    #[default]
    Idle,
    /// 画像あり、未送信
    Capturing,
    /// リクエスト中
    Analyzing,
    /// 解析完了
    Resolved(T),
    /// 失敗（ユーザー向けメッセージ）
    Failed(String),
}

/// 表示用ビュー
///
/// 表示側はエラー → ローディング → 結果の優先順で確認する。
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum SessionView<'a, T> {
    Error(&'a str),
    Loading,
    Result(&'a T),
    Empty,
}

/// 解析結果の型でパラメータ化されたスキャンセッション
#[derive(Debug, Clone, PartialEq)]
pub struct ScanSession<T> {
    image: Option<ImageLocator>,
    phase: Phase<T>,
}

impl<T> Default for ScanSession<T> {
    fn default() -> Self {
        Self {
            image: None,
            phase: Phase::Idle,
        }
    }
}

impl<T> ScanSession<T> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn image(&self) -> Option<&ImageLocator> {
        self.image.as_ref()
    }

    pub fn phase(&self) -> &Phase<T> {
        &self.phase
    }

    pub fn is_analyzing(&self) -> bool {
        matches!(self.phase, Phase::Analyzing)
    }

    pub fn result(&self) -> Option<&T> {
        match &self.phase {
            Phase::Resolved(result) => Some(result),
            _ => None,
        }
    }

    pub fn error(&self) -> Option<&str> {
        match &self.phase {
            Phase::Failed(message) => Some(message),
            _ => None,
        }
    }

    /// 画像をセット／クリア
    ///
    /// 新しい画像は新しいキャプチャの開始として扱い、前回の結果・エラーを破棄する。
    /// 解析の開始は呼び出し側の責任。
    pub fn set_image(&mut self, image: Option<ImageLocator>) {
        self.phase = if image.is_some() {
            Phase::Capturing
        } else {
            Phase::Idle
        };
        self.image = image;
    }

    pub fn set_analyzing(&mut self, analyzing: bool) {
        if analyzing {
            self.phase = Phase::Analyzing;
        } else if self.is_analyzing() {
            self.phase = self.pending_phase();
        }
    }

    pub fn set_result(&mut self, result: Option<T>) {
        match result {
            Some(result) => self.phase = Phase::Resolved(result),
            None => {
                if matches!(self.phase, Phase::Resolved(_)) {
                    self.phase = self.pending_phase();
                }
            }
        }
    }

    pub fn set_error(&mut self, error: Option<String>) {
        match error {
            Some(message) => self.phase = Phase::Failed(message),
            None => {
                if matches!(self.phase, Phase::Failed(_)) {
                    self.phase = self.pending_phase();
                }
            }
        }
    }

    /// すべてをIdleに戻す
    pub fn reset(&mut self) {
        self.image = None;
        self.phase = Phase::Idle;
    }

    pub fn view(&self) -> SessionView<'_, T> {
        if let Some(message) = self.error() {
            return SessionView::Error(message);
        }
        if self.is_analyzing() {
            return SessionView::Loading;
        }
        match self.result() {
            Some(result) => SessionView::Result(result),
            None => SessionView::Empty,
        }
    }

    // 結果もエラーもないときの戻り先
    fn pending_phase(&self) -> Phase<T> {
        if self.image.is_some() {
            Phase::Capturing
        } else {
            Phase::Idle
        }
    }
}
