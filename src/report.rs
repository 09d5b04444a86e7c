//! ターミナル表示
//!
//! セッションのビュー（エラー → 解析中 → 結果）を文字列に描画する。

use serde_json::json;

use food_scan_common::{Analysis, ScanSession, SessionView};

pub const LOADING_TEXT: &str = "Checking your food...";
pub const EMPTY_TEXT: &str = "Take a picture of your food to see how healthy it is!";

pub fn render(session: &ScanSession<Analysis>) -> String {
    match session.view() {
        SessionView::Error(message) => format!("❌ Error\n{}\n", message),
        SessionView::Loading => format!("{}\n", LOADING_TEXT),
        SessionView::Result(analysis) => render_analysis(analysis),
        SessionView::Empty => format!("{}\n", EMPTY_TEXT),
    }
}

/// `--json` 用の描画
///
/// 結果は解析結果のJSON、失敗は `{"error": "..."}`、それ以外は `null`。
pub fn render_json(session: &ScanSession<Analysis>) -> serde_json::Result<String> {
    match session.view() {
        SessionView::Error(message) => serde_json::to_string_pretty(&json!({ "error": message })),
        SessionView::Result(analysis) => serde_json::to_string_pretty(analysis),
        SessionView::Loading | SessionView::Empty => Ok("null".to_string()),
    }
}

pub fn render_analysis(analysis: &Analysis) -> String {
    let mut out = String::new();

    out.push_str(&format!("🍽  {}\n", analysis.food_name()));

    if let Some(score) = analysis.health_score().value() {
        let band = analysis
            .score_band()
            .map(|b| b.label())
            .unwrap_or_default();
        out.push_str(&format!("Health Score: {} ({})\n", score, band));
    }

    push_section(&mut out, "What's inside", analysis.ingredients());
    push_section(&mut out, "Artificial stuff", analysis.artificial());
    push_section(&mut out, "Health tip", analysis.health_tip());

    if analysis.is_fallback() {
        out.push_str("\n(The answer could not be read clearly.)\n");
    }

    out
}

fn push_section(out: &mut String, title: &str, body: &str) {
    if body.trim().is_empty() {
        return;
    }
    out.push_str(&format!("\n{}:\n  {}\n", title, body));
}
