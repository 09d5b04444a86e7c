//! 解析パイプライン結合テスト
//!
//! ローカルのTCPリスナーで推論エンドポイント（と画像配信）を模擬し、
//! encode → transmit → parse → セッション反映までを検証

use std::io::{Read, Write};
use std::net::{TcpListener, TcpStream};
use std::path::PathBuf;
use std::sync::{Arc, Mutex};
use std::thread;
use std::time::Duration;

use food_scan::analyzer::{self, encode_image, Analyzer, UrlSource};
use food_scan::config::Config;
use food_scan::error::{AnalysisError, USER_ERROR_MESSAGE};
use food_scan_common::{
    Analysis, AnalysisResult, FallbackResult, HealthScore, ImageLocator, Phase, ScanSession,
    SessionView, SYSTEM_PROMPT,
};
use serde_json::json;
use tempfile::{tempdir, TempDir};

// りんごのJPEGに見立てたバイト列
const APPLE_JPEG: &[u8] = &[0xFF, 0xD8, 0xFF, 0xE0, 0x00, 0x10, b'J', b'F', b'I', b'F', 0x00, 0xFF, 0xD9];

const APPLE_COMPLETION: &str = r#"{"foodName":"Apple","ingredients":"Apple","artificial":"None found!","healthScore":90,"healthTip":"Apples are great!"}"#;

// =============================================
// テスト用HTTPサーバー
// =============================================

struct MockResponse {
    status: u16,
    body: Vec<u8>,
    delay: Option<Duration>,
}

impl MockResponse {
    fn json(status: u16, body: serde_json::Value) -> Self {
        Self {
            status,
            body: body.to_string().into_bytes(),
            delay: None,
        }
    }

    fn completion(text: &str) -> Self {
        Self::json(200, json!({ "completion": text }))
    }

    fn raw(status: u16, body: &[u8]) -> Self {
        Self {
            status,
            body: body.to_vec(),
            delay: None,
        }
    }
}

struct CapturedRequest {
    request_line: String,
    body: Vec<u8>,
}

impl CapturedRequest {
    fn json(&self) -> serde_json::Value {
        serde_json::from_slice(&self.body).expect("リクエストボディがJSONではない")
    }
}

/// 応答を順番に返すサーバーを起動し、ベースURLを返す
fn spawn_server(responses: Vec<MockResponse>) -> (String, thread::JoinHandle<Vec<CapturedRequest>>) {
    std::env::set_var("NO_PROXY", "127.0.0.1,localhost");

    let listener = TcpListener::bind("127.0.0.1:0").expect("bind test server failed");
    let addr = listener.local_addr().expect("read local addr failed");

    let handle = thread::spawn(move || {
        let mut captured = Vec::new();
        for response in responses {
            let (mut stream, _) = listener.accept().expect("accept failed");
            captured.push(read_request(&mut stream));

            if let Some(delay) = response.delay {
                thread::sleep(delay);
            }

            let head = format!(
                "HTTP/1.1 {} Mock\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n",
                response.status,
                response.body.len()
            );
            // タイムアウト試験ではクライアントが先に切断している
            let _ = stream.write_all(head.as_bytes());
            let _ = stream.write_all(&response.body);
            let _ = stream.flush();
        }
        captured
    });

    (format!("http://127.0.0.1:{}", addr.port()), handle)
}

fn read_request(stream: &mut TcpStream) -> CapturedRequest {
    let mut buf = Vec::new();
    let mut chunk = [0u8; 8192];

    let header_end = loop {
        let n = stream.read(&mut chunk).expect("read failed");
        if n == 0 {
            break buf.len();
        }
        buf.extend_from_slice(&chunk[..n]);
        if let Some(pos) = buf.windows(4).position(|w| w == b"\r\n\r\n") {
            break pos + 4;
        }
    };

    let head = String::from_utf8_lossy(&buf[..header_end]).to_string();
    let content_length = head
        .lines()
        .filter_map(|line| line.split_once(':'))
        .find(|(name, _)| name.trim().eq_ignore_ascii_case("content-length"))
        .and_then(|(_, value)| value.trim().parse::<usize>().ok())
        .unwrap_or(0);

    while buf.len() < header_end + content_length {
        let n = stream.read(&mut chunk).expect("read body failed");
        if n == 0 {
            break;
        }
        buf.extend_from_slice(&chunk[..n]);
    }

    CapturedRequest {
        request_line: head.lines().next().unwrap_or_default().to_string(),
        body: buf[header_end..].to_vec(),
    }
}

fn config_for(base_url: &str) -> Config {
    Config {
        endpoint: format!("{}/text/llm/", base_url),
        timeout_seconds: 10,
    }
}

fn write_image(bytes: &[u8]) -> (TempDir, PathBuf) {
    let dir = tempdir().expect("Failed to create temp dir");
    let path = dir.path().join("apple.jpg");
    std::fs::write(&path, bytes).unwrap();
    (dir, path)
}

fn expected_apple() -> AnalysisResult {
    AnalysisResult {
        food_name: "Apple".to_string(),
        ingredients: "Apple".to_string(),
        artificial: "None found!".to_string(),
        health_score: HealthScore::new(90),
        health_tip: "Apples are great!".to_string(),
        ..Default::default()
    }
}

// =============================================
// analyze
// =============================================

/// 正しいJSONの completion はそのまま返る
#[tokio::test]
async fn test_analyze_apple_passthrough() {
    let (_dir, path) = write_image(APPLE_JPEG);
    let (base_url, server) = spawn_server(vec![MockResponse::completion(APPLE_COMPLETION)]);

    let analyzer = Analyzer::new(&config_for(&base_url)).unwrap();
    let analysis = analyzer.analyze(&ImageLocator::Path(path)).await.unwrap();

    assert_eq!(analysis, Analysis::Structured(expected_apple()));

    let requests = server.join().expect("server thread failed");
    assert_eq!(requests.len(), 1);
    assert!(requests[0].request_line.starts_with("POST /text/llm/"));
}

/// リクエストボディの形
#[tokio::test]
async fn test_analyze_request_body_shape() {
    let (_dir, path) = write_image(APPLE_JPEG);
    let (base_url, server) = spawn_server(vec![MockResponse::completion(APPLE_COMPLETION)]);

    let analyzer = Analyzer::new(&config_for(&base_url)).unwrap();
    analyzer.analyze(&ImageLocator::Path(path)).await.unwrap();

    let requests = server.join().expect("server thread failed");
    let body = requests[0].json();

    assert_eq!(
        body,
        json!({
            "messages": [
                { "role": "system", "content": SYSTEM_PROMPT },
                { "role": "user", "content": [
                    { "type": "text", "text": "What food is this and how healthy is it?" },
                    { "type": "image", "image": encode_image(APPLE_JPEG) }
                ]}
            ]
        })
    );
}

/// JSONでない completion はフォールバック
#[tokio::test]
async fn test_analyze_cookie_fallback() {
    let raw = "I think this is a cookie, score about 30.";
    let (_dir, path) = write_image(APPLE_JPEG);
    let (base_url, server) = spawn_server(vec![MockResponse::completion(raw)]);

    let analyzer = Analyzer::new(&config_for(&base_url)).unwrap();
    let analysis = analyzer.analyze(&ImageLocator::Path(path)).await.unwrap();
    server.join().expect("server thread failed");

    assert_eq!(analysis, Analysis::Fallback(FallbackResult::from_raw(raw)));

    let out = serde_json::to_value(&analysis).unwrap();
    assert_eq!(out["foodName"], json!("Unknown Food"));
    assert_eq!(out["ingredients"], json!("Could not identify ingredients"));
    assert_eq!(out["artificial"], json!("Unknown"));
    assert_eq!(out["healthScore"], json!("50"));
    assert_eq!(out["rawResponse"], json!(raw));
}

/// completion フィールドがない場合も空文字列でフォールバック
#[tokio::test]
async fn test_analyze_missing_completion_field() {
    let (_dir, path) = write_image(APPLE_JPEG);
    let (base_url, server) = spawn_server(vec![MockResponse::json(200, json!({ "text": "hi" }))]);

    let analyzer = Analyzer::new(&config_for(&base_url)).unwrap();
    let analysis = analyzer.analyze(&ImageLocator::Path(path)).await.unwrap();
    server.join().expect("server thread failed");

    assert!(analysis.is_fallback());
    assert_eq!(analysis.raw_response(), Some(""));
}

/// 非2xxは RemoteFailure
#[tokio::test]
async fn test_analyze_http_500() {
    let (_dir, path) = write_image(APPLE_JPEG);
    let (base_url, server) =
        spawn_server(vec![MockResponse::json(500, json!({ "error": "internal" }))]);

    let analyzer = Analyzer::new(&config_for(&base_url)).unwrap();
    let result = analyzer.analyze(&ImageLocator::Path(path)).await;
    server.join().expect("server thread failed");

    let err = result.unwrap_err();
    assert!(matches!(err, AnalysisError::RemoteFailure(500)));
    assert_eq!(err.status(), Some(500));
    assert_eq!(err.user_message(), USER_ERROR_MESSAGE);
}

/// ボディがJSONでない場合
#[tokio::test]
async fn test_analyze_invalid_response_body() {
    let (_dir, path) = write_image(APPLE_JPEG);
    let (base_url, server) = spawn_server(vec![MockResponse::raw(200, b"<html>oops</html>")]);

    let analyzer = Analyzer::new(&config_for(&base_url)).unwrap();
    let result = analyzer.analyze(&ImageLocator::Path(path)).await;
    server.join().expect("server thread failed");

    assert!(matches!(result, Err(AnalysisError::InvalidResponse(_))));
}

/// 画像が読めない場合はリクエストを送らない
#[tokio::test]
async fn test_analyze_missing_image() {
    let config = Config {
        endpoint: "http://127.0.0.1:1/text/llm/".into(),
        timeout_seconds: 5,
    };
    let analyzer = Analyzer::new(&config).unwrap();

    let result = analyzer
        .analyze(&ImageLocator::Path("/nonexistent/path/12345.jpg".into()))
        .await;

    let err = result.unwrap_err();
    assert!(matches!(err, AnalysisError::ImageReadFailed(_)));
    assert_eq!(err.user_message(), USER_ERROR_MESSAGE);
}

/// URLの画像も同じBase64になる
#[tokio::test]
async fn test_analyze_url_image_same_base64() {
    let (base_url, server) = spawn_server(vec![
        MockResponse::raw(200, APPLE_JPEG),
        MockResponse::completion(APPLE_COMPLETION),
    ]);

    let analyzer = Analyzer::new(&config_for(&base_url)).unwrap();
    let locator = ImageLocator::parse(&format!("{}/photos/apple.jpg", base_url)).unwrap();
    let analysis = analyzer.analyze(&locator).await.unwrap();

    assert_eq!(analysis, Analysis::Structured(expected_apple()));

    let requests = server.join().expect("server thread failed");
    assert_eq!(requests.len(), 2);
    assert!(requests[0].request_line.starts_with("GET /photos/apple.jpg"));

    let body = requests[1].json();
    assert_eq!(body["messages"][1]["content"][1]["image"], json!(encode_image(APPLE_JPEG)));
}

/// 画像URLが404なら ImageReadFailed
#[tokio::test]
async fn test_analyze_url_image_not_found() {
    let (base_url, server) = spawn_server(vec![MockResponse::raw(404, b"not found")]);

    let analyzer = Analyzer::new(&config_for(&base_url)).unwrap();
    let locator = ImageLocator::parse(&format!("{}/missing.jpg", base_url)).unwrap();
    let result = analyzer.analyze(&locator).await;

    let requests = server.join().expect("server thread failed");
    assert_eq!(requests.len(), 1);
    assert!(matches!(result, Err(AnalysisError::ImageReadFailed(_))));
}

/// data: URLはネットワークを使わずに送信される
#[tokio::test]
async fn test_analyze_data_url() {
    let (base_url, server) = spawn_server(vec![MockResponse::completion(APPLE_COMPLETION)]);

    let analyzer = Analyzer::new(&config_for(&base_url)).unwrap();
    let data_url = format!("data:image/jpeg;base64,{}", encode_image(APPLE_JPEG));
    let analysis = analyzer.analyze(&ImageLocator::parse(&data_url).unwrap()).await.unwrap();

    let requests = server.join().expect("server thread failed");
    assert_eq!(requests.len(), 1);
    assert_eq!(analysis.food_name(), "Apple");
    assert_eq!(
        requests[0].json()["messages"][1]["content"][1]["image"],
        json!(encode_image(APPLE_JPEG))
    );
}

/// 応答が遅い場合はタイムアウト
#[tokio::test]
async fn test_analyze_timeout() {
    let (_dir, path) = write_image(APPLE_JPEG);
    let mut slow = MockResponse::completion(APPLE_COMPLETION);
    slow.delay = Some(Duration::from_millis(2500));
    let (base_url, server) = spawn_server(vec![slow]);

    let config = Config {
        timeout_seconds: 1,
        ..config_for(&base_url)
    };
    let analyzer = Analyzer::new(&config).unwrap();
    let result = analyzer.analyze(&ImageLocator::Path(path)).await;
    server.join().expect("server thread failed");

    assert!(matches!(result, Err(AnalysisError::Timeout)));
}

/// 画像ソースと共有したクライアントは画像取得にもタイムアウトを適用する
#[tokio::test]
async fn test_with_source_shares_client_timeout() {
    let mut slow_image = MockResponse::raw(200, APPLE_JPEG);
    slow_image.delay = Some(Duration::from_millis(2500));
    let (base_url, server) = spawn_server(vec![slow_image]);

    let config = Config {
        timeout_seconds: 1,
        ..config_for(&base_url)
    };
    let client = analyzer::build_client(&config).unwrap();
    let pipeline = Analyzer::with_source(client.clone(), &config, UrlSource::new(client));

    let locator = ImageLocator::parse(&format!("{}/photos/apple.jpg", base_url)).unwrap();
    let result = pipeline.analyze(&locator).await;

    let requests = server.join().expect("server thread failed");
    assert_eq!(requests.len(), 1);
    assert!(matches!(result, Err(AnalysisError::ImageReadFailed(_))));
}

/// 接続できない場合は Transport
#[tokio::test]
async fn test_analyze_connection_refused() {
    std::env::set_var("NO_PROXY", "127.0.0.1,localhost");
    let port = {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        listener.local_addr().unwrap().port()
    };
    let (_dir, path) = write_image(APPLE_JPEG);

    let analyzer = Analyzer::new(&config_for(&format!("http://127.0.0.1:{}", port))).unwrap();
    let result = analyzer.analyze(&ImageLocator::Path(path)).await;

    assert!(matches!(result, Err(AnalysisError::Transport(_))));
}

// =============================================
// scan（セッション反映）
// =============================================

#[tokio::test]
async fn test_scan_resolves_session() {
    let (_dir, path) = write_image(APPLE_JPEG);
    let (base_url, server) = spawn_server(vec![MockResponse::completion(APPLE_COMPLETION)]);

    let analyzer = Analyzer::new(&config_for(&base_url)).unwrap();
    let mut session: ScanSession<Analysis> = ScanSession::new();
    let locator = ImageLocator::Path(path);

    analyzer::scan(&analyzer, &mut session, locator.clone()).await;
    server.join().expect("server thread failed");

    assert_eq!(session.image(), Some(&locator));
    assert!(!session.is_analyzing());
    assert!(session.error().is_none());
    assert_eq!(session.view(), SessionView::Result(&Analysis::Structured(expected_apple())));
}

#[tokio::test]
async fn test_scan_http_500_sets_error() {
    let (_dir, path) = write_image(APPLE_JPEG);
    let (base_url, server) = spawn_server(vec![MockResponse::json(500, json!({}))]);

    let analyzer = Analyzer::new(&config_for(&base_url)).unwrap();
    let mut session: ScanSession<Analysis> = ScanSession::new();

    analyzer::scan(&analyzer, &mut session, ImageLocator::Path(path)).await;
    server.join().expect("server thread failed");

    assert_eq!(session.phase(), &Phase::Failed(USER_ERROR_MESSAGE.to_string()));
    assert!(!session.is_analyzing());
    assert!(session.result().is_none());
}

#[tokio::test]
async fn test_scan_missing_image_hides_detail() {
    let config = Config {
        endpoint: "http://127.0.0.1:1/text/llm/".into(),
        timeout_seconds: 5,
    };
    let analyzer = Analyzer::new(&config).unwrap();
    let mut session: ScanSession<Analysis> = ScanSession::new();

    analyzer::scan(
        &analyzer,
        &mut session,
        ImageLocator::Path("/nonexistent/secret-dir/photo.jpg".into()),
    )
    .await;

    let message = session.error().expect("エラーがセットされていない");
    assert_eq!(message, USER_ERROR_MESSAGE);
    assert!(!message.contains("secret-dir"));
    assert!(!session.is_analyzing());
}

#[derive(Clone, Default)]
struct LogBuffer(Arc<Mutex<Vec<u8>>>);

impl Write for LogBuffer {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        self.0.lock().expect("log buffer poisoned").extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> std::io::Result<()> {
        Ok(())
    }
}

impl LogBuffer {
    fn contents(&self) -> String {
        String::from_utf8_lossy(&self.0.lock().expect("log buffer poisoned")).to_string()
    }
}

/// 1回の失敗で出る error ログは1行だけ
#[tokio::test]
async fn test_scan_failure_logged_once() {
    let logs = LogBuffer::default();
    let writer = logs.clone();
    let subscriber = tracing_subscriber::fmt()
        .with_writer(move || writer.clone())
        .with_ansi(false)
        .with_max_level(tracing::Level::DEBUG)
        .finish();
    let _guard = tracing::subscriber::set_default(subscriber);

    let (_dir, path) = write_image(APPLE_JPEG);
    let (base_url, server) = spawn_server(vec![MockResponse::json(500, json!({}))]);

    let pipeline = Analyzer::new(&config_for(&base_url)).unwrap();
    let mut session: ScanSession<Analysis> = ScanSession::new();
    analyzer::scan(&pipeline, &mut session, ImageLocator::Path(path)).await;
    server.join().expect("server thread failed");

    let output = logs.contents();
    let error_lines: Vec<&str> = output.lines().filter(|line| line.contains(" ERROR ")).collect();
    assert_eq!(error_lines.len(), 1, "ログ: {}", output);
    assert!(error_lines[0].contains("analysis failed"));
    assert!(output.contains("inference endpoint error"));
}

/// 失敗後にリセットして再スキャンできる
#[tokio::test]
async fn test_scan_again_after_reset() {
    let (_dir, path) = write_image(APPLE_JPEG);
    let (base_url, server) = spawn_server(vec![
        MockResponse::json(500, json!({})),
        MockResponse::completion(APPLE_COMPLETION),
    ]);

    let analyzer = Analyzer::new(&config_for(&base_url)).unwrap();
    let mut session: ScanSession<Analysis> = ScanSession::new();
    let locator = ImageLocator::Path(path);

    analyzer::scan(&analyzer, &mut session, locator.clone()).await;
    assert!(session.error().is_some());

    session.reset();
    session.reset();
    assert_eq!(session, ScanSession::new());

    analyzer::scan(&analyzer, &mut session, locator).await;
    server.join().expect("server thread failed");

    assert!(session.error().is_none());
    assert_eq!(session.result().map(|a| a.food_name()), Some("Apple"));
}
