//! Vision client tests against a local HTTP stub.

use std::time::Duration;

use game_assist_core::codec::{encode, ImageFormat};
use game_assist_core::{
    AuthMode, EncodedImage, Error, ProviderConfig, ProviderKind, VisionAnalyzer, VisionClient,
};
use image::{Rgba, RgbaImage};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpListener;
use tokio::task::JoinHandle;

/// One captured HTTP request.
struct Captured {
    head: String,
    body: serde_json::Value,
}

impl Captured {
    fn header(&self, name: &str) -> Option<String> {
        let prefix = format!("{}:", name.to_lowercase());
        self.head
            .lines()
            .find(|line| line.to_lowercase().starts_with(&prefix))
            .map(|line| line[prefix.len()..].trim().to_string())
    }
}

/// Serve exactly one request with `status` and `body`.
async fn serve_once(status: u16, body: &'static str) -> (String, JoinHandle<Captured>) {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let url = format!("http://{}/v1/chat/completions", listener.local_addr().unwrap());

    let task = tokio::spawn(async move {
        let (mut socket, _) = listener.accept().await.unwrap();
        let mut buf = Vec::new();
        let mut chunk = [0u8; 4096];

        let header_end = loop {
            let n = socket.read(&mut chunk).await.unwrap();
            buf.extend_from_slice(&chunk[..n]);
            if let Some(pos) = buf.windows(4).position(|w| w == b"\r\n\r\n") {
                break pos + 4;
            }
        };

        let head = String::from_utf8_lossy(&buf[..header_end]).to_string();
        let content_length = head
            .lines()
            .find_map(|line| {
                let lower = line.to_lowercase();
                lower
                    .strip_prefix("content-length:")
                    .map(|v| v.trim().parse::<usize>().unwrap())
            })
            .unwrap_or(0);

        while buf.len() < header_end + content_length {
            let n = socket.read(&mut chunk).await.unwrap();
            buf.extend_from_slice(&chunk[..n]);
        }

        let response = format!(
            "HTTP/1.1 {} Stub\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
            status,
            body.len(),
            body
        );
        socket.write_all(response.as_bytes()).await.unwrap();
        socket.shutdown().await.ok();

        Captured {
            head,
            body: serde_json::from_slice(&buf[header_end..header_end + content_length]).unwrap(),
        }
    });

    (url, task)
}

fn provider(kind: ProviderKind, key: &str, endpoint: &str) -> ProviderConfig {
    ProviderConfig {
        kind,
        api_key: key.to_string(),
        endpoint: endpoint.to_string(),
        model: kind.default_model().to_string(),
        max_tokens: 500,
        temperature: 0.7,
        auth_mode: kind.default_auth_mode(),
        system_instruction: "Answer in Chinese.".to_string(),
    }
}

fn screenshot() -> EncodedImage {
    let img = RgbaImage::from_pixel(16, 16, Rgba([0, 128, 255, 255]));
    encode(&img, ImageFormat::Png, false, 85, 500).unwrap()
}

fn client() -> VisionClient {
    VisionClient::new(Duration::from_secs(5)).unwrap()
}

#[tokio::test]
async fn test_openai_round_trip() {
    let (url, server) = serve_once(
        200,
        r#"{"choices":[{"message":{"role":"assistant","content":"Pull the big camp."}}]}"#,
    )
    .await;
    let cfg = provider(ProviderKind::OpenAi, "sk-123", &url);

    let text = client().analyze(&cfg, &screenshot(), "Advise me").await.unwrap();
    assert_eq!(text.as_deref(), Some("Pull the big camp."));

    let captured = server.await.unwrap();
    assert!(captured.head.starts_with("POST /v1/chat/completions"));
    assert_eq!(captured.header("authorization").as_deref(), Some("Bearer sk-123"));
    assert_eq!(captured.body["model"], "gpt-4o");
    assert_eq!(captured.body["messages"][0]["content"], "Answer in Chinese.");
    assert_eq!(captured.body["messages"][1]["content"][0]["text"], "Advise me");
    let url = captured.body["messages"][1]["content"][1]["image_url"]["url"]
        .as_str()
        .unwrap();
    assert!(url.starts_with("data:image/png;base64,"));
}

#[tokio::test]
async fn test_zhipu_sends_signed_token() {
    let (url, server) =
        serve_once(200, r#"{"choices":[{"message":{"content":"Defend high ground."}}]}"#).await;
    let cfg = provider(ProviderKind::ZhipuAi, "myid.mysecret", &url);
    assert_eq!(cfg.auth_mode, AuthMode::SignedToken);

    let text = client().analyze(&cfg, &screenshot(), "Advise").await.unwrap();
    assert_eq!(text.as_deref(), Some("Defend high ground."));

    let captured = server.await.unwrap();
    let auth = captured.header("authorization").unwrap();
    let token = auth.strip_prefix("Bearer ").unwrap();
    assert_eq!(token.split('.').count(), 3);
    assert_ne!(token, "myid.mysecret");
    assert_eq!(captured.header("accept").as_deref(), Some("application/json"));
    assert_eq!(captured.body["stream"], false);
    assert_eq!(
        captured.body["messages"][1]["content"][1]["image_url"]["detail"],
        "high"
    );
}

#[tokio::test]
async fn test_non_success_body_is_verbatim() {
    let (url, _server) = serve_once(401, r#"{"error":{"message":"Incorrect API key"}}"#).await;
    let cfg = provider(ProviderKind::Doubao, "ark-key", &url);

    let err = client().analyze(&cfg, &screenshot(), "Advise").await.unwrap_err();
    match err {
        Error::Api { status, body } => {
            assert_eq!(status, 401);
            assert_eq!(body, r#"{"error":{"message":"Incorrect API key"}}"#);
        }
        other => panic!("expected Api error, got {other:?}"),
    }
}

#[tokio::test]
async fn test_malformed_body_is_parse_error() {
    let (url, _server) = serve_once(200, "<html>gateway</html>").await;
    let cfg = provider(ProviderKind::OpenAi, "sk-123", &url);

    let err = client().analyze(&cfg, &screenshot(), "Advise").await.unwrap_err();
    assert!(matches!(err, Error::Parse(_)));
}

#[tokio::test]
async fn test_no_choices_is_none() {
    let (url, _server) = serve_once(200, r#"{"choices":[]}"#).await;
    let cfg = provider(ProviderKind::OpenAi, "sk-123", &url);

    let text = client().analyze(&cfg, &screenshot(), "Advise").await.unwrap();
    assert_eq!(text, None);
}

#[tokio::test]
async fn test_configuration_errors_skip_network() {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let url = format!("http://{}/", listener.local_addr().unwrap());

    let blank = provider(ProviderKind::OpenAi, "", &url);
    let err = client().analyze(&blank, &screenshot(), "x").await.unwrap_err();
    assert!(err.is_configuration());

    let malformed = provider(ProviderKind::ZhipuAi, "no-dot-here", &url);
    let err = client().analyze(&malformed, &screenshot(), "x").await.unwrap_err();
    assert!(err.is_configuration());

    let accepted = tokio::time::timeout(Duration::from_millis(100), listener.accept()).await;
    assert!(accepted.is_err(), "no connection should have been made");
}

#[tokio::test]
async fn test_timeout_is_transport_error() {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let url = format!("http://{}/", listener.local_addr().unwrap());
    let _silent = tokio::spawn(async move {
        let (_socket, _) = listener.accept().await.unwrap();
        tokio::time::sleep(Duration::from_secs(30)).await;
    });

    let client = VisionClient::new(Duration::from_millis(200)).unwrap();
    let cfg = provider(ProviderKind::OpenAi, "sk-123", &url);
    let err = client.analyze(&cfg, &screenshot(), "x").await.unwrap_err();
    assert!(matches!(err, Error::Transport(_)));
}
