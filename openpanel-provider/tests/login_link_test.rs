//! Login link over a loopback server
//!
//! Exercises the production transport end to end: login through reqwest,
//! then the `CONNECT` RPC through the raw HTTP/1.1 path.

use std::sync::{Arc, Mutex};

use openpanel_provider::{ApiClient, HttpMethod, ResponseBody, ServerConnection};
use serde_json::json;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};

/// Read one request (head plus `Content-Length` body) and return its head.
async fn read_request(socket: &mut TcpStream) -> String {
    let mut raw = Vec::new();
    let mut buf = [0u8; 1024];
    let head_end = loop {
        let n = socket.read(&mut buf).await.unwrap();
        assert!(n > 0, "client closed before sending a full request");
        raw.extend_from_slice(&buf[..n]);
        if let Some(pos) = raw.windows(4).position(|w| w == b"\r\n\r\n") {
            break pos + 4;
        }
    };

    let head = String::from_utf8_lossy(&raw[..head_end]).into_owned();
    let content_length = head
        .lines()
        .filter_map(|line| line.split_once(':'))
        .find(|(name, _)| name.eq_ignore_ascii_case("content-length"))
        .and_then(|(_, value)| value.trim().parse::<usize>().ok())
        .unwrap_or(0);
    while raw.len() < head_end + content_length {
        let n = socket.read(&mut buf).await.unwrap();
        assert!(n > 0, "client closed mid-body");
        raw.extend_from_slice(&buf[..n]);
    }
    head
}

async fn reply(socket: &mut TcpStream, body: &str) {
    let response = format!(
        "HTTP/1.1 200 OK\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{body}",
        body.len()
    );
    socket.write_all(response.as_bytes()).await.unwrap();
    socket.shutdown().await.unwrap();
}

#[tokio::test]
async fn test_login_link_reaches_panel_path() {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let port = listener.local_addr().unwrap().port();
    let request_lines = Arc::new(Mutex::new(Vec::new()));

    let seen = request_lines.clone();
    let server = tokio::spawn(async move {
        for body in [
            json!({"access_token": "abc"}).to_string(),
            json!({"link": "https://x/login"}).to_string(),
        ] {
            let (mut socket, _) = listener.accept().await.unwrap();
            let head = read_request(&mut socket).await;
            let first = head.lines().next().unwrap_or_default().to_string();
            seen.lock().unwrap().push((first, head));
            reply(&mut socket, &body).await;
        }
    });

    let connection = ServerConnection::new("127.0.0.1", "admin", "pw")
        .with_tls(false)
        .with_port(port);
    let client = ApiClient::new(connection).expect("创建测试客户端失败");

    let response = client
        .call(HttpMethod::Connect, "users/bob", None)
        .await
        .expect("CONNECT 调用失败");
    server.await.unwrap();

    assert_eq!(response.status, 200);
    assert_eq!(
        response.body,
        ResponseBody::Json(json!({"link": "https://x/login"}))
    );
    assert_eq!(
        response.body.text_field("link").as_deref(),
        Some("https://x/login")
    );

    let seen = request_lines.lock().unwrap();
    assert_eq!(seen[0].0, "POST /api/ HTTP/1.1");
    assert_eq!(seen[1].0, "CONNECT /api/users/bob HTTP/1.1");
    assert!(
        seen[1]
            .1
            .lines()
            .any(|line| line.eq_ignore_ascii_case("authorization: bearer abc")),
        "missing bearer header: {}",
        seen[1].1
    );
}
