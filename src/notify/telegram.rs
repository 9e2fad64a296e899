use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use std::time::Duration;
use tracing::{debug, info};

use super::Notifier;

/// Envelope every Bot API method answers with.
#[derive(Debug, Deserialize)]
struct TelegramResponse {
    ok: bool,
    #[serde(default)]
    description: Option<String>,
}

/// Minimal Telegram Bot API client that posts MarkdownV2 messages to one chat.
#[derive(Clone)]
pub struct TelegramClient {
    http: Client,
    api_url: String,
    token: String,
    chat_id: String,
}

impl TelegramClient {
    pub fn new(api_url: &str, token: &str, chat_id: &str, timeout: Duration) -> Result<Self> {
        let http = Client::builder()
            .timeout(timeout)
            .build()
            .context("Failed to build HTTP client")?;
        Ok(TelegramClient {
            http,
            api_url: api_url.trim_end_matches('/').to_string(),
            token: token.to_string(),
            chat_id: chat_id.to_string(),
        })
    }

    fn method_url(&self, method: &str) -> String {
        format!("{}/bot{}/{}", self.api_url, self.token, method)
    }
}

#[async_trait]
impl Notifier for TelegramClient {
    fn name(&self) -> &str {
        "telegram"
    }

    async fn send(&self, text: &str) -> Result<()> {
        debug!(
            "Sending {} chars to Telegram chat {}",
            text.chars().count(),
            self.chat_id
        );

        let body = serde_json::json!({
            "chat_id": self.chat_id,
            "text": text,
            "parse_mode": "MarkdownV2",
            "disable_web_page_preview": true,
        });

        // The URL embeds the bot token, so strip it from transport errors.
        let resp = self
            .http
            .post(self.method_url("sendMessage"))
            .json(&body)
            .send()
            .await
            .map_err(|e| anyhow::anyhow!("Telegram request failed: {}", e.without_url()))?;

        let status = resp.status();
        let raw = resp
            .text()
            .await
            .map_err(|e| anyhow::anyhow!("Failed to read Telegram response: {}", e.without_url()))?;
        let parsed: Option<TelegramResponse> = serde_json::from_str(&raw).ok();

        if !status.is_success() {
            let reason = parsed.and_then(|r| r.description).unwrap_or(raw);
            anyhow::bail!("Telegram API error {}: {}", status, reason);
        }

        match parsed {
            Some(r) if r.ok => {
                info!("Message delivered to Telegram chat {}", self.chat_id);
                Ok(())
            }
            Some(r) => anyhow::bail!(
                "Telegram rejected message: {}",
                r.description.unwrap_or_else(|| "no description".into())
            ),
            None => anyhow::bail!("Unexpected Telegram response: {}", raw),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpListener;
    use tokio::sync::oneshot;

    struct CapturedRequest {
        head: String,
        body: String,
    }

    /// Accept one request, reply with the canned response and hand back what
    /// the client sent.
    async fn serve_once(
        status_line: &'static str,
        reply: &'static str,
    ) -> (String, oneshot::Receiver<CapturedRequest>) {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let (tx, rx) = oneshot::channel();

        tokio::spawn(async move {
            let (mut socket, _) = listener.accept().await.unwrap();
            let mut read = Vec::new();
            let mut buf = vec![0u8; 4096];
            let head_end = loop {
                let n = socket.read(&mut buf).await.unwrap();
                read.extend_from_slice(&buf[..n]);
                if let Some(pos) = read.windows(4).position(|w| w == b"\r\n\r\n") {
                    break pos + 4;
                }
                if n == 0 {
                    break read.len();
                }
            };
            let head = String::from_utf8_lossy(&read[..head_end]).to_string();
            let content_length = head
                .lines()
                .find_map(|l| {
                    let (k, v) = l.split_once(':')?;
                    k.eq_ignore_ascii_case("content-length")
                        .then(|| v.trim().parse::<usize>().ok())
                        .flatten()
                })
                .unwrap_or(0);
            while read.len() < head_end + content_length {
                let n = socket.read(&mut buf).await.unwrap();
                if n == 0 {
                    break;
                }
                read.extend_from_slice(&buf[..n]);
            }
            let body = String::from_utf8_lossy(&read[head_end..]).to_string();

            let response = format!(
                "HTTP/1.1 {}\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
                status_line,
                reply.len(),
                reply
            );
            socket.write_all(response.as_bytes()).await.unwrap();
            socket.shutdown().await.ok();
            let _ = tx.send(CapturedRequest { head, body });
        });

        (format!("http://{}", addr), rx)
    }

    fn client(api_url: &str) -> TelegramClient {
        TelegramClient::new(api_url, "123:abc", "-100200", Duration::from_secs(5)).unwrap()
    }

    #[tokio::test]
    async fn test_send_posts_markdown_v2_message() {
        let (url, rx) = serve_once("200 OK", r#"{"ok":true,"result":{}}"#).await;
        client(&url).send("*Nanox* is playing now\\.").await.unwrap();

        let req = rx.await.unwrap();
        assert!(req.head.starts_with("POST /bot123:abc/sendMessage "));
        let body: serde_json::Value = serde_json::from_str(&req.body).unwrap();
        assert_eq!(body["chat_id"], "-100200");
        assert_eq!(body["text"], "*Nanox* is playing now\\.");
        assert_eq!(body["parse_mode"], "MarkdownV2");
    }

    #[tokio::test]
    async fn test_send_surfaces_api_description() {
        let (url, _rx) = serve_once(
            "400 Bad Request",
            r#"{"ok":false,"error_code":400,"description":"Bad Request: can't parse entities"}"#,
        )
        .await;
        let err = client(&url).send("broken *markup").await.unwrap_err();
        assert!(err.to_string().contains("can't parse entities"));
    }

    #[tokio::test]
    async fn test_send_rejects_ok_false() {
        let (url, _rx) = serve_once("200 OK", r#"{"ok":false,"description":"chat not found"}"#).await;
        let err = client(&url).send("hi").await.unwrap_err();
        assert!(err.to_string().contains("chat not found"));
    }

    #[tokio::test]
    async fn test_transport_error_hides_token() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);

        let err = client(&format!("http://{}", addr)).send("hi").await.unwrap_err();
        assert!(!err.to_string().contains("123:abc"));
    }

    #[test]
    fn test_method_url_trims_trailing_slash() {
        let c = client("https://api.telegram.org/");
        assert_eq!(
            c.method_url("sendMessage"),
            "https://api.telegram.org/bot123:abc/sendMessage"
        );
    }
}
