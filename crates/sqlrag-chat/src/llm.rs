//! Language-model collaborator.
//!
//! `LanguageModel` is the seam the pipeline steps call through; tests plug in
//! scripted fakes. `OpenAiCompatibleClient` talks to any chat-completions
//! endpoint.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use sqlrag_core::config::LlmConfig;
use sqlrag_core::Message;

use crate::error::LlmError;

/// A chat model: role-tagged messages in, one reply text out.
#[async_trait]
pub trait LanguageModel: Send + Sync {
    async fn invoke(&self, messages: &[Message]) -> Result<String, LlmError>;

    fn name(&self) -> &str;
}

#[derive(Debug, Serialize)]
struct ChatCompletionRequest<'a> {
    model: &'a str,
    messages: &'a [Message],
    temperature: f32,
}

#[derive(Debug, Deserialize)]
struct ChatCompletionResponse {
    choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: ChoiceMessage,
}

#[derive(Debug, Deserialize)]
struct ChoiceMessage {
    content: Option<String>,
}

/// HTTP client for OpenAI-compatible `/chat/completions` endpoints.
///
/// One request per call, bounded by the configured timeout.
#[derive(Debug, Clone)]
pub struct OpenAiCompatibleClient {
    client: reqwest::Client,
    endpoint: String,
    model: String,
    api_key: Option<String>,
    temperature: f32,
}

impl OpenAiCompatibleClient {
    pub fn new(config: &LlmConfig) -> Result<Self, LlmError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;

        Ok(Self {
            client,
            endpoint: format!("{}/chat/completions", config.base_url.trim_end_matches('/')),
            model: config.model.clone(),
            api_key: config.resolve_api_key(),
            temperature: config.temperature,
        })
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

#[async_trait]
impl LanguageModel for OpenAiCompatibleClient {
    async fn invoke(&self, messages: &[Message]) -> Result<String, LlmError> {
        let body = ChatCompletionRequest {
            model: &self.model,
            messages,
            temperature: self.temperature,
        };

        let mut request = self.client.post(&self.endpoint).json(&body);
        if let Some(ref key) = self.api_key {
            request = request.bearer_auth(key);
        }

        debug!(model = %self.model, messages = messages.len(), "Invoking language model");
        let response = request.send().await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(LlmError::Status {
                status: status.as_u16(),
                body,
            });
        }

        let text = response.text().await?;
        parse_completion(&text)
    }

    fn name(&self) -> &str {
        &self.model
    }
}

/// Pull the first choice's content out of a chat-completions response body.
fn parse_completion(body: &str) -> Result<String, LlmError> {
    let parsed: ChatCompletionResponse =
        serde_json::from_str(body).map_err(|e| LlmError::MalformedResponse(e.to_string()))?;
    parsed
        .choices
        .into_iter()
        .next()
        .and_then(|c| c.message.content)
        .ok_or_else(|| LlmError::MalformedResponse("response has no choices".to_string()))
}

/// Build the configured model, or `None` when the model is disabled.
pub fn from_config(config: &LlmConfig) -> Result<Option<Arc<dyn LanguageModel>>, LlmError> {
    if !config.enabled {
        info!("Language model disabled by configuration");
        return Ok(None);
    }
    let client = OpenAiCompatibleClient::new(config)?;
    info!(endpoint = %client.endpoint(), model = %config.model, "Language model configured");
    Ok(Some(Arc::new(client)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpListener;

    /// Serve one HTTP exchange; resolves to the raw request text.
    async fn serve_once(status_line: &'static str, body: String) -> (String, tokio::task::JoinHandle<String>) {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();

        let handle = tokio::spawn(async move {
            let (mut socket, _) = listener.accept().await.unwrap();
            let mut buf = Vec::new();
            let mut chunk = [0u8; 4096];
            loop {
                let n = socket.read(&mut chunk).await.unwrap();
                if n == 0 {
                    break;
                }
                buf.extend_from_slice(&chunk[..n]);
                let text = String::from_utf8_lossy(&buf).to_string();
                if let Some(pos) = text.find("\r\n\r\n") {
                    let content_length = text[..pos]
                        .lines()
                        .find_map(|l| {
                            let lower = l.to_ascii_lowercase();
                            lower
                                .strip_prefix("content-length:")
                                .map(|v| v.trim().to_string())
                        })
                        .and_then(|v| v.parse::<usize>().ok())
                        .unwrap_or(0);
                    if buf.len() >= pos + 4 + content_length {
                        break;
                    }
                }
            }

            let response = format!(
                "HTTP/1.1 {}\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
                status_line,
                body.len(),
                body
            );
            socket.write_all(response.as_bytes()).await.unwrap();
            socket.shutdown().await.unwrap();
            String::from_utf8_lossy(&buf).to_string()
        });

        (format!("http://{}/v1", addr), handle)
    }

    fn config_for(base_url: String) -> LlmConfig {
        LlmConfig {
            base_url,
            model: "test-model".to_string(),
            api_key: Some("secret".to_string()),
            timeout_secs: 5,
            ..LlmConfig::default()
        }
    }

    #[test]
    fn test_endpoint_strips_trailing_slash() {
        let client = OpenAiCompatibleClient::new(&config_for("http://localhost:1234/v1/".to_string()))
            .unwrap();
        assert_eq!(client.endpoint(), "http://localhost:1234/v1/chat/completions");
        assert_eq!(client.name(), "test-model");
    }

    #[test]
    fn test_request_body_shape() {
        let messages = vec![Message::system("be brief"), Message::user("hi")];
        let body = ChatCompletionRequest {
            model: "m",
            messages: &messages,
            temperature: 0.0,
        };
        let json = serde_json::to_value(&body).unwrap();
        assert_eq!(
            json,
            serde_json::json!({
                "model": "m",
                "messages": [
                    {"role": "system", "content": "be brief"},
                    {"role": "user", "content": "hi"}
                ],
                "temperature": 0.0
            })
        );
    }

    #[test]
    fn test_parse_completion() {
        let body = r#"{"choices":[{"message":{"role":"assistant","content":"SELECT 1"}}]}"#;
        assert_eq!(parse_completion(body).unwrap(), "SELECT 1");
    }

    #[test]
    fn test_parse_completion_without_choices() {
        let err = parse_completion(r#"{"choices":[]}"#).unwrap_err();
        assert!(matches!(err, LlmError::MalformedResponse(_)));

        let err = parse_completion("not json").unwrap_err();
        assert!(matches!(err, LlmError::MalformedResponse(_)));
    }

    #[test]
    fn test_from_config_disabled() {
        let config = LlmConfig {
            enabled: false,
            ..LlmConfig::default()
        };
        assert!(from_config(&config).unwrap().is_none());
    }

    #[tokio::test]
    async fn test_invoke_round_trip_over_http() {
        let body = r#"{"choices":[{"message":{"role":"assistant","content":"Hello there"}}]}"#;
        let (base_url, server) = serve_once("200 OK", body.to_string()).await;

        let client = OpenAiCompatibleClient::new(&config_for(base_url)).unwrap();
        let reply = client.invoke(&[Message::user("How are you?")]).await.unwrap();
        assert_eq!(reply, "Hello there");

        let request = server.await.unwrap();
        assert!(request.starts_with("POST /v1/chat/completions"));
        assert!(request.to_ascii_lowercase().contains("authorization: bearer secret"));
        assert!(request.contains(r#""model":"test-model""#));
        assert!(request.contains(r#"{"role":"user","content":"How are you?"}"#));
    }

    #[tokio::test]
    async fn test_invoke_error_status() {
        let (base_url, server) =
            serve_once("500 Internal Server Error", "model crashed".to_string()).await;

        let client = OpenAiCompatibleClient::new(&config_for(base_url)).unwrap();
        let err = client.invoke(&[Message::user("hi")]).await.unwrap_err();
        assert_eq!(
            err,
            LlmError::Status {
                status: 500,
                body: "model crashed".to_string()
            }
        );
        server.await.unwrap();
    }

    #[tokio::test]
    async fn test_invoke_connection_refused() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);

        let client = OpenAiCompatibleClient::new(&config_for(format!("http://{}/v1", addr))).unwrap();
        let err = client.invoke(&[Message::user("hi")]).await.unwrap_err();
        assert!(matches!(err, LlmError::Http(_)));
    }
}
