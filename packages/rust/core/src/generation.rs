//! Generative text service: contract and chat-completions client.
//!
//! The pipeline talks to [`TextGenerator`] only. [`ChatCompletionsClient`]
//! implements it against any OpenAI-compatible `/chat/completions` API
//! (OpenRouter by default). Credentials come from [`GenerationConfig`] at
//! construction time; there is no process-wide client.

use std::time::{Duration, Instant};

use async_trait::async_trait;
use reqwest::Client;
use tracing::{debug, info, instrument};

use wordy_shared::{GenerationConfig, Result, WordyError, validate_api_key};

/// User-Agent string for API requests.
const USER_AGENT: &str = concat!("Wordy/", env!("CARGO_PKG_VERSION"));

/// Longest slice of an error body quoted back in messages.
const ERROR_BODY_PREVIEW: usize = 300;

// ---------------------------------------------------------------------------
// Contract
// ---------------------------------------------------------------------------

/// Turns a prompt into generated markup.
#[async_trait]
pub trait TextGenerator: Send + Sync {
    /// Generate text for `prompt`. An empty completion is an error.
    async fn generate(&self, prompt: &str) -> Result<String>;
}

// ---------------------------------------------------------------------------
// Wire types
// ---------------------------------------------------------------------------

#[derive(Debug, serde::Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
}

#[derive(Debug, serde::Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Debug, serde::Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<Choice>,
    #[serde(default)]
    usage: Option<Usage>,
}

#[derive(Debug, serde::Deserialize)]
struct Choice {
    message: ResponseMessage,
}

#[derive(Debug, serde::Deserialize)]
struct ResponseMessage {
    #[serde(default)]
    content: Option<String>,
    #[serde(default)]
    refusal: Option<String>,
}

#[derive(Debug, serde::Deserialize)]
struct Usage {
    #[serde(default)]
    prompt_tokens: u64,
    #[serde(default)]
    completion_tokens: u64,
}

// ---------------------------------------------------------------------------
// Client
// ---------------------------------------------------------------------------

/// Client for an OpenAI-compatible chat-completions endpoint.
#[derive(Debug, Clone)]
pub struct ChatCompletionsClient {
    client: Client,
    endpoint: String,
    api_key: String,
    model: String,
    timeout_secs: u64,
}

impl ChatCompletionsClient {
    /// Build a client, reading the API key from `config.api_key_env`.
    pub fn new(config: &GenerationConfig) -> Result<Self> {
        validate_api_key(config)?;
        let api_key = std::env::var(&config.api_key_env)
            .map_err(|e| WordyError::config(format!("{}: {e}", config.api_key_env)))?;

        Self::with_api_key(config, api_key)
    }

    /// Build a client with an explicit API key.
    pub fn with_api_key(config: &GenerationConfig, api_key: impl Into<String>) -> Result<Self> {
        let client = Client::builder()
            .user_agent(USER_AGENT)
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| WordyError::Network(format!("failed to build HTTP client: {e}")))?;

        Ok(Self {
            client,
            endpoint: format!("{}/chat/completions", config.api_base.trim_end_matches('/')),
            api_key: api_key.into(),
            model: config.model.clone(),
            timeout_secs: config.timeout_secs,
        })
    }
}

impl ChatCompletionsClient {
    /// Map a transport error, keeping client timeouts distinct.
    fn request_error(&self, err: reqwest::Error, context: &str) -> WordyError {
        if err.is_timeout() {
            WordyError::timeout("generation request", self.timeout_secs)
        } else {
            WordyError::Generation(format!("{context}: {err}"))
        }
    }
}

#[async_trait]
impl TextGenerator for ChatCompletionsClient {
    #[instrument(skip_all, fields(model = %self.model, prompt_len = prompt.len()))]
    async fn generate(&self, prompt: &str) -> Result<String> {
        let start = Instant::now();
        let request = ChatRequest {
            model: &self.model,
            messages: vec![ChatMessage {
                role: "user",
                content: prompt,
            }],
        };

        debug!(endpoint = %self.endpoint, "sending generation request");

        let response = self
            .client
            .post(&self.endpoint)
            .bearer_auth(&self.api_key)
            .json(&request)
            .send()
            .await
            .map_err(|e| self.request_error(e, "request failed"))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| self.request_error(e, "failed to read response"))?;

        if !status.is_success() {
            return Err(WordyError::Generation(format!(
                "HTTP {status}: {}",
                preview(&body)
            )));
        }

        let parsed: ChatResponse = serde_json::from_str(&body).map_err(|e| {
            WordyError::Generation(format!("invalid response: {e} (got: {})", preview(&body)))
        })?;

        let message = parsed
            .choices
            .into_iter()
            .next()
            .map(|choice| choice.message)
            .ok_or_else(|| WordyError::Generation("response contained no choices".into()))?;

        if let Some(refusal) = message.refusal.filter(|r| !r.is_empty()) {
            return Err(WordyError::Generation(format!("model refused: {refusal}")));
        }

        let text = message
            .content
            .filter(|c| !c.trim().is_empty())
            .ok_or_else(|| WordyError::Generation("response contained no content".into()))?;

        let (tokens_in, tokens_out) = parsed
            .usage
            .map(|u| (u.prompt_tokens, u.completion_tokens))
            .unwrap_or_default();

        info!(
            tokens_in,
            tokens_out,
            latency_ms = start.elapsed().as_millis() as u64,
            output_len = text.len(),
            "generation complete"
        );

        Ok(text)
    }
}

/// Truncate `body` on a char boundary for error messages.
fn preview(body: &str) -> &str {
    if body.len() <= ERROR_BODY_PREVIEW {
        return body;
    }
    let mut end = ERROR_BODY_PREVIEW;
    while !body.is_char_boundary(end) {
        end -= 1;
    }
    &body[..end]
}

#[cfg(test)]
mod tests {
    use super::*;

    use wiremock::matchers::{body_partial_json, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn config_for(server: &MockServer) -> GenerationConfig {
        GenerationConfig {
            api_base: format!("{}/api/v1/", server.uri()),
            model: "test/model".into(),
            timeout_secs: 5,
            ..GenerationConfig::default()
        }
    }

    #[tokio::test]
    async fn generate_returns_message_content() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/api/v1/chat/completions"))
            .and(header("authorization", "Bearer secret"))
            .and(body_partial_json(serde_json::json!({
                "model": "test/model",
                "messages": [{ "role": "user", "content": "write it" }],
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "choices": [{ "message": { "role": "assistant", "content": "\\documentclass{article}" } }],
                "usage": { "prompt_tokens": 12, "completion_tokens": 4 },
            })))
            .mount(&server)
            .await;

        let client = ChatCompletionsClient::with_api_key(&config_for(&server), "secret").unwrap();
        let text = client.generate("write it").await.unwrap();

        assert_eq!(text, "\\documentclass{article}");
    }

    #[tokio::test]
    async fn generate_http_error_is_generation_error() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(429).set_body_string("rate limited"))
            .mount(&server)
            .await;

        let client = ChatCompletionsClient::with_api_key(&config_for(&server), "secret").unwrap();
        let err = client.generate("prompt").await.unwrap_err();

        assert!(matches!(err, WordyError::Generation(_)));
        let text = err.to_string();
        assert!(text.contains("429"));
        assert!(text.contains("rate limited"));
    }

    #[tokio::test]
    async fn generate_empty_content_is_error() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "choices": [{ "message": { "content": "   " } }],
            })))
            .mount(&server)
            .await;

        let client = ChatCompletionsClient::with_api_key(&config_for(&server), "secret").unwrap();
        let err = client.generate("prompt").await.unwrap_err();
        assert!(err.to_string().contains("no content"));
    }

    #[tokio::test]
    async fn generate_no_choices_is_error() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "choices": [],
            })))
            .mount(&server)
            .await;

        let client = ChatCompletionsClient::with_api_key(&config_for(&server), "secret").unwrap();
        let err = client.generate("prompt").await.unwrap_err();
        assert!(err.to_string().contains("no choices"));
    }

    #[tokio::test]
    async fn generate_refusal_is_error() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "choices": [{ "message": { "content": null, "refusal": "cannot help" } }],
            })))
            .mount(&server)
            .await;

        let client = ChatCompletionsClient::with_api_key(&config_for(&server), "secret").unwrap();
        let err = client.generate("prompt").await.unwrap_err();
        assert!(err.to_string().contains("cannot help"));
    }

    #[tokio::test]
    async fn generate_invalid_json_is_error() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_string("<html>gateway</html>"))
            .mount(&server)
            .await;

        let client = ChatCompletionsClient::with_api_key(&config_for(&server), "secret").unwrap();
        let err = client.generate("prompt").await.unwrap_err();
        assert!(err.to_string().contains("invalid response"));
    }

    #[test]
    fn new_requires_api_key_env() {
        let config = GenerationConfig {
            api_key_env: "WORDY_TEST_MISSING_GENERATION_KEY".into(),
            ..GenerationConfig::default()
        };
        let err = ChatCompletionsClient::new(&config).unwrap_err();
        assert_eq!(
            err.to_string(),
            validate_api_key(&config).unwrap_err().to_string()
        );
        assert!(matches!(err, WordyError::Config { .. }));
    }

    #[tokio::test]
    async fn generate_slow_body_is_timeout() {
        use tokio::io::AsyncWriteExt;

        // Headers arrive at once, the body never does.
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            let (mut socket, _) = listener.accept().await.unwrap();
            let mut buf = [0u8; 4096];
            let _ = tokio::io::AsyncReadExt::read(&mut socket, &mut buf).await;
            socket
                .write_all(b"HTTP/1.1 200 OK\r\ncontent-type: application/json\r\ncontent-length: 1000\r\n\r\n{")
                .await
                .unwrap();
            tokio::time::sleep(Duration::from_secs(30)).await;
        });

        let config = GenerationConfig {
            api_base: format!("http://{addr}"),
            timeout_secs: 1,
            ..GenerationConfig::default()
        };
        let client = ChatCompletionsClient::with_api_key(&config, "secret").unwrap();
        let err = client.generate("prompt").await.unwrap_err();

        assert!(matches!(err, WordyError::Timeout { .. }), "got {err}");
    }

    #[tokio::test]
    async fn generate_slow_headers_is_timeout() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_delay(Duration::from_secs(5)))
            .mount(&server)
            .await;

        let config = GenerationConfig {
            timeout_secs: 1,
            ..config_for(&server)
        };
        let client = ChatCompletionsClient::with_api_key(&config, "secret").unwrap();
        let err = client.generate("prompt").await.unwrap_err();

        assert!(matches!(err, WordyError::Timeout { .. }), "got {err}");
    }

    #[test]
    fn endpoint_joins_base_without_double_slash() {
        let config = GenerationConfig {
            api_base: "https://api.example.com/v1/".into(),
            ..GenerationConfig::default()
        };
        let client = ChatCompletionsClient::with_api_key(&config, "k").unwrap();
        assert_eq!(client.endpoint, "https://api.example.com/v1/chat/completions");
    }

    #[test]
    fn preview_respects_char_boundaries() {
        let body = "é".repeat(400);
        let short = preview(&body);
        assert!(short.len() <= ERROR_BODY_PREVIEW);
        assert!(short.chars().all(|c| c == 'é'));
    }
}
