use crate::prompt::build_prompt;
use crate::{whole_seconds, Reranker};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use shoprec_core::{
    ConfigError, CoreError, Product, RerankDecision, RerankerConfig, UpstreamError,
};
use std::time::{Duration, Instant};
use tracing::{debug, error, info};
use url::Url;

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    format: &'static str,
    messages: Vec<ChatMessage<'a>>,
    stream: bool,
}

#[derive(Debug, Serialize)]
struct ChatMessage<'a> {
    role: &'static str,
    content: &'a str,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    message: Option<ChatResponseMessage>,
}

#[derive(Debug, Deserialize)]
struct ChatResponseMessage {
    #[serde(default)]
    content: Value,
}

#[derive(Debug, Deserialize)]
struct RerankPayload {
    #[serde(default)]
    recommendations: Vec<RerankDecision>,
}

/// [`Reranker`] backed by a local Ollama server's `/api/chat` endpoint.
#[derive(Debug, Clone)]
pub struct OllamaReranker {
    http_client: Client,
    endpoint: Url,
    model: String,
    timeout: Duration,
}

impl OllamaReranker {
    pub fn new(base_url: &Url, model: impl Into<String>, timeout: Duration) -> Result<Self, CoreError> {
        let endpoint = chat_endpoint(base_url).map_err(|e| ConfigError::InvalidValue {
            field: "reranker.base_url".to_string(),
            value: format!("{} ({})", base_url, e),
        })?;

        let http_client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| UpstreamError::Network {
                details: format!("failed to create HTTP client: {e}"),
            })?;

        Ok(Self {
            http_client,
            endpoint,
            model: model.into(),
            timeout,
        })
    }

    pub fn from_config(config: &RerankerConfig) -> Result<Self, CoreError> {
        let base_url = config.parsed_base_url()?;
        Self::new(&base_url, config.model.clone(), config.timeout())
    }

    pub fn endpoint(&self) -> &Url {
        &self.endpoint
    }

    fn transport_error(&self, e: reqwest::Error) -> CoreError {
        if e.is_timeout() {
            error!("Ollama request to {} timed out", self.endpoint);
            CoreError::Timeout {
                seconds: whole_seconds(self.timeout),
            }
        } else {
            error!("Network error talking to {}: {}", self.endpoint, e);
            UpstreamError::Network {
                details: e.to_string(),
            }
            .into()
        }
    }
}

impl Reranker for OllamaReranker {
    async fn rerank(
        &self,
        candidates: &[&Product],
        history: &[&Product],
        k: usize,
    ) -> Result<Vec<RerankDecision>, CoreError> {
        let prompt = build_prompt(history, candidates, k)?;
        let request = ChatRequest {
            model: &self.model,
            format: "json",
            messages: vec![ChatMessage {
                role: "user",
                content: &prompt,
            }],
            stream: false,
        };

        info!(
            "Requesting re-rank of {} candidates from {} ({})",
            candidates.len(),
            self.endpoint,
            self.model
        );
        let start_time = Instant::now();

        let response = self
            .http_client
            .post(self.endpoint.clone())
            .json(&request)
            .send()
            .await
            .map_err(|e| self.transport_error(e))?;

        let status = response.status();
        let body = response.text().await.map_err(|e| self.transport_error(e))?;
        debug!("Ollama answered {} after {:?}", status, start_time.elapsed());

        if !status.is_success() {
            error!("Ollama error response ({}): {}", status, body);
            return Err(UpstreamError::HttpStatus {
                status: status.as_u16(),
                body,
            }
            .into());
        }

        let decisions = parse_chat_response(&body)?;
        info!(
            "Re-rank returned {} entries in {:?}",
            decisions.len(),
            start_time.elapsed()
        );
        Ok(decisions)
    }
}

/// Extracts the decisions from an `/api/chat` body. The model's text lives in
/// `message.content`, either as a string or as a list of string / `{text}` parts.
pub(crate) fn parse_chat_response(body: &str) -> Result<Vec<RerankDecision>, CoreError> {
    let response: ChatResponse = serde_json::from_str(body).map_err(|e| invalid(format!("chat envelope: {e}")))?;
    let content = match response.message.map(|m| m.content) {
        Some(Value::String(text)) => text,
        Some(Value::Array(parts)) => parts
            .iter()
            .map(|part| match part {
                Value::String(text) => text.as_str(),
                other => other.get("text").and_then(Value::as_str).unwrap_or(""),
            })
            .collect(),
        _ => return Err(invalid("message content is not a string".to_string())),
    };

    let payload: RerankPayload = serde_json::from_str(&content).map_err(|e| {
        error!("Failed to parse LLM JSON: {}", content);
        invalid(format!("model did not return valid JSON: {e}"))
    })?;
    Ok(payload.recommendations)
}

fn invalid(details: String) -> CoreError {
    UpstreamError::InvalidResponse { details }.into()
}

/// `api/chat` under `base_url`, keeping a path prefix such as `/ollama`.
fn chat_endpoint(base_url: &Url) -> Result<Url, url::ParseError> {
    let mut base = base_url.clone();
    if !base.path().ends_with('/') {
        let path = format!("{}/", base.path());
        base.set_path(&path);
    }
    base.join("api/chat")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_string_content() {
        let body = r#"{"message":{"role":"assistant","content":"{\"recommendations\":[{\"id\":\"p2\",\"reason\":\"Same category\"}]}"}}"#;
        let decisions = parse_chat_response(body).unwrap();
        assert_eq!(decisions.len(), 1);
        assert_eq!(decisions[0].id, "p2");
        assert_eq!(decisions[0].reason, "Same category");
    }

    #[test]
    fn test_parse_content_parts() {
        let body = r#"{"message":{"content":["{\"recommendations\":", {"text":"[{\"id\":\"p3\"}]}"}]}}"#;
        let decisions = parse_chat_response(body).unwrap();
        assert_eq!(decisions[0].id, "p3");
        assert_eq!(decisions[0].reason, "");
    }

    #[test]
    fn test_missing_recommendations_is_empty() {
        let body = r#"{"message":{"content":"{}"}}"#;
        assert!(parse_chat_response(body).unwrap().is_empty());
    }

    #[test]
    fn test_non_json_content() {
        let body = r#"{"message":{"content":"Sure! Here are my picks: p1, p2"}}"#;
        let result = parse_chat_response(body);
        assert!(matches!(
            result,
            Err(CoreError::Upstream(UpstreamError::InvalidResponse { .. }))
        ));
    }

    #[test]
    fn test_non_string_content() {
        let body = r#"{"message":{"content":42}}"#;
        assert!(matches!(
            parse_chat_response(body),
            Err(CoreError::Upstream(UpstreamError::InvalidResponse { .. }))
        ));
        assert!(parse_chat_response(r#"{"done":true}"#).is_err());
    }

    #[test]
    fn test_endpoint_from_config() {
        let reranker = OllamaReranker::from_config(&RerankerConfig::default()).unwrap();
        assert_eq!(reranker.endpoint().as_str(), "http://localhost:11434/api/chat");
    }

    #[test]
    fn test_endpoint_keeps_base_path() {
        for base in ["http://gpu-box:11434/ollama", "http://gpu-box:11434/ollama/"] {
            let reranker =
                OllamaReranker::new(&Url::parse(base).unwrap(), "llama3", Duration::from_secs(5)).unwrap();
            assert_eq!(reranker.endpoint().as_str(), "http://gpu-box:11434/ollama/api/chat");
        }
    }
}
