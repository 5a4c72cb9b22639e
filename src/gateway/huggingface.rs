use anyhow::Result;
use async_trait::async_trait;
use reqwest::Client;
use serde::Serialize;
use serde_json::Value;
use tracing::{debug, instrument};

use super::{GatewayError, TextGenerator, http_client, read_json};
use crate::config::TextGenerationConfig;

const SERVICE: &str = "Text generation";

/// Hugging Face inference API client
pub struct HuggingFaceClient {
    client: Client,
    api_key: Option<String>,
    base_url: String,
    model: String,
    temperature: f32,
}

#[derive(Debug, Serialize)]
struct GenerationRequest<'a> {
    inputs: &'a str,
    parameters: GenerationParameters,
}

#[derive(Debug, Serialize)]
struct GenerationParameters {
    max_length: usize,
    temperature: f32,
    do_sample: bool,
    return_full_text: bool,
}

impl HuggingFaceClient {
    pub fn new(config: &TextGenerationConfig) -> Result<Self> {
        Ok(Self {
            client: http_client(config.timeout_seconds)?,
            api_key: config.api_key.clone(),
            base_url: config.base_url.trim_end_matches('/').to_string(),
            model: config.model.clone(),
            temperature: config.temperature,
        })
    }
}

#[async_trait]
impl TextGenerator for HuggingFaceClient {
    fn is_configured(&self) -> bool {
        self.api_key.is_some()
    }

    #[instrument(skip(self, prompt), fields(model = %self.model, prompt_len = prompt.len()))]
    async fn complete(&self, prompt: &str, max_chars: usize) -> Result<String, GatewayError> {
        let api_key = self
            .api_key
            .as_deref()
            .ok_or(GatewayError::NotConfigured { service: SERVICE })?;

        let request = GenerationRequest {
            inputs: prompt,
            parameters: GenerationParameters {
                max_length: max_chars,
                temperature: self.temperature,
                do_sample: true,
                return_full_text: false,
            },
        };

        let url = format!("{}/{}", self.base_url, self.model);
        let response = self
            .client
            .post(&url)
            .bearer_auth(api_key)
            .json(&request)
            .send()
            .await
            .map_err(|e| GatewayError::transport(SERVICE, e))?;

        let body: Value = read_json(SERVICE, response).await?;
        let generated = first_generated_text(&body).ok_or_else(|| GatewayError::Decode {
            service: SERVICE,
            message: "expected a non-empty array with generated_text".to_string(),
        })?;

        let text = clean_completion(prompt, generated, max_chars)
            .ok_or(GatewayError::EmptyCompletion { service: SERVICE })?;

        debug!("Generated {} characters", text.chars().count());
        Ok(text)
    }
}

fn first_generated_text(body: &Value) -> Option<&str> {
    body.as_array()?.first()?.get("generated_text")?.as_str()
}

/// Strip the echoed prompt, trim, and cut to `max_chars` characters.
/// `None` when nothing is left.
fn clean_completion(prompt: &str, generated: &str, max_chars: usize) -> Option<String> {
    let stripped = generated.strip_prefix(prompt).unwrap_or(generated).trim();
    if stripped.is_empty() {
        return None;
    }
    Some(stripped.chars().take(max_chars).collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use mockito::{Matcher, Server, ServerGuard};
    use rstest::rstest;
    use serde_json::json;

    fn client_for(server: &ServerGuard, api_key: Option<&str>) -> HuggingFaceClient {
        HuggingFaceClient::new(&TextGenerationConfig {
            api_key: api_key.map(String::from),
            base_url: server.url(),
            model: "gpt2".to_string(),
            timeout_seconds: 5,
            temperature: 0.7,
        })
        .unwrap()
    }

    #[rstest]
    #[case("Describe Rome.", "Describe Rome. Ancient and lovely.", 300, Some("Ancient and lovely."))]
    #[case("Describe Rome.", "  Ancient and lovely.  ", 300, Some("Ancient and lovely."))]
    #[case("Describe Rome.", "Describe Rome.   ", 300, None)]
    #[case("p", "abcdef", 3, Some("abc"))]
    #[case("p", "żółć gęś", 4, Some("żółć"))]
    fn test_clean_completion(
        #[case] prompt: &str,
        #[case] generated: &str,
        #[case] max_chars: usize,
        #[case] expected: Option<&str>,
    ) {
        assert_eq!(
            clean_completion(prompt, generated, max_chars).as_deref(),
            expected
        );
    }

    #[test]
    fn test_first_generated_text() {
        assert_eq!(
            first_generated_text(&json!([{"generated_text": "hi"}])),
            Some("hi")
        );
        assert_eq!(first_generated_text(&json!([])), None);
        assert_eq!(first_generated_text(&json!({"error": "loading"})), None);
        assert_eq!(first_generated_text(&json!([{"text": "hi"}])), None);
    }

    #[tokio::test]
    async fn test_complete_success() {
        let mut server = Server::new_async().await;
        let mock = server
            .mock("POST", "/gpt2")
            .match_header("authorization", "Bearer hf-token")
            .match_body(Matcher::PartialJson(json!({
                "inputs": "Describe Rome.",
                "parameters": {"max_length": 300, "do_sample": true, "return_full_text": false}
            })))
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(r#"[{"generated_text": "Describe Rome. The Eternal City awaits."}]"#)
            .create_async()
            .await;

        let client = client_for(&server, Some("hf-token"));
        let text = client.complete("Describe Rome.", 300).await.unwrap();

        mock.assert_async().await;
        assert_eq!(text, "The Eternal City awaits.");
    }

    #[tokio::test]
    async fn test_complete_model_loading() {
        let mut server = Server::new_async().await;
        server
            .mock("POST", "/gpt2")
            .with_status(503)
            .with_body(r#"{"error": "Model gpt2 is currently loading"}"#)
            .create_async()
            .await;

        let client = client_for(&server, Some("hf-token"));
        let err = client.complete("Describe Rome.", 300).await.unwrap_err();
        assert_eq!(
            err,
            GatewayError::Status {
                service: SERVICE,
                status: 503
            }
        );
    }

    #[tokio::test]
    async fn test_complete_empty_array() {
        let mut server = Server::new_async().await;
        server
            .mock("POST", "/gpt2")
            .with_status(200)
            .with_body("[]")
            .create_async()
            .await;

        let client = client_for(&server, Some("hf-token"));
        let err = client.complete("Describe Rome.", 300).await.unwrap_err();
        assert!(matches!(err, GatewayError::Decode { .. }));
    }

    #[tokio::test]
    async fn test_complete_only_echo() {
        let mut server = Server::new_async().await;
        server
            .mock("POST", "/gpt2")
            .with_status(200)
            .with_body(r#"[{"generated_text": "Describe Rome."}]"#)
            .create_async()
            .await;

        let client = client_for(&server, Some("hf-token"));
        let err = client.complete("Describe Rome.", 300).await.unwrap_err();
        assert_eq!(err, GatewayError::EmptyCompletion { service: SERVICE });
    }

    #[tokio::test]
    async fn test_not_configured() {
        let server = Server::new_async().await;
        let client = client_for(&server, None);
        assert!(!client.is_configured());
        let err = client.complete("anything", 10).await.unwrap_err();
        assert!(matches!(err, GatewayError::NotConfigured { .. }));
    }
}
