//! Text generation abstraction
//!
//! The language model is a text-in/text-out function. Calls are slow and
//! fallible; failures surface as [`AppError::GenerationService`] and are never
//! retried here, the caller owns retry policy.

use crate::config::{GenerationConfig, GenerationProvider};
use crate::errors::{AppError, Result};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::sync::Arc;
use std::time::{Duration, Instant};

/// Trait for prompt completion
#[async_trait]
pub trait TextGenerator: Send + Sync {
    /// Complete a prompt, returning the model output verbatim
    async fn generate(&self, prompt: &str) -> Result<String>;

    /// Get the model name
    fn model_name(&self) -> &str;
}

/// Client for OpenAI-compatible `/chat/completions` endpoints
pub struct ChatCompletionGenerator {
    client: reqwest::Client,
    api_key: String,
    endpoint: String,
    model: String,
    system_prompt: Option<String>,
    temperature: f32,
    max_tokens: u32,
}

#[derive(Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
    max_tokens: u32,
    temperature: f32,
}

#[derive(Deserialize)]
struct ChatChoice {
    message: ChatMessageResponse,
}

#[derive(Deserialize)]
struct ChatMessageResponse {
    content: Option<String>,
}

#[derive(Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
}

impl ChatCompletionGenerator {
    /// Create a new chat completion client
    pub fn new(config: &GenerationConfig) -> Result<Self> {
        let api_key = config.api_key.clone().ok_or_else(|| AppError::Configuration {
            message: "generation.api_key (or GROQ_API_KEY) is required".to_string(),
        })?;

        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;

        Ok(Self {
            client,
            api_key,
            endpoint: format!("{}/chat/completions", config.api_base.trim_end_matches('/')),
            model: config.model.clone(),
            system_prompt: config.system_prompt.clone(),
            temperature: config.temperature,
            max_tokens: config.max_tokens,
        })
    }

    /// System message (when configured) followed by the prompt as the user turn
    fn build_request<'a>(&'a self, prompt: &'a str) -> ChatRequest<'a> {
        let mut messages = Vec::with_capacity(2);
        if let Some(system) = self.system_prompt.as_deref() {
            messages.push(ChatMessage {
                role: "system",
                content: system,
            });
        }
        messages.push(ChatMessage {
            role: "user",
            content: prompt,
        });

        ChatRequest {
            model: &self.model,
            messages,
            max_tokens: self.max_tokens,
            temperature: self.temperature,
        }
    }

    async fn call(&self, prompt: &str) -> Result<String> {
        let request = self.build_request(prompt);

        let response = self
            .client
            .post(&self.endpoint)
            .bearer_auth(&self.api_key)
            .json(&request)
            .send()
            .await
            .map_err(|e| AppError::GenerationService {
                message: format!("LLM API request failed: {}", e),
            })?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(AppError::GenerationService {
                message: format!("LLM API error {}: {}", status, body),
            });
        }

        let chat_response: ChatResponse =
            response.json().await.map_err(|e| AppError::GenerationService {
                message: format!("Failed to parse LLM response: {}", e),
            })?;

        chat_response
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .ok_or_else(|| AppError::GenerationService {
                message: "Empty response from LLM".to_string(),
            })
    }
}

#[async_trait]
impl TextGenerator for ChatCompletionGenerator {
    async fn generate(&self, prompt: &str) -> Result<String> {
        let started = Instant::now();
        let result = self.call(prompt).await;
        crate::metrics::record_generation(started.elapsed(), result.is_ok());

        match &result {
            Ok(text) => tracing::debug!(
                model = %self.model,
                prompt_chars = prompt.chars().count(),
                output_chars = text.chars().count(),
                "Generation complete"
            ),
            Err(e) => tracing::error!(model = %self.model, error = %e, "Generation failed"),
        }
        result
    }

    fn model_name(&self) -> &str {
        &self.model
    }
}

/// Offline generator for demos and dry runs. Returns a short, deterministic
/// digest of the prompt instead of calling a model.
#[derive(Debug, Default, Clone)]
pub struct EchoGenerator;

impl EchoGenerator {
    /// The asked question when the prompt has one, else its first line
    fn subject(prompt: &str) -> &str {
        let question = prompt
            .find("Question:")
            .map(|start| &prompt[start + "Question:".len()..])
            .and_then(|rest| rest.lines().next())
            .map(str::trim)
            .filter(|q| !q.is_empty());

        question.unwrap_or_else(|| {
            prompt
                .lines()
                .map(str::trim)
                .find(|l| !l.is_empty())
                .unwrap_or_default()
        })
    }
}

#[async_trait]
impl TextGenerator for EchoGenerator {
    async fn generate(&self, prompt: &str) -> Result<String> {
        let digest = hex::encode(&Sha256::digest(prompt.as_bytes())[..6]);
        let subject: String = Self::subject(prompt).chars().take(80).collect();
        crate::metrics::record_generation(Duration::ZERO, true);
        Ok(format!(
            "[echo {digest}] {} chars of prompt about: {subject}",
            prompt.chars().count()
        ))
    }

    fn model_name(&self) -> &str {
        "echo"
    }
}

/// Create a text generator based on configuration
pub fn create_generator(config: &GenerationConfig) -> Result<Arc<dyn TextGenerator>> {
    match config.provider {
        GenerationProvider::Openai => Ok(Arc::new(ChatCompletionGenerator::new(config)?)),
        GenerationProvider::Echo => Ok(Arc::new(EchoGenerator)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_echo_is_deterministic() {
        let generator = EchoGenerator;
        let a = generator.generate("Summarize this section: text").await.unwrap();
        let b = generator.generate("Summarize this section: text").await.unwrap();
        assert_eq!(a, b);
        assert!(a.contains("Summarize this section"));
    }

    #[tokio::test]
    async fn test_echo_names_the_question() {
        let prompt = "Answer using the context.\nContext: chunk\nQuestion: What is attention?\nAnswer:";
        let output = EchoGenerator.generate(prompt).await.unwrap();
        assert!(output.ends_with("about: What is attention?"));
    }

    #[test]
    fn test_request_without_system_prompt() {
        let config = GenerationConfig {
            api_key: Some("key".into()),
            ..GenerationConfig::default()
        };
        let generator = ChatCompletionGenerator::new(&config).unwrap();
        let request = serde_json::to_value(generator.build_request("Summarize")).unwrap();

        assert_eq!(request["model"], "llama-3.3-70b-versatile");
        assert_eq!(request["max_tokens"], 1024);
        assert_eq!(request["messages"].as_array().unwrap().len(), 1);
        assert_eq!(request["messages"][0]["role"], "user");
        assert_eq!(request["messages"][0]["content"], "Summarize");
    }

    #[test]
    fn test_request_with_system_prompt() {
        let config = GenerationConfig {
            api_key: Some("key".into()),
            system_prompt: Some("You are a helpful research assistant.".into()),
            ..GenerationConfig::default()
        };
        let generator = ChatCompletionGenerator::new(&config).unwrap();
        let request = serde_json::to_value(generator.build_request("Summarize")).unwrap();

        assert_eq!(request["messages"][0]["role"], "system");
        assert_eq!(request["messages"][1]["role"], "user");
        assert_eq!(request["messages"][1]["content"], "Summarize");
    }

    #[test]
    fn test_chat_generator_requires_key() {
        let config = GenerationConfig {
            api_key: None,
            ..GenerationConfig::default()
        };
        assert!(matches!(
            ChatCompletionGenerator::new(&config),
            Err(AppError::Configuration { .. })
        ));
    }

    #[test]
    fn test_endpoint_joins_base() {
        let config = GenerationConfig {
            api_key: Some("key".into()),
            api_base: "https://api.groq.com/openai/v1/".into(),
            ..GenerationConfig::default()
        };
        let generator = ChatCompletionGenerator::new(&config).unwrap();
        assert_eq!(
            generator.endpoint,
            "https://api.groq.com/openai/v1/chat/completions"
        );
    }
}
