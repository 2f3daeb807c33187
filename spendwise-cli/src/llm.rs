//! Chat-completion client backing the engine's external classifier and
//! text generator.

use anyhow::{bail, Context, Result};
use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION, CONTENT_TYPE};
use serde::{Deserialize, Serialize};
use spendwise_finance::narrative::classification_request;
use spendwise_finance::{ExternalClassifier, GenerationRequest, TextGenerator};

use crate::auth::{self, AuthState};
use crate::config::LlmSection;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Provider {
    Anthropic,
    OpenAI,
}

impl Provider {
    fn default_model(&self) -> &'static str {
        match self {
            Provider::Anthropic => "claude-3-5-haiku-latest",
            Provider::OpenAI => "gpt-4o-mini",
        }
    }
}

#[derive(Debug, Clone)]
pub struct LlmConfig {
    pub provider: Provider,
    pub model: String,
    pub temperature: Option<f32>,
}

/// Pick a provider from config and available keys.
///
/// `None` means run offline: disabled in config, or no usable key.
pub fn resolve(section: &LlmSection, auth: &AuthState) -> Result<Option<LlmConfig>> {
    if !section.enabled {
        return Ok(None);
    }

    let provider = match section.provider.trim().to_lowercase().as_str() {
        "anthropic" => auth.anthropic_token.is_some().then_some(Provider::Anthropic),
        "openai" => auth.openai_api_key.is_some().then_some(Provider::OpenAI),
        "auto" | "" => {
            if auth.anthropic_token.is_some() {
                Some(Provider::Anthropic)
            } else if auth.openai_api_key.is_some() {
                Some(Provider::OpenAI)
            } else {
                None
            }
        }
        other => bail!("unknown llm provider `{other}` (expected auto, openai or anthropic)"),
    };

    let Some(provider) = provider else {
        tracing::debug!(provider = %section.provider, "no API key available, running offline");
        return Ok(None);
    };

    Ok(Some(LlmConfig {
        provider,
        model: section
            .model
            .clone()
            .unwrap_or_else(|| provider.default_model().to_string()),
        temperature: section.temperature,
    }))
}

/// A configured provider plus the keys to call it.
pub struct LlmClient {
    config: LlmConfig,
    auth: AuthState,
    http: reqwest::Client,
}

impl LlmClient {
    pub fn new(config: LlmConfig, auth: AuthState) -> Self {
        Self {
            config,
            auth,
            http: reqwest::Client::new(),
        }
    }

    /// Client for the current config and keys, if any provider is usable.
    pub fn from_env(section: &LlmSection) -> Result<Option<Self>> {
        let auth = auth::load_auth()?;
        Ok(resolve(section, &auth)?.map(|config| Self::new(config, auth)))
    }

    pub fn config(&self) -> &LlmConfig {
        &self.config
    }

    pub fn complete(&self, request: &GenerationRequest) -> Result<String> {
        // Commands run under #[tokio::main], so a runtime is usually already
        // current and a nested block_on would panic.
        if let Ok(handle) = tokio::runtime::Handle::try_current() {
            tokio::task::block_in_place(|| handle.block_on(self.complete_async(request)))
        } else {
            let rt = tokio::runtime::Runtime::new().context("create tokio runtime")?;
            rt.block_on(self.complete_async(request))
        }
    }

    async fn complete_async(&self, request: &GenerationRequest) -> Result<String> {
        let temperature = self.config.temperature.unwrap_or(request.temperature);
        tracing::debug!(
            provider = ?self.config.provider,
            model = %self.config.model,
            max_tokens = request.max_tokens,
            "chat completion"
        );
        match self.config.provider {
            Provider::Anthropic => self.anthropic_complete(request, temperature).await,
            Provider::OpenAI => self.openai_complete(request, temperature).await,
        }
    }

    async fn anthropic_complete(&self, request: &GenerationRequest, temperature: f32) -> Result<String> {
        let token = self
            .auth
            .anthropic_token
            .as_deref()
            .ok_or_else(|| anyhow::anyhow!("missing Anthropic key; run: spendwise auth paste-anthropic-token"))?;

        #[derive(Serialize)]
        struct Msg<'a> {
            role: &'a str,
            content: &'a str,
        }

        #[derive(Serialize)]
        struct Req<'a> {
            model: &'a str,
            max_tokens: u32,
            temperature: f32,
            #[serde(skip_serializing_if = "Option::is_none")]
            system: Option<&'a str>,
            messages: Vec<Msg<'a>>,
        }

        #[derive(Deserialize)]
        struct Resp {
            content: Vec<ContentBlock>,
        }

        #[derive(Deserialize)]
        struct ContentBlock {
            #[serde(rename = "type")]
            t: String,
            text: Option<String>,
        }

        let body = Req {
            model: &self.config.model,
            max_tokens: request.max_tokens,
            temperature,
            system: request.system.as_deref(),
            messages: vec![Msg {
                role: "user",
                content: &request.prompt,
            }],
        };

        let mut headers = HeaderMap::new();
        if token.starts_with("sk-ant-oat") {
            headers.insert(AUTHORIZATION, HeaderValue::from_str(&format!("Bearer {token}"))?);
        } else {
            headers.insert("x-api-key", HeaderValue::from_str(token)?);
        }
        headers.insert("anthropic-version", HeaderValue::from_static("2023-06-01"));
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));

        let resp = self
            .http
            .post("https://api.anthropic.com/v1/messages")
            .headers(headers)
            .json(&body)
            .send()
            .await
            .context("anthropic request")?;

        let status = resp.status();
        if !status.is_success() {
            let txt = resp.text().await.unwrap_or_default();
            bail!("anthropic error: {status} {txt}");
        }

        let out: Resp = resp.json().await.context("parse anthropic response")?;
        let mut s = String::new();
        for b in out.content {
            if b.t == "text" {
                if let Some(t) = b.text {
                    s.push_str(&t);
                }
            }
        }
        Ok(s.trim().to_string())
    }

    async fn openai_complete(&self, request: &GenerationRequest, temperature: f32) -> Result<String> {
        let key = self
            .auth
            .openai_api_key
            .as_deref()
            .ok_or_else(|| anyhow::anyhow!("missing OpenAI key; run: spendwise auth paste-openai-api-key"))?;

        #[derive(Serialize)]
        struct Msg<'a> {
            role: &'a str,
            content: &'a str,
        }

        #[derive(Serialize)]
        struct Req<'a> {
            model: &'a str,
            messages: Vec<Msg<'a>>,
            max_tokens: u32,
            temperature: f32,
        }

        #[derive(Deserialize)]
        struct Resp {
            choices: Vec<Choice>,
        }

        #[derive(Deserialize)]
        struct Choice {
            message: MsgOut,
        }

        #[derive(Deserialize)]
        struct MsgOut {
            content: Option<String>,
        }

        let mut messages = Vec::new();
        if let Some(system) = request.system.as_deref() {
            messages.push(Msg {
                role: "system",
                content: system,
            });
        }
        messages.push(Msg {
            role: "user",
            content: &request.prompt,
        });

        let body = Req {
            model: &self.config.model,
            messages,
            max_tokens: request.max_tokens,
            temperature,
        };

        let resp = self
            .http
            .post("https://api.openai.com/v1/chat/completions")
            .header(AUTHORIZATION, format!("Bearer {key}"))
            .json(&body)
            .send()
            .await
            .context("openai request")?;

        let status = resp.status();
        if !status.is_success() {
            let txt = resp.text().await.unwrap_or_default();
            bail!("openai error: {status} {txt}");
        }

        let out: Resp = resp.json().await.context("parse openai response")?;
        let content = out
            .choices
            .first()
            .and_then(|c| c.message.content.clone())
            .unwrap_or_default();

        Ok(content.trim().to_string())
    }
}

impl TextGenerator for LlmClient {
    fn generate(&self, request: &GenerationRequest) -> Result<String> {
        self.complete(request)
    }
}

impl ExternalClassifier for LlmClient {
    fn suggest(&self, description: &str) -> Result<String> {
        self.complete(&classification_request(description))
    }
}
