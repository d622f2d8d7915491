//! AI assistant endpoints: chat completion, speech synthesis, avatar sessions.

use axum::http::{Method, StatusCode};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use crate::proxy::{
    provider_url, Context, Endpoint, EndpointRequest, Provider, ProxyError, Step, UpstreamFailure,
    UpstreamRequest,
};

const STRATEGY_SYSTEM_PROMPT: &str = "You are a trading strategy translator. Convert natural \
language trading strategies into structured JSON for Alpaca. Respond with JSON like: \
{\"symbol\": \"AAPL\", \"action\": \"buy\", \"quantity\": 10, \"orderType\": \"market\", \
\"explanation\": \"Brief explanation\"}. If just chatting, respond normally.";

/// POST /chat
pub struct Chat {
    message: String,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct AnthropicMessage {
    content: Vec<ContentBlock>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct ContentBlock {
    #[serde(rename = "type")]
    kind: String,
    text: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct ChatOutput {
    pub response: String,
}

impl Endpoint for Chat {
    const NAME: &'static str = "chat";
    const METHODS: &'static [Method] = &[Method::POST];

    type Payload = AnthropicMessage;
    type Output = ChatOutput;

    fn validate(request: &EndpointRequest) -> Result<Self, ProxyError> {
        let [message] = request.require_body_strs(["message"], "Message is required")?;
        Ok(Self { message })
    }

    fn upstream(&self, ctx: &Context<'_>) -> Result<UpstreamRequest, ProxyError> {
        let key = ctx.credentials.anthropic()?;
        let assistant = &ctx.config.assistant;
        let url = provider_url(&ctx.config.upstreams.anthropic, &["v1", "messages"])?;
        Ok(UpstreamRequest::post(Provider::Anthropic, url)
            .header("x-api-key", key)
            .header("anthropic-version", assistant.api_version.as_str())
            .json(json!({
                "model": assistant.model,
                "max_tokens": assistant.max_tokens,
                "system": STRATEGY_SYSTEM_PROMPT,
                "messages": [{ "role": "user", "content": self.message }],
            })))
    }

    fn normalize(self, message: AnthropicMessage) -> Result<ChatOutput, ProxyError> {
        message
            .content
            .into_iter()
            .find(|block| block.kind == "text")
            .and_then(|block| block.text)
            .map(|response| ChatOutput { response })
            .ok_or_else(|| ProxyError::unexpected("Anthropic returned no text content"))
    }

    fn upstream_failure(&self, _step: Step, failure: UpstreamFailure) -> ProxyError {
        failure.passthrough_with_message()
    }
}

/// POST /speak: text to speech.
pub struct Speak {
    text: String,
}

#[derive(Debug, Serialize)]
pub struct SpeakOutput {
    pub audio_url: Option<String>,
}

/// First non-empty string among `pointers`.
fn first_str(value: &Value, pointers: &[&str]) -> Option<String> {
    pointers
        .iter()
        .filter_map(|p| value.pointer(p).and_then(Value::as_str))
        .find(|s| !s.is_empty())
        .map(str::to_string)
}

impl Endpoint for Speak {
    const NAME: &'static str = "speak";
    const METHODS: &'static [Method] = &[Method::POST];

    type Payload = Value;
    type Output = SpeakOutput;

    fn validate(request: &EndpointRequest) -> Result<Self, ProxyError> {
        let [text] = request.require_body_strs(["text"], "Missing text")?;
        Ok(Self { text })
    }

    fn upstream(&self, ctx: &Context<'_>) -> Result<UpstreamRequest, ProxyError> {
        let key = ctx.credentials.heygen()?;
        let assistant = &ctx.config.assistant;
        let url = provider_url(
            &ctx.config.upstreams.heygen,
            &["v1", "audio", "text_to_speech"],
        )?;
        let text: String = self.text.chars().take(assistant.max_speech_chars).collect();
        Ok(UpstreamRequest::post(Provider::HeyGen, url)
            .header("x-api-key", key)
            .json(json!({
                "voice_id": assistant.voice_id,
                "text": text,
                "speed": 1.0,
            })))
    }

    fn normalize(self, data: Value) -> Result<SpeakOutput, ProxyError> {
        Ok(SpeakOutput {
            audio_url: first_str(&data, &["/data/audio_url", "/data/url", "/audio_url", "/url"]),
        })
    }

    fn upstream_failure(&self, _step: Step, failure: UpstreamFailure) -> ProxyError {
        ProxyError::Upstream {
            status: StatusCode::BAD_GATEWAY,
            error: format!("HeyGen error: {} {}", failure.status.as_u16(), failure.body),
            detail: None,
        }
    }
}

fn liveavatar_token_request(ctx: &Context<'_>) -> Result<UpstreamRequest, ProxyError> {
    let key = ctx.credentials.liveavatar()?;
    let assistant = &ctx.config.assistant;
    let url = provider_url(&ctx.config.upstreams.liveavatar, &["v1", "sessions", "token"])?;
    Ok(UpstreamRequest::post(Provider::LiveAvatar, url)
        .header("x-api-key", key)
        .json(json!({
            "mode": "FULL",
            "avatar_id": assistant.avatar_id,
            "avatar_persona": {
                "language": "en",
                "context_id": assistant.avatar_context_id,
            },
        })))
}

fn liveavatar_failure(failure: UpstreamFailure) -> ProxyError {
    let error = failure
        .message()
        .unwrap_or_else(|| "Token generation failed".to_string());
    ProxyError::Upstream {
        status: failure.status,
        error,
        detail: Some(failure.detail()),
    }
}

/// Session id and token, at the top level or under `data`.
fn session_credentials(token: &Value) -> (Option<String>, Option<String>) {
    (
        first_str(token, &["/session_id", "/data/session_id"]),
        first_str(token, &["/session_token", "/data/session_token"]),
    )
}

/// POST /liveavatar-token
pub struct LiveAvatarToken;

#[derive(Debug, Default, Serialize)]
pub struct SessionToken {
    pub session_id: Option<String>,
    pub session_token: Option<String>,
}

impl Endpoint for LiveAvatarToken {
    const NAME: &'static str = "liveavatar_token";
    const METHODS: &'static [Method] = &[Method::POST];

    type Payload = Value;
    type Output = SessionToken;

    fn validate(_request: &EndpointRequest) -> Result<Self, ProxyError> {
        Ok(Self)
    }

    fn upstream(&self, ctx: &Context<'_>) -> Result<UpstreamRequest, ProxyError> {
        liveavatar_token_request(ctx)
    }

    fn normalize(self, token: Value) -> Result<SessionToken, ProxyError> {
        let (session_id, session_token) = session_credentials(&token);
        Ok(SessionToken {
            session_id,
            session_token,
        })
    }

    fn upstream_failure(&self, _step: Step, failure: UpstreamFailure) -> ProxyError {
        liveavatar_failure(failure)
    }
}

/// POST /liveavatar-session: issue a token, then start the session with it.
#[derive(Debug, Default)]
pub struct LiveAvatarSession {
    session_id: Option<String>,
    session_token: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct LiveSession {
    pub session_id: Option<String>,
    pub session_token: Option<String>,
    pub livekit_url: Option<String>,
    pub livekit_token: Option<String>,
}

impl Endpoint for LiveAvatarSession {
    const NAME: &'static str = "liveavatar_session";
    const METHODS: &'static [Method] = &[Method::POST];

    type Payload = Value;
    type Output = LiveSession;

    fn validate(_request: &EndpointRequest) -> Result<Self, ProxyError> {
        Ok(Self::default())
    }

    fn upstream(&self, ctx: &Context<'_>) -> Result<UpstreamRequest, ProxyError> {
        liveavatar_token_request(ctx)
    }

    fn follow_up(
        &mut self,
        first: &Value,
        ctx: &Context<'_>,
    ) -> Result<Option<UpstreamRequest>, ProxyError> {
        let (session_id, session_token) = session_credentials(first);
        let token = session_token
            .clone()
            .ok_or_else(|| ProxyError::unexpected("LiveAvatar returned no session token"))?;
        self.session_id = session_id;
        self.session_token = session_token;

        let url = provider_url(&ctx.config.upstreams.liveavatar, &["v1", "sessions", "start"])?;
        Ok(Some(
            UpstreamRequest::post(Provider::LiveAvatar, url)
                .bearer(&token)
                .json(json!({})),
        ))
    }

    fn normalize(self, started: Value) -> Result<LiveSession, ProxyError> {
        Ok(LiveSession {
            livekit_url: first_str(&started, &["/data/livekit_url", "/data/url", "/livekit_url", "/url"]),
            livekit_token: first_str(
                &started,
                &[
                    "/data/livekit_client_token",
                    "/data/access_token",
                    "/data/token",
                    "/livekit_client_token",
                    "/access_token",
                    "/token",
                ],
            ),
            session_id: self
                .session_id
                .or_else(|| first_str(&started, &["/data/session_id", "/session_id"])),
            session_token: self.session_token,
        })
    }

    fn upstream_failure(&self, step: Step, failure: UpstreamFailure) -> ProxyError {
        match step {
            Step::First => liveavatar_failure(failure),
            Step::FollowUp => failure.passthrough_with_message(),
        }
    }
}
