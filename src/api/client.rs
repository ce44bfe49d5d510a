use super::collaborator::{Collaborator, CollaboratorRequest, CollaboratorSink};
use super::logging::{debug_payload_enabled, emit_debug_payload};
use super::stream::StreamParser;
use crate::agents::{AgentPersona, AgentRegistry};
use crate::config::Config;
use crate::error::AssistError;
use crate::types::gemini::{
    Content, GenerateContentRequest, GenerateContentResponse, GenerationConfig, GoogleSearch,
    ThinkingConfig, Tool,
};
use crate::types::{CommandKind, StreamResult};
use crate::util::is_local_endpoint_url;
use anyhow::Result;
use async_trait::async_trait;
use bytes::Bytes;
use futures::StreamExt;
use std::sync::Arc;

const OUTPUT_RULE: &str = "Output ONLY the requested content directly usable in the editor.";
const MEMORY_HINT: &str = "(Use this information to inform your response)";
const PRO_THINKING_BUDGET: u32 = 1024;

/// Production collaborator backed by the Gemini REST API.
#[derive(Clone)]
pub struct GeminiClient {
    http: reqwest::Client,
    api_key: Option<String>,
    api_url: String,
    registry: Arc<AgentRegistry>,
}

impl GeminiClient {
    pub fn new(config: &Config, registry: Arc<AgentRegistry>) -> Result<Self> {
        // Idle limit between reads; a stream has no total deadline.
        let mut builder = reqwest::Client::builder()
            .connect_timeout(config.request_timeout)
            .read_timeout(config.request_timeout);
        if is_local_endpoint_url(&config.api_url) {
            builder = builder.no_proxy();
        }
        let http = builder.build()?;
        Ok(Self {
            http,
            api_key: config.api_key.clone(),
            api_url: config.api_url.trim_end_matches('/').to_string(),
            registry,
        })
    }

    pub fn is_local_endpoint(&self) -> bool {
        is_local_endpoint_url(&self.api_url)
    }

    fn model_url(&self, model: &str, method: &str) -> String {
        format!("{}/models/{model}:{method}", self.api_url)
    }

    async fn post(
        &self,
        request_url: &str,
        payload: &GenerateContentRequest,
    ) -> Result<reqwest::Response, AssistError> {
        if debug_payload_enabled() {
            if let Ok(value) = serde_json::to_value(payload) {
                emit_debug_payload(request_url, &value);
            }
        }

        let mut request = self
            .http
            .post(request_url)
            .header("content-type", "application/json")
            .json(payload);
        if let Some(api_key) = &self.api_key {
            request = request.header("x-goog-api-key", api_key);
        }

        request
            .send()
            .await
            .map_err(|error| map_request_error(error, request_url))?
            .error_for_status()
            .map_err(|error| map_request_error(error, request_url))
    }

    async fn stream_text(
        &self,
        persona: &AgentPersona,
        request: &CollaboratorRequest,
        sink: &CollaboratorSink,
    ) -> Result<StreamResult, AssistError> {
        let request_url = format!(
            "{}?alt=sse",
            self.model_url(&persona.model, "streamGenerateContent")
        );
        let payload = build_text_request(persona, request);
        let response = self.post(&request_url, &payload).await?;
        sink.accepted();

        let mut parser = StreamParser::new();
        let mut result = StreamResult::default();
        let mut body = response.bytes_stream();
        while let Some(item) = body.next().await {
            if sink.is_closed() {
                return Err(AssistError::Cancelled);
            }
            let bytes: Bytes = item.map_err(|error| map_request_error(error, &request_url))?;
            for event in parser.process(&bytes) {
                absorb_stream_event(event, &mut result, sink)?;
            }
        }
        for event in parser.finish() {
            absorb_stream_event(event, &mut result, sink)?;
        }

        Ok(result)
    }

    async fn generate_image(
        &self,
        persona: &AgentPersona,
        request: &CollaboratorRequest,
        sink: &CollaboratorSink,
    ) -> Result<StreamResult, AssistError> {
        let request_url = self.model_url(&persona.model, "generateContent");
        let payload = build_image_request(request);
        let response = self.post(&request_url, &payload).await?;
        sink.accepted();

        let response: GenerateContentResponse = response
            .json()
            .await
            .map_err(|error| AssistError::MalformedResponse(format!("{request_url}: {error}")))?;
        if let Some(error) = response.error {
            return Err(backend_error(error.code, &error.message));
        }

        let text = response.text();
        if !text.is_empty() {
            sink.chunk(text.clone());
        }
        Ok(StreamResult {
            text,
            images: response
                .inline_images()
                .map(|image| image.data.clone())
                .collect(),
            ..StreamResult::default()
        })
    }
}

#[async_trait]
impl Collaborator for GeminiClient {
    async fn stream(
        &self,
        request: CollaboratorRequest,
        sink: CollaboratorSink,
    ) -> Result<StreamResult, AssistError> {
        let persona = self.registry.resolve(&request.agent_id).clone();
        if persona.is_image() {
            self.generate_image(&persona, &request, &sink).await
        } else {
            self.stream_text(&persona, &request, &sink).await
        }
    }
}

fn absorb_stream_event(
    event: GenerateContentResponse,
    result: &mut StreamResult,
    sink: &CollaboratorSink,
) -> Result<(), AssistError> {
    if let Some(error) = event.error.as_ref() {
        return Err(backend_error(error.code, &error.message));
    }
    result
        .source_urls
        .extend(event.grounding_uris().map(str::to_owned));
    let text = event.text();
    if !text.is_empty() {
        result.text.push_str(&text);
        sink.chunk(result.text.clone());
    }
    Ok(())
}

fn backend_error(code: Option<u16>, message: &str) -> AssistError {
    match code {
        Some(code) => AssistError::CollaboratorUnavailable(format!("backend error {code}: {message}")),
        None => AssistError::CollaboratorUnavailable(format!("backend error: {message}")),
    }
}

fn map_request_error(error: reqwest::Error, request_url: &str) -> AssistError {
    let message = if error.is_connect() && is_local_endpoint_url(request_url) {
        format!(
            "cannot reach local API endpoint '{request_url}': {error}. Start your local server or update AGENTKEY_API_URL."
        )
    } else if error.is_connect() {
        format!("cannot reach API endpoint '{request_url}': {error}")
    } else if error.is_timeout() {
        format!("API request to '{request_url}' timed out: {error}")
    } else if let Some(status) = error.status() {
        format!("API endpoint '{request_url}' returned HTTP {status}: {error}")
    } else if error.is_decode() || error.is_body() {
        return AssistError::MalformedResponse(format!("'{request_url}': {error}"));
    } else {
        format!("API request to '{request_url}' failed: {error}")
    };
    AssistError::CollaboratorUnavailable(message)
}

pub fn command_instruction(command: CommandKind) -> &'static str {
    match command {
        CommandKind::Fix => "Fix the problems in the text. ",
        CommandKind::Ask => "Answer the question. ",
        CommandKind::Polite => "Rewrite the text in a polite, professional tone. ",
        CommandKind::Meme => "Make it a meme. ",
        CommandKind::General | CommandKind::Save => "",
    }
}

/// User turn for text personas.
pub fn compose_prompt(request: &CollaboratorRequest) -> String {
    let mut prompt = format!(
        "Prompt: {}{}\n\nContext from editor:\n{}",
        command_instruction(request.command),
        request.prompt,
        request.context_snippet
    );
    if let Some(memory) = request.memory_snippet.as_deref() {
        prompt.push_str("\n\n[PRIOR SAVED CONTEXT/MEMORY]:\n");
        prompt.push_str(memory);
        prompt.push('\n');
        prompt.push_str(MEMORY_HINT);
    }
    prompt
}

pub fn system_instruction(persona: &AgentPersona) -> String {
    format!("{}\n{OUTPUT_RULE}", persona.system_instruction)
}

fn thinking_budget(persona: &AgentPersona) -> Option<u32> {
    (persona.model.contains("-pro-") && !persona.search).then_some(PRO_THINKING_BUDGET)
}

pub fn build_text_request(
    persona: &AgentPersona,
    request: &CollaboratorRequest,
) -> GenerateContentRequest {
    GenerateContentRequest {
        contents: vec![Content::user_text(compose_prompt(request))],
        system_instruction: Some(Content::system_text(system_instruction(persona))),
        generation_config: thinking_budget(persona).map(|thinking_budget| GenerationConfig {
            thinking_config: ThinkingConfig { thinking_budget },
        }),
        tools: persona.search.then(|| {
            vec![Tool {
                google_search: GoogleSearch::default(),
            }]
        }),
    }
}

pub fn build_image_request(request: &CollaboratorRequest) -> GenerateContentRequest {
    let prompt = format!(
        "Generate an image based on this context and prompt: {}{}. Context: {}",
        command_instruction(request.command),
        request.prompt,
        request.context_snippet
    );
    GenerateContentRequest {
        contents: vec![Content::user_text(prompt)],
        system_instruction: None,
        generation_config: None,
        tools: None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn request(command: CommandKind, memory: Option<&str>) -> CollaboratorRequest {
        CollaboratorRequest {
            prompt: "this".to_string(),
            context_snippet: "hello ".to_string(),
            memory_snippet: memory.map(str::to_string),
            agent_id: "default".to_string(),
            command,
        }
    }

    #[test]
    fn test_compose_prompt_without_memory() {
        assert_eq!(
            compose_prompt(&request(CommandKind::Fix, None)),
            "Prompt: Fix the problems in the text. this\n\nContext from editor:\nhello "
        );
    }

    #[test]
    fn test_compose_prompt_appends_memory() {
        let prompt = compose_prompt(&request(CommandKind::General, Some("Project code: 884-Bravo-X")));
        assert!(prompt.starts_with("Prompt: this\n\nContext from editor:\nhello "));
        assert!(prompt.ends_with(
            "\n\n[PRIOR SAVED CONTEXT/MEMORY]:\nProject code: 884-Bravo-X\n(Use this information to inform your response)"
        ));
    }

    #[test]
    fn test_text_request_shape_for_pro_persona() {
        let registry = AgentRegistry::builtin();
        let coder = registry.resolve("coder");
        let payload = serde_json::to_value(build_text_request(coder, &request(CommandKind::General, None)))
            .expect("serializes");
        assert_eq!(payload["contents"][0]["role"], json!("user"));
        assert_eq!(
            payload["generationConfig"]["thinkingConfig"]["thinkingBudget"],
            json!(1024)
        );
        assert!(payload.get("tools").is_none());
        let system = payload["systemInstruction"]["parts"][0]["text"]
            .as_str()
            .expect("system text");
        assert!(system.starts_with("You are a Senior Software Engineer."));
        assert!(system.ends_with("\nOutput ONLY the requested content directly usable in the editor."));
    }

    #[test]
    fn test_search_persona_gets_search_tool_and_no_thinking() {
        let registry = AgentRegistry::builtin();
        let researcher = registry.resolve("researcher");
        let payload = serde_json::to_value(build_text_request(researcher, &request(CommandKind::Ask, None)))
            .expect("serializes");
        assert_eq!(payload["tools"], json!([{ "googleSearch": {} }]));
        assert!(payload.get("generationConfig").is_none());
    }

    #[test]
    fn test_flash_persona_has_no_thinking_budget() {
        let registry = AgentRegistry::builtin();
        assert_eq!(thinking_budget(registry.default_persona()), None);
    }

    #[test]
    fn test_image_request_inlines_prompt_and_context() {
        let payload = serde_json::to_value(build_image_request(&request(CommandKind::General, Some("m"))))
            .expect("serializes");
        assert_eq!(
            payload["contents"][0]["parts"][0]["text"],
            json!("Generate an image based on this context and prompt: this. Context: hello ")
        );
        assert!(payload.get("systemInstruction").is_none());
    }

    #[test]
    fn test_model_url_and_local_detection() {
        let config = Config {
            api_url: "http://localhost:9000/v1beta/".to_string(),
            ..Config::default()
        };
        let client = GeminiClient::new(&config, Arc::new(AgentRegistry::builtin())).expect("client");
        assert!(client.is_local_endpoint());
        assert_eq!(
            client.model_url("gemini-3-flash-preview", "generateContent"),
            "http://localhost:9000/v1beta/models/gemini-3-flash-preview:generateContent"
        );
    }

    #[test]
    fn test_stream_events_accumulate_and_report_full_text() {
        let (sink, mut rx) = CollaboratorSink::channel();
        let mut result = StreamResult::default();
        for raw in [
            r#"{"candidates":[{"content":{"parts":[{"text":"HEL"}]}}]}"#,
            r#"{"candidates":[{"content":{"parts":[{"text":"step","thought":true},{"text":"LO "}]},"groundingMetadata":{"groundingChunks":[{"web":{"uri":"https://a.example/x"}},{"web":{"uri":"https://a.example/x"}}]}}]}"#,
        ] {
            let event: GenerateContentResponse = serde_json::from_str(raw).expect("valid");
            absorb_stream_event(event, &mut result, &sink).expect("no error");
        }
        assert_eq!(result.text, "HELLO ");
        assert_eq!(result.source_urls.len(), 1);
        let mut chunks = Vec::new();
        while let Ok(event) = rx.try_recv() {
            chunks.push(event);
        }
        assert_eq!(
            chunks,
            vec![
                crate::api::CollaboratorEvent::Chunk("HEL".to_string()),
                crate::api::CollaboratorEvent::Chunk("HELLO ".to_string()),
            ]
        );
    }

    #[test]
    fn test_inline_error_event_fails_the_stream() {
        let (sink, _rx) = CollaboratorSink::channel();
        let mut result = StreamResult::default();
        let event: GenerateContentResponse =
            serde_json::from_str(r#"{"error":{"code":429,"message":"quota"}}"#).expect("valid");
        assert_eq!(
            absorb_stream_event(event, &mut result, &sink),
            Err(AssistError::CollaboratorUnavailable(
                "backend error 429: quota".to_string()
            ))
        );
    }
}
