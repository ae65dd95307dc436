use crate::diagnosis::Diagnosis;
use regex::Regex;
use std::sync::{Arc, OnceLock};
use triage_llm::GenerationClient;

/// Fixed fallback models tried after the configured primary.
const FALLBACK_MODELS: [&str; 2] = ["gemini-2.5-flash", "gemini-2.0-flash"];

/// Message returned when every candidate and parsing fallback is exhausted.
pub const SAFE_DEFAULT_MESSAGE: &str = "I couldn't generate a structured response right now. \
Please try again, or share recent command output so I can keep going.";

/// Coerces free-text model output into a well-formed [`Diagnosis`].
///
/// Model output is unreliable free text, so `reason` layers fallbacks
/// (fence-strip, brace-trim, regex extraction, fixed safe default) and is
/// total: it never returns an error to its caller.
pub struct StructuredReasoner {
    client: Arc<dyn GenerationClient>,
    primary_model: String,
    max_retries: usize,
}

impl StructuredReasoner {
    pub fn new(client: Arc<dyn GenerationClient>, primary_model: impl Into<String>) -> Self {
        Self {
            client,
            primary_model: primary_model.into(),
            max_retries: 2,
        }
    }

    /// Attempt at most `max_retries + 1` model candidates.
    pub fn with_max_retries(mut self, max_retries: usize) -> Self {
        self.max_retries = max_retries;
        self
    }

    /// Run one reasoning step over the rendered prompt.
    ///
    /// `query` is the user's problem statement, used only for logging context.
    pub async fn reason(&self, prompt: &str, query: &str) -> Diagnosis {
        let candidates = self.candidate_models();
        let attempts = candidates.len().min(self.max_retries + 1);

        for (attempt, model) in candidates[..attempts].iter().enumerate() {
            let last_attempt = attempt + 1 == attempts;
            tracing::debug!(attempt = attempt + 1, model = %model, "reasoning attempt");

            match self.client.generate(model, prompt).await {
                Ok(text) => {
                    if let Some(diagnosis) = parse_diagnosis(&text, last_attempt) {
                        return diagnosis.normalized();
                    }
                    tracing::warn!(
                        model = %model,
                        raw = %text.chars().take(200).collect::<String>(),
                        "failed to parse structured output"
                    );
                }
                Err(e) => {
                    tracing::warn!(model = %model, error = %e, "provider call failed");
                }
            }
        }

        tracing::warn!(query = %query, "all model candidates exhausted, returning safe default");
        Diagnosis::reply(SAFE_DEFAULT_MESSAGE)
    }

    fn candidate_models(&self) -> Vec<String> {
        let mut models = vec![self.primary_model.clone()];
        for fallback in FALLBACK_MODELS {
            if fallback != self.primary_model {
                models.push(fallback.to_string());
            }
        }
        models
    }
}

fn parse_diagnosis(text: &str, last_attempt: bool) -> Option<Diagnosis> {
    let isolated = isolate_json(text);
    if let Ok(diagnosis) = serde_json::from_str::<Diagnosis>(&isolated) {
        return Some(diagnosis);
    }

    // Last resort: pull out a brace-delimited fragment carrying a "message"
    // key and try once more.
    if last_attempt {
        if let Some(fragment) = extract_message_fragment(text) {
            if let Ok(diagnosis) = serde_json::from_str::<Diagnosis>(&fragment) {
                return Some(diagnosis);
            }
        }
    }

    None
}

/// Isolate a JSON object from loosely formatted model text: strip a fenced
/// block if present (```json first, then a bare fence), then trim anything
/// after the last `}` when the remainder starts with `{`.
fn isolate_json(text: &str) -> String {
    let trimmed = text.trim();

    let unfenced = strip_fence(trimmed, "```json")
        .or_else(|| strip_fence(trimmed, "```"))
        .unwrap_or(trimmed);

    let mut out = unfenced.trim().to_string();
    if out.starts_with('{') {
        if let Some(end) = out.rfind('}') {
            out.truncate(end + 1);
        }
    }
    out
}

fn strip_fence<'a>(text: &'a str, opener: &str) -> Option<&'a str> {
    let start = text.find(opener)? + opener.len();
    let rest = &text[start..];
    let end = rest.find("```")?;
    Some(&rest[..end])
}

fn extract_message_fragment(text: &str) -> Option<String> {
    static RE: OnceLock<Regex> = OnceLock::new();
    let re = RE.get_or_init(|| {
        Regex::new(r#"(?s)\{[^{}]*"message"[^{}]*\}"#).expect("valid fragment regex")
    });
    re.find(text).map(|m| m.as_str().to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::diagnosis::NextStep;
    use async_trait::async_trait;
    use std::collections::VecDeque;
    use std::sync::Mutex;
    use triage_llm::ProviderError;

    struct ScriptedClient {
        responses: Mutex<VecDeque<Result<String, ProviderError>>>,
    }

    impl ScriptedClient {
        fn new(responses: Vec<Result<String, ProviderError>>) -> Arc<Self> {
            Arc::new(Self {
                responses: Mutex::new(responses.into()),
            })
        }
    }

    #[async_trait]
    impl GenerationClient for ScriptedClient {
        async fn generate(&self, _model: &str, _prompt: &str) -> Result<String, ProviderError> {
            self.responses
                .lock()
                .unwrap()
                .pop_front()
                .unwrap_or(Err(ProviderError::EmptyResponse))
        }
    }

    fn reasoner(client: Arc<ScriptedClient>) -> StructuredReasoner {
        StructuredReasoner::new(client, "gemini-2.0-flash")
    }

    #[test]
    fn test_isolate_json_fenced() {
        let text = "```json\n{\"message\":\"ok\",\"command\":\"\",\"next_step\":\"message\"}\n```";
        assert_eq!(
            isolate_json(text),
            r#"{"message":"ok","command":"","next_step":"message"}"#
        );
    }

    #[test]
    fn test_isolate_json_bare_fence() {
        let text = "```\n{\"message\":\"hi\"}\n```";
        assert_eq!(isolate_json(text), r#"{"message":"hi"}"#);
    }

    #[test]
    fn test_isolate_json_trailing_noise() {
        let text = "{\"message\":\"hi\"} and that is my answer";
        assert_eq!(isolate_json(text), r#"{"message":"hi"}"#);
    }

    #[test]
    fn test_extract_message_fragment() {
        let text = "Sure, here you go: {\"message\":\"hi\",\"command\":\"\",\"next_step\":\"message\"} hope that helps";
        let fragment = extract_message_fragment(text).unwrap();
        assert!(fragment.starts_with('{'));
        assert!(fragment.contains("\"message\""));
    }

    #[tokio::test]
    async fn test_fenced_json_parses_unchanged() {
        // Scenario: provider wraps a valid object in a ```json fence
        let client = ScriptedClient::new(vec![Ok(
            "```json\n{\"message\":\"ok\",\"command\":\"\",\"next_step\":\"message\"}\n```"
                .to_string(),
        )]);
        let diagnosis = reasoner(client).reason("prompt", "query").await;
        assert_eq!(diagnosis.message, "ok");
        assert_eq!(diagnosis.command, "");
        assert_eq!(diagnosis.next_step, NextStep::Message);
    }

    #[tokio::test]
    async fn test_retry_advances_past_garbage() {
        let client = ScriptedClient::new(vec![
            Ok("not json at all".to_string()),
            Ok(r#"{"message":"checking","command":"df -h","next_step":"command"}"#.to_string()),
        ]);
        let diagnosis = reasoner(client).reason("prompt", "query").await;
        assert_eq!(diagnosis.command, "df -h");
        assert_eq!(diagnosis.next_step, NextStep::Command);
    }

    #[tokio::test]
    async fn test_provider_failure_advances_candidate() {
        let client = ScriptedClient::new(vec![
            Err(ProviderError::Api {
                status: 429,
                body: "rate limited".to_string(),
            }),
            Ok(r#"{"message":"m","command":"","next_step":"message"}"#.to_string()),
        ]);
        let diagnosis = reasoner(client).reason("prompt", "query").await;
        assert_eq!(diagnosis.message, "m");
    }

    #[tokio::test]
    async fn test_all_candidates_fail_yields_safe_default() {
        let client = ScriptedClient::new(vec![
            Err(ProviderError::EmptyResponse),
            Err(ProviderError::EmptyResponse),
            Err(ProviderError::EmptyResponse),
        ]);
        let diagnosis = reasoner(client).reason("prompt", "query").await;
        assert_eq!(diagnosis.message, SAFE_DEFAULT_MESSAGE);
        assert_eq!(diagnosis.command, "");
        assert_eq!(diagnosis.next_step, NextStep::Message);
    }

    #[tokio::test]
    async fn test_regex_fallback_on_final_attempt() {
        let client = ScriptedClient::new(vec![Ok(
            "I think the answer is {\"message\":\"use df\",\"command\":\"df -h\",\"next_step\":\"command\"} ok?"
                .to_string(),
        )]);
        let diagnosis = reasoner(client).with_max_retries(0).reason("p", "q").await;
        assert_eq!(diagnosis.command, "df -h");
    }

    #[tokio::test]
    async fn test_normalization_applied_to_parsed_output() {
        // model claims "message" while carrying a command; command wins
        let client = ScriptedClient::new(vec![Ok(
            r#"{"message":"m","command":"uptime","next_step":"message"}"#.to_string(),
        )]);
        let diagnosis = reasoner(client).reason("p", "q").await;
        assert_eq!(diagnosis.next_step, NextStep::Command);
    }

    #[tokio::test]
    async fn test_totality_on_adversarial_text() {
        for garbage in ["", "{", "}{", "```json```", "{\"command\":1}", "\u{0}\u{1}"] {
            let client = ScriptedClient::new(vec![
                Ok(garbage.to_string()),
                Ok(garbage.to_string()),
                Ok(garbage.to_string()),
            ]);
            let diagnosis = reasoner(client).reason("p", "q").await;
            assert_eq!(diagnosis.next_step, NextStep::Message);
            assert!(!diagnosis.message.is_empty());
        }
    }
}
