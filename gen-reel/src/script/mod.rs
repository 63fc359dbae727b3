//! Script generation: rewrite a raw text chunk into short-form
//! narration with a hook, body, and call to action.
//!
//! This stage never fails a unit. Any error that survives its single
//! retry falls back to narrating the raw chunk text verbatim.

use provider_client::{ProviderError, TextGenProvider, TextGenRequest};
use serde::Deserialize;
use std::sync::Arc;
use std::time::Duration;

const SYSTEM_PROMPT: &str = "You are a scriptwriter for short vertical videos. You turn source \
     text into tight spoken narration that holds attention. Respond with \
     JSON only, no markdown, no commentary.";

const SCRIPT_TIMEOUT: Duration = Duration::from_secs(10);

/// A finished script for one unit.
#[derive(Debug, Clone)]
pub struct ScriptUnit {
    pub title: String,
    pub text: String,
    pub duration_hint_sec: Option<u32>,
    /// False when this is the raw chunk fallback
    pub generated: bool,
}

/// Expected provider reply shape.
#[derive(Debug, Deserialize)]
struct ScriptPayload {
    title: String,
    hook: String,
    narration: String,
    #[serde(default)]
    cta: String,
    #[serde(default)]
    #[allow(dead_code)]
    keywords: Vec<String>,
    #[serde(default)]
    estimated_duration_sec: Option<u32>,
}

/// Turns chunks into narration scripts via a text generation provider.
pub struct ScriptGenerator {
    provider: Arc<dyn TextGenProvider>,
    timeout: Duration,
}

impl ScriptGenerator {
    pub fn new(provider: Arc<dyn TextGenProvider>) -> Self {
        Self {
            provider,
            timeout: SCRIPT_TIMEOUT,
        }
    }

    /// Generate a script for one chunk. One retry on a transient error,
    /// then fall back to the chunk text itself; the pipeline keeps
    /// moving either way.
    pub async fn generate(&self, chunk_text: &str) -> ScriptUnit {
        for attempt in 1..=2u32 {
            match self.attempt(chunk_text).await {
                Ok(script) => return script,
                Err(err) if attempt == 1 && err.is_transient() => {
                    log::warn!("script generation failed, retrying once: {err}");
                }
                Err(err) => {
                    log::warn!("script generation failed, using raw chunk text: {err}");
                    break;
                }
            }
        }
        ScriptUnit {
            title: String::new(),
            text: chunk_text.to_string(),
            duration_hint_sec: None,
            generated: false,
        }
    }

    async fn attempt(&self, chunk_text: &str) -> Result<ScriptUnit, ProviderError> {
        let request = TextGenRequest {
            prompt: build_prompt(chunk_text),
            system_prompt: Some(SYSTEM_PROMPT.to_string()),
            max_tokens: Some(1024),
            temperature: Some(0.7),
        };

        let response = tokio::time::timeout(self.timeout, self.provider.complete(request))
            .await
            .map_err(|_| ProviderError::Timeout)??;

        parse_script(&response.content)
    }
}

fn build_prompt(chunk_text: &str) -> String {
    format!(
        "Rewrite the passage below as a short-form video script.\n\
         \n\
         Requirements:\n\
         - Open with a one-sentence hook that creates curiosity.\n\
         - Narration: conversational, punchy, 30-60 seconds when spoken.\n\
         - Keep every factual claim from the passage; add none.\n\
         - Close with a one-line call to action.\n\
         \n\
         Respond with a single JSON object:\n\
         {{\"title\": \"...\", \"hook\": \"...\", \"narration\": \"...\", \
         \"cta\": \"...\", \"keywords\": [\"...\"], \"estimated_duration_sec\": 45}}\n\
         \n\
         Passage:\n{chunk_text}"
    )
}

/// Parse the provider reply. Models sometimes wrap JSON in a markdown
/// code fence despite instructions, so strip one if present. A reply
/// that still fails to parse is treated as transient (the next attempt
/// may well produce valid JSON).
fn parse_script(content: &str) -> Result<ScriptUnit, ProviderError> {
    let body = strip_code_fence(content);
    let payload: ScriptPayload =
        serde_json::from_str(body).map_err(|e| ProviderError::ApiError {
            message: format!("malformed script payload: {e}"),
            status_code: None,
        })?;

    let mut parts = Vec::with_capacity(3);
    for part in [&payload.hook, &payload.narration, &payload.cta] {
        let trimmed = part.trim();
        if !trimmed.is_empty() {
            parts.push(trimmed);
        }
    }
    if parts.is_empty() {
        return Err(ProviderError::ApiError {
            message: "script payload has no narration content".to_string(),
            status_code: None,
        });
    }

    Ok(ScriptUnit {
        title: payload.title.trim().to_string(),
        text: parts.join(" "),
        duration_hint_sec: payload.estimated_duration_sec,
        generated: true,
    })
}

fn strip_code_fence(content: &str) -> &str {
    let trimmed = content.trim();
    let Some(rest) = trimmed.strip_prefix("```") else {
        return trimmed;
    };
    // Drop a language tag like "json" after the opening fence.
    let rest = rest.strip_prefix("json").unwrap_or(rest);
    rest.trim_start_matches(['\r', '\n'])
        .strip_suffix("```")
        .unwrap_or(rest)
        .trim()
}

#[cfg(test)]
mod tests {
    use super::*;
    use provider_client::MockTextGen;

    const GOOD_REPLY: &str = r#"{
        "title": "The Hidden Cost",
        "hook": "You are paying for this without knowing it.",
        "narration": "Every month a silent fee drains your account.",
        "cta": "Follow for part two.",
        "keywords": ["fees", "money"],
        "estimated_duration_sec": 42
    }"#;

    #[tokio::test]
    async fn test_generates_script_from_valid_reply() {
        let provider = Arc::new(MockTextGen::always_succeeds(GOOD_REPLY));
        let generator = ScriptGenerator::new(provider.clone());

        let script = generator.generate("Some source text.").await;
        assert!(script.generated);
        assert_eq!(script.title, "The Hidden Cost");
        assert!(script.text.starts_with("You are paying"));
        assert!(script.text.ends_with("Follow for part two."));
        assert_eq!(script.duration_hint_sec, Some(42));
        assert_eq!(provider.call_count(), 1);
    }

    #[tokio::test]
    async fn test_code_fenced_reply_accepted() {
        let fenced = format!("```json\n{GOOD_REPLY}\n```");
        let provider = Arc::new(MockTextGen::always_succeeds(&fenced));
        let generator = ScriptGenerator::new(provider);

        let script = generator.generate("Some source text.").await;
        assert!(script.generated);
        assert_eq!(script.title, "The Hidden Cost");
    }

    #[tokio::test]
    async fn test_transient_error_retried_once() {
        let provider = Arc::new(MockTextGen::fails_then_succeeds(
            1,
            ProviderError::ServerOverloaded {
                message: "busy".into(),
            },
            GOOD_REPLY,
        ));
        let generator = ScriptGenerator::new(provider.clone());

        let script = generator.generate("Some source text.").await;
        assert!(script.generated);
        assert_eq!(provider.call_count(), 2);
    }

    #[tokio::test]
    async fn test_falls_back_to_raw_chunk_after_retries() {
        let provider = Arc::new(MockTextGen::always_fails(ProviderError::Timeout));
        let generator = ScriptGenerator::new(provider.clone());

        let script = generator.generate("Original chunk text.").await;
        assert!(!script.generated);
        assert_eq!(script.text, "Original chunk text.");
        assert_eq!(provider.call_count(), 2);
    }

    #[tokio::test]
    async fn test_fatal_error_not_retried() {
        let provider = Arc::new(MockTextGen::always_fails(ProviderError::ContentRejected(
            "policy".into(),
        )));
        let generator = ScriptGenerator::new(provider.clone());

        let script = generator.generate("Original chunk text.").await;
        assert!(!script.generated);
        assert_eq!(provider.call_count(), 1);
    }

    #[tokio::test]
    async fn test_malformed_json_falls_back() {
        let provider = Arc::new(MockTextGen::always_succeeds("not json at all"));
        let generator = ScriptGenerator::new(provider.clone());

        let script = generator.generate("Chunk.").await;
        assert!(!script.generated);
        assert_eq!(script.text, "Chunk.");
        // Malformed payloads count as transient, so both attempts run.
        assert_eq!(provider.call_count(), 2);
    }

    #[test]
    fn test_strip_code_fence_variants() {
        assert_eq!(strip_code_fence("{\"a\":1}"), "{\"a\":1}");
        assert_eq!(strip_code_fence("```json\n{\"a\":1}\n```"), "{\"a\":1}");
        assert_eq!(strip_code_fence("```\n{\"a\":1}\n```"), "{\"a\":1}");
    }

    #[test]
    fn test_parse_rejects_empty_narration() {
        let reply = r#"{"title": "x", "hook": "", "narration": "  ", "cta": ""}"#;
        assert!(parse_script(reply).is_err());
    }
}
