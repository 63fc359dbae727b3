//! Mock providers for testing
//!
//! Configurable mocks for all three capability interfaces, able to
//! simulate transient failures, fatal failures, and call gating for
//! cancellation tests.

use async_trait::async_trait;
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use tokio::sync::Semaphore;

use crate::error::{ProviderError, Result};
use crate::speech::{SpeechProvider, VoiceConfig};
use crate::text_gen::{TextGenProvider, TextGenRequest, TextGenResponse};
use crate::visual::VisualProvider;

/// Shared failure-injection state for the mock providers.
struct FailurePlan {
    /// Number of calls to fail before succeeding (usize::MAX = always fail)
    fail_count: AtomicUsize,
    /// Total calls observed
    call_count: AtomicUsize,
    /// Error to return on a failing call
    fail_with: Mutex<Option<ProviderError>>,
    /// Only fail calls whose input contains this substring
    fail_when_contains: Option<String>,
}

impl FailurePlan {
    fn succeeding() -> Self {
        Self {
            fail_count: AtomicUsize::new(0),
            call_count: AtomicUsize::new(0),
            fail_with: Mutex::new(None),
            fail_when_contains: None,
        }
    }

    fn failing(n: usize, error: ProviderError) -> Self {
        Self {
            fail_count: AtomicUsize::new(n),
            call_count: AtomicUsize::new(0),
            fail_with: Mutex::new(Some(error)),
            fail_when_contains: None,
        }
    }

    /// Record a call and decide whether it should fail.
    fn check(&self, input: &str) -> Result<()> {
        let call_num = self.call_count.fetch_add(1, Ordering::SeqCst);

        if let Some(needle) = &self.fail_when_contains {
            if !input.contains(needle.as_str()) {
                return Ok(());
            }
        }

        if call_num < self.fail_count.load(Ordering::SeqCst) {
            let error = self.fail_with.lock().unwrap();
            if let Some(err) = error.as_ref() {
                return Err(clone_error(err));
            }
        }
        Ok(())
    }
}

/// A mock text-generation provider.
pub struct MockTextGen {
    plan: FailurePlan,
    response: String,
}

impl MockTextGen {
    /// Create a provider that always returns the given content.
    pub fn always_succeeds(response: &str) -> Self {
        Self {
            plan: FailurePlan::succeeding(),
            response: response.to_string(),
        }
    }

    /// Create a provider that fails `n` times with the given error, then succeeds.
    pub fn fails_then_succeeds(n: usize, error: ProviderError, response: &str) -> Self {
        Self {
            plan: FailurePlan::failing(n, error),
            response: response.to_string(),
        }
    }

    /// Create a provider that always fails with the given error.
    pub fn always_fails(error: ProviderError) -> Self {
        Self {
            plan: FailurePlan::failing(usize::MAX, error),
            response: String::new(),
        }
    }

    /// Number of times complete() was called.
    pub fn call_count(&self) -> usize {
        self.plan.call_count.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl TextGenProvider for MockTextGen {
    async fn complete(&self, request: TextGenRequest) -> Result<TextGenResponse> {
        self.plan.check(&request.prompt)?;
        Ok(TextGenResponse {
            content: self.response.clone(),
            model: "mock-model".to_string(),
        })
    }

    fn name(&self) -> &'static str {
        "mock-text-gen"
    }
}

/// A mock speech-synthesis provider.
pub struct MockSpeech {
    plan: FailurePlan,
    audio: Vec<u8>,
    /// Calls started, including ones still blocked on the gate.
    started: AtomicUsize,
    /// Voice ids passed to completed calls, in call order.
    voice_ids: Mutex<Vec<String>>,
    /// When set, each call waits for one gate permit before returning.
    gate: Option<Arc<Semaphore>>,
}

impl MockSpeech {
    /// Create a provider that always returns the given audio bytes.
    pub fn always_succeeds(audio: &[u8]) -> Self {
        Self {
            plan: FailurePlan::succeeding(),
            audio: audio.to_vec(),
            started: AtomicUsize::new(0),
            voice_ids: Mutex::new(Vec::new()),
            gate: None,
        }
    }

    /// Create a provider that fails `n` times with the given error, then succeeds.
    pub fn fails_then_succeeds(n: usize, error: ProviderError, audio: &[u8]) -> Self {
        Self {
            plan: FailurePlan::failing(n, error),
            audio: audio.to_vec(),
            started: AtomicUsize::new(0),
            voice_ids: Mutex::new(Vec::new()),
            gate: None,
        }
    }

    /// Create a provider that always fails with the given error.
    pub fn always_fails(error: ProviderError) -> Self {
        Self {
            plan: FailurePlan::failing(usize::MAX, error),
            audio: Vec::new(),
            started: AtomicUsize::new(0),
            voice_ids: Mutex::new(Vec::new()),
            gate: None,
        }
    }

    /// Only fail calls whose text contains `needle`; other calls succeed.
    pub fn failing_for_text(needle: &str, error: ProviderError, audio: &[u8]) -> Self {
        let mut plan = FailurePlan::failing(usize::MAX, error);
        plan.fail_when_contains = Some(needle.to_string());
        Self {
            plan,
            audio: audio.to_vec(),
            started: AtomicUsize::new(0),
            voice_ids: Mutex::new(Vec::new()),
            gate: None,
        }
    }

    /// Block each call until a permit is added to `gate`.
    pub fn with_gate(mut self, gate: Arc<Semaphore>) -> Self {
        self.gate = Some(gate);
        self
    }

    /// Number of times synthesize() was called.
    pub fn call_count(&self) -> usize {
        self.plan.call_count.load(Ordering::SeqCst)
    }

    /// Number of calls that have started (possibly still gated).
    pub fn started_count(&self) -> usize {
        self.started.load(Ordering::SeqCst)
    }

    /// Voice ids used by calls that reached the provider, in call order.
    pub fn used_voice_ids(&self) -> Vec<String> {
        self.voice_ids.lock().unwrap().clone()
    }
}

#[async_trait]
impl SpeechProvider for MockSpeech {
    async fn synthesize(&self, text: &str, voice: &VoiceConfig) -> Result<Vec<u8>> {
        self.started.fetch_add(1, Ordering::SeqCst);
        if let Some(gate) = &self.gate {
            let permit = gate.acquire().await.map_err(|_| ProviderError::Timeout)?;
            permit.forget();
        }
        self.voice_ids.lock().unwrap().push(voice.voice_id.clone());
        self.plan.check(text)?;
        Ok(self.audio.clone())
    }

    fn name(&self) -> &'static str {
        "mock-speech"
    }
}

/// A mock visual-generation provider.
pub struct MockVisual {
    plan: FailurePlan,
    asset: Vec<u8>,
}

impl MockVisual {
    /// Create a provider that always returns the given asset bytes.
    pub fn always_succeeds(asset: &[u8]) -> Self {
        Self {
            plan: FailurePlan::succeeding(),
            asset: asset.to_vec(),
        }
    }

    /// Create a provider that always fails with the given error.
    pub fn always_fails(error: ProviderError) -> Self {
        Self {
            plan: FailurePlan::failing(usize::MAX, error),
            asset: Vec::new(),
        }
    }

    /// Number of times render() was called.
    pub fn call_count(&self) -> usize {
        self.plan.call_count.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl VisualProvider for MockVisual {
    async fn render(&self, script_text: &str, _duration_hint_sec: Option<u32>) -> Result<Vec<u8>> {
        self.plan.check(script_text)?;
        Ok(self.asset.clone())
    }

    fn name(&self) -> &'static str {
        "mock-visual"
    }
}

/// Clone a ProviderError (needed because ProviderError doesn't implement Clone)
fn clone_error(err: &ProviderError) -> ProviderError {
    match err {
        ProviderError::RateLimited { retry_after } => ProviderError::RateLimited {
            retry_after: *retry_after,
        },
        ProviderError::AuthFailure(s) => ProviderError::AuthFailure(s.clone()),
        ProviderError::ContentRejected(s) => ProviderError::ContentRejected(s.clone()),
        ProviderError::Timeout => ProviderError::Timeout,
        ProviderError::ServerOverloaded { message } => ProviderError::ServerOverloaded {
            message: message.clone(),
        },
        ProviderError::ApiError {
            message,
            status_code,
        } => ProviderError::ApiError {
            message: message.clone(),
            status_code: *status_code,
        },
        // IO errors can't be cloned; a generic stand-in keeps the class.
        ProviderError::Io(_) => ProviderError::ApiError {
            message: "IO error (mock)".to_string(),
            status_code: None,
        },
    }
}
