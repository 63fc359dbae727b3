//! Shared capability-provider client library for the gen-reel workspace
//!
//! Provides unified trait interfaces for the external capabilities the
//! pipeline depends on:
//! - Text generation (DeepSeek-compatible chat completions)
//! - Speech synthesis (ElevenLabs)
//! - Visual generation (interface only, no hosted provider yet)
//!
//! All providers share one error taxonomy so callers can decide between
//! retrying and giving up without knowing which provider they hold.

pub mod error;
pub mod providers;
pub mod speech;
pub mod text_gen;
pub mod visual;

pub use error::{ProviderError, Result};
pub use providers::{DeepSeekProvider, ElevenLabsProvider, MockSpeech, MockTextGen, MockVisual};
pub use speech::{SpeechProvider, VoiceConfig};
pub use text_gen::{TextGenProvider, TextGenRequest, TextGenResponse};
pub use visual::VisualProvider;
