//! Provider implementations.

pub mod deepseek;
pub mod elevenlabs;
pub mod mock;

pub use deepseek::DeepSeekProvider;
pub use elevenlabs::ElevenLabsProvider;
pub use mock::{MockSpeech, MockTextGen, MockVisual};
