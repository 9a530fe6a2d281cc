//! Spoken output
//!
//! The arbiter guarantees a single active spoken utterance: every new
//! request preempts whatever is still playing.

mod arbiter;
mod synthesizer;

pub use arbiter::{SpeechArbiter, SpokenUtterance};
pub use synthesizer::SpeechSynthesizer;
