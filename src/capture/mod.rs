//! Speech capture module
//!
//! Owns one listening episode at a time: starts the platform recognizer,
//! buffers confirmed fragments and uses a silence debounce to decide when
//! the user has finished an utterance.

mod debounce;
mod recognizer;
mod session;

pub use debounce::DebounceTimer;
pub use recognizer::{RecognitionUpdate, SpeechRecognizer};
pub use session::{CaptureError, CaptureSession, CaptureState};
