//! Boundary with the platform text-to-speech engine

use crate::config::VoiceSettings;

use super::SpokenUtterance;

/// Platform speech synthesis collaborator
pub trait SpeechSynthesizer: Send {
    /// Begin speaking an utterance with the given voice
    fn speak(&mut self, utterance: &SpokenUtterance, voice: &VoiceSettings);

    /// Stop all speech immediately
    fn cancel_all(&mut self);
}
