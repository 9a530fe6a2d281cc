//! Speech engines provided by the host UI
//!
//! The daemon has no audio of its own. Recognition and synthesis requests
//! are published as events, and the host reports results back over IPC.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use tokio::sync::broadcast;
use tracing::debug;

use crate::capture::{CaptureError, SpeechRecognizer};
use crate::config::{RecognitionSettings, VoiceSettings};
use crate::events::GuideEvent;
use crate::speech::{SpeechSynthesizer, SpokenUtterance};

/// Recognition capability as last reported by the host
#[derive(Debug, Clone, Default)]
pub struct HostCapabilities {
    recognition: Arc<AtomicBool>,
}

impl HostCapabilities {
    pub fn set_recognition(&self, available: bool) {
        self.recognition.store(available, Ordering::SeqCst);
    }

    pub fn recognition(&self) -> bool {
        self.recognition.load(Ordering::SeqCst)
    }
}

/// Recognizer that delegates to the host's speech engine
pub struct HostRecognizer {
    events: broadcast::Sender<GuideEvent>,
    capabilities: HostCapabilities,
}

impl HostRecognizer {
    pub fn new(events: broadcast::Sender<GuideEvent>, capabilities: HostCapabilities) -> Self {
        Self {
            events,
            capabilities,
        }
    }
}

impl SpeechRecognizer for HostRecognizer {
    fn start(&mut self, settings: &RecognitionSettings) -> Result<(), CaptureError> {
        if !self.capabilities.recognition() {
            return Err(CaptureError::Unsupported);
        }
        let _ = self.events.send(GuideEvent::RecognitionRequested {
            settings: settings.clone(),
        });
        Ok(())
    }

    fn stop(&mut self) {
        let _ = self.events.send(GuideEvent::RecognitionStopped);
    }
}

/// Synthesizer that delegates to the host's speech engine
pub struct HostSynthesizer {
    events: broadcast::Sender<GuideEvent>,
}

impl HostSynthesizer {
    pub fn new(events: broadcast::Sender<GuideEvent>) -> Self {
        Self { events }
    }
}

impl SpeechSynthesizer for HostSynthesizer {
    fn speak(&mut self, utterance: &SpokenUtterance, voice: &VoiceSettings) {
        debug!(token = utterance.token, "requesting speech");
        let _ = self.events.send(GuideEvent::Speak {
            token: utterance.token,
            text: utterance.text.clone(),
            voice: *voice,
        });
    }

    fn cancel_all(&mut self) {
        let _ = self.events.send(GuideEvent::CancelSpeech);
    }
}
