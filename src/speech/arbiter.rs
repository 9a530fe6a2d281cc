//! Preempting speech output arbiter

use tracing::{debug, info};

use crate::config::VoiceSettings;

use super::SpeechSynthesizer;

/// Text currently owned by the speech engine
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SpokenUtterance {
    /// Identity used to recognise a superseded utterance
    pub token: u64,
    pub text: String,
}

/// Serializes spoken replies; starting a new one always cancels the old one
pub struct SpeechArbiter {
    synthesizer: Box<dyn SpeechSynthesizer>,
    voice: VoiceSettings,
    active: Option<SpokenUtterance>,
    next_token: u64,
}

impl SpeechArbiter {
    pub fn new(synthesizer: Box<dyn SpeechSynthesizer>, voice: VoiceSettings) -> Self {
        Self {
            synthesizer,
            voice,
            active: None,
            next_token: 1,
        }
    }

    /// Cancel whatever is playing, then speak `text`
    pub fn speak(&mut self, text: &str) -> u64 {
        self.synthesizer.cancel_all();
        if let Some(previous) = self.active.take() {
            debug!(token = previous.token, "preempting spoken utterance");
        }

        let utterance = SpokenUtterance {
            token: self.next_token,
            text: text.to_string(),
        };
        self.next_token += 1;

        self.synthesizer.speak(&utterance, &self.voice);
        let token = utterance.token;
        self.active = Some(utterance);
        token
    }

    /// Cancel the active utterance without starting another
    pub fn silence(&mut self) {
        self.synthesizer.cancel_all();
        if let Some(previous) = self.active.take() {
            info!(token = previous.token, "speech silenced");
        }
    }

    /// The engine finished speaking; only the current token frees the slot
    pub fn finished(&mut self, token: u64) {
        match &self.active {
            Some(active) if active.token == token => {
                debug!(token, "utterance finished");
                self.active = None;
            }
            _ => debug!(token, "finish for superseded utterance, ignoring"),
        }
    }

    #[cfg(test)]
    pub fn active(&self) -> Option<&SpokenUtterance> {
        self.active.as_ref()
    }
}

#[cfg(test)]
mod tests {
    use std::sync::{Arc, Mutex};

    use super::*;

    /// Models an engine with a single audio channel
    #[derive(Default)]
    struct Engine {
        playing: Option<String>,
        interrupted: Vec<String>,
        voices: Vec<VoiceSettings>,
    }

    struct FakeSynthesizer(Arc<Mutex<Engine>>);

    impl SpeechSynthesizer for FakeSynthesizer {
        fn speak(&mut self, utterance: &SpokenUtterance, voice: &VoiceSettings) {
            let mut engine = self.0.lock().unwrap();
            engine.playing = Some(utterance.text.clone());
            engine.voices.push(*voice);
        }

        fn cancel_all(&mut self) {
            let mut engine = self.0.lock().unwrap();
            if let Some(text) = engine.playing.take() {
                engine.interrupted.push(text);
            }
        }
    }

    fn arbiter() -> (SpeechArbiter, Arc<Mutex<Engine>>) {
        let engine = Arc::new(Mutex::new(Engine::default()));
        let arbiter = SpeechArbiter::new(
            Box::new(FakeSynthesizer(Arc::clone(&engine))),
            VoiceSettings::default(),
        );
        (arbiter, engine)
    }

    #[test]
    fn test_new_speech_preempts_previous() {
        let (mut arbiter, engine) = arbiter();
        arbiter.speak("A");
        let token = arbiter.speak("B");

        let engine = engine.lock().unwrap();
        assert_eq!(engine.playing.as_deref(), Some("B"));
        assert_eq!(engine.interrupted, vec!["A".to_string()]);
        assert_eq!(arbiter.active().map(|u| u.token), Some(token));
    }

    #[test]
    fn test_silence_clears_slot() {
        let (mut arbiter, engine) = arbiter();
        arbiter.speak("hello");
        arbiter.silence();

        assert!(arbiter.active().is_none());
        assert!(engine.lock().unwrap().playing.is_none());
    }

    #[test]
    fn test_stale_finish_keeps_active() {
        let (mut arbiter, _engine) = arbiter();
        let first = arbiter.speak("first");
        let second = arbiter.speak("second");

        arbiter.finished(first);
        assert_eq!(arbiter.active().map(|u| u.token), Some(second));

        arbiter.finished(second);
        assert!(arbiter.active().is_none());
    }

    #[test]
    fn test_voice_is_fixed() {
        let (mut arbiter, engine) = arbiter();
        arbiter.speak("one");
        arbiter.speak("two");

        let engine = engine.lock().unwrap();
        assert!(engine.voices.iter().all(|v| *v == VoiceSettings::default()));
    }
}
