//! One listening episode, from start to finalized utterance
//!
//! The session moves Idle -> Listening when recognition starts,
//! Listening -> Finalizing once confirmed text is buffered and the silence
//! debounce is pending, and back to Idle when the utterance is emitted or the
//! episode is stopped, fails, or is torn down.

use std::time::Duration;

use tracing::{debug, info, warn};

use crate::config::RecognitionSettings;

use super::{DebounceTimer, RecognitionUpdate, SpeechRecognizer};

/// Listening state of a capture session
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum CaptureState {
    /// Recognition is not running
    #[default]
    Idle,
    /// Recognition is running, nothing confirmed yet
    Listening,
    /// Confirmed text buffered, waiting for the silence window to elapse
    Finalizing,
}

impl std::fmt::Display for CaptureState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CaptureState::Idle => write!(f, "Idle"),
            CaptureState::Listening => write!(f, "Listening"),
            CaptureState::Finalizing => write!(f, "Finalizing"),
        }
    }
}

/// Errors that can occur when starting capture
#[derive(Debug, thiserror::Error)]
pub enum CaptureError {
    #[error("speech recognition is not supported on this host")]
    Unsupported,

    #[error("a listening session is already active")]
    AlreadyListening,
}

/// Capture session owning the recognizer and the silence debounce
pub struct CaptureSession<T> {
    state: CaptureState,
    final_buffer: String,
    interim: String,
    silence_window: Duration,
    settings: RecognitionSettings,
    recognizer: Box<dyn SpeechRecognizer>,
    debounce: DebounceTimer<T>,
}

impl<T: Send + 'static> CaptureSession<T> {
    pub fn new(
        recognizer: Box<dyn SpeechRecognizer>,
        debounce: DebounceTimer<T>,
        settings: RecognitionSettings,
        silence_window: Duration,
    ) -> Self {
        Self {
            state: CaptureState::Idle,
            final_buffer: String::new(),
            interim: String::new(),
            silence_window,
            settings,
            recognizer,
            debounce,
        }
    }

    pub fn state(&self) -> CaptureState {
        self.state
    }

    pub fn is_active(&self) -> bool {
        self.state != CaptureState::Idle
    }

    /// Start a listening episode
    ///
    /// On `Unsupported` the session stays Idle; the caller is expected to
    /// surface a persistent notice.
    pub fn start(&mut self) -> Result<(), CaptureError> {
        if self.is_active() {
            return Err(CaptureError::AlreadyListening);
        }

        self.recognizer.start(&self.settings)?;
        self.reset();
        self.state = CaptureState::Listening;
        info!("listening started");
        Ok(())
    }

    /// Apply one recognition update and return the live transcript
    ///
    /// Every update carrying confirmed text restarts the silence debounce.
    /// Updates outside an active episode are ignored.
    pub fn on_update(&mut self, update: RecognitionUpdate) -> Option<String> {
        if !self.is_active() {
            debug!("recognition update outside a session, ignoring");
            return None;
        }

        for fragment in &update.finals {
            self.final_buffer.push_str(fragment);
            self.final_buffer.push(' ');
        }
        self.interim = update.interim.unwrap_or_default();

        if !self.final_buffer.trim().is_empty() {
            let generation = self.debounce.arm(self.silence_window);
            self.state = CaptureState::Finalizing;
            debug!(generation, "silence debounce armed");
        }

        let live = format!("{}{}", self.final_buffer, self.interim);
        let live = live.trim();
        if live.is_empty() {
            None
        } else {
            Some(live.to_string())
        }
    }

    /// Handle expiry of the silence debounce
    ///
    /// Returns the finalized utterance, or `None` when the expiry is stale or
    /// nothing was buffered.
    pub fn on_silence(&mut self, generation: u64) -> Option<String> {
        if !self.debounce.accept(generation) {
            debug!(generation, "stale debounce expiry, ignoring");
            return None;
        }

        self.finalize()
    }

    /// Manual stop: halt recognition without emitting anything
    pub fn stop(&mut self) {
        if !self.is_active() {
            return;
        }
        self.recognizer.stop();
        self.reset();
        info!("listening stopped");
    }

    /// The engine reported an error; abort silently, no retry
    pub fn on_error(&mut self, error: &str) {
        if !self.is_active() {
            return;
        }
        warn!(error, "speech recognition error, aborting session");
        self.recognizer.stop();
        self.reset();
    }

    /// The engine stopped on its own
    ///
    /// Pending text is dropped with the debounce; only an elapsed silence
    /// window produces an utterance.
    pub fn on_engine_end(&mut self) {
        if !self.is_active() {
            return;
        }
        if !self.final_buffer.trim().is_empty() {
            debug!("recognition engine ended before silence, discarding buffer");
        }
        self.reset();
    }

    fn finalize(&mut self) -> Option<String> {
        let utterance = self.final_buffer.trim().to_string();
        self.recognizer.stop();
        self.reset();

        if utterance.is_empty() {
            debug!("nothing buffered at end of speech");
            return None;
        }

        info!(chars = utterance.len(), "utterance finalized");
        Some(utterance)
    }

    fn reset(&mut self) {
        self.debounce.cancel();
        self.final_buffer.clear();
        self.interim.clear();
        self.state = CaptureState::Idle;
    }
}

#[cfg(test)]
mod tests {
    use std::sync::{Arc, Mutex};

    use tokio::sync::mpsc;

    use super::*;

    const WINDOW: Duration = Duration::from_millis(1500);

    #[derive(Default)]
    struct Calls {
        started: usize,
        stopped: usize,
    }

    struct FakeRecognizer {
        supported: bool,
        calls: Arc<Mutex<Calls>>,
    }

    impl SpeechRecognizer for FakeRecognizer {
        fn start(&mut self, _settings: &RecognitionSettings) -> Result<(), CaptureError> {
            if !self.supported {
                return Err(CaptureError::Unsupported);
            }
            self.calls.lock().unwrap().started += 1;
            Ok(())
        }

        fn stop(&mut self) {
            self.calls.lock().unwrap().stopped += 1;
        }
    }

    fn session(
        supported: bool,
    ) -> (
        CaptureSession<u64>,
        mpsc::Receiver<u64>,
        Arc<Mutex<Calls>>,
    ) {
        let (tx, rx) = mpsc::channel(8);
        let calls = Arc::new(Mutex::new(Calls::default()));
        let recognizer = FakeRecognizer {
            supported,
            calls: Arc::clone(&calls),
        };
        let session = CaptureSession::new(
            Box::new(recognizer),
            DebounceTimer::new(tx, |generation| generation),
            RecognitionSettings::default(),
            WINDOW,
        );
        (session, rx, calls)
    }

    #[tokio::test(start_paused = true)]
    async fn test_single_utterance_after_silence() {
        let (mut session, mut rx, calls) = session(true);
        session.start().unwrap();
        assert_eq!(session.state(), CaptureState::Listening);

        let live = session.on_update(RecognitionUpdate::interim("what is"));
        assert_eq!(live.as_deref(), Some("what is"));
        assert_eq!(session.state(), CaptureState::Listening);

        session.on_update(RecognitionUpdate::finals(["what is this"]));
        let live = session.on_update(RecognitionUpdate {
            finals: vec!["platform".to_string()],
            interim: Some("about".to_string()),
        });
        assert_eq!(live.as_deref(), Some("what is this platform about"));
        assert_eq!(session.state(), CaptureState::Finalizing);

        let generation = rx.recv().await.unwrap();
        let utterance = session.on_silence(generation);
        assert_eq!(utterance.as_deref(), Some("what is this platform"));
        assert_eq!(session.state(), CaptureState::Idle);
        assert_eq!(calls.lock().unwrap().stopped, 1);

        // Exactly one expiry was ever delivered
        assert!(rx.try_recv().is_err());
    }

    #[tokio::test(start_paused = true)]
    async fn test_fragments_keep_resetting_deadline() {
        let (mut session, mut rx, _calls) = session(true);
        session.start().unwrap();
        let started = tokio::time::Instant::now();

        for word in ["tell", "me", "about", "agents"] {
            session.on_update(RecognitionUpdate::finals([word]));
            let waited = tokio::time::timeout(Duration::from_millis(1400), rx.recv()).await;
            assert!(waited.is_err(), "emitted while fragments kept arriving");
        }
        assert!(started.elapsed() >= Duration::from_millis(5600));

        let generation = rx.recv().await.unwrap();
        assert_eq!(
            session.on_silence(generation).as_deref(),
            Some("tell me about agents")
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_interim_only_never_arms() {
        let (mut session, mut rx, _calls) = session(true);
        session.start().unwrap();
        session.on_update(RecognitionUpdate::interim("hmm"));

        let waited = tokio::time::timeout(Duration::from_secs(10), rx.recv()).await;
        assert!(waited.is_err());
        assert_eq!(session.state(), CaptureState::Listening);
    }

    #[tokio::test(start_paused = true)]
    async fn test_manual_stop_discards_buffer() {
        let (mut session, mut rx, calls) = session(true);
        session.start().unwrap();
        session.on_update(RecognitionUpdate::finals(["go to games"]));
        session.stop();

        assert_eq!(session.state(), CaptureState::Idle);
        assert_eq!(calls.lock().unwrap().stopped, 1);
        let waited = tokio::time::timeout(Duration::from_secs(5), rx.recv()).await;
        assert!(waited.is_err());
    }

    #[tokio::test(start_paused = true)]
    async fn test_error_mid_session_emits_nothing() {
        let (mut session, mut rx, _calls) = session(true);
        session.start().unwrap();
        session.on_update(RecognitionUpdate::finals(["how do agents"]));
        session.on_error("network");

        assert_eq!(session.state(), CaptureState::Idle);
        let waited = tokio::time::timeout(Duration::from_secs(5), rx.recv()).await;
        assert!(waited.is_err());
    }

    #[tokio::test(start_paused = true)]
    async fn test_stale_expiry_after_stop_is_ignored() {
        let (mut session, _rx, _calls) = session(true);
        session.start().unwrap();
        session.on_update(RecognitionUpdate::finals(["next"]));
        session.stop();
        session.start().unwrap();

        assert_eq!(session.on_silence(0), None);
        assert_eq!(session.on_silence(1), None);
        assert_eq!(session.state(), CaptureState::Listening);
    }

    #[tokio::test]
    async fn test_unsupported_stays_idle() {
        let (mut session, _rx, calls) = session(false);
        let result = session.start();
        assert!(matches!(result, Err(CaptureError::Unsupported)));
        assert_eq!(session.state(), CaptureState::Idle);
        assert_eq!(calls.lock().unwrap().started, 0);
    }

    #[tokio::test]
    async fn test_start_twice_rejected() {
        let (mut session, _rx, _calls) = session(true);
        session.start().unwrap();
        assert!(matches!(session.start(), Err(CaptureError::AlreadyListening)));
    }

    #[tokio::test(start_paused = true)]
    async fn test_engine_end_before_silence_emits_nothing() {
        let (mut session, mut rx, _calls) = session(true);
        session.start().unwrap();
        session.on_update(RecognitionUpdate::finals(["tell me about"]));
        tokio::time::sleep(Duration::from_millis(200)).await;

        session.on_engine_end();
        assert_eq!(session.state(), CaptureState::Idle);

        let waited = tokio::time::timeout(Duration::from_secs(5), rx.recv()).await;
        assert!(waited.is_err(), "utterance emitted before the silence window");
        assert_eq!(session.on_silence(0), None);

        // The next episode starts from an empty buffer
        session.start().unwrap();
        session.on_update(RecognitionUpdate::finals(["agents"]));
        let generation = rx.recv().await.unwrap();
        assert_eq!(session.on_silence(generation).as_deref(), Some("agents"));
    }
}
