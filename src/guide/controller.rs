//! Guide controller
//!
//! Single actor that owns the capture session, the speech arbiter and the
//! conversation memory. Inputs are processed one at a time; the silence
//! debounce and the remote assistant call run as spawned tasks that report
//! back through the same input channel.

use tokio::sync::{broadcast, mpsc};
use tracing::{debug, info, warn};

use crate::assistant::AssistantClient;
use crate::capture::{
    CaptureError, CaptureSession, DebounceTimer, RecognitionUpdate, SpeechRecognizer,
};
use crate::config::Config;
use crate::events::GuideEvent;
use crate::intent::{self, rules, ControlAction, IntentMatch, NavigationContext};
use crate::memory::{ConversationMemory, ConversationTurn};
use crate::speech::{SpeechArbiter, SpeechSynthesizer};

use super::signal::OpenSignal;
use super::slides::{self, HOME_SLIDES};
use super::GuideState;

/// Everything the controller reacts to
#[derive(Debug, Clone)]
pub enum GuideInput {
    /// Show the panel
    Open,
    /// Hide the panel, stopping any capture
    Close,
    /// Listen button: stop if listening, otherwise start
    ToggleListening,
    /// Recognition results from the host engine
    RecognitionResult(RecognitionUpdate),
    /// The host engine failed
    RecognitionError(String),
    /// The host engine stopped
    RecognitionEnded,
    /// The host finished speaking an utterance
    SpeechFinished { token: u64 },
    /// The silence debounce expired
    SilenceElapsed { generation: u64 },
    /// The remote assistant call completed
    RemoteReply {
        question: String,
        reply: Option<String>,
    },
}

/// The guide state machine
pub struct GuideController {
    panel_open: bool,
    capture: CaptureSession<GuideInput>,
    speech: SpeechArbiter,
    memory: ConversationMemory,
    assistant: AssistantClient,
    slide_index: usize,
    pending_remote: usize,
    state: GuideState,
    input_tx: mpsc::Sender<GuideInput>,
    event_tx: broadcast::Sender<GuideEvent>,
}

impl GuideController {
    /// Create a controller
    ///
    /// `input_tx` must feed the receiver later passed to `run`; timers and
    /// remote calls report back through it.
    pub fn new(
        config: &Config,
        recognizer: Box<dyn SpeechRecognizer>,
        synthesizer: Box<dyn SpeechSynthesizer>,
        assistant: AssistantClient,
        input_tx: mpsc::Sender<GuideInput>,
        event_tx: broadcast::Sender<GuideEvent>,
    ) -> Self {
        let debounce = DebounceTimer::new(input_tx.clone(), |generation| {
            GuideInput::SilenceElapsed { generation }
        });
        let capture = CaptureSession::new(
            recognizer,
            debounce,
            config.recognition.clone(),
            config.silence_window,
        );

        Self {
            panel_open: false,
            capture,
            speech: SpeechArbiter::new(synthesizer, config.voice),
            memory: ConversationMemory::new(),
            assistant,
            slide_index: 0,
            pending_remote: 0,
            state: GuideState::Closed,
            input_tx,
            event_tx,
        }
    }

    /// Get the current state
    pub fn state(&self) -> GuideState {
        self.state
    }

    /// Run the controller until the surrounding task is cancelled
    ///
    /// The controller holds its own input sender for timers and remote calls,
    /// so the input channel stays open while it runs. Call `teardown` once
    /// the run future has been dropped.
    pub async fn run(&mut self, mut input_rx: mpsc::Receiver<GuideInput>, signal: &OpenSignal) {
        info!("guide controller started in Closed state");

        let mut open_rx = signal.subscribe();
        let mut signal_live = true;

        loop {
            tokio::select! {
                Some(input) = input_rx.recv() => self.handle(input),
                opened = open_rx.recv(), if signal_live => match opened {
                    Ok(()) | Err(broadcast::error::RecvError::Lagged(_)) => {
                        self.handle(GuideInput::Open);
                    }
                    Err(broadcast::error::RecvError::Closed) => {
                        signal_live = false;
                    }
                },
                else => break,
            }
        }
    }

    /// Stop any capture; the controller is going away
    pub fn teardown(&mut self) {
        self.capture.stop();
        self.sync_state();
        info!("guide controller stopped");
    }

    /// Process a single input
    pub fn handle(&mut self, input: GuideInput) {
        debug!(?input, "guide input");

        match input {
            GuideInput::Open => self.panel_open = true,
            GuideInput::Close => self.close(),
            GuideInput::ToggleListening => self.toggle_listening(),
            GuideInput::RecognitionResult(update) => {
                if let Some(live) = self.capture.on_update(update) {
                    self.emit(GuideEvent::Transcript { text: live });
                }
            }
            GuideInput::RecognitionError(error) => self.capture.on_error(&error),
            GuideInput::RecognitionEnded => self.capture.on_engine_end(),
            GuideInput::SpeechFinished { token } => self.speech.finished(token),
            GuideInput::SilenceElapsed { generation } => {
                if let Some(utterance) = self.capture.on_silence(generation) {
                    self.sync_state();
                    self.on_utterance(utterance);
                }
            }
            GuideInput::RemoteReply { question, reply } => self.on_remote_reply(question, reply),
        }

        self.sync_state();
    }

    fn close(&mut self) {
        if self.capture.is_active() {
            self.capture.stop();
        }
        self.panel_open = false;
    }

    fn toggle_listening(&mut self) {
        if self.capture.is_active() {
            self.capture.stop();
            return;
        }

        // Never listen to our own voice
        self.speech.silence();
        self.panel_open = true;

        match self.capture.start() {
            Ok(()) => {}
            Err(CaptureError::Unsupported) => {
                warn!("speech recognition unsupported on host");
                self.emit(GuideEvent::RecognitionUnsupported);
            }
            Err(e) => debug!(error = %e, "listen request ignored"),
        }
    }

    /// Route a finalized utterance to a reply
    fn on_utterance(&mut self, utterance: String) {
        self.emit(GuideEvent::Heard {
            text: utterance.clone(),
        });

        let context = NavigationContext {
            slide_index: self.slide_index,
            slide_count: HOME_SLIDES.len(),
        };

        match intent::resolve(&utterance, &context) {
            IntentMatch::ControlCommand(action) => self.run_command(action),
            IntentMatch::LocalAnswer(answer) => {
                self.reply(answer);
                self.remember(utterance, answer.to_string());
            }
            IntentMatch::NeedsRemote => self.ask_remote(utterance),
        }
    }

    fn run_command(&mut self, action: ControlAction) {
        info!(?action, "control command");

        match action {
            ControlAction::Silence => {
                self.speech.silence();
                self.emit(GuideEvent::Reply {
                    text: rules::PAUSED_REPLY.to_string(),
                });
            }
            ControlAction::ClearMemory => {
                if !self.memory.is_empty() {
                    self.memory.clear();
                    self.emit(GuideEvent::MemoryChanged { turns: 0 });
                }
                self.reply(rules::CLEARED_REPLY);
            }
            ControlAction::NavigateSlide { target } => {
                let (index, slide) = slides::clamped(target);
                self.slide_index = index;
                self.emit(GuideEvent::SlideChanged {
                    index,
                    section_id: slide.id.to_string(),
                });
                self.reply(slide.summary);
            }
        }
    }

    fn ask_remote(&mut self, question: String) {
        self.pending_remote += 1;
        if self.pending_remote == 1 {
            self.emit(GuideEvent::CallingBackend { active: true });
        }

        let assistant = self.assistant.clone();
        let recent = self.memory.recent().to_vec();
        let input_tx = self.input_tx.clone();

        tokio::spawn(async move {
            let reply = assistant.ask(&question, &recent).await;
            if input_tx
                .send(GuideInput::RemoteReply { question, reply })
                .await
                .is_err()
            {
                warn!("guide controller gone before assistant replied");
            }
        });
    }

    fn on_remote_reply(&mut self, question: String, reply: Option<String>) {
        if let Some(reply) = reply {
            self.reply(&reply);
            self.remember(question, reply);
        }

        self.pending_remote = self.pending_remote.saturating_sub(1);
        if self.pending_remote == 0 {
            self.emit(GuideEvent::CallingBackend { active: false });
        }
    }

    /// Display and speak a reply
    fn reply(&mut self, text: &str) {
        self.emit(GuideEvent::Reply {
            text: text.to_string(),
        });
        self.speech.speak(text);
    }

    fn remember(&mut self, question: String, answer: String) {
        self.memory.record(ConversationTurn::new(question, answer));
        self.emit(GuideEvent::MemoryChanged {
            turns: self.memory.len(),
        });
    }

    /// Publish a transition if panel or capture state moved
    fn sync_state(&mut self) {
        let new_state = GuideState::new(self.panel_open, self.capture.state());
        if new_state == self.state {
            return;
        }

        let old_state = self.state;
        info!(from = %old_state, to = %new_state, "state transition");
        self.state = new_state;
        self.emit(GuideEvent::StateChanged {
            from: old_state,
            to: new_state,
        });
    }

    fn emit(&self, event: GuideEvent) {
        debug!(%event, "emitting guide event");
        let _ = self.event_tx.send(event);
    }
}
