//! IPC message protocol definitions
//!
//! All messages are JSON-encoded, prefixed with a 4-byte little-endian length.

use serde::{Deserialize, Serialize};

use crate::capture::RecognitionUpdate;
use crate::events::GuideEvent;
use crate::guide::{GuideInput, GuideState};

/// Requests from the host UI to the daemon
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Request {
    /// Ping to check connectivity
    Ping,

    /// Request current guide status
    GetStatus,

    /// Subscribe to guide event notifications
    Subscribe,

    /// Open the guide panel (header button)
    OpenGuide,

    /// Close the guide panel
    CloseGuide,

    /// Listen button pressed
    ToggleListening,

    /// Declare which speech engines the host provides
    ReportCapabilities { recognition: bool },

    /// Recognition update from the host engine
    RecognitionResult {
        #[serde(default)]
        finals: Vec<String>,
        #[serde(default)]
        interim: Option<String>,
    },

    /// Recognition engine error
    RecognitionError { error: String },

    /// Recognition engine stopped
    RecognitionEnded,

    /// The host finished speaking an utterance
    SpeechFinished { token: u64 },
}

impl Request {
    /// The controller input this request maps to, if any
    pub fn into_input(self) -> Option<GuideInput> {
        match self {
            Request::CloseGuide => Some(GuideInput::Close),
            Request::ToggleListening => Some(GuideInput::ToggleListening),
            Request::RecognitionResult { finals, interim } => Some(
                GuideInput::RecognitionResult(RecognitionUpdate { finals, interim }),
            ),
            Request::RecognitionError { error } => Some(GuideInput::RecognitionError(error)),
            Request::RecognitionEnded => Some(GuideInput::RecognitionEnded),
            Request::SpeechFinished { token } => Some(GuideInput::SpeechFinished { token }),
            Request::Ping
            | Request::GetStatus
            | Request::Subscribe
            | Request::OpenGuide
            | Request::ReportCapabilities { .. } => None,
        }
    }
}

/// Responses from daemon to the host UI
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Response {
    /// Current guide status
    Status(GuideStatus),

    /// Pong response to ping
    Pong,

    /// Subscription confirmed
    Subscribed,

    /// Request accepted
    Ack,

    /// Error response
    Error { code: String, message: String },
}

/// Push notification from daemon to UI (for subscribed clients)
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Notification {
    /// Guide event occurred
    Event { event: GuideEvent },
}

/// Full guide status snapshot
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GuideStatus {
    /// Daemon version
    pub version: String,

    /// Panel and listening state
    pub state: GuideState,

    /// Last transcript or finalized utterance
    pub heard: String,

    /// Last reply shown
    pub reply: String,

    /// Whether the remote assistant is being called
    pub calling_backend: bool,

    /// Whether the host has declared a working recognition engine
    pub recognition_supported: bool,

    /// Current home section
    pub slide_index: usize,

    /// Stored conversation turns
    pub turns: usize,

    /// Uptime in seconds
    pub uptime_secs: u64,
}

impl Default for GuideStatus {
    fn default() -> Self {
        Self {
            version: env!("CARGO_PKG_VERSION").to_string(),
            state: GuideState::default(),
            heard: String::new(),
            reply: String::new(),
            calling_backend: false,
            recognition_supported: false,
            slide_index: 0,
            turns: 0,
            uptime_secs: 0,
        }
    }
}

impl GuideStatus {
    /// Fold a guide event into the snapshot
    pub fn apply(&mut self, event: &GuideEvent) {
        match event {
            GuideEvent::StateChanged { to, .. } => {
                self.state = *to;
                if matches!(to, GuideState::Listening) {
                    self.recognition_supported = true;
                }
            }
            GuideEvent::RecognitionUnsupported => self.recognition_supported = false,
            GuideEvent::Transcript { text } | GuideEvent::Heard { text } => {
                self.heard = text.clone();
            }
            GuideEvent::Reply { text } => self.reply = text.clone(),
            GuideEvent::CallingBackend { active } => self.calling_backend = *active,
            GuideEvent::SlideChanged { index, .. } => self.slide_index = *index,
            GuideEvent::MemoryChanged { turns } => self.turns = *turns,
            GuideEvent::RecognitionRequested { .. }
            | GuideEvent::RecognitionStopped
            | GuideEvent::Speak { .. }
            | GuideEvent::CancelSpeech => {}
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_request_serialization() {
        let req = Request::ReportCapabilities { recognition: true };
        let json = serde_json::to_string(&req).unwrap();
        assert!(json.contains("report_capabilities"));
        assert!(json.contains("true"));
    }

    #[test]
    fn test_recognition_result_defaults() {
        let json = r#"{"type":"recognition_result","finals":["hello"]}"#;
        let req: Request = serde_json::from_str(json).unwrap();
        match req.into_input() {
            Some(GuideInput::RecognitionResult(update)) => {
                assert_eq!(update.finals, ["hello"]);
                assert!(update.interim.is_none());
            }
            other => panic!("unexpected input: {other:?}"),
        }
    }

    #[test]
    fn test_response_serialization() {
        let resp = Response::Status(GuideStatus::default());
        let json = serde_json::to_string(&resp).unwrap();
        assert!(json.contains("status"));
        assert!(json.contains("\"state\":\"closed\""));
    }

    #[test]
    fn test_recognition_unsupported_until_declared() {
        let mut status = GuideStatus::default();
        assert!(!status.recognition_supported);

        status.apply(&GuideEvent::StateChanged {
            from: GuideState::Idle,
            to: GuideState::Listening,
        });
        assert!(status.recognition_supported);
    }

    #[test]
    fn test_status_folds_events() {
        let mut status = GuideStatus::default();
        status.recognition_supported = true;
        status.apply(&GuideEvent::RecognitionUnsupported);
        status.apply(&GuideEvent::CallingBackend { active: true });
        status.apply(&GuideEvent::Heard {
            text: "tell me a joke".to_string(),
        });
        status.apply(&GuideEvent::MemoryChanged { turns: 2 });

        assert!(!status.recognition_supported);
        assert!(status.calling_backend);
        assert_eq!(status.heard, "tell me a joke");
        assert_eq!(status.turns, 2);
    }
}
